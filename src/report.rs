use crate::models::format_number;
use crate::pipeline::PreferenceList;
use anyhow::{Context, Result};
use csv::Writer;
use std::io;
use std::path::Path;
use tracing::info;

fn optional_number(value: Option<f64>) -> String {
    value.map(format_number).unwrap_or_default()
}

pub fn write_preferences<W: io::Write>(list: &PreferenceList, writer: &mut Writer<W>) -> Result<()> {
    let mut headers = vec![
        "uni".to_string(),
        list.program_name_column.clone(),
        "rank".to_string(),
        "city".to_string(),
        "region".to_string(),
        "priority".to_string(),
        "quota".to_string(),
    ];
    headers.extend(list.staff_columns.iter().cloned());
    writer.write_record(&headers)?;

    for entry in &list.entries {
        let mut record = vec![
            entry.university.clone().unwrap_or_default(),
            entry.program_name.clone(),
            format_number(entry.rank),
            entry.city.clone(),
            entry.region.to_string(),
            entry.priority.to_string(),
            optional_number(entry.quota),
        ];
        for i in 0..list.staff_columns.len() {
            record.push(optional_number(entry.staff.get(i).copied().flatten()));
        }
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

pub fn generate_preference_csv(list: &PreferenceList, output_path: &Path) -> Result<()> {
    let mut writer = Writer::from_path(output_path)
        .with_context(|| format!("Failed to create output file: {}", output_path.display()))?;
    write_preferences(list, &mut writer)?;
    info!(path = %output_path.display(), rows = list.entries.len(), "wrote preference list");
    Ok(())
}
