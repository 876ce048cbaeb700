use crate::classify::{categorize, extract_city, forward_fill_universities};
use crate::loader::Table;
use crate::models::{Cell, Config, PreferenceEntry, ProgramRow};
use crate::regions::region_for_city;
use anyhow::Result;
use tracing::debug;

/// How many rows survived each stage, in pipeline order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterStats {
    pub total_rows: usize,
    pub program_rows: usize,
    pub categorized: usize,
    pub in_rank_band: usize,
    pub in_allowed_region: usize,
}

#[derive(Debug, Clone)]
pub struct PreferenceList {
    pub entries: Vec<PreferenceEntry>,
    pub stats: FilterStats,
    pub program_name_column: String,
    // Empty when the source has none of the staff columns
    pub staff_columns: Vec<String>,
}

impl PreferenceList {
    pub fn count_by_priority(&self, priority: u8) -> usize {
        self.entries.iter().filter(|e| e.priority == priority).count()
    }
}

/// Pull the logical columns out of the table and attach the owning university.
pub fn extract_rows(table: &Table, config: &Config) -> Result<Vec<ProgramRow>> {
    let columns = &config.columns;
    let code_idx = table.require_column(&columns.program_code)?;
    let name_idx = table.require_column(&columns.program_name)?;
    let rank_idx = table.require_column(&columns.rank)?;
    let quota_idx = table.require_column(&columns.quota)?;
    let staff_idx: Vec<Option<usize>> = columns
        .staff
        .iter()
        .map(|name| table.column_index(name))
        .collect();

    let empty = Cell::Empty;
    let cell = |row: &[Cell], idx: usize| row.get(idx).unwrap_or(&empty).clone();

    // Universities come from row order, so fill before anything is dropped.
    let names: Vec<Cell> = table.rows.iter().map(|row| cell(row, name_idx)).collect();
    let universities =
        forward_fill_universities(&names, &config.university_marker, config.marker_match);

    let rows = table
        .rows
        .iter()
        .zip(names)
        .zip(universities)
        .map(|((row, program_name), university)| ProgramRow {
            program_name,
            program_code: cell(row, code_idx),
            rank: cell(row, rank_idx).as_number(),
            quota: cell(row, quota_idx).as_number(),
            staff: staff_idx
                .iter()
                .map(|idx| idx.and_then(|i| cell(row, i).as_number()))
                .collect(),
            university,
        })
        .collect();

    Ok(rows)
}

/// Filter program rows down to the preference list, sorted by priority then rank.
pub fn rank_preferences(rows: Vec<ProgramRow>, config: &Config) -> (Vec<PreferenceEntry>, FilterStats) {
    let mut stats = FilterStats {
        total_rows: rows.len(),
        ..FilterStats::default()
    };

    let program_rows: Vec<ProgramRow> = rows
        .into_iter()
        .filter(|row| row.program_code.is_present())
        .collect();
    stats.program_rows = program_rows.len();

    let categorized: Vec<(ProgramRow, u8)> = program_rows
        .into_iter()
        .filter_map(|row| {
            let priority = categorize(&row.program_name);
            if priority.is_none() {
                debug!(program = ?row.program_name, "dropped: no category");
            }
            priority.map(|p| (row, p))
        })
        .collect();
    stats.categorized = categorized.len();

    let in_band: Vec<(ProgramRow, u8, f64)> = categorized
        .into_iter()
        .filter_map(|(row, priority)| {
            let rank = row.rank.filter(|rank| config.rank_in_band(*rank));
            if rank.is_none() {
                debug!(program = ?row.program_name, rank = ?row.rank, "dropped: rank outside band");
            }
            rank.map(|rank| (row, priority, rank))
        })
        .collect();
    stats.in_rank_band = in_band.len();

    let mut entries: Vec<PreferenceEntry> = in_band
        .into_iter()
        .filter_map(|(row, priority, rank)| {
            let city = extract_city(row.university.as_deref(), &config.university_marker);
            let region = city.as_deref().and_then(region_for_city);
            match (city, region) {
                (Some(city), Some(region)) if config.is_allowed_region(region) => {
                    Some(PreferenceEntry {
                        university: row.university,
                        program_name: row
                            .program_name
                            .as_text()
                            .map(str::to_string)
                            .unwrap_or_default(),
                        rank,
                        city,
                        region,
                        priority,
                        quota: row.quota,
                        staff: row.staff,
                    })
                }
                (city, region) => {
                    debug!(university = ?row.university, ?city, ?region, "dropped: region not allowed");
                    None
                }
            }
        })
        .collect();
    stats.in_allowed_region = entries.len();

    // sort_by is stable, so ties keep file order
    entries.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then_with(|| a.rank.total_cmp(&b.rank))
    });

    (entries, stats)
}

pub fn build_preference_list(table: &Table, config: &Config) -> Result<PreferenceList> {
    let rows = extract_rows(table, config)?;
    let (entries, stats) = rank_preferences(rows, config);

    let staff_present = config
        .columns
        .staff
        .iter()
        .any(|name| table.column_index(name).is_some());
    let staff_columns = if staff_present {
        config.columns.staff.clone()
    } else {
        Vec::new()
    };

    Ok(PreferenceList {
        entries,
        stats,
        program_name_column: config.columns.program_name.clone(),
        staff_columns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regions::Region;

    fn row(university: &str, name: &str, code: Option<&str>, rank: Option<f64>) -> ProgramRow {
        ProgramRow {
            program_name: Cell::Text(name.to_string()),
            program_code: code.map(Cell::from_text).unwrap_or(Cell::Empty),
            rank,
            quota: Some(50.0),
            staff: vec![None, None, None],
            university: Some(university.to_string()),
        }
    }

    const EGE: &str = "EGE ÜNİVERSİTESİ (İZMİR)";

    #[test]
    fn rows_without_program_code_are_dropped() {
        let rows = vec![
            row(EGE, "İNGİLİZCE ÖĞRETMENLİĞİ", None, Some(20000.0)),
            row(EGE, "İNGİLİZCE ÖĞRETMENLİĞİ", Some("102710089"), Some(21000.0)),
        ];

        let (entries, stats) = rank_preferences(rows, &Config::default());

        assert_eq!(stats.total_rows, 2);
        assert_eq!(stats.program_rows, 1);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].rank, 21000.0);
    }

    #[test]
    fn rank_band_keeps_both_bounds() {
        let rows = vec![
            row(EGE, "DİLBİLİM", Some("1"), Some(12999.0)),
            row(EGE, "DİLBİLİM", Some("2"), Some(13000.0)),
            row(EGE, "DİLBİLİM", Some("3"), Some(30000.0)),
            row(EGE, "DİLBİLİM", Some("4"), Some(30001.0)),
            row(EGE, "DİLBİLİM", Some("5"), None),
        ];

        let (entries, stats) = rank_preferences(rows, &Config::default());

        let ranks: Vec<f64> = entries.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, vec![13000.0, 30000.0]);
        assert_eq!(stats.categorized, 5);
        assert_eq!(stats.in_rank_band, 2);
    }

    #[test]
    fn excluded_and_unknown_regions_are_dropped() {
        let rows = vec![
            row("ATATÜRK ÜNİVERSİTESİ (ERZURUM)", "DİLBİLİM", Some("1"), Some(20000.0)),
            row("DİCLE ÜNİVERSİTESİ (DİYARBAKIR)", "DİLBİLİM", Some("2"), Some(20000.0)),
            row("YAKIN DOĞU ÜNİVERSİTESİ (LEFKOŞA)", "DİLBİLİM", Some("3"), Some(20000.0)),
            row("HACETTEPE ÜNİVERSİTESİ (ANKARA)", "DİLBİLİM", Some("4"), Some(20000.0)),
        ];

        let (entries, stats) = rank_preferences(rows, &Config::default());

        assert_eq!(stats.in_allowed_region, 1);
        assert_eq!(entries[0].region, Region::IcAnadolu);
        assert_eq!(entries[0].city, "ANKARA");
    }

    #[test]
    fn output_sorted_by_priority_then_rank() {
        let rows = vec![
            row(EGE, "DİLBİLİM", Some("1"), Some(14000.0)),
            row(EGE, "İNGİLİZCE ÖĞRETMENLİĞİ", Some("2"), Some(25000.0)),
            row(EGE, "MÜTERCİM VE TERCÜMANLIK (İNGİLİZCE)", Some("3"), Some(15000.0)),
            row(EGE, "İNGİLİZCE ÖĞRETMENLİĞİ", Some("4"), Some(18000.0)),
            row(EGE, "İNGİLİZCE ÖĞRETMENLİĞİ (İÖ)", Some("5"), Some(18000.0)),
        ];

        let (entries, _) = rank_preferences(rows, &Config::default());

        let keys: Vec<(u8, f64)> = entries.iter().map(|e| (e.priority, e.rank)).collect();
        assert_eq!(
            keys,
            vec![(1, 18000.0), (1, 18000.0), (1, 25000.0), (2, 15000.0), (3, 14000.0)]
        );
        // equal keys keep their original order
        assert_eq!(entries[0].program_name, "İNGİLİZCE ÖĞRETMENLİĞİ");
        assert_eq!(entries[1].program_name, "İNGİLİZCE ÖĞRETMENLİĞİ (İÖ)");

        for pair in entries.windows(2) {
            assert!(
                pair[0].priority < pair[1].priority
                    || (pair[0].priority == pair[1].priority && pair[0].rank <= pair[1].rank)
            );
        }
    }

    #[test]
    fn extract_rows_fills_universities_before_filtering() {
        let table = Table {
            columns: vec![
                "PROGRAM KODU (1)".to_string(),
                "PROGRAM ADI (2)".to_string(),
                "GENEL KONT. (5)".to_string(),
                "2024-YKS BAŞARI SIRASI (12)".to_string(),
            ],
            rows: vec![
                vec![Cell::Empty, Cell::from_text(EGE), Cell::Empty, Cell::Empty],
                vec![
                    Cell::from_text("102710089"),
                    Cell::from_text("İNGİLİZCE ÖĞRETMENLİĞİ"),
                    Cell::Number(60.0),
                    Cell::from_text("20000"),
                ],
            ],
        };

        let rows = extract_rows(&table, &Config::default()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].university.as_deref(), Some(EGE));
        assert_eq!(rows[1].rank, Some(20000.0));
        assert_eq!(rows[1].quota, Some(60.0));
        // staff columns missing from the source come through as absent
        assert_eq!(rows[1].staff, vec![None, None, None]);

        let list = build_preference_list(&table, &Config::default()).unwrap();
        assert!(list.staff_columns.is_empty());
        assert_eq!(list.count_by_priority(1), 1);
    }

    #[test]
    fn missing_required_column_is_fatal() {
        let table = Table {
            columns: vec!["PROGRAM ADI (2)".to_string()],
            rows: vec![],
        };
        assert!(extract_rows(&table, &Config::default()).is_err());
    }
}
