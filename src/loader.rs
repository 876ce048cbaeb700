use crate::models::{Cell, HeaderLayout};
use anyhow::{anyhow, bail, Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;
use tracing::{debug, info};

/// Flattened program table: one title per column, data rows in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let wanted = normalize_header_name(name);
        self.columns.iter().position(|column| *column == wanted)
    }

    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name).ok_or_else(|| {
            anyhow!(
                "Required column '{}' not found. Available columns: {}",
                name,
                self.columns
                    .iter()
                    .filter(|c| !c.is_empty())
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(" | ")
            )
        })
    }
}

pub struct TableLoader {
    layout: HeaderLayout,
    sheet: Option<String>,
}

impl TableLoader {
    pub fn new(layout: HeaderLayout, sheet: Option<String>) -> Self {
        Self { layout, sheet }
    }

    /// Load a workbook (or a CSV export of it) and flatten its header.
    pub fn load_file(&self, path: &Path) -> Result<Table> {
        if !path.exists() {
            bail!("Input file not found: {}", path.display());
        }

        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);

        let grid = if is_csv {
            read_csv_grid(path)?
        } else {
            self.read_workbook_grid(path)?
        };
        info!(path = %path.display(), rows = grid.len(), "loaded sheet");

        flatten_header(grid, &self.layout)
    }

    fn read_workbook_grid(&self, path: &Path) -> Result<Vec<Vec<Cell>>> {
        let mut workbook = open_workbook_auto(path)
            .with_context(|| format!("Failed to open workbook: {}", path.display()))?;

        let sheet_name = match &self.sheet {
            Some(name) => name.clone(),
            None => workbook
                .sheet_names()
                .first()
                .cloned()
                .ok_or_else(|| anyhow!("Workbook has no sheets: {}", path.display()))?,
        };
        debug!(sheet = %sheet_name, "reading worksheet");

        let range = workbook
            .worksheet_range(&sheet_name)
            .with_context(|| format!("Failed to read sheet '{}' from {}", sheet_name, path.display()))?;

        // Ranges start at the first used cell; pad so row indices match the sheet.
        let (row_offset, col_offset) = range.start().unwrap_or((0, 0));
        let mut grid: Vec<Vec<Cell>> = (0..row_offset).map(|_| Vec::new()).collect();
        for row in range.rows() {
            let mut cells = vec![Cell::Empty; col_offset as usize];
            cells.extend(row.iter().map(cell_from_data));
            grid.push(cells);
        }

        Ok(grid)
    }
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(text) => Cell::from_text(text),
        Data::Float(value) => Cell::Number(*value),
        Data::Int(value) => Cell::Number(*value as f64),
        other => Cell::from_text(&other.to_string()),
    }
}

fn read_csv_grid(path: &Path) -> Result<Vec<Vec<Cell>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;

    let mut grid = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("Malformed CSV row in {}", path.display()))?;
        grid.push(record.iter().map(Cell::from_text).collect());
    }

    Ok(grid)
}

/// Collapse whitespace runs (line breaks inside title cells included) to one space.
pub fn normalize_header_name(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_placeholder(fragment: &str) -> bool {
    fragment.is_empty() || fragment == "nan" || fragment.starts_with("Unnamed:")
}

/// Turn the raw grid into a table with one title per column.
pub fn flatten_header(grid: Vec<Vec<Cell>>, layout: &HeaderLayout) -> Result<Table> {
    let (first, count) = match layout {
        HeaderLayout::Block { rows } => (0, *rows),
        HeaderLayout::Single { row } => (*row, 1),
    };
    if count == 0 {
        bail!("Header layout must span at least one row");
    }
    if grid.len() < first + count {
        bail!(
            "Sheet has {} rows but the header needs rows {}..{}",
            grid.len(),
            first,
            first + count
        );
    }

    let mut rows = grid.into_iter().skip(first);
    let header_rows: Vec<Vec<Cell>> = rows.by_ref().take(count).collect();
    let width = header_rows.iter().map(Vec::len).max().unwrap_or(0);

    let columns: Vec<String> = (0..width)
        .map(|col| {
            let parts: Vec<String> = header_rows
                .iter()
                .filter_map(|row| row.get(col))
                .map(Cell::header_fragment)
                .filter(|fragment| !is_placeholder(fragment))
                .collect();
            normalize_header_name(&parts.join(" "))
        })
        .collect();

    let data: Vec<Vec<Cell>> = rows
        .map(|mut row| {
            if row.len() < width {
                row.resize(width, Cell::Empty);
            }
            row
        })
        .collect();

    debug!(columns = columns.len(), rows = data.len(), "flattened header");
    Ok(Table { columns, rows: data })
}
