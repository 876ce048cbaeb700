use crate::regions::Region;
use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

pub const DEFAULT_UNIVERSITY_MARKER: &str = "ÜNİVERSİTESİ";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // First sheet of the workbook when unset
    pub sheet: Option<String>,
    pub university_marker: String,
    pub marker_match: MarkerMatch,
    pub rank_min: f64,
    pub rank_max: f64,
    pub allowed_regions: Vec<Region>,
    pub header: HeaderLayout,
    pub columns: ColumnNames,
}

/// Where the column titles live in the source sheet.
///
/// Older guide exports carry a single title row a few rows down, newer ones a
/// block of stacked title rows at the top. Both flatten to the same names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum HeaderLayout {
    Block { rows: usize },
    Single { row: usize },
}

impl Default for HeaderLayout {
    fn default() -> Self {
        HeaderLayout::Block { rows: 3 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MarkerMatch {
    /// Marker must appear with the exact orthography of the source file.
    #[serde(rename = "exact")]
    #[default]
    Exact,
    /// Compare accent-stripped, upper-cased forms.
    #[serde(rename = "folded")]
    Folded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub program_code: String,
    pub program_name: String,
    pub rank: String,
    pub quota: String,
    pub staff: Vec<String>,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            program_code: "PROGRAM KODU (1)".to_string(),
            program_name: "PROGRAM ADI (2)".to_string(),
            rank: "2024-YKS BAŞARI SIRASI (12)".to_string(),
            quota: "GENEL KONT. (5)".to_string(),
            staff: vec![
                "P.DR. SAYI (14)".to_string(),
                "D.DR. SAYI (15)".to_string(),
                "DR.ÖĞR. ÜYE SAYI (16)".to_string(),
            ],
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            header: HeaderLayout::default(),
            sheet: None,
            university_marker: DEFAULT_UNIVERSITY_MARKER.to_string(),
            marker_match: MarkerMatch::Exact,
            rank_min: 13000.0,
            rank_max: 30000.0,
            allowed_regions: vec![
                Region::Marmara,
                Region::Ege,
                Region::Akdeniz,
                Region::IcAnadolu,
                Region::Karadeniz,
            ],
            columns: ColumnNames::default(),
        }
    }
}

impl Config {
    pub fn load_from_file(file_path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(file_path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file(&self, file_path: &str) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(file_path, content)?;
        Ok(())
    }

    pub fn rank_in_band(&self, rank: f64) -> bool {
        rank >= self.rank_min && rank <= self.rank_max
    }

    pub fn is_allowed_region(&self, region: Region) -> bool {
        self.allowed_regions.contains(&region)
    }
}

/// A single spreadsheet value as loaded from the source file.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    /// Blank or whitespace-only text counts as an empty cell.
    pub fn from_text(raw: &str) -> Self {
        if raw.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(raw.to_string())
        }
    }

    pub fn is_present(&self) -> bool {
        !matches!(self, Cell::Empty)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Coerce to a number; anything unparseable is absent rather than an error.
    pub fn as_number(&self) -> Option<f64> {
        let value = match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(text) => text.trim().parse::<f64>().ok(),
            Cell::Empty => None,
        };
        value.filter(|n| n.is_finite())
    }

    /// Text used when the cell is part of a column title.
    pub fn header_fragment(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(text) => text.trim().to_string(),
            Cell::Number(n) => format_number(*n),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgramRow {
    pub program_name: Cell,
    pub program_code: Cell,
    pub rank: Option<f64>,
    pub quota: Option<f64>,
    pub staff: Vec<Option<f64>>,
    pub university: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreferenceEntry {
    pub university: Option<String>,
    pub program_name: String,
    pub rank: f64,
    pub city: String,
    pub region: Region,
    pub priority: u8,
    pub quota: Option<f64>,
    pub staff: Vec<Option<f64>>,
}

/// Whole numbers print without a fractional part.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Decompose and drop combining marks, so "İZMİR" becomes "IZMIR".
pub fn strip_accents(text: &str) -> String {
    text.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Accent-stripped, upper-cased form used for marker and province comparisons
pub fn fold_upper(text: &str) -> String {
    strip_accents(text).to_uppercase()
}

pub fn fold_lower(text: &str) -> String {
    strip_accents(text).to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_coercion_treats_garbage_as_absent() {
        assert_eq!(Cell::Number(20000.0).as_number(), Some(20000.0));
        assert_eq!(Cell::Text(" 15432 ".to_string()).as_number(), Some(15432.0));
        assert_eq!(Cell::Text("---".to_string()).as_number(), None);
        assert_eq!(Cell::Text("nan".to_string()).as_number(), None);
        assert_eq!(Cell::Empty.as_number(), None);
    }

    #[test]
    fn blank_text_is_empty() {
        assert_eq!(Cell::from_text("   "), Cell::Empty);
        assert!(Cell::from_text("102710089").is_present());
    }

    #[test]
    fn folding_handles_turkish_letters() {
        assert_eq!(fold_upper("İZMİR"), "IZMIR");
        assert_eq!(fold_upper("Kırşehir"), "KIRSEHIR");
        assert_eq!(fold_lower("İNGİLİZCE ÖĞRETMENLİĞİ"), "ingilizce ogretmenligi");
        assert_eq!(fold_upper("ÜNİVERSİTESİ"), "UNIVERSITESI");
    }

    #[test]
    fn whole_numbers_format_without_fraction() {
        assert_eq!(format_number(20000.0), "20000");
        assert_eq!(format_number(12.5), "12.5");
    }

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let config: Config = toml::from_str(
            r#"
            rank_max = 25000.0
            marker_match = "folded"

            [header]
            layout = "single"
            row = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.rank_min, 13000.0);
        assert_eq!(config.rank_max, 25000.0);
        assert_eq!(config.marker_match, MarkerMatch::Folded);
        assert_eq!(config.header, HeaderLayout::Single { row: 3 });
        assert_eq!(config.columns.program_name, "PROGRAM ADI (2)");
        assert_eq!(config.allowed_regions.len(), 5);
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("preflist.toml");
        let path = path.to_str().unwrap();

        let config = Config {
            header: HeaderLayout::Single { row: 3 },
            sheet: Some("Tablo4".to_string()),
            marker_match: MarkerMatch::Folded,
            allowed_regions: vec![Region::Ege, Region::Marmara],
            ..Config::default()
        };
        config.save_to_file(path).unwrap();
        let loaded = Config::load_from_file(path).unwrap();

        assert_eq!(loaded.header, HeaderLayout::Single { row: 3 });
        assert_eq!(loaded.sheet.as_deref(), Some("Tablo4"));
        assert_eq!(loaded.marker_match, MarkerMatch::Folded);
        assert_eq!(loaded.allowed_regions, vec![Region::Ege, Region::Marmara]);
        assert_eq!(loaded.rank_min, 13000.0);
        assert_eq!(loaded.columns.staff.len(), 3);
    }

    #[test]
    fn rank_band_is_inclusive() {
        let config = Config::default();
        assert!(config.rank_in_band(13000.0));
        assert!(config.rank_in_band(30000.0));
        assert!(!config.rank_in_band(12999.0));
        assert!(!config.rank_in_band(30001.0));
    }
}
