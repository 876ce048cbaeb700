use crate::models::{fold_lower, fold_upper, Cell, MarkerMatch};
use once_cell::sync::Lazy;
use regex::Regex;

static PARENTHESIZED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(([^()]+)\)").expect("parenthesis pattern is valid"));

/// One ordered categorization rule: every clause must match, and a clause
/// matches when any of its alternatives is a substring of the folded name.
struct CategoryRule {
    category: u8,
    clauses: &'static [&'static [&'static str]],
}

impl CategoryRule {
    fn matches(&self, folded_name: &str) -> bool {
        self.clauses
            .iter()
            .all(|alternatives| alternatives.iter().any(|needle| folded_name.contains(needle)))
    }
}

// Evaluated top to bottom, first match wins.
const CATEGORY_RULES: &[CategoryRule] = &[
    CategoryRule {
        category: 1,
        clauses: &[&["ingilizce ogretmenligi"]],
    },
    CategoryRule {
        category: 2,
        clauses: &[&["mutercim", "mütercim"], &["ingilizce"]],
    },
    CategoryRule {
        category: 3,
        clauses: &[&["dilbilim", "dil bilim"]],
    },
];

/// Priority category of a program name: 1 for English teaching, 2 for English
/// translation and interpreting, 3 for linguistics. Non-text cells have none.
pub fn categorize(program_name: &Cell) -> Option<u8> {
    let folded = fold_lower(program_name.as_text()?);
    CATEGORY_RULES
        .iter()
        .find(|rule| rule.matches(&folded))
        .map(|rule| rule.category)
}

pub fn contains_marker(text: &str, marker: &str, mode: MarkerMatch) -> bool {
    match mode {
        MarkerMatch::Exact => text.contains(marker),
        MarkerMatch::Folded => fold_upper(text).contains(&fold_upper(marker)),
    }
}

/// Tag every row with the most recent university marker seen at or above it.
pub fn forward_fill_universities(
    program_names: &[Cell],
    marker: &str,
    mode: MarkerMatch,
) -> Vec<Option<String>> {
    program_names
        .iter()
        .scan(None::<String>, |current, cell| {
            if let Some(text) = cell.as_text() {
                if contains_marker(text, marker, mode) {
                    *current = Some(text.trim().to_string());
                }
            }
            Some(current.clone())
        })
        .collect()
}

/// City of a university: the parenthesized part when it is not itself a
/// university name, otherwise the first word before the marker.
///
/// The marker test runs on folded text but the returned city keeps its accents.
pub fn extract_city(university: Option<&str>, marker: &str) -> Option<String> {
    let university = university?;
    let folded_marker = fold_upper(marker);

    if let Some(caps) = PARENTHESIZED.captures(university) {
        let inner = &caps[1];
        if !fold_upper(inner).contains(&folded_marker) {
            return Some(inner.trim().to_uppercase());
        }
    }

    let first = text_before_marker(university, &folded_marker)
        .split_whitespace()
        .next()?;
    Some(first.trim().to_uppercase())
}

/// Original text up to where the folded marker starts, or all of it.
fn text_before_marker<'a>(text: &'a str, folded_marker: &str) -> &'a str {
    if folded_marker.is_empty() {
        return text;
    }

    // byte offset in `text` for every byte of the folded string
    let mut folded = String::with_capacity(text.len());
    let mut origin = Vec::with_capacity(text.len());
    for (offset, c) in text.char_indices() {
        let piece = fold_upper(c.encode_utf8(&mut [0; 4]));
        origin.extend(std::iter::repeat(offset).take(piece.len()));
        folded.push_str(&piece);
    }

    match folded.find(folded_marker) {
        Some(pos) => &text[..origin[pos]],
        None => text,
    }
}
