//! Small-field bulk-data reader.
//!
//! Understands what the writer produces plus free-field (comma separated)
//! lines: `$` comments, executive/case control before `BEGIN BULK`, `+`
//! continuation lines, and `ENDDATA`.

use std::fs;
use std::path::Path;

use super::field::{FIELD_WIDTH, FIELDS_PER_LINE, parse_real};
use crate::error::{BulkDataError, Result};

/// One card with its data fields (keyword excluded). Field `i` of the card
/// is `fields[i]`, continuation lines included; trailing blanks are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkCard {
    pub name: String,
    pub fields: Vec<String>,
    pub line_start: usize,
}

impl BulkCard {
    pub fn text(&self, index: usize) -> Option<&str> {
        self.fields
            .get(index)
            .map(|s| s.as_str())
            .filter(|s| !s.is_empty())
    }

    pub fn int(&self, index: usize) -> Option<i64> {
        self.text(index)?.parse().ok()
    }

    pub fn real(&self, index: usize) -> Option<f64> {
        parse_real(self.text(index)?)
    }

    /// Integer fields from `start` onward, skipping blanks.
    pub fn ints_from(&self, start: usize) -> Vec<i64> {
        (start..self.fields.len())
            .filter_map(|i| self.int(i))
            .collect()
    }

    /// Real fields from `start` onward, skipping blanks.
    pub fn reals_from(&self, start: usize) -> Vec<f64> {
        (start..self.fields.len())
            .filter_map(|i| self.real(i))
            .collect()
    }
}

pub fn read_file(path: impl AsRef<Path>) -> Result<Vec<BulkCard>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(BulkDataError::FileNotFound(path.display().to_string()));
    }
    let raw = fs::read_to_string(path)?;
    read_cards(&raw)
}

pub fn read_cards(raw: &str) -> Result<Vec<BulkCard>> {
    let lines: Vec<&str> = raw.lines().collect();
    let bulk_start = lines
        .iter()
        .position(|l| l.trim().to_ascii_uppercase().starts_with("BEGIN BULK"))
        .map_or(0, |i| i + 1);

    let mut cards: Vec<BulkCard> = Vec::new();
    for (i, line) in lines.iter().enumerate().skip(bulk_start) {
        let line_no = i + 1;
        let trimmed = line.trim_end();
        if trimmed.trim().is_empty() || trimmed.trim_start().starts_with('$') {
            continue;
        }
        if trimmed.trim().eq_ignore_ascii_case("ENDDATA") {
            break;
        }

        let (head, data) = split_line(trimmed);
        if head.starts_with('+') || head.starts_with('*') || head.is_empty() {
            let Some(card) = cards.last_mut() else {
                return Err(BulkDataError::Parse {
                    line: line_no,
                    message: "continuation line without a parent card".to_string(),
                });
            };
            card.fields.extend(data);
        } else {
            cards.push(BulkCard {
                name: head.to_ascii_uppercase(),
                fields: data,
                line_start: line_no,
            });
        }
    }

    for card in &mut cards {
        while card.fields.last().is_some_and(|f| f.is_empty()) {
            card.fields.pop();
        }
    }
    Ok(cards)
}

/// Splits a line into its keyword and exactly eight data fields.
fn split_line(line: &str) -> (String, Vec<String>) {
    let mut tokens: Vec<String> = if line.contains(',') {
        line.split(',').map(|t| t.trim().to_string()).collect()
    } else {
        let chars: Vec<char> = line.chars().collect();
        chars
            .chunks(FIELD_WIDTH)
            .take(FIELDS_PER_LINE + 1)
            .map(|c| c.iter().collect::<String>().trim().to_string())
            .collect()
    };
    tokens.resize(FIELDS_PER_LINE + 1, String::new());
    let head = tokens.remove(0);
    tokens.truncate(FIELDS_PER_LINE);
    (head, tokens)
}

/// Cards named `name`, in deck order.
pub fn cards_named<'a>(cards: &'a [BulkCard], name: &'a str) -> impl Iterator<Item = &'a BulkCard> {
    cards.iter().filter(move |c| c.name == name)
}
