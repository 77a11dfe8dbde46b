//! Fixed-width (small field) bulk-data encoding.
//!
//! A card line is the keyword in columns 1–8 followed by up to eight data
//! fields of eight columns each. Longer cards continue on lines whose first
//! field is `+`. Every token must fit its field; nothing is ever truncated.

use crate::error::EncodingError;

pub const FIELD_WIDTH: usize = 8;
pub const FIELDS_PER_LINE: usize = 8;
pub const CONTINUATION_MARKER: &str = "+";

/// One data field of a card.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Int(i64),
    Real(f64),
    Text(String),
    Blank,
}

impl Field {
    pub fn encode(&self) -> Result<String, EncodingError> {
        match self {
            Field::Int(v) => format_int(*v),
            Field::Real(v) => format_real(*v),
            Field::Text(s) => format_text(s),
            Field::Blank => Ok(String::new()),
        }
    }
}

impl From<i64> for Field {
    fn from(v: i64) -> Self {
        Field::Int(v)
    }
}

impl From<u32> for Field {
    fn from(v: u32) -> Self {
        Field::Int(i64::from(v))
    }
}

/// Counts and ids computed as `usize`/`u64` are checked against the field
/// width when converted.
impl TryFrom<usize> for Field {
    type Error = EncodingError;

    fn try_from(v: usize) -> Result<Self, Self::Error> {
        checked_int(i64::try_from(v).ok(), v)
    }
}

impl TryFrom<u64> for Field {
    type Error = EncodingError;

    fn try_from(v: u64) -> Result<Self, Self::Error> {
        checked_int(i64::try_from(v).ok(), v)
    }
}

fn checked_int(value: Option<i64>, raw: impl ToString) -> Result<Field, EncodingError> {
    match value {
        Some(v) => format_int(v).map(|_| Field::Int(v)),
        None => Err(EncodingError::FieldOverflow {
            card: String::new(),
            value: raw.to_string(),
        }),
    }
}

impl From<f64> for Field {
    fn from(v: f64) -> Self {
        Field::Real(v)
    }
}

impl From<&str> for Field {
    fn from(s: &str) -> Self {
        Field::Text(s.to_string())
    }
}

pub fn format_int(value: i64) -> Result<String, EncodingError> {
    let s = value.to_string();
    if s.len() > FIELD_WIDTH {
        return Err(EncodingError::FieldOverflow {
            card: String::new(),
            value: s,
        });
    }
    Ok(s)
}

pub fn format_text(text: &str) -> Result<String, EncodingError> {
    if text.chars().count() > FIELD_WIDTH {
        return Err(EncodingError::FieldOverflow {
            card: String::new(),
            value: text.to_string(),
        });
    }
    Ok(text.to_string())
}

/// Renders a real in at most eight characters, choosing between fixed point
/// and the compact exponent form (`7.17+4`, `2.81-9`) by round-trip error.
pub fn format_real(value: f64) -> Result<String, EncodingError> {
    if !value.is_finite() {
        return Err(EncodingError::NonFinite {
            card: String::new(),
            value,
        });
    }
    if value == 0.0 {
        return Ok("0.".to_string());
    }

    let candidates = [fixed_candidate(value), exponent_candidate(value)];
    candidates
        .into_iter()
        .flatten()
        .map(|s| {
            let err = parse_real(&s).map_or(f64::INFINITY, |back| ((back - value) / value).abs());
            (err, s)
        })
        // min_by keeps the first on ties, which favours fixed point
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, s)| s)
        .ok_or_else(|| EncodingError::FieldOverflow {
            card: String::new(),
            value: value.to_string(),
        })
}

fn fixed_candidate(value: f64) -> Option<String> {
    (0..FIELD_WIDTH).rev().find_map(|decimals| {
        let raw = format!("{value:.decimals$}");
        let s = trim_mantissa(&raw);
        (s.len() <= FIELD_WIDTH).then_some(s)
    })
}

fn exponent_candidate(value: f64) -> Option<String> {
    (0..FIELD_WIDTH - 1).rev().find_map(|digits| {
        let raw = format!("{value:.digits$e}");
        let (mantissa, exponent) = raw.split_once('e')?;
        let exponent: i32 = exponent.parse().ok()?;
        let sign = if exponent < 0 { '-' } else { '+' };
        let s = format!("{}{}{}", trim_mantissa(mantissa), sign, exponent.abs());
        (s.len() <= FIELD_WIDTH).then_some(s)
    })
}

/// `1.500000` → `1.5`, `3` → `3.`, `7.000` → `7.`
fn trim_mantissa(raw: &str) -> String {
    if raw.contains('.') {
        let trimmed = raw.trim_end_matches('0');
        trimmed.to_string()
    } else {
        format!("{raw}.")
    }
}

/// Parses a bulk-data real, including the compact exponent forms
/// (`1.5+3`, `2.81-9`, `1.D-3`) and plain integers.
pub fn parse_real(field: &str) -> Option<f64> {
    let s = field.trim().to_ascii_uppercase().replace('D', "E");
    if s.is_empty() {
        return None;
    }
    if let Ok(v) = s.parse::<f64>() {
        return v.is_finite().then_some(v);
    }
    // an exponent sign is any +/- after the first character not preceded by E
    let bytes = s.as_bytes();
    let split = (1..bytes.len())
        .find(|&i| (bytes[i] == b'+' || bytes[i] == b'-') && bytes[i - 1] != b'E')?;
    let normalized = format!("{}E{}", &s[..split], &s[split..]);
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Right-pads a token to one field width.
pub fn pad(token: &str) -> String {
    format!("{token:<width$}", width = FIELD_WIDTH)
}

/// A bulk-data card under construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub name: String,
    pub fields: Vec<Field>,
}

impl Card {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: impl Into<Field>) -> Self {
        self.fields.push(field.into());
        self
    }

    pub fn blank(mut self) -> Self {
        self.fields.push(Field::Blank);
        self
    }

    pub fn blanks(mut self, count: usize) -> Self {
        self.fields.extend(std::iter::repeat_n(Field::Blank, count));
        self
    }

    pub fn fields<I, F>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<Field>,
    {
        self.fields.extend(items.into_iter().map(Into::into));
        self
    }

    /// Encodes the card into one or more newline-terminated lines.
    pub fn encode(&self) -> Result<String, EncodingError> {
        if self.name.is_empty() || self.name.len() > FIELD_WIDTH {
            return Err(EncodingError::CardName(self.name.clone()));
        }
        let tokens = self
            .fields
            .iter()
            .map(|f| f.encode().map_err(|e| e.in_card(&self.name)))
            .collect::<Result<Vec<_>, _>>()?;

        if tokens.is_empty() {
            return Ok(format!("{}\n", self.name));
        }

        let mut out = String::new();
        for (i, chunk) in tokens.chunks(FIELDS_PER_LINE).enumerate() {
            let mut line = pad(if i == 0 {
                &self.name
            } else {
                CONTINUATION_MARKER
            });
            for token in chunk {
                line.push_str(&pad(token));
            }
            out.push_str(line.trim_end());
            out.push('\n');
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_fit_or_fail() {
        assert_eq!(format_int(99_999_999).unwrap(), "99999999");
        assert!(matches!(
            format_int(100_000_000),
            Err(EncodingError::FieldOverflow { .. })
        ));
    }

    #[test]
    fn reals_use_compact_exponent_when_needed() {
        assert_eq!(format_real(71_700.0).unwrap(), "71700.");
        assert_eq!(format_real(2.81e-9).unwrap(), "2.81-9");
        assert_eq!(format_real(0.33).unwrap(), "0.33");
        assert_eq!(format_real(1.0).unwrap(), "1.");
        assert_eq!(format_real(-1.5e-12).unwrap(), "-1.5-12");
        assert_eq!(format_real(0.0).unwrap(), "0.");
    }

    #[test]
    fn reals_never_exceed_field_width() {
        for v in [
            1.0 / 3.0,
            123_456_789.0,
            -9.876_543_21e-7,
            2.0_f64.sqrt() * 1e20,
            513_333.333,
            1.225e-12,
        ] {
            let s = format_real(v).unwrap();
            assert!(s.len() <= FIELD_WIDTH, "{s} too wide");
            let back = parse_real(&s).unwrap();
            assert!(((back - v) / v).abs() < 1e-3, "{v} -> {s} -> {back}");
        }
    }

    #[test]
    fn non_finite_reals_are_rejected() {
        assert!(matches!(
            format_real(f64::NAN),
            Err(EncodingError::NonFinite { .. })
        ));
        assert!(format_real(f64::INFINITY).is_err());
    }

    #[test]
    fn parse_real_understands_nastran_forms() {
        assert_eq!(parse_real("7.17+4"), Some(71_700.0));
        assert_eq!(parse_real("1.5E+3"), Some(1500.0));
        assert_eq!(parse_real("1.D-3"), Some(1e-3));
        assert_eq!(parse_real(" 12 "), Some(12.0));
        assert_eq!(parse_real("-2.5-1"), Some(-0.25));
        assert!((parse_real("2.81-9").unwrap() - 2.81e-9).abs() < 1e-20);
        assert_eq!(parse_real(""), None);
        assert_eq!(parse_real("ABC"), None);
    }

    #[test]
    fn long_cards_continue_with_plus_lines() {
        let card = Card::new("SET1").field(100u32).fields(1u32..=10);
        let text = card.encode().unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("SET1    100     1       2"));
        assert!(lines[1].starts_with("+       8       9       10"));
    }

    #[test]
    fn unsigned_conversion_checks_field_width() {
        assert_eq!(Field::try_from(42usize), Ok(Field::Int(42)));
        assert_eq!(Field::try_from(99_999_999u64), Ok(Field::Int(99_999_999)));
        assert_eq!(
            Field::try_from(100_000_000usize),
            Err(EncodingError::FieldOverflow {
                card: String::new(),
                value: "100000000".to_string()
            })
        );
        assert!(matches!(
            Field::try_from(u64::MAX),
            Err(EncodingError::FieldOverflow { .. })
        ));
    }

    #[test]
    fn card_reports_overflowing_field() {
        let err = Card::new("GRID")
            .field(123_456_789u32)
            .encode()
            .unwrap_err();
        assert_eq!(
            err,
            EncodingError::FieldOverflow {
                card: "GRID".to_string(),
                value: "123456789".to_string()
            }
        );
        assert!(Card::new("TOOLONGNAME").encode().is_err());
    }
}
