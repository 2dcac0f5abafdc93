//! Conversion of tagged numeric text into signed values.
//!
//! Inline XBRL producers write numbers the way they appear in the printed report
//! ("1 234,56", "1.234,56", "−500") and describe them with attributes: `format`
//! names the separator convention, `scale` is a power-of-ten multiplier, `sign="-"`
//! marks a negative fact independently of the displayed text, and `decimals` states
//! the reporting precision. The normalizer never fails hard: anything it cannot read
//! becomes `None`, which callers treat exactly like an absent fact.

use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Sign {
    #[default]
    None,
    Negative,
}

impl Sign {
    pub fn from_attribute(attr: Option<&str>) -> Self {
        match attr.map(str::trim) {
            Some("-") => Sign::Negative,
            _ => Sign::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecimalConvention {
    Comma,
    Dot,
    Unspecified,
}

impl DecimalConvention {
    fn from_format(format: &str) -> Self {
        let format = format.to_lowercase().replace('-', "");
        if format.contains("commadecimal") || format.contains("numdotcomma") {
            DecimalConvention::Comma
        } else if format.contains("dotdecimal") || format.contains("numcommadot") {
            DecimalConvention::Dot
        } else {
            DecimalConvention::Unspecified
        }
    }
}

/// Formatting hints carried by a numeric fact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericHints<'a> {
    pub format: &'a str,
    pub scale: i32,
    pub sign: Sign,
    pub decimals: Option<i32>,
}

impl Default for NumericHints<'_> {
    fn default() -> Self {
        Self {
            format: "",
            scale: 0,
            sign: Sign::None,
            decimals: None,
        }
    }
}

const MINUS_GLYPHS: [char; 4] = ['\u{2212}', '\u{2013}', '\u{2012}', '\u{fe63}'];

/// Normalizes raw tagged text into `parsed × 10^scale`, with the sign attribute overriding
/// whatever sign the text itself shows.
pub fn normalize(raw: &str, hints: &NumericHints) -> Option<f64> {
    let cleaned = clean_number_text(raw, hints.format);

    let parsed = if is_zero_dash(&cleaned, hints.format) {
        0.0
    } else {
        match cleaned.parse::<f64>() {
            Ok(value) if value.is_finite() => value,
            _ => {
                debug!("Unparseable numeric text '{}' (cleaned '{}')", raw, cleaned);
                return None;
            }
        }
    };

    let mut value = parsed * 10f64.powi(hints.scale);
    if hints.sign == Sign::Negative {
        value = -value.abs();
    }

    if !value.is_finite() {
        debug!("Numeric text '{}' overflows at scale {}", raw, hints.scale);
        return None;
    }

    Some(value)
}

/// Like [`normalize`] but also hands back the decimals hint untouched, for callers that
/// must report the filed precision rather than a rounded figure.
pub fn normalize_with_precision(raw: &str, hints: &NumericHints) -> Option<(f64, Option<i32>)> {
    normalize(raw, hints).map(|value| (value, hints.decimals))
}

/// Reads a `decimals` attribute. `INF` (or a missing attribute) means exact.
pub fn parse_decimals(attr: Option<&str>) -> Option<i32> {
    let attr = attr?.trim();
    if attr.eq_ignore_ascii_case("INF") {
        return None;
    }
    attr.parse::<i32>().ok()
}

fn clean_number_text(raw: &str, format: &str) -> String {
    let mut text: String = raw.trim().to_string();

    let lowered_format = format.to_lowercase().replace('-', "");
    if lowered_format.contains("numspacecomma") || lowered_format.contains("numspacedot") {
        text.retain(|c| !c.is_whitespace());
    }

    text = match DecimalConvention::from_format(format) {
        DecimalConvention::Comma => text.replace('.', "").replace(',', "."),
        DecimalConvention::Dot => text.replace(',', ""),
        DecimalConvention::Unspecified => {
            text.retain(|c| !c.is_whitespace());
            text.replace(',', ".")
        }
    };

    text.retain(|c| !c.is_whitespace());
    text.chars()
        .map(|c| if MINUS_GLYPHS.contains(&c) { '-' } else { c })
        .collect()
}

// ixt:fixed-zero / zerodash transforms display a dash for a zero amount
fn is_zero_dash(cleaned: &str, format: &str) -> bool {
    let format = format.to_lowercase();
    (format.contains("zero") || format.contains("numdash"))
        && !cleaned.is_empty()
        && cleaned.chars().all(|c| c == '-')
}
