//! Cell value formatting.
//!
//! Each column type has a formatter:
//! - `FinanceFloat`: grouped thousands, exactly two decimals (`1,234.50`)
//! - `FinanceInteger`: grouped thousands, up to three decimals (`1,234`)
//! - `FinanceDate`: `M/D/YYYY, h:mm:ss AM` from epoch milliseconds (UTC)
//! - `FinanceTree`: tree labels, formatted by the type of the pivot at that depth
//!
//! All formatters pass strings through unchanged and render missing values as `-`.

use chrono::{DateTime, Datelike, Timelike};
use serde::Serialize;

use crate::config::GridConfig;
use crate::types::{CellValue, ValueType};

/// Text shown for a missing or unformattable value.
pub const NULL_TEXT: &str = "-";

/// Result of formatting a value, including optional color
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormattedValue {
    /// The formatted text
    pub text: String,
    /// Optional CSS color for the text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl FormattedValue {
    /// Create a new FormattedValue with just text
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: None,
        }
    }

    /// Create a new FormattedValue with text and color
    pub fn with_color(text: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: Some(color.into()),
        }
    }
}

/// Named formatter attached to a grid column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ColumnFormat {
    FinanceFloat,
    FinanceInteger,
    FinanceDate,
    /// Per-depth pivot types of the tree column.
    FinanceTree(Vec<ValueType>),
}

impl ColumnFormat {
    /// Formatter for a value column of `value_type`, if it has one.
    pub fn for_type(value_type: ValueType) -> Option<Self> {
        match value_type {
            ValueType::Float => Some(Self::FinanceFloat),
            ValueType::Integer => Some(Self::FinanceInteger),
            ValueType::Date => Some(Self::FinanceDate),
            ValueType::String | ValueType::Boolean => None,
        }
    }

    /// Format `value`; `depth` selects the pivot type for tree labels.
    pub fn format(&self, value: &CellValue, depth: usize) -> String {
        match self {
            Self::FinanceFloat => null_format(value, None, |v| v.as_f64().map(format_float)),
            Self::FinanceInteger => null_format(value, None, |v| v.as_f64().map(format_integer)),
            Self::FinanceDate => null_format(value, Some(-1), date_millis_text),
            Self::FinanceTree(levels) => match levels.get(depth).and_then(|t| Self::for_type(*t)) {
                Some(level) => level.format(value, 0),
                None => plain_text(value),
            },
        }
    }

    /// Format a tree label (row path segment) for the pivot at `depth`.
    ///
    /// Labels arrive as text; numeric and date pivots are re-parsed so they
    /// display like the values of their column.
    pub fn format_label(&self, label: &str, depth: usize) -> String {
        let Self::FinanceTree(levels) = self else {
            return label.to_string();
        };
        let Some(level) = levels.get(depth).and_then(|t| Self::for_type(*t)) else {
            return label.to_string();
        };
        match label.parse::<f64>() {
            Ok(number) if number.is_finite() => level.format(&CellValue::Float(number), 0),
            _ => label.to_string(),
        }
    }
}

/// Wrap a formatter: text passes through, missing values and `null_value`
/// become [`NULL_TEXT`], and empty output becomes [`NULL_TEXT`].
fn null_format(
    value: &CellValue,
    null_value: Option<i64>,
    format: impl Fn(&CellValue) -> Option<String>,
) -> String {
    match value {
        CellValue::String(s) => s.clone(),
        CellValue::Null => NULL_TEXT.to_string(),
        CellValue::Integer(i) if Some(*i) == null_value => NULL_TEXT.to_string(),
        other => match format(other) {
            Some(text) if !text.is_empty() => text,
            _ => NULL_TEXT.to_string(),
        },
    }
}

fn plain_text(value: &CellValue) -> String {
    match value {
        CellValue::Null => NULL_TEXT.to_string(),
        CellValue::Boolean(b) => b.to_string(),
        CellValue::Integer(i) => i.to_string(),
        CellValue::Float(f) => f.to_string(),
        CellValue::String(s) => s.clone(),
    }
}

/// Two-decimal number with thousands separators.
pub fn format_float(value: f64) -> String {
    format_with_thousands(value, 2, false)
}

/// Number with thousands separators and up to three decimals.
pub fn format_integer(value: f64) -> String {
    format_with_thousands(value, 3, true)
}

/// Epoch milliseconds as `M/D/YYYY, h:mm:ss AM` in UTC.
pub fn format_date(millis: i64) -> Option<String> {
    let dt = DateTime::from_timestamp_millis(millis)?;
    let (is_pm, hour) = dt.hour12();
    Some(format!(
        "{}/{}/{}, {}:{:02}:{:02} {}",
        dt.month(),
        dt.day(),
        dt.year(),
        hour,
        dt.minute(),
        dt.second(),
        if is_pm { "PM" } else { "AM" }
    ))
}

#[allow(clippy::cast_possible_truncation)]
fn date_millis_text(value: &CellValue) -> Option<String> {
    match value {
        CellValue::Integer(ms) => format_date(*ms),
        CellValue::Float(ms) if ms.is_finite() => format_date(ms.round() as i64),
        _ => None,
    }
}

/// Format number with thousands separators
fn format_with_thousands(value: f64, decimals: usize, trim_zeros: bool) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value < 0.0 { "-∞" } else { "∞" }.to_string();
    }

    let formatted = format!("{:.prec$}", value.abs(), prec = decimals);
    let (int_part, dec_part) = formatted.split_once('.').unwrap_or((&formatted, ""));
    let dec_part = if trim_zeros {
        dec_part.trim_end_matches('0')
    } else {
        dec_part
    };

    // Add thousands separators
    let mut with_sep = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_sep.push(',');
        }
        with_sep.push(c);
    }
    let int_with_sep: String = with_sep.chars().rev().collect();

    let result = if dec_part.is_empty() {
        int_with_sep
    } else {
        format!("{int_with_sep}.{dec_part}")
    };

    let is_zero = result.bytes().all(|b| matches!(b, b'0' | b'.' | b','));
    if value < 0.0 && !(trim_zeros && is_zero) {
        format!("-{result}")
    } else {
        result
    }
}

/// Display text and color of a data cell.
///
/// Missing values show as `-`. Numeric cells are colored by sign, with zero
/// shown as `0.00` (float) or `0` (integer) and NaN as `-`. Booleans show as
/// `true`/`false`. Everything else goes through the column's formatter.
#[allow(clippy::float_cmp)]
pub fn cell_style(
    value: &CellValue,
    value_type: ValueType,
    config: &GridConfig,
) -> FormattedValue {
    if value.is_null() {
        return FormattedValue::new(NULL_TEXT);
    }
    if value_type.is_numeric() {
        if let Some(number) = value.as_f64() {
            if number == 0.0 {
                let zero = if value_type == ValueType::Float { "0.00" } else { "0" };
                return FormattedValue::new(zero);
            }
            if number.is_nan() {
                return FormattedValue::new(NULL_TEXT);
            }
            let color = if number >= 0.0 {
                &config.positive_color
            } else {
                &config.negative_color
            };
            let text = ColumnFormat::for_type(value_type)
                .map_or_else(|| plain_text(value), |f| f.format(value, 0));
            return FormattedValue::with_color(text, color.as_str());
        }
    }
    match (value_type, value) {
        (ValueType::Boolean, CellValue::Boolean(b)) => FormattedValue::new(b.to_string()),
        _ => FormattedValue::new(
            ColumnFormat::for_type(value_type)
                .map_or_else(|| plain_text(value), |f| f.format(value, 0)),
        ),
    }
}
