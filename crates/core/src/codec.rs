//! Parameter-array codec
//!
//! The upstream encodes every structured field as a flat array of
//! `{prr_label, prr_value, prr_datatype?}` entries. This module maps those
//! arrays to and from typed values, table-driven so that new labels only
//! need a row here and never touch call sites.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::CodecError;
use crate::money::Money;

/// Datetime literal format used everywhere by the upstream.
pub const DATETIME_FORMAT: &str = "%d-%m-%Y %H:%M:%S";

/// One entry of a wire parameter array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    #[serde(rename = "prr_label")]
    pub label: String,
    #[serde(rename = "prr_value")]
    pub value: String,
    #[serde(rename = "prr_datatype", skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub datatype: Option<String>,
}

impl Parameter {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            datatype: None,
        }
    }
}

/// Declared datatype of a parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Money,
    DateTime,
    Digit4,
    Text,
}

impl DataType {
    /// The wire tag, or `None` for plain text (tag omitted on the wire).
    pub fn tag(self) -> Option<&'static str> {
        match self {
            DataType::Money => Some("MONEY"),
            DataType::DateTime => Some("DATETIME"),
            DataType::Digit4 => Some("DIGIT4"),
            DataType::Text => None,
        }
    }

    fn from_tag(tag: &str) -> DataType {
        match tag {
            "MONEY" => DataType::Money,
            "DATETIME" => DataType::DateTime,
            "DIGIT4" => DataType::Digit4,
            _ => DataType::Text,
        }
    }
}

/// Declared datatype for well-known labels when the wire carries no tag.
/// Unknown labels decode as opaque text.
pub fn datatype_for(label: &str) -> DataType {
    match label {
        "AMOUNT" => DataType::Money,
        "TIMESTART" | "TIMEEND" | "LAST_MODIFIED" => DataType::DateTime,
        "ACCESS_CODE" => DataType::Digit4,
        _ => DataType::Text,
    }
}

/// A decoded parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Money(Money),
    DateTime(NaiveDateTime),
    Digit4(String),
    Text(String),
}

impl Value {
    pub fn as_money(&self) -> Option<Money> {
        match self {
            Value::Money(m) => Some(*m),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Value::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) | Value::Digit4(s) => Some(s),
            _ => None,
        }
    }

    fn datatype(&self) -> DataType {
        match self {
            Value::Money(_) => DataType::Money,
            Value::DateTime(_) => DataType::DateTime,
            Value::Digit4(_) => DataType::Digit4,
            Value::Text(_) => DataType::Text,
        }
    }

    fn literal(&self) -> String {
        match self {
            Value::Money(m) => m.to_string(),
            Value::DateTime(dt) => format_datetime(*dt),
            Value::Digit4(s) | Value::Text(s) => s.clone(),
        }
    }
}

/// Parse an upstream datetime literal (`20-02-2026 18:15:00`).
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, DATETIME_FORMAT).ok()
}

/// Format a datetime back into the upstream literal form.
pub fn format_datetime(dt: NaiveDateTime) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

/// Normalize the upstream's boolean-like strings (`true`/`false`, `YES`/`NO`).
pub fn parse_flag(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("yes") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") || value.eq_ignore_ascii_case("no") {
        Some(false)
    } else {
        None
    }
}

/// A decoded parameter array, preserving wire order for lossless re-encoding.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamSet {
    entries: Vec<(String, Value)>,
}

impl ParamSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a wire parameter array into typed values.
    ///
    /// An explicit `prr_datatype` tag wins over the label table. A malformed
    /// money/datetime/digit value fails the whole set with the offending
    /// label; callers decide whether that is fatal for the record.
    pub fn decode(params: &[Parameter]) -> Result<ParamSet, CodecError> {
        let mut entries = Vec::with_capacity(params.len());
        for param in params {
            let datatype = param
                .datatype
                .as_deref()
                .map(DataType::from_tag)
                .unwrap_or_else(|| datatype_for(&param.label));
            let value = decode_value(&param.label, &param.value, datatype)?;
            entries.push((param.label.clone(), value));
        }
        Ok(ParamSet { entries })
    }

    /// Re-encode into the wire form, emitting datatype tags for non-text values.
    pub fn encode(&self) -> Vec<Parameter> {
        self.entries
            .iter()
            .map(|(label, value)| Parameter {
                label: label.clone(),
                value: value.literal(),
                datatype: value.datatype().tag().map(str::to_string),
            })
            .collect()
    }

    /// Append a typed value (outbound payload building).
    pub fn push(&mut self, label: impl Into<String>, value: Value) {
        self.entries.push((label.into(), value));
    }

    pub fn get(&self, label: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v)
    }

    pub fn text(&self, label: &str) -> Option<&str> {
        self.get(label).and_then(Value::as_text)
    }

    pub fn money(&self, label: &str) -> Option<Money> {
        self.get(label).and_then(Value::as_money)
    }

    pub fn datetime(&self, label: &str) -> Option<NaiveDateTime> {
        self.get(label).and_then(Value::as_datetime)
    }

    pub fn flag(&self, label: &str) -> Option<bool> {
        self.text(label).and_then(parse_flag)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

fn decode_value(label: &str, value: &str, datatype: DataType) -> Result<Value, CodecError> {
    match datatype {
        DataType::Money => value.parse().map(Value::Money).map_err(|_| {
            CodecError::InvalidMoney {
                label: label.to_string(),
                value: value.to_string(),
            }
        }),
        DataType::DateTime => parse_datetime(value).map(Value::DateTime).ok_or_else(|| {
            CodecError::InvalidDateTime {
                label: label.to_string(),
                value: value.to_string(),
            }
        }),
        DataType::Digit4 => {
            if value.len() == 4 && value.bytes().all(|b| b.is_ascii_digit()) {
                Ok(Value::Digit4(value.to_string()))
            } else {
                Err(CodecError::InvalidDigits {
                    label: label.to_string(),
                    value: value.to_string(),
                })
            }
        }
        DataType::Text => Ok(Value::Text(value.to_string())),
    }
}
