//! Field-to-value conversion
//!
//! Serialized fields and queued property writes carry their values as
//! text. [`FieldConverter`] turns that text into a [`Value`] of the slot's
//! declared type, failing with a type-cast error on malformed input.

use schem_core::{Error, Guid, Result};

use crate::record::DataField;
use crate::value::{Value, ValueType};

/// Generic converter from textual field values to runtime values
#[derive(Clone, Copy, Debug, Default)]
pub struct FieldConverter;

impl FieldConverter {
    pub fn new() -> Self {
        Self
    }

    /// Convert a serialized field's inline value to its declared type
    pub fn convert_field(&self, field: &DataField) -> Result<Value> {
        self.convert(&field.value, field.value_type)
    }

    /// Convert `raw` to a value of type `target`
    pub fn convert(&self, raw: &str, target: ValueType) -> Result<Value> {
        let text = raw.trim();
        let cast = || Error::type_cast(raw, target);

        match target {
            ValueType::Any => Ok(infer(text, raw)),
            ValueType::Bool => parse_bool(text).map(Value::Bool).ok_or_else(cast),
            ValueType::Int => parse_int(text).map(Value::Int).ok_or_else(cast),
            ValueType::UInt => text.parse::<u32>().map(Value::UInt).map_err(|_| cast()),
            ValueType::Float => parse_float(text).map(Value::Float).ok_or_else(cast),
            ValueType::String => Ok(Value::String(raw.to_string())),
            ValueType::Guid => Guid::parse(text).map(Value::Guid).map_err(|_| cast()),
            ValueType::Vec2 => parse_vector::<2>(text).map(Value::Vec2).ok_or_else(cast),
            ValueType::Vec3 => parse_vector::<3>(text).map(Value::Vec3).ok_or_else(cast),
            ValueType::Vec4 => parse_vector::<4>(text).map(Value::Vec4).ok_or_else(cast),
            ValueType::Asset => Err(cast()),
        }
    }
}

/// Infer a value from trimmed `text`; plain strings keep the `raw` input
fn infer(text: &str, raw: &str) -> Value {
    if text.is_empty() {
        return Value::None;
    }
    if let Some(b) = parse_bool_literal(text) {
        return Value::Bool(b);
    }
    if let Some(i) = parse_int(text) {
        return Value::Int(i);
    }
    if let Some(f) = parse_float(text) {
        return Value::Float(f);
    }
    match components(text).len() {
        2 => parse_vector::<2>(text).map(Value::Vec2),
        3 => parse_vector::<3>(text).map(Value::Vec3),
        4 => parse_vector::<4>(text).map(Value::Vec4),
        _ => None,
    }
    .or_else(|| Guid::parse(text).ok().map(Value::Guid))
    .unwrap_or_else(|| Value::String(raw.to_string()))
}

fn parse_bool_literal(text: &str) -> Option<bool> {
    if text.eq_ignore_ascii_case("true") {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "1" => Some(true),
        "0" => Some(false),
        _ => parse_bool_literal(text),
    }
}

fn parse_int(text: &str) -> Option<i32> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        return u32::from_str_radix(hex, 16).ok().map(|v| v as i32);
    }
    text.parse::<i32>().ok()
}

fn parse_float(text: &str) -> Option<f32> {
    let text = text.strip_suffix('f').unwrap_or(text);
    text.parse::<f32>().ok().filter(|f| f.is_finite())
}

fn components(text: &str) -> Vec<&str> {
    let inner = text
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .or_else(|| text.strip_prefix('[').and_then(|t| t.strip_suffix(']')))
        .unwrap_or(text);

    inner
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .collect()
}

fn parse_vector<const N: usize>(text: &str) -> Option<[f32; N]> {
    let parts = components(text);
    if parts.len() != N {
        return None;
    }
    let mut out = [0.0; N];
    for (slot, part) in out.iter_mut().zip(parts) {
        *slot = parse_float(part)?;
    }
    Some(out)
}
