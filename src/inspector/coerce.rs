use std::fmt::Write as _;

use bevy_ecs::name::Name;
use bevy_ecs::prelude::*;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use harrow_schema::{DisplayHint, EnumInfo, EnumValue, PropertyValue, ValueType};

use super::descriptor::{PropertyBinding, RawValue};
use crate::config::BindingConfig;
use crate::error::{BindingError, CoercionError};
use crate::scope::ModelScope;

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Renders `value` the way a text widget shows it. Coercing the result back
/// yields the same value.
pub fn render_value(
    ctx: &CoercionContext,
    value: &PropertyValue,
    display: DisplayHint,
    model_kind: Option<&str>,
) -> String {
    let separator = if display == DisplayHint::MultiLine {
        "\n"
    } else {
        ", "
    };
    match value {
        PropertyValue::Bool(b) => b.to_string(),
        PropertyValue::Int(i) => i.to_string(),
        PropertyValue::Float(f) => f.to_string(),
        PropertyValue::Text(s) => s.clone(),
        PropertyValue::Date(date) => render_date(*date, ctx.config),
        PropertyValue::Enum(value) => value.label().to_string(),
        PropertyValue::FloatArray(values) => join(values, separator),
        PropertyValue::IntArray(values) => join(values, separator),
        PropertyValue::TextArray(values) => values.join(separator),
        PropertyValue::ModelRef(None) => String::new(),
        PropertyValue::ModelRef(Some(target)) => match ctx.scope {
            Some(scope) => scope.display_name(ctx.world, ctx.origin, *target, model_kind),
            None => ctx
                .world
                .get::<Name>(*target)
                .map(|name| name.as_str().to_string())
                .unwrap_or_default(),
        },
    }
}

/// One rendered cell per element of a sequence value.
pub fn render_cells(value: &PropertyValue) -> Vec<String> {
    match value {
        PropertyValue::FloatArray(values) => values.iter().map(f64::to_string).collect(),
        PropertyValue::IntArray(values) => values.iter().map(i64::to_string).collect(),
        PropertyValue::TextArray(values) => values.clone(),
        _ => Vec::new(),
    }
}

fn join<T: ToString>(values: &[T], separator: &str) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(separator)
}

fn render_date(date: NaiveDate, config: &BindingConfig) -> String {
    let mut out = String::new();
    if write!(out, "{}", date.format(&config.display_date_format)).is_err() {
        return date.to_string();
    }
    out
}

// ---------------------------------------------------------------------------
// Coercion
// ---------------------------------------------------------------------------

/// What coercion and rendering need besides the value itself.
pub struct CoercionContext<'w> {
    pub world: &'w World,
    pub config: &'w BindingConfig,
    pub scope: Option<&'w dyn ModelScope>,
    /// The model being edited; model references resolve relative to it.
    pub origin: Entity,
}

/// Converts a raw edit into a value of the member's declared type.
///
/// `current` is the member's value before the edit; row edits start from it.
pub fn coerce(
    ctx: &CoercionContext,
    binding: &PropertyBinding,
    current: &PropertyValue,
    row: Option<usize>,
    raw: RawValue,
) -> Result<PropertyValue, BindingError> {
    let value = match row {
        Some(row) => {
            let text = raw_text(ctx, binding, raw);
            coerce_cell(ctx.config, binding, current, row, &text)?
        }
        None => coerce_whole(ctx, binding, raw)?,
    };
    check_int_range(binding, &value)?;
    Ok(value)
}

fn coerce_whole(
    ctx: &CoercionContext,
    binding: &PropertyBinding,
    raw: RawValue,
) -> Result<PropertyValue, BindingError> {
    let ty = binding.value_type;
    match raw {
        RawValue::Typed(value) if value.matches(&ty) => Ok(value),
        RawValue::Bool(value) if ty == ValueType::Bool => Ok(PropertyValue::Bool(value)),
        RawValue::Text(text) | RawValue::EnumLabel(text) => match ty {
            ValueType::Enum(info) => Ok(enum_by_label(info, &text)?),
            ValueType::ModelRef => resolve_reference(ctx, binding, &text),
            _ if ty.is_sequence() && binding.display == DisplayHint::MultiLine => {
                let canonical = text.lines().collect::<Vec<_>>().join(",");
                Ok(parse_text(ctx.config, ty, &canonical)?)
            }
            _ => Ok(parse_text(ctx.config, ty, &text)?),
        },
        other => {
            let text = raw_text(ctx, binding, other);
            match ty {
                ValueType::ModelRef => resolve_reference(ctx, binding, &text),
                _ => Ok(parse_text(ctx.config, ty, &text)?),
            }
        }
    }
}

/// Integers must fit the member's backing type, element by element for
/// sequences.
fn check_int_range(binding: &PropertyBinding, value: &PropertyValue) -> Result<(), CoercionError> {
    let Some(range) = &binding.int_range else {
        return Ok(());
    };
    let outside = match value {
        PropertyValue::Int(v) => Some(*v).filter(|v| !range.contains(v)),
        PropertyValue::IntArray(values) => values.iter().copied().find(|v| !range.contains(v)),
        _ => None,
    };
    match outside {
        Some(value) => Err(CoercionError::OutOfRange {
            value,
            min: *range.start(),
            max: *range.end(),
        }),
        None => Ok(()),
    }
}

fn raw_text(ctx: &CoercionContext, binding: &PropertyBinding, raw: RawValue) -> String {
    match raw {
        RawValue::Text(text) | RawValue::EnumLabel(text) => text,
        RawValue::Bool(value) => value.to_string(),
        RawValue::Typed(value) => render_value(ctx, &value, binding.display, binding.model_kind),
    }
}

fn enum_by_label(info: &'static EnumInfo, label: &str) -> Result<PropertyValue, CoercionError> {
    info.index_of_label(label)
        .map(|index| PropertyValue::Enum(EnumValue { info, index }))
        .ok_or_else(|| CoercionError::UnknownEnumLabel {
            type_name: info.type_name,
            label: label.to_string(),
        })
}

/// An empty name clears the reference; a name nothing answers to resolves
/// to no model.
fn resolve_reference(
    ctx: &CoercionContext,
    binding: &PropertyBinding,
    name: &str,
) -> Result<PropertyValue, BindingError> {
    if name.trim().is_empty() {
        return Ok(PropertyValue::ModelRef(None));
    }
    let scope = ctx
        .scope
        .ok_or(BindingError::MissingResource("ModelScopeService"))?;
    Ok(PropertyValue::ModelRef(scope.resolve(
        ctx.world,
        ctx.origin,
        name,
        binding.model_kind,
    )))
}

/// Culture-invariant text parsing for every non-reference value type.
pub fn parse_text(
    config: &BindingConfig,
    ty: ValueType,
    text: &str,
) -> Result<PropertyValue, CoercionError> {
    Ok(match ty {
        ValueType::Bool => PropertyValue::Bool(parse_bool(text)?),
        ValueType::Int => PropertyValue::Int(parse_int(text)?),
        ValueType::Float => PropertyValue::Float(parse_float(text)?),
        ValueType::Text => PropertyValue::Text(text.to_string()),
        ValueType::Date => PropertyValue::Date(parse_date(config, text)?),
        ValueType::Enum(info) => enum_by_label(info, text)?,
        ValueType::FloatArray => PropertyValue::FloatArray(
            split_sequence(text).map(parse_float).collect::<Result<_, _>>()?,
        ),
        ValueType::IntArray => PropertyValue::IntArray(
            split_sequence(text).map(parse_int).collect::<Result<_, _>>()?,
        ),
        ValueType::TextArray => {
            PropertyValue::TextArray(split_sequence(text).map(str::to_string).collect())
        }
        ValueType::ModelRef => {
            return Err(CoercionError::NotText {
                type_name: ty.name(),
            });
        }
    })
}

/// Splits on commas, trimming each entry and dropping empty ones.
fn split_sequence(text: &str) -> impl Iterator<Item = &str> {
    text.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn parse_bool(text: &str) -> Result<bool, CoercionError> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if text.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(CoercionError::InvalidBool {
            input: text.to_string(),
        })
    }
}

fn parse_int(text: &str) -> Result<i64, CoercionError> {
    text.trim()
        .parse()
        .map_err(|_| CoercionError::InvalidInteger {
            input: text.to_string(),
        })
}

fn parse_float(text: &str) -> Result<f64, CoercionError> {
    text.trim()
        .parse()
        .map_err(|_| CoercionError::InvalidNumber {
            input: text.to_string(),
        })
}

fn parse_date(config: &BindingConfig, text: &str) -> Result<NaiveDate, CoercionError> {
    let text = text.trim();
    config
        .date_formats
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.date_naive())
        })
        .ok_or_else(|| CoercionError::InvalidDate {
            input: text.to_string(),
        })
}

/// Sets one cell of a sequence, growing it as needed. Slots nobody set are
/// NaN, 0 or empty depending on the element type.
fn coerce_cell(
    config: &BindingConfig,
    binding: &PropertyBinding,
    current: &PropertyValue,
    row: usize,
    text: &str,
) -> Result<PropertyValue, CoercionError> {
    let text = text.trim();
    let limit = config.max_sequence_rows;
    Ok(match current {
        PropertyValue::FloatArray(values) => {
            let value = if text.is_empty() {
                f64::NAN
            } else {
                parse_float(text)?
            };
            PropertyValue::FloatArray(set_cell(values, row, value, f64::NAN, limit)?)
        }
        PropertyValue::IntArray(values) => {
            let value = if text.is_empty() { 0 } else { parse_int(text)? };
            PropertyValue::IntArray(set_cell(values, row, value, 0, limit)?)
        }
        PropertyValue::TextArray(values) => {
            PropertyValue::TextArray(set_cell(values, row, text.to_string(), String::new(), limit)?)
        }
        _ => {
            return Err(CoercionError::NotASequence {
                member: binding.target.member_name(),
            });
        }
    })
}

/// Rows past `limit` are refused unless the sequence is already that long.
fn set_cell<T: Clone>(
    values: &[T],
    row: usize,
    value: T,
    fill: T,
    limit: usize,
) -> Result<Vec<T>, CoercionError> {
    let limit = limit.max(values.len());
    let len = row
        .checked_add(1)
        .filter(|len| *len <= limit)
        .ok_or(CoercionError::RowOutOfRange { row, limit })?;
    let mut values = values.to_vec();
    if values.len() < len {
        values.resize(len, fill);
    }
    values[row] = value;
    Ok(values)
}
