//! Per-field validator callables and the runner that applies them.

use std::sync::Arc;

use thiserror::Error;

use crate::error_tree::ErrorTree;
use crate::record::Record;
use crate::value::Value;

/// A validator's rejection. The message lands in the error tree verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct FieldInvalid {
    pub message: String,
}

impl FieldInvalid {
    pub fn new(message: impl Into<String>) -> Self { Self { message: message.into() } }
}

pub type Validator = Arc<dyn Fn(&Value) -> Result<(), FieldInvalid> + Send + Sync>;

pub fn validator<F>(f: F) -> Validator
where
    F: Fn(&Value) -> Result<(), FieldInvalid> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Run every field's validators in declaration order. Fields that already
/// carry an error are skipped; when several validators of one field reject,
/// the last rejection is the one recorded.
pub fn run_validators(record: &Record, errors: &mut ErrorTree) {
    for spec in record.schema().fields() {
        if spec.validators.is_empty() || errors.contains(&spec.name) {
            continue;
        }
        let Some(value) = record.get(&spec.name) else { continue };
        for check in &spec.validators {
            if let Err(invalid) = check(value) {
                errors.insert_message(spec.name.clone(), invalid.message);
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// STOCK VALIDATORS
// ————————————————————————————————————————————————————————————————————————————

/// Validators registered by [`crate::Registry::with_stock_validators`], by name.
pub fn stock() -> Vec<(&'static str, Validator)> {
    vec![
        ("non_negative", validator(non_negative)),
        ("positive", validator(positive)),
        ("odd", validator(odd)),
        ("even", validator(even)),
        ("non_empty", validator(non_empty)),
    ]
}

fn number(value: &Value) -> Result<f64, FieldInvalid> {
    match value {
        Value::Int(_) | Value::Float(_) => value.as_f64().ok_or_else(|| FieldInvalid::new("not a number")),
        other => Err(FieldInvalid::new(format!("{other} is not a number."))),
    }
}

fn integer(value: &Value) -> Result<i64, FieldInvalid> {
    value.as_i64().ok_or_else(|| FieldInvalid::new(format!("{value} is not an integer.")))
}

pub fn non_negative(value: &Value) -> Result<(), FieldInvalid> {
    if number(value)? < 0.0 {
        return Err(FieldInvalid::new("The given number is negative."));
    }
    Ok(())
}

pub fn positive(value: &Value) -> Result<(), FieldInvalid> {
    if number(value)? <= 0.0 {
        return Err(FieldInvalid::new("The given number is not greater than 0."));
    }
    Ok(())
}

pub fn odd(value: &Value) -> Result<(), FieldInvalid> {
    if integer(value)? % 2 == 0 {
        return Err(FieldInvalid::new("The given integer is not an odd number."));
    }
    Ok(())
}

pub fn even(value: &Value) -> Result<(), FieldInvalid> {
    if integer(value)? % 2 != 0 {
        return Err(FieldInvalid::new("The given integer is not an even number."));
    }
    Ok(())
}

pub fn non_empty(value: &Value) -> Result<(), FieldInvalid> {
    match value.len() {
        Some(0) => Err(FieldInvalid::new("The given value is empty.")),
        Some(_) => Ok(()),
        None => Err(FieldInvalid::new(format!("{value} has no length."))),
    }
}
