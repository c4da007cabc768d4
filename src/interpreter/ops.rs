//! Binary operator semantics over runtime values.

use crate::lexer::BinOp;

use super::{RuntimeError, Value};

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Int(value) => Some(*value as f64),
        Value::Float(value) => Some(*value),
        _ => None,
    }
}

fn equal(left: &Value, right: &Value) -> bool {
    if let (Some(l), Some(r)) = (numeric(left), numeric(right)) {
        return l == r;
    }

    match (left, right) {
        (Value::Str(l), Value::Str(r)) => l == r,
        (Value::Bool(l), Value::Bool(r)) => l == r,
        (Value::List(l), Value::List(r)) => {
            l.len() == r.len() && l.iter().zip(r).all(|(a, b)| equal(a, b))
        }
        (Value::Void, Value::Void) => true,
        _ => false,
    }
}

fn same_type(left: &Value, right: &Value) -> bool {
    left.type_name() == right.type_name()
}

fn mismatch(op: &str, left: &Value, right: &Value) -> RuntimeError {
    RuntimeError::type_error(format!(
        "cannot apply '{op}' to {} and {}",
        left.type_name(),
        right.type_name()
    ))
}

/// Apply a binary operator. `Assign` is not handled here; it needs the
/// scope and lives in the evaluator.
pub fn binary(op: BinOp, left: Value, right: Value) -> Result<Value, RuntimeError> {
    match op {
        BinOp::Add => match (&left, &right) {
            (Value::Int(l), Value::Int(r)) => Ok(Value::Int(l + r)),
            (Value::Str(l), Value::Str(r)) => Ok(Value::Str(format!("{l}{r}"))),
            (Value::List(l), Value::List(r)) => {
                Ok(Value::List(l.iter().chain(r).cloned().collect()))
            }
            _ => match (numeric(&left), numeric(&right)) {
                (Some(l), Some(r)) => Ok(Value::Float(l + r)),
                _ => Err(mismatch("+", &left, &right)),
            },
        },
        BinOp::Subtract => match (&left, &right) {
            (Value::Int(l), Value::Int(r)) => Ok(Value::Int(l - r)),
            _ => match (numeric(&left), numeric(&right)) {
                (Some(l), Some(r)) => Ok(Value::Float(l - r)),
                _ => Err(mismatch("-", &left, &right)),
            },
        },
        BinOp::Multiply => match (&left, &right) {
            (Value::Int(l), Value::Int(r)) => Ok(Value::Int(l * r)),
            _ => match (numeric(&left), numeric(&right)) {
                (Some(l), Some(r)) => Ok(Value::Float(l * r)),
                _ => Err(mismatch("*", &left, &right)),
            },
        },
        // division is always carried out on floats
        BinOp::Divide => match (numeric(&left), numeric(&right)) {
            (Some(l), Some(r)) => Ok(Value::Float(l / r)),
            _ => Err(mismatch("/", &left, &right)),
        },
        BinOp::Equal => Ok(Value::Bool(equal(&left, &right))),
        BinOp::Unequal => Ok(Value::Bool(!equal(&left, &right))),
        BinOp::EqualStrict => Ok(Value::Bool(
            same_type(&left, &right) && equal(&left, &right),
        )),
        BinOp::UnequalStrict => Ok(Value::Bool(
            !same_type(&left, &right) || !equal(&left, &right),
        )),
        BinOp::Greater => match (&left, &right) {
            (Value::Str(l), Value::Str(r)) => Ok(Value::Bool(l > r)),
            _ => match (numeric(&left), numeric(&right)) {
                (Some(l), Some(r)) => Ok(Value::Bool(l > r)),
                _ => Err(mismatch(">", &left, &right)),
            },
        },
        BinOp::Lesser => match (&left, &right) {
            (Value::Str(l), Value::Str(r)) => Ok(Value::Bool(l < r)),
            _ => match (numeric(&left), numeric(&right)) {
                (Some(l), Some(r)) => Ok(Value::Bool(l < r)),
                _ => Err(mismatch("<", &left, &right)),
            },
        },
        // AND/OR yield the deciding operand, not a coerced bool
        BinOp::And => Ok(if left.truthy() { right } else { left }),
        BinOp::Or => Ok(if left.truthy() { left } else { right }),
        BinOp::Nor => Ok(Value::Bool(!(left.truthy() || right.truthy()))),
        BinOp::Nand => Ok(Value::Bool(!(left.truthy() && right.truthy()))),
        BinOp::Xor => match (&left, &right) {
            (Value::Bool(l), Value::Bool(r)) => Ok(Value::Bool(l ^ r)),
            (Value::Int(l), Value::Int(r)) => Ok(Value::Int(l ^ r)),
            _ => Err(mismatch("XOR", &left, &right)),
        },
        BinOp::Assign => Err(RuntimeError::type_error("misplaced assignment")),
    }
}
