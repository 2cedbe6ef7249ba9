use std::cmp::Ordering;

use crate::{
    environment::prelude::{Value, FALSE, TRUE},
    parser::prelude::{BinaryOperator, UnaryOperator}
};

/// Why a binary operation produced no ordinary value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorFault {
    /// `/` or `%` with a zero divisor. The result is `NaN`.
    DivisionByZero,
    InvalidOperands,
}

/// Applies `operator` to two numbers. `None` when the operator is not
/// numeric or the divisor of `/` and `%` is zero.
///
/// ```text
/// numeric(Add, 2, 3)               -> 5
/// numeric(Less, 2, 3)              -> true
/// numeric(Div, 1, 0)               -> None
/// numeric(UnsignedShiftRight, -1, 28) -> 15
/// ```
pub fn numeric(operator: BinaryOperator, left: f64, right: f64) -> Option<Value> {
    let value = match operator {
        BinaryOperator::Add => left + right,
        BinaryOperator::Sub => left - right,
        BinaryOperator::Mul => left * right,
        BinaryOperator::Div if right != 0.0 => left / right,
        BinaryOperator::Mod if right.trunc() != 0.0 => left.trunc() % right.trunc(),
        BinaryOperator::Eq => return Some(Value::Bool(left == right)),
        BinaryOperator::NotEq => return Some(Value::Bool(left != right)),
        BinaryOperator::Less => return Some(Value::Bool(left < right)),
        BinaryOperator::LessEq => return Some(Value::Bool(left <= right)),
        BinaryOperator::Greater => return Some(Value::Bool(left > right)),
        BinaryOperator::GreaterEq => return Some(Value::Bool(left >= right)),
        BinaryOperator::BitAnd => ((left as i64) & (right as i64)) as f64,
        BinaryOperator::BitOr => ((left as i64) | (right as i64)) as f64,
        BinaryOperator::BitXor => ((left as i64) ^ (right as i64)) as f64,
        BinaryOperator::ShiftLeft => (left as i64).wrapping_shl(shift(right, 63)) as f64,
        BinaryOperator::ShiftRight => (left as i64).wrapping_shr(shift(right, 63)) as f64,
        // 32-bit logical shift, negative operands are reinterpreted as unsigned
        BinaryOperator::UnsignedShiftRight => ((left as i64 as u32) >> shift(right, 31)) as f64,
        _ => return None
    };

    Some(Value::Number(value))
}

fn shift(amount: f64, mask: i64) -> u32 {
    ((amount as i64) & mask) as u32
}

fn compare_text(operator: BinaryOperator, left: &str, right: &str) -> Value {
    let ordering = left.cmp(right);

    let result = match operator {
        BinaryOperator::Eq => ordering == Ordering::Equal,
        BinaryOperator::NotEq => ordering != Ordering::Equal,
        BinaryOperator::Less => ordering == Ordering::Less,
        BinaryOperator::LessEq => ordering != Ordering::Greater,
        BinaryOperator::Greater => ordering == Ordering::Greater,
        _ => ordering != Ordering::Less,
    };

    Value::Bool(result)
}

/// Runtime semantics of every binary operator. `&&` and `||` are
/// short-circuited by the caller, here they only combine truthiness.
pub fn binary(operator: BinaryOperator, left: &Value, right: &Value) -> Result<Value, OperatorFault> {
    match operator {
        BinaryOperator::Add => match (left, right) {
            (Value::Number(l), Value::Number(r)) => Ok(Value::Number(l + r)),
            _ => Ok(Value::String(format!("{left}{right}"))),
        },
        BinaryOperator::And => Ok(Value::Bool(left.is_truthy() && right.is_truthy())),
        BinaryOperator::Or => Ok(Value::Bool(left.is_truthy() || right.is_truthy())),
        operator if operator.is_comparison() => match (left, right) {
            (Value::Number(l), Value::Number(r)) => numeric(operator, *l, *r)
                .ok_or(OperatorFault::InvalidOperands),
            _ => Ok(compare_text(operator, &left.to_string(), &right.to_string())),
        },
        operator => {
            let (l, r) = left.as_number()
                .zip(right.as_number())
                .ok_or(OperatorFault::InvalidOperands)?;

            match numeric(operator, l, r) {
                Some(value) => Ok(value),
                None if matches!(operator, BinaryOperator::Div | BinaryOperator::Mod) => {
                    Err(OperatorFault::DivisionByZero)
                },
                None => Err(OperatorFault::InvalidOperands),
            }
        }
    }
}

/// Value-producing unary operators. `++` and `--` return the updated value,
/// writing it back is up to the caller.
pub fn unary(operator: UnaryOperator, operand: &Value) -> Option<Value> {
    match operator {
        UnaryOperator::Not => Some(match operand.is_truthy() {
            true => FALSE,
            false => TRUE,
        }),
        UnaryOperator::Negate => operand.as_number().map(|value| Value::Number(-value)),
        UnaryOperator::Plus => operand.as_number().map(Value::Number),
        UnaryOperator::BitNot => operand.as_number().map(|value| Value::Number(!(value as i64) as f64)),
        UnaryOperator::Increment => operand.as_number().map(|value| Value::Number(value + 1.0)),
        UnaryOperator::Decrement => operand.as_number().map(|value| Value::Number(value - 1.0)),
    }
}
