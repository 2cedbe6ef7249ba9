use crate::parser::prelude::{BinaryOperator, Type, UnaryOperator};
use super::symbol_table::ClassTable;

/// The wider of two numeric types.
pub fn wider(left: &Type, right: &Type) -> Type {
    let ty = match left.numeric_rank() >= right.numeric_rank() {
        true => left.clone(),
        false => right.clone(),
    };

    // char arithmetic yields a number, not a char
    match ty {
        Type::Char => Type::Int,
        ty => ty,
    }
}

/// Result type of a binary operator, `None` when the operands do not fit.
pub fn binary_type(operator: BinaryOperator, left: &Type, right: &Type) -> Option<Type> {
    if operator.is_comparison() || operator.is_logical() {
        if matches!(operator, BinaryOperator::Less | BinaryOperator::LessEq
            | BinaryOperator::Greater | BinaryOperator::GreaterEq)
        {
            let ordered = |ty: &Type| ty.is_numeric() || ty.is_permissive() || *ty == Type::String;

            if !ordered(left) || !ordered(right) {
                return None;
            }
        }

        return Some(Type::Bool);
    }

    if operator == BinaryOperator::Add && (*left == Type::String || *right == Type::String) {
        return Some(Type::String);
    }

    if *left == Type::Error || *right == Type::Error {
        return Some(Type::Error);
    }

    if left.is_permissive() || right.is_permissive() {
        return Some(Type::Any);
    }

    if !left.is_numeric() || !right.is_numeric() {
        return None;
    }

    match operator.is_bitwise() {
        true if *left == Type::Long || *right == Type::Long => Some(Type::Long),
        true => Some(Type::Int),
        false => Some(wider(left, right)),
    }
}

pub fn unary_type(operator: UnaryOperator, operand: &Type) -> Option<Type> {
    match operator {
        UnaryOperator::Not => Some(Type::Bool),
        _ if operand.is_permissive() => Some(operand.clone()),
        UnaryOperator::BitNot if operand.is_numeric() => Some(Type::Int),
        UnaryOperator::Negate | UnaryOperator::Plus if operand.is_numeric() => Some(wider(operand, operand)),
        UnaryOperator::Increment | UnaryOperator::Decrement if operand.is_numeric() => Some(operand.clone()),
        _ => None
    }
}

/// Whether a value of type `got` may be stored where `expected` is declared.
/// Beyond identical and permissive types this accepts numeric widening,
/// `null` for reference types and subclasses for their ancestors.
pub fn is_assignable(expected: &Type, got: &Type, classes: &ClassTable) -> bool {
    if expected == got || expected.is_permissive() || got.is_permissive() || *expected == Type::Object {
        return true;
    }

    if expected.is_numeric() && got.is_numeric() {
        return got.numeric_rank() <= expected.numeric_rank();
    }

    if *got == Type::Null {
        return expected.is_reference();
    }

    match (expected, got) {
        (Type::Named(expected), Type::Named(got)) => classes.is_subtype(got, expected),
        (Type::Array(expected), Type::Array(got)) => is_assignable(expected, got, classes),
        (expected, got) if expected.is_array() && got.is_array() => {
            is_assignable(&expected.element_type(), &got.element_type(), classes)
        },
        (Type::Generic { name: a, arguments: left }, Type::Generic { name: b, arguments: right }) => {
            a == b && (left.is_empty() || right.is_empty() || left.iter()
                .zip(right)
                .all(|(expected, got)| is_assignable(expected, got, classes)))
        },
        _ => false
    }
}

/// Type that covers both branches of a ternary or both elements of an
/// array literal.
pub fn common_type(left: &Type, right: &Type, classes: &ClassTable) -> Type {
    if left == right {
        return left.clone();
    }

    if left.is_numeric() && right.is_numeric() {
        return wider(left, right);
    }

    match (left, right) {
        (Type::Null, other) | (other, Type::Null) if other.is_reference() => other.clone(),
        (Type::Named(a), Type::Named(b)) if classes.is_subtype(a, b) => right.clone(),
        (Type::Named(a), Type::Named(b)) if classes.is_subtype(b, a) => left.clone(),
        _ => Type::Any
    }
}

pub fn is_condition(ty: &Type) -> bool {
    *ty == Type::Bool || ty.is_permissive()
}

/// Result types of the built-ins whose result is known statically.
pub fn builtin_type(name: &str) -> Type {
    match name {
        "to_string" | "string_concat" | "string_upper" | "string_lower" | "string_substring"
        | "typeof" | "get_input" => Type::String,
        "string_length" | "len" | "string_index_of" => Type::Int,
        "to_number" | "sqrt" | "abs" | "floor" | "ceil" | "pow" | "time_ms" => Type::Double,
        "print" | "println" => Type::Void,
        _ => Type::Any,
    }
}
