use std::{cell::RefCell, fmt::Display, rc::Rc};

pub type ObjectId = u32;

pub const TRUE: Value = Value::Bool(true);
pub const FALSE: Value = Value::Bool(false);

/// Names an entry of the function registry. Methods carry their class.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionRef {
    pub name: String,
    pub class: Option<String>,
}

#[derive(Debug, Clone)]
pub enum Value {
    Undefined,
    Null,
    Number(f64),
    String(String),
    Bool(bool),
    Object(ObjectId),
    Class(String),
    Array(Rc<RefCell<Vec<Value>>>),
    Map(Rc<RefCell<Vec<(String, Value)>>>),
    Function(FunctionRef),
}

impl Value {
    pub fn array(elements: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(elements)))
    }

    pub fn map(entries: Vec<(String, Value)>) -> Self {
        Value::Map(Rc::new(RefCell::new(entries)))
    }

    pub fn string(text: impl Into<String>) -> Self {
        Value::String(text.into())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Bool(_) => "bool",
            Value::Object(_) => "object",
            Value::Class(_) => "class",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Function(_) => "function",
        }
    }

    /// Everything is true except `0`, `false`, `""`, `null` and `undefined`.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Number(value) => *value != 0.0,
            Value::String(value) => !value.is_empty(),
            Value::Bool(value) => *value,
            _ => true,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    /// Numeric view used by arithmetic: numbers as is, numeric strings parsed.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(value) => Some(*value),
            Value::String(text) => text.trim().parse::<f64>().ok(),
            _ => None
        }
    }

    /// Number of elements for the containers and characters for strings.
    pub fn length(&self) -> Option<usize> {
        match self {
            Value::String(text) => Some(text.chars().count()),
            Value::Array(elements) => Some(elements.borrow().len()),
            Value::Map(entries) => Some(entries.borrow().len()),
            _ => None
        }
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

/// Integral values print without a fractional part.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }

    if value.is_infinite() {
        return match value > 0.0 {
            true => "Infinity".to_string(),
            false => "-Infinity".to_string(),
        };
    }

    if value.fract() == 0.0 && value.abs() < 1e18 {
        return format!("{}", value as i64);
    }

    format!("{value}")
}

/// Address identifying a shared container while it is being walked.
fn container_address<T>(container: &Rc<RefCell<T>>) -> usize {
    Rc::as_ptr(container) as *const () as usize
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        equal(self, other, &mut vec![])
    }
}

/// Structural equality. A pair of containers met again while comparing
/// them is taken as equal, so cyclic values terminate.
fn equal(left: &Value, right: &Value, seen: &mut Vec<(usize, usize)>) -> bool {
    match (left, right) {
        (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
        (Value::Number(l), Value::Number(r)) => l == r,
        (Value::String(l), Value::String(r)) => l == r,
        (Value::Bool(l), Value::Bool(r)) => l == r,
        (Value::Object(l), Value::Object(r)) => l == r,
        (Value::Class(l), Value::Class(r)) => l == r,
        (Value::Function(l), Value::Function(r)) => l == r,
        (Value::Array(l), Value::Array(r)) => {
            let pair = (container_address(l), container_address(r));

            if Rc::ptr_eq(l, r) || seen.contains(&pair) {
                return true;
            }

            seen.push(pair);

            let (l, r) = (l.borrow(), r.borrow());
            l.len() == r.len() && l.iter().zip(r.iter()).all(|(l, r)| equal(l, r, seen))
        },
        (Value::Map(l), Value::Map(r)) => {
            let pair = (container_address(l), container_address(r));

            if Rc::ptr_eq(l, r) || seen.contains(&pair) {
                return true;
            }

            seen.push(pair);

            let (l, r) = (l.borrow(), r.borrow());
            l.len() == r.len() && l.iter()
                .zip(r.iter())
                .all(|((lk, lv), (rk, rv))| lk == rk && equal(lv, rv, seen))
        },
        _ => false,
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write_value(f, self, &mut vec![])
    }
}

/// A container that is already being printed further up shows as `[...]`
/// or `{...}`.
fn write_value(f: &mut std::fmt::Formatter<'_>, value: &Value, open: &mut Vec<usize>) -> std::fmt::Result {
    match value {
        Value::Undefined => write!(f, "undefined"),
        Value::Null => write!(f, "null"),
        Value::Number(value) => write!(f, "{}", format_number(*value)),
        Value::String(value) => write!(f, "{value}"),
        Value::Bool(value) => write!(f, "{value}"),
        Value::Object(id) => write!(f, "obj:{id}"),
        Value::Class(name) => write!(f, "class:{name}"),
        Value::Array(elements) => {
            let address = container_address(elements);

            if open.contains(&address) {
                return write!(f, "[...]");
            }

            open.push(address);
            write!(f, "[")?;

            for (i, element) in elements.borrow().iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                write_value(f, element, open)?;
            }

            let _ = open.pop();
            write!(f, "]")
        },
        Value::Map(entries) => {
            let address = container_address(entries);

            if open.contains(&address) {
                return write!(f, "{{...}}");
            }

            open.push(address);
            write!(f, "{{")?;

            for (i, (key, value)) in entries.borrow().iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                write!(f, "{key}:")?;
                write_value(f, value, open)?;
            }

            let _ = open.pop();
            write!(f, "}}")
        },
        Value::Function(function) => match &function.class {
            Some(class) => write!(f, "<fn {class}.{}>", function.name),
            None => write!(f, "<fn {}>", function.name),
        },
    }
}
