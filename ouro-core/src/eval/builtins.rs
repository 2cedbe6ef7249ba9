use std::{
    collections::{HashMap, HashSet},
    fmt::Debug,
    rc::Rc,
    time::{SystemTime, UNIX_EPOCH}
};

use crate::environment::prelude::Value;
use super::output::Output;

pub type NativeFunction = Rc<dyn Fn(&dyn Output, &[Value]) -> Value>;

/// Registry of host functions callable from programs by name. Arguments
/// are evaluated eagerly and passed as is.
#[derive(Clone)]
pub struct Builtins {
    functions: HashMap<String, NativeFunction>,
}

impl Debug for Builtins {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names = self.functions.keys().collect::<Vec<&String>>();
        names.sort();

        f.debug_struct("Builtins").field("functions", &names).finish()
    }
}

impl Default for Builtins {
    fn default() -> Self {
        Self::new()
    }
}

impl Builtins {
    /// The standard library.
    pub fn new() -> Self {
        let mut builtins = Self::empty();

        builtins.register("print", print);
        builtins.register("println", print);
        builtins.register("to_string", to_string);
        builtins.register("string_concat", string_concat);
        builtins.register("string_length", string_length);
        builtins.register("get_input", get_input);

        builtins.register("len", len);
        builtins.register("typeof", type_of);
        builtins.register("to_number", to_number);
        builtins.register("string_upper", |_, args| text(args, 0).to_uppercase().into());
        builtins.register("string_lower", |_, args| text(args, 0).to_lowercase().into());
        builtins.register("string_substring", string_substring);
        builtins.register("string_index_of", string_index_of);

        builtins.register("array_push", array_push);
        builtins.register("array_pop", array_pop);
        builtins.register("map_keys", map_keys);
        builtins.register("map_get", map_get);
        builtins.register("map_set", map_set);

        builtins.register("sqrt", |_, args| Value::Number(number(args, 0).sqrt()));
        builtins.register("abs", |_, args| Value::Number(number(args, 0).abs()));
        builtins.register("floor", |_, args| Value::Number(number(args, 0).floor()));
        builtins.register("ceil", |_, args| Value::Number(number(args, 0).ceil()));
        builtins.register("pow", |_, args| Value::Number(number(args, 0).powf(number(args, 1))));
        builtins.register("time_ms", time_ms);

        builtins
    }

    pub fn empty() -> Self {
        Self {
            functions: HashMap::new()
        }
    }

    pub fn register<F>(&mut self, name: impl Into<String>, function: F)
    where
        F: Fn(&dyn Output, &[Value]) -> Value + 'static
    {
        let _ = self.functions.insert(name.into(), Rc::new(function));
    }

    pub fn get(&self, name: &str) -> Option<NativeFunction> {
        self.functions.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn names(&self) -> HashSet<String> {
        self.functions.keys().cloned().collect()
    }
}

fn text(args: &[Value], idx: usize) -> String {
    args.get(idx).map(Value::to_string).unwrap_or_default()
}

fn number(args: &[Value], idx: usize) -> f64 {
    args.get(idx)
        .and_then(Value::as_number)
        .unwrap_or(f64::NAN)
}

fn print(output: &dyn Output, args: &[Value]) -> Value {
    let line = args.iter()
        .map(Value::to_string)
        .collect::<Vec<String>>()
        .join(" ");

    output.write(&format!("{line}\n"));
    Value::Undefined
}

fn to_string(_: &dyn Output, args: &[Value]) -> Value {
    Value::String(text(args, 0))
}

fn string_concat(_: &dyn Output, args: &[Value]) -> Value {
    Value::String(args.iter().map(Value::to_string).collect())
}

fn string_length(_: &dyn Output, args: &[Value]) -> Value {
    Value::Number(text(args, 0).chars().count() as f64)
}

/// Writes the optional prompt and reads one line, `null` at end of input.
fn get_input(output: &dyn Output, args: &[Value]) -> Value {
    if let Some(prompt) = args.first() {
        output.write(&prompt.to_string());
    }

    match output.read_line() {
        Some(line) => Value::String(line),
        None => Value::Null,
    }
}

fn len(_: &dyn Output, args: &[Value]) -> Value {
    match args.first().and_then(Value::length) {
        Some(length) => Value::Number(length as f64),
        None => Value::Undefined,
    }
}

fn type_of(_: &dyn Output, args: &[Value]) -> Value {
    let value = args.first().unwrap_or(&Value::Undefined);
    Value::string(value.type_name())
}

fn to_number(_: &dyn Output, args: &[Value]) -> Value {
    match args.first() {
        Some(Value::Bool(value)) => Value::Number(*value as u8 as f64),
        _ => Value::Number(number(args, 0)),
    }
}

/// `string_substring(s, start[, end])` over characters, bounds are clamped.
fn string_substring(_: &dyn Output, args: &[Value]) -> Value {
    let chars = text(args, 0).chars().collect::<Vec<char>>();

    let clamp = |value: f64| match value.is_nan() {
        true => 0,
        false => (value.max(0.0) as usize).min(chars.len()),
    };

    let start = clamp(number(args, 1));
    let end = match args.get(2) {
        Some(_) => clamp(number(args, 2)),
        None => chars.len(),
    };

    match start < end {
        true => Value::String(chars[start..end].iter().collect()),
        false => Value::string(""),
    }
}

/// Character index of the first occurrence, `-1` when absent.
fn string_index_of(_: &dyn Output, args: &[Value]) -> Value {
    let haystack = text(args, 0);
    let needle = text(args, 1);

    match haystack.find(&needle) {
        Some(byte_idx) => Value::Number(haystack[..byte_idx].chars().count() as f64),
        None => Value::Number(-1.0),
    }
}

fn array_push(_: &dyn Output, args: &[Value]) -> Value {
    let mut elements = match args.first() {
        Some(Value::Array(elements)) => elements.borrow().clone(),
        _ => vec![],
    };

    elements.extend(args.iter().skip(1).cloned());
    Value::array(elements)
}

/// Removes and returns the last element of the array in place.
fn array_pop(_: &dyn Output, args: &[Value]) -> Value {
    match args.first() {
        Some(Value::Array(elements)) => elements.borrow_mut()
            .pop()
            .unwrap_or(Value::Undefined),
        _ => Value::Undefined,
    }
}

fn map_keys(_: &dyn Output, args: &[Value]) -> Value {
    match args.first() {
        Some(Value::Map(entries)) => Value::array(
            entries.borrow()
                .iter()
                .map(|(key, _)| Value::string(key.clone()))
                .collect()
        ),
        _ => Value::array(vec![]),
    }
}

fn map_get(_: &dyn Output, args: &[Value]) -> Value {
    let key = text(args, 1);

    match args.first() {
        Some(Value::Map(entries)) => entries.borrow()
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value.clone())
            .unwrap_or(Value::Undefined),
        _ => Value::Undefined,
    }
}

/// Inserts or replaces an entry in place and returns the map.
fn map_set(_: &dyn Output, args: &[Value]) -> Value {
    let Some(map @ Value::Map(entries)) = args.first() else {
        return Value::Undefined;
    };

    let key = text(args, 1);
    let value = args.get(2).cloned().unwrap_or(Value::Undefined);

    {
        let mut entries = entries.borrow_mut();

        match entries.iter_mut().find(|(name, _)| *name == key) {
            Some(entry) => entry.1 = value,
            None => entries.push((key, value)),
        }
    }

    map.clone()
}

fn time_ms(_: &dyn Output, _: &[Value]) -> Value {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as f64)
        .unwrap_or_default();

    Value::Number(millis)
}
