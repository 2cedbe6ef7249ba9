use std::collections::HashMap;

use super::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub value: Value,
    pub is_const: bool,
}

/// One activation record. Calls and blocks each get their own.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    pub name: String,
    pub is_call: bool,
    store: HashMap<String, Binding>,
}

impl Frame {
    pub fn new(name: impl Into<String>, is_call: bool) -> Self {
        Self {
            name: name.into(),
            is_call,
            store: HashMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.store.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.store.keys()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignError {
    Undefined,
    Constant,
}

/// Stack of frames with the global frame at the base. A callee's frame
/// sits directly on top of its caller's, so reads fall back to the
/// caller's bindings and then to globals.
#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    frames: Vec<Frame>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::new("global", true)]
        }
    }

    pub fn push(&mut self, name: impl Into<String>, is_call: bool) {
        self.frames.push(Frame::new(name, is_call));
    }

    pub fn pop(&mut self) -> Option<Frame> {
        match self.frames.len() {
            1 => None,
            _ => self.frames.pop()
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn current(&self) -> &Frame {
        &self.frames[self.frames.len() - 1]
    }

    pub fn globals(&self) -> &Frame {
        &self.frames[0]
    }

    /// Binds in the innermost frame, replacing an earlier binding there.
    pub fn declare(&mut self, name: String, value: Value, is_const: bool) {
        let idx = self.frames.len() - 1;
        let _ = self.frames[idx].store.insert(name, Binding { value, is_const });
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.frames.iter()
            .rev()
            .find_map(|frame| frame.store.get(name))
            .map(|binding| &binding.value)
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Writes to the nearest frame that binds `name`.
    pub fn set(&mut self, name: &str, value: Value) -> Result<(), AssignError> {
        let binding = self.frames.iter_mut()
            .rev()
            .find_map(|frame| frame.store.get_mut(name))
            .ok_or(AssignError::Undefined)?;

        if binding.is_const {
            return Err(AssignError::Constant);
        }

        binding.value = value;
        Ok(())
    }

    /// Detaches every frame above the global one so code can run against
    /// globals only. Hand the result back to [`Environment::restore`].
    pub fn enter_global(&mut self) -> Vec<Frame> {
        self.frames.split_off(1)
    }

    pub fn restore(&mut self, frames: Vec<Frame>) {
        self.frames.truncate(1);
        self.frames.extend(frames);
    }

    pub fn global_names(&self) -> Vec<String> {
        let mut names = self.globals().names().cloned().collect::<Vec<String>>();
        names.sort();
        names
    }
}
