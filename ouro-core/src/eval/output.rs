use std::{
    cell::RefCell,
    collections::VecDeque,
    io::{BufRead, Write},
    rc::Rc
};

/// Where program output goes and where `get_input` reads from. Kept apart
/// from the diagnostic sink so the two never interleave.
pub trait Output {
    fn write(&self, text: &str);

    fn read_line(&self) -> Option<String> {
        None
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StdOutput;

impl Output for StdOutput {
    fn write(&self, text: &str) {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();

        // a closed stdout is not the program's problem
        let _ = handle.write_all(text.as_bytes());
        let _ = handle.flush();
    }

    fn read_line(&self) -> Option<String> {
        let mut line = String::new();

        match std::io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
        }
    }
}

/// Collects output in memory and serves queued input lines.
#[derive(Debug, Clone, Default)]
pub struct BufferOutput {
    buffer: Rc<RefCell<String>>,
    input: Rc<RefCell<VecDeque<String>>>,
}

impl BufferOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input<S: Into<String>>(lines: impl IntoIterator<Item = S>) -> Self {
        let output = Self::new();
        output.input.borrow_mut().extend(lines.into_iter().map(Into::into));
        output
    }

    pub fn contents(&self) -> String {
        self.buffer.borrow().clone()
    }

    pub fn take(&self) -> String {
        std::mem::take(&mut *self.buffer.borrow_mut())
    }

    pub fn lines(&self) -> Vec<String> {
        self.buffer.borrow().lines().map(str::to_string).collect()
    }
}

impl Output for BufferOutput {
    fn write(&self, text: &str) {
        self.buffer.borrow_mut().push_str(text);
    }

    fn read_line(&self) -> Option<String> {
        self.input.borrow_mut().pop_front()
    }
}
