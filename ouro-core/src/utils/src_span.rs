use std::fmt::Display;

/// A region of source text.
///
/// `start`/`end` are byte offsets used for source excerpts, `line`/`column`
/// are the 1-based position of the first character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SrcSpan {
    pub start: u32,
    pub end: u32,
    pub line: u32,
    pub column: u32,
}

impl SrcSpan {
	pub fn new(start: u32, end: u32, line: u32, column: u32) -> Self {
		Self { start, end, line, column }
	}

	/// Span starting where `self` starts and ending where `other` ends.
	pub fn to(self, other: SrcSpan) -> Self {
		Self {
			start: self.start,
			end: other.end.max(self.start),
			line: self.line,
			column: self.column,
		}
	}
}

impl Default for SrcSpan {
	fn default() -> Self {
		Self { start: 0, end: 0, line: 1, column: 1 }
	}
}

impl Display for SrcSpan {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "L{}:{}", self.line, self.column)
	}
}
