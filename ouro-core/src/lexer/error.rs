use crate::utils::prelude::{Diagnostic, Severity, SrcSpan};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LexicalErrorType {
    UnrecognizedCharacter { ch: char },
    UnterminatedString,
    UnterminatedChar,
    EmptyChar,
    InvalidEscape { ch: char },
    MissingDigitsAfterExponent,
    MissingCommentEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexicalError {
    pub error: LexicalErrorType,
    pub location: SrcSpan
}

impl LexicalErrorType {
    pub fn details(&self) -> String {
        match self {
            Self::UnrecognizedCharacter { ch } => format!("unrecognized character `{ch}`"),
            Self::UnterminatedString => "unterminated string literal".to_string(),
            Self::UnterminatedChar => "unterminated character literal".to_string(),
            Self::EmptyChar => "character literal must hold exactly one character".to_string(),
            Self::InvalidEscape { ch } => format!("invalid escape sequence `\\{ch}`"),
            Self::MissingDigitsAfterExponent => "missing digits after exponent".to_string(),
            Self::MissingCommentEnd => "unterminated block comment, expected `*/`".to_string(),
        }
    }
}

impl LexicalError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(Severity::Lexical, self.location, self.error.details())
    }
}
