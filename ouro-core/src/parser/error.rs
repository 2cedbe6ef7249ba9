use crate::{lexer::prelude::{Token, TokenKind}, utils::prelude::{Diagnostic, Severity, SrcSpan}};

#[derive(Debug, Clone, PartialEq)]
pub enum ParseErrorType {
    UnexpectedToken {
        found: String,
        expected: String,
    },
    ExpectedIdent {
        found: String,
    },
    ExpectedExpression {
        found: String,
    },
    ExpectedType {
        found: String,
    },
    MissingSemicolon {
        found: String,
    },
    UnclosedDelimiter {
        delimiter: &'static str,
        opened_at: SrcSpan,
    },
    InvalidAssignmentTarget,
    InvalidParameter {
        found: String,
    },
    InvalidNumber {
        literal: String,
    },
    UnexpectedEof {
        expected: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub error: ParseErrorType,
    pub span: SrcSpan
}

/// How a token is quoted in messages: its source text, or `EOF`.
pub fn found_text(token: &Token) -> String {
    match token.kind {
        TokenKind::Eof => "EOF".to_string(),
        _ => format!("'{}'", token.text),
    }
}

impl ParseError {
    pub fn details(&self) -> String {
        match &self.error {
            ParseErrorType::UnexpectedToken { found, expected } => format!("expected {expected} but found {found}"),
            ParseErrorType::ExpectedIdent { found } => format!("expected an identifier but found {found}"),
            ParseErrorType::ExpectedExpression { found } => format!("expected an expression but found {found}"),
            ParseErrorType::ExpectedType { found } => format!("expected a type but found {found}"),
            ParseErrorType::MissingSemicolon { found } => format!("expected ';' but found {found}"),
            ParseErrorType::UnclosedDelimiter { delimiter, opened_at } => {
                format!("unclosed '{delimiter}' opened at {opened_at}")
            },
            ParseErrorType::InvalidAssignmentTarget => "invalid assignment target".to_string(),
            ParseErrorType::InvalidParameter { found } => format!("bad parameter list: unexpected {found}"),
            ParseErrorType::InvalidNumber { literal } => format!("invalid numeric literal '{literal}'"),
            ParseErrorType::UnexpectedEof { expected } => format!("unexpected end of file, expected {expected}"),
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let diagnostic = Diagnostic::error(Severity::Syntax, self.span, self.details());

        match &self.error {
            ParseErrorType::UnclosedDelimiter { opened_at, .. } => {
                diagnostic.with_extra_label(*opened_at, "opened here")
            },
            ParseErrorType::InvalidAssignmentTarget => {
                diagnostic.with_note("only variables, members and indexed elements can be assigned")
            },
            _ => diagnostic
        }
    }
}

pub fn parse_error<T>(error: ParseErrorType, span: SrcSpan) -> Result<T, ParseError> {
    Err(ParseError { error, span })
}
