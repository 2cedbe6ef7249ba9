use std::fmt::Display;

use crate::utils::prelude::SrcSpan;
use super::error::LexicalErrorType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Let, Var, Const,
    Fn, Function, Func,
    If, Else, While, For, Do, Return, Break, Continue,
    Class, Interface, Struct, Enum, Extends, Implements,
    This, Super, New,
    Static, Public, Private, Protected, Internal,
    Import, As, In, Package,
    Try, Catch, Finally, Throw,
    Async, Await,
    Void,
    // primitive type names
    Int, Long, Float, Double, Bool, String, Char, Any, Array, Object, Map,
}

impl Keyword {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Let => "let",
            Self::Var => "var",
            Self::Const => "const",
            Self::Fn => "fn",
            Self::Function => "function",
            Self::Func => "func",
            Self::If => "if",
            Self::Else => "else",
            Self::While => "while",
            Self::For => "for",
            Self::Do => "do",
            Self::Return => "return",
            Self::Break => "break",
            Self::Continue => "continue",
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Struct => "struct",
            Self::Enum => "enum",
            Self::Extends => "extends",
            Self::Implements => "implements",
            Self::This => "this",
            Self::Super => "super",
            Self::New => "new",
            Self::Static => "static",
            Self::Public => "public",
            Self::Private => "private",
            Self::Protected => "protected",
            Self::Internal => "internal",
            Self::Import => "import",
            Self::As => "as",
            Self::In => "in",
            Self::Package => "package",
            Self::Try => "try",
            Self::Catch => "catch",
            Self::Finally => "finally",
            Self::Throw => "throw",
            Self::Async => "async",
            Self::Await => "await",
            Self::Void => "void",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::Bool => "bool",
            Self::String => "string",
            Self::Char => "char",
            Self::Any => "any",
            Self::Array => "array",
            Self::Object => "object",
            Self::Map => "map",
        }
    }

    /// `void` plus the primitive type names.
    pub fn is_type_name(&self) -> bool {
        matches!(self,
            Self::Void
            | Self::Int
            | Self::Long
            | Self::Float
            | Self::Double
            | Self::Bool
            | Self::String
            | Self::Char
            | Self::Any
            | Self::Array
            | Self::Object
            | Self::Map
        )
    }

    pub fn is_modifier(&self) -> bool {
        matches!(self,
            Self::Static
            | Self::Public
            | Self::Private
            | Self::Protected
            | Self::Internal
            | Self::Async
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Delimiters
    LParen, RParen,
    LBrace, RBrace,
    LBracket, RBracket,
    Comma, Semicolon, Colon, Dot, Question,

    // Arithmetic
    Plus, Minus, Star, Slash, Percent,

    // Comparison
    EqualEqual, BangEqual,
    Less, LessEqual,
    Greater, GreaterEqual,

    // Logical
    AndAnd, OrOr, Bang,

    // Bitwise
    Ampersand, Pipe, Caret, Tilde,
    ShiftLeft, ShiftRight, UnsignedShiftRight,

    // Assignment
    Assign,
    PlusAssign, MinusAssign, StarAssign, SlashAssign, PercentAssign,

    PlusPlus, MinusMinus,
    DotDot, Arrow,

    Keyword(Keyword),

    // Literals
    Integer,
    Float,
    String,
    Char,
    True,
    False,
    Null,

    Identifier,

    Eof,
    Error(LexicalErrorType),
}

impl TokenKind {
    pub fn describe(&self) -> String {
        match self {
            Self::Integer => "an integer".to_string(),
            Self::Float => "a float".to_string(),
            Self::String => "a string".to_string(),
            Self::Char => "a character".to_string(),
            Self::Identifier => "an identifier".to_string(),
            Self::Keyword(keyword) => format!("the keyword `{}`", keyword.as_str()),
            Self::Eof => "end of file".to_string(),
            Self::Error(_) => "an invalid token".to_string(),
            punct => format!("`{}`", punct.as_literal()),
        }
    }

    pub fn as_literal(&self) -> &'static str {
        match self {
            Self::LParen => "(",
            Self::RParen => ")",
            Self::LBrace => "{",
            Self::RBrace => "}",
            Self::LBracket => "[",
            Self::RBracket => "]",
            Self::Comma => ",",
            Self::Semicolon => ";",
            Self::Colon => ":",
            Self::Dot => ".",
            Self::Question => "?",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::Percent => "%",
            Self::EqualEqual => "==",
            Self::BangEqual => "!=",
            Self::Less => "<",
            Self::LessEqual => "<=",
            Self::Greater => ">",
            Self::GreaterEqual => ">=",
            Self::AndAnd => "&&",
            Self::OrOr => "||",
            Self::Bang => "!",
            Self::Ampersand => "&",
            Self::Pipe => "|",
            Self::Caret => "^",
            Self::Tilde => "~",
            Self::ShiftLeft => "<<",
            Self::ShiftRight => ">>",
            Self::UnsignedShiftRight => ">>>",
            Self::Assign => "=",
            Self::PlusAssign => "+=",
            Self::MinusAssign => "-=",
            Self::StarAssign => "*=",
            Self::SlashAssign => "/=",
            Self::PercentAssign => "%=",
            Self::PlusPlus => "++",
            Self::MinusMinus => "--",
            Self::DotDot => "..",
            Self::Arrow => "->",
            Self::Keyword(keyword) => keyword.as_str(),
            Self::Integer => "integer",
            Self::Float => "float",
            Self::String => "string",
            Self::Char => "char",
            Self::True => "true",
            Self::False => "false",
            Self::Null => "null",
            Self::Identifier => "identifier",
            Self::Eof => "EOF",
            Self::Error(_) => "error",
        }
    }

    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        *self == Self::Keyword(keyword)
    }

    pub fn is_type_keyword(&self) -> bool {
        matches!(self, Self::Keyword(keyword) if keyword.is_type_name())
    }
}

/// A located lexeme. `text` is the raw source slice; `literal` holds the
/// decoded contents of string and character literals.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub literal: Option<String>,
    pub span: SrcSpan,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, span: SrcSpan) -> Self {
        Self { kind, text: text.into(), literal: None, span }
    }

    pub fn line(&self) -> u32 {
        self.span.line
    }

    pub fn column(&self) -> u32 {
        self.span.column
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, TokenKind::Error(_))
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.kind {
            TokenKind::Keyword(_) => "Keyword".to_string(),
            TokenKind::Error(error) => format!("Error({})", error.details()),
            kind => format!("{kind:?}"),
        };

        write!(f, "{kind} '{}' L{}:{}", self.text, self.span.line, self.span.column)
    }
}
