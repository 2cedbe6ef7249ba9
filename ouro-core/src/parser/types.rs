use std::fmt::Display;

use crate::lexer::prelude::{Keyword, TokenKind};
use super::error::{found_text, parse_error, ParseError, ParseErrorType};
use super::parser::{Parse, Parser, Precedence};

/// Static type names understood by the analyzer. Generic arguments are
/// kept for diagnostics and erased at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Int,
    Long,
    Float,
    Double,
    Bool,
    String,
    Char,
    Void,
    Null,
    Any,
    Object,
    Error,
    Named(String),
    Array(Box<Type>),
    Generic {
        name: String,
        arguments: Vec<Type>,
    },
}

impl Type {
    pub fn from_keyword(keyword: Keyword) -> Option<Self> {
        let ty = match keyword {
            Keyword::Int => Self::Int,
            Keyword::Long => Self::Long,
            Keyword::Float => Self::Float,
            Keyword::Double => Self::Double,
            Keyword::Bool => Self::Bool,
            Keyword::String => Self::String,
            Keyword::Char => Self::Char,
            Keyword::Void => Self::Void,
            Keyword::Any => Self::Any,
            Keyword::Object => Self::Object,
            Keyword::Array => Self::Generic { name: "array".into(), arguments: vec![] },
            Keyword::Map => Self::Generic { name: "map".into(), arguments: vec![] },
            _ => return None
        };

        Some(ty)
    }

    /// Parses a printed type name back, used for names written in
    /// `catch` clauses and by hosts.
    pub fn from_name(name: &str) -> Self {
        if let Some(element) = name.strip_suffix("[]") {
            return Self::Array(Box::new(Self::from_name(element)));
        }

        match name {
            "int" => Self::Int,
            "long" => Self::Long,
            "float" => Self::Float,
            "double" => Self::Double,
            "bool" => Self::Bool,
            "string" => Self::String,
            "char" => Self::Char,
            "void" => Self::Void,
            "null" => Self::Null,
            "any" => Self::Any,
            "object" => Self::Object,
            "error_type" => Self::Error,
            "array" | "map" => Self::Generic { name: name.into(), arguments: vec![] },
            name => Self::Named(name.to_string()),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int | Self::Long | Self::Float | Self::Double | Self::Char)
    }

    pub fn is_floating(&self) -> bool {
        matches!(self, Self::Float | Self::Double)
    }

    /// `any` and `error_type` are accepted everywhere so one mistake does not
    /// cascade into many diagnostics.
    pub fn is_permissive(&self) -> bool {
        matches!(self, Self::Any | Self::Error)
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
            || matches!(self, Self::Generic { name, .. } if name == "array")
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Self::Generic { name, .. } if name == "map")
    }

    /// Types whose values live on the heap and may therefore be `null`.
    pub fn is_reference(&self) -> bool {
        matches!(self, Self::String | Self::Object | Self::Named(_) | Self::Array(_) | Self::Generic { .. })
    }

    pub fn element_type(&self) -> Type {
        match self {
            Self::Array(element) => (**element).clone(),
            Self::Generic { name, arguments } if name == "array" => {
                arguments.first().cloned().unwrap_or(Self::Any)
            },
            Self::Generic { name, arguments } if name == "map" => {
                arguments.get(1).cloned().unwrap_or(Self::Any)
            },
            Self::String => Self::String,
            _ => Self::Any,
        }
    }

    /// Rank used to pick the wider of two numeric operands.
    pub fn numeric_rank(&self) -> u8 {
        match self {
            Self::Char => 0,
            Self::Int => 1,
            Self::Long => 2,
            Self::Float => 3,
            Self::Double => 4,
            _ => 0,
        }
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int => write!(f, "int"),
            Self::Long => write!(f, "long"),
            Self::Float => write!(f, "float"),
            Self::Double => write!(f, "double"),
            Self::Bool => write!(f, "bool"),
            Self::String => write!(f, "string"),
            Self::Char => write!(f, "char"),
            Self::Void => write!(f, "void"),
            Self::Null => write!(f, "null"),
            Self::Any => write!(f, "any"),
            Self::Object => write!(f, "object"),
            Self::Error => write!(f, "error_type"),
            Self::Named(name) => write!(f, "{name}"),
            Self::Array(element) => write!(f, "{element}[]"),
            Self::Generic { name, arguments } if arguments.is_empty() => write!(f, "{name}"),
            Self::Generic { name, arguments } => {
                let arguments = arguments.iter()
                    .map(|argument| argument.to_string())
                    .collect::<Vec<String>>();

                write!(f, "{name}<{}>", arguments.join(", "))
            }
        }
    }
}

// type -> (<primitive> [ "<" <type> {, <type> } ">" ] | <identifier>) { "[" "]" }
impl Parse for Type {
    fn parse(
        parser: &mut Parser,
        _precedence: Option<Precedence>
    ) -> Result<Self, ParseError> {
        let token = parser.current().clone();

        let mut ty = match token.kind {
            TokenKind::Keyword(keyword) if keyword.is_type_name() => {
                parser.step();

                match Type::from_keyword(keyword) {
                    Some(Type::Generic { name, .. }) if parser.check(TokenKind::Less) => {
                        parser.step();

                        let mut arguments = vec![Type::parse(parser, None)?];
                        while parser.eat(TokenKind::Comma) {
                            arguments.push(Type::parse(parser, None)?);
                        }

                        parser.expect_closing_angle()?;

                        Type::Generic { name, arguments }
                    },
                    Some(ty) => ty,
                    None => return parse_error(
                        ParseErrorType::ExpectedType { found: found_text(&token) },
                        token.span
                    )
                }
            },
            TokenKind::Identifier => {
                parser.step();
                Type::Named(token.text.clone())
            },
            TokenKind::Null => {
                parser.step();
                Type::Null
            },
            _ => return parse_error(
                ParseErrorType::ExpectedType { found: found_text(&token) },
                token.span
            )
        };

        while parser.check(TokenKind::LBracket) && parser.peek(1).kind == TokenKind::RBracket {
            parser.step();
            parser.step();
            ty = Type::Array(Box::new(ty));
        }

        Ok(ty)
    }
}
