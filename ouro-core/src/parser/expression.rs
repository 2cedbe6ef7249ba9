use crate::{lexer::prelude::{Keyword, TokenKind}, utils::prelude::SrcSpan};
use super::ast::{
    AssignOperator, BinaryOperator, Block, Expression, ExpressionKind, FunctionDecl,
    Modifiers, UnaryOperator
};
use super::declaration::{parse_parameters, parse_return_type, type_length};
use super::error::{found_text, parse_error, ParseError, ParseErrorType};
use super::parser::{InfixParse, Parse, Parser, Precedence};
use super::types::Type;

impl Parse for Expression {
    fn parse(
        parser: &mut Parser,
        precedence: Option<Precedence>
    ) -> Result<Self, ParseError> {
        let precedence = precedence.unwrap_or(Precedence::Lowest);
        let mut expression = parse_prefix(parser)?;

        while precedence < parser.current_precedence() {
            expression = <Expression as InfixParse<Expression>>::parse(parser, expression, Some(precedence))?;
        }

        Ok(expression)
    }
}

// infix -> <expression> <operator> <expression>
//        | <expression> "?" <expression> ":" <expression>
//        | <expression> ("." <identifier> | "[" <expression> "]" | "(" <arguments> ")" | "++" | "--")
impl InfixParse<Expression> for Expression {
    fn parse(
        parser: &mut Parser,
        left: Expression,
        _precedence: Option<Precedence>
    ) -> Result<Self, ParseError> {
        let operator = parser.next_token();
        let operator_precedence = Precedence::from(&operator.kind);
        let start = left.location;

        if let Some(assign) = AssignOperator::from_token(&operator.kind) {
            if !left.is_assignable() {
                return parse_error(ParseErrorType::InvalidAssignmentTarget, left.location);
            }

            let value = <Expression as Parse>::parse(parser, Some(Precedence::Assign.lower()))?;

            let kind = ExpressionKind::Assign {
                operator: assign,
                target: Box::new(left),
                value: Box::new(value),
            };

            return Ok(Expression::new(kind, start.to(parser.previous_span())));
        }

        let kind = match operator.kind {
            TokenKind::Question => {
                let then_branch = <Expression as Parse>::parse(parser, None)?;
                parser.expect_one(TokenKind::Colon)?;
                let else_branch = <Expression as Parse>::parse(parser, Some(Precedence::Ternary.lower()))?;

                ExpressionKind::Ternary {
                    condition: Box::new(left),
                    then_branch: Box::new(then_branch),
                    else_branch: Box::new(else_branch),
                }
            },
            TokenKind::Dot => {
                let (name, _) = parser.expect_member_name()?;

                ExpressionKind::Member {
                    target: Box::new(left),
                    name,
                }
            },
            TokenKind::LBracket => {
                let index = <Expression as Parse>::parse(parser, None)?;
                parser.expect_closing(TokenKind::RBracket, operator.span)?;

                ExpressionKind::Index {
                    target: Box::new(left),
                    index: Box::new(index),
                }
            },
            TokenKind::LParen => {
                let arguments = parse_arguments(parser, operator.span)?;

                ExpressionKind::Call {
                    callee: Box::new(left),
                    arguments,
                }
            },
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                if !left.is_assignable() {
                    return parse_error(ParseErrorType::InvalidAssignmentTarget, left.location);
                }

                let operator = match operator.kind {
                    TokenKind::PlusPlus => UnaryOperator::Increment,
                    _ => UnaryOperator::Decrement,
                };

                ExpressionKind::Unary {
                    operator,
                    operand: Box::new(left),
                    prefix: false,
                }
            },
            kind => match BinaryOperator::from_token(&kind) {
                Some(binary) => {
                    let right = <Expression as Parse>::parse(parser, Some(operator_precedence))?;

                    ExpressionKind::Binary {
                        operator: binary,
                        left: Box::new(left),
                        right: Box::new(right),
                    }
                },
                None => return parse_error(
                    ParseErrorType::ExpectedExpression { found: found_text(&operator) },
                    operator.span
                )
            }
        };

        Ok(Expression::new(kind, start.to(parser.previous_span())))
    }
}

// primary -> <number> | <string> | <char> | true | false | null | this | super
//          | new <identifier> [ "(" <arguments> ")" ] | "(" <expression> ")" | "(" <type> ")" <expression>
//          | "[" <arguments> "]" | "{" [ <key> ":" <expression> {, <key> ":" <expression> } ] "}"
//          | (function | func | fn) <parameters> <block> | <identifier>
fn parse_prefix(parser: &mut Parser) -> Result<Expression, ParseError> {
    let token = parser.current().clone();
    let start = token.span;

    let kind = match token.kind {
        TokenKind::Integer | TokenKind::Float => {
            parser.step();
            parse_number(&token.text, token.kind == TokenKind::Integer, start)?
        },
        TokenKind::String => {
            parser.step();
            ExpressionKind::String(token.literal.unwrap_or_default())
        },
        TokenKind::Char => {
            parser.step();
            let value = token.literal
                .and_then(|literal| literal.chars().next())
                .unwrap_or_default();

            ExpressionKind::Char(value)
        },
        TokenKind::True | TokenKind::False => {
            parser.step();
            ExpressionKind::Bool(token.kind == TokenKind::True)
        },
        TokenKind::Null => {
            parser.step();
            ExpressionKind::Null
        },
        TokenKind::Identifier => {
            parser.step();
            ExpressionKind::Identifier(token.text)
        },
        TokenKind::Keyword(Keyword::This) => {
            parser.step();
            ExpressionKind::This
        },
        TokenKind::Keyword(Keyword::Super) => {
            parser.step();
            ExpressionKind::Super
        },
        TokenKind::Keyword(Keyword::New) => {
            parser.step();
            parse_new(parser)?
        },
        TokenKind::Keyword(Keyword::Function | Keyword::Func | Keyword::Fn) => {
            parser.step();
            parse_function_literal(parser, start)?
        },
        TokenKind::Keyword(Keyword::Await) => {
            parser.step();
            let inner = <Expression as Parse>::parse(parser, Some(Precedence::Prefix))?;

            ExpressionKind::Await(Box::new(inner))
        },
        TokenKind::LParen => {
            if let Some(cast) = parse_cast(parser)? {
                cast
            } else {
                parser.step();
                let inner = <Expression as Parse>::parse(parser, None)?;
                parser.expect_closing(TokenKind::RParen, start)?;

                // grouping keeps the inner node, only the span widens
                return Ok(Expression {
                    location: start.to(parser.previous_span()),
                    ..inner
                });
            }
        },
        TokenKind::LBracket => {
            parser.step();
            let mut elements = vec![];

            while !parser.check(TokenKind::RBracket) && !parser.is_at_end() {
                elements.push(<Expression as Parse>::parse(parser, None)?);

                if !parser.eat(TokenKind::Comma) {
                    break;
                }
            }

            parser.expect_closing(TokenKind::RBracket, start)?;

            ExpressionKind::Array(elements)
        },
        TokenKind::LBrace => {
            parser.step();
            parse_map_literal(parser, start)?
        },
        TokenKind::Minus
        | TokenKind::Plus
        | TokenKind::Bang
        | TokenKind::Tilde
        | TokenKind::PlusPlus
        | TokenKind::MinusMinus => {
            parser.step();

            let operator = match token.kind {
                TokenKind::Minus => UnaryOperator::Negate,
                TokenKind::Plus => UnaryOperator::Plus,
                TokenKind::Bang => UnaryOperator::Not,
                TokenKind::Tilde => UnaryOperator::BitNot,
                TokenKind::PlusPlus => UnaryOperator::Increment,
                _ => UnaryOperator::Decrement,
            };

            let operand = <Expression as Parse>::parse(parser, Some(Precedence::Prefix))?;

            if matches!(operator, UnaryOperator::Increment | UnaryOperator::Decrement) && !operand.is_assignable() {
                return parse_error(ParseErrorType::InvalidAssignmentTarget, operand.location);
            }

            ExpressionKind::Unary {
                operator,
                operand: Box::new(operand),
                prefix: true,
            }
        },
        TokenKind::Eof => return parse_error(
            ParseErrorType::UnexpectedEof { expected: "an expression".into() },
            token.span
        ),
        _ => return parse_error(
            ParseErrorType::ExpectedExpression { found: found_text(&token) },
            token.span
        )
    };

    Ok(Expression::new(kind, start.to(parser.previous_span())))
}

/// Integer literals that do not fit in `i64` fall back to floating point.
fn parse_number(text: &str, is_integer: bool, span: SrcSpan) -> Result<ExpressionKind, ParseError> {
    if is_integer {
        if let Ok(value) = text.parse::<i64>() {
            return Ok(ExpressionKind::Number { value: value as f64, is_integer: true });
        }
    }

    match text.parse::<f64>() {
        Ok(value) => Ok(ExpressionKind::Number { value, is_integer: false }),
        Err(_) => parse_error(ParseErrorType::InvalidNumber { literal: text.to_string() }, span)
    }
}

pub fn parse_arguments(parser: &mut Parser, opened_at: SrcSpan) -> Result<Vec<Expression>, ParseError> {
    let mut arguments = vec![];

    while !parser.check(TokenKind::RParen) && !parser.is_at_end() {
        arguments.push(<Expression as Parse>::parse(parser, None)?);

        if !parser.eat(TokenKind::Comma) {
            break;
        }
    }

    parser.expect_closing(TokenKind::RParen, opened_at)?;

    Ok(arguments)
}

fn parse_new(parser: &mut Parser) -> Result<ExpressionKind, ParseError> {
    let class_name = match Type::parse(parser, None)? {
        Type::Named(name) => name,
        ty => ty.to_string(),
    };

    let arguments = match parser.current().kind {
        TokenKind::LParen => {
            let open = parser.next_token().span;
            parse_arguments(parser, open)?
        },
        _ => vec![]
    };

    Ok(ExpressionKind::New { class_name, arguments })
}

/// `(int) x` style casts. Only primitive type names qualify, so `(a) + b`
/// stays a grouped expression.
fn parse_cast(parser: &mut Parser) -> Result<Option<ExpressionKind>, ParseError> {
    if !parser.peek(1).kind.is_type_keyword() {
        return Ok(None);
    }

    let length = match type_length(parser, 1) {
        Some(length) => length,
        None => return Ok(None),
    };

    if parser.peek(1 + length).kind != TokenKind::RParen {
        return Ok(None);
    }

    parser.step();
    let ty = Type::parse(parser, None)?;
    parser.expect_one(TokenKind::RParen)?;

    let operand = <Expression as Parse>::parse(parser, Some(Precedence::Prefix))?;

    Ok(Some(ExpressionKind::Cast { ty, operand: Box::new(operand) }))
}

fn parse_map_literal(parser: &mut Parser, opened_at: SrcSpan) -> Result<ExpressionKind, ParseError> {
    let mut entries = vec![];

    while !parser.check(TokenKind::RBrace) && !parser.is_at_end() {
        let token = parser.current().clone();

        // bare identifier keys are names, not variable references
        let key = if token.kind == TokenKind::Identifier && parser.peek(1).kind == TokenKind::Colon {
            parser.step();
            Expression::new(ExpressionKind::String(token.text), token.span)
        } else {
            <Expression as Parse>::parse(parser, Some(Precedence::Ternary))?
        };

        parser.expect_one(TokenKind::Colon)?;
        let value = <Expression as Parse>::parse(parser, None)?;

        entries.push((key, value));

        if !parser.eat(TokenKind::Comma) {
            break;
        }
    }

    parser.expect_closing(TokenKind::RBrace, opened_at)?;

    Ok(ExpressionKind::Map(entries))
}

fn parse_function_literal(parser: &mut Parser, start: SrcSpan) -> Result<ExpressionKind, ParseError> {
    let parameters = parse_parameters(parser)?;
    let return_type = parse_return_type(parser)?;
    let body = Block::parse(parser, None)?;

    let function = FunctionDecl {
        name: parser.next_anonymous_name(),
        parameters,
        return_type,
        body,
        modifiers: Modifiers::default(),
        parent_class: None,
        is_constructor: false,
        location: start.to(parser.previous_span()),
    };

    Ok(ExpressionKind::Function(Box::new(function)))
}
