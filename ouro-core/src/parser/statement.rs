use crate::{lexer::prelude::{Keyword, TokenKind}, utils::prelude::SrcSpan};
use super::ast::{Block, CatchClause, Expression, Modifiers, Statement, StatementKind, TryStatement};
use super::declaration::{parse_declaration, parse_var_statement, type_length, typed_declaration_ahead};
use super::error::{parse_error, found_text, ParseError, ParseErrorType};
use super::parser::{Parse, Parser, Precedence};
use super::types::Type;

impl Parse for Statement {
    fn parse(
        parser: &mut Parser,
        _precedence: Option<Precedence>
    ) -> Result<Self, ParseError> {
        let token = parser.current().clone();
        let start = token.span;

        let kind = match token.kind {
            TokenKind::LBrace => StatementKind::Block(Block::parse(parser, None)?),
            TokenKind::Semicolon => {
                parser.step();
                StatementKind::Block(Block { statements: vec![], location: start })
            },
            TokenKind::Keyword(Keyword::If) => parse_if(parser)?,
            TokenKind::Keyword(Keyword::While) => parse_while(parser)?,
            TokenKind::Keyword(Keyword::Do) => parse_do_while(parser)?,
            TokenKind::Keyword(Keyword::For) => parse_for(parser)?,
            TokenKind::Keyword(Keyword::Return) => {
                parser.step();

                let value = match parser.current().kind {
                    TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof => None,
                    _ => Some(Expression::parse(parser, None)?),
                };

                parser.expect_semicolon()?;
                StatementKind::Return(value)
            },
            TokenKind::Keyword(Keyword::Break | Keyword::Continue) => {
                parser.step();

                let label = match parser.check(TokenKind::Identifier) {
                    true => Some(parser.expect_ident()?.0),
                    false => None,
                };

                parser.expect_semicolon()?;

                match token.kind {
                    TokenKind::Keyword(Keyword::Break) => StatementKind::Break(label),
                    _ => StatementKind::Continue(label),
                }
            },
            TokenKind::Keyword(Keyword::Throw) => {
                parser.step();
                let value = Expression::parse(parser, None)?;
                parser.expect_semicolon()?;

                StatementKind::Throw(value)
            },
            TokenKind::Keyword(Keyword::Try) => parse_try(parser)?,
            TokenKind::Keyword(Keyword::Let | Keyword::Var | Keyword::Const) => {
                return parse_var_statement(parser);
            },
            TokenKind::Keyword(
                Keyword::Class
                | Keyword::Interface
                | Keyword::Struct
                | Keyword::Enum
                | Keyword::Package
                | Keyword::Import
            ) => return parse_declaration(parser, Modifiers::default(), start),
            TokenKind::Keyword(Keyword::Fn | Keyword::Function | Keyword::Func)
                if parser.peek(1).kind == TokenKind::Identifier => {
                return parse_declaration(parser, Modifiers::default(), start);
            },
            TokenKind::Keyword(keyword) if keyword.is_modifier() => {
                let modifiers = Modifiers::parse(parser, None)?;
                return parse_declaration(parser, modifiers, start);
            },
            // legacy `print expr;`
            TokenKind::Identifier if token.text == "print" && parser.peek(1).kind != TokenKind::LParen => {
                parser.step();
                let value = Expression::parse(parser, None)?;
                parser.expect_semicolon()?;

                StatementKind::Print(value)
            },
            TokenKind::Identifier if parser.peek(1).kind == TokenKind::Colon => {
                return parse_var_statement(parser);
            },
            _ if typed_declaration_ahead(parser).is_some() => {
                return parse_declaration(parser, Modifiers::default(), start);
            },
            _ => {
                let expression = Expression::parse(parser, None)?;
                parser.expect_semicolon()?;

                StatementKind::Expression(expression)
            }
        };

        Ok(Statement::new(kind, start.to(parser.previous_span())))
    }
}

// block -> "{" { <statement> } "}"
impl Parse for Block {
    fn parse(
        parser: &mut Parser,
        _precedence: Option<Precedence>
    ) -> Result<Self, ParseError> {
        let open = parser.expect_one(TokenKind::LBrace)?.span;
        let mut statements = vec![];

        while !parser.check(TokenKind::RBrace) && !parser.is_at_end() {
            if let Some(statement) = parser.parse_recovering() {
                statements.push(statement);
            }
        }

        parser.expect_closing(TokenKind::RBrace, open)?;

        Ok(Block {
            statements,
            location: open.to(parser.previous_span()),
        })
    }
}

fn parse_condition(parser: &mut Parser) -> Result<Expression, ParseError> {
    let open = parser.expect_one(TokenKind::LParen)?.span;
    let condition = Expression::parse(parser, None)?;
    parser.expect_closing(TokenKind::RParen, open)?;

    Ok(condition)
}

fn parse_body(parser: &mut Parser) -> Result<Box<Statement>, ParseError> {
    Ok(Box::new(Statement::parse(parser, None)?))
}

// if -> if "(" <expression> ")" <statement> [ else <statement> ]
fn parse_if(parser: &mut Parser) -> Result<StatementKind, ParseError> {
    parser.expect_keyword(Keyword::If)?;

    let condition = parse_condition(parser)?;
    let then_branch = parse_body(parser)?;

    let else_branch = match parser.eat_keyword(Keyword::Else) {
        true => Some(parse_body(parser)?),
        false => None,
    };

    Ok(StatementKind::If { condition, then_branch, else_branch })
}

// while -> while "(" <expression> ")" <statement>
fn parse_while(parser: &mut Parser) -> Result<StatementKind, ParseError> {
    parser.expect_keyword(Keyword::While)?;

    let condition = parse_condition(parser)?;
    let body = parse_body(parser)?;

    Ok(StatementKind::While { condition, body })
}

// do_while -> do <statement> while "(" <expression> ")" ";"
fn parse_do_while(parser: &mut Parser) -> Result<StatementKind, ParseError> {
    parser.expect_keyword(Keyword::Do)?;

    let body = parse_body(parser)?;
    parser.expect_keyword(Keyword::While)?;
    let condition = parse_condition(parser)?;
    parser.expect_semicolon()?;

    Ok(StatementKind::DoWhile { body, condition })
}

/// Looks past `(` for `[let] [Type] name in` or `Type name :`, the two
/// for-each headers.
fn foreach_ahead(parser: &Parser) -> bool {
    let mut offset = 1;

    if matches!(parser.peek(offset).kind, TokenKind::Keyword(Keyword::Let | Keyword::Var | Keyword::Const)) {
        offset += 1;
    }

    if parser.peek(offset).kind == TokenKind::Identifier && parser.peek(offset + 1).kind.is_keyword(Keyword::In) {
        return true;
    }

    match type_length(parser, offset) {
        Some(length) => {
            parser.peek(offset + length).kind == TokenKind::Identifier
                && matches!(
                    parser.peek(offset + length + 1).kind,
                    TokenKind::Keyword(Keyword::In) | TokenKind::Colon
                )
        },
        None => false
    }
}

// for -> for "(" [<statement>] ";" [<expression>] ";" [<expression>] ")" <statement>
//      | for "(" [let] [<type>] <identifier> (in | ":") <expression> ")" <statement>
fn parse_for(parser: &mut Parser) -> Result<StatementKind, ParseError> {
    parser.expect_keyword(Keyword::For)?;

    if foreach_ahead(parser) {
        return parse_foreach(parser);
    }

    let open = parser.expect_one(TokenKind::LParen)?.span;

    let init = match parser.eat(TokenKind::Semicolon) {
        true => None,
        false => Some(Box::new(Statement::parse(parser, None)?)),
    };

    let condition = match parser.check(TokenKind::Semicolon) {
        true => None,
        false => Some(Expression::parse(parser, None)?),
    };
    parser.expect_one(TokenKind::Semicolon)?;

    let update = match parser.check(TokenKind::RParen) {
        true => None,
        false => Some(Expression::parse(parser, None)?),
    };
    parser.expect_closing(TokenKind::RParen, open)?;

    let body = parse_body(parser)?;

    Ok(StatementKind::For { init, condition, update, body })
}

fn parse_foreach(parser: &mut Parser) -> Result<StatementKind, ParseError> {
    let open = parser.expect_one(TokenKind::LParen)?.span;

    if matches!(parser.current().kind, TokenKind::Keyword(Keyword::Let | Keyword::Var | Keyword::Const)) {
        parser.step();
    }

    let variable_type = match parser.peek(1).kind {
        TokenKind::Keyword(Keyword::In) => None,
        _ => Some(Type::parse(parser, None)?),
    };

    let (variable, _) = parser.expect_ident()?;

    if !parser.eat_keyword(Keyword::In) {
        parser.expect_one(TokenKind::Colon)?;
    }

    let collection = Expression::parse(parser, None)?;
    parser.expect_closing(TokenKind::RParen, open)?;

    let body = parse_body(parser)?;

    Ok(StatementKind::ForEach { variable, variable_type, collection, body })
}

// try -> try <block> { catch [ "(" <catch_parameter> ")" ] <block> } [ finally <block> ]
fn parse_try(parser: &mut Parser) -> Result<StatementKind, ParseError> {
    parser.expect_keyword(Keyword::Try)?;

    let body = Block::parse(parser, None)?;
    let mut catches = vec![];

    while parser.check_keyword(Keyword::Catch) {
        let start = parser.next_token().span;

        let (exception_type, variable) = match parser.check(TokenKind::LParen) {
            true => parse_catch_parameter(parser)?,
            false => (None, None),
        };

        let body = Block::parse(parser, None)?;

        catches.push(CatchClause {
            exception_type,
            variable,
            body,
            location: start.to(parser.previous_span()),
        });
    }

    let finally = match parser.eat_keyword(Keyword::Finally) {
        true => Some(Block::parse(parser, None)?),
        false => None,
    };

    if catches.is_empty() && finally.is_none() {
        let token = parser.current();
        return parse_error(
            ParseErrorType::UnexpectedToken { found: found_text(token), expected: "'catch' or 'finally'".into() },
            token.span
        );
    }

    Ok(StatementKind::Try(TryStatement { body, catches, finally }))
}

/// `(e)`, `(Type e)` or `(e: Type)`.
fn parse_catch_parameter(parser: &mut Parser) -> Result<(Option<String>, Option<String>), ParseError> {
    let open: SrcSpan = parser.expect_one(TokenKind::LParen)?.span;

    let result = if parser.check(TokenKind::Identifier) && parser.peek(1).kind != TokenKind::Identifier {
        let (variable, _) = parser.expect_ident()?;

        let exception_type = match parser.eat(TokenKind::Colon) {
            true => Some(Type::parse(parser, None)?.to_string()),
            false => None,
        };

        (exception_type, Some(variable))
    } else {
        let exception_type = Type::parse(parser, None)?.to_string();

        let variable = match parser.check(TokenKind::Identifier) {
            true => Some(parser.expect_ident()?.0),
            false => None,
        };

        (Some(exception_type), variable)
    };

    parser.expect_closing(TokenKind::RParen, open)?;

    Ok(result)
}
