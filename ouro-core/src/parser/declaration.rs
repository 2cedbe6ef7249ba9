use crate::{lexer::prelude::{Keyword, TokenKind}, utils::prelude::SrcSpan};
use super::ast::{
    Access, Block, ClassDecl, ClassMember, Declaration, EnumDecl, EnumValue, Expression,
    FunctionDecl, ImportDecl, Modifiers, Mutability, Parameter, Statement, StatementKind,
    StructDecl, VarDecl
};
use super::error::{found_text, parse_error, ParseError, ParseErrorType};
use super::parser::{Parse, Parser, Precedence};
use super::types::Type;

/// Number of tokens a type starting `offset` tokens ahead would span, or
/// `None` if no type starts there. Nothing is consumed.
pub fn type_length(parser: &Parser, offset: usize) -> Option<usize> {
    let mut i = offset;

    match parser.peek(i).kind {
        TokenKind::Keyword(keyword) if keyword.is_type_name() => {
            i += 1;

            if matches!(keyword, Keyword::Array | Keyword::Map) && parser.peek(i).kind == TokenKind::Less {
                let mut depth = 0i32;

                loop {
                    match parser.peek(i).kind {
                        TokenKind::Less => depth += 1,
                        TokenKind::Greater => depth -= 1,
                        TokenKind::ShiftRight => depth -= 2,
                        TokenKind::UnsignedShiftRight => depth -= 3,
                        TokenKind::Eof
                        | TokenKind::Semicolon
                        | TokenKind::LBrace
                        | TokenKind::RBrace
                        | TokenKind::LParen
                        | TokenKind::RParen
                        | TokenKind::Assign => return None,
                        _ => {}
                    }

                    i += 1;

                    if depth <= 0 {
                        break;
                    }
                }
            }
        },
        TokenKind::Identifier => i += 1,
        _ => return None
    }

    while parser.peek(i).kind == TokenKind::LBracket && parser.peek(i + 1).kind == TokenKind::RBracket {
        i += 2;
    }

    Some(i - offset)
}

/// Whether a `Type name` declaration starts at the current token. Returns
/// the length of the type when it does.
pub fn typed_declaration_ahead(parser: &Parser) -> Option<usize> {
    type_length(parser, 0).filter(|length| parser.peek(*length).kind == TokenKind::Identifier)
}

// modifiers -> { public | private | protected | internal | static | async }
// `const` is left for the declaration that follows
impl Parse for Modifiers {
    fn parse(
        parser: &mut Parser,
        _precedence: Option<Precedence>
    ) -> Result<Self, ParseError> {
        let mut modifiers = Modifiers::default();

        loop {
            match parser.current().kind {
                TokenKind::Keyword(Keyword::Public) => modifiers.access = Access::Public,
                TokenKind::Keyword(Keyword::Private) => modifiers.access = Access::Private,
                TokenKind::Keyword(Keyword::Protected) => modifiers.access = Access::Protected,
                TokenKind::Keyword(Keyword::Internal) => modifiers.access = Access::Internal,
                TokenKind::Keyword(Keyword::Static) => modifiers.is_static = true,
                TokenKind::Keyword(Keyword::Async) => modifiers.is_async = true,
                _ => return Ok(modifiers)
            }

            parser.step();
        }
    }
}

pub fn parse_parameters(parser: &mut Parser) -> Result<Vec<Parameter>, ParseError> {
    let open = parser.expect_one(TokenKind::LParen)?.span;
    let mut parameters = vec![];

    while !parser.check(TokenKind::RParen) && !parser.is_at_end() {
        parameters.push(Parameter::parse(parser, None)?);

        if !parser.eat(TokenKind::Comma) {
            break;
        }
    }

    parser.expect_closing(TokenKind::RParen, open)?;

    Ok(parameters)
}

impl Parse for Parameter {
    fn parse(
        parser: &mut Parser,
        _precedence: Option<Precedence>
    ) -> Result<Self, ParseError> {
        let start = parser.current().span;
        let mut by_ref = parser.eat(TokenKind::Ampersand);

        let named_first = parser.check(TokenKind::Identifier)
            && matches!(
                parser.peek(1).kind,
                TokenKind::Colon | TokenKind::Comma | TokenKind::RParen | TokenKind::Assign
            );

        let (name, ty) = if named_first {
            let (name, _) = parser.expect_ident()?;
            let ty = match parser.eat(TokenKind::Colon) {
                true => Some(Type::parse(parser, None)?),
                false => None,
            };

            (name, ty)
        } else {
            let is_typed = type_length(parser, 0).is_some_and(|length| {
                let next = &parser.peek(length).kind;
                *next == TokenKind::Identifier
                    || (*next == TokenKind::Ampersand && parser.peek(length + 1).kind == TokenKind::Identifier)
            });

            if !is_typed {
                let token = parser.current();
                return parse_error(ParseErrorType::InvalidParameter { found: found_text(token) }, token.span);
            }

            let ty = Type::parse(parser, None)?;
            by_ref |= parser.eat(TokenKind::Ampersand);
            let (name, _) = parser.expect_ident()?;

            (name, Some(ty))
        };

        let default = match parser.eat(TokenKind::Assign) {
            true => Some(Expression::parse(parser, Some(Precedence::Assign))?),
            false => None,
        };

        Ok(Parameter {
            name,
            ty,
            by_ref,
            default,
            location: start.to(parser.previous_span()),
        })
    }
}

/// `-> Type` or `: Type` after a parameter list.
pub fn parse_return_type(parser: &mut Parser) -> Result<Option<Type>, ParseError> {
    if parser.eat(TokenKind::Arrow) || parser.eat(TokenKind::Colon) {
        return Ok(Some(Type::parse(parser, None)?));
    }

    Ok(None)
}

/// A body, or `;` for signatures declared in interfaces.
fn parse_function_body(parser: &mut Parser) -> Result<Block, ParseError> {
    if parser.check(TokenKind::Semicolon) {
        let span = parser.next_token().span;
        return Ok(Block { statements: vec![], location: span });
    }

    Block::parse(parser, None)
}

/// `fn name(..) -> Type { .. }`, the keyword is consumed by the caller.
fn parse_keyword_function(parser: &mut Parser, modifiers: Modifiers, start: SrcSpan) -> Result<FunctionDecl, ParseError> {
    let (name, _) = parser.expect_ident()?;

    parse_function_rest(parser, name, None, modifiers, start)
}

/// `Type name(..) { .. }`
fn parse_typed_function(parser: &mut Parser, modifiers: Modifiers, start: SrcSpan) -> Result<FunctionDecl, ParseError> {
    let return_type = Type::parse(parser, None)?;
    let (name, _) = parser.expect_ident()?;

    parse_function_rest(parser, name, Some(return_type), modifiers, start)
}

fn parse_function_rest(
    parser: &mut Parser,
    name: String,
    return_type: Option<Type>,
    modifiers: Modifiers,
    start: SrcSpan
) -> Result<FunctionDecl, ParseError> {
    let parameters = parse_parameters(parser)?;

    let return_type = match return_type {
        Some(ty) => Some(ty),
        None => parse_return_type(parser)?,
    };

    let body = parse_function_body(parser)?;

    Ok(FunctionDecl {
        name,
        parameters,
        return_type,
        body,
        modifiers,
        parent_class: None,
        is_constructor: false,
        location: start.to(parser.previous_span()),
    })
}

/// `let|var|const name [: Type] [= expr]`, `Type name [= expr]` and
/// `name : Type [= expr]`, including the trailing `;`.
fn parse_var_decl(parser: &mut Parser, modifiers: Modifiers, start: SrcSpan) -> Result<VarDecl, ParseError> {
    let mutability = match parser.current().kind {
        TokenKind::Keyword(Keyword::Let) => Some(Mutability::Let),
        TokenKind::Keyword(Keyword::Var) => Some(Mutability::Var),
        TokenKind::Keyword(Keyword::Const) => Some(Mutability::Const),
        _ => None,
    };

    if mutability.is_some() {
        parser.step();
    }

    let mut declared_type = None;

    // `const int X = 1;`
    if typed_declaration_ahead(parser).is_some() {
        declared_type = Some(Type::parse(parser, None)?);
    }

    let (name, _) = parser.expect_ident()?;

    if declared_type.is_none() && parser.eat(TokenKind::Colon) {
        declared_type = Some(Type::parse(parser, None)?);
    }

    let initializer = match parser.eat(TokenKind::Assign) {
        true => Some(Expression::parse(parser, None)?),
        false => None,
    };

    parser.expect_semicolon()?;

    Ok(VarDecl {
        name,
        declared_type,
        initializer,
        mutability: mutability.unwrap_or(Mutability::Var),
        modifiers,
        location: start.to(parser.previous_span()),
    })
}

/// Whether a variable declaration in any of its three forms starts here.
pub fn var_decl_ahead(parser: &Parser) -> bool {
    matches!(
        parser.current().kind,
        TokenKind::Keyword(Keyword::Let | Keyword::Var | Keyword::Const)
    ) || (parser.check(TokenKind::Identifier) && parser.peek(1).kind == TokenKind::Colon)
      || typed_declaration_ahead(parser)
        .is_some_and(|length| parser.peek(length + 1).kind != TokenKind::LParen)
}

/// Parses whatever declaration follows an already consumed modifier list.
pub fn parse_declaration(parser: &mut Parser, modifiers: Modifiers, start: SrcSpan) -> Result<Statement, ParseError> {
    let token = parser.current().clone();

    let declaration = match token.kind {
        TokenKind::Keyword(Keyword::Fn | Keyword::Function | Keyword::Func) => {
            parser.step();
            Declaration::Function(parse_keyword_function(parser, modifiers, start)?)
        },
        TokenKind::Keyword(Keyword::Class | Keyword::Interface) => {
            Declaration::Class(parse_class(parser, modifiers, start)?)
        },
        TokenKind::Keyword(Keyword::Struct) => Declaration::Struct(parse_struct(parser, start)?),
        TokenKind::Keyword(Keyword::Enum) => Declaration::Enum(parse_enum(parser, start)?),
        TokenKind::Keyword(Keyword::Package) => {
            parser.step();
            let name = parse_dotted_name(parser)?;
            parser.expect_semicolon()?;

            Declaration::Package { name, location: start.to(parser.previous_span()) }
        },
        TokenKind::Keyword(Keyword::Import) => Declaration::Import(parse_import(parser, start)?),
        _ if var_decl_ahead(parser) => {
            let var = parse_var_decl(parser, modifiers, start)?;
            return Ok(Statement::new(StatementKind::Var(var), start.to(parser.previous_span())));
        },
        _ if typed_declaration_ahead(parser).is_some() => {
            Declaration::Function(parse_typed_function(parser, modifiers, start)?)
        },
        TokenKind::Eof => return parse_error(
            ParseErrorType::UnexpectedEof { expected: "a declaration".into() },
            token.span
        ),
        _ => return parse_error(
            ParseErrorType::UnexpectedToken { found: found_text(&token), expected: "a declaration".into() },
            token.span
        )
    };

    Ok(Statement::new(StatementKind::Declaration(declaration), start.to(parser.previous_span())))
}

pub fn parse_var_statement(parser: &mut Parser) -> Result<Statement, ParseError> {
    let start = parser.current().span;
    let var = parse_var_decl(parser, Modifiers::default(), start)?;

    Ok(Statement::new(StatementKind::Var(var), start.to(parser.previous_span())))
}

fn parse_dotted_name(parser: &mut Parser) -> Result<String, ParseError> {
    let (mut name, _) = parser.expect_ident()?;

    while parser.check(TokenKind::Dot) && parser.peek(1).kind == TokenKind::Identifier {
        parser.step();
        let (part, _) = parser.expect_ident()?;
        name.push('.');
        name.push_str(&part);
    }

    Ok(name)
}

fn parse_import(parser: &mut Parser, start: SrcSpan) -> Result<ImportDecl, ParseError> {
    parser.expect_keyword(Keyword::Import)?;

    let token = parser.current().clone();
    let mut is_wildcard = false;

    let path = match token.kind {
        TokenKind::String => {
            parser.step();
            token.literal.unwrap_or_default()
        },
        _ => {
            let path = parse_dotted_name(parser)?;

            if parser.check(TokenKind::Dot) && parser.peek(1).kind == TokenKind::Star {
                parser.step();
                parser.step();
                is_wildcard = true;
            }

            path
        }
    };

    let alias = match parser.eat_keyword(Keyword::As) {
        true => Some(parser.expect_ident()?.0),
        false => None,
    };

    parser.expect_semicolon()?;

    Ok(ImportDecl {
        path,
        alias,
        is_wildcard,
        location: start.to(parser.previous_span()),
    })
}

fn parse_class(parser: &mut Parser, modifiers: Modifiers, start: SrcSpan) -> Result<ClassDecl, ParseError> {
    let is_interface = parser.check_keyword(Keyword::Interface);
    parser.step();

    let (name, _) = parser.expect_ident()?;

    let superclass = match parser.eat_keyword(Keyword::Extends) {
        true => Some(parser.expect_ident()?.0),
        false => None,
    };

    let mut interfaces = vec![];
    if parser.eat_keyword(Keyword::Implements) {
        interfaces.push(parser.expect_ident()?.0);

        while parser.eat(TokenKind::Comma) {
            interfaces.push(parser.expect_ident()?.0);
        }
    }

    let open = parser.expect_one(TokenKind::LBrace)?.span;
    let mut members = vec![];

    while !parser.check(TokenKind::RBrace) && !parser.is_at_end() {
        if parser.eat(TokenKind::Semicolon) {
            continue;
        }

        let member_start = parser.position();

        match parse_class_member(parser, &name) {
            Ok(member) => members.push(member),
            Err(error) => {
                parser.report(error);
                parser.synchronize(member_start);
            }
        }
    }

    parser.expect_closing(TokenKind::RBrace, open)?;

    Ok(ClassDecl {
        name,
        superclass,
        interfaces,
        members,
        modifiers,
        is_interface,
        location: start.to(parser.previous_span()),
    })
}

// member -> <modifiers> (<function> | <var_decl> | <identifier> <parameters> <block>)
fn parse_class_member(parser: &mut Parser, class_name: &str) -> Result<ClassMember, ParseError> {
    let start = parser.current().span;
    let modifiers = Modifiers::parse(parser, None)?;
    let token = parser.current().clone();

    let mut method = match token.kind {
        TokenKind::Keyword(Keyword::Fn | Keyword::Function | Keyword::Func) => {
            parser.step();
            parse_keyword_function(parser, modifiers, start)?
        },
        // `name(..) { .. }`, including `constructor(..)`
        TokenKind::Identifier if parser.peek(1).kind == TokenKind::LParen => {
            parser.step();
            parse_function_rest(parser, token.text.clone(), None, modifiers, start)?
        },
        // `name;`, `name = 1;` and `name: int;` fields
        TokenKind::Identifier if matches!(
            parser.peek(1).kind,
            TokenKind::Assign | TokenKind::Colon | TokenKind::Semicolon
        ) => {
            return Ok(ClassMember::Field(parse_var_decl(parser, modifiers, start)?));
        },
        _ if var_decl_ahead(parser) => {
            return Ok(ClassMember::Field(parse_var_decl(parser, modifiers, start)?));
        },
        _ if typed_declaration_ahead(parser).is_some() => parse_typed_function(parser, modifiers, start)?,
        _ => return parse_error(
            ParseErrorType::UnexpectedToken { found: found_text(&token), expected: "a field or method".into() },
            token.span
        )
    };

    method.parent_class = Some(class_name.to_string());

    if method.name == class_name || method.name == "constructor" {
        method.name = class_name.to_string();
        method.is_constructor = true;

        return Ok(ClassMember::Constructor(method));
    }

    Ok(ClassMember::Method(method))
}

fn parse_struct(parser: &mut Parser, start: SrcSpan) -> Result<StructDecl, ParseError> {
    parser.expect_keyword(Keyword::Struct)?;
    let (name, _) = parser.expect_ident()?;
    let open = parser.expect_one(TokenKind::LBrace)?.span;

    let mut fields = vec![];

    while !parser.check(TokenKind::RBrace) && !parser.is_at_end() {
        if parser.eat(TokenKind::Semicolon) || parser.eat(TokenKind::Comma) {
            continue;
        }

        let field_start = parser.current().span;
        let modifiers = Modifiers::parse(parser, None)?;

        // fields may be separated by `,` as well as `;`
        if parser.check(TokenKind::Identifier) && parser.peek(1).kind == TokenKind::Comma {
            let (field, span) = parser.expect_ident()?;
            fields.push(VarDecl {
                name: field,
                declared_type: None,
                initializer: None,
                mutability: Mutability::Var,
                modifiers,
                location: span,
            });
            continue;
        }

        fields.push(parse_var_decl(parser, modifiers, field_start)?);
    }

    parser.expect_closing(TokenKind::RBrace, open)?;

    Ok(StructDecl {
        name,
        fields,
        location: start.to(parser.previous_span()),
    })
}

fn parse_enum(parser: &mut Parser, start: SrcSpan) -> Result<EnumDecl, ParseError> {
    parser.expect_keyword(Keyword::Enum)?;
    let (name, _) = parser.expect_ident()?;
    let open = parser.expect_one(TokenKind::LBrace)?.span;

    let mut values = vec![];

    while !parser.check(TokenKind::RBrace) && !parser.is_at_end() {
        let (value_name, span) = parser.expect_ident()?;

        let value = match parser.eat(TokenKind::Assign) {
            true => Some(Expression::parse(parser, Some(Precedence::Assign))?),
            false => None,
        };

        values.push(EnumValue {
            name: value_name,
            value,
            location: span.to(parser.previous_span()),
        });

        if !parser.eat(TokenKind::Comma) {
            break;
        }
    }

    parser.eat(TokenKind::Semicolon);
    parser.expect_closing(TokenKind::RBrace, open)?;

    Ok(EnumDecl {
        name,
        values,
        location: start.to(parser.previous_span()),
    })
}
