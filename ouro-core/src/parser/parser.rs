use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{
    lexer::prelude::{lex, Keyword, LexicalError, Token, TokenKind},
    utils::prelude::{Diagnostic, SrcSpan}
};
use super::error::{found_text, parse_error, ParseError, ParseErrorType};
use super::ast::{Module, Parsed, Program, Statement};

static ANONYMOUS_FUNCTIONS: AtomicUsize = AtomicUsize::new(0);

pub trait Parse
    where Self: Sized,
{
    fn parse(
        parser: &mut Parser,
        precedence: Option<Precedence>
    ) -> Result<Self, ParseError>;
}

pub trait InfixParse<L>
    where Self: Sized,
{
    fn parse(
        parser: &mut Parser,
        left: L,
        precedence: Option<Precedence>
    ) -> Result<Self, ParseError>;
}

pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl Parser {
    /// Error tokens are reported as lexical diagnostics and dropped from the
    /// stream, so the grammar never sees them.
    pub fn new(input: Vec<Token>) -> Self {
        let mut diagnostics = vec![];
        let mut tokens = Vec::with_capacity(input.len());

        for token in input {
            match token.kind {
                TokenKind::Error(error) => {
                    diagnostics.push(LexicalError { error, location: token.span }.to_diagnostic());
                },
                _ => tokens.push(token)
            }
        }

        if !tokens.last().is_some_and(|token| token.kind == TokenKind::Eof) {
            let span = tokens.last()
                .map(|token| SrcSpan::new(token.span.end, token.span.end, token.span.line, token.span.column))
                .unwrap_or_default();

            tokens.push(Token::new(TokenKind::Eof, "", span));
        }

        Self {
            tokens,
            position: 0,
            diagnostics,
        }
    }

    pub fn current(&self) -> &Token {
        self.peek(0)
    }

    /// Looks `offset` tokens ahead, clamped to the trailing `Eof`.
    pub fn peek(&self, offset: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.position + offset).min(last)]
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Span of the last consumed token.
    pub fn previous_span(&self) -> SrcSpan {
        match self.position {
            0 => self.current().span,
            position => self.tokens[position - 1].span,
        }
    }

    pub fn is_at_end(&self) -> bool {
        self.current().kind == TokenKind::Eof
    }

    pub fn step(&mut self) {
        let _ = self.next_token();
    }

    pub fn next_token(&mut self) -> Token {
        let token = self.current().clone();

        if token.kind != TokenKind::Eof {
            self.position += 1;
        }

        token
    }

    pub fn check(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    pub fn check_keyword(&self, keyword: Keyword) -> bool {
        self.current().kind.is_keyword(keyword)
    }

    pub fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.step();
            return true;
        }

        false
    }

    pub fn eat_keyword(&mut self, keyword: Keyword) -> bool {
        self.eat(TokenKind::Keyword(keyword))
    }

    pub fn current_precedence(&self) -> Precedence {
        Precedence::from(&self.current().kind)
    }

    pub fn expect_one(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        let token = self.current().clone();

        if token.kind == kind {
            self.step();
            return Ok(token);
        }

        let expected = format!("'{}'", kind.as_literal());

        match token.kind {
            TokenKind::Eof => parse_error(ParseErrorType::UnexpectedEof { expected }, token.span),
            _ => parse_error(
                ParseErrorType::UnexpectedToken { found: found_text(&token), expected },
                token.span
            )
        }
    }

    pub fn expect_keyword(&mut self, keyword: Keyword) -> Result<Token, ParseError> {
        self.expect_one(TokenKind::Keyword(keyword))
    }

    /// Expects the delimiter closing `opened_at`, reporting it as unclosed
    /// when the input ends first.
    pub fn expect_closing(&mut self, kind: TokenKind, opened_at: SrcSpan) -> Result<Token, ParseError> {
        if self.is_at_end() {
            let delimiter = match kind {
                TokenKind::RParen => "(",
                TokenKind::RBracket => "[",
                _ => "{",
            };

            return parse_error(
                ParseErrorType::UnclosedDelimiter { delimiter, opened_at },
                self.current().span
            );
        }

        self.expect_one(kind)
    }

    pub fn expect_semicolon(&mut self) -> Result<(), ParseError> {
        if self.eat(TokenKind::Semicolon) {
            return Ok(());
        }

        // the last statement of a block or file may omit it
        if matches!(self.current().kind, TokenKind::RBrace | TokenKind::Eof) {
            return Ok(());
        }

        let token = self.current();
        parse_error(ParseErrorType::MissingSemicolon { found: found_text(token) }, token.span)
    }

    pub fn expect_ident(&mut self) -> Result<(String, SrcSpan), ParseError> {
        let token = self.current().clone();

        match token.kind {
            TokenKind::Identifier => {
                self.step();
                Ok((token.text, token.span))
            },
            TokenKind::Eof => parse_error(
                ParseErrorType::UnexpectedEof { expected: "an identifier".into() },
                token.span
            ),
            _ => parse_error(
                ParseErrorType::ExpectedIdent { found: found_text(&token) },
                token.span
            )
        }
    }

    /// Member names may reuse keywords, as in `list.map` or `obj.new`.
    pub fn expect_member_name(&mut self) -> Result<(String, SrcSpan), ParseError> {
        let token = self.current().clone();

        match token.kind {
            TokenKind::Keyword(_) | TokenKind::True | TokenKind::False | TokenKind::Null => {
                self.step();
                Ok((token.text, token.span))
            },
            _ => self.expect_ident()
        }
    }

    /// Closes a generic argument list. `>>` and `>>>` are split so nested
    /// lists such as `map<string, array<int>>` close correctly.
    pub fn expect_closing_angle(&mut self) -> Result<(), ParseError> {
        let token = self.current().clone();

        let rest = match token.kind {
            TokenKind::Greater => {
                self.step();
                return Ok(());
            },
            TokenKind::ShiftRight => TokenKind::Greater,
            TokenKind::UnsignedShiftRight => TokenKind::ShiftRight,
            _ => return self.expect_one(TokenKind::Greater).map(|_| ())
        };

        let span = SrcSpan::new(token.span.start + 1, token.span.end, token.span.line, token.span.column + 1);
        self.tokens[self.position] = Token::new(rest, &token.text[1..], span);

        Ok(())
    }

    pub fn next_anonymous_name(&mut self) -> String {
        let id = ANONYMOUS_FUNCTIONS.fetch_add(1, Ordering::Relaxed);
        format!("<anon_{id}>")
    }

    pub fn report(&mut self, error: ParseError) {
        tracing::trace!(error = %error.details(), "syntax error");
        self.diagnostics.push(error.to_diagnostic());
    }

    /// Panic-mode recovery. Discards tokens until just after a `;`, or until
    /// a statement keyword or a `}` is reached. At least one token is
    /// consumed when the failing statement consumed none.
    pub fn synchronize(&mut self, statement_start: usize) {
        if self.position == statement_start && !self.is_at_end() {
            self.step();
        }

        while !self.is_at_end() {
            match self.current().kind {
                TokenKind::Semicolon => {
                    self.step();
                    return;
                },
                TokenKind::RBrace => return,
                TokenKind::Keyword(
                    Keyword::Class
                    | Keyword::Fn
                    | Keyword::Function
                    | Keyword::Func
                    | Keyword::Var
                    | Keyword::Let
                    | Keyword::Const
                    | Keyword::If
                    | Keyword::While
                    | Keyword::For
                    | Keyword::Return
                ) => return,
                _ => self.step()
            }
        }
    }

    /// Parses one statement, recovering on failure. Returns `None` when the
    /// statement had to be skipped.
    pub fn parse_recovering(&mut self) -> Option<Statement> {
        let start = self.position;

        match Statement::parse(self, None) {
            Ok(statement) => Some(statement),
            Err(error) => {
                self.report(error);
                self.synchronize(start);
                None
            }
        }
    }

    pub fn parse(&mut self) -> Program {
        let start = self.current().span;
        let mut statements = vec![];

        while !self.is_at_end() {
            if self.eat(TokenKind::Semicolon) {
                continue;
            }

            if let Some(statement) = self.parse_recovering() {
                statements.push(statement);
            }
        }

        Program {
            statements,
            location: start.to(self.current().span),
        }
    }

    pub fn finish(mut self) -> Vec<Diagnostic> {
        self.diagnostics.sort_by_key(|diagnostic| {
            let span = diagnostic.span();
            (span.line, span.column)
        });

        self.diagnostics
    }
}

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub enum Precedence {
    Lowest,
    Assign,
    Ternary,
    Or,
    And,
    BitOr,
    BitXor,
    BitAnd,
    Equals,
    LessGreater,
    Shift,
    Sum,
    Product,
    Prefix,
    Postfix,
}

impl Precedence {
    /// The binding power one step below, used to make an operator
    /// right-associative.
    pub fn lower(self) -> Self {
        match self {
            Self::Lowest | Self::Assign => Self::Lowest,
            Self::Ternary => Self::Assign,
            Self::Or => Self::Ternary,
            Self::And => Self::Or,
            Self::BitOr => Self::And,
            Self::BitXor => Self::BitOr,
            Self::BitAnd => Self::BitXor,
            Self::Equals => Self::BitAnd,
            Self::LessGreater => Self::Equals,
            Self::Shift => Self::LessGreater,
            Self::Sum => Self::Shift,
            Self::Product => Self::Sum,
            Self::Prefix => Self::Product,
            Self::Postfix => Self::Prefix,
        }
    }
}

impl From<&TokenKind> for Precedence {
    fn from(value: &TokenKind) -> Self {
        match value {
            TokenKind::Assign
            | TokenKind::PlusAssign
            | TokenKind::MinusAssign
            | TokenKind::StarAssign
            | TokenKind::SlashAssign
            | TokenKind::PercentAssign => Self::Assign,
            TokenKind::Question => Self::Ternary,
            TokenKind::OrOr => Self::Or,
            TokenKind::AndAnd => Self::And,
            TokenKind::Pipe => Self::BitOr,
            TokenKind::Caret => Self::BitXor,
            TokenKind::Ampersand => Self::BitAnd,
            TokenKind::EqualEqual | TokenKind::BangEqual => Self::Equals,
            TokenKind::Less | TokenKind::LessEqual
            | TokenKind::Greater | TokenKind::GreaterEqual => Self::LessGreater,
            TokenKind::ShiftLeft | TokenKind::ShiftRight | TokenKind::UnsignedShiftRight => Self::Shift,
            TokenKind::Plus | TokenKind::Minus => Self::Sum,
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent => Self::Product,
            TokenKind::Dot
            | TokenKind::LParen
            | TokenKind::LBracket
            | TokenKind::PlusPlus
            | TokenKind::MinusMinus => Self::Postfix,
            _ => Self::Lowest,
        }
    }
}

/// Parses an already lexed token stream.
pub fn parse(tokens: Vec<Token>) -> (Program, Vec<Diagnostic>) {
    let mut parser = Parser::new(tokens);
    let program = parser.parse();

    (program, parser.finish())
}

pub fn parse_module(name: &str, src: &str) -> Parsed {
    let (program, diagnostics) = parse(lex(src));

    tracing::debug!(
        module = name,
        statements = program.statements.len(),
        diagnostics = diagnostics.len(),
        "parsed module"
    );

    Parsed {
        module: Module {
            name: name.to_string(),
            program,
        },
        diagnostics,
    }
}
