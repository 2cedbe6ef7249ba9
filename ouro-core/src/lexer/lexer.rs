use super::error::LexicalErrorType;
use super::token::{Keyword, Token, TokenKind};
use std::fmt::Display;
use crate::utils::prelude::SrcSpan;

pub fn str_to_keyword(word: &str) -> Option<TokenKind> {
	let keyword = match word {
		"let" => Keyword::Let,
		"var" => Keyword::Var,
		"const" => Keyword::Const,
		"fn" => Keyword::Fn,
		"function" => Keyword::Function,
		"func" => Keyword::Func,
		"if" => Keyword::If,
		"else" => Keyword::Else,
		"while" => Keyword::While,
		"for" => Keyword::For,
		"do" => Keyword::Do,
		"return" => Keyword::Return,
		"break" => Keyword::Break,
		"continue" => Keyword::Continue,
		"class" => Keyword::Class,
		"interface" => Keyword::Interface,
		"struct" => Keyword::Struct,
		"enum" => Keyword::Enum,
		"extends" => Keyword::Extends,
		"implements" => Keyword::Implements,
		"this" => Keyword::This,
		"super" => Keyword::Super,
		"new" => Keyword::New,
		"static" => Keyword::Static,
		"public" => Keyword::Public,
		"private" => Keyword::Private,
		"protected" => Keyword::Protected,
		"internal" => Keyword::Internal,
		"import" => Keyword::Import,
		"as" => Keyword::As,
		"in" => Keyword::In,
		"package" => Keyword::Package,
		"try" => Keyword::Try,
		"catch" => Keyword::Catch,
		"finally" => Keyword::Finally,
		"throw" => Keyword::Throw,
		"async" => Keyword::Async,
		"await" => Keyword::Await,
		"void" => Keyword::Void,
		"int" => Keyword::Int,
		"long" => Keyword::Long,
		"float" => Keyword::Float,
		"double" => Keyword::Double,
		"bool" => Keyword::Bool,
		"string" => Keyword::String,
		"char" => Keyword::Char,
		"any" => Keyword::Any,
		"array" => Keyword::Array,
		"object" => Keyword::Object,
		"map" => Keyword::Map,

		"true" => return Some(TokenKind::True),
		"false" => return Some(TokenKind::False),
		"null" => return Some(TokenKind::Null),

		_ => return None
	};

	Some(TokenKind::Keyword(keyword))
}

/// Scans the whole source, the returned vector always ends with one `Eof`.
pub fn lex(source: &str) -> Vec<Token> {
	Lexer::new(source.char_indices().map(|(i, c)| (i as u32, c))).collect()
}

#[derive(Debug, Clone, Copy)]
struct Mark {
	position: u32,
	line: u32,
	column: u32,
}

#[derive(Debug)]
pub struct Lexer<T: Iterator<Item = (u32, char)>> {
	ch: Option<(u32, char)>,
	next_ch: Option<(u32, char)>,
	offset: u32,
	line: u32,
	column: u32,
	input: T,
	finished: bool,
}

impl<T: Iterator<Item = (u32, char)>> Display for Lexer<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f,
			"Lexer {{\n\tposition: {},\n\tline: {}, column: {},\n\tch: {:?}, next_ch: {:?}\n}}",
			self.position(), self.line, self.column, self.ch, self.next_ch
		)
	}
}

impl<T: Iterator<Item = (u32, char)>> Lexer<T> {
	pub fn new(mut input: T) -> Self {
		let ch = input.next();
		let next_ch = input.next();

		Self {
			ch,
			next_ch,
			offset: 0,
			line: 1,
			column: 1,
			input,
			finished: false,
		}
	}

	pub fn next_token(&mut self) -> Token {
		if let Some(error) = self.skip_trivia() {
			return error;
		}

		let mark = self.mark();

		match self.current() {
			None => Token::new(TokenKind::Eof, "", self.span_from(mark)),
			Some(ch) => match ch {
				'a'..='z' | 'A'..='Z' | '_' => self.lex_ident(mark),
				'0'..='9' => self.lex_number(mark),
				'.' if self.peek().is_some_and(|c| c.is_ascii_digit()) => self.lex_number(mark),
				'"' => self.lex_string(mark),
				'\'' => self.lex_char(mark),
				_ => self.lex_operator(mark),
			}
		}
	}

	fn current(&self) -> Option<char> {
		self.ch.map(|(_, c)| c)
	}

	fn peek(&self) -> Option<char> {
		self.next_ch.map(|(_, c)| c)
	}

	fn position(&self) -> u32 {
		self.ch.map(|(pos, _)| pos).unwrap_or(self.offset)
	}

	fn mark(&self) -> Mark {
		Mark {
			position: self.position(),
			line: self.line,
			column: self.column,
		}
	}

	fn span_from(&self, mark: Mark) -> SrcSpan {
		SrcSpan::new(mark.position, self.position(), mark.line, mark.column)
	}

	fn next_char(&mut self) -> Option<char> {
		let ch = self.ch.take();

		if let Some((pos, c)) = ch {
			self.offset = pos + c.len_utf8() as u32;

			if c == '\n' {
				self.line += 1;
				self.column = 1;
			} else {
				self.column += 1;
			}
		}

		self.ch = self.next_ch.take();
		self.next_ch = self.input.next();

		ch.map(|(_, c)| c)
	}

	fn bump(&mut self, text: &mut String) {
		if let Some(c) = self.next_char() {
			text.push(c);
		}
	}

	fn skip_trivia(&mut self) -> Option<Token> {
		loop {
			match (self.current(), self.peek()) {
				(Some(c), _) if c.is_whitespace() => {
					self.next_char();
				},
				(Some('/'), Some('/')) => {
					while !matches!(self.current(), None | Some('\n')) {
						self.next_char();
					}
				},
				(Some('/'), Some('*')) => {
					let mark = self.mark();
					let mut text = String::new();
					self.bump(&mut text);
					self.bump(&mut text);

					loop {
						match (self.current(), self.peek()) {
							(Some('*'), Some('/')) => {
								self.next_char();
								self.next_char();
								break;
							},
							(Some(_), _) => self.bump(&mut text),
							(None, _) => {
								return Some(Token::new(
									TokenKind::Error(LexicalErrorType::MissingCommentEnd),
									text,
									self.span_from(mark),
								));
							}
						}
					}
				},
				_ => return None
			}
		}
	}

	fn lex_ident(&mut self, mark: Mark) -> Token {
		let mut ident = String::new();

		while let Some(ch) = self.current() {
			if ch.is_ascii_alphanumeric() || ch == '_' {
				self.bump(&mut ident);
			} else {
				break;
			}
		}

		let kind = str_to_keyword(&ident).unwrap_or(TokenKind::Identifier);

		Token::new(kind, ident, self.span_from(mark))
	}

	fn lex_number(&mut self, mark: Mark) -> Token {
		let mut value = String::new();
		let mut is_float = false;

		let eat_digits = |lexer: &mut Self, value: &mut String| {
			while lexer.current().is_some_and(|c| c.is_ascii_digit()) {
				lexer.bump(value);
			}
		};

		eat_digits(self, &mut value);

		// `1..5` is a range, not a float
		if self.current() == Some('.') && self.peek().is_some_and(|c| c.is_ascii_digit()) {
			is_float = true;
			self.bump(&mut value);
			eat_digits(self, &mut value);
		}

		if matches!(self.current(), Some('e' | 'E')) {
			is_float = true;
			self.bump(&mut value);

			if matches!(self.current(), Some('+' | '-')) {
				self.bump(&mut value);
			}

			if !self.current().is_some_and(|c| c.is_ascii_digit()) {
				return Token::new(
					TokenKind::Error(LexicalErrorType::MissingDigitsAfterExponent),
					value,
					self.span_from(mark),
				);
			}

			eat_digits(self, &mut value);
		}

		let kind = if is_float { TokenKind::Float } else { TokenKind::Integer };

		Token::new(kind, value, self.span_from(mark))
	}

	fn lex_escape(&mut self, text: &mut String) -> Result<char, LexicalErrorType> {
		self.bump(text); // backslash

		let escaped = match self.current() {
			Some('n') => '\n',
			Some('t') => '\t',
			Some('r') => '\r',
			Some('b') => '\u{8}',
			Some('f') => '\u{c}',
			Some('\\') => '\\',
			Some('"') => '"',
			Some('\'') => '\'',
			Some(ch) => {
				self.bump(text);
				return Err(LexicalErrorType::InvalidEscape { ch });
			},
			None => return Err(LexicalErrorType::UnterminatedString),
		};

		self.bump(text);

		Ok(escaped)
	}

	fn lex_string(&mut self, mark: Mark) -> Token {
		let mut text = String::new();
		let mut value = String::new();
		let mut error = None;

		self.bump(&mut text);

		loop {
			match self.current() {
				Some('"') => {
					self.bump(&mut text);
					break;
				},
				Some('\\') => match self.lex_escape(&mut text) {
					Ok(ch) => value.push(ch),
					Err(err) => {
						error.get_or_insert(err);
					}
				},
				Some(_) => {
					if let Some(ch) = self.next_char() {
						text.push(ch);
						value.push(ch);
					}
				},
				None => {
					error = Some(LexicalErrorType::UnterminatedString);
					break;
				}
			}
		}

		let span = self.span_from(mark);

		match error {
			Some(err) => Token::new(TokenKind::Error(err), text, span),
			None => Token {
				literal: Some(value),
				..Token::new(TokenKind::String, text, span)
			}
		}
	}

	fn lex_char(&mut self, mark: Mark) -> Token {
		let mut text = String::new();

		self.bump(&mut text);

		let value = match self.current() {
			Some('\'') => {
				self.bump(&mut text);
				return Token::new(TokenKind::Error(LexicalErrorType::EmptyChar), text, self.span_from(mark));
			},
			Some('\\') => match self.lex_escape(&mut text) {
				Ok(ch) => ch,
				Err(err) => {
					let err = match err {
						LexicalErrorType::UnterminatedString => LexicalErrorType::UnterminatedChar,
						err => {
							self.skip_char_rest(&mut text);
							err
						}
					};
					return Token::new(TokenKind::Error(err), text, self.span_from(mark));
				}
			},
			Some('\n') | None => {
				return Token::new(TokenKind::Error(LexicalErrorType::UnterminatedChar), text, self.span_from(mark));
			},
			Some(_) => match self.next_char() {
				Some(ch) => {
					text.push(ch);
					ch
				},
				None => return Token::new(TokenKind::Error(LexicalErrorType::UnterminatedChar), text, self.span_from(mark)),
			}
		};

		if self.current() != Some('\'') {
			return Token::new(TokenKind::Error(LexicalErrorType::UnterminatedChar), text, self.span_from(mark));
		}

		self.bump(&mut text);

		Token {
			literal: Some(value.to_string()),
			..Token::new(TokenKind::Char, text, self.span_from(mark))
		}
	}

	/// Consumes the rest of a broken char literal up to and including its
	/// closing quote, stopping at the end of the line.
	fn skip_char_rest(&mut self, text: &mut String) {
		while let Some(ch) = self.current() {
			if ch == '\n' {
				return;
			}

			self.bump(text);

			if ch == '\'' {
				return;
			}
		}
	}

	fn lex_operator(&mut self, mark: Mark) -> Token {
		let mut text = String::new();

		let ch = match self.next_char() {
			Some(ch) => ch,
			None => return Token::new(TokenKind::Eof, "", self.span_from(mark)),
		};
		text.push(ch);

		let next = self.current();
		let mut two = |lexer: &mut Self, kind: TokenKind| {
			lexer.bump(&mut text);
			kind
		};

		let kind = match (ch, next) {
			('(', _) => TokenKind::LParen,
			(')', _) => TokenKind::RParen,
			('{', _) => TokenKind::LBrace,
			('}', _) => TokenKind::RBrace,
			('[', _) => TokenKind::LBracket,
			(']', _) => TokenKind::RBracket,
			(',', _) => TokenKind::Comma,
			(';', _) => TokenKind::Semicolon,
			(':', _) => TokenKind::Colon,
			('?', _) => TokenKind::Question,
			('~', _) => TokenKind::Tilde,
			('^', _) => TokenKind::Caret,

			('.', Some('.')) => two(self, TokenKind::DotDot),
			('.', _) => TokenKind::Dot,

			('+', Some('+')) => two(self, TokenKind::PlusPlus),
			('+', Some('=')) => two(self, TokenKind::PlusAssign),
			('+', _) => TokenKind::Plus,

			('-', Some('-')) => two(self, TokenKind::MinusMinus),
			('-', Some('=')) => two(self, TokenKind::MinusAssign),
			('-', Some('>')) => two(self, TokenKind::Arrow),
			('-', _) => TokenKind::Minus,

			('*', Some('=')) => two(self, TokenKind::StarAssign),
			('*', _) => TokenKind::Star,
			('/', Some('=')) => two(self, TokenKind::SlashAssign),
			('/', _) => TokenKind::Slash,
			('%', Some('=')) => two(self, TokenKind::PercentAssign),
			('%', _) => TokenKind::Percent,

			('=', Some('=')) => two(self, TokenKind::EqualEqual),
			('=', _) => TokenKind::Assign,
			('!', Some('=')) => two(self, TokenKind::BangEqual),
			('!', _) => TokenKind::Bang,

			('<', Some('=')) => two(self, TokenKind::LessEqual),
			('<', Some('<')) => two(self, TokenKind::ShiftLeft),
			('<', _) => TokenKind::Less,

			('>', Some('=')) => two(self, TokenKind::GreaterEqual),
			('>', Some('>')) => {
				let kind = two(self, TokenKind::ShiftRight);

				if self.current() == Some('>') {
					self.bump(&mut text);
					TokenKind::UnsignedShiftRight
				} else {
					kind
				}
			},
			('>', _) => TokenKind::Greater,

			('&', Some('&')) => two(self, TokenKind::AndAnd),
			('&', _) => TokenKind::Ampersand,
			('|', Some('|')) => two(self, TokenKind::OrOr),
			('|', _) => TokenKind::Pipe,

			(ch, _) => TokenKind::Error(LexicalErrorType::UnrecognizedCharacter { ch }),
		};

		Token::new(kind, text, self.span_from(mark))
	}
}

impl<T: Iterator<Item = (u32, char)>> Iterator for Lexer<T> {
	type Item = Token;

	fn next(&mut self) -> Option<Self::Item> {
		if self.finished {
			return None;
		}

		let token = self.next_token();

		if token.kind == TokenKind::Eof {
			self.finished = true;
		}

		Some(token)
	}
}
