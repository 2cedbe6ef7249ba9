use super::prelude::{lex, Keyword, Lexer, LexicalErrorType, Token, TokenKind};

fn kinds(input: &str) -> Vec<TokenKind> {
    lex(input).into_iter().map(|token| token.kind).collect()
}

fn assert_kinds(input: &str, expected: &[TokenKind]) {
    let tokens = lex(input);

    for (idx, kind) in expected.iter().enumerate() {
        let token = match tokens.get(idx) {
            Some(token) => token,
            None => panic!("stopped at {kind:?} ({idx}), the stream ended early"),
        };

        assert_eq!(
            *kind, token.kind,
            "Next token does not match expected token ({:?}, {:?}) at {}",
            token, kind, idx
        );
    }

    assert_eq!(expected.len(), tokens.len(), "unexpected trailing tokens: {tokens:?}");
}

#[test]
fn test_numbers() {
    let input = "10 1.5 .5 10e5 10.4E5 2e-3 7E+2 9223372036854775807";
    let tokens = lex(input);

    let expected = vec![
        (TokenKind::Integer, "10"),
        (TokenKind::Float, "1.5"),
        (TokenKind::Float, ".5"),
        (TokenKind::Float, "10e5"),
        (TokenKind::Float, "10.4E5"),
        (TokenKind::Float, "2e-3"),
        (TokenKind::Float, "7E+2"),
        (TokenKind::Integer, "9223372036854775807"),
        (TokenKind::Eof, ""),
    ];

    for (idx, (kind, text)) in expected.iter().enumerate() {
        assert_eq!(*kind, tokens[idx].kind, "kind mismatch at {idx}: {:?}", tokens[idx]);
        assert_eq!(*text, tokens[idx].text, "text mismatch at {idx}");
    }
}

#[test]
fn test_range_is_not_a_float() {
    assert_kinds("1..5", &[
        TokenKind::Integer,
        TokenKind::DotDot,
        TokenKind::Integer,
        TokenKind::Eof,
    ]);

    assert_kinds("a.b", &[
        TokenKind::Identifier,
        TokenKind::Dot,
        TokenKind::Identifier,
        TokenKind::Eof,
    ]);
}

#[test]
fn test_invalid_numbers() {
    let tokens = lex("1e 2e+ 3");

    assert_eq!(tokens[0].kind, TokenKind::Error(LexicalErrorType::MissingDigitsAfterExponent));
    assert_eq!(tokens[0].text, "1e");
    assert_eq!(tokens[1].kind, TokenKind::Error(LexicalErrorType::MissingDigitsAfterExponent));
    assert_eq!(tokens[1].text, "2e+");
    assert_eq!(tokens[2].kind, TokenKind::Integer);
    assert_eq!(tokens[3].kind, TokenKind::Eof);
}

#[test]
fn test_operators_are_greedy() {
    assert_kinds(">>> >> > >= << <= < == = != ! && & || | ++ += + -- -= -> - *= * /= / %= % .. . ^ ~ ? : ; ,", &[
        TokenKind::UnsignedShiftRight,
        TokenKind::ShiftRight,
        TokenKind::Greater,
        TokenKind::GreaterEqual,
        TokenKind::ShiftLeft,
        TokenKind::LessEqual,
        TokenKind::Less,
        TokenKind::EqualEqual,
        TokenKind::Assign,
        TokenKind::BangEqual,
        TokenKind::Bang,
        TokenKind::AndAnd,
        TokenKind::Ampersand,
        TokenKind::OrOr,
        TokenKind::Pipe,
        TokenKind::PlusPlus,
        TokenKind::PlusAssign,
        TokenKind::Plus,
        TokenKind::MinusMinus,
        TokenKind::MinusAssign,
        TokenKind::Arrow,
        TokenKind::Minus,
        TokenKind::StarAssign,
        TokenKind::Star,
        TokenKind::SlashAssign,
        TokenKind::Slash,
        TokenKind::PercentAssign,
        TokenKind::Percent,
        TokenKind::DotDot,
        TokenKind::Dot,
        TokenKind::Caret,
        TokenKind::Tilde,
        TokenKind::Question,
        TokenKind::Colon,
        TokenKind::Semicolon,
        TokenKind::Comma,
        TokenKind::Eof,
    ]);

    // no spaces: still the longest prefix first
    assert_kinds("a>>>=b", &[
        TokenKind::Identifier,
        TokenKind::UnsignedShiftRight,
        TokenKind::Assign,
        TokenKind::Identifier,
        TokenKind::Eof,
    ]);
}

#[test]
fn test_keywords_and_literals() {
    assert_kinds("class Foo extends Bar { private static int x = null; } true false", &[
        TokenKind::Keyword(Keyword::Class),
        TokenKind::Identifier,
        TokenKind::Keyword(Keyword::Extends),
        TokenKind::Identifier,
        TokenKind::LBrace,
        TokenKind::Keyword(Keyword::Private),
        TokenKind::Keyword(Keyword::Static),
        TokenKind::Keyword(Keyword::Int),
        TokenKind::Identifier,
        TokenKind::Assign,
        TokenKind::Null,
        TokenKind::Semicolon,
        TokenKind::RBrace,
        TokenKind::True,
        TokenKind::False,
        TokenKind::Eof,
    ]);

    assert_eq!(kinds("_private9 fnord")[0], TokenKind::Identifier);
    assert_eq!(kinds("fnord")[0], TokenKind::Identifier);
    assert_eq!(kinds("fn")[0], TokenKind::Keyword(Keyword::Fn));
}

#[test]
fn test_strings_and_chars() {
    let tokens = lex(r#""a\tb\n\"q\"" 'x' '\n' "\\""#);

    assert_eq!(tokens[0].kind, TokenKind::String);
    assert_eq!(tokens[0].literal.as_deref(), Some("a\tb\n\"q\""));
    assert_eq!(tokens[0].text, r#""a\tb\n\"q\"""#);

    assert_eq!(tokens[1].kind, TokenKind::Char);
    assert_eq!(tokens[1].literal.as_deref(), Some("x"));

    assert_eq!(tokens[2].kind, TokenKind::Char);
    assert_eq!(tokens[2].literal.as_deref(), Some("\n"));

    assert_eq!(tokens[3].kind, TokenKind::String);
    assert_eq!(tokens[3].literal.as_deref(), Some("\\"));

    assert_eq!(tokens[4].kind, TokenKind::Eof);
}

#[test]
fn test_lexical_errors() {
    let tokens = lex("\"never closed");
    assert_eq!(tokens[0].kind, TokenKind::Error(LexicalErrorType::UnterminatedString));
    assert_eq!(tokens[1].kind, TokenKind::Eof);

    let tokens = lex("''");
    assert_eq!(tokens[0].kind, TokenKind::Error(LexicalErrorType::EmptyChar));

    let tokens = lex(r#""bad \q escape" x"#);
    assert_eq!(tokens[0].kind, TokenKind::Error(LexicalErrorType::InvalidEscape { ch: 'q' }));
    assert_eq!(tokens[1].kind, TokenKind::Identifier);

    let tokens = lex("a /* never closed");
    assert_eq!(tokens[0].kind, TokenKind::Identifier);
    assert_eq!(tokens[1].kind, TokenKind::Error(LexicalErrorType::MissingCommentEnd));
    assert_eq!(tokens[2].kind, TokenKind::Eof);
}

#[test]
fn test_bad_char_escape_is_one_token() {
    let tokens = lex(r"let c = '\q'; x");

    assert_eq!(tokens.len(), 7);
    assert_eq!(tokens[3].kind, TokenKind::Error(LexicalErrorType::InvalidEscape { ch: 'q' }));
    assert_eq!(tokens[3].text, r"'\q'");
    assert_eq!(tokens[4].kind, TokenKind::Semicolon);
    assert_eq!(tokens[5].kind, TokenKind::Identifier);
}

#[test]
fn test_unrecognized_character_is_one_token() {
    let tokens = lex("a @ b # c");

    assert_eq!(tokens.len(), 6);
    assert_eq!(tokens[1].kind, TokenKind::Error(LexicalErrorType::UnrecognizedCharacter { ch: '@' }));
    assert_eq!(tokens[1].text, "@");
    assert_eq!(tokens[2].kind, TokenKind::Identifier);
    assert_eq!(tokens[3].kind, TokenKind::Error(LexicalErrorType::UnrecognizedCharacter { ch: '#' }));
    assert_eq!(tokens[5].kind, TokenKind::Eof);
}

#[test]
fn test_positions() {
    let tokens = lex("let x\n  = 5; // trailing\n/* block\n */ y");

    let expected = vec![
        ("let", 1, 1),
        ("x", 1, 5),
        ("=", 2, 3),
        ("5", 2, 5),
        (";", 2, 6),
        ("y", 4, 5),
        ("", 4, 6),
    ];

    for (idx, (text, line, column)) in expected.iter().enumerate() {
        let token: &Token = &tokens[idx];

        assert_eq!(*text, token.text, "text mismatch at {idx}");
        assert_eq!((*line, *column), (token.line(), token.column()), "position mismatch for {token}");
    }
}

#[test]
fn test_concatenated_text_matches_source() {
    let input = "let x = 10 + 5 * 2; // note\nprint(x);\n/* gone */ s = \"a b\";";
    let tokens = lex(input);

    let joined = tokens.iter().map(|token| token.text.as_str()).collect::<String>();

    assert_eq!(joined, "letx=10+5*2;print(x);s=\"a b\";");
    assert_eq!(tokens.iter().filter(|token| token.kind == TokenKind::Eof).count(), 1);
    assert!(tokens.iter().all(|token| token.line() >= 1 && token.column() >= 1));
}

#[test]
fn test_iterator_stops_after_eof() {
    let mut lexer = Lexer::new("x".char_indices().map(|(i, c)| (i as u32, c)));

    assert_eq!(lexer.next().map(|token| token.kind), Some(TokenKind::Identifier));
    assert_eq!(lexer.next().map(|token| token.kind), Some(TokenKind::Eof));
    assert_eq!(lexer.next(), None);

    assert_eq!(kinds(""), vec![TokenKind::Eof]);
    assert_eq!(kinds("   // only a comment"), vec![TokenKind::Eof]);
}
