//! Classify contiguous spans of source text into tokens to simplify parsing.

use crate::source::{Source, SourcePos, SourceSpan};
use std::fmt;

/// Kind of the token matched by the [`Lexer`]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum TokenKind {
    /// `"bool"`
    KeywordBool,
    /// `"const"`
    KeywordConst,
    /// `"double"`
    KeywordDouble,
    /// `"enum"`
    KeywordEnum,
    /// `"exception"`
    KeywordException,
    /// `"extends"`
    KeywordExtends,
    /// `"false"`
    KeywordFalse,
    /// `"i32"`
    KeywordI32,
    /// `"i64"`
    KeywordI64,
    /// `"include"`
    KeywordInclude,
    /// `"list"`
    KeywordList,
    /// `"map"`
    KeywordMap,
    /// `"namespace"`
    KeywordNamespace,
    /// `"oneway"`
    KeywordOneway,
    /// `"optional"`
    KeywordOptional,
    /// `"required"`
    KeywordRequired,
    /// `"service"`
    KeywordService,
    /// `"string"`
    KeywordString,
    /// `"struct"`
    KeywordStruct,
    /// `"throws"`
    KeywordThrows,
    /// `"true"`
    KeywordTrue,
    /// `"typedef"`
    KeywordTypedef,
    /// `"void"`
    KeywordVoid,

    /// `[+-]?[0-9]+`
    IntegerLiteral,
    /// `'"' [^"]* '"'`
    StringLiteral,
    /// `[_A-Za-z][_0-9A-Za-z]*`
    Identifier,

    /// `'{'`
    OpenBrace,
    /// `'}'`
    CloseBrace,
    /// `'['`
    OpenBracket,
    /// `']'`
    CloseBracket,
    /// `'('`
    OpenParen,
    /// `')'`
    CloseParen,
    /// `'<'`
    LessThan,
    /// `'>'`
    GreaterThan,
    /// `'='`
    Equals,
    /// `':'`
    Colon,
    /// `';'`
    Semicolon,
    /// `','`
    Comma,
    /// `'.'`
    Dot,
    /// `'*'`
    Star,

    /// Unclosed string literal
    ErrorUnclosedString,
    /// Unclosed `/* */` comment
    ErrorUnclosedComment,
    /// Integer literal outside the 64-bit range
    ErrorIntegerRange,
    /// Anything else
    ErrorUnknownChar,

    /// Lexer has not been initialized
    Start,
    /// Lexer has reach the end of input
    End,
}

const KEYWORDS: &[(&str, TokenKind)] = &[
    ("bool", TokenKind::KeywordBool),
    ("const", TokenKind::KeywordConst),
    ("double", TokenKind::KeywordDouble),
    ("enum", TokenKind::KeywordEnum),
    ("exception", TokenKind::KeywordException),
    ("extends", TokenKind::KeywordExtends),
    ("false", TokenKind::KeywordFalse),
    ("i32", TokenKind::KeywordI32),
    ("i64", TokenKind::KeywordI64),
    ("include", TokenKind::KeywordInclude),
    ("list", TokenKind::KeywordList),
    ("map", TokenKind::KeywordMap),
    ("namespace", TokenKind::KeywordNamespace),
    ("oneway", TokenKind::KeywordOneway),
    ("optional", TokenKind::KeywordOptional),
    ("required", TokenKind::KeywordRequired),
    ("service", TokenKind::KeywordService),
    ("string", TokenKind::KeywordString),
    ("struct", TokenKind::KeywordStruct),
    ("throws", TokenKind::KeywordThrows),
    ("true", TokenKind::KeywordTrue),
    ("typedef", TokenKind::KeywordTypedef),
    ("void", TokenKind::KeywordVoid),
];

impl TokenKind {
    /// Reclassify identifier-shaped text as a keyword, if it is one.
    pub fn keyword(text: &str) -> Option<TokenKind> {
        KEYWORDS
            .iter()
            .find(|(spelling, _)| *spelling == text)
            .map(|&(_, kind)| kind)
    }

    pub fn is_keyword(self) -> bool {
        KEYWORDS.iter().any(|&(_, kind)| kind == self)
    }

    pub fn is_error(self) -> bool {
        matches!(
            self,
            Self::ErrorUnclosedString
                | Self::ErrorUnclosedComment
                | Self::ErrorIntegerRange
                | Self::ErrorUnknownChar
        )
    }

    /// Canonical spelling, used for diagnostics.
    pub fn as_str(self) -> &'static str {
        if let Some(&(spelling, _)) = KEYWORDS.iter().find(|&&(_, kind)| kind == self) {
            return spelling;
        }
        match self {
            Self::IntegerLiteral => "<integer>",
            Self::StringLiteral => "<string>",
            Self::Identifier => "<identifier>",
            Self::OpenBrace => "{",
            Self::CloseBrace => "}",
            Self::OpenBracket => "[",
            Self::CloseBracket => "]",
            Self::OpenParen => "(",
            Self::CloseParen => ")",
            Self::LessThan => "<",
            Self::GreaterThan => ">",
            Self::Equals => "=",
            Self::Colon => ":",
            Self::Semicolon => ";",
            Self::Comma => ",",
            Self::Dot => ".",
            Self::Star => "*",
            Self::ErrorUnclosedString
            | Self::ErrorUnclosedComment
            | Self::ErrorIntegerRange
            | Self::ErrorUnknownChar => "<error>",
            Self::Start => "<start of input>",
            Self::End => "<end of input>",
            _ => "<unknown>",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Literal payload of a token.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TokenValue {
    Integer(i64),
    /// Identifier text, or the contents of a string literal without its quotes.
    String(String),
}

impl fmt::Display for TokenValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "{value}"),
            Self::String(value) => write!(f, "{value}"),
        }
    }
}

/// An immutable snapshot of one token produced by the [`Lexer`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: Option<TokenValue>,
    pub span: SourceSpan,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            None => write!(f, "{}", self.kind),
            Some(value) => write!(f, "{} {value}", self.kind),
        }
    }
}

/// Return a [`Lexer`] for the given source text.
pub fn lex(source: &Source) -> Lexer<'_> {
    Lexer::new(source, SourcePos(0))
}

/// State of a lexer
pub struct Lexer<'source> {
    /// Input source
    pub source: &'source Source,
    /// The last recognized token kind.
    pub kind: TokenKind,
    /// The last recognized token source span.
    pub span: SourceSpan,
    /// Payload of the last recognized token, for literals and identifiers.
    pub value: Option<TokenValue>,
    /// The span end of the previous token.
    /// Handy to get full syntax node span.
    pub previous_end: SourcePos,
    /// Set once the iterator has handed out [`TokenKind::End`].
    finished: bool,
}

impl<'source> Lexer<'source> {
    /// Create a lexer that starts at the given position.
    pub fn new(source: &'source Source, pos: SourcePos) -> Self {
        let mut result = Self {
            source,
            kind: TokenKind::Start,
            span: SourceSpan::empty(pos),
            value: None,
            previous_end: pos,
            finished: false,
        };
        result.advance();
        result
    }

    /// The current token as a standalone value.
    pub fn token(&self) -> Token {
        Token {
            kind: self.kind,
            value: self.value.clone(),
            span: self.span,
        }
    }

    pub fn integer(&self) -> Option<i64> {
        match self.value {
            Some(TokenValue::Integer(value)) => Some(value),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.value {
            Some(TokenValue::String(value)) => Some(value),
            _ => None,
        }
    }

    pub fn advance(&mut self) {
        assert_ne!(self.kind, TokenKind::End, "advance past end of input");
        self.previous_end = self.span.end;
        self.value = None;
        if let Some(kind) = self.skip_trivia() {
            self.kind = kind;
            return;
        }
        self.span.start = self.span.end;
        self.kind = match self.peek() {
            None => TokenKind::End,
            Some('"') => {
                self.span.end.0 += 1;
                self.scan_forward(|c| c != '"');
                if self.peek() != Some('"') {
                    TokenKind::ErrorUnclosedString
                } else {
                    let contents = SourceSpan::new(SourcePos(self.span.start.0 + 1), self.span.end);
                    self.value = Some(TokenValue::String(self.source[contents].to_string()));
                    self.span.end.0 += 1;
                    TokenKind::StringLiteral
                }
            }
            Some('0'..='9') => self.integer_literal(),
            Some('+' | '-')
                if matches!(
                    self.source.peek(SourcePos(self.span.end.0 + 1)),
                    Some('0'..='9')
                ) =>
            {
                self.span.end.0 += 1;
                self.integer_literal()
            }
            Some('_' | 'A'..='Z' | 'a'..='z') => {
                self.span.end.0 += 1;
                self.scan_forward(|c| matches!(c, '_' | '0'..='9' | 'A'..='Z' | 'a'..='z'));
                let text = &self.source[self.span];
                match TokenKind::keyword(text) {
                    Some(kind) => kind,
                    None => {
                        self.value = Some(TokenValue::String(text.to_string()));
                        TokenKind::Identifier
                    }
                }
            }
            Some(c) => {
                self.span.end.0 += c.len_utf8();
                match c {
                    '{' => TokenKind::OpenBrace,
                    '}' => TokenKind::CloseBrace,
                    '[' => TokenKind::OpenBracket,
                    ']' => TokenKind::CloseBracket,
                    '(' => TokenKind::OpenParen,
                    ')' => TokenKind::CloseParen,
                    '<' => TokenKind::LessThan,
                    '>' => TokenKind::GreaterThan,
                    '=' => TokenKind::Equals,
                    ':' => TokenKind::Colon,
                    ';' => TokenKind::Semicolon,
                    ',' => TokenKind::Comma,
                    '.' => TokenKind::Dot,
                    '*' => TokenKind::Star,
                    _ => TokenKind::ErrorUnknownChar,
                }
            }
        }
    }

    /// Scan the digits of an integer literal, any sign already consumed.
    fn integer_literal(&mut self) -> TokenKind {
        self.scan_forward(|c| c.is_ascii_digit());
        match self.source[self.span].parse::<i64>() {
            Ok(value) => {
                self.value = Some(TokenValue::Integer(value));
                TokenKind::IntegerLiteral
            }
            Err(_) => TokenKind::ErrorIntegerRange,
        }
    }

    /// Skip whitespace, comments and a leading byte order mark. Returns an error kind if a block
    /// comment runs off the end of the input.
    fn skip_trivia(&mut self) -> Option<TokenKind> {
        loop {
            self.scan_forward(|c| matches!(c, ' ' | '\t' | '\r' | '\n'));
            let rest = self.source.rest(self.span.end);
            if self.span.end.0 == 0 && rest.starts_with('\u{feff}') {
                self.span.end.0 += '\u{feff}'.len_utf8();
            } else if rest.starts_with("//") || rest.starts_with('#') {
                self.scan_forward(|c| c != '\n');
            } else if let Some(body) = rest.strip_prefix("/*") {
                match body.find("*/") {
                    Some(len) => self.span.end.0 += 2 + len + 2,
                    None => {
                        self.span.start = self.span.end;
                        self.span.end = self.source.end();
                        return Some(TokenKind::ErrorUnclosedComment);
                    }
                }
            } else {
                return None;
            }
        }
    }

    /// Return the character (if any) after the current span end
    fn peek(&self) -> Option<char> {
        self.source.peek(self.span.end)
    }

    /// Advance the span end to the first position that does not match the
    /// provided predicate.
    fn scan_forward(&mut self, while_char: impl Fn(char) -> bool) {
        self.span.end = self.source.scan_forward(self.span.end, while_char);
    }
}

/// Yields every token including a final [`TokenKind::End`], then stops.
impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.finished {
            return None;
        }
        let token = self.token();
        if token.kind == TokenKind::End {
            self.finished = true;
        } else {
            self.advance();
        }
        Some(token)
    }
}

#[cfg(test)]
fn test(source: &str, expected: &[(TokenKind, &str)]) {
    let source = Source::new("test", source);
    let mut lexer = lex(&source);
    let mut actual = vec![];
    let mut last_pos = SourcePos(0);
    while lexer.kind != TokenKind::End {
        assert_ne!(last_pos, lexer.span.end, "no progress");
        actual.push((lexer.kind, &source[lexer.span]));
        last_pos = lexer.span.end;
        if lexer.kind.is_error() {
            break;
        }
        lexer.advance();
    }
    assert_eq!(actual, expected);
}

#[test]
fn empty() {
    test("", &[]);
}

#[test]
fn basic() {
    test("x", &[(TokenKind::Identifier, "x")]);
}

#[test]
fn keywords() {
    test(
        "struct Point required optional",
        &[
            (TokenKind::KeywordStruct, "struct"),
            (TokenKind::Identifier, "Point"),
            (TokenKind::KeywordRequired, "required"),
            (TokenKind::KeywordOptional, "optional"),
        ],
    )
}

#[test]
fn underscore() {
    test(
        "x_y is _aSingle Identifier_ structure",
        &[
            (TokenKind::Identifier, "x_y"),
            (TokenKind::Identifier, "is"),
            (TokenKind::Identifier, "_aSingle"),
            (TokenKind::Identifier, "Identifier_"),
            (TokenKind::Identifier, "structure"),
        ],
    )
}

#[test]
fn field() {
    test(
        "1: required i32 x = -5;",
        &[
            (TokenKind::IntegerLiteral, "1"),
            (TokenKind::Colon, ":"),
            (TokenKind::KeywordRequired, "required"),
            (TokenKind::KeywordI32, "i32"),
            (TokenKind::Identifier, "x"),
            (TokenKind::Equals, "="),
            (TokenKind::IntegerLiteral, "-5"),
            (TokenKind::Semicolon, ";"),
        ],
    )
}

#[test]
fn dotted_name() {
    test(
        "shared.Color.RED",
        &[
            (TokenKind::Identifier, "shared"),
            (TokenKind::Dot, "."),
            (TokenKind::Identifier, "Color"),
            (TokenKind::Dot, "."),
            (TokenKind::Identifier, "RED"),
        ],
    )
}

#[test]
fn generics() {
    test(
        "map<string, list<i64>>",
        &[
            (TokenKind::KeywordMap, "map"),
            (TokenKind::LessThan, "<"),
            (TokenKind::KeywordString, "string"),
            (TokenKind::Comma, ","),
            (TokenKind::KeywordList, "list"),
            (TokenKind::LessThan, "<"),
            (TokenKind::KeywordI64, "i64"),
            (TokenKind::GreaterThan, ">"),
            (TokenKind::GreaterThan, ">"),
        ],
    )
}

#[test]
fn comments() {
    test(
        "a // line\n# hash\nb /* block\n comment */ c",
        &[
            (TokenKind::Identifier, "a"),
            (TokenKind::Identifier, "b"),
            (TokenKind::Identifier, "c"),
        ],
    )
}

#[test]
fn string() {
    test(r#""hello""#, &[(TokenKind::StringLiteral, r#""hello""#)])
}

#[test]
fn unclosed_string() {
    test(r#"x "hello"#, &[(TokenKind::Identifier, "x"), (TokenKind::ErrorUnclosedString, r#""hello"#)])
}

#[test]
fn unclosed_comment() {
    test("x /* y", &[(TokenKind::Identifier, "x"), (TokenKind::ErrorUnclosedComment, "/* y")])
}

#[test]
fn unknown_char() {
    test("a ! b", &[(TokenKind::Identifier, "a"), (TokenKind::ErrorUnknownChar, "!")])
}

#[test]
fn leading_byte_order_mark() {
    test("\u{feff}a", &[(TokenKind::Identifier, "a")]);
    test("a \u{feff}", &[(TokenKind::Identifier, "a"), (TokenKind::ErrorUnknownChar, "\u{feff}")]);
}

#[test]
fn lone_sign() {
    test("- x", &[(TokenKind::ErrorUnknownChar, "-")])
}

#[test]
fn integer_range() {
    test(
        "9223372036854775807 9223372036854775808",
        &[
            (TokenKind::IntegerLiteral, "9223372036854775807"),
            (TokenKind::ErrorIntegerRange, "9223372036854775808"),
        ],
    )
}

#[test]
fn token_values() {
    let source = Source::new("test", r#"name "text" -42"#);
    let tokens: Vec<_> = lex(&source).collect();
    let values: Vec<_> = tokens.iter().map(|t| t.value.clone()).collect();
    assert_eq!(
        values,
        [
            Some(TokenValue::String("name".into())),
            Some(TokenValue::String("text".into())),
            Some(TokenValue::Integer(-42)),
            None,
        ]
    );
    assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::End));
}

#[test]
fn iterator_ends_after_end_token() {
    let source = Source::new("test", "a");
    let mut lexer = lex(&source);
    assert_eq!(lexer.next().map(|t| t.kind), Some(TokenKind::Identifier));
    assert_eq!(lexer.next().map(|t| t.kind), Some(TokenKind::End));
    assert_eq!(lexer.next(), None);
}

#[test]
fn canonical_spelling() {
    let source = Source::new("test", "typedef { } [ ] ( ) < > = : ; , . * oneway throws");
    let printed: Vec<_> = lex(&source)
        .filter(|t| t.kind != TokenKind::End)
        .map(|t| t.to_string())
        .collect();
    assert_eq!(printed.join(" "), source.text);
}

#[test]
fn token_display_includes_payload() {
    let source = Source::new("test", "Point 7");
    let printed: Vec<_> = lex(&source).map(|t| t.to_string()).collect();
    assert_eq!(printed, ["<identifier> Point", "<integer> 7", "<end of input>"]);
}
