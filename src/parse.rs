use crate::diag::{FileContext, Message};
use crate::lex::{Lexer, TokenKind};
use crate::source::{SourcePos, SourceSpan};
use crate::syntax::*;

pub struct ParseResult {
    pub syntax: SyntaxList,
    pub document: Document,
}

/// Parse one file. The first syntax or lexical error is reported and aborts
/// the whole file.
pub fn parse(lexer: Lexer<'_>, cx: &mut FileContext<'_>) -> Option<ParseResult> {
    let mut parser = Parser {
        lexer,
        cx,
        syntax: SyntaxList::new(),
    };
    let document = parser.document().ok()?;
    Some(ParseResult {
        syntax: parser.syntax,
        document,
    })
}

/// The parser gave up; the reason has already been reported.
struct Aborted;

type Parse<T> = Result<T, Aborted>;

struct Parser<'source, 'cx, 'a> {
    lexer: Lexer<'source>,
    cx: &'cx mut FileContext<'a>,
    syntax: SyntaxList,
}

impl Parser<'_, '_, '_> {
    fn syntax<S: SyntaxId>(&mut self, start: SourcePos, data: S::Data) -> S {
        let end = self.lexer.previous_end;
        let span = SourceSpan { start, end };
        self.syntax.add(span, data)
    }

    fn document(&mut self) -> Parse<Document> {
        self.lexical_error()?;
        let start = self.lexer.span.start;
        let mut namespaces = vec![];
        let mut includes = vec![];
        loop {
            match self.lexer.kind {
                TokenKind::KeywordNamespace => namespaces.push(self.namespace()?),
                TokenKind::KeywordInclude => includes.push(self.include()?),
                _ => break,
            }
            self.separator()?;
        }
        let mut declarations = vec![];
        while self.lexer.kind != TokenKind::End {
            declarations.push(self.declaration()?);
            self.separator()?;
        }
        let data = DocumentData {
            namespaces,
            includes,
            declarations,
        };
        Ok(self.syntax(start, data))
    }

    fn namespace(&mut self) -> Parse<Namespace> {
        let start = self.lexer.span.start;
        self.advance()?;
        let scope = if self.lexer.kind == TokenKind::Star {
            self.advance()?;
            "*".to_string()
        } else {
            self.namespace_segment("namespace scope")?
        };
        let mut namespace = self.namespace_segment("namespace")?;
        while self.try_kind(TokenKind::Dot)? {
            namespace.push('.');
            namespace.push_str(&self.namespace_segment("namespace")?);
        }
        Ok(self.syntax(start, NamespaceData { scope, namespace }))
    }

    /// Namespaces may be spelled with keywords, e.g. `com.example.service`.
    fn namespace_segment(&mut self, expected: &'static str) -> Parse<String> {
        let kind = self.lexer.kind;
        if kind != TokenKind::Identifier && !kind.is_keyword() {
            return Err(self.expected(expected));
        }
        let text = self.lexer.source[self.lexer.span].to_string();
        self.advance()?;
        Ok(text)
    }

    fn include(&mut self) -> Parse<Include> {
        let start = self.lexer.span.start;
        self.advance()?;
        let path = self.string_literal("include path")?;
        Ok(self.syntax(start, IncludeData { path }))
    }

    fn declaration(&mut self) -> Parse<Declaration> {
        let start = self.lexer.span.start;
        match self.lexer.kind {
            TokenKind::KeywordConst => {
                self.advance()?;
                let ty = self.type_node()?;
                let name = self.identifier("constant name")?;
                self.expect(TokenKind::Equals, "'='")?;
                let value = self.expression()?;
                let data = ConstData { ty, name, value };
                Ok(Declaration::Const(self.syntax(start, data)))
            }
            TokenKind::KeywordTypedef => {
                self.advance()?;
                let ty = self.type_node()?;
                let name = self.identifier("typedef name")?;
                let data = TypedefData { ty, name };
                Ok(Declaration::Typedef(self.syntax(start, data)))
            }
            TokenKind::KeywordEnum => {
                self.advance()?;
                let name = self.identifier("enum name")?;
                self.expect(TokenKind::OpenBrace, "'{'")?;
                let entries =
                    self.terminated(Self::enum_entry, TokenKind::CloseBrace, "enum entry or '}'")?;
                let data = EnumData { name, entries };
                Ok(Declaration::Enum(self.syntax(start, data)))
            }
            TokenKind::KeywordStruct | TokenKind::KeywordException => {
                let kind = match self.lexer.kind {
                    TokenKind::KeywordException => StructKind::Exception,
                    _ => StructKind::Struct,
                };
                self.advance()?;
                let name = self.identifier("struct name")?;
                self.expect(TokenKind::OpenBrace, "'{'")?;
                let fields = self.terminated(Self::field, TokenKind::CloseBrace, "field or '}'")?;
                let data = StructData { kind, name, fields };
                Ok(Declaration::Struct(self.syntax(start, data)))
            }
            TokenKind::KeywordService => {
                self.advance()?;
                let name = self.identifier("service name")?;
                let extends = if self.try_kind(TokenKind::KeywordExtends)? {
                    Some(self.name_node()?)
                } else {
                    None
                };
                self.expect(TokenKind::OpenBrace, "'{'")?;
                let methods = self.terminated(Self::method, TokenKind::CloseBrace, "method or '}'")?;
                let data = ServiceData {
                    name,
                    extends,
                    methods,
                };
                Ok(Declaration::Service(self.syntax(start, data)))
            }
            kind @ (TokenKind::KeywordNamespace | TokenKind::KeywordInclude) => {
                self.cx.error(
                    self.lexer.span,
                    Message::HeaderAfterDeclaration { keyword: kind },
                );
                Err(Aborted)
            }
            _ => Err(self.expected("declaration")),
        }
    }

    fn enum_entry(&mut self) -> Parse<EnumEntry> {
        let start = self.lexer.span.start;
        let name = self.identifier("enum entry")?;
        let value = if self.try_kind(TokenKind::Equals)? {
            Some(self.integer_literal("integer")?)
        } else {
            None
        };
        Ok(self.syntax(start, EnumEntryData { name, value }))
    }

    fn field(&mut self) -> Parse<Field> {
        let start = self.lexer.span.start;
        let order = self.order()?;
        let requiredness = match self.lexer.kind {
            TokenKind::KeywordRequired => Some(Requiredness::Required),
            TokenKind::KeywordOptional => Some(Requiredness::Optional),
            _ => None,
        };
        if requiredness.is_some() {
            self.advance()?;
        }
        let ty = self.type_node()?;
        let name = self.identifier("field name")?;
        let default = if self.try_kind(TokenKind::Equals)? {
            Some(self.expression()?)
        } else {
            None
        };
        let data = FieldData {
            order,
            requiredness,
            ty,
            name,
            default,
        };
        Ok(self.syntax(start, data))
    }

    fn method(&mut self) -> Parse<Method> {
        let start = self.lexer.span.start;
        let oneway = self.try_kind(TokenKind::KeywordOneway)?;
        let return_type = self.type_node()?;
        let name = self.identifier("method name")?;
        self.expect(TokenKind::OpenParen, "'('")?;
        let arguments = self.terminated(Self::argument, TokenKind::CloseParen, "argument or ')'")?;
        let throws = if self.try_kind(TokenKind::KeywordThrows)? {
            self.expect(TokenKind::OpenParen, "'('")?;
            self.terminated(Self::argument, TokenKind::CloseParen, "exception or ')'")?
        } else {
            vec![]
        };
        let data = MethodData {
            oneway,
            return_type,
            name,
            arguments,
            throws,
        };
        Ok(self.syntax(start, data))
    }

    fn argument(&mut self) -> Parse<Argument> {
        let start = self.lexer.span.start;
        let order = self.order()?;
        let ty = self.type_node()?;
        let name = self.identifier("argument name")?;
        Ok(self.syntax(start, ArgumentData { order, ty, name }))
    }

    /// Optional `N:` prefix of a field or argument.
    fn order(&mut self) -> Parse<Option<IntegerLiteral>> {
        if self.lexer.kind != TokenKind::IntegerLiteral {
            return Ok(None);
        }
        let order = self.integer_literal("order")?;
        self.expect(TokenKind::Colon, "':'")?;
        Ok(Some(order))
    }

    fn type_node(&mut self) -> Parse<Ty> {
        let start = self.lexer.span.start;
        let builtin = match self.lexer.kind {
            TokenKind::KeywordBool => Some(Builtin::Bool),
            TokenKind::KeywordI32 => Some(Builtin::I32),
            TokenKind::KeywordI64 => Some(Builtin::I64),
            TokenKind::KeywordString => Some(Builtin::String),
            TokenKind::KeywordDouble => Some(Builtin::Double),
            TokenKind::KeywordVoid => Some(Builtin::Void),
            _ => None,
        };
        if let Some(builtin) = builtin {
            self.advance()?;
            return Ok(Ty::BuiltinType(self.syntax(start, builtin)));
        }
        match self.lexer.kind {
            TokenKind::KeywordList => {
                self.advance()?;
                self.expect(TokenKind::LessThan, "'<'")?;
                let element = self.type_node()?;
                self.expect(TokenKind::GreaterThan, "'>'")?;
                Ok(Ty::ListType(self.syntax(start, ListTypeData { element })))
            }
            TokenKind::KeywordMap => {
                self.advance()?;
                self.expect(TokenKind::LessThan, "'<'")?;
                let key = self.type_node()?;
                self.expect(TokenKind::Comma, "','")?;
                let value = self.type_node()?;
                self.expect(TokenKind::GreaterThan, "'>'")?;
                Ok(Ty::MapType(self.syntax(start, MapTypeData { key, value })))
            }
            TokenKind::Identifier => Ok(Ty::Name(self.name_node()?)),
            _ => Err(self.expected("type")),
        }
    }

    fn name_node(&mut self) -> Parse<Name> {
        let start = self.lexer.span.start;
        let mut path = vec![self.identifier("name")?];
        while self.try_kind(TokenKind::Dot)? {
            path.push(self.identifier("name")?);
        }
        Ok(self.syntax(start, NameData { path }))
    }

    fn expression(&mut self) -> Parse<Expression> {
        let start = self.lexer.span.start;
        match self.lexer.kind {
            TokenKind::IntegerLiteral => Ok(Expression::IntegerLiteral(
                self.integer_literal("integer")?,
            )),
            TokenKind::StringLiteral => Ok(Expression::StringLiteral(
                self.string_literal("string")?,
            )),
            TokenKind::KeywordTrue | TokenKind::KeywordFalse => {
                let value = self.lexer.kind == TokenKind::KeywordTrue;
                self.advance()?;
                Ok(Expression::BoolLiteral(self.syntax(start, value)))
            }
            TokenKind::OpenBracket => {
                self.advance()?;
                let elements =
                    self.terminated(Self::expression, TokenKind::CloseBracket, "value or ']'")?;
                Ok(Expression::List(self.syntax(start, ListData { elements })))
            }
            TokenKind::OpenBrace => {
                self.advance()?;
                let entries =
                    self.terminated(Self::map_entry, TokenKind::CloseBrace, "map entry or '}'")?;
                Ok(Expression::Map(self.syntax(start, MapData { entries })))
            }
            TokenKind::Identifier => Ok(Expression::Name(self.name_node()?)),
            _ => Err(self.expected("value")),
        }
    }

    fn map_entry(&mut self) -> Parse<MapEntry> {
        let key = self.expression()?;
        self.expect(TokenKind::Colon, "':'")?;
        let value = self.expression()?;
        Ok(MapEntry { key, value })
    }

    fn identifier(&mut self, expected: &'static str) -> Parse<Identifier> {
        let start = self.lexer.span.start;
        let text = match self.lexer.kind {
            TokenKind::Identifier => self.lexer.text().map(str::to_string),
            _ => None,
        };
        let Some(text) = text else {
            return Err(self.expected(expected));
        };
        self.advance()?;
        Ok(self.syntax(start, text))
    }

    fn integer_literal(&mut self, expected: &'static str) -> Parse<IntegerLiteral> {
        let start = self.lexer.span.start;
        let value = match self.lexer.kind {
            TokenKind::IntegerLiteral => self.lexer.integer(),
            _ => None,
        };
        let Some(value) = value else {
            return Err(self.expected(expected));
        };
        self.advance()?;
        Ok(self.syntax(start, value))
    }

    fn string_literal(&mut self, expected: &'static str) -> Parse<StringLiteral> {
        let start = self.lexer.span.start;
        let text = match self.lexer.kind {
            TokenKind::StringLiteral => self.lexer.text().map(str::to_string),
            _ => None,
        };
        let Some(text) = text else {
            return Err(self.expected(expected));
        };
        self.advance()?;
        Ok(self.syntax(start, text))
    }

    /// Items up to and including `terminator`, each optionally followed by a
    /// separator.
    fn terminated<Item>(
        &mut self,
        parse_item: fn(&mut Self) -> Parse<Item>,
        terminator: TokenKind,
        expected: &'static str,
    ) -> Parse<Vec<Item>> {
        let mut list = vec![];
        while !self.try_kind(terminator)? {
            if self.lexer.kind == TokenKind::End {
                return Err(self.expected(expected));
            }
            list.push(parse_item(self)?);
            self.separator()?;
        }
        Ok(list)
    }

    fn separator(&mut self) -> Parse<()> {
        if matches!(self.lexer.kind, TokenKind::Comma | TokenKind::Semicolon) {
            self.advance()?;
        }
        Ok(())
    }

    fn expect(&mut self, kind: TokenKind, expected: &'static str) -> Parse<()> {
        if self.try_kind(kind)? {
            Ok(())
        } else {
            Err(self.expected(expected))
        }
    }

    fn try_kind(&mut self, kind: TokenKind) -> Parse<bool> {
        let ok = self.lexer.kind == kind;
        if ok {
            self.advance()?;
        }
        Ok(ok)
    }

    fn advance(&mut self) -> Parse<()> {
        self.lexer.advance();
        self.lexical_error()
    }

    /// Report the current token if the lexer could not classify it.
    fn lexical_error(&mut self) -> Parse<()> {
        let message = match self.lexer.kind {
            TokenKind::ErrorUnclosedString => Message::UnclosedString,
            TokenKind::ErrorUnclosedComment => Message::UnclosedComment,
            TokenKind::ErrorIntegerRange => Message::IntegerRange,
            TokenKind::ErrorUnknownChar => Message::UnknownChar {
                ch: self
                    .lexer
                    .source
                    .peek(self.lexer.span.start)
                    .unwrap_or_default(),
            },
            _ => return Ok(()),
        };
        self.cx.error(self.lexer.span, message);
        Err(Aborted)
    }

    fn expected(&mut self, expected: &'static str) -> Aborted {
        let found = self.lexer.kind;
        self.cx.error(self.lexer.span, Message::Expected { expected, found });
        Aborted
    }
}

#[cfg(test)]
fn test(text: &str) -> (Option<ParseResult>, Vec<String>) {
    use crate::diag::CompileContext;
    use crate::source::Source;
    let source = Source::new("test.thrift", text);
    let mut context = CompileContext::new();
    let result = {
        let mut cx = context.enter(&source);
        parse(crate::lex::lex(&source), &mut cx)
    };
    let messages = context
        .diagnostics()
        .iter()
        .map(|diagnostic| diagnostic.to_string())
        .collect();
    (result, messages)
}

#[test]
fn empty_document() {
    let (result, messages) = test("");
    let result = result.unwrap();
    let document = &result.syntax[result.document];
    assert!(document.declarations.is_empty());
    assert!(messages.is_empty());
}

#[test]
fn headers_and_declarations() {
    let (result, messages) = test(
        r#"
namespace java com.example.service
namespace * shared
include "shared"

const i32 LIMIT = 10;
typedef list<map<string, i64>> Table
enum Color { RED, GREEN = 5, BLUE }
struct Point {
  1: required i32 x,
  2: optional i32 y = -1;
}
exception Oops { 1: string why }
service Points extends shared.Base {
  oneway void ping(),
  Point find(1: i32 x, 2: i32 y) throws (1: Oops oops)
}
"#,
    );
    assert_eq!(messages, Vec::<String>::new());
    let result = result.unwrap();
    let syntax = &result.syntax;
    let document = &syntax[result.document];

    let namespaces: Vec<_> = document
        .namespaces
        .iter()
        .map(|&id| (syntax[id].scope.as_str(), syntax[id].namespace.as_str()))
        .collect();
    assert_eq!(
        namespaces,
        [("java", "com.example.service"), ("*", "shared")]
    );
    assert_eq!(syntax[syntax[document.includes[0]].path], "shared");

    let kinds: Vec<_> = document
        .declarations
        .iter()
        .map(|&declaration| syntax.declaration_kind(declaration))
        .collect();
    assert_eq!(
        kinds,
        ["constant", "typedef", "enum", "struct", "exception", "service"]
    );

    let Declaration::Typedef(typedef) = document.declarations[1] else {
        panic!("expected typedef");
    };
    assert_eq!(
        syntax.display_type(syntax[typedef].ty).to_string(),
        "list<map<string,i64>>"
    );

    let Declaration::Struct(point) = document.declarations[3] else {
        panic!("expected struct");
    };
    let y = syntax[point].fields[1];
    assert_eq!(syntax[y].requiredness, Some(Requiredness::Optional));
    assert_eq!(
        syntax[y].default.map(|value| syntax.display_expression(value).to_string()),
        Some("-1".to_string())
    );

    let Declaration::Service(service) = document.declarations[5] else {
        panic!("expected service");
    };
    let service = &syntax[service];
    assert_eq!(
        service.extends.map(|name| syntax.path(name).to_string()),
        Some("shared.Base".to_string())
    );
    let ping = &syntax[service.methods[0]];
    assert!(ping.oneway);
    assert!(ping.arguments.is_empty());
    let find = &syntax[service.methods[1]];
    assert_eq!(find.arguments.len(), 2);
    assert_eq!(find.throws.len(), 1);
}

#[test]
fn constant_values() {
    let (result, messages) = test(r#"const map<string, list<i32>> M = {"a": [1, 2], "b": []}"#);
    assert!(messages.is_empty());
    let result = result.unwrap();
    let syntax = &result.syntax;
    let Declaration::Const(id) = syntax[result.document].declarations[0] else {
        panic!("expected const");
    };
    assert_eq!(
        syntax.display_expression(syntax[id].value).to_string(),
        r#"{"a": [1, 2], "b": []}"#
    );
}

#[test]
fn first_error_aborts() {
    let (result, messages) = test("struct A { 1: i32 }\nstruct B { 1: i32 }");
    assert!(result.is_none());
    assert_eq!(
        messages,
        ["test.thrift (line 1, col 19): expected field name, but found '}'"]
    );
}

#[test]
fn header_after_declaration() {
    let (result, messages) = test("enum E { A }\ninclude \"x\"");
    assert!(result.is_none());
    assert_eq!(
        messages,
        ["test.thrift (line 2, col 1): 'include' directives must appear before any declaration"]
    );
}

#[test]
fn lexical_error() {
    let (result, messages) = test("enum E { A = 1 ! }");
    assert!(result.is_none());
    assert_eq!(
        messages,
        ["test.thrift (line 1, col 16): unexpected character '!'"]
    );
}

#[test]
fn unclosed_body() {
    let (result, messages) = test("enum E { A, B");
    assert!(result.is_none());
    assert_eq!(
        messages,
        ["test.thrift (line 1, col 14): expected enum entry or '}', but found '<end of input>'"]
    );
}

#[test]
fn node_spans_cover_tokens() {
    let (result, _) = test("  typedef i64 Id ;");
    let result = result.unwrap();
    let declaration = result.syntax[result.document].declarations[0];
    let span = result.syntax.span(declaration.id());
    assert_eq!((span.start.0, span.end.0), (2, 16));
}
