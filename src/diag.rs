use crate::lex::TokenKind;
use crate::source::{LineColumn, Source, SourceSpan};
use colorful::{Color, Colorful};
use std::fmt::{self, Write as _};
use std::io;
use std::path::{Path, PathBuf};

/// Diagnostics for a whole compilation run, and the file being visited.
#[derive(Debug, Default)]
pub struct CompileContext {
    current: Option<PathBuf>,
    diagnostics: Vec<Diagnostic>,
}

impl CompileContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `source` the current file until the returned guard is dropped.
    ///
    /// # Panics
    /// If another file is already entered.
    pub fn enter<'a>(&'a mut self, source: &'a Source) -> FileContext<'a> {
        if let Some(current) = &self.current {
            panic!(
                "entered {} while {} is still active",
                source.path.display(),
                current.display()
            );
        }
        self.current = Some(source.path.clone());
        FileContext {
            context: self,
            source,
        }
    }

    pub fn current_file(&self) -> Option<&Path> {
        self.current.as_deref()
    }

    /// Number of top-level error diagnostics recorded so far.
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|diagnostic| diagnostic.kind == ReportKind::Error)
            .count()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn write_diagnostics(&self, write: &mut impl fmt::Write) -> fmt::Result {
        write_diagnostics(&self.diagnostics, write)
    }

    pub fn print_diagnostics(&self, write: &mut dyn io::Write, color: bool) -> io::Result<()> {
        print_diagnostics(&self.diagnostics, write, color)
    }
}

/// Scoped access to the [`CompileContext`] while one file is visited.
/// Leaves the file when dropped.
pub struct FileContext<'a> {
    context: &'a mut CompileContext,
    source: &'a Source,
}

impl<'a> FileContext<'a> {
    pub fn source(&self) -> &'a Source {
        self.source
    }

    pub fn error(&mut self, span: SourceSpan, message: Message) -> Reporter<'_> {
        push_report(
            &mut self.context.diagnostics,
            self.source,
            ReportKind::Error,
            span,
            message,
        )
    }
}

impl Drop for FileContext<'_> {
    fn drop(&mut self) {
        self.context.current = None;
    }
}

/// Appends to a list of diagnostics; each report returns a reporter for its
/// own notes.
pub struct Reporter<'out> {
    reports: &'out mut Vec<Diagnostic>,
    source: &'out Source,
}

impl Reporter<'_> {
    pub fn note(&mut self, span: SourceSpan, message: Message) -> Reporter<'_> {
        self.report(ReportKind::Note, span, message)
    }

    pub fn error(&mut self, span: SourceSpan, message: Message) -> Reporter<'_> {
        self.report(ReportKind::Error, span, message)
    }

    pub fn report(&mut self, kind: ReportKind, span: SourceSpan, message: Message) -> Reporter<'_> {
        push_report(self.reports, self.source, kind, span, message)
    }
}

fn push_report<'r>(
    reports: &'r mut Vec<Diagnostic>,
    source: &'r Source,
    kind: ReportKind,
    span: SourceSpan,
    message: Message,
) -> Reporter<'r> {
    let index = reports.len();
    reports.push(Diagnostic {
        kind,
        file: source.path.clone(),
        span,
        location: source.line_col(span.start),
        message,
        also: vec![],
    });
    Reporter {
        reports: &mut reports[index].also,
        source,
    }
}

#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub kind: ReportKind,
    pub file: PathBuf,
    pub span: SourceSpan,
    pub location: LineColumn,
    pub message: Message,
    pub also: Vec<Diagnostic>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (line {}, col {}): {}",
            self.file.display(),
            self.location.line,
            self.location.column,
            self.message
        )
    }
}

#[derive(Copy, Clone, Debug, Ord, PartialOrd, Eq, PartialEq)]
pub enum ReportKind {
    Note,
    Error,
}

impl ReportKind {
    fn color(self) -> Color {
        match self {
            Self::Note => Color::Cyan,
            Self::Error => Color::Red,
        }
    }
}

/// Which kind of ordered list entry an ordering diagnostic is about.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OrderKind {
    Field,
    Argument,
    Exception,
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Field => "field",
            Self::Argument => "argument",
            Self::Exception => "exception",
        })
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Message {
    // Lexer (forwarded by parser for TokenKind::Error*)
    /// `"unexpected character '{ch}'"`
    UnknownChar { ch: char },
    /// `"unterminated string literal"`
    UnclosedString,
    /// `"unterminated block comment"`
    UnclosedComment,
    /// `"integer literal does not fit in a 64-bit integer"`
    IntegerRange,

    // Parser
    /// `"expected {expected}, but found '{found}'"`
    Expected {
        expected: &'static str,
        found: TokenKind,
    },
    /// `"'{keyword}' directives must appear before any declaration"`
    HeaderAfterDeclaration { keyword: TokenKind },

    // Includes
    /// `"could not read include file '{path}': {error}"`
    IncludeRead { path: String, error: String },
    /// `"include of '{path}' is circular"`
    IncludeCycle { path: String },
    /// `"package '{name}' is already included"`
    IncludeRedeclared { name: String },

    // Symbols
    /// `"name '{name}' was already declared as a(n) {kind}"`
    Redeclared { name: String, kind: &'static str },
    /// - `"first declared here"`
    FirstDeclared,
    /// `"value '{value}' does not fit in a 32-bit integer"`
    I32Range { value: i64 },

    // Binder
    /// `"name '{name}' is a package"`
    NameIsPackage { name: String },
    /// `"could not find any definition or package for name '{name}'"`
    Unresolved { name: String },
    /// `"name '{name}' not found in package '{package}'"`
    NotFoundInPackage { name: String, package: String },

    // Checker
    /// `"expected a type, but '{name}' does not resolve to a type"`
    NotAType { name: String },
    /// `"cannot use type '{name}' here"`
    CannotUseType { name: String },
    /// `"cannot coerce {value} to type '{ty}'"`
    CannotCoerce { value: &'static str, ty: String },
    /// `"cannot coerce {value} to a list"`
    NotAList { value: &'static str },
    /// `"cannot coerce {value} to a map"`
    NotAMap { value: &'static str },
    /// `"value should be a struct initializer"`
    NotStructInitializer,
    /// `"expected a string literal with a struct field"`
    ExpectedFieldName,
    /// `"field '{field}' not found in struct '{strukt}'"`
    UnknownField { field: String, strukt: String },
    /// `"field '{field}' is initialized more than once"`
    DuplicateInitializer { field: String },
    /// `"required field '{field}' in struct '{strukt}' is not initialized"`
    MissingRequiredField { field: String, strukt: String },
    /// `"value is not a member of enum '{enum_name}'"`
    NotEnumMember { enum_name: String },
    /// `"cannot use enum '{enum_name}' as a value"`
    EnumAsValue { enum_name: String },
    /// `"{member} is not a member of enum '{enum_name}'"`
    NoSuchEnumMember { member: String, enum_name: String },
    /// `"cannot coerce enum '{from}' to enum '{to}'"`
    EnumMismatch { from: String, to: String },
    /// `"void can only be used as a return type"`
    VoidNotAllowed,
    /// `"{kind} '{name}' should have an explicit order, for better compatibility"`
    MissingOrder { kind: OrderKind, name: String },
    /// `"{kind} '{name}' has the same ordering as {kind} '{previous}'"`
    DuplicateOrder {
        kind: OrderKind,
        name: String,
        previous: String,
    },
    /// `"{kind} '{name}' must have an order greater than 0"`
    NonPositiveOrder { kind: OrderKind, name: String },
    /// `"name '{name}' must be a service definition"`
    NotAService { name: String },
    /// `"expected an exception, but got a {found}"`
    NotAnException { found: &'static str },
    /// `"typedef '{name}' refers to itself"`
    CyclicTypedef { name: String },
    /// `"oneway method '{name}' must return void"`
    OnewayReturn { name: String },
    /// `"oneway method '{name}' cannot throw exceptions"`
    OnewayThrows { name: String },

    // Cyclic check
    /// `"field '{field}' introduces a cyclic reference to struct '{strukt}'"`
    CyclicStruct { field: String, strukt: String },
    /// `"service extension is cyclic or extends from itself"`
    CyclicService,

    // Unused check
    /// `"include directive \"{path}\" is unused"`
    UnusedInclude { path: String },
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Lexer
            Message::UnknownChar { ch } => write!(f, "unexpected character '{ch}'"),
            Message::UnclosedString => write!(f, "unterminated string literal"),
            Message::UnclosedComment => write!(f, "unterminated block comment"),
            Message::IntegerRange => {
                write!(f, "integer literal does not fit in a 64-bit integer")
            }

            // Parser
            Message::Expected { expected, found } => {
                write!(f, "expected {expected}, but found '{found}'")
            }
            Message::HeaderAfterDeclaration { keyword } => {
                write!(f, "'{keyword}' directives must appear before any declaration")
            }

            // Includes
            Message::IncludeRead { path, error } => {
                write!(f, "could not read include file '{path}': {error}")
            }
            Message::IncludeCycle { path } => write!(f, "include of '{path}' is circular"),
            Message::IncludeRedeclared { name } => {
                write!(f, "package '{name}' is already included")
            }

            // Symbols
            Message::Redeclared { name, kind } => {
                let article = if kind.starts_with(['a', 'e', 'i', 'o', 'u']) {
                    "an"
                } else {
                    "a"
                };
                write!(f, "name '{name}' was already declared as {article} {kind}")
            }
            Message::FirstDeclared => write!(f, "first declared here"),
            Message::I32Range { value } => {
                write!(f, "value '{value}' does not fit in a 32-bit integer")
            }

            // Binder
            Message::NameIsPackage { name } => write!(f, "name '{name}' is a package"),
            Message::Unresolved { name } => {
                write!(f, "could not find any definition or package for name '{name}'")
            }
            Message::NotFoundInPackage { name, package } => {
                write!(f, "name '{name}' not found in package '{package}'")
            }

            // Checker
            Message::NotAType { name } => {
                write!(f, "expected a type, but '{name}' does not resolve to a type")
            }
            Message::CannotUseType { name } => write!(f, "cannot use type '{name}' here"),
            Message::CannotCoerce { value, ty } => {
                write!(f, "cannot coerce {value} to type '{ty}'")
            }
            Message::NotAList { value } => write!(f, "cannot coerce {value} to a list"),
            Message::NotAMap { value } => write!(f, "cannot coerce {value} to a map"),
            Message::NotStructInitializer => write!(f, "value should be a struct initializer"),
            Message::ExpectedFieldName => {
                write!(f, "expected a string literal with a struct field")
            }
            Message::UnknownField { field, strukt } => {
                write!(f, "field '{field}' not found in struct '{strukt}'")
            }
            Message::DuplicateInitializer { field } => {
                write!(f, "field '{field}' is initialized more than once")
            }
            Message::MissingRequiredField { field, strukt } => {
                write!(
                    f,
                    "required field '{field}' in struct '{strukt}' is not initialized"
                )
            }
            Message::NotEnumMember { enum_name } => {
                write!(f, "value is not a member of enum '{enum_name}'")
            }
            Message::EnumAsValue { enum_name } => {
                write!(f, "cannot use enum '{enum_name}' as a value")
            }
            Message::NoSuchEnumMember { member, enum_name } => {
                write!(f, "{member} is not a member of enum '{enum_name}'")
            }
            Message::EnumMismatch { from, to } => {
                write!(f, "cannot coerce enum '{from}' to enum '{to}'")
            }
            Message::VoidNotAllowed => write!(f, "void can only be used as a return type"),
            Message::MissingOrder { kind, name } => {
                write!(
                    f,
                    "{kind} '{name}' should have an explicit order, for better compatibility"
                )
            }
            Message::DuplicateOrder {
                kind,
                name,
                previous,
            } => {
                write!(
                    f,
                    "{kind} '{name}' has the same ordering as {kind} '{previous}'"
                )
            }
            Message::NonPositiveOrder { kind, name } => {
                write!(f, "{kind} '{name}' must have an order greater than 0")
            }
            Message::NotAService { name } => {
                write!(f, "name '{name}' must be a service definition")
            }
            Message::NotAnException { found } => {
                write!(f, "expected an exception, but got a {found}")
            }
            Message::CyclicTypedef { name } => write!(f, "typedef '{name}' refers to itself"),
            Message::OnewayReturn { name } => {
                write!(f, "oneway method '{name}' must return void")
            }
            Message::OnewayThrows { name } => {
                write!(f, "oneway method '{name}' cannot throw exceptions")
            }

            // Cyclic check
            Message::CyclicStruct { field, strukt } => {
                write!(
                    f,
                    "field '{field}' introduces a cyclic reference to struct '{strukt}'"
                )
            }
            Message::CyclicService => {
                write!(f, "service extension is cyclic or extends from itself")
            }

            // Unused check
            Message::UnusedInclude { path } => {
                write!(f, "include directive \"{path}\" is unused")
            }
        }
    }
}

struct IndentWrite<W> {
    write: W,
    indent: usize,
    at_line_start: bool,
}

impl<W: fmt::Write> fmt::Write for IndentWrite<W> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for line in s.split_inclusive('\n') {
            if self.at_line_start {
                for _ in 0..self.indent {
                    self.write.write_char(' ')?;
                }
            }
            self.write.write_str(line)?;
            self.at_line_start = line.ends_with('\n');
        }
        Ok(())
    }
}

/// One diagnostic per line, notes indented beneath their parent.
pub fn write_diagnostics(diagnostics: &[Diagnostic], write: &mut impl fmt::Write) -> fmt::Result {
    let mut write = IndentWrite {
        write,
        indent: 0,
        at_line_start: true,
    };
    write_all(&mut write, diagnostics, false)
}

/// Like [`write_diagnostics`], optionally painting the location prefix.
pub fn print_diagnostics(
    diagnostics: &[Diagnostic],
    write: &mut dyn io::Write,
    color: bool,
) -> io::Result<()> {
    let mut output = String::new();
    let mut indent = IndentWrite {
        write: &mut output,
        indent: 0,
        at_line_start: true,
    };
    write_all(&mut indent, diagnostics, color).map_err(io::Error::other)?;
    write.write_all(output.as_bytes())
}

fn write_all<W: fmt::Write>(
    write: &mut IndentWrite<W>,
    diagnostics: &[Diagnostic],
    color: bool,
) -> fmt::Result {
    for diagnostic in diagnostics {
        if color {
            let prefix = format!(
                "{} (line {}, col {}):",
                diagnostic.file.display(),
                diagnostic.location.line,
                diagnostic.location.column
            );
            writeln!(
                write,
                "{} {}",
                prefix.as_str().color(diagnostic.kind.color()).bold(),
                diagnostic.message
            )?;
        } else {
            writeln!(write, "{diagnostic}")?;
        }
        write.indent += 2;
        let result = write_all(write, &diagnostic.also, color);
        write.indent -= 2;
        result?;
    }
    Ok(())
}

#[cfg(test)]
fn span(start: usize, end: usize) -> SourceSpan {
    use crate::source::SourcePos;
    SourceSpan::new(SourcePos(start), SourcePos(end))
}

#[test]
fn writes_location_and_notes() {
    let source = Source::new("a.thrift", "struct A {\n  1: i32 id\n  2: i32 id\n}\n");
    let mut context = CompileContext::new();
    {
        let mut cx = context.enter(&source);
        cx.error(
            span(32, 34),
            Message::Redeclared {
                name: "id".into(),
                kind: "field",
            },
        )
        .note(span(20, 22), Message::FirstDeclared);
    }
    let mut output = String::new();
    context.write_diagnostics(&mut output).unwrap();
    assert_eq!(
        output,
        "a.thrift (line 3, col 10): name 'id' was already declared as a field\n  \
         a.thrift (line 2, col 10): first declared here\n"
    );
    assert_eq!(context.error_count(), 1);
}

#[test]
fn leaving_a_file_allows_entering_another() {
    let a = Source::new("a.thrift", "");
    let b = Source::new("b.thrift", "");
    let mut context = CompileContext::new();
    {
        let cx = context.enter(&a);
        assert_eq!(cx.source().path(), Path::new("a.thrift"));
    }
    assert_eq!(context.current_file(), None);
    let _cx = context.enter(&b);
}

#[test]
#[should_panic(expected = "still active")]
fn nested_enter_panics() {
    let a = Source::new("a.thrift", "");
    let mut context = CompileContext::new();
    let cx = context.enter(&a);
    std::mem::forget(cx);
    context.enter(&a);
}

#[test]
fn plain_print_matches_write() {
    let source = Source::new("b.thrift", "x");
    let mut context = CompileContext::new();
    context
        .enter(&source)
        .error(span(0, 1), Message::UnknownChar { ch: 'x' });
    let mut printed = vec![];
    context.print_diagnostics(&mut printed, false).unwrap();
    assert_eq!(
        String::from_utf8(printed).unwrap(),
        "b.thrift (line 1, col 1): unexpected character 'x'\n"
    );
}
