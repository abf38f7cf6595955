use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Copy, Clone, Hash, Ord, PartialOrd, Eq, PartialEq)]
pub struct SourcePos(pub usize);

impl fmt::Debug for SourcePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Half-open range of source positions: describes a span of text in a [`Source`].
/// [`std::ops::Range<SourcePos>`] has worse ergonomics: in particular it's not [`Copy`]!
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SourceSpan {
    pub start: SourcePos,
    pub end: SourcePos,
}

impl SourceSpan {
    pub fn new(start: SourcePos, end: SourcePos) -> Self {
        Self { start, end }
    }

    pub fn empty(pos: SourcePos) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }
}

/// 1-based line and column in a source file
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct LineColumn {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for LineColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// One schema file: the path it is reported under, and its text.
#[derive(Clone, Debug)]
pub struct Source {
    pub path: PathBuf,
    pub text: String,
}

impl Source {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn end(&self) -> SourcePos {
        SourcePos(self.text.len())
    }

    pub fn peek(&self, pos: SourcePos) -> Option<char> {
        self.text.get(pos.0..)?.chars().next()
    }

    pub fn rest(&self, pos: SourcePos) -> &str {
        &self.text[pos.0..]
    }

    pub fn scan_forward(
        &self,
        pos: SourcePos,
        mut while_char: impl FnMut(char) -> bool,
    ) -> SourcePos {
        match self.text[pos.0..].find(|c: char| !while_char(c)) {
            Some(len) => SourcePos(pos.0 + len),
            None => self.end(),
        }
    }

    /// Lookup line and column from this in a source file.
    /// Columns count characters, not bytes.
    pub fn line_col(&self, pos: SourcePos) -> LineColumn {
        let mut line_start = 0;
        let mut line = 1;
        while let Some(line_len) = self.text[line_start..].find('\n') {
            let line_end = line_start + line_len + 1;
            if pos.0 < line_end {
                break;
            }
            line_start = line_end;
            line += 1;
        }
        let end = pos.0.min(self.text.len());
        let column = 1 + self.text[line_start..end].chars().count();
        LineColumn { line, column }
    }
}

impl std::ops::Index<SourceSpan> for Source {
    type Output = str;

    fn index(&self, value: SourceSpan) -> &Self::Output {
        &self.text[value.start.0..value.end.0]
    }
}

#[test]
fn line_col_counts_from_one() {
    let source = Source::new("test.thrift", "enum A {\n  X\n}\n");
    assert_eq!(source.line_col(SourcePos(0)), LineColumn { line: 1, column: 1 });
    assert_eq!(source.line_col(SourcePos(11)), LineColumn { line: 2, column: 3 });
    assert_eq!(source.line_col(SourcePos(13)), LineColumn { line: 3, column: 1 });
}
