//! Parse a root file and everything it includes into an arena of trees.

use crate::diag::{CompileContext, Message};
use crate::error::Error;
use crate::lex::lex;
use crate::list::{Id, List};
use crate::parse::{parse, ParseResult};
use crate::source::{Source, SourceSpan};
use crate::syntax::{Document, DocumentData, Include, SyntaxList};
use std::collections::{HashMap, HashSet};
use std::ffi::OsStr;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, trace};

/// Extension appended to include paths that do not already carry it.
pub const EXTENSION: &str = "thrift";

#[derive(Clone, Debug, Default)]
pub struct Config {
    /// Searched in order after the including file's own directory.
    pub include_paths: Vec<PathBuf>,
}

/// File system access used while resolving includes.
pub trait FileLoader {
    /// Identity of a file: two paths naming the same file canonicalize equal.
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;

    fn read(&self, path: &Path) -> io::Result<String>;
}

#[derive(Copy, Clone, Debug, Default)]
pub struct FsLoader;

impl FileLoader for FsLoader {
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        std::fs::canonicalize(path)
    }

    fn read(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// In-memory files, keyed by lexically normalized path.
#[derive(Clone, Debug, Default)]
pub struct MemoryLoader {
    files: HashMap<PathBuf, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl AsRef<Path>, text: impl Into<String>) -> &mut Self {
        self.files.insert(normalize(path.as_ref()), text.into());
        self
    }
}

impl FileLoader for MemoryLoader {
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        let path = normalize(path);
        if self.files.contains_key(&path) {
            Ok(path)
        } else {
            Err(io::ErrorKind::NotFound.into())
        }
    }

    fn read(&self, path: &Path) -> io::Result<String> {
        self.files
            .get(&normalize(path))
            .cloned()
            .ok_or_else(|| io::ErrorKind::NotFound.into())
    }
}

/// Resolve `.` and `..` components without touching the file system.
fn normalize(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !result.pop() {
                    result.push("..");
                }
            }
            other => result.push(other),
        }
    }
    result
}

/// One parsed file.
#[derive(Debug)]
pub struct ParseTree {
    /// Name other files use to refer into this one: the file stem.
    pub package: String,
    pub source: Source,
    pub syntax: SyntaxList,
    pub document: Document,
    pub includes: Vec<IncludeEdge>,
}

#[derive(Clone, Debug)]
pub struct IncludeEdge {
    pub name: String,
    pub directive: Include,
    pub tree: Id<ParseTree>,
}

impl ParseTree {
    pub fn path(&self) -> &Path {
        self.source.path()
    }

    pub fn document(&self) -> &DocumentData {
        &self.syntax[self.document]
    }

    pub fn include(&self, name: &str) -> Option<&IncludeEdge> {
        self.includes.iter().find(|edge| edge.name == name)
    }
}

/// A root file and its include closure. Each file is parsed once, so an
/// included file has exactly one tree however many files include it.
#[derive(Debug)]
pub struct Program {
    pub trees: List<ParseTree>,
    pub root: Id<ParseTree>,
}

impl Program {
    pub fn root(&self) -> &ParseTree {
        &self.trees[self.root]
    }

    /// Every tree reachable from the root, each after the trees it includes.
    pub fn flatten(&self) -> Vec<Id<ParseTree>> {
        let mut seen = HashSet::new();
        let mut order = vec![];
        self.visit(self.root, &mut seen, &mut order);
        order
    }

    fn visit(
        &self,
        id: Id<ParseTree>,
        seen: &mut HashSet<Id<ParseTree>>,
        order: &mut Vec<Id<ParseTree>>,
    ) {
        if !seen.insert(id) {
            return;
        }
        for edge in &self.trees[id].includes {
            self.visit(edge.tree, seen, order);
        }
        order.push(id);
    }
}

impl std::ops::Index<Id<ParseTree>> for Program {
    type Output = ParseTree;

    fn index(&self, index: Id<ParseTree>) -> &Self::Output {
        &self.trees[index]
    }
}

/// Parse `path` and, recursively, everything it includes.
///
/// Returns `Ok(None)` when any file fails to parse or an include cannot be
/// resolved; the reasons are recorded in `context`. Only an unreadable root
/// file is an `Err`.
pub fn parse_program(
    path: &Path,
    config: &Config,
    loader: &dyn FileLoader,
    context: &mut CompileContext,
) -> Result<Option<Program>, Error> {
    let read_error = |source| Error::Read {
        path: path.to_owned(),
        source,
    };
    let canonical = loader.canonicalize(path).map_err(read_error)?;
    let text = loader.read(&canonical).map_err(read_error)?;

    let mut builder = Builder {
        config,
        loader,
        context,
        trees: List::default(),
        by_path: HashMap::new(),
        stack: vec![],
        failed: false,
    };
    let root = builder.load(path.to_owned(), canonical, text);
    debug!(
        files = builder.trees.len(),
        failed = builder.failed,
        "parsed program"
    );
    Ok(match root {
        Some(root) if !builder.failed => Some(Program {
            trees: builder.trees,
            root,
        }),
        _ => None,
    })
}

struct Builder<'a> {
    config: &'a Config,
    loader: &'a dyn FileLoader,
    context: &'a mut CompileContext,
    trees: List<ParseTree>,
    /// Finished files by canonical path; `None` if the file failed.
    by_path: HashMap<PathBuf, Option<Id<ParseTree>>>,
    /// Canonical paths of the files currently being loaded.
    stack: Vec<PathBuf>,
    failed: bool,
}

impl Builder<'_> {
    fn load(&mut self, path: PathBuf, canonical: PathBuf, text: String) -> Option<Id<ParseTree>> {
        debug!(path = %path.display(), "parsing");
        let package = package_name(&path);
        let source = Source::new(path, text);
        let parsed = {
            let mut cx = self.context.enter(&source);
            parse(lex(&source), &mut cx)
        };
        let tree = match parsed {
            None => {
                self.failed = true;
                None
            }
            Some(ParseResult { syntax, document }) => {
                self.stack.push(canonical.clone());
                let includes = self.includes(&source, &syntax, document);
                self.stack.pop();
                includes.map(|includes| {
                    self.trees.add(ParseTree {
                        package,
                        source,
                        syntax,
                        document,
                        includes,
                    })
                })
            }
        };
        self.by_path.insert(canonical, tree);
        tree
    }

    fn includes(
        &mut self,
        source: &Source,
        syntax: &SyntaxList,
        document: Document,
    ) -> Option<Vec<IncludeEdge>> {
        let mut edges: Vec<IncludeEdge> = vec![];
        let mut ok = true;
        for &directive in &syntax[document].includes {
            let literal = syntax[directive].path;
            let text = &syntax[literal];
            let span = syntax.span(literal.0);
            let file_name = include_file_name(text);
            let name = package_name(&file_name);

            if let Some(first) = edges.iter().find(|edge| edge.name == name) {
                let first_span = syntax.span(first.directive.0);
                self.context
                    .enter(source)
                    .error(span, Message::IncludeRedeclared { name })
                    .note(first_span, Message::FirstDeclared);
                ok = false;
                continue;
            }

            match self.include(source, text, &file_name, span) {
                Some(tree) => edges.push(IncludeEdge {
                    name,
                    directive,
                    tree,
                }),
                None => ok = false,
            }
        }
        if !ok {
            self.failed = true;
        }
        ok.then_some(edges)
    }

    fn include(
        &mut self,
        includer: &Source,
        text: &str,
        file_name: &Path,
        span: SourceSpan,
    ) -> Option<Id<ParseTree>> {
        let directory = includer.path().parent().unwrap_or(Path::new(""));
        let candidates = std::iter::once(directory.join(file_name)).chain(
            self.config
                .include_paths
                .iter()
                .map(|directory| directory.join(file_name)),
        );

        let mut first_error = None;
        let mut found = None;
        for candidate in candidates {
            match self.loader.canonicalize(&candidate) {
                Ok(canonical) => {
                    found = Some((candidate, canonical));
                    break;
                }
                Err(error) => {
                    trace!(path = %candidate.display(), %error, "include candidate rejected");
                    first_error.get_or_insert(error);
                }
            }
        }
        let Some((path, canonical)) = found else {
            let error = first_error.map_or_else(String::new, |error| error.to_string());
            self.report(includer, span, Message::IncludeRead {
                path: text.to_string(),
                error,
            });
            return None;
        };

        if self.stack.contains(&canonical) {
            self.report(includer, span, Message::IncludeCycle {
                path: text.to_string(),
            });
            return None;
        }
        if let Some(&tree) = self.by_path.get(&canonical) {
            trace!(path = %path.display(), "include already parsed");
            return tree;
        }

        match self.loader.read(&canonical) {
            Ok(contents) => self.load(path, canonical, contents),
            Err(error) => {
                self.report(includer, span, Message::IncludeRead {
                    path: text.to_string(),
                    error: error.to_string(),
                });
                None
            }
        }
    }

    fn report(&mut self, source: &Source, span: SourceSpan, message: Message) {
        self.context.enter(source).error(span, message);
    }
}

fn include_file_name(text: &str) -> PathBuf {
    let path = PathBuf::from(text);
    if path.extension() == Some(OsStr::new(EXTENSION)) {
        path
    } else {
        PathBuf::from(format!("{text}.{EXTENSION}"))
    }
}

fn package_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
fn load(files: &[(&str, &str)]) -> (Option<Program>, Vec<String>) {
    let mut loader = MemoryLoader::new();
    for &(path, text) in files {
        loader.insert(path, text);
    }
    let config = Config {
        include_paths: vec![PathBuf::from("lib")],
    };
    let mut context = CompileContext::new();
    let program = parse_program(Path::new(files[0].0), &config, &loader, &mut context)
        .expect("root file is readable");
    let messages = context
        .diagnostics()
        .iter()
        .map(|diagnostic| diagnostic.to_string())
        .collect();
    (program, messages)
}

#[test]
fn normalize_resolves_parent_components() {
    assert_eq!(
        normalize(Path::new("a/./b/../c.thrift")),
        PathBuf::from("a/c.thrift")
    );
    assert_eq!(normalize(Path::new("../x")), PathBuf::from("../x"));
}

#[test]
fn diamond_includes_share_one_tree() {
    let (program, messages) = load(&[
        ("main.thrift", "include \"left\"\ninclude \"right\"\n"),
        ("left.thrift", "include \"base\"\n"),
        ("right.thrift", "include \"base.thrift\"\n"),
        ("base.thrift", "enum E { A }\n"),
    ]);
    assert!(messages.is_empty(), "{messages:?}");
    let program = program.unwrap();
    assert_eq!(program.trees.len(), 4);

    let root = program.root();
    let left = &program[root.include("left").unwrap().tree];
    let right = &program[root.include("right").unwrap().tree];
    assert_eq!(left.include("base").unwrap().tree, right.include("base").unwrap().tree);

    let order: Vec<_> = program
        .flatten()
        .into_iter()
        .map(|id| program[id].package.as_str())
        .collect();
    assert_eq!(order, ["base", "left", "right", "main"]);
}

#[test]
fn include_paths_are_searched_after_the_includer_directory() {
    let (program, messages) = load(&[
        ("src/main.thrift", "include \"../shared/types\"\ninclude \"common\"\n"),
        ("shared/types.thrift", ""),
        ("lib/common.thrift", ""),
    ]);
    assert!(messages.is_empty(), "{messages:?}");
    let program = program.unwrap();
    let root = program.root();
    assert_eq!(
        program[root.include("types").unwrap().tree].path(),
        Path::new("src/../shared/types.thrift")
    );
    assert_eq!(
        program[root.include("common").unwrap().tree].path(),
        Path::new("lib/common.thrift")
    );
}

#[test]
fn missing_include_is_reported_at_the_path() {
    let (program, messages) = load(&[("main.thrift", "include \"nope\"\n")]);
    assert!(program.is_none());
    assert_eq!(messages.len(), 1);
    assert!(
        messages[0].starts_with(
            "main.thrift (line 1, col 9): could not read include file 'nope': "
        ),
        "{messages:?}"
    );
}

#[test]
fn include_cycle_is_reported() {
    let (program, messages) = load(&[
        ("a.thrift", "include \"b\"\n"),
        ("b.thrift", "include \"a\"\n"),
    ]);
    assert!(program.is_none());
    assert_eq!(
        messages,
        ["b.thrift (line 1, col 9): include of 'a' is circular"]
    );
}

#[test]
fn duplicate_package_name() {
    let (program, messages) = load(&[
        ("main.thrift", "include \"x/types\"\ninclude \"y/types\"\n"),
        ("x/types.thrift", ""),
        ("y/types.thrift", ""),
    ]);
    assert!(program.is_none());
    assert_eq!(
        messages,
        ["main.thrift (line 2, col 9): package 'types' is already included"]
    );
}

#[test]
fn syntax_error_in_include_fails_the_program() {
    let (program, messages) = load(&[
        ("main.thrift", "include \"bad\"\n"),
        ("bad.thrift", "struct {"),
    ]);
    assert!(program.is_none());
    assert_eq!(
        messages,
        ["bad.thrift (line 1, col 8): expected struct name, but found '{'"]
    );
}
