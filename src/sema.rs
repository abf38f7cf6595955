//! Run the analysis phases over a whole program.

use crate::bind::{bind, Binding, Bindings, DeclRef};
use crate::check::{check, Values};
use crate::cyclic::check_cycles;
use crate::diag::CompileContext;
use crate::enter::{enter_symbols, Symbols};
use crate::list::{Id, Table};
use crate::program::{ParseTree, Program};
use crate::syntax::{Declaration, Name, SyntaxList, Ty};
use crate::unused::check_unused;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, trace};

/// Analysis phases, in the order they run.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Phase {
    EnterSymbols,
    BindNames,
    TypeCheck,
    CyclicCheck,
    CheckUnused,
}

impl Phase {
    pub const ALL: [Phase; 5] = [
        Phase::EnterSymbols,
        Phase::BindNames,
        Phase::TypeCheck,
        Phase::CyclicCheck,
        Phase::CheckUnused,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::EnterSymbols => "enter symbols",
            Self::BindNames => "bind names",
            Self::TypeCheck => "type check",
            Self::CyclicCheck => "cyclic check",
            Self::CheckUnused => "check unused",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Side tables produced by the phases, per tree.
#[derive(Debug, Default)]
pub struct Analysis {
    pub symbols: Table<Id<ParseTree>, Symbols>,
    pub bindings: Table<Id<ParseTree>, Bindings>,
    pub values: Table<Id<ParseTree>, Values>,
    /// The last phase that finished without errors.
    pub completed: Option<Phase>,
}

impl Analysis {
    pub fn succeeded(&self) -> bool {
        self.completed == Some(Phase::CheckUnused)
    }

    pub fn resolver<'a>(&'a self, program: &'a Program) -> Resolver<'a> {
        Resolver::new(program, &self.symbols, &self.bindings)
    }
}

/// Run every phase over every tree of `program`, stopping after the first
/// phase that reports an error.
pub fn analyze(program: &Program, context: &mut CompileContext) -> Analysis {
    let trees = program.flatten();
    let mut analysis = Analysis::default();
    for phase in Phase::ALL {
        let errors_before = context.error_count();
        debug!(%phase, files = trees.len(), "running phase");
        for &id in &trees {
            let tree = &program[id];
            trace!(%phase, path = %tree.path().display(), "visiting");
            let mut cx = context.enter(&tree.source);
            match phase {
                Phase::EnterSymbols => {
                    let symbols = enter_symbols(tree, &mut cx);
                    analysis.symbols.insert(id, symbols);
                }
                Phase::BindNames => {
                    let bindings = bind(program, &analysis.symbols, id, &mut cx);
                    analysis.bindings.insert(id, bindings);
                }
                Phase::TypeCheck => {
                    let values = check(analysis.resolver(program), id, &mut cx);
                    analysis.values.insert(id, values);
                }
                Phase::CyclicCheck => check_cycles(analysis.resolver(program), id, &mut cx),
                Phase::CheckUnused => check_unused(tree, &analysis.bindings[id], &mut cx),
            }
        }
        let errors = context.error_count() - errors_before;
        if errors > 0 {
            debug!(%phase, errors, "phase failed");
            return analysis;
        }
        debug!(%phase, "phase finished");
        analysis.completed = Some(phase);
    }
    analysis
}

/// A type expression and the tree it is written in.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TypeRef {
    pub tree: Id<ParseTree>,
    pub ty: Ty,
}

/// Why a type could not be unwrapped.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Unwrap {
    /// A name on the way has no binding; it was reported when binding.
    Unbound,
    /// The typedef chain revisits this typedef.
    Cyclic(DeclRef),
}

/// Cross-tree queries over the symbols and bindings of a whole program.
#[derive(Copy, Clone)]
pub struct Resolver<'a> {
    pub program: &'a Program,
    pub symbols: &'a Table<Id<ParseTree>, Symbols>,
    pub bindings: &'a Table<Id<ParseTree>, Bindings>,
}

impl<'a> Resolver<'a> {
    pub fn new(
        program: &'a Program,
        symbols: &'a Table<Id<ParseTree>, Symbols>,
        bindings: &'a Table<Id<ParseTree>, Bindings>,
    ) -> Self {
        Self {
            program,
            symbols,
            bindings,
        }
    }

    pub fn syntax(&self, tree: Id<ParseTree>) -> &'a SyntaxList {
        &self.program[tree].syntax
    }

    pub fn symbols(&self, tree: Id<ParseTree>) -> &'a Symbols {
        &self.symbols[tree]
    }

    pub fn binding(&self, tree: Id<ParseTree>, name: Name) -> Option<&'a Binding> {
        self.bindings.get(tree)?.names.get(name)
    }

    pub fn declaration_name(&self, declaration: DeclRef) -> &'a str {
        let syntax = self.syntax(declaration.tree);
        &syntax[syntax.declaration_name(declaration.declaration)]
    }

    /// Follow typedefs until reaching a type that is not a typedef name.
    /// Also returns the declaration that type names, if any.
    pub fn unwrap_typedefs(&self, ty: TypeRef) -> Result<(TypeRef, Option<DeclRef>), Unwrap> {
        let mut current = ty;
        let mut seen = HashSet::new();
        loop {
            let Ty::Name(name) = current.ty else {
                return Ok((current, None));
            };
            let binding = self.binding(current.tree, name).ok_or(Unwrap::Unbound)?;
            let target = binding.target;
            match target.declaration {
                Declaration::Typedef(typedef) if binding.tail.is_empty() => {
                    if !seen.insert(target) {
                        return Err(Unwrap::Cyclic(target));
                    }
                    current = TypeRef {
                        tree: target.tree,
                        ty: self.syntax(target.tree)[typedef].ty,
                    };
                }
                _ => return Ok((current, Some(target))),
            }
        }
    }

    /// Whether the chain starting at typedef `start` leads back to `start`.
    pub fn typedef_is_cyclic(&self, start: DeclRef) -> bool {
        let mut seen = HashSet::new();
        let mut current = start;
        loop {
            let Declaration::Typedef(typedef) = current.declaration else {
                return false;
            };
            if !seen.insert(current) {
                return current == start;
            }
            let Ty::Name(name) = self.syntax(current.tree)[typedef].ty else {
                return false;
            };
            match self.binding(current.tree, name) {
                Some(binding) if binding.tail.is_empty() => current = binding.target,
                _ => return false,
            }
        }
    }

    /// The service `service` extends, if its `extends` names one.
    pub fn extends(&self, service: DeclRef) -> Option<DeclRef> {
        let Declaration::Service(id) = service.declaration else {
            return None;
        };
        let name = self.syntax(service.tree)[id].extends?;
        let binding = self.binding(service.tree, name)?;
        match binding.target.declaration {
            Declaration::Service(_) if binding.tail.is_empty() => Some(binding.target),
            _ => None,
        }
    }
}

#[test]
fn phases_run_in_order() {
    let mut sorted = Phase::ALL;
    sorted.sort();
    assert_eq!(sorted, Phase::ALL);
    assert_eq!(Phase::BindNames.to_string(), "bind names");
}

#[test]
fn clean_program_completes_every_phase() {
    let result = crate::tests::compile_memory(&[
        ("main.thrift", "include \"shared\"\nstruct A { 1: shared.B b }"),
        ("shared.thrift", "struct B { 1: i32 x }"),
    ]);
    assert!(result.diagnostics.is_empty());
    assert!(result.analysis.succeeded());
    assert_eq!(result.analysis.symbols.len(), 2);
    assert_eq!(result.analysis.values.len(), 2);
}

#[test]
fn failing_phase_stops_the_pipeline() {
    // The unused include would be reported by the last phase.
    let result = crate::tests::compile_memory(&[
        ("main.thrift", "include \"shared\"\nstruct A { 1: Missing m }"),
        ("shared.thrift", ""),
    ]);
    assert_eq!(result.analysis.completed, Some(Phase::EnterSymbols));
    assert_eq!(
        crate::tests::messages(&result.diagnostics),
        ["main.thrift (line 2, col 15): could not find any definition or package for name 'Missing'"]
    );
}

#[test]
fn errors_in_every_file_are_reported_before_stopping() {
    let result = crate::tests::compile_memory(&[
        ("main.thrift", "include \"shared\"\nstruct A { 1: shared.B b, 1: i32 c }"),
        ("shared.thrift", "struct B { 1: i32 x, 1: i32 y }"),
    ]);
    assert_eq!(result.analysis.completed, Some(Phase::BindNames));
    assert_eq!(
        crate::tests::messages(&result.diagnostics),
        [
            "shared.thrift (line 1, col 22): field 'y' has the same ordering as field 'x'",
            "main.thrift (line 2, col 27): field 'c' has the same ordering as field 'b'",
        ]
    );
}

#[test]
fn typedef_chains_unwrap_across_files() {
    let result = crate::tests::compile_memory(&[
        ("main.thrift", "include \"shared\"\ntypedef shared.Ids Local\nconst Local L = [1]"),
        ("shared.thrift", "typedef list<Id> Ids\ntypedef i64 Id"),
    ]);
    assert!(result.diagnostics.is_empty());
    let program = result.program.as_ref().unwrap();
    let resolver = result.analysis.resolver(program);
    let Declaration::Typedef(local) = program.root().document().declarations[0] else {
        panic!("expected typedef");
    };
    let ty = TypeRef {
        tree: program.root,
        ty: program.root().syntax[local].ty,
    };
    let (unwrapped, target) = resolver.unwrap_typedefs(ty).unwrap();
    assert!(matches!(unwrapped.ty, Ty::ListType(_)));
    assert_eq!(unwrapped.tree, program.root().include("shared").unwrap().tree);
    assert_eq!(target, None);
}
