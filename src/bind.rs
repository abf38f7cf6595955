use crate::diag::{FileContext, Message};
use crate::enter::Symbols;
use crate::list::{Id, Table};
use crate::program::{ParseTree, Program};
use crate::syntax::*;
use std::collections::HashSet;

/// A declaration anywhere in the program.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct DeclRef {
    pub tree: Id<ParseTree>,
    pub declaration: Declaration,
}

/// What a dotted name resolved to.
#[derive(Clone, Debug)]
pub struct Binding {
    pub target: DeclRef,
    /// Path components after the declaration name, e.g. the member in
    /// `Color.RED`. Interpreted by the type checker.
    pub tail: Vec<Identifier>,
}

/// Bindings of one tree, filled in by [`bind`].
#[derive(Debug, Default)]
pub struct Bindings {
    pub names: Table<Name, Binding>,
    /// Include names that at least one reference went through.
    pub used_includes: HashSet<String>,
}

/// Resolve every name reference in tree `id`. Requires symbols for every
/// tree in `program`.
pub fn bind(
    program: &Program,
    symbols: &Table<Id<ParseTree>, Symbols>,
    id: Id<ParseTree>,
    cx: &mut FileContext<'_>,
) -> Bindings {
    let tree = &program[id];
    let mut binder = Binder {
        tree,
        id,
        symbols,
        cx,
        bindings: Bindings::default(),
    };
    for &declaration in &tree.document().declarations {
        binder.declaration(declaration);
    }
    binder.bindings
}

struct Binder<'a, 'cx, 'f> {
    tree: &'a ParseTree,
    id: Id<ParseTree>,
    symbols: &'a Table<Id<ParseTree>, Symbols>,
    cx: &'cx mut FileContext<'f>,
    bindings: Bindings,
}

impl Binder<'_, '_, '_> {
    fn declaration(&mut self, declaration: Declaration) {
        let tree = self.tree;
        let syntax = &tree.syntax;
        match declaration {
            Declaration::Enum(_) => {}
            Declaration::Typedef(id) => self.ty(syntax[id].ty),
            Declaration::Const(id) => {
                self.ty(syntax[id].ty);
                self.expression(syntax[id].value);
            }
            Declaration::Struct(id) => {
                for &field in &syntax[id].fields {
                    self.ty(syntax[field].ty);
                    if let Some(default) = syntax[field].default {
                        self.expression(default);
                    }
                }
            }
            Declaration::Service(id) => {
                let service = &syntax[id];
                if let Some(extends) = service.extends {
                    self.name(extends);
                }
                for &method in &service.methods {
                    let method = &syntax[method];
                    self.ty(method.return_type);
                    for &argument in method.arguments.iter().chain(&method.throws) {
                        self.ty(syntax[argument].ty);
                    }
                }
            }
        }
    }

    fn ty(&mut self, ty: Ty) {
        let tree = self.tree;
        let syntax = &tree.syntax;
        match ty {
            Ty::BuiltinType(_) => {}
            Ty::Name(name) => self.name(name),
            Ty::ListType(id) => self.ty(syntax[id].element),
            Ty::MapType(id) => {
                self.ty(syntax[id].key);
                self.ty(syntax[id].value);
            }
        }
    }

    fn expression(&mut self, expression: Expression) {
        let tree = self.tree;
        let syntax = &tree.syntax;
        match expression {
            Expression::IntegerLiteral(_)
            | Expression::StringLiteral(_)
            | Expression::BoolLiteral(_) => {}
            Expression::Name(name) => self.name(name),
            Expression::List(id) => {
                for &element in &syntax[id].elements {
                    self.expression(element);
                }
            }
            Expression::Map(id) => {
                for entry in &syntax[id].entries {
                    self.expression(entry.key);
                    self.expression(entry.value);
                }
            }
        }
    }

    /// Local declarations shadow include names.
    fn name(&mut self, name: Name) {
        let tree = self.tree;
        let syntax = &tree.syntax;
        let path = &syntax[name].path;
        let root = path[0];
        let root_text = &syntax[root];

        if let Some(declaration) = self.symbols[self.id].lookup(root_text) {
            let binding = Binding {
                target: DeclRef {
                    tree: self.id,
                    declaration,
                },
                tail: path[1..].to_vec(),
            };
            self.bindings.names.insert(name, binding);
            return;
        }

        let Some(edge) = tree.include(root_text) else {
            self.cx.error(
                syntax.span(root.0),
                Message::Unresolved {
                    name: root_text.clone(),
                },
            );
            return;
        };
        let Some(&member) = path.get(1) else {
            self.cx.error(
                syntax.span(root.0),
                Message::NameIsPackage {
                    name: root_text.clone(),
                },
            );
            return;
        };

        // Used even if the lookup below fails.
        self.bindings.used_includes.insert(edge.name.clone());

        match self.symbols[edge.tree].lookup(&syntax[member]) {
            Some(declaration) => {
                let binding = Binding {
                    target: DeclRef {
                        tree: edge.tree,
                        declaration,
                    },
                    tail: path[2..].to_vec(),
                };
                self.bindings.names.insert(name, binding);
            }
            None => {
                self.cx.error(
                    syntax.span(member.0),
                    Message::NotFoundInPackage {
                        name: syntax[member].clone(),
                        package: edge.name.clone(),
                    },
                );
            }
        }
    }
}

#[cfg(test)]
fn bind_root(files: &[(&str, &str)]) -> (Program, Bindings, Vec<crate::diag::Diagnostic>) {
    use crate::enter::enter_symbols;

    let (program, mut context) = crate::tests::program(files);
    let mut symbols = Table::default();
    for id in program.flatten() {
        let tree = &program[id];
        symbols.insert(id, enter_symbols(tree, &mut context.enter(&tree.source)));
    }
    let root = program.root();
    let bindings = bind(&program, &symbols, program.root, &mut context.enter(&root.source));
    (program, bindings, context.into_diagnostics())
}

#[cfg(test)]
fn const_binding<'b>(program: &Program, bindings: &'b Bindings, index: usize) -> &'b Binding {
    let syntax = &program.root().syntax;
    let Declaration::Const(id) = program.root().document().declarations[index] else {
        panic!("expected const");
    };
    let Expression::Name(name) = syntax[id].value else {
        panic!("expected name value");
    };
    &bindings.names[name]
}

#[test]
fn local_names_keep_their_tail() {
    let (program, bindings, diagnostics) = bind_root(&[(
        "test.thrift",
        "enum Color { RED, GREEN }\nconst Color c = Color.GREEN",
    )]);
    assert!(diagnostics.is_empty());
    let binding = const_binding(&program, &bindings, 1);
    assert_eq!(binding.target.tree, program.root);
    assert!(matches!(binding.target.declaration, Declaration::Enum(_)));
    let syntax = &program.root().syntax;
    let tail: Vec<_> = binding.tail.iter().map(|&id| syntax[id].as_str()).collect();
    assert_eq!(tail, ["GREEN"]);
}

#[test]
fn package_names_resolve_in_the_include() {
    let (program, bindings, diagnostics) = bind_root(&[
        (
            "main.thrift",
            "include \"shared\"\nconst shared.Color c = shared.Color.RED",
        ),
        ("shared.thrift", "enum Color { RED }"),
    ]);
    assert!(diagnostics.is_empty());
    let shared = program.root().include("shared").unwrap().tree;
    let binding = const_binding(&program, &bindings, 0);
    assert_eq!(binding.target.tree, shared);
    assert_eq!(binding.tail.len(), 1);
    assert!(bindings.used_includes.contains("shared"));
}

#[test]
fn failed_package_lookup_still_marks_the_include() {
    let (_, bindings, diagnostics) = bind_root(&[
        ("main.thrift", "include \"shared\"\ntypedef shared.Missing M"),
        ("shared.thrift", ""),
    ]);
    assert_eq!(
        crate::tests::messages(&diagnostics),
        ["main.thrift (line 2, col 16): name 'Missing' not found in package 'shared'"]
    );
    assert!(bindings.used_includes.contains("shared"));
}

#[test]
fn bare_package_is_an_error() {
    let (_, _, diagnostics) = bind_root(&[
        ("main.thrift", "include \"shared\"\ntypedef shared S"),
        ("shared.thrift", ""),
    ]);
    assert_eq!(
        crate::tests::messages(&diagnostics),
        ["main.thrift (line 2, col 9): name 'shared' is a package"]
    );
}

#[test]
fn unresolved_names() {
    let (_, _, diagnostics) = bind_root(&[(
        "test.thrift",
        "struct S {\n  1: list<Nope> a = [Other.X]\n}",
    )]);
    assert_eq!(
        crate::tests::messages(&diagnostics),
        [
            "test.thrift (line 2, col 11): could not find any definition or package for name 'Nope'",
            "test.thrift (line 2, col 22): could not find any definition or package for name 'Other'",
        ]
    );
}

#[test]
fn local_declaration_shadows_include() {
    let (program, bindings, diagnostics) = bind_root(&[
        ("main.thrift", "include \"shared\"\nstruct shared {}\ntypedef shared S"),
        ("shared.thrift", ""),
    ]);
    assert!(diagnostics.is_empty());
    let syntax = &program.root().syntax;
    let Declaration::Typedef(id) = program.root().document().declarations[1] else {
        panic!("expected typedef");
    };
    let Ty::Name(name) = syntax[id].ty else {
        panic!("expected name");
    };
    assert_eq!(bindings.names[name].target.tree, program.root);
    assert!(bindings.used_includes.is_empty());
}
