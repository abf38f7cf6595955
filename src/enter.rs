use crate::diag::{FileContext, Message};
use crate::list::Table;
use crate::program::ParseTree;
use crate::syntax::*;
use std::collections::HashMap;

/// Scopes of one tree, filled in by [`enter_symbols`].
#[derive(Debug, Default)]
pub struct Symbols {
    /// Top-level declarations by name.
    pub names: HashMap<String, Declaration>,
    pub enum_entries: Table<Enum, HashMap<String, EnumEntry>>,
    /// Final value of each enum entry that has a representable one.
    pub enum_values: Table<EnumEntry, i32>,
    pub struct_fields: Table<Struct, HashMap<String, Field>>,
}

impl Symbols {
    pub fn lookup(&self, name: &str) -> Option<Declaration> {
        self.names.get(name).copied()
    }
}

pub fn enter_symbols(tree: &ParseTree, cx: &mut FileContext<'_>) -> Symbols {
    let mut enter = Enter {
        syntax: &tree.syntax,
        cx,
        symbols: Symbols::default(),
    };
    for &declaration in &tree.document().declarations {
        enter.declaration(declaration);
    }
    enter.symbols
}

struct Enter<'syntax, 'cx, 'a> {
    syntax: &'syntax SyntaxList,
    cx: &'cx mut FileContext<'a>,
    symbols: Symbols,
}

impl Enter<'_, '_, '_> {
    fn declaration(&mut self, declaration: Declaration) {
        let syntax = self.syntax;
        let name = syntax.declaration_name(declaration);
        declare(
            self.cx,
            syntax,
            &mut self.symbols.names,
            name,
            declaration,
            |previous| {
                (
                    syntax.declaration_name(previous),
                    syntax.declaration_kind(previous),
                )
            },
        );
        match declaration {
            Declaration::Enum(id) => self.enum_entries(id),
            Declaration::Struct(id) => self.struct_fields(id),
            Declaration::Service(id) => self.service(id),
            Declaration::Typedef(_) | Declaration::Const(_) => {}
        }
    }

    fn enum_entries(&mut self, id: Enum) {
        let syntax = self.syntax;
        let mut entries = HashMap::new();
        let mut next = 0i64;
        for &entry in &syntax[id].entries {
            let data = &syntax[entry];
            let value = data.value.map_or(next, |literal| syntax[literal]);
            next = value.saturating_add(1);
            match i32::try_from(value) {
                Ok(value) => {
                    self.symbols.enum_values.insert(entry, value);
                }
                Err(_) => {
                    let span = match data.value {
                        Some(literal) => syntax.span(literal.0),
                        None => syntax.span(data.name.0),
                    };
                    self.cx.error(span, Message::I32Range { value });
                }
            }
            declare(self.cx, syntax, &mut entries, data.name, entry, |previous| {
                (syntax[previous].name, "enum entry")
            });
        }
        self.symbols.enum_entries.insert(id, entries);
    }

    fn struct_fields(&mut self, id: Struct) {
        let syntax = self.syntax;
        let mut fields = HashMap::new();
        for &field in &syntax[id].fields {
            declare(self.cx, syntax, &mut fields, syntax[field].name, field, |previous| {
                (syntax[previous].name, "field")
            });
        }
        self.symbols.struct_fields.insert(id, fields);
    }

    /// Method names, and argument names across arguments and throws, must be
    /// unique. Nothing is kept: methods are never looked up by name.
    fn service(&mut self, id: Service) {
        let syntax = self.syntax;
        let mut methods = HashMap::new();
        for &method in &syntax[id].methods {
            let data = &syntax[method];
            declare(self.cx, syntax, &mut methods, data.name, method, |previous| {
                (syntax[previous].name, "method")
            });

            let mut arguments = HashMap::new();
            for &argument in data.arguments.iter().chain(&data.throws) {
                declare(
                    self.cx,
                    syntax,
                    &mut arguments,
                    syntax[argument].name,
                    argument,
                    |previous| (syntax[previous].name, "argument"),
                );
            }
        }
    }
}

/// Add `item` to `scope` under `name`, or report a redeclaration with a note
/// at the earlier declaration.
fn declare<T: Copy>(
    cx: &mut FileContext<'_>,
    syntax: &SyntaxList,
    scope: &mut HashMap<String, T>,
    name: Identifier,
    item: T,
    previous: impl FnOnce(T) -> (Identifier, &'static str),
) -> bool {
    let text = &syntax[name];
    if let Some(&existing) = scope.get(text) {
        let (first, kind) = previous(existing);
        cx.error(
            syntax.span(name.0),
            Message::Redeclared {
                name: text.clone(),
                kind,
            },
        )
        .note(syntax.span(first.0), Message::FirstDeclared);
        return false;
    }
    scope.insert(text.clone(), item);
    true
}

#[cfg(test)]
fn enter(text: &str) -> (crate::program::Program, Symbols, Vec<crate::diag::Diagnostic>) {
    let (program, mut context) = crate::tests::program(&[("test.thrift", text)]);
    let tree = program.root();
    let symbols = enter_symbols(tree, &mut context.enter(&tree.source));
    (program, symbols, context.into_diagnostics())
}

#[cfg(test)]
fn enum_values(program: &crate::program::Program, symbols: &Symbols, name: &str) -> Vec<Option<i32>> {
    let syntax = &program.root().syntax;
    let Some(Declaration::Enum(id)) = symbols.lookup(name) else {
        panic!("{name} is not an enum");
    };
    syntax[id]
        .entries
        .iter()
        .map(|&entry| symbols.enum_values.get(entry).copied())
        .collect()
}

#[test]
fn enum_values_count_up_from_zero() {
    let (program, symbols, diagnostics) = enter("enum Color { RED, GREEN, BLUE }");
    assert!(diagnostics.is_empty());
    assert_eq!(
        enum_values(&program, &symbols, "Color"),
        [Some(0), Some(1), Some(2)]
    );
}

#[test]
fn enum_values_continue_after_explicit_values() {
    let (program, symbols, diagnostics) = enter("enum E { A, B = 5, C, D = -2, F }");
    assert!(diagnostics.is_empty());
    assert_eq!(
        enum_values(&program, &symbols, "E"),
        [Some(0), Some(5), Some(6), Some(-2), Some(-1)]
    );
}

#[test]
fn enum_value_out_of_range() {
    let (program, symbols, diagnostics) = enter("enum E { A = 2147483647, B, C = 5000000000 }");
    let messages = crate::tests::messages(&diagnostics);
    assert_eq!(
        messages,
        [
            "test.thrift (line 1, col 26): value '2147483648' does not fit in a 32-bit integer",
            "test.thrift (line 1, col 33): value '5000000000' does not fit in a 32-bit integer",
        ]
    );
    assert_eq!(
        enum_values(&program, &symbols, "E"),
        [Some(i32::MAX), None, None]
    );
}

#[test]
fn duplicate_field_notes_first_declaration() {
    let (_, _, diagnostics) = enter("struct User {\n  1: i64 id\n  2: string id\n}");
    assert_eq!(
        crate::tests::messages(&diagnostics),
        ["test.thrift (line 3, col 13): name 'id' was already declared as a field"]
    );
    let note = &diagnostics[0].also[0];
    assert_eq!(note.message, Message::FirstDeclared);
    assert_eq!((note.location.line, note.location.column), (2, 10));
}

#[test]
fn duplicate_top_level_name() {
    let (_, symbols, diagnostics) = enter("struct A {}\nenum A { X }\nconst i32 B = 1");
    assert_eq!(
        crate::tests::messages(&diagnostics),
        ["test.thrift (line 2, col 6): name 'A' was already declared as a struct"]
    );
    assert!(matches!(symbols.lookup("A"), Some(Declaration::Struct(_))));
    assert!(matches!(symbols.lookup("B"), Some(Declaration::Const(_))));
}

#[test]
fn duplicate_enum_entry() {
    let (_, _, diagnostics) = enter("enum E { A, A }");
    assert_eq!(
        crate::tests::messages(&diagnostics),
        ["test.thrift (line 1, col 13): name 'A' was already declared as an enum entry"]
    );
}

#[test]
fn service_names_are_unique() {
    let (_, _, diagnostics) = enter(
        "exception Oops {}\n\
         service S {\n\
         void a(1: i32 x, 2: i32 x)\n\
         void b(1: i32 oops) throws (1: Oops oops)\n\
         void a()\n\
         }",
    );
    assert_eq!(
        crate::tests::messages(&diagnostics),
        [
            "test.thrift (line 3, col 25): name 'x' was already declared as an argument",
            "test.thrift (line 4, col 37): name 'oops' was already declared as an argument",
            "test.thrift (line 5, col 6): name 'a' was already declared as a method",
        ]
    );
}
