use crate::bind::DeclRef;
use crate::diag::{FileContext, Message};
use crate::list::Id;
use crate::program::ParseTree;
use crate::sema::{Resolver, TypeRef};
use crate::syntax::*;
use std::collections::HashSet;

/// Report structs that contain themselves, and services that extend
/// themselves, among the declarations of tree `id`.
pub fn check_cycles(resolver: Resolver<'_>, id: Id<ParseTree>, cx: &mut FileContext<'_>) {
    let syntax = resolver.syntax(id);
    for &declaration in &resolver.program[id].document().declarations {
        let origin = DeclRef {
            tree: id,
            declaration,
        };
        match declaration {
            Declaration::Struct(strukt) => {
                let mut active = HashSet::new();
                for &field in &syntax[strukt].fields {
                    let ty = TypeRef {
                        tree: id,
                        ty: syntax[field].ty,
                    };
                    if contains(resolver, ty, origin, &mut active) {
                        let name = syntax[field].name;
                        cx.error(
                            syntax.span(name.0),
                            Message::CyclicStruct {
                                field: syntax[name].clone(),
                                strukt: syntax[syntax[strukt].name].clone(),
                            },
                        );
                        break;
                    }
                }
            }
            Declaration::Service(service) => {
                if extends_itself(resolver, origin) {
                    if let Some(extends) = syntax[service].extends {
                        cx.error(syntax.span(extends.0), Message::CyclicService);
                    }
                }
            }
            Declaration::Enum(_) | Declaration::Typedef(_) | Declaration::Const(_) => {}
        }
    }
}

/// Whether values of `ty` can nest a value of struct `origin`. `active`
/// holds the structs on the current search path, so cycles that do not
/// pass through `origin` end the search.
fn contains(
    resolver: Resolver<'_>,
    ty: TypeRef,
    origin: DeclRef,
    active: &mut HashSet<DeclRef>,
) -> bool {
    let Ok((ty, target)) = resolver.unwrap_typedefs(ty) else {
        return false;
    };
    let syntax = resolver.syntax(ty.tree);
    match ty.ty {
        Ty::BuiltinType(_) => false,
        Ty::ListType(list) => {
            let element = TypeRef {
                tree: ty.tree,
                ty: syntax[list].element,
            };
            contains(resolver, element, origin, active)
        }
        Ty::MapType(map) => {
            let tree = ty.tree;
            let key = TypeRef {
                tree,
                ty: syntax[map].key,
            };
            let value = TypeRef {
                tree,
                ty: syntax[map].value,
            };
            contains(resolver, key, origin, active) || contains(resolver, value, origin, active)
        }
        Ty::Name(_) => {
            let Some(target) = target else {
                return false;
            };
            let Declaration::Struct(strukt) = target.declaration else {
                return false;
            };
            if target == origin {
                return true;
            }
            if !active.insert(target) {
                return false;
            }
            let target_syntax = resolver.syntax(target.tree);
            let found = target_syntax[strukt].fields.iter().any(|&field| {
                let field_ty = TypeRef {
                    tree: target.tree,
                    ty: target_syntax[field].ty,
                };
                contains(resolver, field_ty, origin, active)
            });
            active.remove(&target);
            found
        }
    }
}

/// Whether the `extends` chain starting at `service` comes back to it.
fn extends_itself(resolver: Resolver<'_>, service: DeclRef) -> bool {
    let mut seen = HashSet::new();
    let mut current = resolver.extends(service);
    while let Some(parent) = current {
        if parent == service {
            return true;
        }
        if !seen.insert(parent) {
            return false;
        }
        current = resolver.extends(parent);
    }
    false
}

#[cfg(test)]
use crate::tests::{compile_memory, messages};

#[test]
fn struct_containing_itself() {
    let result = compile_memory(&[(
        "test.thrift",
        "struct Node {\n  1: i32 value\n  2: list<Node> children\n  3: Node parent\n}",
    )]);
    assert_eq!(
        messages(&result.diagnostics),
        ["test.thrift (line 3, col 17): field 'children' introduces a cyclic reference to struct 'Node'"]
    );
}

#[test]
fn mutual_recursion_through_typedefs_and_maps() {
    let result = compile_memory(&[(
        "test.thrift",
        "typedef B Alias\n\
         struct A { 1: map<string, Alias> b }\n\
         struct B { 1: A a }\n\
         struct C { 1: A a }",
    )]);
    // C only reaches the A/B cycle, it is not part of it.
    assert_eq!(
        messages(&result.diagnostics),
        [
            "test.thrift (line 2, col 34): field 'b' introduces a cyclic reference to struct 'A'",
            "test.thrift (line 3, col 17): field 'a' introduces a cyclic reference to struct 'B'",
        ]
    );
}

#[test]
fn cycles_across_files() {
    let result = compile_memory(&[
        ("main.thrift", "include \"other\"\nstruct A { 1: other.B b }\n"),
        ("other.thrift", "include \"main\"\nstruct B { 1: main.A a }\n"),
    ]);
    // Circular includes are rejected before any struct is examined.
    assert!(result.program.is_none());
}

#[test]
fn services_extending_themselves() {
    let result = compile_memory(&[(
        "test.thrift",
        "service A extends B {}\nservice B extends A {}\nservice C extends A {}\nservice D extends D {}",
    )]);
    assert_eq!(
        messages(&result.diagnostics),
        [
            "test.thrift (line 1, col 19): service extension is cyclic or extends from itself",
            "test.thrift (line 2, col 19): service extension is cyclic or extends from itself",
            "test.thrift (line 4, col 19): service extension is cyclic or extends from itself",
        ]
    );
}

#[test]
fn acyclic_declarations_pass() {
    let result = compile_memory(&[(
        "test.thrift",
        "struct Leaf { 1: i32 x }\nstruct Tree { 1: list<Leaf> leaves, 2: map<Leaf, Leaf> pairs }\n\
         service Base {}\nservice Derived extends Base {}",
    )]);
    assert!(result.diagnostics.is_empty());
    assert!(result.analysis.succeeded());
}
