use crate::bind::Bindings;
use crate::diag::{FileContext, Message};
use crate::program::ParseTree;

/// Report includes that no name in `tree` was resolved through.
pub fn check_unused(tree: &ParseTree, bindings: &Bindings, cx: &mut FileContext<'_>) {
    let syntax = &tree.syntax;
    for edge in &tree.includes {
        if bindings.used_includes.contains(&edge.name) {
            continue;
        }
        let literal = syntax[edge.directive].path;
        cx.error(
            syntax.span(literal.0),
            Message::UnusedInclude {
                path: syntax[literal].clone(),
            },
        );
    }
}

#[test]
fn unused_includes_are_reported_at_the_path() {
    let result = crate::tests::compile_memory(&[
        (
            "main.thrift",
            "include \"used\"\ninclude \"lib/unused.thrift\"\nconst used.Id X = 1",
        ),
        ("used.thrift", "typedef i64 Id"),
        ("lib/unused.thrift", ""),
    ]);
    assert_eq!(
        crate::tests::messages(&result.diagnostics),
        ["main.thrift (line 2, col 9): include directive \"lib/unused.thrift\" is unused"]
    );
    assert_eq!(
        result.analysis.completed,
        Some(crate::sema::Phase::CyclicCheck)
    );
}

#[test]
fn includes_used_only_by_other_files_are_unused() {
    let result = crate::tests::compile_memory(&[
        ("main.thrift", "include \"a\"\ninclude \"b\"\nconst a.T X = 1"),
        ("a.thrift", "include \"b\"\ntypedef b.T T"),
        ("b.thrift", "typedef i32 T"),
    ]);
    assert_eq!(
        crate::tests::messages(&result.diagnostics),
        ["main.thrift (line 2, col 9): include directive \"b\" is unused"]
    );
}
