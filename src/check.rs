use crate::bind::DeclRef;
use crate::diag::{FileContext, Message, OrderKind};
use crate::list::{Id, Table};
use crate::program::ParseTree;
use crate::sema::{Resolver, TypeRef};
use crate::syntax::*;
use std::collections::{HashMap, HashSet};

/// A constant or default value, coerced to its declared type.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    I32(i32),
    I64(i64),
    String(String),
    List(Vec<Value>),
    Map(Vec<(Value, Value)>),
    Enum(EnumValue),
    /// Initialized fields, in initializer order.
    Struct(Vec<(String, Value)>),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct EnumValue {
    pub tree: Id<ParseTree>,
    pub entry: EnumEntry,
    pub value: i32,
}

/// Values of one tree, filled in by [`check`].
#[derive(Debug, Default)]
pub struct Values {
    pub constants: Table<Const, Value>,
    pub defaults: Table<Field, Value>,
}

/// Type check the declarations of tree `id`.
pub fn check(resolver: Resolver<'_>, id: Id<ParseTree>, cx: &mut FileContext<'_>) -> Values {
    let mut checker = Checker {
        resolver,
        tree: id,
        syntax: resolver.syntax(id),
        cx,
        values: Values::default(),
    };
    for &declaration in &resolver.program[id].document().declarations {
        checker.declaration(declaration);
    }
    checker.values
}

struct Checker<'a, 'cx, 'f> {
    resolver: Resolver<'a>,
    tree: Id<ParseTree>,
    syntax: &'a SyntaxList,
    cx: &'cx mut FileContext<'f>,
    values: Values,
}

impl Checker<'_, '_, '_> {
    fn declaration(&mut self, declaration: Declaration) {
        let syntax = self.syntax;
        match declaration {
            Declaration::Enum(_) => {}
            Declaration::Typedef(id) => {
                let data = &syntax[id];
                let target = DeclRef {
                    tree: self.tree,
                    declaration,
                };
                if self.resolver.typedef_is_cyclic(target) {
                    self.cx.error(
                        syntax.span(data.name.0),
                        Message::CyclicTypedef {
                            name: syntax[data.name].clone(),
                        },
                    );
                } else if self.affirm_type(data.ty) {
                    self.check_void(data.ty, false);
                }
            }
            Declaration::Const(id) => {
                let data = &syntax[id];
                if self.affirm_type(data.ty) {
                    self.check_void(data.ty, false);
                    let ty = self.type_ref(data.ty);
                    if let Some(value) = self.check_type(ty, data.value) {
                        self.values.constants.insert(id, value);
                    }
                }
            }
            Declaration::Struct(id) => self.check_struct(id),
            Declaration::Service(id) => self.check_service(id),
        }
    }

    fn type_ref(&self, ty: Ty) -> TypeRef {
        TypeRef {
            tree: self.tree,
            ty,
        }
    }

    /// Check that a type expression names a type. Unbound names were already
    /// reported and are skipped.
    fn affirm_type(&mut self, ty: Ty) -> bool {
        let syntax = self.syntax;
        match ty {
            Ty::BuiltinType(_) => true,
            Ty::ListType(id) => self.affirm_type(syntax[id].element),
            Ty::MapType(id) => {
                let key = self.affirm_type(syntax[id].key);
                let value = self.affirm_type(syntax[id].value);
                key && value
            }
            Ty::Name(name) => {
                let Some(binding) = self.resolver.binding(self.tree, name) else {
                    return false;
                };
                let is_type = matches!(
                    binding.target.declaration,
                    Declaration::Struct(_) | Declaration::Enum(_) | Declaration::Typedef(_)
                );
                // Type names cannot be drilled into.
                if is_type && binding.tail.is_empty() {
                    return true;
                }
                self.cx.error(
                    syntax.span(name.0),
                    Message::NotAType {
                        name: syntax.path(name).to_string(),
                    },
                );
                false
            }
        }
    }

    /// `void` is only allowed as the top-level return type of a method.
    fn check_void(&mut self, ty: Ty, allowed: bool) {
        let syntax = self.syntax;
        match ty {
            Ty::BuiltinType(id) => {
                if syntax[id] == Builtin::Void && !allowed {
                    self.cx.error(syntax.span(id.0), Message::VoidNotAllowed);
                }
            }
            Ty::ListType(id) => self.check_void(syntax[id].element, false),
            Ty::MapType(id) => {
                self.check_void(syntax[id].key, false);
                self.check_void(syntax[id].value, false);
            }
            Ty::Name(name) => {
                if allowed {
                    return;
                }
                if let Ok((unwrapped, None)) = self.resolver.unwrap_typedefs(self.type_ref(ty)) {
                    if let Ty::BuiltinType(id) = unwrapped.ty {
                        if self.resolver.syntax(unwrapped.tree)[id] == Builtin::Void {
                            self.cx.error(syntax.span(name.0), Message::VoidNotAllowed);
                        }
                    }
                }
            }
        }
    }

    /// Coerce `value` to `ty`. Errors are reported at the value, which is
    /// always in the current file.
    fn check_type(&mut self, ty: TypeRef, value: Expression) -> Option<Value> {
        let (ty, target) = self.resolver.unwrap_typedefs(ty).ok()?;
        let type_syntax = self.resolver.syntax(ty.tree);
        match ty.ty {
            Ty::BuiltinType(id) => self.check_builtin(type_syntax[id], value),
            Ty::ListType(id) => {
                let element = TypeRef {
                    tree: ty.tree,
                    ty: type_syntax[id].element,
                };
                self.check_list(element, value)
            }
            Ty::MapType(id) => {
                let data = &type_syntax[id];
                let key_ty = TypeRef {
                    tree: ty.tree,
                    ty: data.key,
                };
                let value_ty = TypeRef {
                    tree: ty.tree,
                    ty: data.value,
                };
                self.check_map(key_ty, value_ty, value)
            }
            Ty::Name(name) => match target {
                Some(DeclRef {
                    tree,
                    declaration: Declaration::Enum(id),
                }) => self.check_enum(tree, id, value),
                Some(DeclRef {
                    tree,
                    declaration: Declaration::Struct(id),
                }) => self.check_struct_value(tree, id, value),
                _ => {
                    self.error_at(
                        value,
                        Message::CannotUseType {
                            name: type_syntax.path(name).to_string(),
                        },
                    );
                    None
                }
            },
        }
    }

    fn check_builtin(&mut self, builtin: Builtin, value: Expression) -> Option<Value> {
        let syntax = self.syntax;
        match (builtin, value) {
            (Builtin::Bool, Expression::BoolLiteral(id)) => Some(Value::Bool(syntax[id])),
            (Builtin::I32, Expression::IntegerLiteral(id)) => match i32::try_from(syntax[id]) {
                Ok(value) => Some(Value::I32(value)),
                Err(_) => {
                    self.error_at(value, Message::I32Range { value: syntax[id] });
                    None
                }
            },
            (Builtin::I64, Expression::IntegerLiteral(id)) => Some(Value::I64(syntax[id])),
            (Builtin::String, Expression::StringLiteral(id)) => {
                Some(Value::String(syntax[id].clone()))
            }
            _ => {
                let message = Message::CannotCoerce {
                    value: syntax.expression_kind(value),
                    ty: builtin.to_string(),
                };
                self.error_at(value, message);
                None
            }
        }
    }

    fn check_list(&mut self, element: TypeRef, value: Expression) -> Option<Value> {
        let syntax = self.syntax;
        let Expression::List(list) = value else {
            let message = Message::NotAList {
                value: syntax.expression_kind(value),
            };
            self.error_at(value, message);
            return None;
        };
        // Check every element so that each bad one is reported.
        let values: Vec<_> = syntax[list]
            .elements
            .iter()
            .map(|&item| self.check_type(element, item))
            .collect();
        values.into_iter().collect::<Option<_>>().map(Value::List)
    }

    fn check_map(&mut self, key_ty: TypeRef, value_ty: TypeRef, value: Expression) -> Option<Value> {
        let syntax = self.syntax;
        let Expression::Map(map) = value else {
            let message = Message::NotAMap {
                value: syntax.expression_kind(value),
            };
            self.error_at(value, message);
            return None;
        };
        let mut ok = true;
        let mut entries = vec![];
        for entry in &syntax[map].entries {
            let key = self.check_type(key_ty, entry.key);
            let value = self.check_type(value_ty, entry.value);
            match (key, value) {
                (Some(key), Some(value)) => entries.push((key, value)),
                _ => ok = false,
            }
        }
        ok.then_some(Value::Map(entries))
    }

    fn check_enum(&mut self, tree: Id<ParseTree>, id: Enum, value: Expression) -> Option<Value> {
        let syntax = self.syntax;
        let expected = DeclRef {
            tree,
            declaration: Declaration::Enum(id),
        };
        let enum_name = self.resolver.declaration_name(expected).to_string();

        let Expression::Name(name) = value else {
            self.error_at(value, Message::NotEnumMember { enum_name });
            return None;
        };
        let binding = self.resolver.binding(self.tree, name)?;
        let Declaration::Enum(other) = binding.target.declaration else {
            self.error_at(value, Message::NotEnumMember { enum_name });
            return None;
        };
        let other_name = self.resolver.declaration_name(binding.target).to_string();

        let member = match binding.tail.as_slice() {
            [] => {
                self.error_at(
                    value,
                    Message::EnumAsValue {
                        enum_name: other_name,
                    },
                );
                return None;
            }
            &[member] => member,
            tail => {
                self.error_at(
                    value,
                    Message::NoSuchEnumMember {
                        member: DisplayPath::new(syntax, tail).to_string(),
                        enum_name: other_name,
                    },
                );
                return None;
            }
        };

        let symbols = self.resolver.symbols(binding.target.tree);
        let entry = symbols
            .enum_entries
            .get(other)
            .and_then(|entries| entries.get(&syntax[member]).copied());
        let Some(entry) = entry else {
            self.cx.error(
                syntax.span(member.0),
                Message::NoSuchEnumMember {
                    member: syntax[member].clone(),
                    enum_name: other_name,
                },
            );
            return None;
        };

        // Checked after the member lookup, so bad member names are reported first.
        if binding.target != expected {
            self.error_at(
                value,
                Message::EnumMismatch {
                    from: other_name,
                    to: enum_name,
                },
            );
            return None;
        }

        let value = *symbols.enum_values.get(entry)?;
        Some(Value::Enum(EnumValue {
            tree: binding.target.tree,
            entry,
            value,
        }))
    }

    /// Struct initializers are maps from field name strings to values.
    fn check_struct_value(
        &mut self,
        tree: Id<ParseTree>,
        id: Struct,
        value: Expression,
    ) -> Option<Value> {
        let syntax = self.syntax;
        let struct_syntax = self.resolver.syntax(tree);
        let strukt = &struct_syntax[id];
        let struct_name = &struct_syntax[strukt.name];

        let Expression::Map(map) = value else {
            self.error_at(value, Message::NotStructInitializer);
            return None;
        };
        let fields = self.resolver.symbols(tree).struct_fields.get(id)?;

        let mut ok = true;
        let mut initialized = vec![];
        let mut seen = HashSet::new();
        for entry in &syntax[map].entries {
            let Expression::StringLiteral(key) = entry.key else {
                self.error_at(entry.key, Message::ExpectedFieldName);
                ok = false;
                continue;
            };
            let field_name = &syntax[key];
            let Some(&field) = fields.get(field_name) else {
                self.error_at(
                    entry.key,
                    Message::UnknownField {
                        field: field_name.clone(),
                        strukt: struct_name.clone(),
                    },
                );
                ok = false;
                continue;
            };
            if !seen.insert(field) {
                self.error_at(
                    entry.key,
                    Message::DuplicateInitializer {
                        field: field_name.clone(),
                    },
                );
                ok = false;
                continue;
            }
            let field_ty = TypeRef {
                tree,
                ty: struct_syntax[field].ty,
            };
            match self.check_type(field_ty, entry.value) {
                Some(value) => initialized.push((field_name.clone(), value)),
                None => ok = false,
            }
        }

        // Fields without a qualifier count as required.
        for &field in &strukt.fields {
            let data = &struct_syntax[field];
            if data.requiredness == Some(Requiredness::Optional)
                || data.default.is_some()
                || seen.contains(&field)
            {
                continue;
            }
            self.error_at(
                value,
                Message::MissingRequiredField {
                    field: struct_syntax[data.name].clone(),
                    strukt: struct_name.clone(),
                },
            );
            ok = false;
        }

        ok.then_some(Value::Struct(initialized))
    }

    fn check_struct(&mut self, id: Struct) {
        let syntax = self.syntax;
        let strukt = &syntax[id];
        let orders: Vec<_> = strukt
            .fields
            .iter()
            .map(|&field| (syntax[field].order, syntax[field].name))
            .collect();
        self.check_ordering(&orders, OrderKind::Field);

        for &field in &strukt.fields {
            let data = &syntax[field];
            if !self.affirm_type(data.ty) {
                continue;
            }
            self.check_void(data.ty, false);
            if let Some(default) = data.default {
                let ty = self.type_ref(data.ty);
                if let Some(value) = self.check_type(ty, default) {
                    self.values.defaults.insert(field, value);
                }
            }
        }
    }

    fn check_service(&mut self, id: Service) {
        let syntax = self.syntax;
        let service = &syntax[id];
        if let Some(extends) = service.extends {
            if let Some(binding) = self.resolver.binding(self.tree, extends) {
                let is_service = matches!(binding.target.declaration, Declaration::Service(_));
                if !is_service || !binding.tail.is_empty() {
                    self.cx.error(
                        syntax.span(extends.0),
                        Message::NotAService {
                            name: syntax.path(extends).to_string(),
                        },
                    );
                }
            }
        }

        for &method in &service.methods {
            let method = &syntax[method];
            self.affirm_type(method.return_type);
            self.check_void(method.return_type, true);
            if method.oneway {
                let returns_void = matches!(
                    method.return_type,
                    Ty::BuiltinType(ty) if syntax[ty] == Builtin::Void
                );
                let name = &syntax[method.name];
                if !returns_void {
                    self.cx.error(
                        syntax.span(method.name.0),
                        Message::OnewayReturn { name: name.clone() },
                    );
                }
                if !method.throws.is_empty() {
                    self.cx.error(
                        syntax.span(method.name.0),
                        Message::OnewayThrows { name: name.clone() },
                    );
                }
            }

            for &argument in &method.arguments {
                let ty = syntax[argument].ty;
                if self.affirm_type(ty) {
                    self.check_void(ty, false);
                }
            }
            self.check_ordering(&orders(syntax, &method.arguments), OrderKind::Argument);

            for &argument in &method.throws {
                let ty = syntax[argument].ty;
                if self.affirm_type(ty) {
                    self.check_exception(ty);
                }
            }
            self.check_ordering(&orders(syntax, &method.throws), OrderKind::Exception);
        }
    }

    /// `throws` entries must be structs declared with `exception`.
    fn check_exception(&mut self, ty: Ty) {
        let Ok((unwrapped, target)) = self.resolver.unwrap_typedefs(self.type_ref(ty)) else {
            return;
        };
        let found = match target {
            Some(target) => {
                let syntax = self.resolver.syntax(target.tree);
                match target.declaration {
                    Declaration::Struct(id) if syntax[id].kind == StructKind::Exception => return,
                    declaration => syntax.declaration_kind(declaration),
                }
            }
            None => match unwrapped.ty {
                Ty::ListType(_) => "list",
                Ty::MapType(_) => "map",
                Ty::BuiltinType(_) | Ty::Name(_) => "builtin type",
            },
        };
        self.cx
            .error(self.syntax.span(ty.id()), Message::NotAnException { found });
    }

    /// Orders must be present, positive and unique within one list.
    fn check_ordering(&mut self, items: &[(Option<IntegerLiteral>, Identifier)], kind: OrderKind) {
        let syntax = self.syntax;
        let mut orders = HashMap::<i32, Identifier>::new();
        for &(order, name) in items {
            let Some(order) = order else {
                self.cx.error(
                    syntax.span(name.0),
                    Message::MissingOrder {
                        kind,
                        name: syntax[name].clone(),
                    },
                );
                continue;
            };
            let span = syntax.span(order.0);
            let Ok(value) = i32::try_from(syntax[order]) else {
                self.cx.error(span, Message::I32Range { value: syntax[order] });
                continue;
            };
            if let Some(&previous) = orders.get(&value) {
                self.cx.error(
                    span,
                    Message::DuplicateOrder {
                        kind,
                        name: syntax[name].clone(),
                        previous: syntax[previous].clone(),
                    },
                );
            } else {
                orders.insert(value, name);
            }
            if value <= 0 {
                self.cx.error(
                    span,
                    Message::NonPositiveOrder {
                        kind,
                        name: syntax[name].clone(),
                    },
                );
            }
        }
    }

    fn error_at(&mut self, value: Expression, message: Message) {
        self.cx.error(self.syntax.span(value.id()), message);
    }
}

fn orders(syntax: &SyntaxList, arguments: &[Argument]) -> Vec<(Option<IntegerLiteral>, Identifier)> {
    arguments
        .iter()
        .map(|&argument| (syntax[argument].order, syntax[argument].name))
        .collect()
}

#[cfg(test)]
use crate::tests::{compile_memory, messages};

#[cfg(test)]
fn errors(text: &str) -> Vec<String> {
    messages(&compile_memory(&[("test.thrift", text)]).diagnostics)
}

#[cfg(test)]
fn constant(result: &crate::CompileResult, name: &str) -> Option<Value> {
    let program = result.program.as_ref()?;
    let tree = program.root;
    let Some(Declaration::Const(id)) = result.analysis.symbols.get(tree)?.lookup(name) else {
        return None;
    };
    result.analysis.values.get(tree)?.constants.get(id).cloned()
}

#[test]
fn builtin_constants() {
    let result = compile_memory(&[(
        "test.thrift",
        r#"
const bool B = true
const i32 SMALL = -2147483648
const i64 BIG = 9000000000
const string S = "hi"
const list<i32> L = [1, 2]
const map<string, bool> M = {"a": false}
"#,
    )]);
    assert_eq!(messages(&result.diagnostics), Vec::<String>::new());
    assert_eq!(constant(&result, "B"), Some(Value::Bool(true)));
    assert_eq!(constant(&result, "SMALL"), Some(Value::I32(i32::MIN)));
    assert_eq!(constant(&result, "BIG"), Some(Value::I64(9_000_000_000)));
    assert_eq!(constant(&result, "S"), Some(Value::String("hi".into())));
    assert_eq!(
        constant(&result, "L"),
        Some(Value::List(vec![Value::I32(1), Value::I32(2)]))
    );
    assert_eq!(
        constant(&result, "M"),
        Some(Value::Map(vec![(
            Value::String("a".into()),
            Value::Bool(false)
        )]))
    );
}

#[test]
fn i32_range() {
    assert_eq!(
        errors("const i32 X = 2147483648"),
        ["test.thrift (line 1, col 15): value '2147483648' does not fit in a 32-bit integer"]
    );
    assert_eq!(errors("const i32 X = 2147483647"), Vec::<String>::new());
}

#[test]
fn mismatched_literals() {
    assert_eq!(
        errors("const i32 X = \"one\"\nconst bool Y = 1\nconst double D = 1"),
        [
            "test.thrift (line 1, col 15): cannot coerce string to type 'i32'",
            "test.thrift (line 2, col 16): cannot coerce integer to type 'bool'",
            "test.thrift (line 3, col 18): cannot coerce integer to type 'double'",
        ]
    );
}

#[test]
fn every_bad_list_element_is_reported() {
    assert_eq!(
        errors("const list<i32> X = [1, \"a\", true]\nconst map<i32, i32> M = [1]"),
        [
            "test.thrift (line 1, col 25): cannot coerce string to type 'i32'",
            "test.thrift (line 1, col 30): cannot coerce bool to type 'i32'",
            "test.thrift (line 2, col 25): cannot coerce list to a map",
        ]
    );
}

#[cfg(test)]
const POINT: &str = "struct Point {\n  1: required i32 x\n  2: required i32 y\n}\n";

#[test]
fn struct_initializer() {
    let text = format!("{POINT}const Point P = {{\"x\": 1, \"y\": 2}}");
    let result = compile_memory(&[("test.thrift", &text)]);
    assert!(result.diagnostics.is_empty());
    assert_eq!(
        constant(&result, "P"),
        Some(Value::Struct(vec![
            ("x".into(), Value::I32(1)),
            ("y".into(), Value::I32(2)),
        ]))
    );
}

#[test]
fn missing_required_field() {
    let text = format!("{POINT}const Point P = {{\"x\": 1}}");
    assert_eq!(
        errors(&text),
        ["test.thrift (line 5, col 17): required field 'y' in struct 'Point' is not initialized"]
    );
}

#[test]
fn bad_initializer_entries() {
    let text = format!("{POINT}const Point P = {{\"x\": 1, \"x\": 2, \"z\": 3, 4: 5, \"y\": 6}}");
    assert_eq!(
        errors(&text),
        [
            "test.thrift (line 5, col 26): field 'x' is initialized more than once",
            "test.thrift (line 5, col 34): field 'z' not found in struct 'Point'",
            "test.thrift (line 5, col 42): expected a string literal with a struct field",
        ]
    );
}

#[test]
fn optional_and_defaulted_fields_may_be_omitted() {
    let text = "struct S {\n  1: optional i32 a\n  2: i32 b = 3\n  3: i32 c\n}\nconst S V = {\"c\": 1}";
    let result = compile_memory(&[("test.thrift", text)]);
    assert!(result.diagnostics.is_empty());
    let program = result.program.as_ref().unwrap();
    let values = &result.analysis.values[program.root];
    assert_eq!(values.defaults.len(), 1);
}

#[cfg(test)]
const COLOR: &str = "enum Color { RED, GREEN, BLUE }\nenum Other { RED }\n";

#[test]
fn enum_member_value() {
    let text = format!("{COLOR}const Color C = Color.GREEN");
    let result = compile_memory(&[("test.thrift", &text)]);
    assert!(result.diagnostics.is_empty());
    let Some(Value::Enum(value)) = constant(&result, "C") else {
        panic!("expected an enum value");
    };
    assert_eq!(value.value, 1);
}

#[test]
fn enum_reference_errors() {
    let text = format!(
        "{COLOR}const Color A = Color\nconst Color B = Other.RED\nconst Color C = Color.PINK\n\
         const Color D = Color.RED.X\nconst Color E = 1"
    );
    assert_eq!(
        errors(&text),
        [
            "test.thrift (line 3, col 17): cannot use enum 'Color' as a value",
            "test.thrift (line 4, col 17): cannot coerce enum 'Other' to enum 'Color'",
            "test.thrift (line 5, col 23): PINK is not a member of enum 'Color'",
            "test.thrift (line 6, col 17): RED.X is not a member of enum 'Color'",
            "test.thrift (line 7, col 17): value is not a member of enum 'Color'",
        ]
    );
}

#[test]
fn field_ordering() {
    assert_eq!(
        errors("struct S {\n  1: i32 a\n  1: i32 b\n  i32 c\n  0: i32 d\n}"),
        [
            "test.thrift (line 3, col 3): field 'b' has the same ordering as field 'a'",
            "test.thrift (line 4, col 7): field 'c' should have an explicit order, for better compatibility",
            "test.thrift (line 5, col 3): field 'd' must have an order greater than 0",
        ]
    );
    assert_eq!(
        errors("struct S {\n  1: i32 a\n  2: i32 b\n  3: i32 c\n}"),
        Vec::<String>::new()
    );
}

#[test]
fn argument_and_throws_ordering() {
    assert_eq!(
        errors(
            "exception E {}\nservice S {\n  \
             void f(1: i32 a, 1: i32 b, i32 c, 0: i32 d) throws (1: E x, E y, 1: E z)\n}"
        ),
        [
            "test.thrift (line 3, col 20): argument 'b' has the same ordering as argument 'a'",
            "test.thrift (line 3, col 34): argument 'c' should have an explicit order, for better compatibility",
            "test.thrift (line 3, col 37): argument 'd' must have an order greater than 0",
            "test.thrift (line 3, col 65): exception 'y' should have an explicit order, for better compatibility",
            "test.thrift (line 3, col 68): exception 'z' has the same ordering as exception 'x'",
        ]
    );
    assert_eq!(
        errors("exception E {}\nservice S {\n  void f(1: i32 a) throws (1: E e)\n}"),
        Vec::<String>::new()
    );
}

#[test]
fn void_outside_return_type() {
    assert_eq!(
        errors(
            "typedef void V\nstruct S { 1: list<void> a }\n\
             service X { void ok(), V bad(1: void arg) }"
        ),
        [
            "test.thrift (line 1, col 9): void can only be used as a return type",
            "test.thrift (line 2, col 20): void can only be used as a return type",
            "test.thrift (line 3, col 33): void can only be used as a return type",
        ]
    );
}

#[test]
fn type_names_must_be_types() {
    assert_eq!(
        errors("const i32 K = 1\nservice S {}\nstruct T { 1: K a, 2: S b }\nenum E { A }\ntypedef E.A EA"),
        [
            "test.thrift (line 3, col 15): expected a type, but 'K' does not resolve to a type",
            "test.thrift (line 3, col 23): expected a type, but 'S' does not resolve to a type",
            "test.thrift (line 5, col 9): expected a type, but 'E.A' does not resolve to a type",
        ]
    );
}

#[test]
fn service_checks() {
    assert_eq!(
        errors(
            "struct Plain {}\nexception Oops {}\ntypedef Oops Alias\nstruct NotService {}\n\
             service S extends NotService {\n\
             void a() throws (1: Plain p, 2: Alias q, 3: i32 r)\n\
             oneway i32 b() throws (1: Oops o)\n\
             }"
        ),
        [
            "test.thrift (line 5, col 19): name 'NotService' must be a service definition",
            "test.thrift (line 6, col 21): expected an exception, but got a struct",
            "test.thrift (line 6, col 45): expected an exception, but got a builtin type",
            "test.thrift (line 7, col 12): oneway method 'b' must return void",
            "test.thrift (line 7, col 12): oneway method 'b' cannot throw exceptions",
        ]
    );
}

#[test]
fn cyclic_typedef() {
    assert_eq!(
        errors("typedef A B\ntypedef B A\ntypedef A C"),
        [
            "test.thrift (line 1, col 11): typedef 'B' refers to itself",
            "test.thrift (line 2, col 11): typedef 'A' refers to itself",
        ]
    );
}

#[test]
fn values_from_included_types() {
    let result = compile_memory(&[
        (
            "main.thrift",
            "include \"shared\"\nconst shared.Pair P = {\"kind\": shared.Kind.B, \"ids\": [7]}",
        ),
        (
            "shared.thrift",
            "enum Kind { A, B }\ntypedef list<i64> Ids\nstruct Pair { 1: Kind kind, 2: Ids ids }",
        ),
    ]);
    assert_eq!(messages(&result.diagnostics), Vec::<String>::new());
    let Some(Value::Struct(fields)) = constant(&result, "P") else {
        panic!("expected a struct value");
    };
    assert!(matches!(fields[0].1, Value::Enum(EnumValue { value: 1, .. })));
    assert_eq!(fields[1].1, Value::List(vec![Value::I64(7)]));
}
