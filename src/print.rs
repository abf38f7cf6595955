//! Indented dump of a parse tree, one node per line with its location.

use crate::list::Id;
use crate::source::Source;
use crate::syntax::{Syntax, SyntaxData, SyntaxList};
use std::fmt;

pub struct TreeWriter<'source, 'syntax> {
    source: &'source Source,
    list: &'syntax SyntaxList,
    id: Id<Syntax>,
    indent: usize,
}

impl<'source, 'syntax> TreeWriter<'source, 'syntax> {
    pub fn new(source: &'source Source, list: &'syntax SyntaxList, id: Id<Syntax>) -> Self {
        Self {
            source,
            list,
            id,
            indent: 0,
        }
    }
}

struct FmtData<'b, 'a> {
    f: &'b mut fmt::Formatter<'a>,
    indent: usize,
}

impl FmtData<'_, '_> {
    fn write_indent(&mut self) -> fmt::Result {
        for _ in 0..self.indent {
            self.f.write_str(" ")?;
        }
        Ok(())
    }

    fn open(&mut self) -> fmt::Result {
        writeln!(self.f, " {{")?;
        self.indent += 2;
        Ok(())
    }

    fn close(&mut self) -> fmt::Result {
        self.indent -= 2;
        self.write_indent()?;
        writeln!(self.f, "}}")
    }

    fn field_name(&mut self, name: &str) -> fmt::Result {
        self.write_indent()?;
        write!(self.f, "{name}: ")
    }

    fn field_value(&mut self, name: &str, value: impl fmt::Display) -> fmt::Result {
        self.field_name(name)?;
        writeln!(self.f, "{value}")
    }

    fn field_nested(
        &mut self,
        name: &str,
        parent: &TreeWriter<'_, '_>,
        id: Id<Syntax>,
    ) -> fmt::Result {
        self.field_name(name)?;
        self.value_nested(parent, id)
    }

    fn field_opt_nested(
        &mut self,
        name: &str,
        parent: &TreeWriter<'_, '_>,
        id: Option<Id<Syntax>>,
    ) -> fmt::Result {
        match id {
            Some(id) => self.field_nested(name, parent, id),
            None => self.field_value(name, "<none>"),
        }
    }

    fn field_array(
        &mut self,
        name: &str,
        parent: &TreeWriter<'_, '_>,
        items: impl IntoIterator<Item = Id<Syntax>>,
    ) -> fmt::Result {
        self.field_name(name)?;
        writeln!(self.f, "[")?;
        self.indent += 2;
        for id in items {
            self.write_indent()?;
            self.value_nested(parent, id)?;
        }
        self.indent -= 2;
        self.write_indent()?;
        writeln!(self.f, "]")
    }

    fn value_nested(&mut self, parent: &TreeWriter<'_, '_>, id: Id<Syntax>) -> fmt::Result {
        let child = TreeWriter {
            source: parent.source,
            list: parent.list,
            id,
            indent: self.indent,
        };
        fmt::Display::fmt(&child, self.f)
    }
}

impl fmt::Display for TreeWriter<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let syntax = &self.list[self.id];
        let start = self.source.line_col(syntax.span.start);
        let end = self.source.line_col(syntax.span.end);
        write!(
            f,
            "{:?} @ {}-{} ({}-{})",
            syntax.data.kind(),
            start,
            end,
            syntax.span.start.0,
            syntax.span.end.0,
        )?;

        let mut fmt = FmtData {
            f,
            indent: self.indent,
        };

        match &syntax.data {
            SyntaxData::Identifier(data) => writeln!(fmt.f, " = {data}"),
            SyntaxData::IntegerLiteral(data) => writeln!(fmt.f, " = {data}"),
            SyntaxData::StringLiteral(data) => writeln!(fmt.f, " = \"{data}\""),
            SyntaxData::BoolLiteral(data) => writeln!(fmt.f, " = {data}"),
            SyntaxData::BuiltinType(data) => writeln!(fmt.f, " = {data}"),
            SyntaxData::Namespace(data) => writeln!(fmt.f, " = {} {}", data.scope, data.namespace),
            SyntaxData::Name(data) => {
                fmt.open()?;
                fmt.field_array("path", self, data.path.iter().map(|id| id.0))?;
                fmt.close()
            }
            SyntaxData::ListType(data) => {
                fmt.open()?;
                fmt.field_nested("element", self, data.element.id())?;
                fmt.close()
            }
            SyntaxData::MapType(data) => {
                fmt.open()?;
                fmt.field_nested("key", self, data.key.id())?;
                fmt.field_nested("value", self, data.value.id())?;
                fmt.close()
            }
            SyntaxData::List(data) => {
                fmt.open()?;
                fmt.field_array("elements", self, data.elements.iter().map(|e| e.id()))?;
                fmt.close()
            }
            SyntaxData::Map(data) => {
                fmt.open()?;
                for entry in &data.entries {
                    fmt.field_nested("key", self, entry.key.id())?;
                    fmt.field_nested("value", self, entry.value.id())?;
                }
                fmt.close()
            }
            SyntaxData::Include(data) => {
                fmt.open()?;
                fmt.field_nested("path", self, data.path.0)?;
                fmt.close()
            }
            SyntaxData::Enum(data) => {
                fmt.open()?;
                fmt.field_nested("name", self, data.name.0)?;
                fmt.field_array("entries", self, data.entries.iter().map(|e| e.0))?;
                fmt.close()
            }
            SyntaxData::EnumEntry(data) => {
                fmt.open()?;
                fmt.field_nested("name", self, data.name.0)?;
                fmt.field_opt_nested("value", self, data.value.map(|v| v.0))?;
                fmt.close()
            }
            SyntaxData::Struct(data) => {
                fmt.open()?;
                fmt.field_value("kind", data.kind.as_str())?;
                fmt.field_nested("name", self, data.name.0)?;
                fmt.field_array("fields", self, data.fields.iter().map(|f| f.0))?;
                fmt.close()
            }
            SyntaxData::Field(data) => {
                fmt.open()?;
                fmt.field_opt_nested("order", self, data.order.map(|o| o.0))?;
                match data.requiredness {
                    Some(requiredness) => fmt.field_value("requiredness", requiredness.as_str())?,
                    None => fmt.field_value("requiredness", "<none>")?,
                }
                fmt.field_nested("type", self, data.ty.id())?;
                fmt.field_nested("name", self, data.name.0)?;
                fmt.field_opt_nested("default", self, data.default.map(|d| d.id()))?;
                fmt.close()
            }
            SyntaxData::Typedef(data) => {
                fmt.open()?;
                fmt.field_nested("type", self, data.ty.id())?;
                fmt.field_nested("name", self, data.name.0)?;
                fmt.close()
            }
            SyntaxData::Const(data) => {
                fmt.open()?;
                fmt.field_nested("type", self, data.ty.id())?;
                fmt.field_nested("name", self, data.name.0)?;
                fmt.field_nested("value", self, data.value.id())?;
                fmt.close()
            }
            SyntaxData::Service(data) => {
                fmt.open()?;
                fmt.field_nested("name", self, data.name.0)?;
                fmt.field_opt_nested("extends", self, data.extends.map(|e| e.0))?;
                fmt.field_array("methods", self, data.methods.iter().map(|m| m.0))?;
                fmt.close()
            }
            SyntaxData::Method(data) => {
                fmt.open()?;
                fmt.field_value("oneway", data.oneway)?;
                fmt.field_nested("returns", self, data.return_type.id())?;
                fmt.field_nested("name", self, data.name.0)?;
                fmt.field_array("arguments", self, data.arguments.iter().map(|a| a.0))?;
                fmt.field_array("throws", self, data.throws.iter().map(|a| a.0))?;
                fmt.close()
            }
            SyntaxData::Argument(data) => {
                fmt.open()?;
                fmt.field_opt_nested("order", self, data.order.map(|o| o.0))?;
                fmt.field_nested("type", self, data.ty.id())?;
                fmt.field_nested("name", self, data.name.0)?;
                fmt.close()
            }
            SyntaxData::Document(data) => {
                fmt.open()?;
                fmt.field_array("namespaces", self, data.namespaces.iter().map(|n| n.0))?;
                fmt.field_array("includes", self, data.includes.iter().map(|i| i.0))?;
                fmt.field_array("declarations", self, data.declarations.iter().map(|d| d.id()))?;
                fmt.close()
            }
        }
    }
}

#[test]
fn writes_nested_nodes_with_locations() {
    let (program, _) = crate::tests::program(&[("test.thrift", "const i32 X = 1")]);
    let tree = program.root();
    let output = TreeWriter::new(&tree.source, &tree.syntax, tree.document.0).to_string();
    assert_eq!(
        output,
        "Document @ 1:1-1:16 (0-15) {
  namespaces: [
  ]
  includes: [
  ]
  declarations: [
    Const @ 1:1-1:16 (0-15) {
      type: BuiltinType @ 1:7-1:10 (6-9) = i32
      name: Identifier @ 1:11-1:12 (10-11) = X
      value: IntegerLiteral @ 1:15-1:16 (14-15) = 1
    }
  ]
}
"
    );
}

#[test]
fn optional_parts_print_as_none() {
    let (program, _) = crate::tests::program(&[("test.thrift", "enum E { A }")]);
    let tree = program.root();
    let output = TreeWriter::new(&tree.source, &tree.syntax, tree.document.0).to_string();
    assert!(output.contains("      value: <none>\n"), "{output}");
    assert!(output.contains("name: Identifier @ 1:6-1:7 (5-6) = E\n"), "{output}");
}
