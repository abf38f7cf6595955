use crate::list::Id;
use crate::source::SourceSpan;
use std::fmt;

#[derive(Clone, Debug)]
pub struct Syntax {
    pub span: SourceSpan,
    pub data: SyntaxData,
}

/// Arena holding every node parsed from one file.
#[derive(Default, Debug)]
pub struct SyntaxList(crate::list::List<Syntax>);

impl SyntaxList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn span(&self, id: Id<Syntax>) -> SourceSpan {
        self.0[id].span
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::ops::Index<Id<Syntax>> for SyntaxList {
    type Output = Syntax;

    fn index(&self, index: Id<Syntax>) -> &Self::Output {
        &self.0[index]
    }
}

pub trait SyntaxId {
    type Data;

    fn add(list: &mut SyntaxList, span: SourceSpan, data: Self::Data) -> Self;
}

impl SyntaxList {
    pub fn add<S: SyntaxId>(&mut self, span: SourceSpan, data: S::Data) -> S {
        S::add(self, span, data)
    }
}

macro_rules! syntax {
    {
        $( $Kind: ident : $Data: ty , )*
        ==
        $( $Group: ident = $( $Alias: ident )|+, )*
    } => {
        #[derive(Copy, Clone, Debug, Eq, PartialEq)]
        pub enum SyntaxKind {
            $( $Kind, )*
        }

        #[derive(Clone, Debug)]
        pub enum SyntaxData {
            $( $Kind ( $Data ), )*
        }

        impl SyntaxData {
            pub fn kind(&self) -> SyntaxKind {
                match self {
                    $(Self::$Kind { .. } => SyntaxKind::$Kind,)*
                }
            }
        }

        $(
        #[derive(Copy, Clone, Debug, Hash, Ord, PartialOrd, Eq, PartialEq)]
        pub struct $Kind(pub Id<Syntax>);

        impl SyntaxId for $Kind {
            type Data = $Data;

            fn add(table: &mut SyntaxList, span: SourceSpan, data: $Data) -> Self {
                let data = SyntaxData::$Kind ( data );
                let id = table.0.add(Syntax { span, data });
                Self(id)
            }
        }

        impl std::ops::Index<$Kind> for SyntaxList {
            type Output = $Data;

            fn index(&self, index: $Kind) -> &Self::Output {
                let syntax = &self.0[index.0];
                match &syntax.data {
                    SyntaxData::$Kind ( data ) => data,
                    data => panic!(
                        "syntax {:?} expected {:?}, found {:?}",
                        index.0,
                        SyntaxKind::$Kind,
                        data.kind()
                    ),
                }
            }
        }
        )*

        $(

        #[derive(Copy, Clone, Hash, Eq, PartialEq)]
        pub enum $Group {
            $( $Alias ( $Alias ) ,)*
        }

        impl $Group {
            pub fn id(self) -> Id<Syntax> {
                match self {
                    $(Self::$Alias(syntax) => syntax.0,)*
                }
            }
        }

        $(
        impl From<$Alias> for $Group {
            fn from(value: $Alias) -> Self {
                Self::$Alias(value)
            }
        }
        )*

        impl std::fmt::Debug for $Group {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$Alias(inner) => std::fmt::Debug::fmt(inner, f),)*
                }
            }
        }

        )*
    };
}

syntax! {
    Identifier: String,
    IntegerLiteral: i64,
    StringLiteral: String,
    BoolLiteral: bool,
    Name: NameData,
    BuiltinType: Builtin,
    ListType: ListTypeData,
    MapType: MapTypeData,
    List: ListData,
    Map: MapData,
    Namespace: NamespaceData,
    Include: IncludeData,
    Enum: EnumData,
    EnumEntry: EnumEntryData,
    Struct: StructData,
    Field: FieldData,
    Typedef: TypedefData,
    Const: ConstData,
    Service: ServiceData,
    Method: MethodData,
    Argument: ArgumentData,
    Document: DocumentData,
    ==
    Expression = IntegerLiteral | StringLiteral | BoolLiteral | List | Map | Name,
    Ty = BuiltinType | Name | ListType | MapType,
    Declaration = Enum | Struct | Typedef | Const | Service,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Builtin {
    Bool,
    I32,
    I64,
    String,
    Double,
    Void,
}

impl Builtin {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::String => "string",
            Self::Double => "double",
            Self::Void => "void",
        }
    }
}

impl fmt::Display for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dotted path of identifiers, used both as a type reference and as a value
/// reference (e.g. an enum member). Never empty.
#[derive(Clone, Debug)]
pub struct NameData {
    pub path: Vec<Identifier>,
}

#[derive(Clone, Debug)]
pub struct ListTypeData {
    pub element: Ty,
}

#[derive(Clone, Debug)]
pub struct MapTypeData {
    pub key: Ty,
    pub value: Ty,
}

#[derive(Clone, Debug)]
pub struct ListData {
    pub elements: Vec<Expression>,
}

#[derive(Copy, Clone, Debug)]
pub struct MapEntry {
    pub key: Expression,
    pub value: Expression,
}

/// Entries stay in source order; it only matters for diagnostics.
#[derive(Clone, Debug)]
pub struct MapData {
    pub entries: Vec<MapEntry>,
}

#[derive(Clone, Debug)]
pub struct NamespaceData {
    /// Target language, or `*`.
    pub scope: String,
    pub namespace: String,
}

#[derive(Clone, Debug)]
pub struct IncludeData {
    /// The quoted path, as written.
    pub path: StringLiteral,
}

#[derive(Clone, Debug)]
pub struct EnumData {
    pub name: Identifier,
    pub entries: Vec<EnumEntry>,
}

#[derive(Clone, Debug)]
pub struct EnumEntryData {
    pub name: Identifier,
    pub value: Option<IntegerLiteral>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StructKind {
    Struct,
    Exception,
}

impl StructKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Struct => "struct",
            Self::Exception => "exception",
        }
    }
}

#[derive(Clone, Debug)]
pub struct StructData {
    pub kind: StructKind,
    pub name: Identifier,
    pub fields: Vec<Field>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Requiredness {
    Required,
    Optional,
}

impl Requiredness {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::Optional => "optional",
        }
    }
}

#[derive(Clone, Debug)]
pub struct FieldData {
    pub order: Option<IntegerLiteral>,
    pub requiredness: Option<Requiredness>,
    pub ty: Ty,
    pub name: Identifier,
    pub default: Option<Expression>,
}

#[derive(Clone, Debug)]
pub struct TypedefData {
    pub ty: Ty,
    pub name: Identifier,
}

#[derive(Clone, Debug)]
pub struct ConstData {
    pub ty: Ty,
    pub name: Identifier,
    pub value: Expression,
}

#[derive(Clone, Debug)]
pub struct ServiceData {
    pub name: Identifier,
    pub extends: Option<Name>,
    pub methods: Vec<Method>,
}

#[derive(Clone, Debug)]
pub struct MethodData {
    pub oneway: bool,
    pub return_type: Ty,
    pub name: Identifier,
    pub arguments: Vec<Argument>,
    pub throws: Vec<Argument>,
}

/// A method argument or `throws` clause entry.
#[derive(Clone, Debug)]
pub struct ArgumentData {
    pub order: Option<IntegerLiteral>,
    pub ty: Ty,
    pub name: Identifier,
}

#[derive(Clone, Debug)]
pub struct DocumentData {
    pub namespaces: Vec<Namespace>,
    pub includes: Vec<Include>,
    pub declarations: Vec<Declaration>,
}

impl SyntaxList {
    pub fn declaration_name(&self, declaration: Declaration) -> Identifier {
        match declaration {
            Declaration::Enum(id) => self[id].name,
            Declaration::Struct(id) => self[id].name,
            Declaration::Typedef(id) => self[id].name,
            Declaration::Const(id) => self[id].name,
            Declaration::Service(id) => self[id].name,
        }
    }

    /// What kind of thing a declaration is, as spelled in diagnostics.
    pub fn declaration_kind(&self, declaration: Declaration) -> &'static str {
        match declaration {
            Declaration::Enum(_) => "enum",
            Declaration::Struct(id) => self[id].kind.as_str(),
            Declaration::Typedef(_) => "typedef",
            Declaration::Const(_) => "constant",
            Declaration::Service(_) => "service",
        }
    }

    pub fn expression_kind(&self, expression: Expression) -> &'static str {
        match expression {
            Expression::IntegerLiteral(_) => "integer",
            Expression::StringLiteral(_) => "string",
            Expression::BoolLiteral(_) => "bool",
            Expression::List(_) => "list",
            Expression::Map(_) => "map",
            Expression::Name(_) => "name",
        }
    }

    pub fn path(&self, name: Name) -> DisplayPath<'_> {
        DisplayPath(self, &self[name].path)
    }

    pub fn display_type(&self, ty: Ty) -> DisplayType<'_> {
        DisplayType(self, ty)
    }

    pub fn display_expression(&self, expression: Expression) -> DisplayExpression<'_> {
        DisplayExpression(self, expression)
    }
}

/// Identifiers joined with `.`.
pub struct DisplayPath<'a>(&'a SyntaxList, &'a [Identifier]);

impl<'a> DisplayPath<'a> {
    pub fn new(syntax: &'a SyntaxList, path: &'a [Identifier]) -> Self {
        Self(syntax, path)
    }
}

impl fmt::Display for DisplayPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, &part) in self.1.iter().enumerate() {
            if index > 0 {
                f.write_str(".")?;
            }
            f.write_str(&self.0[part])?;
        }
        Ok(())
    }
}

pub struct DisplayType<'a>(&'a SyntaxList, Ty);

impl fmt::Display for DisplayType<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let syntax = self.0;
        match self.1 {
            Ty::BuiltinType(id) => f.write_str(syntax[id].as_str()),
            Ty::Name(id) => write!(f, "{}", syntax.path(id)),
            Ty::ListType(id) => write!(f, "list<{}>", syntax.display_type(syntax[id].element)),
            Ty::MapType(id) => {
                let data = &syntax[id];
                write!(
                    f,
                    "map<{},{}>",
                    syntax.display_type(data.key),
                    syntax.display_type(data.value)
                )
            }
        }
    }
}

pub struct DisplayExpression<'a>(&'a SyntaxList, Expression);

impl fmt::Display for DisplayExpression<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let syntax = self.0;
        match self.1 {
            Expression::IntegerLiteral(id) => write!(f, "{}", syntax[id]),
            Expression::StringLiteral(id) => write!(f, "\"{}\"", syntax[id]),
            Expression::BoolLiteral(id) => write!(f, "{}", syntax[id]),
            Expression::Name(id) => write!(f, "{}", syntax.path(id)),
            Expression::List(id) => {
                f.write_str("[")?;
                for (index, &element) in syntax[id].elements.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", syntax.display_expression(element))?;
                }
                f.write_str("]")
            }
            Expression::Map(id) => {
                f.write_str("{")?;
                for (index, entry) in syntax[id].entries.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(
                        f,
                        "{}: {}",
                        syntax.display_expression(entry.key),
                        syntax.display_expression(entry.value)
                    )?;
                }
                f.write_str("}")
            }
        }
    }
}
