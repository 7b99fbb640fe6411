use crate::source::Source;

/// One parsed source file: an ordered list of top-level items. Modules from
/// every resolved file are concatenated before type checking, so each item
/// remembers the source it came from for diagnostics.
pub struct AstModule {
    pub items: Vec<Item>,
}

impl AstModule {
    pub fn new(items: Vec<Item>) -> Self {
        AstModule { items }
    }
}

#[derive(Debug)]
pub struct Item {
    pub kind: ItemKind,
    pub source: Source,
}

#[derive(Debug)]
pub enum ItemKind {
    Function(FunctionDecl),
    Struct(StructDecl),
    Enum(EnumDecl),
    /// `import "path";` — consumed by the module graph resolver; inert here.
    Import(String),
    /// `mod a::b;` — likewise consumed by the resolver.
    ModDecl(Vec<String>),
    /// `use a::b as c;`
    Use { path: Vec<String>, alias: Option<String> },
}

#[derive(Clone, Debug)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: Option<TypeName>,
    pub body: Vec<Stmt>,
}

#[derive(Clone, Debug)]
pub struct Param {
    pub name: String,
    pub type_name: TypeName,
    pub mutable: bool,
}

#[derive(Clone, Debug)]
pub struct StructDecl {
    pub name: String,
    pub fields: Vec<FieldDecl>,
}

impl StructDecl {
    pub fn field(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|field| field.name == name)
    }
}

#[derive(Clone, Debug)]
pub struct FieldDecl {
    pub name: String,
    pub type_name: TypeName,
}

#[derive(Clone, Debug)]
pub struct EnumDecl {
    pub name: String,
    pub variants: Vec<VariantDecl>,
}

impl EnumDecl {
    pub fn variant(&self, name: &str) -> Option<&VariantDecl> {
        self.variants.iter().find(|variant| variant.name == name)
    }

    pub fn variant_tag(&self, name: &str) -> Option<usize> {
        self.variants.iter().position(|variant| variant.name == name)
    }
}

#[derive(Clone, Debug)]
pub struct VariantDecl {
    pub name: String,
    pub payload: Option<TypeName>,
}

/// A syntactic type annotation, resolved to a `NodeType` during checking.
#[derive(Clone, Debug, PartialEq)]
pub enum TypeName {
    Named(String),
    Reference { inner: Box<TypeName>, mutable: bool },
    Generic { base: String, args: Vec<TypeName> },
}

impl std::fmt::Display for TypeName {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            TypeName::Named(name) => write!(f, "{}", name),
            TypeName::Reference { inner, mutable } => {
                if *mutable {
                    write!(f, "&mut {}", inner)
                } else {
                    write!(f, "&{}", inner)
                }
            }
            TypeName::Generic { base, args } => {
                write!(f, "{}<", base)?;
                for (index, arg) in args.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ">")
            }
        }
    }
}

#[derive(Clone, Debug)]
pub enum Stmt {
    Let {
        name: String,
        mutable: bool,
        type_name: Option<TypeName>,
        value: Expr,
    },
    Assign {
        name: String,
        op: AssignOp,
        value: Expr,
    },
    Expression(Expr),
    If {
        condition: Box<Expr>,
        then_branch: Vec<Stmt>,
        else_branch: Option<Vec<Stmt>>,
    },
    IfLet {
        pattern: Pattern,
        target: Expr,
        then_branch: Vec<Stmt>,
        else_branch: Option<Vec<Stmt>>,
    },
    While {
        label: Option<String>,
        condition: Expr,
        body: Vec<Stmt>,
    },
    WhileLet {
        label: Option<String>,
        pattern: Pattern,
        target: Expr,
        body: Vec<Stmt>,
    },
    For {
        label: Option<String>,
        binding: String,
        start: Expr,
        end: Expr,
        inclusive: bool,
        body: Vec<Stmt>,
    },
    Loop {
        label: Option<String>,
        body: Vec<Stmt>,
    },
    Break {
        label: Option<String>,
        value: Option<Expr>,
    },
    Continue {
        label: Option<String>,
    },
    Return(Option<Expr>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
}

impl AssignOp {
    pub fn from_symbol(symbol: &str) -> Option<AssignOp> {
        match symbol {
            "=" => Some(AssignOp::Assign),
            "+=" => Some(AssignOp::AddAssign),
            "-=" => Some(AssignOp::SubAssign),
            "*=" => Some(AssignOp::MulAssign),
            "/=" => Some(AssignOp::DivAssign),
            _ => None,
        }
    }

    pub fn is_compound(self) -> bool {
        self != AssignOp::Assign
    }
}

#[derive(Clone, Debug)]
pub enum Expr {
    Number(i32),
    Str(String),
    Bool(bool),
    Identifier(String),
    /// `a::b` with two or more segments; single segments collapse to
    /// `Identifier` in the parser.
    Path(Vec<String>),
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    FieldAccess {
        target: Box<Expr>,
        field: String,
    },
    Call {
        callee: Vec<String>,
        args: Vec<Expr>,
    },
    StructInit {
        name: String,
        fields: Vec<FieldInit>,
    },
    Block {
        statements: Vec<Stmt>,
        value: Box<Expr>,
    },
    If {
        condition: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
    Loop {
        body: Vec<Stmt>,
    },
    Match {
        target: Box<Expr>,
        arms: Vec<MatchArm>,
    },
}

#[derive(Clone, Debug)]
pub struct FieldInit {
    pub name: String,
    pub value: Expr,
}

#[derive(Clone, Debug)]
pub struct MatchArm {
    pub pattern: Pattern,
    pub guard: Option<Expr>,
    pub value: Expr,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Pattern {
    Wildcard,
    Int(i32),
    Range {
        start: i32,
        end: i32,
        inclusive: bool,
    },
    Bool(bool),
    Str(String),
    Variant {
        enum_name: String,
        variant: String,
        binding: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    pub fn is_arithmetic(self) -> bool {
        match self {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => true,
            _ => false,
        }
    }

    pub fn is_comparison(self) -> bool {
        match self {
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => true,
            _ => false,
        }
    }

    pub fn is_equality(self) -> bool {
        self == BinaryOp::Eq || self == BinaryOp::Ne
    }

    pub fn is_logical(self) -> bool {
        self == BinaryOp::And || self == BinaryOp::Or
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    Ref { mutable: bool },
    Deref,
}
