use std::fmt;

/// The checker's view of a value's type. `Infer` is the placeholder produced
/// by `Option::None` and the unfilled side of `Result` constructors; it
/// unifies with anything during assignability checks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeType {
    Int,
    Bool,
    Str,
    Void,
    Any,
    Unknown,
    Infer,
    Struct(String),
    Enum(String),
    Reference { inner: Box<NodeType>, mutable: bool },
    Option(Box<NodeType>),
    Result { ok: Box<NodeType>, err: Box<NodeType> },
}

impl NodeType {
    pub fn reference(inner: NodeType, mutable: bool) -> NodeType {
        NodeType::Reference {
            inner: Box::new(inner),
            mutable,
        }
    }

    pub fn option(inner: NodeType) -> NodeType {
        NodeType::Option(Box::new(inner))
    }

    pub fn result(ok: NodeType, err: NodeType) -> NodeType {
        NodeType::Result {
            ok: Box::new(ok),
            err: Box::new(err),
        }
    }

    pub fn is_struct(&self) -> bool {
        matches!(self, NodeType::Struct(_))
    }

    pub fn is_enum(&self) -> bool {
        matches!(self, NodeType::Enum(_))
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, NodeType::Reference { .. })
    }

    pub fn is_option(&self) -> bool {
        matches!(self, NodeType::Option(_))
    }

    pub fn is_result(&self) -> bool {
        matches!(self, NodeType::Result { .. })
    }

    pub fn is_printable(&self) -> bool {
        matches!(
            self,
            NodeType::Int
                | NodeType::Bool
                | NodeType::Str
                | NodeType::Any
                | NodeType::Struct(_)
                | NodeType::Enum(_)
        )
    }

    /// Values of these types are duplicated rather than moved.
    pub fn is_copy(&self) -> bool {
        matches!(
            self,
            NodeType::Int | NodeType::Bool | NodeType::Reference { .. }
        )
    }

    pub fn enum_name(&self) -> Option<&str> {
        match self {
            NodeType::Enum(name) => Some(name),
            _ => None,
        }
    }

    pub fn struct_name(&self) -> Option<&str> {
        match self {
            NodeType::Struct(name) => Some(name),
            _ => None,
        }
    }
}

/// Assignability is looser than equality: `Infer` unifies with anything,
/// `Any` accepts every concrete value type, a `&mut T` coerces to `&T`, and
/// `Option`/`Result` compare their payloads recursively.
pub fn is_assignable(expected: &NodeType, actual: &NodeType) -> bool {
    if *expected == NodeType::Infer || *actual == NodeType::Infer {
        return true;
    }
    if let (
        NodeType::Reference {
            inner: expected_inner,
            mutable: expected_mutable,
        },
        NodeType::Reference {
            inner: actual_inner,
            mutable: actual_mutable,
        },
    ) = (expected, actual)
    {
        if !is_assignable(expected_inner, actual_inner) {
            return false;
        }
        if *expected_mutable {
            return *actual_mutable;
        }
        return true;
    }
    if *expected == NodeType::Any {
        return *actual != NodeType::Void && *actual != NodeType::Unknown;
    }
    if let (NodeType::Option(expected_inner), NodeType::Option(actual_inner)) = (expected, actual) {
        return is_assignable(expected_inner, actual_inner);
    }
    if let (
        NodeType::Result {
            ok: expected_ok,
            err: expected_err,
        },
        NodeType::Result {
            ok: actual_ok,
            err: actual_err,
        },
    ) = (expected, actual)
    {
        return is_assignable(expected_ok, actual_ok) && is_assignable(expected_err, actual_err);
    }
    expected == actual
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            NodeType::Int => write!(f, "Int"),
            NodeType::Bool => write!(f, "Bool"),
            NodeType::Str => write!(f, "String"),
            NodeType::Void => write!(f, "Void"),
            NodeType::Any => write!(f, "Any"),
            NodeType::Unknown => write!(f, "Unknown"),
            NodeType::Infer => write!(f, "_"),
            NodeType::Struct(name) | NodeType::Enum(name) => write!(f, "{}", name),
            NodeType::Reference { inner, mutable } => {
                if *mutable {
                    write!(f, "&mut {}", inner)
                } else {
                    write!(f, "&{}", inner)
                }
            }
            NodeType::Option(inner) => write!(f, "Option<{}>", inner),
            NodeType::Result { ok, err } => write!(f, "Result<{}, {}>", ok, err),
        }
    }
}
