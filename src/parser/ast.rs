// AST (Abstract Syntax Tree) definitions for the Kaleidoscope front end

use std::fmt;

/// Source location information for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Expression nodes.
///
/// Every subtree is owned by exactly one parent; the tree is never aliased.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64, SourceLocation),
    /// Reference to a function parameter, resolved during codegen
    Variable(String, SourceLocation),
    Binary {
        op: char,
        left: Box<Expr>,
        right: Box<Expr>,
        location: SourceLocation,
    },
    Call {
        callee: String,
        args: Vec<Expr>,
        location: SourceLocation,
    },
}

/// Renders the expression as a fully parenthesised S-expression,
/// e.g. `1+2*3` becomes `(+ 1 (* 2 3))`.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(value, _) => write!(f, "{}", value),
            Expr::Variable(name, _) => write!(f, "{}", name),
            Expr::Binary {
                op, left, right, ..
            } => write!(f, "({} {} {})", op, left, right),
            Expr::Call { callee, args, .. } => {
                write!(f, "(call {}", callee)?;
                for arg in args {
                    write!(f, " {}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// A function's name and parameter names, without a body.
///
/// An empty name marks the synthetic prototype wrapped around a top-level
/// expression. Parameter names are not required to be unique.
#[derive(Debug, Clone, PartialEq)]
pub struct Prototype {
    pub name: String,
    pub params: Vec<String>,
    pub location: SourceLocation,
}

impl Prototype {
    pub fn new(name: impl Into<String>, params: Vec<String>, location: SourceLocation) -> Self {
        Prototype {
            name: name.into(),
            params,
            location,
        }
    }

    /// Nameless, parameterless prototype for a top-level expression
    pub fn anonymous(location: SourceLocation) -> Self {
        Prototype::new(String::new(), Vec::new(), location)
    }

    pub fn is_anonymous(&self) -> bool {
        self.name.is_empty()
    }
}

impl fmt::Display for Prototype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.params.join(" "))
    }
}

/// Function definition: a prototype plus the expression it returns
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub proto: Prototype,
    pub body: Expr,
}

impl FunctionDef {
    pub fn new(proto: Prototype, body: Expr) -> Self {
        FunctionDef { proto, body }
    }

    pub fn is_anonymous(&self) -> bool {
        self.proto.is_anonymous()
    }
}

impl fmt::Display for FunctionDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "def {} {}", self.proto, self.body)
    }
}
