use std::fmt;

use crate::lexer::CommentMap;
use crate::parser::ParseError;
use crate::token::{Location, TokenKind};

/// Expression node.
#[derive(Debug, Clone, PartialEq)]
pub struct Exp {
    pub kind: ExpKind,
    pub loc: Location,
}

impl Exp {
    #[must_use]
    pub const fn new(kind: ExpKind, loc: Location) -> Self {
        Self { kind, loc }
    }

    /// Identifier text if this is a plain name.
    #[must_use]
    pub fn as_name(&self) -> Option<&str> {
        match &self.kind {
            ExpKind::Name(name) => Some(name),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_bad(&self) -> bool {
        matches!(self.kind, ExpKind::Bad)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExpKind {
    Nil,
    True,
    False,
    Vararg,
    Integer(i64),
    Float(f64),
    String(String),
    Name(String),
    Unary {
        op: UnaryOp,
        operand: Box<Exp>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Exp>,
        right: Box<Exp>,
    },
    /// Table constructor. Positional fields have a `None` key.
    Table {
        keys: Vec<Option<Exp>>,
        values: Vec<Exp>,
    },
    Function(Box<FunctionDef>),
    Call(Box<FunctionCall>),
    /// `object[key]`; `object.name` is stored with a string key.
    Index {
        object: Box<Exp>,
        key: Box<Exp>,
    },
    Paren(Box<Exp>),
    /// Placeholder left where an expression failed to parse.
    Bad,
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `-`
    Neg,
    Not,
    /// `#`
    Len,
    /// `~`
    BNot,
}

impl UnaryOp {
    #[must_use]
    pub const fn from_token(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Minus => Some(Self::Neg),
            TokenKind::Not => Some(Self::Not),
            TokenKind::Hash => Some(Self::Len),
            TokenKind::Tilde => Some(Self::BNot),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Neg => "-",
            Self::Not => "not",
            Self::Len => "#",
            Self::BNot => "~",
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Infix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    IDiv,
    Mod,
    Pow,
    Concat,
    Shl,
    Shr,
    BAnd,
    BXor,
    BOr,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

impl BinaryOp {
    #[must_use]
    pub const fn from_token(kind: TokenKind) -> Option<Self> {
        let op = match kind {
            TokenKind::Plus => Self::Add,
            TokenKind::Minus => Self::Sub,
            TokenKind::Star => Self::Mul,
            TokenKind::Slash => Self::Div,
            TokenKind::DoubleSlash => Self::IDiv,
            TokenKind::Percent => Self::Mod,
            TokenKind::Caret => Self::Pow,
            TokenKind::Concat => Self::Concat,
            TokenKind::ShiftLeft => Self::Shl,
            TokenKind::ShiftRight => Self::Shr,
            TokenKind::Ampersand => Self::BAnd,
            TokenKind::Tilde => Self::BXor,
            TokenKind::Pipe => Self::BOr,
            TokenKind::Less => Self::Lt,
            TokenKind::LessEqual => Self::Le,
            TokenKind::Greater => Self::Gt,
            TokenKind::GreaterEqual => Self::Ge,
            TokenKind::Equal => Self::Eq,
            TokenKind::NotEqual => Self::Ne,
            TokenKind::And => Self::And,
            TokenKind::Or => Self::Or,
            _ => return None,
        };
        Some(op)
    }

    /// Binding strength; higher binds tighter.
    #[must_use]
    pub const fn priority(self) -> u8 {
        match self {
            Self::Pow => 12,
            Self::Mul | Self::Div | Self::IDiv | Self::Mod => 10,
            Self::Add | Self::Sub => 9,
            Self::Concat => 8,
            Self::Shl | Self::Shr => 7,
            Self::BAnd => 6,
            Self::BXor => 5,
            Self::BOr => 4,
            Self::Lt | Self::Le | Self::Gt | Self::Ge | Self::Eq | Self::Ne => 3,
            Self::And => 2,
            Self::Or => 1,
        }
    }

    #[must_use]
    pub const fn is_right_assoc(self) -> bool {
        matches!(self, Self::Pow | Self::Concat)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::IDiv => "//",
            Self::Mod => "%",
            Self::Pow => "^",
            Self::Concat => "..",
            Self::Shl => "<<",
            Self::Shr => ">>",
            Self::BAnd => "&",
            Self::BXor => "~",
            Self::BOr => "|",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Eq => "==",
            Self::Ne => "~=",
            Self::And => "and",
            Self::Or => "or",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named binding with the location of its identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub loc: Location,
}

impl Param {
    #[must_use]
    pub fn new(name: impl Into<String>, loc: Location) -> Self {
        Self {
            name: name.into(),
            loc,
        }
    }
}

/// Function literal or the function half of a function statement.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub params: Vec<Param>,
    pub is_vararg: bool,
    /// Declared with `:`, so `self` was injected as first parameter.
    pub is_method: bool,
    pub body: Block,
    /// Owner in `function Owner.name()` or inside a class body.
    pub class_name: Option<String>,
    pub func_name: Option<String>,
}

/// `callee(args)` or `callee:method(args)`.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub callee: Exp,
    pub method: Option<Param>,
    pub args: Vec<Exp>,
}

/// Variable attribute carried by declarations and assignments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Attribute {
    #[default]
    Regular,
    /// `<const>`
    Const,
    /// `<close>`
    Close,
    /// Exported from a Mooc module.
    Export,
}

/// Flavour of a `do` statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DoKind {
    Do,
    /// Mooc `defer { ... }`, runs at function exit.
    Defer,
}

/// Keyword that introduced a Mooc class declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    Class,
    Struct,
    Extension,
}

/// `if` chain. An `else` branch has a `true` condition.
#[derive(Debug, Clone, PartialEq)]
pub struct IfStat {
    pub conditions: Vec<Exp>,
    pub bodies: Vec<Block>,
    pub loc: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignStat {
    pub targets: Vec<Exp>,
    pub values: Vec<Exp>,
    pub attribute: Attribute,
    pub loc: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocalDecl {
    pub names: Vec<Param>,
    pub attributes: Vec<Attribute>,
    pub values: Vec<Exp>,
    pub loc: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForNumeric {
    pub var: Param,
    pub init: Exp,
    pub limit: Exp,
    /// Synthetic integer `1` when omitted.
    pub step: Exp,
    pub body: Block,
    pub loc: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForIn {
    pub vars: Vec<Param>,
    pub iterables: Vec<Exp>,
    pub body: Block,
    pub loc: Location,
}

/// Desugared `class`/`struct`/`extension`.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub kind: ClassKind,
    /// `Name = {}`
    pub class: AssignStat,
    pub super_class: Exp,
    /// `local Self = Name`, `local Super = <super>` and `local __st = <super>`.
    pub vars: Vec<LocalDecl>,
    /// Methods and fields as `Name.member = ...`.
    pub members: Vec<AssignStat>,
    pub loc: Location,
}

/// Desugared `import`.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportDecl {
    /// `import "lib"` as a `require("lib")` call.
    Require { call: FunctionCall, loc: Location },
    /// `import a, b from ...` as a local declaration.
    Bind(LocalDecl),
}

/// Desugared `switch`: the subject bound to `__sw__` plus an `if` chain.
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchDecl {
    pub subject: LocalDecl,
    pub cases: IfStat,
    pub loc: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stat {
    Empty,
    Break {
        loc: Location,
    },
    Label {
        name: String,
        loc: Location,
    },
    Goto {
        name: String,
        loc: Location,
    },
    Do {
        kind: DoKind,
        body: Block,
        loc: Location,
    },
    While {
        cond: Exp,
        body: Block,
        loc: Location,
    },
    Repeat {
        body: Block,
        cond: Exp,
        loc: Location,
    },
    If(IfStat),
    ForNumeric(Box<ForNumeric>),
    ForIn(ForIn),
    Assign(AssignStat),
    LocalDecl(LocalDecl),
    LocalFunction {
        name: Param,
        func: Box<FunctionDef>,
        loc: Location,
    },
    Call {
        call: Box<FunctionCall>,
        loc: Location,
    },
    Class(Box<ClassDecl>),
    Import(ImportDecl),
    /// Mooc `export *`.
    ExportAll {
        loc: Location,
    },
    Switch(Box<SwitchDecl>),
}

impl Stat {
    /// Source range; `None` only for [`Stat::Empty`].
    #[must_use]
    pub fn loc(&self) -> Option<Location> {
        let loc = match self {
            Self::Empty => return None,
            Self::Break { loc }
            | Self::Label { loc, .. }
            | Self::Goto { loc, .. }
            | Self::Do { loc, .. }
            | Self::While { loc, .. }
            | Self::Repeat { loc, .. }
            | Self::LocalFunction { loc, .. }
            | Self::Call { loc, .. }
            | Self::ExportAll { loc } => *loc,
            Self::If(stat) => stat.loc,
            Self::ForNumeric(stat) => stat.loc,
            Self::ForIn(stat) => stat.loc,
            Self::Assign(stat) => stat.loc,
            Self::LocalDecl(stat) => stat.loc,
            Self::Class(decl) => decl.loc,
            Self::Import(ImportDecl::Require { loc, .. }) => *loc,
            Self::Import(ImportDecl::Bind(decl)) => decl.loc,
            Self::Switch(decl) => decl.loc,
        };
        Some(loc)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Statement sequence with an optional trailing `return`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub stats: Vec<Stat>,
    /// `None` without a return statement, `Some(vec![])` for a bare `return`.
    pub returns: Option<Vec<Exp>>,
    pub loc: Location,
}

/// Result of analysing one chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub block: Block,
    pub comments: CommentMap,
    pub errors: Vec<ParseError>,
}

impl Analysis {
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
