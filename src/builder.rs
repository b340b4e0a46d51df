use crate::ast::{
    AssignStat, Attribute, BinaryOp, Block, Exp, ExpKind, FunctionCall, IfStat, LocalDecl, Param,
    UnaryOp,
};
use crate::token::Location;

/// Local that holds the subject of a desugared `switch`.
pub const SWITCH_SUBJECT: &str = "__sw__";

/// Local bound to the parent of a desugared class, next to `Super`.
pub const CLASS_PARENT: &str = "__st";

/// Label targeted by `continue` at the given loop depth.
#[must_use]
pub fn continue_label(depth: u32) -> String {
    format!("__continue{depth}")
}

impl Exp {
    #[must_use]
    pub fn name(name: impl Into<String>, loc: Location) -> Self {
        Self::new(ExpKind::Name(name.into()), loc)
    }

    #[must_use]
    pub fn string(value: impl Into<String>, loc: Location) -> Self {
        Self::new(ExpKind::String(value.into()), loc)
    }

    #[must_use]
    pub const fn integer(value: i64, loc: Location) -> Self {
        Self::new(ExpKind::Integer(value), loc)
    }

    #[must_use]
    pub const fn nil(loc: Location) -> Self {
        Self::new(ExpKind::Nil, loc)
    }

    #[must_use]
    pub const fn truth(loc: Location) -> Self {
        Self::new(ExpKind::True, loc)
    }

    #[must_use]
    pub const fn bad(loc: Location) -> Self {
        Self::new(ExpKind::Bad, loc)
    }

    #[must_use]
    pub const fn empty_table(loc: Location) -> Self {
        Self::new(
            ExpKind::Table {
                keys: Vec::new(),
                values: Vec::new(),
            },
            loc,
        )
    }

    #[must_use]
    pub fn unary(op: UnaryOp, operand: Self, loc: Location) -> Self {
        Self::new(
            ExpKind::Unary {
                op,
                operand: Box::new(operand),
            },
            loc,
        )
    }

    #[must_use]
    pub fn binary(op: BinaryOp, left: Self, right: Self, loc: Location) -> Self {
        Self::new(
            ExpKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            loc,
        )
    }

    #[must_use]
    pub fn index(object: Self, key: Self, loc: Location) -> Self {
        Self::new(
            ExpKind::Index {
                object: Box::new(object),
                key: Box::new(key),
            },
            loc,
        )
    }

    /// `object.name`, with the key placed at `key_loc`.
    #[must_use]
    pub fn field(object: Self, name: &str, key_loc: Location) -> Self {
        let loc = Location::merge(&object.loc, &key_loc);
        Self::index(object, Self::string(name, key_loc), loc)
    }

    #[must_use]
    pub fn call(call: FunctionCall, loc: Location) -> Self {
        Self::new(ExpKind::Call(Box::new(call)), loc)
    }

    #[must_use]
    pub fn paren(inner: Self, loc: Location) -> Self {
        Self::new(ExpKind::Paren(Box::new(inner)), loc)
    }
}

impl FunctionCall {
    #[must_use]
    pub const fn new(callee: Exp) -> Self {
        Self {
            callee,
            method: None,
            args: Vec::new(),
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: Exp) -> Self {
        self.args.push(arg);
        self
    }

    /// `require("lib")`.
    #[must_use]
    pub fn require(lib: &str, callee_loc: Location, lib_loc: Location) -> Self {
        Self::new(Exp::name("require", callee_loc)).arg(Exp::string(lib, lib_loc))
    }
}

impl AssignStat {
    #[must_use]
    pub fn new(target: Exp, value: Exp, loc: Location) -> Self {
        Self {
            targets: vec![target],
            values: vec![value],
            attribute: Attribute::Regular,
            loc,
        }
    }

    #[must_use]
    pub const fn attribute(mut self, attribute: Attribute) -> Self {
        self.attribute = attribute;
        self
    }
}

impl LocalDecl {
    #[must_use]
    pub const fn new(loc: Location) -> Self {
        Self {
            names: Vec::new(),
            attributes: Vec::new(),
            values: Vec::new(),
            loc,
        }
    }

    /// Add a name with its attribute.
    #[must_use]
    pub fn bind(mut self, name: Param, attribute: Attribute) -> Self {
        self.names.push(name);
        self.attributes.push(attribute);
        self
    }

    #[must_use]
    pub fn value(mut self, value: Exp) -> Self {
        self.values.push(value);
        self
    }
}

impl IfStat {
    #[must_use]
    pub const fn new(loc: Location) -> Self {
        Self {
            conditions: Vec::new(),
            bodies: Vec::new(),
            loc,
        }
    }

    #[must_use]
    pub fn branch(mut self, condition: Exp, body: Block) -> Self {
        self.conditions.push(condition);
        self.bodies.push(body);
        self
    }
}

/// `target = target op (value)` for compound assignment.
#[must_use]
pub fn compound_assign(op: BinaryOp, target: Exp, value: Exp, loc: Location) -> AssignStat {
    let right = Exp::paren(value.clone(), value.loc);
    let combined = Exp::binary(op, target.clone(), right, loc);
    AssignStat::new(target, combined, loc)
}

/// Guard condition: the body runs when `cond` does not hold.
#[must_use]
pub fn negate(cond: Exp, loc: Location) -> Exp {
    let inner = Exp::paren(cond.clone(), cond.loc);
    Exp::unary(UnaryOp::Not, inner, loc)
}

/// `__sw__ == v1 or __sw__ == v2 ...` for one `case` label list.
///
/// Returns `None` for an empty list.
#[must_use]
pub fn switch_case(values: Vec<Exp>) -> Option<Exp> {
    values
        .into_iter()
        .map(|value| {
            let loc = value.loc;
            Exp::binary(BinaryOp::Eq, Exp::name(SWITCH_SUBJECT, loc), value, loc)
        })
        .reduce(|acc, next| {
            let loc = Location::merge(&acc.loc, &next.loc);
            Exp::binary(BinaryOp::Or, acc, next, loc)
        })
}

/// Member `key` of an imported library: `require("lib").key` or `tbl.key`.
#[must_use]
pub fn import_member(source: &ImportSource, key: &str, loc: Location) -> Exp {
    let object = match source {
        ImportSource::Library(lib) => {
            Exp::call(FunctionCall::require(lib, loc, loc), loc)
        }
        ImportSource::Table(table) => Exp::name(table.as_str(), loc),
    };
    Exp::index(object, Exp::string(key, loc), loc)
}

/// Where `import ... from` takes its values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportSource {
    /// `from "lib"`
    Library(String),
    /// `from tbl`
    Table(String),
}
