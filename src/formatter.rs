//! Renders the AST back to Lua-like text.
//!
//! Every unary and binary expression is fully parenthesised so the tree
//! shape is visible, and desugared Mooc constructs are printed in their
//! canonical form. Blocks use tab indentation.

use std::fmt::Write as _;

use crate::ast::{
    AssignStat, Attribute, Block, ClassKind, DoKind, Exp, ExpKind, FunctionCall, FunctionDef,
    IfStat, ImportDecl, LocalDecl, Param, Stat, UnaryOp,
};

/// Format a block as a chunk.
#[must_use]
pub fn format(block: &Block) -> String {
    let mut out = String::new();
    write_block(&mut out, block, 0);
    out
}

/// Format a single expression on one line (function bodies excepted).
#[must_use]
pub fn format_exp(exp: &Exp) -> String {
    let mut out = String::new();
    write_exp(&mut out, exp, 0);
    out
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push('\t');
    }
}

fn write_block(out: &mut String, block: &Block, depth: usize) {
    for stat in &block.stats {
        indent(out, depth);
        write_stat(out, stat, depth);
        out.push('\n');
    }
    if let Some(returns) = &block.returns {
        indent(out, depth);
        out.push_str("return");
        if !returns.is_empty() {
            out.push(' ');
            write_exp_list(out, returns, depth);
        }
        out.push('\n');
    }
}

/// Nested block followed by the closing keyword at `depth`.
fn write_body(out: &mut String, body: &Block, depth: usize, close: &str) {
    out.push('\n');
    write_block(out, body, depth + 1);
    indent(out, depth);
    out.push_str(close);
}

fn write_stat(out: &mut String, stat: &Stat, depth: usize) {
    match stat {
        Stat::Empty => out.push(';'),
        Stat::Break { .. } => out.push_str("break"),
        Stat::Label { name, .. } => {
            let _ = write!(out, "::{name}::");
        }
        Stat::Goto { name, .. } => {
            let _ = write!(out, "goto {name}");
        }
        Stat::Do { kind, body, .. } => {
            if *kind == DoKind::Defer {
                out.push_str("defer ");
            }
            out.push_str("do");
            write_body(out, body, depth, "end");
        }
        Stat::While { cond, body, .. } => {
            out.push_str("while ");
            write_exp(out, cond, depth);
            out.push_str(" do");
            write_body(out, body, depth, "end");
        }
        Stat::Repeat { body, cond, .. } => {
            out.push_str("repeat");
            write_body(out, body, depth, "until ");
            write_exp(out, cond, depth);
        }
        Stat::If(stat) => write_if(out, stat, depth),
        Stat::ForNumeric(stat) => {
            let _ = write!(out, "for {} = ", stat.var.name);
            write_exp(out, &stat.init, depth);
            out.push_str(", ");
            write_exp(out, &stat.limit, depth);
            out.push_str(", ");
            write_exp(out, &stat.step, depth);
            out.push_str(" do");
            write_body(out, &stat.body, depth, "end");
        }
        Stat::ForIn(stat) => {
            out.push_str("for ");
            write_names(out, &stat.vars);
            out.push_str(" in ");
            write_exp_list(out, &stat.iterables, depth);
            out.push_str(" do");
            write_body(out, &stat.body, depth, "end");
        }
        Stat::Assign(stat) => write_assign(out, stat, depth),
        Stat::LocalDecl(decl) => write_local(out, decl, depth),
        Stat::LocalFunction { name, func, .. } => {
            let _ = write!(out, "local function {}", name.name);
            write_function_tail(out, func, depth);
        }
        Stat::Call { call, .. } => write_call(out, call, depth),
        Stat::Class(decl) => {
            let keyword = match decl.kind {
                ClassKind::Class => "class",
                ClassKind::Struct => "struct",
                ClassKind::Extension => "extension",
            };
            let _ = write!(out, "{keyword} ");
            write_assign(out, &decl.class, depth);
            out.push('\n');
            for var in &decl.vars {
                indent(out, depth + 1);
                write_local(out, var, depth + 1);
                out.push('\n');
            }
            for member in &decl.members {
                indent(out, depth + 1);
                write_assign(out, member, depth + 1);
                out.push('\n');
            }
            indent(out, depth);
            out.push_str("end");
        }
        Stat::Import(ImportDecl::Require { call, .. }) => write_call(out, call, depth),
        Stat::Import(ImportDecl::Bind(decl)) => write_local(out, decl, depth),
        Stat::ExportAll { .. } => out.push_str("export *"),
        Stat::Switch(decl) => {
            write_local(out, &decl.subject, depth);
            out.push('\n');
            indent(out, depth);
            write_if(out, &decl.cases, depth);
        }
    }
}

fn write_if(out: &mut String, stat: &IfStat, depth: usize) {
    for (i, (cond, body)) in stat.conditions.iter().zip(&stat.bodies).enumerate() {
        out.push_str(if i == 0 { "if " } else { "elseif " });
        write_exp(out, cond, depth);
        out.push_str(" then\n");
        write_block(out, body, depth + 1);
        indent(out, depth);
    }
    out.push_str("end");
}

fn write_assign(out: &mut String, stat: &AssignStat, depth: usize) {
    if stat.attribute == Attribute::Export {
        out.push_str("export ");
    }
    write_exp_list(out, &stat.targets, depth);
    out.push_str(" = ");
    write_exp_list(out, &stat.values, depth);
}

fn write_local(out: &mut String, decl: &LocalDecl, depth: usize) {
    out.push_str("local ");
    for (i, name) in decl.names.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&name.name);
        match decl.attributes.get(i) {
            Some(Attribute::Const) => out.push_str(" <const>"),
            Some(Attribute::Close) => out.push_str(" <close>"),
            Some(Attribute::Export) => out.push_str(" <export>"),
            Some(Attribute::Regular) | None => {}
        }
    }
    if !decl.values.is_empty() {
        out.push_str(" = ");
        write_exp_list(out, &decl.values, depth);
    }
}

fn write_names(out: &mut String, names: &[Param]) {
    for (i, name) in names.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&name.name);
    }
}

fn write_exp_list(out: &mut String, exps: &[Exp], depth: usize) {
    for (i, exp) in exps.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_exp(out, exp, depth);
    }
}

fn write_call(out: &mut String, call: &FunctionCall, depth: usize) {
    write_exp(out, &call.callee, depth);
    if let Some(method) = &call.method {
        let _ = write!(out, ":{}", method.name);
    }
    out.push('(');
    write_exp_list(out, &call.args, depth);
    out.push(')');
}

fn write_function_tail(out: &mut String, func: &FunctionDef, depth: usize) {
    out.push('(');
    write_names(out, &func.params);
    if func.is_vararg {
        if !func.params.is_empty() {
            out.push_str(", ");
        }
        out.push_str("...");
    }
    out.push(')');
    write_body(out, &func.body, depth, "end");
}

fn write_string(out: &mut String, value: &str) {
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
}

fn write_exp(out: &mut String, exp: &Exp, depth: usize) {
    match &exp.kind {
        ExpKind::Nil => out.push_str("nil"),
        ExpKind::True => out.push_str("true"),
        ExpKind::False => out.push_str("false"),
        ExpKind::Vararg => out.push_str("..."),
        ExpKind::Integer(value) => {
            let _ = write!(out, "{value}");
        }
        ExpKind::Float(value) => {
            let _ = write!(out, "{value:?}");
        }
        ExpKind::String(value) => write_string(out, value),
        ExpKind::Name(name) => out.push_str(name),
        ExpKind::Unary { op, operand } => {
            out.push('(');
            out.push_str(op.as_str());
            if *op == UnaryOp::Not {
                out.push(' ');
            }
            write_exp(out, operand, depth);
            out.push(')');
        }
        ExpKind::Binary { op, left, right } => {
            out.push('(');
            write_exp(out, left, depth);
            let _ = write!(out, " {op} ");
            write_exp(out, right, depth);
            out.push(')');
        }
        ExpKind::Table { keys, values } => {
            out.push('{');
            for (i, (key, value)) in keys.iter().zip(values).enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                if let Some(key) = key {
                    out.push('[');
                    write_exp(out, key, depth);
                    out.push_str("] = ");
                }
                write_exp(out, value, depth);
            }
            out.push('}');
        }
        ExpKind::Function(func) => {
            out.push_str("function");
            write_function_tail(out, func, depth);
        }
        ExpKind::Call(call) => write_call(out, call, depth),
        ExpKind::Index { object, key } => {
            write_exp(out, object, depth);
            out.push('[');
            write_exp(out, key, depth);
            out.push(']');
        }
        ExpKind::Paren(inner) => {
            out.push('(');
            write_exp(out, inner, depth);
            out.push(')');
        }
        ExpKind::Bad => out.push_str("<bad>"),
    }
}
