#![allow(dead_code)]

use luaparse::{
    Analysis, AssignStat, Block, Exp, ExpKind, FunctionCall, FunctionDef, IfStat, ImportDecl,
    LocalDecl, Location, Param, Stat, begin_analyze, format,
};

pub fn lua(source: &str) -> Analysis {
    begin_analyze(source.as_bytes(), "test.lua")
}

pub fn mooc(source: &str) -> Analysis {
    begin_analyze(source.as_bytes(), "test.mooc")
}

/// Parse as Lua and require a clean result.
pub fn clean_lua(source: &str) -> Block {
    expect_clean(lua(source), source)
}

/// Parse as Mooc and require a clean result.
pub fn clean_mooc(source: &str) -> Block {
    expect_clean(mooc(source), source)
}

fn expect_clean(analysis: Analysis, source: &str) -> Block {
    assert!(
        analysis.errors.is_empty(),
        "unexpected errors: {:?}\n--- source ---\n{source}",
        analysis.errors
    );
    analysis.block
}

/// Formatted output of a clean Lua parse.
pub fn dump_lua(source: &str) -> String {
    format(&clean_lua(source))
}

/// Formatted output of a clean Mooc parse.
pub fn dump_mooc(source: &str) -> String {
    format(&clean_mooc(source))
}

/// Error messages without locations.
pub fn messages(analysis: &Analysis) -> Vec<&str> {
    analysis.errors.iter().map(|e| e.message.as_str()).collect()
}

/// Assert that every located node lies inside its parent's range.
///
/// Synthetic (all zero) locations are skipped.
pub fn assert_nested_locations(block: &Block) {
    let mut walker = LocWalker::default();
    walker.block(block);
    assert!(
        walker.escapes.is_empty(),
        "nodes escape their parent:\n{}",
        walker.escapes.join("\n")
    );
}

#[derive(Default)]
struct LocWalker {
    escapes: Vec<String>,
}

impl LocWalker {
    fn check(&mut self, parent: Location, child: Location, what: &str) {
        if parent.is_synthetic() || child.is_synthetic() {
            return;
        }
        if !parent.contains(&child) {
            self.escapes.push(format!("{what} {child} not in {parent}"));
        }
    }

    fn block(&mut self, block: &Block) {
        for stat in &block.stats {
            if let Some(loc) = stat.loc() {
                self.check(block.loc, loc, "statement");
                self.stat(stat, loc);
            }
        }
        for exp in block.returns.iter().flatten() {
            self.exp_in(block.loc, exp);
        }
    }

    fn block_in(&mut self, parent: Location, block: &Block) {
        self.check(parent, block.loc, "block");
        self.block(block);
    }

    fn param_in(&mut self, parent: Location, param: &Param) {
        self.check(parent, param.loc, &format!("name '{}'", param.name));
    }

    fn exps_in(&mut self, parent: Location, exps: &[Exp]) {
        for exp in exps {
            self.exp_in(parent, exp);
        }
    }

    fn exp_in(&mut self, parent: Location, exp: &Exp) {
        self.check(parent, exp.loc, "expression");
        let loc = exp.loc;
        match &exp.kind {
            ExpKind::Unary { operand, .. } | ExpKind::Paren(operand) => {
                self.exp_in(loc, operand);
            }
            ExpKind::Binary { left, right, .. } => {
                self.exp_in(loc, left);
                self.exp_in(loc, right);
            }
            ExpKind::Index { object, key } => {
                self.exp_in(loc, object);
                self.exp_in(loc, key);
            }
            ExpKind::Table { keys, values } => {
                for key in keys.iter().flatten() {
                    self.exp_in(loc, key);
                }
                self.exps_in(loc, values);
            }
            ExpKind::Function(func) => self.function_in(loc, func),
            ExpKind::Call(call) => self.call_in(loc, call),
            _ => {}
        }
    }

    fn call_in(&mut self, parent: Location, call: &FunctionCall) {
        self.exp_in(parent, &call.callee);
        if let Some(method) = &call.method {
            self.param_in(parent, method);
        }
        self.exps_in(parent, &call.args);
    }

    fn function_in(&mut self, parent: Location, func: &FunctionDef) {
        for param in &func.params {
            self.param_in(parent, param);
        }
        self.block_in(parent, &func.body);
    }

    fn assign_in(&mut self, parent: Location, assign: &AssignStat) {
        self.check(parent, assign.loc, "assignment");
        self.exps_in(assign.loc, &assign.targets);
        self.exps_in(assign.loc, &assign.values);
    }

    fn local_in(&mut self, parent: Location, decl: &LocalDecl) {
        self.check(parent, decl.loc, "local declaration");
        for name in &decl.names {
            self.param_in(decl.loc, name);
        }
        self.exps_in(decl.loc, &decl.values);
    }

    fn if_in(&mut self, parent: Location, stat: &IfStat) {
        self.check(parent, stat.loc, "if");
        self.exps_in(stat.loc, &stat.conditions);
        for body in &stat.bodies {
            self.block_in(stat.loc, body);
        }
    }

    fn stat(&mut self, stat: &Stat, loc: Location) {
        match stat {
            Stat::Do { body, .. } => self.block_in(loc, body),
            Stat::While { cond, body, .. } | Stat::Repeat { body, cond, .. } => {
                self.exp_in(loc, cond);
                self.block_in(loc, body);
            }
            Stat::If(stat) => self.if_in(loc, stat),
            Stat::ForNumeric(stat) => {
                self.param_in(loc, &stat.var);
                self.exp_in(loc, &stat.init);
                self.exp_in(loc, &stat.limit);
                self.exp_in(loc, &stat.step);
                self.block_in(loc, &stat.body);
            }
            Stat::ForIn(stat) => {
                for var in &stat.vars {
                    self.param_in(loc, var);
                }
                self.exps_in(loc, &stat.iterables);
                self.block_in(loc, &stat.body);
            }
            Stat::Assign(assign) => self.assign_in(loc, assign),
            Stat::LocalDecl(decl) | Stat::Import(ImportDecl::Bind(decl)) => {
                self.local_in(loc, decl);
            }
            Stat::LocalFunction { name, func, .. } => {
                self.param_in(loc, name);
                self.function_in(loc, func);
            }
            Stat::Call { call, .. } => self.call_in(loc, call),
            Stat::Import(ImportDecl::Require { call, .. }) => self.call_in(loc, call),
            Stat::Class(decl) => {
                self.assign_in(loc, &decl.class);
                self.exp_in(loc, &decl.super_class);
                for var in &decl.vars {
                    self.local_in(loc, var);
                }
                for member in &decl.members {
                    self.assign_in(loc, member);
                }
            }
            Stat::Switch(decl) => {
                self.local_in(loc, &decl.subject);
                self.if_in(loc, &decl.cases);
            }
            Stat::Empty
            | Stat::Break { .. }
            | Stat::Label { .. }
            | Stat::Goto { .. }
            | Stat::ExportAll { .. } => {}
        }
    }
}
