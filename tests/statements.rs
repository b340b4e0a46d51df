//! Lua statement parsing.

mod common;

use common::{clean_lua, dump_lua, lua, messages};
use luaparse::{Attribute, ExpKind, Location, Stat};

// -----------------------------------------------------------
// Declarations and assignment.
// -----------------------------------------------------------

#[test]
fn local_declarations() {
    assert_eq!(
        dump_lua("local a, b <const> = 1, 2"),
        "local a, b <const> = 1, 2\n"
    );
    assert_eq!(dump_lua("local x <close> = f()"), "local x <close> = f()\n");
    assert_eq!(dump_lua("local y"), "local y\n");
}

#[test]
fn local_attributes_are_recorded() {
    let block = clean_lua("local a <const>, b = 1");
    let Stat::LocalDecl(decl) = &block.stats[0] else {
        panic!("expected a local declaration");
    };
    assert_eq!(decl.attributes, vec![Attribute::Const, Attribute::Regular]);
    assert_eq!(decl.values.len(), 1);
}

#[test]
fn multiple_assignment() {
    assert_eq!(dump_lua("a, b.c = 1, 2"), "a, b[\"c\"] = 1, 2\n");
    assert_eq!(dump_lua("t[i] = nil"), "t[i] = nil\n");
}

#[test]
fn compound_assignment_in_lua() {
    assert_eq!(dump_lua("x += 1"), "x = (x + (1))\n");
    assert_eq!(dump_lua("s ..= 'a'"), "s = (s .. (\"a\"))\n");
    assert_eq!(dump_lua("t.n *= 2 + k"), "t[\"n\"] = (t[\"n\"] * ((2 + k)))\n");
}

#[test]
fn call_statements() {
    assert_eq!(dump_lua("print(1)"), "print(1)\n");
    assert_eq!(dump_lua("obj:m()"), "obj:m()\n");
    assert_eq!(dump_lua("require 'mod'"), "require(\"mod\")\n");
}

#[test]
fn empty_statements_are_dropped() {
    let block = clean_lua(";;print(1);;");
    assert_eq!(block.stats.len(), 1);
}

// -----------------------------------------------------------
// Control flow.
// -----------------------------------------------------------

#[test]
fn do_block() {
    assert_eq!(dump_lua("do local x = 1 end"), "do\n\tlocal x = 1\nend\n");
}

#[test]
fn while_loop() {
    assert_eq!(
        dump_lua("while x do x = x - 1 end"),
        "while x do\n\tx = (x - 1)\nend\n"
    );
}

#[test]
fn repeat_loop() {
    assert_eq!(
        dump_lua("repeat local y = f() until y"),
        "repeat\n\tlocal y = f()\nuntil y\n"
    );
}

#[test]
fn if_chain() {
    assert_eq!(
        dump_lua("if a then b() elseif c then d() else e() end"),
        "if a then\n\tb()\nelseif c then\n\td()\nelseif true then\n\te()\nend\n"
    );
}

#[test]
fn numeric_for_gets_default_step() {
    assert_eq!(dump_lua("for i = 1, 10 do end"), "for i = 1, 10, 1 do\nend\n");
    assert_eq!(
        dump_lua("for i = 10, 1, -1 do end"),
        "for i = 10, 1, (-1) do\nend\n"
    );

    let block = clean_lua("for i = 1, 3 do end");
    let Stat::ForNumeric(stat) = &block.stats[0] else {
        panic!("expected a numeric for");
    };
    assert!(stat.step.loc.is_synthetic());
}

#[test]
fn generic_for() {
    assert_eq!(
        dump_lua("for k, v in pairs(t) do print(k) end"),
        "for k, v in pairs(t) do\n\tprint(k)\nend\n"
    );
}

#[test]
fn goto_and_label() {
    assert_eq!(dump_lua("::top:: goto top"), "::top::\ngoto top\n");
}

#[test]
fn break_inside_loop() {
    assert_eq!(dump_lua("while true do break end"), "while true do\n\tbreak\nend\n");
}

#[test]
fn return_forms() {
    assert_eq!(dump_lua("return 1, 2;"), "return 1, 2\n");
    assert_eq!(dump_lua("return"), "return\n");
    assert_eq!(dump_lua("return;"), "return\n");

    let block = clean_lua("x = 1");
    assert!(block.returns.is_none());
}

// -----------------------------------------------------------
// Functions.
// -----------------------------------------------------------

#[test]
fn method_definition_gets_self() {
    assert_eq!(
        dump_lua("function a.b:c(x) return self end"),
        "a[\"b\"][\"c\"] = function(self, x)\n\treturn self\nend\n"
    );

    let block = clean_lua("function a.b:c(x) end");
    let Stat::Assign(assign) = &block.stats[0] else {
        panic!("expected an assignment");
    };
    let ExpKind::Function(func) = &assign.values[0].kind else {
        panic!("expected a function");
    };
    assert!(func.is_method);
    assert_eq!(func.class_name.as_deref(), Some("b"));
    assert_eq!(func.func_name.as_deref(), Some("c"));
}

#[test]
fn plain_function_names() {
    let block = clean_lua("function f() end function m.g(...) end");
    let names: Vec<_> = block
        .stats
        .iter()
        .map(|stat| {
            let Stat::Assign(assign) = stat else {
                panic!("expected an assignment");
            };
            let ExpKind::Function(func) = &assign.values[0].kind else {
                panic!("expected a function");
            };
            (func.class_name.clone(), func.func_name.clone(), func.is_vararg)
        })
        .collect();
    assert_eq!(
        names,
        vec![
            (None, Some("f".to_string()), false),
            (Some("m".to_string()), Some("g".to_string()), true),
        ]
    );
}

#[test]
fn local_function() {
    assert_eq!(
        dump_lua("local function f(a) return a end"),
        "local function f(a)\n\treturn a\nend\n"
    );
}

#[test]
fn nested_function_bodies_indent() {
    assert_eq!(
        dump_lua("local f = function() if x then return 1 end end"),
        "local f = function()\n\tif x then\n\t\treturn 1\n\tend\nend\n"
    );
}

#[test]
fn shebang_line_is_ignored() {
    assert_eq!(dump_lua("#!/usr/bin/lua\nx = 1"), "x = 1\n");
}

// -----------------------------------------------------------
// Errors.
// -----------------------------------------------------------

#[test]
fn break_outside_loop() {
    let analysis = lua("break");
    assert_eq!(
        messages(&analysis),
        vec!["break should be inside loop for/while/repeat"]
    );
    assert!(matches!(
        analysis.block.stats[..],
        [Stat::Break { loc }] if loc == Location::new(1, 1, 1, 6)
    ));
}

#[test]
fn break_does_not_cross_function() {
    let analysis = lua("for i = 1, 2 do local f = function() break end end");
    assert_eq!(analysis.errors.len(), 1);

    let Stat::ForNumeric(for_stat) = &analysis.block.stats[0] else {
        panic!("expected a numeric for");
    };
    let Stat::LocalDecl(decl) = &for_stat.body.stats[0] else {
        panic!("expected a local declaration");
    };
    let ExpKind::Function(func) = &decl.values[0].kind else {
        panic!("expected a function value");
    };
    assert!(matches!(func.body.stats[..], [Stat::Break { .. }]));
}

#[test]
fn statement_after_return() {
    let analysis = lua("return 1 x = 2");
    assert_eq!(messages(&analysis)[0], "'<eof>' expected near 'x'");
}

#[test]
fn bare_expression_statement() {
    let analysis = lua("x");
    assert_eq!(messages(&analysis), vec!["'=' expected near '<eof>'"]);
    assert!(analysis.block.stats.is_empty());
}

#[test]
fn compound_assignment_needs_one_target() {
    let analysis = lua("a, b += 1");
    assert_eq!(
        messages(&analysis),
        vec!["compound assignment needs exactly one target"]
    );
}

#[test]
fn dangling_operator() {
    let analysis = lua("x + 1");
    assert_eq!(
        messages(&analysis)[0],
        "expression cannot be used as a statement"
    );
}

#[test]
fn unknown_attribute() {
    let analysis = lua("local x <foo> = 1");
    assert_eq!(
        messages(&analysis),
        vec!["unrecognized local variable attribute 'foo'"]
    );
}

#[test]
fn two_to_be_closed_variables() {
    let analysis = lua("local a <close>, b <close> = f()");
    assert_eq!(
        messages(&analysis),
        vec!["more than one to-be-closed variable in local list"]
    );
}

#[test]
fn assignment_to_parenthesised_name() {
    let analysis = lua("(a) = 1");
    assert_eq!(messages(&analysis), vec!["cannot assign to this expression"]);
    let Stat::Assign(assign) = &analysis.block.stats[0] else {
        panic!("expected an assignment");
    };
    assert!(assign.targets[0].is_bad());
}

#[test]
fn missing_end() {
    let analysis = lua("while x do");
    assert_eq!(messages(&analysis), vec!["'end' expected near '<eof>'"]);
}
