//! Error collection, recovery and abort behaviour.

mod common;

use common::{lua, messages, mooc};
use luaparse::{
    Error, Location, Parser, ParserConfig, TOO_MANY_ERRORS, analyze_file, parse_str,
};

fn gotos(count: usize) -> String {
    "goto 1\n".repeat(count)
}

// -----------------------------------------------------------
// Error cap.
// -----------------------------------------------------------

#[test]
fn thirty_errors_are_kept() {
    let analysis = lua(&gotos(30));
    assert_eq!(analysis.errors.len(), 30);
    assert!(analysis.errors.iter().all(|e| !e.message.contains(TOO_MANY_ERRORS)));
    assert_eq!(analysis.block.stats.len(), 30);
}

#[test]
fn thirty_first_error_aborts() {
    let analysis = lua(&gotos(35));
    assert_eq!(analysis.errors.len(), 31);
    let last = analysis.errors.last().expect("errors");
    assert_eq!(last.message, "<name> expected near '1'(too many errors...)");
    assert_eq!(last.loc.start_line, 31);
    assert!(analysis.block.stats.is_empty());
}

#[test]
fn configurable_cap() {
    let config = ParserConfig::default().max_errors(2);
    let source = gotos(10);
    let analysis = Parser::with_config(source.as_bytes(), "a.lua", config).begin_analyze();
    assert_eq!(analysis.errors.len(), 3);
}

#[test]
fn errors_are_in_source_order() {
    let analysis = lua("goto 1\nlocal 2\nbreak");
    let lines: Vec<_> = analysis.errors.iter().map(|e| e.loc.start_line).collect();
    assert_eq!(lines, vec![1, 2, 3]);
}

#[test]
fn lookahead_lexical_errors_keep_source_order() {
    // The `{` scan for an anonymous function lexes the broken string
    // before the missing `}` is reported.
    let analysis = mooc("t = { a, b c \"abc\n");
    let messages = messages(&analysis);
    assert_eq!(messages[..2], ["'}' expected near 'c'", "unfinished string"]);

    let positions: Vec<_> = analysis
        .errors
        .iter()
        .map(|e| (e.loc.start_line, e.loc.start_column))
        .collect();
    let mut sorted = positions.clone();
    sorted.sort_unstable();
    assert_eq!(positions, sorted);
}

// -----------------------------------------------------------
// Recovery.
// -----------------------------------------------------------

#[test]
fn lexical_errors_are_collected() {
    let analysis = lua("x = \"abc\ny = 2");
    assert_eq!(messages(&analysis), vec!["unfinished string"]);
    assert_eq!(analysis.block.stats.len(), 2);
}

#[test]
fn illegal_character_is_skipped() {
    let analysis = lua("x = 1 @ y = 2");
    assert_eq!(messages(&analysis), vec!["unexpected symbol near '@'"]);
    assert_eq!(analysis.block.stats.len(), 2);
}

#[test]
fn parsing_continues_after_error() {
    let analysis = lua("local = 1\nprint('ok')");
    assert!(analysis.has_errors());
    assert!(
        analysis
            .block
            .stats
            .iter()
            .any(|s| matches!(s, luaparse::Stat::Call { .. }))
    );
}

#[test]
fn lua_function_keyword_in_mooc() {
    let analysis = mooc("local function = 1");
    assert!(analysis.has_errors());
}

// -----------------------------------------------------------
// Nesting limit.
// -----------------------------------------------------------

#[test]
fn nesting_limit_aborts() {
    let config = ParserConfig::default().max_nesting(5);
    let mut parser = Parser::with_config(b"x = ((((((1))))))", "deep.lua", config);
    let analysis = parser.begin_analyze();
    assert_eq!(
        messages(&analysis),
        vec!["chunk has too many syntax levels"]
    );
    assert!(analysis.block.stats.is_empty());
}

#[test]
fn deeply_nested_parens_stop_at_limit() {
    let depth = 100_000;
    let source = format!("x = {}1{}", "(".repeat(depth), ")".repeat(depth));
    assert_eq!(
        messages(&lua(&source)),
        vec!["chunk has too many syntax levels"]
    );
}

#[test]
fn nested_blocks_count_towards_limit() {
    let source = format!("{}{}", "do ".repeat(300), "end ".repeat(300));
    assert_eq!(
        messages(&lua(&source)),
        vec!["chunk has too many syntax levels"]
    );
}

fn nested_tables(depth: usize) -> String {
    format!("x = {}1{}", "{".repeat(depth), "}".repeat(depth))
}

#[test]
fn nested_tables_within_limit_parse() {
    let analysis = lua(&nested_tables(90));
    assert!(!analysis.has_errors(), "{:?}", analysis.errors);
    assert_eq!(analysis.block.stats.len(), 1);
}

#[test]
fn nested_tables_past_limit_abort() {
    for depth in [150, 190, 100_000] {
        let analysis = lua(&nested_tables(depth));
        assert_eq!(
            messages(&analysis),
            vec!["chunk has too many syntax levels"],
            "depth {depth}"
        );
    }
}

#[test]
fn nested_functions_stop_at_limit() {
    let depth = 1_000;
    let source = format!(
        "f = {}1{}",
        "function() return ".repeat(depth),
        " end".repeat(depth)
    );
    assert_eq!(
        messages(&lua(&source)),
        vec!["chunk has too many syntax levels"]
    );
}

#[test]
fn nested_mooc_blocks_stop_at_limit() {
    let source = format!("{}{}", "do { ".repeat(500), "} ".repeat(500));
    assert_eq!(
        messages(&mooc(&source)),
        vec!["chunk has too many syntax levels"]
    );
}

// -----------------------------------------------------------
// Reporting.
// -----------------------------------------------------------

#[test]
fn error_display_includes_position() {
    let analysis = lua("while x do");
    assert_eq!(
        analysis.errors[0].to_string(),
        "'end' expected near '<eof>' at line 1, column 11"
    );
    assert_eq!(analysis.errors[0].loc, Location::new(1, 11, 1, 11));
}

#[test]
fn parse_str_returns_first_error() {
    let block = parse_str("return 1", "ok.lua").expect("clean chunk");
    assert!(block.returns.is_some());

    let err = parse_str("x = = 1\ny = = 2", "bad.lua").unwrap_err();
    let Error::Parse(err) = err else {
        panic!("expected a parse error");
    };
    assert_eq!(err.message, "unexpected symbol near '='");
    assert_eq!(err.loc.start_line, 1);
}

#[test]
fn parse_str_picks_dialect_from_name() {
    assert!(parse_str("x += 1\nguard x else { return }", "m.mooc").is_ok());
    assert!(parse_str("guard x else { return }", "m.lua").is_err());
}

#[test]
fn unreadable_file_is_reported() {
    let analysis = analyze_file("/nonexistent/dir/missing.lua");
    assert_eq!(analysis.errors.len(), 1);
    assert!(analysis.errors[0].read_file_error);
    assert!(analysis.block.stats.is_empty());
}

#[test]
fn file_dialect_follows_suffix() {
    let path = std::env::temp_dir().join(format!("luaparse-{}.mooc", std::process::id()));
    std::fs::write(&path, "switch x { case 1: f() }\n").expect("write");
    let analysis = analyze_file(&path);
    std::fs::remove_file(&path).ok();
    assert!(!analysis.has_errors(), "{:?}", analysis.errors);
    assert!(matches!(analysis.block.stats[0], luaparse::Stat::Switch(_)));
}
