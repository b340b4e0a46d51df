//! Property-based tests with proptest.
//!
//! Expressions are generated as source text together with the output the
//! formatter must produce for them, so operator precedence and paren
//! handling are checked against an independent model.

mod common;

use common::assert_nested_locations;
use luaparse::{ExpKind, begin_analyze, begin_analyze_exp, format_exp};
use proptest::prelude::*;

// -- Leaf strategies --

/// Identifier that can never collide with a keyword.
fn name() -> impl Strategy<Value = String> {
    "v[a-z0-9_]{0,6}".prop_map(|s| s)
}

fn binary_op() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "+", "-", "*", "/", "//", "%", "^", "..", "==", "~=", "<", "<=", ">", ">=", "and",
        "or", "&", "|", "~", "<<", ">>",
    ])
}

/// Fully parenthesised expression: `(source, formatted)`.
fn parenthesised(depth: u32) -> impl Strategy<Value = (String, String)> {
    let leaf = prop_oneof![
        name().prop_map(|n| (n.clone(), n)),
        any::<u32>().prop_map(|n| (n.to_string(), n.to_string())),
    ];
    leaf.prop_recursive(depth, 32, 2, |inner| {
        (inner.clone(), binary_op(), inner).prop_map(|((ls, lf), op, (rs, rf))| {
            (
                std::format!("({ls} {op} {rs})"),
                std::format!("(({lf} {op} {rf}))"),
            )
        })
    })
}

// -- Property tests --

proptest! {
    /// Arbitrary input never panics and respects the error cap.
    #[test]
    fn arbitrary_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        for chunk in ["fuzz.lua", "fuzz.mooc"] {
            let analysis = begin_analyze(&bytes, chunk);
            prop_assert!(analysis.errors.len() <= 31);
        }
    }

    /// Parsing the same bytes twice gives the same tree and errors.
    #[test]
    fn reparse_is_deterministic(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let first = begin_analyze(&bytes, "again.mooc");
        let second = begin_analyze(&bytes, "again.mooc");
        prop_assert_eq!(first, second);
    }

    #[test]
    fn integer_literals(n in any::<u32>()) {
        let source = n.to_string();
        let parsed = begin_analyze_exp(source.as_bytes()).expect("expression");
        prop_assert_eq!(parsed.kind, ExpKind::Integer(i64::from(n)));
    }

    /// `a - b - c ...` nests to the left.
    #[test]
    fn subtraction_chain_nests_left(names in prop::collection::vec(name(), 2..8)) {
        let source = names.join(" - ");
        let expected = names[1..]
            .iter()
            .fold(names[0].clone(), |acc, n| std::format!("({acc} - {n})"));
        let parsed = begin_analyze_exp(source.as_bytes()).expect("expression");
        prop_assert_eq!(format_exp(&parsed), expected);
    }

    /// Explicit parens are kept as paren nodes and bind tighter than any operator.
    #[test]
    fn parenthesised_expressions((source, expected) in parenthesised(4)) {
        let analysis = begin_analyze(std::format!("x = {source}").as_bytes(), "p.lua");
        prop_assert!(analysis.errors.is_empty(), "{:?}", analysis.errors);
        assert_nested_locations(&analysis.block);
        let parsed = begin_analyze_exp(source.as_bytes()).expect("expression");
        prop_assert_eq!(format_exp(&parsed), expected);
    }

    /// Statement ranges are ordered and lie inside the chunk range.
    #[test]
    fn statement_locations_are_ordered(
        stats in prop::collection::vec((name(), any::<u16>()), 1..12)
    ) {
        let source: String = stats
            .iter()
            .map(|(n, v)| std::format!("{n} = {v}\n"))
            .collect();
        let analysis = begin_analyze(source.as_bytes(), "loc.lua");
        prop_assert!(analysis.errors.is_empty());
        let block = analysis.block;
        assert_nested_locations(&block);
        prop_assert_eq!(block.stats.len(), stats.len());

        let mut previous = 0;
        for (i, stat) in block.stats.iter().enumerate() {
            let loc = stat.loc().expect("located statement");
            prop_assert_eq!(loc.start_line, i + 1);
            prop_assert!(loc.start_line > previous);
            prop_assert!(block.loc.contains(&loc));
            previous = loc.start_line;
        }
    }

    /// The collector keeps errors up to the cap and aborts on the next.
    #[test]
    fn error_count_is_capped(n in 0usize..60) {
        let source = "goto 1\n".repeat(n);
        let analysis = begin_analyze(source.as_bytes(), "cap.lua");
        prop_assert_eq!(analysis.errors.len(), n.min(31));
    }
}
