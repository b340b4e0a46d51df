//! CLI tool to check and inspect Lua and Mooc chunks.

use std::fs;
use std::process::ExitCode;

use luaparse::{Dialect, analyze_file, begin_analyze_exp, format, format_exp, tokenize};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        eprintln!("Usage: luaparse <command> [files...]");
        eprintln!();
        eprintln!("Commands:");
        eprintln!("  check   Report syntax errors in the given chunks");
        eprintln!("  dump    Print the parsed (and desugared) chunks");
        eprintln!("  tokens  Print the token stream of the given chunks");
        eprintln!("  expr    Parse each argument as a Lua expression");
        eprintln!();
        eprintln!("Files ending in .mooc are parsed as Mooc, all others as Lua.");
        eprintln!("Set RUST_LOG=debug for parser tracing.");
        return ExitCode::from(2);
    }

    let command = args[1].as_str();
    let inputs = &args[2..];

    if inputs.is_empty() {
        eprintln!("Error: no input specified");
        return ExitCode::from(2);
    }

    let mut had_error = false;

    for input in inputs {
        match command {
            "check" => {
                let analysis = analyze_file(input);
                if analysis.has_errors() {
                    for err in &analysis.errors {
                        eprintln!("{input}: {err}");
                    }
                    had_error = true;
                } else {
                    eprintln!(
                        "{input}: ok ({} statement(s), {} comment(s))",
                        analysis.block.stats.len(),
                        analysis.comments.len()
                    );
                }
            }
            "dump" => {
                let analysis = analyze_file(input);
                for err in &analysis.errors {
                    eprintln!("{input}: {err}");
                }
                had_error |= analysis.has_errors();
                print!("{}", format(&analysis.block));
            }
            "tokens" => {
                let source = match fs::read(input) {
                    Ok(source) => source,
                    Err(e) => {
                        eprintln!("{input}: {e}");
                        had_error = true;
                        continue;
                    }
                };
                match tokenize(&source, Dialect::from_chunk_name(input)) {
                    Ok(tokens) => {
                        for token in tokens {
                            println!("{}\t{}\t{}", token.loc, token.kind, token.text);
                        }
                    }
                    Err(e) => {
                        eprintln!("{input}: {e}");
                        had_error = true;
                    }
                }
            }
            "expr" => match begin_analyze_exp(input.as_bytes()) {
                Some(exp) if !exp.is_bad() => println!("{}", format_exp(&exp)),
                _ => {
                    eprintln!("{input}: not an expression");
                    had_error = true;
                }
            },
            _ => {
                eprintln!("Unknown command: {command}");
                return ExitCode::from(2);
            }
        }
    }

    if had_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
