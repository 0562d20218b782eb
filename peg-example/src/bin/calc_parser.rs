//! Parses and evaluates arithmetic expressions straight from text.
//!
//! Pass expressions as arguments, or run without arguments for a set of
//! samples. Set `RUST_LOG=debug` to see the engine's logging.

use anyhow::Result;
use peg_example::TextCalculator;

const SAMPLES: [&str; 8] = [
    "3 + 4",
    "2 * 3.14",
    "(1 + 2) * 3",
    "2 ^ 3 ^ 2",
    "10 / 2.5",
    "-5",
    "3 + 4 * 5",
    "((1 + 2) * (3 - 4)) / 2",
];

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let expressions: Vec<&str> = if args.is_empty() {
        SAMPLES.to_vec()
    } else {
        args.iter().map(String::as_str).collect()
    };

    let calculator = TextCalculator::new()?;
    println!("=== Calculator ===\n");

    for text in expressions {
        println!("Expression: {text}");
        println!("{}", "=".repeat(50));
        match calculator.parse(text) {
            Ok(parsed) => {
                println!("  Parenthesized: {}", parsed.expr);
                println!("  Tree:");
                for line in parsed.expr.tree().lines() {
                    println!("    {line}");
                }
                println!("  Value: {}", parsed.expr.eval());
                println!("  Deepest nesting: {}", parsed.max_nesting);
            }
            Err(error) => println!("  Error: {error:#}"),
        }
        println!();
    }

    Ok(())
}
