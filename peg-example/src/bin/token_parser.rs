//! Lexes expressions into tokens, then parses the token stream.
//!
//! On a syntax error the rule call stack at the furthest failure is
//! printed.

use anyhow::Result;
use peg_example::TokenCalculator;
use peg_framework::ParseOptions;

const SAMPLES: [&str; 4] = ["1 + 2 * 3", "-(4 - 6) ^ 2", "2 * (3 + ", "1 2"];

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let expressions: Vec<&str> = if args.is_empty() {
        SAMPLES.to_vec()
    } else {
        args.iter().map(String::as_str).collect()
    };

    let calculator = TokenCalculator::new()?;
    let options = ParseOptions::default().with_call_stack(true);

    for text in expressions {
        println!("Expression: {text}");
        let tokens = match calculator.tokenize(text) {
            Ok(tokens) => tokens,
            Err(error) => {
                println!("  Lex error: {error:#}\n");
                continue;
            }
        };
        for (i, token) in tokens.iter().enumerate() {
            println!("  Token {i}: {:?} at {:?}", token.kind, token.span);
        }

        let result = calculator.run(&tokens, &options)?;
        if result.full_match() {
            match calculator.parse(text) {
                Ok(parsed) => println!("  AST: {}\n  Value: {}", parsed.expr, parsed.expr.eval()),
                Err(error) => println!("  Error: {error:#}"),
            }
        } else {
            let index = result.error_position().unwrap_or_default();
            let offset = tokens.get(index).map_or(text.len(), |token| token.span.start);
            println!("  Syntax error at token {index} (offset {offset})");
            if let Some(report) = result.call_stack_report(calculator.grammar()) {
                print!("{report}");
            }
        }
        println!();
    }

    Ok(())
}
