//! Minimal parser example.
//!
//! Demonstrates the peg-framework workflow:
//! 1. Define tokens.
//! 2. Define AST nodes.
//! 3. Build a grammar from combinators.
//! 4. Run it over a token stream and read the value stack.
//!
//! The example parses chains of additions and subtractions over numbers.

use peg_framework::{parse_tokens, Collected, Grammar, ParseOptions, Position, Rule};

// ============================================================================
// Token definition (simplified: we start from a ready-made token stream)
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum SimpleToken {
    Number { value: i32, position: Position },
    Plus { position: Position },
    Minus { position: Position },
}

impl SimpleToken {
    fn position(&self) -> Position {
        match self {
            SimpleToken::Number { position, .. }
            | SimpleToken::Plus { position }
            | SimpleToken::Minus { position } => *position,
        }
    }
}

// ============================================================================
// AST definition
// ============================================================================

/// Simple expression nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum SimpleExpr {
    /// Numeric literal.
    Number { value: i32, position: Position },
    /// Binary operation (lhs, operator, rhs).
    Binary {
        op: Op,
        left: Box<SimpleExpr>,
        right: Box<SimpleExpr>,
        position: Position,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Add,
    Subtract,
}

// ============================================================================
// Grammar
// ============================================================================

/// expr = number (("+" | "-") number)*
fn grammar() -> (Grammar<SimpleToken, SimpleExpr>, Rule) {
    let mut g: Grammar<SimpleToken, SimpleExpr> = Grammar::new();

    let number = g.token("number", |t| matches!(t, SimpleToken::Number { .. }));
    let number = g.push(number, |c| match c.tokens() {
        Some([SimpleToken::Number { value, position }]) => SimpleExpr::Number {
            value: *value,
            position: *position,
        },
        _ => SimpleExpr::Number {
            value: 0,
            position: Position::new(),
        },
    });
    let number = g.named(number, "number");

    let plus = g.token("+", |t| matches!(t, SimpleToken::Plus { .. }));
    let minus = g.token("-", |t| matches!(t, SimpleToken::Minus { .. }));
    let expr = g
        .left_expression(number)
        .infix(plus, binary(Op::Add))
        .infix(minus, binary(Op::Subtract))
        .named("expr")
        .build();
    (g, expr)
}

fn binary(
    op: Op,
) -> impl Fn(&Collected<'_, SimpleToken, SimpleExpr>) -> SimpleExpr + Send + Sync + 'static {
    move |c| {
        let position = c
            .tokens()
            .and_then(|tokens| tokens.iter().find(|t| !matches!(t, SimpleToken::Number { .. })))
            .map_or_else(Position::new, SimpleToken::position);
        SimpleExpr::Binary {
            op,
            left: Box::new(c.values()[0].clone()),
            right: Box::new(c.values()[1].clone()),
            position,
        }
    }
}

fn number(value: i32, column: usize) -> SimpleToken {
    SimpleToken::Number {
        value,
        position: Position::at(1, column, column - 1),
    }
}

// ============================================================================
// Example program
// ============================================================================

fn main() {
    println!("=== Simple Parser Example ===\n");
    println!("Demonstrates how peg-framework parses basic arithmetic expressions.\n");

    let (grammar, expr) = grammar();
    let options = ParseOptions::default().with_call_stack(true);

    let examples = [
        ("42", vec![number(42, 1)]),
        (
            "3 + 4",
            vec![
                number(3, 1),
                SimpleToken::Plus {
                    position: Position::at(1, 3, 2),
                },
                number(4, 5),
            ],
        ),
        (
            "10 - 3 + 1",
            vec![
                number(10, 1),
                SimpleToken::Minus {
                    position: Position::at(1, 4, 3),
                },
                number(3, 6),
                SimpleToken::Plus {
                    position: Position::at(1, 8, 7),
                },
                number(1, 10),
            ],
        ),
        (
            "1 + +",
            vec![
                number(1, 1),
                SimpleToken::Plus {
                    position: Position::at(1, 3, 2),
                },
                SimpleToken::Plus {
                    position: Position::at(1, 5, 4),
                },
            ],
        ),
    ];

    for (index, (source, tokens)) in examples.iter().enumerate() {
        println!("[Example {}] Parsing `{}`:", index + 1, source);
        println!("{}", "=".repeat(50));

        let result = match parse_tokens(&grammar, expr, tokens.as_slice(), &options) {
            Ok(result) => result,
            Err(error) => {
                println!("Grammar error: {error}");
                return;
            }
        };
        if result.full_match() {
            println!("AST: {:#?}", result.values());
        } else {
            println!("Outcome: {:?}", result.outcome());
            if let Some(token) = result.error_position().and_then(|i| tokens.get(i)) {
                println!("Unexpected token {:?}", token);
            }
            if let Some(report) = result.call_stack_report(&grammar) {
                print!("{report}");
            }
        }
        println!();
    }
}
