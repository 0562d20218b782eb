use crate::ast::Expr;
use crate::expression::{self, Nesting, Terminals};
use crate::Parsed;
use anyhow::Result;
use common_framework::Position;
use log::debug;
use peg_framework::{parse_str, Collected, Grammar, GrammarError, ParseOptions, ParseResult, Rule};
use std::ops::Range;

/// A calculator parsing characters directly; whitespace is skipped after
/// every terminal.
pub struct TextCalculator {
    grammar: Grammar<(), Expr>,
    root: Rule,
    nesting: Nesting,
}

impl TextCalculator {
    /// Builds and checks the grammar.
    pub fn new() -> Result<Self> {
        let mut g: Grammar<(), Expr> = Grammar::new();
        let space = g.char_set(" \t\r\n");
        let ws = g.zero_or_more(space);
        let ws = g.named(ws, "whitespace");
        let symbol = |g: &mut Grammar<(), Expr>, text: &str| -> Rule {
            let literal = g.literal(text);
            let symbol = g.seq([literal, ws]);
            g.named(symbol, format!("'{text}'"))
        };

        let digit = g.char_range('0', '9');
        let digits = g.one_or_more(digit);
        let dot = g.literal(".");
        let fraction = g.seq([dot, digits]);
        let fraction = g.opt(fraction);
        let numeral = g.seq([digits, fraction]);
        let number = g.try_push(numeral, |c| {
            let text = c.text().ok_or("number outside text input")?;
            Ok(Expr::Number {
                value: text.parse()?,
                span: c.span(),
            })
        });
        let number = g.seq([number, ws]);
        let number = g.named(number, "number");

        let terminals = Terminals {
            number,
            plus: symbol(&mut g, "+"),
            minus: symbol(&mut g, "-"),
            star: symbol(&mut g, "*"),
            slash: symbol(&mut g, "/"),
            caret: symbol(&mut g, "^"),
            lparen: symbol(&mut g, "("),
            rparen: symbol(&mut g, ")"),
        };
        let nesting = Nesting::new();
        let expr = expression::build(&mut g, terminals, nesting, trimmed_span)?;
        let end = g.end();
        let root = g.seq([ws, expr, end]);
        let root = g.named(root, "input");

        g.check(root)?;
        debug!("text calculator grammar ready with {} rules", g.len());
        Ok(Self {
            grammar: g,
            root,
            nesting,
        })
    }

    /// Parses `text` into an expression.
    pub fn parse(&self, text: &str) -> Result<Parsed> {
        let result = self.run(text, &ParseOptions::default())?;
        expression::into_parsed(result, &self.nesting, |offset| {
            Position::locate(text, offset).to_string()
        })
    }

    /// Runs the grammar with caller-supplied options. The grammar was checked
    /// when the calculator was built and is not checked again.
    pub fn run(&self, text: &str, options: &ParseOptions) -> Result<ParseResult<Expr>, GrammarError> {
        let options = options.clone().with_well_formed_check(false);
        parse_str(&self.grammar, self.root, text, &options)
    }

    pub fn grammar(&self) -> &Grammar<(), Expr> {
        &self.grammar
    }
}

/// The matched span without the whitespace terminals consume after
/// themselves.
fn trimmed_span(c: &Collected<'_, (), Expr>) -> Range<usize> {
    let span = c.span();
    let trailing = c.text().map_or(0, |text| text.len() - text.trim_end().len());
    span.start..span.end - trailing
}
