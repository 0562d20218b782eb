use crate::ast::Expr;
use crate::expression::{self, Nesting, Terminals};
use crate::lexer::{CalcToken, Lexer, TokenKind};
use crate::Parsed;
use anyhow::Result;
use common_framework::Position;
use peg_framework::{parse_tokens, Collected, Grammar, GrammarError, ParseOptions, ParseResult, Rule};
use std::ops::Range;

/// A calculator parsing the output of a [`Lexer`].
pub struct TokenCalculator {
    lexer: Lexer,
    grammar: Grammar<CalcToken, Expr>,
    root: Rule,
    nesting: Nesting,
}

impl TokenCalculator {
    /// Builds and checks the lexer and parser grammars.
    pub fn new() -> Result<Self> {
        let mut g: Grammar<CalcToken, Expr> = Grammar::new();
        let symbol = |g: &mut Grammar<CalcToken, Expr>, kind: TokenKind, label: &str| -> Rule {
            g.token(label, move |token: &CalcToken| token.kind == kind)
        };

        let number = g.token("number", |token| matches!(token.kind, TokenKind::Number(_)));
        let number = g.try_push(number, |c| match c.tokens() {
            Some(
                [CalcToken {
                    kind: TokenKind::Number(value),
                    span,
                }],
            ) => Ok(Expr::Number {
                value: *value,
                span: span.clone(),
            }),
            _ => Err(format!("expected one number token at {:?}", c.span()).into()),
        });

        let terminals = Terminals {
            number,
            plus: symbol(&mut g, TokenKind::Plus, "'+'"),
            minus: symbol(&mut g, TokenKind::Minus, "'-'"),
            star: symbol(&mut g, TokenKind::Star, "'*'"),
            slash: symbol(&mut g, TokenKind::Slash, "'/'"),
            caret: symbol(&mut g, TokenKind::Caret, "'^'"),
            lparen: symbol(&mut g, TokenKind::LParen, "'('"),
            rparen: symbol(&mut g, TokenKind::RParen, "')'"),
        };
        let nesting = Nesting::new();
        let expr = expression::build(&mut g, terminals, nesting, source_span)?;
        let end = g.end();
        let root = g.seq([expr, end]);

        g.check(root)?;
        Ok(Self {
            lexer: Lexer::new()?,
            grammar: g,
            root,
            nesting,
        })
    }

    pub fn tokenize(&self, text: &str) -> Result<Vec<CalcToken>> {
        self.lexer.tokenize(text)
    }

    /// Lexes and parses `text`.
    pub fn parse(&self, text: &str) -> Result<Parsed> {
        let tokens = self.tokenize(text)?;
        let result = self.run(&tokens, &ParseOptions::default())?;
        expression::into_parsed(result, &self.nesting, |index| {
            let offset = tokens.get(index).map_or(text.len(), |token| token.span.start);
            Position::locate(text, offset).to_string()
        })
    }

    /// Runs the parser grammar over `tokens` with caller-supplied options.
    pub fn run(
        &self,
        tokens: &[CalcToken],
        options: &ParseOptions,
    ) -> Result<ParseResult<Expr>, GrammarError> {
        let options = options.clone().with_well_formed_check(false);
        parse_tokens(&self.grammar, self.root, tokens, &options)
    }

    pub fn grammar(&self) -> &Grammar<CalcToken, Expr> {
        &self.grammar
    }
}

/// The source text covered by the matched tokens.
fn source_span(c: &Collected<'_, CalcToken, Expr>) -> Range<usize> {
    match c.tokens() {
        Some([first, .., last]) => first.span.start..last.span.end,
        Some([only]) => only.span.clone(),
        _ => 0..0,
    }
}
