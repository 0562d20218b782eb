use anyhow::{bail, Result};
use common_framework::Position;
use log::debug;
use peg_framework::{parse_str, Grammar, ParseOptions, Rule};
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenKind {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
}

/// A token with its byte span in the source text.
#[derive(Debug, Clone, PartialEq)]
pub struct CalcToken {
    pub kind: TokenKind,
    pub span: Range<usize>,
}

const SYMBOLS: [(&str, TokenKind); 7] = [
    ("+", TokenKind::Plus),
    ("-", TokenKind::Minus),
    ("*", TokenKind::Star),
    ("/", TokenKind::Slash),
    ("^", TokenKind::Caret),
    ("(", TokenKind::LParen),
    (")", TokenKind::RParen),
];

/// Splits text into [`CalcToken`]s, itself with a grammar over characters.
pub struct Lexer {
    grammar: Grammar<(), CalcToken>,
    root: Rule,
}

impl Lexer {
    pub fn new() -> Result<Self> {
        let mut g: Grammar<(), CalcToken> = Grammar::new();
        let space = g.char_set(" \t\r\n");
        let ws = g.zero_or_more(space);

        let digit = g.char_range('0', '9');
        let digits = g.one_or_more(digit);
        let dot = g.literal(".");
        let fraction = g.seq([dot, digits]);
        let fraction = g.opt(fraction);
        let numeral = g.seq([digits, fraction]);
        let number = g.try_push(numeral, |c| {
            let text = c.text().ok_or("number outside text input")?;
            Ok(CalcToken {
                kind: TokenKind::Number(text.parse()?),
                span: c.span(),
            })
        });
        let number = g.named(number, "number");

        let mut alternatives = vec![number];
        for (text, kind) in SYMBOLS {
            let literal = g.literal(text);
            let token = g.push(literal, move |c| CalcToken {
                kind,
                span: c.span(),
            });
            alternatives.push(g.named(token, format!("'{text}'")));
        }
        let token = g.choice(alternatives);
        let token = g.seq([token, ws]);
        let tokens = g.zero_or_more(token);
        let end = g.end();
        let root = g.seq([ws, tokens, end]);

        g.check(root)?;
        Ok(Self { grammar: g, root })
    }

    pub fn tokenize(&self, text: &str) -> Result<Vec<CalcToken>> {
        let options = ParseOptions::default().with_well_formed_check(false);
        let result = parse_str(&self.grammar, self.root, text, &options)?;
        if !result.full_match() {
            let at = Position::locate(text, result.error_position().unwrap_or_default());
            bail!("unexpected character at {at}");
        }
        let tokens = result.into_values();
        debug!("lexed {} tokens", tokens.len());
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize() {
        let lexer = Lexer::new().unwrap();
        let tokens = lexer.tokenize(" 12.5*(3 - 1)").unwrap();
        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Number(12.5),
                TokenKind::Star,
                TokenKind::LParen,
                TokenKind::Number(3.0),
                TokenKind::Minus,
                TokenKind::Number(1.0),
                TokenKind::RParen,
            ]
        );
        assert_eq!(tokens[0].span, 1..5);
    }

    #[test]
    fn test_tokenize_rejects_unknown_character() {
        let lexer = Lexer::new().unwrap();
        let error = lexer.tokenize("1 + x").unwrap_err();
        assert_eq!(error.to_string(), "unexpected character at 1:5");
    }
}
