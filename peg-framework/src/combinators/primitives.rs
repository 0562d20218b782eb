use crate::context::ParseContext;
use crate::error::MatchResult;
use crate::grammar::Grammar;
use crate::traits::{Parser, Rule};

struct Literal {
    text: String,
}

impl<T, V> Parser<T, V> for Literal {
    fn parse(&self, ctx: &mut ParseContext<'_, T, V>) -> MatchResult {
        if ctx.input().matches_at(ctx.pos(), &self.text) {
            ctx.advance(self.text.len());
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn label(&self) -> String {
        format!("{:?}", self.text)
    }

    fn nullable(&self, _: &dyn Fn(Rule) -> bool) -> bool {
        self.text.is_empty()
    }
}

struct CharMatch<F> {
    label: String,
    predicate: F,
}

impl<T, V, F> Parser<T, V> for CharMatch<F>
where
    F: Fn(char) -> bool,
{
    fn parse(&self, ctx: &mut ParseContext<'_, T, V>) -> MatchResult {
        match ctx.peek_char() {
            Some(c) if (self.predicate)(c) => {
                ctx.advance(c.len_utf8());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn label(&self) -> String {
        self.label.clone()
    }
}

struct TokenMatch<F> {
    label: String,
    predicate: F,
}

impl<T, V, F> Parser<T, V> for TokenMatch<F>
where
    F: Fn(&T) -> bool,
{
    fn parse(&self, ctx: &mut ParseContext<'_, T, V>) -> MatchResult {
        match ctx.peek_token() {
            Some(token) if (self.predicate)(token) => {
                ctx.advance(1);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn label(&self) -> String {
        self.label.clone()
    }
}

/// Matches any single element.
struct Any;

impl<T, V> Parser<T, V> for Any {
    fn parse(&self, ctx: &mut ParseContext<'_, T, V>) -> MatchResult {
        if ctx.at_end() {
            return Ok(false);
        }
        let width = ctx.peek_char().map_or(1, char::len_utf8);
        ctx.advance(width);
        Ok(true)
    }

    fn label(&self) -> String {
        "any".to_string()
    }
}

/// Succeeds (`true`) or fails (`false`) without consuming input.
struct Constant(bool);

impl<T, V> Parser<T, V> for Constant {
    fn parse(&self, _: &mut ParseContext<'_, T, V>) -> MatchResult {
        Ok(self.0)
    }

    fn label(&self) -> String {
        let label = if self.0 { "empty" } else { "fail" };
        label.to_string()
    }

    fn nullable(&self, _: &dyn Fn(Rule) -> bool) -> bool {
        self.0
    }
}

struct End;

impl<T, V> Parser<T, V> for End {
    fn parse(&self, ctx: &mut ParseContext<'_, T, V>) -> MatchResult {
        Ok(ctx.at_end())
    }

    fn label(&self) -> String {
        "end".to_string()
    }

    fn nullable(&self, _: &dyn Fn(Rule) -> bool) -> bool {
        true
    }
}

impl<T, V> Grammar<T, V> {
    /// Matches `text` exactly. Never matches token input.
    pub fn literal(&mut self, text: impl Into<String>) -> Rule {
        self.add(Literal { text: text.into() })
    }

    /// Matches one character accepted by `predicate`.
    pub fn char_pred<F>(&mut self, label: impl Into<String>, predicate: F) -> Rule
    where
        F: Fn(char) -> bool + Send + Sync + 'static,
    {
        self.add(CharMatch {
            label: label.into(),
            predicate,
        })
    }

    /// Matches one character in `first..=last`.
    pub fn char_range(&mut self, first: char, last: char) -> Rule {
        self.char_pred(format!("[{first}-{last}]"), move |c| {
            (first..=last).contains(&c)
        })
    }

    /// Matches one character out of `chars`.
    pub fn char_set(&mut self, chars: &str) -> Rule {
        let set: Vec<char> = chars.chars().collect();
        self.char_pred(format!("[{chars}]"), move |c| set.contains(&c))
    }

    /// Matches one token accepted by `predicate`. Never matches text input.
    pub fn token<F>(&mut self, label: impl Into<String>, predicate: F) -> Rule
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.add(TokenMatch {
            label: label.into(),
            predicate,
        })
    }

    /// Matches any single character or token.
    pub fn any(&mut self) -> Rule {
        self.add(Any)
    }

    /// Always succeeds without consuming input.
    pub fn empty(&mut self) -> Rule {
        self.add(Constant(true))
    }

    /// Always fails.
    pub fn fail(&mut self) -> Rule {
        self.add(Constant(false))
    }

    /// Succeeds only at the end of the input.
    pub fn end(&mut self) -> Rule {
        self.add(End)
    }
}
