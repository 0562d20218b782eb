use crate::context::ParseContext;
use crate::error::MatchResult;
use crate::grammar::Grammar;
use crate::traits::{Parser, Rule};

/// Matches `body` as many times as possible, at least `min` times.
struct Repeat {
    body: Rule,
    min: usize,
}

impl<T, V> Parser<T, V> for Repeat {
    fn parse(&self, ctx: &mut ParseContext<'_, T, V>) -> MatchResult {
        let mut count = 0;
        while ctx.invoke(self.body)? {
            count += 1;
        }
        Ok(count >= self.min)
    }

    fn label(&self) -> String {
        format!("at_least({})", self.min)
    }

    fn children(&self) -> Vec<Rule> {
        vec![self.body]
    }

    fn nullable(&self, nullable: &dyn Fn(Rule) -> bool) -> bool {
        self.min == 0 || nullable(self.body)
    }

    fn repeats_nullable(&self, nullable: &dyn Fn(Rule) -> bool) -> bool {
        nullable(self.body)
    }
}

struct Optional {
    body: Rule,
}

impl<T, V> Parser<T, V> for Optional {
    fn parse(&self, ctx: &mut ParseContext<'_, T, V>) -> MatchResult {
        ctx.invoke(self.body)?;
        Ok(true)
    }

    fn label(&self) -> String {
        "opt".to_string()
    }

    fn children(&self) -> Vec<Rule> {
        vec![self.body]
    }

    fn nullable(&self, _: &dyn Fn(Rule) -> bool) -> bool {
        true
    }
}

/// Matches `item (separator item)*`, at least `min` items. With `trailing`,
/// one separator may follow the last item.
struct Separated {
    item: Rule,
    separator: Rule,
    min: usize,
    trailing: bool,
}

impl<T, V> Parser<T, V> for Separated {
    fn parse(&self, ctx: &mut ParseContext<'_, T, V>) -> MatchResult {
        if !ctx.invoke(self.item)? {
            return Ok(self.min == 0);
        }
        let mut count = 1;
        loop {
            let before = ctx.checkpoint();
            if !ctx.invoke(self.separator)? {
                break;
            }
            if ctx.invoke(self.item)? {
                count += 1;
                continue;
            }
            if !self.trailing {
                ctx.restore(before);
            }
            break;
        }
        Ok(count >= self.min)
    }

    fn label(&self) -> String {
        let kind = if self.trailing { "sep_trailing" } else { "sep" };
        format!("{kind}({})", self.min)
    }

    fn children(&self) -> Vec<Rule> {
        vec![self.item, self.separator]
    }

    fn first_children(&self, nullable: &dyn Fn(Rule) -> bool) -> Vec<Rule> {
        if nullable(self.item) {
            vec![self.item, self.separator]
        } else {
            vec![self.item]
        }
    }

    fn nullable(&self, nullable: &dyn Fn(Rule) -> bool) -> bool {
        self.min == 0 || nullable(self.item)
    }

    fn repeats_nullable(&self, nullable: &dyn Fn(Rule) -> bool) -> bool {
        nullable(self.item) && nullable(self.separator)
    }
}

impl<T, V> Grammar<T, V> {
    /// Matches `body` repeatedly, succeeding if it matched at least `min`
    /// times.
    pub fn at_least(&mut self, body: Rule, min: usize) -> Rule {
        self.add(Repeat { body, min })
    }

    /// Matches `body` zero or more times.
    pub fn zero_or_more(&mut self, body: Rule) -> Rule {
        self.at_least(body, 0)
    }

    /// Matches `body` one or more times.
    pub fn one_or_more(&mut self, body: Rule) -> Rule {
        self.at_least(body, 1)
    }

    /// Matches `body` if possible; always succeeds.
    pub fn opt(&mut self, body: Rule) -> Rule {
        self.add(Optional { body })
    }

    /// Matches at least `min` occurrences of `item` separated by `separator`.
    pub fn sep(&mut self, item: Rule, separator: Rule, min: usize) -> Rule {
        self.add(Separated {
            item,
            separator,
            min,
            trailing: false,
        })
    }

    /// Like [`Grammar::sep`], but accepts a separator after the last item.
    pub fn sep_trailing(&mut self, item: Rule, separator: Rule, min: usize) -> Rule {
        self.add(Separated {
            item,
            separator,
            min,
            trailing: true,
        })
    }
}
