use crate::context::ParseContext;
use crate::error::{BoxError, MatchResult};
use crate::grammar::Grammar;
use crate::traits::{Parser, Rule};
use common_framework::Input;
use std::ops::Range;

/// What a value builder gets to see after its rule matched.
#[derive(Debug)]
pub struct Collected<'c, T, V> {
    values: &'c [V],
    span: Range<usize>,
    input: Input<'c, T>,
}

impl<'c, T, V> Collected<'c, T, V> {
    /// Returns the collected values, bottom-most first.
    pub fn values(&self) -> &'c [V] {
        self.values
    }

    /// Returns the `index`-th collected value.
    pub fn get(&self, index: usize) -> Option<&'c V> {
        self.values.get(index)
    }

    /// Returns the number of collected values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no value was collected.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the matched span.
    pub fn span(&self) -> Range<usize> {
        self.span.clone()
    }

    /// Returns the matched text, for text input.
    pub fn text(&self) -> Option<&'c str> {
        self.input.text_span(self.span.clone())
    }

    /// Returns the matched tokens, for token input.
    pub fn tokens(&self) -> Option<&'c [T]> {
        self.input.token_span(self.span.clone())
    }
}

/// A boxed value builder.
pub type BuildFn<T, V> = Box<dyn Fn(&Collected<'_, T, V>) -> Result<V, BoxError> + Send + Sync>;

/// Replaces every value above `from` with the one `build` makes of them.
///
/// Fails the match if the stack has shrunk below `from`. A builder error
/// aborts the parse.
pub(crate) fn collect_into<T, V, F>(
    ctx: &mut ParseContext<'_, T, V>,
    from: usize,
    start: usize,
    build: &F,
) -> MatchResult
where
    F: Fn(&Collected<'_, T, V>) -> Result<V, BoxError> + ?Sized,
{
    let input = ctx.input();
    let span = start..ctx.pos();
    let Some(values) = ctx.stack().as_slice().get(from..) else {
        return Ok(false);
    };
    let count = values.len();
    let built = build(&Collected {
        values,
        span,
        input,
    });
    match built {
        Ok(value) => Ok(ctx.reduce(count, value)),
        Err(source) => Err(ctx.action_failed(source)),
    }
}

/// Runs `child` and folds the values it pushed, plus `lookback` values
/// already on the stack, into a single value.
struct Collect<F> {
    child: Rule,
    lookback: usize,
    build: F,
}

impl<T, V, F> Parser<T, V> for Collect<F>
where
    F: Fn(&Collected<'_, T, V>) -> Result<V, BoxError>,
{
    fn parse(&self, ctx: &mut ParseContext<'_, T, V>) -> MatchResult {
        let base = ctx.stack().len();
        let start = ctx.pos();
        if !ctx.invoke(self.child)? {
            return Ok(false);
        }
        let Some(from) = base.checked_sub(self.lookback) else {
            return Ok(false);
        };
        collect_into(ctx, from, start, &self.build)
    }

    fn label(&self) -> String {
        if self.lookback == 0 {
            "push".to_string()
        } else {
            format!("push(lookback {})", self.lookback)
        }
    }

    fn children(&self) -> Vec<Rule> {
        vec![self.child]
    }

    fn nullable(&self, nullable: &dyn Fn(Rule) -> bool) -> bool {
        nullable(self.child)
    }
}

/// Runs `child`, then hands the context and matched span to `action`.
struct Action<F> {
    child: Rule,
    action: F,
}

impl<T, V, F> Parser<T, V> for Action<F>
where
    F: for<'a> Fn(&mut ParseContext<'a, T, V>, Range<usize>) -> Result<bool, BoxError>,
{
    fn parse(&self, ctx: &mut ParseContext<'_, T, V>) -> MatchResult {
        let start = ctx.pos();
        if !ctx.invoke(self.child)? {
            return Ok(false);
        }
        let span = start..ctx.pos();
        (self.action)(ctx, span).map_err(|source| ctx.action_failed(source))
    }

    fn label(&self) -> String {
        "action".to_string()
    }

    fn children(&self) -> Vec<Rule> {
        vec![self.child]
    }

    fn nullable(&self, nullable: &dyn Fn(Rule) -> bool) -> bool {
        nullable(self.child)
    }
}

impl<T, V> Grammar<T, V> {
    /// Matches `child`, then replaces the values it pushed with
    /// `build(collected)`.
    pub fn push<F>(&mut self, child: Rule, build: F) -> Rule
    where
        F: Fn(&Collected<'_, T, V>) -> V + Send + Sync + 'static,
    {
        self.try_push(child, move |collected| Ok(build(collected)))
    }

    /// Like [`Grammar::push`] with a fallible builder. A builder error
    /// aborts the parse with [`RuntimeError::Action`](crate::RuntimeError).
    pub fn try_push<F>(&mut self, child: Rule, build: F) -> Rule
    where
        F: Fn(&Collected<'_, T, V>) -> Result<V, BoxError> + Send + Sync + 'static,
    {
        self.push_with_lookback(child, 0, build)
    }

    /// Like [`Grammar::try_push`], but the builder also receives the
    /// `lookback` values that were on the stack before `child` ran. Fails if
    /// fewer were present.
    pub fn push_with_lookback<F>(&mut self, child: Rule, lookback: usize, build: F) -> Rule
    where
        F: Fn(&Collected<'_, T, V>) -> Result<V, BoxError> + Send + Sync + 'static,
    {
        self.add(Collect {
            child,
            lookback,
            build,
        })
    }

    /// Matches `child` and replaces whatever it pushed with `value`.
    pub fn as_val(&mut self, child: Rule, value: V) -> Rule
    where
        V: Clone + Send + Sync + 'static,
    {
        self.push(child, move |_| value.clone())
    }

    /// Matches `child`, then runs `action` over the context and the matched
    /// span. `Ok(false)` fails the match; `Err` aborts the parse.
    pub fn action<F>(&mut self, child: Rule, action: F) -> Rule
    where
        F: for<'a> Fn(&mut ParseContext<'a, T, V>, Range<usize>) -> Result<bool, BoxError>
            + Send
            + Sync
            + 'static,
    {
        self.add(Action { child, action })
    }
}
