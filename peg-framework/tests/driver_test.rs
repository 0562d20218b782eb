use peg_framework::{
    parse_str, run, Grammar, Input, Outcome, ParseOptions, Position, Rule, RuntimeError,
    StateKey, DEFAULT_MAX_DEPTH,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

#[test]
fn test_full_match() {
    let mut g: Grammar<(), ()> = Grammar::new();
    let a = g.literal("a");
    let b = g.literal("b");
    let root = g.seq([a, b]);

    let result = parse_str(&g, root, "ab", &ParseOptions::default()).unwrap();
    assert!(result.success());
    assert!(result.full_match());
    assert_eq!(result.match_size(), Some(2));
    assert_eq!(result.error_position(), None);
    assert_eq!(result.outcome(), Outcome::FullMatch);
}

#[test]
fn test_partial_match() {
    let mut g: Grammar<(), ()> = Grammar::new();
    let a = g.literal("a");

    let result = parse_str(&g, a, "ab", &ParseOptions::default()).unwrap();
    assert!(result.success());
    assert!(!result.full_match());
    assert_eq!(result.match_size(), Some(1));
    assert_eq!(result.error_position(), None);
    assert!(result.thrown().is_none());
    assert_eq!(result.outcome(), Outcome::PartialMatch);
}

#[test]
fn test_failure_reports_furthest_position() {
    let mut g: Grammar<(), ()> = Grammar::new();
    let word = g.literal("let");
    let space = g.literal(" ");
    let x = g.literal("x");
    let declaration = g.seq([word, space, x]);
    let other = g.literal("l");
    let digit = g.char_range('0', '9');
    let fallback = g.seq([other, digit]);
    let root = g.choice([declaration, fallback]);

    let text = "let\n y";
    let result = parse_str(&g, root, text, &ParseOptions::default()).unwrap();
    assert_eq!(result.outcome(), Outcome::Failure);
    assert_eq!(result.match_size(), None);
    assert_eq!(result.error_position(), Some(3));
    assert_eq!(result.error_location(text), Some(Position::at(1, 4, 3)));
}

#[test]
fn test_error_call_stack() {
    let mut g: Grammar<(), ()> = Grammar::new();
    let a = g.literal("a");
    let a = g.named(a, "a");
    let b = g.literal("b");
    let b = g.named(b, "b");
    let pair = g.seq([a, b]);
    let pair = g.named(pair, "pair");
    let root = g.one_or_more(pair);
    let root = g.named(root, "pairs");

    let options = ParseOptions::default().with_call_stack(true);
    let result = parse_str(&g, root, "abac", &options).unwrap();
    assert_eq!(result.error_position(), Some(3));

    let stack = result.error_call_stack().unwrap();
    let names: Vec<String> = stack.frames().iter().map(|f| g.describe(f.rule)).collect();
    assert_eq!(names, vec!["pairs", "pair", "b"]);
    assert_eq!(
        result.call_stack_report(&g).unwrap(),
        "  at b (position 3)\n  at pair (position 2)\n  at pairs (position 0)\n"
    );
}

#[test]
fn test_error_call_stack_follows_last_failure_at_furthest_position() {
    fn leaf(g: &mut Grammar<(), ()>, text: &str, name: &str) -> Rule {
        let rule = g.literal(text);
        g.named(rule, name)
    }

    let mut g: Grammar<(), ()> = Grammar::new();
    let a = leaf(&mut g, "a", "a");
    let x = leaf(&mut g, "x", "x");
    let a2 = leaf(&mut g, "a", "a2");
    let y = leaf(&mut g, "y", "y");
    let first = g.seq([a, x]);
    let first = g.named(first, "first");
    let second = g.seq([a2, y]);
    let second = g.named(second, "second");
    let root = g.choice([first, second]);
    let root = g.named(root, "root");

    let options = ParseOptions::default().with_call_stack(true);
    let result = parse_str(&g, root, "az", &options).unwrap();
    assert_eq!(result.outcome(), Outcome::Failure);
    assert_eq!(result.error_position(), Some(1));

    let stack = result.error_call_stack().unwrap();
    let names: Vec<String> = stack.frames().iter().map(|f| g.describe(f.rule)).collect();
    assert_eq!(names, vec!["root", "second", "y"]);
}

#[test]
fn test_no_call_stack_unless_requested() {
    let mut g: Grammar<(), ()> = Grammar::new();
    let a = g.literal("a");
    let result = parse_str(&g, a, "b", &ParseOptions::default()).unwrap();
    assert!(result.error_call_stack().is_none());
}

#[test]
fn test_action_error_is_fatal() {
    let mut g: Grammar<(), i32> = Grammar::new();
    let digit = g.char_range('0', '9');
    let checked = g.try_push(digit, |c| match c.text() {
        Some("0") => Err("zero is not allowed".into()),
        Some(text) => Ok(text.parse::<i32>()?),
        None => Err("no text".into()),
    });
    let checked = g.named(checked, "digit");
    let any = g.any();
    let fallback = g.as_val(any, -1);
    let item = g.choice([checked, fallback]);
    let root = g.one_or_more(item);

    let options = ParseOptions::default().with_call_stack(true);
    let result = parse_str(&g, root, "120", &options).unwrap();
    assert_eq!(result.outcome(), Outcome::Error);
    assert!(!result.success());
    assert_eq!(result.match_size(), None);
    assert_eq!(result.error_position(), Some(3));

    match result.thrown() {
        Some(RuntimeError::Action { name, source, .. }) => {
            assert_eq!(name, "digit");
            assert_eq!(source.to_string(), "zero is not allowed");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    let frames = result.error_call_stack().unwrap();
    assert_eq!(frames.len(), 3);
    assert_eq!(frames.frames()[2].rule, checked);
}

#[rstest]
#[case(true)]
#[case(false)]
fn test_runtime_error_inside_lookahead_propagates(#[case] negative: bool) {
    let mut g: Grammar<(), ()> = Grammar::new();
    let a = g.literal("a");
    let boom = g.try_push(a, |_| Err("boom".into()));
    let look = if negative { g.not(boom) } else { g.ahead(boom) };
    let rest = g.any();
    let root = g.seq([look, rest]);

    let result = parse_str(&g, root, "a", &ParseOptions::default()).unwrap();
    assert_eq!(result.outcome(), Outcome::Error);
    assert_eq!(result.error_position(), Some(1));
}

#[test]
fn test_recursion_limit() {
    let mut g: Grammar<(), ()> = Grammar::new();
    let nested = g.recursive("nested", |g, this| {
        let open = g.literal("(");
        let inner = g.opt(this);
        let close = g.literal(")");
        g.seq([open, inner, close])
    });

    let deep = format!("{}{}", "(".repeat(100), ")".repeat(100));
    let options = ParseOptions::default().with_max_depth(64);
    let result = parse_str(&g, nested, &deep, &options).unwrap();
    match result.thrown() {
        Some(RuntimeError::RecursionLimit { limit, .. }) => assert_eq!(*limit, 64),
        other => panic!("unexpected error: {other:?}"),
    }

    let shallow = "((()))";
    let result = parse_str(&g, nested, shallow, &options).unwrap();
    assert!(result.full_match());
}

#[test]
fn test_default_depth_limit_fits_thread_stack() {
    let limit = std::thread::Builder::new()
        .stack_size(2 * 1024 * 1024)
        .spawn(|| {
            let mut g: Grammar<(), ()> = Grammar::new();
            let nested = g.recursive("nested", |g, this| {
                let open = g.literal("(");
                let inner = g.opt(this);
                g.seq([open, inner])
            });
            let deep = "(".repeat(4 * DEFAULT_MAX_DEPTH);
            let result = parse_str(&g, nested, &deep, &ParseOptions::default()).unwrap();
            match result.thrown() {
                Some(RuntimeError::RecursionLimit { limit, .. }) => *limit,
                other => panic!("unexpected error: {other:?}"),
            }
        })
        .unwrap()
        .join()
        .unwrap();
    assert_eq!(limit, DEFAULT_MAX_DEPTH);
}

#[rstest]
#[case::written(true)]
#[case::read(false)]
fn test_state_slot_created_in_failed_branch_is_removed(#[case] write: bool) {
    let key: StateKey<i32> = StateKey::new("flag", || 0);
    let mut g: Grammar<(), ()> = Grammar::new();
    let a = g.literal("a");
    let touch = g.action(a, move |ctx, _| {
        if write {
            ctx.set_state(&key, 7);
        } else {
            let _ = ctx.state(&key);
        }
        Ok(true)
    });
    let b = g.literal("b");
    let doomed = g.seq([touch, b]);
    let a = g.literal("a");
    let root = g.choice([doomed, a]);

    let result = parse_str(&g, root, "a", &ParseOptions::default()).unwrap();
    assert_eq!(result.outcome(), Outcome::FullMatch);
    assert_eq!(result.state().get(&key), None);
    assert!(result.state().names().is_empty());
}

#[test]
fn test_state_torn_down_after_error() {
    let key: StateKey<Vec<char>> = StateKey::new("seen", Vec::new);
    let mut g: Grammar<(), ()> = Grammar::new();
    let letter = g.char_range('a', 'z');
    let record = g.action(letter, move |ctx, span| {
        let text = ctx.input().text_span(span).unwrap_or_default();
        if text == "z" {
            return Err("z".into());
        }
        let mut seen = ctx.state(&key).clone();
        seen.extend(text.chars());
        ctx.set_state(&key, seen);
        Ok(true)
    });
    let root = g.one_or_more(record);

    let result = parse_str(&g, root, "abz", &ParseOptions::default()).unwrap();
    assert_eq!(result.outcome(), Outcome::Error);
    assert_eq!(result.state().get(&key), Some(&vec!['a', 'b']));

    // The grammar is reused with no leftover state.
    let result = parse_str(&g, root, "cd", &ParseOptions::default()).unwrap();
    assert_eq!(result.state().get(&key), Some(&vec!['c', 'd']));
}

#[test]
fn test_check_can_be_skipped() {
    let mut g: Grammar<(), ()> = Grammar::new();
    let a = g.literal("a");
    let maybe = g.opt(a);
    let b = g.literal("b");
    let root = g.seq([maybe, b]);
    let root_check = g.check(root);
    assert!(root_check.is_ok());

    let options = ParseOptions::default().with_well_formed_check(false);
    let result = run(&g, root, Input::Text("ab"), &options).unwrap();
    assert!(result.full_match());
}

#[test]
fn test_grammar_shared_across_threads() {
    let mut g: Grammar<(), usize> = Grammar::new();
    let a = g.literal("a");
    let many = g.one_or_more(a);
    let root = g.push(many, |c| c.span().len());
    g.check(root).unwrap();

    let options = ParseOptions::default().with_well_formed_check(false);
    std::thread::scope(|scope| {
        for n in 1..=4 {
            let (g, options) = (&g, &options);
            scope.spawn(move || {
                let text = "a".repeat(n);
                let result = parse_str(g, root, &text, options).unwrap();
                assert_eq!(result.into_values(), vec![n]);
            });
        }
    });
}
