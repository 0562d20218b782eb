use peg_framework::{parse_str, parse_tokens, Grammar, ParseOptions, ParseResult, Rule, StateKey};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn parse<V>(grammar: &Grammar<(), V>, root: Rule, text: &str) -> ParseResult<V> {
    parse_str(grammar, root, text, &ParseOptions::default()).unwrap()
}

#[rstest]
#[case("ab", true, Some(2))]
#[case("abc", false, Some(2))]
#[case("a", false, None)]
#[case("", false, None)]
fn test_sequence(#[case] input: &str, #[case] full: bool, #[case] size: Option<usize>) {
    let mut g: Grammar<(), ()> = Grammar::new();
    let a = g.literal("a");
    let b = g.literal("b");
    let root = g.seq([a, b]);

    let result = parse(&g, root, input);
    assert_eq!(result.full_match(), full);
    assert_eq!(result.match_size(), size);
}

#[test]
fn test_choice_first_match_wins() {
    let mut g: Grammar<(), &'static str> = Grammar::new();
    let a = g.literal("a");
    let first = g.as_val(a, "first");
    let ab = g.literal("ab");
    let second = g.as_val(ab, "second");
    let root = g.choice([first, second]);

    let result = parse(&g, root, "ab");
    assert!(result.success());
    assert_eq!(result.values(), &["first"]);
    assert_eq!(result.match_size(), Some(1));
}

#[test]
fn test_choice_rolls_back_failed_alternative() {
    let mut g: Grammar<(), char> = Grammar::new();
    let a = g.literal("a");
    let pushed_a = g.as_val(a, 'a');
    let x = g.literal("x");
    let first = g.seq([pushed_a, x]);
    let a2 = g.literal("a");
    let b = g.literal("b");
    let second_seq = g.seq([a2, b]);
    let second = g.as_val(second_seq, 'b');
    let root = g.choice([first, second]);

    let result = parse(&g, root, "ab");
    assert!(result.full_match());
    assert_eq!(result.values(), &['b']);
}

#[rstest]
#[case("", 0, true, 0)]
#[case("aaa", 0, true, 3)]
#[case("aa", 3, false, 0)]
#[case("aaab", 2, true, 3)]
fn test_at_least(
    #[case] input: &str,
    #[case] min: usize,
    #[case] success: bool,
    #[case] size: usize,
) {
    let mut g: Grammar<(), ()> = Grammar::new();
    let a = g.literal("a");
    let root = g.at_least(a, min);

    let result = parse(&g, root, input);
    assert_eq!(result.success(), success);
    if success {
        assert_eq!(result.match_size(), Some(size));
    }
}

#[test]
fn test_repetition_rolls_back_only_final_attempt() {
    let mut g: Grammar<(), u32> = Grammar::new();
    let a = g.literal("a");
    let b = g.literal("b");
    let pair = g.seq([a, b]);
    let item = g.as_val(pair, 1);
    let root = g.zero_or_more(item);

    let result = parse(&g, root, "ababa");
    assert_eq!(result.match_size(), Some(4));
    assert_eq!(result.values(), &[1, 1]);
    assert_eq!(result.error_position(), Some(5));
}

#[test]
fn test_opt() {
    let mut g: Grammar<(), ()> = Grammar::new();
    let a = g.literal("a");
    let root = g.opt(a);

    assert_eq!(parse(&g, root, "a").match_size(), Some(1));
    assert_eq!(parse(&g, root, "b").match_size(), Some(0));
}

#[rstest]
#[case("1,2,3", Some(5), 3)]
#[case("1,2,", Some(3), 2)]
#[case("1", Some(1), 1)]
#[case("", None, 0)]
fn test_sep(#[case] input: &str, #[case] size: Option<usize>, #[case] items: usize) {
    let mut g: Grammar<(), char> = Grammar::new();
    let digit = g.char_range('0', '9');
    let item = g.push(digit, |c| c.text().and_then(|t| t.chars().next()).unwrap_or('?'));
    let comma = g.literal(",");
    let root = g.sep(item, comma, 1);

    let result = parse(&g, root, input);
    assert_eq!(result.match_size(), size);
    assert_eq!(result.values().len(), items);
}

#[test]
fn test_sep_trailing() {
    let mut g: Grammar<(), ()> = Grammar::new();
    let digit = g.char_range('0', '9');
    let comma = g.literal(",");
    let root = g.sep_trailing(digit, comma, 0);

    assert_eq!(parse(&g, root, "1,2,").match_size(), Some(4));
    assert_eq!(parse(&g, root, "1,2,,").match_size(), Some(4));
    assert_eq!(parse(&g, root, "").match_size(), Some(0));
}

#[test]
fn test_not_leaves_no_trace() {
    let mut g: Grammar<(), u8> = Grammar::new();
    let a = g.literal("a");
    let pushed = g.as_val(a, 1);
    let b = g.literal("b");
    let body = g.seq([pushed, b]);
    let root = g.not(body);

    let result = parse(&g, root, "ac");
    assert!(result.success());
    assert_eq!(result.match_size(), Some(0));
    assert!(result.values().is_empty());

    let result = parse(&g, root, "ab");
    assert!(!result.success());
    assert_eq!(result.error_position(), Some(0));
}

#[test]
fn test_ahead() {
    let mut g: Grammar<(), u8> = Grammar::new();
    let a = g.literal("a");
    let pushed = g.as_val(a, 1);
    let root = g.ahead(pushed);

    let result = parse(&g, root, "a");
    assert!(result.success());
    assert_eq!(result.match_size(), Some(0));
    assert!(result.values().is_empty());
    assert!(!parse(&g, root, "b").success());
}

#[rstest]
#[case("héllo", true)]
#[case("hello", false)]
fn test_char_predicates(#[case] input: &str, #[case] accented: bool) {
    let mut g: Grammar<(), ()> = Grammar::new();
    let h = g.char_set("hH");
    let vowel = g.char_pred("accented", |c| !c.is_ascii());
    let plain = g.char_range('a', 'z');
    let second = g.choice([vowel, plain]);
    let rest = g.zero_or_more(plain);
    let end = g.end();
    let root = g.seq([h, second, rest, end]);

    let result = parse(&g, root, input);
    assert!(result.full_match());
    assert_eq!(result.match_size(), Some(input.len()));
    assert_eq!(input.len(), if accented { 6 } else { 5 });
}

#[test]
fn test_any_empty_fail() {
    let mut g: Grammar<(), ()> = Grammar::new();
    let any = g.any();
    let empty = g.empty();
    let fail = g.fail();

    assert_eq!(parse(&g, any, "é").match_size(), Some(2));
    assert!(!parse(&g, any, "").success());
    assert_eq!(parse(&g, empty, "x").match_size(), Some(0));
    assert!(!parse(&g, fail, "x").success());
}

#[test]
fn test_forward_reference() {
    let mut g: Grammar<(), u32> = Grammar::new();
    let nested = g.forward("nested");
    let open = g.literal("(");
    let close = g.literal(")");
    let inner = g.opt(nested);
    let group = g.seq([open, inner, close]);
    let counted = g.push_with_lookback(group, 0, |c| {
        Ok(c.values().first().map_or(1, |depth| depth + 1))
    });
    g.define(nested, counted).unwrap();

    let result = parse(&g, nested, "((()))");
    assert!(result.full_match());
    assert_eq!(result.values(), &[3]);
    assert!(g.define(nested, counted).is_err());
}

#[test]
fn test_recursive_rule() {
    let mut g: Grammar<(), ()> = Grammar::new();
    let list = g.recursive("list", |g, this| {
        let a = g.literal("a");
        let rest = g.opt(this);
        g.seq([a, rest])
    });

    assert_eq!(parse(&g, list, "aaaa").match_size(), Some(4));
    assert_eq!(g.name(list), Some("list"));
    assert_eq!(g.rule("list"), Some(list));
}

#[test]
fn test_push_with_lookback() {
    let mut g: Grammar<(), i64> = Grammar::new();
    let digit = g.char_range('0', '9');
    let number = g.push(digit, |c| c.text().and_then(|t| t.parse().ok()).unwrap_or(0));
    let bang = g.literal("!");
    let negate = g.push_with_lookback(bang, 1, |c| Ok(-c.values()[0]));
    let tail = g.opt(negate);
    let root = g.seq([number, tail]);

    let result = parse(&g, root, "7!");
    assert_eq!(result.values(), &[-7]);
}

#[test]
fn test_lookback_needs_enough_values() {
    let mut g: Grammar<(), i64> = Grammar::new();
    let bang = g.literal("!");
    let root = g.push_with_lookback(bang, 1, |c| Ok(c.values()[0]));

    let result = parse(&g, root, "!");
    assert!(!result.success());
    assert!(result.thrown().is_none());
}

#[test]
fn test_action_updates_state() {
    let key: StateKey<u32> = StateKey::new("letters", || 0);
    let mut g: Grammar<(), ()> = Grammar::new();
    let letter = g.char_range('a', 'z');
    let counted = g.action(letter, move |ctx, _| {
        ctx.update_state(&key, |n| n + 1);
        Ok(true)
    });
    let x = g.literal("x");
    let attempt = g.seq([counted, counted, x]);
    let letters = g.zero_or_more(counted);
    let root = g.choice([attempt, letters]);

    let result = parse(&g, root, "abc");
    assert!(result.full_match());
    assert_eq!(result.state().get(&key), Some(&3));
    assert_eq!(result.state().names(), &["letters"]);
}

#[test]
fn test_action_can_reject() {
    let mut g: Grammar<(), ()> = Grammar::new();
    let letter = g.char_range('a', 'z');
    let root = g.action(letter, |ctx, span| {
        Ok(ctx.input().text_span(span) != Some("q"))
    });

    assert!(parse(&g, root, "a").success());
    assert!(!parse(&g, root, "q").success());
}

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Ident(&'static str),
    Comma,
}

#[test]
fn test_token_input() {
    let mut g: Grammar<Tok, String> = Grammar::new();
    let ident = g.token("ident", |t| matches!(t, Tok::Ident(_)));
    let name = g.push(ident, |c| match c.tokens() {
        Some([Tok::Ident(name)]) => name.to_string(),
        _ => String::new(),
    });
    let comma = g.token("comma", |t| *t == Tok::Comma);
    let root = g.sep(name, comma, 1);

    let tokens = [Tok::Ident("a"), Tok::Comma, Tok::Ident("b")];
    let result = parse_tokens(&g, root, &tokens[..], &ParseOptions::default()).unwrap();
    assert!(result.full_match());
    assert_eq!(result.values(), &["a".to_string(), "b".to_string()]);
}

#[test]
fn test_literal_never_matches_tokens() {
    let mut g: Grammar<char, ()> = Grammar::new();
    let a = g.literal("a");
    let result = parse_tokens(&g, a, &['a'][..], &ParseOptions::default()).unwrap();
    assert!(!result.success());
}
