use peg_framework::{parse_str, Grammar, ParseMetrics, ParseOptions, Rule};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn words() -> (Grammar<(), ()>, Rule, Rule) {
    let mut g: Grammar<(), ()> = Grammar::new();
    let letter = g.char_range('a', 'z');
    let letter = g.named(letter, "letter");
    let word = g.one_or_more(letter);
    let word = g.named(word, "word");
    let space = g.literal(" ");
    let root = g.sep(word, space, 1);
    let root = g.named(root, "words");
    (g, root, letter)
}

#[test]
fn test_metrics_off_by_default() {
    let (g, root, _) = words();
    let result = parse_str(&g, root, "ab cd", &ParseOptions::default()).unwrap();
    assert!(result.metrics().is_none());
}

#[test]
fn test_trace_counts_invocations() {
    let (g, root, letter) = words();
    let options = ParseOptions::default().with_trace(true);
    let result = parse_str(&g, root, "ab cd", &options).unwrap();
    assert!(result.full_match());

    let metrics = result.metrics().unwrap();
    let letter_metrics = metrics.iter().find(|m| m.rule == letter).unwrap();
    // Four letters match, each word ends on a failed attempt.
    assert_eq!(letter_metrics.invocations, 6);
    assert_eq!(letter_metrics.successes, 4);
    assert_eq!(letter_metrics.name, "letter");

    let root_metrics = metrics.iter().find(|m| m.rule == root).unwrap();
    assert_eq!(root_metrics.invocations, 1);
    assert!(root_metrics.total_time >= root_metrics.self_time);
    assert!(root_metrics.total_time >= letter_metrics.total_time);
}

#[test]
fn test_sink_aggregates_across_parses() {
    let (g, root, letter) = words();
    let sink = Arc::new(ParseMetrics::new());
    let options = ParseOptions::default().with_metrics(Arc::clone(&sink));

    for text in ["ab", "cd ef", "g"] {
        parse_str(&g, root, text, &options).unwrap();
    }
    assert_eq!(sink.parses(), 3);
    let letter_metrics = sink.get(&g, letter).unwrap();
    // Seven letters over four words, each word ending on a failed attempt.
    assert_eq!(letter_metrics.successes, 7);
    assert_eq!(letter_metrics.invocations, 7 + 4);

    sink.reset();
    assert_eq!(sink.parses(), 0);
    assert!(sink.snapshot().is_empty());
}

#[test]
fn test_sink_shared_between_threads() {
    let (g, root, _) = words();
    let sink = Arc::new(ParseMetrics::new());
    let options = ParseOptions::default().with_metrics(Arc::clone(&sink));

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..10 {
                    parse_str(&g, root, "abc def", &options).unwrap();
                }
            });
        }
    });

    assert_eq!(sink.parses(), 40);
    assert_eq!(sink.get(&g, root).map(|m| m.invocations), Some(40));
    let snapshot = sink.snapshot();
    assert!(snapshot
        .windows(2)
        .all(|pair| pair[0].self_time >= pair[1].self_time));
}

#[test]
fn test_metrics_do_not_change_outcome() {
    let (g, root, _) = words();
    let plain = parse_str(&g, root, "ab  cd", &ParseOptions::default()).unwrap();
    let traced = parse_str(
        &g,
        root,
        "ab  cd",
        &ParseOptions::default().with_trace(true).with_call_stack(true),
    )
    .unwrap();
    assert_eq!(plain.outcome(), traced.outcome());
    assert_eq!(plain.match_size(), traced.match_size());
    assert_eq!(plain.error_position(), traced.error_position());
}

#[test]
fn test_sink_keeps_grammars_apart() {
    let (words, words_root, letter) = words();
    let mut digits: Grammar<(), ()> = Grammar::new();
    let digit = digits.char_range('0', '9');
    let digit = digits.named(digit, "digit");
    let digits_root = digits.one_or_more(digit);
    assert_eq!(digit, letter);

    let sink = Arc::new(ParseMetrics::new());
    let options = ParseOptions::default().with_metrics(Arc::clone(&sink));
    parse_str(&words, words_root, "abc", &options).unwrap();
    parse_str(&digits, digits_root, "12", &options).unwrap();

    let letters = sink.get(&words, letter).unwrap();
    assert_eq!(letters.name, "letter");
    assert_eq!(letters.successes, 3);
    let digit_metrics = sink.get(&digits, digit).unwrap();
    assert_eq!(digit_metrics.name, "digit");
    assert_eq!(digit_metrics.successes, 2);
}
