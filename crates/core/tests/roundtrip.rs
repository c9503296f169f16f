//! Printing a parsed line with the canonical printer and parsing it again
//! must give back the same tree.

use scenario_core::{parse_event, parse_script, Event};

const LINES: &[&str] = &[
    "Deploy Bar 5",
    "Bar Value",
    "True",
    "Assert Equal (Bar Value) (Exactly 5)",
    "Benqi TransferScenario (Jared Torrey) 10",
    r#"Print "hello world""#,
    r#"Print "quote \" and backslash \\ inside""#,
    r#"Setting Network """#,
    "((Exactly 1.5e18))",
    "From Geoff (Bar Set (Add 1 (Mul 2 3)))",
    "Foo ()",
    "  padded    spacing\tand\ttabs  ",
];

#[test]
fn render_then_parse_is_identity() {
    for line in LINES {
        let parsed = parse_event(line).unwrap();
        let rendered = parsed.render_line();
        let reparsed = parse_event(&rendered)
            .unwrap_or_else(|e| panic!("re-parse of {:?} failed: {}", rendered, e));
        assert_eq!(parsed, reparsed, "line {:?} rendered as {:?}", line, rendered);
    }
}

#[test]
fn rendering_is_stable() {
    for line in LINES {
        let once = parse_event(line).unwrap().render_line();
        let twice = parse_event(&once).unwrap().render_line();
        assert_eq!(once, twice);
    }
}

#[test]
fn canonical_form_normalizes_whitespace_and_quotes() {
    let e = parse_event("  Foo   \"bar\"  ( a  b )").unwrap();
    assert_eq!(e.render_line(), "Foo bar (a b)");
}

#[test]
fn nested_event_renders_with_parens() {
    let e = parse_event("Assert Equal (Bar Value) 5").unwrap();
    let items = e.as_list().unwrap();
    assert_eq!(items[2].to_string(), "(Bar Value)");
    assert_eq!(items[2], Event::words(&["Bar", "Value"]));
}

#[test]
fn script_round_trips_line_by_line() {
    let script = LINES.join("\n");
    let lines = parse_script(&script).unwrap();
    assert_eq!(lines.len(), LINES.len());
    for (parsed, src) in lines.iter().zip(LINES) {
        assert_eq!(parsed.event, parse_event(src).unwrap());
    }
}
