//! Invariants that hold for every input, checked over generated tag soup.

use proptest::prelude::*;
use tagsoup::{
    Attributes, DEFAULT_ATTRIBUTE_TYPE, Event, EventKind, HtmlParser, NestingCheck, ParserConfig,
    QName, rules,
};

const NAMES: &[&str] = &[
    "html", "head", "body", "title", "p", "div", "span", "b", "i", "a", "ul", "li", "table",
    "tr", "td", "tbody", "br", "img", "hr", "input", "script", "style", "textarea", "x-widget",
];

fn name() -> impl Strategy<Value = &'static str> {
    prop::sample::select(NAMES)
}

fn text() -> impl Strategy<Value = String> {
    "[a-z &;<>\n]{0,8}"
}

/// One fragment of mostly-plausible, frequently broken markup.
fn piece() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => name().prop_map(|n| format!("<{n}>")),
        3 => name().prop_map(|n| format!("</{n}>")),
        4 => text(),
        1 => (name(), "[a-z]{1,3}", "[a-z\"' ]{0,4}")
            .prop_map(|(n, attr, value)| format!("<{n} {attr}=\"{value}\">")),
        1 => name().prop_map(|n| format!("<{n}/>")),
        1 => text().prop_map(|t| format!("<!--{t}-->")),
        1 => Just("<!DOCTYPE html>".to_string()),
        1 => Just("<".to_string()),
        1 => Just("<![CDATA[".to_string()),
    ]
}

fn soup() -> impl Strategy<Value = String> {
    prop::collection::vec(piece(), 0..40).prop_map(|pieces| pieces.concat())
}

fn config() -> impl Strategy<Value = ParserConfig> {
    (any::<bool>(), any::<bool>(), any::<bool>()).prop_map(|(fragment, synthesize, ignore_root)| {
        ParserConfig {
            document_fragment: fragment,
            synthesize_ancestors: synthesize,
            ignore_root_end_tags: ignore_root,
            ..ParserConfig::default()
        }
    })
}

fn parse(input: &str, config: ParserConfig) -> Vec<Event> {
    let mut events: Vec<Event> = Vec::new();
    HtmlParser::new(config)
        .parse_str(input, &mut events)
        .expect("string input never fails");
    events
}

proptest! {
    #[test]
    fn output_is_always_well_formed(input in soup(), config in config()) {
        let mut check = NestingCheck::new();
        HtmlParser::new(config).parse_str(&input, &mut check).unwrap();
        prop_assert!(check.is_well_formed(), "{:?}", check.violations());
    }

    #[test]
    fn arbitrary_text_is_well_formed(input in "\\PC{0,64}") {
        let mut check = NestingCheck::strict();
        let result = HtmlParser::default().parse_str(&input, &mut check);
        prop_assert!(result.is_ok(), "{result:?}");
        prop_assert!(check.is_well_formed());
    }

    #[test]
    fn synthesized_events_carry_the_sentinel_span(input in soup(), config in config()) {
        for event in parse(&input, config) {
            prop_assert_eq!(event.synthesized, event.span.is_synthesized(), "{}", event);
        }
    }

    #[test]
    fn real_events_follow_source_order(input in soup()) {
        let chars: Vec<char> = input.chars().collect();
        let mut last = 0i64;
        for event in parse(&input, ParserConfig::default()).iter().filter(|e| !e.synthesized) {
            let span = event.span;
            prop_assert!(span.begin.offset >= last, "{} begins before offset {}", event, last);
            prop_assert!(span.begin.offset <= span.end.offset);
            prop_assert!(span.end.offset as usize <= chars.len());
            if let EventKind::ElementStart { .. } = event.kind {
                prop_assert_eq!(chars[span.begin.offset as usize], '<');
            }
            last = span.begin.offset;
        }
    }

    #[test]
    fn void_elements_close_immediately(input in soup(), config in config()) {
        let events = parse(&input, config);
        for (index, event) in events.iter().enumerate() {
            let EventKind::ElementStart { name, .. } = &event.kind else {
                continue;
            };
            if !rules::lookup(name.as_str()).is_void() {
                continue;
            }
            let next = events.get(index + 1).map(|e| &e.kind);
            let closes_it = matches!(next, Some(EventKind::ElementEnd { name: end }) if end == name);
            prop_assert!(closes_it, "{name} followed by {next:?}");
        }
    }

    #[test]
    fn end_tags_alone_never_open_or_close(ends in prop::collection::vec(name(), 0..12), words in "[a-z ]{0,6}") {
        let input: String = ends.iter().map(|n| format!("</{n}>{words}")).collect();
        let config = ParserConfig { document_fragment: true, ..ParserConfig::default() };
        let events = parse(&input, config);
        prop_assert!(events.iter().all(|e| e.kind.element_name().is_none()));
    }

    #[test]
    fn plain_text_passes_through_unchanged(input in "[^<&]{1,64}") {
        let config = ParserConfig { document_fragment: true, ..ParserConfig::default() };
        let text: String = parse(&input, config)
            .iter()
            .filter_map(|e| match &e.kind {
                EventKind::Characters(t) => Some(t.as_str()),
                _ => None,
            })
            .collect();
        prop_assert_eq!(text, input);
    }

    #[test]
    fn attribute_lookup_agrees_with_insertion(pairs in prop::collection::vec(("[a-d]{1,2}", "[a-z]{0,3}"), 0..12)) {
        let mut attributes = Attributes::new();
        for (name, value) in &pairs {
            let index = attributes.add(QName::new(name.as_str()), DEFAULT_ATTRIBUTE_TYPE, value.as_str());
            prop_assert_eq!(attributes.index_of(name), Some(index));
            prop_assert_eq!(attributes.value_at(index), Some(value.as_str()));
        }
        // Later additions of a name replace the value in place.
        for (name, _) in &pairs {
            let last = pairs.iter().rev().find(|(n, _)| n == name).map(|(_, v)| v.as_str());
            prop_assert_eq!(attributes.value_of(name), last);
        }
        let mut distinct: Vec<&String> = pairs.iter().map(|(n, _)| n).collect();
        distinct.sort();
        distinct.dedup();
        prop_assert_eq!(attributes.len(), distinct.len());
    }

    #[test]
    fn removing_earlier_attributes_only_shifts_indices(count in 2usize..10, removed in prop::collection::vec(any::<prop::sample::Index>(), 1..4)) {
        let mut attributes = Attributes::new();
        for i in 0..count {
            attributes.add(QName::new(format!("a{i}")), "ID", format!("v{i}"));
        }
        let target = format!("a{}", count - 1);
        let before = attributes.index_of(&target).unwrap();
        attributes.set_specified(before, false);

        let mut dropped = 0;
        for index in removed {
            let len = attributes.len();
            if len < 2 {
                break;
            }
            // Only entries before the target, which is always last.
            prop_assert!(attributes.remove_at(index.index(len - 1)).is_some());
            dropped += 1;
        }

        let after = attributes.index_of(&target).unwrap();
        let value = format!("v{}", count - 1);
        prop_assert_eq!(after, before - dropped);
        prop_assert_eq!(attributes.value_at(after), Some(value.as_str()));
        prop_assert_eq!(attributes.type_of(&target), Some("ID"));
        prop_assert_eq!(attributes.is_specified(after), Some(false));
    }
}
