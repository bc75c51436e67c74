//! Tests for chronological keys and the merged timeline

use rstest::rstest;
use serde_yaml::Value;

use lorewiki::domain::chrono_key::decode;
use lorewiki::domain::{ChronoDecodeError, ChronoKey, TimelineAggregator};

#[rstest]
#[case("2020-01-01", (2020, 1, 1))]
#[case("1999/12/31", (1999, 12, 31))]
#[case("5 Y 3 M KAL", (5, 3, 1))]
#[case("-44 Y 3 M 15 IDE", (-44, 3, 30))]
#[case("-44Y 3M 15IDE", (-44, 3, 30))]
#[case("7 Y 2 M NON", (7, 2, 5))]
fn given_date_when_decoding_then_expected_key(#[case] date: &str, #[case] key: (i64, i64, i64)) {
    assert_eq!(decode(date).unwrap(), ChronoKey::from(key));
}

#[test]
fn given_unknown_marker_when_decoding_then_unknown_marker_error() {
    assert!(matches!(
        decode("5 Y 3 M 4 FOO"),
        Err(ChronoDecodeError::UnknownMarker { .. })
    ));
}

#[test]
fn given_calendar_and_standard_dates_when_comparing_then_year_dominates() {
    assert!(decode("-44Y 3M 15IDE").unwrap() < decode("5Y 3M KAL").unwrap());
    assert!(decode("5Y 3M KAL").unwrap() < decode("2020-01-01").unwrap());
}

fn events(yaml: &str) -> Vec<Value> {
    serde_yaml::from_str(yaml).unwrap()
}

#[test]
fn given_several_documents_when_finishing_then_timeline_non_decreasing_and_tagged() {
    let mut agg = TimelineAggregator::new();
    agg.push_document(
        "Aria",
        &events(
            r#"
- {Date: "12Y 4M KAL", Event: crowned}
- {Date: "-3Y 1M KAL", Event: born}
"#,
        ),
    )
    .unwrap();
    agg.push_document(
        "Ostra",
        &events(
            r#"
- {Date: "5Y 6M 15IDE", Event: founded}
"#,
        ),
    )
    .unwrap();

    let timeline = agg.finish();

    let order: Vec<_> = timeline
        .iter()
        .map(|e| (e.source.as_str(), e.payload.get("Event").and_then(Value::as_str)))
        .collect();
    assert_eq!(
        order,
        vec![
            ("Aria", Some("born")),
            ("Ostra", Some("founded")),
            ("Aria", Some("crowned")),
        ]
    );
    let rendered = timeline.to_value();
    assert_eq!(rendered.as_sequence().map(Vec::len), Some(3));
}

#[test]
fn given_bad_event_date_when_pushing_then_whole_document_fails() {
    let mut agg = TimelineAggregator::new();
    let result = agg.push_document(
        "Aria",
        &events(r#"[{Date: "1Y 1M KAL"}, {Date: "1Y 1M WAT"}]"#),
    );
    assert!(result.is_err());
}
