//! Property-based tests - pragmatic coverage of the core guarantees:
//! formatter invertibility, document round-tripping, the row-width
//! invariant, and renumbering idempotence.

use proptest::prelude::*;

use nmrstar::quote::quote_value;
use nmrstar::token::{TokenSource, Tokenizer};
use nmrstar::{parse_str, to_string, Entry, Loop, Saveframe, StarOptions};

/// Formats one value, then reads it back through the tokenizer the way the
/// serializer would place it: inline forms sit after whitespace, multi-line
/// forms start at column zero.
fn read_back(value: &str) -> String {
    let quoted = quote_value(value, &StarOptions::default()).unwrap();
    let text = if quoted.is_multiline() {
        quoted.render()
    } else {
        format!(" {}", quoted.render())
    };
    let mut tokens = Tokenizer::new(&text);
    tokens.next_token().unwrap().unwrap().text
}

/// Printable-ASCII values exercise every inline quoting rule.
fn value_strategy() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[ -~]{1,12}").unwrap()
}

proptest! {
    #[test]
    fn prop_formatter_invertibility(v in any::<String>().prop_filter(
        "representable values",
        |v| !v.is_empty()
            && !v.contains('\r')
            && !v.contains("\n;")
            && !(v.starts_with(';') && v.contains('\n')),
    )) {
        prop_assert_eq!(read_back(&v), v);
    }

    #[test]
    fn prop_inline_values_round_trip(v in value_strategy()) {
        prop_assert_eq!(read_back(&v), v);
    }

    #[test]
    fn prop_document_round_trip(
        tag_values in prop::collection::vec(value_strategy(), 2),
        cells in prop::collection::vec(value_strategy(), 6),
    ) {
        let mut lp = Loop::from_scratch();
        lp.add_columns(&["_Data.A", "_Data.B", "_Data.C"]).unwrap();
        lp.add_data(cells).unwrap();

        let mut frame = Saveframe::from_scratch("frame_one");
        frame.add_tag("_Info.Sf_category", "info").unwrap();
        frame.add_tag("First", tag_values[0].as_str()).unwrap();
        frame.add_tag("Second", tag_values[1].as_str()).unwrap();
        frame.add_loop(lp).unwrap();

        let mut entry = Entry::from_scratch("prop");
        entry.add_saveframe(frame).unwrap();

        let text = to_string(&entry).unwrap();
        let reparsed = parse_str(&text).unwrap();
        let diffs = entry.compare(&reparsed);
        prop_assert!(diffs.is_empty(), "drift {:?} in:\n{}", diffs, text);
    }

    #[test]
    fn prop_row_width_invariant(cells in prop::collection::vec(value_strategy(), 12)) {
        let mut lp = Loop::from_scratch();
        lp.add_columns(&["_T.A", "_T.B", "_T.C"]).unwrap();
        lp.add_data(cells).unwrap();

        lp.sort_rows(&["A", "C"]).unwrap();
        prop_assert!(lp.rows().iter().all(|row| row.len() == 3));

        let picked = lp.filter(&["C", "A"], false).unwrap();
        prop_assert!(picked.rows().iter().all(|row| row.len() == 2));

        lp.renumber_rows("B", 1, false).unwrap();
        prop_assert!(lp.rows().iter().all(|row| row.len() == 3));
    }

    #[test]
    fn prop_renumber_idempotent(ids in prop::collection::vec(0i64..1000, 1..8)) {
        let mut lp = Loop::from_scratch();
        lp.add_column("_T.ID").unwrap();
        for id in &ids {
            lp.add_row(vec![id.to_string()]).unwrap();
        }
        lp.renumber_rows("ID", 1, false).unwrap();
        let once = lp.get_column("ID").unwrap();
        lp.renumber_rows("ID", 1, false).unwrap();
        prop_assert_eq!(once, lp.get_column("ID").unwrap());
    }

    #[test]
    fn prop_sort_is_stable_and_total(cells in prop::collection::vec(value_strategy(), 9)) {
        let mut lp = Loop::from_scratch();
        lp.add_columns(&["_T.A", "_T.B", "_T.C"]).unwrap();
        lp.add_data(cells).unwrap();
        let rows_before = lp.rows().len();
        lp.sort_rows(&["B"]).unwrap();
        prop_assert_eq!(lp.rows().len(), rows_before);
        lp.sort_rows(&["B"]).unwrap();
        let first = lp.rows().to_vec();
        lp.sort_rows(&["B"]).unwrap();
        prop_assert_eq!(first, lp.rows().to_vec());
    }
}
