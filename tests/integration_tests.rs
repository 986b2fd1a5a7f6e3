use nmrstar::schema::{MapSchema, TagType};
use nmrstar::{
    parse_str, parse_str_with_options, to_string, to_string_with_options, Entry, Error, Loop,
    Parser, Saveframe, StarOptions,
};

fn demo_entry() -> Entry {
    let mut authors = Loop::from_scratch();
    authors
        .add_columns(&["_Author.Ordinal", "_Author.Family_name"])
        .unwrap();
    authors
        .add_data(vec![
            "1".into(),
            "Cornilescu".into(),
            "2".into(),
            "Bax".into(),
        ])
        .unwrap();

    let mut frame = Saveframe::from_scratch("entry_information");
    frame
        .add_tag("_Entry.Sf_category", "entry_information")
        .unwrap();
    frame.add_tag("Title", "A demo entry").unwrap();
    frame.add_loop(authors).unwrap();

    let mut entry = Entry::from_scratch("demo");
    entry.add_saveframe(frame).unwrap();
    entry
}

fn assert_roundtrip(entry: &Entry) {
    let text = to_string(entry).unwrap();
    let reparsed = parse_str(&text).unwrap();
    let diffs = entry.compare(&reparsed);
    assert!(diffs.is_empty(), "round trip drift: {:?}\ntext was:\n{}", diffs, text);
}

#[test]
fn test_canonical_output() {
    let expected = "data_demo\n\
                    \n\
                    save_entry_information\n\
                    \x20\x20\x20_Entry.Sf_category   entry_information\n\
                    \x20\x20\x20_Entry.Title         'A demo entry'\n\
                    \n\
                    \x20\x20\x20loop_\n\
                    \x20\x20\x20\x20\x20\x20_Author.Ordinal\n\
                    \x20\x20\x20\x20\x20\x20_Author.Family_name\n\
                    \n\
                    \x20\x20\x20\x20\x20\x201   Cornilescu\n\
                    \x20\x20\x20\x20\x20\x202   Bax\n\
                    \n\
                    \x20\x20\x20stop_\n\
                    \n\
                    save_\n";
    assert_eq!(to_string(&demo_entry()).unwrap(), expected);
}

#[test]
fn test_roundtrip_simple_entry() {
    assert_roundtrip(&demo_entry());
}

#[test]
fn test_roundtrip_awkward_values() {
    let mut frame = Saveframe::from_scratch("awkward");
    frame.add_tag("_Odd.Sf_category", "oddities").unwrap();
    frame.add_tag("Spaces", "two words here").unwrap();
    frame.add_tag("Keyword", "loop_").unwrap();
    frame.add_tag("Hash", "a#b").unwrap();
    frame.add_tag("Single", "don't").unwrap();
    frame.add_tag("Double", "say \"hi\"").unwrap();
    frame.add_tag("Both", "it's a \"word\"").unwrap();
    frame.add_tag("Multiline", "first line\nsecond line\n").unwrap();
    frame.add_tag("Pointer", "$some_frame").unwrap();
    frame.add_tag("Null_like", ".").unwrap();

    let mut entry = Entry::from_scratch("awkward");
    entry.add_saveframe(frame).unwrap();
    assert_roundtrip(&entry);

    let text = to_string(&entry).unwrap();
    let reparsed = parse_str(&text).unwrap();
    let frame = reparsed.get_saveframe("awkward").unwrap();
    assert_eq!(frame.get_tag("Keyword").unwrap(), "loop_");
    assert_eq!(frame.get_tag("Multiline").unwrap(), "first line\nsecond line\n");
    assert_eq!(frame.get_tag("Pointer").unwrap(), "$some_frame");
}

#[test]
fn test_roundtrip_multiline_in_loop() {
    let mut lp = Loop::from_scratch();
    lp.add_columns(&["_Note.ID", "_Note.Text"]).unwrap();
    lp.add_row(vec!["1".into(), "plain".into()]).unwrap();
    lp.add_row(vec!["2".into(), "spans\ntwo lines".into()]).unwrap();
    lp.add_row(vec!["3".into(), "back to plain".into()]).unwrap();

    let mut frame = Saveframe::from_scratch("notes");
    frame.add_tag("_Note_list.Sf_category", "notes").unwrap();
    frame.add_loop(lp).unwrap();
    let mut entry = Entry::from_scratch("n");
    entry.add_saveframe(frame).unwrap();
    assert_roundtrip(&entry);
}

#[test]
fn test_reserved_keyword_as_bare_value_fails() {
    // an unquoted keyword in value position means a terminator went missing
    let result = parse_str("data_1\nsave_1\n_tag.example loop_\nsave_\n");
    match result {
        Err(Error::Parse { line, .. }) => assert_eq!(line, 3),
        other => panic!("expected a parse error, got {:?}", other),
    }
}

#[test]
fn test_basic_parse_shapes() {
    let entry = parse_str("data_test\nsave_frame1\n_Frame1.Name value1\nsave_\n").unwrap();
    assert_eq!(entry.entry_id(), "test");
    assert_eq!(entry.len(), 1);
    let frame = entry.get_saveframe("frame1").unwrap();
    assert_eq!(frame.tag_prefix(), Some("_Frame1"));
    assert_eq!(frame.tags(), [("Name".to_string(), "value1".to_string())]);
}

#[test]
fn test_uniqueness_invariants() {
    let mut entry = demo_entry();
    assert!(matches!(
        entry.add_saveframe(Saveframe::from_scratch("entry_information")),
        Err(Error::AlreadyExists { .. })
    ));

    let frame = entry.get_saveframe_mut("entry_information").unwrap();
    let mut second_authors = Loop::from_scratch();
    second_authors.add_column("_Author.Extra").unwrap();
    assert!(matches!(
        frame.add_loop(second_authors),
        Err(Error::AlreadyExists { .. })
    ));

    let mut lp = Loop::from_scratch();
    lp.add_column("_X.Name").unwrap();
    assert!(matches!(
        lp.add_column("_X.NAME"),
        Err(Error::AlreadyExists { .. })
    ));
}

#[test]
fn test_sorting_and_renumbering_end_to_end() {
    let text = "data_s\nsave_shifts\n_List.Sf_category shifts\n\
                loop_\n_Shift.ID\n_Shift.Val\n3 7.1\n1 9.9\n2 8.5\nstop_\nsave_\n";
    let mut entry = parse_str(text).unwrap();
    let lp = entry
        .get_saveframe_mut("shifts")
        .unwrap()
        .get_loop_mut("_Shift")
        .unwrap();
    lp.sort_rows(&["Val"]).unwrap();
    assert_eq!(lp.get_column("ID").unwrap(), ["3", "2", "1"]);
    lp.renumber_rows("ID", 1, false).unwrap();
    assert_eq!(lp.get_column("ID").unwrap(), ["1", "2", "3"]);
    assert_roundtrip(&entry);
}

#[test]
fn test_filter_preserves_rows() {
    let mut lp = Loop::from_scratch();
    lp.add_columns(&["_T.A", "_T.B", "_T.C"]).unwrap();
    lp.add_data(
        ["1", "x", "q", "2", "y", "r"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
    )
    .unwrap();
    let picked = lp.filter(&["B"], false).unwrap();
    assert_eq!(picked.columns(), ["B"]);
    assert_eq!(picked.rows(), [["x"], ["y"]]);
    assert_eq!(lp.columns().len(), 3); // source untouched
}

#[test]
fn test_rename_and_reference_update() {
    let text = "data_r\nsave_sample_1\n_Sample.Sf_category sample\nsave_\n\
                save_conditions_1\n_Cond.Sf_category conditions\n_Cond.Sample_label $sample_1\nsave_\n";
    let mut entry = parse_str(text).unwrap();
    assert!(entry.validate_references().is_empty());

    entry.rename_saveframe("sample_1", "sample_A").unwrap();
    // references are weak strings; the rename alone dangles them
    assert_eq!(entry.validate_references().len(), 1);
    assert_eq!(entry.update_frame_references("sample_1", "sample_A"), 1);
    assert!(entry.validate_references().is_empty());
    assert_roundtrip(&entry);
}

#[test]
fn test_strict_mode_escalates_warnings() {
    let text = "data_w\nsave_s\n_S.V 1\nloop_\n_L.A\nstop_\nsave_\n";
    let (entry, warnings) = Parser::from_str(text, StarOptions::default())
        .parse_with_warnings()
        .unwrap();
    assert_eq!(entry.len(), 1);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message.contains("no data"));

    let strict = StarOptions::new().with_strict(true);
    assert!(parse_str_with_options(text, &strict).is_err());
}

#[test]
fn test_merge_duplicate_loops_policy() {
    let text = "data_m\nsave_s\n_S.V 1\n\
                loop_\n_Peak.ID\n_Peak.Height\n5 100\n6 200\nstop_\n\
                loop_\n_Peak.ID\n_Peak.Height\n5 300\nstop_\nsave_\n";
    // rejected by default
    assert!(parse_str(text).is_err());

    let options = StarOptions::new().with_merge_duplicate_loops(true);
    let entry = parse_str_with_options(text, &options).unwrap();
    let lp = entry.get_saveframe("s").unwrap().get_loop("_Peak").unwrap();
    assert_eq!(lp.rows().len(), 3);
    assert_eq!(lp.get_column("ID").unwrap(), ["1", "2", "3"]);
    assert_eq!(lp.get_column("Height").unwrap(), ["100", "200", "300"]);
}

#[test]
fn test_empty_loop_serialization_flag() {
    let mut frame = Saveframe::from_scratch("s");
    frame.add_tag("_S.V", "1").unwrap();
    frame.add_loop(Loop::from_scratch()).unwrap();
    let mut entry = Entry::from_scratch("e");
    entry.add_saveframe(frame).unwrap();

    let kept = to_string(&entry).unwrap();
    assert!(kept.contains("loop_"));
    assert!(kept.contains("stop_"));

    let skipped = to_string_with_options(
        &entry,
        &StarOptions::new().with_skip_empty_loops(true),
    )
    .unwrap();
    assert!(!skipped.contains("loop_"));
}

#[test]
fn test_tree_interchange_via_json() {
    let entry = demo_entry();
    let json = serde_json::to_string(&entry.to_tree()).unwrap();
    let tree: nmrstar::EntryTree = serde_json::from_str(&json).unwrap();
    let rebuilt = Entry::from_tree(&tree).unwrap();
    assert!(entry.compare(&rebuilt).is_empty());

    // the interchange shape is stable: tags serialize as [name, value] pairs
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["entry_id"], "demo");
    assert_eq!(value["saveframes"][0]["tags"][0][0], "Sf_category");
    assert_eq!(value["saveframes"][0]["loops"][0]["tags"][0], "Ordinal");
}

#[test]
fn test_schema_validation_findings() {
    let mut schema = MapSchema::new();
    schema.define("_Entry.Sf_category", TagType::Str, false);
    schema.define("_Entry.Title", TagType::Str, true);
    schema.define("_Author.Ordinal", TagType::Int, false);
    schema.define("_Author.Family_name", TagType::Str, false);

    let entry = demo_entry();
    assert!(entry.validate(&schema).is_empty());

    // break the data: an unknown tag plus a non-integer ordinal
    let mut broken = entry.clone();
    let frame = broken.get_saveframe_mut("entry_information").unwrap();
    frame.add_tag("Mystery", "x").unwrap();
    frame
        .get_loop_mut("_Author")
        .unwrap()
        .add_row(vec!["not-a-number".into(), "Doe".into()])
        .unwrap();
    let findings = broken.validate(&schema);
    assert_eq!(findings.len(), 2);
    assert!(findings.iter().any(|f| f.contains("_Entry.Mystery")));
    assert!(findings.iter().any(|f| f.contains("not-a-number")));
}

#[test]
fn test_formatting_error_on_empty_value() {
    let mut frame = Saveframe::from_scratch("s");
    frame.add_tag("_S.V", "").unwrap();
    let mut entry = Entry::from_scratch("e");
    entry.add_saveframe(frame).unwrap();
    assert!(matches!(
        to_string(&entry),
        Err(Error::Formatting { .. })
    ));
}

#[test]
fn test_from_file() {
    let path = std::env::temp_dir().join(format!("nmrstar_test_{}.str", std::process::id()));
    std::fs::write(&path, "data_file\nsave_s\n_S.V 1\nsave_\n").unwrap();
    let entry = Entry::from_file(&path).unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(entry.entry_id(), "file");

    assert!(matches!(
        Entry::from_file("/no/such/path.str"),
        Err(Error::Io(_))
    ));
}

#[test]
fn test_saveframe_template_workflow() {
    let entry = demo_entry();
    let source = entry.get_saveframe("entry_information").unwrap();
    let copy = Saveframe::from_template(source, "entry_information_2", &StarOptions::default());
    assert_eq!(copy.tag_prefix(), Some("_Entry"));
    assert!(copy.tags().iter().all(|(_, value)| value == "."));
    assert!(copy.loops()[0].is_empty());

    let mut entry2 = entry.clone();
    entry2.add_saveframe(copy).unwrap();
    assert_roundtrip(&entry2);
}
