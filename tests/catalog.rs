use std::io::Write;

use clipharvest::catalog::{parse_entries, LabelIndex};
use clipharvest::types::CatalogEntry;

fn write_file(content: &[u8]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content).unwrap();
    file
}

#[test]
fn data_line_yields_one_entry_with_positional_fields() {
    let file = write_file(b"id123, 0.0, 10.0, \"/m/09x0r\"\n");
    let entries = parse_entries(file.path()).unwrap();
    assert_eq!(
        entries,
        vec![CatalogEntry {
            source_id: "id123".to_string(),
            start_time: 0.0,
            end_time: 10.0,
        }]
    );
}

#[test]
fn comment_lines_are_excluded_regardless_of_fields() {
    let index = concat!(
        "# Segments csv created Sun Mar 1 2020\n",
        "# num_ytids=2, num_segs=2\n",
        "first, 0.0, 10.0, \"/m/0dgw9r\"\n",
        "second, 30.0, 40.0, \"/m/09x0r\"\n",
    );
    let entries = parse_entries(write_file(index.as_bytes()).path()).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].source_id, "first");
    assert_eq!(entries[1].start_time, 30.0);
    assert_eq!(entries[1].end_time, 40.0);
}

#[test]
fn entries_preserve_index_order() {
    let index = "zebra, 1.0, 2.0, x\nalpha, 3.0, 4.0, x\n";
    let entries = parse_entries(write_file(index.as_bytes()).path()).unwrap();
    assert_eq!(entries[0].source_id, "zebra");
    assert_eq!(entries[1].source_id, "alpha");
}

#[test]
fn line_with_too_few_fields_aborts_the_load() {
    let index = "good, 0.0, 10.0, x\nbad, 5.0\n";
    assert!(parse_entries(write_file(index.as_bytes()).path()).is_err());
}

#[test]
fn non_numeric_time_aborts_the_load() {
    let index = "bad, start, 10.0, x\n";
    assert!(parse_entries(write_file(index.as_bytes()).path()).is_err());
}

#[test]
fn missing_index_file_is_an_error() {
    assert!(parse_entries("does/not/exist.csv").is_err());
}

#[test]
fn label_resolution_finds_first_exact_match() {
    let ontology = br#"[
        {"id": "/m/0dgw9r", "name": "Human sounds", "description": "Sounds produced by humans"},
        {"id": "/m/09x0r", "name": "Speech", "child_ids": []},
        {"id": "/m/0dup1", "name": "Speech", "child_ids": []}
    ]"#;
    let index = LabelIndex::load(write_file(ontology).path()).unwrap();
    assert_eq!(index.resolve_label("Speech"), Some("/m/09x0r"));
    assert_eq!(index.resolve_label("Human sounds"), Some("/m/0dgw9r"));
}

#[test]
fn unknown_label_is_a_lookup_miss_not_an_error() {
    let ontology = br#"[{"id": "/m/09x0r", "name": "Speech"}]"#;
    let index = LabelIndex::load(write_file(ontology).path()).unwrap();
    assert_eq!(index.resolve_label("Silence"), None);
}

#[test]
fn malformed_ontology_is_an_error() {
    let result = LabelIndex::load(write_file(b"not json").path());
    assert!(result.is_err());
}
