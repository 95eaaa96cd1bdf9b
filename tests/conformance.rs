//! Integration tests against the public `streamcsv::Parser` API, covering
//! the documented grammar scenarios and chunk-boundary behaviors.

use streamcsv::{ErrorKind, OwnedRow, Parser, ParserOptions};

fn parse_all(input: &[u8], options: ParserOptions) -> Result<Vec<OwnedRow>, streamcsv::Error> {
    let mut parser = Parser::new(options)?;
    parser.parse_buffer_collect(input, true)
}

fn fields_as_strings(row: &OwnedRow) -> Vec<String> {
    row.fields
        .iter()
        .map(|f| String::from_utf8_lossy(f).into_owned())
        .collect()
}

#[test]
fn simple_two_row_csv() {
    let rows = parse_all(b"a,b,c\n1,2,3\n", ParserOptions::default()).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(fields_as_strings(&rows[0]), vec!["a", "b", "c"]);
    assert_eq!(fields_as_strings(&rows[1]), vec!["1", "2", "3"]);
}

#[test]
fn quoted_field_with_embedded_newline_and_doubled_quote() {
    let input = b"a,\"b\nc\",\"d\"\"e\"\n";
    let rows = parse_all(input, ParserOptions::default()).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(fields_as_strings(&rows[0]), vec!["a", "b\nc", "d\"e"]);
}

#[test]
fn trailing_delimiter_yields_empty_final_field() {
    let rows = parse_all(b"a,b,\n", ParserOptions::default()).unwrap();
    assert_eq!(fields_as_strings(&rows[0]), vec!["a", "b", ""]);
}

#[test]
fn mixed_line_terminators_split_rows_correctly() {
    let rows = parse_all(b"a\r\nb\rc\n", ParserOptions::default()).unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(fields_as_strings(&rows[0]), vec!["a"]);
    assert_eq!(fields_as_strings(&rows[1]), vec!["b"]);
    assert_eq!(fields_as_strings(&rows[2]), vec!["c"]);
}

#[test]
fn no_trailing_terminator_still_flushes_final_row() {
    let rows = parse_all(b"a,b,c", ParserOptions::default()).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(fields_as_strings(&rows[0]), vec!["a", "b", "c"]);
}

#[test]
fn empty_input_yields_no_rows() {
    let rows = parse_all(b"", ParserOptions::default()).unwrap();
    assert!(rows.is_empty());
}

#[test]
fn lone_terminator_dropped_when_ignore_empty_lines_is_set() {
    let options = ParserOptions::builder()
        .ignore_empty_lines(true)
        .build()
        .unwrap();
    let rows = parse_all(b"a,b\n\nc,d\n", options).unwrap();
    assert_eq!(rows.len(), 2);
}

#[test]
fn lone_terminator_kept_as_single_empty_field_when_not_ignored() {
    let options = ParserOptions::builder()
        .ignore_empty_lines(false)
        .build()
        .unwrap();
    let rows = parse_all(b"a,b\n\nc,d\n", options).unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(fields_as_strings(&rows[1]), vec![""]);
}

#[test]
fn unterminated_quote_is_an_error_in_strict_mode() {
    let options = ParserOptions::builder().strict(true).build().unwrap();
    let err = parse_all(b"a,\"b", options).unwrap_err();
    assert_eq!(err.kind, ErrorKind::ParseError);
}

#[test]
fn unterminated_quote_is_tolerated_in_non_strict_mode() {
    let options = ParserOptions::builder().strict(false).build().unwrap();
    let rows = parse_all(b"a,\"b", options).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(fields_as_strings(&rows[0]), vec!["a", "b"]);
}

#[test]
fn whitespace_is_trimmed_only_in_unquoted_fields() {
    let options = ParserOptions::builder().trim(true).build().unwrap();
    let rows = parse_all(b" a , \"b\" \n", options).unwrap();
    assert_eq!(fields_as_strings(&rows[0]), vec!["a", "b"]);
}

#[test]
fn tsv_delimiter_is_honored() {
    let options = ParserOptions::builder().delimiter(b'\t').build().unwrap();
    let rows = parse_all(b"a\tb\tc\n", options).unwrap();
    assert_eq!(fields_as_strings(&rows[0]), vec!["a", "b", "c"]);
}

#[test]
fn field_split_across_chunks_is_reassembled() {
    let mut parser = Parser::new(ParserOptions::default()).unwrap();
    let mut rows = parser.parse_buffer_collect(b"a,\"hel", false).unwrap();
    rows.extend(parser.parse_buffer_collect(b"lo\",c\n", true).unwrap());
    assert_eq!(rows.len(), 1);
    assert_eq!(fields_as_strings(&rows[0]), vec!["a", "hello", "c"]);
}

#[test]
fn unquoted_field_split_across_chunks_is_reassembled() {
    let mut parser = Parser::new(ParserOptions::default()).unwrap();
    let mut rows = parser.parse_buffer_collect(b"ab", false).unwrap();
    rows.extend(parser.parse_buffer_collect(b"cd,e\n", true).unwrap());
    assert_eq!(rows.len(), 1);
    assert_eq!(fields_as_strings(&rows[0]), vec!["abcd", "e"]);
}

#[test]
fn bare_cr_at_chunk_boundary_is_not_double_counted_as_two_terminators() {
    let mut parser = Parser::new(ParserOptions::default()).unwrap();
    let mut rows = parser.parse_buffer_collect(b"a,b\r", false).unwrap();
    rows.extend(parser.parse_buffer_collect(b"\nc,d\n", true).unwrap());
    assert_eq!(rows.len(), 2);
}

#[test]
fn row_numbers_and_byte_offsets_are_monotonic() {
    let rows = parse_all(b"a\nb\nc\n", ParserOptions::default()).unwrap();
    assert_eq!(rows[0].row_number, 1);
    assert_eq!(rows[1].row_number, 2);
    assert_eq!(rows[2].row_number, 3);
    assert!(rows[0].byte_offset < rows[1].byte_offset);
    assert!(rows[1].byte_offset < rows[2].byte_offset);
}

#[test]
fn stats_report_bytes_in_and_rows_out() {
    let mut parser = Parser::new(ParserOptions::default()).unwrap();
    let input = b"a,b\nc,d\n";
    parser.parse_buffer(input, true).unwrap();
    let stats = parser.get_stats();
    assert_eq!(stats.bytes_in, input.len() as u64);
    assert_eq!(stats.rows_out, 2);
    assert_eq!(stats.fields_out, 4);
}

#[test]
fn row_callback_receives_zero_copy_views() {
    use std::cell::RefCell;
    use std::rc::Rc;

    let seen: Rc<RefCell<Vec<Vec<String>>>> = Rc::new(RefCell::new(Vec::new()));
    let seen_in_callback = Rc::clone(&seen);
    let mut parser = Parser::new(ParserOptions::default()).unwrap();
    parser.set_row_callback(move |row| {
        let fields: Vec<String> = row
            .fields()
            .map(|f| String::from_utf8_lossy(f.bytes()).into_owned())
            .collect();
        seen_in_callback.borrow_mut().push(fields);
    });
    parser.parse_buffer(b"a,b\nc,d\n", true).unwrap();
    assert_eq!(seen.borrow().len(), 2);
    assert_eq!(seen.borrow()[0], vec!["a", "b"]);
}
