use editor_textdoc::{PositionDelta, TextDocument, TextPosition, TextRange};
use pretty_assertions::assert_eq;

fn pos(line: usize, column: usize) -> TextPosition {
    TextPosition::new(line, column)
}

fn sample() -> TextDocument {
    TextDocument::from_text("hello world.foo\n  indented")
}

#[test]
fn test_word_boundaries_inside_a_word() {
    let doc = sample();
    assert_eq!(doc.previous_word_boundary(pos(0, 8), false), pos(0, 6));
    assert_eq!(doc.next_word_boundary(pos(0, 8), false), pos(0, 11));
    assert_eq!(doc.start_of_word(pos(0, 8)), pos(0, 6));
    assert_eq!(doc.end_of_word(pos(0, 8)), pos(0, 11));
    assert_eq!(doc.end_of_word(pos(0, 13)), pos(0, 15));
}

#[test]
fn test_word_boundaries_at_separators() {
    let doc = sample();
    assert_eq!(doc.previous_word_boundary(pos(0, 6), false), pos(0, 6));
    assert_eq!(doc.previous_word_boundary(pos(0, 6), true), pos(0, 5));
    assert_eq!(doc.next_word_boundary(pos(0, 11), false), pos(0, 11));
    assert_eq!(doc.next_word_boundary(pos(0, 11), true), pos(0, 12));
}

#[test]
fn test_word_at() {
    let doc = sample();
    assert_eq!(doc.word_at(pos(0, 8)), "world");
    assert_eq!(doc.word_at(pos(0, 0)), "hello");
    assert_eq!(doc.word_range_at(pos(1, 4)), TextRange::new(pos(1, 2), pos(1, 10)));
}

#[test]
fn test_custom_separators_change_words() {
    let mut doc = TextDocument::from_text("snake_case-name");
    assert_eq!(doc.word_at(pos(0, 2)), "snake_case");
    doc.set_non_word_chars("_-");
    assert_eq!(doc.word_at(pos(0, 2)), "snake");
    assert!(doc.is_non_word('_'));
    assert_eq!(doc.non_word_chars(), "_-");
}

#[test]
fn test_position_offset_wraps_across_lines() {
    let doc = sample();
    assert_eq!(doc.position_offset(pos(0, 15), 1), pos(1, 0));
    assert_eq!(doc.position_offset(pos(1, 0), -1), pos(0, 15));
    assert_eq!(doc.position_offset(pos(0, 14), 4), pos(1, 2));
    assert_eq!(doc.next_char(pos(0, 3)), pos(0, 4));
    assert_eq!(doc.previous_char(pos(0, 3)), pos(0, 2));
}

#[test]
fn test_position_offset_stops_at_document_ends() {
    let doc = sample();
    assert_eq!(doc.position_offset(pos(0, 0), -3), pos(0, 0));
    assert_eq!(doc.position_offset(pos(1, 10), 5), pos(1, 10));
    assert_eq!(doc.next_char(doc.end_of_doc()), doc.end_of_doc());
}

#[test]
fn test_position_offset_saturates_on_huge_offsets() {
    let doc = sample();
    assert_eq!(doc.position_offset(pos(0, 1), isize::MAX), doc.end_of_doc());
    assert_eq!(doc.position_offset(pos(1, 4), isize::MIN), pos(0, 0));
    assert_eq!(doc.position_offset(pos(1, 10), isize::MAX), pos(1, 10));
}

#[test]
fn test_line_and_document_extremes() {
    let doc = sample();
    assert_eq!(doc.start_of_line(pos(1, 7)), pos(1, 0));
    assert_eq!(doc.end_of_line(pos(0, 2)), pos(0, 15));
    assert_eq!(doc.start_of_content(pos(1, 5)), pos(1, 2));
    assert_eq!(doc.start_of_content(pos(1, 1)), pos(1, 1));
    assert_eq!(doc.end_of_doc(), pos(1, 10));
    assert_eq!(doc.doc_range(), TextRange::new(pos(0, 0), pos(1, 10)));
}

#[test]
fn test_sanitize_and_validity() {
    let doc = sample();
    assert_eq!(doc.sanitize_position(pos(5, 50)), pos(1, 10));
    assert_eq!(doc.sanitize_position(pos(0, 99)), pos(0, 15));
    assert!(doc.is_valid_position(pos(0, 15)));
    assert!(!doc.is_valid_position(pos(0, 16)));
    assert!(!doc.is_valid_position(pos(2, 0)));
    assert!(!doc.is_valid_range(TextRange::new(pos(0, 0), pos(3, 0))));

    let range = doc.sanitize_range(TextRange::new(pos(9, 9), pos(0, 2)));
    assert_eq!(range, TextRange::new(pos(1, 9), pos(0, 2)));
    let range = doc.sanitize_range(TextRange::new(pos(9, 99), pos(0, 2)));
    assert_eq!(range, TextRange::new(pos(1, 10), pos(0, 2)));
}

#[test]
fn test_position_offset_by_delta() {
    let doc = sample();
    assert_eq!(
        doc.position_offset_by(pos(0, 12), PositionDelta::new(1, -2)),
        pos(1, 10)
    );
    assert_eq!(
        doc.position_offset_by(pos(1, 3), PositionDelta::new(-4, -9)),
        pos(0, 0)
    );
}

#[test]
fn test_char_at_reports_terminator() {
    let doc = sample();
    assert_eq!(doc.char_at(pos(0, 0)), 'h');
    assert_eq!(doc.char_at(pos(0, 15)), '\n');
    assert_eq!(doc.char_at(pos(1, 10)), '\n');
}
