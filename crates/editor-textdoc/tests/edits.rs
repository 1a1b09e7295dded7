use editor_textdoc::{
    DocumentContentChange, DocumentEvent, TextDocument, TextPosition, TextRange,
};
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};

fn pos(line: usize, column: usize) -> TextPosition {
    TextPosition::new(line, column)
}

#[test]
fn test_insert_then_remove_is_identity() {
    let original = "alpha\nbeta gamma\n\ndelta";
    for (at, text) in [
        (pos(0, 0), "x"),
        (pos(1, 4), " and\nmore\nlines "),
        (pos(2, 0), "\n"),
        (pos(3, 5), "\u{e9}\u{4f60}\n"),
    ] {
        let mut doc = TextDocument::from_text(original);
        let end = doc.insert(at, text);
        doc.remove(TextRange::new(at, end));
        assert_eq!(doc.text(), original, "insert {text:?} at {at}");
    }
}

#[test]
fn test_remove_across_lines_merges_into_one() {
    let mut doc = TextDocument::from_text("foo\nbar\n");
    doc.remove(TextRange::new(pos(0, 1), pos(1, 1)));
    assert_eq!(doc.text(), "far\n");
    assert_eq!(doc.line_count(), 2);
    assert_eq!(doc.line_text(0).as_deref(), Some("far"));
}

#[test]
fn test_out_of_range_positions_are_clamped() {
    let mut doc = TextDocument::from_text("abc\nde");
    let end = doc.insert(pos(10, 10), "!");
    assert_eq!(end, pos(1, 3));
    assert_eq!(doc.text(), "abc\nde!");

    let start = doc.remove(TextRange::new(pos(0, 99), pos(99, 99)));
    assert_eq!(start, pos(0, 3));
    assert_eq!(doc.text(), "abc");
}

#[test]
fn test_empty_edits_are_noops() {
    let mut doc = TextDocument::from_text("abc");
    let id = doc.modification_id();
    assert_eq!(doc.insert(pos(0, 1), ""), pos(0, 1));
    assert_eq!(doc.remove(TextRange::caret(pos(0, 2))), pos(0, 2));
    assert_eq!(doc.modification_id(), id);
    assert!(!doc.has_undo());
}

#[test]
fn test_inserted_carriage_returns_are_normalized() {
    let mut doc = TextDocument::new();
    let end = doc.insert(pos(0, 0), "a\r\nb\rc");
    assert_eq!(end, pos(2, 1));
    assert_eq!(doc.line_count(), 3);
    assert_eq!(doc.text(), "a\nb\nc");
}

#[test]
fn test_text_in_range_and_selection_helpers() {
    let mut doc = TextDocument::from_text("one\ntwo\nthree");
    assert_eq!(doc.text_in_range(TextRange::new(pos(2, 2), pos(0, 1))), "ne\ntwo\nth");

    doc.select_all();
    assert_eq!(doc.selected_text(), "one\ntwo\nthree");
    assert_eq!(doc.selection(), doc.doc_range());

    doc.set_selection(TextRange::new(pos(1, 0), pos(2, 0)));
    assert!(doc.has_selection());
    let caret = doc.delete_selection();
    assert_eq!(caret, pos(1, 0));
    assert_eq!(doc.text(), "one\nthree");
    assert!(!doc.has_selection());
}

#[test]
fn test_replace_range_returns_end_of_new_text() {
    let mut doc = TextDocument::from_text("let x = 1;");
    let end = doc.replace_range(TextRange::new(pos(0, 4), pos(0, 5)), "value");
    assert_eq!(end, pos(0, 9));
    assert_eq!(doc.text(), "let value = 1;");
    assert_eq!(doc.undo_stack().undo_depth(), 1);
}

#[test]
fn test_empty_document_bounds() {
    let doc = TextDocument::new();
    assert!(doc.is_empty());
    assert_eq!(doc.line_count(), 1);
    assert_eq!(doc.start_of_doc(), pos(0, 0));
    assert_eq!(doc.end_of_doc(), pos(0, 0));
    assert_eq!(doc.char_at(pos(0, 0)), '\n');
}

#[test]
fn test_events_follow_committed_edits() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let mut doc = TextDocument::from_text("ab");
    let sink = Arc::clone(&events);
    doc.subscribe(move |event| sink.lock().unwrap().push(event.clone()));

    doc.insert(pos(0, 1), "x\ny");
    let seen = std::mem::take(&mut *events.lock().unwrap());
    assert_eq!(
        seen,
        vec![
            DocumentEvent::LineInvalidated(0),
            DocumentEvent::LineInvalidated(1),
            DocumentEvent::TextChanged(DocumentContentChange {
                range: TextRange::caret(pos(0, 1)),
                text: "x\ny".to_string(),
            }),
            DocumentEvent::LineCountChanged { old: 1, new: 2 },
        ]
    );

    doc.undo();
    let seen = std::mem::take(&mut *events.lock().unwrap());
    assert!(seen.contains(&DocumentEvent::LineCountChanged { old: 2, new: 1 }));
    assert_eq!(seen.last(), Some(&DocumentEvent::UndoRedo(editor_textdoc::UndoRedoKind::Undo)));
}

#[test]
fn test_callbacks_can_read_through_a_reader() {
    let mut doc = TextDocument::from_text("hello");
    let reader = doc.reader();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    doc.subscribe(move |event| {
        if let DocumentEvent::LineInvalidated(line) = event {
            sink.lock().unwrap().push(reader.line_text(*line));
        }
    });
    doc.insert(pos(0, 5), "!");
    assert_eq!(*seen.lock().unwrap(), vec![Some("hello!\n".to_string())]);
}
