use editor_textdoc::{
    DocumentConfig, TextDocument, TextPosition, TextRange, UndoCommand, UndoStack,
};
use pretty_assertions::assert_eq;
use std::time::Duration;

fn pos(line: usize, column: usize) -> TextPosition {
    TextPosition::new(line, column)
}

fn doc_with_timeout(ms: u64) -> TextDocument {
    TextDocument::with_config(DocumentConfig {
        merge_timeout_ms: ms,
        ..DocumentConfig::default()
    })
}

#[test]
fn test_undo_redo_single_insert() {
    let mut doc = TextDocument::new();
    doc.insert(pos(0, 0), "a");
    assert_eq!(doc.text(), "a");
    assert!(doc.has_undo());
    assert!(!doc.has_redo());

    assert!(doc.undo());
    assert_eq!(doc.text(), "");
    assert!(!doc.has_undo());
    assert!(doc.has_redo());

    assert!(doc.redo());
    assert_eq!(doc.text(), "a");
    assert_eq!(doc.selection(), TextRange::caret(pos(0, 1)));
    assert!(!doc.has_redo());

    assert!(!doc.redo());
}

#[test]
fn test_keystrokes_within_timeout_coalesce() {
    let mut doc = doc_with_timeout(10_000);
    doc.insert(pos(0, 0), "h");
    doc.insert(pos(0, 1), "i");
    assert_eq!(doc.undo_stack().undo_depth(), 1);
    assert!(matches!(
        doc.undo_stack().last_undo(),
        Some(UndoCommand::Insert { text, .. }) if text == "hi"
    ));

    doc.undo();
    assert_eq!(doc.text(), "");
}

#[test]
fn test_insert_after_timeout_is_a_separate_step() {
    let mut doc = doc_with_timeout(30);
    doc.insert(pos(0, 0), "h");
    doc.insert(pos(0, 1), "i");
    std::thread::sleep(Duration::from_millis(80));
    doc.insert(pos(0, 2), "!");
    assert_eq!(doc.undo_stack().undo_depth(), 2);

    doc.undo();
    assert_eq!(doc.text(), "hi");
    doc.undo();
    assert_eq!(doc.text(), "");
}

#[test]
fn test_end_undo_group_breaks_coalescing() {
    let mut doc = doc_with_timeout(10_000);
    doc.insert(pos(0, 0), "a");
    doc.end_undo_group();
    doc.insert(pos(0, 1), "b");
    assert_eq!(doc.undo_stack().undo_depth(), 2);
}

#[test]
fn test_remove_then_undo_restores_text_and_selection() {
    let mut doc = TextDocument::from_text("first line\nsecond line\nthird");
    let selection = TextRange::new(pos(1, 7), pos(0, 6));
    doc.set_selection(selection);
    doc.remove(TextRange::new(pos(0, 6), pos(2, 2)));
    assert_eq!(doc.text(), "first ird");

    doc.undo();
    assert_eq!(doc.text(), "first line\nsecond line\nthird");
    assert_eq!(doc.selection(), selection);
}

#[test]
fn test_backspace_run_coalesces_and_undoes_in_one_step() {
    let mut doc = doc_with_timeout(10_000);
    doc.insert(pos(0, 0), "hello");
    doc.end_undo_group();
    for column in (2..5).rev() {
        doc.remove(TextRange::new(pos(0, column), pos(0, column + 1)));
    }
    assert_eq!(doc.text(), "he");
    assert_eq!(doc.undo_stack().undo_depth(), 2);

    doc.undo();
    assert_eq!(doc.text(), "hello");
}

#[test]
fn test_new_edit_clears_redo() {
    let mut doc = TextDocument::new();
    doc.insert(pos(0, 0), "abc");
    doc.undo();
    assert!(doc.has_redo());
    doc.insert(pos(0, 0), "x");
    assert!(!doc.has_redo());
}

#[test]
fn test_history_is_bounded() {
    let mut doc = TextDocument::with_config(DocumentConfig {
        max_undo_stack_size: 6,
        merge_timeout_ms: 0,
        ..DocumentConfig::default()
    });
    for i in 0..10 {
        doc.insert(pos(0, i), "x");
    }
    assert_eq!(doc.undo_stack().undo_len(), 6);
    assert_eq!(doc.undo_stack().undo_depth(), 3);

    while doc.undo() {}
    assert_eq!(doc.text(), "xxxxxxx");
}

#[test]
fn test_replace_selection_is_one_step() {
    let mut doc = TextDocument::from_text("hello world");
    doc.set_selection(TextRange::new(pos(0, 6), pos(0, 11)));
    let end = doc.replace_selection("there\nfriend");
    assert_eq!(end, pos(1, 6));
    assert_eq!(doc.text(), "hello there\nfriend");
    assert_eq!(doc.selection(), TextRange::caret(pos(1, 6)));

    doc.undo();
    assert_eq!(doc.text(), "hello world");
    assert_eq!(doc.selection(), TextRange::new(pos(0, 6), pos(0, 11)));

    doc.redo();
    assert_eq!(doc.text(), "hello there\nfriend");
}

#[test]
fn test_dirty_tracking_follows_history() {
    let mut doc = TextDocument::from_text("abc");
    assert!(!doc.is_dirty());
    doc.insert(pos(0, 3), "d");
    assert!(doc.is_dirty());
    doc.mark_clean();
    assert!(!doc.is_dirty());
    doc.insert(pos(0, 4), "e");
    assert!(doc.is_dirty());
    doc.undo();
    assert!(!doc.is_dirty());
    doc.undo();
    assert!(doc.is_dirty());
    doc.redo();
    assert!(!doc.is_dirty());
}

#[test]
fn test_undo_history_survives_json() {
    let mut doc = TextDocument::new();
    doc.insert(pos(0, 0), "one\ntwo");
    doc.end_undo_group();
    doc.remove(TextRange::new(pos(0, 1), pos(1, 1)));
    let json = doc.undo_stack().to_json().unwrap();

    let mut restored = TextDocument::from_text(&doc.text());
    restored.undo_stack_mut().from_json(&json).unwrap();
    restored.undo();
    assert_eq!(restored.text(), "one\ntwo");
    restored.undo();
    assert_eq!(restored.text(), "");

    let mut stack = UndoStack::default();
    assert!(stack.from_json("[]").is_ok());
    assert!(!stack.has_undo());
}
