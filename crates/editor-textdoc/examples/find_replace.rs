use editor_textdoc::{
    DocumentEvent, SearchMode, SearchOptions, SearchState, TextDocument, TextPosition, TextRange,
};

fn main() {
    let mut doc = TextDocument::from_text("let width = 10;\nlet height = 20;\nlet area = width * height;");
    doc.subscribe(|event| {
        if let DocumentEvent::LineCountChanged { old, new } = event {
            println!("line count: {old} -> {new}");
        }
    });

    // Rename a variable everywhere as one undo step.
    let whole_word = SearchOptions {
        whole_word: true,
        ..SearchOptions::default()
    };
    assert_eq!(doc.replace_all("width", "w", whole_word), 2);
    assert_eq!(doc.line_text(2).as_deref(), Some("let area = w * height;"));

    // Walk the numeric literals with a Lua pattern.
    let mut state = SearchState::new("%d+", SearchOptions::with_mode(SearchMode::LuaPattern))
        .wrap(false);
    while let Some(found) = doc.find_next(&state) {
        println!("number at {} : {}", found.start, doc.text_in_range(found));
        state.from = found.end;
    }

    // Swap `let x = ...` into `const X: i32 = ...` with regex captures.
    let regex = SearchOptions::with_mode(SearchMode::Regex);
    doc.replace_all(r"^let (\w+) = (\d+);", "const ${1}: i32 = $2;", regex);
    assert_eq!(doc.line_text(0).as_deref(), Some("const w: i32 = 10;"));

    // Typing is coalesced, and undo restores the previous selection.
    doc.set_selection(TextRange::caret(TextPosition::new(2, 0)));
    let mut at = doc.selection().end;
    for ch in ["/", "/", " "] {
        at = doc.insert(at, ch);
    }
    println!("{}", doc.text());

    doc.undo();
    doc.undo();
    doc.undo();
    assert_eq!(doc.text(), "let width = 10;\nlet height = 20;\nlet area = width * height;");
}
