use super::*;

// =============================================================
// Document
// =============================================================

#[test]
fn blank_detects_empty_editor_markup() {
    assert!(Document::new("").is_blank());
    assert!(Document::new("   \n\t").is_blank());
    assert!(Document::new("<p><br></p>").is_blank());
    assert!(Document::new("<p>&nbsp;</p><p> </p>").is_blank());
    assert!(!Document::new("<p>x</p>").is_blank());
}

#[test]
fn plain_text_strips_tags_and_decodes_entities() {
    let doc = Document::new("<h1>Title</h1><p>Fish &amp; chips<br/>and&nbsp;<strong>peas</strong></p>");
    assert_eq!(doc.plain_text(), "Title Fish & chips and peas");
}

#[test]
fn block_tags_separate_words() {
    let doc = Document::new("<p>one</p><p>two</p><ul><li>three</li></ul>");
    assert_eq!(doc.word_count(), 3);
}

#[test]
fn inline_tags_do_not_split_words() {
    assert_eq!(Document::new("<p>un<em>break</em>able</p>").plain_text(), "unbreakable");
}

#[test]
fn preview_truncates_with_ellipsis() {
    let doc = Document::new("<p>The quick brown fox</p>");
    assert_eq!(doc.preview(10), "The quick...");
    assert_eq!(doc.preview(100), "The quick brown fox");
}

// =============================================================
// Editor
// =============================================================

#[test]
fn replace_bumps_revision() {
    let mut editor = Editor::new("<p>a</p>", false);
    assert_eq!(editor.replace("<p>ab</p>").unwrap(), 1);
    assert_eq!(editor.replace("<p>abc</p>").unwrap(), 2);
    assert_eq!(editor.html(), "<p>abc</p>");
}

#[test]
fn read_only_rejects_user_edits() {
    let mut editor = Editor::new("<p>final</p>", false);
    editor.set_read_only(true);
    assert!(matches!(editor.replace("<p>changed</p>"), Err(ClientError::ReadOnly)));
    assert_eq!(editor.html(), "<p>final</p>");
    assert_eq!(editor.revision(), 0);
}

#[test]
fn load_ignores_read_only_and_revision() {
    let mut editor = Editor::new("", true);
    editor.load("<p>from server</p>");
    assert_eq!(editor.html(), "<p>from server</p>");
    assert_eq!(editor.revision(), 0);
    assert!(editor.is_read_only());
}
