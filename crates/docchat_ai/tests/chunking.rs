use docchat_ai::chunking::{reassemble, Chunker};
use docchat_core::domain::Document;
use pretty_assertions::assert_eq;

#[test]
fn splits_with_exact_overlap_and_prefers_whitespace() {
    let doc = Document::new("sky.txt", "The sky is blue. Grass is green.");
    let chunker = Chunker::new(20, 5).expect("chunker");
    let chunks = chunker.split(&doc);

    let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec!["The sky is blue.", "blue. Grass is green", "green."]);
    assert_eq!(
        chunks.iter().map(|c| c.offset).collect::<Vec<_>>(),
        vec![0, 11, 26]
    );
    assert!(chunks.iter().all(|c| c.source_path == "sky.txt"));
    assert_eq!(reassemble(&chunks, 5), doc.raw_text);
}

#[test]
fn prefers_newline_over_other_whitespace() {
    // Both a newline (index 8) and a space (index 10) fall inside the cut window.
    let doc = Document::new("n.txt", "abcdefgh\ni jklmnop");
    let chunker = Chunker::new(10, 2).expect("chunker");
    let chunks = chunker.split(&doc);
    assert_eq!(chunks[0].text, "abcdefgh");
    assert_eq!(reassemble(&chunks, 2), doc.raw_text);
}

#[test]
fn prefers_paragraph_break_over_single_newline() {
    // Window covers indices 16..=20: a blank line at 16-17 and a lone newline at 19.
    let text = format!("{}\n\nb\ncccccc", "a".repeat(16));
    let doc = Document::new("p.txt", text.clone());
    let chunker = Chunker::new(20, 2).expect("chunker");
    let chunks = chunker.split(&doc);
    assert_eq!(chunks[0].text, "a".repeat(16));
    assert!(chunks[1].text.starts_with("aa\n\n"));
    assert_eq!(reassemble(&chunks, 2), text);
}

#[test]
fn short_and_blank_documents() {
    let chunker = Chunker::new(1000, 40).expect("chunker");
    let short = chunker.split(&Document::new("s.txt", "tiny"));
    assert_eq!(short.len(), 1);
    assert_eq!(short[0].text, "tiny");

    assert!(chunker.split(&Document::new("b.txt", " \n\t ")).is_empty());
    assert!(chunker.split(&Document::new("e.txt", "")).is_empty());
}

#[test]
fn long_text_invariants_hold() {
    let mut text = String::new();
    for i in 0..400 {
        text.push_str(&format!("Sentence number {i} talks about ünïcödé things. "));
        if i % 7 == 0 {
            text.push('\n');
        }
    }
    text.push_str(&"x".repeat(2500));
    let doc = Document::new("long.txt", text.clone());

    for (size, overlap) in [(1000, 40), (200, 0), (64, 63), (7, 3)] {
        let chunker = Chunker::new(size, overlap).expect("chunker");
        let chunks = chunker.split(&doc);
        assert!(!chunks.is_empty());
        for c in &chunks {
            let n = c.text.chars().count();
            assert!(n <= size, "size={size} got={n}");
            assert!(n > 0);
        }
        for pair in chunks.windows(2) {
            let prev: Vec<char> = pair[0].text.chars().collect();
            let tail: String = prev[prev.len() - overlap..].iter().collect();
            let head: String = pair[1].text.chars().take(overlap).collect();
            assert_eq!(tail, head);
            assert!(pair[1].offset > pair[0].offset);
        }
        assert_eq!(reassemble(&chunks, overlap), text);
        assert_eq!(chunker.split(&doc), chunks);
    }
}

#[test]
fn chunks_carry_page_numbers() {
    let mut doc = Document::new("p.pdf", "page one text\npage two text");
    doc.page_starts = vec![0, 14];
    let chunker = Chunker::new(10, 0).expect("chunker");
    let chunks = chunker.split(&doc);
    assert_eq!(chunks[0].page, Some(1));
    assert_eq!(chunks.last().map(|c| c.page), Some(Some(2)));
}

#[test]
fn rejects_overlap_not_below_size() {
    for (size, overlap) in [(0, 0), (10, 10), (10, 20)] {
        let err = Chunker::new(size, overlap).expect_err("invalid");
        assert_eq!(err.code, "CONFIG_INVALID");
    }
}
