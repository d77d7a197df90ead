//! WASM browser tests for annotate-browser.
//!
//! Run with: `wasm-pack test --headless --firefox` or `--chrome`

use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

use annotate_browser::{
    AnnotateConfig, AnnotationRecord, AnnotationStore, Annotator, DocumentTree, LocalStore,
    MemoryStore, SelectionSnapshot, WebDocument,
};
use web_sys::{Element, Node};

fn mount(html: &str) -> (WebDocument, Element) {
    let doc = WebDocument::current().unwrap();
    let container = doc.raw().create_element("div").unwrap();
    container.set_inner_html(html);
    doc.raw().body().unwrap().append_child(&container).unwrap();
    (doc, container)
}

fn first_text(doc: &WebDocument, element: &Element) -> Node {
    doc.descendant_text_nodes(element.as_ref())[0].clone()
}

// === DocumentTree ===

#[wasm_bindgen_test]
fn test_split_text_counts_chars() {
    let (mut doc, container) = mount("<p>a😀b tail</p>");
    let text = first_text(&doc, &container);

    // "a😀b" is three chars but four UTF-16 units.
    let rest = doc.split_text(&text, 3).unwrap();
    assert_eq!(doc.text(&text).as_deref(), Some("a😀b"));
    assert_eq!(doc.text(&rest).as_deref(), Some(" tail"));
    container.remove();
}

#[wasm_bindgen_test]
fn test_wrap_and_unwrap() {
    let (mut doc, container) = mount("<p>alpha beta</p>");
    let text = first_text(&doc, &container);
    let rest = doc.split_text(&text, 6).unwrap();

    let wrapper = doc.wrap(&rest, "span").unwrap();
    assert_eq!(container.inner_html(), "<p>alpha <span>beta</span></p>");

    doc.unwrap(&wrapper).unwrap();
    assert_eq!(container.inner_html(), "<p>alpha beta</p>");
    let p = doc.child_elements(container.as_ref())[0].clone();
    assert_eq!(doc.child_nodes(&p).len(), 1);
    container.remove();
}

#[wasm_bindgen_test]
fn test_tag_names_are_lowercase() {
    let (doc, container) = mount("<P>x</P>");
    let p = doc.child_elements(container.as_ref())[0].clone();
    assert_eq!(doc.tag_name(&p).as_deref(), Some("p"));
    container.remove();
}

// === Annotator over the live page ===

#[wasm_bindgen_test]
fn test_highlight_and_delete() {
    let (doc, container) = mount("<p>The quick fox. The quick fox.</p>");
    let text = first_text(&doc, &container);

    let mut annotator = Annotator::new(doc, MemoryStore::new(), AnnotateConfig::default());
    let snapshot = SelectionSnapshot::within(text, 19, 28, "quick fox");
    let ordinal = annotator.handle_selection(&snapshot).unwrap().unwrap().ordinal;
    assert_eq!(ordinal, 1);
    let id = annotator.choose_color(0).unwrap().id.clone();

    assert_eq!(
        container.inner_html(),
        format!(
            "<p>The quick fox. The <span class=\"__annotate-highlight__\" annotate-id=\"{id}\" \
             style=\"background-color: rgb(255, 173, 173);\">quick fox</span>.</p>"
        )
    );

    // Delete leaves the page as it was.
    annotator.delete().unwrap();
    assert_eq!(container.inner_html(), "<p>The quick fox. The quick fox.</p>");
    container.remove();
}

#[wasm_bindgen_test]
fn test_emoji_offsets_round_trip() {
    let (doc, container) = mount("<p>😀 note, 😀 note</p>");
    let text = first_text(&doc, &container);

    let mut annotator = Annotator::new(doc, MemoryStore::new(), AnnotateConfig::default());
    let snapshot = SelectionSnapshot::within(text, 10, 14, "note");
    annotator.handle_selection(&snapshot).unwrap().unwrap();
    let id = annotator.choose_color(0).unwrap().id.clone();

    let record = annotator.record(&id).unwrap();
    assert_eq!(record.ordinal, 1);
    let spans = container.get_elements_by_class_name("__annotate-highlight__");
    assert_eq!(spans.length(), 1);
    let span = spans.item(0).unwrap();
    assert_eq!(span.text_content().as_deref(), Some("note"));
    assert_eq!(
        span.previous_sibling().and_then(|n| n.text_content()).as_deref(),
        Some("😀 note, 😀 ")
    );
    container.remove();
}

// === LocalStore ===

#[wasm_bindgen_test]
fn test_local_store_prefix() {
    let mut store = LocalStore::new("annotate-test:");
    store.clear().unwrap();

    let record = AnnotationRecord::from_json(
        "825706e58622",
        r#"{"id":"825706e58622","path":[["body",0]],"encodedRegex":"x","pos":0}"#,
    )
    .unwrap();
    store.set(&record.id, &record.to_json().unwrap()).unwrap();

    let entries = store.entries().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].0, "825706e58622");
    assert_eq!(
        AnnotationRecord::from_json(&entries[0].0, &entries[0].1).unwrap(),
        record
    );

    // Stored raw, not as a JSON string.
    let raw = web_sys::window()
        .unwrap()
        .local_storage()
        .unwrap()
        .unwrap()
        .get_item("annotate-test:825706e58622")
        .unwrap()
        .unwrap();
    assert!(raw.starts_with('{'));

    store.delete(&record.id).unwrap();
    assert!(store.entries().unwrap().is_empty());
}
