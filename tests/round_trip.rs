use outliner::io::store::{load_outline, save_outline};
use outliner::model::{Outline, OutlinerConfig, RichText, Row, RowId};
use outliner::ops::export;
use outliner::ops::import::{import_markdown_list, import_opml};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

/// Three top-level rows, each with a child, the first child with a
/// grandchild. The second row is collapsed and the last child complete.
fn sample() -> Outline {
    let mut outline = Outline::new("Round <trip>");
    outline.owner_name = Some("Ana".into());
    outline.vertical_scroll_state = Some(3);
    let tree = outline.tree_mut();
    let one = tree.append(Row::with_topic("One **bold**"), None).unwrap();
    let one_a = tree.append(Row::with_topic("One a"), Some(one)).unwrap();
    let mut deep = Row::with_topic("One a i");
    deep.note = Some(RichText::plain("a note & more"));
    tree.append(deep, Some(one_a)).unwrap();

    let two = tree.append(Row::with_topic("Two"), None).unwrap();
    tree.append(Row::with_topic("Two a"), Some(two)).unwrap();
    tree.get_mut(two).unwrap().is_expanded = false;

    let three = tree.append(Row::with_topic("Three"), None).unwrap();
    let mut done = Row::with_topic("Three a");
    done.is_complete = true;
    tree.append(done, Some(three)).unwrap();
    outline
}

/// (depth, topic markdown, note, complete, expanded) in pre-order
fn shape(outline: &Outline) -> Vec<(usize, String, String, bool, bool)> {
    let tree = outline.tree();
    tree.preorder()
        .into_iter()
        .map(|id: RowId| {
            let row = tree.get(id).unwrap();
            (
                tree.level(id),
                row.topic.as_ref().map(RichText::to_markdown).unwrap_or_default(),
                row.note_text().to_string(),
                row.is_complete,
                row.is_expanded || !row.has_children(),
            )
        })
        .collect()
}

#[test]
fn test_opml_round_trip() {
    let outline = sample();
    let config = OutlinerConfig::default();
    let xml = export::opml(&outline, &config.export);
    let imported = import_opml(&xml, &config).unwrap();

    assert_eq!(imported.title.as_deref(), Some("Round <trip>"));
    assert_eq!(imported.rows().len(), 3);
    assert_eq!(imported.owner_name.as_deref(), Some("Ana"));
    assert_eq!(imported.vertical_scroll_state, Some(3));
    assert_eq!(shape(&imported), shape(&outline));
    assert_eq!(export::opml(&imported, &config.export), xml);
}

#[test]
fn test_markdown_list_round_trip() {
    let outline = sample();
    let md = export::markdown_list(&outline);
    let imported = import_markdown_list(&md, &OutlinerConfig::default()).unwrap();

    assert_eq!(imported.title.as_deref(), Some("Round <trip>"));
    // Expansion is not part of the markdown form
    let flatten = |s: Vec<(usize, String, String, bool, bool)>| {
        s.into_iter().map(|(d, t, n, c, _)| (d, t, n, c)).collect::<Vec<_>>()
    };
    assert_eq!(flatten(shape(&imported)), flatten(shape(&outline)));
}

#[test]
fn test_store_round_trip_keeps_keys() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("doc.json");
    let outline = sample();
    save_outline(&path, &outline).unwrap();

    let loaded = load_outline(&path, &OutlinerConfig::default()).unwrap();
    assert_eq!(loaded.id, outline.id);
    assert_eq!(shape(&loaded), shape(&outline));
    let keys = |o: &Outline| {
        o.tree()
            .preorder()
            .into_iter()
            .map(|id| o.find_row(id).unwrap().order.clone())
            .collect::<Vec<_>>()
    };
    assert_eq!(keys(&loaded), keys(&outline));
}

#[test]
fn test_bad_opml_leaves_nothing() {
    let err = import_opml("<opml><head></head></opml>", &OutlinerConfig::default());
    assert!(err.is_err());
}
