//! Integration tests for editor crate

use pagecraft_editor::{
    Catalog, Document, EditorConfig, EditorError, EditorSession, GeometryDelta, Mutation,
    PlacedComponent, Properties,
};
use serde_json::json;

const CATALOG: &str = r#"[
    {
        "id": "hero-banner",
        "name": "Hero banner",
        "category": "layout",
        "icon": "panorama",
        "template": {
            "type": "hero",
            "properties": { "title": "Welcome", "align": "center" },
            "geometry": { "x": 0, "y": 0, "width": 960, "height": 320 }
        }
    },
    {
        "id": "cta-button",
        "name": "Call to action",
        "category": "controls",
        "template": { "type": "button", "properties": { "label": "Buy now" } }
    }
]"#;

#[test]
fn test_session_lifecycle() {
    let mut session = EditorSession::new("tab-1", EditorConfig::default());

    // Build a small page
    let hero = session.add_component("hero", None, None).unwrap();
    let title = session.add_component("text", Some(&hero), None).unwrap();
    let button = session.add_component("button", Some(&hero), None).unwrap();

    assert_eq!(session.document().len(), 3);
    assert_eq!(session.revision(), 3);

    let order: Vec<_> = session
        .document()
        .children(Some(&hero))
        .into_iter()
        .map(|c| c.id.clone())
        .collect();
    assert_eq!(order, vec![title.clone(), button.clone()]);

    // Move the button in front of the title
    session.reorder(&button, 0).unwrap();
    let first = session.document().children(Some(&hero))[0].id.clone();
    assert_eq!(first, button);

    // Undo the reorder and the last add
    assert!(session.undo());
    assert!(session.undo());
    assert!(!session.document().contains(&button));
    assert!(session.can_redo());

    let document = session.close();
    assert_eq!(document.len(), 2);
}

#[test]
fn test_share_and_reopen() {
    let mut session = EditorSession::new("tab-1", EditorConfig::default());
    let hero = session.add_component("hero", None, None).unwrap();
    let mut props = Properties::new();
    props.insert("title".to_string(), json!("Spring sale"));
    props.insert("discount".to_string(), json!(0.15));
    session.update_properties(&hero, props).unwrap();
    session
        .update_geometry(&hero, GeometryDelta::resize(800.0, 240.0))
        .unwrap();
    session.add_component("button", Some(&hero), None).unwrap();

    let link = session.share_link().unwrap();
    let reopened = EditorSession::open_link("tab-2", &link, EditorConfig::default()).unwrap();

    assert_eq!(reopened.document(), session.document());
    assert!(!reopened.can_undo());
    assert_eq!(reopened.revision(), 0);
}

#[test]
fn test_reopened_session_never_reuses_ids() {
    let mut session = EditorSession::new("tab-1", EditorConfig::default());
    let first = session.add_component("box", None, None).unwrap();
    let link = session.share_link().unwrap();

    // Same session id as the author, so the seeds collide
    let mut reopened = EditorSession::open_link("tab-1", &link, EditorConfig::default()).unwrap();
    let second = reopened.add_component("box", None, None).unwrap();

    assert_ne!(first, second);
    assert_eq!(reopened.document().len(), 2);
}

#[test]
fn test_open_garbage_link_falls_back_to_empty() {
    let result = EditorSession::open_link("tab", "%%% not a link %%%", EditorConfig::default());
    assert!(matches!(result, Err(EditorError::Decode(_))));

    let session =
        EditorSession::open_link_or_empty("tab", "%%% not a link %%%", EditorConfig::default());
    assert!(session.document().is_empty());
}

#[test]
fn test_open_link_rejects_inconsistent_document() {
    let components = vec![PlacedComponent::new("a", "box").with_parent("missing")];
    let link = pagecraft_editor::encode(&components).unwrap();

    let result = EditorSession::open_link("tab", &link, EditorConfig::default());
    assert!(matches!(result, Err(EditorError::Document(_))));
}

#[test]
fn test_place_template_from_catalog() {
    let catalog = Catalog::from_json(CATALOG).unwrap();
    assert_eq!(catalog.categories(), vec!["layout", "controls"]);

    let mut session = EditorSession::new("tab", EditorConfig::default());
    let hero = session
        .place_template(catalog.get("hero-banner").unwrap(), None, None)
        .unwrap();
    let button = session
        .place_template(catalog.get("cta-button").unwrap(), Some(&hero), None)
        .unwrap();

    let placed = session.document().get(&hero).unwrap();
    assert_eq!(placed.component_type, "hero");
    assert_eq!(placed.geometry.width, 960.0);
    assert_eq!(placed.properties["title"], json!("Welcome"));

    let placed = session.document().get(&button).unwrap();
    assert_eq!(placed.parent_id.as_deref(), Some(hero.as_str()));
    assert_eq!(placed.properties["label"], json!("Buy now"));
}

#[test]
fn test_failed_edit_keeps_session_usable() {
    let mut session = EditorSession::new("tab", EditorConfig::default());
    let id = session.add_component("box", None, None).unwrap();

    let err = session
        .apply(Mutation::MoveComponent {
            id: id.clone(),
            new_parent_id: Some("nowhere".to_string()),
            index: None,
        })
        .unwrap_err();
    assert!(matches!(err, EditorError::Mutation(_)));
    assert_eq!(session.revision(), 1);

    // The session carries on
    session.add_component("box", Some(&id), None).unwrap();
    assert_eq!(session.document().len(), 2);
}

#[test]
fn test_selection_cleared_when_component_removed() {
    let mut session = EditorSession::new("tab", EditorConfig::default());
    let id = session.add_component("box", None, None).unwrap();

    session.select(Some(&id));
    assert_eq!(session.selection(), Some(id.as_str()));

    session.remove_component(&id).unwrap();
    assert!(session.selection().is_none());

    // Selecting an unknown id is ignored
    session.select(Some("ghost"));
    assert!(session.selection().is_none());
}

#[test]
fn test_document_from_components_roundtrip() {
    let components = vec![
        PlacedComponent::new("root", "page"),
        PlacedComponent::new("b", "text")
            .with_parent("root")
            .with_order(2.0),
        PlacedComponent::new("a", "text")
            .with_parent("root")
            .with_order(1.0),
    ];

    let document = Document::from_components("tab", components).unwrap();
    let ids: Vec<_> = document
        .to_components()
        .into_iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(ids, vec!["root", "a", "b"]);
}
