//! Share-string compatibility tests

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use base64::Engine;
use pagecraft_editor::{decode, encode, Geometry, PlacedComponent};
use serde_json::json;

fn sample_page() -> Vec<PlacedComponent> {
    vec![
        PlacedComponent::new("page", "section")
            .with_geometry(Geometry::new(0.0, 0.0, 1200.0, 900.0)),
        PlacedComponent::new("title", "text")
            .with_parent("page")
            .with_order(1.0)
            .with_property("content", json!("Hello / world + friends?")),
        PlacedComponent::new("cta", "button")
            .with_parent("page")
            .with_order(2.5)
            .with_property("style", json!({ "color": "#ff0066", "rounded": true })),
    ]
}

#[test]
fn test_share_string_roundtrip() {
    let components = sample_page();
    let encoded = encode(&components).unwrap();

    assert!(encoded
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    assert_eq!(decode(&encoded), Some(components));
}

#[test]
fn test_legacy_links_still_open() {
    let components = sample_page();
    let json = serde_json::to_string(&components).unwrap();

    let padded = STANDARD.encode(&json);
    assert_eq!(decode(&padded), Some(components.clone()));

    // Links are often trimmed of their padding when pasted
    let unpadded = STANDARD_NO_PAD.encode(&json);
    assert_eq!(decode(&unpadded), Some(components));
}

#[test]
fn test_legacy_defaults_missing_fields() {
    let json = r#"[{"id":"x","type":"spacer"}]"#;
    let decoded = decode(&STANDARD.encode(json)).unwrap();

    assert_eq!(decoded.len(), 1);
    assert_eq!(decoded[0].component_type, "spacer");
    assert!(decoded[0].parent_id.is_none());
    assert_eq!(decoded[0].geometry, Geometry::default());
}

#[test]
fn test_garbage_is_rejected() {
    for input in ["", "   ", "!!!", "not-base64-at-all?", "AAAA"] {
        assert_eq!(decode(input), None, "input {input:?}");
    }
}

#[test]
fn test_truncated_share_string_is_rejected() {
    let encoded = encode(&sample_page()).unwrap();
    let truncated = &encoded[..encoded.len() / 2];
    assert_eq!(decode(truncated), None);
}

#[test]
fn test_empty_document_roundtrip() {
    let encoded = encode(&[]).unwrap();
    assert_eq!(decode(&encoded), Some(Vec::new()));
}
