//! # Placed Components
//!
//! One instance of a template placed on the canvas. The core never looks
//! inside `properties`; it only stores and returns them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Opaque template-defined property bag.
///
/// A `BTreeMap` keeps key order canonical so encoding is stable.
pub type Properties = BTreeMap<String, serde_json::Value>;

/// A component instance in the document tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlacedComponent {
    pub id: String,

    /// Template identifier, resolved by the catalog
    #[serde(rename = "type")]
    pub component_type: String,

    #[serde(default)]
    pub properties: Properties,

    /// Containing component (`None` = root level)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    /// Sibling ordering key, unique among siblings
    #[serde(default)]
    pub order: f64,

    #[serde(default)]
    pub geometry: Geometry,
}

impl PlacedComponent {
    pub fn new(id: impl Into<String>, component_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            component_type: component_type.into(),
            properties: Properties::new(),
            parent_id: None,
            order: 0.0,
            geometry: Geometry::default(),
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_order(mut self, order: f64) -> Self {
        self.order = order;
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = geometry;
        self
    }
}

/// Position and size on the canvas
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Geometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Geometry {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Additive update. Sizes never go negative.
    pub fn translated(self, delta: GeometryDelta) -> Self {
        Self {
            x: self.x + delta.dx,
            y: self.y + delta.dy,
            width: (self.width + delta.dwidth).max(0.0),
            height: (self.height + delta.dheight).max(0.0),
        }
    }

    /// NaN and infinities have no JSON form, so they cannot be shared
    pub fn is_finite(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// Additive change to a [`Geometry`]
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct GeometryDelta {
    #[serde(default)]
    pub dx: f64,
    #[serde(default)]
    pub dy: f64,
    #[serde(default)]
    pub dwidth: f64,
    #[serde(default)]
    pub dheight: f64,
}

impl GeometryDelta {
    pub fn offset(dx: f64, dy: f64) -> Self {
        Self {
            dx,
            dy,
            ..Self::default()
        }
    }

    pub fn resize(dwidth: f64, dheight: f64) -> Self {
        Self {
            dwidth,
            dheight,
            ..Self::default()
        }
    }

    pub fn is_zero(&self) -> bool {
        self.dx == 0.0 && self.dy == 0.0 && self.dwidth == 0.0 && self.dheight == 0.0
    }

    pub fn is_finite(&self) -> bool {
        [self.dx, self.dy, self.dwidth, self.dheight]
            .iter()
            .all(|v| v.is_finite())
    }
}
