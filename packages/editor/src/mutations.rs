//! # Document Mutations
//!
//! Semantic operations on the component tree.
//!
//! ## Design Principles
//!
//! 1. **Intent-preserving**: Each mutation represents one user-level edit
//! 2. **Validated**: Structural constraints are checked before anything is written
//! 3. **Addressed by id**: Mutations never hold references into the document
//!
//! ## Mutation Semantics
//!
//! ### RemoveComponent
//! - Removes the component and its entire subtree
//!
//! ### MoveComponent
//! - Atomic relocation to a new parent (or to the root level)
//! - Fails if the new parent is missing
//! - Fails if the new parent is the component itself or one of its descendants
//!
//! ### UpdateProperties
//! - Shallow merge by key; values are replaced wholesale
//!
//! ### UpdateGeometry
//! - Additive; sizes are clamped at zero

use serde::{Deserialize, Serialize};

use crate::component::{Geometry, GeometryDelta, Properties};
use crate::document::Document;
use crate::errors::MutationError;

/// Semantic mutations over a [`Document`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Mutation {
    /// Place a new component. `index` is the position among its siblings;
    /// `None` places it last.
    AddComponent {
        component_type: String,
        #[serde(default)]
        parent_id: Option<String>,
        #[serde(default)]
        index: Option<usize>,
        #[serde(default)]
        properties: Properties,
        #[serde(default)]
        geometry: Geometry,
    },

    /// Remove a component and all of its descendants
    RemoveComponent { id: String },

    /// Reparent a component (`None` = root level) at a sibling position
    MoveComponent {
        id: String,
        #[serde(default)]
        new_parent_id: Option<String>,
        #[serde(default)]
        index: Option<usize>,
    },

    /// Change sibling position without changing parent
    Reorder { id: String, index: usize },

    /// Shallow-merge a partial property map
    UpdateProperties { id: String, patch: Properties },

    /// Additive position/size change
    UpdateGeometry { id: String, delta: GeometryDelta },

    /// Absolute position/size, as typed into a properties panel
    SetGeometry { id: String, geometry: Geometry },
}

impl Mutation {
    /// Shorthand for an `AddComponent` with empty properties and geometry
    pub fn add(
        component_type: impl Into<String>,
        parent_id: Option<String>,
        index: Option<usize>,
    ) -> Self {
        Mutation::AddComponent {
            component_type: component_type.into(),
            parent_id,
            index,
            properties: Properties::new(),
            geometry: Geometry::default(),
        }
    }

    /// Validate without applying
    pub fn validate(&self, doc: &Document) -> Result<(), MutationError> {
        match self {
            Mutation::AddComponent {
                component_type,
                parent_id,
                geometry,
                ..
            } => {
                if let Some(parent) = parent_id {
                    if !doc.contains(parent) {
                        return Err(MutationError::InvalidParent(parent.clone()));
                    }
                }
                if !geometry.is_finite() {
                    return Err(MutationError::InvalidGeometry(component_type.clone()));
                }
                Ok(())
            }

            Mutation::UpdateGeometry { id, delta } => {
                let current = doc
                    .get(id)
                    .ok_or_else(|| MutationError::NotFound(id.clone()))?;

                // A finite delta can still overflow
                if !delta.is_finite() || !current.geometry.translated(*delta).is_finite() {
                    return Err(MutationError::InvalidGeometry(id.clone()));
                }
                Ok(())
            }

            Mutation::SetGeometry { id, geometry } => {
                require(doc, id)?;
                if !geometry.is_finite() {
                    return Err(MutationError::InvalidGeometry(id.clone()));
                }
                Ok(())
            }

            Mutation::MoveComponent {
                id, new_parent_id, ..
            } => {
                require(doc, id)?;

                if let Some(parent) = new_parent_id {
                    if !doc.contains(parent) {
                        return Err(MutationError::InvalidParent(parent.clone()));
                    }

                    if parent == id || doc.is_descendant(id, parent) {
                        return Err(MutationError::CycleDetected {
                            id: id.clone(),
                            parent: parent.clone(),
                        });
                    }
                }

                Ok(())
            }

            Mutation::RemoveComponent { id }
            | Mutation::Reorder { id, .. }
            | Mutation::UpdateProperties { id, .. } => require(doc, id),
        }
    }

    /// The existing component this mutation acts on, if any
    pub fn target(&self) -> Option<&str> {
        match self {
            Mutation::AddComponent { .. } => None,
            Mutation::RemoveComponent { id }
            | Mutation::MoveComponent { id, .. }
            | Mutation::Reorder { id, .. }
            | Mutation::UpdateProperties { id, .. }
            | Mutation::UpdateGeometry { id, .. }
            | Mutation::SetGeometry { id, .. } => Some(id),
        }
    }

    /// Get a debug name for this mutation
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::AddComponent { .. } => "add-component",
            Mutation::RemoveComponent { .. } => "remove-component",
            Mutation::MoveComponent { .. } => "move-component",
            Mutation::Reorder { .. } => "reorder",
            Mutation::UpdateProperties { .. } => "update-properties",
            Mutation::UpdateGeometry { .. } => "update-geometry",
            Mutation::SetGeometry { .. } => "set-geometry",
        }
    }
}

fn require(doc: &Document, id: &str) -> Result<(), MutationError> {
    if doc.contains(id) {
        Ok(())
    } else {
        Err(MutationError::NotFound(id.to_string()))
    }
}
