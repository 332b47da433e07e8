//! # Document
//!
//! The canonical in-memory tree of placed components.
//!
//! Components are stored flat, keyed by id. The tree is expressed through
//! `parent_id`, and siblings are ordered by their fractional `order` key.
//!
//! ## Invariants
//!
//! - ids are unique
//! - every `parent_id` refers to a component in the document
//! - the parent relation has no cycles
//! - no two siblings share an `order` value
//!
//! Writes only happen through [`Document::apply`], which validates the
//! whole mutation before touching anything, and through the history
//! replay helpers which write whole component snapshots.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::component::PlacedComponent;
use crate::errors::{DocumentError, MutationError};
use crate::id_generator::IdGenerator;
use crate::mutations::Mutation;

/// Editable component document
#[derive(Debug, Clone)]
pub struct Document {
    components: BTreeMap<String, PlacedComponent>,
    ids: IdGenerator,
}

/// Structural equality: the id generator is not part of a document's value
impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.components == other.components
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new("local")
    }
}

/// Before/after state of one component inside a [`Patch`]
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    pub before: Option<PlacedComponent>,
    pub after: Option<PlacedComponent>,
}

/// Every component touched by one logical edit, with its state on both sides
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch {
    changes: BTreeMap<String, Change>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a transition. The first recorded `before` for an id wins.
    pub fn record(
        &mut self,
        id: &str,
        before: Option<PlacedComponent>,
        after: Option<PlacedComponent>,
    ) {
        self.changes
            .entry(id.to_string())
            .and_modify(|change| change.after = after.clone())
            .or_insert(Change { before, after });
    }

    /// Fold a later patch into this one, keeping our original `before` states
    pub fn merge(&mut self, newer: Patch) {
        for (id, change) in newer.changes {
            self.record(&id, change.before, change.after);
        }
    }

    pub fn get(&self, id: &str) -> Option<&Change> {
        self.changes.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.changes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// True when applying the patch would not change anything
    pub fn is_noop(&self) -> bool {
        self.changes.values().all(|c| c.before == c.after)
    }

    /// Ids that exist before the patch but not after it
    pub fn removed_ids(&self) -> impl Iterator<Item = &str> {
        self.changes
            .iter()
            .filter(|(_, c)| c.before.is_some() && c.after.is_none())
            .map(|(id, _)| id.as_str())
    }
}

/// Children of every parent (`None` = roots), each list sorted by order
type ChildIndex<'a> = HashMap<Option<&'a str>, Vec<&'a PlacedComponent>>;

/// Result of a successful [`Document::apply`]
#[derive(Debug, Clone)]
pub struct Applied {
    pub patch: Patch,

    /// Id assigned by an `AddComponent`
    pub created: Option<String>,
}

impl Document {
    /// Create an empty document whose ids are seeded from `session_id`
    pub fn new(session_id: &str) -> Self {
        Self {
            components: BTreeMap::new(),
            ids: IdGenerator::new(session_id),
        }
    }

    /// Build a document from a flat component list, checking every invariant
    pub fn from_components(
        session_id: &str,
        components: Vec<PlacedComponent>,
    ) -> Result<Self, DocumentError> {
        let mut doc = Self::new(session_id);

        for component in components {
            if doc.components.contains_key(&component.id) {
                return Err(DocumentError::DuplicateId(component.id));
            }
            doc.ids.observe(&component.id);
            doc.components.insert(component.id.clone(), component);
        }

        doc.check_invariants()?;
        Ok(doc)
    }

    fn check_invariants(&self) -> Result<(), DocumentError> {
        for component in self.components.values() {
            if let Some(parent) = &component.parent_id {
                if !self.components.contains_key(parent) {
                    return Err(DocumentError::DanglingParent {
                        id: component.id.clone(),
                        parent: parent.clone(),
                    });
                }
            }
        }

        // Each chain is walked once; reaching a component already proven
        // acyclic ends the walk
        let mut acyclic: HashSet<&str> = HashSet::new();
        for component in self.components.values() {
            let mut path: Vec<&str> = Vec::new();
            let mut on_path: HashSet<&str> = HashSet::new();
            let mut cursor = Some(component.id.as_str());
            while let Some(id) = cursor {
                if acyclic.contains(id) {
                    break;
                }
                if !on_path.insert(id) {
                    return Err(DocumentError::CycleDetected(id.to_string()));
                }
                path.push(id);
                cursor = self
                    .components
                    .get(id)
                    .and_then(|c| c.parent_id.as_deref());
            }
            acyclic.extend(path);
        }

        for siblings in self.child_index().values() {
            for pair in siblings.windows(2) {
                if pair[0].order == pair[1].order {
                    return Err(DocumentError::OrderTie {
                        first: pair[0].id.clone(),
                        second: pair[1].id.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&PlacedComponent> {
        self.components.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.components.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Components keyed by id (no particular tree order)
    pub fn iter(&self) -> impl Iterator<Item = &PlacedComponent> {
        self.components.values()
    }

    /// Direct children of `parent` (`None` = roots), sorted by order
    pub fn children(&self, parent: Option<&str>) -> Vec<&PlacedComponent> {
        let mut children: Vec<&PlacedComponent> = self
            .components
            .values()
            .filter(|c| c.parent_id.as_deref() == parent)
            .collect();
        children.sort_by(|a, b| a.order.total_cmp(&b.order));
        children
    }

    pub fn roots(&self) -> Vec<&PlacedComponent> {
        self.children(None)
    }

    /// All descendants of `id` in depth-first sibling order (excluding `id`)
    pub fn descendants(&self, id: &str) -> Vec<String> {
        let index = self.child_index();
        Self::walk(&index, Some(id))
            .into_iter()
            .map(|c| c.id.clone())
            .collect()
    }

    fn child_index(&self) -> ChildIndex<'_> {
        let mut index = ChildIndex::new();
        for component in self.components.values() {
            index
                .entry(component.parent_id.as_deref())
                .or_default()
                .push(component);
        }
        for siblings in index.values_mut() {
            siblings.sort_by(|a, b| a.order.total_cmp(&b.order));
        }
        index
    }

    /// Depth-first, sibling-ordered walk below `start`. Uses an explicit
    /// stack so nesting depth is bounded by memory, not the call stack.
    fn walk<'a>(index: &ChildIndex<'a>, start: Option<&'a str>) -> Vec<&'a PlacedComponent> {
        let mut out = Vec::new();
        let mut stack: Vec<&PlacedComponent> = index
            .get(&start)
            .map(|children| children.iter().rev().copied().collect())
            .unwrap_or_default();

        while let Some(component) = stack.pop() {
            out.push(component);
            if let Some(children) = index.get(&Some(component.id.as_str())) {
                stack.extend(children.iter().rev().copied());
            }
        }
        out
    }

    /// Parent chain of `id`, nearest first
    pub fn ancestors(&self, id: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let mut cursor = self.get(id).and_then(|c| c.parent_id.as_deref());
        while let Some(parent) = cursor {
            if !seen.insert(parent) {
                break;
            }
            cursor = self.get(parent).and_then(|c| c.parent_id.as_deref());
            out.push(parent.to_string());
        }
        out
    }

    /// Whether `candidate` sits somewhere below `ancestor`
    pub fn is_descendant(&self, ancestor: &str, candidate: &str) -> bool {
        self.ancestors(candidate).iter().any(|a| a == ancestor)
    }

    /// Every component in canonical order: roots by order, each followed by
    /// its subtree. This is the unit handed to the codec.
    pub fn to_components(&self) -> Vec<PlacedComponent> {
        let index = self.child_index();
        Self::walk(&index, None).into_iter().cloned().collect()
    }

    pub fn id_seed(&self) -> &str {
        self.ids.seed()
    }

    /// Apply a mutation. Validation happens first, so on error the document
    /// is exactly as it was.
    pub(crate) fn apply(&mut self, mutation: &Mutation) -> Result<Applied, MutationError> {
        mutation.validate(self)?;

        let mut patch = Patch::new();
        let mut created = None;

        match mutation {
            Mutation::AddComponent {
                component_type,
                parent_id,
                index,
                properties,
                geometry,
            } => {
                let id = self.fresh_id()?;
                let mut component = PlacedComponent::new(id.clone(), component_type.clone());
                component.parent_id = parent_id.clone();
                component.properties = properties.clone();
                component.geometry = *geometry;
                self.place(&mut patch, component, *index);
                created = Some(id);
            }

            Mutation::RemoveComponent { id } => {
                let mut doomed = vec![id.clone()];
                doomed.extend(self.descendants(id));
                for id in doomed {
                    if let Some(before) = self.components.remove(&id) {
                        patch.record(&id, Some(before), None);
                    }
                }
            }

            Mutation::MoveComponent {
                id,
                new_parent_id,
                index,
            } => {
                let mut component = self.require(id)?.clone();
                component.parent_id = new_parent_id.clone();
                self.place(&mut patch, component, *index);
            }

            Mutation::Reorder { id, index } => {
                let component = self.require(id)?.clone();
                self.place(&mut patch, component, Some(*index));
            }

            Mutation::UpdateProperties { id, patch: props } => {
                let before = self.require(id)?.clone();
                let mut after = before.clone();
                for (key, value) in props {
                    after.properties.insert(key.clone(), value.clone());
                }
                self.write(&mut patch, after);
            }

            Mutation::UpdateGeometry { id, delta } => {
                let before = self.require(id)?.clone();
                let mut after = before.clone();
                after.geometry = before.geometry.translated(*delta);
                self.write(&mut patch, after);
            }

            Mutation::SetGeometry { id, geometry } => {
                let mut after = self.require(id)?.clone();
                after.geometry = geometry.translated(Default::default());
                self.write(&mut patch, after);
            }
        }

        Ok(Applied { patch, created })
    }

    /// Next generated id not already present in the document
    fn fresh_id(&mut self) -> Result<String, MutationError> {
        loop {
            let id = self.ids.new_id().ok_or(MutationError::IdsExhausted)?;
            if !self.components.contains_key(&id) {
                return Ok(id);
            }
        }
    }

    fn require(&self, id: &str) -> Result<&PlacedComponent, MutationError> {
        self.get(id)
            .ok_or_else(|| MutationError::NotFound(id.to_string()))
    }

    /// Store a component, recording the transition
    fn write(&mut self, patch: &mut Patch, component: PlacedComponent) {
        let id = component.id.clone();
        let before = self.components.insert(id.clone(), component.clone());
        patch.record(&id, before, Some(component));
    }

    /// Insert or reposition `component` among the siblings of its
    /// `parent_id`. `index` is a position in the sibling list (the component
    /// itself excluded); `None` places it last.
    fn place(&mut self, patch: &mut Patch, mut component: PlacedComponent, index: Option<usize>) {
        let siblings: Vec<(String, f64)> = self
            .children(component.parent_id.as_deref())
            .into_iter()
            .filter(|c| c.id != component.id)
            .map(|c| (c.id.clone(), c.order))
            .collect();

        let at = index.unwrap_or(siblings.len()).min(siblings.len());
        let prev = at.checked_sub(1).map(|i| siblings[i].1);
        let next = siblings.get(at).map(|s| s.1);

        let candidate = match (prev, next) {
            (None, None) => 1.0,
            (Some(p), None) => p + 1.0,
            (None, Some(n)) => n - 1.0,
            (Some(p), Some(n)) => p + (n - p) / 2.0,
        };
        // Large keys absorb the +/- 1.0 step just like close neighbours
        // absorb the midpoint
        let key = Some(candidate).filter(|&k| {
            k.is_finite() && prev.map_or(true, |p| k > p) && next.map_or(true, |n| k < n)
        });

        match key {
            Some(order) => {
                component.order = order;
                self.write(patch, component);
            }
            None => {
                // Precision exhausted between neighbours: renumber the group
                let mut ids: Vec<String> = siblings.into_iter().map(|(id, _)| id).collect();
                ids.insert(at, component.id.clone());
                self.write(patch, component);
                for (i, id) in ids.iter().enumerate() {
                    if let Some(existing) = self.components.get(id) {
                        let mut renumbered = existing.clone();
                        renumbered.order = (i + 1) as f64;
                        self.write(patch, renumbered);
                    }
                }
            }
        }
    }

    /// Write the `after` side of a patch (redo)
    pub(crate) fn write_forward(&mut self, patch: &Patch) {
        for (id, change) in &patch.changes {
            self.restore(id, change.after.as_ref());
        }
    }

    /// Write the `before` side of a patch (undo)
    pub(crate) fn write_inverse(&mut self, patch: &Patch) {
        for (id, change) in &patch.changes {
            self.restore(id, change.before.as_ref());
        }
    }

    fn restore(&mut self, id: &str, state: Option<&PlacedComponent>) {
        match state {
            Some(component) => {
                self.components.insert(id.to_string(), component.clone());
            }
            None => {
                self.components.remove(id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Geometry, GeometryDelta, Properties};
    use serde_json::json;

    fn add(doc: &mut Document, kind: &str, parent: Option<&str>) -> String {
        let mutation = Mutation::add(kind, parent.map(str::to_string), None);
        doc.apply(&mutation).unwrap().created.unwrap()
    }

    #[test]
    fn test_add_places_last_among_siblings() {
        let mut doc = Document::new("test");
        let a = add(&mut doc, "section", None);
        let b = add(&mut doc, "section", None);
        let c = add(&mut doc, "section", None);

        let roots: Vec<&str> = doc.roots().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(roots, vec![a.as_str(), b.as_str(), c.as_str()]);
    }

    #[test]
    fn test_add_at_index_inserts_between() {
        let mut doc = Document::new("test");
        let a = add(&mut doc, "text", None);
        let b = add(&mut doc, "text", None);

        let mid = doc
            .apply(&Mutation::add("image", None, Some(1)))
            .unwrap()
            .created
            .unwrap();
        let first = doc
            .apply(&Mutation::add("image", None, Some(0)))
            .unwrap()
            .created
            .unwrap();

        let roots: Vec<String> = doc.roots().iter().map(|c| c.id.clone()).collect();
        assert_eq!(roots, vec![first, a, mid, b]);
    }

    #[test]
    fn test_add_under_missing_parent_fails() {
        let mut doc = Document::new("test");
        let result = doc.apply(&Mutation::add("text", Some("ghost".to_string()), None));

        assert_eq!(
            result.unwrap_err(),
            MutationError::InvalidParent("ghost".to_string())
        );
        assert!(doc.is_empty());
    }

    #[test]
    fn test_remove_cascades_to_subtree() {
        let mut doc = Document::new("test");
        let root = add(&mut doc, "section", None);
        let child = add(&mut doc, "row", Some(&root));
        add(&mut doc, "text", Some(&child));
        let other = add(&mut doc, "section", None);

        let applied = doc
            .apply(&Mutation::RemoveComponent { id: root.clone() })
            .unwrap();

        assert_eq!(applied.patch.len(), 3);
        assert_eq!(doc.len(), 1);
        assert!(doc.contains(&other));
    }

    #[test]
    fn test_move_into_descendant_is_rejected() {
        let mut doc = Document::new("test");
        let root = add(&mut doc, "section", None);
        let child = add(&mut doc, "row", Some(&root));
        let before = doc.clone();

        let result = doc.apply(&Mutation::MoveComponent {
            id: root.clone(),
            new_parent_id: Some(child.clone()),
            index: None,
        });

        assert!(matches!(result, Err(MutationError::CycleDetected { .. })));
        assert_eq!(doc, before);
    }

    #[test]
    fn test_update_properties_is_shallow_merge() {
        let mut doc = Document::new("test");
        let id = add(&mut doc, "button", None);

        let mut first = Properties::new();
        first.insert("label".to_string(), json!("Go"));
        first.insert("style".to_string(), json!({"color": "red"}));
        doc.apply(&Mutation::UpdateProperties {
            id: id.clone(),
            patch: first,
        })
        .unwrap();

        let mut second = Properties::new();
        second.insert("style".to_string(), json!({"size": 2}));
        doc.apply(&Mutation::UpdateProperties {
            id: id.clone(),
            patch: second,
        })
        .unwrap();

        let props = &doc.get(&id).unwrap().properties;
        assert_eq!(props["label"], json!("Go"));
        assert_eq!(props["style"], json!({"size": 2}));
    }

    #[test]
    fn test_update_geometry_is_additive() {
        let mut doc = Document::new("test");
        let id = add(&mut doc, "card", None);

        for _ in 0..3 {
            doc.apply(&Mutation::UpdateGeometry {
                id: id.clone(),
                delta: GeometryDelta::offset(2.0, -1.0),
            })
            .unwrap();
        }

        assert_eq!(
            doc.get(&id).unwrap().geometry,
            Geometry::new(6.0, -3.0, 0.0, 0.0)
        );
    }

    #[test]
    fn test_renumbers_when_precision_runs_out() {
        let mut doc = Document::new("test");
        add(&mut doc, "text", None);
        add(&mut doc, "text", None);

        for _ in 0..80 {
            doc.apply(&Mutation::add("text", None, Some(1))).unwrap();
        }

        assert_eq!(doc.len(), 82);
        let roots = doc.roots();
        for pair in roots.windows(2) {
            assert!(pair[0].order < pair[1].order);
        }
    }

    #[test]
    fn test_large_order_keys_never_tie() {
        let big = vec![PlacedComponent::new("a", "box").with_order(1e17)];
        let mut doc = Document::from_components("test", big).unwrap();

        let last = add(&mut doc, "box", None);
        let first = doc
            .apply(&Mutation::add("box", None, Some(0)))
            .unwrap()
            .created
            .unwrap();

        let ids: Vec<&str> = doc.roots().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec![first.as_str(), "a", last.as_str()]);

        // Whatever the editor produces must load again
        let reloaded = Document::from_components("other", doc.to_components()).unwrap();
        assert_eq!(reloaded, doc);
    }

    #[test]
    fn test_exhausted_ids_fail_without_panicking() {
        let seed = crate::id_generator::session_seed("test");
        let components = vec![PlacedComponent::new(format!("{seed}-{}", u64::MAX), "box")];
        let mut doc = Document::from_components("test", components).unwrap();
        let before = doc.clone();

        let result = doc.apply(&Mutation::add("box", None, None));

        assert!(matches!(result, Err(MutationError::IdsExhausted)));
        assert_eq!(doc, before);
    }

    #[test]
    fn test_deep_tree_loads_and_walks() {
        const DEPTH: usize = 20_000;
        let components: Vec<PlacedComponent> = (0..DEPTH)
            .map(|i| {
                let component = PlacedComponent::new(format!("n{i}"), "box");
                if i == 0 {
                    component
                } else {
                    component.with_parent(format!("n{}", i - 1))
                }
            })
            .collect();

        let doc = Document::from_components("test", components).unwrap();

        let ordered = doc.to_components();
        assert_eq!(ordered.len(), DEPTH);
        assert_eq!(ordered[0].id, "n0");
        assert_eq!(ordered[DEPTH - 1].id, format!("n{}", DEPTH - 1));
        assert_eq!(doc.descendants("n0").len(), DEPTH - 1);
        assert_eq!(doc.ancestors(&format!("n{}", DEPTH - 1)).len(), DEPTH - 1);
    }

    #[test]
    fn test_long_cycle_is_detected() {
        let mut components: Vec<PlacedComponent> = (0..1000)
            .map(|i| PlacedComponent::new(format!("n{i}"), "box").with_parent(format!("n{}", i + 1)))
            .collect();
        components.push(PlacedComponent::new("n1000", "box").with_parent("n0"));

        assert!(matches!(
            Document::from_components("test", components),
            Err(DocumentError::CycleDetected(_))
        ));
    }

    #[test]
    fn test_from_components_rejects_broken_documents() {
        let dangling = vec![PlacedComponent::new("a", "text").with_parent("missing")];
        assert!(matches!(
            Document::from_components("t", dangling),
            Err(DocumentError::DanglingParent { .. })
        ));

        let cycle = vec![
            PlacedComponent::new("a", "box").with_parent("b"),
            PlacedComponent::new("b", "box").with_parent("a"),
        ];
        assert!(matches!(
            Document::from_components("t", cycle),
            Err(DocumentError::CycleDetected(_))
        ));

        let tie = vec![
            PlacedComponent::new("a", "box").with_order(1.0),
            PlacedComponent::new("b", "box").with_order(1.0),
        ];
        assert!(matches!(
            Document::from_components("t", tie),
            Err(DocumentError::OrderTie { .. })
        ));

        let duplicate = vec![
            PlacedComponent::new("a", "box").with_order(1.0),
            PlacedComponent::new("a", "box").with_order(2.0),
        ];
        assert_eq!(
            Document::from_components("t", duplicate).unwrap_err(),
            DocumentError::DuplicateId("a".to_string())
        );
    }

    #[test]
    fn test_to_components_is_depth_first() {
        let components = vec![
            PlacedComponent::new("child", "text").with_parent("second").with_order(1.0),
            PlacedComponent::new("second", "box").with_order(2.0),
            PlacedComponent::new("first", "box").with_order(1.0),
        ];
        let doc = Document::from_components("t", components).unwrap();

        let ids: Vec<String> = doc.to_components().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["first", "second", "child"]);
    }

    #[test]
    fn test_patch_merge_keeps_first_before() {
        let a = PlacedComponent::new("a", "box");
        let b = a.clone().with_order(2.0);
        let c = a.clone().with_order(3.0);

        let mut patch = Patch::new();
        patch.record("a", Some(a.clone()), Some(b.clone()));

        let mut newer = Patch::new();
        newer.record("a", Some(b), Some(c.clone()));
        patch.merge(newer);

        let change = patch.get("a").unwrap();
        assert_eq!(change.before, Some(a));
        assert_eq!(change.after, Some(c));
    }
}
