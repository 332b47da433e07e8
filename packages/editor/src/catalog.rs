//! Component template catalog records.
//!
//! The catalog itself is loaded elsewhere; the editor only needs the
//! template type, its default property bag and an optional default size
//! when a template is dropped onto the canvas.

use serde::{Deserialize, Serialize};

use crate::component::{Geometry, Properties};
use crate::errors::EditorError;
use crate::mutations::Mutation;

/// A palette entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ComponentTemplate {
    pub id: String,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub description: String,
    pub template: TemplateBody,
}

/// What gets instantiated when the template is placed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TemplateBody {
    #[serde(rename = "type")]
    pub component_type: String,

    /// Copied as-is; shape is up to the template author
    #[serde(default)]
    pub properties: Properties,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
}

impl ComponentTemplate {
    /// Mutation that places this template under `parent_id` at `index`
    pub fn instantiate(&self, parent_id: Option<String>, index: Option<usize>) -> Mutation {
        Mutation::AddComponent {
            component_type: self.template.component_type.clone(),
            parent_id,
            index,
            properties: self.template.properties.clone(),
            geometry: self.template.geometry.unwrap_or_default(),
        }
    }
}

/// Ordered set of templates
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Catalog {
    templates: Vec<ComponentTemplate>,
}

impl Catalog {
    pub fn new(templates: Vec<ComponentTemplate>) -> Self {
        Self { templates }
    }

    /// Parse a JSON array of template records
    pub fn from_json(json: &str) -> Result<Self, EditorError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn get(&self, id: &str) -> Option<&ComponentTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn templates(&self) -> &[ComponentTemplate] {
        &self.templates
    }

    /// Distinct categories in first-seen order
    pub fn categories(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for template in &self.templates {
            if !out.contains(&template.category.as_str()) {
                out.push(&template.category);
            }
        }
        out
    }

    pub fn in_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a ComponentTemplate> {
        self.templates.iter().filter(move |t| t.category == category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const CATALOG: &str = r#"[
        {
            "id": "hero-basic",
            "name": "Hero",
            "category": "Layout",
            "icon": "layout",
            "description": "Large banner",
            "template": {
                "type": "hero",
                "properties": { "title": "Welcome", "align": "center" },
                "geometry": { "x": 0, "y": 0, "width": 1200, "height": 400 }
            }
        },
        {
            "id": "button-primary",
            "name": "Button",
            "category": "Inputs",
            "template": { "type": "button" }
        },
        {
            "id": "columns",
            "name": "Columns",
            "category": "Layout",
            "template": { "type": "columns", "properties": { "count": 2 } }
        }
    ]"#;

    #[test]
    fn test_parse_catalog() {
        let catalog = Catalog::from_json(CATALOG).unwrap();

        assert_eq!(catalog.templates().len(), 3);
        assert_eq!(catalog.categories(), vec!["Layout", "Inputs"]);
        assert_eq!(catalog.in_category("Layout").count(), 2);
        assert_eq!(catalog.get("button-primary").unwrap().icon, "");
    }

    #[test]
    fn test_instantiate_copies_defaults() {
        let catalog = Catalog::from_json(CATALOG).unwrap();
        let hero = catalog.get("hero-basic").unwrap();

        match hero.instantiate(None, Some(0)) {
            Mutation::AddComponent {
                component_type,
                properties,
                geometry,
                index,
                ..
            } => {
                assert_eq!(component_type, "hero");
                assert_eq!(properties["title"], json!("Welcome"));
                assert_eq!(geometry.width, 1200.0);
                assert_eq!(index, Some(0));
            }
            other => panic!("unexpected mutation {other:?}"),
        }
    }

    #[test]
    fn test_invalid_catalog_is_an_error() {
        assert!(matches!(
            Catalog::from_json("{\"not\": \"a list\"}"),
            Err(EditorError::Json(_))
        ));
    }
}
