//! Core data models for the ArchiMate graph.
//!
//! A [`Model`] is the parsed content of one `.archimate` file: its elements,
//! relationships, diagram views, and the layer folders elements were found
//! in. Models are immutable once built; all derived facts (type buckets,
//! organization analysis, traversals) are computed on demand by the
//! [`ModelRepository`](crate::repository::ModelRepository).

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;

use crate::taxonomy::{ElementType, RelationshipKind};

/// Architectural layer an element was filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    Business,
    Application,
    Technology,
    Strategy,
    Implementation,
}

impl Layer {
    /// All layers in presentation order.
    pub const ALL: [Layer; 5] = [
        Layer::Strategy,
        Layer::Business,
        Layer::Application,
        Layer::Technology,
        Layer::Implementation,
    ];

    /// Map an Archi folder `type` attribute to a layer.
    ///
    /// Unrecognized folder types (`motivation`, `other`, anything custom)
    /// fall back to [`Layer::Business`]. This is lossy: strategy or
    /// implementation content filed under a nonstandard folder type is
    /// reported as business content.
    pub fn from_folder_type(folder_type: &str) -> Layer {
        match folder_type.trim().to_ascii_lowercase().as_str() {
            "business" => Layer::Business,
            "application" => Layer::Application,
            "technology" => Layer::Technology,
            "strategy" => Layer::Strategy,
            "implementation_migration" | "implementation" => Layer::Implementation,
            _ => Layer::Business,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Layer::Business => "Business",
            Layer::Application => "Application",
            Layer::Technology => "Technology",
            Layer::Strategy => "Strategy",
            Layer::Implementation => "Implementation & Migration",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A typed node of the model graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Element {
    pub id: String,
    pub name: String,
    /// Raw type string as found in the XML, e.g. `archimate:BusinessActor`.
    pub element_type: String,
    pub layer: Layer,
    pub documentation: Option<String>,
    pub properties: Vec<(String, String)>,
    /// Name of the model this element was loaded from.
    pub model: String,
}

impl Element {
    /// Canonical classification of the raw type, if it is a known ArchiMate type.
    pub fn kind(&self) -> Option<ElementType> {
        ElementType::from_raw(&self.element_type)
    }

    /// Key used for name-based deduplication: the trimmed name, or the id
    /// when the element is unnamed.
    pub fn dedup_key(&self) -> &str {
        let name = self.name.trim();
        if name.is_empty() {
            &self.id
        } else {
            name
        }
    }

    /// Name suitable for display; unnamed elements show their id.
    pub fn display_name(&self) -> &str {
        self.dedup_key()
    }

    /// Human-readable type label (`Business Actor`), falling back to the raw string.
    pub fn type_label(&self) -> String {
        match self.kind() {
            Some(kind) => kind.label().to_string(),
            None => self.element_type.clone(),
        }
    }
}

/// A typed, directed edge of the model graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Relationship {
    pub id: String,
    /// Raw type string, e.g. `archimate:CompositionRelationship`.
    pub relationship_type: String,
    pub source: String,
    pub target: String,
    pub name: Option<String>,
    pub documentation: Option<String>,
}

impl Relationship {
    pub fn kind(&self) -> Option<RelationshipKind> {
        RelationshipKind::from_raw(&self.relationship_type)
    }

    /// True when `kind` classifies this relationship exactly.
    pub fn is_kind(&self, kind: RelationshipKind) -> bool {
        self.kind() == Some(kind)
    }

    /// The endpoint opposite to `id`, if `id` is an endpoint at all.
    pub fn counterpart(&self, id: &str) -> Option<&str> {
        if self.source == id {
            Some(&self.target)
        } else if self.target == id {
            Some(&self.source)
        } else {
            None
        }
    }

    pub fn type_label(&self) -> String {
        match self.kind() {
            Some(kind) => kind.label().to_string(),
            None => self.relationship_type.clone(),
        }
    }
}

/// A diagram (view) and the model content it depicts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct View {
    pub id: String,
    pub name: String,
    pub documentation: Option<String>,
    pub element_refs: Vec<String>,
    pub relationship_refs: Vec<String>,
}

/// The parsed content of one `.archimate` file.
#[derive(Debug, Clone, Serialize)]
pub struct Model {
    pub id: String,
    pub name: String,
    pub version: Option<String>,
    pub source_path: PathBuf,
    elements: Vec<Element>,
    relationships: Vec<Relationship>,
    views: Vec<View>,
    #[serde(skip)]
    element_index: HashMap<String, usize>,
    #[serde(skip)]
    relationship_index: HashMap<String, usize>,
    folders: BTreeMap<Layer, Vec<String>>,
}

impl Model {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        version: Option<String>,
        source_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            version,
            source_path: source_path.into(),
            elements: Vec::new(),
            relationships: Vec::new(),
            views: Vec::new(),
            element_index: HashMap::new(),
            relationship_index: HashMap::new(),
            folders: BTreeMap::new(),
        }
    }

    /// Add an element. A second element with an id already present replaces
    /// the first in place and keeps its original position.
    pub fn add_element(&mut self, element: Element) {
        if let Some(&idx) = self.element_index.get(&element.id) {
            tracing::warn!(
                model = %self.name,
                id = %element.id,
                "duplicate element id, keeping the last definition"
            );
            self.elements[idx] = element;
            return;
        }
        self.folders
            .entry(element.layer)
            .or_default()
            .push(element.id.clone());
        self.element_index
            .insert(element.id.clone(), self.elements.len());
        self.elements.push(element);
    }

    pub fn add_relationship(&mut self, relationship: Relationship) {
        if let Some(&idx) = self.relationship_index.get(&relationship.id) {
            self.relationships[idx] = relationship;
            return;
        }
        self.relationship_index
            .insert(relationship.id.clone(), self.relationships.len());
        self.relationships.push(relationship);
    }

    pub fn add_view(&mut self, view: View) {
        self.views.push(view);
    }

    /// Elements in document order.
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn views(&self) -> &[View] {
        &self.views
    }

    pub fn element(&self, id: &str) -> Option<&Element> {
        self.element_index.get(id).map(|&i| &self.elements[i])
    }

    pub fn relationship(&self, id: &str) -> Option<&Relationship> {
        self.relationship_index.get(id).map(|&i| &self.relationships[i])
    }

    /// Elements filed under `layer`, in document order.
    pub fn layer_elements(&self, layer: Layer) -> Vec<&Element> {
        self.folders
            .get(&layer)
            .map(|ids| ids.iter().filter_map(|id| self.element(id)).collect())
            .unwrap_or_default()
    }

    /// Relationships whose source or target does not resolve inside this model.
    pub fn dangling_relationships(&self) -> Vec<&Relationship> {
        self.relationships
            .iter()
            .filter(|r| self.element(&r.source).is_none() || self.element(&r.target).is_none())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(id: &str, name: &str, ty: &str, layer: Layer) -> Element {
        Element {
            id: id.to_string(),
            name: name.to_string(),
            element_type: ty.to_string(),
            layer,
            documentation: None,
            properties: Vec::new(),
            model: "m".to_string(),
        }
    }

    #[test]
    fn test_unknown_folder_type_defaults_to_business() {
        assert_eq!(Layer::from_folder_type("motivation"), Layer::Business);
        assert_eq!(Layer::from_folder_type("other"), Layer::Business);
        assert_eq!(Layer::from_folder_type("Technology"), Layer::Technology);
        assert_eq!(
            Layer::from_folder_type("implementation_migration"),
            Layer::Implementation
        );
    }

    #[test]
    fn test_folders_keep_document_order() {
        let mut model = Model::new("m1", "m", None, "m.archimate");
        model.add_element(element("b", "B", "archimate:BusinessActor", Layer::Business));
        model.add_element(element("a", "A", "archimate:BusinessRole", Layer::Business));
        model.add_element(element("x", "X", "archimate:Node", Layer::Technology));

        let business: Vec<&str> = model
            .layer_elements(Layer::Business)
            .iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(business, vec!["b", "a"]);
        assert_eq!(model.layer_elements(Layer::Strategy).len(), 0);
    }

    #[test]
    fn test_duplicate_id_replaces_in_place() {
        let mut model = Model::new("m1", "m", None, "m.archimate");
        model.add_element(element("a", "First", "archimate:BusinessActor", Layer::Business));
        model.add_element(element("b", "B", "archimate:BusinessActor", Layer::Business));
        model.add_element(element("a", "Second", "archimate:BusinessActor", Layer::Business));
        assert_eq!(model.elements().len(), 2);
        assert_eq!(model.elements()[0].name, "Second");
        assert_eq!(model.layer_elements(Layer::Business).len(), 2);
    }

    #[test]
    fn test_dangling_relationships_detected() {
        let mut model = Model::new("m1", "m", None, "m.archimate");
        model.add_element(element("a", "A", "archimate:BusinessActor", Layer::Business));
        model.add_relationship(Relationship {
            id: "r1".into(),
            relationship_type: "archimate:ServingRelationship".into(),
            source: "a".into(),
            target: "ghost".into(),
            name: None,
            documentation: None,
        });
        assert_eq!(model.dangling_relationships().len(), 1);
        assert_eq!(model.relationships()[0].counterpart("a"), Some("ghost"));
        assert_eq!(model.relationships()[0].counterpart("zzz"), None);
    }

    #[test]
    fn test_unnamed_element_dedups_by_id() {
        let e = element("id-7", "  ", "archimate:BusinessActor", Layer::Business);
        assert_eq!(e.dedup_key(), "id-7");
    }
}
