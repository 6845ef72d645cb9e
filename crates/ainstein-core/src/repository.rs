//! The set of loaded models, queried as one logical graph.
//!
//! [`ModelRepository`] is built once (by the application's loader) and then
//! shared read-only. Every query here is a pure read over the loaded models
//! and consults the [`taxonomy`](crate::taxonomy) classifier for type
//! membership, so typed buckets never overlap.
//!
//! Typed "distinct" queries collapse elements by name: the same logical
//! actor is often modeled with different ids in baseline and target-state
//! models, and answers should count logical entities. The first element in
//! load order wins.

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::models::{Element, Model, Relationship};
use crate::organization::{self, BusinessActorAnalysis, OrganizationalStructure};
use crate::taxonomy::{is_exact_type, ElementType, RelationshipKind};
use crate::traversal::{self, Reached, TraversalOptions};

/// Strict per-type counts, after name deduplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ElementCounts {
    pub business_actors: usize,
    pub business_processes: usize,
    pub business_functions: usize,
    pub application_components: usize,
    /// Every stored element, classified or not, without deduplication.
    pub total: usize,
}

/// In-memory registry of loaded models.
#[derive(Debug, Default)]
pub struct ModelRepository {
    models: Vec<Model>,
    loaded: bool,
}

impl ModelRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an already-loaded repository from parsed models.
    pub fn from_models(models: impl IntoIterator<Item = Model>) -> Self {
        let mut repo = Self::new();
        repo.extend(models);
        repo
    }

    /// True once a load has completed, even if it found no models.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Add models in load order and mark the repository loaded.
    ///
    /// Models are keyed by name: a model whose name is already present
    /// replaces the earlier one.
    pub fn extend(&mut self, models: impl IntoIterator<Item = Model>) {
        for model in models {
            if let Some(pos) = self.models.iter().position(|m| m.name == model.name) {
                tracing::warn!(
                    model = %model.name,
                    replaced = %self.models[pos].source_path.display(),
                    by = %model.source_path.display(),
                    "model name already loaded, replacing"
                );
                self.models[pos] = model;
            } else {
                self.models.push(model);
            }
        }
        self.loaded = true;
    }

    /// Drop every model and return to the unloaded state.
    pub fn reset(&mut self) {
        self.models.clear();
        self.loaded = false;
    }

    pub fn models(&self) -> &[Model] {
        &self.models
    }

    pub fn model(&self, name: &str) -> Option<&Model> {
        self.models.iter().find(|m| m.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// All elements of all models, in load order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.models.iter().flat_map(|m| m.elements().iter())
    }

    /// All relationships of all models, in load order.
    pub fn relationships(&self) -> impl Iterator<Item = &Relationship> {
        self.models.iter().flat_map(|m| m.relationships().iter())
    }

    /// Look an element up by id; the first model that defines it wins.
    pub fn element(&self, id: &str) -> Option<&Element> {
        self.models.iter().find_map(|m| m.element(id))
    }

    /// Every element whose type is exactly `kind`, without deduplication.
    pub fn elements_of_type(&self, kind: ElementType) -> Vec<&Element> {
        self.elements().filter(|e| is_exact_type(e, kind)).collect()
    }

    /// Elements of exactly `kind`, collapsed by name.
    pub fn distinct_of_type(&self, kind: ElementType) -> Vec<&Element> {
        dedup_by_name(self.elements().filter(|e| is_exact_type(e, kind)))
    }

    pub fn business_actors_only(&self) -> Vec<&Element> {
        self.distinct_of_type(ElementType::BusinessActor)
    }

    pub fn business_processes_only(&self) -> Vec<&Element> {
        self.distinct_of_type(ElementType::BusinessProcess)
    }

    pub fn business_functions_only(&self) -> Vec<&Element> {
        self.distinct_of_type(ElementType::BusinessFunction)
    }

    pub fn application_components_only(&self) -> Vec<&Element> {
        self.distinct_of_type(ElementType::ApplicationComponent)
    }

    /// Business, application and technology services, collapsed by name.
    pub fn services_only(&self) -> Vec<&Element> {
        dedup_by_name(
            self.elements()
                .filter(|e| e.kind().map(|k| k.is_service()).unwrap_or(false)),
        )
    }

    pub fn element_counts(&self) -> ElementCounts {
        ElementCounts {
            business_actors: self.business_actors_only().len(),
            business_processes: self.business_processes_only().len(),
            business_functions: self.business_functions_only().len(),
            application_components: self.application_components_only().len(),
            total: self.elements().count(),
        }
    }

    /// Distinct element count per classified type, in taxonomy order.
    /// Types with no elements are omitted.
    pub fn type_histogram(&self) -> Vec<(ElementType, usize)> {
        let mut seen: HashMap<ElementType, HashSet<&str>> = HashMap::new();
        for element in self.elements() {
            if let Some(kind) = element.kind() {
                seen.entry(kind).or_default().insert(element.dedup_key());
            }
        }
        ElementType::ALL
            .iter()
            .filter_map(|kind| seen.get(kind).map(|names| (*kind, names.len())))
            .collect()
    }

    /// Elements whose raw type is outside the taxonomy.
    pub fn unclassified_elements(&self) -> Vec<&Element> {
        self.elements().filter(|e| e.kind().is_none()).collect()
    }

    /// Case-insensitive exact name lookup across all models.
    pub fn find_by_name(&self, name: &str) -> Vec<&Element> {
        let wanted = name.trim().to_lowercase();
        self.elements()
            .filter(|e| e.name.trim().to_lowercase() == wanted)
            .collect()
    }

    /// The element whose name appears in `text`; the longest matching name
    /// wins, ties go to load order. Names shorter than three characters
    /// are ignored.
    pub fn find_mentioned(&self, text: &str) -> Option<&Element> {
        let haystack = text.to_lowercase();
        let mut best: Option<&Element> = None;
        for element in self.elements() {
            let name = element.name.trim().to_lowercase();
            if name.chars().count() < 3 || !contains_phrase(&haystack, &name) {
                continue;
            }
            let better = match best {
                Some(current) => name.len() > current.name.trim().len(),
                None => true,
            };
            if better {
                best = Some(element);
            }
        }
        best
    }

    /// Relationships of exactly `kind`.
    pub fn relationships_of_kind(&self, kind: RelationshipKind) -> Vec<&Relationship> {
        self.relationships().filter(|r| r.is_kind(kind)).collect()
    }

    /// All relationships in which `id` is the source or the target.
    pub fn element_relationships(&self, id: &str) -> Vec<&Relationship> {
        traversal::element_relationships(self, id)
    }

    /// Elements reachable from `id` within `max_depth` hops in either direction.
    pub fn impacted_elements(&self, id: &str, max_depth: usize) -> Vec<&Element> {
        traversal::impacted_elements(self, id, max_depth)
    }

    pub fn traverse(&self, id: &str, options: &TraversalOptions) -> Vec<Reached<'_>> {
        traversal::traverse(self, id, options)
    }

    pub fn dependency_chains(&self, id: &str, max_depth: usize) -> Vec<Vec<&Element>> {
        traversal::dependency_chains(self, id, max_depth)
    }

    pub fn organizational_structure(&self) -> OrganizationalStructure<'_> {
        organization::organizational_structure(self)
    }

    pub fn business_actor_analysis(&self) -> BusinessActorAnalysis<'_> {
        organization::analyze(self)
    }
}

/// Keep the first element for each name, preserving order.
pub fn dedup_by_name<'a>(elements: impl Iterator<Item = &'a Element>) -> Vec<&'a Element> {
    let mut seen = HashSet::new();
    elements.filter(|&e| seen.insert(e.dedup_key())).collect()
}

/// Phrase containment on word boundaries, so "port" does not match "report".
fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    haystack.match_indices(phrase).any(|(start, _)| {
        let end = start + phrase.len();
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .map(|c| !c.is_alphanumeric())
            .unwrap_or(true);
        let after_ok = haystack[end..]
            .chars()
            .next()
            .map(|c| !c.is_alphanumeric())
            .unwrap_or(true);
        before_ok && after_ok
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Layer;

    fn element(model: &str, id: &str, name: &str, ty: &str) -> Element {
        Element {
            id: id.into(),
            name: name.into(),
            element_type: format!("archimate:{}", ty),
            layer: Layer::Business,
            documentation: None,
            properties: Vec::new(),
            model: model.into(),
        }
    }

    fn model(name: &str, elements: Vec<Element>) -> Model {
        let mut m = Model::new(format!("id-{}", name), name, None, format!("{}.archimate", name));
        for e in elements {
            m.add_element(e);
        }
        m
    }

    fn sample_repo() -> ModelRepository {
        let baseline = model(
            "baseline",
            vec![
                element("baseline", "a1", "ArchiMetal", "BusinessActor"),
                element("baseline", "a2", "DC Benelux", "BusinessActor"),
                element("baseline", "p1", "Order Handling", "BusinessProcess"),
                element("baseline", "f1", "Sales", "BusinessFunction"),
                element("baseline", "x1", "Odd", "BusinessActorRole"),
            ],
        );
        let target = model(
            "target",
            vec![
                element("target", "b1", "ArchiMetal", "BusinessActor"),
                element("target", "b2", "DC Spain", "BusinessActor"),
                element("target", "s1", "Invoicing", "ApplicationService"),
                element("target", "c1", "ERP", "ApplicationComponent"),
            ],
        );
        ModelRepository::from_models(vec![baseline, target])
    }

    #[test]
    fn test_actor_dedup_first_seen_wins() {
        let repo = sample_repo();
        let actors = repo.business_actors_only();
        let ids: Vec<&str> = actors.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "a2", "b2"]);
        assert_eq!(repo.elements_of_type(ElementType::BusinessActor).len(), 4);
    }

    #[test]
    fn test_counts_match_buckets() {
        let repo = sample_repo();
        let counts = repo.element_counts();
        assert_eq!(counts.business_actors, repo.business_actors_only().len());
        assert_eq!(counts.business_processes, 1);
        assert_eq!(counts.business_functions, 1);
        assert_eq!(counts.application_components, 1);
        assert_eq!(counts.total, 9);
    }

    #[test]
    fn test_unknown_type_counted_but_not_bucketed() {
        let repo = sample_repo();
        let unknown = repo.unclassified_elements();
        assert_eq!(unknown.len(), 1);
        assert_eq!(unknown[0].id, "x1");
        assert!(!repo.business_actors_only().iter().any(|e| e.id == "x1"));
    }

    #[test]
    fn test_buckets_pairwise_disjoint() {
        let repo = sample_repo();
        let actors: HashSet<&str> = repo.business_actors_only().iter().map(|e| e.id.as_str()).collect();
        let processes: HashSet<&str> = repo.business_processes_only().iter().map(|e| e.id.as_str()).collect();
        let functions: HashSet<&str> = repo.business_functions_only().iter().map(|e| e.id.as_str()).collect();
        assert!(actors.is_disjoint(&processes));
        assert!(actors.is_disjoint(&functions));
        assert!(processes.is_disjoint(&functions));
    }

    #[test]
    fn test_same_name_model_replaces() {
        let mut repo = sample_repo();
        repo.extend(vec![model("target", vec![])]);
        assert_eq!(repo.models().len(), 2);
        assert_eq!(repo.model("target").map(|m| m.elements().len()), Some(0));
    }

    #[test]
    fn test_reset_unloads() {
        let mut repo = sample_repo();
        assert!(repo.is_loaded());
        repo.reset();
        assert!(!repo.is_loaded());
        assert!(repo.is_empty());
    }

    #[test]
    fn test_find_mentioned_prefers_longest_name() {
        let repo = sample_repo();
        let found = repo.find_mentioned("What is impacted if DC Benelux changes?");
        assert_eq!(found.map(|e| e.id.as_str()), Some("a2"));
        let found = repo.find_mentioned("impact of changing the order handling process");
        assert_eq!(found.map(|e| e.id.as_str()), Some("p1"));
        assert!(repo.find_mentioned("nothing relevant here").is_none());
    }

    #[test]
    fn test_find_mentioned_respects_word_boundaries() {
        let repo = ModelRepository::from_models(vec![model(
            "m",
            vec![element("m", "e1", "ERP", "ApplicationComponent")],
        )]);
        assert!(repo.find_mentioned("the interpreter is slow").is_none());
        assert!(repo.find_mentioned("what does erp serve?").is_some());
    }

    #[test]
    fn test_relationships_of_kind_is_exact() {
        let mut m = model("m", vec![]);
        for (id, ty) in [("r1", "CompositionRelationship"), ("r2", "AssignmentRelationship"), ("r3", "CompositionRelationship")] {
            m.add_relationship(Relationship {
                id: id.into(),
                relationship_type: format!("archimate:{}", ty),
                source: "a".into(),
                target: "b".into(),
                name: None,
                documentation: None,
            });
        }
        let repo = ModelRepository::from_models(vec![m]);
        let ids: Vec<&str> = repo
            .relationships_of_kind(RelationshipKind::Composition)
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(ids, vec!["r1", "r3"]);
        assert!(repo.relationships_of_kind(RelationshipKind::Serving).is_empty());
    }

    #[test]
    fn test_histogram_uses_distinct_names() {
        let repo = sample_repo();
        let hist = repo.type_histogram();
        assert_eq!(hist[0], (ElementType::BusinessActor, 3));
        assert!(hist.contains(&(ElementType::ApplicationService, 1)));
        assert_eq!(repo.services_only().len(), 1);
    }
}
