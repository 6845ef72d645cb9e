//! Relationship traversal over the union of all loaded models.
//!
//! Relationships only ever reference ids inside their own model, but the
//! repository is queried as one logical graph: adjacency is the union of
//! every model's relationships keyed by element id.
//!
//! # Impact traversal
//!
//! 1. Start from the seed id at depth 0, mark it visited.
//! 2. Pop the next element; if its depth is below `max_depth`, follow every
//!    relationship touching it (direction and kind filtered per
//!    [`TraversalOptions`]).
//! 3. Each counterpart that resolves to an element and has not been
//!    visited is recorded at `depth + 1` and queued. First discovery wins.
//! 4. Dangling counterparts (ids no model defines) are skipped.
//!
//! The seed itself is never part of the result, and the visited set makes
//! cycles harmless.

use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};

use crate::models::{Element, Relationship};
use crate::repository::ModelRepository;
use crate::taxonomy::RelationshipKind;

/// Which relationship endpoints a traversal follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// From source to target only.
    Outgoing,
    /// From target to source only.
    Incoming,
    /// Either way.
    #[default]
    Both,
}

/// Configuration for [`traverse`].
#[derive(Debug, Clone)]
pub struct TraversalOptions {
    /// Maximum number of hops from the seed.
    pub max_depth: usize,
    pub direction: Direction,
    /// Only follow relationships of these kinds (`None` follows all,
    /// including unclassified relationship types).
    pub kinds: Option<Vec<RelationshipKind>>,
}

impl TraversalOptions {
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            direction: Direction::Both,
            kinds: None,
        }
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn kinds(mut self, kinds: Vec<RelationshipKind>) -> Self {
        self.kinds = Some(kinds);
        self
    }

    fn follows(&self, rel: &Relationship) -> bool {
        match &self.kinds {
            None => true,
            Some(kinds) => rel.kind().map(|k| kinds.contains(&k)).unwrap_or(false),
        }
    }
}

/// An element discovered by a traversal.
#[derive(Debug, Clone, Serialize)]
pub struct Reached<'a> {
    pub element: &'a Element,
    /// Hops from the seed (1 for direct neighbours).
    pub depth: usize,
    /// The relationship through which the element was first discovered.
    pub via: &'a Relationship,
}

/// Adjacency over the union graph: element id → (relationship, counterpart id).
struct Adjacency<'a> {
    outgoing: HashMap<&'a str, Vec<&'a Relationship>>,
    incoming: HashMap<&'a str, Vec<&'a Relationship>>,
}

impl<'a> Adjacency<'a> {
    fn build(repo: &'a ModelRepository) -> Self {
        let mut outgoing: HashMap<&str, Vec<&Relationship>> = HashMap::new();
        let mut incoming: HashMap<&str, Vec<&Relationship>> = HashMap::new();
        for rel in repo.relationships() {
            outgoing.entry(rel.source.as_str()).or_default().push(rel);
            incoming.entry(rel.target.as_str()).or_default().push(rel);
        }
        Self { outgoing, incoming }
    }

    /// Neighbours of `id` as (relationship, counterpart id), in load order.
    fn neighbours(&self, id: &str, direction: Direction) -> Vec<(&'a Relationship, &'a str)> {
        let mut out = Vec::new();
        if matches!(direction, Direction::Outgoing | Direction::Both) {
            if let Some(rels) = self.outgoing.get(id) {
                out.extend(rels.iter().map(|&r| (r, r.target.as_str())));
            }
        }
        if matches!(direction, Direction::Incoming | Direction::Both) {
            if let Some(rels) = self.incoming.get(id) {
                out.extend(rels.iter().map(|&r| (r, r.source.as_str())));
            }
        }
        out
    }
}

/// All relationships in which `id` is the source or the target, across all models.
pub fn element_relationships<'a>(repo: &'a ModelRepository, id: &str) -> Vec<&'a Relationship> {
    repo.relationships()
        .filter(|r| r.source == id || r.target == id)
        .collect()
}

/// Breadth-first traversal from `seed`, bounded by `options.max_depth`.
///
/// Results are in discovery order; the seed is never included.
pub fn traverse<'a>(
    repo: &'a ModelRepository,
    seed: &str,
    options: &TraversalOptions,
) -> Vec<Reached<'a>> {
    let adjacency = Adjacency::build(repo);
    let mut visited: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<(&str, usize)> = VecDeque::new();
    let mut reached = Vec::new();

    visited.insert(seed);
    queue.push_back((seed, 0));

    while let Some((current, depth)) = queue.pop_front() {
        if depth >= options.max_depth {
            continue;
        }
        for (rel, next) in adjacency.neighbours(current, options.direction) {
            if !options.follows(rel) || visited.contains(next) {
                continue;
            }
            let Some(element) = repo.element(next) else {
                tracing::debug!(relationship = %rel.id, missing = %next, "skipping dangling relationship");
                continue;
            };
            visited.insert(next);
            reached.push(Reached {
                element,
                depth: depth + 1,
                via: rel,
            });
            queue.push_back((next, depth + 1));
        }
    }
    reached
}

/// Elements reachable from `seed` in at most `max_depth` hops, in either direction.
pub fn impacted_elements<'a>(
    repo: &'a ModelRepository,
    seed: &str,
    max_depth: usize,
) -> Vec<&'a Element> {
    traverse(repo, seed, &TraversalOptions::new(max_depth))
        .into_iter()
        .map(|r| r.element)
        .collect()
}

/// Every simple outgoing path from `seed`, up to `max_depth` hops long.
///
/// Paths are listed maximal-first per branch: a path is emitted when it can
/// not be extended (no unvisited resolvable successor, or depth reached).
/// Each path excludes the seed. A per-path visited set keeps cycles from
/// looping.
pub fn dependency_chains<'a>(
    repo: &'a ModelRepository,
    seed: &str,
    max_depth: usize,
) -> Vec<Vec<&'a Element>> {
    let adjacency = Adjacency::build(repo);
    let mut chains = Vec::new();
    let mut path: Vec<&'a Element> = Vec::new();
    let mut on_path: HashSet<&str> = HashSet::new();
    extend_chain(
        repo,
        &adjacency,
        seed,
        seed,
        max_depth,
        &mut path,
        &mut on_path,
        &mut chains,
    );
    chains
}

#[allow(clippy::too_many_arguments)]
fn extend_chain<'a>(
    repo: &'a ModelRepository,
    adjacency: &Adjacency<'a>,
    seed: &str,
    current: &str,
    max_depth: usize,
    path: &mut Vec<&'a Element>,
    on_path: &mut HashSet<&'a str>,
    chains: &mut Vec<Vec<&'a Element>>,
) {
    let mut extended = false;
    if path.len() < max_depth {
        for (_, next) in adjacency.neighbours(current, Direction::Outgoing) {
            if next == seed || on_path.contains(next) {
                continue;
            }
            let Some(element) = repo.element(next) else {
                continue;
            };
            extended = true;
            on_path.insert(next);
            path.push(element);
            extend_chain(repo, adjacency, seed, next, max_depth, path, on_path, chains);
            path.pop();
            on_path.remove(next);
        }
    }
    if !extended && !path.is_empty() {
        chains.push(path.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Layer, Model};

    fn graph(nodes: &[&str], edges: &[(&str, &str)]) -> ModelRepository {
        let mut m = Model::new("m", "m", None, "m.archimate");
        for id in nodes {
            m.add_element(Element {
                id: id.to_string(),
                name: id.to_string(),
                element_type: "archimate:ApplicationComponent".into(),
                layer: Layer::Application,
                documentation: None,
                properties: Vec::new(),
                model: "m".into(),
            });
        }
        for (i, (s, t)) in edges.iter().enumerate() {
            m.add_relationship(Relationship {
                id: format!("r{}", i),
                relationship_type: "archimate:FlowRelationship".into(),
                source: s.to_string(),
                target: t.to_string(),
                name: None,
                documentation: None,
            });
        }
        ModelRepository::from_models(vec![m])
    }

    fn ids(elements: &[&Element]) -> Vec<String> {
        let mut v: Vec<String> = elements.iter().map(|e| e.id.clone()).collect();
        v.sort();
        v
    }

    #[test]
    fn test_cycle_terminates_without_duplicates() {
        let repo = graph(&["A", "B", "C"], &[("A", "B"), ("B", "C"), ("C", "A")]);
        let impacted = impacted_elements(&repo, "A", 5);
        assert_eq!(ids(&impacted), vec!["B", "C"]);
    }

    #[test]
    fn test_depth_bound_on_chain() {
        let repo = graph(
            &["A", "B", "C", "D", "E"],
            &[("A", "B"), ("B", "C"), ("C", "D"), ("D", "E")],
        );
        assert_eq!(ids(&impacted_elements(&repo, "A", 1)), vec!["B"]);
        assert_eq!(ids(&impacted_elements(&repo, "A", 2)), vec!["B", "C"]);
        assert_eq!(ids(&impacted_elements(&repo, "A", 0)), Vec::<String>::new());
    }

    #[test]
    fn test_traversal_ignores_direction_by_default() {
        let repo = graph(&["A", "B", "C"], &[("B", "A"), ("C", "B")]);
        assert_eq!(ids(&impacted_elements(&repo, "A", 2)), vec!["B", "C"]);

        let outgoing = traverse(&repo, "A", &TraversalOptions::new(2).direction(Direction::Outgoing));
        assert!(outgoing.is_empty());
        let incoming = traverse(&repo, "A", &TraversalOptions::new(2).direction(Direction::Incoming));
        assert_eq!(incoming.len(), 2);
        assert_eq!(incoming[1].depth, 2);
    }

    #[test]
    fn test_dangling_counterpart_skipped() {
        let repo = graph(&["A", "B"], &[("A", "B"), ("A", "ghost")]);
        assert_eq!(ids(&impacted_elements(&repo, "A", 3)), vec!["B"]);
        assert_eq!(element_relationships(&repo, "A").len(), 2);
    }

    #[test]
    fn test_kind_filter() {
        let repo = graph(&["A", "B"], &[("A", "B")]);
        let none = traverse(
            &repo,
            "A",
            &TraversalOptions::new(3).kinds(vec![RelationshipKind::Composition]),
        );
        assert!(none.is_empty());
        let flow = traverse(
            &repo,
            "A",
            &TraversalOptions::new(3).kinds(vec![RelationshipKind::Flow]),
        );
        assert_eq!(flow.len(), 1);
    }

    #[test]
    fn test_dependency_chains_branch_and_cycle() {
        let repo = graph(
            &["A", "B", "C", "D"],
            &[("A", "B"), ("B", "C"), ("C", "A"), ("A", "D")],
        );
        let chains: Vec<Vec<String>> = dependency_chains(&repo, "A", 5)
            .iter()
            .map(|c| c.iter().map(|e| e.id.clone()).collect())
            .collect();
        assert_eq!(chains, vec![vec!["B", "C"], vec!["D"]]);

        let short = dependency_chains(&repo, "A", 1);
        assert_eq!(short.len(), 2);
        assert!(short.iter().all(|c| c.len() == 1));
    }

    #[test]
    fn test_cross_model_union() {
        let mut first = Model::new("m1", "first", None, "1.archimate");
        let mut second = Model::new("m2", "second", None, "2.archimate");
        for (m, id) in [(&mut first, "A"), (&mut second, "B")] {
            m.add_element(Element {
                id: id.into(),
                name: id.into(),
                element_type: "archimate:Node".into(),
                layer: Layer::Technology,
                documentation: None,
                properties: Vec::new(),
                model: m.name.clone(),
            });
        }
        // Dangling inside its own model, resolvable in the union graph.
        second.add_relationship(Relationship {
            id: "x".into(),
            relationship_type: "archimate:ServingRelationship".into(),
            source: "B".into(),
            target: "A".into(),
            name: None,
            documentation: None,
        });
        let repo = ModelRepository::from_models(vec![first, second]);
        assert_eq!(ids(&impacted_elements(&repo, "A", 1)), vec!["B"]);
    }
}
