//! Organizational structure derived from Business Actor relationships.
//!
//! Categorization uses only the parsed Composition relationships between
//! two Business Actors, never actor names:
//!
//! | Composition role | Bucket |
//! |------------------|--------|
//! | not linked at all | external |
//! | source only | internal (top-level unit) |
//! | target only | department (leaf) |
//! | source and target | internal (mid-level unit) |
//!
//! Relationship endpoints are mapped onto the name-deduplicated actors, so
//! an actor modeled under two ids in two models is categorized once from
//! the union of its links. The three buckets always partition the distinct
//! actors.

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::models::Element;
use crate::repository::ModelRepository;
use crate::taxonomy::{ElementType, RelationshipKind};

/// A Business Actor to Business Actor relationship.
#[derive(Debug, Clone, Serialize)]
pub struct ActorLink<'a> {
    pub source: &'a Element,
    pub target: &'a Element,
}

/// Actor-to-actor Composition and Assignment links.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OrganizationalStructure<'a> {
    pub composition: Vec<ActorLink<'a>>,
    pub assignment: Vec<ActorLink<'a>>,
}

impl OrganizationalStructure<'_> {
    pub fn is_empty(&self) -> bool {
        self.composition.is_empty() && self.assignment.is_empty()
    }
}

/// Partition of the distinct Business Actors.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BusinessActorAnalysis<'a> {
    pub internal_actors: Vec<&'a Element>,
    pub external_actors: Vec<&'a Element>,
    pub departments: Vec<&'a Element>,
    pub total: usize,
}

/// Collect the actor-to-actor links of `kind`, with endpoints replaced by
/// their deduplicated representatives. Duplicate links collapse.
fn actor_links<'a>(
    repo: &'a ModelRepository,
    kind: RelationshipKind,
    representatives: &HashMap<&'a str, &'a Element>,
) -> Vec<ActorLink<'a>> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();
    for model in repo.models() {
        for rel in model.relationships().iter().filter(|r| r.is_kind(kind)) {
            let (Some(source), Some(target)) = (model.element(&rel.source), model.element(&rel.target))
            else {
                continue;
            };
            if source.kind() != Some(ElementType::BusinessActor)
                || target.kind() != Some(ElementType::BusinessActor)
            {
                continue;
            }
            let (Some(&source), Some(&target)) = (
                representatives.get(source.dedup_key()),
                representatives.get(target.dedup_key()),
            ) else {
                continue;
            };
            if seen.insert((source.dedup_key(), target.dedup_key())) {
                links.push(ActorLink { source, target });
            }
        }
    }
    links
}

fn representatives<'a>(actors: &[&'a Element]) -> HashMap<&'a str, &'a Element> {
    actors.iter().map(|&e| (e.dedup_key(), e)).collect()
}

/// Composition and Assignment links between Business Actors.
pub fn organizational_structure(repo: &ModelRepository) -> OrganizationalStructure<'_> {
    let actors = repo.business_actors_only();
    let reps = representatives(&actors);
    OrganizationalStructure {
        composition: actor_links(repo, RelationshipKind::Composition, &reps),
        assignment: actor_links(repo, RelationshipKind::Assignment, &reps),
    }
}

/// Partition the distinct Business Actors into internal, external and departments.
pub fn analyze(repo: &ModelRepository) -> BusinessActorAnalysis<'_> {
    let actors = repo.business_actors_only();
    let reps = representatives(&actors);
    let composition = actor_links(repo, RelationshipKind::Composition, &reps);

    let sources: HashSet<&str> = composition.iter().map(|l| l.source.dedup_key()).collect();
    let targets: HashSet<&str> = composition.iter().map(|l| l.target.dedup_key()).collect();

    let mut analysis = BusinessActorAnalysis {
        total: actors.len(),
        ..Default::default()
    };
    for actor in actors {
        let key = actor.dedup_key();
        match (sources.contains(key), targets.contains(key)) {
            (false, false) => analysis.external_actors.push(actor),
            (true, _) => analysis.internal_actors.push(actor),
            (false, true) => analysis.departments.push(actor),
        }
    }
    tracing::debug!(
        internal = analysis.internal_actors.len(),
        external = analysis.external_actors.len(),
        departments = analysis.departments.len(),
        "business actor analysis"
    );
    analysis
}
