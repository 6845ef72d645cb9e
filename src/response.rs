//! Markdown answer rendering.
//!
//! [`ResponseBuilder::render`] picks one branch from the query intent and
//! renders it from repository queries. Counts the validator can re-derive
//! are written as `**N noun**`; every other number (per-model sizes,
//! traversal sizes) is left unbolded so the validator never mistakes it
//! for a repository-wide claim.

use std::collections::{BTreeMap, HashMap, HashSet};

use ainstein_core::intent::{QueryElementType, QueryIntent};
use ainstein_core::models::{Element, Layer, Relationship};
use ainstein_core::repository::{dedup_by_name, ModelRepository};
use ainstein_core::taxonomy::RelationshipKind;
use ainstein_core::traversal::TraversalOptions;

use crate::validate::CountSubject;

pub const NO_MODELS: &str =
    "No models are loaded, so I can't answer questions about the architecture yet. \
     Add `.archimate` files to the models directory and reload.";

const MAX_CHAINS: usize = 10;

/// Element population a question is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Actors,
    Processes,
    Functions,
    Services,
    All,
}

impl Scope {
    pub fn from_intent(element_type: QueryElementType) -> Scope {
        match element_type {
            QueryElementType::Actor => Scope::Actors,
            QueryElementType::Process => Scope::Processes,
            QueryElementType::Function => Scope::Functions,
            QueryElementType::Service => Scope::Services,
            _ => Scope::All,
        }
    }

    pub fn noun(self, count: usize) -> &'static str {
        let one = count == 1;
        match self {
            Scope::Actors if one => "business actor",
            Scope::Actors => "business actors",
            Scope::Processes if one => "business process",
            Scope::Processes => "business processes",
            Scope::Functions if one => "business function",
            Scope::Functions => "business functions",
            Scope::Services if one => "service",
            Scope::Services => "services",
            Scope::All if one => "element",
            Scope::All => "elements",
        }
    }

    /// Count subject the validator re-derives for this scope.
    pub fn count_subject(self) -> CountSubject {
        match self {
            Scope::Actors => CountSubject::BusinessActors,
            Scope::Processes => CountSubject::BusinessProcesses,
            Scope::Functions => CountSubject::BusinessFunctions,
            Scope::Services => CountSubject::Services,
            Scope::All => CountSubject::Elements,
        }
    }

    /// Elements in scope. Typed scopes are name-deduplicated; `All` is
    /// every stored element, matching the `total` count.
    pub fn elements(self, repo: &ModelRepository) -> Vec<&Element> {
        match self {
            Scope::Actors => repo.business_actors_only(),
            Scope::Processes => repo.business_processes_only(),
            Scope::Functions => repo.business_functions_only(),
            Scope::Services => repo.services_only(),
            Scope::All => repo.elements().collect(),
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn sorted_by_name<'a>(mut elements: Vec<&'a Element>) -> Vec<&'a Element> {
    elements.sort_by_key(|e| e.display_name().to_lowercase());
    elements
}

fn count_phrase(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("**1 {noun}**")
    } else {
        format!("**{count} {noun}**")
    }
}

fn none_found(noun: &str) -> String {
    format!("I don't see any {noun} in the loaded models.")
}

/// Renders answers over a loaded repository.
pub struct ResponseBuilder<'a> {
    repo: &'a ModelRepository,
    max_depth: usize,
}

impl<'a> ResponseBuilder<'a> {
    pub fn new(repo: &'a ModelRepository, max_depth: usize) -> Self {
        Self { repo, max_depth }
    }

    /// Render the answer to `query` for an already-analyzed intent.
    pub fn render(&self, query: &str, intent: &QueryIntent) -> String {
        if self.repo.is_empty() {
            return NO_MODELS.to_string();
        }

        match intent.element_type {
            QueryElementType::Execution => return self.render_execution(query),
            QueryElementType::Impact => return self.render_impact(query),
            _ if intent.wants_impact_analysis => return self.render_impact(query),
            _ => {}
        }

        let scope = Scope::from_intent(intent.element_type);
        if intent.is_count_only() {
            return self.render_subject_count(CountSubject::for_question(query, scope));
        }
        if intent.wants_relationships {
            return self.render_relationships(query, scope);
        }

        if intent.wants_details && !intent.wants_count && !intent.wants_list {
            if let Some(element) = self.repo.find_mentioned(query) {
                return self.render_details(element);
            }
        }

        match (intent.wants_count, intent.wants_list) {
            (false, true) => self.render_list(scope),
            (true, true) => {
                let elements = scope.elements(self.repo);
                if elements.is_empty() {
                    return none_found(scope.noun(0));
                }
                format!("{}\n\n{}", self.render_count(scope), self.render_list(scope))
            }
            (_, false) if scope != Scope::All => self.render_list(scope),
            (_, false) => self.render_overview(),
        }
    }

    /// One-line count sentence. Never names individual elements.
    pub fn render_count(&self, scope: Scope) -> String {
        self.render_subject_count(scope.count_subject())
    }

    /// One-line count sentence for any subject the validator can re-derive.
    pub fn render_subject_count(&self, subject: CountSubject) -> String {
        match subject.actual(self.repo) {
            0 => none_found(subject.noun(0)),
            1 => format!(
                "There is {} in the loaded models.",
                count_phrase(1, subject.noun(1))
            ),
            n => format!(
                "There are {} in the loaded models.",
                count_phrase(n, subject.noun(n))
            ),
        }
    }

    /// Categorized list without count emphasis.
    pub fn render_list(&self, scope: Scope) -> String {
        let elements = scope.elements(self.repo);
        if elements.is_empty() {
            return none_found(scope.noun(0));
        }

        let mut out = format!("{} in the loaded models:\n", capitalize(scope.noun(2)));
        match scope {
            Scope::Actors => {
                let analysis = self.repo.business_actor_analysis();
                let buckets = [
                    ("Internal actors", analysis.internal_actors),
                    ("Departments", analysis.departments),
                    ("External actors", analysis.external_actors),
                ];
                for (title, members) in buckets {
                    if members.is_empty() {
                        continue;
                    }
                    out.push_str(&format!("\n### {title}\n"));
                    for actor in sorted_by_name(members) {
                        out.push_str(&format!("- {}\n", actor.display_name()));
                    }
                }
            }
            Scope::Services => {
                let mut by_type: BTreeMap<String, Vec<&Element>> = BTreeMap::new();
                for e in elements {
                    by_type.entry(e.type_label()).or_default().push(e);
                }
                for (label, members) in by_type {
                    out.push_str(&format!("\n### {label}\n"));
                    for e in sorted_by_name(members) {
                        out.push_str(&format!("- {}\n", e.display_name()));
                    }
                }
            }
            Scope::Processes | Scope::Functions => {
                let mut by_model: BTreeMap<&str, Vec<&Element>> = BTreeMap::new();
                for e in elements {
                    by_model.entry(e.model.as_str()).or_default().push(e);
                }
                let single = by_model.len() == 1;
                for (model, members) in by_model {
                    if !single {
                        out.push_str(&format!("\n### {model}\n"));
                    }
                    for e in sorted_by_name(members) {
                        out.push_str(&format!("- {}\n", e.display_name()));
                    }
                }
            }
            Scope::All => {
                for model in self.repo.models() {
                    out.push_str(&format!("\n### {}\n", model.name));
                    for layer in Layer::ALL {
                        let members = model.layer_elements(layer);
                        if members.is_empty() {
                            continue;
                        }
                        out.push_str(&format!("#### {} layer\n", layer.label()));
                        for e in sorted_by_name(members) {
                            out.push_str(&format!("- {} ({})\n", e.display_name(), e.type_label()));
                        }
                    }
                }
            }
        }
        out.trim_end().to_string()
    }

    /// Model overview: total size, per-model sizes, type histogram.
    pub fn render_overview(&self) -> String {
        let models = self.repo.models();
        let counts = self.repo.element_counts();
        let model_noun = if models.len() == 1 { "model" } else { "models" };
        let mut out = format!(
            "The loaded models contain {} in {}.\n\n### Models\n",
            count_phrase(counts.total, Scope::All.noun(counts.total)),
            count_phrase(models.len(), model_noun),
        );
        for model in models {
            out.push_str(&format!(
                "- {}: {} elements, {} relationships, {} views\n",
                model.name,
                model.elements().len(),
                model.relationships().len(),
                model.views().len()
            ));
        }

        let histogram = self.repo.type_histogram();
        if !histogram.is_empty() {
            out.push_str("\n### Element types\n");
            for (kind, count) in histogram {
                out.push_str(&format!("- {}: {}\n", kind.label(), count));
            }
        }
        let unclassified = self.repo.unclassified_elements().len();
        if unclassified > 0 {
            out.push_str(&format!("- Unclassified: {unclassified}\n"));
        }
        out.trim_end().to_string()
    }

    fn name_of(&self, id: &'a str) -> &'a str {
        self.repo
            .element(id)
            .map(|e| e.display_name())
            .unwrap_or(id)
    }

    fn relationship_line(&self, rel: &'a Relationship) -> String {
        let mut line = format!(
            "- {} → {} ({})",
            self.name_of(&rel.source),
            self.name_of(&rel.target),
            rel.type_label()
        );
        if let Some(name) = &rel.name {
            line.push_str(&format!(": {name}"));
        }
        line
    }

    /// Organizational hierarchy for actors, relationship listings otherwise.
    pub fn render_relationships(&self, query: &str, scope: Scope) -> String {
        match scope {
            Scope::Actors => self.render_hierarchy(),
            Scope::All => match self.repo.find_mentioned(query) {
                Some(element) => self.render_element_relationships(element),
                None => self.render_hierarchy(),
            },
            _ => self.render_typed_relationships(scope),
        }
    }

    fn render_hierarchy(&self) -> String {
        let actors = self.repo.business_actors_only();
        if actors.is_empty() {
            return none_found(Scope::Actors.noun(0));
        }

        let structure = self.repo.organizational_structure();
        if structure.is_empty() {
            let mut out = String::from("Business actors in the loaded models:\n");
            for actor in sorted_by_name(actors) {
                out.push_str(&format!("- {}\n", actor.display_name()));
            }
            out.push_str("\n_No relationships found between business actors, so no hierarchy can be shown._");
            return out;
        }

        let analysis = self.repo.business_actor_analysis();
        let mut out = String::new();

        if !structure.composition.is_empty() {
            let mut children: HashMap<&str, Vec<&Element>> = HashMap::new();
            let mut targets = HashSet::new();
            for link in &structure.composition {
                children
                    .entry(link.source.dedup_key())
                    .or_default()
                    .push(link.target);
                targets.insert(link.target.dedup_key());
            }
            let mut roots: Vec<&Element> = analysis
                .internal_actors
                .iter()
                .copied()
                .filter(|a| !targets.contains(a.dedup_key()))
                .collect();
            if roots.is_empty() {
                roots = analysis.internal_actors.clone();
            }

            out.push_str("### Organizational structure\n");
            let mut on_path = HashSet::new();
            for root in sorted_by_name(roots) {
                write_tree(&mut out, root, &children, 0, &mut on_path);
            }
        }

        if !structure.assignment.is_empty() {
            out.push_str("\n### Assignments\n");
            for link in &structure.assignment {
                out.push_str(&format!(
                    "- {} is assigned to {}\n",
                    link.source.display_name(),
                    link.target.display_name()
                ));
            }
        }

        let internal = analysis.internal_actors.len();
        let departments = analysis.departments.len();
        let external = analysis.external_actors.len();
        out.push_str(&format!(
            "\n### Summary\n- {}\n- {}\n- {}",
            count_phrase(internal, if internal == 1 { "internal actor" } else { "internal actors" }),
            count_phrase(departments, if departments == 1 { "department" } else { "departments" }),
            count_phrase(external, if external == 1 { "external actor" } else { "external actors" }),
        ));
        if external > 0 {
            out.push_str(&format!(
                "\n\nNot part of any composition: {}",
                sorted_by_name(analysis.external_actors)
                    .iter()
                    .map(|a| a.display_name())
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }
        out.trim_start().to_string()
    }

    fn render_typed_relationships(&self, scope: Scope) -> String {
        let elements = sorted_by_name(scope.elements(self.repo));
        if elements.is_empty() {
            return none_found(scope.noun(0));
        }

        let mut out = String::new();
        for element in &elements {
            let rels = self.repo.element_relationships(&element.id);
            if rels.is_empty() {
                continue;
            }
            out.push_str(&format!("\n### {}\n", element.display_name()));
            for rel in rels {
                out.push_str(&self.relationship_line(rel));
                out.push('\n');
            }
        }

        if out.is_empty() {
            let mut out = format!("{} in the loaded models:\n", capitalize(scope.noun(2)));
            for e in elements {
                out.push_str(&format!("- {}\n", e.display_name()));
            }
            out.push_str("\n_No relationships found for these elements._");
            return out;
        }
        out.trim().to_string()
    }

    fn render_element_relationships(&self, element: &'a Element) -> String {
        let rels = self.repo.element_relationships(&element.id);
        if rels.is_empty() {
            return format!(
                "No relationships found for {} ({}).",
                element.display_name(),
                element.type_label()
            );
        }
        let mut out = format!("### Relationships of {}\n", element.display_name());
        for rel in rels {
            out.push_str(&self.relationship_line(rel));
            out.push('\n');
        }
        out.trim_end().to_string()
    }

    /// Everything known about a single element.
    pub fn render_details(&self, element: &'a Element) -> String {
        let mut out = format!(
            "### {}\n- Type: {}\n- Layer: {}\n- Model: {}\n",
            element.display_name(),
            element.type_label(),
            element.layer.label(),
            element.model
        );
        if let Some(doc) = element.documentation.as_deref().filter(|d| !d.trim().is_empty()) {
            out.push_str(&format!("\n{}\n", doc.trim()));
        }
        if !element.properties.is_empty() {
            out.push_str("\n#### Properties\n");
            for (key, value) in &element.properties {
                out.push_str(&format!("- {key}: {value}\n"));
            }
        }
        let rels = self.repo.element_relationships(&element.id);
        if !rels.is_empty() {
            out.push_str("\n#### Relationships\n");
            for rel in rels {
                out.push_str(&self.relationship_line(rel));
                out.push('\n');
            }
        }
        out.trim_end().to_string()
    }

    fn not_identified(&self) -> String {
        "I could not identify which element you mean. Name an element exactly as it \
         appears in the model, for example \"What is the impact of changing Order Handling?\""
            .to_string()
    }

    /// Layered report of everything reachable from the mentioned element.
    pub fn render_impact(&self, query: &str) -> String {
        let Some(element) = self.repo.find_mentioned(query) else {
            return self.not_identified();
        };
        self.impact_report(element)
    }

    pub fn impact_report(&self, element: &'a Element) -> String {
        let mut out = format!(
            "### Impact analysis: {} ({}, {} layer)\n",
            element.display_name(),
            element.type_label(),
            element.layer.label()
        );

        let reached = self
            .repo
            .traverse(&element.id, &TraversalOptions::new(self.max_depth));
        if reached.is_empty() {
            out.push_str(&format!(
                "\nNo other elements are connected to {}, so changing it has no modeled impact.",
                element.display_name()
            ));
            return out;
        }

        let hops = if self.max_depth == 1 { "hop" } else { "hops" };
        out.push_str(&format!(
            "\nChanging {} can affect {} other elements within {} {}.\n",
            element.display_name(),
            reached.len(),
            self.max_depth,
            hops
        ));

        let direct = self.repo.element_relationships(&element.id);
        if !direct.is_empty() {
            out.push_str("\n#### Direct relationships\n");
            for rel in direct {
                out.push_str(&self.relationship_line(rel));
                out.push('\n');
            }
        }

        for layer in Layer::ALL {
            let in_layer: Vec<_> = reached.iter().filter(|r| r.element.layer == layer).collect();
            if in_layer.is_empty() {
                continue;
            }
            out.push_str(&format!("\n#### {} layer\n", layer.label()));
            for r in in_layer {
                let hop = if r.depth == 1 { "hop" } else { "hops" };
                out.push_str(&format!(
                    "- {} ({}), {} {} via {}\n",
                    r.element.display_name(),
                    r.element.type_label(),
                    r.depth,
                    hop,
                    r.via.type_label()
                ));
            }
        }
        out.trim_end().to_string()
    }

    /// Who performs the mentioned element and what it flows into.
    pub fn render_execution(&self, query: &str) -> String {
        let Some(element) = self.repo.find_mentioned(query) else {
            return self.not_identified();
        };

        let rels = self.repo.element_relationships(&element.id);
        let resolve = |ids: Vec<&'a str>| -> Vec<&'a Element> {
            dedup_by_name(ids.into_iter().filter_map(|id| self.repo.element(id)))
        };
        let performers = resolve(
            rels.iter()
                .filter(|r| r.is_kind(RelationshipKind::Assignment) && r.target == element.id)
                .map(|r| r.source.as_str())
                .collect(),
        );
        let assigned = resolve(
            rels.iter()
                .filter(|r| r.is_kind(RelationshipKind::Assignment) && r.source == element.id)
                .map(|r| r.target.as_str())
                .collect(),
        );
        let supporting = resolve(
            rels.iter()
                .filter(|r| r.is_kind(RelationshipKind::Serving) && r.target == element.id)
                .map(|r| r.source.as_str())
                .collect(),
        );
        let chains = self.repo.dependency_chains(&element.id, self.max_depth);

        let mut out = format!(
            "### Execution of {} ({})\n",
            element.display_name(),
            element.type_label()
        );
        let sections = [
            ("Performed by", performers),
            ("Performs", assigned),
            ("Supported by", supporting),
        ];
        let mut any = false;
        for (title, members) in sections {
            if members.is_empty() {
                continue;
            }
            any = true;
            out.push_str(&format!("\n#### {title}\n"));
            for e in members {
                out.push_str(&format!("- {} ({})\n", e.display_name(), e.type_label()));
            }
        }

        if !chains.is_empty() {
            any = true;
            out.push_str("\n#### Execution flow\n");
            for chain in chains.iter().take(MAX_CHAINS) {
                let names: Vec<&str> = std::iter::once(element.display_name())
                    .chain(chain.iter().map(|e| e.display_name()))
                    .collect();
                out.push_str(&format!("- {}\n", names.join(" → ")));
            }
            if chains.len() > MAX_CHAINS {
                out.push_str(&format!("- ...and {} more paths\n", chains.len() - MAX_CHAINS));
            }
        }

        if !any {
            out.push_str(&format!(
                "\nNo assignments, serving relationships or outgoing flows are modeled for {}.",
                element.display_name()
            ));
        }
        out.trim_end().to_string()
    }
}

fn write_tree<'a>(
    out: &mut String,
    node: &'a Element,
    children: &HashMap<&str, Vec<&'a Element>>,
    indent: usize,
    on_path: &mut HashSet<&'a str>,
) {
    out.push_str(&format!("{}- {}\n", "  ".repeat(indent), node.display_name()));
    if !on_path.insert(node.dedup_key()) {
        return;
    }
    if let Some(kids) = children.get(node.dedup_key()) {
        for &child in kids {
            if on_path.contains(child.dedup_key()) {
                continue;
            }
            write_tree(out, child, children, indent + 1, on_path);
        }
    }
    on_path.remove(node.dedup_key());
}
