//! Canonical ArchiMate 3.2 type taxonomy and strict type classification.
//!
//! Raw type strings come straight from the XML (`archimate:BusinessActor`,
//! sometimes with stray quotes or an `xsi:type=` prefix left over from
//! hand-edited files). [`normalize_type`] reduces them to a lowercase
//! canonical form; membership tests compare normalized strings for exact
//! equality. Substring matching is never used, so `BusinessActor` can not
//! match `BusinessActorRole`-like strings and the typed buckets stay
//! pairwise disjoint.

use serde::Serialize;
use std::fmt;

use crate::models::{Element, Layer};

/// Structural aspect of an element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Aspect {
    Active,
    Behavior,
    Passive,
    Motivation,
    Composite,
}

/// Strip `archimate:` and `xsi:type=` prefixes, quotes and whitespace, then lowercase.
///
/// ```rust
/// use ainstein_core::taxonomy::normalize_type;
///
/// assert_eq!(normalize_type("archimate:BusinessActor"), "businessactor");
/// assert_eq!(normalize_type(" xsi:type=\"archimate:BusinessActor\" "), "businessactor");
/// ```
pub fn normalize_type(raw: &str) -> String {
    let mut s: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    s = s.to_ascii_lowercase();
    if let Some(rest) = s.strip_prefix("xsi:type=") {
        s = rest.to_string();
    }
    s = s.trim_matches(|c| c == '"' || c == '\'').to_string();
    if let Some(rest) = s.strip_prefix("archimate:") {
        s = rest.to_string();
    }
    s
}

/// True when the element's raw type normalizes to exactly `kind`'s canonical name.
pub fn is_exact_type(element: &Element, kind: ElementType) -> bool {
    normalize_type(&element.element_type) == normalize_type(kind.canonical_name())
}

macro_rules! element_types {
    ($( $variant:ident => ($name:literal, $label:literal, $layer:expr, $aspect:expr) ),+ $(,)?) => {
        /// Every element type of the canonical taxonomy.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        pub enum ElementType {
            $( $variant, )+
        }

        impl ElementType {
            pub const ALL: &'static [ElementType] = &[ $( ElementType::$variant, )+ ];

            /// The ArchiMate exchange name, e.g. `BusinessActor`.
            pub fn canonical_name(&self) -> &'static str {
                match self {
                    $( ElementType::$variant => $name, )+
                }
            }

            /// Display label, e.g. `Business Actor`.
            pub fn label(&self) -> &'static str {
                match self {
                    $( ElementType::$variant => $label, )+
                }
            }

            /// The layer this type belongs to in the taxonomy. Motivation and
            /// composite types have none.
            pub fn layer(&self) -> Option<Layer> {
                match self {
                    $( ElementType::$variant => $layer, )+
                }
            }

            pub fn aspect(&self) -> Aspect {
                match self {
                    $( ElementType::$variant => $aspect, )+
                }
            }
        }
    };
}

element_types! {
    // Strategy
    Resource => ("Resource", "Resource", Some(Layer::Strategy), Aspect::Passive),
    Capability => ("Capability", "Capability", Some(Layer::Strategy), Aspect::Behavior),
    ValueStream => ("ValueStream", "Value Stream", Some(Layer::Strategy), Aspect::Behavior),
    CourseOfAction => ("CourseOfAction", "Course of Action", Some(Layer::Strategy), Aspect::Behavior),
    // Business
    BusinessActor => ("BusinessActor", "Business Actor", Some(Layer::Business), Aspect::Active),
    BusinessRole => ("BusinessRole", "Business Role", Some(Layer::Business), Aspect::Active),
    BusinessCollaboration => ("BusinessCollaboration", "Business Collaboration", Some(Layer::Business), Aspect::Active),
    BusinessInterface => ("BusinessInterface", "Business Interface", Some(Layer::Business), Aspect::Active),
    BusinessProcess => ("BusinessProcess", "Business Process", Some(Layer::Business), Aspect::Behavior),
    BusinessFunction => ("BusinessFunction", "Business Function", Some(Layer::Business), Aspect::Behavior),
    BusinessInteraction => ("BusinessInteraction", "Business Interaction", Some(Layer::Business), Aspect::Behavior),
    BusinessEvent => ("BusinessEvent", "Business Event", Some(Layer::Business), Aspect::Behavior),
    BusinessService => ("BusinessService", "Business Service", Some(Layer::Business), Aspect::Behavior),
    BusinessObject => ("BusinessObject", "Business Object", Some(Layer::Business), Aspect::Passive),
    Contract => ("Contract", "Contract", Some(Layer::Business), Aspect::Passive),
    Representation => ("Representation", "Representation", Some(Layer::Business), Aspect::Passive),
    Product => ("Product", "Product", Some(Layer::Business), Aspect::Passive),
    // Application
    ApplicationComponent => ("ApplicationComponent", "Application Component", Some(Layer::Application), Aspect::Active),
    ApplicationCollaboration => ("ApplicationCollaboration", "Application Collaboration", Some(Layer::Application), Aspect::Active),
    ApplicationInterface => ("ApplicationInterface", "Application Interface", Some(Layer::Application), Aspect::Active),
    ApplicationFunction => ("ApplicationFunction", "Application Function", Some(Layer::Application), Aspect::Behavior),
    ApplicationInteraction => ("ApplicationInteraction", "Application Interaction", Some(Layer::Application), Aspect::Behavior),
    ApplicationProcess => ("ApplicationProcess", "Application Process", Some(Layer::Application), Aspect::Behavior),
    ApplicationEvent => ("ApplicationEvent", "Application Event", Some(Layer::Application), Aspect::Behavior),
    ApplicationService => ("ApplicationService", "Application Service", Some(Layer::Application), Aspect::Behavior),
    DataObject => ("DataObject", "Data Object", Some(Layer::Application), Aspect::Passive),
    // Technology & physical
    Node => ("Node", "Node", Some(Layer::Technology), Aspect::Active),
    Device => ("Device", "Device", Some(Layer::Technology), Aspect::Active),
    SystemSoftware => ("SystemSoftware", "System Software", Some(Layer::Technology), Aspect::Active),
    TechnologyCollaboration => ("TechnologyCollaboration", "Technology Collaboration", Some(Layer::Technology), Aspect::Active),
    TechnologyInterface => ("TechnologyInterface", "Technology Interface", Some(Layer::Technology), Aspect::Active),
    Path => ("Path", "Path", Some(Layer::Technology), Aspect::Active),
    CommunicationNetwork => ("CommunicationNetwork", "Communication Network", Some(Layer::Technology), Aspect::Active),
    Equipment => ("Equipment", "Equipment", Some(Layer::Technology), Aspect::Active),
    Facility => ("Facility", "Facility", Some(Layer::Technology), Aspect::Active),
    DistributionNetwork => ("DistributionNetwork", "Distribution Network", Some(Layer::Technology), Aspect::Active),
    TechnologyFunction => ("TechnologyFunction", "Technology Function", Some(Layer::Technology), Aspect::Behavior),
    TechnologyProcess => ("TechnologyProcess", "Technology Process", Some(Layer::Technology), Aspect::Behavior),
    TechnologyInteraction => ("TechnologyInteraction", "Technology Interaction", Some(Layer::Technology), Aspect::Behavior),
    TechnologyEvent => ("TechnologyEvent", "Technology Event", Some(Layer::Technology), Aspect::Behavior),
    TechnologyService => ("TechnologyService", "Technology Service", Some(Layer::Technology), Aspect::Behavior),
    Artifact => ("Artifact", "Artifact", Some(Layer::Technology), Aspect::Passive),
    Material => ("Material", "Material", Some(Layer::Technology), Aspect::Passive),
    // Implementation & migration
    WorkPackage => ("WorkPackage", "Work Package", Some(Layer::Implementation), Aspect::Behavior),
    ImplementationEvent => ("ImplementationEvent", "Implementation Event", Some(Layer::Implementation), Aspect::Behavior),
    Deliverable => ("Deliverable", "Deliverable", Some(Layer::Implementation), Aspect::Passive),
    Plateau => ("Plateau", "Plateau", Some(Layer::Implementation), Aspect::Composite),
    Gap => ("Gap", "Gap", Some(Layer::Implementation), Aspect::Passive),
    // Motivation
    Stakeholder => ("Stakeholder", "Stakeholder", None, Aspect::Motivation),
    Driver => ("Driver", "Driver", None, Aspect::Motivation),
    Assessment => ("Assessment", "Assessment", None, Aspect::Motivation),
    Goal => ("Goal", "Goal", None, Aspect::Motivation),
    Outcome => ("Outcome", "Outcome", None, Aspect::Motivation),
    Principle => ("Principle", "Principle", None, Aspect::Motivation),
    Requirement => ("Requirement", "Requirement", None, Aspect::Motivation),
    Constraint => ("Constraint", "Constraint", None, Aspect::Motivation),
    Meaning => ("Meaning", "Meaning", None, Aspect::Motivation),
    Value => ("Value", "Value", None, Aspect::Motivation),
    // Other
    Location => ("Location", "Location", None, Aspect::Composite),
    Grouping => ("Grouping", "Grouping", None, Aspect::Composite),
    Junction => ("Junction", "Junction", None, Aspect::Composite),
}

impl ElementType {
    /// Classify a raw XML type string. Returns `None` for anything outside the taxonomy.
    pub fn from_raw(raw: &str) -> Option<ElementType> {
        let normalized = normalize_type(raw);
        ElementType::ALL
            .iter()
            .copied()
            .find(|t| t.canonical_name().to_ascii_lowercase() == normalized)
    }

    /// Service types across all layers.
    pub fn is_service(&self) -> bool {
        matches!(
            self,
            ElementType::BusinessService
                | ElementType::ApplicationService
                | ElementType::TechnologyService
        )
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The ArchiMate relationship types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RelationshipKind {
    Composition,
    Aggregation,
    Assignment,
    Realization,
    Serving,
    Access,
    Influence,
    Triggering,
    Flow,
    Specialization,
    Association,
}

impl RelationshipKind {
    pub const ALL: [RelationshipKind; 11] = [
        RelationshipKind::Composition,
        RelationshipKind::Aggregation,
        RelationshipKind::Assignment,
        RelationshipKind::Realization,
        RelationshipKind::Serving,
        RelationshipKind::Access,
        RelationshipKind::Influence,
        RelationshipKind::Triggering,
        RelationshipKind::Flow,
        RelationshipKind::Specialization,
        RelationshipKind::Association,
    ];

    /// Canonical exchange name, e.g. `CompositionRelationship`.
    pub fn canonical_name(&self) -> &'static str {
        match self {
            RelationshipKind::Composition => "CompositionRelationship",
            RelationshipKind::Aggregation => "AggregationRelationship",
            RelationshipKind::Assignment => "AssignmentRelationship",
            RelationshipKind::Realization => "RealizationRelationship",
            RelationshipKind::Serving => "ServingRelationship",
            RelationshipKind::Access => "AccessRelationship",
            RelationshipKind::Influence => "InfluenceRelationship",
            RelationshipKind::Triggering => "TriggeringRelationship",
            RelationshipKind::Flow => "FlowRelationship",
            RelationshipKind::Specialization => "SpecializationRelationship",
            RelationshipKind::Association => "AssociationRelationship",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RelationshipKind::Composition => "Composition",
            RelationshipKind::Aggregation => "Aggregation",
            RelationshipKind::Assignment => "Assignment",
            RelationshipKind::Realization => "Realization",
            RelationshipKind::Serving => "Serving",
            RelationshipKind::Access => "Access",
            RelationshipKind::Influence => "Influence",
            RelationshipKind::Triggering => "Triggering",
            RelationshipKind::Flow => "Flow",
            RelationshipKind::Specialization => "Specialization",
            RelationshipKind::Association => "Association",
        }
    }

    /// Classify a raw relationship type. Both `CompositionRelationship`
    /// and the short form `Composition` are accepted.
    pub fn from_raw(raw: &str) -> Option<RelationshipKind> {
        let normalized = normalize_type(raw);
        let short = normalized
            .strip_suffix("relationship")
            .unwrap_or(&normalized);
        RelationshipKind::ALL
            .iter()
            .copied()
            .find(|k| k.label().to_ascii_lowercase() == short)
    }
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
