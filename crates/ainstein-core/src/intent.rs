//! Rule-based query intent detection.
//!
//! A question is reduced to a [`QueryIntent`]: independent boolean flags
//! (a question can ask for a count *and* a list) plus one element type
//! chosen first-match-wins from an ordered phrase table. This is keyword
//! matching over the lowercased query, nothing more; it never looks at the
//! model graph.
//!
//! # Example
//!
//! ```rust
//! use ainstein_core::intent::{analyze_query_intent, QueryElementType};
//!
//! let intent = analyze_query_intent("List all business actors and count them");
//! assert!(intent.wants_list && intent.wants_count);
//! assert_eq!(intent.element_type, QueryElementType::Actor);
//! ```

use serde::Serialize;
use std::fmt;

/// What kind of element a question is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryElementType {
    Actor,
    Process,
    Function,
    Service,
    Impact,
    Execution,
    #[default]
    All,
}

impl QueryElementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryElementType::Actor => "actor",
            QueryElementType::Process => "process",
            QueryElementType::Function => "function",
            QueryElementType::Service => "service",
            QueryElementType::Impact => "impact",
            QueryElementType::Execution => "execution",
            QueryElementType::All => "all",
        }
    }
}

impl fmt::Display for QueryElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured reading of a free-text question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct QueryIntent {
    pub element_type: QueryElementType,
    pub wants_list: bool,
    pub wants_count: bool,
    pub wants_relationships: bool,
    pub wants_details: bool,
    pub wants_impact_analysis: bool,
}

impl QueryIntent {
    /// A count was requested and a list was not.
    pub fn is_count_only(&self) -> bool {
        self.wants_count && !self.wants_list
    }
}

const COUNT_PHRASES: &[&str] = &["how many", "count", "number of", "total"];

const LIST_PHRASES: &[&str] = &[
    "list",
    "show",
    "what are",
    "which",
    "enumerate",
    "name the",
    "names of",
    "display",
    "give me all",
];

const RELATIONSHIP_PHRASES: &[&str] = &[
    "relationship",
    "relation",
    "hierarchy",
    "structure",
    "organization",
    "organisation",
    "report to",
    "reports to",
    "belong",
    "connected",
    "linked",
    "assigned",
    "composed",
    "internal",
    "external",
    "department",
];

const DETAIL_PHRASES: &[&str] = &[
    "detail",
    "describe",
    "explain",
    "tell me about",
    "information about",
    "what is",
    "who is",
    "documentation",
];

const IMPACT_PHRASES: &[&str] = &[
    "impact",
    "affect",
    "depend",
    "what happens",
    "what if",
    "consequence",
    "ripple",
    "changing",
    "changes to",
    "change to",
    "if we change",
    "if we remove",
];

const EXECUTION_PHRASES: &[&str] = &[
    "execut",
    "perform",
    "carried out",
    "carries out",
    "run by",
    "who runs",
    "responsible for",
    "workflow",
];

/// Ordered element-type table; the first row with a matching phrase wins.
const ELEMENT_TYPE_TABLE: &[(QueryElementType, &[&str])] = &[
    (
        QueryElementType::Impact,
        &["impact", "affect", "what happens", "what if", "consequence", "ripple"],
    ),
    (QueryElementType::Execution, EXECUTION_PHRASES),
    (
        QueryElementType::Actor,
        &["actor", "organization", "organisation", "department", "business unit"],
    ),
    (QueryElementType::Process, &["process"]),
    (QueryElementType::Function, &["function"]),
    (QueryElementType::Service, &["service"]),
];

fn mentions_any(query: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|p| query.contains(p))
}

/// Classify a question. Pure function of the query text.
pub fn analyze_query_intent(query: &str) -> QueryIntent {
    let q = query.to_lowercase();

    let element_type = ELEMENT_TYPE_TABLE
        .iter()
        .find(|(_, phrases)| mentions_any(&q, phrases))
        .map(|(t, _)| *t)
        .unwrap_or_default();

    let intent = QueryIntent {
        element_type,
        wants_list: mentions_any(&q, LIST_PHRASES),
        wants_count: mentions_any(&q, COUNT_PHRASES),
        wants_relationships: mentions_any(&q, RELATIONSHIP_PHRASES),
        wants_details: mentions_any(&q, DETAIL_PHRASES),
        wants_impact_analysis: mentions_any(&q, IMPACT_PHRASES),
    };
    tracing::debug!(query = %query, ?intent, "analyzed query intent");
    intent
}
