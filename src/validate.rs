//! Self-check for rendered answers.
//!
//! Every bolded count claim (`**21 business actors**` or
//! `**21** business actors`) is re-derived from the repository. A claim
//! that disagrees is a [`ValidationIssue::CountMismatch`] and can be
//! rewritten in place by [`ResponseValidator::correct_counts`]. Two more
//! checks flag answers that leak other element types into a typed question
//! or that pad a count-only answer.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

use ainstein_core::intent::{QueryElementType, QueryIntent};
use ainstein_core::repository::ModelRepository;

use crate::response::Scope;

lazy_static! {
    /// `**21 business actors**`
    static ref INLINE_COUNT: Regex =
        Regex::new(r"\*\*(\d+)(\s+)([A-Za-z][A-Za-z \-]*?)\*\*").expect("valid regex");
    /// `**21** business actors`
    static ref LEADING_COUNT: Regex =
        Regex::new(r"\*\*(\d+)\*\*(\s+)([A-Za-z]+(?:[ \-][A-Za-z]+)?)").expect("valid regex");
    /// Whole-word type mentions: `actor`, `processes`, `Function`.
    static ref TYPE_WORD: Regex =
        Regex::new(r"(?i)\b(actor|process|function)(?:s|es)?\b").expect("valid regex");
}

/// What a bolded count claims to count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CountSubject {
    BusinessActors,
    BusinessProcesses,
    BusinessFunctions,
    ApplicationComponents,
    Services,
    InternalActors,
    ExternalActors,
    Departments,
    Relationships,
    Elements,
    Models,
}

impl CountSubject {
    /// Classify the words following a count. More specific subjects are
    /// tried first so "internal actors" is not read as all actors.
    pub fn classify(words: &str) -> Option<CountSubject> {
        let words = words.to_lowercase();
        let table: &[(&str, CountSubject)] = &[
            ("internal", CountSubject::InternalActors),
            ("external", CountSubject::ExternalActors),
            ("department", CountSubject::Departments),
            ("relationship", CountSubject::Relationships),
            ("component", CountSubject::ApplicationComponents),
            ("service", CountSubject::Services),
            ("process", CountSubject::BusinessProcesses),
            ("function", CountSubject::BusinessFunctions),
            ("actor", CountSubject::BusinessActors),
            ("element", CountSubject::Elements),
            ("model", CountSubject::Models),
        ];
        table
            .iter()
            .find(|(needle, _)| words.contains(needle))
            .map(|(_, subject)| *subject)
    }

    /// The true count, using the same queries the renderer uses.
    pub fn actual(self, repo: &ModelRepository) -> usize {
        match self {
            CountSubject::BusinessActors => repo.element_counts().business_actors,
            CountSubject::BusinessProcesses => repo.element_counts().business_processes,
            CountSubject::BusinessFunctions => repo.element_counts().business_functions,
            CountSubject::ApplicationComponents => repo.element_counts().application_components,
            CountSubject::Services => repo.services_only().len(),
            CountSubject::InternalActors => repo.business_actor_analysis().internal_actors.len(),
            CountSubject::ExternalActors => repo.business_actor_analysis().external_actors.len(),
            CountSubject::Departments => repo.business_actor_analysis().departments.len(),
            CountSubject::Relationships => repo.relationships().count(),
            CountSubject::Elements => repo.element_counts().total,
            CountSubject::Models => repo.models().len(),
        }
    }

    /// Subject of a count-only question. Organization and relationship
    /// words take precedence over the element scope of the question.
    pub fn for_question(query: &str, scope: Scope) -> CountSubject {
        let q = query.to_lowercase();
        let table: &[(&str, CountSubject)] = &[
            ("internal", CountSubject::InternalActors),
            ("external", CountSubject::ExternalActors),
            ("department", CountSubject::Departments),
            ("relationship", CountSubject::Relationships),
        ];
        table
            .iter()
            .find(|(needle, _)| q.contains(needle))
            .map(|(_, subject)| *subject)
            .unwrap_or_else(|| scope.count_subject())
    }

    /// Singular or plural noun for `count`.
    pub fn noun(self, count: usize) -> &'static str {
        if count != 1 {
            return self.label();
        }
        match self {
            CountSubject::BusinessActors => "business actor",
            CountSubject::BusinessProcesses => "business process",
            CountSubject::BusinessFunctions => "business function",
            CountSubject::ApplicationComponents => "application component",
            CountSubject::Services => "service",
            CountSubject::InternalActors => "internal actor",
            CountSubject::ExternalActors => "external actor",
            CountSubject::Departments => "department",
            CountSubject::Relationships => "relationship",
            CountSubject::Elements => "element",
            CountSubject::Models => "model",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CountSubject::BusinessActors => "business actors",
            CountSubject::BusinessProcesses => "business processes",
            CountSubject::BusinessFunctions => "business functions",
            CountSubject::ApplicationComponents => "application components",
            CountSubject::Services => "services",
            CountSubject::InternalActors => "internal actors",
            CountSubject::ExternalActors => "external actors",
            CountSubject::Departments => "departments",
            CountSubject::Relationships => "relationships",
            CountSubject::Elements => "elements",
            CountSubject::Models => "models",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationIssue {
    CountMismatch {
        subject: CountSubject,
        claimed: usize,
        actual: usize,
    },
    TypeMixing {
        requested: &'static str,
        mentioned: &'static str,
    },
    Verbose {
        lines: usize,
        max_lines: usize,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::CountMismatch {
                subject,
                claimed,
                actual,
            } => write!(
                f,
                "claimed {claimed} {} but the models contain {actual}",
                subject.label()
            ),
            ValidationIssue::TypeMixing {
                requested,
                mentioned,
            } => write!(f, "answer to a {requested} question mentions '{mentioned}'"),
            ValidationIssue::Verbose { lines, max_lines } => write!(
                f,
                "count-only answer has {lines} lines, expected at most {max_lines}"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        Self {
            is_valid: issues.is_empty(),
            issues,
        }
    }

    pub fn count_mismatches(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| matches!(i, ValidationIssue::CountMismatch { .. }))
            .count()
    }
}

/// Type words that must not appear in an answer about another type.
fn forbidden_words(element_type: QueryElementType) -> &'static [&'static str] {
    match element_type {
        QueryElementType::Actor => &["process", "function"],
        QueryElementType::Process => &["actor", "function"],
        QueryElementType::Function => &["actor", "process"],
        _ => &[],
    }
}

pub struct ResponseValidator<'a> {
    repo: &'a ModelRepository,
    count_only_max_lines: usize,
}

impl<'a> ResponseValidator<'a> {
    pub fn new(repo: &'a ModelRepository, count_only_max_lines: usize) -> Self {
        Self {
            repo,
            count_only_max_lines,
        }
    }

    /// Check `text` as an answer to a question with `intent`.
    pub fn validate(&self, intent: &QueryIntent, text: &str) -> ValidationReport {
        let mut issues = Vec::new();

        for re in [&*INLINE_COUNT, &*LEADING_COUNT] {
            for caps in re.captures_iter(text) {
                if let Some((subject, claimed, actual)) = self.check_claim(&caps) {
                    if claimed != actual {
                        issues.push(ValidationIssue::CountMismatch {
                            subject,
                            claimed,
                            actual,
                        });
                    }
                }
            }
        }

        let mentioned: HashSet<String> = TYPE_WORD
            .captures_iter(text)
            .map(|caps| caps[1].to_lowercase())
            .collect();
        for &word in forbidden_words(intent.element_type) {
            if mentioned.contains(word) {
                issues.push(ValidationIssue::TypeMixing {
                    requested: intent.element_type.as_str(),
                    mentioned: word,
                });
            }
        }

        if intent.is_count_only() {
            let lines = text.lines().filter(|l| !l.trim().is_empty()).count();
            if lines > self.count_only_max_lines {
                issues.push(ValidationIssue::Verbose {
                    lines,
                    max_lines: self.count_only_max_lines,
                });
            }
        }

        ValidationReport::from_issues(issues)
    }

    /// Rewrite every wrong count claim with the true number.
    pub fn correct_counts(&self, text: &str) -> String {
        let fix = |caps: &Captures<'_>, bold_words: bool| -> String {
            let whole = caps[0].to_string();
            match self.check_claim(caps) {
                Some((_, claimed, actual)) if claimed != actual => {
                    if bold_words {
                        format!("**{}{}{}**", actual, &caps[2], &caps[3])
                    } else {
                        format!("**{}**{}{}", actual, &caps[2], &caps[3])
                    }
                }
                _ => whole,
            }
        };
        let text = INLINE_COUNT.replace_all(text, |caps: &Captures<'_>| fix(caps, true));
        LEADING_COUNT
            .replace_all(&text, |caps: &Captures<'_>| fix(caps, false))
            .into_owned()
    }

    fn check_claim(&self, caps: &Captures<'_>) -> Option<(CountSubject, usize, usize)> {
        let claimed: usize = caps.get(1)?.as_str().parse().ok()?;
        let subject = CountSubject::classify(caps.get(3)?.as_str())?;
        Some((subject, claimed, subject.actual(self.repo)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ainstein_core::intent::analyze_query_intent;
    use ainstein_core::models::{Element, Layer, Model};

    fn repo_with(actors: &[&str], processes: &[&str]) -> ModelRepository {
        let mut m = Model::new("m", "ArchiMetal", None, "a.archimate");
        let typed = actors
            .iter()
            .map(|n| (n, "BusinessActor"))
            .chain(processes.iter().map(|n| (n, "BusinessProcess")));
        for (i, (name, kind)) in typed.enumerate() {
            m.add_element(Element {
                id: format!("e{i}"),
                name: name.to_string(),
                element_type: format!("archimate:{kind}"),
                layer: Layer::Business,
                documentation: None,
                properties: Vec::new(),
                model: "ArchiMetal".into(),
            });
        }
        ModelRepository::from_models([m])
    }

    #[test]
    fn test_wrong_count_is_flagged_and_corrected() {
        let repo = repo_with(&["ArchiMetal", "DC Benelux", "DC Spain"], &[]);
        let validator = ResponseValidator::new(&repo, 3);
        let intent = analyze_query_intent("how many business actors");
        let text = "There are **21 business actors** in the loaded models.";

        let report = validator.validate(&intent, text);
        assert!(!report.is_valid);
        assert_eq!(
            report.issues,
            vec![ValidationIssue::CountMismatch {
                subject: CountSubject::BusinessActors,
                claimed: 21,
                actual: 3,
            }]
        );
        let message = report.issues[0].to_string();
        assert!(message.contains("21") && message.contains('3'));

        let corrected = validator.correct_counts(text);
        assert_eq!(corrected, "There are **3 business actors** in the loaded models.");
        assert!(validator.validate(&intent, &corrected).is_valid);
    }

    #[test]
    fn test_leading_bold_form() {
        let repo = repo_with(&["A1", "A2"], &["P1"]);
        let validator = ResponseValidator::new(&repo, 3);
        let corrected = validator.correct_counts("We found **7** business processes and **2** actors.");
        assert_eq!(corrected, "We found **1** business processes and **2** actors.");
    }

    #[test]
    fn test_correct_claims_pass() {
        let repo = repo_with(&["A1", "A2"], &["P1"]);
        let validator = ResponseValidator::new(&repo, 3);
        let intent = analyze_query_intent("how many business actors");
        let report = validator.validate(&intent, "There are **2 business actors**.");
        assert!(report.is_valid);
        assert!(report.issues.is_empty());
    }

    #[test]
    fn test_unknown_subjects_ignored() {
        let repo = repo_with(&["A1"], &[]);
        let validator = ResponseValidator::new(&repo, 3);
        let text = "Reachable within **5 hops** of **2024** deployments.";
        assert_eq!(validator.correct_counts(text), text);
    }

    #[test]
    fn test_type_mixing() {
        let repo = repo_with(&["A1"], &["P1"]);
        let validator = ResponseValidator::new(&repo, 3);
        let intent = analyze_query_intent("list business actors");
        let report = validator.validate(&intent, "- A1\n- P1 (Business Process)");
        assert!(!report.is_valid);
        assert!(matches!(
            report.issues[0],
            ValidationIssue::TypeMixing { mentioned: "process", .. }
        ));
    }

    #[test]
    fn test_type_words_inside_names_are_not_mixing() {
        let repo = repo_with(&[], &["Order Handling", "Contractor Onboarding", "Malfunction Handling"]);
        let validator = ResponseValidator::new(&repo, 3);
        let intent = analyze_query_intent("list business processes");
        let text = "Business processes in the loaded models:\n- Contractor Onboarding\n- Malfunction Handling\n- Order Handling\n";
        let report = validator.validate(&intent, text);
        assert!(report.is_valid, "{:?}", report.issues);

        let report = validator.validate(&intent, "- Contractor Onboarding\n- Sales (Business Functions)");
        assert_eq!(
            report.issues,
            vec![ValidationIssue::TypeMixing {
                requested: "process",
                mentioned: "function",
            }]
        );
    }

    #[test]
    fn test_question_subject() {
        assert_eq!(
            CountSubject::for_question("how many relationships are there?", Scope::All),
            CountSubject::Relationships
        );
        assert_eq!(
            CountSubject::for_question("how many departments are there?", Scope::Actors),
            CountSubject::Departments
        );
        assert_eq!(
            CountSubject::for_question("how many business actors are in the organization?", Scope::Actors),
            CountSubject::BusinessActors
        );
    }

    #[test]
    fn test_verbose_count_only() {
        let repo = repo_with(&["A1"], &[]);
        let validator = ResponseValidator::new(&repo, 2);
        let intent = analyze_query_intent("how many business actors");
        let report = validator.validate(&intent, "There is **1 business actor**.\n\n- A1\n- more\n");
        assert_eq!(
            report.issues,
            vec![ValidationIssue::Verbose {
                lines: 3,
                max_lines: 2
            }]
        );
    }
}
