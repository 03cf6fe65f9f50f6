//! Submission quality gate
//!
//! Advisory heuristics flagging thin or placeholder content for reviewer
//! attention. Failing the gate never blocks a submission; results are
//! surfaced to staff alongside each pending submission.

use serde::Serialize;

/// Minimum bio length in words
const MIN_BIO_WORDS: usize = 40;
/// Minimum project description length in words
const MIN_PROJECT_WORDS: usize = 20;

/// Case-insensitive placeholder markers
const PLACEHOLDER_PATTERNS: &[&str] = &["lorem ipsum", "placeholder", "test", "xxx", "sample"];

/// Outcome/impact language expected in at least one place per project
const OUTCOME_KEYWORDS: &[&str] = &[
    "improved",
    "increased",
    "reduced",
    "learned",
    "result",
    "outcome",
    "impact",
];

/// Project content as seen by the gate
#[derive(Debug, Clone)]
pub struct ProjectContent {
    pub description: String,
    pub tech_stack: Vec<String>,
}

/// Gate verdict; `valid` means no warnings
#[derive(Debug, Clone, Serialize)]
pub struct QualityCheck {
    pub valid: bool,
    pub errors: Vec<String>,
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    let lower = haystack.to_lowercase();
    needles.iter().any(|n| lower.contains(n))
}

/// Score a draft submission against the minimum content-quality heuristics
pub fn validate_submission_quality(bio: &str, projects: &[ProjectContent]) -> QualityCheck {
    let mut errors = Vec::new();

    let bio_words = word_count(bio);
    if bio_words < MIN_BIO_WORDS {
        errors.push(format!(
            "Bio too short ({} words, min {})",
            bio_words, MIN_BIO_WORDS
        ));
    }

    if contains_any(bio, PLACEHOLDER_PATTERNS) {
        errors.push("Bio contains placeholder text".to_string());
    }

    if projects.is_empty() {
        errors.push("At least one project required".to_string());
    }

    for (index, project) in projects.iter().enumerate() {
        let number = index + 1;
        if word_count(&project.description) < MIN_PROJECT_WORDS {
            errors.push(format!("Project {}: Description too short", number));
        }
        if project.tech_stack.is_empty() {
            errors.push(format!("Project {}: No technologies listed", number));
        }
        if !contains_any(&project.description, OUTCOME_KEYWORDS) {
            errors.push(format!("Project {}: Add outcome or learning", number));
        }
    }

    QualityCheck {
        valid: errors.is_empty(),
        errors,
    }
}
