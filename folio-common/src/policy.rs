//! Tier policy: pure mapping from tier to limits and price
//!
//! The server is the sole authority on tier limits; client-side UI
//! restrictions are advisory. A snapshot of the limits is persisted at
//! submission time so later policy changes never retroactively alter a
//! student's entitlements.

use crate::model::{Role, Tier};

/// Limits and feature access for one tier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierLimits {
    /// None = unlimited
    pub max_projects: Option<u32>,
    pub custom_domain_allowed: bool,
    pub analytics_allowed: bool,
    pub templates: &'static [&'static str],
}

const STARTER_TEMPLATES: &[&str] = &["developer"];
const FULL_TEMPLATES: &[&str] = &["developer", "data-scientist", "devops"];

/// Limits in effect for a tier
pub fn tier_limits(tier: Tier) -> TierLimits {
    match tier {
        Tier::Starter => TierLimits {
            max_projects: Some(3),
            custom_domain_allowed: false,
            analytics_allowed: false,
            templates: STARTER_TEMPLATES,
        },
        Tier::Professional | Tier::Flagship => TierLimits {
            max_projects: None,
            custom_domain_allowed: true,
            analytics_allowed: true,
            templates: FULL_TEMPLATES,
        },
    }
}

/// Price in minor currency units
pub fn tier_price_minor_units(tier: Tier) -> i64 {
    match tier {
        Tier::Starter => 12900,
        Tier::Professional => 22900,
        Tier::Flagship => 49900,
    }
}

pub fn can_use_custom_domain(tier: Tier) -> bool {
    tier_limits(tier).custom_domain_allowed
}

pub fn can_access_analytics(tier: Tier) -> bool {
    tier_limits(tier).analytics_allowed
}

/// Accepts `name.tld`: an alphanumeric-bounded label of up to 63 chars
/// (hyphens inside) followed by an alphabetic TLD of at least two chars.
pub fn valid_custom_domain(domain: &str) -> bool {
    let Some((name, tld)) = domain.split_once('.') else {
        return false;
    };
    if name.is_empty() || name.len() > 63 {
        return false;
    }
    let bytes = name.as_bytes();
    if !bytes[0].is_ascii_alphanumeric() || !bytes[bytes.len() - 1].is_ascii_alphanumeric() {
        return false;
    }
    if !name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') {
        return false;
    }
    tld.len() >= 2 && tld.bytes().all(|b| b.is_ascii_alphabetic())
}

pub fn is_template_allowed(tier: Tier, template: &str) -> bool {
    tier_limits(tier).templates.contains(&template)
}

/// Submission facts checked against the tier limits
#[derive(Debug, Clone, Default)]
pub struct SubmissionFacts {
    pub project_count: usize,
    pub custom_domain: Option<String>,
}

/// Result of a tier limit check
#[derive(Debug, Clone)]
pub struct TierCheck {
    pub valid: bool,
    pub errors: Vec<String>,
}

/// Server-side tier limit enforcement at submission time
pub fn enforce_tier_limits(tier: Tier, facts: &SubmissionFacts) -> TierCheck {
    let limits = tier_limits(tier);
    let mut errors = Vec::new();

    if let Some(max) = limits.max_projects {
        if facts.project_count > max as usize {
            errors.push(format!(
                "Maximum {} projects allowed for {} tier",
                max,
                tier.as_str()
            ));
        }
    }

    if let Some(domain) = &facts.custom_domain {
        if !limits.custom_domain_allowed {
            errors.push("Custom domains not available for this tier".to_string());
        } else if !valid_custom_domain(domain) {
            errors.push("Invalid domain format".to_string());
        }
    }

    TierCheck {
        valid: errors.is_empty(),
        errors,
    }
}

/// Snapshot values persisted with a new submission
///
/// Unlimited is stored as 999 so the column stays a plain integer.
pub fn snapshot_values(tier: Tier) -> (i64, bool, bool) {
    let limits = tier_limits(tier);
    (
        limits.max_projects.map(i64::from).unwrap_or(999),
        limits.custom_domain_allowed,
        limits.analytics_allowed,
    )
}

/// Template variant name for a profile role
pub fn template_for_role(role: Role) -> &'static str {
    match role {
        Role::DataScientist => "data-scientist",
        Role::DevOps => "devops",
        Role::Developer => "developer",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starter_caps_projects_at_three() {
        let check = enforce_tier_limits(
            Tier::Starter,
            &SubmissionFacts {
                project_count: 4,
                custom_domain: None,
            },
        );
        assert!(!check.valid);
        assert!(check.errors[0].contains("3 projects"));
        assert!(check.errors[0].contains("starter"));
    }

    #[test]
    fn professional_projects_are_unlimited() {
        let check = enforce_tier_limits(
            Tier::Professional,
            &SubmissionFacts {
                project_count: 50,
                custom_domain: None,
            },
        );
        assert!(check.valid);
    }

    #[test]
    fn starter_cannot_use_custom_domain() {
        let check = enforce_tier_limits(
            Tier::Starter,
            &SubmissionFacts {
                project_count: 1,
                custom_domain: Some("me.example.com".to_string()),
            },
        );
        assert!(!check.valid);
        assert!(check.errors.iter().any(|e| e.contains("Custom domains")));
    }

    #[test]
    fn starter_is_limited_to_developer_template() {
        assert!(is_template_allowed(Tier::Starter, "developer"));
        assert!(!is_template_allowed(Tier::Starter, "devops"));
        assert!(is_template_allowed(Tier::Flagship, "data-scientist"));
    }

    #[test]
    fn domain_format_is_checked() {
        assert!(valid_custom_domain("example.com"));
        assert!(valid_custom_domain("my-site.io"));
        assert!(!valid_custom_domain("no-tld"));
        assert!(!valid_custom_domain("-leading.com"));
        assert!(!valid_custom_domain("trailing-.com"));
        assert!(!valid_custom_domain("bad.c0m"));
        assert!(!valid_custom_domain("spaces here.com"));
    }

    #[test]
    fn malformed_custom_domain_fails_tier_check() {
        let check = enforce_tier_limits(
            Tier::Professional,
            &SubmissionFacts {
                project_count: 1,
                custom_domain: Some("not a domain".to_string()),
            },
        );
        assert!(!check.valid);
        assert!(check.errors.iter().any(|e| e.contains("Invalid domain")));
    }

    #[test]
    fn snapshot_encodes_unlimited_as_999() {
        assert_eq!(snapshot_values(Tier::Starter).0, 3);
        assert_eq!(snapshot_values(Tier::Professional).0, 999);
    }
}
