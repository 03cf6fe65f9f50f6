//! Submission intake
//!
//! Turns a paid onboarding form into a student record in `submitted` status.
//! Payment verification comes first; tier limits are enforced server-side
//! against the form regardless of what the client believed; the quality gate
//! runs last and only produces advisory warnings. Intake is idempotent on
//! the payment reference, so a retried form post returns the existing record
//! instead of a duplicate-charge error.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

use folio_common::db::{content, students};
use folio_common::db::content::{NewExperience, NewProject};
use folio_common::db::students::NewStudent;
use folio_common::model::{Assets, Role, SocialLinks, Tier};
use folio_common::{policy, quality, Error, Result};

use crate::services::email::{self, Mailer};
use crate::services::payment::PaymentProvider;

#[derive(Debug, Clone, Deserialize)]
pub struct PersonalInfo {
    pub name: String,
    pub email: String,
    pub bio: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TechnicalProfile {
    pub role: Role,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
}

/// Complete onboarding form as posted after checkout
#[derive(Debug, Clone, Deserialize)]
pub struct OnboardingForm {
    pub personal_info: PersonalInfo,
    pub technical_profile: TechnicalProfile,
    pub projects: Vec<NewProject>,
    #[serde(default)]
    pub experience: Vec<NewExperience>,
    #[serde(default)]
    pub social_links: SocialLinks,
    #[serde(default)]
    pub assets: Assets,
    #[serde(default)]
    pub custom_domain: Option<String>,
}

/// Partial form accepted while a submission is in an edits round
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePersonalInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTechnicalProfile {
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub tech_stack: Option<Vec<String>>,
    #[serde(default)]
    pub skills: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSubmissionForm {
    #[serde(default)]
    pub personal_info: Option<UpdatePersonalInfo>,
    #[serde(default)]
    pub technical_profile: Option<UpdateTechnicalProfile>,
    #[serde(default)]
    pub projects: Option<Vec<NewProject>>,
    #[serde(default)]
    pub experience: Option<Vec<NewExperience>>,
    #[serde(default)]
    pub social_links: Option<SocialLinks>,
}

/// Intake result; `quality_warnings` is advisory and never blocks
#[derive(Debug, Clone, Serialize)]
pub struct OnboardingOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subdomain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub quality_warnings: Vec<String>,
}

impl OnboardingOutcome {
    fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            student_id: None,
            subdomain: None,
            error: Some(error.into()),
            quality_warnings: Vec::new(),
        }
    }

    fn ok(student_id: Uuid, subdomain: String, quality_warnings: Vec<String>) -> Self {
        Self {
            success: true,
            student_id: Some(student_id),
            subdomain: Some(subdomain),
            error: None,
            quality_warnings,
        }
    }
}

fn validate_form(form: &OnboardingForm) -> Vec<String> {
    let mut errors = Vec::new();
    if form.personal_info.name.trim().len() < 2 {
        errors.push("Name must be at least 2 characters".to_string());
    }
    let email = form.personal_info.email.trim();
    if !email.contains('@') || !email.contains('.') {
        errors.push("A valid email address is required".to_string());
    }
    if form.projects.is_empty() {
        errors.push("At least one project is required".to_string());
    }
    for (i, project) in form.projects.iter().enumerate() {
        if project.title.trim().is_empty() {
            errors.push(format!("Project {} is missing a title", i + 1));
        }
        if project.description.trim().is_empty() {
            errors.push(format!("Project {} is missing a description", i + 1));
        }
        if !project.github_url.starts_with("https://github.com/") {
            errors.push(format!(
                "Project {} needs a https://github.com/ repository URL",
                i + 1
            ));
        }
    }
    errors
}

/// Derive a URL-safe subdomain from the student's name: lowercase, runs of
/// non-alphanumerics collapsed to single hyphens, at most 30 characters.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_hyphen = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_hyphen = false;
        } else if !last_hyphen {
            slug.push('-');
            last_hyphen = true;
        }
    }
    let slug = slug.trim_end_matches('-');
    let truncated: String = slug.chars().take(30).collect();
    let truncated = truncated.trim_end_matches('-').to_string();
    if truncated.is_empty() {
        "student".to_string()
    } else {
        truncated
    }
}

pub struct Onboarding {
    db: SqlitePool,
    payments: Arc<dyn PaymentProvider>,
    mailer: Arc<dyn Mailer>,
}

impl Onboarding {
    pub fn new(db: SqlitePool, payments: Arc<dyn PaymentProvider>, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            db,
            payments,
            mailer,
        }
    }

    pub async fn submit(
        &self,
        form: &OnboardingForm,
        requested_tier: Tier,
        payment_ref: &str,
    ) -> OnboardingOutcome {
        match self.submit_inner(form, requested_tier, payment_ref).await {
            Ok(outcome) => outcome,
            Err(Error::Conflict(msg)) => OnboardingOutcome::fail(msg),
            Err(e) => {
                tracing::error!("Onboarding failed for {}: {}", payment_ref, e);
                OnboardingOutcome::fail("Failed to create submission")
            }
        }
    }

    async fn submit_inner(
        &self,
        form: &OnboardingForm,
        requested_tier: Tier,
        payment_ref: &str,
    ) -> Result<OnboardingOutcome> {
        let verification = match self.payments.verify(payment_ref).await {
            Ok(v) => v,
            Err(e) => {
                tracing::error!("Payment verification call failed: {}", e);
                return Ok(OnboardingOutcome::fail(
                    "Payment verification failed. Please contact support.",
                ));
            }
        };
        if !verification.verified {
            let detail = verification
                .detail
                .unwrap_or_else(|| "Payment not completed".to_string());
            return Ok(OnboardingOutcome::fail(format!(
                "Payment verification failed: {}",
                detail
            )));
        }
        // Tier recorded at checkout wins over whatever the form claims
        let tier = verification.tier.unwrap_or(requested_tier);

        let form_errors = validate_form(form);
        if !form_errors.is_empty() {
            return Ok(OnboardingOutcome::fail(form_errors.join("; ")));
        }

        let facts = policy::SubmissionFacts {
            project_count: form.projects.len(),
            custom_domain: form.custom_domain.clone(),
        };
        let tier_check = policy::enforce_tier_limits(tier, &facts);
        if !tier_check.valid {
            return Ok(OnboardingOutcome::fail(tier_check.errors.join("; ")));
        }

        let project_content: Vec<quality::ProjectContent> = form
            .projects
            .iter()
            .map(|p| quality::ProjectContent {
                description: p.description.clone(),
                tech_stack: p.tech_stack.clone(),
            })
            .collect();
        let gate = quality::validate_submission_quality(&form.personal_info.bio, &project_content);
        if !gate.valid {
            tracing::info!(
                "Quality gate warnings for {}: {}",
                payment_ref,
                gate.errors.join("; ")
            );
        }

        // Retried form posts resolve to the original record
        if let Some(existing) = students::get_student_by_payment_ref(&self.db, payment_ref).await? {
            tracing::info!(
                "Duplicate onboarding for payment {}; returning student {}",
                payment_ref,
                existing.id
            );
            return Ok(OnboardingOutcome::ok(
                existing.id,
                existing.subdomain,
                gate.errors,
            ));
        }

        let subdomain = self.unique_subdomain(&form.personal_info.name).await?;
        let student_id = Uuid::new_v4();

        let mut tx = self.db.begin().await?;
        students::insert_student(
            &mut *tx,
            &NewStudent {
                id: student_id,
                name: form.personal_info.name.trim().to_string(),
                email: form.personal_info.email.trim().to_lowercase(),
                tier,
                subdomain: subdomain.clone(),
                payment_ref: Some(payment_ref.to_string()),
            },
        )
        .await?;
        content::insert_profile(
            &mut tx,
            student_id,
            form.technical_profile.role,
            &form.personal_info.bio,
            &form.technical_profile.tech_stack,
            &form.technical_profile.skills,
        )
        .await?;
        content::insert_projects(&mut tx, student_id, &form.projects).await?;
        content::insert_experience(&mut tx, student_id, &form.experience).await?;
        content::insert_social_links(&mut tx, student_id, &form.social_links).await?;
        content::insert_assets(&mut tx, student_id, &form.assets).await?;
        content::insert_tier_snapshot(&mut tx, student_id, tier).await?;
        if let Some(domain) = &form.custom_domain {
            students::update_custom_domain(&mut *tx, student_id, Some(domain)).await?;
        }
        tx.commit().await?;

        tracing::info!(
            "Submission {} created ({} tier, subdomain {})",
            student_id,
            tier.as_str(),
            subdomain
        );

        let message = email::submission_received(&form.personal_info.email, &form.personal_info.name);
        if let Err(e) = self.mailer.send(&message).await {
            tracing::warn!("Received-confirmation email failed: {}", e);
        }

        Ok(OnboardingOutcome::ok(student_id, subdomain, gate.errors))
    }

    async fn unique_subdomain(&self, name: &str) -> Result<String> {
        let base = slugify(name);
        if !students::subdomain_taken(&self.db, &base).await? {
            return Ok(base);
        }
        // Collisions get a short random suffix
        loop {
            let suffix = &Uuid::new_v4().simple().to_string()[..4];
            let candidate = format!("{}-{}", base, suffix);
            if !students::subdomain_taken(&self.db, &candidate).await? {
                return Ok(candidate);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_punctuation_and_truncates() {
        assert_eq!(slugify("Maya O'Neill-Smith"), "maya-o-neill-smith");
        assert_eq!(slugify("  Ada   Lovelace  "), "ada-lovelace");
        let long = slugify("A very long name that keeps going well past the cap");
        assert!(long.len() <= 30);
        assert!(!long.ends_with('-'));
    }

    #[test]
    fn slugify_never_returns_empty() {
        assert_eq!(slugify("!!!"), "student");
    }
}
