//! Row models and status enums shared by the Folio services
//!
//! All enums are stored as snake_case TEXT in SQLite and carried snake_case
//! on the wire. Timestamps are RFC 3339 TEXT.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::str::FromStr;
use uuid::Uuid;

use crate::{Error, Result};

/// Purchasable service level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Starter,
    Professional,
    Flagship,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Starter => "starter",
            Tier::Professional => "professional",
            Tier::Flagship => "flagship",
        }
    }
}

impl FromStr for Tier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "starter" => Ok(Tier::Starter),
            "professional" => Ok(Tier::Professional),
            "flagship" => Ok(Tier::Flagship),
            other => Err(Error::InvalidInput(format!("Unknown tier: {}", other))),
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Review/deployment status of a student record
///
/// `Error` is a legacy status set only by payment-failure webhooks; it is not
/// reachable from the review flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudentStatus {
    Submitted,
    Approved,
    Deployed,
    Rejected,
    EditsRequested,
    Error,
}

impl StudentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StudentStatus::Submitted => "submitted",
            StudentStatus::Approved => "approved",
            StudentStatus::Deployed => "deployed",
            StudentStatus::Rejected => "rejected",
            StudentStatus::EditsRequested => "edits_requested",
            StudentStatus::Error => "error",
        }
    }

    /// Coarse student-facing label ("In Review", "Building", "Live")
    pub fn display_label(&self) -> &'static str {
        match self {
            StudentStatus::Submitted => "In Review",
            StudentStatus::Approved => "Building",
            StudentStatus::Deployed => "Live",
            StudentStatus::Rejected => "Not Accepted",
            StudentStatus::EditsRequested => "Changes Needed",
            StudentStatus::Error => "Payment Issue",
        }
    }
}

impl FromStr for StudentStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "submitted" => Ok(StudentStatus::Submitted),
            "approved" => Ok(StudentStatus::Approved),
            "deployed" => Ok(StudentStatus::Deployed),
            "rejected" => Ok(StudentStatus::Rejected),
            "edits_requested" => Ok(StudentStatus::EditsRequested),
            "error" => Ok(StudentStatus::Error),
            other => Err(Error::InvalidInput(format!("Unknown status: {}", other))),
        }
    }
}

impl std::fmt::Display for StudentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deployment queue item status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl QueueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueStatus::Queued => "queued",
            QueueStatus::Processing => "processing",
            QueueStatus::Completed => "completed",
            QueueStatus::Failed => "failed",
        }
    }
}

impl FromStr for QueueStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "queued" => Ok(QueueStatus::Queued),
            "processing" => Ok(QueueStatus::Processing),
            "completed" => Ok(QueueStatus::Completed),
            "failed" => Ok(QueueStatus::Failed),
            other => Err(Error::InvalidInput(format!("Unknown queue status: {}", other))),
        }
    }
}

impl std::fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Professional role declared on the profile; selects the template variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Developer,
    #[serde(rename = "Data Scientist")]
    DataScientist,
    #[serde(rename = "DevOps")]
    DevOps,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Developer => "Developer",
            Role::DataScientist => "Data Scientist",
            Role::DevOps => "DevOps",
        }
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Developer" => Ok(Role::Developer),
            "Data Scientist" => Ok(Role::DataScientist),
            "DevOps" => Ok(Role::DevOps),
            other => Err(Error::InvalidInput(format!("Unknown role: {}", other))),
        }
    }
}

/// Post-deployment change request type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeRequestType {
    ContentEdit,
    LinkUpdate,
    TemplateSwap,
    Redesign,
}

impl ChangeRequestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeRequestType::ContentEdit => "content_edit",
            ChangeRequestType::LinkUpdate => "link_update",
            ChangeRequestType::TemplateSwap => "template_swap",
            ChangeRequestType::Redesign => "redesign",
        }
    }

    /// Price in minor units; content edits and link updates are free.
    pub fn price_minor_units(&self) -> i64 {
        match self {
            ChangeRequestType::ContentEdit | ChangeRequestType::LinkUpdate => 0,
            ChangeRequestType::TemplateSwap => 4900,
            ChangeRequestType::Redesign => 9900,
        }
    }

    pub fn is_paid(&self) -> bool {
        self.price_minor_units() > 0
    }
}

impl FromStr for ChangeRequestType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "content_edit" => Ok(ChangeRequestType::ContentEdit),
            "link_update" => Ok(ChangeRequestType::LinkUpdate),
            "template_swap" => Ok(ChangeRequestType::TemplateSwap),
            "redesign" => Ok(ChangeRequestType::Redesign),
            other => Err(Error::InvalidInput(format!(
                "Unknown change request type: {}",
                other
            ))),
        }
    }
}

/// Change request lifecycle status (independent of the submission lifecycle)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeRequestStatus {
    Pending,
    Approved,
    Completed,
    Rejected,
}

impl ChangeRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeRequestStatus::Pending => "pending",
            ChangeRequestStatus::Approved => "approved",
            ChangeRequestStatus::Completed => "completed",
            ChangeRequestStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for ChangeRequestStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(ChangeRequestStatus::Pending),
            "approved" => Ok(ChangeRequestStatus::Approved),
            "completed" => Ok(ChangeRequestStatus::Completed),
            "rejected" => Ok(ChangeRequestStatus::Rejected),
            other => Err(Error::InvalidInput(format!(
                "Unknown change request status: {}",
                other
            ))),
        }
    }
}

fn parse_uuid(value: &str) -> Result<Uuid> {
    Uuid::parse_str(value).map_err(|e| Error::Internal(format!("Invalid UUID in database: {}", e)))
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Invalid timestamp in database: {}", e)))
}

fn parse_json_strings(value: &str) -> Result<Vec<String>> {
    serde_json::from_str(value)
        .map_err(|e| Error::Internal(format!("Invalid JSON array in database: {}", e)))
}

/// One portfolio owner
#[derive(Debug, Clone, Serialize)]
pub struct Student {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub tier: Tier,
    pub status: StudentStatus,
    pub subdomain: String,
    pub custom_domain: Option<String>,
    pub payment_ref: Option<String>,
    pub customer_ref: Option<String>,
    pub rejection_reason: Option<String>,
    pub refund_id: Option<String>,
    /// Pending edit instructions from the last `request_edits`
    pub edit_requests: Vec<String>,
    /// Payment/refund failure text only; review outcomes use the dedicated
    /// columns above
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Student {
    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        let edit_requests: Option<String> = row.get("edit_requests");
        Ok(Student {
            id: parse_uuid(row.get("id"))?,
            name: row.get("name"),
            email: row.get("email"),
            tier: row.get::<String, _>("tier").parse()?,
            status: row.get::<String, _>("status").parse()?,
            subdomain: row.get("subdomain"),
            custom_domain: row.get("custom_domain"),
            payment_ref: row.get("payment_ref"),
            customer_ref: row.get("customer_ref"),
            rejection_reason: row.get("rejection_reason"),
            refund_id: row.get("refund_id"),
            edit_requests: match edit_requests {
                Some(json) => parse_json_strings(&json)?,
                None => Vec::new(),
            },
            error_message: row.get("error_message"),
            created_at: parse_timestamp(row.get("created_at"))?,
            updated_at: parse_timestamp(row.get("updated_at"))?,
        })
    }

    /// Primary public URL: custom domain when set, otherwise the subdomain
    /// under the service apex.
    pub fn primary_host(&self, apex_domain: &str) -> String {
        match &self.custom_domain {
            Some(domain) => domain.clone(),
            None => format!("{}.{}", self.subdomain, apex_domain),
        }
    }
}

/// Profile content (1:1 with Student)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub student_id: Uuid,
    pub role: Role,
    pub bio: String,
    pub tech_stack: Vec<String>,
    pub skills: Vec<String>,
}

impl Profile {
    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Profile {
            student_id: parse_uuid(row.get("student_id"))?,
            role: row.get::<String, _>("role").parse()?,
            bio: row.get("bio"),
            tech_stack: parse_json_strings(row.get("tech_stack"))?,
            skills: parse_json_strings(row.get("skills"))?,
        })
    }
}

/// Project content (1:N with Student, ordered)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub student_id: Uuid,
    pub title: String,
    pub description: String,
    pub tech_stack: Vec<String>,
    pub github_url: String,
    pub live_url: Option<String>,
    pub position: i64,
}

impl Project {
    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Project {
            student_id: parse_uuid(row.get("student_id"))?,
            title: row.get("title"),
            description: row.get("description"),
            tech_stack: parse_json_strings(row.get("tech_stack"))?,
            github_url: row.get("github_url"),
            live_url: row.get("live_url"),
            position: row.get("position"),
        })
    }
}

/// Experience entry (1:N with Student, ordered)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Experience {
    pub student_id: Uuid,
    pub organization: String,
    pub role: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub description: String,
    pub position: i64,
}

impl Experience {
    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Experience {
            student_id: parse_uuid(row.get("student_id"))?,
            organization: row.get("organization"),
            role: row.get("role"),
            start_date: row.get("start_date"),
            end_date: row.get("end_date"),
            description: row.get("description"),
            position: row.get("position"),
        })
    }
}

/// Social links (1:1 with Student)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SocialLinks {
    pub github: Option<String>,
    pub linkedin: Option<String>,
    pub existing_portfolio: Option<String>,
}

impl SocialLinks {
    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(SocialLinks {
            github: row.get("github"),
            linkedin: row.get("linkedin"),
            existing_portfolio: row.get("existing_portfolio"),
        })
    }
}

/// Uploaded asset URLs (1:1 with Student; upload storage is external)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Assets {
    pub profile_photo_url: Option<String>,
    pub resume_url: Option<String>,
}

impl Assets {
    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Assets {
            profile_photo_url: row.get("profile_photo_url"),
            resume_url: row.get("resume_url"),
        })
    }
}

/// Immutable record of the tier limits in effect at submission time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierSnapshot {
    pub student_id: Uuid,
    pub tier: Tier,
    pub max_projects: i64,
    pub custom_domain_allowed: bool,
    pub analytics_allowed: bool,
}

impl TierSnapshot {
    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(TierSnapshot {
            student_id: parse_uuid(row.get("student_id"))?,
            tier: row.get::<String, _>("tier").parse()?,
            max_projects: row.get("max_projects"),
            custom_domain_allowed: row.get("custom_domain_allowed"),
            analytics_allowed: row.get("analytics_allowed"),
        })
    }
}

/// One deployment attempt lineage for a student
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentQueueItem {
    pub id: Uuid,
    pub student_id: Uuid,
    pub status: QueueStatus,
    pub retry_count: i64,
    pub error_message: Option<String>,
    pub deployment_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DeploymentQueueItem {
    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(DeploymentQueueItem {
            id: parse_uuid(row.get("id"))?,
            student_id: parse_uuid(row.get("student_id"))?,
            status: row.get::<String, _>("status").parse()?,
            retry_count: row.get("retry_count"),
            error_message: row.get("error_message"),
            deployment_url: row.get("deployment_url"),
            created_at: parse_timestamp(row.get("created_at"))?,
            updated_at: parse_timestamp(row.get("updated_at"))?,
        })
    }
}

/// Post-deployment edit/redesign request
#[derive(Debug, Clone, Serialize)]
pub struct ChangeRequest {
    pub id: Uuid,
    pub student_id: Uuid,
    pub request_type: ChangeRequestType,
    pub description: String,
    pub status: ChangeRequestStatus,
    pub is_paid: bool,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

impl ChangeRequest {
    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(ChangeRequest {
            id: parse_uuid(row.get("id"))?,
            student_id: parse_uuid(row.get("student_id"))?,
            request_type: row.get::<String, _>("request_type").parse()?,
            description: row.get("description"),
            status: row.get::<String, _>("status").parse()?,
            is_paid: row.get("is_paid"),
            amount: row.get("amount"),
            created_at: parse_timestamp(row.get("created_at"))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_text() {
        for status in [
            StudentStatus::Submitted,
            StudentStatus::Approved,
            StudentStatus::Deployed,
            StudentStatus::Rejected,
            StudentStatus::EditsRequested,
            StudentStatus::Error,
        ] {
            assert_eq!(status.as_str().parse::<StudentStatus>().unwrap(), status);
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!("building".parse::<StudentStatus>().is_err());
    }

    #[test]
    fn change_request_pricing_follows_type() {
        assert!(!ChangeRequestType::ContentEdit.is_paid());
        assert!(!ChangeRequestType::LinkUpdate.is_paid());
        assert_eq!(ChangeRequestType::TemplateSwap.price_minor_units(), 4900);
        assert_eq!(ChangeRequestType::Redesign.price_minor_units(), 9900);
    }

    #[test]
    fn role_uses_display_names() {
        assert_eq!("Data Scientist".parse::<Role>().unwrap(), Role::DataScientist);
        assert!("data_scientist".parse::<Role>().is_err());
    }
}
