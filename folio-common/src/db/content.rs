//! Portfolio content rows (profile, projects, experience, links, assets,
//! tier snapshot)
//!
//! Child records are replaced wholesale (delete-all + reinsert) on update
//! rather than patched field-by-field, so the write functions take a
//! connection and are meant to run inside the caller's transaction.

use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::model::{Assets, Experience, Profile, Project, Role, SocialLinks, TierSnapshot};
use crate::policy;
use crate::{Error, Result};

/// Incoming project content (order is the slice order)
#[derive(Debug, Clone, serde::Deserialize)]
pub struct NewProject {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    pub github_url: String,
    #[serde(default)]
    pub live_url: Option<String>,
}

/// Incoming experience content (order is the slice order)
#[derive(Debug, Clone, serde::Deserialize)]
pub struct NewExperience {
    pub organization: String,
    pub role: String,
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
    pub description: String,
}

fn to_json(values: &[String]) -> Result<String> {
    serde_json::to_string(values)
        .map_err(|e| Error::Internal(format!("Failed to serialize string list: {}", e)))
}

pub async fn insert_profile(
    conn: &mut SqliteConnection,
    student_id: Uuid,
    role: Role,
    bio: &str,
    tech_stack: &[String],
    skills: &[String],
) -> Result<()> {
    sqlx::query(
        "INSERT INTO profiles (student_id, role, bio, tech_stack, skills) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(student_id.to_string())
    .bind(role.as_str())
    .bind(bio)
    .bind(to_json(tech_stack)?)
    .bind(to_json(skills)?)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Partial profile update during an edits round; None leaves a field alone
pub async fn update_profile(
    conn: &mut SqliteConnection,
    student_id: Uuid,
    role: Option<Role>,
    bio: Option<&str>,
    tech_stack: Option<&[String]>,
    skills: Option<&[String]>,
) -> Result<()> {
    let tech_stack = tech_stack.map(to_json).transpose()?;
    let skills = skills.map(to_json).transpose()?;
    sqlx::query(
        "UPDATE profiles SET role = COALESCE(?, role), bio = COALESCE(?, bio), \
         tech_stack = COALESCE(?, tech_stack), skills = COALESCE(?, skills) \
         WHERE student_id = ?",
    )
    .bind(role.map(|r| r.as_str()))
    .bind(bio)
    .bind(tech_stack)
    .bind(skills)
    .bind(student_id.to_string())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn load_profile(pool: &SqlitePool, student_id: Uuid) -> Result<Option<Profile>> {
    let row = sqlx::query("SELECT * FROM profiles WHERE student_id = ?")
        .bind(student_id.to_string())
        .fetch_optional(pool)
        .await?;
    row.map(|r| Profile::from_row(&r)).transpose()
}

pub async fn insert_projects(
    conn: &mut SqliteConnection,
    student_id: Uuid,
    projects: &[NewProject],
) -> Result<()> {
    for (position, project) in projects.iter().enumerate() {
        sqlx::query(
            "INSERT INTO projects (id, student_id, title, description, tech_stack, github_url, live_url, position) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(student_id.to_string())
        .bind(&project.title)
        .bind(&project.description)
        .bind(to_json(&project.tech_stack)?)
        .bind(&project.github_url)
        .bind(&project.live_url)
        .bind(position as i64)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

pub async fn replace_projects(
    conn: &mut SqliteConnection,
    student_id: Uuid,
    projects: &[NewProject],
) -> Result<()> {
    sqlx::query("DELETE FROM projects WHERE student_id = ?")
        .bind(student_id.to_string())
        .execute(&mut *conn)
        .await?;
    insert_projects(conn, student_id, projects).await
}

pub async fn load_projects(pool: &SqlitePool, student_id: Uuid) -> Result<Vec<Project>> {
    let rows = sqlx::query("SELECT * FROM projects WHERE student_id = ? ORDER BY position")
        .bind(student_id.to_string())
        .fetch_all(pool)
        .await?;
    rows.iter().map(Project::from_row).collect()
}

pub async fn insert_experience(
    conn: &mut SqliteConnection,
    student_id: Uuid,
    entries: &[NewExperience],
) -> Result<()> {
    for (position, entry) in entries.iter().enumerate() {
        sqlx::query(
            "INSERT INTO experience (id, student_id, organization, role, start_date, end_date, description, position) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(student_id.to_string())
        .bind(&entry.organization)
        .bind(&entry.role)
        .bind(&entry.start_date)
        .bind(&entry.end_date)
        .bind(&entry.description)
        .bind(position as i64)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

pub async fn replace_experience(
    conn: &mut SqliteConnection,
    student_id: Uuid,
    entries: &[NewExperience],
) -> Result<()> {
    sqlx::query("DELETE FROM experience WHERE student_id = ?")
        .bind(student_id.to_string())
        .execute(&mut *conn)
        .await?;
    insert_experience(conn, student_id, entries).await
}

pub async fn load_experience(pool: &SqlitePool, student_id: Uuid) -> Result<Vec<Experience>> {
    let rows = sqlx::query("SELECT * FROM experience WHERE student_id = ? ORDER BY position")
        .bind(student_id.to_string())
        .fetch_all(pool)
        .await?;
    rows.iter().map(Experience::from_row).collect()
}

pub async fn insert_social_links(
    conn: &mut SqliteConnection,
    student_id: Uuid,
    links: &SocialLinks,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO social_links (student_id, github, linkedin, existing_portfolio) VALUES (?, ?, ?, ?)",
    )
    .bind(student_id.to_string())
    .bind(&links.github)
    .bind(&links.linkedin)
    .bind(&links.existing_portfolio)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn update_social_links(
    conn: &mut SqliteConnection,
    student_id: Uuid,
    links: &SocialLinks,
) -> Result<()> {
    sqlx::query(
        "UPDATE social_links SET github = ?, linkedin = ?, existing_portfolio = ? WHERE student_id = ?",
    )
    .bind(&links.github)
    .bind(&links.linkedin)
    .bind(&links.existing_portfolio)
    .bind(student_id.to_string())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn load_social_links(pool: &SqlitePool, student_id: Uuid) -> Result<Option<SocialLinks>> {
    let row = sqlx::query("SELECT * FROM social_links WHERE student_id = ?")
        .bind(student_id.to_string())
        .fetch_optional(pool)
        .await?;
    row.map(|r| SocialLinks::from_row(&r)).transpose()
}

pub async fn insert_assets(
    conn: &mut SqliteConnection,
    student_id: Uuid,
    assets: &Assets,
) -> Result<()> {
    sqlx::query("INSERT INTO assets (student_id, profile_photo_url, resume_url) VALUES (?, ?, ?)")
        .bind(student_id.to_string())
        .bind(&assets.profile_photo_url)
        .bind(&assets.resume_url)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn load_assets(pool: &SqlitePool, student_id: Uuid) -> Result<Option<Assets>> {
    let row = sqlx::query("SELECT * FROM assets WHERE student_id = ?")
        .bind(student_id.to_string())
        .fetch_optional(pool)
        .await?;
    row.map(|r| Assets::from_row(&r)).transpose()
}

/// Persist the tier limits in effect right now for this student
pub async fn insert_tier_snapshot(
    conn: &mut SqliteConnection,
    student_id: Uuid,
    tier: crate::model::Tier,
) -> Result<()> {
    let (max_projects, custom_domain_allowed, analytics_allowed) = policy::snapshot_values(tier);
    sqlx::query(
        "INSERT INTO tier_snapshots (student_id, tier, max_projects, custom_domain_allowed, analytics_allowed) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(student_id.to_string())
    .bind(tier.as_str())
    .bind(max_projects)
    .bind(custom_domain_allowed)
    .bind(analytics_allowed)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn load_tier_snapshot(
    pool: &SqlitePool,
    student_id: Uuid,
) -> Result<Option<TierSnapshot>> {
    let row = sqlx::query("SELECT * FROM tier_snapshots WHERE student_id = ?")
        .bind(student_id.to_string())
        .fetch_optional(pool)
        .await?;
    row.map(|r| TierSnapshot::from_row(&r)).transpose()
}
