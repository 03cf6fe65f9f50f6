//! Static site rendering
//!
//! Assembled portfolio content goes in, one self-contained HTML document
//! comes out. The variant chosen by the student's declared role controls
//! section ordering and the accent styling; everything else is shared.
//! Content is HTML-escaped; nothing student-supplied reaches the page raw.

use folio_common::model::{Assets, Experience, Profile, Project, Role, SocialLinks};

/// Template variant, selected by role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateVariant {
    Developer,
    DataScientist,
    DevOps,
}

impl TemplateVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateVariant::Developer => "developer",
            TemplateVariant::DataScientist => "data-scientist",
            TemplateVariant::DevOps => "devops",
        }
    }

    fn accent_color(&self) -> &'static str {
        match self {
            TemplateVariant::Developer => "#2563eb",
            TemplateVariant::DataScientist => "#7c3aed",
            TemplateVariant::DevOps => "#059669",
        }
    }
}

pub fn select_template(role: Role) -> TemplateVariant {
    match role {
        Role::Developer => TemplateVariant::Developer,
        Role::DataScientist => TemplateVariant::DataScientist,
        Role::DevOps => TemplateVariant::DevOps,
    }
}

/// Everything the renderer needs, assembled by the worker
#[derive(Debug, Clone)]
pub struct PortfolioData {
    pub name: String,
    pub profile: Profile,
    pub projects: Vec<Project>,
    pub experience: Vec<Experience>,
    pub social_links: SocialLinks,
    pub assets: Assets,
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn tag_list(items: &[String]) -> String {
    items
        .iter()
        .map(|i| format!(r#"<span class="tag">{}</span>"#, escape(i)))
        .collect()
}

fn projects_section(projects: &[Project]) -> String {
    if projects.is_empty() {
        return String::new();
    }
    let cards: String = projects
        .iter()
        .map(|p| {
            let live_link = p
                .live_url
                .as_deref()
                .map(|u| format!(r#" <a href="{}">Live</a>"#, escape(u)))
                .unwrap_or_default();
            format!(
                r#"<article class="card"><h3>{title}</h3><p>{description}</p><div class="tags">{tags}</div><p class="links"><a href="{github}">Source</a>{live}</p></article>"#,
                title = escape(&p.title),
                description = escape(&p.description),
                tags = tag_list(&p.tech_stack),
                github = escape(&p.github_url),
                live = live_link,
            )
        })
        .collect();
    format!(r#"<section id="projects"><h2>Projects</h2>{}</section>"#, cards)
}

fn experience_section(experience: &[Experience]) -> String {
    if experience.is_empty() {
        return String::new();
    }
    let entries: String = experience
        .iter()
        .map(|e| {
            let end = e.end_date.as_deref().unwrap_or("Present");
            format!(
                r#"<article class="entry"><h3>{role} · {org}</h3><p class="dates">{start} – {end}</p><p>{description}</p></article>"#,
                role = escape(&e.role),
                org = escape(&e.organization),
                start = escape(&e.start_date),
                end = escape(end),
                description = escape(&e.description),
            )
        })
        .collect();
    format!(
        r#"<section id="experience"><h2>Experience</h2>{}</section>"#,
        entries
    )
}

fn skills_section(profile: &Profile) -> String {
    if profile.tech_stack.is_empty() && profile.skills.is_empty() {
        return String::new();
    }
    format!(
        r#"<section id="skills"><h2>Skills</h2><div class="tags">{}{}</div></section>"#,
        tag_list(&profile.tech_stack),
        tag_list(&profile.skills),
    )
}

fn links_section(links: &SocialLinks) -> String {
    let mut anchors = String::new();
    for (label, url) in [
        ("GitHub", &links.github),
        ("LinkedIn", &links.linkedin),
        ("Portfolio", &links.existing_portfolio),
    ] {
        if let Some(url) = url {
            anchors.push_str(&format!(r#"<a href="{}">{}</a> "#, escape(url), label));
        }
    }
    if anchors.is_empty() {
        return String::new();
    }
    format!(r#"<nav class="social">{}</nav>"#, anchors.trim_end())
}

/// Render the complete single-page document
pub fn render_portfolio(variant: TemplateVariant, data: &PortfolioData) -> String {
    let header = format!(
        r#"<header><div class="header-inner">{photo}<h1>{name}</h1><p class="role">{role}</p><p class="bio">{bio}</p>{links}</div></header>"#,
        photo = data
            .assets
            .profile_photo_url
            .as_deref()
            .map(|u| format!(r#"<img class="avatar" src="{}" alt="{}">"#, escape(u), escape(&data.name)))
            .unwrap_or_default(),
        name = escape(&data.name),
        role = escape(data.profile.role.as_str()),
        bio = escape(&data.profile.bio),
        links = links_section(&data.social_links),
    );

    let projects = projects_section(&data.projects);
    let experience = experience_section(&data.experience);
    let skills = skills_section(&data.profile);

    // Section order is the variant's main differentiator
    let body = match variant {
        TemplateVariant::Developer => format!("{projects}{skills}{experience}"),
        TemplateVariant::DataScientist => format!("{skills}{projects}{experience}"),
        TemplateVariant::DevOps => format!("{experience}{projects}{skills}"),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>
:root {{ --accent: {accent}; }}
body {{ margin: 0; font-family: system-ui, sans-serif; color: #1f2937; }}
header {{ background: var(--accent); color: #fff; padding: 3rem 1rem; }}
.header-inner, main {{ max-width: 52rem; margin: 0 auto; }}
.avatar {{ width: 6rem; height: 6rem; border-radius: 50%; object-fit: cover; }}
main {{ padding: 1rem; }}
h2 {{ border-bottom: 2px solid var(--accent); padding-bottom: .25rem; }}
.card, .entry {{ margin-bottom: 1.5rem; }}
.tag {{ display: inline-block; background: #eef2ff; border-radius: 999px; padding: .1rem .6rem; margin: .1rem; font-size: .85rem; }}
.dates {{ color: #6b7280; font-size: .9rem; }}
a {{ color: var(--accent); }}
header a {{ color: #fff; }}
footer {{ text-align: center; color: #9ca3af; padding: 2rem 0; font-size: .85rem; }}
</style>
</head>
<body>
{header}
<main>{body}</main>
<footer>Built with Folio</footer>
</body>
</html>
"#,
        title = escape(&data.name),
        accent = variant.accent_color(),
        header = header,
        body = body,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_common::model::Role;
    use uuid::Uuid;

    fn sample_data() -> PortfolioData {
        let student_id = Uuid::new_v4();
        PortfolioData {
            name: "Maya <O'Neill>".to_string(),
            profile: Profile {
                student_id,
                role: Role::Developer,
                bio: "Builds backend systems.".to_string(),
                tech_stack: vec!["Rust".to_string()],
                skills: vec!["API design".to_string()],
            },
            projects: vec![Project {
                student_id,
                title: "Ingest & Transform".to_string(),
                description: "Streaming pipeline.".to_string(),
                tech_stack: vec!["Rust".to_string(), "Kafka".to_string()],
                github_url: "https://github.com/maya/ingest".to_string(),
                live_url: None,
                position: 0,
            }],
            experience: vec![],
            social_links: SocialLinks::default(),
            assets: Assets::default(),
        }
    }

    #[test]
    fn renders_a_complete_escaped_document() {
        let html = render_portfolio(TemplateVariant::Developer, &sample_data());
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("Maya &lt;O&#39;Neill&gt;"));
        assert!(html.contains("Ingest &amp; Transform"));
        assert!(!html.contains("<O'Neill>"));
    }

    #[test]
    fn variant_follows_role_and_orders_sections() {
        assert_eq!(select_template(Role::DataScientist), TemplateVariant::DataScientist);
        let html = render_portfolio(TemplateVariant::DevOps, &sample_data());
        let projects_at = html.find(r#"id="projects""#).unwrap();
        let skills_at = html.find(r#"id="skills""#).unwrap();
        assert!(projects_at < skills_at, "devops keeps skills after projects");
    }

    #[test]
    fn empty_sections_are_omitted() {
        let mut data = sample_data();
        data.experience.clear();
        let html = render_portfolio(TemplateVariant::Developer, &data);
        assert!(!html.contains(r#"id="experience""#));
    }
}
