//! Hosting provider client
//!
//! Publishes a rendered document as a static site and tears sites down when
//! a refunded student's deployment is cleaned up. The trait is injected into
//! the worker so tests can substitute a double; the HTTP implementation
//! targets a REST hosting API with bearer-token auth and an optional team
//! scope.

use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;

use folio_common::config::HostingConfig;
use folio_common::{Error, Result};

/// External hosting operations used by the deployment worker
#[async_trait]
pub trait HostingProvider: Send + Sync {
    /// Publish `html` as the site for `project`, aliased to `host`.
    /// Returns the live deployment URL.
    async fn publish(&self, project: &str, host: &str, html: &str) -> Result<String>;

    /// Remove a previously published site. Missing projects are not an
    /// error; teardown is best-effort by nature.
    async fn remove_site(&self, project: &str) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct DeploymentResponse {
    id: String,
    url: String,
}

/// REST hosting client
pub struct HttpHostingProvider {
    client: reqwest::Client,
    base_url: String,
    token: String,
    team_id: Option<String>,
}

impl HttpHostingProvider {
    pub fn new(config: &HostingConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.clone(),
            token: config.token.clone(),
            team_id: config.team_id.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        match &self.team_id {
            Some(team) => format!("{}{}?teamId={}", self.base_url, path, team),
            None => format!("{}{}", self.base_url, path),
        }
    }

    /// Create the project if it does not exist yet; 409 means it does.
    async fn ensure_project(&self, project: &str) -> Result<()> {
        let response = self
            .client
            .post(self.url("/projects"))
            .bearer_auth(&self.token)
            .json(&json!({ "name": project }))
            .send()
            .await
            .map_err(|e| Error::External(format!("Project create failed: {}", e)))?;

        if response.status().is_success() || response.status() == reqwest::StatusCode::CONFLICT {
            return Ok(());
        }
        Err(Error::External(format!(
            "Project create returned {}",
            response.status()
        )))
    }
}

#[async_trait]
impl HostingProvider for HttpHostingProvider {
    async fn publish(&self, project: &str, host: &str, html: &str) -> Result<String> {
        self.ensure_project(project).await?;

        let encoded = base64::engine::general_purpose::STANDARD.encode(html.as_bytes());
        let response = self
            .client
            .post(self.url("/deployments"))
            .bearer_auth(&self.token)
            .json(&json!({
                "name": project,
                "target": "production",
                "files": [{ "file": "index.html", "data": encoded, "encoding": "base64" }],
            }))
            .send()
            .await
            .map_err(|e| Error::External(format!("Deployment upload failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::External(format!(
                "Deployment upload returned {}",
                response.status()
            )));
        }
        let deployment: DeploymentResponse = response
            .json()
            .await
            .map_err(|e| Error::External(format!("Deployment response parse failed: {}", e)))?;

        // The subdomain alias is cosmetic; the deployment URL already works
        let alias = self
            .client
            .post(self.url(&format!("/deployments/{}/aliases", deployment.id)))
            .bearer_auth(&self.token)
            .json(&json!({ "alias": host }))
            .send()
            .await;
        match alias {
            Ok(r) if r.status().is_success() => {}
            Ok(r) => tracing::warn!("Alias {} returned {}", host, r.status()),
            Err(e) => tracing::warn!("Alias {} failed: {}", host, e),
        }

        Ok(format!("https://{}", deployment.url))
    }

    async fn remove_site(&self, project: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!("/projects/{}", project)))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| Error::External(format!("Site removal failed: {}", e)))?;

        if response.status().is_success() || response.status() == reqwest::StatusCode::NOT_FOUND {
            Ok(())
        } else {
            Err(Error::External(format!(
                "Site removal returned {}",
                response.status()
            )))
        }
    }
}
