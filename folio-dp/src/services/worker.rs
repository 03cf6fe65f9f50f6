//! Deployment worker
//!
//! One pass = one trigger: claim up to `batch_size` queued items oldest
//! first, publish each, then requeue eligible failures and tear down sites
//! whose owners were refunded after going live. Items are claimed with a
//! conditional queued-to-processing update, so concurrent triggers cannot
//! process the same item twice.
//!
//! A publish failure marks only the queue item; the student stays approved
//! and the item stays eligible for the retry pass.

use serde::Serialize;
use sqlx::SqlitePool;
use std::sync::Arc;

use folio_common::db::{content, queue, students};
use folio_common::email::{self, Mailer};
use folio_common::model::{DeploymentQueueItem, Student, StudentStatus};
use folio_common::{Error, Result};

use crate::render::{self, PortfolioData};
use crate::services::hosting::HostingProvider;
use crate::services::retry;

/// Outcome of one worker pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct PassSummary {
    /// Items claimed and attempted
    pub processed: u32,
    /// Items that failed during this pass
    pub errors: u32,
    /// Failed items re-queued for the next pass
    pub retried: u32,
    /// Refunded students' sites torn down
    pub removed: u32,
}

pub struct DeployWorker {
    db: SqlitePool,
    hosting: Arc<dyn HostingProvider>,
    mailer: Arc<dyn Mailer>,
    apex_domain: String,
    project_prefix: String,
    batch_size: u32,
    max_retries: i64,
}

impl DeployWorker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        db: SqlitePool,
        hosting: Arc<dyn HostingProvider>,
        mailer: Arc<dyn Mailer>,
        apex_domain: String,
        project_prefix: String,
        batch_size: u32,
        max_retries: i64,
    ) -> Self {
        Self {
            db,
            hosting,
            mailer,
            apex_domain,
            project_prefix,
            batch_size,
            max_retries,
        }
    }

    fn project_name(&self, subdomain: &str) -> String {
        format!("{}{}", self.project_prefix, subdomain)
    }

    /// Run one full pass: batch, retries, refund cleanup.
    pub async fn run_pass(&self) -> Result<PassSummary> {
        let mut summary = PassSummary::default();

        let batch = queue::next_batch(&self.db, self.batch_size).await?;
        for item in batch {
            if !queue::claim(&self.db, item.id).await? {
                // Another trigger got there first
                continue;
            }
            summary.processed += 1;
            match self.process_item(&item).await {
                Ok(url) => {
                    tracing::info!("Deployed student {} at {}", item.student_id, url);
                }
                Err(e) => {
                    summary.errors += 1;
                    tracing::error!("Deployment {} failed: {}", item.id, e);
                    queue::mark_failed(&self.db, item.id, &e.to_string()).await?;
                }
            }
        }

        summary.retried = retry::requeue_eligible(&self.db, self.max_retries).await?;
        summary.removed = self.cleanup_refunded().await?;

        Ok(summary)
    }

    async fn process_item(&self, item: &DeploymentQueueItem) -> Result<String> {
        let student = students::get_student(&self.db, item.student_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Student {} not found", item.student_id)))?;

        // The owner's status may have moved since this item was queued
        if student.status != StudentStatus::Approved {
            return Err(Error::InvalidInput(format!(
                "Student no longer approved (status: {})",
                student.status.as_str()
            )));
        }

        let data = self.assemble(&student).await?;
        let variant = render::select_template(data.profile.role);
        let html = render::render_portfolio(variant, &data);

        let project = self.project_name(&student.subdomain);
        let host = student.primary_host(&self.apex_domain);
        let url = self.hosting.publish(&project, &host, &html).await?;

        queue::mark_completed(&self.db, item.id, &url).await?;
        let moved = students::transition_status(
            &self.db,
            student.id,
            &[StudentStatus::Approved],
            StudentStatus::Deployed,
        )
        .await?;
        if !moved {
            // Published but the owner moved mid-flight; the queue record
            // still carries the URL for the staff view
            tracing::warn!(
                "Student {} changed status during deployment; not marked deployed",
                student.id
            );
            return Ok(url);
        }

        let message = email::portfolio_deployed(&student.email, &student.name, &host);
        if let Err(e) = self.mailer.send(&message).await {
            tracing::warn!("Deployed-notification email failed: {}", e);
        }

        Ok(url)
    }

    async fn assemble(&self, student: &Student) -> Result<PortfolioData> {
        let profile = content::load_profile(&self.db, student.id)
            .await?
            .ok_or_else(|| {
                Error::InvalidInput(format!("Student {} has no profile content", student.id))
            })?;
        Ok(PortfolioData {
            name: student.name.clone(),
            profile,
            projects: content::load_projects(&self.db, student.id).await?,
            experience: content::load_experience(&self.db, student.id).await?,
            social_links: content::load_social_links(&self.db, student.id)
                .await?
                .unwrap_or_default(),
            assets: content::load_assets(&self.db, student.id)
                .await?
                .unwrap_or_default(),
        })
    }

    /// Tear down live sites whose owners were rejected with a refund
    async fn cleanup_refunded(&self) -> Result<u32> {
        let mut removed = 0;
        for (item, subdomain) in queue::completed_for_refunded_students(&self.db).await? {
            let project = self.project_name(&subdomain);
            match self.hosting.remove_site(&project).await {
                Ok(()) => {
                    queue::mark_site_removed(&self.db, item.id).await?;
                    removed += 1;
                    tracing::info!("Removed site {} after refund", project);
                }
                Err(e) => {
                    tracing::warn!("Site removal for {} failed: {}", project, e);
                }
            }
        }
        Ok(removed)
    }

    pub async fn queue_depth(&self) -> Result<i64> {
        queue::count_queued(&self.db).await
    }
}

/// Built-in poll loop for deployments without an external cron
pub async fn poll_loop(worker: Arc<DeployWorker>, interval_secs: u64) {
    let mut ticker = tokio::time::interval(std::time::Duration::from_secs(interval_secs));
    loop {
        ticker.tick().await;
        match worker.run_pass().await {
            Ok(summary) => {
                if summary.processed > 0 || summary.retried > 0 || summary.removed > 0 {
                    tracing::info!(
                        "Worker pass: {} processed, {} errors, {} retried, {} removed",
                        summary.processed,
                        summary.errors,
                        summary.retried,
                        summary.removed
                    );
                }
            }
            Err(e) => tracing::error!("Worker pass failed: {}", e),
        }
    }
}
