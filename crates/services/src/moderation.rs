//! Reports and the moderation workflow.
//!
//! Filing is open to any authenticated user, once per piece of content.
//! Everything else is admin-only. A transition to `resolved` may also delete
//! the reported content; both happen in one unit of work.

use std::sync::Arc;

use chrono::Utc;
use domains::authz::{ensure, Action, Target};
use domains::pagination::{Page, PageRequest};
use domains::ports::{CommentRepository, ContentStore, ReplyRepository, ReportRepository};
use domains::validation::{validate_description, validate_reasons};
use domains::{
    ContentType, DomainError, NewReport, Report, ReportId, ReportStatus, RequestContext, Result, UserId,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, Deserialize)]
pub struct ReportDraft {
    #[serde(default)]
    pub content_type: String,
    #[serde(default)]
    pub content_id: Option<i64>,
    #[serde(default)]
    pub reasons: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportUpdate {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub delete_content: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportOutcome {
    pub report: Report,
    pub content_deleted: bool,
}

pub struct ModerationService {
    store: Arc<dyn ContentStore>,
}

impl ModerationService {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// Files a new `pending` report. A second report by the same reporter on
    /// the same content fails with `DuplicateReport` carrying the first one.
    #[instrument(skip(self, ctx, draft), fields(actor = ?ctx.actor))]
    pub async fn file_report(&self, ctx: &RequestContext, draft: ReportDraft) -> Result<Report> {
        let actor = ctx.require_actor()?;
        ensure(Some(&actor), Action::Create, Target::unowned())?;

        let content_type: ContentType = draft.content_type.trim().parse()?;
        let content_id = draft
            .content_id
            .ok_or_else(|| DomainError::validation("content_id is required"))?;
        let reasons = validate_reasons(&draft.reasons)?;
        let description = validate_description(draft.description.as_deref())?;

        let mut uow = self.store.begin_write().await?;
        if !uow.content_exists(content_type, content_id).await? {
            return Err(DomainError::not_found(content_type.as_str(), content_id));
        }
        if let Some(existing) = uow.find_report_by(actor.id, content_type, content_id).await? {
            return Err(DomainError::DuplicateReport(Box::new(existing)));
        }

        let new = NewReport { reporter_id: actor.id, content_type, content_id, reasons, description };
        let report = match uow.insert_report(new).await {
            Ok(report) => report,
            Err(DomainError::DuplicateConflict(_)) => {
                // lost a race with a concurrent submission from the same reporter
                uow.rollback().await?;
                return Err(self.report_conflict(actor.id, content_type, content_id).await?);
            }
            Err(e) => return Err(e),
        };
        uow.commit().await?;

        info!(report_id = report.id, content_type = %content_type, content_id, "report filed");
        Ok(report)
    }

    /// The error for a unique violation on insert: the winning report when it
    /// can be read back, a bare conflict otherwise.
    async fn report_conflict(&self, reporter_id: UserId, content_type: ContentType, content_id: i64) -> Result<DomainError> {
        let mut fresh = self.store.begin().await?;
        let existing = fresh.find_report_by(reporter_id, content_type, content_id).await?;
        fresh.commit().await?;
        Ok(match existing {
            Some(existing) => DomainError::DuplicateReport(Box::new(existing)),
            None => DomainError::DuplicateConflict("content already reported".into()),
        })
    }

    #[instrument(skip(self, ctx), fields(actor = ?ctx.actor))]
    pub async fn list_reports(
        &self,
        ctx: &RequestContext,
        status: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<Report>> {
        let actor = ctx.require_actor()?;
        ensure(Some(&actor), Action::ViewReports, Target::unowned())?;
        let status = status
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse::<ReportStatus>)
            .transpose()?;

        let mut uow = self.store.begin().await?;
        let (reports, total) = uow.list_reports(status, page).await?;
        uow.commit().await?;
        Ok(Page::new(reports, total, page))
    }

    #[instrument(skip(self, ctx), fields(actor = ?ctx.actor))]
    pub async fn get_report(&self, ctx: &RequestContext, id: ReportId) -> Result<Report> {
        let actor = ctx.require_actor()?;
        ensure(Some(&actor), Action::ViewReports, Target::unowned())?;

        let mut uow = self.store.begin().await?;
        let report = uow.find_report(id).await?.ok_or(DomainError::not_found("report", id))?;
        uow.commit().await?;
        Ok(report)
    }

    /// Moves a report along its lifecycle. With `delete_content` the reported
    /// node is cascaded away in the same unit of work that closes the report;
    /// any failure leaves both untouched.
    #[instrument(skip(self, ctx, update), fields(actor = ?ctx.actor, status = %update.status))]
    pub async fn transition_report(
        &self,
        ctx: &RequestContext,
        id: ReportId,
        update: ReportUpdate,
    ) -> Result<ReportOutcome> {
        let actor = ctx.require_actor()?;
        ensure(Some(&actor), Action::TransitionReport, Target::unowned())?;

        let next: ReportStatus = update.status.trim().parse()?;
        if update.delete_content && next != ReportStatus::Resolved {
            return Err(DomainError::validation(
                "delete_content is only allowed when resolving a report",
            ));
        }

        let mut uow = self.store.begin_write().await?;
        let current = uow.find_report(id).await?.ok_or(DomainError::not_found("report", id))?;
        if !current.status.can_transition_to(next) {
            return Err(DomainError::validation(format!(
                "cannot move a {} report to {next}",
                current.status
            )));
        }

        if update.delete_content {
            match current.content_type {
                ContentType::Comment => uow.delete_comment_cascade(current.content_id, Some(id)).await?,
                ContentType::Reply => uow.delete_reply_cascade(current.content_id, Some(id)).await?,
            }
        }

        let resolved_at = next.is_closed().then(Utc::now);
        let report = uow.set_report_status(id, next, resolved_at).await?;
        uow.commit().await?;

        if update.delete_content {
            warn!(
                report_id = id,
                content_type = %report.content_type,
                content_id = report.content_id,
                "reported content deleted on resolution"
            );
        }
        info!(report_id = id, from = %current.status, to = %next, "report transitioned");

        Ok(ReportOutcome { report, content_deleted: update.delete_content })
    }
}
