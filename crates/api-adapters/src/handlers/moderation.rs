use axum::extract::State;
use domains::{PageRequest, ReportId};
use services::{page_size, ReportDraft, ReportUpdate};

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery, Identity, ReportsQuery};
use crate::response::Envelope;
use crate::state::AppState;

pub async fn file_report(
    State(state): State<AppState>,
    Identity(ctx): Identity,
    ApiJson(draft): ApiJson<ReportDraft>,
) -> ApiResult<Envelope> {
    let report = state.moderation.file_report(&ctx, draft).await?;
    state.metrics.mutation("report", "create");
    Ok(Envelope::created()
        .message("Report submitted successfully")
        .with("report", report))
}

pub async fn list_reports(
    State(state): State<AppState>,
    Identity(ctx): Identity,
    ApiQuery(query): ApiQuery<ReportsQuery>,
) -> ApiResult<Envelope> {
    let page = PageRequest::new(query.page, query.per_page, page_size::REPORTS);
    let reports = state
        .moderation
        .list_reports(&ctx, query.status.as_deref(), page)
        .await?;
    Ok(Envelope::ok().page("reports", reports))
}

pub async fn get_report(
    State(state): State<AppState>,
    Identity(ctx): Identity,
    ApiPath(id): ApiPath<ReportId>,
) -> ApiResult<Envelope> {
    let report = state.moderation.get_report(&ctx, id).await?;
    Ok(Envelope::ok().with("report", report))
}

pub async fn update_report(
    State(state): State<AppState>,
    Identity(ctx): Identity,
    ApiPath(id): ApiPath<ReportId>,
    ApiJson(update): ApiJson<ReportUpdate>,
) -> ApiResult<Envelope> {
    let outcome = state.moderation.transition_report(&ctx, id, update).await?;
    state.metrics.transition(outcome.report.status.as_str());
    if outcome.content_deleted {
        state.metrics.mutation(outcome.report.content_type.as_str(), "moderated_delete");
    }
    Ok(Envelope::ok()
        .message("Report updated successfully")
        .flatten(outcome))
}
