use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::errors::{DomainError, Result};
use domains::pagination::PageRequest;
use domains::ports::ReportRepository;
use domains::{ContentType, NewReport, Report, ReportId, ReportStatus, UserId};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::{corrupt_row, now, total, SqliteUnitOfWork, SqlxResultExt};

const REPORT_COLUMNS: &str =
    "id, reporter_id, content_type, content_id, reasons, description, status, created_at, resolved_at";

fn report_from_row(row: &SqliteRow) -> Result<Report> {
    let content_type: String = row.try_get("content_type").or_store("decode report")?;
    let status: String = row.try_get("status").or_store("decode report")?;
    let reasons: String = row.try_get("reasons").or_store("decode report")?;

    Ok(Report {
        id: row.try_get("id").or_store("decode report")?,
        reporter_id: row.try_get("reporter_id").or_store("decode report")?,
        content_type: content_type
            .parse()
            .map_err(|_| corrupt_row("decode report", &content_type))?,
        content_id: row.try_get("content_id").or_store("decode report")?,
        reasons: serde_json::from_str::<BTreeSet<String>>(&reasons)
            .map_err(|e| corrupt_row("decode report", e))?,
        description: row.try_get("description").or_store("decode report")?,
        status: status.parse().map_err(|_| corrupt_row("decode report", &status))?,
        created_at: row.try_get("created_at").or_store("decode report")?,
        resolved_at: row.try_get("resolved_at").or_store("decode report")?,
    })
}

#[async_trait]
impl ReportRepository for SqliteUnitOfWork {
    async fn insert_report(&mut self, new: NewReport) -> Result<Report> {
        let reasons = serde_json::to_string(&new.reasons).map_err(DomainError::store)?;
        let row = sqlx::query(&format!(
            "INSERT INTO reports (reporter_id, content_type, content_id, reasons, description, status, created_at)
             VALUES (?, ?, ?, ?, ?, 'pending', ?)
             RETURNING {REPORT_COLUMNS}"
        ))
        .bind(new.reporter_id)
        .bind(new.content_type.as_str())
        .bind(new.content_id)
        .bind(reasons)
        .bind(new.description)
        .bind(now())
        .fetch_one(&mut *self.tx)
        .await
        .or_store("insert report")?;
        report_from_row(&row)
    }

    async fn find_report(&mut self, id: ReportId) -> Result<Option<Report>> {
        let row = sqlx::query(&format!("SELECT {REPORT_COLUMNS} FROM reports WHERE id = ?"))
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .or_store("find report")?;
        row.as_ref().map(report_from_row).transpose()
    }

    async fn find_report_by(
        &mut self,
        reporter_id: UserId,
        content_type: ContentType,
        content_id: i64,
    ) -> Result<Option<Report>> {
        let row = sqlx::query(&format!(
            "SELECT {REPORT_COLUMNS} FROM reports
             WHERE reporter_id = ? AND content_type = ? AND content_id = ?"
        ))
        .bind(reporter_id)
        .bind(content_type.as_str())
        .bind(content_id)
        .fetch_optional(&mut *self.tx)
        .await
        .or_store("find report by reporter")?;
        row.as_ref().map(report_from_row).transpose()
    }

    async fn list_reports(&mut self, status: Option<ReportStatus>, page: PageRequest) -> Result<(Vec<Report>, u64)> {
        let status = status.map(ReportStatus::as_str);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reports WHERE (?1 IS NULL OR status = ?1)")
            .bind(status)
            .fetch_one(&mut *self.tx)
            .await
            .or_store("count reports")?;

        let rows = sqlx::query(&format!(
            "SELECT {REPORT_COLUMNS} FROM reports
             WHERE (?1 IS NULL OR status = ?1)
             ORDER BY created_at DESC, id DESC LIMIT ?2 OFFSET ?3"
        ))
        .bind(status)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&mut *self.tx)
        .await
        .or_store("list reports")?;

        let reports = rows.iter().map(report_from_row).collect::<Result<Vec<_>>>()?;
        Ok((reports, total(count)))
    }

    async fn set_report_status(
        &mut self,
        id: ReportId,
        status: ReportStatus,
        resolved_at: Option<DateTime<Utc>>,
    ) -> Result<Report> {
        let row = sqlx::query(&format!(
            "UPDATE reports SET status = ?, resolved_at = ? WHERE id = ?
             RETURNING {REPORT_COLUMNS}"
        ))
        .bind(status.as_str())
        .bind(resolved_at)
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .or_store("update report status")?;

        match row {
            Some(row) => report_from_row(&row),
            None => Err(DomainError::not_found("report", id)),
        }
    }

    async fn content_exists(&mut self, content_type: ContentType, content_id: i64) -> Result<bool> {
        let sql = match content_type {
            ContentType::Comment => "SELECT EXISTS (SELECT 1 FROM comments WHERE id = ?)",
            ContentType::Reply => "SELECT EXISTS (SELECT 1 FROM replies WHERE id = ?)",
        };
        sqlx::query_scalar(sql)
            .bind(content_id)
            .fetch_one(&mut *self.tx)
            .await
            .or_store("check reported content")
    }
}
