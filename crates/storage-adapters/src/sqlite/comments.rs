use async_trait::async_trait;
use domains::errors::{DomainError, Result};
use domains::pagination::PageRequest;
use domains::ports::CommentRepository;
use domains::{Comment, CommentChanges, CommentId, NewComment, PropertyId, Rating};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::debug;

use super::{corrupt_row, now, total, SqliteUnitOfWork, SqlxResultExt};

pub(crate) fn comment_from_row(row: &SqliteRow) -> Result<Comment> {
    let rating: i64 = row.try_get("rating").or_store("decode comment")?;
    Ok(Comment {
        id: row.try_get("id").or_store("decode comment")?,
        property_id: row.try_get("property_id").or_store("decode comment")?,
        author_id: row.try_get("author_id").or_store("decode comment")?,
        content: row.try_get("content").or_store("decode comment")?,
        rating: Rating::new(rating).map_err(|_| corrupt_row("decode comment", rating))?,
        created_at: row.try_get("created_at").or_store("decode comment")?,
        updated_at: row.try_get("updated_at").or_store("decode comment")?,
    })
}

#[async_trait]
impl CommentRepository for SqliteUnitOfWork {
    async fn insert_comment(&mut self, new: NewComment) -> Result<Comment> {
        let ts = now();
        let row = sqlx::query(
            "INSERT INTO comments (property_id, author_id, content, rating, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING id, property_id, author_id, content, rating, created_at, updated_at",
        )
        .bind(new.property_id)
        .bind(new.author_id)
        .bind(new.content)
        .bind(i64::from(new.rating.get()))
        .bind(ts)
        .bind(ts)
        .fetch_one(&mut *self.tx)
        .await
        .or_store("insert comment")?;
        comment_from_row(&row)
    }

    async fn find_comment(&mut self, id: CommentId) -> Result<Option<Comment>> {
        let row = sqlx::query(
            "SELECT id, property_id, author_id, content, rating, created_at, updated_at
             FROM comments WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .or_store("find comment")?;
        row.as_ref().map(comment_from_row).transpose()
    }

    async fn list_comments(&mut self, property_id: PropertyId, page: PageRequest) -> Result<(Vec<Comment>, u64)> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE property_id = ?")
            .bind(property_id)
            .fetch_one(&mut *self.tx)
            .await
            .or_store("count comments")?;

        let rows = sqlx::query(
            "SELECT id, property_id, author_id, content, rating, created_at, updated_at
             FROM comments WHERE property_id = ?
             ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
        )
        .bind(property_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&mut *self.tx)
        .await
        .or_store("list comments")?;

        let comments = rows.iter().map(comment_from_row).collect::<Result<Vec<_>>>()?;
        Ok((comments, total(count)))
    }

    async fn update_comment(&mut self, id: CommentId, changes: CommentChanges) -> Result<Comment> {
        let row = sqlx::query(
            "UPDATE comments
             SET content = COALESCE(?, content), rating = COALESCE(?, rating), updated_at = ?
             WHERE id = ?
             RETURNING id, property_id, author_id, content, rating, created_at, updated_at",
        )
        .bind(changes.content)
        .bind(changes.rating.map(|r| i64::from(r.get())))
        .bind(now())
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .or_store("update comment")?;

        match row {
            Some(row) => comment_from_row(&row),
            None => Err(DomainError::not_found("comment", id)),
        }
    }

    async fn delete_comment_cascade(&mut self, id: CommentId, retain_report: Option<i64>) -> Result<()> {
        // children before parents; the foreign keys reject any other order
        sqlx::query(
            "DELETE FROM reply_likes WHERE reply_id IN (SELECT id FROM replies WHERE comment_id = ?)",
        )
        .bind(id)
        .execute(&mut *self.tx)
        .await
        .or_store("delete comment reply likes")?;

        sqlx::query(
            "DELETE FROM reports WHERE content_type = 'reply'
             AND content_id IN (SELECT id FROM replies WHERE comment_id = ?)",
        )
        .bind(id)
        .execute(&mut *self.tx)
        .await
        .or_store("delete comment reply reports")?;

        sqlx::query("DELETE FROM replies WHERE comment_id = ?")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .or_store("delete comment replies")?;

        sqlx::query("DELETE FROM comment_likes WHERE comment_id = ?")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .or_store("delete comment likes")?;

        sqlx::query(
            "DELETE FROM reports WHERE content_type = 'comment' AND content_id = ?
             AND id IS NOT COALESCE(?, -1)",
        )
        .bind(id)
        .bind(retain_report)
        .execute(&mut *self.tx)
        .await
        .or_store("delete comment reports")?;

        let deleted = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .or_store("delete comment")?
            .rows_affected();

        if deleted == 0 {
            return Err(DomainError::not_found("comment", id));
        }
        debug!(comment_id = id, "comment cascade deleted");
        Ok(())
    }
}
