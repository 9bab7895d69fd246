use async_trait::async_trait;
use domains::errors::{DomainError, Result};
use domains::pagination::PageRequest;
use domains::ports::ReplyRepository;
use domains::{NewReply, Reply, ReplyId, ReplyParent};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::{corrupt_row, now, total, SqliteUnitOfWork, SqlxResultExt};

pub(crate) fn reply_from_row(row: &SqliteRow) -> Result<Reply> {
    let comment_id: Option<i64> = row.try_get("comment_id").or_store("decode reply")?;
    let post_id: Option<i64> = row.try_get("post_id").or_store("decode reply")?;
    let parent = match (comment_id, post_id) {
        (Some(id), None) => ReplyParent::Comment(id),
        (None, Some(id)) => ReplyParent::Post(id),
        _ => return Err(corrupt_row("decode reply", "reply needs exactly one parent")),
    };
    Ok(Reply {
        id: row.try_get("id").or_store("decode reply")?,
        parent,
        author_id: row.try_get("author_id").or_store("decode reply")?,
        content: row.try_get("content").or_store("decode reply")?,
        created_at: row.try_get("created_at").or_store("decode reply")?,
        updated_at: row.try_get("updated_at").or_store("decode reply")?,
    })
}

fn parent_columns(parent: ReplyParent) -> (Option<i64>, Option<i64>) {
    match parent {
        ReplyParent::Comment(id) => (Some(id), None),
        ReplyParent::Post(id) => (None, Some(id)),
    }
}

#[async_trait]
impl ReplyRepository for SqliteUnitOfWork {
    async fn insert_reply(&mut self, new: NewReply) -> Result<Reply> {
        let (comment_id, post_id) = parent_columns(new.parent);
        let ts = now();
        let row = sqlx::query(
            "INSERT INTO replies (comment_id, post_id, author_id, content, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING id, comment_id, post_id, author_id, content, created_at, updated_at",
        )
        .bind(comment_id)
        .bind(post_id)
        .bind(new.author_id)
        .bind(new.content)
        .bind(ts)
        .bind(ts)
        .fetch_one(&mut *self.tx)
        .await
        .or_store("insert reply")?;
        reply_from_row(&row)
    }

    async fn find_reply(&mut self, id: ReplyId) -> Result<Option<Reply>> {
        let row = sqlx::query(
            "SELECT id, comment_id, post_id, author_id, content, created_at, updated_at
             FROM replies WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .or_store("find reply")?;
        row.as_ref().map(reply_from_row).transpose()
    }

    async fn list_replies(&mut self, parent: ReplyParent, page: PageRequest) -> Result<(Vec<Reply>, u64)> {
        let (count_sql, list_sql, parent_id) = match parent {
            ReplyParent::Comment(id) => (
                "SELECT COUNT(*) FROM replies WHERE comment_id = ?",
                "SELECT id, comment_id, post_id, author_id, content, created_at, updated_at
                 FROM replies WHERE comment_id = ?
                 ORDER BY created_at ASC, id ASC LIMIT ? OFFSET ?",
                id,
            ),
            ReplyParent::Post(id) => (
                "SELECT COUNT(*) FROM replies WHERE post_id = ?",
                "SELECT id, comment_id, post_id, author_id, content, created_at, updated_at
                 FROM replies WHERE post_id = ?
                 ORDER BY created_at ASC, id ASC LIMIT ? OFFSET ?",
                id,
            ),
        };

        let count: i64 = sqlx::query_scalar(count_sql)
            .bind(parent_id)
            .fetch_one(&mut *self.tx)
            .await
            .or_store("count replies")?;

        let rows = sqlx::query(list_sql)
            .bind(parent_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&mut *self.tx)
            .await
            .or_store("list replies")?;

        let replies = rows.iter().map(reply_from_row).collect::<Result<Vec<_>>>()?;
        Ok((replies, total(count)))
    }

    async fn update_reply_content(&mut self, id: ReplyId, content: String) -> Result<Reply> {
        let row = sqlx::query(
            "UPDATE replies SET content = ?, updated_at = ? WHERE id = ?
             RETURNING id, comment_id, post_id, author_id, content, created_at, updated_at",
        )
        .bind(content)
        .bind(now())
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .or_store("update reply")?;

        match row {
            Some(row) => reply_from_row(&row),
            None => Err(DomainError::not_found("reply", id)),
        }
    }

    async fn delete_reply_cascade(&mut self, id: ReplyId, retain_report: Option<i64>) -> Result<()> {
        sqlx::query("DELETE FROM reply_likes WHERE reply_id = ?")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .or_store("delete reply likes")?;

        sqlx::query(
            "DELETE FROM reports WHERE content_type = 'reply' AND content_id = ?
             AND id IS NOT COALESCE(?, -1)",
        )
        .bind(id)
        .bind(retain_report)
        .execute(&mut *self.tx)
        .await
        .or_store("delete reply reports")?;

        let deleted = sqlx::query("DELETE FROM replies WHERE id = ?")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .or_store("delete reply")?
            .rows_affected();

        if deleted == 0 {
            return Err(DomainError::not_found("reply", id));
        }
        Ok(())
    }
}
