use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::errors::{DomainError, Result};
use domains::pagination::PageRequest;
use domains::ports::PostRepository;
use domains::{NewPost, Post, PostId, TopicId};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::debug;

use super::{now, total, SqliteUnitOfWork, SqlxResultExt};

const POST_COLUMNS: &str = "id, topic_id, author_id, content, is_pinned, created_at, updated_at";

fn post_from_row(row: &SqliteRow) -> Result<Post> {
    Ok(Post {
        id: row.try_get("id").or_store("decode post")?,
        topic_id: row.try_get("topic_id").or_store("decode post")?,
        author_id: row.try_get("author_id").or_store("decode post")?,
        content: row.try_get("content").or_store("decode post")?,
        is_pinned: row.try_get("is_pinned").or_store("decode post")?,
        created_at: row.try_get("created_at").or_store("decode post")?,
        updated_at: row.try_get("updated_at").or_store("decode post")?,
    })
}

impl SqliteUnitOfWork {
    async fn touch_topic(&mut self, topic_id: TopicId, at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE topics SET updated_at = ? WHERE id = ?")
            .bind(at)
            .bind(topic_id)
            .execute(&mut *self.tx)
            .await
            .or_store("touch topic")?;
        Ok(())
    }
}

#[async_trait]
impl PostRepository for SqliteUnitOfWork {
    async fn insert_post(&mut self, new: NewPost) -> Result<Post> {
        let ts = now();
        let row = sqlx::query(&format!(
            "INSERT INTO posts (topic_id, author_id, content, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)
             RETURNING {POST_COLUMNS}"
        ))
        .bind(new.topic_id)
        .bind(new.author_id)
        .bind(new.content)
        .bind(ts)
        .bind(ts)
        .fetch_one(&mut *self.tx)
        .await
        .or_store("insert post")?;

        let post = post_from_row(&row)?;
        self.touch_topic(post.topic_id, ts).await?;
        Ok(post)
    }

    async fn find_post(&mut self, id: PostId) -> Result<Option<Post>> {
        let row = sqlx::query(&format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?"))
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .or_store("find post")?;
        row.as_ref().map(post_from_row).transpose()
    }

    async fn list_posts(&mut self, topic_id: TopicId, page: PageRequest) -> Result<(Vec<Post>, u64)> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE topic_id = ?")
            .bind(topic_id)
            .fetch_one(&mut *self.tx)
            .await
            .or_store("count posts")?;

        let rows = sqlx::query(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE topic_id = ?
             ORDER BY is_pinned DESC, created_at ASC, id ASC LIMIT ? OFFSET ?"
        ))
        .bind(topic_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&mut *self.tx)
        .await
        .or_store("list posts")?;

        let posts = rows.iter().map(post_from_row).collect::<Result<Vec<_>>>()?;
        Ok((posts, total(count)))
    }

    async fn update_post_content(&mut self, id: PostId, content: String) -> Result<Post> {
        let ts = now();
        let row = sqlx::query(&format!(
            "UPDATE posts SET content = ?, updated_at = ? WHERE id = ? RETURNING {POST_COLUMNS}"
        ))
        .bind(content)
        .bind(ts)
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .or_store("update post")?;

        let post = match row {
            Some(row) => post_from_row(&row)?,
            None => return Err(DomainError::not_found("post", id)),
        };
        self.touch_topic(post.topic_id, ts).await?;
        Ok(post)
    }

    async fn set_post_pinned(&mut self, id: PostId, pinned: bool) -> Result<Post> {
        let row = sqlx::query(&format!(
            "UPDATE posts SET is_pinned = ? WHERE id = ? RETURNING {POST_COLUMNS}"
        ))
        .bind(pinned)
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .or_store("pin post")?;

        match row {
            Some(row) => post_from_row(&row),
            None => Err(DomainError::not_found("post", id)),
        }
    }

    async fn delete_post_cascade(&mut self, id: PostId) -> Result<()> {
        sqlx::query("DELETE FROM reply_likes WHERE reply_id IN (SELECT id FROM replies WHERE post_id = ?)")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .or_store("delete post reply likes")?;

        sqlx::query(
            "DELETE FROM reports WHERE content_type = 'reply'
             AND content_id IN (SELECT id FROM replies WHERE post_id = ?)",
        )
        .bind(id)
        .execute(&mut *self.tx)
        .await
        .or_store("delete post reply reports")?;

        sqlx::query("DELETE FROM replies WHERE post_id = ?")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .or_store("delete post replies")?;

        sqlx::query("DELETE FROM post_likes WHERE post_id = ?")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .or_store("delete post likes")?;

        let deleted = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .or_store("delete post")?
            .rows_affected();

        if deleted == 0 {
            return Err(DomainError::not_found("post", id));
        }
        debug!(post_id = id, "post cascade deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use domains::ports::{ContentStore, EngagementRepository, ReplyRepository, TopicRepository};
    use domains::{LikeTarget, ReplyParent};

    use super::*;

    #[tokio::test]
    async fn new_post_bumps_topic_activity() {
        let store = store().await;
        let mut uow = store.begin().await.unwrap();
        let topic = uow.insert_topic(new_topic(1)).await.unwrap();
        let post = uow.insert_post(new_post(topic.id, 2)).await.unwrap();
        let topic_after = uow.find_topic(topic.id).await.unwrap().unwrap();
        assert_eq!(topic_after.updated_at, post.created_at);
        assert_eq!(uow.post_count(topic.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn editing_a_post_bumps_topic_activity() {
        let store = store().await;
        let mut uow = store.begin_write().await.unwrap();
        let topic = uow.insert_topic(new_topic(1)).await.unwrap();
        let post = uow.insert_post(new_post(topic.id, 2)).await.unwrap();

        let edited = uow.update_post_content(post.id, "Room taken, thanks all".into()).await.unwrap();
        assert_eq!(edited.content, "Room taken, thanks all");
        assert!(edited.updated_at >= post.created_at);
        let topic_after = uow.find_topic(topic.id).await.unwrap().unwrap();
        assert_eq!(topic_after.updated_at, edited.updated_at);

        let err = uow.update_post_content(404, "nope".into()).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "post", id: 404 }));
    }

    #[tokio::test]
    async fn pinned_posts_lead_then_oldest_first() {
        let store = store().await;
        let mut uow = store.begin().await.unwrap();
        let topic = uow.insert_topic(new_topic(1)).await.unwrap();
        let first = uow.insert_post(new_post(topic.id, 2)).await.unwrap();
        let second = uow.insert_post(new_post(topic.id, 3)).await.unwrap();
        let third = uow.insert_post(new_post(topic.id, 4)).await.unwrap();
        uow.set_post_pinned(third.id, true).await.unwrap();

        let (posts, _) = uow.list_posts(topic.id, PageRequest::new(None, None, 20)).await.unwrap();
        let ids: Vec<_> = posts.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![third.id, first.id, second.id]);
    }

    #[tokio::test]
    async fn post_in_missing_topic_is_rejected() {
        let store = store().await;
        let mut uow = store.begin().await.unwrap();
        let err = uow.insert_post(new_post(77, 1)).await.unwrap_err();
        assert!(matches!(err, DomainError::Store(_)));
    }

    #[tokio::test]
    async fn cascade_drops_replies_and_counters() {
        let store = store().await;
        let mut uow = store.begin().await.unwrap();
        let topic = uow.insert_topic(new_topic(1)).await.unwrap();
        let post = uow.insert_post(new_post(topic.id, 2)).await.unwrap();
        uow.insert_reply(new_reply(ReplyParent::Post(post.id), 3)).await.unwrap();
        assert_eq!(uow.engagement(LikeTarget::Post(post.id)).await.unwrap().reply_count, 1);

        uow.delete_post_cascade(post.id).await.unwrap();
        assert!(uow.find_post(post.id).await.unwrap().is_none());
        assert_eq!(uow.engagement(LikeTarget::Post(post.id)).await.unwrap().reply_count, 0);
        assert!(uow.find_topic(topic.id).await.unwrap().is_some());
    }
}
