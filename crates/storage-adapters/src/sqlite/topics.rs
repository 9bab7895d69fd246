use async_trait::async_trait;
use domains::errors::{DomainError, Result};
use domains::pagination::PageRequest;
use domains::ports::TopicRepository;
use domains::{NewTopic, Topic, TopicChanges, TopicId};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::debug;

use super::{now, total, SqliteUnitOfWork, SqlxResultExt};

const TOPIC_COLUMNS: &str = "id, title, description, creator_id, is_pinned, view_count, created_at, updated_at";

fn topic_from_row(row: &SqliteRow) -> Result<Topic> {
    Ok(Topic {
        id: row.try_get("id").or_store("decode topic")?,
        title: row.try_get("title").or_store("decode topic")?,
        description: row.try_get("description").or_store("decode topic")?,
        creator_id: row.try_get("creator_id").or_store("decode topic")?,
        is_pinned: row.try_get("is_pinned").or_store("decode topic")?,
        view_count: row.try_get("view_count").or_store("decode topic")?,
        created_at: row.try_get("created_at").or_store("decode topic")?,
        updated_at: row.try_get("updated_at").or_store("decode topic")?,
    })
}

#[async_trait]
impl TopicRepository for SqliteUnitOfWork {
    async fn insert_topic(&mut self, new: NewTopic) -> Result<Topic> {
        let ts = now();
        let row = sqlx::query(&format!(
            "INSERT INTO topics (title, description, creator_id, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)
             RETURNING {TOPIC_COLUMNS}"
        ))
        .bind(new.title)
        .bind(new.description)
        .bind(new.creator_id)
        .bind(ts)
        .bind(ts)
        .fetch_one(&mut *self.tx)
        .await
        .or_store("insert topic")?;
        topic_from_row(&row)
    }

    async fn find_topic(&mut self, id: TopicId) -> Result<Option<Topic>> {
        let row = sqlx::query(&format!("SELECT {TOPIC_COLUMNS} FROM topics WHERE id = ?"))
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .or_store("find topic")?;
        row.as_ref().map(topic_from_row).transpose()
    }

    async fn list_topics(&mut self, page: PageRequest) -> Result<(Vec<Topic>, u64)> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM topics")
            .fetch_one(&mut *self.tx)
            .await
            .or_store("count topics")?;

        let rows = sqlx::query(&format!(
            "SELECT {TOPIC_COLUMNS} FROM topics
             ORDER BY is_pinned DESC, updated_at DESC, id DESC LIMIT ? OFFSET ?"
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&mut *self.tx)
        .await
        .or_store("list topics")?;

        let topics = rows.iter().map(topic_from_row).collect::<Result<Vec<_>>>()?;
        Ok((topics, total(count)))
    }

    async fn update_topic(&mut self, id: TopicId, changes: TopicChanges) -> Result<Topic> {
        let row = sqlx::query(&format!(
            "UPDATE topics
             SET title = COALESCE(?, title),
                 description = CASE WHEN ? THEN ? ELSE description END,
                 updated_at = ?
             WHERE id = ?
             RETURNING {TOPIC_COLUMNS}"
        ))
        .bind(changes.title)
        .bind(changes.description.is_some())
        .bind(changes.description.flatten())
        .bind(now())
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .or_store("update topic")?;

        match row {
            Some(row) => topic_from_row(&row),
            None => Err(DomainError::not_found("topic", id)),
        }
    }

    async fn set_topic_pinned(&mut self, id: TopicId, pinned: bool) -> Result<Topic> {
        // pinning is a moderation flag; it does not count as activity
        let row = sqlx::query(&format!(
            "UPDATE topics SET is_pinned = ? WHERE id = ? RETURNING {TOPIC_COLUMNS}"
        ))
        .bind(pinned)
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .or_store("pin topic")?;

        match row {
            Some(row) => topic_from_row(&row),
            None => Err(DomainError::not_found("topic", id)),
        }
    }

    async fn increment_view_count(&mut self, id: TopicId) -> Result<()> {
        sqlx::query("UPDATE topics SET view_count = view_count + 1 WHERE id = ?")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .or_store("count topic view")?;
        Ok(())
    }

    async fn delete_topic_cascade(&mut self, id: TopicId) -> Result<()> {
        const POSTS: &str = "SELECT id FROM posts WHERE topic_id = ?";

        sqlx::query(&format!(
            "DELETE FROM reply_likes WHERE reply_id IN (SELECT id FROM replies WHERE post_id IN ({POSTS}))"
        ))
        .bind(id)
        .execute(&mut *self.tx)
        .await
        .or_store("delete topic reply likes")?;

        sqlx::query(&format!(
            "DELETE FROM reports WHERE content_type = 'reply'
             AND content_id IN (SELECT id FROM replies WHERE post_id IN ({POSTS}))"
        ))
        .bind(id)
        .execute(&mut *self.tx)
        .await
        .or_store("delete topic reply reports")?;

        sqlx::query(&format!("DELETE FROM replies WHERE post_id IN ({POSTS})"))
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .or_store("delete topic replies")?;

        sqlx::query(&format!("DELETE FROM post_likes WHERE post_id IN ({POSTS})"))
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .or_store("delete topic post likes")?;

        sqlx::query("DELETE FROM posts WHERE topic_id = ?")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .or_store("delete topic posts")?;

        let deleted = sqlx::query("DELETE FROM topics WHERE id = ?")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .or_store("delete topic")?
            .rows_affected();

        if deleted == 0 {
            return Err(DomainError::not_found("topic", id));
        }
        debug!(topic_id = id, "topic cascade deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use domains::ports::{ContentStore, EngagementRepository, LikeRepository, PostRepository, ReplyRepository};
    use domains::{LikeTarget, ReplyParent};

    use super::*;

    #[tokio::test]
    async fn pinned_topics_sort_first() {
        let store = store().await;
        let mut uow = store.begin().await.unwrap();
        let old = uow.insert_topic(new_topic(1)).await.unwrap();
        let newer = uow.insert_topic(new_topic(2)).await.unwrap();
        uow.set_topic_pinned(old.id, true).await.unwrap();

        let (topics, total) = uow.list_topics(PageRequest::new(None, None, 10)).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(topics[0].id, old.id);
        assert!(topics[0].is_pinned);
        assert_eq!(topics[1].id, newer.id);
    }

    #[tokio::test]
    async fn views_accumulate() {
        let store = store().await;
        let mut uow = store.begin().await.unwrap();
        let topic = uow.insert_topic(new_topic(1)).await.unwrap();
        uow.increment_view_count(topic.id).await.unwrap();
        uow.increment_view_count(topic.id).await.unwrap();
        assert_eq!(uow.find_topic(topic.id).await.unwrap().unwrap().view_count, 2);
    }

    #[tokio::test]
    async fn partial_update_keeps_description() {
        let store = store().await;
        let mut uow = store.begin().await.unwrap();
        let topic = uow.insert_topic(new_topic(1)).await.unwrap();
        let updated = uow
            .update_topic(topic.id, TopicChanges { title: Some("Sublet wanted".into()), description: None })
            .await
            .unwrap();
        assert_eq!(updated.title, "Sublet wanted");
        assert_eq!(updated.description, topic.description);
        assert_eq!(updated.creator_id, 1);

        let cleared = uow
            .update_topic(topic.id, TopicChanges { title: None, description: Some(None) })
            .await
            .unwrap();
        assert_eq!(cleared.title, "Sublet wanted");
        assert!(cleared.description.is_none());
    }

    #[tokio::test]
    async fn cascade_clears_posts_and_their_replies() {
        let store = store().await;
        let mut uow = store.begin().await.unwrap();
        let topic = uow.insert_topic(new_topic(1)).await.unwrap();
        let post = uow.insert_post(new_post(topic.id, 2)).await.unwrap();
        let reply = uow.insert_reply(new_reply(ReplyParent::Post(post.id), 3)).await.unwrap();
        uow.insert_like(LikeTarget::Post(post.id), 4).await.unwrap();
        uow.insert_like(LikeTarget::Reply(reply.id), 4).await.unwrap();
        uow.commit().await.unwrap();

        let mut uow = store.begin().await.unwrap();
        uow.delete_topic_cascade(topic.id).await.unwrap();
        uow.commit().await.unwrap();

        let mut uow = store.begin().await.unwrap();
        assert!(uow.find_topic(topic.id).await.unwrap().is_none());
        assert!(uow.find_post(post.id).await.unwrap().is_none());
        assert!(uow.find_reply(reply.id).await.unwrap().is_none());
        assert_eq!(uow.engagement(LikeTarget::Reply(reply.id)).await.unwrap().likes_count, 0);
    }
}
