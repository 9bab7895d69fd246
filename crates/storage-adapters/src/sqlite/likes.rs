//! Like rows and the read-time engagement counters derived from them.

use async_trait::async_trait;
use domains::errors::Result;
use domains::ports::{EngagementRepository, LikeRepository};
use domains::{Engagement, LikeTarget, TopicId, UserId};

use super::{now, SqliteUnitOfWork, SqlxResultExt};

/// Per-target SQL. Table and column names are static, never user input.
struct LikeSql {
    delete: &'static str,
    insert: &'static str,
    liked_by: &'static str,
    replies: Option<&'static str>,
    reports: Option<&'static str>,
}

fn like_sql(target: LikeTarget) -> LikeSql {
    match target {
        LikeTarget::Comment(_) => LikeSql {
            delete: "DELETE FROM comment_likes WHERE comment_id = ? AND user_id = ?",
            insert: "INSERT INTO comment_likes (comment_id, user_id, created_at) VALUES (?, ?, ?)",
            liked_by: "SELECT user_id FROM comment_likes WHERE comment_id = ? ORDER BY id",
            replies: Some("SELECT COUNT(*) FROM replies WHERE comment_id = ?"),
            reports: Some("SELECT COUNT(*) FROM reports WHERE content_type = 'comment' AND content_id = ?"),
        },
        LikeTarget::Reply(_) => LikeSql {
            delete: "DELETE FROM reply_likes WHERE reply_id = ? AND user_id = ?",
            insert: "INSERT INTO reply_likes (reply_id, user_id, created_at) VALUES (?, ?, ?)",
            liked_by: "SELECT user_id FROM reply_likes WHERE reply_id = ? ORDER BY id",
            replies: None,
            reports: Some("SELECT COUNT(*) FROM reports WHERE content_type = 'reply' AND content_id = ?"),
        },
        LikeTarget::Post(_) => LikeSql {
            delete: "DELETE FROM post_likes WHERE post_id = ? AND user_id = ?",
            insert: "INSERT INTO post_likes (post_id, user_id, created_at) VALUES (?, ?, ?)",
            liked_by: "SELECT user_id FROM post_likes WHERE post_id = ? ORDER BY id",
            replies: Some("SELECT COUNT(*) FROM replies WHERE post_id = ?"),
            reports: None,
        },
    }
}

#[async_trait]
impl LikeRepository for SqliteUnitOfWork {
    async fn remove_like(&mut self, target: LikeTarget, user_id: UserId) -> Result<bool> {
        let removed = sqlx::query(like_sql(target).delete)
            .bind(target.id())
            .bind(user_id)
            .execute(&mut *self.tx)
            .await
            .or_store("remove like")?
            .rows_affected();
        Ok(removed > 0)
    }

    async fn insert_like(&mut self, target: LikeTarget, user_id: UserId) -> Result<()> {
        // the unique (content, user) constraint is the guard against a concurrent double insert
        sqlx::query(like_sql(target).insert)
            .bind(target.id())
            .bind(user_id)
            .bind(now())
            .execute(&mut *self.tx)
            .await
            .or_store("insert like")?;
        Ok(())
    }
}

#[async_trait]
impl EngagementRepository for SqliteUnitOfWork {
    async fn engagement(&mut self, target: LikeTarget) -> Result<Engagement> {
        let sql = like_sql(target);
        let id = target.id();

        let liked_by: Vec<UserId> = sqlx::query_scalar(sql.liked_by)
            .bind(id)
            .fetch_all(&mut *self.tx)
            .await
            .or_store("list likes")?;

        let reply_count = match sql.replies {
            Some(q) => sqlx::query_scalar(q)
                .bind(id)
                .fetch_one(&mut *self.tx)
                .await
                .or_store("count replies")?,
            None => 0,
        };

        let reports_count = match sql.reports {
            Some(q) => sqlx::query_scalar(q)
                .bind(id)
                .fetch_one(&mut *self.tx)
                .await
                .or_store("count reports")?,
            None => 0,
        };

        Ok(Engagement {
            likes_count: liked_by.len() as i64,
            liked_by,
            reply_count,
            reports_count,
        })
    }

    async fn post_count(&mut self, topic_id: TopicId) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE topic_id = ?")
            .bind(topic_id)
            .fetch_one(&mut *self.tx)
            .await
            .or_store("count posts")
    }
}
