//! Read-time aggregation and the like toggle shared by comments, replies and posts.

use domains::ports::{
    CommentRepository, ContentStore, EngagementRepository, LikeRepository, PostRepository, ReplyRepository,
    UnitOfWork,
};
use domains::{
    Comment, CommentView, DomainError, LikeTarget, LikeToggle, Post, PostView, Reply, ReplyView, Result,
    UserId,
};
use tracing::{debug, warn};

/// Fails with `NotFound` unless the like target exists.
pub(crate) async fn require_target(uow: &mut dyn UnitOfWork, target: LikeTarget) -> Result<()> {
    let exists = match target {
        LikeTarget::Comment(id) => uow.find_comment(id).await?.is_some(),
        LikeTarget::Reply(id) => uow.find_reply(id).await?.is_some(),
        LikeTarget::Post(id) => uow.find_post(id).await?.is_some(),
    };
    if exists {
        Ok(())
    } else {
        Err(DomainError::not_found(target.entity(), target.id()))
    }
}

/// Removes the user's like if present, otherwise inserts one.
///
/// The remove runs first so the common double-click case needs no read. The
/// unit holds the write lock from the start, so toggles on one node queue up.
/// A unique violation on insert can still come from a store without that
/// lock; it is settled by [`settle_like_conflict`].
pub(crate) async fn toggle_like(store: &dyn ContentStore, user_id: UserId, target: LikeTarget) -> Result<LikeToggle> {
    let mut uow = store.begin_write().await?;
    require_target(uow.as_mut(), target).await?;

    let is_liked = if uow.remove_like(target, user_id).await? {
        false
    } else {
        match uow.insert_like(target, user_id).await {
            Ok(()) => true,
            Err(DomainError::DuplicateConflict(_)) => {
                warn!(entity = target.entity(), id = target.id(), user_id, "concurrent like detected");
                uow.rollback().await?;
                return settle_like_conflict(store, user_id, target).await;
            }
            Err(e) => return Err(e),
        }
    };

    let engagement = uow.engagement(target).await?;
    uow.commit().await?;
    debug!(entity = target.entity(), id = target.id(), user_id, is_liked, "like toggled");

    Ok(LikeToggle {
        is_liked,
        likes_count: engagement.likes_count,
        liked_by: engagement.liked_by,
    })
}

/// A concurrent request from the same user already liked the node. Reports
/// whatever state won, read in a fresh unit of work.
pub(crate) async fn settle_like_conflict(
    store: &dyn ContentStore,
    user_id: UserId,
    target: LikeTarget,
) -> Result<LikeToggle> {
    let mut fresh = store.begin().await?;
    let engagement = fresh.engagement(target).await?;
    fresh.commit().await?;
    Ok(LikeToggle {
        is_liked: engagement.liked_by.contains(&user_id),
        likes_count: engagement.likes_count,
        liked_by: engagement.liked_by,
    })
}

pub(crate) async fn comment_view(uow: &mut dyn UnitOfWork, comment: Comment) -> Result<CommentView> {
    let engagement = uow.engagement(LikeTarget::Comment(comment.id)).await?;
    Ok(CommentView { comment, engagement })
}

pub(crate) async fn reply_view(uow: &mut dyn UnitOfWork, reply: Reply) -> Result<ReplyView> {
    let engagement = uow.engagement(LikeTarget::Reply(reply.id)).await?;
    Ok(ReplyView { reply, engagement })
}

pub(crate) async fn post_view(uow: &mut dyn UnitOfWork, post: Post) -> Result<PostView> {
    let engagement = uow.engagement(LikeTarget::Post(post.id)).await?;
    Ok(PostView { post, engagement })
}
