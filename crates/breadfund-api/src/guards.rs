//! Access checks over (actor, resource), composed as guard clauses in front
//! of every mutation. Each runs inside the caller's unit of work.

use breadfund_db::Session;
use breadfund_db::models::{CampaignRow, FeedPostRow};

use crate::error::{
    ApiError, ApiResult, CAMPAIGN_NOT_FOUND, FEED_NOT_FOUND, USER_ALREADY_REACTED,
    USER_NOT_CAMPAIGN_CREATOR, USER_NOT_FEED_POST_CREATOR,
};
use crate::middleware::Principal;

pub fn campaign_exists(s: &Session<'_>, campaign_id: &str) -> ApiResult<CampaignRow> {
    s.get_campaign(campaign_id)?
        .ok_or(ApiError::NotFound(CAMPAIGN_NOT_FOUND))
}

pub fn feed_post_exists(s: &Session<'_>, feed_post_id: &str) -> ApiResult<FeedPostRow> {
    s.get_feed_post(feed_post_id)?
        .ok_or(ApiError::NotFound(FEED_NOT_FOUND))
}

/// A post addressed through a campaign must belong to it.
pub fn feed_post_in_campaign(
    s: &Session<'_>,
    campaign: &CampaignRow,
    feed_post_id: &str,
) -> ApiResult<FeedPostRow> {
    let post = feed_post_exists(s, feed_post_id)?;
    if post.campaign_id != campaign.id {
        return Err(ApiError::NotFound(FEED_NOT_FOUND));
    }
    Ok(post)
}

pub fn is_campaign_creator(user: &Principal, campaign: &CampaignRow) -> ApiResult<()> {
    if campaign.creator_id.as_deref() != Some(user.id.as_str()) {
        return Err(ApiError::PermissionDenied(USER_NOT_CAMPAIGN_CREATOR));
    }
    Ok(())
}

pub fn is_feed_post_creator(user: &Principal, post: &FeedPostRow) -> ApiResult<()> {
    if post.creator_id.as_deref() != Some(user.id.as_str()) {
        return Err(ApiError::PermissionDenied(USER_NOT_FEED_POST_CREATOR));
    }
    Ok(())
}

pub fn not_reacted_to_campaign(s: &Session<'_>, user: &Principal, campaign: &CampaignRow) -> ApiResult<()> {
    if s.campaign_reaction_exists(&campaign.id, &user.id)? {
        return Err(ApiError::BadRequest(USER_ALREADY_REACTED));
    }
    Ok(())
}

pub fn not_reacted_to_feed_post(s: &Session<'_>, user: &Principal, post: &FeedPostRow) -> ApiResult<()> {
    if s.feed_post_reaction_exists(&post.id, &user.id)? {
        return Err(ApiError::BadRequest(USER_ALREADY_REACTED));
    }
    Ok(())
}
