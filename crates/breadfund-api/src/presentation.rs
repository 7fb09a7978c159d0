//! Shapes stored rows into response payloads: derived display fields,
//! donor-field suppression and base64 encoding of blobs.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use anyhow::anyhow;
use uuid::Uuid;

use breadfund_db::models::{CampaignRow, DonationRow, FeedPostRow, UserRow};
use breadfund_types::api::{CampaignResponse, DonationResponse, FeedPostResponse, RetrieveCampaignResponse};

use crate::error::{ApiError, ApiResult};

/// Upper bound for the displayed funding percentage.
pub const MAX_DISPLAY_PERCENT: f64 = 100.0;

/// `amt_reached / goal * 100`, or `0.0` for a zero goal.
pub fn percent_reached(amt_reached: i64, goal: i64) -> f64 {
    if goal == 0 {
        return 0.0;
    }
    (amt_reached as f64 / goal as f64 * 100.0).clamp(0.0, MAX_DISPLAY_PERCENT)
}

/// Stored ids are written as UUIDs; anything else is a corrupt row.
pub fn parse_id(raw: &str) -> ApiResult<Uuid> {
    raw.parse()
        .map_err(|e| ApiError::Internal(anyhow!("corrupt id '{}': {}", raw, e)))
}

pub fn campaign_summary(campaign: &CampaignRow) -> ApiResult<CampaignResponse> {
    Ok(CampaignResponse {
        id: parse_id(&campaign.id)?,
        title: campaign.title.clone(),
        description: campaign.description.clone(),
        image: B64.encode(&campaign.header_img),
        goal: campaign.goal,
        amt_reached: campaign.amt_reached,
        percent_reached: percent_reached(campaign.amt_reached, campaign.goal),
        category: campaign.category.clone(),
        no_of_reactions: campaign.no_of_reactions,
        no_of_donors: campaign.no_of_supporters,
        deadline: campaign.deadline,
    })
}

pub fn campaign_detail(
    campaign: &CampaignRow,
    feed_posts: &[FeedPostRow],
    beneficiary: Option<&UserRow>,
) -> ApiResult<RetrieveCampaignResponse> {
    Ok(RetrieveCampaignResponse {
        summary: campaign_summary(campaign)?,
        story: campaign.story.clone(),
        social_media_links: campaign.social_media_links.clone(),
        feed_posts: feed_posts.iter().map(feed_post).collect::<ApiResult<_>>()?,
        beneficiary_user_first_name: beneficiary.map(|u| u.first_name.clone()),
        beneficiary_user_last_name: beneficiary.map(|u| u.last_name.clone()),
        beneficiary_user_email: beneficiary.map(|u| u.email.clone()),
    })
}

pub fn feed_post(post: &FeedPostRow) -> ApiResult<FeedPostResponse> {
    Ok(FeedPostResponse {
        id: parse_id(&post.id)?,
        text: post.text.clone(),
        media: post
            .media
            .as_ref()
            .filter(|media| !media.is_empty())
            .map(|media| media.iter().map(|blob| B64.encode(blob)).collect()),
        no_of_reactions: post.no_of_reactions,
    })
}

/// Donor name and links are only shown for donations flagged anonymous.
// TODO: confirm with product whether the condition should be inverted.
pub fn donation(donation: &DonationRow) -> ApiResult<DonationResponse> {
    let shown = donation.anonymous;
    Ok(DonationResponse {
        id: parse_id(&donation.id)?,
        anonymous: donation.anonymous,
        name: donation.name.clone().filter(|_| shown),
        social_media_links: shown.then(|| donation.social_media_links.clone()),
        amount: donation.amount,
    })
}
