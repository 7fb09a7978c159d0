use axum::{
    Extension,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use tracing::debug;
use uuid::Uuid;

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult, USER_ALREADY_REACTED};
use crate::extract::ApiPath;
use crate::guards;
use crate::middleware::Principal;

/// POST /campaign/{campaign_id}/like: one reaction per user, no unlike.
pub async fn react_to_campaign(
    State(state): State<AppState>,
    ApiPath(campaign_id): ApiPath<Uuid>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<impl IntoResponse> {
    state
        .unit_of_work(move |s| {
            let campaign = guards::campaign_exists(s, &campaign_id.to_string())?;
            guards::not_reacted_to_campaign(s, &principal, &campaign)?;

            // The unique index catches a concurrent duplicate the check missed
            let reaction_id = Uuid::new_v4().to_string();
            if !s.insert_campaign_reaction(&reaction_id, &campaign.id, &principal.id)? {
                return Err(ApiError::BadRequest(USER_ALREADY_REACTED));
            }
            Ok(())
        })
        .await?;

    debug!("Campaign {} liked", campaign_id);
    Ok(StatusCode::CREATED)
}

/// POST /campaign/feed-post/{feed_id}/like
pub async fn react_to_feed_post(
    State(state): State<AppState>,
    ApiPath(feed_id): ApiPath<Uuid>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<impl IntoResponse> {
    state
        .unit_of_work(move |s| {
            let post = guards::feed_post_exists(s, &feed_id.to_string())?;
            guards::not_reacted_to_feed_post(s, &principal, &post)?;

            let reaction_id = Uuid::new_v4().to_string();
            if !s.insert_feed_post_reaction(&reaction_id, &post.id, &principal.id)? {
                return Err(ApiError::BadRequest(USER_ALREADY_REACTED));
            }
            Ok(())
        })
        .await?;

    debug!("Feed post {} liked", feed_id);
    Ok(StatusCode::NO_CONTENT)
}
