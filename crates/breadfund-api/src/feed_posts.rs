use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult, FEED_NOT_FOUND};
use crate::extract::{ApiMultipart, ApiPath};
use crate::forms::{read_feed_post_form, truthy};
use crate::guards;
use crate::middleware::Principal;
use crate::presentation;

/// POST /campaign/{campaign_id}/feed-post: campaign creator only.
// TODO: notify the campaign's donors once email delivery exists.
pub async fn create(
    State(state): State<AppState>,
    ApiPath(campaign_id): ApiPath<Uuid>,
    Extension(principal): Extension<Principal>,
    ApiMultipart(multipart): ApiMultipart,
) -> ApiResult<impl IntoResponse> {
    let form = read_feed_post_form(multipart).await?;
    let text = truthy(form.text)
        .ok_or_else(|| ApiError::Validation("text: field required".into()))?;
    let media = form.media;

    let post = state
        .unit_of_work(move |s| {
            let campaign = guards::campaign_exists(s, &campaign_id.to_string())?;
            guards::is_campaign_creator(&principal, &campaign)?;

            let post_id = Uuid::new_v4().to_string();
            s.insert_feed_post(&post_id, &campaign.id, &principal.id, &text, &media)?;
            guards::feed_post_exists(s, &post_id)
        })
        .await?;

    info!("Feed post {} added to campaign {}", post.id, campaign_id);
    Ok((StatusCode::CREATED, Json(presentation::feed_post(&post)?)))
}

/// PATCH /campaign/{campaign_id}/feed-post/{feed_id}: caller must have
/// created both the campaign and the post. Text and media are replaced
/// wholesale when non-empty.
pub async fn update(
    State(state): State<AppState>,
    ApiPath((campaign_id, feed_id)): ApiPath<(Uuid, Uuid)>,
    Extension(principal): Extension<Principal>,
    ApiMultipart(multipart): ApiMultipart,
) -> ApiResult<impl IntoResponse> {
    let form = read_feed_post_form(multipart).await?;
    let text = truthy(form.text);
    let media = truthy(Some(form.media));

    let post = state
        .unit_of_work(move |s| {
            let campaign = guards::campaign_exists(s, &campaign_id.to_string())?;
            guards::is_campaign_creator(&principal, &campaign)?;
            let post = guards::feed_post_in_campaign(s, &campaign, &feed_id.to_string())?;
            guards::is_feed_post_creator(&principal, &post)?;

            s.update_feed_post(&post.id, text.as_deref(), media.as_deref())?;
            s.get_feed_post(&post.id)?
                .ok_or(ApiError::NotFound(FEED_NOT_FOUND))
        })
        .await?;

    Ok((StatusCode::ACCEPTED, Json(presentation::feed_post(&post)?)))
}

/// DELETE /campaign/{campaign_id}/feed-post/{feed_id}: same checks as
/// update; the post's reactions and media go with it.
pub async fn delete(
    State(state): State<AppState>,
    ApiPath((campaign_id, feed_id)): ApiPath<(Uuid, Uuid)>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<impl IntoResponse> {
    state
        .unit_of_work(move |s| {
            let campaign = guards::campaign_exists(s, &campaign_id.to_string())?;
            guards::is_campaign_creator(&principal, &campaign)?;
            let post = guards::feed_post_in_campaign(s, &campaign, &feed_id.to_string())?;
            guards::is_feed_post_creator(&principal, &post)?;

            s.delete_feed_post(&post.id)?;
            Ok(())
        })
        .await?;

    info!("Feed post {} deleted from campaign {}", feed_id, campaign_id);
    Ok(StatusCode::NO_CONTENT)
}
