use axum::{
    Extension, Json,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use breadfund_types::api::{HotCampaignsQuery, QrCodeQuery};

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult, USER_NOT_FOUND};
use crate::extract::{ApiMultipart, ApiPath, ApiQuery};
use crate::forms::read_campaign_form;
use crate::guards;
use crate::middleware::Principal;
use crate::presentation;
use crate::qr;

pub const HOT_LIMIT_MAX: i64 = 10;

/// GET /campaign/hot: most reacted campaigns, supporters as tie-break.
pub async fn list_popular(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<HotCampaignsQuery>,
) -> ApiResult<impl IntoResponse> {
    if !(0..=HOT_LIMIT_MAX).contains(&query.limit) {
        return Err(ApiError::Validation(format!(
            "limit: must be between 0 and {}",
            HOT_LIMIT_MAX
        )));
    }
    if query.skip < 0 {
        return Err(ApiError::Validation("skip: must not be negative".into()));
    }

    let campaigns = state
        .unit_of_work(move |s| Ok(s.list_popular_campaigns(query.limit, query.skip)?))
        .await?;

    Ok(Json(
        campaigns
            .iter()
            .map(presentation::campaign_summary)
            .collect::<ApiResult<Vec<_>>>()?,
    ))
}

/// GET /campaign/{campaign_id}: full detail with feed and beneficiary.
pub async fn retrieve(
    State(state): State<AppState>,
    ApiPath(campaign_id): ApiPath<Uuid>,
    Extension(_principal): Extension<Principal>,
) -> ApiResult<impl IntoResponse> {
    let detail = state
        .unit_of_work(move |s| {
            let campaign = guards::campaign_exists(s, &campaign_id.to_string())?;
            let feed_posts = s.list_feed_posts(&campaign.id)?;
            let beneficiary = match campaign.beneficiary_user_id.as_deref() {
                Some(user_id) => s.get_user_by_id(user_id)?,
                None => None,
            };
            presentation::campaign_detail(&campaign, &feed_posts, beneficiary.as_ref())
        })
        .await?;

    Ok(Json(detail))
}

/// POST /campaign/: the caller becomes the creator.
pub async fn create(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiMultipart(multipart): ApiMultipart,
) -> ApiResult<impl IntoResponse> {
    let campaign_id = Uuid::new_v4();
    let campaign = read_campaign_form(multipart)
        .await?
        .into_new_campaign(campaign_id.to_string(), principal.id.clone())?;

    state
        .unit_of_work(move |s| Ok(s.insert_campaign(&campaign)?))
        .await?;

    info!("Campaign {} created by {}", campaign_id, principal.email);
    Ok((StatusCode::CREATED, Json(campaign_id)))
}

/// GET /campaign/: campaigns created by the caller.
pub async fn list_mine(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<impl IntoResponse> {
    let campaigns = state
        .unit_of_work(move |s| Ok(s.list_campaigns_by_creator(&principal.id)?))
        .await?;

    Ok(Json(
        campaigns
            .iter()
            .map(presentation::campaign_summary)
            .collect::<ApiResult<Vec<_>>>()?,
    ))
}

/// PATCH /campaign/{campaign_id}: creator only, partial update.
pub async fn update(
    State(state): State<AppState>,
    ApiPath(campaign_id): ApiPath<Uuid>,
    Extension(principal): Extension<Principal>,
    ApiMultipart(multipart): ApiMultipart,
) -> ApiResult<impl IntoResponse> {
    let patch = read_campaign_form(multipart).await?.into_patch()?;

    state
        .unit_of_work(move |s| {
            let campaign = guards::campaign_exists(s, &campaign_id.to_string())?;
            guards::is_campaign_creator(&principal, &campaign)?;
            s.update_campaign(&campaign.id, &patch)?;
            Ok(())
        })
        .await?;

    Ok(StatusCode::ACCEPTED)
}

/// DELETE /campaign/{campaign_id}: creator only; feed posts, donations and
/// reactions go with it.
pub async fn delete(
    State(state): State<AppState>,
    ApiPath(campaign_id): ApiPath<Uuid>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<impl IntoResponse> {
    state
        .unit_of_work(move |s| {
            let campaign = guards::campaign_exists(s, &campaign_id.to_string())?;
            guards::is_campaign_creator(&principal, &campaign)?;
            s.delete_campaign(&campaign.id)?;
            Ok(())
        })
        .await?;

    info!("Campaign {} deleted", campaign_id);
    Ok(StatusCode::NO_CONTENT)
}

/// POST /campaign/{campaign_id}/beneficiary/{email}: creator only.
/// Replaces any previous beneficiary.
pub async fn add_beneficiary(
    State(state): State<AppState>,
    ApiPath((campaign_id, email)): ApiPath<(Uuid, String)>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<impl IntoResponse> {
    state
        .unit_of_work(move |s| {
            let campaign = guards::campaign_exists(s, &campaign_id.to_string())?;
            guards::is_campaign_creator(&principal, &campaign)?;

            let beneficiary = s
                .get_user_by_email(&email.to_lowercase())?
                .ok_or(ApiError::NotFound(USER_NOT_FOUND))?;
            s.set_beneficiary(&campaign.id, &beneficiary.id)?;

            info!("Campaign {} beneficiary set to {}", campaign.id, beneficiary.id);
            Ok(())
        })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /campaign/{campaign_id}/qr-code: creator only. Encodes `?url=` when
/// given, otherwise the campaign's public page.
pub async fn qr_code(
    State(state): State<AppState>,
    ApiPath(campaign_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<QrCodeQuery>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<impl IntoResponse> {
    state
        .unit_of_work(move |s| {
            let campaign = guards::campaign_exists(s, &campaign_id.to_string())?;
            guards::is_campaign_creator(&principal, &campaign)?;
            Ok(())
        })
        .await?;

    let url = query.url.unwrap_or_else(|| {
        format!("{}/campaign/{}", state.public_url.trim_end_matches('/'), campaign_id)
    });
    if !qr::is_campaign_url(&url) {
        return Err(ApiError::Validation("url: must be an absolute http(s) URL".into()));
    }

    let png = qr::render_png(&url)?;
    Ok((StatusCode::CREATED, [(header::CONTENT_TYPE, "image/png")], png))
}
