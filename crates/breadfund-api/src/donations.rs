use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use breadfund_db::models::NewDonation;
use breadfund_types::api::SaveDonationRequest;

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiPath};
use crate::guards;
use crate::presentation;

/// POST /campaign/{campaign_id}/donation: no auth. Records a payment that
/// already settled with the gateway; the references are stored, not checked.
pub async fn save(
    State(state): State<AppState>,
    ApiPath(campaign_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<SaveDonationRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.amount_received < 0 {
        return Err(ApiError::Validation("amount_received: must not be negative".into()));
    }

    let amount = req.amount_received;
    state
        .unit_of_work(move |s| {
            let campaign = guards::campaign_exists(s, &campaign_id.to_string())?;
            s.insert_donation(&NewDonation {
                id: Uuid::new_v4().to_string(),
                campaign_id: campaign.id,
                anonymous: req.anonymous,
                name: req.name,
                social_media_links: req.social_media_links.unwrap_or_default(),
                payment_reference: req.payment_reference,
                transaction_reference: req.transaction_reference,
                recovery_acct_no: req.recovery_acct_no,
                recovery_acct_bank: req.recovery_acct_bank,
                recovery_acct_name: req.recovery_acct_name,
                amount,
            })?;
            Ok(())
        })
        .await?;

    info!("Donation of {} recorded for campaign {}", amount, campaign_id);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /campaign/{campaign_id}/donation
pub async fn list(
    State(state): State<AppState>,
    ApiPath(campaign_id): ApiPath<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let donations = state
        .unit_of_work(move |s| {
            let campaign = guards::campaign_exists(s, &campaign_id.to_string())?;
            Ok(s.list_donations(&campaign.id)?)
        })
        .await?;

    Ok(Json(
        donations
            .iter()
            .map(presentation::donation)
            .collect::<ApiResult<Vec<_>>>()?,
    ))
}
