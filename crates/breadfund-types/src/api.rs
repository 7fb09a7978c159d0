use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Gender;

/// Marker carried in the `prv` claim of every access token.
pub const ACCESS_TOKEN_PURPOSE: &str = "access";

// -- JWT Claims --

/// Bearer token claims. Timestamps are seconds since the Unix epoch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub sub: Uuid,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    pub jti: String,
    pub prv: String,
}

// -- Users --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignupRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub gender: Gender,
}

/// OAuth2 password-flow form: `username` carries the email.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
}

// -- Campaigns --

#[derive(Debug, Deserialize)]
pub struct HotCampaignsQuery {
    #[serde(default = "default_hot_limit")]
    pub limit: i64,
    #[serde(default)]
    pub skip: i64,
}

fn default_hot_limit() -> i64 {
    5
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CampaignResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    /// Base64-encoded header image.
    pub image: String,
    pub goal: i64,
    pub amt_reached: i64,
    pub percent_reached: f64,
    pub category: Vec<String>,
    pub no_of_reactions: i64,
    pub no_of_donors: i64,
    pub deadline: Option<NaiveDateTime>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RetrieveCampaignResponse {
    #[serde(flatten)]
    pub summary: CampaignResponse,
    pub story: String,
    pub social_media_links: Vec<String>,
    pub feed_posts: Vec<FeedPostResponse>,
    pub beneficiary_user_first_name: Option<String>,
    pub beneficiary_user_last_name: Option<String>,
    pub beneficiary_user_email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QrCodeQuery {
    pub url: Option<String>,
}

// -- Feed posts --

#[derive(Debug, Serialize, Deserialize)]
pub struct FeedPostResponse {
    pub id: Uuid,
    pub text: String,
    /// Base64-encoded media blobs, `None` when the post has no media.
    pub media: Option<Vec<String>>,
    pub no_of_reactions: i64,
}

// -- Donations --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SaveDonationRequest {
    pub payment_reference: String,
    pub transaction_reference: String,
    pub amount_received: i64,
    pub name: Option<String>,
    pub social_media_links: Option<Vec<String>>,
    pub anonymous: bool,
    pub recovery_acct_no: String,
    pub recovery_acct_bank: String,
    pub recovery_acct_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DonationResponse {
    pub id: Uuid,
    pub anonymous: bool,
    pub name: Option<String>,
    pub social_media_links: Option<Vec<String>>,
    pub amount: i64,
}

// -- Misc --

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}
