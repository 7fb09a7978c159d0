//! SQLite row shapes and the insert/update inputs the queries take.

use chrono::NaiveDateTime;

pub struct UserRow {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
    pub password: String,
    pub created_at: String,
}

pub struct CampaignRow {
    pub id: String,
    pub creator_id: Option<String>,
    pub beneficiary_user_id: Option<String>,
    pub title: String,
    pub header_img: Vec<u8>,
    pub description: String,
    pub story: String,
    pub goal: i64,
    pub amt_reached: i64,
    pub deadline: Option<NaiveDateTime>,
    pub category: Vec<String>,
    pub social_media_links: Vec<String>,
    pub no_of_supporters: i64,
    pub no_of_reactions: i64,
    pub created_at: String,
}

pub struct FeedPostRow {
    pub id: String,
    pub campaign_id: String,
    pub creator_id: Option<String>,
    pub text: String,
    /// `None` when the post carries no media.
    pub media: Option<Vec<Vec<u8>>>,
    pub no_of_reactions: i64,
    pub created_at: String,
}

pub struct DonationRow {
    pub id: String,
    pub campaign_id: String,
    pub anonymous: bool,
    pub name: Option<String>,
    pub social_media_links: Vec<String>,
    pub payment_reference: String,
    pub transaction_reference: String,
    pub recovery_acct_no: String,
    pub recovery_acct_bank: String,
    pub recovery_acct_name: String,
    pub amount: i64,
    pub created_at: String,
}

// -- Inserts / updates --

pub struct NewUser<'a> {
    pub id: &'a str,
    pub email: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub gender: &'a str,
    pub password_hash: &'a str,
}

pub struct NewCampaign {
    pub id: String,
    pub creator_id: String,
    pub title: String,
    pub header_img: Vec<u8>,
    pub description: String,
    pub story: String,
    pub goal: i64,
    pub deadline: Option<NaiveDateTime>,
    pub category: Vec<String>,
    pub social_media_links: Vec<String>,
}

/// Fields to overwrite on a campaign. `None` leaves the stored value alone.
#[derive(Default)]
pub struct CampaignPatch {
    pub title: Option<String>,
    pub header_img: Option<Vec<u8>>,
    pub description: Option<String>,
    pub story: Option<String>,
    pub goal: Option<i64>,
    pub deadline: Option<NaiveDateTime>,
    pub category: Option<Vec<String>>,
    pub social_media_links: Option<Vec<String>>,
}

pub struct NewDonation {
    pub id: String,
    pub campaign_id: String,
    pub anonymous: bool,
    pub name: Option<String>,
    pub social_media_links: Vec<String>,
    pub payment_reference: String,
    pub transaction_reference: String,
    pub recovery_acct_no: String,
    pub recovery_acct_bank: String,
    pub recovery_acct_name: String,
    pub amount: i64,
}
