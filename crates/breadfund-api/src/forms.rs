//! Multipart form decoding for campaign and feed-post uploads.

use axum::extract::Multipart;
use chrono::NaiveDateTime;
use tracing::debug;

use breadfund_db::models::{CampaignPatch, NewCampaign};

use crate::error::{ApiError, ApiResult};

const DEADLINE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"];

/// Raw campaign fields as they arrived. Repeated `category` and
/// `social_media_links` parts accumulate in order.
#[derive(Debug, Default)]
pub struct CampaignForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub story: Option<String>,
    pub goal: Option<String>,
    pub deadline: Option<String>,
    pub category: Vec<String>,
    pub social_media_links: Vec<String>,
    pub header_img: Option<Vec<u8>>,
}

#[derive(Debug, Default)]
pub struct FeedPostForm {
    pub text: Option<String>,
    pub media: Vec<Vec<u8>>,
}

pub async fn read_campaign_form(mut multipart: Multipart) -> ApiResult<CampaignForm> {
    let mut form = CampaignForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => form.title = Some(field.text().await?),
            "description" => form.description = Some(field.text().await?),
            "story" => form.story = Some(field.text().await?),
            "goal" => form.goal = Some(field.text().await?),
            "deadline" => form.deadline = Some(field.text().await?),
            "category" => form.category.push(field.text().await?),
            "social_media_links" => form.social_media_links.push(field.text().await?),
            "header_img" => form.header_img = Some(field.bytes().await?.to_vec()),
            other => debug!("Ignoring unknown campaign form field '{}'", other),
        }
    }

    Ok(form)
}

pub async fn read_feed_post_form(mut multipart: Multipart) -> ApiResult<FeedPostForm> {
    let mut form = FeedPostForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "text" => form.text = Some(field.text().await?),
            "media" => {
                let blob = field.bytes().await?;
                // Browsers send an empty part for an untouched file input
                if !blob.is_empty() {
                    form.media.push(blob.to_vec());
                }
            }
            other => debug!("Ignoring unknown feed post form field '{}'", other),
        }
    }

    Ok(form)
}

/// Values that count as "not provided" on a partial update.
pub trait Falsy {
    fn is_falsy(&self) -> bool;
}

impl Falsy for String {
    fn is_falsy(&self) -> bool {
        self.is_empty()
    }
}

impl Falsy for i64 {
    fn is_falsy(&self) -> bool {
        *self == 0
    }
}

impl<T> Falsy for Vec<T> {
    fn is_falsy(&self) -> bool {
        self.is_empty()
    }
}

/// Drop a value that is empty, zero or absent.
pub fn truthy<T: Falsy>(value: Option<T>) -> Option<T> {
    value.filter(|v| !v.is_falsy())
}

pub fn parse_goal(raw: &str) -> ApiResult<i64> {
    let goal: i64 = raw
        .trim()
        .parse()
        .map_err(|_| ApiError::Validation(format!("goal: '{}' is not an integer", raw)))?;
    if goal < 0 {
        return Err(ApiError::Validation("goal: must not be negative".into()));
    }
    Ok(goal)
}

/// Naive datetime, no timezone. Past dates are accepted as given.
pub fn parse_deadline(raw: &str) -> ApiResult<NaiveDateTime> {
    DEADLINE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw.trim(), fmt).ok())
        .ok_or_else(|| ApiError::Validation(format!("deadline: '{}' is not a naive datetime", raw)))
}

fn required(value: Option<String>, field: &str) -> ApiResult<String> {
    value.ok_or_else(|| ApiError::Validation(format!("{}: field required", field)))
}

impl CampaignForm {
    /// Validate a creation form. Counters and `amt_reached` start at zero in
    /// the store.
    pub fn into_new_campaign(self, id: String, creator_id: String) -> ApiResult<NewCampaign> {
        let goal = parse_goal(&required(self.goal, "goal")?)?;
        let deadline = truthy(self.deadline).map(|d| parse_deadline(&d)).transpose()?;

        Ok(NewCampaign {
            id,
            creator_id,
            title: required(self.title, "title")?,
            header_img: self
                .header_img
                .ok_or_else(|| ApiError::Validation("header_img: field required".into()))?,
            description: required(self.description, "description")?,
            story: required(self.story, "story")?,
            goal,
            deadline,
            category: self.category,
            social_media_links: self.social_media_links,
        })
    }

    /// Build a patch with "falsy means unchanged" semantics: an empty string,
    /// zero goal, empty list or empty file leaves the stored value untouched.
    pub fn into_patch(self) -> ApiResult<CampaignPatch> {
        let goal = truthy(self.goal).map(|g| parse_goal(&g)).transpose()?;
        let deadline = truthy(self.deadline).map(|d| parse_deadline(&d)).transpose()?;

        Ok(CampaignPatch {
            title: truthy(self.title),
            header_img: truthy(self.header_img),
            description: truthy(self.description),
            story: truthy(self.story),
            goal: truthy(goal),
            deadline,
            category: truthy(Some(self.category)),
            social_media_links: truthy(Some(self.social_media_links)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falsy_values_are_dropped() {
        assert_eq!(truthy(Some(String::new())), None);
        assert_eq!(truthy(Some(0i64)), None);
        assert_eq!(truthy(Some(Vec::<u8>::new())), None);
        assert_eq!(truthy(Some(2000i64)), Some(2000));
        assert_eq!(truthy::<String>(None), None);
    }

    #[test]
    fn zero_goal_leaves_patch_goal_unset() {
        let patch = CampaignForm {
            goal: Some("0".into()),
            title: Some(String::new()),
            ..Default::default()
        }
        .into_patch()
        .unwrap();
        assert_eq!(patch.goal, None);
        assert_eq!(patch.title, None);
        assert_eq!(patch.category, None);

        let patch = CampaignForm {
            goal: Some("2000".into()),
            ..Default::default()
        }
        .into_patch()
        .unwrap();
        assert_eq!(patch.goal, Some(2000));
    }

    #[test]
    fn new_campaign_requires_core_fields() {
        let err = CampaignForm {
            title: Some("t".into()),
            ..Default::default()
        }
        .into_new_campaign("id".into(), "creator".into());
        assert!(matches!(err, Err(ApiError::Validation(_))));
    }

    #[test]
    fn goal_and_deadline_parsing() {
        assert!(parse_goal("-5").is_err());
        assert!(parse_goal("abc").is_err());
        assert_eq!(parse_goal(" 1500 ").unwrap(), 1500);

        let deadline = parse_deadline("2030-05-01T12:00:00").unwrap();
        assert_eq!(deadline.to_string(), "2030-05-01 12:00:00");
        assert!(parse_deadline("next tuesday").is_err());
    }
}
