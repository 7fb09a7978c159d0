use crate::models::{
    CampaignPatch, CampaignRow, DonationRow, FeedPostRow, NewCampaign, NewDonation, NewUser, UserRow,
};
use crate::Session;
use anyhow::Result;
use chrono::NaiveDateTime;
use rusqlite::types::Type;
use rusqlite::{Connection, Row};
use std::collections::HashMap;

/// Storage format for naive deadlines.
const DEADLINE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const USER_COLUMNS: &str = "id, email, first_name, last_name, gender, password, created_at";

const CAMPAIGN_COLUMNS: &str = "id, creator_id, beneficiary_user_id, title, header_img, description, story, \
     goal, amt_reached, deadline, category, social_media_links, no_of_supporters, no_of_reactions, created_at";

const DONATION_COLUMNS: &str = "id, campaign_id, anonymous, name, social_media_links, payment_reference, \
     transaction_reference, recovery_acct_no, recovery_acct_bank, recovery_acct_name, amount, created_at";

impl Session<'_> {
    // -- Users --

    /// Insert a user. Returns `false` when the email is already registered.
    pub fn create_user(&self, user: &NewUser<'_>) -> Result<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO users (id, email, first_name, last_name, gender, password)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                user.id,
                user.email.to_lowercase(),
                user.first_name,
                user.last_name,
                user.gender,
                user.password_hash,
            ],
        )?;
        Ok(inserted == 1)
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        query_user(self.conn, "email", &email.to_lowercase())
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        query_user(self.conn, "id", id)
    }

    /// Remove a user. Campaigns, posts and reactions keep their rows with the
    /// user reference set to NULL.
    pub fn delete_user(&self, id: &str) -> Result<bool> {
        let deleted = self.conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
        Ok(deleted == 1)
    }

    // -- Campaigns --

    pub fn insert_campaign(&self, campaign: &NewCampaign) -> Result<()> {
        self.conn.execute(
            "INSERT INTO campaigns (id, creator_id, title, header_img, description, story, goal, deadline, category, social_media_links)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            rusqlite::params![
                campaign.id,
                campaign.creator_id,
                campaign.title,
                campaign.header_img,
                campaign.description,
                campaign.story,
                campaign.goal,
                campaign.deadline.map(format_deadline),
                serde_json::to_string(&campaign.category)?,
                serde_json::to_string(&campaign.social_media_links)?,
            ],
        )?;
        Ok(())
    }

    pub fn get_campaign(&self, id: &str) -> Result<Option<CampaignRow>> {
        let sql = format!("SELECT {} FROM campaigns WHERE id = ?1", CAMPAIGN_COLUMNS);
        let row = self.conn.query_row(&sql, [id], campaign_from_row).optional()?;
        Ok(row)
    }

    /// Overwrite every field present in `patch`; absent fields keep their value.
    pub fn update_campaign(&self, id: &str, patch: &CampaignPatch) -> Result<()> {
        let category = patch.category.as_ref().map(serde_json::to_string).transpose()?;
        let links = patch
            .social_media_links
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        self.conn.execute(
            "UPDATE campaigns SET
                title              = COALESCE(?2, title),
                header_img         = COALESCE(?3, header_img),
                description        = COALESCE(?4, description),
                story              = COALESCE(?5, story),
                goal               = COALESCE(?6, goal),
                deadline           = COALESCE(?7, deadline),
                category           = COALESCE(?8, category),
                social_media_links = COALESCE(?9, social_media_links),
                updated_at         = datetime('now')
             WHERE id = ?1",
            rusqlite::params![
                id,
                patch.title,
                patch.header_img,
                patch.description,
                patch.story,
                patch.goal,
                patch.deadline.map(format_deadline),
                category,
                links,
            ],
        )?;
        Ok(())
    }

    /// Delete a campaign. Donations, feed posts, media and reactions go with it
    /// through `ON DELETE CASCADE`.
    pub fn delete_campaign(&self, id: &str) -> Result<bool> {
        let deleted = self.conn.execute("DELETE FROM campaigns WHERE id = ?1", [id])?;
        Ok(deleted == 1)
    }

    /// Most reacted campaigns first, supporter count breaking ties.
    pub fn list_popular_campaigns(&self, limit: i64, offset: i64) -> Result<Vec<CampaignRow>> {
        let sql = format!(
            "SELECT {} FROM campaigns
             ORDER BY no_of_reactions DESC, no_of_supporters DESC
             LIMIT ?1 OFFSET ?2",
            CAMPAIGN_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(rusqlite::params![limit, offset], campaign_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn list_campaigns_by_creator(&self, creator_id: &str) -> Result<Vec<CampaignRow>> {
        let sql = format!("SELECT {} FROM campaigns WHERE creator_id = ?1", CAMPAIGN_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([creator_id], campaign_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn set_beneficiary(&self, campaign_id: &str, user_id: &str) -> Result<()> {
        self.conn.execute(
            "UPDATE campaigns SET beneficiary_user_id = ?2, updated_at = datetime('now') WHERE id = ?1",
            [campaign_id, user_id],
        )?;
        Ok(())
    }

    // -- Campaign reactions --

    pub fn campaign_reaction_exists(&self, campaign_id: &str, user_id: &str) -> Result<bool> {
        let exists = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM campaign_reactions WHERE campaign_id = ?1 AND user_id = ?2)",
            [campaign_id, user_id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Record a reaction and bump the campaign counter.
    /// Returns `false` (and changes nothing) if the user already reacted.
    pub fn insert_campaign_reaction(&self, id: &str, campaign_id: &str, user_id: &str) -> Result<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO campaign_reactions (id, campaign_id, user_id) VALUES (?1, ?2, ?3)",
            [id, campaign_id, user_id],
        )?;
        if inserted == 0 {
            return Ok(false);
        }

        self.conn.execute(
            "UPDATE campaigns SET no_of_reactions = no_of_reactions + 1 WHERE id = ?1",
            [campaign_id],
        )?;
        Ok(true)
    }

    // -- Feed posts --

    pub fn insert_feed_post(
        &self,
        id: &str,
        campaign_id: &str,
        creator_id: &str,
        text: &str,
        media: &[Vec<u8>],
    ) -> Result<()> {
        self.conn.execute(
            "INSERT INTO feed_posts (id, campaign_id, creator_id, text) VALUES (?1, ?2, ?3, ?4)",
            [id, campaign_id, creator_id, text],
        )?;
        insert_media(self.conn, id, media)
    }

    pub fn get_feed_post(&self, id: &str) -> Result<Option<FeedPostRow>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, campaign_id, creator_id, text, no_of_reactions, created_at FROM feed_posts WHERE id = ?1",
                [id],
                feed_post_from_row,
            )
            .optional()?;

        let Some(mut post) = row else {
            return Ok(None);
        };
        post.media = query_media(self.conn, &[post.id.clone()])?.remove(&post.id);
        Ok(Some(post))
    }

    pub fn list_feed_posts(&self, campaign_id: &str) -> Result<Vec<FeedPostRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, campaign_id, creator_id, text, no_of_reactions, created_at
             FROM feed_posts
             WHERE campaign_id = ?1
             ORDER BY created_at, rowid",
        )?;
        let mut posts = stmt
            .query_map([campaign_id], feed_post_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let ids: Vec<String> = posts.iter().map(|p| p.id.clone()).collect();
        let mut media = query_media(self.conn, &ids)?;
        for post in &mut posts {
            post.media = media.remove(&post.id);
        }
        Ok(posts)
    }

    /// Replace text and/or the whole media list. `None` keeps the stored value.
    pub fn update_feed_post(&self, id: &str, text: Option<&str>, media: Option<&[Vec<u8>]>) -> Result<()> {
        self.conn.execute(
            "UPDATE feed_posts SET text = COALESCE(?2, text), updated_at = datetime('now') WHERE id = ?1",
            rusqlite::params![id, text],
        )?;

        if let Some(media) = media {
            self.conn.execute("DELETE FROM feed_post_media WHERE feed_post_id = ?1", [id])?;
            insert_media(self.conn, id, media)?;
        }
        Ok(())
    }

    pub fn delete_feed_post(&self, id: &str) -> Result<bool> {
        let deleted = self.conn.execute("DELETE FROM feed_posts WHERE id = ?1", [id])?;
        Ok(deleted == 1)
    }

    // -- Feed post reactions --

    pub fn feed_post_reaction_exists(&self, feed_post_id: &str, user_id: &str) -> Result<bool> {
        let exists = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM feed_post_reactions WHERE feed_post_id = ?1 AND user_id = ?2)",
            [feed_post_id, user_id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Same contract as [`Session::insert_campaign_reaction`], for feed posts.
    pub fn insert_feed_post_reaction(&self, id: &str, feed_post_id: &str, user_id: &str) -> Result<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO feed_post_reactions (id, feed_post_id, user_id) VALUES (?1, ?2, ?3)",
            [id, feed_post_id, user_id],
        )?;
        if inserted == 0 {
            return Ok(false);
        }

        self.conn.execute(
            "UPDATE feed_posts SET no_of_reactions = no_of_reactions + 1 WHERE id = ?1",
            [feed_post_id],
        )?;
        Ok(true)
    }

    // -- Donations --

    /// Store a donation, then credit the campaign: one more supporter and
    /// `amount` added to the running total.
    pub fn insert_donation(&self, donation: &NewDonation) -> Result<()> {
        self.conn.execute(
            "INSERT INTO donations (id, campaign_id, anonymous, name, social_media_links, payment_reference,
                                    transaction_reference, recovery_acct_no, recovery_acct_bank, recovery_acct_name, amount)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            rusqlite::params![
                donation.id,
                donation.campaign_id,
                donation.anonymous,
                donation.name,
                serde_json::to_string(&donation.social_media_links)?,
                donation.payment_reference,
                donation.transaction_reference,
                donation.recovery_acct_no,
                donation.recovery_acct_bank,
                donation.recovery_acct_name,
                donation.amount,
            ],
        )?;

        self.conn.execute(
            "UPDATE campaigns
             SET no_of_supporters = no_of_supporters + 1,
                 amt_reached      = amt_reached + ?2
             WHERE id = ?1",
            rusqlite::params![donation.campaign_id, donation.amount],
        )?;
        Ok(())
    }

    pub fn list_donations(&self, campaign_id: &str) -> Result<Vec<DonationRow>> {
        let sql = format!(
            "SELECT {} FROM donations WHERE campaign_id = ?1 ORDER BY created_at, rowid",
            DONATION_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([campaign_id], donation_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {} FROM users WHERE {} = ?1", USER_COLUMNS, column);
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                email: row.get(1)?,
                first_name: row.get(2)?,
                last_name: row.get(3)?,
                gender: row.get(4)?,
                password: row.get(5)?,
                created_at: row.get(6)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn campaign_from_row(row: &Row<'_>) -> rusqlite::Result<CampaignRow> {
    Ok(CampaignRow {
        id: row.get(0)?,
        creator_id: row.get(1)?,
        beneficiary_user_id: row.get(2)?,
        title: row.get(3)?,
        header_img: row.get(4)?,
        description: row.get(5)?,
        story: row.get(6)?,
        goal: row.get(7)?,
        amt_reached: row.get(8)?,
        deadline: parse_deadline(row, 9)?,
        category: parse_list(row, 10)?,
        social_media_links: parse_list(row, 11)?,
        no_of_supporters: row.get(12)?,
        no_of_reactions: row.get(13)?,
        created_at: row.get(14)?,
    })
}

fn feed_post_from_row(row: &Row<'_>) -> rusqlite::Result<FeedPostRow> {
    Ok(FeedPostRow {
        id: row.get(0)?,
        campaign_id: row.get(1)?,
        creator_id: row.get(2)?,
        text: row.get(3)?,
        media: None,
        no_of_reactions: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn donation_from_row(row: &Row<'_>) -> rusqlite::Result<DonationRow> {
    Ok(DonationRow {
        id: row.get(0)?,
        campaign_id: row.get(1)?,
        anonymous: row.get(2)?,
        name: row.get(3)?,
        social_media_links: parse_list(row, 4)?,
        payment_reference: row.get(5)?,
        transaction_reference: row.get(6)?,
        recovery_acct_no: row.get(7)?,
        recovery_acct_bank: row.get(8)?,
        recovery_acct_name: row.get(9)?,
        amount: row.get(10)?,
        created_at: row.get(11)?,
    })
}

fn insert_media(conn: &Connection, feed_post_id: &str, media: &[Vec<u8>]) -> Result<()> {
    let mut stmt =
        conn.prepare("INSERT INTO feed_post_media (feed_post_id, position, data) VALUES (?1, ?2, ?3)")?;
    for (position, blob) in media.iter().enumerate() {
        stmt.execute(rusqlite::params![feed_post_id, position as i64, blob])?;
    }
    Ok(())
}

/// Batch-fetch media for a set of feed posts, keyed by post id, each list in
/// upload order. Posts without media are absent from the map.
fn query_media(conn: &Connection, feed_post_ids: &[String]) -> Result<HashMap<String, Vec<Vec<u8>>>> {
    let mut media: HashMap<String, Vec<Vec<u8>>> = HashMap::new();
    if feed_post_ids.is_empty() {
        return Ok(media);
    }

    let placeholders: Vec<String> = (1..=feed_post_ids.len()).map(|i| format!("?{}", i)).collect();
    let sql = format!(
        "SELECT feed_post_id, data FROM feed_post_media WHERE feed_post_id IN ({}) ORDER BY feed_post_id, position",
        placeholders.join(", ")
    );

    let mut stmt = conn.prepare(&sql)?;
    let params: Vec<&dyn rusqlite::types::ToSql> = feed_post_ids
        .iter()
        .map(|id| id as &dyn rusqlite::types::ToSql)
        .collect();

    let rows = stmt.query_map(params.as_slice(), |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?))
    })?;
    for row in rows {
        let (id, blob) = row?;
        media.entry(id).or_default().push(blob);
    }

    Ok(media)
}

fn format_deadline(deadline: NaiveDateTime) -> String {
    deadline.format(DEADLINE_FORMAT).to_string()
}

fn parse_deadline(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveDateTime>> {
    let Some(raw) = row.get::<_, Option<String>>(idx)? else {
        return Ok(None);
    };
    NaiveDateTime::parse_from_str(&raw, DEADLINE_FORMAT)
        .map(Some)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Ordered string lists are stored as JSON arrays.
fn parse_list(row: &Row<'_>, idx: usize) -> rusqlite::Result<Vec<String>> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn new_id() -> String {
        Uuid::new_v4().to_string()
    }

    fn seed_user(db: &Database, email: &str) -> String {
        let id = new_id();
        let inserted = db
            .unit_of_work(|s| {
                s.create_user(&NewUser {
                    id: &id,
                    email,
                    first_name: "Ada",
                    last_name: "Obi",
                    gender: "female",
                    password_hash: "hash",
                })
            })
            .unwrap();
        assert!(inserted);
        id
    }

    fn seed_campaign(db: &Database, creator_id: &str, goal: i64) -> String {
        let id = new_id();
        db.unit_of_work(|s| {
            s.insert_campaign(&NewCampaign {
                id: id.clone(),
                creator_id: creator_id.to_string(),
                title: "Clean water".into(),
                header_img: vec![1, 2, 3],
                description: "Wells for the village".into(),
                story: "Long story".into(),
                goal,
                deadline: None,
                category: vec!["health".into(), "water".into()],
                social_media_links: vec!["https://x.com/well".into()],
            })
        })
        .unwrap();
        id
    }

    fn donation(campaign_id: &str, amount: i64) -> NewDonation {
        NewDonation {
            id: new_id(),
            campaign_id: campaign_id.to_string(),
            anonymous: false,
            name: Some("Chidi".into()),
            social_media_links: vec![],
            payment_reference: "PAY-1".into(),
            transaction_reference: "TX-1".into(),
            recovery_acct_no: "0123456789".into(),
            recovery_acct_bank: "Bank".into(),
            recovery_acct_name: "Chidi".into(),
            amount,
        }
    }

    #[test]
    fn duplicate_email_is_rejected_case_insensitively() {
        let db = Database::open_in_memory().unwrap();
        seed_user(&db, "a@b.com");

        let inserted = db
            .unit_of_work(|s| {
                s.create_user(&NewUser {
                    id: &new_id(),
                    email: "A@B.com",
                    first_name: "x",
                    last_name: "y",
                    gender: "male",
                    password_hash: "hash",
                })
            })
            .unwrap();
        assert!(!inserted);

        let found = db.unit_of_work(|s| s.get_user_by_email("A@b.COM")).unwrap();
        assert_eq!(found.unwrap().email, "a@b.com");
    }

    #[test]
    fn campaign_round_trips_lists_and_deadline() {
        let db = Database::open_in_memory().unwrap();
        let user = seed_user(&db, "a@b.com");
        let id = seed_campaign(&db, &user, 1000);

        let deadline = NaiveDate::from_ymd_opt(2030, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        db.unit_of_work(|s| {
            s.update_campaign(
                &id,
                &CampaignPatch {
                    deadline: Some(deadline),
                    ..Default::default()
                },
            )
        })
        .unwrap();

        let campaign = db.unit_of_work(|s| s.get_campaign(&id)).unwrap().unwrap();
        assert_eq!(campaign.category, vec!["health", "water"]);
        assert_eq!(campaign.deadline, Some(deadline));
        assert_eq!(campaign.amt_reached, 0);
        assert_eq!(campaign.no_of_supporters, 0);
        assert_eq!(campaign.no_of_reactions, 0);
    }

    #[test]
    fn patch_only_touches_present_fields() {
        let db = Database::open_in_memory().unwrap();
        let user = seed_user(&db, "a@b.com");
        let id = seed_campaign(&db, &user, 1000);

        db.unit_of_work(|s| {
            s.update_campaign(
                &id,
                &CampaignPatch {
                    goal: Some(2000),
                    ..Default::default()
                },
            )
        })
        .unwrap();

        let campaign = db.unit_of_work(|s| s.get_campaign(&id)).unwrap().unwrap();
        assert_eq!(campaign.goal, 2000);
        assert_eq!(campaign.title, "Clean water");
        assert_eq!(campaign.header_img, vec![1, 2, 3]);
    }

    #[test]
    fn donation_credits_campaign() {
        let db = Database::open_in_memory().unwrap();
        let user = seed_user(&db, "a@b.com");
        let id = seed_campaign(&db, &user, 1000);

        db.unit_of_work(|s| s.insert_donation(&donation(&id, 250))).unwrap();
        db.unit_of_work(|s| s.insert_donation(&donation(&id, 100))).unwrap();

        let campaign = db.unit_of_work(|s| s.get_campaign(&id)).unwrap().unwrap();
        assert_eq!(campaign.amt_reached, 350);
        assert_eq!(campaign.no_of_supporters, 2);
        assert_eq!(db.unit_of_work(|s| s.list_donations(&id)).unwrap().len(), 2);
    }

    #[test]
    fn second_reaction_is_ignored() {
        let db = Database::open_in_memory().unwrap();
        let user = seed_user(&db, "a@b.com");
        let id = seed_campaign(&db, &user, 1000);

        assert!(db.unit_of_work(|s| s.insert_campaign_reaction(&new_id(), &id, &user)).unwrap());
        assert!(!db.unit_of_work(|s| s.insert_campaign_reaction(&new_id(), &id, &user)).unwrap());
        assert!(db.unit_of_work(|s| s.campaign_reaction_exists(&id, &user)).unwrap());

        let campaign = db.unit_of_work(|s| s.get_campaign(&id)).unwrap().unwrap();
        assert_eq!(campaign.no_of_reactions, 1);
    }

    #[test]
    fn popular_orders_by_reactions_then_supporters() {
        let db = Database::open_in_memory().unwrap();
        let alice = seed_user(&db, "alice@b.com");
        let bob = seed_user(&db, "bob@b.com");

        let quiet = seed_campaign(&db, &alice, 10);
        let liked = seed_campaign(&db, &alice, 10);
        let liked_and_funded = seed_campaign(&db, &alice, 10);

        for campaign in [&liked, &liked_and_funded] {
            db.unit_of_work(|s| s.insert_campaign_reaction(&new_id(), campaign, &bob))
                .unwrap();
        }
        db.unit_of_work(|s| s.insert_donation(&donation(&liked_and_funded, 5))).unwrap();

        let ids: Vec<String> = db
            .unit_of_work(|s| s.list_popular_campaigns(10, 0))
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![liked_and_funded.clone(), liked, quiet]);

        let page = db.unit_of_work(|s| s.list_popular_campaigns(1, 0)).unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, liked_and_funded);
    }

    #[test]
    fn feed_post_media_keeps_order_and_is_replaced_wholesale() {
        let db = Database::open_in_memory().unwrap();
        let user = seed_user(&db, "a@b.com");
        let campaign = seed_campaign(&db, &user, 10);
        let post = new_id();

        db.unit_of_work(|s| s.insert_feed_post(&post, &campaign, &user, "hello", &[vec![1], vec![2], vec![3]]))
            .unwrap();
        let stored = db.unit_of_work(|s| s.get_feed_post(&post)).unwrap().unwrap();
        assert_eq!(stored.media, Some(vec![vec![1], vec![2], vec![3]]));

        db.unit_of_work(|s| s.update_feed_post(&post, None, Some(&[vec![9]]))).unwrap();
        let stored = db.unit_of_work(|s| s.get_feed_post(&post)).unwrap().unwrap();
        assert_eq!(stored.text, "hello");
        assert_eq!(stored.media, Some(vec![vec![9]]));

        let bare = new_id();
        db.unit_of_work(|s| s.insert_feed_post(&bare, &campaign, &user, "no media", &[]))
            .unwrap();
        let posts = db.unit_of_work(|s| s.list_feed_posts(&campaign)).unwrap();
        assert_eq!(posts.len(), 2);
        assert!(posts.iter().any(|p| p.id == bare && p.media.is_none()));
    }

    #[test]
    fn deleting_campaign_cascades_to_children() {
        let db = Database::open_in_memory().unwrap();
        let user = seed_user(&db, "a@b.com");
        let campaign = seed_campaign(&db, &user, 10);
        let post = new_id();

        db.unit_of_work(|s| {
            s.insert_feed_post(&post, &campaign, &user, "hello", &[vec![1]])?;
            s.insert_feed_post_reaction(&new_id(), &post, &user)?;
            s.insert_campaign_reaction(&new_id(), &campaign, &user)?;
            s.insert_donation(&donation(&campaign, 5))
        })
        .unwrap();

        assert!(db.unit_of_work(|s| s.delete_campaign(&campaign)).unwrap());

        let remaining: i64 = db
            .unit_of_work(|s| {
                let count = s.conn.query_row(
                    "SELECT (SELECT COUNT(*) FROM feed_posts) + (SELECT COUNT(*) FROM feed_post_media)
                          + (SELECT COUNT(*) FROM feed_post_reactions) + (SELECT COUNT(*) FROM campaign_reactions)
                          + (SELECT COUNT(*) FROM donations)",
                    [],
                    |row| row.get(0),
                )?;
                Ok::<_, anyhow::Error>(count)
            })
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[test]
    fn deleting_user_nulls_references() {
        let db = Database::open_in_memory().unwrap();
        let user = seed_user(&db, "a@b.com");
        let campaign = seed_campaign(&db, &user, 10);
        db.unit_of_work(|s| s.set_beneficiary(&campaign, &user)).unwrap();

        assert!(db.unit_of_work(|s| s.delete_user(&user)).unwrap());
        assert!(db.unit_of_work(|s| s.get_user_by_id(&user)).unwrap().is_none());

        let stored = db.unit_of_work(|s| s.get_campaign(&campaign)).unwrap().unwrap();
        assert_eq!(stored.creator_id, None);
        assert_eq!(stored.beneficiary_user_id, None);
    }

    #[test]
    fn failed_unit_of_work_rolls_back() {
        let db = Database::open_in_memory().unwrap();
        let user = seed_user(&db, "a@b.com");
        let campaign = seed_campaign(&db, &user, 10);

        let result: Result<()> = db.unit_of_work(|s| {
            s.insert_donation(&donation(&campaign, 50))?;
            anyhow::bail!("boom")
        });
        assert!(result.is_err());

        let stored = db.unit_of_work(|s| s.get_campaign(&campaign)).unwrap().unwrap();
        assert_eq!(stored.amt_reached, 0);
        assert_eq!(stored.no_of_supporters, 0);
    }
}
