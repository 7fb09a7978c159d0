use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id          TEXT PRIMARY KEY,
                email       TEXT NOT NULL UNIQUE,
                first_name  TEXT NOT NULL,
                last_name   TEXT NOT NULL,
                gender      TEXT NOT NULL,
                password    TEXT NOT NULL,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE campaigns (
                id                  TEXT PRIMARY KEY,
                creator_id          TEXT REFERENCES users(id) ON DELETE SET NULL,
                beneficiary_user_id TEXT REFERENCES users(id) ON DELETE SET NULL,
                title               TEXT NOT NULL,
                header_img          BLOB NOT NULL,
                description         TEXT NOT NULL,
                story               TEXT NOT NULL,
                goal                INTEGER NOT NULL,
                amt_reached         INTEGER NOT NULL DEFAULT 0,
                deadline            TEXT,
                category            TEXT NOT NULL DEFAULT '[]',
                social_media_links  TEXT NOT NULL DEFAULT '[]',
                no_of_supporters    INTEGER NOT NULL DEFAULT 0,
                no_of_reactions     INTEGER NOT NULL DEFAULT 0,
                created_at          TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at          TEXT
            );

            CREATE INDEX idx_campaigns_creator ON campaigns(creator_id);
            CREATE INDEX idx_campaigns_popularity
                ON campaigns(no_of_reactions DESC, no_of_supporters DESC);

            CREATE TABLE donations (
                id                    TEXT PRIMARY KEY,
                campaign_id           TEXT NOT NULL REFERENCES campaigns(id) ON DELETE CASCADE,
                anonymous             INTEGER NOT NULL,
                name                  TEXT,
                social_media_links    TEXT NOT NULL DEFAULT '[]',
                payment_reference     TEXT NOT NULL,
                transaction_reference TEXT NOT NULL,
                recovery_acct_no      TEXT NOT NULL,
                recovery_acct_bank    TEXT NOT NULL,
                recovery_acct_name    TEXT NOT NULL,
                amount                INTEGER NOT NULL,
                created_at            TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_donations_campaign ON donations(campaign_id);

            CREATE TABLE feed_posts (
                id              TEXT PRIMARY KEY,
                campaign_id     TEXT NOT NULL REFERENCES campaigns(id) ON DELETE CASCADE,
                creator_id      TEXT REFERENCES users(id) ON DELETE SET NULL,
                text            TEXT NOT NULL,
                no_of_reactions INTEGER NOT NULL DEFAULT 0,
                created_at      TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at      TEXT
            );

            CREATE INDEX idx_feed_posts_campaign ON feed_posts(campaign_id, created_at);

            CREATE TABLE feed_post_media (
                feed_post_id TEXT NOT NULL REFERENCES feed_posts(id) ON DELETE CASCADE,
                position     INTEGER NOT NULL,
                data         BLOB NOT NULL,
                PRIMARY KEY (feed_post_id, position)
            );

            CREATE TABLE campaign_reactions (
                id          TEXT PRIMARY KEY,
                campaign_id TEXT NOT NULL REFERENCES campaigns(id) ON DELETE CASCADE,
                user_id     TEXT REFERENCES users(id) ON DELETE SET NULL,
                created_at  TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE(user_id, campaign_id)
            );

            CREATE TABLE feed_post_reactions (
                id           TEXT PRIMARY KEY,
                feed_post_id TEXT NOT NULL REFERENCES feed_posts(id) ON DELETE CASCADE,
                user_id      TEXT REFERENCES users(id) ON DELETE SET NULL,
                created_at   TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE(user_id, feed_post_id)
            );

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
