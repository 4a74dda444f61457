use crate::errors::{AppError, Result};
use crate::models::contact::{Contact, InquiryType, StatBucket};
use crate::models::newsletter::Subscriber;
use crate::models::user::User;
use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Process-wide database handle, set once by the HTTP server at startup.
pub static GLOBAL_DB: OnceCell<Arc<SqliteDatabase>> = OnceCell::new();

#[derive(Debug)]
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    pub async fn new(database_path: &str) -> Result<Self> {
        if let Some(parent) = Path::new(database_path).parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::DatabaseError(format!("Failed to create database directory: {}", e))
            })?;
        }

        if !Path::new(database_path).exists() {
            std::fs::File::create(database_path).map_err(|e| {
                AppError::DatabaseError(format!("Failed to create database file: {}", e))
            })?;
        }
        let database_url = format!("sqlite:{}", database_path);

        let pool = SqlitePool::connect(&database_url)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to connect to database: {}", e)))?;

        let db = Self { pool };
        db.create_tables().await?;

        info!(action = "database_connected", path = %database_path);
        Ok(db)
    }

    async fn create_tables(&self) -> Result<()> {
        let query = r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT,
                google_id TEXT,
                avatar_url TEXT,
                is_admin BOOLEAN DEFAULT FALSE,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS user_tokens (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                token_id TEXT UNIQUE NOT NULL,
                token_hash TEXT NOT NULL,
                created_at TEXT NOT NULL,
                expires_at TEXT NOT NULL,
                is_active BOOLEAN DEFAULT TRUE,
                FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS contacts (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                subject TEXT NOT NULL,
                message TEXT NOT NULL,
                city TEXT NOT NULL DEFAULT 'Unknown',
                region TEXT NOT NULL DEFAULT 'Unknown',
                inquiry_type TEXT NOT NULL DEFAULT 'General',
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS newsletter_subscribers (
                id TEXT PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                is_active BOOLEAN DEFAULT TRUE,
                subscribed_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_users_email ON users(email);
            CREATE INDEX IF NOT EXISTS idx_tokens_user_id ON user_tokens(user_id);
            CREATE INDEX IF NOT EXISTS idx_tokens_token_id ON user_tokens(token_id);
            CREATE INDEX IF NOT EXISTS idx_tokens_active ON user_tokens(is_active);
            CREATE INDEX IF NOT EXISTS idx_contacts_created_at ON contacts(created_at);
            CREATE INDEX IF NOT EXISTS idx_contacts_type ON contacts(inquiry_type);
            CREATE INDEX IF NOT EXISTS idx_subscribers_email ON newsletter_subscribers(email);
            CREATE INDEX IF NOT EXISTS idx_subscribers_active ON newsletter_subscribers(is_active);
        "#;

        sqlx::query(query)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to create tables: {}", e)))?;

        Ok(())
    }

    // ----- users -----

    pub async fn create_user(&self, user: &User) -> Result<()> {
        let query = r#"
            INSERT INTO users (id, name, email, password_hash, google_id, avatar_url, is_admin, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#;

        sqlx::query(query)
            .bind(user.id.to_string())
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.google_id)
            .bind(&user.avatar_url)
            .bind(user.is_admin)
            .bind(user.created_at.to_rfc3339())
            .bind(user.updated_at.to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if e.to_string().contains("UNIQUE constraint failed") {
                    AppError::Conflict("User already exists".to_string())
                } else {
                    AppError::DatabaseError(format!("Failed to create user: {}", e))
                }
            })?;

        Ok(())
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE email = ?1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to fetch user by email: {}", e)))?;

        row.map(|r| Self::row_to_user(&r)).transpose()
    }

    pub async fn get_user_by_id(&self, user_id: &Uuid) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?1")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to fetch user by id: {}", e)))?;

        row.map(|r| Self::row_to_user(&r)).transpose()
    }

    pub async fn set_user_admin(&self, user_id: &Uuid) -> Result<()> {
        sqlx::query("UPDATE users SET is_admin = TRUE, updated_at = ?1 WHERE id = ?2")
            .bind(Utc::now().to_rfc3339())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to promote user: {}", e)))?;
        Ok(())
    }

    pub async fn link_google_account(&self, user_id: &Uuid, google_id: &str) -> Result<()> {
        sqlx::query("UPDATE users SET google_id = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(google_id)
            .bind(Utc::now().to_rfc3339())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to link Google account: {}", e)))?;
        Ok(())
    }

    fn row_to_user(row: &SqliteRow) -> Result<User> {
        Ok(User {
            id: Uuid::parse_str(&row.get::<String, _>("id"))
                .map_err(|e| AppError::DatabaseError(format!("Invalid user ID: {}", e)))?,
            name: row.get("name"),
            email: row.get("email"),
            password_hash: row.get("password_hash"),
            google_id: row.get("google_id"),
            avatar_url: row.get("avatar_url"),
            is_admin: row.get("is_admin"),
            created_at: Self::parse_timestamp(&row.get::<String, _>("created_at"))?,
            updated_at: Self::parse_timestamp(&row.get::<String, _>("updated_at"))?,
        })
    }

    // ----- issued-token registry -----

    pub async fn store_user_token(
        &self,
        user_id: &Uuid,
        token_id: &str,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        let query = r#"
            INSERT INTO user_tokens (user_id, token_id, token_hash, created_at, expires_at, is_active)
            VALUES (?1, ?2, ?3, ?4, ?5, TRUE)
        "#;

        sqlx::query(query)
            .bind(user_id.to_string())
            .bind(token_id)
            .bind(token_hash)
            .bind(Utc::now().to_rfc3339())
            .bind(expires_at.to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to store token: {}", e)))?;
        Ok(())
    }

    pub async fn is_token_valid(&self, token_id: &str) -> Result<bool> {
        let row = sqlx::query("SELECT expires_at, is_active FROM user_tokens WHERE token_id = ?1")
            .bind(token_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to look up token: {}", e)))?;

        let Some(row) = row else {
            return Ok(false);
        };
        if !row.get::<bool, _>("is_active") {
            return Ok(false);
        }
        let expires_at = Self::parse_timestamp(&row.get::<String, _>("expires_at"))?;
        Ok(expires_at > Utc::now())
    }

    pub async fn revoke_token(&self, token_id: &str) -> Result<()> {
        sqlx::query("UPDATE user_tokens SET is_active = FALSE WHERE token_id = ?1")
            .bind(token_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to revoke token: {}", e)))?;
        Ok(())
    }

    pub async fn revoke_all_user_tokens(&self, user_id: &Uuid) -> Result<()> {
        sqlx::query("UPDATE user_tokens SET is_active = FALSE WHERE user_id = ?1")
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to revoke user tokens: {}", e)))?;
        Ok(())
    }

    pub async fn cleanup_expired_tokens(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM user_tokens WHERE expires_at < ?1")
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to clean up tokens: {}", e)))?;
        Ok(result.rows_affected())
    }

    pub async fn count_active_user_tokens(&self, user_id: &Uuid) -> Result<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS count FROM user_tokens WHERE user_id = ?1 AND is_active = TRUE",
        )
        .bind(user_id.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to count tokens: {}", e)))?;
        Ok(row.get("count"))
    }

    // ----- contacts -----

    pub async fn create_contact(&self, contact: &Contact) -> Result<()> {
        let query = r#"
            INSERT INTO contacts (id, name, email, subject, message, city, region, inquiry_type, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#;

        sqlx::query(query)
            .bind(contact.id.to_string())
            .bind(&contact.name)
            .bind(&contact.email)
            .bind(&contact.subject)
            .bind(&contact.message)
            .bind(&contact.city)
            .bind(&contact.region)
            .bind(contact.inquiry_type.as_str())
            .bind(contact.created_at.to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to create contact: {}", e)))?;
        Ok(())
    }

    pub async fn list_contacts(&self) -> Result<Vec<Contact>> {
        let rows = sqlx::query("SELECT * FROM contacts ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to fetch contacts: {}", e)))?;

        rows.iter().map(Self::row_to_contact).collect()
    }

    pub async fn count_contacts(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM contacts")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to count contacts: {}", e)))?;
        Ok(row.get("count"))
    }

    pub async fn contact_stats_by_type(&self) -> Result<Vec<StatBucket>> {
        self.group_counts("SELECT inquiry_type AS key, COUNT(*) AS count FROM contacts GROUP BY inquiry_type")
            .await
    }

    pub async fn contact_stats_by_region(&self) -> Result<Vec<StatBucket>> {
        self.group_counts("SELECT region AS key, COUNT(*) AS count FROM contacts GROUP BY region")
            .await
    }

    pub async fn contact_stats_by_city(&self) -> Result<Vec<StatBucket>> {
        self.group_counts("SELECT city AS key, COUNT(*) AS count FROM contacts GROUP BY city")
            .await
    }

    async fn group_counts(&self, query: &str) -> Result<Vec<StatBucket>> {
        let rows = sqlx::query(query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to aggregate contacts: {}", e)))?;

        Ok(rows
            .iter()
            .map(|row| StatBucket {
                key: row.get("key"),
                count: row.get("count"),
            })
            .collect())
    }

    fn row_to_contact(row: &SqliteRow) -> Result<Contact> {
        Ok(Contact {
            id: Uuid::parse_str(&row.get::<String, _>("id"))
                .map_err(|e| AppError::DatabaseError(format!("Invalid contact ID: {}", e)))?,
            name: row.get("name"),
            email: row.get("email"),
            subject: row.get("subject"),
            message: row.get("message"),
            city: row.get("city"),
            region: row.get("region"),
            inquiry_type: InquiryType::parse(row.get("inquiry_type"))
                .map_err(|e| AppError::DatabaseError(format!("Invalid inquiry type: {}", e)))?,
            created_at: Self::parse_timestamp(&row.get::<String, _>("created_at"))?,
        })
    }

    // ----- newsletter -----

    pub async fn create_subscriber(&self, subscriber: &Subscriber) -> Result<()> {
        let query = r#"
            INSERT INTO newsletter_subscribers (id, email, is_active, subscribed_at)
            VALUES (?1, ?2, ?3, ?4)
        "#;

        sqlx::query(query)
            .bind(subscriber.id.to_string())
            .bind(&subscriber.email)
            .bind(subscriber.is_active)
            .bind(subscriber.subscribed_at.to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if e.to_string().contains("UNIQUE constraint failed") {
                    AppError::Conflict("Email already subscribed".to_string())
                } else {
                    AppError::DatabaseError(format!("Failed to create subscriber: {}", e))
                }
            })?;
        Ok(())
    }

    pub async fn get_subscriber_by_email(&self, email: &str) -> Result<Option<Subscriber>> {
        let row = sqlx::query("SELECT * FROM newsletter_subscribers WHERE email = ?1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to fetch subscriber: {}", e)))?;

        row.map(|r| Self::row_to_subscriber(&r)).transpose()
    }

    pub async fn list_active_subscribers(&self) -> Result<Vec<Subscriber>> {
        let rows = sqlx::query(
            "SELECT * FROM newsletter_subscribers WHERE is_active = TRUE ORDER BY subscribed_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to fetch subscribers: {}", e)))?;

        rows.iter().map(Self::row_to_subscriber).collect()
    }

    /// Returns false when no row matches the email; nothing is created.
    pub async fn deactivate_subscriber(&self, email: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE newsletter_subscribers SET is_active = FALSE WHERE email = ?1",
        )
        .bind(email)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to unsubscribe: {}", e)))?;
        Ok(result.rows_affected() > 0)
    }

    fn row_to_subscriber(row: &SqliteRow) -> Result<Subscriber> {
        Ok(Subscriber {
            id: Uuid::parse_str(&row.get::<String, _>("id"))
                .map_err(|e| AppError::DatabaseError(format!("Invalid subscriber ID: {}", e)))?,
            email: row.get("email"),
            is_active: row.get("is_active"),
            subscribed_at: Self::parse_timestamp(&row.get::<String, _>("subscribed_at"))?,
        })
    }

    fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| AppError::DatabaseError(format!("Invalid timestamp: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn test_db() -> (TempDir, SqliteDatabase) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("test.db");
        let db = SqliteDatabase::new(path.to_str().unwrap()).await.expect("db");
        (dir, db)
    }

    fn contact(subject: &str, inquiry_type: InquiryType, region: &str, city: &str) -> Contact {
        Contact {
            id: Uuid::new_v4(),
            name: "Asha Rao".to_string(),
            email: "asha@example.com".to_string(),
            subject: subject.to_string(),
            message: "Hello".to_string(),
            city: city.to_string(),
            region: region.to_string(),
            inquiry_type,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let (_dir, db) = test_db().await;
        let first = User::new("A", "dup@example.com", Some("hash".into()));
        let second = User::new("B", "dup@example.com", Some("hash".into()));

        db.create_user(&first).await.expect("first insert");
        let err = db.create_user(&second).await.expect_err("second insert");
        assert!(matches!(err, AppError::Conflict(_)));

        let found = db.get_user_by_email("dup@example.com").await.unwrap();
        assert_eq!(found.unwrap().name, "A");
    }

    #[tokio::test]
    async fn token_registry_validates_and_revokes() {
        let (_dir, db) = test_db().await;
        let user = User::new("A", "a@example.com", Some("hash".into()));
        db.create_user(&user).await.unwrap();

        let expires = Utc::now() + chrono::Duration::days(30);
        db.store_user_token(&user.id, "jti-1", "hash-1", expires)
            .await
            .unwrap();

        assert!(db.is_token_valid("jti-1").await.unwrap());
        assert!(!db.is_token_valid("jti-unknown").await.unwrap());

        db.revoke_token("jti-1").await.unwrap();
        assert!(!db.is_token_valid("jti-1").await.unwrap());
    }

    #[tokio::test]
    async fn expired_tokens_do_not_validate() {
        let (_dir, db) = test_db().await;
        let user = User::new("A", "a@example.com", Some("hash".into()));
        db.create_user(&user).await.unwrap();

        let expired = Utc::now() - chrono::Duration::hours(1);
        db.store_user_token(&user.id, "jti-old", "hash", expired)
            .await
            .unwrap();

        assert!(!db.is_token_valid("jti-old").await.unwrap());
        assert_eq!(db.cleanup_expired_tokens().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn stats_buckets_sum_to_total() {
        let (_dir, db) = test_db().await;
        for _ in 0..3 {
            db.create_contact(&contact("b", InquiryType::Business, "Maharashtra", "Mumbai"))
                .await
                .unwrap();
        }
        for _ in 0..2 {
            db.create_contact(&contact("g", InquiryType::General, "Karnataka", "Bengaluru"))
                .await
                .unwrap();
        }

        let total = db.count_contacts().await.unwrap();
        assert_eq!(total, 5);

        let by_type = db.contact_stats_by_type().await.unwrap();
        assert_eq!(by_type.len(), 2);
        assert_eq!(by_type.iter().map(|b| b.count).sum::<i64>(), total);

        let business = by_type.iter().find(|b| b.key == "Business").unwrap();
        assert_eq!(business.count, 3);
        let general = by_type.iter().find(|b| b.key == "General").unwrap();
        assert_eq!(general.count, 2);
    }

    #[tokio::test]
    async fn unsubscribe_unknown_email_touches_nothing() {
        let (_dir, db) = test_db().await;
        assert!(!db.deactivate_subscriber("ghost@example.com").await.unwrap());
        assert!(db
            .get_subscriber_by_email("ghost@example.com")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn unsubscribe_flips_active_flag() {
        let (_dir, db) = test_db().await;
        let sub = Subscriber::new("reader@example.com");
        db.create_subscriber(&sub).await.unwrap();
        assert_eq!(db.list_active_subscribers().await.unwrap().len(), 1);

        assert!(db.deactivate_subscriber("reader@example.com").await.unwrap());
        assert!(db.list_active_subscribers().await.unwrap().is_empty());

        // Row survives, so a second subscribe still conflicts.
        let err = db
            .create_subscriber(&Subscriber::new("reader@example.com"))
            .await
            .expect_err("resubscribe");
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
