use std::path::PathBuf;
use std::sync::Arc;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use mb_core::{Article, ArticleStorage, Brief, BriefingStorage, Error, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqliteRow};
use sqlx::Row;
use crate::StorageBackend;
use super::window_start;

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS articles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        url TEXT UNIQUE NOT NULL,
        title TEXT NOT NULL,
        source TEXT NOT NULL,
        published_at TEXT NOT NULL,
        summary TEXT,
        embedding TEXT,
        impact_rating INTEGER,
        profile TEXT NOT NULL,
        created_at TEXT DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS briefings (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        content TEXT NOT NULL,
        article_ids TEXT NOT NULL,
        profile TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_articles_profile_published ON articles (profile, published_at)",
    "CREATE INDEX IF NOT EXISTS idx_briefings_profile_created ON briefings (profile, created_at)",
];

/// Timestamps are stored as fixed-width UTC RFC 3339 so text comparison orders them.
fn to_db_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn from_db_time(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::Database(format!("Failed to parse date '{}': {}", raw, e)))
}

fn column<'r, T>(row: &'r SqliteRow, name: &str) -> Result<T>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(name)
        .map_err(|e| Error::Database(format!("Failed to read column {}: {}", name, e)))
}

fn row_to_article(row: &SqliteRow) -> Result<Article> {
    let id: i64 = column(row, "id")?;
    let embedding = column::<Option<String>>(row, "embedding")?.and_then(|raw| {
        match serde_json::from_str::<Vec<f32>>(&raw) {
            Ok(embedding) => Some(embedding),
            Err(e) => {
                tracing::warn!("⚠️ Ignoring malformed embedding of article {}: {}", id, e);
                None
            }
        }
    });

    Ok(Article {
        id,
        url: column(row, "url")?,
        title: column(row, "title")?,
        source: column(row, "source")?,
        published_at: from_db_time(&column::<String>(row, "published_at")?)?,
        summary: column(row, "summary")?,
        embedding,
        impact_rating: column(row, "impact_rating")?,
        profile: column(row, "profile")?,
    })
}

fn row_to_brief(row: &SqliteRow) -> Result<Brief> {
    let article_ids: Vec<i64> = serde_json::from_str(&column::<String>(row, "article_ids")?)?;
    Ok(Brief {
        id: column(row, "id")?,
        profile: column(row, "profile")?,
        content: column(row, "content")?,
        article_ids,
        created_at: from_db_time(&column::<String>(row, "created_at")?)?,
    })
}

pub struct SQLiteStorage {
    pool: Arc<SqlitePool>,
}

#[async_trait]
impl StorageBackend for SQLiteStorage {
    fn get_error_message() -> &'static str {
        "SQLite database should be available at ./meridian.db"
    }

    async fn new() -> Result<Self> {
        let db_path = PathBuf::from("meridian.db");
        Self::new_with_path(&db_path).await
    }
}

impl SQLiteStorage {
    pub async fn new_with_path(db_path: &PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| Error::Database(format!("Failed to connect to database: {}", e)))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| Error::Database(format!("Failed to run migration {}: {}", i, e)))?;
        }

        tracing::info!("🏦 Connected to SQLite database at {}", db_path.display());

        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

#[async_trait]
impl ArticleStorage for SQLiteStorage {
    async fn store_article(&self, article: &Article) -> Result<i64> {
        let embedding = article
            .embedding
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let row = sqlx::query(
            r#"
            INSERT INTO articles (url, title, source, published_at, summary, embedding, impact_rating, profile)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(url) DO UPDATE SET
                title = excluded.title,
                source = excluded.source,
                published_at = excluded.published_at,
                summary = excluded.summary,
                embedding = excluded.embedding,
                impact_rating = excluded.impact_rating,
                profile = excluded.profile
            RETURNING id
            "#,
        )
        .bind(&article.url)
        .bind(&article.title)
        .bind(&article.source)
        .bind(to_db_time(article.published_at))
        .bind(article.summary.as_deref())
        .bind(embedding)
        .bind(article.impact_rating)
        .bind(&article.profile)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to store article: {}", e)))?;

        column(&row, "id")
    }

    async fn fetch_eligible_articles(&self, profile: &str, lookback_hours: u32) -> Result<Vec<Article>> {
        let now = Utc::now();
        let rows = sqlx::query(
            r#"
            SELECT * FROM articles
            WHERE profile = ?
              AND summary IS NOT NULL
              AND embedding IS NOT NULL
              AND embedding != '[]'
              AND published_at >= ?
              AND published_at <= ?
            ORDER BY impact_rating DESC, published_at DESC
            "#,
        )
        .bind(profile)
        .bind(to_db_time(window_start(now, lookback_hours)))
        .bind(to_db_time(now))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to fetch articles for briefing: {}", e)))?;

        rows.iter().map(row_to_article).collect()
    }
}

#[async_trait]
impl BriefingStorage for SQLiteStorage {
    async fn persist_brief(&self, content: &str, article_ids: &[i64], profile: &str) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO briefings (content, article_ids, profile, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(content)
        .bind(serde_json::to_string(article_ids)?)
        .bind(profile)
        .bind(to_db_time(Utc::now()))
        .execute(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to save brief: {}", e)))?;

        Ok(result.last_insert_rowid())
    }

    async fn get_brief(&self, id: i64) -> Result<Option<Brief>> {
        let row = sqlx::query("SELECT * FROM briefings WHERE id = ?")
            .bind(id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to get brief {}: {}", id, e)))?;

        row.as_ref().map(row_to_brief).transpose()
    }

    async fn recent_briefings(&self, profile: &str, limit: usize) -> Result<Vec<Brief>> {
        let rows = sqlx::query(
            "SELECT * FROM briefings WHERE profile = ? ORDER BY created_at DESC, id DESC LIMIT ?",
        )
        .bind(profile)
        .bind(limit as i64)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to list briefings: {}", e)))?;

        rows.iter().map(row_to_brief).collect()
    }

    async fn briefings_since(&self, profile: &str, since: DateTime<Utc>) -> Result<Vec<Brief>> {
        let rows = sqlx::query(
            "SELECT * FROM briefings WHERE profile = ? AND created_at >= ? ORDER BY created_at DESC, id DESC",
        )
        .bind(profile)
        .bind(to_db_time(since))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to list briefings: {}", e)))?;

        rows.iter().map(row_to_brief).collect()
    }
}
