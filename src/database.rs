// src/database.rs
//! Database connection management and schema migrations.

use anyhow::{Context, Result};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::path::Path;
use tracing::info;

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if needed) the on-disk database and run migrations.
    pub async fn new(database_path: &Path) -> Result<Self> {
        if let Some(parent) = database_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create database directory")?;
        }

        let database_url = format!("sqlite:{}?mode=rwc", database_path.display());
        let pool = SqlitePool::connect(&database_url).await.with_context(|| {
            format!("Failed to connect to database: {}", database_path.display())
        })?;

        info!(
            "Database connection established: {}",
            database_path.display()
        );

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// In-memory database for tests. A single connection keeps every
    /// statement on the same store.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .context("Failed to open in-memory database")?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS seekers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                full_name TEXT NOT NULL,
                whatsapp_number TEXT,
                email TEXT,
                skill_type TEXT NOT NULL DEFAULT 'IT',
                skills TEXT NOT NULL DEFAULT '',
                experience INTEGER NOT NULL DEFAULT 0,
                location TEXT,
                current_ctc REAL,
                expected_ctc REAL,
                notice_period TEXT,
                last_working_date TEXT,
                resume TEXT,
                bio TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS providers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                company_name TEXT NOT NULL,
                hr_name TEXT NOT NULL,
                hr_whatsapp_number TEXT,
                email TEXT,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS admins (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT,
                whatsapp_number TEXT,
                email TEXT,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS jobs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                job_title TEXT NOT NULL,
                skill_type TEXT,
                skills TEXT NOT NULL DEFAULT '',
                experience_required INTEGER NOT NULL DEFAULT 0,
                location TEXT,
                max_ctc REAL,
                notice_period TEXT,
                available INTEGER NOT NULL DEFAULT 1,
                viewed INTEGER NOT NULL DEFAULT 0,
                posted_by INTEGER NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS applicants (
                job_id INTEGER NOT NULL,
                seeker_id INTEGER NOT NULL,
                applied_at TEXT NOT NULL,
                UNIQUE (job_id, seeker_id)
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS applied_jobs (
                seeker_id INTEGER NOT NULL,
                job_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                status TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE (seeker_id, job_id)
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        for statement in [
            "CREATE INDEX IF NOT EXISTS idx_seekers_whatsapp ON seekers(whatsapp_number);",
            "CREATE INDEX IF NOT EXISTS idx_seekers_email ON seekers(email);",
            "CREATE INDEX IF NOT EXISTS idx_providers_whatsapp ON providers(hr_whatsapp_number);",
            "CREATE INDEX IF NOT EXISTS idx_providers_email ON providers(email);",
            "CREATE INDEX IF NOT EXISTS idx_jobs_posted_by ON jobs(posted_by);",
            "CREATE INDEX IF NOT EXISTS idx_jobs_created_at ON jobs(created_at);",
            "CREATE INDEX IF NOT EXISTS idx_applicants_seeker ON applicants(seeker_id);",
        ] {
            sqlx::query(statement).execute(&self.pool).await?;
        }

        info!("Database migrations completed");
        Ok(())
    }

    /// Check database health
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("Database health check failed")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let db = Database::in_memory().await.unwrap();
        db.migrate().await.unwrap();
        db.health_check().await.unwrap();
    }
}
