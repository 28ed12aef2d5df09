//! Filter rule storage repository.

use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::debug;

use super::model::{FilterRule, StoredRule};
use crate::Result;

/// Ordered, append-only rule store shared by the filter and the classifier.
#[derive(Clone)]
pub struct RuleRepository {
    pool: SqlitePool,
}

impl RuleRepository {
    /// Create a new repository with the given database path.
    ///
    /// Creates the database and tables if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn new(database_path: &str) -> Result<Self> {
        let url = format!("sqlite:{database_path}?mode=rwc");
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        let repo = Self { pool };
        repo.initialize().await?;
        Ok(repo)
    }

    /// Create an in-memory repository for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let repo = Self { pool };
        repo.initialize().await?;
        Ok(repo)
    }

    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS filter_rules (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                field TEXT NOT NULL,
                pattern TEXT NOT NULL,
                action TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Appends a rule and returns its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn append(&self, rule: &FilterRule) -> Result<i64> {
        self.append_raw(rule.field.as_str(), &rule.pattern, rule.action.as_str())
            .await
    }

    /// Appends a row without validation.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn append_raw(&self, field: &str, pattern: &str, action: &str) -> Result<i64> {
        let result = sqlx::query("INSERT INTO filter_rules (field, pattern, action) VALUES (?, ?, ?)")
            .bind(field)
            .bind(pattern)
            .bind(action)
            .execute(&self.pool)
            .await?;

        let id = result.last_insert_rowid();
        debug!(id, field, pattern, action, "filter rule appended");
        Ok(id)
    }

    /// Every rule in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn load_all(&self) -> Result<Vec<StoredRule>> {
        let rows = sqlx::query("SELECT id, field, pattern, action FROM filter_rules ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(row_to_rule).collect())
    }

    /// Alias of [`load_all`](Self::load_all) for listing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self) -> Result<Vec<StoredRule>> {
        self.load_all().await
    }

    /// Removes a rule. Returns false if no rule had that id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn remove(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM filter_rules WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_rule(row: &sqlx::sqlite::SqliteRow) -> StoredRule {
    StoredRule {
        id: row.get("id"),
        field: row.get("field"),
        pattern: row.get("pattern"),
        action: row.get("action"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::rules::{RuleAction, RuleField};

    #[tokio::test]
    async fn test_append_and_load_in_order() {
        let repo = RuleRepository::in_memory().await.unwrap();
        let first = repo
            .append(&FilterRule::new(RuleField::Sender, "newsletter@", RuleAction::Archive))
            .await
            .unwrap();
        let second = repo
            .append(&FilterRule::new(RuleField::Subject, "free money", RuleAction::Delete))
            .await
            .unwrap();
        assert!(second > first);

        let rules = repo.load_all().await.unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].pattern, "newsletter@");
        assert_eq!(rules[0].action, "ARCHIVE");
        assert_eq!(rules[1].field, "subject");
    }

    #[tokio::test]
    async fn test_remove() {
        let repo = RuleRepository::in_memory().await.unwrap();
        let id = repo.append_raw("sender", "x", "DELETE").await.unwrap();
        assert!(repo.remove(id).await.unwrap());
        assert!(!repo.remove(id).await.unwrap());
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_backed_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.db");
        let path = path.to_str().unwrap();

        let repo = RuleRepository::new(path).await.unwrap();
        repo.append_raw("body", "invoice", "REVIEW").await.unwrap();
        drop(repo);

        let reopened = RuleRepository::new(path).await.unwrap();
        assert_eq!(reopened.load_all().await.unwrap().len(), 1);
    }
}
