// src/store/commands.rs
// CommandStore: the persisted mirror of the registry

use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::types::{CommandEntry, ListQuery, like_pattern};
use crate::error::{AdminError, AdminResult};

#[derive(Clone)]
pub struct CommandStore {
    pool: SqlitePool,
}

impl CommandStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Returns the row for `name`, inserting it with `app` when absent. An
    /// existing row keeps its app. The flag is true when a row was inserted.
    pub async fn get_or_create(&self, name: &str, app: &str) -> AdminResult<(CommandEntry, bool)> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO commands (name, app)
            VALUES (?, ?)
            ON CONFLICT(name) DO NOTHING
            "#,
        )
        .bind(name)
        .bind(app)
        .execute(&self.pool)
        .await?
        .rows_affected()
            > 0;

        let entry = sqlx::query_as::<_, CommandEntry>("SELECT id, name, app FROM commands WHERE name = ?")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;

        Ok((entry, inserted))
    }

    /// Deletes every row whose name is not in `keep`. Returns the number of
    /// rows removed.
    pub async fn delete_except(&self, keep: &[String]) -> AdminResult<u64> {
        if keep.is_empty() {
            let result = sqlx::query("DELETE FROM commands").execute(&self.pool).await?;
            return Ok(result.rows_affected());
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("DELETE FROM commands WHERE name NOT IN (");
        let mut separated = builder.separated(", ");
        for name in keep {
            separated.push_bind(name);
        }
        separated.push_unseparated(")");

        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    pub async fn list(&self, query: &ListQuery) -> AdminResult<Vec<CommandEntry>> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT id, name, app FROM commands WHERE 1 = 1");
        if let Some(app) = query.app_filter() {
            builder.push(" AND app = ").push_bind(app.to_string());
        }
        if let Some(term) = query.search() {
            let pattern = like_pattern(term);
            builder
                .push(" AND (app LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR name LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
        }
        builder.push(" ORDER BY app, name");

        let rows = builder
            .build_query_as::<CommandEntry>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn names(&self) -> AdminResult<Vec<String>> {
        let names = sqlx::query_scalar::<_, String>("SELECT name FROM commands ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(names)
    }

    /// Distinct apps, for the list filter.
    pub async fn apps(&self) -> AdminResult<Vec<String>> {
        let apps = sqlx::query_scalar::<_, String>("SELECT DISTINCT app FROM commands ORDER BY app")
            .fetch_all(&self.pool)
            .await?;
        Ok(apps)
    }

    pub async fn get(&self, id: i64) -> AdminResult<Option<CommandEntry>> {
        let entry = sqlx::query_as::<_, CommandEntry>("SELECT id, name, app FROM commands WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(entry)
    }

    pub async fn get_by_name(&self, name: &str) -> AdminResult<Option<CommandEntry>> {
        let entry = sqlx::query_as::<_, CommandEntry>("SELECT id, name, app FROM commands WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(entry)
    }

    pub async fn create(&self, name: &str, app: &str) -> AdminResult<CommandEntry> {
        let result = sqlx::query("INSERT INTO commands (name, app) VALUES (?, ?)")
            .bind(name)
            .bind(app)
            .execute(&self.pool)
            .await
            .map_err(|e| unique_violation(e, name))?;

        Ok(CommandEntry {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            app: app.to_string(),
        })
    }

    pub async fn update(&self, id: i64, name: &str, app: &str) -> AdminResult<CommandEntry> {
        let result = sqlx::query("UPDATE commands SET name = ?, app = ? WHERE id = ?")
            .bind(name)
            .bind(app)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| unique_violation(e, name))?;

        if result.rows_affected() == 0 {
            return Err(AdminError::not_found("Command", id));
        }

        Ok(CommandEntry {
            id,
            name: name.to_string(),
            app: app.to_string(),
        })
    }

    pub async fn delete(&self, id: i64) -> AdminResult<bool> {
        let result = sqlx::query("DELETE FROM commands WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count(&self) -> AdminResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM commands")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

fn unique_violation(err: sqlx::Error, name: &str) -> AdminError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => AdminError::Duplicate(name.to_string()),
        _ => AdminError::Database(err),
    }
}
