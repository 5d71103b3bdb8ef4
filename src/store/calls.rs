// src/store/calls.rs
// CallStore: append-only execution log

use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::types::{CallRecord, CallRow, ListQuery, NewCall, like_pattern};
use crate::error::{AdminError, AdminResult};

const CALL_COLUMNS: &str = "id, app, name, stdout, status, error, started_at, finished_at";

#[derive(Clone)]
pub struct CallStore {
    pool: SqlitePool,
}

impl CallStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, call: NewCall) -> AdminResult<CallRecord> {
        let result = sqlx::query(
            r#"
            INSERT INTO calls (app, name, stdout, status, error, started_at, finished_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&call.app)
        .bind(&call.name)
        .bind(&call.stdout)
        .bind(call.status.as_str())
        .bind(&call.error)
        .bind(call.started_at)
        .bind(call.finished_at)
        .execute(&self.pool)
        .await?;

        Ok(CallRecord {
            id: result.last_insert_rowid(),
            app: call.app,
            name: call.name,
            stdout: call.stdout,
            status: call.status,
            error: call.error,
            started_at: call.started_at,
            finished_at: call.finished_at,
        })
    }

    pub async fn get(&self, id: i64) -> AdminResult<Option<CallRecord>> {
        let row = sqlx::query_as::<_, CallRow>(&format!("SELECT {CALL_COLUMNS} FROM calls WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(CallRecord::from))
    }

    pub async fn require(&self, id: i64) -> AdminResult<CallRecord> {
        self.get(id).await?.ok_or_else(|| AdminError::not_found("Call", id))
    }

    /// Newest first.
    pub async fn list(&self, query: &ListQuery, limit: i64) -> AdminResult<Vec<CallRecord>> {
        self.page(query, limit, 0).await
    }

    /// Newest first, skipping the `offset` newest matches.
    pub async fn page(&self, query: &ListQuery, limit: i64, offset: i64) -> AdminResult<Vec<CallRecord>> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {CALL_COLUMNS} FROM calls WHERE 1 = 1"));
        push_filters(&mut builder, query);
        builder
            .push(" ORDER BY id DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let rows = builder.build_query_as::<CallRow>().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(CallRecord::from).collect())
    }

    pub async fn count_matching(&self, query: &ListQuery) -> AdminResult<i64> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM calls WHERE 1 = 1");
        push_filters(&mut builder, query);
        let count = builder.build_query_scalar::<i64>().fetch_one(&self.pool).await?;
        Ok(count)
    }

    pub async fn apps(&self) -> AdminResult<Vec<String>> {
        let apps = sqlx::query_scalar::<_, String>("SELECT DISTINCT app FROM calls ORDER BY app")
            .fetch_all(&self.pool)
            .await?;
        Ok(apps)
    }

    pub async fn count(&self) -> AdminResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM calls")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn count_for(&self, name: &str) -> AdminResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM calls WHERE name = ?")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, query: &ListQuery) {
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::db::memory_pool;
    use crate::store::types::CallStatus;
    use chrono::{Duration, Utc};

    fn new_call(name: &str, app: &str) -> NewCall {
        let started_at = Utc::now();
        NewCall {
            app: app.to_string(),
            name: name.to_string(),
            stdout: format!("{name} done\n"),
            status: CallStatus::Succeeded,
            error: None,
            started_at,
            finished_at: started_at + Duration::milliseconds(250),
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = CallStore::new(memory_pool().await.unwrap());
        let created = store.create(new_call("clear_cache", "cache")).await.unwrap();

        let fetched = store.require(created.id).await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.duration(), Duration::milliseconds(250));
        assert!(fetched.succeeded());

        assert!(matches!(store.require(created.id + 1).await, Err(AdminError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_failed_call_keeps_error() {
        let store = CallStore::new(memory_pool().await.unwrap());
        let mut call = new_call("migrate", "db");
        call.status = CallStatus::Failed;
        call.error = Some("lock timeout".into());
        let created = store.create(call).await.unwrap();

        let fetched = store.require(created.id).await.unwrap();
        assert_eq!(fetched.status, CallStatus::Failed);
        assert_eq!(fetched.error.as_deref(), Some("lock timeout"));
    }

    #[tokio::test]
    async fn test_list_newest_first_with_filters() {
        let store = CallStore::new(memory_pool().await.unwrap());
        store.create(new_call("clear_cache", "cache")).await.unwrap();
        store.create(new_call("rebuild_index", "search")).await.unwrap();
        store.create(new_call("clear_cache", "cache")).await.unwrap();

        let all = store.list(&ListQuery::default(), 100).await.unwrap();
        assert_eq!(all.len(), 3);
        assert!(all[0].id > all[1].id && all[1].id > all[2].id);

        let limited = store.list(&ListQuery::default(), 2).await.unwrap();
        assert_eq!(limited.len(), 2);
        let rest = store.page(&ListQuery::default(), 2, 2).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].id, all[2].id);

        let cache = store
            .list(&ListQuery { app: Some("cache".into()), q: None }, 100)
            .await
            .unwrap();
        assert_eq!(cache.len(), 2);

        let searched = store
            .list(&ListQuery { app: None, q: Some("index".into()) }, 100)
            .await
            .unwrap();
        assert_eq!(searched.len(), 1);

        let cache_query = ListQuery { app: Some("cache".into()), q: None };
        assert_eq!(store.count_matching(&cache_query).await.unwrap(), 2);
        assert_eq!(store.count_matching(&ListQuery::default()).await.unwrap(), 3);

        assert_eq!(store.count_for("clear_cache").await.unwrap(), 2);
        assert_eq!(store.apps().await.unwrap(), vec!["cache", "search"]);
    }
}
