// sqlite.rs: SqliteStore, a RecordStore backed by one SQLite file.
//
// Every logical table lives in a single physical table:
//
//   records(id INTEGER PRIMARY KEY AUTOINCREMENT, table_name TEXT, body TEXT)
//
// `body` is the row as a JSON object without its id. Filters and ordering on
// columns other than `id` go through `json_extract(body, '$.<column>')`, and
// updates merge the patch with `json_patch`. Ids are unique across all
// logical tables.
//
// Each call is one statement (inserts of several rows run in one local
// transaction so a single `insert` is all-or-nothing). There is deliberately
// no API for spanning calls.

use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection};
use serde_json::Value;

use crate::error::StoreError;
use crate::record::{Clause, Filter, Query, Record, RecordId, ID};
use crate::RecordStore;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS records (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        table_name TEXT NOT NULL,
        body TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS records_by_table ON records (table_name);
";

/// SQLite-backed record store.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a store at `path`.
    ///
    /// `timeout` bounds how long a statement waits on a locked database
    /// before failing with `SQLITE_BUSY`.
    pub fn open(path: impl AsRef<Path>, timeout: Duration) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::IoError {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let conn = Connection::open(path)?;
        tracing::debug!("opened record store at {}", path.display());
        Self::bootstrap(conn, timeout)
    }

    /// Open a private in-memory database.
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::bootstrap(Connection::open_in_memory()?, Duration::from_secs(5))
    }

    fn bootstrap(conn: Connection, timeout: Duration) -> Result<Self, StoreError> {
        conn.busy_timeout(timeout)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl RecordStore for SqliteStore {
    fn insert(&self, table: &str, rows: Vec<Record>) -> Result<Vec<Record>, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut inserted = Vec::with_capacity(rows.len());
        for mut row in rows {
            row.remove(ID);
            let body = serde_json::to_string(&row)?;
            tx.execute(
                "INSERT INTO records (table_name, body) VALUES (?1, ?2)",
                params![table, body],
            )?;
            row.insert(ID.to_string(), Value::from(tx.last_insert_rowid()));
            inserted.push(row);
        }
        tx.commit()?;
        Ok(inserted)
    }

    fn select(&self, table: &str, query: &Query) -> Result<Vec<Record>, StoreError> {
        query.validate()?;

        let mut sql = String::from("SELECT id, body FROM records WHERE table_name = ?");
        let mut args = vec![SqlValue::Text(table.to_string())];
        push_filter(&mut sql, &mut args, &query.filter);

        sql.push_str(" ORDER BY ");
        for order in &query.order {
            sql.push_str(&column_expr(&order.column));
            sql.push_str(if order.descending { " DESC, " } else { " ASC, " });
        }
        sql.push_str("id ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            args.push(SqlValue::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));
        }

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let raw = stmt
            .query_map(params_from_iter(args.iter()), |row| {
                Ok((row.get::<_, RecordId>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        raw.into_iter()
            .map(|(id, body)| {
                let mut record: Record =
                    serde_json::from_str(&body).map_err(|e| StoreError::MalformedRow {
                        table: table.to_string(),
                        reason: format!("row {id}: {e}"),
                    })?;
                record.insert(ID.to_string(), Value::from(id));
                Ok(record)
            })
            .collect()
    }

    fn update(&self, table: &str, filter: &Filter, mut patch: Record) -> Result<usize, StoreError> {
        filter.validate()?;
        patch.remove(ID);

        let mut sql =
            String::from("UPDATE records SET body = json_patch(body, ?) WHERE table_name = ?");
        let mut args = vec![
            SqlValue::Text(serde_json::to_string(&patch)?),
            SqlValue::Text(table.to_string()),
        ];
        push_filter(&mut sql, &mut args, filter);

        let conn = self.lock()?;
        let changed = conn.execute(&sql, params_from_iter(args.iter()))?;
        Ok(changed)
    }
}

/// SQL expression reading `column`. The column name is already validated.
fn column_expr(column: &str) -> String {
    if column == ID {
        "id".to_string()
    } else {
        format!("json_extract(body, '$.{column}')")
    }
}

fn push_filter(sql: &mut String, args: &mut Vec<SqlValue>, filter: &Filter) {
    for clause in filter.clauses() {
        match clause {
            Clause::Eq(column, value) => {
                sql.push_str(&format!(" AND {} IS ?", column_expr(column)));
                args.push(to_sql(value));
            }
            Clause::In(_, values) if values.is_empty() => sql.push_str(" AND 0"),
            Clause::In(column, values) => {
                let marks = vec!["?"; values.len()].join(", ");
                sql.push_str(&format!(" AND {} IN ({marks})", column_expr(column)));
                args.extend(values.iter().map(to_sql));
            }
        }
    }
}

/// Map a JSON value to what `json_extract` yields for it.
fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{record_from, Order};
    use serde_json::json;
    use tempfile::tempdir;

    fn row(value: Value) -> Record {
        record_from(&value).unwrap()
    }

    #[test]
    fn insert_and_select_round_trip() {
        let store = SqliteStore::in_memory().unwrap();
        let stored = store
            .insert(
                "tasks",
                vec![
                    row(json!({"goal_id": 1, "task": "cleaning", "point": 5})),
                    row(json!({"goal_id": 1, "task": "wash dishes", "point": 2})),
                ],
            )
            .unwrap();
        assert_eq!(stored.len(), 2);
        assert!(stored[0]["id"].as_i64().unwrap() < stored[1]["id"].as_i64().unwrap());

        let rows = store
            .select("tasks", &Query::new(Filter::all().eq("goal_id", 1)))
            .unwrap();
        assert_eq!(rows, stored);
    }

    #[test]
    fn tables_are_isolated() {
        let store = SqliteStore::in_memory().unwrap();
        store.insert_one("tasks_ids", row(json!({"ids": [1, 2]}))).unwrap();
        store.insert_one("plans_ids", row(json!({"ids": [3]}))).unwrap();

        let rows = store.select("plans_ids", &Query::default()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["ids"], json!([3]));
    }

    #[test]
    fn in_filter_on_id_and_empty_in() {
        let store = SqliteStore::in_memory().unwrap();
        let a = store.insert_one("plans", row(json!({"day": 1}))).unwrap();
        store.insert_one("plans", row(json!({"day": 2}))).unwrap();
        let c = store.insert_one("plans", row(json!({"day": 3}))).unwrap();

        let ids = [a["id"].clone(), c["id"].clone()];
        let rows = store
            .select("plans", &Query::new(Filter::all().is_in(ID, ids)))
            .unwrap();
        let days: Vec<_> = rows.iter().map(|r| r["day"].clone()).collect();
        assert_eq!(days, vec![json!(1), json!(3)]);

        let none = store
            .select("plans", &Query::new(Filter::all().is_in(ID, Vec::<i64>::new())))
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn order_and_limit() {
        let store = SqliteStore::in_memory().unwrap();
        for created in [30, 10, 20] {
            store
                .insert_one("goals", row(json!({"created_at": created})))
                .unwrap();
        }
        let query = Query::default()
            .order_by(Order::desc("created_at"))
            .limit(1);
        let rows = store.select("goals", &query).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["created_at"], json!(30));
    }

    #[test]
    fn update_merges_patch() {
        let store = SqliteStore::in_memory().unwrap();
        let goal = store
            .insert_one("goals", row(json!({"name": "computer", "status": "proposed"})))
            .unwrap();

        let filter = Filter::all().eq(ID, goal["id"].clone()).eq("status", "proposed");
        let changed = store
            .update("goals", &filter, row(json!({"status": "accepted"})))
            .unwrap();
        assert_eq!(changed, 1);

        // The conditional filter no longer matches.
        let changed = store
            .update("goals", &filter, row(json!({"status": "accepted"})))
            .unwrap();
        assert_eq!(changed, 0);

        let rows = store.select("goals", &Query::default()).unwrap();
        assert_eq!(rows[0]["name"], json!("computer"));
        assert_eq!(rows[0]["status"], json!("accepted"));
    }

    #[test]
    fn rejects_unsafe_column_names() {
        let store = SqliteStore::in_memory().unwrap();
        let err = store
            .select("goals", &Query::new(Filter::all().eq("x') OR 1=1 --", 1)))
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidColumn(_)));
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("planner.sqlite");

        {
            let store = SqliteStore::open(&path, Duration::from_millis(500)).unwrap();
            store.insert_one("progress", row(json!({"goal_id": 1, "day": 1, "total_points": 5})))
                .unwrap();
        }

        let store = SqliteStore::open(&path, Duration::from_millis(500)).unwrap();
        let rows = store.select("progress", &Query::default()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["total_points"], json!(5));
    }

    #[test]
    fn locked_database_fails_after_busy_timeout() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("planner.sqlite");
        let store = SqliteStore::open(&path, Duration::from_millis(200)).unwrap();

        let other = Connection::open(&path).unwrap();
        other.execute_batch("BEGIN EXCLUSIVE;").unwrap();

        let started = std::time::Instant::now();
        let err = store
            .insert_one("progress", row(json!({"goal_id": 1, "day": 1, "total_points": 5})))
            .unwrap_err();
        assert!(matches!(err, StoreError::Sqlite(_)), "unexpected error: {err}");
        assert!(started.elapsed() < Duration::from_secs(5));

        other.execute_batch("ROLLBACK;").unwrap();
        store
            .insert_one("progress", row(json!({"goal_id": 1, "day": 1, "total_points": 5})))
            .unwrap();
    }
}
