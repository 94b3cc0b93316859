// memory.rs: MemoryStore, an in-process RecordStore.
//
// Tables are vectors of rows behind one mutex. Ids are assigned per table,
// starting at 1, in insertion order, so the default select order (by id) is
// insertion order.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use serde_json::Value;

use crate::error::StoreError;
use crate::record::{Filter, Query, Record, RecordId, ID};
use crate::RecordStore;

#[derive(Default)]
struct Table {
    next_id: RecordId,
    rows: Vec<Record>,
}

/// Mutex-guarded in-memory tables.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<String, Table>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Table>>, StoreError> {
        self.tables.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl RecordStore for MemoryStore {
    fn insert(&self, table: &str, rows: Vec<Record>) -> Result<Vec<Record>, StoreError> {
        let mut tables = self.lock()?;
        let table = tables.entry(table.to_string()).or_default();
        let mut inserted = Vec::with_capacity(rows.len());
        for mut row in rows {
            table.next_id += 1;
            row.insert(ID.to_string(), Value::from(table.next_id));
            table.rows.push(row.clone());
            inserted.push(row);
        }
        Ok(inserted)
    }

    fn select(&self, table: &str, query: &Query) -> Result<Vec<Record>, StoreError> {
        query.validate()?;
        let tables = self.lock()?;
        let Some(table) = tables.get(table) else {
            return Ok(Vec::new());
        };

        let mut rows: Vec<Record> = table
            .rows
            .iter()
            .filter(|row| query.filter.matches(row))
            .cloned()
            .collect();

        if !query.order.is_empty() {
            // Stable sort keeps insertion order among equal keys.
            rows.sort_by(|a, b| {
                query
                    .order
                    .iter()
                    .map(|order| {
                        let ord = compare_fields(a.get(&order.column), b.get(&order.column));
                        if order.descending {
                            ord.reverse()
                        } else {
                            ord
                        }
                    })
                    .find(|ord| *ord != Ordering::Equal)
                    .unwrap_or(Ordering::Equal)
            });
        }

        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    fn update(&self, table: &str, filter: &Filter, patch: Record) -> Result<usize, StoreError> {
        filter.validate()?;
        let mut tables = self.lock()?;
        let Some(table) = tables.get_mut(table) else {
            return Ok(0);
        };

        let mut changed = 0;
        for row in table.rows.iter_mut().filter(|row| filter.matches(row)) {
            // Top-level merge patch: null removes the key.
            for (key, value) in &patch {
                if key == ID {
                    continue;
                }
                if value.is_null() {
                    row.remove(key);
                } else {
                    row.insert(key.clone(), value.clone());
                }
            }
            changed += 1;
        }
        Ok(changed)
    }
}

/// Order two optional fields. Missing sorts first, like SQL NULL ascending.
fn compare_fields(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => compare_values(a, b),
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => x
                .as_f64()
                .partial_cmp(&y.as_f64())
                .unwrap_or(Ordering::Equal),
        },
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        _ => a.to_string().cmp(&b.to_string()),
    }
}
