// record.rs: Row representation and query shapes shared by every backend.
//
// A row is a JSON object. The `id` key is owned by the store: it is assigned
// on insert and cannot be patched. Everything else is schema-free; typed
// entities are converted with `record_from` / `from_record`.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::StoreError;

/// Store-assigned row identifier.
pub type RecordId = i64;

/// One stored row.
pub type Record = Map<String, Value>;

/// Name of the store-owned identifier column.
pub const ID: &str = "id";

/// Serialize a value into a row body. The value must serialize to an object.
pub fn record_from<T: Serialize + ?Sized>(value: &T) -> Result<Record, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Backend(format!(
            "row body must be a JSON object, got {other}"
        ))),
    }
}

/// Decode a row read from `table` into a typed entity.
pub fn from_record<T: DeserializeOwned>(table: &str, record: Record) -> Result<T, StoreError> {
    serde_json::from_value(Value::Object(record)).map_err(|e| StoreError::MalformedRow {
        table: table.to_string(),
        reason: e.to_string(),
    })
}

/// Reject column names that are not plain identifiers.
pub(crate) fn validate_column(column: &str) -> Result<(), StoreError> {
    let valid = !column.is_empty()
        && column
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidColumn(column.to_string()))
    }
}

/// One predicate of a [`Filter`]. All clauses of a filter must hold.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// `column == value`
    Eq(String, Value),
    /// `column` is one of `values`. An empty list matches nothing.
    In(String, Vec<Value>),
}

impl Clause {
    pub fn column(&self) -> &str {
        match self {
            Clause::Eq(column, _) | Clause::In(column, _) => column,
        }
    }
}

/// Conjunction of clauses. The default filter matches every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<Clause>,
}

impl Filter {
    /// Filter matching every row.
    pub fn all() -> Self {
        Self::default()
    }

    /// Add an equality clause.
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push(Clause::Eq(column.into(), value.into()));
        self
    }

    /// Add a membership clause.
    pub fn is_in<V: Into<Value>>(
        mut self,
        column: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.clauses.push(Clause::In(column.into(), values));
        self
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Evaluate the filter against an in-memory row.
    pub fn matches(&self, record: &Record) -> bool {
        self.clauses.iter().all(|clause| match clause {
            Clause::Eq(column, value) => record
                .get(column)
                .is_some_and(|field| values_equal(field, value)),
            Clause::In(column, values) => record
                .get(column)
                .is_some_and(|field| values.iter().any(|v| values_equal(field, v))),
        })
    }

    pub(crate) fn validate(&self) -> Result<(), StoreError> {
        self.clauses
            .iter()
            .try_for_each(|clause| validate_column(clause.column()))
    }
}

/// Sort key for a select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub descending: bool,
}

impl Order {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: false,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: true,
        }
    }
}

/// Filter, ordering and limit for [`crate::RecordStore::select`].
///
/// Without an explicit order, rows come back in insertion (id) order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filter: Filter,
    pub order: Vec<Order>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    pub fn order_by(mut self, order: Order) -> Self {
        self.order.push(order);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub(crate) fn validate(&self) -> Result<(), StoreError> {
        self.filter.validate()?;
        self.order
            .iter()
            .try_for_each(|order| validate_column(&order.column))
    }
}

/// Equality with numbers compared by value (`5` == `5.0`).
pub(crate) fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x == y,
            _ => x.as_f64() == y.as_f64(),
        },
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Record {
        record_from(&value).unwrap()
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(Filter::all().matches(&row(json!({"a": 1}))));
        assert!(Filter::all().matches(&Record::new()));
    }

    #[test]
    fn eq_clause_compares_numbers_by_value() {
        let filter = Filter::all().eq("goal_id", 7_i64);
        assert!(filter.matches(&row(json!({"goal_id": 7}))));
        assert!(filter.matches(&row(json!({"goal_id": 7.0}))));
        assert!(!filter.matches(&row(json!({"goal_id": 8}))));
        assert!(!filter.matches(&row(json!({"other": 7}))));
    }

    #[test]
    fn clauses_are_conjunctive() {
        let filter = Filter::all().eq("goal_id", 1).eq("status", "accepted");
        assert!(filter.matches(&row(json!({"goal_id": 1, "status": "accepted"}))));
        assert!(!filter.matches(&row(json!({"goal_id": 1, "status": "proposed"}))));
    }

    #[test]
    fn in_clause_with_empty_list_matches_nothing() {
        let filter = Filter::all().is_in("id", Vec::<i64>::new());
        assert!(!filter.matches(&row(json!({"id": 1}))));

        let filter = Filter::all().is_in("id", [1_i64, 3]);
        assert!(filter.matches(&row(json!({"id": 3}))));
        assert!(!filter.matches(&row(json!({"id": 2}))));
    }

    #[test]
    fn record_from_rejects_non_objects() {
        assert!(record_from(&json!([1, 2])).is_err());
        assert!(record_from(&json!({"ok": true})).is_ok());
    }

    #[test]
    fn from_record_reports_table_on_shape_mismatch() {
        #[derive(Debug, serde::Deserialize)]
        struct Needs {
            #[allow(dead_code)]
            name: String,
        }
        let err = from_record::<Needs>("goals", row(json!({"id": 1}))).unwrap_err();
        assert!(matches!(err, StoreError::MalformedRow { ref table, .. } if table == "goals"));
    }

    #[test]
    fn column_names_are_validated() {
        assert!(validate_column("plans_ids_id").is_ok());
        assert!(validate_column("").is_err());
        assert!(validate_column("a') OR 1=1 --").is_err());
        let query = Query::new(Filter::all()).order_by(Order::desc("created at"));
        assert!(matches!(query.validate(), Err(StoreError::InvalidColumn(_))));
    }
}
