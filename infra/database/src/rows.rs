use surrealdb::types::SurrealValue;

/// Row produced by `SELECT count() AS count FROM ... GROUP ALL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, SurrealValue)]
pub struct CountRow {
    pub count: i64,
}

impl CountRow {
    /// Total carried by an optional grouped row. No row means nothing matched.
    #[must_use]
    pub fn total(row: Option<Self>) -> u64 {
        row.map_or(0, |row| row.count.unsigned_abs())
    }
}
