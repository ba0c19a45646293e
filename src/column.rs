//! Schema hints for the storage layer.
//!
//! Protected values are opaque bytes, so every protected column is a binary
//! column. These lookups tell a schema generator what to call that column in
//! a given SQL dialect.

/// Generic kind of column a protected value needs.
pub fn preferred_column_kind() -> &'static str {
    "blob"
}

/// Concrete column type for a dialect, or `""` when the dialect is unknown.
pub fn dialect_column_type(dialect: &str) -> &'static str {
    match dialect {
        "bigquery" => "BYTES",
        "clickhouse" => "String",
        "mysql" => "BLOB",
        "postgres" => "BYTEA",
        "sqlite" => "BLOB",
        "sqlserver" => "varbinary(max)",
        _ => "",
    }
}

/// Implemented by values that are stored as a protected column.
pub trait StorageColumn {
    fn column_kind() -> &'static str {
        preferred_column_kind()
    }

    fn column_type(dialect: &str) -> &'static str {
        dialect_column_type(dialect)
    }
}
