//! Small SQL string helpers shared by operation rendering and the engine.

/// Quote a string as a SQL literal, doubling embedded single quotes.
pub fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Render a comma-separated column list.
pub fn column_list(columns: &[String]) -> String {
    columns.join(", ")
}

#[cfg(test)]
#[path = "sql_utils_test.rs"]
mod tests;
