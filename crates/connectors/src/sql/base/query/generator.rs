use crate::sql::base::table::{TableRef, quote_identifier};
use model::transform::mapping::{destination_columns, source_columns};

/// Source column holding the owner of an operation.
pub const USER_COLUMN: &str = "user_id";

/// Source column the cutoff is compared against.
pub const TIME_COLUMN: &str = "operation_time";

/// Builds the statements of the migration from the field mapping, so the
/// projection and the insert column list can never drift apart.
pub struct QueryGenerator;

impl QueryGenerator {
    /// `$1` is the user identifier, `$2` the cutoff (`timestamptz`).
    pub fn select_operations(table: &TableRef) -> String {
        let projection = source_columns()
            .map(quote_identifier)
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "SELECT {projection} FROM {table} WHERE {user} = $1 AND {time} < $2 ORDER BY {time} DESC",
            table = table.quoted(),
            user = quote_identifier(USER_COLUMN),
            time = quote_identifier(TIME_COLUMN),
        )
    }

    /// Single-row insert; parameters follow [`destination_columns`] order.
    pub fn insert_transaction(table: &TableRef) -> String {
        let columns = destination_columns();
        let column_list = columns
            .iter()
            .map(|c| quote_identifier(c))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = (1..=columns.len())
            .map(|i| format!("${i}"))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "INSERT INTO {} ({column_list}) VALUES ({placeholders})",
            table.quoted()
        )
    }
}
