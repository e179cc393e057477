pub mod analytics;
pub mod case;
pub mod court;
pub mod document;
pub mod judgment;
pub mod user;

use shared_types::AppError;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::error_convert::SqlxErrorExt;

/// Advance the `kind` counter of a court and return the new value.
///
/// The upsert holds the counter row lock until the surrounding transaction
/// ends, so concurrent creates in one court are serialized and a rolled-back
/// insert releases its number.
pub(crate) async fn next_sequence(
    conn: &mut PgConnection,
    court_id: Uuid,
    kind: &str,
) -> Result<i64, AppError> {
    sqlx::query_scalar(
        r#"
        INSERT INTO number_sequences (court_id, kind, last_value)
        VALUES ($1, $2, 1)
        ON CONFLICT (court_id, kind)
            DO UPDATE SET last_value = number_sequences.last_value + 1
        RETURNING last_value
        "#,
    )
    .bind(court_id)
    .bind(kind)
    .fetch_one(conn)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}
