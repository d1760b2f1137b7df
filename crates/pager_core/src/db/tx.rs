use log::{debug, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::time::Instant;

/// Runs `body` inside one immediate transaction.
///
/// Commits when `body` returns `Ok`. On `Err` the transaction is rolled back
/// and the body's error is returned; a rollback failure is logged and the
/// original error still wins.
///
/// # Errors
/// - Errors from `body`, unchanged.
/// - SQLite errors from `BEGIN` or `COMMIT`, converted through `From`.
pub fn with_transaction<T, E, F>(conn: &mut Connection, body: F) -> Result<T, E>
where
    F: FnOnce(&Transaction<'_>) -> Result<T, E>,
    E: From<rusqlite::Error> + std::fmt::Display,
{
    let started_at = Instant::now();
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    match body(&tx) {
        Ok(value) => {
            tx.commit()?;
            debug!(
                "event=tx module=db status=commit duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback() {
                warn!(
                    "event=tx module=db status=error error_code=rollback_failed error={} cause={}",
                    rollback_err, err
                );
            } else {
                debug!(
                    "event=tx module=db status=rollback duration_ms={}",
                    started_at.elapsed().as_millis()
                );
            }
            Err(err)
        }
    }
}
