//! # Row Projector
//!
//! Copies parameter-table rows into the configuration namespace: one write
//! per row, `namespace[key] = value`, last-writer-wins. Re-applying an
//! unchanged table yields an identical namespace, so the maintainer can run
//! the projection unconditionally every cycle.

use tracing::{debug, warn};

use crate::config::ConfigStore;
use crate::store::{Record, StoreClient, StoreError};

/// Column holding the parameter name.
pub const KEY_COLUMN: &str = "key";
/// Column holding the parameter value.
pub const VALUE_COLUMN: &str = "value";

/// Apply already-fetched rows to the namespace. Returns the count applied.
///
/// A row missing the key or value column is logged and skipped; the
/// remaining rows still apply.
pub fn apply_rows(rows: &[Record], config: &ConfigStore) -> usize {
    let mut applied = 0;

    for record in rows {
        let key = match record.get(KEY_COLUMN) {
            Some(key) => key,
            None => {
                warn!(
                    error = %StoreError::RowShape { column: KEY_COLUMN },
                    columns = ?record.column_names(),
                    "skipping parameter row"
                );
                continue;
            }
        };
        let value = match record.get(VALUE_COLUMN) {
            Some(value) => value,
            None => {
                warn!(
                    key,
                    error = %StoreError::RowShape { column: VALUE_COLUMN },
                    "skipping parameter row"
                );
                continue;
            }
        };

        config.set(key, value);
        debug!(key, value, "parameter applied");
        applied += 1;
    }

    applied
}

/// Full scan of `table` followed by [`apply_rows`].
///
/// # Errors
/// [`StoreError::Query`] from the scan; the namespace is untouched in that
/// case and zero rows were applied.
pub async fn project(
    client: &mut StoreClient,
    table: &str,
    config: &ConfigStore,
) -> Result<usize, StoreError> {
    let rows = client.fetch_table(table).await?;
    Ok(apply_rows(&rows, config))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
