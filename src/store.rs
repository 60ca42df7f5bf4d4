//! # Store Client
//!
//! One MySQL session per use. The maintainer opens a fresh connection every
//! cycle and closes it before the cycle ends, which bounds the blast radius
//! of a stale or broken connection to a single cycle. Pooling is deliberately
//! absent.
//!
//! Every sqlx failure is wrapped into a [`StoreError`] here; callers never
//! see a driver error.

use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlRow};
use sqlx::{Column, Connection, Row};
use tracing::{info, warn};

use crate::config::{keys, ConfigStore};

/// Name of the table the maintainer projects from. Fixed; never user input.
pub const PARAMETERS_TABLE: &str = "parameters";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure taxonomy for store interactions.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// Store unreachable, credentials rejected, or connection parameters
    /// missing/malformed. The connect step fails for the cycle.
    #[error("failed to connect to store: {detail}")]
    Connect { detail: String },

    /// Closing the session failed. Logged only, never escalated.
    #[error("failed to close store connection: {detail}")]
    Disconnect { detail: String },

    /// Malformed statement or store-side failure. The cycle continues with
    /// zero applied rows.
    #[error("query failed: {detail}")]
    Query { detail: String },

    /// A parameter row is missing a required column. Per-row, never fatal to
    /// the remaining rows.
    #[error("row is missing required column '{column}'")]
    RowShape { column: &'static str },
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One result row as an ordered mapping of column name to stringified value.
///
/// Values the driver cannot represent as a string, integer, float or bool
/// decode to `None`, which reads the same as SQL `NULL`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    columns: Vec<(String, Option<String>)>,
}

impl Record {
    /// Build a record from name/value pairs, preserving order.
    pub fn from_pairs(pairs: &[(&str, Option<&str>)]) -> Self {
        Self {
            columns: pairs
                .iter()
                .map(|(name, value)| (name.to_string(), value.map(str::to_string)))
                .collect(),
        }
    }

    /// The value of the named column. `None` for an absent column and for a
    /// NULL value alike; the projector treats both as missing.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(col, _)| col == name)
            .and_then(|(_, value)| value.as_deref())
    }

    /// Column names in result order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(name, _)| name.as_str()).collect()
    }

    fn from_mysql_row(row: &MySqlRow) -> Self {
        let columns = row
            .columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| (col.name().to_string(), decode_column(row, idx)))
            .collect();
        Self { columns }
    }
}

/// Decode one column into its string form, trying the primitive types the
/// parameters table can reasonably hold.
fn decode_column(row: &MySqlRow, idx: usize) -> Option<String> {
    if let Ok(value) = row.try_get::<Option<String>, _>(idx) {
        return value;
    }
    if let Ok(value) = row.try_get::<Option<i64>, _>(idx) {
        return value.map(|n| n.to_string());
    }
    if let Ok(value) = row.try_get::<Option<u64>, _>(idx) {
        return value.map(|n| n.to_string());
    }
    if let Ok(value) = row.try_get::<Option<f64>, _>(idx) {
        return value.map(|n| n.to_string());
    }
    if let Ok(value) = row.try_get::<Option<bool>, _>(idx) {
        return value.map(|b| b.to_string());
    }
    None
}

// ---------------------------------------------------------------------------
// ConnectParams
// ---------------------------------------------------------------------------

/// Store connection parameters, harvested from the configuration namespace.
#[derive(Debug, Clone)]
pub struct ConnectParams {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
}

impl ConnectParams {
    /// Read the `DB_*` keys out of the namespace.
    ///
    /// # Errors
    /// [`StoreError::Connect`] when any key is absent or `DB_PORT` is not a
    /// valid port number.
    pub fn from_config(config: &ConfigStore) -> Result<Self, StoreError> {
        let required = |key: &str| {
            config.get(key).ok_or_else(|| StoreError::Connect {
                detail: format!("missing connection parameter {key}"),
            })
        };

        let raw_port = required(keys::DB_PORT)?;
        let port = raw_port.trim().parse::<u16>().map_err(|_| StoreError::Connect {
            detail: format!("malformed {} '{raw_port}': expected a port number", keys::DB_PORT),
        })?;

        Ok(Self {
            host: required(keys::DB_HOST)?,
            port,
            username: required(keys::DB_USER)?,
            password: required(keys::DB_PASSWORD)?,
            database: required(keys::DB_NAME)?,
        })
    }
}

// ---------------------------------------------------------------------------
// StoreClient
// ---------------------------------------------------------------------------

/// Holder of at most one live store session.
///
/// `disconnect` with no active session is a warning-logged no-op, so
/// acquisition and release can be paired on every cycle path without
/// tracking whether the connect half actually succeeded.
#[derive(Default)]
pub struct StoreClient {
    conn: Option<MySqlConnection>,
}

impl StoreClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// Open a session to the store.
    ///
    /// # Errors
    /// [`StoreError::Connect`] when the store is unreachable or rejects the
    /// credentials. Never panics.
    pub async fn connect(&mut self, params: &ConnectParams) -> Result<(), StoreError> {
        let options = MySqlConnectOptions::new()
            .host(&params.host)
            .port(params.port)
            .username(&params.username)
            .password(&params.password)
            .database(&params.database);

        let conn = MySqlConnection::connect_with(&options)
            .await
            .map_err(|e| StoreError::Connect { detail: e.to_string() })?;

        info!(
            host = %params.host,
            port = params.port,
            database = %params.database,
            "connected to store"
        );
        self.conn = Some(conn);
        Ok(())
    }

    /// Close the session, if one is open.
    ///
    /// # Errors
    /// [`StoreError::Disconnect`] when the close handshake fails. The
    /// session is dropped either way.
    pub async fn disconnect(&mut self) -> Result<(), StoreError> {
        match self.conn.take() {
            Some(conn) => {
                conn.close()
                    .await
                    .map_err(|e| StoreError::Disconnect { detail: e.to_string() })?;
                info!("disconnected from store");
                Ok(())
            }
            None => {
                warn!("no active store connection to close");
                Ok(())
            }
        }
    }

    /// Execute a parameterized statement and collect every result row.
    ///
    /// # Errors
    /// [`StoreError::Query`] when no session is open or the store rejects
    /// the statement.
    pub async fn fetch_all(&mut self, sql: &str, binds: &[&str]) -> Result<Vec<Record>, StoreError> {
        let conn = self.conn.as_mut().ok_or_else(|| StoreError::Query {
            detail: "no active store connection".to_string(),
        })?;

        let mut query = sqlx::query(sql);
        for bind in binds {
            query = query.bind(*bind);
        }

        let rows = query
            .fetch_all(conn)
            .await
            .map_err(|e| StoreError::Query { detail: e.to_string() })?;

        Ok(rows.iter().map(Record::from_mysql_row).collect())
    }

    /// Unconditional full scan of `table`: no filter, no ordering, no limit.
    ///
    /// The table name lands in identifier position and cannot be bound;
    /// callers pass fixed literals such as [`PARAMETERS_TABLE`] only.
    pub async fn fetch_table(&mut self, table: &str) -> Result<Vec<Record>, StoreError> {
        self.fetch_all(&format!("SELECT * FROM {table}"), &[]).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
