// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vehicle record lookup by plate
//!
//! Records come from a stored procedure that takes one JSONB argument,
//! `{"AC": <access type>, "placa": <plate>}`, and returns a JSON array
//! in a `json`, `jsonb` or `text` column.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::Row;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::database::{is_valid_procedure_name, DatabaseConfig};
use crate::vision::plate::normalize_text;

#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("Database unavailable: {0}")]
    Unavailable(String),
    #[error("Query failed: {0}")]
    QueryFailed(String),
    #[error("Unexpected procedure result: {0}")]
    InvalidResult(String),
    #[error("Invalid procedure name: {0}")]
    InvalidProcedure(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => StorageError::Unavailable(err.to_string()),
            other => StorageError::QueryFailed(other.to_string()),
        }
    }
}

/// Argument passed to the stored procedure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleQuery {
    #[serde(rename = "AC")]
    pub access_type: String,
    pub placa: String,
}

impl VehicleQuery {
    /// Query with the plate normalized the same way OCR output is
    pub fn new(access_type: &str, plate: &str) -> Self {
        Self {
            access_type: access_type.to_string(),
            placa: normalize_text(plate),
        }
    }
}

#[async_trait]
pub trait VehicleLookup: Send + Sync {
    /// Vehicle records for `plate` under access type `access_type`
    async fn lookup(&self, access_type: &str, plate: &str) -> Result<Vec<Value>, StorageError>;
}

/// Lookup through a PostgreSQL stored procedure
#[derive(Debug, Clone)]
pub struct PgVehicleLookup {
    pool: PgPool,
    procedure: String,
}

impl PgVehicleLookup {
    /// Build a lazily connecting pool; no connection is made until the first lookup
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout())
            .connect_lazy(&config.connection_url())
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;

        info!(
            "Vehicle lookup configured: {} via {}",
            config.procedure,
            config.redacted_url()
        );

        Self::from_pool(pool, &config.procedure)
    }

    pub fn from_pool(pool: PgPool, procedure: &str) -> Result<Self, StorageError> {
        if !is_valid_procedure_name(procedure) {
            return Err(StorageError::InvalidProcedure(procedure.to_string()));
        }
        Ok(Self {
            pool,
            procedure: procedure.to_string(),
        })
    }

    pub fn procedure(&self) -> &str {
        &self.procedure
    }
}

#[async_trait]
impl VehicleLookup for PgVehicleLookup {
    async fn lookup(&self, access_type: &str, plate: &str) -> Result<Vec<Value>, StorageError> {
        let payload = VehicleQuery::new(access_type, plate);
        let sql = format!("SELECT * FROM {}($1::jsonb)", self.procedure);
        debug!("Calling {} for plate {}", self.procedure, payload.placa);

        let row: Option<PgRow> = sqlx::query(&sql)
            .bind(Json(&payload))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                warn!("Vehicle lookup failed: {}", e);
                StorageError::from(e)
            })?;

        let column = match row {
            Some(row) => decode_result_column(
                row.try_get::<Option<Value>, _>(0),
                || row.try_get::<Option<String>, _>(0),
            )?,
            None => ProcedureResult::Empty,
        };
        column.into_rows()
    }
}

/// First column of the procedure's result row
#[derive(Debug, Clone, PartialEq)]
pub enum ProcedureResult {
    Empty,
    /// `json` / `jsonb` column
    Json(Value),
    /// `text` column holding encoded JSON
    Text(String),
}

impl ProcedureResult {
    pub fn into_rows(self) -> Result<Vec<Value>, StorageError> {
        match self {
            ProcedureResult::Empty => Ok(Vec::new()),
            ProcedureResult::Json(value) => rows_from_result(Some(value)),
            ProcedureResult::Text(encoded) => rows_from_result(Some(Value::String(encoded))),
        }
    }
}

/// Decode the result column as JSON, falling back to text on a type mismatch
pub fn decode_result_column<F>(
    as_json: Result<Option<Value>, sqlx::Error>,
    as_text: F,
) -> Result<ProcedureResult, StorageError>
where
    F: FnOnce() -> Result<Option<String>, sqlx::Error>,
{
    match as_json {
        Ok(Some(value)) => Ok(ProcedureResult::Json(value)),
        Ok(None) => Ok(ProcedureResult::Empty),
        Err(sqlx::Error::ColumnDecode { .. }) => match as_text()? {
            Some(encoded) => {
                debug!("Procedure returned a text column");
                Ok(ProcedureResult::Text(encoded))
            }
            None => Ok(ProcedureResult::Empty),
        },
        Err(e) => Err(e.into()),
    }
}

/// Interpret the single value returned by the procedure
///
/// Arrays are returned as-is, JSON-encoded strings are parsed, a lone object
/// becomes a one-element list and no value at all means no records.
pub fn rows_from_result(value: Option<Value>) -> Result<Vec<Value>, StorageError> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(rows)) => Ok(rows),
        Some(Value::String(encoded)) => {
            let parsed: Value = serde_json::from_str(&encoded)
                .map_err(|e| StorageError::InvalidResult(e.to_string()))?;
            match parsed {
                Value::Null => Ok(Vec::new()),
                Value::Array(rows) => Ok(rows),
                other => Ok(vec![other]),
            }
        }
        Some(other) => Ok(vec![other]),
    }
}

/// In-memory lookup keyed by normalized plate, for tests and local runs
#[derive(Debug, Clone, Default)]
pub struct MockVehicleLookup {
    records: Arc<Mutex<HashMap<String, Vec<Value>>>>,
    calls: Arc<Mutex<Vec<VehicleQuery>>>,
    injected_error: Arc<Mutex<Option<StorageError>>>,
}

impl MockVehicleLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, plate: &str, records: Vec<Value>) {
        self.records
            .lock()
            .await
            .insert(normalize_text(plate), records);
    }

    /// Make every following lookup fail with `error`
    pub async fn inject_error(&self, error: StorageError) {
        *self.injected_error.lock().await = Some(error);
    }

    /// Queries received so far, in order
    pub async fn calls(&self) -> Vec<VehicleQuery> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl VehicleLookup for MockVehicleLookup {
    async fn lookup(&self, access_type: &str, plate: &str) -> Result<Vec<Value>, StorageError> {
        let query = VehicleQuery::new(access_type, plate);
        self.calls.lock().await.push(query.clone());

        if let Some(error) = self.injected_error.lock().await.clone() {
            return Err(error);
        }

        Ok(self
            .records
            .lock()
            .await
            .get(&query.placa)
            .cloned()
            .unwrap_or_default())
    }
}
