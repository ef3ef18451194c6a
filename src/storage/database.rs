// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! PostgreSQL connection settings for the vehicle registry

use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Stored procedure queried for vehicle records
pub const DEFAULT_VEHICLE_PROCEDURE: &str = "read_vehiculos";

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Full connection URL; overrides the individual fields when set
    pub url: Option<String>,
    pub name: String,
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    /// Function called as `SELECT * FROM <procedure>($1::jsonb)`
    pub procedure: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            name: "sistema_matriculas".to_string(),
            user: "user_placa".to_string(),
            password: "password_segura".to_string(),
            host: "db".to_string(),
            port: 5432,
            max_connections: 5,
            acquire_timeout_secs: 5,
            procedure: DEFAULT_VEHICLE_PROCEDURE.to_string(),
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &self.redacted_url())
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .field("procedure", &self.procedure)
            .finish()
    }
}

impl DatabaseConfig {
    pub fn connection_url(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!(
                "postgres://{}:{}@{}:{}/{}",
                self.user, self.password, self.host, self.port, self.name
            ),
        }
    }

    /// Connection URL with the password masked, for logs
    pub fn redacted_url(&self) -> String {
        let url = self.connection_url();
        let Some((scheme, rest)) = url.split_once("://") else {
            return url;
        };
        match rest.split_once('@') {
            Some((credentials, location)) => {
                let user = credentials.split(':').next().unwrap_or_default();
                format!("{}://{}:***@{}", scheme, user, location)
            }
            None => url,
        }
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), String> {
        if !is_valid_procedure_name(&self.procedure) {
            return Err(format!(
                "Invalid stored procedure name: {:?}",
                self.procedure
            ));
        }
        if self.max_connections == 0 {
            return Err("Database max_connections must be greater than 0".to_string());
        }
        if self.acquire_timeout_secs == 0 {
            return Err("Database acquire timeout must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Plain or schema-qualified SQL identifier
///
/// The procedure name is interpolated into SQL, so nothing else is allowed.
pub fn is_valid_procedure_name(name: &str) -> bool {
    static IDENTIFIER: OnceLock<Option<Regex>> = OnceLock::new();
    IDENTIFIER
        .get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$").ok())
        .as_ref()
        .is_some_and(|identifier| identifier.is_match(name))
}
