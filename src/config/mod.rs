// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Node configuration
//!
//! Defaults, then an optional TOML file, then environment variables.

use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::storage::DatabaseConfig;
use crate::vision::image_utils::DEFAULT_MAX_IMAGE_BYTES;
use crate::vision::{ResolverConfig, VisionModelConfig};

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub listen_addr: String,
    pub port: u16,
    /// Largest accepted image, after base64 decoding
    pub max_image_bytes: usize,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0".to_string(),
            port: 8000,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            cors_allowed_origins: vec!["*".to_string()],
        }
    }
}

impl ApiConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.listen_addr, self.port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", self.listen_addr, self.port))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub api: ApiConfig,
    pub vision: VisionModelConfig,
    pub database: DatabaseConfig,
    pub resolver: ResolverConfig,
}

impl NodeConfig {
    /// Load configuration from a TOML file; missing sections keep defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: NodeConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Defaults overridden by environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Override fields from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Override fields from any key lookup
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(addr) = var("LISTEN_ADDR") {
            self.api.listen_addr = addr;
        }
        if let Some(port) = parse_var(&var, "API_PORT") {
            self.api.port = port;
        }
        if let Some(max) = parse_var(&var, "MAX_IMAGE_BYTES") {
            self.api.max_image_bytes = max;
        }
        if let Some(origins) = var("CORS_ALLOWED_ORIGINS") {
            self.api.cors_allowed_origins = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }

        if let Some(dir) = var("OCR_MODEL_PATH") {
            self.vision.ocr_model_dir = dir;
        }
        if let Some(secs) = parse_var(&var, "MODEL_READY_TIMEOUT_SECS") {
            self.vision.ready_timeout_secs = secs;
        }

        if let Some(url) = var("DATABASE_URL") {
            self.database.url = Some(url);
        }
        if let Some(name) = var("POSTGRES_DB") {
            self.database.name = name;
        }
        if let Some(user) = var("POSTGRES_USER") {
            self.database.user = user;
        }
        if let Some(password) = var("POSTGRES_PASSWORD") {
            self.database.password = password;
        }
        if let Some(host) = var("POSTGRES_HOST") {
            self.database.host = host;
        }
        if let Some(port) = parse_var(&var, "POSTGRES_PORT") {
            self.database.port = port;
        }
        if let Some(max) = parse_var(&var, "DB_MAX_CONNECTIONS") {
            self.database.max_connections = max;
        }
        if let Some(procedure) = var("VEHICLE_PROCEDURE") {
            self.database.procedure = procedure;
        }

        if let Some(sentinel) = var("PLATE_SENTINEL") {
            self.resolver.sentinel = sentinel;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.api.max_image_bytes == 0 {
            return Err("max_image_bytes must be greater than 0".to_string());
        }
        if self.vision.ready_timeout_secs == 0 {
            return Err("Model ready timeout must be greater than 0".to_string());
        }
        if self.vision.ocr_model_dir.trim().is_empty() {
            return Err("OCR model path must not be empty".to_string());
        }

        let resolver = &self.resolver;
        if !(0.0..=1.0).contains(&resolver.strict_min_confidence)
            || !(0.0..=1.0).contains(&resolver.region_min_confidence)
        {
            return Err("Resolver confidence thresholds must be within 0.0-1.0".to_string());
        }
        if resolver.sentinel.is_empty() {
            return Err("Sentinel plate must not be empty".to_string());
        }

        self.database.validate()
    }
}

fn parse_var<T, F>(var: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = var(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring invalid value for {}: {:?}", key, raw);
            None
        }
    }
}
