// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::config::NodeConfig;

/// Plate Lookup Node
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "plate-lookup-node")]
#[command(version = crate::version::VERSION_NUMBER)]
#[command(about = "License plate OCR and vehicle lookup service", long_about = None)]
pub struct Cli {
    /// TOML configuration file; environment variables override it
    #[arg(short, long, env = "NODE_CONFIG")]
    pub config: Option<PathBuf>,

    /// HTTP port, overriding file and environment
    #[arg(short, long)]
    pub port: Option<u16>,

    /// OCR model directory, overriding file and environment
    #[arg(long)]
    pub model_dir: Option<String>,
}

impl Cli {
    /// Build the node configuration: defaults, file, environment, then flags
    pub fn load_config(&self) -> Result<NodeConfig> {
        let mut config = match &self.config {
            Some(path) => NodeConfig::from_file(path)?,
            None => NodeConfig::default(),
        };
        config.apply_env();

        if let Some(port) = self.port {
            config.api.port = port;
        }
        if let Some(dir) = &self.model_dir {
            config.vision.ocr_model_dir = dir.clone();
        }

        config.validate().map_err(anyhow::Error::msg)?;
        Ok(config)
    }
}
