use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::fs;

#[derive(Parser, Debug)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Pay the fee of a transaction draft
    PayFee {
        /// JSON file holding the draft
        #[arg(short, long)]
        draft: String,
        /// Payer lock address, tried in the given order
        #[arg(short, long)]
        payer: Vec<String>,
        /// Fall back to any owned cell when every payer is short
        #[arg(long)]
        auto_inject: bool,
        /// Shannons per 1000 bytes, overrides the config file
        #[arg(long)]
        fee_rate: Option<u64>,
    },
    /// Add inputs worth at least `amount` shannons plus a change cell
    Inject {
        #[arg(short, long)]
        draft: String,
        #[arg(short, long)]
        amount: u64,
        /// Only spend cells of this lock address
        #[arg(short, long)]
        lock: Option<String>,
    },
}

#[derive(Deserialize, Debug)]
pub struct Config {
    pub rpc: RpcConfig,
    #[serde(default)]
    pub fee: FeeConfig,
}

#[derive(Deserialize, Debug)]
pub struct RpcConfig {
    pub url: String,
}

#[derive(Deserialize, Debug, Default)]
pub struct FeeConfig {
    pub rate: Option<u64>,
    pub max_iterations: Option<usize>,
}

pub fn load_config(path: &str) -> Result<Config> {
    let config_content =
        fs::read_to_string(path).with_context(|| format!("failed to read config {}", path))?;
    let config: Config = toml::from_str(&config_content)
        .with_context(|| format!("failed to parse config {}", path))?;

    Ok(config)
}
