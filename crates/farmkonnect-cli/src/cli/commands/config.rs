//! `farmkonnect config` – show where config lives and what is in effect.

use anyhow::Result;
use farmkonnect_core::config::{self, ClientConfig, RetryConfig};
use std::path::Path;

pub fn run_config(cfg: &ClientConfig, explicit: Option<&Path>) -> Result<()> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => config::config_path()?,
    };
    println!("config: {}", path.display());

    let mut effective = cfg.clone();
    if effective.token.is_some() {
        effective.token = Some("<set>".to_string());
    }
    if effective.retry.is_none() {
        effective.retry = Some(RetryConfig::default());
    }
    print!("{}", toml::to_string_pretty(&effective)?);
    Ok(())
}
