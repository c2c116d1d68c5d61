//! `farmkonnect call <procedure>` – invoke a procedure with retries.

use anyhow::{Context, Result};
use farmkonnect_core::client::{ApiClient, Method};
use farmkonnect_core::config::ClientConfig;
use farmkonnect_core::retry::CancellationToken;

/// Split `key=value` arguments.
pub(crate) fn parse_params(raw: &[String]) -> Result<Vec<(String, String)>> {
    raw.iter()
        .map(|p| {
            p.split_once('=')
                .map(|(k, v)| (k.trim().to_string(), v.to_string()))
                .filter(|(k, _)| !k.is_empty())
                .with_context(|| format!("invalid --param {:?}, expected KEY=VALUE", p))
        })
        .collect()
}

/// Token cancelled on Ctrl-C so a pending backoff sleep ends the call.
fn ctrl_c_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupted; cancelling pending retries");
            trigger.cancel();
        }
    });
    token
}

pub async fn run_call(
    cfg: &ClientConfig,
    procedure: &str,
    method: Method,
    params: &[String],
    data: Option<&str>,
) -> Result<()> {
    let params = parse_params(params)?;
    let body = data
        .map(serde_json::from_str::<serde_json::Value>)
        .transpose()
        .context("--data is not valid JSON")?;

    let client = ApiClient::new(cfg)?
        .with_cancellation(ctrl_c_token())
        .on_retry(|e| {
            eprintln!(
                "attempt {} failed ({}); retrying in {} ms",
                e.attempt_number(),
                e.message,
                e.delay.as_millis()
            );
        });

    let pairs: Vec<(&str, &str)> = params.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
    let value = client
        .request(method, procedure, &pairs, body.as_ref())
        .await
        .with_context(|| format!("{} {}", method.as_str(), procedure))?;

    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
