//! XenAPI probe
//!
//! Logs in to a pool, prints the master's API version and the VMs it knows
//! about, then logs out.
//!
//! Reads `XENAPI_URL`, `XENAPI_USER` and `XENAPI_PASSWORD` from the
//! environment; `XENAPI_LOG_DIR` additionally enables file logging.

use anyhow::{Context, Result};
use tracing::{error, info};
use xenapi_client::api::vm;
use xenapi_client::logging::{init_console_logging, init_logging};
use xenapi_client::{ClientConfig, Session};

#[tokio::main]
async fn main() -> Result<()> {
    match std::env::var("XENAPI_LOG_DIR") {
        Ok(dir) => init_logging(dir, "xenapi-probe")?,
        Err(_) => init_console_logging(),
    }

    let url = std::env::var("XENAPI_URL").context("XENAPI_URL is not set")?;
    let user = std::env::var("XENAPI_USER").unwrap_or_else(|_| "root".to_string());
    let password = std::env::var("XENAPI_PASSWORD").context("XENAPI_PASSWORD is not set")?;

    let config = ClientConfig::new_with_url(&url);
    let transport = config.http_transport()?;

    let mut session = Session::login_with_password(transport, &config, &user, &password)
        .await
        .with_context(|| format!("login to {} failed", url))?;

    let outcome = probe(&session).await;
    if let Err(e) = &outcome {
        error!("probe failed: {:#}", e);
    }

    session.logout().await?;
    outcome
}

async fn probe<T: xenapi_client::Transport>(session: &Session<T>) -> Result<()> {
    let version = session.api_version().await?;
    println!("API version {}", version);

    let records = vm::get_all_records(session).await?;
    info!(count = records.len(), "fetched VM records");

    for (handle, record) in records.iter() {
        if record.is_a_template || record.is_control_domain {
            continue;
        }
        println!("{}  {:<10} {}  ({})", record.uuid, record.power_state, record.name_label, handle);
    }
    Ok(())
}
