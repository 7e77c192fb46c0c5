//! Client inspection commands.
//!
//! Both commands refuse to run unless the stored session passes the
//! authorization check.

use chatbot_admin::services::ClientService;
use chatbot_admin_core::{ClientConfig, ClientQuota};

use super::{CliError, Context};

/// List every client with its status.
pub async fn list() -> Result<(), CliError> {
    let ctx = Context::from_env()?;
    let admin = ctx.require_admin().await?;
    tracing::debug!(email = %admin.email, "Listing clients");

    let clients = ClientService::new(&ctx.backend).list_clients().await?;

    if clients.is_empty() {
        tracing::info!("No clients configured.");
        return Ok(());
    }

    tracing::info!("");
    tracing::info!("{:<24} {:<16} {:>12}", "CLIENT", "STATUS", "USAGE");
    for client in &clients {
        tracing::info!("{}", client_row(client));
    }
    tracing::info!("");
    tracing::info!("{} client(s)", clients.len());
    Ok(())
}

/// Show one client's quota.
pub async fn quota(client_id: &str) -> Result<(), CliError> {
    let ctx = Context::from_env()?;
    ctx.require_admin().await?;

    let quota = ClientService::new(&ctx.backend).get_quota(client_id).await?;

    tracing::info!("");
    tracing::info!("  Client:    {}", quota.client_id);
    tracing::info!("  Used:      {} / {}", quota.messages_used, quota.message_limit);
    tracing::info!("  Remaining: {}", quota.remaining());
    tracing::info!("  Usage:     {}", usage(&quota));
    if let Some(start) = quota.period_start {
        tracing::info!("  Since:     {}", start.format("%Y-%m-%d"));
    }
    tracing::info!("");
    Ok(())
}

fn client_row(client: &ClientConfig) -> String {
    let usage = client.quota.as_ref().map_or_else(|| "-".to_string(), usage);
    format!(
        "{:<24} {:<16} {:>12}",
        client.client_id.as_str(),
        client.status().to_string(),
        usage
    )
}

fn usage(quota: &ClientQuota) -> String {
    format!("{:.1}%", quota.usage_percent())
}
