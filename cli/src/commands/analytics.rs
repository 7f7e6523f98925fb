//! Analytics commands

use formdesk_forms::AnalyticsSnapshot;

use super::ApiClient;
use crate::dashboard::Dashboard;
use crate::output::OutputFormat;

pub async fn handle(client: &ApiClient, format: OutputFormat) -> anyhow::Result<()> {
    let snapshot = snapshot(client).await?;
    match format {
        OutputFormat::Table => print!("{}", Dashboard::from_snapshot(&snapshot).render()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&snapshot)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&snapshot)?),
    }
    Ok(())
}

pub async fn fetch(client: &ApiClient) -> anyhow::Result<Dashboard> {
    Ok(Dashboard::from_snapshot(&snapshot(client).await?))
}

async fn snapshot(client: &ApiClient) -> anyhow::Result<AnalyticsSnapshot> {
    client.get("/api/analytics").await
}
