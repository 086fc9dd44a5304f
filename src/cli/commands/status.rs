use anyhow::Result;

use crate::cli::output::{OutputFormat, StatusInfo, get_formatter};
use crate::models::Config;
use crate::services::IndexClient;

pub async fn handle_status(format: OutputFormat, _verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);

    let connection = config.index.connection()?;
    let client = IndexClient::new(&connection)?;
    let connected = client.health_check().await.unwrap_or(false);

    let status = StatusInfo {
        index_url: connection.url.clone(),
        connected,
    };
    print!("{}", formatter.format_status(&status));

    if !connected {
        eprintln!();
        eprintln!(
            "Warning: index not reachable at {}. Check the instance URL and TLS identity.",
            connection.url
        );
    }

    Ok(())
}
