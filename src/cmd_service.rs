//! Service subcommands: one-shot generation and health checks.

use std::path::Path;

use replykit_config::{Config, SettingsSource};
use replykit_engine::{HttpReplyClient, ReplyClient, ReplyRequest, Tone, UiRole};

use crate::cmd_snapshot::{configured_locator, load_document};

/// Generate one reply for `content`, or for the quoted source in `snapshot`.
pub(crate) async fn generate(
    config: &Config,
    content: Option<String>,
    snapshot: Option<&Path>,
    tone: Tone,
) -> Result<(), Box<dyn std::error::Error>> {
    let content = match (content, snapshot) {
        (Some(content), _) => content,
        (None, Some(path)) => {
            let doc = load_document(path)?;
            configured_locator(config)?.read_content(&doc, UiRole::QuotedSource, None)
        }
        (None, None) => return Err("Either --content or --snapshot is required".into()),
    };

    let client = HttpReplyClient::from_config(&config.service)?;
    let request = ReplyRequest::new(content, tone);
    let reply = client.generate(&config.api_url(), &request).await?;
    println!("{}", reply);
    Ok(())
}

/// Check the service's liveness endpoint.
pub(crate) async fn ping(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let api_url = config.api_url();
    let client = HttpReplyClient::from_config(&config.service)?;
    let status = client.health_check(&api_url).await?;
    println!("{}: {}", api_url, status.trim());
    Ok(())
}
