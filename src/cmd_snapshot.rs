//! Snapshot subcommands: offline selector probing and engine dry runs.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::info;

use replykit_config::Config;
use replykit_dom::{Document, DocumentSnapshot, HostDocument};
use replykit_engine::{
    ElementLocator, EngineNode, HttpReplyClient, ProbeResult, ReplyEngine, SelectorCatalog,
    SelectorScope, UiRole,
};

/// Load a snapshot into a fresh in-memory document.
pub(crate) fn load_document(path: &Path) -> Result<Document, Box<dyn std::error::Error>> {
    let snapshot = DocumentSnapshot::load(path)?;
    Ok(Document::from_snapshot(&snapshot)?)
}

/// Locator over the built-in catalog with the config's overrides applied.
pub(crate) fn configured_locator(config: &Config) -> Result<ElementLocator, Box<dyn std::error::Error>> {
    let catalog = SelectorCatalog::gmail().with_overrides(&config.selectors)?;
    Ok(ElementLocator::new(Arc::new(catalog)))
}

/// Probe every selector of one or all roles.
pub(crate) fn probe(
    config: &Config,
    snapshot: &Path,
    role: Option<&str>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let doc = load_document(snapshot)?;
    let locator = configured_locator(config)?;

    let roles = match role {
        Some(key) => vec![UiRole::from_key(key).ok_or_else(|| format!("Unknown role: {}", key))?],
        None => UiRole::ALL.to_vec(),
    };
    let results: Vec<ProbeResult> = roles
        .into_iter()
        .flat_map(|role| locator.probe(&doc, role, None))
        .collect();

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&results)?),
        _ => print_probe_table(&results),
    }
    Ok(())
}

fn print_probe_table(results: &[ProbeResult]) {
    if results.is_empty() {
        println!("No selectors to probe.");
        return;
    }

    println!("{:<16} {:>3} {:>7}  {:<10} SELECTOR", "ROLE", "#", "MATCHES", "SCOPE");
    println!("{}", "-".repeat(80));
    for result in results {
        let scope = match result.scope {
            SelectorScope::Container => "container",
            SelectorScope::Document => "document",
        };
        let matches = match &result.error {
            Some(_) => "invalid".to_string(),
            None => result.matches.to_string(),
        };
        println!(
            "{:<16} {:>3} {:>7}  {:<10} {}",
            result.role.key(),
            result.index,
            matches,
            scope,
            result.selector
        );
        if let Some(error) = &result.error {
            println!("{:>30}{}", "", error);
        }
    }

    let found = UiRole::ALL
        .iter()
        .filter(|role| results.iter().any(|r| r.role == **role && r.found()))
        .count();
    println!();
    println!("{} of {} roles resolved.", found, UiRole::ALL.len());
}

/// Run the observation loop over a snapshot for `duration`, then emit the
/// resulting document.
pub(crate) async fn watch(
    config: Config,
    snapshot: &Path,
    duration: Duration,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let doc = Arc::new(Mutex::new(load_document(snapshot)?));
    let client = Arc::new(HttpReplyClient::from_config(&config.service)?);
    let config = Arc::new(config);
    let engine = ReplyEngine::new(doc.clone(), &config, config.clone(), client)?;

    let handle = engine.start();
    tokio::time::sleep(duration).await;
    handle.shutdown();
    handle.join().await;

    let (json, controls) = {
        let doc = doc.lock();
        let controls = doc
            .query_selector_all(doc.body(), EngineNode::Control.selector())?
            .len();
        (doc.snapshot().to_json()?, controls)
    };
    info!("Watch finished with {} reply controls in the document", controls);

    match output {
        Some(path) => {
            std::fs::write(path, json)?;
            println!("Wrote {} ({} reply controls)", path.display(), controls);
        }
        None => println!("{}", json),
    }
    Ok(())
}
