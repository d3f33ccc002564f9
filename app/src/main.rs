use std::sync::Arc;

use tracing::Level;

use casedesk_core::{config_path, targets, DashboardConfig, HttpGateway};
use casedesk_ui::logging::{init_logging, LogLevel, LogStore};
use casedesk_ui::{run, Flags};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let log_store = LogStore::new(2000);
    let reload_handle = init_logging(log_store.clone(), LogLevel::Info);

    tracing::info!(target: targets::UI, "CaseDesk starting");

    let path = config_path();
    let config = DashboardConfig::load_or_default(&path);
    tracing::info!(
        target: targets::CONFIG,
        path = %path.display(),
        base_url = %config.base_url,
        schema = %config.schema,
        page_size = config.page_size().get(),
        "Configuration ready"
    );

    let gateway = HttpGateway::from_config(&config).inspect_err(|error| {
        tracing::error!(
            target: targets::GATEWAY,
            detail = %error.technical_detail(),
            "Cannot build HTTP gateway"
        );
    })?;
    tracing::event!(
        target: targets::GATEWAY,
        Level::DEBUG,
        base_url = %gateway.base_url(),
        "Gateway ready"
    );

    run(Flags {
        log_store,
        reload_handle,
        config,
        gateway: Arc::new(gateway),
    })?;

    Ok(())
}
