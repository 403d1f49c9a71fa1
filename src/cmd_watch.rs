//! Long-running commands: `watch` and `serve`.

use std::sync::Arc;

use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use citelegend_config::Config;
use citelegend_core::{ChangeMonitor, MessageHandler, Page, ScanTarget};

use crate::setup::{Attached, attach};

/// Keep the legend current until Ctrl-C or until the tab goes away.
pub(crate) async fn watch(config: &Config) -> anyhow::Result<()> {
    let attached = attach(config).await?;
    let shutdown = CancellationToken::new();

    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted");
            ctrl_c.cancel();
        }
    });

    run_monitor(config, &attached, shutdown).await
}

/// Answer NDJSON requests on stdin while the monitor runs alongside.
pub(crate) async fn serve(config: &Config) -> anyhow::Result<()> {
    let attached = attach(config).await?;
    let shutdown = CancellationToken::new();

    let monitor = {
        let shutdown = shutdown.clone();
        let config = config.clone();
        let page = attached.page.clone();
        let session = attached.session.clone();
        tokio::spawn(async move {
            let attached = Attached { page, session };
            if let Err(e) = run_monitor(&config, &attached, shutdown).await {
                warn!("Change monitor stopped: {:#}", e);
            }
        })
    };

    let handler = MessageHandler::new(attached.session.clone());
    let served = handler
        .serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await;

    shutdown.cancel();
    let _ = monitor.await;
    served?;
    Ok(())
}

async fn run_monitor(
    config: &Config,
    attached: &Attached,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let target: Arc<dyn ScanTarget> = attached.session.clone();
    let monitor = ChangeMonitor::new(target, config.monitor.debounce());
    let _initial = monitor.schedule_initial(&config.monitor.initial_scan_delays());

    let page: Arc<dyn Page> = attached.page.clone();
    monitor
        .run(page, config.monitor.poll_interval(), shutdown)
        .await?;
    Ok(())
}
