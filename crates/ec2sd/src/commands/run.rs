use std::io::Write;

use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::info;

use ec2sd_core::{Discovery, StaticInventory, TargetGroup};

use crate::cli::{GlobalOpts, RunArgs};
use crate::error::CliError;

pub async fn handle(args: RunArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let config = super::load_discovery_config(global)?;
    let inventory = StaticInventory::load_pages(&args.pages)?;

    info!(
        region = %config.region(),
        interval = ?config.refresh_interval,
        pages = inventory.page_count(),
        "starting EC2 discovery"
    );
    let discovery = Discovery::new(config, inventory);

    if args.once {
        let group = discovery.refresh().await?;
        return print_group(&group);
    }

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown requested");
            shutdown.cancel();
        }
    });

    let mut snapshots = discovery.spawn(cancel);
    while let Some(group) = snapshots.next().await {
        print_group(&group)?;
    }
    Ok(())
}

/// One snapshot per line. A closed stdout is an error, not a panic.
fn print_group(group: &TargetGroup) -> Result<(), CliError> {
    let line = serde_json::to_string(group)?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{line}")
        .and_then(|()| stdout.flush())
        .map_err(|e| CliError::Output(e.to_string()))
}
