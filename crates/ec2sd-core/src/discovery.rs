// ── Discovery engine ──
//
// One sequential task per engine: refresh right away, then once per
// interval, until the cancellation token fires. Each refresh walks every
// DescribeInstances page and emits a complete TargetGroup, or nothing.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::config::{DEFAULT_REFRESH_INTERVAL, DiscoveryConfig};
use crate::error::DiscoveryError;
use crate::inventory::{DescribeInstancesRequest, InstanceInventory};
use crate::reporter::{ErrorReporter, TracingReporter};
use crate::target::{TargetGroup, instance_labels};

/// At most one snapshot waits for the consumer.
const SNAPSHOT_CHANNEL_SIZE: usize = 1;

/// Periodically turns an EC2 region's instances into scrape targets.
pub struct Discovery<I, R = TracingReporter> {
    config: DiscoveryConfig,
    inventory: I,
    reporter: R,
}

impl<I: InstanceInventory> Discovery<I> {
    /// Create an engine that logs refresh failures through `tracing`.
    pub fn new(config: DiscoveryConfig, inventory: I) -> Self {
        Self {
            config,
            inventory,
            reporter: TracingReporter,
        }
    }
}

impl<I: InstanceInventory, R: ErrorReporter> Discovery<I, R> {
    /// Replace the sink refresh failures are handed to.
    pub fn with_reporter<R2: ErrorReporter>(self, reporter: R2) -> Discovery<I, R2> {
        Discovery {
            config: self.config,
            inventory: self.inventory,
            reporter,
        }
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Run one full discovery pass.
    ///
    /// Pages are requested one after another until the inventory stops
    /// returning a `NextToken`. Any page failure discards everything
    /// collected so far.
    pub async fn refresh(&self) -> Result<TargetGroup, DiscoveryError> {
        let mut group = TargetGroup::new(self.config.region());
        let mut next_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let request = DescribeInstancesRequest {
                filters: self.config.filters.as_ref(),
                next_token: next_token.as_deref(),
            };
            let page = self
                .inventory
                .describe_instances(&self.config.aws, request)
                .await
                .map_err(DiscoveryError::Describe)?;
            pages += 1;

            for instance in page.reservations.iter().flat_map(|r| &r.instances) {
                match instance_labels(instance, self.config.port) {
                    Some(labels) => group.targets.push(labels),
                    None => trace!(instance_id = %instance.instance_id, "skipping instance without private IP"),
                }
            }

            match page.next_token {
                Some(token) if !token.is_empty() => next_token = Some(token),
                _ => break,
            }
        }

        debug!(
            region = %group.source,
            targets = group.targets.len(),
            pages,
            "EC2 refresh complete"
        );
        Ok(group)
    }

    /// Drive the refresh loop, sending each snapshot into `tx`.
    ///
    /// Returns when `cancel` fires or the receiver is dropped; `tx` is
    /// dropped on return, which ends the consumer's stream. Ticks missed
    /// while a refresh or a send is in progress are not replayed.
    ///
    /// A refresh in progress is never abandoned: cancellation is observed
    /// once it returns. The initial snapshot is handed off even when
    /// cancellation arrived during the initial refresh; a tick's snapshot
    /// is dropped instead.
    pub async fn run(self, cancel: CancellationToken, tx: mpsc::Sender<TargetGroup>) {
        let mut interval = tokio::time::interval(self.period());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval.tick().await; // consume the immediate first tick

        // Get an initial set right away.
        let initial = self.refresh().await;
        if self.deliver(initial, &cancel, &tx).await {
            loop {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    _ = interval.tick() => {
                        let result = self.refresh().await;
                        if cancel.is_cancelled() || !self.deliver(result, &cancel, &tx).await {
                            break;
                        }
                    }
                }
            }
        }

        debug!(region = %self.config.region(), "EC2 discovery stopped");
    }

    /// Spawn [`run()`](Self::run) on the current runtime and return its output.
    pub fn spawn(self, cancel: CancellationToken) -> ReceiverStream<TargetGroup>
    where
        I: 'static,
        R: 'static,
    {
        let (tx, rx) = mpsc::channel(SNAPSHOT_CHANNEL_SIZE);
        tokio::spawn(self.run(cancel, tx));
        ReceiverStream::new(rx)
    }

    /// Report a failure or hand a snapshot off. Returns `false` once the
    /// loop should stop.
    ///
    /// A send that can complete wins over cancellation; a send blocked on
    /// a full channel is abandoned when `cancel` fires.
    async fn deliver(
        &self,
        result: Result<TargetGroup, DiscoveryError>,
        cancel: &CancellationToken,
        tx: &mpsc::Sender<TargetGroup>,
    ) -> bool {
        let group = match result {
            Ok(group) => group,
            Err(e) => {
                self.reporter.report(&e);
                return true;
            }
        };

        tokio::select! {
            biased;
            sent = tx.send(group) => {
                if sent.is_err() {
                    debug!("target receiver dropped");
                    return false;
                }
                true
            }
            () = cancel.cancelled() => false,
        }
    }

    fn period(&self) -> Duration {
        if self.config.refresh_interval.is_zero() {
            warn!(
                default = ?DEFAULT_REFRESH_INTERVAL,
                "refresh interval is zero; using the default"
            );
            return DEFAULT_REFRESH_INTERVAL;
        }
        self.config.refresh_interval
    }
}
