//! EC2 target discovery for metrics scraping.
//!
//! Turns the live instance inventory of one EC2 region into successive
//! snapshots of scrape targets:
//!
//! - **[`compile_tag_filters`]**: Parses `key` / `key,value,...` expressions
//!   into the `tag:` filters sent with every `DescribeInstances` call.
//!   No expressions means no filtering (`None`), which is kept distinct
//!   from a present filter set.
//!
//! - **[`instance_labels`]**: Pure mapping from one instance record to its
//!   [`LabelSet`] (`__meta_ec2_*` labels plus `__address__`).
//!
//! - **[`Discovery`]**: The refresh engine. [`refresh()`](Discovery::refresh)
//!   walks every result page and folds instances into a [`TargetGroup`];
//!   [`run()`](Discovery::run) refreshes immediately and then once per
//!   interval until its [`CancellationToken`](tokio_util::sync::CancellationToken)
//!   fires.
//!
//! - **[`InstanceInventory`]**: The query seam the engine talks to.
//!   [`StaticInventory`] serves pre-loaded `describe-instances` pages.

pub mod config;
pub mod discovery;
pub mod error;
pub mod filter;
pub mod inventory;
pub mod model;
pub mod reporter;
pub mod target;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{AwsConfig, Credentials, DiscoveryConfig};
pub use discovery::Discovery;
pub use error::{DiscoveryError, InventoryError};
pub use filter::{Filter, FilterSet, compile_tag_filters};
pub use inventory::{DescribeInstancesRequest, InstanceInventory, StaticInventory};
pub use model::{
    DescribeInstancesOutput, Instance, NetworkInterface, Placement, Reservation, Tag,
};
pub use reporter::{ErrorReporter, TracingReporter};
pub use target::{LabelSet, TargetGroup, instance_labels, sanitize_label_name};
