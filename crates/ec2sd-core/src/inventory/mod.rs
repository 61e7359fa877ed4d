// ── Inventory query seam ──
//
// The engine only needs one paginated call. Anything that can answer
// `DescribeInstances` one page at a time can back discovery.

mod memory;

use std::future::Future;
use std::sync::Arc;

pub use memory::StaticInventory;

use crate::config::AwsConfig;
use crate::error::InventoryError;
use crate::filter::FilterSet;
use crate::model::DescribeInstancesOutput;

/// Parameters for a single page request.
#[derive(Debug, Clone, Copy, Default)]
pub struct DescribeInstancesRequest<'a> {
    /// `None` means no filtering at all.
    pub filters: Option<&'a FilterSet>,
    /// Token returned with the previous page; `None` for the first page.
    pub next_token: Option<&'a str>,
}

/// Paginated source of EC2 instance records.
pub trait InstanceInventory: Send + Sync {
    /// Fetch one page of instances for the region and credentials in `aws`.
    fn describe_instances(
        &self,
        aws: &AwsConfig,
        request: DescribeInstancesRequest<'_>,
    ) -> impl Future<Output = Result<DescribeInstancesOutput, InventoryError>> + Send;
}

impl<T: InstanceInventory> InstanceInventory for Arc<T> {
    fn describe_instances(
        &self,
        aws: &AwsConfig,
        request: DescribeInstancesRequest<'_>,
    ) -> impl Future<Output = Result<DescribeInstancesOutput, InventoryError>> + Send {
        (**self).describe_instances(aws, request)
    }
}
