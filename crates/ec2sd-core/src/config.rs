// ── Runtime discovery configuration ──
//
// These types describe *what* to discover and *how* to authenticate.
// They never touch disk; `ec2sd-config` builds a `DiscoveryConfig` and
// hands it in.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tracing::warn;

use crate::filter::{FilterSet, compile_tag_filters};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_PORT: u16 = 80;

/// Where AWS credentials come from.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Access key pair from configuration.
    Static {
        access_key: String,
        secret_key: SecretString,
    },
    /// Environment, shared profile, instance role, and so on.
    DefaultChain,
}

impl Credentials {
    /// Use the configured key pair only when both halves are present.
    ///
    /// A half-configured pair falls back to the default chain instead of
    /// being sent as-is.
    pub fn resolve(access_key: Option<String>, secret_key: Option<SecretString>) -> Self {
        let access_key = access_key.filter(|key| !key.is_empty());
        let secret_key = secret_key.filter(|key| !key.expose_secret().is_empty());

        match (access_key, secret_key) {
            (Some(access_key), Some(secret_key)) => Self::Static {
                access_key,
                secret_key,
            },
            (None, None) => Self::DefaultChain,
            (Some(_), None) | (None, Some(_)) => {
                warn!("incomplete static credentials; using the default credential chain");
                Self::DefaultChain
            }
        }
    }

    pub fn is_static(&self) -> bool {
        matches!(self, Self::Static { .. })
    }

    pub fn access_key(&self) -> Option<&str> {
        match self {
            Self::Static { access_key, .. } => Some(access_key),
            Self::DefaultChain => None,
        }
    }
}

/// Region and credentials for every inventory request.
#[derive(Debug, Clone)]
pub struct AwsConfig {
    pub region: String,
    pub credentials: Credentials,
}

/// Immutable configuration for one [`Discovery`](crate::Discovery) engine.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    pub aws: AwsConfig,
    /// Time between refreshes.
    pub refresh_interval: Duration,
    /// Port appended to each private address in `__address__`.
    pub port: u16,
    /// Compiled tag filters; `None` queries every instance.
    pub filters: Option<FilterSet>,
}

impl DiscoveryConfig {
    pub fn new<S: AsRef<str>>(
        region: impl Into<String>,
        credentials: Credentials,
        refresh_interval: Duration,
        port: u16,
        tag_filters: &[S],
    ) -> Self {
        Self {
            aws: AwsConfig {
                region: region.into(),
                credentials,
            },
            refresh_interval,
            port,
            filters: compile_tag_filters(tag_filters),
        }
    }

    pub fn region(&self) -> &str {
        &self.aws.region
    }
}
