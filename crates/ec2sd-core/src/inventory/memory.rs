// ── Pre-loaded inventory ──
//
// Serves saved `describe-instances` pages back through the same
// token-chained pagination the EC2 API uses, applying `tag:` filters
// the way the API does server-side.

use std::path::Path;

use tracing::debug;

use super::{DescribeInstancesRequest, InstanceInventory};
use crate::config::AwsConfig;
use crate::error::InventoryError;
use crate::filter::{Filter, FilterSet, TAG_FILTER_PREFIX};
use crate::model::{DescribeInstancesOutput, Instance, Reservation};

const TOKEN_PREFIX: &str = "page-";

/// An inventory backed by fixed pages of instance data.
#[derive(Debug, Clone, Default)]
pub struct StaticInventory {
    pages: Vec<DescribeInstancesOutput>,
}

impl StaticInventory {
    /// Serve `pages` in order. Their own `NextToken`s are ignored.
    pub fn new(pages: Vec<DescribeInstancesOutput>) -> Self {
        Self { pages }
    }

    /// A single page holding one reservation per instance.
    pub fn from_instances(instances: impl IntoIterator<Item = Instance>) -> Self {
        let reservations = instances
            .into_iter()
            .map(|instance| Reservation {
                instances: vec![instance],
            })
            .collect();
        Self::new(vec![DescribeInstancesOutput {
            reservations,
            next_token: None,
        }])
    }

    /// Load one page per file of `aws ec2 describe-instances --output json` output.
    pub fn load_pages<P: AsRef<Path>>(paths: &[P]) -> Result<Self, InventoryError> {
        let pages = paths
            .iter()
            .map(|path| {
                let path = path.as_ref();
                let raw = std::fs::read_to_string(path).map_err(|source| InventoryError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                serde_json::from_str(&raw).map_err(|source| InventoryError::Deserialization {
                    path: path.to_path_buf(),
                    source,
                })
            })
            .collect::<Result<Vec<DescribeInstancesOutput>, _>>()?;

        debug!(pages = pages.len(), "loaded describe-instances pages");
        Ok(Self::new(pages))
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_index(token: Option<&str>) -> Result<usize, InventoryError> {
        let Some(token) = token else {
            return Ok(0);
        };
        token
            .strip_prefix(TOKEN_PREFIX)
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| InventoryError::InvalidToken {
                token: token.to_owned(),
            })
    }

    fn page(
        &self,
        request: DescribeInstancesRequest<'_>,
    ) -> Result<DescribeInstancesOutput, InventoryError> {
        let index = Self::page_index(request.next_token)?;
        if let Some(filters) = request.filters {
            validate_filters(filters)?;
        }

        let Some(page) = self.pages.get(index) else {
            if index == 0 {
                return Ok(DescribeInstancesOutput::default());
            }
            return Err(InventoryError::InvalidToken {
                token: request.next_token.unwrap_or_default().to_owned(),
            });
        };

        let reservations = page
            .reservations
            .iter()
            .filter_map(|reservation| {
                let instances: Vec<Instance> = reservation
                    .instances
                    .iter()
                    .filter(|instance| {
                        request.filters.is_none_or(|filters| {
                            filters.iter().all(|f| matches_filter(instance, f))
                        })
                    })
                    .cloned()
                    .collect();
                (!instances.is_empty()).then_some(Reservation { instances })
            })
            .collect();

        let next_token =
            (index + 1 < self.pages.len()).then(|| format!("{TOKEN_PREFIX}{}", index + 1));

        Ok(DescribeInstancesOutput {
            reservations,
            next_token,
        })
    }
}

impl InstanceInventory for StaticInventory {
    async fn describe_instances(
        &self,
        aws: &AwsConfig,
        request: DescribeInstancesRequest<'_>,
    ) -> Result<DescribeInstancesOutput, InventoryError> {
        debug!(region = %aws.region, token = ?request.next_token, "describing instances");
        self.page(request)
    }
}

/// Only `tag:<key>` filters are understood; anything else is rejected
/// the way the API rejects an unknown filter name.
fn validate_filters(filters: &FilterSet) -> Result<(), InventoryError> {
    match filters
        .iter()
        .find(|f| !f.name.starts_with(TAG_FILTER_PREFIX))
    {
        Some(f) => Err(InventoryError::request(format!(
            "the filter '{}' is invalid",
            f.name
        ))),
        None => Ok(()),
    }
}

/// An instance matches when it carries the tag and any filter value matches it.
fn matches_filter(instance: &Instance, filter: &Filter) -> bool {
    let Some(key) = filter.name.strip_prefix(TAG_FILTER_PREFIX) else {
        return false;
    };
    instance
        .tags
        .iter()
        .filter(|tag| tag.key == key)
        .any(|tag| filter.values.iter().any(|v| glob_match(v, &tag.value)))
}

/// EC2 filter value matching: `*` matches any run, `?` any single character.
fn glob_match(pattern: &str, value: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let value: Vec<char> = value.chars().collect();
    let (mut p, mut v) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while let Some(&c) = value.get(v) {
        match pattern.get(p) {
            Some('*') => {
                backtrack = Some((p, v));
                p += 1;
            }
            Some(&pc) if pc == '?' || pc == c => {
                p += 1;
                v += 1;
            }
            _ => match backtrack {
                Some((star, matched)) => {
                    p = star + 1;
                    v = matched + 1;
                    backtrack = Some((star, matched + 1));
                }
                None => return false,
            },
        }
    }

    pattern.get(p..).is_some_and(|rest| rest.iter().all(|&c| c == '*'))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::Credentials;
    use crate::filter::compile_tag_filters;
    use crate::model::Tag;

    fn aws() -> AwsConfig {
        AwsConfig {
            region: "us-east-1".into(),
            credentials: Credentials::DefaultChain,
        }
    }

    fn tagged(id: &str, tags: &[(&str, &str)]) -> Instance {
        Instance {
            instance_id: id.into(),
            private_ip_address: Some("10.0.0.1".into()),
            tags: tags.iter().map(|(k, v)| Tag::new(*k, *v)).collect(),
            ..Instance::default()
        }
    }

    fn ids(page: &DescribeInstancesOutput) -> Vec<&str> {
        page.reservations
            .iter()
            .flat_map(|r| &r.instances)
            .map(|i| i.instance_id.as_str())
            .collect()
    }

    #[test]
    fn glob_matching() {
        assert!(glob_match("*", ""));
        assert!(glob_match("*", "anything"));
        assert!(glob_match("web", "web"));
        assert!(!glob_match("web", "web-1"));
        assert!(glob_match("web-*", "web-1"));
        assert!(glob_match("w?b", "wab"));
        assert!(glob_match("a*b*c", "axxbyyc"));
        assert!(!glob_match("a*b", "axxc"));
        assert!(!glob_match("", "x"));
    }

    #[tokio::test]
    async fn chains_pages_with_tokens() {
        let page = |id: &str| DescribeInstancesOutput {
            reservations: vec![Reservation {
                instances: vec![tagged(id, &[])],
            }],
            next_token: None,
        };
        let inventory = StaticInventory::new(vec![page("i-1"), page("i-2")]);

        let first = inventory
            .describe_instances(&aws(), DescribeInstancesRequest::default())
            .await
            .unwrap();
        assert_eq!(ids(&first), vec!["i-1"]);
        let token = first.next_token.unwrap();

        let second = inventory
            .describe_instances(
                &aws(),
                DescribeInstancesRequest {
                    filters: None,
                    next_token: Some(&token),
                },
            )
            .await
            .unwrap();
        assert_eq!(ids(&second), vec!["i-2"]);
        assert!(second.next_token.is_none());
    }

    #[tokio::test]
    async fn unknown_token_is_rejected() {
        let inventory = StaticInventory::default();
        let result = inventory
            .describe_instances(
                &aws(),
                DescribeInstancesRequest {
                    filters: None,
                    next_token: Some("bogus"),
                },
            )
            .await;
        assert!(matches!(result, Err(InventoryError::InvalidToken { .. })));
    }

    #[tokio::test]
    async fn applies_tag_filters() {
        let inventory = StaticInventory::from_instances([
            tagged("i-web", &[("Role", "web"), ("Env", "prod")]),
            tagged("i-db", &[("Role", "db"), ("Env", "prod")]),
            tagged("i-untagged", &[]),
        ]);

        let filters = compile_tag_filters(&["Role,web,api", "Env"]).unwrap();
        let page = inventory
            .describe_instances(
                &aws(),
                DescribeInstancesRequest {
                    filters: Some(&filters),
                    next_token: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(ids(&page), vec!["i-web"]);

        let empty = compile_tag_filters(&[""]).unwrap();
        let page = inventory
            .describe_instances(
                &aws(),
                DescribeInstancesRequest {
                    filters: Some(&empty),
                    next_token: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(ids(&page).len(), 3);
    }

    #[test]
    fn loads_pages_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.json");
        std::fs::write(
            &path,
            r#"{"Reservations":[{"Instances":[{"InstanceId":"i-1","PrivateIpAddress":"10.0.0.1"}]}]}"#,
        )
        .unwrap();

        let inventory = StaticInventory::load_pages(&[&path]).unwrap();
        assert_eq!(inventory.page_count(), 1);

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "not json").unwrap();
        assert!(matches!(
            StaticInventory::load_pages(&[&bad]),
            Err(InventoryError::Deserialization { .. })
        ));
        assert!(matches!(
            StaticInventory::load_pages(&[dir.path().join("missing.json")]),
            Err(InventoryError::Io { .. })
        ));
    }
}
