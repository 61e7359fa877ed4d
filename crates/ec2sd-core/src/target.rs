// ── Target label mapping ──
//
// Converts one EC2 instance into the label set a scraper consumes.
// Label names are part of the downstream contract and must not change.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::model::{Instance, NetworkInterface};

/// Label holding the `host:port` a scraper connects to.
pub const ADDRESS_LABEL: &str = "__address__";

/// Namespace every EC2 metadata label lives under.
pub const EC2_LABEL: &str = "__meta_ec2_";
pub const EC2_LABEL_AZ: &str = "__meta_ec2_availability_zone";
pub const EC2_LABEL_INSTANCE_ID: &str = "__meta_ec2_instance_id";
pub const EC2_LABEL_PUBLIC_DNS: &str = "__meta_ec2_public_dns_name";
pub const EC2_LABEL_PUBLIC_IP: &str = "__meta_ec2_public_ip";
pub const EC2_LABEL_PRIVATE_IP: &str = "__meta_ec2_private_ip";
pub const EC2_LABEL_SUBNET_ID: &str = "__meta_ec2_subnet_id";
pub const EC2_LABEL_TAG: &str = "__meta_ec2_tag_";
pub const EC2_LABEL_VPC_ID: &str = "__meta_ec2_vpc_id";

/// Brackets and joins subnet ids so `,subnet-1,` matches exactly.
pub const SUBNET_SEPARATOR: &str = ",";

/// Label name to label value, unique names per target.
pub type LabelSet = BTreeMap<String, String>;

/// The complete result of one discovery pass.
///
/// Consumers replace whatever they hold for `source` with `targets`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TargetGroup {
    /// The region the targets were discovered in.
    pub source: String,
    /// One label set per instance, in API return order.
    pub targets: Vec<LabelSet>,
}

impl TargetGroup {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            targets: Vec::new(),
        }
    }
}

/// Build the label set for one instance.
///
/// Returns `None` for instances without a private address; they have
/// nothing to scrape.
pub fn instance_labels(instance: &Instance, port: u16) -> Option<LabelSet> {
    let private_ip = instance.private_ip_address.as_deref()?;

    let mut labels = LabelSet::new();
    labels.insert(EC2_LABEL_INSTANCE_ID.into(), instance.instance_id.clone());
    labels.insert(EC2_LABEL_PRIVATE_IP.into(), private_ip.to_owned());
    labels.insert(ADDRESS_LABEL.into(), format!("{private_ip}:{port}"));

    if let Some(public_ip) = &instance.public_ip_address {
        labels.insert(EC2_LABEL_PUBLIC_IP.into(), public_ip.clone());
        labels.insert(
            EC2_LABEL_PUBLIC_DNS.into(),
            instance.public_dns_name.clone().unwrap_or_default(),
        );
    }

    labels.insert(
        EC2_LABEL_AZ.into(),
        instance.placement.availability_zone.clone(),
    );

    if let Some(vpc_id) = &instance.vpc_id {
        labels.insert(EC2_LABEL_VPC_ID.into(), vpc_id.clone());
        labels.insert(
            EC2_LABEL_SUBNET_ID.into(),
            subnet_label(&instance.network_interfaces),
        );
    }

    for tag in &instance.tags {
        let name = format!("{EC2_LABEL_TAG}{}", sanitize_label_name(&tag.key));
        labels.insert(name, tag.value.clone());
    }

    Some(labels)
}

/// Distinct subnet ids across all interfaces, rendered as `,a,b,`.
fn subnet_label(interfaces: &[NetworkInterface]) -> String {
    let subnets: BTreeSet<&str> = interfaces
        .iter()
        .filter_map(|eni| eni.subnet_id.as_deref())
        .collect();

    let joined = subnets.into_iter().collect::<Vec<_>>().join(SUBNET_SEPARATOR);
    format!("{SUBNET_SEPARATOR}{joined}{SUBNET_SEPARATOR}")
}

/// Replace every character outside `[a-zA-Z0-9_]` with `_`.
pub fn sanitize_label_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{Placement, Tag};
    use pretty_assertions::assert_eq;

    fn eni(subnet: &str) -> NetworkInterface {
        NetworkInterface {
            subnet_id: Some(subnet.into()),
        }
    }

    fn instance() -> Instance {
        Instance {
            instance_id: "i-0abc".into(),
            private_ip_address: Some("10.0.1.5".into()),
            placement: Placement {
                availability_zone: "us-east-1a".into(),
            },
            ..Instance::default()
        }
    }

    #[test]
    fn metadata_labels_share_the_ec2_namespace() {
        let mut full = instance();
        full.public_ip_address = Some("54.0.0.1".into());
        full.vpc_id = Some("vpc-1".into());
        full.network_interfaces = vec![eni("subnet-1")];
        full.tags = vec![Tag::new("Name", "web")];

        let labels = instance_labels(&full, 80).unwrap();

        assert_eq!(labels.len(), 9);
        for name in labels.keys().filter(|name| name.as_str() != ADDRESS_LABEL) {
            assert!(name.starts_with(EC2_LABEL), "{name} is outside the namespace");
        }
        assert!(EC2_LABEL_TAG.starts_with(EC2_LABEL));
    }

    #[test]
    fn minimal_instance_gets_required_labels() {
        let labels = instance_labels(&instance(), 9100).unwrap();

        let expected: LabelSet = [
            (EC2_LABEL_INSTANCE_ID, "i-0abc"),
            (EC2_LABEL_PRIVATE_IP, "10.0.1.5"),
            (ADDRESS_LABEL, "10.0.1.5:9100"),
            (EC2_LABEL_AZ, "us-east-1a"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect();
        assert_eq!(labels, expected);
    }

    #[test]
    fn instance_without_private_ip_is_skipped() {
        let inst = Instance {
            private_ip_address: None,
            public_ip_address: Some("54.1.2.3".into()),
            vpc_id: Some("vpc-1".into()),
            tags: vec![Tag::new("Name", "orphan")],
            ..instance()
        };
        assert_eq!(instance_labels(&inst, 80), None);
    }

    #[test]
    fn public_address_adds_ip_and_dns() {
        let inst = Instance {
            public_ip_address: Some("54.1.2.3".into()),
            public_dns_name: Some("ec2-54-1-2-3.compute-1.amazonaws.com".into()),
            ..instance()
        };
        let labels = instance_labels(&inst, 80).unwrap();
        assert_eq!(labels[EC2_LABEL_PUBLIC_IP], "54.1.2.3");
        assert_eq!(
            labels[EC2_LABEL_PUBLIC_DNS],
            "ec2-54-1-2-3.compute-1.amazonaws.com"
        );
    }

    #[test]
    fn no_public_address_means_no_public_labels() {
        let inst = Instance {
            public_dns_name: Some(String::new()),
            ..instance()
        };
        let labels = instance_labels(&inst, 80).unwrap();
        assert!(!labels.contains_key(EC2_LABEL_PUBLIC_IP));
        assert!(!labels.contains_key(EC2_LABEL_PUBLIC_DNS));
    }

    #[test]
    fn subnets_are_deduplicated_and_bracketed() {
        let inst = Instance {
            vpc_id: Some("vpc-1".into()),
            network_interfaces: vec![eni("sn-1"), eni("sn-2"), eni("sn-1")],
            ..instance()
        };
        let labels = instance_labels(&inst, 80).unwrap();
        let subnets = &labels[EC2_LABEL_SUBNET_ID];
        assert!(
            subnets == ",sn-1,sn-2," || subnets == ",sn-2,sn-1,",
            "unexpected subnet label: {subnets}"
        );
        assert_eq!(subnets.matches("sn-1").count(), 1);
        assert_eq!(labels[EC2_LABEL_VPC_ID], "vpc-1");
    }

    #[test]
    fn vpc_without_interfaces_renders_bare_separators() {
        let inst = Instance {
            vpc_id: Some("vpc-1".into()),
            ..instance()
        };
        let labels = instance_labels(&inst, 80).unwrap();
        assert_eq!(labels[EC2_LABEL_SUBNET_ID], ",,");
    }

    #[test]
    fn subnet_label_requires_vpc() {
        let inst = Instance {
            network_interfaces: vec![eni("sn-1")],
            ..instance()
        };
        let labels = instance_labels(&inst, 80).unwrap();
        assert!(!labels.contains_key(EC2_LABEL_SUBNET_ID));
        assert!(!labels.contains_key(EC2_LABEL_VPC_ID));
    }

    #[test]
    fn tag_keys_are_sanitized_and_values_kept() {
        let inst = Instance {
            tags: vec![
                Tag::new("app.name", "billing api"),
                Tag::new("aws:autoscaling:groupName", "asg-1"),
            ],
            ..instance()
        };
        let labels = instance_labels(&inst, 80).unwrap();
        assert_eq!(labels["__meta_ec2_tag_app_name"], "billing api");
        assert_eq!(labels["__meta_ec2_tag_aws_autoscaling_groupName"], "asg-1");
    }

    #[test]
    fn sanitize_keeps_valid_characters() {
        assert_eq!(sanitize_label_name("Name_2"), "Name_2");
        assert_eq!(sanitize_label_name("kubernetes.io/role"), "kubernetes_io_role");
        assert_eq!(sanitize_label_name("ünï"), "_n_");
    }
}
