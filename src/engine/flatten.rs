//! Expands compound rules into one row per (rule, origin, attachment).

use serde::Serialize;
use std::fmt;

use super::attachments::{AttachmentMap, NetworkAttachment};
use super::classify::ResourceKind;
use super::dash;
use super::index::{display_name, GroupRules, SecurityGroupIndex};
use crate::model::{IpPermission, SecurityGroup, PLACEHOLDER};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Direction {
    Inbound,
    Outbound,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::Inbound => Direction::Outbound,
            Direction::Outbound => Direction::Inbound,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Inbound => write!(f, "Inbound"),
            Direction::Outbound => write!(f, "Outbound"),
        }
    }
}

/// One (group, rule, origin, attachment) tuple. `Src *` fields are `-` on
/// outbound rows and `Des *` fields are `-` on inbound rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlattenedRuleRow {
    #[serde(rename = "Security Group Name")]
    pub group_name: String,
    #[serde(rename = "Security Group ID")]
    pub group_id: String,
    #[serde(rename = "SG Description")]
    pub group_description: String,
    #[serde(rename = "Region")]
    pub region: String,
    #[serde(rename = "Usage")]
    pub usage: bool,
    #[serde(rename = "Direction", serialize_with = "dash")]
    pub direction: Option<Direction>,
    #[serde(rename = "Protocol")]
    pub protocol: String,
    #[serde(rename = "Port Range")]
    pub port_range: String,
    #[serde(rename = "Src Origin")]
    pub source: String,
    #[serde(rename = "Src Parsed")]
    pub source_parsed: String,
    #[serde(rename = "Des Origin")]
    pub destination: String,
    #[serde(rename = "Des Parsed")]
    pub destination_parsed: String,
    #[serde(rename = "Rules Src/Dst Description")]
    pub origin_description: String,
    #[serde(rename = "Resource Name")]
    pub resource_name: String,
    #[serde(rename = "Resource ID")]
    pub resource_id: String,
    #[serde(rename = "Resource Type", serialize_with = "dash")]
    pub resource_kind: Option<ResourceKind>,
    #[serde(rename = "ENI ID")]
    pub interface_id: String,
    #[serde(rename = "Private IP")]
    pub private_ip: String,
}

impl FlattenedRuleRow {
    /// Raw origin on the rule's side: source for inbound, destination for
    /// outbound, `-` for placeholder rows.
    pub fn origin(&self) -> &str {
        match self.direction {
            Some(Direction::Inbound) => &self.source,
            Some(Direction::Outbound) => &self.destination,
            None => PLACEHOLDER,
        }
    }

    pub fn origin_parsed(&self) -> &str {
        match self.direction {
            Some(Direction::Inbound) => &self.source_parsed,
            Some(Direction::Outbound) => &self.destination_parsed,
            None => PLACEHOLDER,
        }
    }
}

/// Protocol as displayed: `-1` becomes `all`, anything else passes through.
pub fn normalize_protocol(protocol: Option<&str>) -> String {
    match protocol {
        None => PLACEHOLDER.to_string(),
        Some("-1") => "all".to_string(),
        Some(p) => p.to_string(),
    }
}

pub fn port_range(from: Option<i64>, to: Option<i64>) -> String {
    match (from, to) {
        (Some(f), Some(t)) if f == t => f.to_string(),
        (Some(f), Some(t)) => format!("{}-{}", f, t),
        (Some(p), None) | (None, Some(p)) => p.to_string(),
        (None, None) => PLACEHOLDER.to_string(),
    }
}

fn or_dash(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or(PLACEHOLDER)
}

/// A single source or destination carried by a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Origin<'a> {
    pub value: &'a str,
    pub description: &'a str,
}

/// Origins of a rule in fixed order: IPv4 ranges, IPv6 ranges, group
/// references.
pub fn origins(rule: &IpPermission) -> Vec<Origin<'_>> {
    let mut out = Vec::with_capacity(
        rule.ip_ranges.len() + rule.ipv6_ranges.len() + rule.user_id_group_pairs.len(),
    );

    out.extend(rule.ip_ranges.iter().map(|r| Origin {
        value: or_dash(&r.cidr_ip),
        description: or_dash(&r.description),
    }));
    out.extend(rule.ipv6_ranges.iter().map(|r| Origin {
        value: or_dash(&r.cidr_ipv6),
        description: or_dash(&r.description),
    }));
    out.extend(rule.user_id_group_pairs.iter().map(|p| Origin {
        value: or_dash(&p.group_id),
        description: or_dash(&p.description),
    }));

    out
}

/// Per-group constants shared by every row the group yields.
struct GroupColumns {
    name: String,
    id: String,
    description: String,
    region: String,
    usage: bool,
}

impl GroupColumns {
    fn row(
        &self,
        direction: Option<Direction>,
        protocol: &str,
        port_range: &str,
        origin: Option<(Origin<'_>, &str)>,
        attachment: Option<&NetworkAttachment>,
    ) -> FlattenedRuleRow {
        let none = || PLACEHOLDER.to_string();
        let (raw, parsed, origin_description) = match origin {
            Some((o, parsed)) => (o.value.to_string(), parsed.to_string(), o.description.to_string()),
            None => (none(), none(), none()),
        };
        let (source, source_parsed, destination, destination_parsed) = match direction {
            Some(Direction::Inbound) => (raw, parsed, none(), none()),
            Some(Direction::Outbound) => (none(), none(), raw, parsed),
            None => (none(), none(), none(), none()),
        };

        FlattenedRuleRow {
            group_name: self.name.clone(),
            group_id: self.id.clone(),
            group_description: self.description.clone(),
            region: self.region.clone(),
            usage: self.usage,
            direction,
            protocol: protocol.to_string(),
            port_range: port_range.to_string(),
            source,
            source_parsed,
            destination,
            destination_parsed,
            origin_description,
            resource_name: attachment.map_or_else(none, |a| a.resource_name.clone()),
            resource_id: attachment.map_or_else(none, |a| a.resource_id.clone()),
            resource_kind: attachment.map(|a| a.kind),
            interface_id: attachment.map_or_else(none, |a| a.interface_id.clone()),
            private_ip: attachment.map_or_else(none, |a| a.private_ip.clone()),
        }
    }
}

/// Flatten one group's rules against its attachments.
///
/// Each direction yields `origins x max(1, attachments)` rows. A group with
/// no origins in either direction yields a single placeholder row instead,
/// carrying its first attachment; the summary table lists the rest.
pub fn flatten(
    group: &SecurityGroup,
    rules: GroupRules<'_>,
    index: &SecurityGroupIndex<'_>,
    attachments: &AttachmentMap,
    region: &str,
) -> Vec<FlattenedRuleRow> {
    let columns = GroupColumns {
        name: index
            .name(&group.group_id)
            .map(String::from)
            .unwrap_or_else(|| display_name(group)),
        id: group.group_id.clone(),
        description: group.description.clone().unwrap_or_else(|| PLACEHOLDER.to_string()),
        region: region.to_string(),
        usage: attachments.is_used(&group.group_id),
    };

    let attached = attachments.attachments(&group.group_id);
    let targets: Vec<Option<&NetworkAttachment>> = if attached.is_empty() {
        vec![None]
    } else {
        attached.iter().map(Some).collect()
    };

    let mut rows = Vec::new();
    for (direction, perms) in [
        (Direction::Inbound, rules.inbound),
        (Direction::Outbound, rules.outbound),
    ] {
        for rule in perms {
            let protocol = normalize_protocol(rule.ip_protocol.as_deref());
            let ports = port_range(rule.from_port, rule.to_port);

            for origin in origins(rule) {
                let parsed = index.resolve_origin(origin.value);
                for target in &targets {
                    rows.push(columns.row(
                        Some(direction),
                        &protocol,
                        &ports,
                        Some((origin, parsed)),
                        *target,
                    ));
                }
            }
        }
    }

    if rows.is_empty() {
        rows.push(columns.row(None, PLACEHOLDER, PLACEHOLDER, None, targets[0]));
    }

    rows
}
