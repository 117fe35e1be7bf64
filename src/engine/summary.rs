use serde::Serialize;

use super::attachments::AttachmentMap;
use super::classify::ResourceKind;
use super::dash;
use super::index::SecurityGroupIndex;
use crate::model::{SecurityGroup, PLACEHOLDER};

/// One row per (group, attachment); unattached groups get one row with
/// placeholder resource columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
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

pub fn summarize(
    group: &SecurityGroup,
    index: &SecurityGroupIndex<'_>,
    attachments: &AttachmentMap,
    region: &str,
) -> Vec<SummaryRow> {
    let base = SummaryRow {
        group_name: index
            .name(&group.group_id)
            .unwrap_or(PLACEHOLDER)
            .to_string(),
        group_id: group.group_id.clone(),
        group_description: group
            .description
            .clone()
            .unwrap_or_else(|| PLACEHOLDER.to_string()),
        region: region.to_string(),
        usage: attachments.is_used(&group.group_id),
        resource_name: PLACEHOLDER.to_string(),
        resource_id: PLACEHOLDER.to_string(),
        resource_kind: None,
        interface_id: PLACEHOLDER.to_string(),
        private_ip: PLACEHOLDER.to_string(),
    };

    let attached = attachments.attachments(&group.group_id);
    if attached.is_empty() {
        return vec![base];
    }

    attached
        .iter()
        .map(|a| SummaryRow {
            resource_name: a.resource_name.clone(),
            resource_id: a.resource_id.clone(),
            resource_kind: Some(a.kind),
            interface_id: a.interface_id.clone(),
            private_ip: a.private_ip.clone(),
            ..base.clone()
        })
        .collect()
}
