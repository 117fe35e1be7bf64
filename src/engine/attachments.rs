use std::collections::HashMap;

use serde::Serialize;

use super::classify::{classify, ResourceKind};
use crate::model::{name_tag, Instance, NetworkInterface, PLACEHOLDER};

/// One interface using a group, with what sits behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkAttachment {
    pub interface_id: String,
    pub private_ip: String,
    pub resource_id: String,
    pub kind: ResourceKind,
    pub resource_name: String,
}

/// Instance id to `Name` tag (`-` when untagged).
pub fn instance_names<'a, I>(instances: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = &'a Instance>,
{
    instances
        .into_iter()
        .filter_map(|inst| {
            let id = inst.instance_id.as_ref()?;
            let name = name_tag(&inst.tags).unwrap_or(PLACEHOLDER);
            Some((id.clone(), name.to_string()))
        })
        .collect()
}

/// Group id to the attachments that currently use it.
#[derive(Debug, Default)]
pub struct AttachmentMap {
    by_group: HashMap<String, Vec<NetworkAttachment>>,
}

impl AttachmentMap {
    pub fn build(interfaces: &[NetworkInterface], instance_names: &HashMap<String, String>) -> Self {
        let mut by_group: HashMap<String, Vec<NetworkAttachment>> = HashMap::new();

        for eni in interfaces {
            let attachment = describe_attachment(eni, instance_names);

            // one entry per member group
            for group in &eni.groups {
                by_group
                    .entry(group.group_id.clone())
                    .or_default()
                    .push(attachment.clone());
            }
        }

        AttachmentMap { by_group }
    }

    /// Attachments in interface order; empty when the group is unused.
    pub fn attachments(&self, group_id: &str) -> &[NetworkAttachment] {
        self.by_group
            .get(group_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_used(&self, group_id: &str) -> bool {
        self.by_group.contains_key(group_id)
    }

    pub fn group_count(&self) -> usize {
        self.by_group.len()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn describe_attachment(eni: &NetworkInterface, instance_names: &HashMap<String, String>) -> NetworkAttachment {
    let description = eni.description.as_deref().unwrap_or(PLACEHOLDER);
    let interface_type = eni.interface_type.as_deref().unwrap_or(PLACEHOLDER);

    let instance_id = eni
        .attachment
        .as_ref()
        .and_then(|a| non_empty(a.instance_id.as_deref()));
    let resource_id = instance_id
        .or_else(|| non_empty(eni.description.as_deref()))
        .unwrap_or(PLACEHOLDER)
        .to_string();

    let kind = classify(description, interface_type);
    let resource_name = match kind {
        ResourceKind::Ec2 => instance_names
            .get(&resource_id)
            .map(String::as_str)
            .unwrap_or(PLACEHOLDER)
            .to_string(),
        _ => PLACEHOLDER.to_string(),
    };

    NetworkAttachment {
        interface_id: non_empty(eni.network_interface_id.as_deref())
            .unwrap_or(PLACEHOLDER)
            .to_string(),
        private_ip: non_empty(eni.private_ip_address.as_deref())
            .unwrap_or(PLACEHOLDER)
            .to_string(),
        resource_id,
        kind,
        resource_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GroupIdentifier, InterfaceAttachment, Tag};

    fn eni(id: &str, desc: &str, itype: &str, instance: Option<&str>, groups: &[&str]) -> NetworkInterface {
        NetworkInterface {
            network_interface_id: Some(id.to_string()),
            private_ip_address: Some("10.0.0.5".to_string()),
            description: Some(desc.to_string()),
            interface_type: Some(itype.to_string()),
            vpc_id: None,
            attachment: instance.map(|i| InterfaceAttachment { instance_id: Some(i.to_string()) }),
            groups: groups
                .iter()
                .map(|g| GroupIdentifier { group_id: g.to_string(), group_name: None })
                .collect(),
        }
    }

    fn names() -> HashMap<String, String> {
        let instances = vec![
            Instance {
                instance_id: Some("i-1".into()),
                tags: vec![Tag { key: "Name".into(), value: "api-1".into() }],
            },
            Instance { instance_id: Some("i-2".into()), tags: vec![] },
        ];
        instance_names(&instances)
    }

    #[test]
    fn instance_name_map_defaults_untagged() {
        let names = names();
        assert_eq!(names["i-1"], "api-1");
        assert_eq!(names["i-2"], "-");
    }

    #[test]
    fn ec2_attachment_gets_instance_name() {
        let enis = vec![eni("eni-1", "", "interface", Some("i-1"), &["sg-web"])];
        let map = AttachmentMap::build(&enis, &names());

        let atts = map.attachments("sg-web");
        assert_eq!(atts.len(), 1);
        assert_eq!(atts[0].resource_id, "i-1");
        assert_eq!(atts[0].kind, ResourceKind::Ec2);
        assert_eq!(atts[0].resource_name, "api-1");
    }

    #[test]
    fn non_ec2_attachment_has_no_name() {
        let enis = vec![eni("eni-2", "ELB app/alb/1", "interface", None, &["sg-lb"])];
        let map = AttachmentMap::build(&enis, &names());

        let att = &map.attachments("sg-lb")[0];
        assert_eq!(att.resource_id, "ELB app/alb/1");
        assert_eq!(att.kind, ResourceKind::Elb);
        assert_eq!(att.resource_name, "-");
    }

    #[test]
    fn fans_out_to_every_member_group() {
        let enis = vec![
            eni("eni-1", "", "interface", Some("i-1"), &["sg-a", "sg-b"]),
            eni("eni-2", "", "interface", Some("i-2"), &["sg-a"]),
        ];
        let map = AttachmentMap::build(&enis, &names());

        assert_eq!(map.attachments("sg-a").len(), 2);
        assert_eq!(map.attachments("sg-a")[0].interface_id, "eni-1");
        assert_eq!(map.attachments("sg-b").len(), 1);
        assert_eq!(map.group_count(), 2);
        assert!(map.is_used("sg-b"));
        assert!(!map.is_used("sg-c"));
        assert!(map.attachments("sg-c").is_empty());
    }

    #[test]
    fn missing_fields_degrade_to_placeholder() {
        let bare = NetworkInterface {
            groups: vec![GroupIdentifier { group_id: "sg-x".into(), group_name: None }],
            ..Default::default()
        };
        let map = AttachmentMap::build(&[bare], &HashMap::new());

        let att = &map.attachments("sg-x")[0];
        assert_eq!(att.interface_id, "-");
        assert_eq!(att.private_ip, "-");
        assert_eq!(att.resource_id, "-");
        assert_eq!(att.kind, ResourceKind::Unknown);
        assert_eq!(att.resource_name, "-");
    }
}
