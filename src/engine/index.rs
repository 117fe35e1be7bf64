use std::collections::HashMap;

use crate::model::{name_tag, IpPermission, SecurityGroup, PLACEHOLDER};

/// A group's own rules, split by direction.
#[derive(Debug, Clone, Copy)]
pub struct GroupRules<'a> {
    pub inbound: &'a [IpPermission],
    pub outbound: &'a [IpPermission],
}

impl GroupRules<'_> {
    pub fn is_empty(&self) -> bool {
        self.inbound.is_empty() && self.outbound.is_empty()
    }
}

/// Lookup tables over the fetched group list: id to display name and id to
/// the group's raw rule set.
#[derive(Debug, Default)]
pub struct SecurityGroupIndex<'a> {
    names: HashMap<&'a str, String>,
    rules: HashMap<&'a str, GroupRules<'a>>,
}

impl<'a> SecurityGroupIndex<'a> {
    pub fn build(groups: &'a [SecurityGroup]) -> Self {
        let mut index = SecurityGroupIndex::default();

        for sg in groups {
            let id = sg.group_id.as_str();
            index.names.insert(id, display_name(sg));
            index.rules.insert(
                id,
                GroupRules {
                    inbound: &sg.ip_permissions,
                    outbound: &sg.ip_permissions_egress,
                },
            );
        }

        index
    }

    pub fn name(&self, group_id: &str) -> Option<&str> {
        self.names.get(group_id).map(String::as_str)
    }

    pub fn rules(&self, group_id: &str) -> Option<GroupRules<'a>> {
        self.rules.get(group_id).copied()
    }

    pub fn contains(&self, group_id: &str) -> bool {
        self.names.contains_key(group_id)
    }

    /// Display value for a rule origin: the group's name when the origin is
    /// a known group id, otherwise the origin itself.
    pub fn resolve_origin<'s>(&'s self, origin: &'s str) -> &'s str {
        self.name(origin).unwrap_or(origin)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// `Name` tag, else the group name. The default group always shows as
/// `default` whatever its tags say.
pub fn display_name(sg: &SecurityGroup) -> String {
    let group_name = sg.group_name.as_deref().unwrap_or(PLACEHOLDER);
    if group_name == "default" {
        return "default".to_string();
    }
    name_tag(&sg.tags).unwrap_or(group_name).to_string()
}
