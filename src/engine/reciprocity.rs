//! Reciprocal-rule lookup across the whole flattened table.
//!
//! A rule on group A naming group B is reciprocated when B carries a rule in
//! the opposite direction naming A. Lookups go through a set keyed by
//! (group id, direction, raw origin) built once per run.

use std::collections::HashSet;

use super::flatten::{Direction, FlattenedRuleRow};

pub const SG_ID_PREFIX: &str = "sg-";
pub const ANY_IPV4: &str = "0.0.0.0/0";

/// Outcome for a row whose origin is another group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reciprocity {
    Matched,
    /// No reverse rule. `peer_open` is set when the peer instead allows the
    /// opposite direction to or from `0.0.0.0/0`.
    Dangling { peer_open: bool },
}

#[derive(Debug, Default)]
pub struct ReciprocityIndex<'a> {
    keys: HashSet<(&'a str, Direction, &'a str)>,
}

impl<'a> ReciprocityIndex<'a> {
    pub fn build(rows: &'a [FlattenedRuleRow]) -> Self {
        let keys = rows
            .iter()
            .filter_map(|row| {
                let direction = row.direction?;
                Some((row.group_id.as_str(), direction, row.origin()))
            })
            .collect();
        ReciprocityIndex { keys }
    }

    pub fn has_rule(&self, group_id: &str, direction: Direction, origin: &str) -> bool {
        self.keys.contains(&(group_id, direction, origin))
    }

    /// `None` unless the row references another group by id.
    pub fn resolve(&self, row: &FlattenedRuleRow) -> Option<Reciprocity> {
        let direction = row.direction?;
        let peer = row.origin();
        if !peer.starts_with(SG_ID_PREFIX) {
            return None;
        }

        let reverse = direction.opposite();
        if self.has_rule(peer, reverse, &row.group_id) {
            return Some(Reciprocity::Matched);
        }

        // one hop only: the peer's own openness, nothing transitive
        let peer_open = self.has_rule(peer, reverse, ANY_IPV4);
        Some(Reciprocity::Dangling { peer_open })
    }
}

/// A flattened row together with its cross-reference outcome.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedRow<'a> {
    pub row: &'a FlattenedRuleRow,
    pub reciprocity: Option<Reciprocity>,
}

/// Resolve every row against the full table, preserving row order.
pub fn resolve_mismatches(rows: &[FlattenedRuleRow]) -> Vec<ResolvedRow<'_>> {
    let index = ReciprocityIndex::build(rows);
    rows.iter()
        .map(|row| ResolvedRow {
            row,
            reciprocity: index.resolve(row),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(group: &str, direction: Direction, origin: &str) -> FlattenedRuleRow {
        let (source, destination) = match direction {
            Direction::Inbound => (origin.to_string(), "-".to_string()),
            Direction::Outbound => ("-".to_string(), origin.to_string()),
        };
        FlattenedRuleRow {
            group_name: group.to_string(),
            group_id: group.to_string(),
            group_description: "-".into(),
            region: "us-east-1".into(),
            usage: true,
            direction: Some(direction),
            protocol: "tcp".into(),
            port_range: "5432".into(),
            source_parsed: source.clone(),
            source,
            destination_parsed: destination.clone(),
            destination,
            origin_description: "-".into(),
            resource_name: "-".into(),
            resource_id: "-".into(),
            resource_kind: None,
            interface_id: "-".into(),
            private_ip: "-".into(),
        }
    }

    #[test]
    fn matched_in_both_directions() {
        let rows = vec![
            row("sg-a", Direction::Outbound, "sg-b"),
            row("sg-b", Direction::Inbound, "sg-a"),
        ];
        let resolved = resolve_mismatches(&rows);

        assert_eq!(resolved[0].reciprocity, Some(Reciprocity::Matched));
        assert_eq!(resolved[1].reciprocity, Some(Reciprocity::Matched));
    }

    #[test]
    fn dangling_outbound_notes_open_peer() {
        let rows = vec![
            row("sg-a", Direction::Outbound, "sg-b"),
            row("sg-b", Direction::Inbound, ANY_IPV4),
        ];
        let index = ReciprocityIndex::build(&rows);

        assert_eq!(
            index.resolve(&rows[0]),
            Some(Reciprocity::Dangling { peer_open: true })
        );
        assert_eq!(index.resolve(&rows[1]), None);
    }

    #[test]
    fn dangling_inbound_checks_peer_egress() {
        let rows = vec![
            row("sg-a", Direction::Inbound, "sg-b"),
            // same direction on the peer does not count
            row("sg-b", Direction::Inbound, "sg-a"),
        ];
        let index = ReciprocityIndex::build(&rows);
        assert_eq!(
            index.resolve(&rows[0]),
            Some(Reciprocity::Dangling { peer_open: false })
        );

        let rows = vec![
            row("sg-a", Direction::Inbound, "sg-b"),
            row("sg-b", Direction::Outbound, ANY_IPV4),
        ];
        let index = ReciprocityIndex::build(&rows);
        assert_eq!(
            index.resolve(&rows[0]),
            Some(Reciprocity::Dangling { peer_open: true })
        );
    }

    #[test]
    fn unknown_peer_is_dangling() {
        let rows = vec![row("sg-a", Direction::Outbound, "sg-deleted")];
        let resolved = resolve_mismatches(&rows);
        assert_eq!(
            resolved[0].reciprocity,
            Some(Reciprocity::Dangling { peer_open: false })
        );
    }

    #[test]
    fn cidr_rows_are_not_cross_references() {
        let rows = vec![
            row("sg-a", Direction::Inbound, "10.0.0.0/8"),
            row("sg-a", Direction::Outbound, "::/0"),
        ];
        let resolved = resolve_mismatches(&rows);
        assert!(resolved.iter().all(|r| r.reciprocity.is_none()));
    }
}
