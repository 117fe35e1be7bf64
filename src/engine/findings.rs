use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

use super::flatten::{Direction, FlattenedRuleRow};
use super::reciprocity::{Reciprocity, ResolvedRow, ANY_IPV4};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        };
        write!(f, "{}", s)
    }
}

/// A governance violation on one flattened row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    /// Inbound from anywhere on SSH or on every protocol.
    OpenIngressCritical,
    /// Outbound to anywhere on every protocol.
    OpenEgressAll,
    UnusedGroup,
    /// References a peer group that has no rule pointing back.
    DanglingReference {
        direction: Direction,
        peer: String,
        peer_open: bool,
    },
}

impl Finding {
    pub fn severity(&self) -> Severity {
        match self {
            Finding::OpenIngressCritical => Severity::Critical,
            Finding::OpenEgressAll => Severity::High,
            Finding::DanglingReference { .. } => Severity::Medium,
            Finding::UnusedGroup => Severity::Low,
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::OpenIngressCritical => write!(f, "Inbound {} open (22/ALL)", ANY_IPV4),
            Finding::OpenEgressAll => write!(f, "Outbound {} open (ALL)", ANY_IPV4),
            Finding::UnusedGroup => write!(f, "Unused SG"),
            Finding::DanglingReference { direction, peer, peer_open } => {
                let missing = match direction {
                    Direction::Inbound => "outbound",
                    Direction::Outbound => "inbound",
                };
                write!(f, "{} references {} but no matching {}", direction, peer, missing)?;
                if *peer_open {
                    write!(f, " (note: {} open to {})", peer, ANY_IPV4)?;
                }
                Ok(())
            }
        }
    }
}

/// `22`, `22-<to>` or `22:<to>`.
fn starts_at_ssh(port_range: &str) -> bool {
    port_range == "22" || port_range.starts_with("22-") || port_range.starts_with("22:")
}

/// Findings for one row, in fixed order.
pub fn evaluate(row: &FlattenedRuleRow, reciprocity: Option<Reciprocity>) -> Vec<Finding> {
    let mut findings = Vec::new();
    let all_protocols = row.protocol.eq_ignore_ascii_case("all");

    if row.direction == Some(Direction::Inbound)
        && row.source == ANY_IPV4
        && (starts_at_ssh(&row.port_range) || all_protocols)
    {
        findings.push(Finding::OpenIngressCritical);
    }

    if row.direction == Some(Direction::Outbound) && row.destination == ANY_IPV4 && all_protocols {
        findings.push(Finding::OpenEgressAll);
    }

    if !row.usage {
        findings.push(Finding::UnusedGroup);
    }

    if let (Some(direction), Some(Reciprocity::Dangling { peer_open })) = (row.direction, reciprocity) {
        findings.push(Finding::DanglingReference {
            direction,
            peer: row.origin_parsed().to_string(),
            peer_open,
        });
    }

    findings
}

/// A row of the findings-only view: bookkeeping columns dropped, findings
/// first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FindingRow {
    #[serde(rename = "Findings")]
    pub findings: String,
    #[serde(rename = "Security Group Name")]
    pub group_name: String,
    #[serde(rename = "Direction")]
    pub direction: String,
    #[serde(rename = "Protocol")]
    pub protocol: String,
    #[serde(rename = "Port Range")]
    pub port_range: String,
    #[serde(rename = "Src Parsed")]
    pub source_parsed: String,
    #[serde(rename = "Des Parsed")]
    pub destination_parsed: String,
    #[serde(rename = "Rules Src/Dst Description")]
    pub origin_description: String,
    /// Worst severity among the joined findings.
    #[serde(skip)]
    pub severity: Severity,
    /// Severity of each joined finding, in text order.
    #[serde(skip)]
    pub severities: Vec<Severity>,
}

impl FindingRow {
    /// `None` when the row has no findings.
    pub fn from_findings(row: &FlattenedRuleRow, findings: &[Finding]) -> Option<Self> {
        let severities: Vec<Severity> = findings.iter().map(Finding::severity).collect();
        let severity = severities.iter().copied().max()?;
        let text = findings
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");

        Some(FindingRow {
            findings: text,
            group_name: row.group_name.clone(),
            direction: row
                .direction
                .map_or_else(|| crate::model::PLACEHOLDER.to_string(), |d| d.to_string()),
            protocol: row.protocol.clone(),
            port_range: row.port_range.clone(),
            source_parsed: row.source_parsed.clone(),
            destination_parsed: row.destination_parsed.clone(),
            origin_description: row.origin_description.clone(),
            severity,
            severities,
        })
    }

    /// Number of joined findings at `severity`.
    pub fn count(&self, severity: Severity) -> usize {
        self.severities.iter().filter(|s| **s == severity).count()
    }
}

/// Evaluate every resolved row; keep rows with findings, collapsing
/// duplicates in first-seen order.
pub fn findings_table(resolved: &[ResolvedRow<'_>]) -> Vec<FindingRow> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for r in resolved {
        let findings = evaluate(r.row, r.reciprocity);
        if let Some(finding_row) = FindingRow::from_findings(r.row, &findings) {
            if seen.insert(finding_row.clone()) {
                out.push(finding_row);
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(direction: Option<Direction>, protocol: &str, ports: &str, origin: &str) -> FlattenedRuleRow {
        let dash = || "-".to_string();
        let (source, destination) = match direction {
            Some(Direction::Inbound) => (origin.to_string(), dash()),
            Some(Direction::Outbound) => (dash(), origin.to_string()),
            None => (dash(), dash()),
        };
        FlattenedRuleRow {
            group_name: "web".into(),
            group_id: "sg-web".into(),
            group_description: "-".into(),
            region: "us-east-1".into(),
            usage: true,
            direction,
            protocol: protocol.into(),
            port_range: ports.into(),
            source_parsed: source.clone(),
            source,
            destination_parsed: destination.clone(),
            destination,
            origin_description: "-".into(),
            resource_name: "api-1".into(),
            resource_id: "i-1".into(),
            resource_kind: None,
            interface_id: "eni-1".into(),
            private_ip: "10.0.0.1".into(),
        }
    }

    #[test]
    fn open_ssh_ingress() {
        let r = row(Some(Direction::Inbound), "tcp", "22", ANY_IPV4);
        assert_eq!(evaluate(&r, None), vec![Finding::OpenIngressCritical]);

        let r = row(Some(Direction::Inbound), "tcp", "22-25", ANY_IPV4);
        assert_eq!(evaluate(&r, None), vec![Finding::OpenIngressCritical]);

        let r = row(Some(Direction::Inbound), "tcp", "8080", ANY_IPV4);
        assert!(evaluate(&r, None).is_empty());

        // 2222 must not look like 22
        let r = row(Some(Direction::Inbound), "tcp", "2222", ANY_IPV4);
        assert!(evaluate(&r, None).is_empty());

        let r = row(Some(Direction::Inbound), "tcp", "22", "10.0.0.0/8");
        assert!(evaluate(&r, None).is_empty());
    }

    #[test]
    fn open_all_protocols_ingress() {
        let r = row(Some(Direction::Inbound), "all", "-", ANY_IPV4);
        assert_eq!(evaluate(&r, None), vec![Finding::OpenIngressCritical]);
    }

    #[test]
    fn open_egress_needs_all_protocols() {
        let r = row(Some(Direction::Outbound), "all", "-", ANY_IPV4);
        assert_eq!(evaluate(&r, None), vec![Finding::OpenEgressAll]);

        let r = row(Some(Direction::Outbound), "tcp", "443", ANY_IPV4);
        assert!(evaluate(&r, None).is_empty());
    }

    #[test]
    fn unused_group_on_placeholder_row() {
        let mut r = row(None, "-", "-", "-");
        r.usage = false;
        assert_eq!(evaluate(&r, None), vec![Finding::UnusedGroup]);
    }

    #[test]
    fn dangling_reference_text() {
        let mut r = row(Some(Direction::Outbound), "tcp", "5432", "sg-db");
        r.destination_parsed = "database".into();

        let plain = evaluate(&r, Some(Reciprocity::Dangling { peer_open: false }));
        assert_eq!(
            plain[0].to_string(),
            "Outbound references database but no matching inbound"
        );

        let open = evaluate(&r, Some(Reciprocity::Dangling { peer_open: true }));
        assert_eq!(
            open[0].to_string(),
            "Outbound references database but no matching inbound (note: database open to 0.0.0.0/0)"
        );

        assert!(evaluate(&r, Some(Reciprocity::Matched)).is_empty());

        let r = row(Some(Direction::Inbound), "tcp", "5432", "sg-app");
        let found = evaluate(&r, Some(Reciprocity::Dangling { peer_open: false }));
        assert_eq!(
            found[0].to_string(),
            "Inbound references sg-app but no matching outbound"
        );
    }

    #[test]
    fn findings_join_and_severity() {
        let mut r = row(Some(Direction::Outbound), "all", "-", ANY_IPV4);
        r.usage = false;
        let findings = evaluate(&r, None);
        let finding_row = FindingRow::from_findings(&r, &findings).unwrap();

        assert_eq!(finding_row.findings, "Outbound 0.0.0.0/0 open (ALL), Unused SG");
        assert_eq!(finding_row.severity, Severity::High);
        assert_eq!(finding_row.count(Severity::High), 1);
        assert_eq!(finding_row.count(Severity::Low), 1);
        assert_eq!(finding_row.count(Severity::Critical), 0);
        assert_eq!(finding_row.direction, "Outbound");
        assert!(FindingRow::from_findings(&r, &[]).is_none());
    }

    #[test]
    fn table_drops_clean_rows_and_duplicates() {
        let open = row(Some(Direction::Inbound), "tcp", "22", ANY_IPV4);
        let mut second_eni = open.clone();
        second_eni.interface_id = "eni-2".into();
        second_eni.resource_id = "i-2".into();
        let clean = row(Some(Direction::Inbound), "tcp", "443", "10.0.0.0/8");

        let rows = vec![open, clean, second_eni];
        let resolved: Vec<_> = rows
            .iter()
            .map(|row| ResolvedRow { row, reciprocity: None })
            .collect();

        let table = findings_table(&resolved);
        assert_eq!(table.len(), 1);
        assert_eq!(table[0].findings, "Inbound 0.0.0.0/0 open (22/ALL)");
        assert_eq!(table[0].severity, Severity::Critical);
    }
}
