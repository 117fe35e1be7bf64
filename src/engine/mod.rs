//! Security-group correlation and governance engine.
//!
//! Stages run strictly in order over one immutable [`Snapshot`]:
//! classify and index, map attachments, flatten rules, resolve cross
//! references over the full table, then evaluate findings. Nothing here
//! performs I/O or keeps state between runs.

pub mod attachments;
pub mod classify;
pub mod findings;
pub mod flatten;
pub mod index;
pub mod reciprocity;
pub mod summary;

use serde::{Serialize, Serializer};
use std::fmt;
use tracing::debug;

use crate::model::{Snapshot, PLACEHOLDER};
use attachments::{instance_names, AttachmentMap};
use findings::{findings_table, FindingRow, Severity};
use flatten::{flatten, FlattenedRuleRow};
use index::{GroupRules, SecurityGroupIndex};
use reciprocity::resolve_mismatches;
use summary::{summarize, SummaryRow};

pub use classify::ResourceKind;
pub use findings::Finding;
pub use flatten::Direction;

/// Serialize an optional column as its display text, or `-` when absent.
pub(crate) fn dash<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    T: fmt::Display,
    S: Serializer,
{
    match value {
        Some(v) => serializer.collect_str(v),
        None => serializer.serialize_str(PLACEHOLDER),
    }
}

/// Which of the three tables to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputShape {
    Summary,
    Detail,
    Findings,
}

impl fmt::Display for OutputShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OutputShape::Summary => "summary",
            OutputShape::Detail => "detail",
            OutputShape::Findings => "findings",
        };
        write!(f, "{}", s)
    }
}

/// The three tables one run produces.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub region: String,
    pub summary: Vec<SummaryRow>,
    pub detail: Vec<FlattenedRuleRow>,
    pub findings: Vec<FindingRow>,
}

impl Report {
    pub fn worst_severity(&self) -> Option<Severity> {
        self.findings.iter().map(|f| f.severity).max()
    }

    /// Findings at `severity`, counting each finding joined into a row.
    pub fn count(&self, severity: Severity) -> usize {
        self.findings.iter().map(|f| f.count(severity)).sum()
    }

    /// 2 on any critical finding, 1 on any high, else 0.
    pub fn exit_code(&self) -> i32 {
        match self.worst_severity() {
            Some(Severity::Critical) => 2,
            Some(Severity::High) => 1,
            _ => 0,
        }
    }
}

/// Run the full pipeline over one snapshot.
pub fn analyze(snapshot: &Snapshot) -> Report {
    let region = snapshot.region();
    let groups = &snapshot.security_groups;

    let index = SecurityGroupIndex::build(groups);
    let names = instance_names(snapshot.instances());
    let attachments = AttachmentMap::build(&snapshot.network_interfaces, &names);
    debug!(
        groups = index.len(),
        attached_groups = attachments.group_count(),
        instances = names.len(),
        "indexed snapshot"
    );

    let mut summary = Vec::new();
    let mut detail = Vec::new();
    for sg in groups {
        let rules = index.rules(&sg.group_id).unwrap_or(GroupRules {
            inbound: &sg.ip_permissions,
            outbound: &sg.ip_permissions_egress,
        });
        summary.extend(summarize(sg, &index, &attachments, region));
        detail.extend(flatten(sg, rules, &index, &attachments, region));
    }
    debug!(summary = summary.len(), detail = detail.len(), "flattened rules");

    let resolved = resolve_mismatches(&detail);
    let findings = findings_table(&resolved);
    debug!(findings = findings.len(), "evaluated findings");

    Report {
        region: region.to_string(),
        summary,
        detail,
        findings,
    }
}
