//! Snapshot collection through the AWS CLI, and snapshot files on disk.

use std::fs;
use std::path::Path;
use std::process::Command;
use std::thread;
use std::time::Duration;

use rand::Rng;
use tracing::{info, warn};

use crate::error::{Result, SgMapError};
use crate::model::Snapshot;

const MAX_ATTEMPTS: u32 = 5;
const MAX_BACKOFF_SECS: u64 = 30;

const THROTTLING_CODES: &[&str] = &[
    "Throttling",
    "ThrottlingException",
    "RequestLimitExceeded",
    "TooManyRequestsException",
];

fn is_throttled(stderr: &str) -> bool {
    THROTTLING_CODES.iter().any(|code| stderr.contains(code))
}

/// `min(2^attempt + jitter, 30)` seconds, with `jitter` in `[0, 1)`.
fn backoff(attempt: u32, jitter: f64) -> Duration {
    let secs = 2u64.saturating_pow(attempt) as f64 + jitter.clamp(0.0, 1.0);
    Duration::from_secs_f64(secs.min(MAX_BACKOFF_SECS as f64))
}

fn jitter() -> f64 {
    rand::rng().random_range(0.0..1.0)
}

/// Run one `aws ec2 <operation>` call and parse its stdout as a (partial)
/// snapshot. Throttling is retried with exponential backoff; any other
/// failure is returned immediately.
fn describe(operation: &str, region: &str, vpc_filter: Option<&str>) -> Result<Snapshot> {
    let mut args = vec!["ec2", operation, "--region", region, "--output", "json"];
    let filter_arg;
    if let Some(vpc) = vpc_filter {
        filter_arg = format!("Name=vpc-id,Values={}", vpc);
        args.extend(["--filters", filter_arg.as_str()]);
    }
    let command = format!("aws {}", args.join(" "));

    for attempt in 1..=MAX_ATTEMPTS {
        info!(%command, attempt, "calling aws cli");
        let output = Command::new("aws").args(&args).output()?;

        if output.status.success() {
            return Ok(serde_json::from_slice(&output.stdout)?);
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !is_throttled(&stderr) {
            return Err(SgMapError::AwsCli {
                command,
                status: output.status.to_string(),
                stderr,
            });
        }

        if attempt < MAX_ATTEMPTS {
            let wait = backoff(attempt, jitter());
            warn!(%command, attempt, wait_ms = wait.as_millis() as u64, "throttled, retrying");
            thread::sleep(wait);
        }
    }

    Err(SgMapError::Throttled {
        command,
        attempts: MAX_ATTEMPTS,
    })
}

fn join<T>(handle: thread::ScopedJoinHandle<'_, T>) -> T {
    handle
        .join()
        .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
}

/// Fetch groups, interfaces and instances for one region. The three calls
/// run concurrently; the snapshot is only returned once all three succeed.
pub fn collect_snapshot(region: &str, vpc_filter: Option<&str>) -> Result<Snapshot> {
    let (groups, interfaces, instances) = thread::scope(|s| {
        let groups = s.spawn(|| describe("describe-security-groups", region, vpc_filter));
        let interfaces = s.spawn(|| describe("describe-network-interfaces", region, vpc_filter));
        let instances = s.spawn(|| describe("describe-instances", region, vpc_filter));

        (join(groups), join(interfaces), join(instances))
    });

    let snapshot = Snapshot {
        region: Some(region.to_string()),
        security_groups: groups?.security_groups,
        network_interfaces: interfaces?.network_interfaces,
        reservations: instances?.reservations,
    };

    info!(
        region,
        groups = snapshot.security_groups.len(),
        interfaces = snapshot.network_interfaces.len(),
        "collected snapshot"
    );
    Ok(snapshot)
}

/// Read a snapshot file. `region_override` replaces the file's region label
/// when given; `vpc_filter` keeps only that VPC's groups and interfaces.
pub fn load_snapshot(
    path: &Path,
    region_override: Option<&str>,
    vpc_filter: Option<&str>,
) -> Result<Snapshot> {
    let raw = fs::read_to_string(path)?;
    let mut snapshot: Snapshot = serde_json::from_str(&raw)?;

    if let Some(region) = region_override {
        snapshot.region = Some(region.to_string());
    }
    if let Some(vpc) = vpc_filter {
        snapshot.retain_vpc(vpc);
    }

    info!(
        path = %path.display(),
        groups = snapshot.security_groups.len(),
        "loaded snapshot"
    );
    Ok(snapshot)
}

pub fn write_snapshot(snapshot: &Snapshot, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(snapshot)?;
    fs::write(path, json)?;
    Ok(())
}
