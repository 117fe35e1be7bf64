use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{Result, SgMapError};

pub const DEFAULT_REGION: &str = "us-east-1";

/// Regions visited by `--all-regions`.
pub const ALL_REGIONS: &[&str] = &[
    "us-east-1",
    "us-east-2",
    "us-west-1",
    "us-west-2",
    "eu-west-1",
    "eu-west-2",
    "eu-central-1",
    "ap-southeast-1",
    "ap-southeast-2",
    "ap-northeast-1",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown format `{}` (expected text or json)", other)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Where snapshots come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Live `aws ec2 describe-*` calls.
    AwsCli,
    /// A snapshot file written by `dump` or assembled by hand.
    File(PathBuf),
}

/// Resolved settings for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub regions: Vec<String>,
    /// Explicit region, which also relabels a snapshot file's rows.
    pub region_override: Option<String>,
    pub vpc: Option<String>,
    pub source: Source,
    pub format: OutputFormat,
    pub strict: bool,
}

impl RunConfig {
    pub fn new(
        region: Option<&str>,
        all_regions: bool,
        vpc: Option<String>,
        input: Option<PathBuf>,
        format: OutputFormat,
        strict: bool,
    ) -> Result<Self> {
        if all_regions && input.is_some() {
            return Err(SgMapError::Config(
                "--all-regions cannot be combined with --input".to_string(),
            ));
        }

        let regions = if all_regions {
            ALL_REGIONS.iter().map(|r| r.to_string()).collect()
        } else {
            vec![region.unwrap_or(DEFAULT_REGION).to_string()]
        };

        Ok(RunConfig {
            regions,
            region_override: region.map(String::from),
            vpc,
            source: input.map_or(Source::AwsCli, Source::File),
            format,
            strict,
        })
    }
}
