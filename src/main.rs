use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use colored::*;
use std::path::PathBuf;

use sgmap::config::{OutputFormat, RunConfig, Source};
use sgmap::engine::findings::Severity;
use sgmap::{analyze, aws, logging, render, OutputShape, Report, Snapshot};

#[derive(Parser)]
#[command(name = "sgmap")]
#[command(about = "Security group relationship and governance analysis", long_about = None)]
struct Cli {
    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ScanArgs {
    /// AWS Region
    #[arg(short, long, env = "AWS_REGION")]
    region: Option<String>,

    /// VPC ID to filter
    #[arg(long)]
    vpc: Option<String>,

    /// Read a snapshot file instead of calling the AWS CLI
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output format: text or json
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    /// Scan all regions
    #[arg(long)]
    all_regions: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// One row per security group and attached resource
    Summary {
        #[command(flatten)]
        scan: ScanArgs,
    },

    /// One row per rule origin and attached resource
    Detail {
        #[command(flatten)]
        scan: ScanArgs,
    },

    /// Governance findings only
    Findings {
        #[command(flatten)]
        scan: ScanArgs,

        /// Exit with error code if issues found
        #[arg(long)]
        strict: bool,
    },

    /// Save a live snapshot for offline runs
    Dump {
        /// AWS Region
        #[arg(short, long, env = "AWS_REGION", default_value = sgmap::config::DEFAULT_REGION)]
        region: String,

        /// VPC ID to filter
        #[arg(long)]
        vpc: Option<String>,

        /// Snapshot file to write
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let (shape, scan, strict) = match cli.command {
        Commands::Summary { scan } => (OutputShape::Summary, scan, false),
        Commands::Detail { scan } => (OutputShape::Detail, scan, false),
        Commands::Findings { scan, strict } => (OutputShape::Findings, scan, strict),
        Commands::Dump { region, vpc, output } => {
            let snapshot = aws::collect_snapshot(&region, vpc.as_deref())?;
            aws::write_snapshot(&snapshot, &output)?;
            println!(
                "{} Saved {} security group(s) to: {}",
                "✅".green(),
                snapshot.security_groups.len().to_string().cyan(),
                output.display().to_string().cyan().bold()
            );
            return Ok(());
        }
    };

    let config = RunConfig::new(
        scan.region.as_deref(),
        scan.all_regions,
        scan.vpc,
        scan.input,
        scan.format,
        strict,
    )?;

    let exit_code = run(&config, shape)?;
    if config.strict && exit_code != 0 {
        std::process::exit(exit_code);
    }

    Ok(())
}

fn load(config: &RunConfig, region: &str) -> sgmap::Result<Snapshot> {
    match &config.source {
        Source::AwsCli => aws::collect_snapshot(region, config.vpc.as_deref()),
        Source::File(path) => {
            aws::load_snapshot(path, config.region_override.as_deref(), config.vpc.as_deref())
        }
    }
}

/// Analyze every configured region in turn. A failing region is reported
/// and skipped; the worst exit code across regions is returned. JSON for a
/// multi-region run is printed once, as an array.
fn run(config: &RunConfig, shape: OutputShape) -> Result<i32> {
    let text = config.format == OutputFormat::Text;
    let multi = config.regions.len() > 1;
    let mut max_exit_code = 0;
    let mut json_reports = Vec::new();

    if text {
        println!("{}", format!("🔒 Security Group {}", shape).cyan().bold());
        println!("{}", "═".repeat(70).bright_black());
        if let Some(vpc) = &config.vpc {
            println!("VPC Filter: {}", vpc.yellow());
        }
    }

    for region in &config.regions {
        if text && multi {
            println!("{} Scanning {}...", "→".cyan(), region.yellow());
        }

        let snapshot = match load(config, region) {
            Ok(snapshot) => snapshot,
            Err(e) if multi => {
                if text {
                    println!("  {} Error: {}", "✗".red(), e);
                } else {
                    eprintln!("{}: {}", region, e);
                }
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let report = analyze(&snapshot);
        max_exit_code = max_exit_code.max(report.exit_code());

        match config.format {
            OutputFormat::Json if multi => json_reports.push(report),
            OutputFormat::Json => println!("{}", render::render_json(&report, shape)?),
            OutputFormat::Text => print_text(&report, shape),
        }
    }

    if multi && !text {
        println!("{}", render::render_json_all(&json_reports, shape)?);
    }

    Ok(max_exit_code)
}

fn print_text(report: &Report, shape: OutputShape) {
    println!("Region: {}", report.region.yellow());
    println!();
    print!("{}", render::render_text(report, shape));
    println!("{}", "═".repeat(70).bright_black());

    match shape {
        OutputShape::Summary => {
            let unused = report.summary.iter().filter(|r| !r.usage).count();
            println!(
                "Total: {} row(s), {} unused security group(s)",
                report.summary.len().to_string().green().bold(),
                unused.to_string().yellow()
            );
        }
        OutputShape::Detail => {
            println!("Total: {} rule row(s)", report.detail.len().to_string().green().bold());
        }
        OutputShape::Findings => {
            if report.findings.is_empty() {
                println!("{}", "No findings".green().bold());
                return;
            }
            println!(
                "Summary: {} critical, {} high, {} medium, {} low",
                report.count(Severity::Critical).to_string().red().bold(),
                report.count(Severity::High).to_string().yellow().bold(),
                report.count(Severity::Medium).to_string().bright_yellow(),
                report.count(Severity::Low).to_string().bright_black()
            );
        }
    }
    println!();
}
