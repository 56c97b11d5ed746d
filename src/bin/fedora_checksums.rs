use clap::{Args, Parser, Subcommand};
use fedora_access::config::ConnectionArgs;
use fedora_access::core::RunReport;
use fedora_access::utils::{logger, progress};
use fedora_access::{
    CheckEngine, ChecksumType, FedoraError, FedoraSettings, LocalStorage, RepairOptions,
    RepairPipeline, Repository, ValidateOptions, ValidatePipeline,
};

/// Exit status when invalid or missing checksums were found.
const EXIT_FINDINGS: i32 = 4;

#[derive(Parser)]
#[command(name = "fedora-checksums")]
#[command(about = "Validate or repair datastream checksums in a Fedora repository")]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ask Fedora to validate stored checksums
    Validate(ValidateArgs),
    /// Set checksums on datastreams that have none
    Repair(RepairArgs),
}

#[derive(Args)]
struct CommonArgs {
    /// Objects to check; all objects in the Resource Index when omitted
    pids: Vec<String>,

    /// Write problem datastreams to this CSV file
    #[arg(long)]
    csv_file: Option<String>,

    /// Stop after this many objects
    #[arg(long)]
    max_objects: Option<usize>,
}

#[derive(Args)]
struct ValidateArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Check every version of each datastream, not just the latest
    #[arg(long)]
    all_versions: bool,
}

#[derive(Args)]
struct RepairArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Checksum algorithm to set (MD5, SHA-1, SHA-256, SHA-384, SHA-512)
    #[arg(long)]
    checksum_type: Option<String>,

    /// Report what would change without modifying anything
    #[arg(long)]
    dry_run: bool,

    /// Reset checksums even on datastreams that already have one
    #[arg(long)]
    force: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger(cli.verbose, cli.quiet);
    } else {
        logger::init_cli_logger(cli.verbose, cli.quiet);
    }

    let code = match run(&cli).await {
        Ok(report) => {
            if report.outcome.has_findings() {
                EXIT_FINDINGS
            } else {
                0
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ Checksum run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            e.exit_code()
        }
    };
    std::process::exit(code);
}

async fn run(cli: &Cli) -> Result<RunReport, FedoraError> {
    let settings = FedoraSettings::load(&cli.connection)?;
    tracing::debug!("Using Fedora at {}", settings.root);

    let repository = Repository::from_config(&settings)?;
    let storage = LocalStorage::new(".".to_string());
    let (bar, hook) = progress::object_progress(cli.quiet);

    let result = match &cli.command {
        Command::Validate(args) => {
            let options = ValidateOptions {
                pids: args.common.pids.clone(),
                all_versions: args.all_versions,
                since: None,
                max_objects: args.common.max_objects,
                csv_file: args.common.csv_file.clone().or(settings.csv_file.clone()),
                concurrency: settings.concurrent_requests,
            };
            let pipeline = ValidatePipeline::new(storage, repository, options).with_progress(hook);
            CheckEngine::new(pipeline).run().await
        }
        Command::Repair(args) => {
            let checksum_type = match &args.checksum_type {
                Some(value) => value.parse::<ChecksumType>()?,
                None => settings.checksum_type.unwrap_or_default(),
            };
            let options = RepairOptions {
                pids: args.common.pids.clone(),
                checksum_type,
                dry_run: args.dry_run,
                force: args.force,
                max_objects: args.common.max_objects,
                csv_file: args.common.csv_file.clone().or(settings.csv_file.clone()),
                concurrency: settings.concurrent_requests,
            };
            let pipeline = RepairPipeline::new(storage, repository, options).with_progress(hook);
            CheckEngine::new(pipeline).run().await
        }
    };
    bar.finish_and_clear();

    let report = result?;
    if !cli.quiet {
        for line in fedora_access::core::report::summary_lines(&report.outcome) {
            println!("{}", line);
        }
        if let Some(path) = &report.report_path {
            println!("📁 Report saved to: {}", path);
        }
    }
    Ok(report)
}
