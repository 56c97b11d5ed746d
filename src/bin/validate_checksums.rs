use chrono::Utc;
use clap::Parser;
use fedora_access::config::ConnectionArgs;
use fedora_access::core::report::{read_timestamp, record_run, summary_lines};
use fedora_access::core::RunReport;
use fedora_access::utils::time::parse_since;
use fedora_access::utils::{logger, progress};
use fedora_access::{
    CheckEngine, FedoraError, FedoraSettings, LocalStorage, Repository, ValidateOptions,
    ValidatePipeline,
};

const EXIT_FINDINGS: i32 = 4;

#[derive(Parser)]
#[command(name = "validate-checksums")]
#[command(about = "Validate datastream checksums, optionally only for recently modified objects")]
struct Args {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Objects to check; all objects in the Resource Index when omitted
    pids: Vec<String>,

    /// Only objects modified since this date (YYYY-MM-DD or full timestamp)
    #[arg(long)]
    since: Option<String>,

    /// File holding the time of the last successful run
    #[arg(long)]
    timestamp_file: Option<String>,

    /// Check every version of each datastream
    #[arg(long)]
    all_versions: bool,

    #[arg(long)]
    max_objects: Option<usize>,

    /// Write problem datastreams to this CSV file
    #[arg(long)]
    csv_file: Option<String>,

    #[arg(short, long)]
    quiet: bool,

    #[arg(short, long)]
    verbose: bool,

    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if args.json_logs {
        logger::init_json_logger(args.verbose, args.quiet);
    } else {
        logger::init_cli_logger(args.verbose, args.quiet);
    }

    let code = match run(&args).await {
        Ok(report) if report.outcome.has_findings() => EXIT_FINDINGS,
        Ok(_) => 0,
        Err(e) => {
            tracing::error!(
                "❌ Validation failed: {} (Category: {:?}, Severity: {:?})",
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

async fn run(args: &Args) -> Result<RunReport, FedoraError> {
    let settings = FedoraSettings::load(&args.connection)?;
    let storage = LocalStorage::new(".".to_string());
    let timestamp_file = args
        .timestamp_file
        .clone()
        .or(settings.timestamp_file.clone());

    // --since 優先；否則使用上次成功執行的時間
    let since = match (&args.since, &timestamp_file) {
        (Some(value), _) => Some(parse_since(value)?),
        (None, Some(path)) => {
            let last = read_timestamp(&storage, path).await?;
            if let Some(when) = &last {
                tracing::info!("⏱️ Last run recorded in {}: {}", path, when);
            }
            last
        }
        (None, None) => None,
    };

    let started = Utc::now();
    let repository = Repository::from_config(&settings)?;
    let options = ValidateOptions {
        pids: args.pids.clone(),
        all_versions: args.all_versions,
        since,
        max_objects: args.max_objects,
        csv_file: args.csv_file.clone().or(settings.csv_file.clone()),
        concurrency: settings.concurrent_requests,
    };

    let (bar, hook) = progress::object_progress(args.quiet);
    let pipeline = ValidatePipeline::new(storage.clone(), repository, options).with_progress(hook);
    let result = CheckEngine::new(pipeline).run().await;
    bar.finish_and_clear();
    let report = result?;

    if let Some(path) = &timestamp_file {
        if record_run(&storage, path, &started, &report.outcome).await? {
            tracing::debug!("Recorded run start time in {}", path);
        }
    }

    if !args.quiet {
        for line in summary_lines(&report.outcome) {
            println!("{}", line);
        }
        if let Some(path) = &report.report_path {
            println!("📁 Report saved to: {}", path);
        }
    }
    Ok(report)
}
