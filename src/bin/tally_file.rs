use clap::Parser;
use sheet_tally::utils::error::ErrorSeverity;
use sheet_tally::utils::{logger, validation::Validate};
use sheet_tally::{AppConfig, LocalStorage, ReportEngine, ReportOutcome, SheetPipeline};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tally-file")]
#[command(about = "Build the count report for a local spreadsheet")]
struct Args {
    /// Spreadsheet to tally (.xlsx, .xlsm, .xlsb, .xls, .ods or .csv)
    #[arg(short, long)]
    input: PathBuf,

    /// Path to TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory the report workbook is written to (overrides storage.public_dir)
    #[arg(short, long)]
    output_dir: Option<String>,

    /// Print the reports as JSON instead of a text summary
    #[arg(long)]
    json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn print_summary(outcome: &ReportOutcome) {
    println!("✅ Tallied {} records", outcome.records_read);
    for report in outcome.reports.reports() {
        println!();
        println!("{}", report.sheet_name());
        if report.rows.is_empty() {
            println!("  (no entries)");
        }
        for row in &report.rows {
            println!("  {:<30} {:>6}", row.key, row.count);
        }
    }
    println!();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);

    let mut config = match &args.config {
        Some(path) => match AppConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("❌ Failed to load config file '{}': {}", path.display(), e);
                eprintln!("💡 Make sure the file exists and is valid TOML format");
                std::process::exit(1);
            }
        },
        None => AppConfig::default(),
    };

    if let Some(dir) = &args.output_dir {
        config.storage.public_dir = dir.clone();
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let output_dir = config.storage.public_dir.clone();
    let storage = LocalStorage::new(&output_dir);
    let pipeline = SheetPipeline::new(storage, config, &args.input);
    let engine = ReportEngine::new(pipeline);

    match engine.run().await {
        Ok(outcome) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print_summary(&outcome);
                println!(
                    "📁 Output saved to: {}",
                    PathBuf::from(&output_dir)
                        .join(outcome.output_path.trim_start_matches('/'))
                        .display()
                );
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ Report run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
