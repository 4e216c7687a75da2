mod manifest;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use printkiosk_checkout::{
    CheckoutFlow, CheckoutOutcome, CheckoutState, CounterPaymentGateway, KioskWorkflow,
    LogReceiptNotifier,
};
use printkiosk_printing::{
    inspect_page_range, BatchOptions, ColorMode, DuplexMode, PageSelection, PrintProgress,
    SpoolDirectoryDispatcher,
};
use printkiosk_session::{
    LocalDirectoryLister, LocalFile, LopdfPageCounter, MirrorDirectoryStore, PageCounter,
    RemoteFallback, RemoteStore, SessionFiles, SessionToken, StoreDownloader,
};
use printkiosk_settings::ConfigStore;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::manifest::OrderManifest;

const DEFAULT_CONFIG_FILE: &str = "printkiosk.json";

#[derive(Parser)]
#[command(
    name = "printkiosk",
    about = "Operator commands for the PrintKiosk self-service print shop",
    author,
    version
)]
struct Cli {
    /// 設定檔路徑。 / Kiosk configuration file (defaults to ./printkiosk.json).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// 記錄層級。 / Log level used when RUST_LOG is not set.
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 工作階段代碼。 / Session tokens.
    #[command(subcommand)]
    Session(SessionCommand),
    /// 列出工作階段上傳的檔案。 / List the files uploaded for a session.
    Files(FilesArgs),
    /// 計算 PDF 頁數。 / Count the pages of a PDF.
    Pages(PagesArgs),
    /// 試算文件列印費用。 / Price a document print job.
    Quote(QuoteArgs),
    /// 結帳並列印訂單。 / Take payment for an order and print it.
    Checkout(CheckoutArgs),
    /// 匯入/匯出設定。 / Show, import or export the kiosk configuration.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand)]
enum SessionCommand {
    /// 產生新的工作階段代碼。 / Generate a new session token.
    New(SessionNewArgs),
}

#[derive(Args)]
struct SessionNewArgs {
    /// Seed the generator for a reproducible token.
    #[arg(long)]
    seed: Option<u64>,
    /// Also create the session's upload folder.
    #[arg(long)]
    create: bool,
}

#[derive(Args)]
struct FilesArgs {
    #[arg(long, value_name = "TOKEN")]
    session: String,
    /// Print the listing as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct PagesArgs {
    #[arg(value_name = "PDF")]
    input: PathBuf,
}

#[derive(Args)]
struct QuoteArgs {
    /// Total pages in the document.
    #[arg(long)]
    pages: u32,
    /// all, odd, even, or custom ranges such as "1-5, 8".
    #[arg(long, default_value = "all")]
    range: String,
    #[arg(long, default_value_t = 1)]
    copies: u32,
    /// Print in colour (default black and white).
    #[arg(long)]
    color: bool,
    /// Print on both sides.
    #[arg(long)]
    duplex: bool,
}

#[derive(Args)]
struct CheckoutArgs {
    /// 訂單描述檔。 / Order manifest (JSON).
    #[arg(value_name = "ORDER")]
    order: PathBuf,
    /// Print the outcome as JSON.
    #[arg(long)]
    json: bool,
    /// Dispatch documents back to back without the inter-job pause.
    #[arg(long)]
    no_delay: bool,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// 顯示目前設定。 / Print the effective configuration.
    Show,
    /// 匯出目前設定。 / Export the current configuration.
    Export(ConfigExportArgs),
    /// 匯入設定 JSON。 / Import configuration from JSON.
    Import(ConfigImportArgs),
}

#[derive(Args)]
struct ConfigExportArgs {
    /// 輸出檔案路徑。 / Destination file path.
    #[arg(long, value_name = "FILE")]
    output: PathBuf,
}

#[derive(Args)]
struct ConfigImportArgs {
    /// 輸入檔案路徑。 / Source configuration JSON.
    #[arg(value_name = "FILE")]
    input: PathBuf,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let Cli {
        config,
        log_level,
        command,
    } = Cli::parse();
    init_tracing(&log_level);
    let config_path = config.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    match command {
        Commands::Session(SessionCommand::New(args)) => execute_session_new(args, &config_path),
        Commands::Files(args) => block_on(execute_files(args, &config_path)),
        Commands::Pages(args) => block_on(execute_pages(args)),
        Commands::Quote(args) => execute_quote(args, &config_path),
        Commands::Checkout(args) => block_on(execute_checkout(args, &config_path)),
        Commands::Config(subcommand) => execute_config_command(subcommand, &config_path),
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("printkiosk={level},warn")));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}

fn block_on<F: std::future::Future<Output = Result<()>>>(future: F) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    runtime.block_on(future)
}

fn load_config(path: &Path) -> Result<ConfigStore> {
    ConfigStore::load(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))
}

fn parse_session(token: &str) -> Result<SessionToken> {
    SessionToken::parse(token).map_err(|err| anyhow!("invalid session token: {err}"))
}

fn execute_session_new(args: SessionNewArgs, config_path: &Path) -> Result<()> {
    let token = match args.seed {
        Some(seed) => SessionToken::generate_with(&mut StdRng::seed_from_u64(seed)),
        None => SessionToken::generate(),
    };
    if args.create {
        let store = load_config(config_path)?;
        let dir = store.config().storage.uploads_dir.join(token.as_str());
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        info!(session = %token, dir = %dir.display(), "created upload folder");
    }
    println!("{token}");
    Ok(())
}

async fn execute_files(args: FilesArgs, config_path: &Path) -> Result<()> {
    let store = load_config(config_path)?;
    let storage = &store.config().storage;
    let session = parse_session(&args.session)?;

    let mut files = SessionFiles::new(
        session.clone(),
        Arc::new(LocalDirectoryLister::new(&storage.uploads_dir)),
    );
    if let Some(mirror) = &storage.remote_mirror_dir {
        let remote: Arc<dyn RemoteStore> = Arc::new(MirrorDirectoryStore::new(mirror));
        files = files.with_remote(RemoteFallback {
            store: remote.clone(),
            downloader: Arc::new(StoreDownloader::new(remote, &storage.uploads_dir)),
        });
    }
    let listed = files
        .refresh()
        .await
        .with_context(|| format!("failed to list files for session {session}"))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(listed)?);
        return Ok(());
    }
    if listed.is_empty() {
        println!("No files uploaded for session {session}");
        return Ok(());
    }
    println!("Files for session {session} ({}):", listed.len());
    for file in listed {
        println!(
            "  {:<32} {:<6} {:>10} bytes",
            file.name,
            file.kind.as_str(),
            file.size_bytes
        );
    }
    Ok(())
}

async fn execute_pages(args: PagesArgs) -> Result<()> {
    let source = LocalFile::open(&args.input)
        .with_context(|| format!("failed to open {}", args.input.display()))?;
    let pages = LopdfPageCounter
        .page_count(&source)
        .await
        .with_context(|| format!("failed to count pages of {}", args.input.display()))?;
    println!("{}: {pages} pages", args.input.display());
    Ok(())
}

fn execute_quote(args: QuoteArgs, config_path: &Path) -> Result<()> {
    let store = load_config(config_path)?;
    let config = store.config();
    if args.copies == 0 {
        bail!("--copies must be at least 1");
    }

    let selection = match args.range.trim().to_ascii_lowercase().as_str() {
        "all" => PageSelection::All,
        "odd" => PageSelection::Odd,
        "even" => PageSelection::Even,
        _ => PageSelection::Custom(args.range.clone()),
    };
    if let PageSelection::Custom(ranges) = &selection {
        for rejected in inspect_page_range(ranges, args.pages).rejected {
            eprintln!("Ignored '{}': {}", rejected.token, rejected.reason);
        }
    }
    let color_mode = if args.color {
        ColorMode::Color
    } else {
        ColorMode::Bw
    };
    let duplex = if args.duplex {
        DuplexMode::BothSides
    } else {
        DuplexMode::OneSide
    };

    let pages = selection.pages_to_print(args.pages);
    let cost = config
        .tariff
        .document_cost(pages, args.copies, color_mode, duplex);
    println!("Pages to print: {pages}");
    println!("Cost: {cost} {}", config.checkout.currency);
    Ok(())
}

async fn execute_checkout(args: CheckoutArgs, config_path: &Path) -> Result<()> {
    let store = load_config(config_path)?;
    let config = store.config();
    let mut order = OrderManifest::load(&args.order)?.build(config).await?;

    let mut flow = CheckoutFlow::from_config(
        Arc::new(CounterPaymentGateway::new()),
        Arc::new(SpoolDirectoryDispatcher::new(&config.storage.spool_dir)),
        Arc::new(LogReceiptNotifier),
        config,
    );
    if args.no_delay {
        flow = flow.with_batch_options(BatchOptions {
            inter_job_delay: Duration::ZERO,
        });
    }

    let quote = flow.quote(&order);
    if !args.json {
        println!(
            "Order total: {} {} ({} canvas pages, {} documents, {} paper lines)",
            quote.total,
            config.checkout.currency,
            quote.canvas_pages,
            quote.documents,
            quote.cart_lines
        );
    }

    let mut workflow = KioskWorkflow::new();
    let mut report_progress = |progress: &PrintProgress| {
        if let Some(job) = &progress.current_job {
            info!(job = %job, completed = progress.completed, total = progress.total, "printing");
        }
    };
    let outcome = flow
        .checkout(&mut order, &mut workflow, &mut report_progress)
        .await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    }
    match outcome {
        CheckoutOutcome::Dismissed => {
            if !args.json {
                println!("Payment was dismissed; nothing was printed.");
            }
            Ok(())
        }
        CheckoutOutcome::Printed(summary) => {
            if !args.json {
                println!("Payment ID: {}", summary.payment_id);
                println!("{}", summary.message());
            }
            if summary.state == CheckoutState::CompletedWithErrors {
                bail!("{} print job(s) failed", summary.report.failures.len());
            }
            Ok(())
        }
    }
}

fn execute_config_command(command: ConfigCommand, config_path: &Path) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            let store = load_config(config_path)?;
            println!("{}", serde_json::to_string_pretty(store.config())?);
            Ok(())
        }
        ConfigCommand::Export(args) => {
            let store = load_config(config_path)?;
            store
                .export_to(&args.output)
                .with_context(|| format!("failed to export config to {}", args.output.display()))?;
            println!("Exported configuration to {}", args.output.display());
            Ok(())
        }
        ConfigCommand::Import(args) => {
            if !args.input.exists() {
                bail!("configuration file '{}' does not exist", args.input.display());
            }
            let mut store = load_config(config_path)?;
            store
                .import_from(&args.input)
                .with_context(|| format!("failed to import config from {}", args.input.display()))?;
            println!("Imported configuration from {}", args.input.display());
            Ok(())
        }
    }
}
