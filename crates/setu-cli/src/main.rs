//! `setu-esign` — command-line client for the Setu eSign API.
//!
//! Stores API credentials in a per-user directory, uploads a PDF, starts a
//! signature workflow and polls its status. Talks to Setu directly; there is
//! no server component.

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod browser;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use serde_json::Value;
use setu_core::{
    ApiClient, ClientConfig, CredentialStore, Credentials, Document, INITIATING_MESSAGE, PdfFile,
    REFRESHED_MESSAGE, REFRESHING_MESSAGE, SUBMITTED_MESSAGE, SignatureOptions, SignatureRequest,
    Submission, UPLOADING_MESSAGE, validate_pdf_file,
};
use setu_storage::FileBackend;
use tracing_subscriber::EnvFilter;

// ── ANSI color helpers ───────────────────────────────────────────────

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const MAGENTA: &str = "\x1b[35m";
const CYAN: &str = "\x1b[36m";
const WHITE: &str = "\x1b[37m";

const NO_CREDENTIALS: &str =
    "No credentials found. Please configure your API credentials first.";
const FILL_ALL_FIELDS: &str = "Please fill in all fields";

// ── CLI structure ────────────────────────────────────────────────────

/// Setu eSign — upload a contract and collect an e-signature.
#[derive(Parser)]
#[command(
    name = "setu-esign",
    version,
    about = "Setu eSign CLI — store API credentials, upload a PDF, request and track signatures",
    long_about = None,
    after_help = format!(
        "{DIM}Environment variables:{RESET}\n  \
         SETU_ESIGN_HOME     Credential directory (default: ~/.setu-esign)\n  \
         SETU_BASE_URL       API base URL (default: https://dg-sandbox.setu.co/api)\n  \
         SETU_TIMEOUT_SECS   Request timeout in seconds (default: none)\n  \
         RUST_LOG            Log filter, overrides --log-level\n\n\
         {DIM}Examples:{RESET}\n  \
         setu-esign credentials set --client-id ID --client-secret SECRET --product-instance-id PI\n  \
         setu-esign submit contract.pdf --open\n  \
         setu-esign status 8f0c2d4e-signature-id"
    ),
)]
struct Cli {
    /// Directory the credential record is kept in.
    #[arg(long, env = "SETU_ESIGN_HOME", global = true)]
    home: Option<PathBuf>,

    /// Override the API base URL.
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Log level used when `RUST_LOG` is not set.
    #[arg(long, env = "SETU_LOG_LEVEL", default_value = "warn", global = true)]
    log_level: String,

    /// Emit logs as JSON lines.
    #[arg(long, default_value = "false", global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the stored API credentials.
    Credentials {
        #[command(subcommand)]
        action: CredentialCommands,
    },
    /// Check that a file is a PDF of at most 10MB.
    Validate {
        /// Path to the file.
        file: PathBuf,
    },
    /// Upload a PDF and initiate a signature request.
    Submit {
        /// Path to the PDF.
        file: PathBuf,
        /// Extra signature request field, repeatable. Values are parsed as
        /// JSON when possible, otherwise sent as strings.
        #[arg(long = "option", value_name = "KEY=VALUE")]
        options: Vec<String>,
        /// Poll the signature status once after initiating.
        #[arg(long, default_value = "false")]
        refresh: bool,
        /// Open the signature page in the browser.
        #[arg(long, default_value = "false")]
        open: bool,
    },
    /// Fetch the current status of a signature request.
    Status {
        /// Signature ID returned by `submit`.
        signature_id: String,
    },
    /// Open a signature page in the browser.
    Open {
        /// The `signatureUrl` of a signature request.
        url: String,
    },
}

#[derive(Subcommand)]
enum CredentialCommands {
    /// Save credentials, replacing any stored ones.
    Set {
        /// Sent as `x-client-id`.
        #[arg(long, env = "SETU_CLIENT_ID", default_value = "")]
        client_id: String,
        /// Sent as `x-client-secret`.
        #[arg(long, env = "SETU_CLIENT_SECRET", default_value = "", hide_env_values = true)]
        client_secret: String,
        /// Sent as `x-product-instance-id`.
        #[arg(long, env = "SETU_PRODUCT_INSTANCE_ID", default_value = "")]
        product_instance_id: String,
    },
    /// Show stored credentials with the secret masked.
    Show,
    /// Delete stored credentials.
    Clear,
    /// Report whether credentials are configured.
    Status,
}

// ── Output helpers ───────────────────────────────────────────────────

fn header(icon: &str, title: &str) {
    println!("{BOLD}{CYAN}{icon} {title}{RESET}");
    println!("{DIM}─────────────────────────────────────────{RESET}");
}

fn kv_line(key: &str, value: &str) {
    println!("  {DIM}{key:<20}{RESET} {WHITE}{value}{RESET}");
}

fn success(msg: &str) {
    println!("{GREEN}{BOLD}✓{RESET} {msg}");
}

fn warning(msg: &str) {
    println!("{YELLOW}{BOLD}⚠{RESET} {YELLOW}{msg}{RESET}");
}

fn progress(msg: &str) {
    println!("{DIM}… {msg}{RESET}");
}

/// Size in MB with two decimals, as shown next to a selected file.
#[allow(clippy::cast_precision_loss)]
fn format_size(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / 1024.0 / 1024.0)
}

fn print_document(doc: &Document) {
    println!();
    header("📄", "Document Upload Result");
    kv_line("Document ID", &doc.document_id);
    if let Some(status) = doc.extra.get("status") {
        kv_line("Status", &display_value(status));
    }
    if doc.url().is_some() {
        kv_line("Document URL", "Available");
    }
    println!();
}

fn print_signature(sig: &SignatureRequest) {
    println!();
    header("✍", "Signature Request");
    kv_line("Signature ID", &sig.signature_id);
    if let Some(url) = sig.signature_url() {
        kv_line("Signature URL", url);
    }
    if let Some(status) = sig.extra.get("status") {
        kv_line("Status", &display_value(status));
    }
    println!();
}

/// Strings print bare; anything else prints as compact JSON.
fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ── Setup ────────────────────────────────────────────────────────────

fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if installed.is_err() {
        eprintln!("{DIM}logging already initialised{RESET}");
    }
}

/// Resolve the credential directory: `--home`, else `~/.setu-esign`.
fn store_dir(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir);
    }
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map(PathBuf::from)
        .context("cannot determine home directory (HOME / USERPROFILE not set)")?;
    Ok(home.join(".setu-esign"))
}

struct App {
    store: CredentialStore<FileBackend>,
    config: ClientConfig,
}

impl App {
    async fn credentials(&self) -> Result<Credentials> {
        self.store.load().await.ok_or_else(|| anyhow!(NO_CREDENTIALS))
    }

    fn client(&self) -> Result<ApiClient> {
        ApiClient::with_config(self.config.clone()).context("failed to build HTTP client")
    }
}

// ── Command dispatch ─────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_json);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!();
            eprintln!("  {RED}{BOLD}✗ Error:{RESET} {e:#}");
            eprintln!();
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = ClientConfig::from_env();
    if let Some(url) = cli.base_url {
        config = config.with_base_url(url);
    }
    let app = App {
        store: CredentialStore::new(FileBackend::new(store_dir(cli.home)?)),
        config,
    };

    match cli.command {
        Commands::Credentials { action } => cmd_credentials(&app, action).await,
        Commands::Validate { file } => cmd_validate(&file),
        Commands::Submit {
            file,
            options,
            refresh,
            open,
        } => cmd_submit(&app, &file, &options, refresh, open).await,
        Commands::Status { signature_id } => cmd_status(&app, &signature_id).await,
        Commands::Open { url } => {
            browser::open(&url)?;
            success(&format!("Opened {url}"));
            Ok(())
        }
    }
}

// ── Credential commands ──────────────────────────────────────────────

async fn cmd_credentials(app: &App, action: CredentialCommands) -> Result<()> {
    match action {
        CredentialCommands::Set {
            client_id,
            client_secret,
            product_instance_id,
        } => {
            let creds = Credentials::new(client_id, client_secret, product_instance_id);
            if !creds.is_complete() {
                bail!(FILL_ALL_FIELDS);
            }
            app.store
                .save(&creds)
                .await
                .context("Failed to store credentials")?;
            success("Credentials saved successfully!");
            println!(
                "  {DIM}stored in {}{RESET}",
                app.store.backend().dir().display()
            );
            Ok(())
        }
        CredentialCommands::Show => {
            let creds = app.credentials().await?;
            println!();
            header("🔑", "Setu API Credentials");
            kv_line("Client ID", &creds.client_id);
            kv_line("Client Secret", &creds.masked_secret());
            kv_line("Product Instance ID", &creds.product_instance_id);
            println!();
            Ok(())
        }
        CredentialCommands::Clear => {
            app.store
                .clear()
                .await
                .context("Failed to clear credentials")?;
            success("Credentials cleared");
            Ok(())
        }
        CredentialCommands::Status => {
            if app.store.is_configured().await {
                success("Configured");
                if app.store.load().await.is_none() {
                    warning("Stored credentials could not be read; save them again.");
                }
            } else {
                warning("Setup Required");
                println!("  {DIM}run `setu-esign credentials set` to get started{RESET}");
            }
            Ok(())
        }
    }
}

// ── Document commands ────────────────────────────────────────────────

fn read_pdf(path: &Path) -> Result<PdfFile> {
    let file = PdfFile::from_path(path)?;
    validate_pdf_file(Some(&file)).into_result()?;
    Ok(file)
}

fn cmd_validate(path: &Path) -> Result<()> {
    let file = read_pdf(path)?;
    success(&format!(
        "{} is a valid PDF ({})",
        file.name(),
        format_size(file.size())
    ));
    Ok(())
}

async fn cmd_submit(
    app: &App,
    path: &Path,
    raw_options: &[String],
    refresh: bool,
    open: bool,
) -> Result<()> {
    let creds = app.credentials().await?;
    let options = parse_options(raw_options)?;
    let client = app.client()?;

    let mut submission = Submission::new();
    let validation = submission.select_file(Some(PdfFile::from_path(path)?))?;
    if let Some(error) = validation.error {
        bail!(error);
    }
    if let Some(file) = submission.file() {
        println!(
            "Selected file: {BOLD}{}{RESET} ({})",
            file.name(),
            format_size(file.size())
        );
    }

    progress(UPLOADING_MESSAGE);
    let document = submission.upload(&client, &creds).await?;
    print_document(&document);

    progress(INITIATING_MESSAGE);
    let options = (!options.is_empty()).then_some(&options);
    let signature = submission
        .initiate_signature(&client, &creds, options)
        .await?;
    print_signature(&signature);
    success(SUBMITTED_MESSAGE);

    if refresh {
        progress(REFRESHING_MESSAGE);
        let refreshed = submission.refresh_status(&client, &creds).await?;
        print_signature(refreshed);
        success(REFRESHED_MESSAGE);
    }

    if open {
        let url = submission
            .signature()
            .and_then(|s| s.signature_url().map(str::to_owned));
        match url {
            Some(url) => browser::open(&url)?,
            None => warning("The signature request has no signature URL to open."),
        }
    }

    Ok(())
}

async fn cmd_status(app: &App, signature_id: &str) -> Result<()> {
    let creds = app.credentials().await?;
    let update = app
        .client()?
        .get_signature_status(signature_id, &creds)
        .await?;

    println!();
    header("🔎", "Signature Status");
    kv_line("Signature ID", signature_id);
    let status = update
        .0
        .get("status")
        .map_or_else(|| "unknown".to_owned(), display_value);
    kv_line("Status", &status);
    println!();
    let pretty = serde_json::to_string_pretty(&update.0).context("failed to render status")?;
    println!("{MAGENTA}{pretty}{RESET}");
    println!();
    Ok(())
}

/// Parse repeated `KEY=VALUE` flags into signature options.
fn parse_options(raw: &[String]) -> Result<SignatureOptions> {
    let mut options = SignatureOptions::new();
    for item in raw {
        let Some((key, value)) = item.split_once('=') else {
            bail!("invalid --option '{item}': expected KEY=VALUE");
        };
        let key = key.trim();
        if key.is_empty() {
            bail!("invalid --option '{item}': empty key");
        }
        let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_owned()));
        options.insert(key.to_owned(), value);
    }
    Ok(options)
}
