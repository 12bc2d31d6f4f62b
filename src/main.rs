//! ghmail - find the name and commit email behind a GitHub username.
//!
//! A CLI front end over the ghmail library: normalizes each input, looks
//! the user up on the GitHub API and prints the result.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Lookup failed (user not found, rate limited, network/API error)
//!   2 - Invalid input or arguments

use anyhow::{Context, Result};
use ghmail::cache::{FileStore, SystemClock};
use ghmail::cli::{self, Args, InputSource};
use ghmail::config::{Config, CONFIG_FILE_NAME};
use ghmail::errors::LookupError;
use ghmail::github::GitHubClient;
use ghmail::report::{self, OutputFormat};
use ghmail::{Aggregator, DiscoveryConfig, Resolver, ResultRecord, TtlCache};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};
use tracing_subscriber::FmtSubscriber;

const EXIT_LOOKUP_FAILED: i32 = 1;
const EXIT_INVALID_INPUT: i32 = 2;

/// Spinner tick interval while a lookup is outstanding.
const SPINNER_TICK: Duration = Duration::from_millis(120);

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(EXIT_INVALID_INPUT);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args)?;

    info!("ghmail v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args).await {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(EXIT_LOOKUP_FAILED);
        }
    }
}

/// Handle --init-config: generate a default .ghmail.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(EXIT_LOOKUP_FAILED);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    Ok(())
}

/// Initialize logging based on verbosity settings. Logs go to stderr so
/// stdout only carries results.
fn init_logging(args: &Args) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level())
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).context("Failed to set tracing subscriber")
}

/// Build everything and run the lookups. Returns the exit code.
async fn run(args: Args) -> Result<i32> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate()?;

    let cache = build_cache(&config);
    if args.clear_cache {
        let removed = cache.clear();
        info!("Cleared {} cached entries", removed);
    }

    let client = GitHubClient::new(
        config.api.base_url.clone(),
        &config.api.user_agent,
        Duration::from_secs(config.api.timeout_seconds),
    )
    .context("Failed to create GitHub client")?;

    let discovery = DiscoveryConfig::from(&config.discovery);
    info!(
        "Discovery bounds: {} repos x {} commits",
        discovery.max_repos, discovery.max_commits_per_repo
    );

    let resolver = Resolver::new(Aggregator::new(client, cache, discovery));
    let format = config.output.format;
    let show_spinner = !args.quiet && format != OutputFormat::Json;

    match args.input_source(std::io::stdin().is_terminal()) {
        InputSource::Arguments => run_batch(&resolver, &args.inputs, format, show_spinner).await,
        InputSource::Piped => {
            let inputs = cli::read_inputs(BufReader::new(tokio::io::stdin()))
                .await
                .context("Failed to read stdin")?;
            debug!("Read {} input(s) from stdin", inputs.len());
            run_batch(&resolver, &inputs, format, show_spinner).await
        }
        InputSource::Interactive => run_interactive(resolver, format, show_spinner).await,
    }
}

/// Resolve each positional input in turn.
async fn run_batch(
    resolver: &Resolver,
    inputs: &[String],
    format: OutputFormat,
    show_spinner: bool,
) -> Result<i32> {
    let mut exit_code = 0;

    for input in inputs {
        let spinner = show_spinner.then(|| start_spinner(input));
        let outcome = resolver.resolve(input).await;
        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }

        exit_code = exit_code.max(print_outcome(input, outcome, format));
    }

    Ok(exit_code)
}

/// Read inputs from a terminal; each line starts a lookup right away and
/// only the most recent lookup's result is printed.
async fn run_interactive(
    resolver: Resolver,
    format: OutputFormat,
    show_spinner: bool,
) -> Result<i32> {
    let exit_code = Arc::new(AtomicI32::new(0));
    let spinner = ActivitySpinner::new(show_spinner);
    let mut pending = Vec::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        if line.trim().is_empty() {
            continue;
        }

        // Tickets are taken in input order so the newest line always wins.
        let ticket = resolver.begin();
        spinner.started(&line);
        let resolver = resolver.clone();
        let exit_code = Arc::clone(&exit_code);
        let spinner = spinner.clone();
        pending.push(tokio::spawn(async move {
            let input = line;
            resolver
                .resolve_and_render(ticket, &input, |outcome| {
                    let code = spinner.suspend(|| print_outcome(&input, outcome, format));
                    exit_code.store(code, Ordering::SeqCst);
                })
                .await;
            spinner.finished();
        }));
    }

    for handle in pending {
        if let Err(e) = handle.await {
            warn!("Lookup task failed: {}", e);
        }
    }

    Ok(exit_code.load(Ordering::SeqCst))
}

/// One spinner shared by all outstanding stdin lookups. It appears with
/// the first lookup and is cleared once none remain.
#[derive(Clone)]
struct ActivitySpinner {
    enabled: bool,
    state: Arc<Mutex<SpinnerState>>,
}

#[derive(Default)]
struct SpinnerState {
    outstanding: usize,
    bar: Option<ProgressBar>,
}

impl ActivitySpinner {
    fn new(enabled: bool) -> Self {
        Self {
            enabled,
            state: Arc::new(Mutex::new(SpinnerState::default())),
        }
    }

    fn started(&self, input: &str) {
        if !self.enabled {
            return;
        }
        if let Ok(mut state) = self.state.lock() {
            state.outstanding += 1;
            match &state.bar {
                Some(bar) => bar.set_message(lookup_message(input)),
                None => state.bar = Some(start_spinner(input)),
            }
        }
    }

    fn finished(&self) {
        if !self.enabled {
            return;
        }
        if let Ok(mut state) = self.state.lock() {
            state.outstanding = state.outstanding.saturating_sub(1);
            if state.outstanding == 0 {
                if let Some(bar) = state.bar.take() {
                    bar.finish_and_clear();
                }
            }
        }
    }

    /// Run `f` with the spinner hidden so printed output stays intact.
    fn suspend<R>(&self, f: impl FnOnce() -> R) -> R {
        let bar = self
            .state
            .lock()
            .ok()
            .and_then(|state| state.bar.clone());
        match bar {
            Some(bar) => bar.suspend(f),
            None => f(),
        }
    }
}

/// Print a lookup outcome and return its exit code.
fn print_outcome(
    input: &str,
    outcome: Result<ResultRecord, LookupError>,
    format: OutputFormat,
) -> i32 {
    match outcome {
        Ok(record) => {
            println!("{}", report::render_result(input, &record, format));
            0
        }
        Err(e) => {
            let rendered = report::render_error(input, &e, format);
            if format == OutputFormat::Json {
                println!("{}", rendered);
            } else {
                eprintln!("{}", rendered);
            }
            if e.is_validation() {
                EXIT_INVALID_INPUT
            } else {
                EXIT_LOOKUP_FAILED
            }
        }
    }
}

fn start_spinner(input: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(lookup_message(input));
    spinner.enable_steady_tick(SPINNER_TICK);
    spinner
}

fn lookup_message(input: &str) -> String {
    format!("Looking up {}...", input.trim())
}

/// Open the file-backed cache, or a disabled one.
fn build_cache(config: &Config) -> TtlCache {
    if !config.cache.enabled {
        debug!("Lookup cache disabled");
        return TtlCache::disabled();
    }

    let path = config.cache.resolved_path();
    let cache = TtlCache::new(
        Arc::new(FileStore::open(&path)),
        Arc::new(SystemClock),
        config.cache.ttl_seconds,
    );
    let purged = cache.purge_expired();
    debug!("Cache at {} ({} expired entries purged)", path.display(), purged);
    cache
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Ok(Config::load(config_path)?);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
