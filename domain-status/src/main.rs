//! Domain Status CLI Application
//!
//! Command-line interface to domain-status-lib: bulk domain metadata lookups
//! and paced availability checks against the NP DNS API.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Parser, Subcommand};
use domain_status_lib::{
    load_env_config, normalize_domains, parse_duration_string, read_domains_file, BatchEntry,
    ClientConfig, ConfigManager, Credentials, DomainApiError, DomainQuery, DomainStatusClient,
    EnvConfig, FileConfig, MIN_REQUEST_INTERVAL,
};
use futures_util::StreamExt;
use serde::Serialize;
use serde_json::Value;
use std::process;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// CLI arguments for domain-status
#[derive(Parser, Debug)]
#[command(name = "domain-status")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Look up NP domain metadata and check domain availability")]
#[command(
    long_about = "Look up domain metadata and check domain availability through the NP DNS API.\n\nEvery request is signed with your app code, erp and token. Credentials can come from flags, DS_* environment variables, or a domain-status.toml file."
)]
#[command(styles = STYLES)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Use specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", global = true, help_heading = "Configuration")]
    pub config: Option<String>,

    /// Application code registered with the NP service
    #[arg(long = "app-code", value_name = "CODE", global = true, help_heading = "Credentials")]
    pub app_code: Option<String>,

    /// Operator erp used in the signature
    #[arg(long = "erp", value_name = "ERP", global = true, help_heading = "Credentials")]
    pub erp: Option<String>,

    /// Shared-secret token (prefer DS_TOKEN or the config file)
    #[arg(long = "token", value_name = "TOKEN", global = true, help_heading = "Credentials")]
    pub token: Option<String>,

    /// API base URL (default: http://api-np.jd.local)
    #[arg(long = "base-url", value_name = "URL", global = true, help_heading = "Connection")]
    pub base_url: Option<String>,

    /// HTTP timeout per request, e.g. "5s" (default: 10s)
    #[arg(long = "timeout", value_name = "DURATION", global = true, help_heading = "Connection")]
    pub timeout: Option<String>,

    /// Pause between batch checks, e.g. "1s" (default and minimum: 500ms)
    #[arg(long = "interval", value_name = "DURATION", global = true, help_heading = "Connection")]
    pub interval: Option<String>,

    /// Verbose logging
    #[arg(short = 'v', long = "verbose", global = true, help_heading = "Configuration")]
    pub verbose: bool,

    /// Show detailed debug information and error messages
    #[arg(short = 'd', long = "debug", global = true, help_heading = "Configuration")]
    pub debug: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Look up metadata for one or more domains in a single request
    Info(InfoArgs),

    /// Check whether domains are still available
    Check(CheckArgs),
}

#[derive(clap::Args, Debug, Default)]
pub struct InfoArgs {
    /// Domain names to look up
    #[arg(value_name = "DOMAINS")]
    pub domains: Vec<String>,

    /// Input file with domains (one per line)
    #[arg(short = 'f', long = "file", value_name = "FILE")]
    pub file: Option<String>,

    /// Extra query field sent with the lookup, e.g. service_type=2
    #[arg(long = "filter", value_name = "KEY=VALUE", value_parser = parse_filter)]
    pub filters: Vec<(String, Value)>,

    /// Output results in JSON format
    #[arg(short = 'j', long = "json")]
    pub json: bool,
}

#[derive(clap::Args, Debug, Default)]
pub struct CheckArgs {
    /// Domain names to check
    #[arg(value_name = "DOMAINS")]
    pub domains: Vec<String>,

    /// Input file with domains (one per line)
    #[arg(short = 'f', long = "file", value_name = "FILE")]
    pub file: Option<String>,

    /// Output results in JSON format
    #[arg(short = 'j', long = "json", conflicts_with = "csv")]
    pub json: bool,

    /// Output results in CSV format
    #[arg(long = "csv")]
    pub csv: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OutputFormat {
    Text,
    Json,
    Csv,
}

impl OutputFormat {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }
}

/// Everything needed to run a command, after applying precedence rules.
#[derive(Debug)]
pub(crate) struct Settings {
    pub(crate) credentials: Credentials,
    pub(crate) client: ClientConfig,
    pub(crate) format: OutputFormat,
    /// Domain list file from DS_FILE, used when the command has no --file
    pub(crate) file: Option<String>,
}

/// Failed batch entries grouped by error class
#[derive(Debug, Default)]
pub(crate) struct ErrorStats {
    pub(crate) transport_errors: Vec<String>,
    pub(crate) application_errors: Vec<String>,
    pub(crate) other_errors: Vec<String>,
}

impl ErrorStats {
    fn add_error(&mut self, domain: &str, error: &DomainApiError) {
        match error {
            DomainApiError::Transport { .. } => self.transport_errors.push(domain.to_string()),
            DomainApiError::Application { .. } => {
                self.application_errors.push(domain.to_string())
            }
            _ => self.other_errors.push(domain.to_string()),
        }
    }

    pub(crate) fn has_errors(&self) -> bool {
        !self.transport_errors.is_empty()
            || !self.application_errors.is_empty()
            || !self.other_errors.is_empty()
    }
}

/// Batch row for JSON and CSV output
#[derive(Debug, Serialize)]
struct CheckRow<'a> {
    domain: &'a str,
    available: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<'a> From<&'a BatchEntry> for CheckRow<'a> {
    fn from(entry: &'a BatchEntry) -> Self {
        match &entry.result {
            Ok(availability) => Self {
                domain: &entry.domain,
                available: Some(availability.is_available()),
                status: Some(availability.status),
                message: Some(availability.message.as_str()),
                error: None,
            },
            Err(e) => Self {
                domain: &entry.domain,
                available: None,
                status: None,
                message: None,
                error: Some(e.to_string()),
            },
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_logging(&args);
    info!("domain-status v{} starting", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(args).await {
        if !e.is::<Reported>() {
            eprintln!("{} {}", console::style("Error:").red().bold(), e);
        }
        process::exit(1);
    }
}

/// Logs go to stderr. Default level is warn; -v raises it to info, -d to
/// debug, and RUST_LOG overrides both.
fn init_logging(args: &Args) {
    let default_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let verbose = args.verbose || args.debug;
    let env_config = load_env_config(verbose);
    let file_config = load_file_config(&args, &env_config, verbose)?;
    let settings = resolve_settings(&args, &env_config, file_config)?;

    debug!(
        base_url = %settings.client.base_url,
        timeout = ?settings.client.timeout,
        interval = ?settings.client.request_interval,
        "resolved settings"
    );

    let client = DomainStatusClient::new(settings.credentials.clone(), settings.client.clone())?;

    match &args.command {
        Command::Info(info_args) => run_info(&client, info_args, &settings).await,
        Command::Check(check_args) => run_check(&client, check_args, &settings).await,
    }
}

/// Load the config file named by --config or DS_CONFIG, or discover one.
fn load_file_config(
    args: &Args,
    env_config: &EnvConfig,
    verbose: bool,
) -> Result<FileConfig, DomainApiError> {
    let config_manager = ConfigManager::new(verbose);

    let explicit = args
        .config
        .as_deref()
        .map(|path| (path, "--config"))
        .or_else(|| env_config.config.as_deref().map(|path| (path, "DS_CONFIG")));

    match explicit {
        Some((path, source)) => {
            info!("using config file {} (from {})", path, source);
            config_manager.load_file(path)
        }
        None => config_manager.discover_and_load(),
    }
}

/// Apply precedence: CLI flags > environment > config files > defaults.
pub(crate) fn resolve_settings(
    args: &Args,
    env_config: &EnvConfig,
    file_config: FileConfig,
) -> Result<Settings, DomainApiError> {
    let file_credentials = file_config.credentials.unwrap_or_default();
    let file_client = file_config.client.unwrap_or_default();

    let pick = |cli: &Option<String>, env: &Option<String>, file: Option<String>| {
        cli.clone().or_else(|| env.clone()).or(file)
    };
    let required = |value: Option<String>, flag: &str, env: &str, key: &str| {
        value.ok_or_else(|| {
            DomainApiError::config(format!(
                "missing {}; pass --{}, set {} or add '{}' under [credentials]",
                key, flag, env, key
            ))
        })
    };

    let app_code = required(
        pick(&args.app_code, &env_config.app_code, file_credentials.app_code),
        "app-code",
        "DS_APP_CODE",
        "app_code",
    )?;
    let erp = required(
        pick(&args.erp, &env_config.erp, file_credentials.erp),
        "erp",
        "DS_ERP",
        "erp",
    )?;
    let token = required(
        pick(&args.token, &env_config.token, file_credentials.token),
        "token",
        "DS_TOKEN",
        "token",
    )?;
    let credentials = Credentials::new(app_code, erp, token)?;

    let mut client = ClientConfig::default();

    if let Some(base_url) = pick(&args.base_url, &env_config.base_url, file_client.base_url) {
        client = client.with_base_url(base_url);
    }

    let timeout = cli_duration(&args.timeout, "--timeout")?
        .or(env_config.timeout)
        .or_else(|| file_client.timeout.as_deref().and_then(parse_duration_string));
    if let Some(timeout) = timeout {
        client = client.with_timeout(timeout);
    }

    let interval = cli_duration(&args.interval, "--interval")?
        .or(env_config.interval)
        .or_else(|| file_client.interval.as_deref().and_then(parse_duration_string));
    if let Some(interval) = interval {
        if interval < MIN_REQUEST_INTERVAL {
            warn!(
                "interval {:?} is below the minimum, using {:?}",
                interval, MIN_REQUEST_INTERVAL
            );
        }
        client = client.with_request_interval(interval);
    }

    let (cli_json, cli_csv) = match &args.command {
        Command::Info(info_args) => (info_args.json, false),
        Command::Check(check_args) => (check_args.json, check_args.csv),
    };
    let format = if cli_json {
        OutputFormat::Json
    } else if cli_csv {
        OutputFormat::Csv
    } else if let Some(json) = env_config.json {
        if json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    } else {
        file_config
            .output
            .and_then(|o| o.format)
            .and_then(|f| OutputFormat::parse(&f))
            .unwrap_or(OutputFormat::Text)
    };

    Ok(Settings {
        credentials,
        client,
        format,
        file: env_config.file.clone(),
    })
}

fn cli_duration(value: &Option<String>, flag: &str) -> Result<Option<Duration>, DomainApiError> {
    value
        .as_deref()
        .map(|v| {
            parse_duration_string(v).ok_or_else(|| {
                DomainApiError::config(format!(
                    "invalid {} '{}'. Use format like '500ms', '5s', '2m'",
                    flag, v
                ))
            })
        })
        .transpose()
}

/// Parse a `key=value` filter. Values that parse as JSON (numbers, booleans)
/// are sent as such; anything else is sent as a string.
fn parse_filter(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("invalid filter '{}', expected KEY=VALUE", raw))?;

    let key = key.trim();
    if key.is_empty() {
        return Err(format!("invalid filter '{}', key is empty", raw));
    }
    if key == "domains" {
        return Err("'domains' cannot be used as a filter".to_string());
    }

    let value = match serde_json::from_str::<Value>(value) {
        Ok(parsed @ (Value::Number(_) | Value::Bool(_) | Value::Null)) => parsed,
        _ => Value::String(value.to_string()),
    };

    Ok((key.to_string(), value))
}

/// Domains from the command line plus the domain file (--file, else DS_FILE).
fn collect_domains(
    cli_domains: &[String],
    file: Option<&str>,
) -> Result<Vec<String>, DomainApiError> {
    let mut domains = normalize_domains(cli_domains);

    if let Some(path) = file {
        let from_file = read_domains_file(path)?;
        info!("read {} domains from {}", from_file.len(), path);
        domains.extend(from_file);
    }

    if domains.is_empty() {
        return Err(DomainApiError::invalid_request(
            "no domains given; pass DOMAINS or --file",
        ));
    }

    Ok(domains)
}

async fn run_info(
    client: &DomainStatusClient,
    args: &InfoArgs,
    settings: &Settings,
) -> Result<(), Box<dyn std::error::Error>> {
    let domains = collect_domains(
        &args.domains,
        args.file.as_deref().or(settings.file.as_deref()),
    )?;

    let query = args
        .filters
        .iter()
        .fold(DomainQuery::new(domains), |query, (key, value)| {
            query.with_filter(key.clone(), value.clone())
        });

    let spinner = if settings.format == OutputFormat::Text {
        ui::Spinner::start(format!("Looking up {} domains...", query.domains.len()))
    } else {
        None
    };

    let result = client.lookup_domains(&query).await;

    if let Some(s) = spinner {
        s.stop().await;
    }

    let result = match result {
        Ok(result) => result,
        Err(e) => {
            let subject = query.domains.join(", ");
            return Err(report_failure("Lookup failed", &subject, e, settings.format));
        }
    };

    match settings.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        // CSV has no flat shape for lookup records; fall back to text.
        OutputFormat::Text | OutputFormat::Csv => println!("{}", ui::render_lookup_report(&result)),
    }

    Ok(())
}

async fn run_check(
    client: &DomainStatusClient,
    args: &CheckArgs,
    settings: &Settings,
) -> Result<(), Box<dyn std::error::Error>> {
    let domains = collect_domains(
        &args.domains,
        args.file.as_deref().or(settings.file.as_deref()),
    )?;

    if domains.len() == 1 {
        run_single_check(client, &domains[0], settings.format).await
    } else {
        run_batch_check(client, &domains, settings.format).await
    }
}

async fn run_single_check(
    client: &DomainStatusClient,
    domain: &str,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let spinner = if format == OutputFormat::Text {
        ui::Spinner::start(format!("Checking {}...", domain))
    } else {
        None
    };

    let result = client.check_availability(domain).await;

    if let Some(s) = spinner {
        s.stop().await;
    }

    match result {
        Ok(availability) => {
            match format {
                OutputFormat::Text => println!("{}", ui::render_availability_report(&availability)),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&availability)?),
                OutputFormat::Csv => {
                    let entry = BatchEntry {
                        domain: domain.to_string(),
                        result: Ok(availability),
                    };
                    print!("{}", render_csv(std::slice::from_ref(&entry)));
                }
            }
            Ok(())
        }
        Err(e) => Err(report_failure("Check failed", domain, e, format)),
    }
}

/// Check domains one by one, printing progress as each completes.
async fn run_batch_check(
    client: &DomainStatusClient,
    domains: &[String],
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let total = domains.len();
    let start_time = Instant::now();

    if format == OutputFormat::Text {
        println!(
            "{} {}",
            console::style(format!("Checking {} domains", total)).bold(),
            console::style(format!(
                "(one request every {:?})",
                client.config().request_interval
            ))
            .dim(),
        );
        println!();
    }

    let mut results = Vec::with_capacity(total);
    let mut stream = client.check_availability_stream(domains);

    while let Some(entry) = stream.next().await {
        if format == OutputFormat::Text {
            println!(
                "{}",
                ui::render_progress_line(results.len() + 1, total, &entry)
            );
        }
        results.push(entry);
    }

    let duration = start_time.elapsed();
    let (available, unavailable, error_stats) = tally(&results);
    let failed = results.len() - available - unavailable;

    match format {
        OutputFormat::Json => println!("{}", render_json(&results)?),
        OutputFormat::Csv => print!("{}", render_csv(&results)),
        OutputFormat::Text => {
            println!();
            println!(
                "{}",
                ui::render_summary(total, available, unavailable, failed, duration)
            );
            if error_stats.has_errors() {
                println!();
                println!("{}", ui::render_error_summary(&error_stats));
            }
        }
    }

    if failed == total {
        return Err(format!("all {} checks failed", total).into());
    }

    Ok(())
}

/// Count available and unavailable entries and group the failures.
fn tally(results: &[BatchEntry]) -> (usize, usize, ErrorStats) {
    let mut available = 0;
    let mut unavailable = 0;
    let mut error_stats = ErrorStats::default();

    for entry in results {
        match &entry.result {
            Ok(a) if a.is_available() => available += 1,
            Ok(_) => unavailable += 1,
            Err(e) => error_stats.add_error(&entry.domain, e),
        }
    }

    (available, unavailable, error_stats)
}

fn render_json(results: &[BatchEntry]) -> Result<String, serde_json::Error> {
    let rows: Vec<CheckRow> = results.iter().map(CheckRow::from).collect();
    serde_json::to_string_pretty(&rows)
}

fn render_csv(results: &[BatchEntry]) -> String {
    let mut out = String::from("domain,available,status,message,error\n");

    for entry in results {
        let row = CheckRow::from(entry);
        let available = match row.available {
            Some(true) => "true",
            Some(false) => "false",
            None => "unknown",
        };
        out.push_str(&format!(
            "{},{},{},{},{}\n",
            csv_field(row.domain),
            available,
            row.status.map(|s| s.to_string()).unwrap_or_default(),
            csv_field(row.message.unwrap_or_default()),
            csv_field(row.error.as_deref().unwrap_or_default()),
        ));
    }

    out
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// An error whose report is already on stderr; `main` only sets the exit code.
#[derive(Debug)]
struct Reported(DomainApiError);

impl std::fmt::Display for Reported {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for Reported {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

/// Text output gets a full failure report; JSON and CSV leave it to `main`.
fn report_failure(
    title: &str,
    subject: &str,
    error: DomainApiError,
    format: OutputFormat,
) -> Box<dyn std::error::Error> {
    log_error_body(&error);
    if format == OutputFormat::Text {
        eprintln!("{}", ui::render_failure(title, subject, &error));
        Box::new(Reported(error))
    } else {
        error.into()
    }
}

fn log_error_body(error: &DomainApiError) {
    if let DomainApiError::Transport {
        body: Some(body), ..
    } = error
    {
        if !body.is_empty() {
            debug!("response body: {}", body);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_status_lib::{Availability, ClientSection, CredentialsConfig, OutputConfig};

    fn create_test_args(command: Command) -> Args {
        Args {
            command,
            config: None,
            app_code: None,
            erp: None,
            token: None,
            base_url: None,
            timeout: None,
            interval: None,
            verbose: false,
            debug: false,
        }
    }

    fn check_command() -> Command {
        Command::Check(CheckArgs::default())
    }

    fn file_with_credentials() -> FileConfig {
        FileConfig {
            credentials: Some(CredentialsConfig {
                app_code: Some("file-app".to_string()),
                erp: Some("file.erp".to_string()),
                token: Some("file-token".to_string()),
            }),
            ..Default::default()
        }
    }

    fn entry(domain: &str, result: Result<i64, DomainApiError>) -> BatchEntry {
        BatchEntry {
            domain: domain.to_string(),
            result: result.map(|status| Availability {
                domain: domain.to_string(),
                status,
                message: "msg".to_string(),
            }),
        }
    }

    #[test]
    fn test_missing_credentials_is_config_error() {
        let args = create_test_args(check_command());
        let err = resolve_settings(&args, &EnvConfig::default(), FileConfig::default()).unwrap_err();
        assert!(matches!(err, DomainApiError::Config { .. }));
        assert!(err.to_string().contains("app_code"));
    }

    #[test]
    fn test_precedence_cli_over_env_over_file() {
        let mut args = create_test_args(check_command());
        args.erp = Some("cli.erp".to_string());

        let env_config = EnvConfig {
            app_code: Some("env-app".to_string()),
            erp: Some("env.erp".to_string()),
            ..Default::default()
        };

        let settings = resolve_settings(&args, &env_config, file_with_credentials()).unwrap();
        assert_eq!(settings.credentials.operator(), "cli.erp");
        assert_eq!(settings.credentials.app_code(), "env-app");
        assert_eq!(settings.client.base_url, domain_status_lib::DEFAULT_BASE_URL);
        assert_eq!(settings.format, OutputFormat::Text);
    }

    #[test]
    fn test_client_settings_resolution() {
        let mut args = create_test_args(Command::Check(CheckArgs {
            csv: true,
            ..Default::default()
        }));
        args.interval = Some("100ms".to_string());

        let env_config = EnvConfig {
            timeout: Some(Duration::from_secs(30)),
            json: Some(true),
            ..Default::default()
        };

        let mut file_config = file_with_credentials();
        file_config.client = Some(ClientSection {
            base_url: Some("http://localhost:9000/".to_string()),
            timeout: Some("5s".to_string()),
            interval: None,
        });

        let settings = resolve_settings(&args, &env_config, file_config).unwrap();
        assert_eq!(settings.client.base_url, "http://localhost:9000");
        assert_eq!(settings.client.timeout, Duration::from_secs(30));
        assert_eq!(settings.client.request_interval, MIN_REQUEST_INTERVAL);
        assert_eq!(settings.format, OutputFormat::Csv);
    }

    #[test]
    fn test_output_format_from_file() {
        let args = create_test_args(check_command());
        let mut file_config = file_with_credentials();
        file_config.output = Some(OutputConfig {
            format: Some("json".to_string()),
        });

        let settings = resolve_settings(&args, &EnvConfig::default(), file_config).unwrap();
        assert_eq!(settings.format, OutputFormat::Json);
    }

    #[test]
    fn test_invalid_cli_duration() {
        let mut args = create_test_args(check_command());
        args.timeout = Some("soon".to_string());
        let err = resolve_settings(&args, &EnvConfig::default(), file_with_credentials())
            .unwrap_err();
        assert!(err.to_string().contains("--timeout"));
    }

    #[test]
    fn test_parse_filter() {
        assert_eq!(
            parse_filter("service_type=2").unwrap(),
            ("service_type".to_string(), serde_json::json!(2))
        );
        assert_eq!(
            parse_filter("primary=").unwrap(),
            ("primary".to_string(), Value::String(String::new()))
        );
        assert_eq!(
            parse_filter("network=inner").unwrap(),
            ("network".to_string(), Value::String("inner".to_string()))
        );
        assert!(parse_filter("novalue").is_err());
        assert!(parse_filter("=x").is_err());
        assert!(parse_filter("domains=a.com").is_err());
    }

    #[test]
    fn test_collect_domains() {
        let domains = collect_domains(&[" a.jd.local ".to_string(), "".to_string()], None).unwrap();
        assert_eq!(domains, vec!["a.jd.local"]);

        let err = collect_domains(&[], None).unwrap_err();
        assert!(matches!(err, DomainApiError::InvalidRequest { .. }));
    }

    #[test]
    fn test_tally_and_error_stats() {
        let results = vec![
            entry("free.jd.local", Ok(-1)),
            entry("taken.jd.local", Ok(1)),
            entry("boom.jd.local", Err(DomainApiError::transport("refused"))),
            entry("bad.jd.local", Err(DomainApiError::application(400, "bad"))),
        ];

        let (available, unavailable, stats) = tally(&results);
        assert_eq!(available, 1);
        assert_eq!(unavailable, 1);
        assert_eq!(stats.transport_errors, vec!["boom.jd.local"]);
        assert_eq!(stats.application_errors, vec!["bad.jd.local"]);
        assert!(stats.other_errors.is_empty());
    }

    #[test]
    fn test_render_csv() {
        let results = vec![
            entry("free.jd.local", Ok(-1)),
            entry(
                "bad.jd.local",
                Err(DomainApiError::application(400, "bad, \"really\"")),
            ),
        ];

        let csv = render_csv(&results);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "domain,available,status,message,error");
        assert_eq!(lines[1], "free.jd.local,true,-1,msg,");
        assert_eq!(
            lines[2],
            "bad.jd.local,unknown,,,\"API error 400: bad, \"\"really\"\"\""
        );
    }

    #[test]
    fn test_render_json() {
        let results = vec![
            entry("free.jd.local", Ok(-1)),
            entry("boom.jd.local", Err(DomainApiError::transport("refused"))),
        ];

        let parsed: Value = serde_json::from_str(&render_json(&results).unwrap()).unwrap();
        assert_eq!(parsed[0]["domain"], "free.jd.local");
        assert_eq!(parsed[0]["available"], true);
        assert_eq!(parsed[0]["status"], -1);
        assert_eq!(parsed[1]["available"], Value::Null);
        assert_eq!(parsed[1]["error"], "Transport error: refused");
        assert!(parsed[1].get("status").is_none());
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let args = Args::try_parse_from([
            "domain-status",
            "info",
            "jd.local",
            "--filter",
            "primary=",
            "--erp",
            "alice.ops",
        ])
        .unwrap();
        assert_eq!(args.erp.as_deref(), Some("alice.ops"));
        match args.command {
            Command::Info(info) => {
                assert_eq!(info.domains, vec!["jd.local"]);
                assert_eq!(info.filters.len(), 1);
            }
            other => panic!("unexpected command {:?}", other),
        }

        assert!(
            Args::try_parse_from(["domain-status", "check", "a.jd.local", "--json", "--csv"])
                .is_err()
        );
    }

    #[test]
    fn test_text_failures_are_reported_once() {
        let err = report_failure(
            "Check failed",
            "boom.jd.local",
            DomainApiError::transport_with_status(500, "upstream exploded", ""),
            OutputFormat::Text,
        );
        assert!(err.is::<Reported>());
        assert!(err.to_string().contains("HTTP 500"));

        let err = report_failure(
            "Lookup failed",
            "jd.local",
            DomainApiError::application(403, "sign invalid"),
            OutputFormat::Json,
        );
        assert!(!err.is::<Reported>());
        assert!(err.is::<DomainApiError>());
    }
}
