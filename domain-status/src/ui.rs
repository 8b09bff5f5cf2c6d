//! Text rendering for the domain-status CLI.
//!
//! Every report is built as a `String` by a pure function so the layout can
//! be tested without a terminal; `main.rs` decides where it is printed.
//! Uses only the `console` crate for styling.

use console::{pad_str, style, Alignment, Term};
use domain_status_lib::{Availability, BatchEntry, DomainApiError, DomainInfo, LookupResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::ErrorStats;

const DOMAIN_WIDTH: usize = 36;
const WIDE_RULE: usize = 80;
const NARROW_RULE: usize = 60;

/// Placeholder the NP service uses for an empty environment URL.
const EMPTY_URL_MARKER: &str = "无";

// ── Spinner ──────────────────────────────────────────────────────────────────

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// An async braille-dot spinner that writes to stderr so stdout stays clean.
pub struct Spinner {
    running: Arc<AtomicBool>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl Spinner {
    /// Start a spinner, or return `None` when stderr is not a terminal.
    pub fn start(message: String) -> Option<Self> {
        if !Term::stderr().is_term() {
            return None;
        }

        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();

        let handle = tokio::spawn(async move {
            let term = Term::stderr();
            let mut idx = 0usize;
            while running_clone.load(Ordering::Relaxed) {
                let frame = SPINNER_FRAMES[idx % SPINNER_FRAMES.len()];
                let _ = term.clear_line();
                let _ = term.write_str(&format!("{} {}", style(frame).cyan(), message));
                idx += 1;
                tokio::time::sleep(Duration::from_millis(80)).await;
            }
            let _ = term.clear_line();
        });

        Some(Self {
            running,
            handle: Some(handle),
        })
    }

    /// Stop the spinner and clear the line.
    pub async fn stop(mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(h) = self.handle.take() {
            let _ = h.await;
        }
    }
}

// ── Lookup report ────────────────────────────────────────────────────────────

/// Numbered per-domain report for a bulk lookup.
pub fn render_lookup_report(result: &LookupResult) -> String {
    let mut out = Vec::new();
    let rule = "=".repeat(WIDE_RULE);

    out.push(rule.clone());
    out.push(format!(
        "{} {}",
        style("Domain lookup").bold(),
        style(format!("({} found)", result.count)).dim()
    ));
    out.push(rule.clone());

    if result.infos.is_empty() {
        out.push(style("No domain records returned").yellow().to_string());
        return out.join("\n");
    }

    for (i, info) in result.infos.iter().enumerate() {
        out.push(String::new());
        out.push(style(format!("#{}", i + 1)).cyan().bold().to_string());
        out.push("-".repeat(NARROW_RULE));
        out.extend(render_domain_info(info));
    }

    out.push(String::new());
    out.push(rule.clone());
    out.push(format!(
        "{} {} record{} processed",
        style("Done:").green().bold(),
        result.infos.len(),
        if result.infos.len() == 1 { "" } else { "s" }
    ));
    out.push(rule);

    out.join("\n")
}

fn render_domain_info(info: &DomainInfo) -> Vec<String> {
    let na = |value: &Option<String>| value.clone().unwrap_or_else(|| "N/A".to_string());
    let present = |value: &Option<String>| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from)
    };

    let domain = if info.domain.is_empty() {
        "N/A"
    } else {
        info.domain.as_str()
    };

    let mut lines = vec![
        field("Domain", style(domain).bold().to_string()),
        field(
            "Status",
            format!("{} (code: {})", na(&info.status_desc), na(&info.status)),
        ),
        field("Service type", na(&info.service_type)),
        field("Network", na(&info.network)),
        field("Primary", na(&info.primary)),
        field("Environment", na(&info.app_env)),
    ];

    if let Some(sub) = present(&info.app_env_sub) {
        lines.push(sub_field("Sub-environment", sub));
    }
    if let Some(more) = present(&info.app_env_more) {
        lines.push(sub_field("Details", more));
    }
    if let Some(url) = present(&info.app_env_url).filter(|u| u != EMPTY_URL_MARKER) {
        lines.push(sub_field("URL", url));
    }

    let project = match present(&info.project_id) {
        Some(id) => format!("{} (ID: {})", na(&info.project_name), id),
        None => na(&info.project_name),
    };
    lines.push(field("Project", project));

    lines.push(field("Owner", na(&info.owner)));
    if let Some(email) = present(&info.owner_email) {
        lines.push(sub_field("Email", email));
    }

    let manager = match present(&info.manage_erp) {
        Some(erp) => format!("{} ({})", na(&info.manage_name), erp),
        None => na(&info.manage_name),
    };
    lines.push(field("Manager", manager));

    if let Some(org) = present(&info.org_fullname) {
        lines.push(field("Organization", org));
    }
    if !info.authorizer.is_empty() {
        lines.push(field("Authorizers", info.authorizer.join(", ")));
    }
    if info.is_third_party() {
        lines.push(field("Third-party", "yes".to_string()));
    }
    if let Some(remark) = present(&info.remark) {
        lines.push(field("Remark", remark));
    }

    lines
}

fn field(label: &str, value: String) -> String {
    format!(
        "  {} {}",
        style(pad_str(&format!("{}:", label), 14, Alignment::Left, None)).dim(),
        value
    )
}

fn sub_field(label: &str, value: String) -> String {
    format!("    {} {}: {}", style("└─").dim(), label, value)
}

// ── Availability report ──────────────────────────────────────────────────────

/// Detailed report for a single availability check.
pub fn render_availability_report(result: &Availability) -> String {
    let rule = "=".repeat(NARROW_RULE);
    let mut out = vec![
        rule.clone(),
        style("Domain availability").bold().to_string(),
        rule.clone(),
        field("Domain", style(&result.domain).bold().to_string()),
        field("Status code", result.status.to_string()),
        field(
            "Message",
            if result.message.is_empty() {
                "N/A".to_string()
            } else {
                result.message.clone()
            },
        ),
    ];

    if let Some(description) = result.classification().description() {
        out.push(field("Meaning", description.to_string()));
    }

    out.push(field("Availability", availability_label(result)));
    out.push(rule);
    out.join("\n")
}

/// Report for a single-shot operation that failed, headed by `title`.
pub fn render_failure(title: &str, subject: &str, error: &DomainApiError) -> String {
    let mut out = vec![
        style(title).red().bold().to_string(),
        field("Domain", subject.to_string()),
    ];

    match error {
        DomainApiError::Transport {
            status: Some(status),
            ..
        } => out.push(field("HTTP status", status.to_string())),
        DomainApiError::Application { code, .. } => {
            out.push(field("API status", code.to_string()))
        }
        _ => {}
    }

    out.push(field("Error", error.to_string()));
    out.join("\n")
}

fn availability_label(result: &Availability) -> String {
    if result.is_available() {
        style("AVAILABLE").green().bold().to_string()
    } else {
        style("UNAVAILABLE").red().bold().to_string()
    }
}

// ── Batch progress ───────────────────────────────────────────────────────────

/// One live progress line, e.g. `[2/5] jd.local  UNAVAILABLE  dns bound`.
pub fn render_progress_line(index: usize, total: usize, entry: &BatchEntry) -> String {
    let counter = style(format!("[{}/{}]", index, total)).dim();
    let padded = pad_str(&entry.domain, DOMAIN_WIDTH, Alignment::Left, Some(".."));

    match &entry.result {
        Ok(availability) => format!(
            "  {} {}  {}  {}",
            counter,
            style(&padded).white(),
            availability_label(availability),
            style(&availability.message).dim(),
        ),
        Err(e) => format!(
            "  {} {}  {}  {}",
            counter,
            style(&padded).white(),
            style("FAILED").yellow(),
            style(brief_error(e)).dim(),
        ),
    }
}

// ── Summary ──────────────────────────────────────────────────────────────────

/// Final summary bar with colored counts.
pub fn render_summary(
    total: usize,
    available: usize,
    unavailable: usize,
    failed: usize,
    duration: Duration,
) -> String {
    format!(
        "  {}\n  {} domain{} in {:.1}s  {}  {}  {}  {}  {}  {}",
        style("─".repeat(52)).dim(),
        style(total).bold(),
        if total == 1 { "" } else { "s" },
        duration.as_secs_f64(),
        style("|").dim(),
        style(format!("{} available", available)).green(),
        style("|").dim(),
        style(format!("{} unavailable", unavailable)).red(),
        style("|").dim(),
        style(format!("{} failed", failed)).yellow(),
    )
}

/// Failure breakdown by class; empty when nothing failed.
pub fn render_error_summary(error_stats: &ErrorStats) -> String {
    if !error_stats.has_errors() {
        return String::new();
    }

    let format_list = |domains: &[String], max_show: usize| -> String {
        if domains.len() <= max_show {
            domains.join(", ")
        } else {
            let shown = &domains[..max_show];
            let remaining = domains.len() - max_show;
            format!("{}, ... and {} more", shown.join(", "), remaining)
        }
    };

    let mut out = vec![format!(
        "  {}",
        style("Some domains could not be checked:").yellow()
    )];

    for (label, domains) in [
        ("transport error", &error_stats.transport_errors),
        ("API error", &error_stats.application_errors),
        ("other error", &error_stats.other_errors),
    ] {
        if !domains.is_empty() {
            out.push(format!(
                "  {} {} {}{}: {}",
                style("•").dim(),
                domains.len(),
                label,
                if domains.len() == 1 { "" } else { "s" },
                format_list(domains, 5),
            ));
        }
    }

    out.join("\n")
}

/// Short reason shown next to a failed entry.
fn brief_error(error: &DomainApiError) -> String {
    match error {
        DomainApiError::Transport {
            status: Some(status),
            ..
        } => format!("(HTTP {})", status),
        DomainApiError::Transport { message, .. } if message.contains("timed out") => {
            "(timeout)".to_string()
        }
        DomainApiError::Transport { .. } => "(network error)".to_string(),
        DomainApiError::Application { code, message } => format!("(API {}: {})", code, message),
        DomainApiError::InvalidRequest { .. } => "(invalid request)".to_string(),
        _ => "(error)".to_string(),
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
