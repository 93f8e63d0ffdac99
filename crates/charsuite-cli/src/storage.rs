//! Persistent run reports
//!
//! Every `charsuite run` is saved regardless of `--output` mode.
//! Directory layout: `{report_dir}/{host_port}_{timestamp}/`

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use charsuite_core::{Config, Failure, SuiteReport, Verdict, to_http_file};

const DEFAULT_REPORT_DIR: &str = ".charsuite/reports";

/// Everything needed to persist a suite run.
pub struct ReportData<'a> {
    pub config: &'a Config,
    pub report: &'a SuiteReport,
    /// Failures left after the verdict policy filter
    pub failures: &'a [Failure],
    pub verdict: &'a Verdict,
    pub duration_secs: f64,
}

/// Report root: `--report-dir`, then `report_dir` from config, then the default.
pub fn report_base_dir(cli_dir: Option<&Path>, config: &Config) -> PathBuf {
    cli_dir
        .map(Path::to_path_buf)
        .or_else(|| config.report_dir.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_REPORT_DIR))
}

/// Save a run under `base/{host_port}_{timestamp}/`.
///
/// Returns the report directory path on success.
pub fn save_report(data: &ReportData, base: &Path) -> Result<PathBuf, std::io::Error> {
    let report_dir = base.join(build_dir_name(&data.config.base_url));
    std::fs::create_dir_all(&report_dir)?;

    // config.toml, password masked
    let config_toml = toml::to_string_pretty(&data.config.masked())
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    std::fs::write(report_dir.join("config.toml"), config_toml)?;

    let summary = serde_json::json!({
        "verdict": {
            "status": data.verdict.status.to_string(),
            "exit_code": data.verdict.exit_code,
            "reason": data.verdict.reason,
        },
        "stats": {
            "total": data.report.total,
            "passed": data.report.passed,
            "failed": data.report.failed,
            "errored": data.report.errored,
        },
        "meta": {
            "timestamp": timestamp_iso(),
            "duration_secs": data.duration_secs,
            "base_url": data.config.base_url,
        },
        "scenarios": data.report.scenarios,
    });
    std::fs::write(
        report_dir.join("summary.json"),
        serde_json::to_string_pretty(&summary).map_err(|e| std::io::Error::other(e.to_string()))?,
    )?;

    if !data.failures.is_empty() {
        std::fs::write(
            report_dir.join("failures.json"),
            serde_json::to_string_pretty(data.failures)
                .map_err(|e| std::io::Error::other(e.to_string()))?,
        )?;
        let http_content = to_http_file(data.failures, &data.config.base_url, "base_url");
        std::fs::write(report_dir.join("reproductions.http"), http_content)?;
    }

    Ok(report_dir)
}

/// `{host_port}_{timestamp}` e.g. `rest.test.ivi.ru_20261018T193000`
fn build_dir_name(base_url: &str) -> String {
    format!("{}_{}", extract_host_port(base_url), timestamp_compact())
}

/// `"http://localhost:8080/path"` → `"localhost_8080"`
fn extract_host_port(url: &str) -> String {
    url.split("://")
        .nth(1)
        .unwrap_or(url)
        .split('/')
        .next()
        .unwrap_or("unknown")
        .replace(':', "_")
}

/// `"20261018T193000"`, filesystem-safe.
fn timestamp_compact() -> String {
    let (y, mo, d, h, mi, s) = utc_now();
    format!("{y:04}{mo:02}{d:02}T{h:02}{mi:02}{s:02}")
}

/// `"2026-10-18T19:30:00Z"`
fn timestamp_iso() -> String {
    let (y, mo, d, h, mi, s) = utc_now();
    format!("{y:04}-{mo:02}-{d:02}T{h:02}:{mi:02}:{s:02}Z")
}

fn utc_now() -> (i32, u32, u32, u32, u32, u32) {
    let epoch_secs = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    let days = (epoch_secs / 86400) as i64;
    let tod = epoch_secs % 86400;
    let (y, m, d) = civil_from_days(days);
    (
        y,
        m,
        d,
        (tod / 3600) as u32,
        ((tod % 3600) / 60) as u32,
        (tod % 60) as u32,
    )
}

/// Howard Hinnant's `civil_from_days`: epoch days → (year, month, day).
///
/// Reference: <https://howardhinnant.github.io/date_algorithms.html#civil_from_days>
fn civil_from_days(days: i64) -> (i32, u32, u32) {
    let z = days + 719_468;
    let era = (if z >= 0 { z } else { z - 146_096 }) / 146_097;
    let doe = (z - era * 146_097) as u32;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let y = if m <= 2 { y + 1 } else { y };
    (y as i32, m, d)
}
