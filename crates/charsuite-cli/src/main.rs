//! charsuite CLI - conformance suite for the character catalog REST API

mod storage;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use charsuite_core::{Config, Fixtures, Marker, VerdictPolicy, VerdictStatus};
use charsuite_runner::SuiteRunner;
use charsuite_runner::scenarios::select;

const CONFIG_FILE: &str = ".charsuite.toml";

#[derive(Parser)]
#[command(name = "charsuite")]
#[command(about = "Conformance suite for the character catalog REST API")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, global = true, default_value = "terminal")]
    output: OutputFormat,

    /// Strict mode (warnings become errors). Use --strict false to disable.
    #[arg(long, global = true, default_value_t = true, action = ArgAction::Set)]
    strict: bool,

    /// Verbose output (per-scenario log lines)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the suite against the configured service
    Run {
        /// Config file (default: .charsuite.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Only run scenarios with this marker (repeatable)
        #[arg(short, long = "marker")]
        markers: Vec<MarkerArg>,

        /// Only run scenarios whose id contains this substring
        #[arg(short = 'k', long)]
        filter: Option<String>,

        /// Stop after the first scenario that does not pass
        #[arg(long)]
        fail_fast: bool,

        /// Report directory (default: report_dir from config, then .charsuite/reports)
        #[arg(long)]
        report_dir: Option<PathBuf>,
    },

    /// List scenario ids without sending requests
    List {
        /// Config file (default: .charsuite.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Only list scenarios with this marker (repeatable)
        #[arg(short, long = "marker")]
        markers: Vec<MarkerArg>,

        /// Only list scenarios whose id contains this substring
        #[arg(short = 'k', long)]
        filter: Option<String>,
    },

    /// Initialize config file
    Init,

    /// Check config, credentials and fixtures
    Doctor,

    /// Export JSON Schema for the report format
    Schema,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum MarkerArg {
    HttpFunctional,
    ObjectsApi,
    NegativeCases,
}

impl From<MarkerArg> for Marker {
    fn from(arg: MarkerArg) -> Self {
        match arg {
            MarkerArg::HttpFunctional => Marker::HttpFunctional,
            MarkerArg::ObjectsApi => Marker::ObjectsApi,
            MarkerArg::NegativeCases => Marker::NegativeCases,
        }
    }
}

#[derive(Clone, Copy, ValueEnum, PartialEq, Eq)]
enum OutputFormat {
    Terminal,
    Json,
    Silent,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.output, cli.verbose);

    match run(cli) {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(3)
        }
    }
}

/// `RUST_LOG` wins; otherwise `warn`, `info` with `-v`, nothing when silent.
fn init_tracing(output: OutputFormat, verbose: bool) {
    let default = match (output, verbose) {
        (OutputFormat::Silent, _) => "off",
        (_, true) => "info",
        (_, false) => "warn",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn verdict_policy(strict: bool) -> VerdictPolicy {
    if strict {
        VerdictPolicy::default()
    } else {
        VerdictPolicy::lenient()
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let cfg = match path {
        Some(path) => {
            Config::load(path).with_context(|| format!("loading {}", path.display()))?
        }
        None => Config::load_default()?,
    };
    Ok(cfg.with_env())
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Run {
            config,
            markers,
            filter,
            fail_fast,
            report_dir,
        } => {
            let cfg = load_config(config.as_deref())?;
            let fixtures = Fixtures::from_config(&cfg)?;
            let markers: Vec<Marker> = markers.into_iter().map(Marker::from).collect();

            if cli.output != OutputFormat::Silent {
                eprintln!("Config:");
                eprintln!("  base_url: {}", cfg.base_url);
                eprintln!(
                    "  login:    {}",
                    if cfg.login.is_empty() { "(empty)" } else { cfg.login.as_str() }
                );
                match &cfg.fixtures {
                    Some(path) => eprintln!("  fixtures: {}", path.display()),
                    None => eprintln!("  fixtures: built-in"),
                }
                if !markers.is_empty() {
                    let names: Vec<&str> = markers.iter().map(|m| m.as_str()).collect();
                    eprintln!("  markers:  {}", names.join(", "));
                }
                if let Some(filter) = &filter {
                    eprintln!("  filter:   {filter}");
                }
                eprintln!();
            }

            let runner = SuiteRunner::from_config(&cfg, fixtures)?
                .with_markers(markers)
                .with_filter(filter)
                .with_fail_fast(fail_fast);

            let start = Instant::now();
            let report = runner.run();
            let duration_secs = start.elapsed().as_secs_f64();

            // Nothing selected → tool error
            if report.total == 0 {
                eprintln!("Error: No scenarios matched the given markers/filter.");
                return Ok(3);
            }

            let errors = report.errors();
            if !errors.is_empty() && cli.output != OutputFormat::Silent {
                eprintln!("Errors:");
                for err in &errors {
                    eprintln!("  - {err}");
                }
                eprintln!();
            }

            let policy = verdict_policy(cli.strict);
            let filtered = policy.filter(report.failures());
            let verdict = policy.verdict(&filtered, report.total, report.passed, report.errored);

            match cli.output {
                OutputFormat::Terminal => {
                    let icon = if verdict.status == VerdictStatus::Pass {
                        "PASS"
                    } else {
                        "FAIL"
                    };
                    println!("\n{icon}: {}", verdict.reason);
                    println!(
                        "  Scenarios: {} total, {} passed, {} failed, {} errored",
                        report.total, report.passed, report.failed, report.errored
                    );
                    println!("  Duration: {duration_secs:.2}s");
                    println!("  Exit code: {}", verdict.exit_code);

                    if !filtered.is_empty() {
                        println!("\nFailures ({}):", filtered.len());
                        for f in &filtered {
                            println!(
                                "  [{:?}] {} {} {} -> {} ({})",
                                f.severity, f.id, f.method, f.path, f.status_code, f.failure_type
                            );
                            if let Some(msg) = f.message() {
                                for line in msg.lines() {
                                    println!("         {line}");
                                }
                            }
                        }
                    }
                }
                OutputFormat::Json => {
                    let json_output = serde_json::json!({
                        "verdict": {
                            "status": verdict.status.to_string(),
                            "exit_code": verdict.exit_code,
                            "reason": verdict.reason,
                        },
                        "stats": {
                            "total": report.total,
                            "passed": report.passed,
                            "failed": report.failed,
                            "errored": report.errored,
                        },
                        "scenarios": report.scenarios,
                        "failures": filtered,
                    });
                    println!("{}", serde_json::to_string_pretty(&json_output)?);
                }
                OutputFormat::Silent => {}
            }

            let report_data = storage::ReportData {
                config: &cfg,
                report: &report,
                failures: &filtered,
                verdict: &verdict,
                duration_secs,
            };
            let base = storage::report_base_dir(report_dir.as_deref(), &cfg);
            match storage::save_report(&report_data, &base) {
                Ok(path) => {
                    if cli.output != OutputFormat::Silent {
                        eprintln!("Report saved: {}", path.display());
                    }
                }
                Err(e) => eprintln!("Warning: failed to save report: {e}"),
            }

            Ok(verdict.exit_code)
        }

        Commands::List {
            config,
            markers,
            filter,
        } => {
            let cfg = load_config(config.as_deref())?;
            let fixtures = Fixtures::from_config(&cfg)?;
            let markers: Vec<Marker> = markers.into_iter().map(Marker::from).collect();
            let cases = select(&fixtures, &markers, filter.as_deref());

            match cli.output {
                OutputFormat::Terminal => {
                    for case in &cases {
                        println!("{:<16} {}", case.marker().as_str(), case.id);
                    }
                    println!("\n{} scenarios", cases.len());
                }
                OutputFormat::Json => {
                    let listing: Vec<_> = cases
                        .iter()
                        .map(|case| serde_json::json!({"id": case.id, "marker": case.marker()}))
                        .collect();
                    println!("{}", serde_json::to_string_pretty(&listing)?);
                }
                OutputFormat::Silent => {}
            }
            Ok(if cases.is_empty() { 1 } else { 0 })
        }

        Commands::Init => {
            if Path::new(CONFIG_FILE).exists() {
                eprintln!("{CONFIG_FILE} already exists");
                return Ok(1);
            }

            std::fs::write(CONFIG_FILE, Config::example())?;
            println!("Created {CONFIG_FILE}");
            println!("\nEdit the file to configure:");
            println!("  - base_url: character service to test");
            println!("  - login / password: basic auth credentials");
            println!("  - endpoints: paths if the service deviates from the defaults");
            Ok(0)
        }

        Commands::Doctor => {
            println!("charsuite doctor");
            println!("================\n");

            let mut ready = true;
            let config_found = [".charsuite.toml", ".charsuite.json", "charsuite.toml"]
                .iter()
                .any(|name| Path::new(name).exists());
            println!(
                "[{}] Config file ({CONFIG_FILE})",
                if config_found { "OK" } else { "--" }
            );

            match Config::load_default() {
                Ok(cfg) => {
                    let cfg = cfg.with_env();
                    println!("[OK] base_url ({})", cfg.base_url);

                    let creds_ok = !cfg.login.is_empty() && !cfg.password.is_empty();
                    ready &= creds_ok;
                    println!(
                        "[{}] Credentials (login/password or CHARSUITE_LOGIN/CHARSUITE_PASSWORD)",
                        if creds_ok { "OK" } else { "NG" }
                    );

                    match Fixtures::from_config(&cfg) {
                        Ok(_) => println!(
                            "[OK] Fixtures ({})",
                            cfg.fixtures
                                .as_deref()
                                .map_or_else(|| "built-in".to_string(), |p| p.display().to_string())
                        ),
                        Err(e) => {
                            ready = false;
                            println!("[NG] Fixtures: {e}");
                        }
                    }
                }
                Err(e) => {
                    ready = false;
                    println!("[NG] Config: {e}");
                }
            }

            if !config_found {
                println!("\nCreate config file:");
                println!("  charsuite init");
            }

            if ready {
                println!("\nReady to run!");
                Ok(0)
            } else {
                Ok(1)
            }
        }

        Commands::Schema => {
            let schema = charsuite_core::report::generate_schema();
            println!("{schema}");
            Ok(0)
        }
    }
}
