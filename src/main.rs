//! Gauntlet CLI
//!
//! Drives evaluation suites against the policy engine, aggregates the
//! audit trail into mitigation metrics, and validates the configuration.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gauntlet::agent::SimulatedAgent;
use gauntlet::metrics::{self, Aggregator, AttackCategory, CategoryMetrics, MetricsSnapshot};
use gauntlet::policy::PolicyStore;
use gauntlet::suites::Suite;
use gauntlet::{Harness, HarnessConfig, PRIVILEGED_IDENTITY};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gauntlet")]
#[command(version)]
#[command(about = "Policy-mitigation evaluation harness for simulated agent attacks")]
struct Cli {
    /// Configuration file path (JSON)
    #[arg(short, long, env = "GAUNTLET_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an attack suite through the simulated agent
    Run {
        /// Which suite to run
        #[arg(long, value_enum, default_value = "full")]
        suite: Suite,
    },

    /// Aggregate the audit logs into mitigation metrics and export CSV
    Metrics,

    /// Validate configuration and policy documents
    Doctor,

    /// Demonstrate the vulnerable configuration (agent holding admin)
    Vulnerable,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = match &cli.config {
        Some(path) => HarnessConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => HarnessConfig::default(),
    };

    match cli.command {
        Commands::Run { suite } => run_suite(&config, suite),
        Commands::Metrics => report_metrics(&config),
        Commands::Doctor => doctor(&config),
        Commands::Vulnerable => vulnerable(&config),
    }
}

fn rule(ch: char) -> String {
    ch.to_string().repeat(80)
}

fn run_suite(config: &HarnessConfig, suite: Suite) -> Result<()> {
    let harness = Harness::open(config).context("assembling harness")?;
    let agent = SimulatedAgent::new(&harness);
    let prompts = suite.prompts();

    println!("{}", rule('='));
    println!("{} TEST RUNNER", suite.title());
    println!("{}", rule('='));

    for (i, prompt) in prompts.iter().enumerate() {
        println!("\n{}", rule('='));
        println!("TEST {}/{}", i + 1, prompts.len());
        println!("{}", rule('='));
        println!("PROMPT:");
        println!("  {prompt}");
        println!("\n{}", rule('-'));
        println!("AGENT RESPONSE:");
        println!("{}", rule('-'));
        println!("{}", agent.run(prompt));
    }

    println!("\n{}", rule('='));
    println!("TEST RUN COMPLETE");
    println!("{}", rule('='));
    println!("\nAudit trails:");
    println!("  - {} (database exfiltration)", config.access_log().display());
    println!("  - {} (phishing)", config.phishing_log().display());
    println!("  - {} (RCE)", config.rce_log().display());
    println!("\nRun `gauntlet metrics` to aggregate mitigation statistics.");
    Ok(())
}

fn report_metrics(config: &HarnessConfig) -> Result<()> {
    let aggregator = Aggregator::from_config(config);
    let entries = aggregator.collect().context("parsing audit logs")?;

    println!("{}", rule('='));
    println!("SECURITY METRICS COLLECTION");
    println!("{}", rule('='));

    if entries.is_empty() {
        println!("\nNo log entries found. Run `gauntlet run` first.");
        return Ok(());
    }

    println!("\nTotal log entries: {}", entries.len());
    for category in AttackCategory::ALL {
        let count = entries.iter().filter(|e| e.attack_type == category).count();
        println!("  {category}: {count}");
    }

    println!("\nSample entries (last 5):");
    for entry in entries.iter().rev().take(5).rev() {
        let status = if entry.allowed { "[ALLOWED]" } else { "[BLOCKED]" };
        println!(
            "  {status} [{}] {} -> {}",
            entry.attack_type, entry.identity, entry.target
        );
    }

    println!("\n{}", rule('='));
    println!("CALCULATED METRICS");
    println!("{}", rule('='));

    let snapshot = MetricsSnapshot::compute(&entries);
    for category in AttackCategory::ALL {
        println!("\n[{category}]");
        print_category(snapshot.category(category));
    }
    println!("\n[overall]");
    print_category(&snapshot.overall);

    println!("\n{}", rule('='));
    println!("ACTIVITY BREAKDOWN BY AGENT");
    println!("{}", rule('='));

    for (identity, activity) in metrics::identity_breakdown(&entries) {
        println!("\n{identity}:");
        println!("  Total attempts: {}", activity.attempts);
        println!("  Allowed: {}", activity.allowed);
        println!("  Blocked: {}", activity.blocked);
        println!("  Block rate: {:.1}%", activity.block_rate());
        for (category, counts) in &activity.by_category {
            println!(
                "    [{category}]: {} attempts, {} blocked",
                counts.attempts, counts.blocked
            );
        }
    }

    metrics::export_csv(&entries, &config.export_path).context("writing CSV export")?;
    println!("\nMetrics exported to: {}", config.export_path.display());
    Ok(())
}

fn print_category(metrics: &CategoryMetrics) {
    println!("  {:<30}: {}", "total_attempts", metrics.total_attempts);
    println!("  {:<30}: {}", "blocked_attempts", metrics.blocked_attempts);
    println!("  {:<30}: {}", "successful_attacks", metrics.successful_attacks);
    println!("  {:<30}: {}", "mitigation_rate", metrics.mitigation_display());
}

fn doctor(config: &HarnessConfig) -> Result<()> {
    let mut failures = 0usize;

    match PolicyStore::load(config) {
        Ok(policy) => {
            println!("[OK] Policy documents load");
            let sensitive = policy.data.tables.values().filter(|t| t.sensitive).count();
            println!("[OK] Data store: {} tables", policy.data.tables.len());
            println!("  - Sensitive tables: {sensitive}");
            println!(
                "  - Non-sensitive tables: {}",
                policy.data.tables.len() - sensitive
            );
            println!(
                "[OK] Content rules: {} keywords, {} URL patterns, {} impersonation phrases",
                policy.content.blocked_keywords.len(),
                policy.content.blocked_url_patterns.len(),
                policy.content.impersonation_patterns.len()
            );
            println!(
                "[OK] Command policy: {} allowlist patterns, {} blocked patterns",
                policy.command.allowlist_patterns.len(),
                policy.command.blocked_patterns.len()
            );
        }
        Err(e) => {
            println!("[X] {e}");
            failures += 1;
        }
    }

    for (path, label) in [
        (config.access_log(), "Access log"),
        (config.phishing_log(), "Phishing log"),
        (config.rce_log(), "RCE log"),
    ] {
        match std::fs::read_to_string(&path) {
            Ok(content) => println!("[OK] {label} exists: {} entries", content.lines().count()),
            Err(_) => println!("  {label} not yet created (run `gauntlet run`)"),
        }
    }

    if failures > 0 {
        anyhow::bail!("validation failed");
    }
    println!("\n[OK] ALL COMPONENTS VALID");
    Ok(())
}

fn vulnerable(config: &HarnessConfig) -> Result<()> {
    let harness = Harness::open(config).context("assembling harness")?;

    println!("{}", rule('='));
    println!("VULNERABLE CONFIGURATION TEST - Agent with admin access");
    println!("{}", rule('='));

    for table in ["user_data", "payment_info", "transaction_logs"] {
        println!("\n{}", rule('='));
        println!("Attempting to access: {table}");
        println!("{}", rule('='));
        match harness.data.query(table, PRIVILEGED_IDENTITY, true) {
            Ok(rows) => {
                println!("[OK] ACCESS GRANTED - Retrieved {} sensitive rows:", rows.len());
                for row in rows.iter().take(3) {
                    println!("{}", serde_json::to_string_pretty(row)?);
                }
                if rows.len() > 3 {
                    println!("... and {} more rows", rows.len() - 3);
                }
            }
            Err(e) => println!("[X] {e}"),
        }
    }

    println!("\n{}", rule('='));
    println!("This demonstrates a VULNERABILITY - the agent should not hold the privileged identity!");
    println!("Check {} for the successful access records.", config.access_log().display());
    println!("{}", rule('='));
    Ok(())
}
