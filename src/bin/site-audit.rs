//! CLI tool for auditing a website

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use site_audit::{run_audit, AuditConfig, AuditResult, CheckStatus, MetricValue, ProgressFn};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "site-audit")]
#[command(about = "Audit a website for conversion, performance, trust and SEO issues", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to custom configuration file (TOML)
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run full audit and display summary
    Scan {
        /// Page to audit (scheme optional, https assumed)
        url: String,

        /// Domain used for SEO lookups (default: the URL host without www.)
        #[arg(long)]
        domain: Option<String>,

        /// Exit with failure if the overall score is below this threshold (0-100)
        #[arg(long)]
        fail_threshold: Option<u8>,

        /// Display recommendations, web vitals and the request trail
        #[arg(long)]
        detailed: bool,
    },

    /// Generate detailed audit report
    Report {
        /// Page to audit (scheme optional, https assumed)
        url: String,

        /// Domain used for SEO lookups (default: the URL host without www.)
        #[arg(long)]
        domain: Option<String>,

        /// Output format
        #[arg(short = 'f', long, default_value = "markdown")]
        format: ReportFormat,

        /// Output file (default: stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Debug)]
enum ReportFormat {
    Json,
    Markdown,
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ReportFormat::Json),
            "markdown" | "md" => Ok(ReportFormat::Markdown),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let config = if let Some(config_path) = &cli.config {
        match load_config(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{} Failed to load config: {:#}", "Error:".red().bold(), e);
                process::exit(1);
            }
        }
    } else {
        AuditConfig::default()
    };

    let (url, domain) = match &cli.command {
        Commands::Scan { url, domain, .. } | Commands::Report { url, domain, .. } => {
            (url.clone(), domain.clone())
        }
    };

    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar.enable_steady_tick(std::time::Duration::from_millis(100));

    let sink = bar.clone();
    let on_progress: &ProgressFn = &move |percent: u8, label: &str| {
        sink.set_position(u64::from(percent));
        sink.set_message(label.to_string());
    };

    let result = run_audit(&url, domain.as_deref(), &config, Some(on_progress)).await;

    bar.finish_and_clear();

    let result = match result {
        Ok(result) => result,
        Err(e) => {
            eprintln!("{} Audit failed: {}", "Error:".red().bold(), e);
            process::exit(1);
        }
    };

    match cli.command {
        Commands::Scan {
            fail_threshold,
            detailed,
            ..
        } => {
            display_summary(&result);

            if detailed {
                println!();
                display_detailed(&result);
            }

            if let Some(threshold) = fail_threshold {
                if result.overall_score < threshold {
                    eprintln!(
                        "\n{} overall score {} is below threshold {}",
                        "Failed:".red().bold(),
                        result.overall_score,
                        threshold
                    );
                    process::exit(1);
                }
            }
        }

        Commands::Report { format, output, .. } => {
            let content = match format {
                ReportFormat::Json => generate_json_report(&result),
                ReportFormat::Markdown => generate_markdown_report(&result),
            };

            if let Some(output_path) = output {
                match std::fs::write(&output_path, content) {
                    Ok(_) => println!("Report written to: {}", output_path.display()),
                    Err(e) => {
                        eprintln!("{} Failed to write report: {}", "Error:".red().bold(), e);
                        process::exit(1);
                    }
                }
            } else {
                println!("{}", content);
            }
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(path: &Path) -> anyhow::Result<AuditConfig> {
    AuditConfig::load(path).with_context(|| format!("reading {}", path.display()))
}

fn display_summary(result: &AuditResult) {
    println!("\n{}", "=== Audit Summary ===".bold());
    println!("Site: {} ({})", result.domain.cyan(), result.url);
    println!(
        "Overall score: {}   Projected: {}",
        result.overall_score.colored_grade(),
        result.projected_score
    );
    if result.monthly_revenue_loss > 0 {
        println!(
            "Estimated revenue loss: {}",
            format!("${}/month", result.monthly_revenue_loss).red()
        );
    }
    println!();

    println!("Categories:");
    for category in &result.categories {
        println!(
            "  {:<12} {:>3}  (weight {:>2})  {}",
            category.name,
            category.score.colored_grade(),
            category.weight,
            category.description.dimmed()
        );
    }
    println!();

    println!(
        "Findings: {} failing, {} warnings, {} passing",
        result.count_status(CheckStatus::Fail).to_string().red(),
        result.count_status(CheckStatus::Warning).to_string().yellow(),
        result.count_status(CheckStatus::Pass).to_string().green()
    );
    println!("Data sources: {}", result.meta.data_sources_used.join(", "));

    if !result.meta.notes.is_empty() {
        println!("Notes:");
        for note in &result.meta.notes {
            println!("  - {}", note.yellow());
        }
    }
}

fn display_detailed(result: &AuditResult) {
    println!("{}", "=== Recommendations ===".bold());
    for rec in &result.recommendations {
        let status = match rec.status {
            CheckStatus::Fail => rec.status.to_string().red(),
            CheckStatus::Warning => rec.status.to_string().yellow(),
            CheckStatus::Pass => rec.status.to_string().green(),
        };
        println!(
            "[{}] {} ({}, {} impact)",
            status,
            rec.title.bold(),
            rec.category,
            rec.impact
        );
        println!("    {}", rec.description);
    }

    if let Some(cwv) = &result.core_web_vitals {
        println!("\n{}", "=== Core Web Vitals ===".bold());
        print_vital("LCP", Some(&cwv.lcp));
        print_vital("FID", cwv.fid.as_ref());
        print_vital("CLS", Some(&cwv.cls));
        print_vital("FCP", Some(&cwv.fcp));
        print_vital("TBT", cwv.tbt.as_ref());
    }

    let seo = &result.seo_metrics;
    println!("\n{}", "=== SEO ===".bold());
    println!("  Source: {}", seo.source);
    println!("  Organic traffic: {}", or_dash(seo.organic_traffic));
    println!("  Organic keywords: {}", or_dash(seo.organic_keywords));
    println!("  Backlinks: {}", or_dash(seo.backlinks));
    println!("  Authority: {}", or_dash(seo.authority_score));

    println!("\n{}", "=== API Calls ===".bold());
    for call in &result.api_calls {
        let status = match (call.status, &call.error) {
            (Some(code), None) => code.to_string().green(),
            (Some(code), Some(_)) => code.to_string().red(),
            (None, _) => "---".red(),
        };
        println!("  {} {} {}ms", status, call.source, call.duration_ms);
        if let Some(error) = &call.error {
            println!("      {}", error.yellow());
        }
        println!("      {}", call.curl.dimmed());
    }
}

trait ColoredGrade {
    fn colored_grade(&self) -> ColoredString;
}

impl ColoredGrade for u8 {
    fn colored_grade(&self) -> ColoredString {
        let text = self.to_string();
        match *self {
            80..=100 => text.green(),
            60..=79 => text.yellow(),
            _ => text.red(),
        }
    }
}

fn print_vital(name: &str, metric: Option<&MetricValue>) {
    match metric {
        Some(m) => println!(
            "  {}: {:.2} ({}, {:?})",
            name,
            m.value,
            m.rating,
            m.source
        ),
        None => println!("  {}: -", name),
    }
}

fn or_dash<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn generate_json_report(result: &AuditResult) -> String {
    serde_json::to_string_pretty(result).unwrap_or_else(|e| {
        eprintln!("Failed to serialize report: {}", e);
        process::exit(1);
    })
}

fn generate_markdown_report(result: &AuditResult) -> String {
    let mut md = String::new();

    md.push_str(&format!("# Website Audit Report: {}\n\n", result.domain));
    md.push_str(&format!("**Generated:** {}\n\n", result.timestamp));
    md.push_str(&format!("**URL:** {}\n\n", result.url));

    md.push_str("## Summary\n\n");
    md.push_str(&format!("{}\n\n", result.summary));
    md.push_str(&format!("- Overall score: {}\n", result.overall_score));
    md.push_str(&format!("- Projected score: {}\n", result.projected_score));
    md.push_str(&format!(
        "- Estimated monthly revenue loss: ${}\n",
        result.monthly_revenue_loss
    ));
    md.push_str(&format!(
        "- Data sources: {}\n\n",
        result.meta.data_sources_used.join(", ")
    ));

    md.push_str("## Categories\n\n");
    md.push_str("| Category | Score | Weight | Details |\n");
    md.push_str("|----------|-------|--------|---------|\n");
    for category in &result.categories {
        md.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            category.name, category.score, category.weight, category.description
        ));
    }

    md.push_str("\n## Recommendations\n\n");
    md.push_str("| Status | Impact | Category | Title | Details |\n");
    md.push_str("|--------|--------|----------|-------|---------|\n");
    for rec in &result.recommendations {
        md.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            rec.status, rec.impact, rec.category, rec.title, rec.description
        ));
    }

    if !result.meta.notes.is_empty() {
        md.push_str("\n## Notes\n\n");
        for note in &result.meta.notes {
            md.push_str(&format!("- {}\n", note));
        }
    }

    md
}
