//! pkginfo - generates package-info.java declarations for Java source trees.
//!
//! Usage:
//!   pkginfo [run]            Scan source roots and synthesize declarations
//!   pkginfo scan             Write the packages file (or print it with --stdout)
//!   pkginfo generate         Synthesize declarations from an existing packages file
//!   pkginfo check            Report drift without writing; exits 1 when out of date
//!   pkginfo --help           Show help

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, bail, eyre};
use serde_json::json;

use pkginfo_core::{ProjectConfig, ScanConfig, SynthConfig, read_packages_file, render_packages};
use pkginfo_scan::{PackageScan, PackageScanner};
use pkginfo_synth::{SynthesisReport, Synthesizer, TextTemplate};

#[derive(Parser)]
#[command(
    name = "pkginfo",
    version,
    about = "Generate package-info.java declarations for Java packages",
    long_about = "pkginfo finds every directory that directly holds Java sources but no \
                  hand-written package-info.java, and keeps a generated declaration for \
                  each of them in an output directory.\n\n\
                  Settings come from pkginfo.toml in the working directory (or --config); \
                  command line flags override them."
)]
struct Cli {
    /// Configuration file (defaults to ./pkginfo.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Source root to scan, may be repeated (replaces configured roots)
    #[arg(short, long = "root", global = true)]
    roots: Vec<PathBuf>,

    /// Output directory for generated declarations
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Packages file shared by the scan and generate steps
    #[arg(short, long, global = true)]
    packages_file: Option<PathBuf>,

    /// File holding the declaration template, `{package}` is replaced by the name
    #[arg(short, long, global = true)]
    template_file: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Scan source roots and synthesize declarations (default)
    Run,

    /// Scan source roots and write the packages file
    Scan {
        /// Print package names instead of writing the packages file
        #[arg(long)]
        stdout: bool,
    },

    /// Synthesize declarations from an existing packages file
    Generate,

    /// Report what `run` would change without touching anything
    Check,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Effective settings after merging the configuration file and flags.
struct Settings {
    scan: ScanConfig,
    synth: Option<SynthConfig>,
    packages_file: Option<PathBuf>,
    template: TextTemplate,
}

impl Settings {
    fn load(cli: &Cli) -> Result<Self> {
        let config_path = match &cli.config {
            Some(path) => Some(path.clone()),
            None => Some(PathBuf::from(ProjectConfig::FILE_NAME)).filter(|p| p.is_file()),
        };

        let mut settings = match config_path {
            Some(path) => {
                let project = ProjectConfig::load(&path)
                    .wrap_err_with(|| format!("Failed to load {}", path.display()))?;
                tracing::debug!(path = %path.display(), "loaded configuration");
                Self {
                    scan: project.scan,
                    synth: Some(project.synth),
                    packages_file: Some(project.packages_file),
                    template: project.template.map(TextTemplate::new).unwrap_or_default(),
                }
            }
            None => Self {
                scan: ScanConfig::default(),
                synth: None,
                packages_file: None,
                template: TextTemplate::default(),
            },
        };

        if !cli.roots.is_empty() {
            settings.scan.roots = cli
                .roots
                .iter()
                .map(|root| absolute(root))
                .collect::<Result<_>>()?;
        }
        if let Some(output) = &cli.output {
            let output = absolute(output)?;
            settings.synth = Some(match settings.synth.take() {
                Some(synth) => SynthConfig {
                    output_root: output,
                    ..synth
                },
                None => SynthConfig::new(output),
            });
        }
        if let Some(packages_file) = &cli.packages_file {
            settings.packages_file = Some(absolute(packages_file)?);
        }
        if let Some(template_file) = &cli.template_file {
            let text = fs::read_to_string(template_file).wrap_err_with(|| {
                format!("Failed to read template {}", template_file.display())
            })?;
            settings.template = TextTemplate::new(text);
        }

        settings.scan.validate().wrap_err("Invalid scan settings")?;
        if let Some(synth) = &settings.synth {
            synth.validate().wrap_err("Invalid synthesis settings")?;
        }
        if let (Some(packages_file), Some(synth)) = (&settings.packages_file, &settings.synth)
            && packages_file.starts_with(&synth.output_root)
        {
            bail!("Packages file must not live inside the output root");
        }

        Ok(settings)
    }

    fn scanner(&self) -> Result<PackageScanner> {
        if self.scan.roots.is_empty() {
            bail!("No source roots configured (use --root or a configuration file)");
        }
        PackageScanner::new(self.scan.clone()).wrap_err("Invalid scan settings")
    }

    fn synthesizer(&self) -> Result<Synthesizer> {
        let synth = self
            .synth
            .clone()
            .ok_or_else(|| eyre!("No output directory configured (use --output or a configuration file)"))?;
        Ok(Synthesizer::new(synth))
    }

    fn packages_file(&self) -> Result<&Path> {
        self.packages_file
            .as_deref()
            .ok_or_else(|| eyre!("No packages file configured (use --packages-file or a configuration file)"))
    }
}

fn main() -> Result<ExitCode> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = Settings::load(&cli)?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run_pipeline(&settings, cli.format)?,
        Command::Scan { stdout } => run_scan(&settings, stdout, cli.format)?,
        Command::Generate => run_generate(&settings, cli.format)?,
        Command::Check => return run_check(&settings, cli.format),
    }

    Ok(ExitCode::SUCCESS)
}

/// Log to stderr, filtered by `RUST_LOG` when set.
fn init_tracing(verbose: u8) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        })
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Scan, persist the packages file when one is configured, then synthesize.
fn run_pipeline(settings: &Settings, format: OutputFormat) -> Result<()> {
    let scanner = settings.scanner()?;
    let synthesizer = settings.synthesizer()?;

    let scan = match &settings.packages_file {
        Some(path) => scanner.scan_to_file(path),
        None => scanner.scan(),
    }
    .wrap_err("Scan failed")?;

    let report = synthesizer
        .synthesize(&scan.packages, &settings.template)
        .wrap_err("Synthesis failed")?;

    match format {
        OutputFormat::Text => {
            print_scan_summary(&scan);
            print_report(&report, false);
        }
        OutputFormat::Json => {
            let output = json!({ "scan": scan, "synthesis": report });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

fn run_scan(settings: &Settings, stdout: bool, format: OutputFormat) -> Result<()> {
    let scanner = settings.scanner()?;

    let scan = if stdout {
        scanner.scan()
    } else {
        scanner.scan_to_file(settings.packages_file()?)
    }
    .wrap_err("Scan failed")?;

    match format {
        OutputFormat::Text if stdout => print!("{}", render_packages(&scan.packages)),
        OutputFormat::Text => print_scan_summary(&scan),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&scan)?),
    }

    Ok(())
}

fn run_generate(settings: &Settings, format: OutputFormat) -> Result<()> {
    let synthesizer = settings.synthesizer()?;
    let packages_file = settings.packages_file()?;

    let report = synthesizer
        .synthesize_from_file(packages_file, &settings.template)
        .wrap_err_with(|| format!("Failed to generate from {}", packages_file.display()))?;

    match format {
        OutputFormat::Text => print_report(&report, false),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    Ok(())
}

/// Compare the configured packages file and output tree against a fresh scan.
fn run_check(settings: &Settings, format: OutputFormat) -> Result<ExitCode> {
    let scanner = settings.scanner()?;
    let synthesizer = settings.synthesizer()?;

    let scan = scanner.scan().wrap_err("Scan failed")?;
    let report = synthesizer
        .plan(&scan.packages, &settings.template)
        .wrap_err("Check failed")?;

    // A missing or unreadable packages file is stale, not an error.
    let packages_file_stale = match &settings.packages_file {
        Some(path) => match read_packages_file(path) {
            Ok(recorded) => recorded != scan.packages,
            Err(err) => {
                tracing::debug!(path = %path.display(), error = %err, "packages file unusable");
                true
            }
        },
        None => false,
    };
    let up_to_date = report.is_up_to_date() && !packages_file_stale;

    match format {
        OutputFormat::Text => {
            if packages_file_stale {
                println!("packages file is out of date");
            }
            print_report(&report, true);
            println!("{}", if up_to_date { "up to date" } else { "out of date" });
        }
        OutputFormat::Json => {
            let output = json!({
                "up_to_date": up_to_date,
                "packages_file_stale": packages_file_stale,
                "plan": report,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(if up_to_date {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_scan_summary(scan: &PackageScan) {
    println!(
        "{} packages in {} directories ({} overridden) in {:.2}s",
        scan.stats.packages,
        scan.stats.directories,
        scan.stats.overridden,
        scan.duration.as_secs_f64()
    );
    if scan.stats.rejected > 0 {
        println!("{} directories skipped for unusable names", scan.stats.rejected);
    }
    if scan.stats.missing_roots > 0 {
        println!("{} source roots not found", scan.stats.missing_roots);
    }
}

/// Print a synthesis report, or a plan when `planned` is set.
fn print_report(report: &SynthesisReport, planned: bool) {
    let (create, update, remove) = if planned {
        ("create", "update", "remove")
    } else {
        ("created", "updated", "removed")
    };

    for path in &report.created {
        println!("{create:>8} {}", path.display());
    }
    for path in &report.updated {
        println!("{update:>8} {}", path.display());
    }
    for removal in &report.removed {
        let marker = if removal.is_dir { "/" } else { "" };
        println!("{remove:>8} {}{marker}", removal.path.display());
    }

    let tally = if planned { "to " } else { "" };
    println!(
        "{} {tally}{create}, {} {tally}{update}, {} unchanged, {} {tally}{remove}",
        report.created.len(),
        report.updated.len(),
        report.unchanged,
        report.removed.len()
    );
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).wrap_err_with(|| format!("Invalid path {}", path.display()))
}
