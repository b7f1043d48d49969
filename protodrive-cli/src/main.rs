mod config;

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use config::parse_map_flag;
use protodrive_core::adapters::{ProtocCompiler, ShellBundleGenerator};
use protodrive_core::ports::SchemaCompiler;
use protodrive_core::{interrupt, plan_jobs, DriveConfig, DriveError, Driver, Language};
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "protodrive",
    version,
    about = "Regenerate protobuf bindings for every target language from one schema tree."
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Regenerate bindings: the baseline language always, opt-ins on request.
    Generate(GenerateArgs),
    /// Print the job list a generate run would execute, without running it.
    ListJobs(ListJobsArgs),
    /// Probe the external generator tools and report availability.
    Check(CheckArgs),
}

#[derive(Debug, Parser)]
struct GenerateArgs {
    /// Opt-in output languages (the baseline is always generated).
    #[arg(value_enum)]
    languages: Vec<OptInLanguage>,

    /// Repository root (default: current directory).
    #[arg(long, default_value = ".")]
    root: Utf8PathBuf,

    /// Schema compiler program (overrides the config file).
    #[arg(long)]
    protoc: Option<String>,

    /// Additional source→namespace mapping, repeatable.
    #[arg(long, value_name = "SOURCE=NAMESPACE")]
    map: Vec<String>,
}

#[derive(Debug, Parser)]
struct ListJobsArgs {
    /// Opt-in output languages to include in the listing.
    #[arg(value_enum)]
    languages: Vec<OptInLanguage>,

    /// Repository root (default: current directory).
    #[arg(long, default_value = ".")]
    root: Utf8PathBuf,

    /// Additional source→namespace mapping, repeatable.
    #[arg(long, value_name = "SOURCE=NAMESPACE")]
    map: Vec<String>,
}

#[derive(Debug, Parser)]
struct CheckArgs {
    /// Repository root (default: current directory).
    #[arg(long, default_value = ".")]
    root: Utf8PathBuf,

    /// Schema compiler program (overrides the config file).
    #[arg(long)]
    protoc: Option<String>,
}

/// Languages a user can opt into. The baseline is not listed: it always
/// runs, and anything else is rejected at parse time.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OptInLanguage {
    Go,
    Cpp,
    Js,
}

impl From<OptInLanguage> for Language {
    fn from(lang: OptInLanguage) -> Self {
        match lang {
            OptInLanguage::Go => Language::Go,
            OptInLanguage::Cpp => Language::Cpp,
            OptInLanguage::Js => Language::Js,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match real_main(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::from(e.exit_code())
        }
    }
}

fn real_main(cli: Cli) -> Result<(), DriveError> {
    match cli.cmd {
        Command::Generate(args) => cmd_generate(args),
        Command::ListJobs(args) => cmd_list_jobs(args),
        Command::Check(args) => cmd_check(args),
    }
}

fn load_drive_config(
    root: &Utf8PathBuf,
    map_flags: &[String],
) -> Result<(config::ProtodriveConfig, DriveConfig), DriveError> {
    let file_config = config::load_or_default(root)?;
    let mut drive = file_config.to_drive_config(root);
    for flag in map_flags {
        drive.mappings.push(parse_map_flag(flag)?);
    }
    debug!(mappings = drive.mappings.len(), "merged configuration");
    Ok((file_config, drive))
}

fn cmd_generate(args: GenerateArgs) -> Result<(), DriveError> {
    let (file_config, drive) = load_drive_config(&args.root, &args.map)?;
    if drive.mappings.is_empty() {
        return Err(DriveError::Fatal(anyhow::anyhow!(
            "no schema mappings configured; add [[mapping]] entries to {} or pass --map",
            config::CONFIG_FILE_NAME
        )));
    }

    interrupt::install_handler()?;

    let compiler = ProtocCompiler::new(
        args.protoc
            .unwrap_or_else(|| file_config.compiler.program.clone()),
    );
    let bundler = ShellBundleGenerator::new(
        file_config.bundler.program.clone(),
        file_config.bundler.args.clone(),
    );

    let languages: Vec<Language> = args.languages.iter().map(|l| Language::from(*l)).collect();
    let driver = Driver::new(drive, &compiler, &bundler);
    driver.run(&languages)?;
    info!("regeneration complete");
    Ok(())
}

fn cmd_list_jobs(args: ListJobsArgs) -> Result<(), DriveError> {
    let (_, drive) = load_drive_config(&args.root, &args.map)?;
    let languages: Vec<Language> = args.languages.iter().map(|l| Language::from(*l)).collect();
    let jobs = plan_jobs(&drive, &languages);

    println!("  {:<8} {:<32} {}", "LANGUAGE", "SOURCE", "DESTINATION");
    for job in &jobs {
        println!(
            "  {:<8} {:<32} {}",
            job.language.token(),
            job.source_dir,
            job.dest_base.join(&job.namespace)
        );
    }
    println!();
    println!("{} job(s).", jobs.len());
    Ok(())
}

fn cmd_check(args: CheckArgs) -> Result<(), DriveError> {
    let (file_config, _) = load_drive_config(&args.root, &[])?;
    let program = args
        .protoc
        .unwrap_or_else(|| file_config.compiler.program.clone());

    ProtocCompiler::new(program.clone())
        .check()
        .map_err(|e| DriveError::CompilerUnavailable {
            message: format!("{e:#}"),
        })?;
    println!("schema compiler: {program} ok");
    println!(
        "bundle generator: {} (probed at generate time)",
        file_config.bundler.program
    );
    Ok(())
}
