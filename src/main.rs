//! Maniforge CLI entrypoint.
//!
//! This is the main entrypoint for the maniforge command-line tool.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use maniforge::cli::{Cli, Commands, OutputFormatter};
use maniforge::config::{
    ConfigParser, ConfigValidator, DEFAULT_CONFIG_FILES, ManiforgeConfig, Platform,
    find_config_file,
};
use maniforge::error::{ConfigError, PlanError, Result};
use maniforge::generator::ManifestWriter;
use maniforge::planner::{ActionType, CapacityPlanner, PlanReport};
use maniforge::state::{ApplyHistoryEntry, ApplyState, LocalStateStore, StateStore};
use maniforge::translator::Translator;

use clap::Parser;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Starter configuration written by `init`.
const CONFIG_TEMPLATE: &str = include_str!("../templates/maniforge.yaml");

/// Example environment overrides written by `init`.
const ENV_TEMPLATE: &str = include_str!("../templates/.env.example");

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<ExitCode> {
    let formatter = OutputFormatter::new(cli.output);

    match cli.command {
        Commands::Init { path, name, force } => cmd_init(&path, &name, force),
        Commands::Validate { warnings } => cmd_validate(cli.config.as_ref(), warnings, &formatter),
        Commands::Plan { detailed } => cmd_plan(cli.config.as_ref(), detailed, &formatter).await,
        Commands::Apply { yes } => cmd_apply(cli.config.as_ref(), yes, &formatter).await,
        Commands::Capacity { detailed } => cmd_capacity(cli.config.as_ref(), detailed, &formatter),
    }
}

/// Initialize a new project.
fn cmd_init(path: &Path, cluster_name: &str, force: bool) -> Result<ExitCode> {
    info!("Initializing new maniforge project in: {}", path.display());

    let config_path = path.join(DEFAULT_CONFIG_FILES[0]);
    let env_path = path.join(".env.example");
    let gitignore_path = path.join(".gitignore");

    if !force && config_path.exists() {
        return Err(ConfigError::AlreadyExists { path: config_path }.into());
    }

    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }

    std::fs::write(&config_path, CONFIG_TEMPLATE.replace("__CLUSTER_NAME__", cluster_name))?;
    eprintln!("Created: {}", config_path.display());

    std::fs::write(&env_path, ENV_TEMPLATE)?;
    eprintln!("Created: {}", env_path.display());

    if gitignore_path.exists() {
        let existing = std::fs::read_to_string(&gitignore_path)?;
        if !existing.lines().any(|line| line.trim() == ".env") {
            let mut file = std::fs::OpenOptions::new()
                .append(true)
                .open(&gitignore_path)?;
            writeln!(file, "\n# maniforge\n.env")?;
            eprintln!("Updated: {}", gitignore_path.display());
        }
    } else {
        std::fs::write(&gitignore_path, ".env\n")?;
        eprintln!("Created: {}", gitignore_path.display());
    }

    eprintln!("\nProject initialized.");
    eprintln!("Next steps:");
    eprintln!("  1. Edit {} with your apps and node groups", DEFAULT_CONFIG_FILES[0]);
    eprintln!("  2. Run 'maniforge plan' to see what will be generated");
    eprintln!("  3. Run 'maniforge apply' to write the manifests");

    Ok(ExitCode::SUCCESS)
}

/// Validate configuration.
fn cmd_validate(
    config_path: Option<&PathBuf>,
    show_warnings: bool,
    formatter: &OutputFormatter,
) -> Result<ExitCode> {
    let (config_file, parser) = open_config(config_path)?;
    info!("Validating configuration: {}", config_file.display());

    let config = parser.load_with_env(&config_file)?;
    let validator = ConfigValidator::new();
    let mut result = validator.check(&config);

    // Lookup tables are only known once profiles and overrides are merged.
    if result.is_valid() {
        let profiles = parser.load_profiles()?;
        let platform = Platform::from_config(&config, profiles.as_ref())?;
        validator.check_references(&config, &platform, &mut result);
    }
    emit(&formatter.format_validation(&result, &config, show_warnings))?;

    if result.is_valid() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// Show what apply would change.
async fn cmd_plan(
    config_path: Option<&PathBuf>,
    detailed: bool,
    formatter: &OutputFormatter,
) -> Result<ExitCode> {
    let workspace = Workspace::load(config_path)?;
    let previous = workspace.previous_state().await?;

    let report = PlanReport::build(
        &workspace.config,
        &workspace.platform,
        &previous.map(|s| s.apps).unwrap_or_default(),
    );
    emit(&formatter.format_plan(&report, detailed))?;

    Ok(ExitCode::from(report.status().exit_code()))
}

/// Write manifests and record the applied state.
async fn cmd_apply(
    config_path: Option<&PathBuf>,
    auto_approve: bool,
    formatter: &OutputFormatter,
) -> Result<ExitCode> {
    let workspace = Workspace::load(config_path)?;
    let mut state = workspace
        .previous_state()
        .await?
        .unwrap_or_else(|| ApplyState::new(&workspace.config.cluster.name));

    let report = PlanReport::build(&workspace.config, &workspace.platform, &state.apps);
    emit(&formatter.format_plan(&report, false))?;

    if report.has_errors() {
        return Err(PlanError::ResolutionFailed {
            count: report.error_messages().len(),
        }
        .into());
    }

    if report.is_empty() {
        eprintln!("No changes to apply.");
        return Ok(ExitCode::SUCCESS);
    }

    if !auto_approve && !confirm("Do you want to apply this plan? [y/N]: ")? {
        eprintln!("Apply cancelled.");
        return Ok(ExitCode::SUCCESS);
    }

    let writer = ManifestWriter::new(&workspace.output_dir);
    let mut created = Vec::new();
    let mut updated = Vec::new();
    let mut deleted = Vec::new();

    for action in report.actions() {
        let outcome = match action.action_type {
            ActionType::Remove => writer.remove_app(&action.app).await,
            ActionType::Write => match report.resolved.get(&action.app) {
                Some(app) => writer.write_app(app).await.map(|_| ()),
                None => continue,
            },
        };

        if let Err(e) = outcome {
            error!("Failed to apply {action}: {e}");
            state.add_history(ApplyHistoryEntry::failed(&report.config_hash, &e.to_string()));
            workspace.store.save(&state).await?;
            return Err(e);
        }

        match action.action_type {
            ActionType::Remove => deleted.push(action.app),
            ActionType::Write if state.apps.contains_key(&action.app) => updated.push(action.app),
            ActionType::Write => created.push(action.app),
        }
    }

    let entry = ApplyHistoryEntry::new(&report.config_hash, created, updated, deleted);
    state.set_apps(report.resolved.clone(), &report.config_hash);
    state.add_history(entry.clone());
    workspace.store.save(&state).await?;

    if report.capacity.any_over_capacity() {
        warn!("Applied with node groups whose limits exceed capacity");
    }

    emit(&formatter.format_apply(&entry))?;
    Ok(ExitCode::SUCCESS)
}

/// Show node-group capacity.
fn cmd_capacity(
    config_path: Option<&PathBuf>,
    detailed: bool,
    formatter: &OutputFormatter,
) -> Result<ExitCode> {
    let workspace = Workspace::load(config_path)?;

    let outcome = Translator::new(&workspace.platform).translate_all(&workspace.config.apps);
    let analysis = CapacityPlanner::new(workspace.platform.node_groups()).analyze(&outcome.resolved);

    for error in &outcome.errors {
        eprintln!("Error: {error}");
    }
    emit(&formatter.format_capacity(&analysis, detailed))?;

    if outcome.is_success() && analysis.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Everything a command needs once the configuration is loaded.
struct Workspace {
    config: ManiforgeConfig,
    platform: Platform,
    output_dir: PathBuf,
    store: Box<dyn StateStore>,
}

impl Workspace {
    /// Loads, validates and resolves the configuration.
    fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let (config_file, parser) = open_config(config_path)?;
        debug!("Loading configuration from: {}", config_file.display());

        let config = parser.load_with_env(&config_file)?;
        ConfigValidator::new().validate(&config)?;

        let profiles = parser.load_profiles()?;
        let platform = Platform::from_config(&config, profiles.as_ref())?;

        let output_dir = base_dir(&config_file).join(&config.output.directory);
        let store: Box<dyn StateStore> = Box::new(LocalStateStore::for_output_dir(&output_dir));

        Ok(Self {
            config,
            platform,
            output_dir,
            store,
        })
    }

    async fn previous_state(&self) -> Result<Option<ApplyState>> {
        let state = self.store.load().await?;
        if state.is_none() {
            debug!("No applied state yet; planning from scratch");
        }
        Ok(state)
    }
}

/// Resolves the configuration file and a parser rooted next to it.
fn open_config(config_path: Option<&PathBuf>) -> Result<(PathBuf, ConfigParser)> {
    let config_file = config_path.map_or_else(|| find_config_file("."), |path| Ok(path.clone()))?;

    let parser = ConfigParser::new().with_base_path(base_dir(&config_file));
    parser.load_dotenv()?;

    Ok((config_file, parser))
}

fn base_dir(config_file: &Path) -> PathBuf {
    config_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

/// Writes a formatted report to stdout.
fn emit(text: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", text.trim_end())?;
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    eprint!("{prompt}");
    std::io::stderr().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}
