use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::config::{
    load_configuration, resolve_settings, save_configuration, ConfigurationAtoms,
    EnvironmentName, GeneratorSettings, SecretMapEntry,
};
use crate::contract::{analyze_contract, load_contract};
use crate::environment::{ProxyConfiguration, RebindOptions};
use crate::generator::{generate_with_limits, write_bundle};
use crate::grouping::{add_suggested_product, apply_suggestion, build_suggestions};
use crate::logging::{init_logging_with_config, LogConfig};
use crate::reconcile::{reconcile, validate_entries, OperationKind};
use crate::runtime_config::RuntimeConfig;

/// Command-line interface for proxygen
///
/// Derives per-environment proxy configuration from naming atoms and an
/// OpenAPI contract, and generates the deployable proxy bundle.
#[derive(Parser, Debug)]
#[command(name = "proxygen", version)]
#[command(about = "API proxy configuration generator", long_about = None)]
pub struct Cli {
    /// Debug-level, human-readable logging (overrides PROXYGEN_LOG_*)
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Naming atoms given on the command line
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct AtomArgs {
    #[arg(long)]
    pub entity: Option<String>,
    #[arg(long)]
    pub domain: Option<String>,
    /// Backend application (repeat or comma-separate for several)
    #[arg(long = "backend-app", value_delimiter = ',')]
    pub backend_apps: Vec<String>,
    #[arg(long)]
    pub business_object: Option<String>,
    /// API version atom, e.g. v1
    #[arg(long = "api-version")]
    pub api_version: Option<String>,
}

impl AtomArgs {
    /// Overlay the given atoms on `base`.
    pub fn merge_into(&self, mut base: ConfigurationAtoms) -> ConfigurationAtoms {
        if let Some(v) = &self.entity {
            base.entity = v.clone();
        }
        if let Some(v) = &self.domain {
            base.domain = v.clone();
        }
        if !self.backend_apps.is_empty() {
            base.backend_apps = self.backend_apps.clone();
        }
        if let Some(v) = &self.business_object {
            base.business_object = v.clone();
        }
        if let Some(v) = &self.api_version {
            base.version = v.clone();
        }
        base
    }
}

/// Available proxygen commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a configuration document with all four environments
    Init {
        #[command(flatten)]
        atoms: AtomArgs,

        /// Contract used to pre-fill environment hosts
        #[arg(short, long)]
        contract: Option<PathBuf>,

        /// Configuration document to write (YAML or JSON by extension)
        #[arg(short, long, default_value = "proxy.yaml")]
        output: PathBuf,

        /// Overwrite an existing document
        #[arg(short, long, default_value_t = false)]
        force: bool,
    },
    /// Change naming atoms and rename every environment accordingly
    Update {
        #[arg(short = 'C', long, default_value = "proxy.yaml")]
        config: PathBuf,

        #[command(flatten)]
        atoms: AtomArgs,

        /// Carry secret-map entries over when a map's name changes
        #[arg(long, default_value_t = false)]
        migrate_secret_maps: bool,

        /// Path to proxygen.toml (auto-detected next to the document)
        #[arg(long)]
        settings: Option<PathBuf>,
    },
    /// Set the primary target host of one environment
    SetHost {
        #[arg(short = 'C', long, default_value = "proxy.yaml")]
        config: PathBuf,

        /// dev1, uat1, staging or prod1 (aliases such as prod are accepted)
        #[arg(short, long)]
        env: EnvironmentName,

        #[arg(long)]
        host: String,
    },
    /// Generate the proxy bundle
    Generate {
        #[arg(short = 'C', long, default_value = "proxy.yaml")]
        config: PathBuf,

        /// OpenAPI contract (YAML or JSON)
        #[arg(short, long)]
        contract: PathBuf,

        /// Directory the bundle directory is created in
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Overwrite existing files
        #[arg(short, long, default_value_t = false)]
        force: bool,

        /// List the files and the bundle fingerprint without writing anything
        #[arg(long, default_value_t = false)]
        dry_run: bool,

        /// Path to proxygen.toml (auto-detected next to the document)
        #[arg(long)]
        settings: Option<PathBuf>,
    },
    /// Suggest API products by grouping contract paths
    Suggest {
        #[arg(short, long)]
        contract: PathBuf,

        /// Suggestion id to apply to the configuration document
        #[arg(long, requires = "config")]
        apply: Option<String>,

        #[arg(short = 'C', long)]
        config: Option<PathBuf>,

        /// Environments to apply to (default: all)
        #[arg(short, long, value_delimiter = ',')]
        env: Vec<EnvironmentName>,

        /// Add the suggestion as an extra product instead of scoping the primary one
        #[arg(long, default_value_t = false)]
        additional: bool,
    },
    /// Copy the source environment's secret maps to every other environment
    Propagate {
        #[arg(short = 'C', long, default_value = "proxy.yaml")]
        config: PathBuf,
    },
    /// Classify the changes between two secret-map entry lists
    Diff {
        /// Entries as last saved (YAML or JSON list of {name, value})
        original: PathBuf,

        /// Entries as edited
        new: PathBuf,

        /// Path to proxygen.toml for validation limits
        #[arg(long)]
        settings: Option<PathBuf>,
    },
}

/// Parse arguments, initialize logging and execute the command
///
/// # Errors
///
/// Returns an error if a document cannot be read or written, if required
/// atoms or hosts are missing, or if a secret map fails validation.
pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let log_config = if cli.verbose {
        LogConfig::default_dev()
    } else {
        LogConfig::from_env()
    };
    let _guard = init_logging_with_config(&log_config)?;
    run_command(cli.command)
}

/// Settings from `proxygen.toml` with environment overrides applied.
///
/// Commands read `limits` and `migrate_secret_maps_on_rename`; `publish` is
/// resolved for completeness but no command publishes.
fn effective_settings(explicit: Option<&Path>, config_path: &Path) -> anyhow::Result<GeneratorSettings> {
    let mut settings = resolve_settings(explicit, config_path)?;
    RuntimeConfig::from_env().apply(&mut settings);
    Ok(settings)
}

/// Entry lists are accepted as a bare list or as a whole secret map.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum EntryDocument {
    List(Vec<SecretMapEntry>),
    Map { entries: Vec<SecretMapEntry> },
}

fn load_entries(path: &Path) -> anyhow::Result<Vec<SecretMapEntry>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read entries: {}", path.display()))?;
    let is_json = path.extension().map(|e| e == "json").unwrap_or(false);
    let doc: EntryDocument = if is_json {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON entries: {}", path.display()))?
    } else {
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML entries: {}", path.display()))?
    };
    Ok(match doc {
        EntryDocument::List(entries) | EntryDocument::Map { entries } => entries,
    })
}

/// Execute one command
pub fn run_command(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Init {
            atoms,
            contract,
            output,
            force,
        } => {
            if output.exists() && !force {
                bail!(
                    "{} already exists (use --force to overwrite)",
                    output.display()
                );
            }
            let atoms = atoms.merge_into(ConfigurationAtoms::default());
            let mut config = ProxyConfiguration::from_atoms(atoms)?;
            if let Some(contract_path) = contract {
                let contract = load_contract(&contract_path)?;
                let filled = config.environments.apply_host_hints(&analyze_contract(&contract));
                for env in filled {
                    println!("host for {env} filled from contract");
                }
            }
            save_configuration(&config, &output)?;
            println!(
                "✅ {} written to {}",
                config.proxy_name.as_deref().unwrap_or_default(),
                output.display()
            );
            Ok(())
        }
        Commands::Update {
            config: config_path,
            atoms,
            migrate_secret_maps,
            settings,
        } => {
            let settings = effective_settings(settings.as_deref(), &config_path)?;
            let mut config = load_configuration(&config_path)?;
            let new_atoms = atoms.merge_into(config.atoms.clone());
            let options = RebindOptions {
                migrate_renamed_secret_maps: migrate_secret_maps
                    || settings.migrate_secret_maps_on_rename,
            };
            let change = config.update_atoms(new_atoms, options)?;
            match &change.current {
                Some(current) if change.renamed() => println!(
                    "proxy renamed: {} → {current}",
                    change.previous.as_deref().unwrap_or("<none>")
                ),
                Some(current) => println!("proxy name unchanged: {current}"),
                None => {
                    let missing: Vec<String> = config
                        .atoms
                        .missing_fields()
                        .into_iter()
                        .map(|f| f.field)
                        .collect();
                    println!("atoms incomplete, names not derived: {}", missing.join(", "));
                }
            }
            for report in &change.rebinds {
                let env = report.env.map(|e| e.to_string()).unwrap_or_default();
                for (old, new) in &report.migrated {
                    println!("  {env}: secret map {old} migrated to {new}");
                }
                for dropped in &report.dropped {
                    warn!(env = %env, map = %dropped, "secret map entries discarded");
                    println!("  {env}: secret map {dropped} dropped with its entries");
                }
            }
            save_configuration(&config, &config_path)?;
            Ok(())
        }
        Commands::SetHost {
            config: config_path,
            env,
            host,
        } => {
            let mut config = load_configuration(&config_path)?;
            if !config.environments.set_host(env, host.as_str()) {
                bail!(
                    "environment {env} is not configured in {}",
                    config_path.display()
                );
            }
            save_configuration(&config, &config_path)?;
            println!("{env} host set to {host}");
            Ok(())
        }
        Commands::Generate {
            config: config_path,
            contract,
            output,
            force,
            dry_run,
            settings,
        } => {
            let settings = effective_settings(settings.as_deref(), &config_path)?;
            let config = load_configuration(&config_path)?;
            let contract = load_contract(&contract)?;
            let bundle = generate_with_limits(
                &config.atoms,
                &config.environments,
                &contract,
                &settings.limits,
            )?;
            if dry_run {
                for path in bundle.paths() {
                    println!("{}/{path}", bundle.root_directory_name);
                }
                println!("fingerprint: {}", bundle.fingerprint());
                return Ok(());
            }
            let root = write_bundle(&bundle, &output, force)?;
            println!(
                "✅ {} file(s) written to {} (fingerprint {})",
                bundle.len(),
                root.display(),
                bundle.fingerprint()
            );
            Ok(())
        }
        Commands::Suggest {
            contract,
            apply,
            config,
            env,
            additional,
        } => {
            let contract = load_contract(&contract)?;
            let suggestions = build_suggestions(&contract.paths);
            let (Some(id), Some(config_path)) = (apply, config) else {
                println!("{}", serde_json::to_string_pretty(&suggestions)?);
                return Ok(());
            };
            let suggestion = suggestions
                .iter()
                .find(|s| s.id == id)
                .with_context(|| {
                    let ids: Vec<&str> = suggestions.iter().map(|s| s.id.as_str()).collect();
                    format!("no suggestion '{id}' (available: {})", ids.join(", "))
                })?;
            let mut proxy = load_configuration(&config_path)?;
            let targets = if env.is_empty() {
                EnvironmentName::ALL.to_vec()
            } else {
                env
            };
            for target in targets {
                let atoms = proxy.atoms.clone();
                let Some(env_config) = proxy.environments.get_mut(target) else {
                    bail!("environment {target} is not configured in {}", config_path.display());
                };
                if additional {
                    add_suggested_product(env_config, target, &atoms, suggestion)?;
                } else {
                    apply_suggestion(env_config, suggestion);
                }
                println!("{target}: applied suggestion {}", suggestion.id);
            }
            save_configuration(&proxy, &config_path)?;
            Ok(())
        }
        Commands::Propagate {
            config: config_path,
        } => {
            let mut config = load_configuration(&config_path)?;
            let report = config.environments.propagate_secret_maps();
            if report.is_noop() {
                println!("secret maps already in sync ({} unchanged)", report.unchanged);
                return Ok(());
            }
            for written in &report.written {
                println!("{}: {} updated from {}", written.env, written.map, EnvironmentName::SOURCE);
            }
            save_configuration(&config, &config_path)?;
            Ok(())
        }
        Commands::Diff {
            original,
            new,
            settings,
        } => {
            let settings = effective_settings(settings.as_deref(), &new)?;
            let original_entries = load_entries(&original)?;
            let new_entries = load_entries(&new)?;
            validate_entries(&new_entries, &settings.limits)?;
            let plan = reconcile(&original_entries, &new_entries);
            for op in &plan.operations {
                let marker = match op.kind {
                    OperationKind::Added => '+',
                    OperationKind::Updated => '~',
                    OperationKind::Deleted => '-',
                };
                println!("{marker} {}", op.name);
            }
            println!(
                "{} added, {} updated, {} deleted",
                plan.added().len(),
                plan.updated().len(),
                plan.deleted().len()
            );
            Ok(())
        }
    }
}
