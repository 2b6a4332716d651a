#![forbid(unsafe_code)]

//! addon-profiles command line
//!
//! Lists and applies addon profiles for the configured installation. Settings
//! come from the JSON config; `--install-path` and `--account` override it for
//! a single run.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{Level as TraceLevel, info, warn};
use tracing_subscriber::FmtSubscriber;

use addon_profiles::ProfileError;
use addon_profiles::config::AppConfig;
use addon_profiles::constants::config::DEFAULT_LOG_LEVEL;
use addon_profiles::store::{ProfileStore, validate_install_directory};
use addon_profiles::types::{Database, Profile, filter_addons};

#[derive(Debug, Parser)]
#[command(name = "addon-profiles", version, about = "Switch World of Warcraft addon profiles")]
struct Cli {
    /// Game installation directory (overrides the config)
    #[arg(long, global = true)]
    install_path: Option<PathBuf>,

    /// Account directory name (overrides the config)
    #[arg(long, global = true)]
    account: Option<String>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List account directories
    Accounts,
    /// List profiles for the account
    Profiles,
    /// Show the addons currently in AddOns.txt
    Addons {
        /// Only addons whose name contains this text
        #[arg(long, default_value = "")]
        filter: String,
    },
    /// Show one profile's addons
    Show {
        #[command(flatten)]
        target: ProfileArg,
        #[arg(long, default_value = "")]
        filter: String,
    },
    /// Show what applying a profile would change
    Diff {
        #[command(flatten)]
        target: ProfileArg,
    },
    /// Write a profile's addons to AddOns.txt
    Apply {
        #[command(flatten)]
        target: ProfileArg,
    },
    /// Check the configured installation
    Validate,
    /// Show or change settings
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Debug, clap::Args)]
struct ProfileArg {
    /// Profile name
    profile: String,
    /// Character key ("Name - Realm") for character profiles
    #[arg(long)]
    character: Option<String>,
}

#[derive(Debug, Subcommand)]
enum ConfigCommand {
    Show,
    SetPath { path: PathBuf },
    SetAccount { account: String },
    SetBackups { count: usize },
}

fn parse_level(name: &str) -> TraceLevel {
    match name.to_lowercase().as_str() {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    }
}

fn subscriber(level: &str) -> impl tracing::Subscriber + Send + Sync + 'static {
    FmtSubscriber::builder()
        .with_max_level(parse_level(level))
        .with_writer(std::io::stderr)
        .finish()
}

/// Config at `path`, or defaults when it cannot be read so `config set-path` can repair it.
fn load_or_default(path: &Path) -> AppConfig {
    match AppConfig::load_from(path) {
        Ok(config) => config,
        Err(e) => {
            let message = format!("{e:#}");
            warn!(error = %message, "failed to load config, using defaults");
            AppConfig::default()
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Settings for this run with command-line overrides applied
struct Session {
    config: AppConfig,
    store: ProfileStore,
    /// Whether an auto-selected account may be written back to the config file
    persist_account: bool,
}

impl Session {
    fn new(cli: &Cli, mut config: AppConfig) -> Self {
        if let Some(path) = &cli.install_path {
            config.install_path = path.to_string_lossy().into_owned();
        }
        let persist_account = cli.install_path.is_none() && cli.account.is_none();
        if let Some(account) = &cli.account {
            config.selected_account = account.clone();
        }

        let store = config.store();
        Self {
            config,
            store,
            persist_account,
        }
    }

    /// Selected account, picking and remembering the first one when unset.
    fn account(&mut self) -> Result<String> {
        if !self.config.selected_account.is_empty() {
            return Ok(self.config.selected_account.clone());
        }

        let Some(account) = self.store.default_account()? else {
            return Err(ProfileError::NoAccountSelected.into());
        };
        info!(account, "no account selected, using first account");
        self.config.selected_account = account.clone();

        if self.persist_account {
            let mut saved = AppConfig::load()?;
            saved.selected_account = account.clone();
            saved.save()?;
        }
        Ok(account)
    }

    fn find_profile(&mut self, target: &ProfileArg) -> Result<(String, Profile)> {
        let account = self.account()?;
        let db = self.store.load_profiles(&account)?;
        let profile = lookup(&db, target)?;
        Ok((account, profile))
    }
}

fn lookup(db: &Database, target: &ProfileArg) -> Result<Profile> {
    match db.profile(target.character.as_deref(), &target.profile) {
        Some(profile) => Ok(profile.clone()),
        None => match &target.character {
            Some(character) => bail!("profile {:?} not found for {character}", target.profile),
            None => bail!("account profile {:?} not found", target.profile),
        },
    }
}

fn print_addons(addons: &[(&str, bool)]) {
    for (name, enabled) in addons {
        println!("  [{}] {name}", if *enabled { "x" } else { " " });
    }
}

fn run(cli: Cli, config: AppConfig) -> Result<()> {
    let json = cli.json;
    let mut session = Session::new(&cli, config);

    match cli.command {
        Command::Accounts => {
            let accounts = session.store.list_accounts()?;
            if json {
                return print_json(&accounts);
            }
            for account in accounts {
                let marker = if account == session.config.selected_account { "*" } else { " " };
                println!("{marker} {account}");
            }
        }

        Command::Profiles => {
            let account = session.account()?;
            let db = session.store.load_profiles(&account)?;
            let entries = db.profile_entries();
            if json {
                return print_json(&entries);
            }
            if entries.is_empty() {
                println!("No profiles saved for {account}");
            }
            for entry in entries {
                let owner = entry.character.unwrap_or("account");
                let marker = if entry.active { "*" } else { " " };
                println!(
                    "{marker} {} ({owner}, {}/{} enabled)",
                    entry.profile.name,
                    entry.profile.enabled_count(),
                    entry.profile.addons.len()
                );
            }
        }

        Command::Addons { filter } => {
            let account = session.account()?;
            let active = session.store.active_addons(&account)?;
            let addons = filter_addons(&active, &filter);
            if json {
                return print_json(&addons);
            }
            print_addons(&addons);
        }

        Command::Show { target, filter } => {
            let (_, profile) = session.find_profile(&target)?;
            if json {
                return print_json(&profile);
            }
            println!(
                "{} ({}, auto-deps {})",
                profile.name,
                profile.scope,
                if profile.auto_deps { "on" } else { "off" }
            );
            print_addons(&profile.filter_addons(&filter));
        }

        Command::Diff { target } => {
            let (account, profile) = session.find_profile(&target)?;
            let diff = session.store.preview_apply(&account, &profile)?;
            if json {
                return print_json(&diff);
            }
            if diff.is_empty() {
                println!("AddOns.txt already matches {}", profile.name);
            }
            for (label, names) in [
                ("enable", &diff.enabled),
                ("disable", &diff.disabled),
                ("add", &diff.added),
                ("remove", &diff.removed),
            ] {
                for name in names {
                    println!("{label:>8} {name}");
                }
            }
        }

        Command::Apply { target } => {
            let (account, profile) = session.find_profile(&target)?;
            let report = session.store.apply_profile(&account, &profile)?;
            if json {
                return print_json(&report);
            }
            println!("Applied {} to {}", profile.name, report.manifest.display());
            if let Some(backup) = &report.backup {
                println!("Backup: {}", backup.display());
            }
            let kept = session.store.list_backups(&account)?.len();
            println!("{kept} backup(s) kept, {} removed", report.pruned);
        }

        Command::Validate => {
            if session.config.install_path.is_empty() {
                bail!("install path is not set, use `config set-path`");
            }
            session.config.validate()?;
            println!("{} looks like a valid installation", session.config.install_path);
        }

        Command::Config { action } => config_command(action, &session.config, json)?,
    }

    Ok(())
}

fn config_command(action: ConfigCommand, effective: &AppConfig, json: bool) -> Result<()> {
    let mut config = load_or_default(&AppConfig::path());

    match action {
        ConfigCommand::Show => {
            if json {
                return print_json(effective);
            }
            println!("config file:    {}", AppConfig::path().display());
            println!("install path:   {}", effective.install_path);
            println!("account:        {}", effective.selected_account);
            println!("backups kept:   {}", effective.backup_count);
            println!("log level:      {}", effective.log_level);
            return Ok(());
        }
        ConfigCommand::SetPath { path } => {
            validate_install_directory(&path)
                .with_context(|| format!("{} is not a game installation", path.display()))?;
            config.install_path = path.to_string_lossy().into_owned();
        }
        ConfigCommand::SetAccount { account } => {
            let store = ProfileStore::new(&effective.install_path, effective.backup_count);
            if !store.list_accounts()?.contains(&account) {
                bail!("account {account:?} not found under {}", effective.install_path);
            }
            config.selected_account = account;
        }
        ConfigCommand::SetBackups { count } => {
            if count == 0 {
                bail!("backup count must be at least 1");
            }
            config.backup_count = count;
        }
    }

    config.save()?;
    println!("Saved {}", AppConfig::path().display());
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // The configured level is only known after loading, so loading logs at LOG_LEVEL
    let env_level = std::env::var("LOG_LEVEL").ok();
    let bootstrap = subscriber(env_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL));
    let config = tracing::subscriber::with_default(bootstrap, || {
        load_or_default(&AppConfig::path())
    });

    let level = env_level.unwrap_or_else(|| config.log_level.clone());
    tracing::subscriber::set_global_default(subscriber(&level))?;

    run(cli, config)
}
