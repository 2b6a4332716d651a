//! Profile store: accounts, profile loading and profile application
//!
//! Everything here works against one game installation:
//!
//! ```text
//! <install>/WTF/Account/<account>/AddOns.txt
//! <install>/WTF/Account/<account>/AddOns.txt.backup.<YYYYMMDD_HHMMSS>
//! <install>/WTF/Account/<account>/SavedVariables/AddonProfilesDB.lua
//! ```
//!
//! Operations are synchronous and hold no state between calls; callers must
//! not run two applies against the same account at once.

pub mod backup;
pub mod manifest;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::constants::{backup::DEFAULT_RETENTION, layout, savedvars};
use crate::error::{ProfileError, Result};
use crate::lua;
use crate::types::{AddonSet, Database, Profile};

pub use manifest::ManifestDiff;

/// Outcome of a successful [`ProfileStore::apply_profile`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    pub manifest: PathBuf,
    /// `None` when there was no manifest to back up
    pub backup: Option<PathBuf>,
    /// Old backups deleted by retention
    pub pruned: usize,
}

/// Access to one installation's accounts, profiles and manifests
#[derive(Debug, Clone)]
pub struct ProfileStore {
    install_path: PathBuf,
    backup_count: usize,
}

impl ProfileStore {
    pub fn new(install_path: impl Into<PathBuf>, backup_count: usize) -> Self {
        let backup_count = if backup_count == 0 {
            warn!(using = DEFAULT_RETENTION, "backup count of 0 is not allowed, using default");
            DEFAULT_RETENTION
        } else {
            backup_count
        };

        Self {
            install_path: install_path.into(),
            backup_count,
        }
    }

    pub fn install_path(&self) -> &Path {
        &self.install_path
    }

    pub fn backup_count(&self) -> usize {
        self.backup_count
    }

    fn accounts_dir(&self) -> PathBuf {
        self.install_path
            .join(layout::WTF_DIR)
            .join(layout::ACCOUNT_DIR)
    }

    fn account_dir(&self, account: &str) -> Result<PathBuf> {
        if account.is_empty() {
            return Err(ProfileError::NoAccountSelected);
        }
        Ok(self.accounts_dir().join(account))
    }

    pub fn saved_variables_path(&self, account: &str) -> Result<PathBuf> {
        let file = format!("{}.{}", savedvars::DB_VARIABLE, savedvars::FILE_EXTENSION);
        Ok(self
            .account_dir(account)?
            .join(layout::SAVED_VARIABLES_DIR)
            .join(file))
    }

    pub fn manifest_path(&self, account: &str) -> Result<PathBuf> {
        Ok(self.account_dir(account)?.join(layout::MANIFEST_FILENAME))
    }

    /// Account directory names, sorted.
    pub fn list_accounts(&self) -> Result<Vec<String>> {
        let dir = self.accounts_dir();
        let read_error = |e| ProfileError::io(&dir, e);

        let mut accounts = Vec::new();
        for entry in fs::read_dir(&dir).map_err(read_error)? {
            let entry = entry.map_err(read_error)?;
            if entry.file_type().map_err(read_error)?.is_dir() {
                accounts.push(entry.file_name().to_string_lossy().into_owned());
            }
        }

        accounts.sort();
        debug!(count = accounts.len(), dir = %dir.display(), "listed accounts");
        Ok(accounts)
    }

    /// First account in name order, for when none has been chosen yet.
    pub fn default_account(&self) -> Result<Option<String>> {
        Ok(self.list_accounts()?.into_iter().next())
    }

    /// Read the account's profile database.
    ///
    /// A missing save-data file yields an empty database.
    pub fn load_profiles(&self, account: &str) -> Result<Database> {
        let path = self.saved_variables_path(account)?;

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no SavedVariables file, using empty database");
                return Ok(Database::default());
            }
            Err(e) => return Err(ProfileError::io(&path, e)),
        };

        let parsed = lua::parse_database(&String::from_utf8_lossy(&bytes));
        info!(
            account,
            extractor = ?parsed.extractor,
            profiles = parsed.database.global.profiles.len(),
            characters = parsed.database.characters.len(),
            "loaded profiles"
        );
        Ok(parsed.database)
    }

    /// Addons currently listed in the account's manifest.
    ///
    /// A missing manifest yields an empty set.
    pub fn active_addons(&self, account: &str) -> Result<AddonSet> {
        let path = self.manifest_path(account)?;

        match fs::read(&path) {
            Ok(bytes) => Ok(manifest::parse_manifest(&String::from_utf8_lossy(&bytes))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no manifest");
                Ok(AddonSet::new())
            }
            Err(e) => Err(ProfileError::io(&path, e)),
        }
    }

    /// Changes [`apply_profile`](Self::apply_profile) would make to the manifest.
    pub fn preview_apply(&self, account: &str, profile: &Profile) -> Result<ManifestDiff> {
        let current = self.active_addons(account)?;
        Ok(ManifestDiff::between(&current, &profile.addons))
    }

    /// Back up the manifest, replace it with `profile`'s addons and prune old backups.
    ///
    /// A failed backup leaves the manifest untouched. A failed write keeps the
    /// backup. Pruning failures are only logged.
    pub fn apply_profile(&self, account: &str, profile: &Profile) -> Result<ApplyReport> {
        self.apply_profile_at(account, profile, SystemTime::now())
    }

    fn apply_profile_at(
        &self,
        account: &str,
        profile: &Profile,
        now: SystemTime,
    ) -> Result<ApplyReport> {
        let path = self.manifest_path(account)?;
        info!(account, profile = %profile.name, scope = %profile.scope, "applying profile");

        let backup = backup::create_backup(&path, now).map_err(|source| {
            ProfileError::BackupFailed {
                path: path.clone(),
                source,
            }
        })?;

        manifest::write_atomic(&path, &manifest::render_manifest(&profile.addons)).map_err(
            |source| ProfileError::WriteFailed {
                path: path.clone(),
                source,
            },
        )?;
        info!(
            path = %path.display(),
            addons = profile.addons.len(),
            enabled = profile.enabled_count(),
            "wrote manifest"
        );

        let pruned = match backup::prune_backups(&path, self.backup_count) {
            Ok(pruned) => pruned,
            Err(e) => {
                warn!(error = %e, "failed to clean up old backups");
                0
            }
        };

        Ok(ApplyReport {
            manifest: path,
            backup,
            pruned,
        })
    }

    /// Manifest backups for the account, newest first.
    pub fn list_backups(&self, account: &str) -> Result<Vec<PathBuf>> {
        let path = self.manifest_path(account)?;
        match backup::list_backups(&path) {
            Ok(backups) => Ok(backups),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(ProfileError::io(path, e)),
        }
    }
}

/// Check that `path` looks like a game installation with account data.
pub fn validate_install_directory(path: &Path) -> Result<()> {
    let meta = fs::metadata(path)
        .map_err(|e| ProfileError::invalid_install(path, format!("directory does not exist: {e}")))?;
    if !meta.is_dir() {
        return Err(ProfileError::invalid_install(path, "path is not a directory"));
    }

    let wtf = path.join(layout::WTF_DIR);
    if !wtf.exists() {
        return Err(ProfileError::invalid_install(
            path,
            format!("{} directory not found", layout::WTF_DIR),
        ));
    }

    if !wtf.join(layout::ACCOUNT_DIR).exists() {
        return Err(ProfileError::invalid_install(
            path,
            format!("{}/{} directory not found", layout::WTF_DIR, layout::ACCOUNT_DIR),
        ));
    }

    Ok(())
}
