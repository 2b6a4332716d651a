//! Application-wide constants
//!
//! File names, directory layout and defaults shared by the parser, the
//! profile store and the configuration layer.

/// Game installation layout
pub mod layout {
    /// Top-level per-install settings directory
    pub const WTF_DIR: &str = "WTF";

    /// Directory under `WTF` holding one subdirectory per account
    pub const ACCOUNT_DIR: &str = "Account";

    /// Per-account directory holding addon save-data files
    pub const SAVED_VARIABLES_DIR: &str = "SavedVariables";

    /// Addon-enablement manifest, one addon per line
    pub const MANIFEST_FILENAME: &str = "AddOns.txt";
}

/// SavedVariables database written by the profiles addon
pub mod savedvars {
    /// Name of the top-level global assigned in the save-data file
    pub const DB_VARIABLE: &str = "AddonProfilesDB";

    /// File extension of save-data files
    pub const FILE_EXTENSION: &str = "lua";

    /// Key of the account-wide section
    pub const GLOBAL_KEY: &str = "global";

    /// Key of the per-character section
    pub const CHAR_KEY: &str = "char";

    pub const ACTIVE_PROFILE_KEY: &str = "activeProfile";
    pub const PROFILES_KEY: &str = "profiles";
    pub const ADDONS_KEY: &str = "addons";
    pub const AUTO_DEPS_KEY: &str = "autoDeps";
    pub const CREATED_KEY: &str = "created";

    /// Table nesting limit; deeper input is rejected as malformed
    pub const MAX_TABLE_DEPTH: usize = 128;
}

/// Manifest backup naming and retention
pub mod backup {
    /// Infix between the manifest file name and the timestamp
    pub const INFIX: &str = ".backup.";

    /// Suffix of the scratch file used for atomic manifest writes
    pub const TEMP_SUFFIX: &str = ".tmp";

    /// Backups kept when the configuration does not say otherwise
    pub const DEFAULT_RETENTION: usize = 5;
}

/// Application preferences file
pub mod config {
    /// Directory under the platform config dir
    pub const APP_DIR: &str = "addon-profiles";

    /// Preferences file name
    pub const FILENAME: &str = "config.json";

    pub const DEFAULT_LOG_LEVEL: &str = "info";
}
