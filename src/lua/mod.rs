//! SavedVariables reading
//!
//! Two ways to turn file text into a [`Database`]:
//! - **Structured**: lexer → table parser → mapper. The normal path.
//! - **Pattern**: brace-depth scanning over the raw text, used only when the
//!   structured parse rejects the file.

pub mod fallback;
pub mod lexer;
pub mod mapper;
pub mod parser;
pub mod value;

use tracing::{debug, warn};

use crate::constants::savedvars::DB_VARIABLE;
use crate::error::Result;
use crate::types::Database;

pub use value::Value;

/// Strategy used to produce a [`Database`] from save-data text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extractor {
    Structured,
    Pattern,
}

impl Extractor {
    pub fn extract(self, content: &str) -> Result<Database> {
        match self {
            Extractor::Structured => {
                let root = parser::parse_assignment(content, DB_VARIABLE)?;
                Ok(mapper::map_database(&root))
            }
            Extractor::Pattern => Ok(fallback::extract_database(content)),
        }
    }
}

/// Database read from save-data text, with the strategy that produced it
#[derive(Debug, Clone)]
pub struct Parsed {
    pub database: Database,
    pub extractor: Extractor,
}

/// Parse with the structured path, falling back to pattern extraction if it fails.
pub fn parse_database(content: &str) -> Parsed {
    match Extractor::Structured.extract(content) {
        Ok(database) => {
            debug!(
                profiles = database.global.profiles.len(),
                characters = database.characters.len(),
                "parsed SavedVariables"
            );
            Parsed {
                database,
                extractor: Extractor::Structured,
            }
        }
        Err(err) => {
            warn!(error = %err, "SavedVariables parse failed, using pattern extraction");
            Parsed {
                database: fallback::extract_database(content),
                extractor: Extractor::Pattern,
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    /// Two account profiles and one character profile
    pub const VALID_PROFILES: &str = r#"
AddonProfilesDB = {
	["global"] = {
		["activeProfile"] = "Default",
		["profiles"] = {
			["Default"] = {
				["addons"] = {
					["Ace3"] = true,
					["DBM-Core"] = true,
					["Details"] = true,
				},
				["created"] = 1698765432,
			},
			["Raiding"] = {
				["addons"] = {
					["Ace3"] = true,
					["DBM-Core"] = true,
					["WeakAuras"] = true,
				},
				["autoDeps"] = true,
				["created"] = 1698769000,
			},
		},
	},
	["char"] = {
		["TestChar - TestRealm"] = {
			["activeProfile"] = "PvP",
			["profiles"] = {
				["PvP"] = {
					["addons"] = {
						["Gladius"] = true,
						["OmniCC"] = true,
					},
					["autoDeps"] = false,
				},
			},
		},
	},
}
"#;

    pub const EMPTY_PROFILES: &str = r#"
AddonProfilesDB = {
	["global"] = {
		["profiles"] = {
		},
	},
	["char"] = {
	},
}
"#;

    /// Fractional number and an unquoted key: rejected by the parser
    pub const MALFORMED_PROFILES: &str = r#"
AddonProfilesDB = {
	["version"] = 2.5,
	["global"] = {
		["activeProfile"] = "Default",
		["profiles"] = {
			["Default"] = {
				["addons"] = {
					["Ace3"] = true,
					["Details"] = true,
				},
				["created"] = 1698765432,
			},
		},
	},
	minimap = { ["hide"] = true },
	["char"] = {
		["TestChar - TestRealm"] = {
			["activeProfile"] = "PvP",
			["profiles"] = {
				["PvP"] = {
					["addons"] = {
						["Gladius"] = true,
					},
					["autoDeps"] = false,
				},
			},
		},
	},
}
"#;
}
