//! Typed profile database built from a SavedVariables file

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Addon name → enabled. Ordered so manifests and listings come out sorted.
pub type AddonSet = BTreeMap<String, bool>;

/// Whether a profile applies account-wide or to a single character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Account,
    Character,
}

impl Scope {
    pub fn label(&self) -> &'static str {
        match self {
            Scope::Account => "account",
            Scope::Character => "character",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A named set of addon enablement choices
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub name: String,
    pub scope: Scope,
    pub addons: AddonSet,
    /// Let the game enable dependencies of enabled addons
    pub auto_deps: bool,
    /// Unix timestamp the addon recorded on creation, 0 when unknown
    pub created: i64,
}

impl Profile {
    /// Empty profile with the documented defaults filled in
    pub fn new(name: impl Into<String>, scope: Scope) -> Self {
        Self {
            name: name.into(),
            scope,
            addons: AddonSet::new(),
            auto_deps: true,
            created: 0,
        }
    }

    pub fn enabled_count(&self) -> usize {
        self.addons.values().filter(|enabled| **enabled).count()
    }

    pub fn filter_addons(&self, query: &str) -> Vec<(&str, bool)> {
        filter_addons(&self.addons, query)
    }
}

/// Addons whose name contains `query`, ignoring case. An empty query matches all.
pub fn filter_addons<'a>(addons: &'a AddonSet, query: &str) -> Vec<(&'a str, bool)> {
    let needle = query.to_lowercase();
    addons
        .iter()
        .filter(|(name, _)| needle.is_empty() || name.to_lowercase().contains(&needle))
        .map(|(name, enabled)| (name.as_str(), *enabled))
        .collect()
}

/// Active profile plus the profiles of one section (global or a character)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileSection {
    /// Empty when the addon has not recorded an active profile
    pub active_profile: String,
    pub profiles: HashMap<String, Profile>,
}

impl ProfileSection {
    pub fn is_empty(&self) -> bool {
        self.active_profile.is_empty() && self.profiles.is_empty()
    }
}

/// Everything the profiles addon stored for one account
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Database {
    pub global: ProfileSection,
    /// Keyed by `"<Character> - <Realm>"`
    pub characters: HashMap<String, ProfileSection>,
}

/// One profile as listed by [`Database::profile_entries`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProfileEntry<'a> {
    pub profile: &'a Profile,
    pub character: Option<&'a str>,
    pub active: bool,
}

impl Database {
    pub fn is_empty(&self) -> bool {
        self.global.is_empty() && self.characters.is_empty()
    }

    /// Look up a profile by name, in a character's section when `character` is given.
    pub fn profile(&self, character: Option<&str>, name: &str) -> Option<&Profile> {
        let section = match character {
            Some(key) => self.characters.get(key)?,
            None => &self.global,
        };
        section.profiles.get(name)
    }

    /// All profiles, account-wide first, then by character key and profile name.
    pub fn profile_entries(&self) -> Vec<ProfileEntry<'_>> {
        let mut entries: Vec<ProfileEntry<'_>> = self
            .global
            .profiles
            .values()
            .map(|profile| ProfileEntry {
                profile,
                character: None,
                active: profile.name == self.global.active_profile,
            })
            .collect();

        for (key, section) in &self.characters {
            entries.extend(section.profiles.values().map(|profile| ProfileEntry {
                profile,
                character: Some(key.as_str()),
                active: profile.name == section.active_profile,
            }));
        }

        entries.sort_by(|a, b| {
            a.character
                .cmp(&b.character)
                .then_with(|| a.profile.name.cmp(&b.profile.name))
        });
        entries
    }
}
