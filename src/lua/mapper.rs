//! Maps the generic table tree onto the typed [`Database`]
//!
//! Permissive: any entry of the wrong shape is skipped rather than reported,
//! since the addon does not validate what it writes.

use std::collections::HashMap;

use super::value::Value;
use crate::constants::savedvars::*;
use crate::types::{Database, Profile, ProfileSection, Scope};

pub fn map_database(root: &Value) -> Database {
    let mut db = Database::default();

    if let Some(global) = root.get(GLOBAL_KEY).and_then(Value::as_table) {
        db.global = map_section(global, Scope::Account);
    }

    if let Some(chars) = root.get(CHAR_KEY).and_then(Value::as_table) {
        for (key, section) in chars {
            if let Some(section) = section.as_table() {
                db.characters
                    .insert(key.clone(), map_section(section, Scope::Character));
            }
        }
    }

    db
}

fn map_section(table: &HashMap<String, Value>, scope: Scope) -> ProfileSection {
    let mut section = ProfileSection::default();

    if let Some(active) = table.get(ACTIVE_PROFILE_KEY).and_then(Value::as_str) {
        section.active_profile = active.to_string();
    }

    if let Some(profiles) = table.get(PROFILES_KEY).and_then(Value::as_table) {
        for (name, body) in profiles {
            if let Some(body) = body.as_table() {
                section
                    .profiles
                    .insert(name.clone(), map_profile(name, scope, body));
            }
        }
    }

    section
}

fn map_profile(name: &str, scope: Scope, body: &HashMap<String, Value>) -> Profile {
    let mut profile = Profile::new(name, scope);

    if let Some(addons) = body.get(ADDONS_KEY).and_then(Value::as_table) {
        profile.addons.extend(
            addons
                .iter()
                .filter_map(|(addon, enabled)| Some((addon.clone(), enabled.as_bool()?))),
        );
    }

    if let Some(auto_deps) = body.get(AUTO_DEPS_KEY).and_then(Value::as_bool) {
        profile.auto_deps = auto_deps;
    }

    if let Some(created) = body.get(CREATED_KEY).and_then(Value::as_integer) {
        profile.created = created;
    }

    profile
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lua::fixtures;
    use crate::lua::parser::parse_assignment;

    fn map(input: &str) -> Database {
        map_database(&parse_assignment(input, DB_VARIABLE).unwrap())
    }

    #[test]
    fn test_global_profiles() {
        let db = map(fixtures::VALID_PROFILES);

        assert_eq!(db.global.profiles.len(), 2);
        assert_eq!(db.global.active_profile, "Default");

        let default = &db.global.profiles["Default"];
        assert_eq!(default.name, "Default");
        assert_eq!(default.scope, Scope::Account);
        assert!(default.auto_deps);
        assert_eq!(default.created, 1698765432);
        assert_eq!(default.addons.len(), 3);
        for addon in ["Ace3", "DBM-Core", "Details"] {
            assert_eq!(default.addons.get(addon), Some(&true), "{addon}");
        }

        let raiding = &db.global.profiles["Raiding"];
        assert_eq!(raiding.addons.len(), 3);
        assert_eq!(raiding.enabled_count(), 3);
    }

    #[test]
    fn test_character_profiles() {
        let db = map(fixtures::VALID_PROFILES);

        let section = &db.characters["TestChar - TestRealm"];
        assert_eq!(section.active_profile, "PvP");
        assert_eq!(section.profiles.len(), 1);

        let pvp = &section.profiles["PvP"];
        assert_eq!(pvp.scope, Scope::Character);
        assert!(!pvp.auto_deps);
        assert_eq!(pvp.addons.len(), 2);
        assert_eq!(pvp.created, 0);
    }

    #[test]
    fn test_empty_database() {
        let db = map(fixtures::EMPTY_PROFILES);
        assert!(db.global.profiles.is_empty());
        assert!(db.characters.is_empty());
        assert_eq!(db.global.active_profile, "");
    }

    #[test]
    fn test_defaults_for_missing_fields() {
        let db = map(r#"AddonProfilesDB = { ["global"] = { ["profiles"] = {
            ["Bare"] = {},
        } } }"#);
        let bare = &db.global.profiles["Bare"];
        assert!(bare.auto_deps);
        assert_eq!(bare.created, 0);
        assert!(bare.addons.is_empty());
    }

    #[test]
    fn test_wrong_shapes_are_skipped() {
        let db = map(r#"AddonProfilesDB = {
            ["global"] = {
                ["activeProfile"] = 7,
                ["profiles"] = {
                    ["NotATable"] = "oops",
                    ["Odd"] = {
                        ["addons"] = {
                            ["Good"] = true,
                            ["Off"] = false,
                            ["Numeric"] = 1,
                            ["Text"] = "true",
                        },
                        ["autoDeps"] = "no",
                        ["created"] = "yesterday",
                    },
                },
            },
            ["char"] = {
                ["Loose - Value"] = true,
                ["Alt - Realm"] = { ["profiles"] = "none" },
            },
        }"#);

        assert_eq!(db.global.active_profile, "");
        assert_eq!(db.global.profiles.len(), 1);

        let odd = &db.global.profiles["Odd"];
        assert_eq!(odd.addons.len(), 2);
        assert_eq!(odd.addons.get("Off"), Some(&false));
        assert!(odd.auto_deps);
        assert_eq!(odd.created, 0);

        assert_eq!(db.characters.len(), 1);
        assert!(db.characters["Alt - Realm"].profiles.is_empty());
    }

    #[test]
    fn test_non_table_root_maps_to_empty() {
        assert!(map_database(&Value::Integer(3)).is_empty());
        assert!(map_database(&Value::Nil).is_empty());
    }
}
