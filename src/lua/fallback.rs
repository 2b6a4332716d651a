//! Best-effort pattern extraction for files the parser rejects
//!
//! Walks the raw text looking for `["key"] = value` entries, isolating nested
//! table bodies by brace depth. Never fails; whatever cannot be recognised is
//! left out of the result.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::constants::savedvars::*;
use crate::types::{Database, Profile, ProfileSection, Scope};

static ASSIGNMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"\b{}\s*=\s*\{{", regex::escape(DB_VARIABLE)))
        .expect("assignment pattern is valid")
});

static KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\[\s*"((?:[^"\\]|\\.)*)"\s*\]\s*=\s*"#).expect("key pattern is valid")
});

/// Raw text of an entry's value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RawEntry<'a> {
    /// Contents between the braces
    Table(&'a str),
    /// Trimmed literal text, quotes included for strings
    Scalar(&'a str),
}

pub fn extract_database(content: &str) -> Database {
    let fields = entries(root_body(content));
    let mut db = Database::default();

    if let Some(RawEntry::Table(global)) = fields.get(GLOBAL_KEY) {
        db.global = section(global, Scope::Account);
    }

    if let Some(RawEntry::Table(chars)) = fields.get(CHAR_KEY) {
        for (key, entry) in entries(chars) {
            if let RawEntry::Table(body) = entry {
                db.characters.insert(key, section(body, Scope::Character));
            }
        }
    }

    db
}

fn section(body: &str, scope: Scope) -> ProfileSection {
    let fields = entries(body);
    let mut section = ProfileSection::default();

    if let Some(active) = fields.get(ACTIVE_PROFILE_KEY).and_then(|e| quoted(*e)) {
        section.active_profile = active.to_string();
    }

    if let Some(RawEntry::Table(profiles)) = fields.get(PROFILES_KEY) {
        for (name, entry) in entries(profiles) {
            if let RawEntry::Table(body) = entry {
                let parsed = profile(&name, scope, body);
                section.profiles.insert(name, parsed);
            }
        }
    }

    section
}

fn profile(name: &str, scope: Scope, body: &str) -> Profile {
    let fields = entries(body);
    let mut profile = Profile::new(name, scope);

    if let Some(RawEntry::Table(addons)) = fields.get(ADDONS_KEY) {
        profile.addons.extend(
            entries(addons)
                .into_iter()
                .filter_map(|(addon, entry)| Some((addon, boolean(entry)?))),
        );
    }

    if let Some(auto_deps) = fields.get(AUTO_DEPS_KEY).and_then(|e| boolean(*e)) {
        profile.auto_deps = auto_deps;
    }

    if let Some(created) = fields.get(CREATED_KEY).and_then(|e| integer(*e)) {
        profile.created = created;
    }

    profile
}

fn quoted(entry: RawEntry<'_>) -> Option<&str> {
    match entry {
        RawEntry::Scalar(raw) if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') => {
            Some(&raw[1..raw.len() - 1])
        }
        _ => None,
    }
}

fn boolean(entry: RawEntry<'_>) -> Option<bool> {
    match entry {
        RawEntry::Scalar("true") => Some(true),
        RawEntry::Scalar("false") => Some(false),
        _ => None,
    }
}

fn integer(entry: RawEntry<'_>) -> Option<i64> {
    match entry {
        RawEntry::Scalar(raw) => raw.parse().ok(),
        RawEntry::Table(_) => None,
    }
}

/// Body of the database table, or of the first table when the assignment is missing.
fn root_body(content: &str) -> &str {
    let open = ASSIGNMENT_RE
        .find(content)
        .map(|m| m.end() - 1)
        .or_else(|| content.find('{'));

    match open {
        Some(open) => {
            let close = matching_brace(content, open);
            &content[open + 1..close]
        }
        None => "",
    }
}

/// Top-level `["key"] = value` entries of a table body. Later keys win.
fn entries(body: &str) -> HashMap<String, RawEntry<'_>> {
    let bytes = body.as_bytes();
    let mut found = HashMap::new();
    let mut pos = 0;

    while pos < bytes.len() {
        match bytes[pos] {
            b'[' => match KEY_RE.captures(&body[pos..]) {
                Some(caps) => {
                    let key = caps[1].to_string();
                    let value_start = pos + caps[0].len();
                    let (entry, next) = raw_value(body, value_start);
                    found.insert(key, entry);
                    pos = next;
                }
                None => pos += 1,
            },
            b'{' => pos = matching_brace(body, pos) + 1,
            b'"' => pos = skip_string(bytes, pos),
            b'-' if bytes.get(pos + 1) == Some(&b'-') => pos = skip_line(bytes, pos),
            _ => pos += 1,
        }
    }

    found
}

fn raw_value(body: &str, start: usize) -> (RawEntry<'_>, usize) {
    let bytes = body.as_bytes();
    match bytes.get(start) {
        Some(b'{') => {
            let close = matching_brace(body, start);
            (RawEntry::Table(&body[start + 1..close]), close + 1)
        }
        Some(b'"') => {
            let end = skip_string(bytes, start);
            (RawEntry::Scalar(&body[start..end]), end)
        }
        _ => {
            let start = start.min(bytes.len());
            let end = scalar_end(bytes, start);
            (RawEntry::Scalar(body[start..end].trim()), end)
        }
    }
}

/// End of an unquoted value: the next `,`, newline, `}` or `--` comment.
fn scalar_end(bytes: &[u8], start: usize) -> usize {
    let mut pos = start;
    while pos < bytes.len() {
        match bytes[pos] {
            b',' | b'\n' | b'}' => return pos,
            b'-' if bytes.get(pos + 1) == Some(&b'-') => return pos,
            _ => pos += 1,
        }
    }
    bytes.len()
}

/// Index of the `}` closing the `{` at `open`, or the end of `text` when unbalanced.
fn matching_brace(text: &str, open: usize) -> usize {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut pos = open;

    while pos < bytes.len() {
        match bytes[pos] {
            b'"' => {
                pos = skip_string(bytes, pos);
                continue;
            }
            b'-' if bytes.get(pos + 1) == Some(&b'-') => {
                pos = skip_line(bytes, pos);
                continue;
            }
            b'{' => depth += 1,
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return pos;
                }
            }
            _ => {}
        }
        pos += 1;
    }

    bytes.len()
}

/// Index just past the string starting at `open`.
fn skip_string(bytes: &[u8], open: usize) -> usize {
    let mut pos = open + 1;
    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' => pos += 2,
            b'"' => return pos + 1,
            _ => pos += 1,
        }
    }
    bytes.len()
}

fn skip_line(bytes: &[u8], from: usize) -> usize {
    bytes[from..]
        .iter()
        .position(|b| *b == b'\n')
        .map_or(bytes.len(), |offset| from + offset + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lua::fixtures;
    use crate::lua::mapper::map_database;
    use crate::lua::parser::parse_assignment;

    #[test]
    fn test_matches_parser_on_well_formed_input() {
        let structured =
            map_database(&parse_assignment(fixtures::VALID_PROFILES, DB_VARIABLE).unwrap());
        assert_eq!(extract_database(fixtures::VALID_PROFILES), structured);
    }

    #[test]
    fn test_recovers_from_unparsable_entries() {
        assert!(parse_assignment(fixtures::MALFORMED_PROFILES, DB_VARIABLE).is_err());

        let db = extract_database(fixtures::MALFORMED_PROFILES);
        assert_eq!(db.global.active_profile, "Default");
        assert_eq!(db.global.profiles.len(), 1);

        let default = &db.global.profiles["Default"];
        assert_eq!(default.addons.len(), 2);
        assert_eq!(default.created, 1698765432);
        assert!(default.auto_deps);

        let section = &db.characters["TestChar - TestRealm"];
        assert_eq!(section.active_profile, "PvP");
        assert!(!section.profiles["PvP"].auto_deps);
        assert_eq!(section.profiles["PvP"].scope, Scope::Character);
    }

    #[test]
    fn test_truncated_file_keeps_complete_parts() {
        let truncated = r#"AddonProfilesDB = {
	["global"] = {
		["activeProfile"] = "Default",
		["profiles"] = {
			["Default"] = {
				["addons"] = {
					["Ace3"] = true,
				},
			},
			["Raid"#;
        assert!(parse_assignment(truncated, DB_VARIABLE).is_err());

        let db = extract_database(truncated);
        assert_eq!(db.global.active_profile, "Default");
        assert_eq!(db.global.profiles.len(), 1);
        assert_eq!(db.global.profiles["Default"].addons.get("Ace3"), Some(&true));
    }

    #[test]
    fn test_braces_inside_strings_and_comments() {
        let text = r#"AddonProfilesDB = {
	-- stray } in a comment
	["global"] = {
		["activeProfile"] = "Odd } name, with comma",
		["profiles"] = {
			["Odd } name, with comma"] = { ["autoDeps"] = false },
		},
	},
}"#;
        let db = extract_database(text);
        assert_eq!(db.global.active_profile, "Odd } name, with comma");
        assert!(!db.global.profiles["Odd } name, with comma"].auto_deps);
    }

    #[test]
    fn test_trailing_comment_after_scalar() {
        let text = r#"AddonProfilesDB = {
	["version"] = 2.5,
	["global"] = {
		["activeProfile"] = "Default" -- set in game
		["profiles"] = {
			["Default"] = {
				["created"] = 5 -- note
				["autoDeps"] = false--off
			},
		},
	},
}"#;
        assert!(parse_assignment(text, DB_VARIABLE).is_err());

        let db = extract_database(text);
        assert_eq!(db.global.active_profile, "Default");
        let default = &db.global.profiles["Default"];
        assert_eq!(default.created, 5);
        assert!(!default.auto_deps);
    }

    #[test]
    fn test_nested_keys_do_not_leak_upward() {
        let text = r#"AddonProfilesDB = {
	unknown = { ["global"] = { ["activeProfile"] = "Wrong" } },
}"#;
        assert!(extract_database(text).is_empty());
    }

    #[test]
    fn test_garbage_yields_empty_database() {
        assert!(extract_database("").is_empty());
        assert!(extract_database("not lua at all").is_empty());
        assert!(extract_database("{{{{").is_empty());
        assert!(extract_database("AddonProfilesDB = { [\"global\"] = ").is_empty());
    }

    #[test]
    fn test_scalar_helpers() {
        assert_eq!(quoted(RawEntry::Scalar("\"x\"")), Some("x"));
        assert_eq!(quoted(RawEntry::Scalar("\"")), None);
        assert_eq!(quoted(RawEntry::Scalar("x")), None);
        assert_eq!(boolean(RawEntry::Scalar("false")), Some(false));
        assert_eq!(boolean(RawEntry::Table("")), None);
        assert_eq!(integer(RawEntry::Scalar("-12")), Some(-12));
        assert_eq!(integer(RawEntry::Scalar("2.5")), None);
    }
}
