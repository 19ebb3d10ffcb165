use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{MatrixError, Result};
use crate::util::parse_csv_list;

#[derive(Debug, Clone, Default)]
pub struct Profile {
    pub name: String,
    pub values: BTreeMap<String, String>,
}

impl Profile {
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).map(|raw| {
            let value = raw.trim().to_ascii_lowercase();
            matches!(value.as_str(), "1" | "true" | "yes" | "on")
        })
    }

    #[must_use]
    pub fn get_u32(&self, key: &str) -> Option<u32> {
        self.get(key).and_then(|raw| raw.trim().parse::<u32>().ok())
    }

    #[must_use]
    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|raw| raw.trim().parse::<u64>().ok())
    }

    #[must_use]
    pub fn get_list(&self, key: &str) -> Option<Vec<String>> {
        self.get(key).map(parse_csv_list)
    }
}

const BEAMER: &str = include_str!("../profiles/beamer.env");
const BEAMER_SMOKE: &str = include_str!("../profiles/beamer-smoke.env");

const BUILTIN_PROFILES: [(&str, &str); 2] = [("beamer", BEAMER), ("beamer-smoke", BEAMER_SMOKE)];

pub const DEFAULT_PROFILE: &str = "beamer";

#[must_use]
pub fn list_profile_names() -> Vec<String> {
    BUILTIN_PROFILES
        .iter()
        .map(|(name, _)| (*name).to_string())
        .collect()
}

pub fn load_profile(name: &str) -> Result<Profile> {
    let (_, content) = BUILTIN_PROFILES
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .ok_or_else(|| MatrixError::ProfileNotFound {
            name: name.to_string(),
        })?;

    Ok(Profile {
        name: name.to_string(),
        values: parse_profile_content(content),
    })
}

/// Loads a user profile from disk. The profile is named after the file stem.
pub fn load_profile_file(path: &Path) -> Result<Profile> {
    if !path.exists() {
        return Err(MatrixError::MissingPath {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    let name = path
        .file_stem()
        .map_or_else(|| "custom".to_string(), |stem| stem.to_string_lossy().into_owned());

    Ok(Profile {
        name,
        values: parse_profile_content(&content),
    })
}

#[must_use]
pub fn parse_profile_content(content: &str) -> BTreeMap<String, String> {
    let mut values = BTreeMap::new();

    for raw_line in content.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((key, value_raw)) = line.split_once('=') else {
            continue;
        };

        let key = key.trim().to_string();
        let mut value = value_raw.trim().to_string();

        if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
            value = value[1..value.len() - 1].to_string();
        }

        values.insert(key, value);
    }

    values
}
