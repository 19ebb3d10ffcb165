use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::MatrixConfig;
use crate::error::Result;
use crate::pass::ThemePassSummary;
use crate::util::{display_relative, write_string};

pub const MANIFEST_FILE: &str = "matrix_manifest.json";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ThemePassRecord {
    pub theme: String,
    pub strip: String,
    pub full_rasters: Vec<String>,
    pub variants: usize,
    pub tool_runs: usize,
}

impl ThemePassRecord {
    /// Paths are stored relative to the output directory, as the page links them.
    #[must_use]
    pub fn from_summary(output_dir: &Path, summary: &ThemePassSummary) -> Self {
        Self {
            theme: summary.theme.clone(),
            strip: display_relative(output_dir, &summary.strip),
            full_rasters: summary
                .full_rasters
                .iter()
                .map(|path| display_relative(output_dir, path))
                .collect(),
            variants: summary.variants,
            tool_runs: summary.tool_runs,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MatrixManifest {
    pub status: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub duration_seconds: Option<u64>,
    pub profile: String,
    pub profile_description: String,
    pub themes: Vec<String>,
    pub color_themes: Vec<String>,
    pub thumb_size: u32,
    pub full_size: u32,
    pub column_width: u32,
    pub table_width: String,
    pub optimize: bool,
    pub output_dir: String,
    pub scratch_dir: Option<String>,
    pub tool_runs: usize,
    pub passes: Vec<ThemePassRecord>,
    pub error: Option<String>,
}

impl MatrixManifest {
    #[must_use]
    pub fn started(cfg: &MatrixConfig, output_dir: &Path, started_at: String) -> Self {
        Self {
            status: "running".to_string(),
            started_at,
            profile: cfg.profile.clone(),
            profile_description: cfg.profile_description.clone(),
            themes: cfg.themes.clone(),
            color_themes: cfg.color_themes.clone(),
            thumb_size: cfg.thumb_size,
            full_size: cfg.full_size,
            column_width: cfg.column_width,
            optimize: cfg.optimize,
            output_dir: output_dir.display().to_string(),
            ..Self::default()
        }
    }

    pub fn write_to_path(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        write_string(path, &content)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str::<Self>(&content)?)
    }
}
