use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{MatrixError, Result};
use crate::output::StyleMetrics;

pub const DOCUMENT_TEMPLATE: &str = "beamer.tex";
pub const PAGE_TEMPLATE: &str = "matrix.html";
pub const STYLESHEET_TEMPLATE: &str = "style.css";
pub const INCLUDES_DIR: &str = "includes";

pub const THEME_TOKEN: &str = "#THEME";
pub const COLOR_THEME_TOKEN: &str = "#COLOR_THEME";
pub const TABLE_TOKEN: &str = "#TABLE";
pub const TOP_HEADER_TOKEN: &str = "#TOP_HEADER";
pub const LEFT_HEADER_TOKEN: &str = "#LEFT_HEADER";
pub const TABLE_WIDTH_TOKEN: &str = "#TABLE_WIDTH";
pub const COLUMN_WIDTH_TOKEN: &str = "#COLUMN_WIDTH";
pub const THUMB_WIDTH_TOKEN: &str = "#THUMB_WIDTH";
pub const THUMB_HEIGHT_TOKEN: &str = "#THUMB_HEIGHT";

/// The three text templates, read once per run.
#[derive(Debug, Clone)]
pub struct Templates {
    pub dir: PathBuf,
    pub document: String,
    pub page: String,
    pub stylesheet: String,
}

impl Templates {
    pub fn load(dir: &Path) -> Result<Self> {
        Ok(Self {
            dir: dir.to_path_buf(),
            document: read_template(&dir.join(DOCUMENT_TEMPLATE))?,
            page: read_template(&dir.join(PAGE_TEMPLATE))?,
            stylesheet: read_template(&dir.join(STYLESHEET_TEMPLATE))?,
        })
    }

    /// Static files copied verbatim next to the page.
    pub fn asset_paths(&self, names: &[String]) -> Result<Vec<PathBuf>> {
        asset_paths(&self.dir, names)
    }

    #[must_use]
    pub fn render_document(&self, theme: &str, color_theme: &str) -> String {
        self.document
            .replace(THEME_TOKEN, theme)
            .replace(COLOR_THEME_TOKEN, color_theme)
    }

    #[must_use]
    pub fn render_page(&self, table: &str, top_header: &str, left_header: &str) -> String {
        self.page
            .replace(TABLE_TOKEN, table)
            .replace(TOP_HEADER_TOKEN, top_header)
            .replace(LEFT_HEADER_TOKEN, left_header)
    }

    #[must_use]
    pub fn render_stylesheet(&self, metrics: &StyleMetrics) -> String {
        self.stylesheet
            .replace(TABLE_WIDTH_TOKEN, &metrics.table_width)
            .replace(COLUMN_WIDTH_TOKEN, &metrics.column_width)
            .replace(THUMB_WIDTH_TOKEN, &metrics.thumb_width)
            .replace(THUMB_HEIGHT_TOKEN, &metrics.thumb_height)
    }
}

pub fn asset_paths(template_dir: &Path, names: &[String]) -> Result<Vec<PathBuf>> {
    let includes = template_dir.join(INCLUDES_DIR);
    names
        .iter()
        .map(|name| {
            let path = includes.join(name);
            if path.is_file() {
                Ok(path)
            } else {
                Err(MatrixError::MissingTemplate { path })
            }
        })
        .collect()
}

fn read_template(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(MatrixError::MissingTemplate {
            path: path.to_path_buf(),
        });
    }
    Ok(fs::read_to_string(path)?)
}
