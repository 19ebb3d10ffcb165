use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::render::{FULL_LABEL, THUMB_LABEL, VariantRenderer};
use crate::util::{CliOutput, ensure_dir, remove_file_if_exists};

/// Composited thumbnails for one theme, inside the theme directory.
pub const STRIP_FILE: &str = "thumbs.png";

#[derive(Debug, Clone, Copy)]
pub struct PassOptions {
    pub thumb_size: u32,
    pub full_size: u32,
    pub optimize: bool,
    pub keep_documents: bool,
}

#[derive(Debug, Clone)]
pub struct ThemePassSummary {
    pub theme: String,
    pub theme_dir: PathBuf,
    pub strip: PathBuf,
    pub full_rasters: Vec<PathBuf>,
    pub variants: usize,
    pub tool_runs: usize,
}

/// Renders every color theme of `theme` into `<output_dir>/<theme>`, then
/// builds and optimizes the thumbnail strip.
///
/// Thumbnails are appended in color-theme order, pages in order within a
/// color theme, so page `s` of column `i` lands in strip slot `i * 2 + s`.
pub fn run_theme_pass(
    renderer: &VariantRenderer<'_>,
    output_dir: &Path,
    theme: &str,
    color_themes: &[String],
    options: &PassOptions,
    ui: &CliOutput,
) -> Result<ThemePassSummary> {
    let toolchain = renderer.toolchain();
    let runs_before = toolchain.invocations();

    let theme_dir = output_dir.join(theme);
    ensure_dir(&theme_dir)?;

    let mut thumbs = Vec::with_capacity(color_themes.len() * 2);
    let mut full_rasters = Vec::with_capacity(color_themes.len() * 2);

    for color_theme in color_themes {
        ui.info(&format!("render theme={theme} color_theme={color_theme}"));
        let document = renderer.render_variant(theme, color_theme, Some(&theme_dir))?;

        thumbs.extend(renderer.rasterize_variant(
            &document,
            &theme_dir,
            color_theme,
            options.thumb_size,
            THUMB_LABEL,
        )?);
        full_rasters.extend(renderer.rasterize_variant(
            &document,
            &theme_dir,
            color_theme,
            options.full_size,
            FULL_LABEL,
        )?);

        if !options.keep_documents {
            remove_file_if_exists(&document)?;
        }
    }

    let strip = theme_dir.join(STRIP_FILE);
    toolchain.append_horizontal(&thumbs, &strip)?;
    if options.optimize {
        toolchain.quantize(&strip)?;
    }

    for thumb in &thumbs {
        remove_file_if_exists(thumb)?;
    }

    if options.optimize {
        toolchain.optimize(&theme_dir)?;
    }

    let tool_runs = toolchain.invocations() - runs_before;
    ui.success(&format!(
        "theme={theme} variants={} tool_runs={tool_runs} strip={}",
        color_themes.len(),
        strip.display()
    ));

    Ok(ThemePassSummary {
        theme: theme.to_string(),
        theme_dir,
        strip,
        full_rasters,
        variants: color_themes.len(),
        tool_runs,
    })
}
