use std::path::Path;

use clap::Args;
use serde_json::json;

use crate::config::{ConfigArgs, MatrixConfig};
use crate::error::Result;
use crate::markup::{MatrixMarkup, gallery_collisions};
use crate::output::{SiteFiles, StyleMetrics, min_column_width, write_site};
use crate::pass::STRIP_FILE;
use crate::template::Templates;
use crate::util::{CliOutput, OutputIntegration, ensure_dir, output_for};

#[derive(Debug, Clone, Args)]
pub struct MarkupArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Assembles the page for `cfg` and writes page, stylesheet and assets.
pub fn publish_site(
    cfg: &MatrixConfig,
    templates: &Templates,
    output_dir: &Path,
    ui: &CliOutput,
) -> Result<SiteFiles> {
    let assets = templates.asset_paths(&cfg.assets)?;

    for group in gallery_collisions(&cfg.themes, &cfg.color_themes) {
        ui.warning(&format!(
            "gallery group {group:?} is shared by more than one theme/color theme pair"
        ));
    }

    let needed = min_column_width(cfg.thumb_size);
    if u64::from(cfg.column_width) < needed {
        ui.warning(&format!(
            "column width {}px is narrower than the {needed}px two {}px thumbnails need",
            cfg.column_width, cfg.thumb_size
        ));
    }

    let markup = MatrixMarkup::assemble(&cfg.themes, &cfg.color_themes, cfg.thumb_size);
    let metrics = StyleMetrics::new(cfg.column_width, cfg.thumb_size, cfg.color_themes.len());
    let site = write_site(output_dir, templates, &markup, &metrics, &assets)?;

    ui.success(&format!(
        "site written: {} (table width {})",
        site.index.display(),
        metrics.table_width
    ));
    Ok(site)
}

/// Themes whose strip image is not present under `output_dir`.
#[must_use]
pub fn themes_missing_strip(output_dir: &Path, themes: &[String]) -> Vec<String> {
    themes
        .iter()
        .filter(|theme| !output_dir.join(theme.as_str()).join(STRIP_FILE).is_file())
        .cloned()
        .collect()
}

/// Rebuilds only the page, stylesheet and assets from existing rasters.
pub fn run_markup(args: MarkupArgs) -> Result<()> {
    let integration = OutputIntegration::detect();
    let ui = output_for(&integration);

    let cfg = MatrixConfig::resolve(&args.config)?;
    ui.rule(Some("beamer_matrix markup"));
    ui.info(&format!(
        "profile={} themes={} color_themes={}",
        cfg.profile,
        cfg.themes.len(),
        cfg.color_themes.len()
    ));

    let templates = Templates::load(&cfg.template_dir)?;
    ensure_dir(&cfg.output_dir)?;
    let output_dir = std::path::absolute(&cfg.output_dir)?;

    let missing = themes_missing_strip(&output_dir, &cfg.themes);
    if !missing.is_empty() {
        ui.warning(&format!(
            "no {STRIP_FILE} yet for: {} (run generate first)",
            missing.join(", ")
        ));
    }

    let site = publish_site(&cfg, &templates, &output_dir, &ui)?;

    if integration.should_emit_json() {
        println!(
            "{}",
            json!({
                "command": "markup",
                "status": "ok",
                "index": site.index.display().to_string(),
                "stylesheet": site.stylesheet.display().to_string(),
                "themes_missing_strip": missing,
                "integration": integration,
            })
        );
    }
    Ok(())
}
