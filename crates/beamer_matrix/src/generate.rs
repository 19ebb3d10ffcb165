use std::path::Path;
use std::time::Instant;

use clap::Args;
use serde_json::json;

use crate::config::{ConfigArgs, MatrixConfig};
use crate::error::{MatrixError, Result};
use crate::manifest::{MANIFEST_FILE, MatrixManifest, ThemePassRecord};
use crate::output::{SiteFiles, table_width};
use crate::pass::{PassOptions, ThemePassSummary, run_theme_pass};
use crate::publish::publish_site;
use crate::render::VariantRenderer;
use crate::template::Templates;
use crate::toolchain::Toolchain;
use crate::util::{
    CliOutput, OutputIntegration, ensure_dir, now_utc_iso, output_for, require_command,
};

#[derive(Debug, Clone, Args)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Leave the scratch directory (sources, PDFs, tool logs) on disk.
    #[arg(long)]
    pub keep_scratch: bool,

    /// Keep `<colorTheme>.pdf` next to the rasters of each theme.
    #[arg(long)]
    pub keep_documents: bool,
}

pub fn run_generate(args: GenerateArgs) -> Result<()> {
    let integration = OutputIntegration::detect();
    let ui = output_for(&integration);

    let cfg = MatrixConfig::resolve(&args.config)?;

    ui.rule(Some("beamer_matrix generate"));
    ui.info(&format!("profile={} ({})", cfg.profile, cfg.profile_description));
    ui.info(&format!(
        "themes={} color_themes={} variants={} thumb={}px full={}px optimize={}",
        cfg.themes.len(),
        cfg.color_themes.len(),
        cfg.variant_count(),
        cfg.thumb_size,
        cfg.full_size,
        cfg.optimize
    ));

    for program in cfg.tools.required(cfg.optimize) {
        require_command(program)?;
    }

    let templates = Templates::load(&cfg.template_dir)?;
    templates.asset_paths(&cfg.assets)?;

    ensure_dir(&cfg.output_dir)?;
    let output_dir = std::path::absolute(&cfg.output_dir)?;
    let manifest_path = output_dir.join(MANIFEST_FILE);

    let started = Instant::now();
    let mut manifest = MatrixManifest::started(&cfg, &output_dir, now_utc_iso());

    let scratch = tempfile::Builder::new().prefix("beamer_matrix").tempdir()?;
    let (scratch_dir, scratch_guard) = if args.keep_scratch {
        (scratch.keep(), None)
    } else {
        (scratch.path().to_path_buf(), Some(scratch))
    };
    if args.keep_scratch {
        ui.info(&format!("scratch dir kept: {}", scratch_dir.display()));
        manifest.scratch_dir = Some(scratch_dir.display().to_string());
    }

    let toolchain = Toolchain::new(
        cfg.tools.clone(),
        cfg.tool_timeout(),
        scratch_dir.join("logs"),
    );
    let outcome = render_matrix(
        &cfg,
        &templates,
        &toolchain,
        &scratch_dir,
        &output_dir,
        args.keep_documents,
        &ui,
    );

    manifest.finished_at = Some(now_utc_iso());
    manifest.duration_seconds = Some(started.elapsed().as_secs());
    manifest.tool_runs = toolchain.invocations();

    let (passes, site) = match outcome {
        Ok(done) => done,
        Err(error) => {
            // Tool logs stay behind for inspection.
            if let Some(guard) = scratch_guard {
                manifest.scratch_dir = Some(guard.keep().display().to_string());
            }
            record_failure(&mut manifest, &manifest_path, &error, &ui);
            return Err(error);
        }
    };

    manifest.status = "ok".to_string();
    manifest.table_width = table_width(cfg.column_width, cfg.color_themes.len());
    manifest.passes = passes
        .iter()
        .map(|summary| ThemePassRecord::from_summary(&output_dir, summary))
        .collect();
    manifest.write_to_path(&manifest_path)?;

    if let Some(guard) = scratch_guard {
        guard.close()?;
    }

    ui.success(&format!(
        "matrix complete: {} themes, {} tool runs",
        passes.len(),
        manifest.tool_runs
    ));
    ui.info(&format!("index={}", site.index.display()));
    ui.info(&format!("manifest={}", manifest_path.display()));

    if integration.should_emit_json() {
        println!(
            "{}",
            json!({
                "command": "generate",
                "status": "ok",
                "output_dir": output_dir.display().to_string(),
                "index": site.index.display().to_string(),
                "manifest": manifest_path.display().to_string(),
                "themes": passes.len(),
                "variants": cfg.variant_count(),
                "tool_runs": manifest.tool_runs,
                "scratch_dir": manifest.scratch_dir,
                "integration": integration,
            })
        );
    }

    Ok(())
}

/// Marks the manifest failed and writes it. A manifest that cannot be written
/// only warns, so the pipeline error keeps its exit code.
fn record_failure(
    manifest: &mut MatrixManifest,
    manifest_path: &Path,
    error: &MatrixError,
    ui: &CliOutput,
) {
    manifest.status = "failed".to_string();
    manifest.error = Some(error.to_string());
    if let Err(write_error) = manifest.write_to_path(manifest_path) {
        ui.warning(&format!(
            "could not record failure in {}: {write_error}",
            manifest_path.display()
        ));
    }
    ui.error(&format!("generation failed: {error}"));
}

fn render_matrix(
    cfg: &MatrixConfig,
    templates: &Templates,
    toolchain: &Toolchain,
    scratch_dir: &Path,
    output_dir: &Path,
    keep_documents: bool,
    ui: &CliOutput,
) -> Result<(Vec<ThemePassSummary>, SiteFiles)> {
    let renderer = VariantRenderer::new(templates, toolchain, scratch_dir);

    // The first compile of a fresh TeX setup populates font caches.
    if cfg.warmup
        && let (Some(theme), Some(color_theme)) = (cfg.themes.first(), cfg.color_themes.first())
    {
        ui.info(&format!("warm-up compile theme={theme} color_theme={color_theme}"));
        renderer.render_variant(theme, color_theme, None)?;
    }

    let options = PassOptions {
        thumb_size: cfg.thumb_size,
        full_size: cfg.full_size,
        optimize: cfg.optimize,
        keep_documents,
    };

    let total = cfg.themes.len();
    let mut passes = Vec::with_capacity(total);
    for (index, theme) in cfg.themes.iter().enumerate() {
        ui.rule(Some(&format!("theme {}/{total}: {theme}", index + 1)));
        passes.push(run_theme_pass(
            &renderer,
            output_dir,
            theme,
            &cfg.color_themes,
            &options,
            ui,
        )?);
    }

    ui.rule(Some("site"));
    let site = publish_site(cfg, templates, output_dir, ui)?;
    Ok((passes, site))
}
