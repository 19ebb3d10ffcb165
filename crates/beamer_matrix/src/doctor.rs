use std::path::Path;
use std::process::{Command, Stdio};

use clap::Args;
use serde_json::json;

use crate::config::{ConfigArgs, MatrixConfig};
use crate::error::{MatrixError, Result};
use crate::markup::gallery_collisions;
use crate::profile::list_profile_names;
use crate::template::Templates;
use crate::util::{CliOutput, OutputIntegration, command_exists, ensure_exists, output_for};

#[derive(Debug, Clone, Args)]
pub struct DoctorArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Also run a real `generate` with the smoke profile into a throwaway directory.
    #[arg(long)]
    pub smoke: bool,
}

fn check_command(name: &str, ui: &CliOutput) -> Result<()> {
    if command_exists(name) {
        ui.success(&format!("command available: {name}"));
        Ok(())
    } else {
        ui.error(&format!("command missing: {name}"));
        Err(MatrixError::MissingCommand {
            command: name.to_string(),
        })
    }
}

fn build_smoke_command(current_exe: &Path, cfg: &MatrixConfig, output_dir: &Path) -> Command {
    let mut command = Command::new(current_exe);
    command
        .arg("generate")
        .arg("--profile")
        .arg("beamer-smoke")
        .arg("--template-dir")
        .arg(&cfg.template_dir)
        .arg("--output-dir")
        .arg(output_dir)
        .arg("--compiler")
        .arg(&cfg.tools.compiler)
        .arg("--rasterizer")
        .arg(&cfg.tools.rasterizer)
        .arg("--compositor")
        .arg(&cfg.tools.compositor)
        .arg("--quantizer")
        .arg(&cfg.tools.quantizer)
        .arg("--optimizer")
        .arg(&cfg.tools.optimizer)
        .arg("--tool-timeout-seconds")
        .arg(cfg.tool_timeout_seconds.to_string());

    command.stdout(Stdio::null()).stderr(Stdio::null());
    command
}

pub fn run_doctor(args: DoctorArgs) -> Result<()> {
    let integration = OutputIntegration::detect();
    let ui = output_for(&integration);

    let cfg = MatrixConfig::resolve(&args.config)?;

    ui.rule(Some("beamer_matrix doctor"));
    ui.info(&format!("profile={}", cfg.profile));
    ui.info(&format!("template_dir={}", cfg.template_dir.display()));
    ui.info(&format!("output_dir={}", cfg.output_dir.display()));

    ui.rule(Some("environment detection"));
    ui.info(&format!(
        "fastapi_output mode={} agent={} ci={} tty={}",
        integration.fastapi_mode,
        integration.fastapi_agent,
        integration.fastapi_ci,
        integration.fastapi_tty
    ));
    ui.info(&format!(
        "sqlmodel_console mode={} agent={}",
        integration.sqlmodel_mode, integration.sqlmodel_agent
    ));

    ui.rule(Some("toolchain"));
    for program in cfg.tools.required(cfg.optimize) {
        check_command(program, &ui)?;
    }
    if !cfg.optimize {
        for program in [&cfg.tools.quantizer, &cfg.tools.optimizer] {
            if command_exists(program) {
                ui.success(&format!("command available: {program}"));
            } else {
                ui.warning(&format!("command missing: {program} (only used when optimizing)"));
            }
        }
    }

    ui.rule(Some("templates"));
    ensure_exists(&cfg.template_dir)?;
    let templates = Templates::load(&cfg.template_dir)?;
    let assets = templates.asset_paths(&cfg.assets)?;
    ui.success(&format!(
        "templates loaded from {} ({} assets)",
        cfg.template_dir.display(),
        assets.len()
    ));

    ui.rule(Some("profile checks"));
    let profiles = list_profile_names();
    if profiles.is_empty() {
        return Err(MatrixError::invalid("no profiles found"));
    }
    for profile in &profiles {
        ui.success(&format!("profile: {profile}"));
    }
    ui.success(&format!(
        "matrix: {} themes x {} color themes = {} variants",
        cfg.themes.len(),
        cfg.color_themes.len(),
        cfg.variant_count()
    ));

    let collisions = gallery_collisions(&cfg.themes, &cfg.color_themes);
    for group in &collisions {
        ui.warning(&format!("gallery group {group:?} is ambiguous"));
    }

    if args.smoke {
        ui.rule(Some("generate smoke"));
        let current_exe = std::env::current_exe()?;
        let smoke_dir = tempfile::Builder::new()
            .prefix("beamer_matrix_doctor")
            .tempdir()?;
        let status = build_smoke_command(&current_exe, &cfg, smoke_dir.path()).status()?;
        if !status.success() {
            return Err(MatrixError::exit(
                status.code().unwrap_or(1),
                "generate smoke failed",
            ));
        }
        ui.success("generate smoke passed");
    }

    ui.success("doctor completed successfully");

    if integration.should_emit_json() {
        println!(
            "{}",
            json!({
                "command": "doctor",
                "status": "ok",
                "profile": cfg.profile,
                "tools": cfg.tools,
                "optimize": cfg.optimize,
                "template_dir": cfg.template_dir.display().to_string(),
                "profiles": profiles,
                "variants": cfg.variant_count(),
                "gallery_collisions": collisions,
                "smoke": args.smoke,
                "integration": integration,
            })
        );
    }

    Ok(())
}
