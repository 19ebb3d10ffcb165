use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use serde::Serialize;

use crate::error::{MatrixError, Result};
use crate::profile::{DEFAULT_PROFILE, Profile, load_profile, load_profile_file};
use crate::util::parse_csv_list;

pub const DEFAULT_THUMB_SIZE: u32 = 200;
pub const DEFAULT_FULL_SIZE: u32 = 1000;
pub const DEFAULT_COLUMN_WIDTH: u32 = 425;
pub const DEFAULT_ASSETS: [&str; 3] = ["bootstrap.min.css", "slenderbox.css", "slenderbox.js"];

/// Options shared by every command that needs a resolved matrix configuration.
#[derive(Debug, Clone, Default, Args)]
pub struct ConfigArgs {
    /// Built-in profile name (see `list-profiles`).
    #[arg(long)]
    pub profile: Option<String>,

    /// Profile file in `key=value` form; takes precedence over `--profile`.
    #[arg(long = "profile-file")]
    pub profile_file: Option<PathBuf>,

    /// Comma separated theme names.
    #[arg(long)]
    pub themes: Option<String>,

    /// Comma separated color theme names.
    #[arg(long = "color-themes")]
    pub color_themes: Option<String>,

    #[arg(long = "thumb-size")]
    pub thumb_size: Option<u32>,

    #[arg(long = "full-size")]
    pub full_size: Option<u32>,

    #[arg(long = "column-width")]
    pub column_width: Option<u32>,

    #[arg(long = "template-dir")]
    pub template_dir: Option<PathBuf>,

    #[arg(long = "output-dir")]
    pub output_dir: Option<PathBuf>,

    #[arg(long)]
    pub compiler: Option<String>,

    #[arg(long)]
    pub rasterizer: Option<String>,

    #[arg(long)]
    pub compositor: Option<String>,

    #[arg(long)]
    pub quantizer: Option<String>,

    #[arg(long)]
    pub optimizer: Option<String>,

    /// Kill any external tool that runs longer than this. 0 waits forever.
    #[arg(long = "tool-timeout-seconds")]
    pub tool_timeout_seconds: Option<u64>,

    /// Skip palette reduction and lossless PNG optimization.
    #[arg(long)]
    pub no_optimize: bool,

    /// Skip the priming compile before the first theme.
    #[arg(long)]
    pub no_warmup: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolPrograms {
    pub compiler: String,
    pub rasterizer: String,
    pub compositor: String,
    pub quantizer: String,
    pub optimizer: String,
}

impl Default for ToolPrograms {
    fn default() -> Self {
        Self {
            compiler: "pdflatex".to_string(),
            rasterizer: "pdftoppm".to_string(),
            compositor: "convert".to_string(),
            quantizer: "pngquant".to_string(),
            optimizer: "optipng".to_string(),
        }
    }
}

impl ToolPrograms {
    /// Programs a run will invoke, in pipeline order.
    #[must_use]
    pub fn required(&self, optimize: bool) -> Vec<&str> {
        let mut programs = vec![
            self.compiler.as_str(),
            self.rasterizer.as_str(),
            self.compositor.as_str(),
        ];
        if optimize {
            programs.push(self.quantizer.as_str());
            programs.push(self.optimizer.as_str());
        }
        programs
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MatrixConfig {
    pub profile: String,
    pub profile_description: String,
    pub themes: Vec<String>,
    pub color_themes: Vec<String>,
    pub thumb_size: u32,
    pub full_size: u32,
    pub column_width: u32,
    pub warmup: bool,
    pub optimize: bool,
    pub tool_timeout_seconds: u64,
    pub tools: ToolPrograms,
    pub assets: Vec<String>,
    pub template_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl MatrixConfig {
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            profile: "ad-hoc".to_string(),
            profile_description: "ad-hoc run".to_string(),
            themes: Vec::new(),
            color_themes: Vec::new(),
            thumb_size: DEFAULT_THUMB_SIZE,
            full_size: DEFAULT_FULL_SIZE,
            column_width: DEFAULT_COLUMN_WIDTH,
            warmup: true,
            optimize: true,
            tool_timeout_seconds: 0,
            tools: ToolPrograms::default(),
            assets: DEFAULT_ASSETS.iter().map(ToString::to_string).collect(),
            template_dir: default_template_dir(),
            output_dir: PathBuf::from("output"),
        }
    }

    /// Resolves defaults, then the selected profile, then explicit flags.
    pub fn resolve(args: &ConfigArgs) -> Result<Self> {
        let profile = match (&args.profile_file, &args.profile) {
            (Some(path), _) => load_profile_file(path)?,
            (None, Some(name)) => load_profile(name)?,
            (None, None) => load_profile(DEFAULT_PROFILE)?,
        };

        let mut cfg = Self::defaults();
        cfg.apply_profile(&profile);
        cfg.apply_args(args);
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_profile(&mut self, profile: &Profile) {
        self.profile = profile.name.clone();
        if let Some(value) = profile.get("description") {
            self.profile_description = value.to_string();
        }
        if let Some(value) = profile.get_list("themes") {
            self.themes = value;
        }
        if let Some(value) = profile.get_list("color_themes") {
            self.color_themes = value;
        }
        if let Some(value) = profile.get_u32("thumb_size") {
            self.thumb_size = value;
        }
        if let Some(value) = profile.get_u32("full_size") {
            self.full_size = value;
        }
        if let Some(value) = profile.get_u32("column_width") {
            self.column_width = value;
        }
        if let Some(value) = profile.get_bool("warmup") {
            self.warmup = value;
        }
        if let Some(value) = profile.get_bool("optimize") {
            self.optimize = value;
        }
        if let Some(value) = profile.get_u64("tool_timeout_seconds") {
            self.tool_timeout_seconds = value;
        }
        if let Some(value) = profile.get("compiler") {
            self.tools.compiler = value.to_string();
        }
        if let Some(value) = profile.get("rasterizer") {
            self.tools.rasterizer = value.to_string();
        }
        if let Some(value) = profile.get("compositor") {
            self.tools.compositor = value.to_string();
        }
        if let Some(value) = profile.get("quantizer") {
            self.tools.quantizer = value.to_string();
        }
        if let Some(value) = profile.get("optimizer") {
            self.tools.optimizer = value.to_string();
        }
        if let Some(value) = profile.get_list("assets") {
            self.assets = value;
        }
    }

    fn apply_args(&mut self, args: &ConfigArgs) {
        if let Some(value) = &args.themes {
            self.themes = parse_csv_list(value);
        }
        if let Some(value) = &args.color_themes {
            self.color_themes = parse_csv_list(value);
        }
        if let Some(value) = args.thumb_size {
            self.thumb_size = value;
        }
        if let Some(value) = args.full_size {
            self.full_size = value;
        }
        if let Some(value) = args.column_width {
            self.column_width = value;
        }
        if let Some(value) = &args.template_dir {
            self.template_dir = value.clone();
        }
        if let Some(value) = &args.output_dir {
            self.output_dir = value.clone();
        }
        if let Some(value) = &args.compiler {
            self.tools.compiler = value.clone();
        }
        if let Some(value) = &args.rasterizer {
            self.tools.rasterizer = value.clone();
        }
        if let Some(value) = &args.compositor {
            self.tools.compositor = value.clone();
        }
        if let Some(value) = &args.quantizer {
            self.tools.quantizer = value.clone();
        }
        if let Some(value) = &args.optimizer {
            self.tools.optimizer = value.clone();
        }
        if let Some(value) = args.tool_timeout_seconds {
            self.tool_timeout_seconds = value;
        }
        if args.no_optimize {
            self.optimize = false;
        }
        if args.no_warmup {
            self.warmup = false;
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_names("theme", &self.themes)?;
        validate_names("color theme", &self.color_themes)?;

        for (label, value) in [
            ("thumb size", self.thumb_size),
            ("full size", self.full_size),
            ("column width", self.column_width),
        ] {
            if value == 0 {
                return Err(MatrixError::invalid(format!("{label} must be positive")));
            }
        }

        for (label, program) in [
            ("compiler", &self.tools.compiler),
            ("rasterizer", &self.tools.rasterizer),
            ("compositor", &self.tools.compositor),
            ("quantizer", &self.tools.quantizer),
            ("optimizer", &self.tools.optimizer),
        ] {
            if program.trim().is_empty() {
                return Err(MatrixError::invalid(format!("{label} program is empty")));
            }
        }

        Ok(())
    }

    #[must_use]
    pub fn tool_timeout(&self) -> Option<Duration> {
        (self.tool_timeout_seconds > 0).then(|| Duration::from_secs(self.tool_timeout_seconds))
    }

    #[must_use]
    pub fn variant_count(&self) -> usize {
        self.themes.len().saturating_mul(self.color_themes.len())
    }
}

#[must_use]
pub fn default_template_dir() -> PathBuf {
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/templates"))
}

/// Names end up as path components, inside `href`, `url('...')` and the
/// unquoted `data-sbox` attribute, so only `[A-Za-z0-9._-]` is accepted.
fn validate_names(label: &str, names: &[String]) -> Result<()> {
    if names.is_empty() {
        return Err(MatrixError::invalid(format!("no {label} names configured")));
    }

    let mut seen = BTreeSet::new();
    for name in names {
        if name == "." || name == ".." {
            return Err(MatrixError::invalid(format!("invalid {label} name: {name}")));
        }
        if let Some(bad) = name
            .chars()
            .find(|&ch| !(ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-')))
        {
            return Err(MatrixError::invalid(format!(
                "{label} name {name:?} contains forbidden character {bad:?}"
            )));
        }
        if !seen.insert(name.as_str()) {
            return Err(MatrixError::invalid(format!("duplicate {label} name: {name}")));
        }
    }

    Ok(())
}
