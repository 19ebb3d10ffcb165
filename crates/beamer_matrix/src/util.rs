use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use fastapi_output::RichOutput;
use serde::Serialize;
use sqlmodel_console::OutputMode as SqlModelOutputMode;

use crate::error::{MatrixError, Result};

#[must_use]
pub fn now_utc_iso() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

pub fn command_exists(command: &str) -> bool {
    which::which(command).is_ok()
}

#[derive(Debug, Clone, Serialize)]
pub struct OutputIntegration {
    pub fastapi_mode: String,
    pub fastapi_agent: bool,
    pub fastapi_ci: bool,
    pub fastapi_tty: bool,
    pub sqlmodel_mode: String,
    pub sqlmodel_agent: bool,
}

impl OutputIntegration {
    #[must_use]
    pub fn detect() -> Self {
        let fastapi_detection = fastapi_output::detect_environment();
        let fastapi_mode = fastapi_output::OutputMode::auto();
        let sqlmodel_mode = SqlModelOutputMode::detect();
        Self {
            fastapi_mode: fastapi_mode.as_str().to_string(),
            fastapi_agent: fastapi_detection.is_agent,
            fastapi_ci: fastapi_detection.is_ci,
            fastapi_tty: fastapi_detection.is_tty,
            sqlmodel_mode: sqlmodel_mode.as_str().to_string(),
            sqlmodel_agent: SqlModelOutputMode::is_agent_environment(),
        }
    }

    #[must_use]
    pub fn should_emit_json(&self) -> bool {
        self.sqlmodel_mode == "json"
    }
}

/// Human-facing progress output. Silent when the run reports in JSON.
#[derive(Debug, Clone)]
pub struct CliOutput {
    inner: RichOutput,
    enabled: bool,
}

impl CliOutput {
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            inner: RichOutput::auto(),
            enabled,
        }
    }

    pub fn rule(&self, title: Option<&str>) {
        if self.enabled {
            self.inner.rule(title);
        }
    }

    pub fn info(&self, message: &str) {
        if self.enabled {
            self.inner.info(message);
        }
    }

    pub fn success(&self, message: &str) {
        if self.enabled {
            self.inner.success(message);
        }
    }

    pub fn warning(&self, message: &str) {
        if self.enabled {
            self.inner.warning(message);
        }
    }

    pub fn error(&self, message: &str) {
        if self.enabled {
            self.inner.error(message);
        }
    }
}

#[must_use]
pub fn output_for(integration: &OutputIntegration) -> CliOutput {
    CliOutput::new(!integration.should_emit_json())
}

pub fn require_command(command: &str) -> Result<()> {
    if command_exists(command) {
        Ok(())
    } else {
        Err(MatrixError::MissingCommand {
            command: command.to_string(),
        })
    }
}

/// Creates `path` and its parents. An existing directory is left untouched.
pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)?;
    Ok(())
}

pub fn ensure_exists(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(MatrixError::MissingPath {
            path: path.to_path_buf(),
        })
    }
}

pub fn write_string(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

pub fn remove_file_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(error) => Err(error.into()),
    }
}

#[must_use]
pub fn parse_csv_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

#[must_use]
pub fn html_escape(value: &str) -> String {
    v_htmlescape::escape(value).to_string()
}

/// Last `count` non-empty lines of `text`, joined with newlines.
#[must_use]
pub fn tail_lines(text: &str, count: usize) -> String {
    let lines = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>();
    let start = lines.len().saturating_sub(count);
    lines[start..].join("\n")
}

#[must_use]
pub fn relative_to(base: &Path, path: &Path) -> Option<PathBuf> {
    pathdiff::diff_paths(path, base)
}

#[must_use]
pub fn display_relative(base: &Path, path: &Path) -> String {
    relative_to(base, path)
        .unwrap_or_else(|| path.to_path_buf())
        .display()
        .to_string()
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use tempfile::tempdir;

    use super::{
        OutputIntegration, display_relative, ensure_dir, html_escape, output_for, parse_csv_list,
        relative_to, remove_file_if_exists, tail_lines,
    };

    #[test]
    fn ensure_dir_is_idempotent_and_preserves_contents() {
        let temp = tempdir().expect("tempdir");
        let dir = temp.path().join("Berlin");
        ensure_dir(&dir).expect("first create");
        fs::write(dir.join("thumbs.png"), b"strip").expect("write file");

        ensure_dir(&dir).expect("second create over existing directory");

        let content = fs::read(dir.join("thumbs.png")).expect("read file");
        assert_eq!(content, b"strip");
        assert_eq!(fs::read_dir(&dir).expect("read dir").count(), 1);
    }

    #[test]
    fn remove_file_if_exists_ignores_missing_files() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("gone.pdf");
        remove_file_if_exists(&path).expect("missing file is fine");

        fs::write(&path, b"pdf").expect("write");
        remove_file_if_exists(&path).expect("remove existing");
        assert!(!path.exists());
    }

    #[test]
    fn parse_csv_list_trims_and_drops_empty_entries() {
        assert_eq!(
            parse_csv_list(" default, AnnArbor ,,Warsaw,"),
            vec!["default", "AnnArbor", "Warsaw"]
        );
        assert!(parse_csv_list(" , ").is_empty());
    }

    #[test]
    fn html_escape_leaves_plain_names_untouched() {
        assert_eq!(html_escape("CambridgeUS"), "CambridgeUS");
        assert_eq!(html_escape("a<b"), "a&lt;b");
    }

    #[test]
    fn tail_lines_keeps_last_non_empty_lines() {
        let text = "one\n\ntwo\nthree\n\n";
        assert_eq!(tail_lines(text, 2), "two\nthree");
        assert_eq!(tail_lines(text, 10), "one\ntwo\nthree");
        assert_eq!(tail_lines("", 3), "");
    }

    #[test]
    fn relative_to_returns_path_relative_to_base() {
        let base = Path::new("/tmp/root");
        let target = Path::new("/tmp/root/Berlin/thumbs.png");
        let relative = relative_to(base, target).expect("relative path");
        assert_eq!(relative, Path::new("Berlin/thumbs.png"));
        assert_eq!(display_relative(base, target), "Berlin/thumbs.png");
    }

    #[test]
    fn output_for_disables_human_output_when_json_mode_requested() {
        let json_integration = OutputIntegration {
            fastapi_mode: "plain".to_string(),
            fastapi_agent: true,
            fastapi_ci: false,
            fastapi_tty: false,
            sqlmodel_mode: "json".to_string(),
            sqlmodel_agent: true,
        };
        let human_integration = OutputIntegration {
            sqlmodel_mode: "plain".to_string(),
            ..json_integration.clone()
        };

        assert!(!output_for(&json_integration).enabled);
        assert!(output_for(&human_integration).enabled);
    }
}
