use std::cell::Cell;
use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use serde::Serialize;
use wait_timeout::ChildExt;

use crate::config::ToolPrograms;
use crate::error::{MatrixError, Result};
use crate::util::{ensure_dir, tail_lines};

const LOG_TAIL_LINES: usize = 20;

/// Outcome of one successful external tool invocation.
#[derive(Debug, Clone, Serialize)]
pub struct ToolRun {
    pub program: String,
    pub args: Vec<String>,
    pub exit_code: i32,
    pub elapsed_ms: u64,
    pub log: PathBuf,
}

/// The external programs the pipeline shells out to.
///
/// Each invocation blocks until the child exits. stdout and stderr go to a
/// per-invocation log under `log_dir`; a non-zero exit becomes
/// [`MatrixError::ExternalCommandFailed`] carrying the end of that log.
#[derive(Debug)]
pub struct Toolchain {
    programs: ToolPrograms,
    timeout: Option<Duration>,
    log_dir: PathBuf,
    invocations: Cell<usize>,
}

impl Toolchain {
    #[must_use]
    pub fn new(programs: ToolPrograms, timeout: Option<Duration>, log_dir: PathBuf) -> Self {
        Self {
            programs,
            timeout,
            log_dir,
            invocations: Cell::new(0),
        }
    }

    #[must_use]
    pub fn programs(&self) -> &ToolPrograms {
        &self.programs
    }

    #[must_use]
    pub fn invocations(&self) -> usize {
        self.invocations.get()
    }

    /// Compiles `source` inside `out_dir` and returns the produced PDF.
    pub fn compile(&self, source: &Path, out_dir: &Path) -> Result<PathBuf> {
        let pdf = compiled_document_path(source, out_dir);
        self.run(compile_command(&self.programs.compiler, source, out_dir))?;
        if pdf.is_file() {
            Ok(pdf)
        } else {
            Err(MatrixError::MissingArtifact {
                command: self.programs.compiler.clone(),
                path: pdf,
            })
        }
    }

    /// One PNG per page, named `<prefix>-<page>.png`.
    pub fn rasterize(&self, document: &Path, prefix: &Path, width: u32) -> Result<ToolRun> {
        self.run(rasterize_command(
            &self.programs.rasterizer,
            document,
            prefix,
            width,
        ))
    }

    pub fn append_horizontal(&self, inputs: &[PathBuf], output: &Path) -> Result<ToolRun> {
        let run = self.run(append_command(&self.programs.compositor, inputs, output))?;
        if output.is_file() {
            Ok(run)
        } else {
            Err(MatrixError::MissingArtifact {
                command: self.programs.compositor.clone(),
                path: output.to_path_buf(),
            })
        }
    }

    /// Lossy palette reduction, overwriting `png` in place.
    pub fn quantize(&self, png: &Path) -> Result<ToolRun> {
        self.run(quantize_command(&self.programs.quantizer, png))
    }

    /// Lossless recompression of every PNG directly inside `dir`.
    pub fn optimize(&self, dir: &Path) -> Result<Option<ToolRun>> {
        let pngs = list_pngs(dir)?;
        if pngs.is_empty() {
            return Ok(None);
        }
        let mut command = Command::new(&self.programs.optimizer);
        command.args(&pngs);
        self.run(command).map(Some)
    }

    fn run(&self, mut command: Command) -> Result<ToolRun> {
        let program = command.get_program().to_string_lossy().into_owned();
        let args = command
            .get_args()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect::<Vec<_>>();

        let sequence = self.invocations.get() + 1;
        self.invocations.set(sequence);

        ensure_dir(&self.log_dir)?;
        let log = self
            .log_dir
            .join(format!("{sequence:05}-{}.log", program_label(&program)));
        let log_file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&log)?;
        let log_err = log_file.try_clone()?;

        let started = Instant::now();
        let spawned = command
            .stdin(Stdio::null())
            .stdout(Stdio::from(log_file))
            .stderr(Stdio::from(log_err))
            .spawn();
        let mut child = match spawned {
            Ok(child) => child,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                return Err(MatrixError::MissingCommand { command: program });
            }
            Err(error) => return Err(error.into()),
        };

        let status = match self.timeout {
            Some(timeout) => match child.wait_timeout(timeout)? {
                Some(status) => status,
                None => {
                    child.kill()?;
                    let _ = child.wait();
                    return Err(MatrixError::ExternalCommandTimedOut {
                        command: program,
                        seconds: timeout.as_secs(),
                    });
                }
            },
            None => child.wait()?,
        };

        let exit_code = status.code().unwrap_or(1);
        if !status.success() {
            let captured = fs::read(&log).unwrap_or_default();
            let tail = tail_lines(&String::from_utf8_lossy(&captured), LOG_TAIL_LINES);
            let detail = if tail.is_empty() {
                String::new()
            } else {
                format!("\n{tail}")
            };
            return Err(MatrixError::ExternalCommandFailed {
                command: program,
                exit_code,
                detail,
            });
        }

        Ok(ToolRun {
            program,
            args,
            exit_code,
            elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            log,
        })
    }
}

/// `<out_dir>/<source stem>.pdf`, where the compiler leaves its output.
#[must_use]
pub fn compiled_document_path(source: &Path, out_dir: &Path) -> PathBuf {
    let mut name = source
        .file_stem()
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| OsString::from("document"));
    name.push(".pdf");
    out_dir.join(name)
}

fn compile_command(program: &str, source: &Path, out_dir: &Path) -> Command {
    let mut flag = OsString::from("-output-directory=");
    flag.push(out_dir);

    let mut command = Command::new(program);
    command.arg(flag).arg(source).current_dir(out_dir);
    command
}

fn rasterize_command(program: &str, document: &Path, prefix: &Path, width: u32) -> Command {
    let mut command = Command::new(program);
    command
        .arg("-scale-to")
        .arg(width.to_string())
        .arg("-png")
        .arg(document)
        .arg(prefix);
    command
}

fn append_command(program: &str, inputs: &[PathBuf], output: &Path) -> Command {
    let mut command = Command::new(program);
    command.args(inputs).arg("+append").arg(output);
    command
}

fn quantize_command(program: &str, png: &Path) -> Command {
    let mut command = Command::new(program);
    command.arg("-f").arg("--ext").arg(".png").arg(png);
    command
}

fn list_pngs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut pngs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "png") {
            pngs.push(path);
        }
    }
    pngs.sort();
    Ok(pngs)
}

fn program_label(program: &str) -> String {
    Path::new(program)
        .file_name()
        .map_or_else(|| "tool".to_string(), |name| name.to_string_lossy().into_owned())
}
