//! Shell stand-ins for the external tools, shared by unit tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::ToolPrograms;
use crate::toolchain::Toolchain;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    fs::create_dir_all(dir).expect("script dir");
    let path = dir.join(name);
    fs::write(&path, body).expect("write script");

    #[cfg(unix)]
    {
        let mut perms = fs::metadata(&path).expect("metadata").permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).expect("set permissions");
    }

    path
}

/// Fake pdflatex/pdftoppm/convert/pngquant/optipng that produce the files
/// the real tools would and record every call in `calls.log`.
pub struct FakeTools {
    pub dir: PathBuf,
    pub calls_log: PathBuf,
}

impl FakeTools {
    pub fn install(root: &Path) -> Self {
        let dir = root.join("fake-bin");
        let calls_log = root.join("calls.log");
        let record = format!("echo \"$(basename \"$0\") $*\" >> '{}'\n", calls_log.display());

        write_script(
            &dir,
            "pdflatex",
            &format!(
                "#!/bin/sh\n{record}outdir=.\nfor arg in \"$@\"; do\n  case \"$arg\" in\n    -output-directory=*) outdir=\"${{arg#-output-directory=}}\" ;;\n    *) src=\"$arg\" ;;\n  esac\ndone\nstem=$(basename \"$src\" .tex)\nprintf '%%PDF-1.5 %s\\n' \"$stem\" > \"$outdir/$stem.pdf\"\n"
            ),
        );
        write_script(
            &dir,
            "pdftoppm",
            &format!(
                "#!/bin/sh\n{record}printf 'w=%s page=1\\n' \"$2\" > \"$5-1.png\"\nprintf 'w=%s page=2\\n' \"$2\" > \"$5-2.png\"\n"
            ),
        );
        write_script(
            &dir,
            "convert",
            &format!(
                "#!/bin/sh\n{record}for last in \"$@\"; do :; done\n: > \"$last\"\nfor arg in \"$@\"; do\n  case \"$arg\" in\n    +append) break ;;\n    *) basename \"$arg\" >> \"$last\" ;;\n  esac\ndone\n"
            ),
        );
        write_script(
            &dir,
            "pngquant",
            &format!("#!/bin/sh\n{record}echo quantized >> \"$4\"\n"),
        );
        write_script(&dir, "optipng", &format!("#!/bin/sh\n{record}exit 0\n"));

        Self { dir, calls_log }
    }

    pub fn programs(&self) -> ToolPrograms {
        let program = |name: &str| self.dir.join(name).display().to_string();
        ToolPrograms {
            compiler: program("pdflatex"),
            rasterizer: program("pdftoppm"),
            compositor: program("convert"),
            quantizer: program("pngquant"),
            optimizer: program("optipng"),
        }
    }

    pub fn toolchain(&self, log_dir: PathBuf, timeout: Option<Duration>) -> Toolchain {
        Toolchain::new(self.programs(), timeout, log_dir)
    }

    pub fn calls(&self) -> String {
        fs::read_to_string(&self.calls_log).unwrap_or_default()
    }
}
