use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{MatrixError, Result};
use crate::template::Templates;
use crate::toolchain::Toolchain;
use crate::util::write_string;

/// The document template has a title frame and one content frame.
pub const PAGES_PER_VARIANT: usize = 2;

pub const THUMB_LABEL: &str = "thumb";
pub const FULL_LABEL: &str = "full";

/// `<colorTheme>-<label>-<page>.png`, with 1-based pages as the rasterizer
/// numbers them.
#[must_use]
pub fn raster_file_name(color_theme: &str, label: &str, page: usize) -> String {
    format!("{color_theme}-{label}-{page}.png")
}

/// Compiles one (theme, color theme) variant and rasterizes it.
#[derive(Debug)]
pub struct VariantRenderer<'a> {
    templates: &'a Templates,
    toolchain: &'a Toolchain,
    scratch_dir: &'a Path,
}

impl<'a> VariantRenderer<'a> {
    #[must_use]
    pub fn new(templates: &'a Templates, toolchain: &'a Toolchain, scratch_dir: &'a Path) -> Self {
        Self {
            templates,
            toolchain,
            scratch_dir,
        }
    }

    #[must_use]
    pub fn toolchain(&self) -> &'a Toolchain {
        self.toolchain
    }

    /// Writes the variant source into scratch, compiles it there, and returns
    /// the document to rasterize. With `persist_to`, the PDF is first copied
    /// to `<persist_to>/<colorTheme>.pdf` and that copy is returned.
    pub fn render_variant(
        &self,
        theme: &str,
        color_theme: &str,
        persist_to: Option<&Path>,
    ) -> Result<PathBuf> {
        let source = self.scratch_dir.join(format!("{theme}-{color_theme}.tex"));
        write_string(&source, &self.templates.render_document(theme, color_theme))?;

        let pdf = self.toolchain.compile(&source, self.scratch_dir)?;

        match persist_to {
            Some(dir) => {
                let target = dir.join(format!("{color_theme}.pdf"));
                fs::copy(&pdf, &target)?;
                Ok(target)
            }
            None => Ok(pdf),
        }
    }

    /// Rasterizes `document` into `theme_dir` at `width` pixels and returns
    /// the page rasters in page order.
    pub fn rasterize_variant(
        &self,
        document: &Path,
        theme_dir: &Path,
        color_theme: &str,
        width: u32,
        label: &str,
    ) -> Result<Vec<PathBuf>> {
        let prefix = theme_dir.join(format!("{color_theme}-{label}"));
        self.toolchain.rasterize(document, &prefix, width)?;

        let pages = (1..=PAGES_PER_VARIANT)
            .map(|page| theme_dir.join(raster_file_name(color_theme, label, page)))
            .collect::<Vec<_>>();

        if let Some(missing) = pages.iter().find(|page| !page.is_file()) {
            return Err(MatrixError::MissingArtifact {
                command: self.toolchain.programs().rasterizer.clone(),
                path: missing.clone(),
            });
        }

        Ok(pages)
    }
}
