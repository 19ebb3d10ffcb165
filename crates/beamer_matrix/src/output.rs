use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::markup::MatrixMarkup;
use crate::template::Templates;
use crate::util::{ensure_dir, write_string};

pub const INDEX_FILE: &str = "index.html";
pub const STYLESHEET_FILE: &str = "style.css";

/// Files written by [`write_site`].
#[derive(Debug, Clone)]
pub struct SiteFiles {
    pub index: PathBuf,
    pub stylesheet: PathBuf,
    pub assets: Vec<PathBuf>,
}

/// Horizontal space a cell needs beyond its two thumbnails: the gap between
/// them, the cell padding and the thumbnail borders in `style.css`.
pub const CELL_CHROME_PX: u64 = 5 + 2 * 6 + 4;

/// CSS width of the matrix table: one fixed-width column per color theme.
#[must_use]
pub fn table_width(column_width: u32, color_theme_count: usize) -> String {
    let total = u64::from(column_width).saturating_mul(color_theme_count as u64);
    format!("{total}px")
}

/// Frames are 4:3, so a thumbnail `thumb_size` wide is three quarters as tall.
#[must_use]
pub fn thumb_height(thumb_size: u32) -> u64 {
    u64::from(thumb_size) * 3 / 4
}

/// Narrowest column that shows both pages of a variant side by side.
#[must_use]
pub fn min_column_width(thumb_size: u32) -> u64 {
    u64::from(thumb_size) * 2 + CELL_CHROME_PX
}

/// Sizes substituted into the stylesheet so it agrees with the strip offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleMetrics {
    pub table_width: String,
    pub column_width: String,
    pub thumb_width: String,
    pub thumb_height: String,
}

impl StyleMetrics {
    #[must_use]
    pub fn new(column_width: u32, thumb_size: u32, color_theme_count: usize) -> Self {
        Self {
            table_width: table_width(column_width, color_theme_count),
            column_width: format!("{column_width}px"),
            thumb_width: format!("{thumb_size}px"),
            thumb_height: format!("{}px", thumb_height(thumb_size)),
        }
    }
}

pub fn write_site(
    output_dir: &Path,
    templates: &Templates,
    markup: &MatrixMarkup,
    metrics: &StyleMetrics,
    assets: &[PathBuf],
) -> Result<SiteFiles> {
    ensure_dir(output_dir)?;

    let index = output_dir.join(INDEX_FILE);
    write_string(
        &index,
        &templates.render_page(&markup.table, &markup.top_header, &markup.left_header),
    )?;

    let stylesheet = output_dir.join(STYLESHEET_FILE);
    write_string(&stylesheet, &templates.render_stylesheet(metrics))?;

    let mut copied = Vec::with_capacity(assets.len());
    for asset in assets {
        let Some(name) = asset.file_name() else {
            continue;
        };
        let target = output_dir.join(name);
        fs::copy(asset, &target)?;
        copied.push(target);
    }

    Ok(SiteFiles {
        index,
        stylesheet,
        assets: copied,
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use crate::markup::MatrixMarkup;
    use crate::template::Templates;

    use super::{StyleMetrics, min_column_width, table_width, thumb_height, write_site};

    #[test]
    fn table_width_is_column_width_per_color_theme() {
        assert_eq!(table_width(425, 2), "850px");
        assert_eq!(table_width(425, 17), "7225px");
        assert_eq!(table_width(425, 0), "0px");
    }

    #[test]
    fn style_metrics_track_thumbnail_size() {
        assert_eq!(thumb_height(200), 150);
        assert_eq!(thumb_height(120), 90);
        assert!(min_column_width(200) <= 425);
        assert!(min_column_width(300) > 425);

        let metrics = StyleMetrics::new(425, 120, 2);
        assert_eq!(metrics.table_width, "850px");
        assert_eq!(metrics.column_width, "425px");
        assert_eq!(metrics.thumb_width, "120px");
        assert_eq!(metrics.thumb_height, "90px");
    }

    #[test]
    fn write_site_substitutes_templates_and_copies_assets_verbatim() {
        let temp = tempdir().expect("tempdir");
        let template_dir = temp.path().join("templates");
        fs::create_dir_all(template_dir.join("includes")).expect("includes");
        fs::write(
            template_dir.join("beamer.tex"),
            "\\usetheme{#THEME}\\usecolortheme{#COLOR_THEME}",
        )
        .expect("document");
        fs::write(
            template_dir.join("matrix.html"),
            "<thead>#TOP_HEADER</thead>|#LEFT_HEADER|#TABLE",
        )
        .expect("page");
        fs::write(
            template_dir.join("style.css"),
            "width: #TABLE_WIDTH; thumb: #THUMB_WIDTH;",
        )
        .expect("css");
        let asset_bytes = b"/* #TABLE_WIDTH stays literal in assets */";
        fs::write(template_dir.join("includes/slenderbox.css"), asset_bytes).expect("asset");

        let templates = Templates::load(&template_dir).expect("load");
        let assets = templates
            .asset_paths(&["slenderbox.css".to_string()])
            .expect("assets");
        let markup = MatrixMarkup {
            table: "<table></table>".to_string(),
            top_header: "<td>x</td>\n".to_string(),
            left_header: "<tr></tr>\n".to_string(),
        };

        let output = temp.path().join("output");
        let site = write_site(
            &output,
            &templates,
            &markup,
            &StyleMetrics::new(425, 200, 2),
            &assets,
        ).expect("write");

        assert_eq!(
            fs::read_to_string(&site.index).expect("index"),
            "<thead><td>x</td>\n</thead>|<tr></tr>\n|<table></table>"
        );
        assert_eq!(
            fs::read_to_string(&site.stylesheet).expect("css"),
            "width: 850px; thumb: 200px;"
        );
        assert_eq!(site.assets, vec![output.join("slenderbox.css")]);
        assert_eq!(
            fs::read(output.join("slenderbox.css")).expect("copied asset"),
            asset_bytes
        );
    }
}
