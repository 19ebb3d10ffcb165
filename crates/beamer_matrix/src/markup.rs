//! HTML fragments for the matrix page.
//!
//! Everything here is derived from the enumerations and the thumbnail width
//! alone. The strip addressing must agree with the order in which
//! [`crate::pass`] composites thumbnails: column `i`, page `s` sits in slot
//! `i * PAGES_PER_VARIANT + s`.

use std::collections::BTreeMap;

use crate::pass::STRIP_FILE;
use crate::render::{FULL_LABEL, PAGES_PER_VARIANT, raster_file_name};
use crate::util::html_escape;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixMarkup {
    pub table: String,
    pub top_header: String,
    pub left_header: String,
}

impl MatrixMarkup {
    #[must_use]
    pub fn assemble(themes: &[String], color_themes: &[String], thumb_size: u32) -> Self {
        Self {
            table: build_table(themes, color_themes, thumb_size),
            top_header: build_top_header(color_themes),
            left_header: build_left_header(themes),
        }
    }
}

/// Horizontal distance, in pixels, from the strip origin to a thumbnail.
/// The page background is shifted left by this amount.
#[must_use]
pub fn thumb_offset(column: usize, page: usize, thumb_size: u32) -> u64 {
    let slot = column * PAGES_PER_VARIANT + page;
    (slot as u64) * u64::from(thumb_size)
}

/// Lightbox group shared by both pages of a variant.
///
/// Not delimited: `("ab", "c")` and `("a", "bc")` share a group.
#[must_use]
pub fn gallery_group(theme: &str, color_theme: &str) -> String {
    format!("{theme}{color_theme}")
}

/// Gallery groups claimed by more than one (theme, color theme) pair.
#[must_use]
pub fn gallery_collisions(themes: &[String], color_themes: &[String]) -> Vec<String> {
    let mut owners: BTreeMap<String, usize> = BTreeMap::new();
    for theme in themes {
        for color_theme in color_themes {
            *owners.entry(gallery_group(theme, color_theme)).or_default() += 1;
        }
    }
    owners
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(group, _)| group)
        .collect()
}

#[must_use]
pub fn build_table(themes: &[String], color_themes: &[String], thumb_size: u32) -> String {
    let mut html = String::from("<table class=\"theme-grid\">");
    for theme in themes {
        html.push_str("<tr>");
        for (column, color_theme) in color_themes.iter().enumerate() {
            html.push_str(&variant_cell(theme, color_theme, column, thumb_size));
        }
        html.push_str("</tr>");
    }
    html.push_str("</table>");
    html
}

fn variant_cell(theme: &str, color_theme: &str, column: usize, thumb_size: u32) -> String {
    let mut cell =
        String::from("<td><div class=\"iblock\"><div class=\"table\"><div class=\"table-row\">");
    for page in 0..PAGES_PER_VARIANT {
        cell.push_str("<div class=\"table-cell\">");
        cell.push_str(&thumb_link(theme, color_theme, column, page, thumb_size));
        cell.push_str("</div>");
    }
    cell.push_str("</div></div></div></td>\n");
    cell
}

fn thumb_link(
    theme: &str,
    color_theme: &str,
    column: usize,
    page: usize,
    thumb_size: u32,
) -> String {
    let full = raster_file_name(color_theme, FULL_LABEL, page + 1);
    let class = if page == 0 {
        "beamer-thumb"
    } else {
        "beamer-thumb beamer-right"
    };
    format!(
        "<a href=\"{theme}/{full}\" data-sbox={group} title=\"Theme: {theme_text}, Color Theme: {color_text}\">\
         <div class=\"{class}\" style=\"background: url('{theme}/{STRIP_FILE}') -{offset}px 0;\"></div></a>",
        group = gallery_group(theme, color_theme),
        theme_text = html_escape(theme),
        color_text = html_escape(color_theme),
        offset = thumb_offset(column, page, thumb_size),
    )
}

#[must_use]
pub fn build_top_header(color_themes: &[String]) -> String {
    color_themes
        .iter()
        .map(|color_theme| format!("<td>{}</td>\n", html_escape(color_theme)))
        .collect()
}

#[must_use]
pub fn build_left_header(themes: &[String]) -> String {
    themes
        .iter()
        .map(|theme| format!("<tr><td><div>{}</div></td></tr>\n", html_escape(theme)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{
        MatrixMarkup, build_left_header, build_table, build_top_header, gallery_collisions,
        gallery_group, thumb_offset,
    };

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn single_cell_matches_reference_markup_exactly() {
        let table = build_table(&names(&["Berlin"]), &names(&["beaver"]), 200);
        let expected = concat!(
            "<table class=\"theme-grid\"><tr>",
            "<td><div class=\"iblock\"><div class=\"table\">",
            "<div class=\"table-row\"><div class=\"table-cell\">",
            "<a href=\"Berlin/beaver-full-1.png\" data-sbox=Berlinbeaver",
            " title=\"Theme: Berlin, Color Theme: beaver\">",
            "<div class=\"beamer-thumb\" style=\"background: url('Berlin/thumbs.png') -0px 0;\"></div>",
            "</a></div><div class=\"table-cell\">",
            "<a href=\"Berlin/beaver-full-2.png\" data-sbox=Berlinbeaver",
            " title=\"Theme: Berlin, Color Theme: beaver\">",
            "<div class=\"beamer-thumb beamer-right\" style=\"background: url('Berlin/thumbs.png') -200px 0;\"></div>",
            "</a></div></div></div></div></td>\n",
            "</tr></table>",
        );
        assert_eq!(table, expected);
    }

    #[test]
    fn offsets_follow_strip_slots() {
        assert_eq!(thumb_offset(0, 0, 200), 0);
        assert_eq!(thumb_offset(0, 1, 200), 200);
        assert_eq!(thumb_offset(1, 0, 200), 400);
        assert_eq!(thumb_offset(16, 1, 200), 6600);
        assert_eq!(thumb_offset(3, 1, 150), 1050);
    }

    #[test]
    fn end_to_end_row_has_four_offsets_and_four_links() {
        let table = build_table(&names(&["A"]), &names(&["x", "y"]), 200);

        for offset in ["-0px 0", "-200px 0", "-400px 0", "-600px 0"] {
            assert_eq!(table.matches(offset).count(), 1, "offset {offset}");
        }
        for link in [
            "href=\"A/x-full-1.png\"",
            "href=\"A/x-full-2.png\"",
            "href=\"A/y-full-1.png\"",
            "href=\"A/y-full-2.png\"",
        ] {
            assert_eq!(table.matches(link).count(), 1, "link {link}");
        }
        assert_eq!(table.matches("<tr>").count(), 1);
        assert_eq!(table.matches("<td>").count(), 2);
        assert_eq!(table.matches("data-sbox=Ax ").count(), 2);
        assert_eq!(table.matches("data-sbox=Ay ").count(), 2);
    }

    #[test]
    fn headers_follow_enumeration_order() {
        assert_eq!(
            build_top_header(&names(&["default", "albatross"])),
            "<td>default</td>\n<td>albatross</td>\n"
        );
        assert_eq!(
            build_left_header(&names(&["AnnArbor", "Antibes"])),
            "<tr><td><div>AnnArbor</div></td></tr>\n<tr><td><div>Antibes</div></td></tr>\n"
        );
        assert_eq!(build_top_header(&[]), "");
    }

    #[test]
    fn assemble_combines_all_fragments() {
        let themes = names(&["A", "B"]);
        let colors = names(&["x", "y", "z"]);
        let markup = MatrixMarkup::assemble(&themes, &colors, 200);

        assert_eq!(markup.table.matches("<tr>").count(), 2);
        assert_eq!(markup.table.matches("<td>").count(), 6);
        assert_eq!(markup.top_header.lines().count(), 3);
        assert_eq!(markup.left_header.lines().count(), 2);
    }

    #[test]
    fn gallery_group_is_undelimited_concatenation() {
        assert_eq!(gallery_group("Berlin", "beaver"), "Berlinbeaver");
        assert_eq!(gallery_group("ab", "c"), gallery_group("a", "bc"));
    }

    #[test]
    fn gallery_collisions_only_reports_shared_groups() {
        assert!(gallery_collisions(&names(&["A", "B"]), &names(&["x", "y"])).is_empty());
        assert_eq!(
            gallery_collisions(&names(&["ab", "a"]), &names(&["c", "bc"])),
            vec!["abc".to_string()]
        );
    }
}
