//! Hover rendering for feature references

use crate::matcher::{Position, Range, find_first_reference};
use crate::registry::{FeatureRegistry, explore_url};
use crate::status::{BaselineStatus, IconKey, classify};
use serde::Serialize;

/// Only this many characters of the hovered line are scanned.
pub const HOVER_SCAN_CHARS: usize = 100;

/// Shown instead of a version for unsupported browsers
pub const UNSUPPORTED_CELL: &str = "❌";

/// Knobs for the rendered markdown
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Base URI of the `baseline-{widely,newly,limited}-icon.svg` images. When
    /// unset the icon key is rendered as text.
    pub icon_base_uri: Option<String>,
}

/// Hover content for a feature reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedHover {
    pub markdown: String,
    /// Range of the feature id the hover applies to
    pub range: Range,
    pub feature_id: String,
    pub status: BaselineStatus,
}

/// Render the hover for the reference under the cursor, if any.
///
/// No hover is produced when the cursor is outside the id, or when the id is
/// not registered (validation already reports that).
pub fn hover(
    text: &str,
    position: Position,
    registry: &FeatureRegistry,
    options: &RenderOptions,
) -> Option<RenderedHover> {
    let line = text.lines().nth(position.line as usize)?;
    let scanned = match line.char_indices().nth(HOVER_SCAN_CHARS) {
        Some((idx, _)) => &line[..idx],
        None => line,
    };

    let reference = find_first_reference(scanned, position.line)?;
    if !reference.contains_column(position.character) {
        return None;
    }

    let feature = registry.get(&reference.feature_id)?;
    let status = classify(&feature.status);

    let mut md = String::new();
    md.push_str(&format!("### {}\n\n", escape_heading(&feature.name)));
    if !feature.description_html.is_empty() {
        md.push_str(&format!("{}\n\n", feature.description_html.trim()));
    }
    md.push_str(&format!(
        "{} **Baseline:** {}\n\n",
        icon_markup(status.icon, options),
        status.label
    ));

    md.push_str("| Browser | Supported since |\n");
    md.push_str("| --- | --- |\n");
    for cell in registry.support_cells(feature) {
        let support = match (&cell.version, &cell.release_date) {
            (Some(version), Some(date)) => format!("{} ({})", version, date),
            (Some(version), None) => version.clone(),
            _ => UNSUPPORTED_CELL.to_string(),
        };
        md.push_str(&format!("| {} | {} |\n", cell.browser_name, support));
    }

    md.push_str(&format!(
        "\n[Explore on webstatus.dev]({})",
        explore_url(&feature.id)
    ));

    Some(RenderedHover {
        markdown: md,
        range: reference.range(),
        feature_id: reference.feature_id,
        status,
    })
}

/// Names like `<dialog>` would otherwise be parsed as markup
fn escape_heading(name: &str) -> String {
    match name.strip_prefix('<') {
        Some(rest) => format!("&lt;{}", rest),
        None => name.to_string(),
    }
}

fn icon_markup(icon: IconKey, options: &RenderOptions) -> String {
    match &options.icon_base_uri {
        Some(base) => format!(
            r#"<img src="{}/baseline-{}-icon.svg" alt="Baseline {}" height="16" />"#,
            base.trim_end_matches('/'),
            icon,
            icon
        ),
        None => format!("`[{}]`", icon),
    }
}
