//! Turns zone groups into the published HTML page.

use std::{
    io::{self, Write},
    path::{Path, PathBuf},
    time::Instant,
};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

mod payload;
pub use payload::*;

use crate::{
    parking::{MapSummary, ZoneGroup, ZoneType},
    ser::ServiceArea,
    shared::{Coordinate, MADRID_CENTER, text::escape_html},
};

const TEMPLATE: &str = include_str!("template.html");

/// The page could not be produced or written. Nothing is left at the output path.
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Could not write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl OutputError {
    fn io(path: &Path) -> impl FnOnce(io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub title: String,
    /// Shown in the page footer. Kept outside the payload so the data stays
    /// identical between runs.
    pub generated_at: Option<String>,
    pub center: Coordinate,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            title: "Madrid SER - Zonas de aparcamiento regulado".into(),
            generated_at: None,
            center: MADRID_CENTER,
        }
    }
}

/// A fully rendered page, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub html: String,
    /// The embedded data, as inlined in the page.
    pub payload: String,
}

pub fn render_page(
    groups: &[ZoneGroup],
    service_areas: &[ServiceArea],
    summary: &MapSummary,
    options: &RenderOptions,
) -> Result<Page, OutputError> {
    let payload = MapPayload::new(groups, service_areas, summary).to_script_json()?;
    let generated_at = serde_json::to_string(&options.generated_at)?.replace('<', "\\u003c");
    let center = serde_json::to_string(&options.center)?;

    let title = escape_html(&options.title);
    let summary_text = summary_line(summary);
    let legend = legend();
    let html = fill_template(TEMPLATE, |name| match name {
        "title" => Some(title.as_str()),
        "summary" => Some(summary_text.as_str()),
        "legend" => Some(legend.as_str()),
        "generated_at" => Some(generated_at.as_str()),
        "center" => Some(center.as_str()),
        "payload" => Some(payload.as_str()),
        _ => None,
    });
    Ok(Page { html, payload })
}

/// Renders the page and writes it to `output`.
///
/// The page is written to a temporary file next to `output` and renamed over
/// it, so a failed run never leaves a partial page behind.
pub fn render<P: AsRef<Path>>(
    groups: &[ZoneGroup],
    service_areas: &[ServiceArea],
    summary: &MapSummary,
    options: &RenderOptions,
    output: P,
) -> Result<Page, OutputError> {
    let output = output.as_ref();
    debug!("Rendering {}...", output.display());
    let now = Instant::now();
    let page = render_page(groups, service_areas, summary, options)?;
    write_atomic(output, &page.html)?;
    debug!(
        "Wrote {} bytes to {} in {:?}",
        page.html.len(),
        output.display(),
        now.elapsed()
    );
    Ok(page)
}

fn write_atomic(path: &Path, contents: &str) -> Result<(), OutputError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir).map_err(OutputError::io(path))?;
    file.write_all(contents.as_bytes())
        .map_err(OutputError::io(path))?;
    file.flush().map_err(OutputError::io(path))?;
    #[cfg(unix)]
    {
        use std::{fs::Permissions, os::unix::fs::PermissionsExt};
        file.as_file()
            .set_permissions(Permissions::from_mode(0o644))
            .map_err(OutputError::io(path))?;
    }
    file.persist(path)
        .map_err(|err| OutputError::io(path)(err.error))?;
    Ok(())
}

/// Replaces every `{{name}}` in `template` in one left-to-right pass, so text
/// coming from the values is never expanded again. Unknown names are kept as is.
fn fill_template<'a>(template: &str, value: impl Fn(&str) -> Option<&'a str>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}").and_then(|end| Some((end, value(&after[..end])?))) {
            Some((end, text)) => {
                out.push_str(text);
                rest = &after[end + 2..];
            }
            None => {
                out.push_str("{{");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn summary_line(summary: &MapSummary) -> String {
    format!(
        "{} segmentos | {} plazas",
        thousands(summary.segments as u64),
        thousands(summary.spots)
    )
}

fn legend() -> String {
    ZoneType::ALL
        .iter()
        .map(|zone| {
            format!(
                "                <div class=\"d-flex align-items-center mb-1\"><span class=\"swatch\" style=\"background: {};\"></span><small>{}</small></div>\n",
                zone.color(),
                escape_html(zone.label())
            )
        })
        .collect()
}

/// Groups digits with dots, as written in Spanish.
fn thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out
}

#[test]
fn thousands_groups_digits() {
    assert_eq!(thousands(0), "0");
    assert_eq!(thousands(999), "999");
    assert_eq!(thousands(1000), "1.000");
    assert_eq!(thousands(1234567), "1.234.567");
}

#[test]
fn legend_lists_every_zone_in_order() {
    let legend = legend();
    let positions: Vec<_> = ZoneType::ALL
        .iter()
        .map(|zone| legend.find(zone.color()).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
    assert!(legend.contains("Alta Rotación"));
}

#[test]
fn fill_template_does_not_expand_values() {
    let filled = fill_template("<h1>{{title}}</h1>{{payload}}{{other}}", |name| match name {
        "title" => Some("{{payload}}"),
        "payload" => Some("[1]"),
        _ => None,
    });
    assert_eq!(filled, "<h1>{{payload}}</h1>[1]{{other}}");
}

#[test]
fn placeholders_in_title_and_stamp_stay_literal() {
    let options = RenderOptions {
        title: "Mapa {{payload}} {{legend}}".into(),
        generated_at: Some("{{center}}".into()),
        ..RenderOptions::default()
    };
    let page = render_page(&[], &[], &MapSummary::default(), &options).unwrap();
    assert!(page.html.contains("<title>Mapa {{payload}} {{legend}}</title>"));
    assert!(page.html.contains("const generatedAt = \"{{center}}\";"));
    assert_eq!(page.html.matches(&page.payload).count(), 1);
}
