//! Icon records and the static icon catalog.
//!
//! Catalog records are built once at load time; uploaded records are
//! synthesized in [`sanitize`] and live for the session. Both share the same
//! shape so the rest of the pipeline does not care where an icon came from.

pub mod normalize;
pub mod sanitize;

use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static VIEWBOX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)viewBox\s*=\s*["']([^"']+)["']"#).unwrap());

/// Errors for icon intake and normalization.
#[derive(Debug, Error)]
pub enum IconError {
    /// The uploaded markup has no `svg` root element.
    #[error("the uploaded file is not a valid SVG")]
    NotSvg,

    /// The uploaded markup is not well-formed XML.
    #[error("failed to parse SVG markup: {0}")]
    Parse(#[from] quick_xml::Error),

    /// An attribute inside the uploaded markup could not be read.
    #[error("malformed attribute in SVG markup: {0}")]
    Attr(String),

    /// A `viewBox` string did not contain four finite numbers.
    #[error("invalid view box {value:?}")]
    InvalidViewBox { value: String },

    #[error("failed to read icon directory: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// IconRecord
// ============================================================================

/// One selectable icon: a stable slug id, a display label, the raw SVG
/// markup, and its declared view box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IconRecord {
    pub id: String,
    pub label: String,
    pub svg_content: String,
    pub view_box: String,
}

/// The declared coordinate rectangle establishing an icon's internal
/// coordinate system: `minX minY width height`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBox {
    pub min_x: f32,
    pub min_y: f32,
    pub width: f32,
    pub height: f32,
}

impl FromStr for ViewBox {
    type Err = IconError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || IconError::InvalidViewBox {
            value: s.to_string(),
        };
        let parts: Vec<f32> = s
            .split_whitespace()
            .map(|p| p.parse::<f32>())
            .collect::<Result<_, _>>()
            .map_err(|_| invalid())?;
        let [min_x, min_y, width, height] = parts[..] else {
            return Err(invalid());
        };
        if !width.is_finite() || !height.is_finite() || width <= 0.0 || height <= 0.0 {
            return Err(invalid());
        }
        Ok(ViewBox {
            min_x,
            min_y,
            width,
            height,
        })
    }
}

// ============================================================================
// IconCatalog
// ============================================================================

/// The static set of selectable icons, sorted by id ascending with unique ids.
#[derive(Debug, Clone, Default)]
pub struct IconCatalog {
    records: Vec<IconRecord>,
}

impl IconCatalog {
    /// Builds a catalog from pre-loaded records, sorting by id and keeping
    /// the first record for any duplicated id.
    pub fn from_records(mut records: Vec<IconRecord>) -> Self {
        records.sort_by(|a, b| a.id.cmp(&b.id));
        records.dedup_by(|b, a| a.id == b.id);
        Self { records }
    }

    /// Loads every `*.svg` file in a directory as a catalog record.
    ///
    /// The id is slugified from the file stem and the label title-cased from
    /// the id, so `alert_bell.svg` becomes id `alert-bell`, label
    /// `Alert Bell`.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, IconError> {
        let mut records = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let is_svg = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"));
            if !is_svg {
                continue;
            }
            let svg = std::fs::read_to_string(&path)?;
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let id = id_from_stem(&stem);
            records.push(IconRecord {
                label: label_from_id(&id),
                view_box: parse_view_box(&svg),
                svg_content: svg,
                id,
            });
        }
        Ok(Self::from_records(records))
    }

    pub fn find(&self, id: &str) -> Option<&IconRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &IconRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Returns the markup's declared `viewBox` attribute value, if any.
pub(crate) fn declared_view_box(svg: &str) -> Option<String> {
    VIEWBOX_RE.captures(svg).map(|c| c[1].to_string())
}

/// Extracts a declared `viewBox`, defaulting to `0 0 16 16` for catalog
/// icons that omit one.
pub(crate) fn parse_view_box(svg: &str) -> String {
    declared_view_box(svg).unwrap_or_else(|| "0 0 16 16".to_string())
}

/// Slugifies a file stem into an icon id: lowercase, spaces and underscores
/// to hyphens, everything outside `[a-z0-9-]` dropped.
pub(crate) fn id_from_stem(stem: &str) -> String {
    let mut id = String::with_capacity(stem.len());
    let mut prev_hyphen = false;
    for c in stem.trim().chars().flat_map(char::to_lowercase) {
        let mapped = if c.is_whitespace() || c == '_' || c == '-' {
            Some('-')
        } else if c.is_ascii_lowercase() || c.is_ascii_digit() {
            Some(c)
        } else {
            None
        };
        if let Some(m) = mapped {
            if m == '-' {
                prev_hyphen = true;
            } else {
                if prev_hyphen && !id.is_empty() {
                    id.push('-');
                }
                prev_hyphen = false;
                id.push(m);
            }
        }
    }
    if id.is_empty() { "icon".to_string() } else { id }
}

/// Title-cases an id for display: `alert-bell` becomes `Alert Bell`.
pub(crate) fn label_from_id(id: &str) -> String {
    id.split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
