//! Uploaded-icon intake: streaming sanitization and record synthesis.
//!
//! Uploaded markup crosses a trust boundary, so it is re-emitted through a
//! quick-xml reader/writer pass that drops executable content before the
//! record enters the pipeline. Catalog icons ship with the application and
//! skip this path.

use std::borrow::Cow;
use std::sync::LazyLock;

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use regex::Regex;

use super::{IconError, IconRecord};

/// Elements whose entire subtree is removed.
const BANNED_ELEMENTS: [&[u8]; 5] = [
    b"script",
    b"foreignobject",
    b"iframe",
    b"object",
    b"embed",
];

static SIZE_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(width|height)\s*=\s*["']\s*([0-9]*\.?[0-9]+)(?:px)?\s*["']"#).unwrap()
});

fn is_banned_element(local_name: &[u8]) -> bool {
    BANNED_ELEMENTS
        .iter()
        .any(|banned| local_name.eq_ignore_ascii_case(banned))
}

/// Rebuilds an element without event-handler attributes or `javascript:`
/// link targets. Surviving attribute values are copied verbatim, escaping
/// included.
fn scrub_element(e: &BytesStart<'_>) -> Result<BytesStart<'static>, IconError> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut out = BytesStart::new(name);
    for attr in e.attributes() {
        let attr = attr.map_err(|err| IconError::Attr(err.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();

        let key_lower = key.to_ascii_lowercase();
        if key_lower.starts_with("on") {
            continue;
        }
        if key_lower == "href" || key_lower == "xlink:href" {
            let value = String::from_utf8_lossy(&attr.value).into_owned();
            if value.trim().to_ascii_lowercase().starts_with("javascript:") {
                continue;
            }
        }
        out.push_attribute(Attribute {
            key: QName(key.as_bytes()),
            value: Cow::Owned(attr.value.into_owned()),
        });
    }
    Ok(out)
}

/// Sanitizes raw SVG markup, returning the serialized `svg` element.
///
/// The first element must be `svg` (anything else is rejected). `script`,
/// `foreignObject`, `iframe`, `object`, and `embed` subtrees are dropped,
/// `on*` attributes and `javascript:` hrefs stripped. Everything else,
/// including unknown-but-inert elements and attributes, passes through.
pub fn sanitize_svg(raw: &str) -> Result<String, IconError> {
    let mut reader = Reader::from_str(raw);
    let mut writer = Writer::new(Vec::new());
    let mut root_seen = false;
    let mut depth = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if !root_seen {
                    if !e.local_name().as_ref().eq_ignore_ascii_case(b"svg") {
                        return Err(IconError::NotSvg);
                    }
                    root_seen = true;
                } else if is_banned_element(e.local_name().as_ref()) {
                    reader.read_to_end(e.name())?;
                    continue;
                }
                depth += 1;
                writer.write_event(Event::Start(scrub_element(&e)?))?;
            }
            Event::Empty(e) => {
                if !root_seen {
                    if !e.local_name().as_ref().eq_ignore_ascii_case(b"svg") {
                        return Err(IconError::NotSvg);
                    }
                    writer.write_event(Event::Empty(scrub_element(&e)?))?;
                    break;
                }
                if is_banned_element(e.local_name().as_ref()) {
                    continue;
                }
                writer.write_event(Event::Empty(scrub_element(&e)?))?;
            }
            Event::End(e) => {
                writer.write_event(Event::End(e))?;
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            Event::Text(t) => {
                if root_seen {
                    writer.write_event(Event::Text(t))?;
                }
            }
            Event::CData(t) => {
                if root_seen {
                    writer.write_event(Event::CData(t))?;
                }
            }
            Event::Eof => {
                if !root_seen {
                    return Err(IconError::NotSvg);
                }
                break;
            }
            // XML declarations, doctypes, PIs, and comments are dropped.
            _ => {}
        }
    }

    let bytes = writer.into_inner();
    Ok(String::from_utf8_lossy(&bytes).trim().to_string())
}

/// Synthesizes a session icon record from an uploaded file.
///
/// The id is `uploaded-<cleaned stem>` so an upload can never collide with a
/// catalog id; the display label keeps the original stem.
pub fn create_uploaded_icon(file_name: &str, raw_svg: &str) -> Result<IconRecord, IconError> {
    let svg_content = sanitize_svg(raw_svg)?;
    let base = clean_base_name(file_name);
    let display = strip_svg_ext(file_name).trim();
    Ok(IconRecord {
        id: format!("uploaded-{base}"),
        label: if display.is_empty() {
            base
        } else {
            display.to_string()
        },
        view_box: infer_view_box(&svg_content),
        svg_content,
    })
}

fn strip_svg_ext(name: &str) -> &str {
    let len = name.len();
    if len >= 4 && name.is_char_boundary(len - 4) && name[len - 4..].eq_ignore_ascii_case(".svg") {
        &name[..len - 4]
    } else {
        name
    }
}

fn clean_base_name(file_name: &str) -> String {
    let id = super::id_from_stem(strip_svg_ext(file_name));
    if id == "icon" {
        "custom-icon".to_string()
    } else {
        id
    }
}

/// Infers a view box: the declared one, else declared width/height, else the
/// conventional `0 0 24 24`.
fn infer_view_box(svg: &str) -> String {
    if let Some(vb) = super::declared_view_box(svg) {
        return vb;
    }

    let mut width = None;
    let mut height = None;
    for caps in SIZE_ATTR_RE.captures_iter(svg) {
        let value: f32 = match caps[2].parse() {
            Ok(v) => v,
            Err(_) => continue,
        };
        if !value.is_finite() || value <= 0.0 {
            continue;
        }
        if caps[1].eq_ignore_ascii_case("width") {
            width.get_or_insert(value);
        } else {
            height.get_or_insert(value);
        }
    }

    match (width, height) {
        (Some(w), Some(h)) => format!("0 0 {w} {h}"),
        _ => "0 0 24 24".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_safe_geometry() {
        let raw = r##"<svg viewBox="0 0 24 24"><path d="M2 2h20v20H2z" fill="#fff"/></svg>"##;
        let clean = sanitize_svg(raw).unwrap();
        assert!(clean.contains(r#"d="M2 2h20v20H2z""#));
        assert!(clean.contains(r#"viewBox="0 0 24 24""#));
    }

    #[test]
    fn removes_script_subtrees() {
        let raw = r#"<svg><script>alert('x')</script><rect width="4" height="4"/></svg>"#;
        let clean = sanitize_svg(raw).unwrap();
        assert!(!clean.contains("script"));
        assert!(!clean.contains("alert"));
        assert!(clean.contains("<rect"));
    }

    #[test]
    fn removes_foreign_object_and_nested_content() {
        let raw = r#"<svg><foreignObject><iframe src="https://x.test"/><p>hi</p></foreignObject><circle r="3"/></svg>"#;
        let clean = sanitize_svg(raw).unwrap();
        assert!(!clean.contains("foreignObject"));
        assert!(!clean.contains("iframe"));
        assert!(!clean.contains("hi"));
        assert!(clean.contains("<circle"));
    }

    #[test]
    fn strips_event_handlers_and_script_urls() {
        let raw = r#"<svg onload="evil()"><a href="javascript:evil()"><rect onclick="evil()" width="4"/></a><a href="https://ok.test"><rect/></a></svg>"#;
        let clean = sanitize_svg(raw).unwrap();
        assert!(!clean.contains("onload"));
        assert!(!clean.contains("onclick"));
        assert!(!clean.contains("javascript:"));
        assert!(clean.contains(r#"href="https://ok.test""#));
    }

    #[test]
    fn rejects_non_svg_root() {
        assert!(matches!(
            sanitize_svg("<html><body/></html>"),
            Err(IconError::NotSvg)
        ));
        assert!(matches!(sanitize_svg(""), Err(IconError::NotSvg)));
    }

    #[test]
    fn rejects_malformed_markup() {
        assert!(matches!(
            sanitize_svg("<svg><rect></svg>"),
            Err(IconError::Parse(_))
        ));
    }

    #[test]
    fn uploaded_record_gets_prefixed_id_and_label() {
        let icon = create_uploaded_icon("My Icon.SVG", r#"<svg viewBox="0 0 32 32"><rect/></svg>"#)
            .unwrap();
        assert_eq!(icon.id, "uploaded-my-icon");
        assert_eq!(icon.label, "My Icon");
        assert_eq!(icon.view_box, "0 0 32 32");
    }

    #[test]
    fn uploaded_record_falls_back_to_custom_icon() {
        let icon = create_uploaded_icon("???.svg", "<svg><rect/></svg>").unwrap();
        assert_eq!(icon.id, "uploaded-custom-icon");
        assert_eq!(icon.view_box, "0 0 24 24");
    }

    #[test]
    fn view_box_inferred_from_width_and_height() {
        let icon =
            create_uploaded_icon("chip.svg", r#"<svg width="48px" height="36"><rect/></svg>"#)
                .unwrap();
        assert_eq!(icon.view_box, "0 0 48 36");
    }
}
