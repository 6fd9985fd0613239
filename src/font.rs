//! Font asset resolution for embedding and glyph outlining.
//!
//! Sources are a static ordered list, most-preferred format first. Fetching
//! is a capability so the store behind the paths (filesystem here, anything
//! byte-addressed in principle) stays out of the resolution logic.

use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Font binary container formats the pipeline understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontFormat {
    /// Compact web format, preferred for embedding.
    Woff2,
    /// Uncompressed format, required by the glyph outliner's parser.
    TrueType,
}

impl FontFormat {
    /// The CSS `format(...)` hint for `@font-face` sources.
    pub fn css_format(&self) -> &'static str {
        match self {
            FontFormat::Woff2 => "woff2",
            FontFormat::TrueType => "truetype",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            FontFormat::Woff2 => "font/woff2",
            FontFormat::TrueType => "font/truetype",
        }
    }
}

/// One candidate font source in the ordered preference list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontAssetSource {
    pub path: String,
    pub mime: String,
    pub format: FontFormat,
}

impl FontAssetSource {
    pub fn woff2(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mime: FontFormat::Woff2.mime().to_string(),
            format: FontFormat::Woff2,
        }
    }

    pub fn truetype(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mime: FontFormat::TrueType.mime().to_string(),
            format: FontFormat::TrueType,
        }
    }
}

/// The tag typeface: family, weight, CSS fallback stack, and asset sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontConfig {
    pub family: String,
    pub weight: u16,
    /// Used by text runs when no font is embedded.
    pub fallback_stack: String,
    pub sources: Vec<FontAssetSource>,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            family: "Inter".to_string(),
            weight: 800,
            fallback_stack: r#""Inter", "Arial", sans-serif"#.to_string(),
            sources: vec![
                FontAssetSource::woff2("fonts/inter-extrabold.woff2"),
                FontAssetSource::truetype("fonts/inter-extrabold.ttf"),
            ],
        }
    }
}

/// Errors from font resolution.
#[derive(Debug, Error)]
pub enum FontError {
    #[error("no font sources configured")]
    NoSources,

    #[error("font fetch failed for {path}: {source}")]
    Fetch {
        path: String,
        #[source]
        source: io::Error,
    },
}

// ============================================================================
// Fetching capability
// ============================================================================

/// Byte-fetch capability for font asset paths.
pub trait FontFetcher: Send + Sync {
    fn fetch(&self, path: &str) -> io::Result<Vec<u8>>;
}

/// Reads font assets from a directory on disk.
#[derive(Debug, Clone)]
pub struct FsFontFetcher {
    base_dir: PathBuf,
}

impl FsFontFetcher {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }
}

impl FontFetcher for FsFontFetcher {
    fn fetch(&self, path: &str) -> io::Result<Vec<u8>> {
        std::fs::read(self.base_dir.join(path))
    }
}

// ============================================================================
// Resolved fonts
// ============================================================================

/// A fetched font binary plus the descriptor it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFont {
    pub bytes: Vec<u8>,
    pub path: String,
    pub mime: String,
    pub format: FontFormat,
}

impl ResolvedFont {
    /// Prepares this font for inlining into a vector document.
    pub fn to_embed(&self) -> FontEmbed {
        FontEmbed {
            base64: BASE64.encode(&self.bytes),
            mime: self.mime.clone(),
            format: self.format,
        }
    }
}

/// Base64 font data ready for a `@font-face` declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct FontEmbed {
    pub base64: String,
    pub mime: String,
    pub format: FontFormat,
}

// ============================================================================
// FontResolver
// ============================================================================

/// Resolves font binaries from the ordered source list.
///
/// The preload memo is the only state shared across exports: one resolved
/// TrueType font behind a mutex, immutable once stored. A failed preload
/// stores nothing, so a later call retries.
pub struct FontResolver {
    config: FontConfig,
    fetcher: Box<dyn FontFetcher>,
    preloaded: Mutex<Option<Arc<ResolvedFont>>>,
}

impl FontResolver {
    pub fn new(config: FontConfig, fetcher: Box<dyn FontFetcher>) -> Self {
        Self {
            config,
            fetcher,
            preloaded: Mutex::new(None),
        }
    }

    /// Resolver over an asset directory with the default typeface.
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(FontConfig::default(), Box::new(FsFontFetcher::new(dir)))
    }

    pub fn config(&self) -> &FontConfig {
        &self.config
    }

    fn fetch_source(&self, source: &FontAssetSource) -> Result<ResolvedFont, FontError> {
        let bytes = self
            .fetcher
            .fetch(&source.path)
            .map_err(|e| FontError::Fetch {
                path: source.path.clone(),
                source: e,
            })?;
        Ok(ResolvedFont {
            bytes,
            path: source.path.clone(),
            mime: source.mime.clone(),
            format: source.format,
        })
    }

    /// Fetches the most-preferred source that succeeds, in list order.
    ///
    /// When every candidate fails, the error names the last failure.
    pub fn resolve_preferred(&self) -> Result<ResolvedFont, FontError> {
        let mut last_error = FontError::NoSources;
        for source in &self.config.sources {
            match self.fetch_source(source) {
                Ok(resolved) => return Ok(resolved),
                Err(e) => last_error = e,
            }
        }
        Err(last_error)
    }

    /// Fetches a TrueType-compatible source specifically, independent of the
    /// embedding preference. The glyph outliner's parser cannot read WOFF2.
    pub fn resolve_truetype(&self) -> Result<ResolvedFont, FontError> {
        let source = self
            .config
            .sources
            .iter()
            .find(|s| s.format == FontFormat::TrueType)
            .or_else(|| self.config.sources.first())
            .ok_or(FontError::NoSources)?;
        self.fetch_source(source)
    }

    /// Idempotently resolves one TrueType font for text measurement.
    ///
    /// The first success is memoized and shared; a failure leaves the memo
    /// empty so the next call retries.
    pub fn preload(&self) -> Result<Arc<ResolvedFont>, FontError> {
        let mut slot = self.preloaded.lock().expect("font preload lock poisoned");
        if let Some(font) = slot.as_ref() {
            return Ok(Arc::clone(font));
        }
        let font = Arc::new(self.resolve_truetype()?);
        *slot = Some(Arc::clone(&font));
        Ok(font)
    }

    /// The memoized preload result, if an attempt has succeeded.
    pub fn preloaded(&self) -> Option<Arc<ResolvedFont>> {
        self.preloaded
            .lock()
            .expect("font preload lock poisoned")
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MemoryFetcher {
        files: HashMap<&'static str, Vec<u8>>,
        fetches: AtomicUsize,
    }

    impl MemoryFetcher {
        fn new(files: Vec<(&'static str, &[u8])>) -> Self {
            Self {
                files: files.into_iter().map(|(k, v)| (k, v.to_vec())).collect(),
                fetches: AtomicUsize::new(0),
            }
        }
    }

    impl FontFetcher for &MemoryFetcher {
        fn fetch(&self, path: &str) -> io::Result<Vec<u8>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.files
                .get(path)
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.to_string()))
        }
    }

    fn resolver(fetcher: &'static MemoryFetcher) -> FontResolver {
        FontResolver::new(FontConfig::default(), Box::new(fetcher))
    }

    fn leak(files: Vec<(&'static str, &[u8])>) -> &'static MemoryFetcher {
        Box::leak(Box::new(MemoryFetcher::new(files)))
    }

    #[test]
    fn preferred_resolution_takes_woff2_first() {
        let fetcher = leak(vec![
            ("fonts/inter-extrabold.woff2", b"woff2-bytes".as_slice()),
            ("fonts/inter-extrabold.ttf", b"ttf-bytes".as_slice()),
        ]);
        let resolved = resolver(fetcher).resolve_preferred().unwrap();
        assert_eq!(resolved.format, FontFormat::Woff2);
        assert_eq!(resolved.bytes, b"woff2-bytes");
        assert_eq!(resolved.mime, "font/woff2");
    }

    #[test]
    fn preferred_resolution_falls_back_in_order() {
        let fetcher = leak(vec![("fonts/inter-extrabold.ttf", b"ttf-bytes".as_slice())]);
        let resolved = resolver(fetcher).resolve_preferred().unwrap();
        assert_eq!(resolved.format, FontFormat::TrueType);
    }

    #[test]
    fn exhausted_sources_name_the_last_failure() {
        let fetcher = leak(vec![]);
        let err = resolver(fetcher).resolve_preferred().unwrap_err();
        match err {
            FontError::Fetch { path, .. } => assert_eq!(path, "fonts/inter-extrabold.ttf"),
            other => panic!("expected fetch error, got {other:?}"),
        }
    }

    #[test]
    fn truetype_accessor_skips_the_preferred_format() {
        let fetcher = leak(vec![
            ("fonts/inter-extrabold.woff2", b"woff2-bytes".as_slice()),
            ("fonts/inter-extrabold.ttf", b"ttf-bytes".as_slice()),
        ]);
        let resolved = resolver(fetcher).resolve_truetype().unwrap();
        assert_eq!(resolved.format, FontFormat::TrueType);
        assert_eq!(resolved.bytes, b"ttf-bytes");
    }

    #[test]
    fn preload_memoizes_success() {
        let fetcher = leak(vec![("fonts/inter-extrabold.ttf", b"ttf-bytes".as_slice())]);
        let resolver = resolver(fetcher);
        assert!(resolver.preloaded().is_none());

        let first = resolver.preload().unwrap();
        let second = resolver.preload().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        // One miss on the woff2 candidate is possible only for
        // resolve_preferred; preload goes straight to the ttf source.
        assert_eq!(fetcher.fetches.load(Ordering::SeqCst), 1);
        assert!(resolver.preloaded().is_some());
    }

    #[test]
    fn failed_preload_retries_later() {
        let fetcher = leak(vec![]);
        let resolver = resolver(fetcher);
        assert!(resolver.preload().is_err());
        assert!(resolver.preloaded().is_none());
        assert!(resolver.preload().is_err());
        assert_eq!(fetcher.fetches.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn embed_round_trips_bytes_exactly() {
        let font = ResolvedFont {
            bytes: vec![0, 1, 2, 250, 255],
            path: "x.ttf".to_string(),
            mime: "font/truetype".to_string(),
            format: FontFormat::TrueType,
        };
        let embed = font.to_embed();
        assert_eq!(BASE64.decode(embed.base64).unwrap(), font.bytes);
    }
}
