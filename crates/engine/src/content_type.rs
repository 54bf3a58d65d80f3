//! MIME type resolution for uploads.

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::Path;
use std::sync::Arc;

/// Fallback for extensions the table does not know.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

type Override = Arc<dyn Fn(&Path) -> Option<String> + Send + Sync>;

/// Maps a file path to the Content-Type sent with its upload.
///
/// The built-in table looks at the extension only (case-insensitive). Text
/// types are sent as UTF-8.
///
/// # Examples
///
/// ```
/// use wsync_engine::ContentTypeResolver;
///
/// let resolver = ContentTypeResolver::default();
/// assert_eq!(resolver.resolve("src/index.ts"), "text/typescript; charset=utf-8");
/// assert_eq!(resolver.resolve("logo.PNG"), "image/png");
/// assert_eq!(resolver.resolve("Makefile"), "application/octet-stream");
///
/// let custom = ContentTypeResolver::custom(|path| {
///     (path.extension()? == "tpl").then(|| "text/x-template".to_string())
/// });
/// assert_eq!(custom.resolve("page.tpl"), "text/x-template");
/// assert_eq!(custom.resolve("page.html"), "text/html; charset=utf-8");
/// ```
#[derive(Clone, Default)]
pub struct ContentTypeResolver {
    custom: Option<Override>,
}

impl ContentTypeResolver {
    /// Consult `resolve` first, falling back to the built-in table whenever it
    /// returns `None`.
    pub fn custom<F>(resolve: F) -> Self
    where
        F: Fn(&Path) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            custom: Some(Arc::new(resolve)),
        }
    }

    #[must_use]
    pub fn resolve(&self, path: impl AsRef<Path>) -> String {
        let path = path.as_ref();
        if let Some(custom) = &self.custom
            && let Some(content_type) = custom(path)
        {
            return content_type;
        }
        builtin(path)
    }
}

impl Debug for ContentTypeResolver {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ContentTypeResolver").field("custom", &self.custom.is_some()).finish()
    }
}

fn builtin(path: &Path) -> String {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return DEFAULT_CONTENT_TYPE.to_string();
    };
    let (mime, text) = match ext.to_lowercase().as_str() {
        "txt" | "text" => ("text/plain", true),
        "md" | "markdown" => ("text/markdown", true),
        "html" | "htm" => ("text/html", true),
        "css" => ("text/css", true),
        "csv" => ("text/csv", true),
        "xml" => ("application/xml", true),
        "js" | "mjs" | "cjs" => ("text/javascript", true),
        "ts" | "mts" | "cts" => ("text/typescript", true),
        "tsx" => ("text/tsx", true),
        "jsx" => ("text/jsx", true),
        "json" => ("application/json", true),
        "yaml" | "yml" => ("application/yaml", true),
        "toml" => ("application/toml", true),
        "sh" => ("application/x-sh", true),
        "py" => ("text/x-python", true),
        "rs" => ("text/x-rust", true),
        "go" => ("text/x-go", true),
        "java" => ("text/x-java", true),
        "c" | "h" => ("text/x-c", true),
        "cpp" | "hpp" | "cc" => ("text/x-c++", true),
        "sql" => ("application/sql", true),
        "svg" => ("image/svg+xml", true),
        "png" => ("image/png", false),
        "jpg" | "jpeg" => ("image/jpeg", false),
        "gif" => ("image/gif", false),
        "webp" => ("image/webp", false),
        "ico" => ("image/x-icon", false),
        "pdf" => ("application/pdf", false),
        "zip" => ("application/zip", false),
        "gz" => ("application/gzip", false),
        "tar" => ("application/x-tar", false),
        "wasm" => ("application/wasm", false),
        "woff" => ("font/woff", false),
        "woff2" => ("font/woff2", false),
        "mp3" => ("audio/mpeg", false),
        "mp4" => ("video/mp4", false),
        _ => (DEFAULT_CONTENT_TYPE, false),
    };
    if text { format!("{mime}; charset=utf-8") } else { mime.to_string() }
}
