use thiserror::Error;

/// Errors raised inside the mirroring pipeline.
///
/// None of these reach the page render: the public entry points log them
/// and fall back to stale data or empty output.
#[derive(Error, Debug)]
pub enum MirrorError {
    #[error("HTTP fetch failed for {url}: {reason}")]
    Http { url: String, reason: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Provider returned no usable stylesheet for '{family}'")]
    InvalidStylesheet { family: String },
    #[error("Catalog response lists no font families")]
    InvalidCatalog,
    #[error("No catalog API key configured")]
    MissingApiKey,
    #[error("Font family not in catalog: {0}")]
    UnknownFamily(String),
}

impl MirrorError {
    pub fn http(url: &str, reason: impl ToString) -> Self {
        MirrorError::Http {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MirrorError>;
