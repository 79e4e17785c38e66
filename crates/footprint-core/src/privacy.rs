use footprint_storage::Settings;
use std::fmt;

/// Scheme prefixes of browser-internal and extension pages
pub const DEFAULT_INTERNAL_PREFIXES: &[&str] = &["chrome://", "chrome-extension://"];

/// Why a candidate URL may not be tracked
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    MissingUrl,
    InternalPage,
    Excluded { pattern: String },
    SettingsUnavailable,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingUrl => f.write_str("no URL"),
            Self::InternalPage => f.write_str("internal page"),
            Self::Excluded { pattern } => write!(f, "excluded by '{pattern}'"),
            Self::SettingsUnavailable => f.write_str("settings unavailable"),
        }
    }
}

/// Privacy filter deciding which URLs may start a session
#[derive(Debug, Clone)]
pub struct UrlFilter {
    internal_prefixes: Vec<String>,
}

impl UrlFilter {
    #[must_use]
    pub fn new(internal_prefixes: Vec<String>) -> Self {
        Self { internal_prefixes }
    }

    /// Check if `url` belongs to a browser-internal page
    #[must_use]
    pub fn is_internal(&self, url: &str) -> bool {
        self.internal_prefixes
            .iter()
            .any(|prefix| url.starts_with(prefix.as_str()))
    }

    /// Validate a candidate URL against the internal prefixes and the exclude list
    ///
    /// # Errors
    ///
    /// Returns the [`Rejection`] describing why the URL must not be tracked
    pub fn check(&self, url: &str, settings: &Settings) -> Result<(), Rejection> {
        if url.is_empty() {
            return Err(Rejection::MissingUrl);
        }
        if self.is_internal(url) {
            return Err(Rejection::InternalPage);
        }
        if let Some(pattern) = settings
            .exclude_list
            .iter()
            .find(|pattern| !pattern.is_empty() && url.contains(pattern.as_str()))
        {
            return Err(Rejection::Excluded {
                pattern: pattern.clone(),
            });
        }
        Ok(())
    }
}

impl Default for UrlFilter {
    fn default() -> Self {
        Self::new(
            DEFAULT_INTERNAL_PREFIXES
                .iter()
                .map(ToString::to_string)
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(exclude: &[&str]) -> Settings {
        Settings {
            content_scanning: false,
            exclude_list: exclude.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn test_accepts_regular_page() {
        let filter = UrlFilter::default();
        assert_eq!(filter.check("https://a.example", &settings(&[])), Ok(()));
    }

    #[test]
    fn test_rejects_internal_pages() {
        let filter = UrlFilter::default();
        assert_eq!(
            filter.check("chrome://settings", &settings(&[])),
            Err(Rejection::InternalPage)
        );
        assert_eq!(
            filter.check("chrome-extension://abc/popup.html", &settings(&[])),
            Err(Rejection::InternalPage)
        );
    }

    #[test]
    fn test_rejects_excluded_substring() {
        let filter = UrlFilter::default();
        assert_eq!(
            filter.check("https://mail.example/inbox", &settings(&["", "mail."])),
            Err(Rejection::Excluded {
                pattern: "mail.".to_string()
            })
        );
    }

    #[test]
    fn test_rejects_missing_url() {
        let filter = UrlFilter::default();
        assert_eq!(filter.check("", &settings(&[])), Err(Rejection::MissingUrl));
    }

    #[test]
    fn test_custom_prefixes() {
        let filter = UrlFilter::new(vec!["about:".to_string()]);
        assert!(filter.is_internal("about:blank"));
        assert!(!filter.is_internal("chrome://settings"));
    }
}
