use crate::constants::{AUTH_TOKEN_HEADER, ORG_SLUG_HEADER, PARTIAL_SUFFIX};
use crate::errors::{AppError, AppResult};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// On-disk shape of the auth file.
#[derive(Deserialize)]
struct AuthFile {
    org: String,
    auth_token: String,
    api_url: String,
}

/// Credentials and API location for a run.
///
/// Built once at startup and shared read-only by every fetch task.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub base_url: String,
    pub org_slug: String,
    pub auth_token: String,
}

impl AuthContext {
    /// Creates a context, making sure `base_url` ends with `/` so endpoint
    /// paths can be appended directly.
    pub fn new(
        base_url: impl Into<String>,
        org_slug: impl Into<String>,
        auth_token: impl Into<String>,
    ) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            base_url,
            org_slug: org_slug.into(),
            auth_token: auth_token.into(),
        }
    }

    /// Loads the context from a JSON file with `org`, `auth_token` and `api_url` keys.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read, is not valid JSON, or
    /// lacks one of the required keys.
    pub fn from_json_file(path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::ConfigError(format!(
                "Failed to read auth file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_json_str(&contents).map_err(|e| match e {
            AppError::ConfigError(msg) => {
                AppError::ConfigError(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
    }

    /// Parses the context from the contents of an auth file.
    pub fn from_json_str(contents: &str) -> AppResult<Self> {
        let file: AuthFile = serde_json::from_str(contents)
            .map_err(|e| AppError::ConfigError(format!("Failed to parse auth file: {e}")))?;
        Ok(Self::new(file.api_url, file.org, file.auth_token))
    }

    /// Headers identifying the organization and carrying the token.
    ///
    /// The token value is flagged sensitive so it never shows up in debug output.
    pub fn headers(&self) -> AppResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        let org = HeaderValue::from_str(&self.org_slug)
            .map_err(|e| AppError::ConfigError(format!("Invalid org slug: {e}")))?;
        let mut token = HeaderValue::from_str(&self.auth_token)
            .map_err(|e| AppError::ConfigError(format!("Invalid auth token: {e}")))?;
        token.set_sensitive(true);
        headers.insert(HeaderName::from_static(ORG_SLUG_HEADER), org);
        headers.insert(HeaderName::from_static(AUTH_TOKEN_HEADER), token);
        Ok(headers)
    }
}

impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthContext")
            .field("base_url", &self.base_url)
            .field("org_slug", &self.org_slug)
            .field("auth_token", &"<redacted>")
            .finish()
    }
}

/// Checks that an identifier is safe to use as a file name in an output directory.
///
/// Ids ending in the temp-file suffix are refused since their final name would
/// clash with another id's in-progress file.
pub fn validate_file_id(file_id: &str) -> AppResult<()> {
    if file_id.is_empty()
        || file_id == "."
        || file_id.contains("..")
        || file_id.contains(['/', '\\'])
        || file_id.contains('\0')
        || file_id.ends_with(PARTIAL_SUFFIX)
    {
        return Err(AppError::InvalidInput(format!(
            "File id '{file_id}' cannot be used as a file name"
        )));
    }
    Ok(())
}
