use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};

use crate::error::{Result, StumpError};

/// Supplies the headers attached to every Stump request, including the
/// websocket upgrade of the event subscription.
pub trait StumpAuthProvider: Send + Sync {
    fn auth_headers(&self) -> HeaderMap;
}

/// Bearer API key authentication
#[derive(Clone)]
pub struct ApiKeyAuthProvider {
    value: HeaderValue,
}

impl ApiKeyAuthProvider {
    pub fn new(api_key: &str) -> Result<Self> {
        let mut value = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|_| StumpError::Config("API key is not a valid header value".into()))?;
        value.set_sensitive(true);
        Ok(Self { value })
    }
}

impl StumpAuthProvider for ApiKeyAuthProvider {
    fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, self.value.clone());
        headers
    }
}

impl std::fmt::Debug for ApiKeyAuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyAuthProvider").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_header() {
        let auth = ApiKeyAuthProvider::new("secret").unwrap();
        let headers = auth.auth_headers();
        let value = &headers[AUTHORIZATION];
        assert_eq!(value.to_str().unwrap(), "Bearer secret");
        assert!(value.is_sensitive());
    }

    #[test]
    fn test_rejects_control_characters() {
        assert!(ApiKeyAuthProvider::new("bad\nkey").is_err());
    }

    #[test]
    fn test_debug_hides_key() {
        let auth = ApiKeyAuthProvider::new("secret").unwrap();
        assert!(!format!("{auth:?}").contains("secret"));
    }
}
