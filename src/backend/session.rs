use std::fmt;

/// The authenticated user a request (or a poller) acts on behalf of.
///
/// Resolved once when a request enters the API and passed down explicitly;
/// nothing below the router looks up auth state on its own.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CurrentSession {
    access_token: String,
}

impl CurrentSession {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
        }
    }

    /// Parse an `Authorization` header value. Only non-empty bearer tokens count.
    pub fn from_authorization(header: &str) -> Option<Self> {
        let token = header.strip_prefix("Bearer ")?.trim();
        if token.is_empty() {
            return None;
        }
        Some(Self::new(token))
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }
}

impl fmt::Debug for CurrentSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurrentSession")
            .field("access_token", &"<redacted>")
            .finish()
    }
}
