//! Per-request context passed through resolution and expansion.

use serde::{Deserialize, Serialize};

/// The authenticated identity on whose behalf assets are resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    /// User or service identifier.
    pub id: String,
    /// Administrators see every asset regardless of ownership.
    #[serde(default)]
    pub is_admin: bool,
}

impl Principal {
    /// Create a regular principal.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_admin: false,
        }
    }

    /// Create an administrator principal.
    pub fn admin(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_admin: true,
        }
    }
}

/// Request information the engine needs from its caller.
///
/// A context is created per incoming request. Expansion state is not stored
/// here; every top-level expansion keeps its own pass counter.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    principal: Option<Principal>,
    http_base_url: Option<String>,
}

impl RequestContext {
    /// Create an anonymous context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the requesting principal.
    pub fn with_principal(mut self, principal: Principal) -> Self {
        self.principal = Some(principal);
        self
    }

    /// Attach the base URL of the HTTP request that triggered rendering.
    pub fn with_http_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.http_base_url = Some(base_url.into());
        self
    }

    /// The requesting principal, if authenticated.
    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    /// The HTTP base URL, if the request came in over HTTP.
    pub fn http_base_url(&self) -> Option<&str> {
        self.http_base_url.as_deref()
    }
}
