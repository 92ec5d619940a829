//! Caller context for catalog operations.

/// The identity and query a catalog operation runs on behalf of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    user: String,
    query_id: String,
}

impl Session {
    /// Creates a session.
    #[must_use]
    pub fn new(user: impl Into<String>, query_id: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            query_id: query_id.into(),
        }
    }

    /// The session user; owner of objects created under per-object security.
    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    /// ID of the query that issued the operation.
    #[must_use]
    pub fn query_id(&self) -> &str {
        &self.query_id
    }
}
