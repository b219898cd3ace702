use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// The authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// An authenticated session as persisted under the `auth-session` key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    /// Absolute expiry of the access token
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

/// Refresh this long before the access token actually expires
const EXPIRY_MARGIN_SECS: i64 = 30;

impl Session {
    /// True if the access token is expired (or about to be) at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - Duration::seconds(EXPIRY_MARGIN_SECS) <= now
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Session-change notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthChange {
    SignedIn(Session),
    TokenRefreshed(Session),
    SignedOut,
}

impl AuthChange {
    /// The session after this change
    pub fn session(&self) -> Option<&Session> {
        match self {
            AuthChange::SignedIn(s) | AuthChange::TokenRefreshed(s) => Some(s),
            AuthChange::SignedOut => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_expiring(at: DateTime<Utc>) -> Session {
        Session {
            access_token: "a".into(),
            refresh_token: "r".into(),
            expires_at: at,
            user: User {
                id: "u1".into(),
                email: Some("a@b.c".into()),
            },
        }
    }

    #[test]
    fn expiry_uses_margin() {
        let now = Utc::now();
        assert!(session_expiring(now + Duration::seconds(10)).is_expired_at(now));
        assert!(!session_expiring(now + Duration::seconds(3600)).is_expired_at(now));
    }
}
