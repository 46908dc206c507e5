use super::UserId;
use serde::{Deserialize, Serialize};

/// Authentication state change reported by the auth provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthEvent {
    /// Session restored at startup (None when nobody is signed in)
    InitialSession(Option<UserId>),
    /// A user signed in
    SignedIn(UserId),
    /// The access token was refreshed for the same user
    TokenRefreshed(UserId),
    /// The session ended
    SignedOut,
}

impl AuthEvent {
    /// The user holding a session after this event, if any
    pub fn session_user(&self) -> Option<&UserId> {
        match self {
            AuthEvent::InitialSession(user) => user.as_ref(),
            AuthEvent::SignedIn(user) | AuthEvent::TokenRefreshed(user) => Some(user),
            AuthEvent::SignedOut => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_user_per_event() {
        let u = UserId::new("u1");
        assert_eq!(AuthEvent::SignedIn(u.clone()).session_user(), Some(&u));
        assert_eq!(AuthEvent::TokenRefreshed(u.clone()).session_user(), Some(&u));
        assert_eq!(AuthEvent::InitialSession(None).session_user(), None);
        assert_eq!(AuthEvent::SignedOut.session_user(), None);
    }
}
