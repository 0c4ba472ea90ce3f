//! Client-side session: login state and pagination cursor.

use crate::error::{AuthError, ErrorCode, NotLoggedIn};

/// Position of the last page received for the current query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    pub cur_page_num: u32,
    pub per_page_count: u32,
}

impl PageCursor {
    /// The page after this one. `None` once the page number would overflow.
    pub fn next(&self) -> Option<Self> {
        Some(Self {
            cur_page_num: self.cur_page_num.checked_add(1)?,
            per_page_count: self.per_page_count,
        })
    }
}

/// Login state of one client.
///
/// Created with the client, mutated by login, logout and paginated fetches,
/// and dropped on disconnect. Not shared between clients.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    user_id: String,
    logged_in: bool,
    cursor: Option<PageCursor>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// The logged-in user, or `""`.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    /// Applies the server's answer to a login request.
    ///
    /// On success stores `user_id` and returns it. On failure the session is
    /// left as it was.
    pub fn login(
        &mut self,
        code: ErrorCode,
        message: &str,
        user_id: &str,
    ) -> Result<&str, AuthError> {
        if !code.is_success() {
            return Err(AuthError {
                code,
                message: message.to_string(),
            });
        }
        if user_id.is_empty() {
            return Err(AuthError {
                code: ErrorCode::UserInfoUnavailable,
                message: "server accepted login without a user id".to_string(),
            });
        }

        self.user_id = user_id.to_string();
        self.logged_in = true;
        self.cursor = None;
        Ok(&self.user_id)
    }

    /// Forgets the login. Calling it when already logged out is a no-op.
    pub fn logout(&mut self) {
        self.user_id.clear();
        self.logged_in = false;
        self.cursor = None;
    }

    pub fn require_login(&self) -> Result<(), NotLoggedIn> {
        if self.logged_in {
            Ok(())
        } else {
            Err(NotLoggedIn)
        }
    }

    pub fn cursor(&self) -> Option<PageCursor> {
        self.cursor
    }

    pub fn set_cursor(&mut self, cursor: PageCursor) {
        self.cursor = Some(cursor);
    }

    pub fn clear_cursor(&mut self) {
        self.cursor = None;
    }
}
