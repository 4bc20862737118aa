//! Admin session gate
//!
//! Credentials come from the build environment and are compared in the
//! browser, so this only hides the moderation screens from casual visitors.
//! It is not an access-control boundary.

use thiserror::Error;

/// Login failures (Display is shown on the login form)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdminError {
    #[error("Admin access is not configured.")]
    NotConfigured,
    #[error("Invalid username or password.")]
    InvalidCredentials,
}

/// Configured admin credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminGate {
    credentials: Option<(String, String)>,
}

impl AdminGate {
    /// sessionStorage key holding the authenticated flag
    #[allow(dead_code)]
    const SESSION_KEY: &'static str = "admin_authenticated";

    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        let username = username.into();
        let password = password.into();
        let credentials = if username.is_empty() || password.is_empty() {
            None
        } else {
            Some((username, password))
        };
        Self { credentials }
    }

    /// Gate configured from `ADMIN_USERNAME` / `ADMIN_PASSWORD` at build time
    pub fn from_build_env() -> Self {
        Self::new(
            option_env!("ADMIN_USERNAME").unwrap_or_default(),
            option_env!("ADMIN_PASSWORD").unwrap_or_default(),
        )
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    /// Compare form input against the configured credentials
    pub fn check(&self, username: &str, password: &str) -> Result<(), AdminError> {
        let (expected_user, expected_pass) =
            self.credentials.as_ref().ok_or(AdminError::NotConfigured)?;
        if username.trim() == expected_user.as_str() && password == expected_pass.as_str() {
            Ok(())
        } else {
            log::warn!("Rejected admin login for {:?}", username.trim());
            Err(AdminError::InvalidCredentials)
        }
    }

    /// Check credentials and persist the session flag
    pub fn login(&self, username: &str, password: &str) -> Result<(), AdminError> {
        self.check(username, password)?;
        Self::store_session(true);
        log::info!("Admin session started");
        Ok(())
    }

    pub fn logout() {
        Self::store_session(false);
        log::info!("Admin session ended");
    }

    #[cfg(target_arch = "wasm32")]
    pub fn is_authenticated() -> bool {
        crate::platform::storage::session_storage()
            .and_then(|s| s.get_item(Self::SESSION_KEY).ok().flatten())
            .is_some_and(|v| v == "true")
    }

    #[cfg(target_arch = "wasm32")]
    fn store_session(authenticated: bool) {
        if let Some(storage) = crate::platform::storage::session_storage() {
            let _ = if authenticated {
                storage.set_item(Self::SESSION_KEY, "true")
            } else {
                storage.remove_item(Self::SESSION_KEY)
            };
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn is_authenticated() -> bool {
        false
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn store_session(_authenticated: bool) {
        // No session storage on native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_credentials() {
        let gate = AdminGate::new("admin", "s3cret");
        assert!(gate.is_configured());
        assert_eq!(gate.check("admin", "s3cret"), Ok(()));
        assert_eq!(gate.check(" admin ", "s3cret"), Ok(()));
        assert_eq!(
            gate.check("admin", "S3cret"),
            Err(AdminError::InvalidCredentials)
        );
        assert_eq!(
            gate.check("root", "s3cret"),
            Err(AdminError::InvalidCredentials)
        );
    }

    #[test]
    fn test_unconfigured_gate_rejects_everything() {
        let gate = AdminGate::new("", "");
        assert!(!gate.is_configured());
        assert_eq!(gate.check("", ""), Err(AdminError::NotConfigured));
        assert_eq!(gate.login("admin", "x"), Err(AdminError::NotConfigured));
    }

    #[test]
    fn test_native_login_has_no_session() {
        let gate = AdminGate::new("admin", "pw");
        assert_eq!(gate.login("admin", "pw"), Ok(()));
        assert!(!AdminGate::is_authenticated());
        AdminGate::logout();
    }
}
