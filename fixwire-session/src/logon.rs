/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/3/26
******************************************************************************/

//! Logon strategies.
//!
//! A strategy is a pure function from the session configuration to the body
//! fields of the Logon (35=A) frame, emitted after the standard headers.
//! Strategies never see session state and cannot touch sequence numbers or
//! headers; anything beyond field assembly (HMAC signatures, one-time
//! tokens) composes by injecting values through `logon_fields`.

use crate::config::SessionConfig;
use fixwire_core::error::LogonError;
use std::fmt;

/// Produces the Logon body fields for one authentication scheme.
pub trait LogonStrategy: fmt::Debug + Send + Sync {
    /// Builds the ordered Logon body fields.
    ///
    /// # Errors
    /// Returns `LogonError` when a required parameter is absent from the
    /// configuration.
    fn build_logon_fields(&self, config: &SessionConfig)
        -> Result<Vec<(u32, String)>, LogonError>;
}

/// EncryptMethod=None, the configured heartbeat interval, and a mutual
/// sequence number reset.
fn base_fields(config: &SessionConfig) -> Vec<(u32, String)> {
    vec![
        (98, "0".to_string()),
        (108, config.heartbeat_interval_secs().to_string()),
        (141, "Y".to_string()),
    ]
}

/// Plain logon without credentials.
#[derive(Debug, Clone, Copy, Default)]
pub struct Standard;

impl LogonStrategy for Standard {
    fn build_logon_fields(
        &self,
        config: &SessionConfig,
    ) -> Result<Vec<(u32, String)>, LogonError> {
        Ok(base_fields(config))
    }
}

/// Logon carrying Username (553) and Password (554).
#[derive(Debug, Clone, Copy, Default)]
pub struct UsernamePassword;

impl LogonStrategy for UsernamePassword {
    fn build_logon_fields(
        &self,
        config: &SessionConfig,
    ) -> Result<Vec<(u32, String)>, LogonError> {
        let username = config
            .logon_fields
            .get("username")
            .ok_or(LogonError::MissingCredential { name: "username" })?;
        let password = config
            .logon_fields
            .get("password")
            .ok_or(LogonError::MissingCredential { name: "password" })?;

        let mut fields = base_fields(config);
        fields.push((553, username.clone()));
        fields.push((554, password.clone()));
        Ok(fields)
    }
}

/// Logon for delegated-identity setups.
///
/// OnBehalfOfCompID (115) and OnBehalfOfSubID (116) stay out of
/// administrative messages; the caller includes them in application
/// messages where the broker expects them.
#[derive(Debug, Clone, Copy, Default)]
pub struct OnBehalfOf;

impl LogonStrategy for OnBehalfOf {
    fn build_logon_fields(
        &self,
        config: &SessionConfig,
    ) -> Result<Vec<(u32, String)>, LogonError> {
        Ok(base_fields(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionKey;
    use fixwire_core::types::CompId;
    use std::time::Duration;

    fn config() -> SessionConfig {
        SessionConfig::new(
            SessionKey::new("test").unwrap(),
            "localhost",
            9876,
            CompId::new("CLIENT").unwrap(),
            CompId::new("BROKER").unwrap(),
        )
        .with_heartbeat_interval(Duration::from_secs(15))
    }

    #[test]
    fn test_standard_fields() {
        let fields = Standard.build_logon_fields(&config()).unwrap();
        assert_eq!(
            fields,
            vec![
                (98, "0".to_string()),
                (108, "15".to_string()),
                (141, "Y".to_string()),
            ]
        );
    }

    #[test]
    fn test_username_password_fields() {
        let config = config()
            .with_logon_field("username", "alice")
            .with_logon_field("password", "hunter2");

        let fields = UsernamePassword.build_logon_fields(&config).unwrap();
        assert_eq!(fields[3], (553, "alice".to_string()));
        assert_eq!(fields[4], (554, "hunter2".to_string()));
    }

    #[test]
    fn test_username_password_missing_credential() {
        let config = config().with_logon_field("username", "alice");
        assert_eq!(
            UsernamePassword.build_logon_fields(&config).unwrap_err(),
            LogonError::MissingCredential { name: "password" }
        );

        assert_eq!(
            UsernamePassword
                .build_logon_fields(&self::config())
                .unwrap_err(),
            LogonError::MissingCredential { name: "username" }
        );
    }

    #[test]
    fn test_on_behalf_of_excludes_delegation_tags() {
        let config = config()
            .with_logon_field("on_behalf_of_comp_id", "FUND-1")
            .with_logon_field("on_behalf_of_sub_id", "PM-9");

        let fields = OnBehalfOf.build_logon_fields(&config).unwrap();
        assert!(fields.iter().all(|(tag, _)| *tag != 115 && *tag != 116));
        assert_eq!(fields.len(), 3);
    }
}
