//! Bearer credential

use serde::{Deserialize, Serialize};
use std::fmt;

/// Bearer token authorising requests on behalf of one simulated user
///
/// Obtained once per run or per user. Its lifetime is governed by the
/// backend's session policy; nothing here refreshes it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for the `Authorization` header
    pub fn token(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential(<{} chars>)", self.0.len())
    }
}

/// Login pair for one simulated user
#[derive(Clone, PartialEq, Eq)]
pub struct Account {
    pub email: String,
    pub password: String,
}

impl Account {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Parses a comma-separated `email:password` list
    ///
    /// Blank entries are skipped. The password may itself contain colons.
    pub fn parse_list(input: &str) -> Result<Vec<Account>, String> {
        input
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| match entry.split_once(':') {
                Some((email, password)) if !email.is_empty() => Ok(Account::new(email, password)),
                _ => Err(format!("invalid account entry '{}', expected email:password", entry)),
            })
            .collect()
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_token() {
        let credential = Credential::new("secret-token");
        let printed = format!("{:?}", credential);
        assert!(!printed.contains("secret"));
        assert_eq!(credential.token(), "secret-token");
    }

    #[test]
    fn test_parse_account_list() {
        let accounts = Account::parse_list("user1@test.com:pw1, user2@test.com:p:w2,").unwrap();
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].email, "user1@test.com");
        assert_eq!(accounts[1].password, "p:w2");

        assert!(Account::parse_list("no-colon").is_err());
        assert!(Account::parse_list(":pw").is_err());
        assert!(!format!("{:?}", accounts[0]).contains("pw1"));
    }
}
