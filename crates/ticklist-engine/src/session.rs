// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use ticklist_api::{Client, RequestError};

const MIN_PASSWORD_LEN: usize = 3;

/// Derives the authenticated/unauthenticated status from the credential
/// store and exposes the login/logout transitions. Whether the sync engine
/// may run at all is gated on this.
pub struct SessionGate<'a> {
    client: &'a Client,
}

impl<'a> SessionGate<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Authenticated iff a token is stored; the token itself is opaque.
    pub fn is_authenticated(&self) -> bool {
        self.client.credentials().get().is_some()
    }

    pub fn login(&self, username: &str, password: &str) -> Result<(), RequestError> {
        if username.trim().is_empty() {
            return Err(RequestError::Validation(
                "username must not be empty".to_owned(),
            ));
        }
        if password.trim().is_empty() {
            return Err(RequestError::Validation(
                "password must not be empty".to_owned(),
            ));
        }
        self.client.login(username, password)
    }

    pub fn register(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<(), RequestError> {
        if email.trim().is_empty() {
            return Err(RequestError::Validation(
                "email must not be empty".to_owned(),
            ));
        }
        if username.trim().is_empty() {
            return Err(RequestError::Validation(
                "username must not be empty".to_owned(),
            ));
        }
        if password.trim().is_empty() {
            return Err(RequestError::Validation(
                "password must not be empty".to_owned(),
            ));
        }
        if !plausible_email(email) {
            return Err(RequestError::Validation(
                "email address is not valid".to_owned(),
            ));
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(RequestError::Validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        self.client.register(email, username, password)
    }

    /// Clears the stored credential. The owning application discards its view
    /// state alongside.
    pub fn logout(&self) -> Result<(), RequestError> {
        log::debug!("logout; clearing stored token");
        self.client
            .credentials()
            .clear()
            .map_err(|error| RequestError::Credential(error.to_string()))
    }
}

/// Minimal local shape check: something@domain.tld, no whitespace. The server
/// remains the authority on what an acceptable address is.
fn plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() {
        return false;
    }
    if email.chars().any(char::is_whitespace) || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::{SessionGate, plausible_email};
    use anyhow::Result;
    use std::time::Duration;
    use ticklist_api::{Client, MemoryStore, RequestError};

    fn offline_client() -> Result<Client> {
        // Validation happens before the network, so an unreachable base URL
        // is fine here.
        Client::new(
            "http://127.0.0.1:1/api",
            Duration::from_millis(50),
            Box::new(MemoryStore::default()),
        )
    }

    #[test]
    fn plausible_email_accepts_common_shapes() {
        assert!(plausible_email("alice@example.com"));
        assert!(plausible_email("a.b+c@mail.example.org"));
    }

    #[test]
    fn plausible_email_rejects_malformed_addresses() {
        for bad in ["", "alice", "alice@", "@example.com", "a b@x.com", "alice@nodot"] {
            assert!(!plausible_email(bad), "expected rejection for {bad:?}");
        }
    }

    #[test]
    fn login_validates_blank_fields_locally() -> Result<()> {
        let client = offline_client()?;
        let gate = SessionGate::new(&client);

        let error = gate.login("  ", "pw").expect_err("blank username");
        assert!(matches!(error, RequestError::Validation(_)));

        let error = gate.login("alice", "").expect_err("blank password");
        assert!(matches!(error, RequestError::Validation(_)));
        assert!(!gate.is_authenticated());
        Ok(())
    }

    #[test]
    fn register_validates_email_and_password_length() -> Result<()> {
        let client = offline_client()?;
        let gate = SessionGate::new(&client);

        let error = gate
            .register("not-an-email", "alice", "pw3")
            .expect_err("bad email");
        assert!(matches!(error, RequestError::Validation(_)));

        let error = gate
            .register("alice@example.com", "alice", "pw")
            .expect_err("short password");
        assert!(matches!(error, RequestError::Validation(_)));
        Ok(())
    }

    #[test]
    fn logout_clears_authenticated_status() -> Result<()> {
        use ticklist_api::CredentialStore;

        let store = MemoryStore::default();
        store.set("abc")?;
        let client = Client::new(
            "http://127.0.0.1:1/api",
            Duration::from_millis(50),
            Box::new(store),
        )?;
        let gate = SessionGate::new(&client);

        assert!(gate.is_authenticated());
        gate.logout()?;
        assert!(!gate.is_authenticated());
        Ok(())
    }
}
