//! User accounts and login state.
//!
//! Passwords arrive already hashed by the client; the hash is stored and
//! compared verbatim.

use std::collections::HashMap;

#[derive(Debug, Clone)]
struct Account {
    password_hash: String,
    online: bool,
}

#[derive(Debug, Default)]
pub struct Accounts {
    accounts: HashMap<String, Account>,
}

impl Accounts {
    pub fn new() -> Self {
        Accounts::default()
    }

    /// Returns `false` if the username is taken.
    pub fn register(&mut self, username: &str, password_hash: &str) -> bool {
        if self.accounts.contains_key(username) {
            return false;
        }
        self.accounts.insert(
            username.to_string(),
            Account {
                password_hash: password_hash.to_string(),
                online: false,
            },
        );
        true
    }

    /// Returns `true` and marks the user online if the hash matches.
    pub fn login(&mut self, username: &str, password_hash: &str) -> bool {
        match self.accounts.get_mut(username) {
            Some(account) if account.password_hash == password_hash => {
                account.online = true;
                true
            }
            _ => false,
        }
    }

    /// Returns `false` if the user was not online.
    pub fn logout(&mut self, username: &str) -> bool {
        match self.accounts.get_mut(username) {
            Some(account) if account.online => {
                account.online = false;
                true
            }
            _ => false,
        }
    }

    pub fn is_online(&self, username: &str) -> bool {
        self.accounts.get(username).is_some_and(|a| a.online)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}
