//! Secrets needed to serve answers: the generation API key and the login
//! pair checked before a session starts. Building an index needs none of them.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    #[serde(deserialize_with = "secret_text")]
    pub api_key: Option<String>,
    #[serde(deserialize_with = "secret_text")]
    pub username: Option<String>,
    #[serde(deserialize_with = "secret_text")]
    pub password: Option<String>,
}

/// Environment providers parse `123456` as a number; secrets stay text.
#[derive(Deserialize)]
#[serde(untagged)]
enum SecretValue {
    Text(String),
    Unsigned(u64),
    Signed(i64),
    Float(f64),
    Bool(bool),
}

fn secret_text<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<String>, D::Error> {
    Ok(Option::<SecretValue>::deserialize(deserializer)?.map(|value| match value {
        SecretValue::Text(s) => s,
        SecretValue::Unsigned(n) => n.to_string(),
        SecretValue::Signed(n) => n.to_string(),
        SecretValue::Float(n) => n.to_string(),
        SecretValue::Bool(b) => b.to_string(),
    }))
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &redact(self.api_key.as_deref()))
            .field("username", &self.username)
            .field("password", &redact(self.password.as_deref()))
            .finish()
    }
}

impl Credentials {
    /// Every credential must be present and non-blank; the error lists all
    /// missing ones at once.
    pub fn require_for_serving(&self) -> Result<ServingCredentials> {
        let api_key = present(self.api_key.as_deref());
        let username = present(self.username.as_deref());
        let password = present(self.password.as_deref());

        match (api_key, username, password) {
            (Some(api_key), Some(username), Some(password)) => Ok(ServingCredentials {
                api_key: api_key.to_string(),
                username: username.to_string(),
                password: password.to_string(),
            }),
            (api_key, username, password) => {
                let mut missing = Vec::new();
                if api_key.is_none() {
                    missing.push("api_key");
                }
                if username.is_none() {
                    missing.push("username");
                }
                if password.is_none() {
                    missing.push("password");
                }
                Err(Error::MissingCredentials(missing))
            }
        }
    }
}

/// Credentials validated for serving. Values are stored trimmed.
#[derive(Clone)]
pub struct ServingCredentials {
    api_key: String,
    username: String,
    password: String,
}

impl std::fmt::Debug for ServingCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServingCredentials")
            .field("api_key", &"***")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

impl ServingCredentials {
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Surrounding whitespace is ignored on both sides of the comparison.
    pub fn authenticate(&self, username: &str, password: &str) -> bool {
        username.trim() == self.username && password.trim() == self.password
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn redact(value: Option<&str>) -> Option<&'static str> {
    value.map(|_| "***")
}
