use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    #[error("charset must not be empty")]
    EmptyCharset,
    #[error("charset {0:?} is not a valid HTTP token")]
    InvalidCharset(String),
    #[error("credentials must carry a non-empty username")]
    EmptyUsername,
    #[error("username {0:?} must not contain ':'")]
    ColonInUsername(String),
}

/// Username and password attached to a client's transport.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, KeyError> {
        let username = username.into();
        if username.trim().is_empty() {
            return Err(KeyError::EmptyUsername);
        }
        // Basic auth splits user-id and password on the first colon.
        if username.contains(':') {
            return Err(KeyError::ColonInUsername(username));
        }
        Ok(Self {
            username,
            password: password.into(),
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Canonical, lower-case name of a text encoding, as advertised in `Accept-Charset`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Charset(String);

impl Charset {
    pub fn new(label: &str) -> Result<Self, KeyError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(KeyError::EmptyCharset);
        }
        if !label.bytes().all(is_token_byte) {
            return Err(KeyError::InvalidCharset(label.to_string()));
        }
        let lower = label.to_ascii_lowercase();
        let canonical = canonical_alias(&lower).map(str::to_string).unwrap_or(lower);
        Ok(Self(canonical))
    }

    pub fn utf8() -> Self {
        Self("utf-8".to_string())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl Default for Charset {
    fn default() -> Self {
        Self::utf8()
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// RFC 9110 tchar
fn is_token_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&byte)
}

fn canonical_alias(label: &str) -> Option<&'static str> {
    let canonical = match label {
        "utf8" | "unicode-1-1-utf-8" => "utf-8",
        "utf16" | "utf-16le" | "unicode" => "utf-16",
        "latin1" | "latin-1" | "l1" | "iso8859-1" | "iso_8859-1" => "iso-8859-1",
        "ascii" | "us_ascii" | "ansi_x3.4-1968" => "us-ascii",
        "cp1252" | "windows1252" => "windows-1252",
        _ => return None,
    };
    Some(canonical)
}

/// Identity of one client configuration.
///
/// Two keys are equal when both their credentials and charset are equal, and
/// the cache hands out one shared client per distinct key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientProperties {
    credentials: Option<Credentials>,
    charset: Charset,
}

impl ClientProperties {
    pub fn new(credentials: Option<Credentials>, charset: Charset) -> Self {
        Self {
            credentials,
            charset,
        }
    }

    pub fn anonymous(charset: Charset) -> Self {
        Self::new(None, charset)
    }

    pub fn with_credentials(credentials: Credentials, charset: Charset) -> Self {
        Self::new(Some(credentials), charset)
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn charset(&self) -> &Charset {
        &self.charset
    }
}
