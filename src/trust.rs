use std::sync::{LazyLock, OnceLock};

use tracing::{debug, info};

static PROCESS_POLICY: LazyLock<ThumbprintPolicy> = LazyLock::new(ThumbprintPolicy::new);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrustError {
    #[error("trust policy was already initialized with a different thumbprint list")]
    AlreadyInitialized,
    #[error("invalid certificate thumbprint {0:?}")]
    InvalidThumbprint(String),
}

/// One-time setup of the certificate trust policy consulted during TLS handshakes.
pub trait TrustInitializer {
    fn initialize(&self, thumbprints: Vec<String>) -> Result<(), TrustError>;
}

impl<F> TrustInitializer for F
where
    F: Fn(Vec<String>) -> Result<(), TrustError>,
{
    fn initialize(&self, thumbprints: Vec<String>) -> Result<(), TrustError> {
        self(thumbprints)
    }
}

/// Allow-list of accepted certificate thumbprints that can be set exactly once.
///
/// Re-initializing with the same list is a no-op; a different list is
/// rejected instead of silently replacing the installed one.
#[derive(Debug, Default)]
pub struct ThumbprintPolicy {
    accepted: OnceLock<Vec<String>>,
}

impl ThumbprintPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// The policy shared by the whole process.
    pub fn global() -> &'static ThumbprintPolicy {
        &PROCESS_POLICY
    }

    pub fn is_initialized(&self) -> bool {
        self.accepted.get().is_some()
    }

    pub fn thumbprints(&self) -> Option<&[String]> {
        self.accepted.get().map(Vec::as_slice)
    }

    /// Whether a certificate with this thumbprint is trusted.
    ///
    /// Nothing is trusted before initialization.
    pub fn accepts(&self, thumbprint: &str) -> bool {
        let Ok(thumbprint) = normalize_thumbprint(thumbprint) else {
            return false;
        };
        self.accepted
            .get()
            .is_some_and(|accepted| accepted.contains(&thumbprint))
    }
}

impl TrustInitializer for ThumbprintPolicy {
    fn initialize(&self, thumbprints: Vec<String>) -> Result<(), TrustError> {
        let normalized = thumbprints
            .iter()
            .map(|raw| normalize_thumbprint(raw))
            .collect::<Result<Vec<_>, _>>()?;

        match self.accepted.set(normalized) {
            Ok(()) => {
                info!(count = thumbprints.len(), "initialized certificate trust policy");
                Ok(())
            }
            Err(rejected) if self.accepted.get() == Some(&rejected) => {
                debug!("certificate trust policy already initialized with the same thumbprints");
                Ok(())
            }
            Err(_) => Err(TrustError::AlreadyInitialized),
        }
    }
}

/// Upper-case hex form of a thumbprint, without separators.
///
/// Thumbprints copied from certificate viewers often carry spaces, colons, or
/// invisible direction marks; those are stripped.
pub fn normalize_thumbprint(raw: &str) -> Result<String, TrustError> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, ':' | '\u{200e}' | '\u{200f}' | '\u{feff}'))
        .map(|c| c.to_ascii_uppercase())
        .collect();

    if cleaned.is_empty() || !cleaned.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(TrustError::InvalidThumbprint(raw.to_string()));
    }
    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    const THUMB: &str = "A1B2C3D4E5F60718293A4B5C6D7E8F9012345678";

    #[test]
    fn normalizes_copied_thumbprints() {
        assert_eq!(
            normalize_thumbprint("\u{200e}a1 b2 c3").unwrap(),
            "A1B2C3".to_string()
        );
        assert_eq!(normalize_thumbprint("a1:b2:c3").unwrap(), "A1B2C3");
    }

    #[test]
    fn rejects_non_hex_thumbprints() {
        assert!(matches!(
            normalize_thumbprint("not-a-thumbprint"),
            Err(TrustError::InvalidThumbprint(_))
        ));
        assert!(matches!(
            normalize_thumbprint("  "),
            Err(TrustError::InvalidThumbprint(_))
        ));
    }

    #[test]
    fn accepts_only_after_initialization() {
        let policy = ThumbprintPolicy::new();
        assert!(!policy.accepts(THUMB));

        policy.initialize(vec![THUMB.to_lowercase()]).unwrap();

        assert!(policy.is_initialized());
        assert!(policy.accepts(THUMB));
        assert!(!policy.accepts("FFFF"));
        assert_eq!(policy.thumbprints(), Some(&[THUMB.to_string()][..]));
    }

    #[test]
    fn same_list_reinitializes_silently() {
        let policy = ThumbprintPolicy::new();
        policy.initialize(vec![THUMB.to_string()]).unwrap();
        policy.initialize(vec![THUMB.to_lowercase()]).unwrap();
    }

    #[test]
    fn conflicting_list_is_rejected() {
        let policy = ThumbprintPolicy::new();
        policy.initialize(vec![THUMB.to_string()]).unwrap();

        let err = policy.initialize(vec!["FFFF".to_string()]).unwrap_err();

        assert_eq!(err, TrustError::AlreadyInitialized);
        assert!(policy.accepts(THUMB));
    }

    #[test]
    fn invalid_thumbprint_leaves_policy_unset() {
        let policy = ThumbprintPolicy::new();
        let err = policy
            .initialize(vec![THUMB.to_string(), "zz".to_string()])
            .unwrap_err();

        assert_eq!(err, TrustError::InvalidThumbprint("zz".to_string()));
        assert!(!policy.is_initialized());
    }

    #[test]
    fn empty_list_trusts_nothing() {
        let policy = ThumbprintPolicy::new();
        policy.initialize(Vec::new()).unwrap();
        assert!(policy.is_initialized());
        assert!(!policy.accepts(THUMB));
    }
}
