//! Rate Limit Rules
//!
//! A rule pairs a request ceiling and window length with a way of deriving the
//! per-caller key. [`RateLimitRules`] holds the presets the service guards its
//! operations with.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Key used by rules that have no key generator.
pub const DEFAULT_KEY: &str = "default";

/// Context value substituted when a caller supplies none.
pub const UNKNOWN_CONTEXT: &str = "unknown";

// == Key Generator ==
/// Derives the limiter key from a call context such as an email or user id.
#[derive(Clone)]
pub enum KeyGenerator {
    /// `<prefix>:<context>`, with `unknown` for a missing or empty context
    Prefixed(String),
    /// Arbitrary derivation
    Custom(Arc<dyn Fn(Option<&str>) -> String + Send + Sync>),
}

impl KeyGenerator {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(Option<&str>) -> String + Send + Sync + 'static,
    {
        KeyGenerator::Custom(Arc::new(f))
    }

    pub fn generate(&self, context: Option<&str>) -> String {
        match self {
            KeyGenerator::Prefixed(prefix) => {
                let context = context
                    .filter(|c| !c.is_empty())
                    .unwrap_or(UNKNOWN_CONTEXT);
                format!("{prefix}:{context}")
            }
            KeyGenerator::Custom(f) => f(context),
        }
    }
}

impl fmt::Debug for KeyGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyGenerator::Prefixed(prefix) => f.debug_tuple("Prefixed").field(prefix).finish(),
            KeyGenerator::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

// == Rate Limit Rule ==
/// Ceiling of admitted requests per window for one kind of operation.
#[derive(Debug, Clone)]
pub struct RateLimitRule {
    /// Requests admitted per window
    pub max_requests: u32,
    /// Window length
    pub window: Duration,
    /// Per-caller key derivation; `None` limits every caller under one key
    pub key_generator: Option<KeyGenerator>,
}

impl RateLimitRule {
    /// Creates a rule with no key generator.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            key_generator: None,
        }
    }

    /// Creates a rule keyed as `<prefix>:<context>`.
    pub fn prefixed(prefix: impl Into<String>, max_requests: u32, window: Duration) -> Self {
        Self {
            key_generator: Some(KeyGenerator::Prefixed(prefix.into())),
            ..Self::new(max_requests, window)
        }
    }

    /// Replaces the key generator.
    pub fn with_key_generator(mut self, generator: KeyGenerator) -> Self {
        self.key_generator = Some(generator);
        self
    }

    /// Returns the limiter key for `context`.
    pub fn key_for(&self, context: Option<&str>) -> String {
        match &self.key_generator {
            Some(generator) => generator.generate(context),
            None => DEFAULT_KEY.to_string(),
        }
    }
}

// == Presets ==
/// Rules guarding the service's operations.
#[derive(Debug, Clone)]
pub struct RateLimitRules {
    /// Sign-up and sign-in attempts, keyed by email
    pub auth: RateLimitRule,
    pub transaction_create: RateLimitRule,
    pub category_create: RateLimitRule,
    pub profile_update: RateLimitRule,
    pub data_fetch: RateLimitRule,
}

impl RateLimitRules {
    /// All preset rules, for operations that span every rule.
    pub fn all(&self) -> [&RateLimitRule; 5] {
        [
            &self.auth,
            &self.transaction_create,
            &self.category_create,
            &self.profile_update,
            &self.data_fetch,
        ]
    }
}

impl Default for RateLimitRules {
    fn default() -> Self {
        const MINUTE: Duration = Duration::from_secs(60);

        Self {
            auth: RateLimitRule::prefixed("auth", 5, 15 * MINUTE),
            transaction_create: RateLimitRule::prefixed("transaction_create", 50, MINUTE),
            category_create: RateLimitRule::prefixed("category_create", 10, MINUTE),
            profile_update: RateLimitRule::prefixed("profile_update", 10, MINUTE),
            data_fetch: RateLimitRule::prefixed("data_fetch", 100, MINUTE),
        }
    }
}
