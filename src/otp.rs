//! One-time password challenges.
//!
//! A challenge is a 6-digit code bound to a user and an expiry. It is used
//! once to flag the account as verified.

use chrono::{DateTime, TimeDelta, Utc};
use rand::Rng;
use rand::rngs::OsRng;

const MIN_CODE: u32 = 100_000;
const MAX_CODE: u32 = 999_999;
pub const DEFAULT_EXPIRATION: u64 = 60 * 15; // 15 minutes.

/// Freshly generated challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Challenge {
    pub code: u32,
    pub expires_at: DateTime<Utc>,
}

/// Generates and checks OTP challenges.
#[derive(Debug, Clone)]
pub struct OtpManager {
    lifetime: TimeDelta,
    generator: fn() -> u32,
}

fn random_code() -> u32 {
    OsRng.gen_range(MIN_CODE..=MAX_CODE)
}

impl Default for OtpManager {
    fn default() -> Self {
        Self::new(DEFAULT_EXPIRATION)
    }
}

impl OtpManager {
    /// Create a new [`OtpManager`] with a lifetime in seconds.
    pub fn new(expiration: u64) -> Self {
        Self {
            lifetime: TimeDelta::seconds(expiration as i64),
            generator: random_code,
        }
    }

    /// Replace the code source.
    pub fn with_generator(mut self, generator: fn() -> u32) -> Self {
        self.generator = generator;
        self
    }

    /// Challenge lifetime.
    pub fn lifetime(&self) -> TimeDelta {
        self.lifetime
    }

    /// Issue a challenge valid from `now`.
    pub fn issue(&self, now: DateTime<Utc>) -> Challenge {
        Challenge {
            code: (self.generator)(),
            expires_at: now + self.lifetime,
        }
    }

    /// Check a submitted code against the stored one.
    ///
    /// A missing stored code or expiry never matches. The expiry instant
    /// itself is still accepted.
    pub fn verify(
        &self,
        stored: Option<u32>,
        expires_at: Option<DateTime<Utc>>,
        submitted: u32,
        now: DateTime<Utc>,
    ) -> bool {
        match (stored, expires_at) {
            (Some(code), Some(expires_at)) => {
                code == submitted && now <= expires_at
            },
            _ => false,
        }
    }
}

/// Mail subject for a challenge.
pub const SUBJECT: &str = "Your OTP Code";

/// Mail body for a challenge.
pub fn message(challenge: &Challenge, lifetime: TimeDelta) -> String {
    format!(
        "Your OTP code is {}. It is valid for {} minutes.",
        challenge.code,
        lifetime.num_minutes()
    )
}
