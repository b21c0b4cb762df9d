//! Expiring store of numeric email verification codes

use dashmap::DashMap;
use rand::rngs::OsRng;
use rand::Rng;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_CODE_LENGTH: usize = 6;
pub const DEFAULT_CODE_TTL: Duration = Duration::from_secs(10 * 60);
/// Wrong guesses tolerated before a pending code is revoked
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    #[error("no verification code pending for this address")]
    NoPendingCode,

    #[error("verification code expired")]
    Expired,

    #[error("verification code does not match")]
    Mismatch,

    #[error("too many failed attempts, request a new code")]
    TooManyAttempts,
}

#[derive(Debug, Clone)]
struct IssuedCode {
    code: String,
    issued_at: Instant,
    attempts: u32,
}

#[derive(Debug)]
pub struct VerificationCodeStore {
    /// normalized email -> pending code
    codes: DashMap<String, IssuedCode>,
    ttl: Duration,
    code_length: usize,
    max_attempts: u32,
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

impl VerificationCodeStore {
    pub fn new(ttl: Duration, code_length: usize) -> Self {
        Self {
            codes: DashMap::new(),
            ttl,
            code_length,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Digits only; leading zeros are kept
    fn generate_code(&self) -> String {
        let mut rng = OsRng;
        (0..self.code_length)
            .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
            .collect()
    }

    /// Issue a fresh code for `email`, replacing any pending one
    pub fn issue(&self, email: &str) -> String {
        let code = self.generate_code();
        self.codes.insert(
            normalize(email),
            IssuedCode {
                code: code.clone(),
                issued_at: Instant::now(),
                attempts: 0,
            },
        );
        code
    }

    /// Check `code` against the pending one. A match consumes it; running
    /// out of attempts or finding it expired revokes it.
    pub fn verify(&self, email: &str, code: &str) -> Result<(), VerificationError> {
        let key = normalize(email);

        let (issued_at, verdict) = {
            let mut current = self
                .codes
                .get_mut(&key)
                .ok_or(VerificationError::NoPendingCode)?;

            let verdict = if current.issued_at.elapsed() >= self.ttl {
                Err(VerificationError::Expired)
            } else if current.code != code.trim() {
                current.attempts += 1;
                if current.attempts >= self.max_attempts {
                    Err(VerificationError::TooManyAttempts)
                } else {
                    Err(VerificationError::Mismatch)
                }
            } else {
                Ok(())
            };
            (current.issued_at, verdict)
        };

        if verdict == Err(VerificationError::TooManyAttempts) {
            warn!(
                max_attempts = self.max_attempts,
                "Verification code revoked after failed attempts"
            );
        }
        if verdict != Err(VerificationError::Mismatch) {
            self.retire(&key, issued_at);
        }
        verdict
    }

    /// Remove the code issued at `issued_at`; a code re-issued meanwhile stays
    fn retire(&self, key: &str, issued_at: Instant) -> bool {
        self.codes
            .remove_if(key, |_, current| current.issued_at == issued_at)
            .is_some()
    }

    /// Drop expired codes; returns how many were evicted
    pub fn purge_expired(&self) -> usize {
        let before = self.codes.len();
        self.codes
            .retain(|_, issued| issued.issued_at.elapsed() < self.ttl);
        let evicted = before.saturating_sub(self.codes.len());
        if evicted > 0 {
            debug!(evicted, "Purged expired verification codes");
        }
        evicted
    }

    pub fn pending(&self) -> usize {
        self.codes.len()
    }
}

impl Default for VerificationCodeStore {
    fn default() -> Self {
        Self::new(DEFAULT_CODE_TTL, DEFAULT_CODE_LENGTH)
    }
}
