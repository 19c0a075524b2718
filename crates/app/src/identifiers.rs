//! Human-readable identifiers for orders, coupons and payments.
//!
//! The generator only draws candidates. Callers check each candidate against
//! persisted records and insert it under a unique constraint, moving on to the
//! next candidate when either step reports a collision. The number of
//! candidates per call is bounded so sustained collisions surface as an error
//! instead of a spinning request.

use std::{
    fmt,
    sync::{Mutex, PoisonError},
};

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, RngCore, SeedableRng, rngs::StdRng};
use thiserror::Error;

/// Prefix of generated order identifiers.
pub const ORDER_ID_PREFIX: &str = "KWEK-";

/// Random bytes behind an order identifier (64 bits).
pub const ORDER_ID_BYTES: usize = 8;

/// Prefix of generated coupon codes.
pub const COUPON_CODE_PREFIX: &str = "KW-";

/// Random characters in a coupon code (~41 bits).
pub const COUPON_CODE_LENGTH: usize = 8;

/// Alphabet coupon codes are drawn from.
pub const COUPON_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Random bytes behind a payment reference.
pub const PAYMENT_REF_BYTES: usize = 50;

/// Default number of candidates drawn before giving up.
pub const DEFAULT_MAX_ATTEMPTS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentifierKind {
    OrderId,
    CouponCode,
    PaymentRef,
}

impl IdentifierKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OrderId => "order_id",
            Self::CouponCode => "coupon_code",
            Self::PaymentRef => "payment_ref",
        }
    }

    /// Whether `value` has the shape this kind generates.
    #[must_use]
    pub fn matches(self, value: &str) -> bool {
        match self {
            Self::OrderId => value.strip_prefix(ORDER_ID_PREFIX).is_some_and(|token| {
                token.len() == encoded_len(ORDER_ID_BYTES) && token.bytes().all(is_url_safe)
            }),
            Self::CouponCode => value.strip_prefix(COUPON_CODE_PREFIX).is_some_and(|code| {
                code.len() == COUPON_CODE_LENGTH
                    && code.bytes().all(|b| COUPON_CODE_ALPHABET.contains(&b))
            }),
            Self::PaymentRef => {
                value.len() == encoded_len(PAYMENT_REF_BYTES) && value.bytes().all(is_url_safe)
            }
        }
    }
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// No free identifier was found within the attempt budget.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("no unique {kind} found after {attempts} attempts")]
pub struct UniquenessExhausted {
    pub kind: IdentifierKind,
    pub attempts: usize,
}

/// Draws identifier candidates from an injectable random source.
#[derive(Debug)]
pub struct IdentifierGenerator {
    rng: Mutex<StdRng>,
    max_attempts: usize,
}

impl IdentifierGenerator {
    /// Generator seeded from operating system entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Deterministic generator for tests and replays.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    #[must_use]
    pub fn from_rng(rng: StdRng) -> Self {
        Self {
            rng: Mutex::new(rng),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Override the attempt budget. A budget of zero is raised to one.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    #[must_use]
    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Draw a single candidate of the given kind.
    pub fn candidate(&self, kind: IdentifierKind) -> String {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);

        match kind {
            IdentifierKind::OrderId => {
                format!("{ORDER_ID_PREFIX}{}", url_safe_token(&mut *rng, ORDER_ID_BYTES))
            }
            IdentifierKind::CouponCode => {
                let code: String = (0..COUPON_CODE_LENGTH)
                    .map(|_| {
                        let index = rng.gen_range(0..COUPON_CODE_ALPHABET.len());

                        COUPON_CODE_ALPHABET.get(index).map_or('A', |b| char::from(*b))
                    })
                    .collect();

                format!("{COUPON_CODE_PREFIX}{code}")
            }
            IdentifierKind::PaymentRef => url_safe_token(&mut *rng, PAYMENT_REF_BYTES),
        }
    }

    /// Up to `max_attempts` fresh candidates of the given kind.
    pub fn candidates(&self, kind: IdentifierKind) -> impl Iterator<Item = String> + '_ {
        (0..self.max_attempts).map(move |_| self.candidate(kind))
    }

    /// Return the first candidate `is_taken` rejects as free.
    ///
    /// # Errors
    ///
    /// Returns [`UniquenessExhausted`] when every candidate within the budget is taken.
    pub fn generate(
        &self,
        kind: IdentifierKind,
        mut is_taken: impl FnMut(&str) -> bool,
    ) -> Result<String, UniquenessExhausted> {
        self.candidates(kind)
            .find(|candidate| !is_taken(candidate))
            .ok_or(self.exhausted(kind))
    }

    #[must_use]
    pub fn exhausted(&self, kind: IdentifierKind) -> UniquenessExhausted {
        UniquenessExhausted {
            kind,
            attempts: self.max_attempts,
        }
    }
}

impl Default for IdentifierGenerator {
    fn default() -> Self {
        Self::from_entropy()
    }
}

fn url_safe_token(rng: &mut impl RngCore, bytes: usize) -> String {
    let mut buf = vec![0_u8; bytes];

    rng.fill_bytes(&mut buf);

    URL_SAFE_NO_PAD.encode(buf)
}

const fn encoded_len(bytes: usize) -> usize {
    (bytes * 4).div_ceil(3)
}

fn is_url_safe(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}
