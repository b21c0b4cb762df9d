//! Email verification codes
//!
//! Codes live in a process-scoped map with a fixed TTL. Expired entries are
//! rejected on use and evicted by a periodic sweep. Delivering the code by
//! email happens outside this service.

mod codes;

pub use codes::{
    VerificationCodeStore, VerificationError, DEFAULT_CODE_LENGTH, DEFAULT_CODE_TTL,
    DEFAULT_MAX_ATTEMPTS,
};
