//! Collision-checked short ids.
//!
//! A candidate is a prefix of the md5 hex digest of the seed. When it is
//! already taken, the seed is salted with the attempt index and hashed again,
//! for a bounded number of attempts.

use crate::error::SqlResult;

/// Default number of hashing attempts before giving up.
pub const DEFAULT_MAX_ID_ATTEMPTS: usize = 15;

/// Length of an md5 hex digest; longer ids are clamped to it.
pub const MAX_ID_LENGTH: usize = 32;

/// Settings for [`Runner::unique_id`](crate::Runner::unique_id).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniqueIdConfig {
    pub length: usize,
    pub max_attempts: usize,
}

impl Default for UniqueIdConfig {
    fn default() -> Self {
        Self {
            length: 10,
            max_attempts: DEFAULT_MAX_ID_ATTEMPTS,
        }
    }
}

impl UniqueIdConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn length(mut self, length: usize) -> Self {
        self.length = length;
        self
    }

    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts;
        self
    }
}

/// Candidate id for a given attempt.
///
/// Attempt 0 hashes the seed itself; attempt `i > 0` hashes `seed + i`.
pub fn candidate(seed: &str, attempt: usize, length: usize) -> String {
    let digest = if attempt == 0 {
        md5::compute(seed.as_bytes())
    } else {
        md5::compute(format!("{seed}{attempt}").as_bytes())
    };
    let mut hex = format!("{digest:x}");
    hex.truncate(length.min(MAX_ID_LENGTH));
    hex
}

/// Generate an id for which `exists` returns false.
///
/// Returns `None` when every one of `max_attempts` candidates collides.
pub fn generate_unique_id<F>(
    seed: &str,
    length: usize,
    mut exists: F,
    max_attempts: usize,
) -> Option<String>
where
    F: FnMut(&str) -> bool,
{
    (0..max_attempts)
        .map(|attempt| candidate(seed, attempt, length))
        .find(|id| !exists(id))
}

/// Like [`generate_unique_id`], with a fallible existence check.
pub fn try_generate_unique_id<F>(
    seed: &str,
    length: usize,
    mut exists: F,
    max_attempts: usize,
) -> SqlResult<Option<String>>
where
    F: FnMut(&str) -> SqlResult<bool>,
{
    for attempt in 0..max_attempts {
        let id = candidate(seed, attempt, length);
        if !exists(&id)? {
            return Ok(Some(id));
        }
        tracing::trace!(target: "sqlmark.sql", attempt, id = %id, "unique id collision");
    }
    Ok(None)
}
