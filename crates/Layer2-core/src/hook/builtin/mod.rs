//! 내장 거버넌스 Hook
//!
//! - pre: `IntentValidationHook`, `ScopeEnforcementHook`, `ConcurrencyPreHook`
//! - post: `ConcurrencyPostHook`, `TraceLoggingHook`, `VerificationLessonHook`

mod concurrency;
mod intent;
mod lesson;
mod scope;
mod trace;

pub use concurrency::{ConcurrencyPostHook, ConcurrencyPreHook};
pub use intent::IntentValidationHook;
pub use lesson::{VerificationLessonHook, LESSONS_FILE};
pub use scope::ScopeEnforcementHook;
pub use trace::{TraceLoggingHook, TRACE_DIR, TRACE_FILE};

use sha2::{Digest, Sha256};

/// SHA-256 hex 다이제스트
pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}
