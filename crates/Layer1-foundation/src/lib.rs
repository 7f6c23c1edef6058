//! # warden-foundation
//!
//! Foundation layer for Warden:
//! - Error: 중앙 에러 타입
//! - Storage: JsonStore (글로벌 + 프로젝트)
//! - Config: 통합 설정 (WardenConfig, HookSettings)

pub mod config;
pub mod error;
pub mod storage;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Config (설정)
// ============================================================================
pub use config::{
    HookSettings, WardenConfig, DEFAULT_MODE, DEFAULT_REPETITION_LIMIT, WARDEN_CONFIG_FILE,
};

// ============================================================================
// Storage (저장소)
// ============================================================================
pub use storage::JsonStore;
