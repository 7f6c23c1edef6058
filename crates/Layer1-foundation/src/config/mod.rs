//! Config - 통합 설정 관리
//!
//! - `warden.rs` - WardenConfig 통합 설정 (모드, 도구 정책, Hook)

mod warden;

pub use warden::{
    HookSettings, WardenConfig, DEFAULT_MODE, DEFAULT_REPETITION_LIMIT, WARDEN_CONFIG_FILE,
};
