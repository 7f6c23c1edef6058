//! Tool call 스트림 디코딩
//!
//! - `partial_json`: 불완전한 JSON 최선 파싱
//! - `decoder`: 호출 id별 인자 누적과 부분/최종 해석
//! - `state`: 요청 단위 aggregator + decoder 상태

pub mod decoder;
pub mod partial_json;
pub mod state;

pub use decoder::ArgumentStreamDecoder;
pub use partial_json::parse_partial;
pub use state::{StreamUpdate, ToolCallStreamState};
