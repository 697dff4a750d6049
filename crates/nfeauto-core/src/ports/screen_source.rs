//! 화면 소스 포트.
//!
//! 전체 화면 또는 영역 캡처 인터페이스를 정의한다.
//! 코어 크레이트는 이미지 타입에 의존하지 않으므로 PNG 바이트로 주고받는다.

use async_trait::async_trait;

use crate::error::CoreError;

/// 화면 소스 — 스크린샷 획득 인터페이스
///
/// 구현체: `ScreenCapture` (xcap), 테스트용 합성 이미지 소스
#[async_trait]
pub trait ScreenSource: Send + Sync {
    /// 주 모니터 전체 캡처 (PNG 바이트)
    async fn capture_full(&self) -> Result<Vec<u8>, CoreError>;

    /// 영역 캡처 (PNG 바이트)
    ///
    /// 영역이 화면을 벗어나면 화면 경계로 잘라낸다.
    async fn capture_region(&self, x: i32, y: i32, width: u32, height: u32)
        -> Result<Vec<u8>, CoreError>;

    /// 주 모니터 해상도 (width, height)
    async fn screen_size(&self) -> Result<(u32, u32), CoreError>;
}
