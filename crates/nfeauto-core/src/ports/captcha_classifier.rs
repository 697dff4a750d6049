//! CAPTCHA 분류기 포트.
//!
//! 지정 영역 이미지의 CAPTCHA 유형 판별과 텍스트형 자동 해결 시도를 추상화한다.
//! 자동 해결은 의도적으로 미구현된 확장 지점이며, 현재 구현체는 항상 None을
//! 반환하여 수동 개입 대기로 넘어간다.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// CAPTCHA 유형
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptchaKind {
    /// 텍스트형 (왜곡 문자)
    Text,
    /// 이미지형 (사진 선택 등)
    Image,
    /// 판별 불가
    Unknown,
}

impl std::fmt::Display for CaptchaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            CaptchaKind::Text => "text",
            CaptchaKind::Image => "image",
            CaptchaKind::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// CAPTCHA 분류기 — 영역 이미지 분석 인터페이스
///
/// 구현체: `CaptchaProbe` (에지 밀도/색 다양성 휴리스틱), `NoOpCaptchaClassifier`
#[async_trait]
pub trait CaptchaClassifier: Send + Sync {
    /// 영역 이미지(PNG 바이트)의 CAPTCHA 유형 판별
    ///
    /// 분석 실패는 에러가 아니라 `Unknown`으로 보고한다.
    async fn classify(&self, image: &[u8]) -> Result<CaptchaKind, CoreError>;

    /// 텍스트형 CAPTCHA 자동 해결 시도
    ///
    /// None이면 수동 개입이 필요하다.
    async fn solve_text(&self, image: &[u8]) -> Result<Option<String>, CoreError>;
}

/// 아무것도 분석하지 않는 분류기 — 항상 Unknown/None
#[derive(Debug, Default)]
pub struct NoOpCaptchaClassifier;

#[async_trait]
impl CaptchaClassifier for NoOpCaptchaClassifier {
    async fn classify(&self, _image: &[u8]) -> Result<CaptchaKind, CoreError> {
        Ok(CaptchaKind::Unknown)
    }

    async fn solve_text(&self, _image: &[u8]) -> Result<Option<String>, CoreError> {
        Ok(None)
    }
}
