//! 화면 이미지 처리 유틸리티
//!
//! - 주 모니터 캡처 (xcap)
//! - 연결 성분 / 경계 추적 / 다각형 근사 기하 도구
//! - 색상 마스크 + 휴리스틱 점수 기반 요소 감지
//! - CAPTCHA 유형 분류
//! - 감지 결과 디버그 오버레이
//! - OCR 텍스트 추출 (leptess, feature = "ocr")

pub mod captcha;
pub mod capture;
pub mod contour;
pub mod detector;
pub mod local_ocr_provider;
#[cfg(feature = "ocr")]
pub mod ocr;
pub mod overlay;
