//! NFEAUTO 핵심 에러 타입.
//!
//! 모든 어댑터 crate는 자체 에러 타입에서 `#[from] CoreError`로 래핑한다.

use thiserror::Error;

/// 코어 레이어 에러.
/// 직렬화, 설정, 유효성 검증 등 도메인 공통 에러를 정의한다.
#[derive(Debug, Error)]
pub enum CoreError {
    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 설정값 오류
    #[error("설정 에러: {0}")]
    Config(String),

    /// 필드 유효성 검증 실패
    #[error("유효성 검증 실패 — {field}: {message}")]
    Validation {
        /// 검증 실패한 필드명
        field: String,
        /// 실패 사유
        message: String,
    },

    /// 리소스를 찾을 수 없음
    #[error("{resource_type} 미발견: {id}")]
    NotFound {
        /// 리소스 종류 (예: "Coordinate", "KeyFile")
        resource_type: String,
        /// 리소스 식별자
        id: String,
    },

    /// 화면 캡처 실패
    #[error("화면 캡처 에러: {0}")]
    Capture(String),

    /// 입력 시뮬레이션 실패 (마우스/키보드)
    #[error("입력 시뮬레이션 에러: {0}")]
    Input(String),

    /// OCR 처리 실패
    #[error("OCR 에러: {0}")]
    OcrError(String),

    /// 네트워크 에러 (연결 실패, 타임아웃)
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_message() {
        let err = CoreError::Validation {
            field: "campo_chave".to_string(),
            message: "좌표가 (0, 0)입니다".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("campo_chave"));
        assert!(msg.contains("좌표가"));
    }

    #[test]
    fn io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "없음");
        let err: CoreError = io_err.into();
        assert!(matches!(err, CoreError::Io(_)));
    }

    #[test]
    fn serde_error_from() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{잘못된").unwrap_err();
        let err: CoreError = parse_err.into();
        assert!(err.to_string().starts_with("직렬화 에러"));
    }
}
