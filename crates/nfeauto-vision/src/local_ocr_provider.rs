//! 로컬 OCR 제공자 — Tesseract 래퍼.
//!
//! `OcrExtractor`를 `OcrProvider` 포트로 감싼다. `ocr` feature가 꺼져
//! 있으면 가용성 false를 보고하고, 감지기는 텍스트 점수를 중립값으로
//! 대체한다.

use std::path::PathBuf;

use async_trait::async_trait;

use nfeauto_core::error::CoreError;
use nfeauto_core::ports::ocr_provider::{OcrProvider, OcrResult};

// ============================================================
// LocalOcrProvider — Tesseract 래퍼
// ============================================================

/// 로컬 OCR 제공자 (Tesseract 기반)
pub struct LocalOcrProvider {
    /// Tesseract 데이터 경로 (None이면 시스템 기본값)
    tessdata_path: Option<PathBuf>,
}

impl LocalOcrProvider {
    /// 새 로컬 OCR 제공자 생성
    pub fn new() -> Self {
        Self {
            tessdata_path: None,
        }
    }

    /// tessdata 경로 지정
    pub fn with_tessdata_path(mut self, path: PathBuf) -> Self {
        self.tessdata_path = Some(path);
        self
    }
}

impl Default for LocalOcrProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OcrProvider for LocalOcrProvider {
    async fn extract_elements(
        &self,
        image: &[u8],
        _image_format: &str,
    ) -> Result<Vec<OcrResult>, CoreError> {
        #[cfg(feature = "ocr")]
        {
            use crate::ocr::OcrExtractor;

            let img = image::load_from_memory(image)
                .map_err(|e| CoreError::OcrError(format!("이미지 디코딩 실패: {e}")))?;

            let extractor = OcrExtractor::new(self.tessdata_path.clone());
            let word_boxes = extractor
                .extract_words_with_boxes(&img)
                .await
                .map_err(|e| CoreError::OcrError(format!("OCR 추출 실패: {e}")))?;

            // OcrWordBox → OcrResult 변환
            Ok(word_boxes
                .into_iter()
                .map(|wb| OcrResult {
                    text: wb.text,
                    x: wb.x,
                    y: wb.y,
                    width: wb.w.max(0) as u32,
                    height: wb.h.max(0) as u32,
                    confidence: 0.0, // 워드 단위 신뢰도는 별도 API 필요
                })
                .collect())
        }

        #[cfg(not(feature = "ocr"))]
        {
            let _ = image;
            Ok(vec![])
        }
    }

    fn provider_name(&self) -> &str {
        "local-tesseract"
    }

    fn is_external(&self) -> bool {
        false
    }

    fn is_available(&self) -> bool {
        cfg!(feature = "ocr")
    }
}

// ============================================================
// NoOpOcrProvider — 백엔드 없음
// ============================================================

/// OCR 백엔드가 없는 환경용 null-object 제공자
#[derive(Debug, Default)]
pub struct NoOpOcrProvider;

impl NoOpOcrProvider {
    /// 새 no-op 제공자 생성
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl OcrProvider for NoOpOcrProvider {
    async fn extract_elements(
        &self,
        _image: &[u8],
        _image_format: &str,
    ) -> Result<Vec<OcrResult>, CoreError> {
        Ok(vec![])
    }

    fn provider_name(&self) -> &str {
        "noop"
    }

    fn is_external(&self) -> bool {
        false
    }

    fn is_available(&self) -> bool {
        false
    }
}
