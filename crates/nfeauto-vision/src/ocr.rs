//! OCR 텍스트 추출 모듈.
//!
//! `leptess` 기반 Tesseract 래퍼. `ocr` feature flag 활성화 시에만
//! 빌드되며, 추출은 spawn_blocking으로 별도 스레드에서 수행한다.

use std::path::PathBuf;

use thiserror::Error;

/// OCR 에러 타입
#[derive(Debug, Error)]
pub enum OcrError {
    /// Tesseract 초기화 실패
    #[error("OCR 초기화 실패: {0}")]
    Init(String),

    /// 이미지 설정 실패
    #[error("OCR 이미지 설정 실패: {0}")]
    ImageSetup(String),

    /// 텍스트 추출 실패
    #[error("OCR 텍스트 추출 실패: {0}")]
    Extraction(String),

    /// 빈 이미지 입력
    #[error("빈 이미지: 너비 또는 높이가 0")]
    EmptyImage,

    /// 비동기 작업 실패
    #[error("OCR 비동기 작업 실패: {0}")]
    Async(String),
}

/// OCR 워드 + 바운딩 박스 결과
#[derive(Debug, Clone)]
pub struct OcrWordBox {
    /// 추출된 텍스트
    pub text: String,
    /// X 좌표
    pub x: i32,
    /// Y 좌표
    pub y: i32,
    /// 너비
    pub w: i32,
    /// 높이
    pub h: i32,
}

/// OCR 텍스트 추출기
pub struct OcrExtractor {
    /// Tesseract 데이터 경로 (None이면 시스템 기본값)
    tessdata_path: Option<PathBuf>,
}

impl OcrExtractor {
    /// 새 OCR 추출기 생성
    pub fn new(tessdata_path: Option<PathBuf>) -> Self {
        Self { tessdata_path }
    }

    /// tessdata 경로 반환
    pub fn tessdata_path(&self) -> Option<&PathBuf> {
        self.tessdata_path.as_ref()
    }

    /// 워드 단위 텍스트 + 바운딩 박스 추출 (비동기).
    ///
    /// 각 단어의 위치를 함께 반환해 요소 감지의 텍스트 확인에 쓴다.
    pub async fn extract_words_with_boxes(
        &self,
        image: &image::DynamicImage,
    ) -> Result<Vec<OcrWordBox>, OcrError> {
        let rgba = image.to_rgba8();
        let (w, h) = (rgba.width(), rgba.height());

        if w == 0 || h == 0 {
            return Err(OcrError::EmptyImage);
        }

        let tessdata = self
            .tessdata_path
            .as_ref()
            .map(|p| p.to_string_lossy().to_string());

        let raw_data = rgba.into_raw();

        // 별도 스레드에서 OCR 실행
        tokio::task::spawn_blocking(move || {
            let tessdata_ref = tessdata.as_deref();

            let mut lt = leptess::LepTess::new(tessdata_ref, "eng")
                .map_err(|e| OcrError::Init(format!("{e}")))?;

            lt.set_image_from_mem(&raw_data, w as i32, h as i32, 4, (w * 4) as i32)
                .map_err(|_| OcrError::ImageSetup("이미지 메모리 설정 실패".to_string()))?;

            let boxes = lt
                .get_component_boxes(leptess::capi::TessPageIteratorLevel_RIL_WORD, true)
                .ok_or_else(|| OcrError::Extraction("워드 박스 추출 실패".to_string()))?;

            // 전체 텍스트를 워드 단위로 쪼개 박스 순서에 매핑
            let full_text = lt
                .get_utf8_text()
                .map_err(|e| OcrError::Extraction(format!("{e}")))?;
            let words: Vec<&str> = full_text.split_whitespace().collect();

            let mut result = Vec::new();
            for (i, b) in boxes.iter().enumerate() {
                let geom = b.get_geometry();
                let word_text = words.get(i).unwrap_or(&"").to_string();
                if !word_text.is_empty() {
                    result.push(OcrWordBox {
                        text: word_text,
                        x: geom.x,
                        y: geom.y,
                        w: geom.w,
                        h: geom.h,
                    });
                }
            }

            Ok(result)
        })
        .await
        .map_err(|e| OcrError::Async(format!("작업 조인 실패: {e}")))?
    }
}
