//! CAPTCHA 영역 분석.
//!
//! 엣지 밀도(텍스트형)와 색상 다양성/질감(이미지형) 휴리스틱으로 CAPTCHA
//! 유형을 분류한다. 텍스트형 자동 풀이는 전처리 경로만 갖춘 확장 지점이며
//! 항상 None을 반환해 수동 개입 대기로 넘어간다.

use std::collections::HashSet;

use async_trait::async_trait;
use image::RgbaImage;
use tracing::{debug, warn};

use nfeauto_core::error::CoreError;
use nfeauto_core::ports::captcha_classifier::{CaptchaClassifier, CaptchaKind};

use crate::capture::decode_png;
use crate::contour;

/// 텍스트 점수가 1.0에 도달하는 엣지 밀도
const TEXT_EDGE_DENSITY_NORM: f64 = 50.0;
/// 이미지 점수가 1.0에 도달하는 고유 색상 수
const IMAGE_COLOR_NORM: f64 = 1000.0;
/// 이미지 점수가 1.0에 도달하는 밝기 표준편차
const IMAGE_TEXTURE_NORM: f64 = 50.0;
/// 이미지형 판정 최소 점수
const IMAGE_SCORE_FLOOR: f64 = 0.3;
/// 자동 풀이 전처리 이진화 임계값
const SOLVE_BINARIZE_THRESHOLD: u8 = 128;

/// CAPTCHA 분류기 — 엣지 밀도 / 색상 다양성 휴리스틱
#[derive(Debug, Default)]
pub struct CaptchaProbe;

impl CaptchaProbe {
    pub fn new() -> Self {
        Self
    }

    /// 텍스트형 패턴 점수 — 왜곡 문자는 엣지 밀도가 높다
    fn text_pattern_score(edges: &[u8]) -> f64 {
        if edges.is_empty() {
            return 0.0;
        }
        let sum: u64 = edges.iter().map(|&v| v as u64).sum();
        let density = sum as f64 / edges.len() as f64;
        (density / TEXT_EDGE_DENSITY_NORM).min(1.0)
    }

    /// 이미지형 패턴 점수 — 고유 색상 수와 밝기 질감 중 큰 쪽
    fn image_pattern_score(img: &RgbaImage, gray: &[u8]) -> f64 {
        let mut colors: HashSet<[u8; 3]> = HashSet::new();
        for px in img.as_raw().chunks_exact(4) {
            colors.insert([px[0], px[1], px[2]]);
        }
        let color_score = (colors.len() as f64 / IMAGE_COLOR_NORM).min(1.0);
        let texture_score = (std_dev(gray) / IMAGE_TEXTURE_NORM).min(1.0);
        color_score.max(texture_score)
    }
}

fn std_dev(values: &[u8]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
    let variance = values.iter().map(|&v| (v as f64 - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

#[async_trait]
impl CaptchaClassifier for CaptchaProbe {
    async fn classify(&self, image: &[u8]) -> Result<CaptchaKind, CoreError> {
        let img = match decode_png(image) {
            Ok(i) => i,
            Err(e) => {
                warn!("CAPTCHA 영역 디코딩 실패 — unknown 처리: {e}");
                return Ok(CaptchaKind::Unknown);
            }
        };
        let (w, h) = img.dimensions();
        if w == 0 || h == 0 {
            return Ok(CaptchaKind::Unknown);
        }

        let gray = contour::grayscale(&img);
        let edges = contour::edge_map(&gray, w, h, contour::EDGE_LOW, contour::EDGE_HIGH);

        let text_score = Self::text_pattern_score(&edges);
        let image_score = Self::image_pattern_score(&img, &gray);
        debug!(
            "CAPTCHA 분석: 텍스트 {:.2} / 이미지 {:.2}",
            text_score, image_score
        );

        let kind = if text_score > image_score {
            CaptchaKind::Text
        } else if image_score > IMAGE_SCORE_FLOOR {
            CaptchaKind::Image
        } else {
            CaptchaKind::Unknown
        };
        Ok(kind)
    }

    async fn solve_text(&self, image: &[u8]) -> Result<Option<String>, CoreError> {
        // 전처리 경로만 유지된 확장 지점 — 풀이 엔진은 연결돼 있지 않다
        let Ok(img) = decode_png(image) else {
            return Ok(None);
        };
        let gray = contour::grayscale(&img);
        let _binary = contour::threshold_mask(&gray, SOLVE_BINARIZE_THRESHOLD);
        debug!("텍스트 CAPTCHA 자동 풀이 미지원 — 수동 개입 필요");
        Ok(None)
    }
}
