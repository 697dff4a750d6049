//! 화면 요소 감지기.
//!
//! 색상 마스크 + 윤곽 휴리스틱 + OCR 텍스트 확인으로 포털 페이지의 요소
//! 좌표를 추정한다. 임계값과 가중치는 포털 레이아웃에 맞춘 보정값이며
//! 전부 파일 상단 상수 블록에 모아둔다.

use std::collections::HashMap;
use std::sync::Arc;

use fast_image_resize::{images::Image as FirImage, ResizeAlg, ResizeOptions, Resizer};
use image::RgbaImage;
use once_cell::sync::Lazy;
use tracing::{debug, info, warn};

use nfeauto_core::error::CoreError;
use nfeauto_core::models::element::{
    DetectionCandidate, ElementRole, NamedCoordinates, ScreenPosition,
};
use nfeauto_core::ports::ocr_provider::OcrProvider;

use crate::capture::{crop_region, encode_png};
use crate::contour;

// ============================================================
// 감지 상수 — 포털 레이아웃 보정값
// ============================================================

/// 버튼 최소 면적 (픽셀 수)
const BUTTON_MIN_AREA: f64 = 1000.0;
/// 버튼 가로세로 비율 하한/상한
const BUTTON_ASPECT: (f64, f64) = (0.5, 6.0);
/// 버튼 색상 신뢰도가 1.0에 도달하는 면적
const BUTTON_FULL_CONFIDENCE_AREA: f64 = 2000.0;

/// 입력 필드 바운딩 박스 면적 하한/상한
const FIELD_AREA: (f64, f64) = (2000.0, 20000.0);
/// 입력 필드 비율 하한/상한 (길쭉한 직사각형)
const FIELD_ASPECT: (f64, f64) = (3.0, 15.0);
/// 입력 필드 허용 중심 밴드 — 가로 20~80%, 세로 30~70%
const FIELD_BAND_X: (f64, f64) = (0.2, 0.8);
const FIELD_BAND_Y: (f64, f64) = (0.3, 0.7);
/// 입력 필드 크기 점수가 1.0에 도달하는 면적
const FIELD_FULL_SIZE_AREA: f64 = 10000.0;
/// 입력 필드 점수 가중치 (위치, 크기)
const FIELD_WEIGHTS: (f64, f64) = (0.7, 0.3);

/// 체크박스 밝기 임계값
const CHECKBOX_BRIGHTNESS: u8 = 200;
/// 체크박스 면적 하한/상한
const CHECKBOX_AREA: (f64, f64) = (100.0, 2000.0);
/// 체크박스 비율 하한/상한 (정사각형 근방)
const CHECKBOX_ASPECT: (f64, f64) = (0.7, 1.3);
/// 체크박스 점수 가중치 (위치, 텍스트)
const CHECKBOX_WEIGHTS: (f64, f64) = (0.6, 0.4);

/// 역할 버튼 점수 가중치 (텍스트, 위치, 색상)
const ROLE_WEIGHTS: (f64, f64, f64) = (0.4, 0.4, 0.2);

/// OCR 확인 영역 한 변 (픽셀)
const TEXT_PROBE_SIZE: u32 = 100;
/// OCR 확인 영역 확대 배율
const TEXT_PROBE_SCALE: u32 = 2;
/// OCR 확인 영역 대비 강화 배율
const CONTRAST_FACTOR: f64 = 2.0;
/// OCR 불가/실패 시 중립 텍스트 점수
const NEUTRAL_TEXT_SCORE: f64 = 0.5;

/// 기본 색상 프로파일
pub const DEFAULT_COLOR_PROFILE: &str = "orange";

// ============================================================
// 색상 프로파일 (HSV, H는 0~179 / S·V는 0~255 배율)
// ============================================================

/// HSV 포함 범위
#[derive(Debug, Clone, Copy)]
pub struct HsvRange {
    pub h: (u8, u8),
    pub s: (u8, u8),
    pub v: (u8, u8),
}

impl HsvRange {
    fn contains(&self, (h, s, v): (u8, u8, u8)) -> bool {
        self.h.0 <= h
            && h <= self.h.1
            && self.s.0 <= s
            && s <= self.s.1
            && self.v.0 <= v
            && v <= self.v.1
    }
}

/// 포털 버튼 색상 프로파일
static COLOR_PROFILES: Lazy<HashMap<&'static str, HsvRange>> = Lazy::new(|| {
    HashMap::from([
        (
            "orange",
            HsvRange {
                h: (10, 25),
                s: (100, 255),
                v: (100, 255),
            },
        ),
        (
            "green",
            HsvRange {
                h: (40, 80),
                s: (100, 255),
                v: (150, 220),
            },
        ),
        (
            "blue",
            HsvRange {
                h: (100, 130),
                s: (150, 255),
                v: (50, 150),
            },
        ),
    ])
});

/// RGB → HSV (H는 0~179 배율, S/V는 0~255)
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let rf = r as f64 / 255.0;
    let gf = g as f64 / 255.0;
    let bf = b as f64 / 255.0;
    let max = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let delta = max - min;

    let mut h_deg = if delta < f64::EPSILON {
        0.0
    } else if (max - rf).abs() < f64::EPSILON {
        60.0 * (((gf - bf) / delta) % 6.0)
    } else if (max - gf).abs() < f64::EPSILON {
        60.0 * ((bf - rf) / delta + 2.0)
    } else {
        60.0 * ((rf - gf) / delta + 4.0)
    };
    if h_deg < 0.0 {
        h_deg += 360.0;
    }
    let s = if max < f64::EPSILON { 0.0 } else { delta / max };

    (
        ((h_deg / 2.0).round() as u32 % 180) as u8,
        (s * 255.0).round() as u8,
        (max * 255.0).round() as u8,
    )
}

// ============================================================
// 점수 함수
// ============================================================

/// 역할 기대 위치 대비 근접 점수 — 화면 대각선 길이로 정규화
fn position_score(role: ElementRole, x: i32, y: i32, width: u32, height: u32) -> f64 {
    let (rx, ry) = role.expected_position();
    let ex = rx * width as f64;
    let ey = ry * height as f64;
    let dist = ((x as f64 - ex).powi(2) + (y as f64 - ey).powi(2)).sqrt();
    let diagonal = ((width as f64).powi(2) + (height as f64).powi(2)).sqrt();
    (1.0 - dist / diagonal).max(0.0)
}

// ============================================================
// OCR 확인 영역 전처리
// ============================================================

/// Lanczos3 정수배 확대
fn upscale_lanczos(img: &RgbaImage, factor: u32) -> Result<RgbaImage, CoreError> {
    let (w, h) = img.dimensions();
    let (dst_w, dst_h) = (w * factor, h * factor);

    let src = FirImage::from_vec_u8(
        w,
        h,
        img.clone().into_raw(),
        fast_image_resize::PixelType::U8x4,
    )
    .map_err(|e| CoreError::Internal(format!("소스 이미지 생성 실패: {e}")))?;

    let mut dst = FirImage::new(dst_w, dst_h, fast_image_resize::PixelType::U8x4);

    let mut resizer = Resizer::new();
    let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(
        fast_image_resize::FilterType::Lanczos3,
    ));
    resizer
        .resize(&src, &mut dst, &options)
        .map_err(|e| CoreError::Internal(format!("리사이즈 실패: {e}")))?;

    RgbaImage::from_raw(dst_w, dst_h, dst.into_vec())
        .ok_or_else(|| CoreError::Internal("결과 이미지 생성 실패".to_string()))
}

/// 대비 강화 — 평균 밝기 기준으로 편차를 factor배
fn enhance_contrast(img: &RgbaImage, factor: f64) -> RgbaImage {
    let gray = contour::grayscale(img);
    let mean = if gray.is_empty() {
        0.0
    } else {
        gray.iter().map(|&v| v as f64).sum::<f64>() / gray.len() as f64
    };
    let mut out = img.clone();
    for px in out.pixels_mut() {
        for c in 0..3 {
            let v = px.0[c] as f64;
            px.0[c] = (mean + factor * (v - mean)).clamp(0.0, 255.0) as u8;
        }
    }
    out
}

/// 중심 주변 OCR 확인 영역 추출 — 100px 사각형 크롭 후 2배 확대 + 대비 강화.
///
/// 화면 가장자리에서는 원점을 0으로 보정하고 크기를 남은 공간으로 줄인다.
fn probe_region(img: &RgbaImage, center: ScreenPosition) -> Result<RgbaImage, CoreError> {
    let half = (TEXT_PROBE_SIZE / 2) as i32;
    let crop = crop_region(
        img,
        center.x - half,
        center.y - half,
        TEXT_PROBE_SIZE,
        TEXT_PROBE_SIZE,
    )?;
    let upscaled = upscale_lanczos(&crop, TEXT_PROBE_SCALE)?;
    Ok(enhance_contrast(&upscaled, CONTRAST_FACTOR))
}

// ============================================================
// 감지기
// ============================================================

/// 화면 요소 감지기 — 색상/윤곽 휴리스틱 + OCR 텍스트 확인
pub struct ElementDetector {
    ocr: Arc<dyn OcrProvider>,
}

impl ElementDetector {
    pub fn new(ocr: Arc<dyn OcrProvider>) -> Self {
        Self { ocr }
    }

    /// 접근 키 입력 필드 감지.
    ///
    /// 엣지 맵의 4꼭짓점 윤곽 중 길쭉한 직사각형을 찾아 위치/크기 점수로
    /// 최고 후보를 고른다.
    pub fn detect_input_field(&self, img: &RgbaImage) -> Option<DetectionCandidate> {
        let (w, h) = img.dimensions();
        let gray = contour::grayscale(img);
        let edges = contour::edge_map(&gray, w, h, contour::EDGE_LOW, contour::EDGE_HIGH);
        let (labels, components) = contour::connected_components(&edges, w, h);

        let mut best: Option<DetectionCandidate> = None;
        for comp in &components {
            let boundary = contour::trace_boundary(&labels, w, h, comp);
            if boundary.len() < 4 {
                continue;
            }
            let epsilon = 0.02 * contour::arc_length(&boundary, true);
            let polygon = contour::approx_polygon_closed(&boundary, epsilon);
            if polygon.len() != 4 {
                continue;
            }

            let (bw, bh) = (comp.width(), comp.height());
            let aspect = bw as f64 / bh as f64;
            let area = (bw * bh) as f64;
            if aspect <= FIELD_ASPECT.0 || aspect >= FIELD_ASPECT.1 {
                continue;
            }
            if area <= FIELD_AREA.0 || area >= FIELD_AREA.1 {
                continue;
            }

            let cx = comp.min_x as i32 + (bw / 2) as i32;
            let cy = comp.min_y as i32 + (bh / 2) as i32;
            let in_band = FIELD_BAND_X.0 * (w as f64) < cx as f64
                && (cx as f64) < FIELD_BAND_X.1 * w as f64
                && FIELD_BAND_Y.0 * (h as f64) < cy as f64
                && (cy as f64) < FIELD_BAND_Y.1 * h as f64;
            if !in_band {
                continue;
            }

            let position = position_score(ElementRole::KeyField, cx, cy, w, h);
            let size = (area / FIELD_FULL_SIZE_AREA).min(1.0);
            let score = FIELD_WEIGHTS.0 * position + FIELD_WEIGHTS.1 * size;

            let candidate = DetectionCandidate {
                x: comp.min_x as i32,
                y: comp.min_y as i32,
                width: bw,
                height: bh,
                area,
                aspect_ratio: aspect,
                confidence: score,
            };
            if best.as_ref().map_or(true, |b| candidate.confidence > b.confidence) {
                best = Some(candidate);
            }
        }

        match &best {
            Some(c) => debug!("입력 필드 후보: {} (점수 {:.2})", c.center(), c.confidence),
            None => debug!("입력 필드 미발견"),
        }
        best
    }

    /// CAPTCHA 체크박스 감지.
    ///
    /// 밝은 영역 중 화면 하단의 정사각형 근방 블롭을 위치 + 주변 텍스트
    /// 점수로 평가한다.
    pub async fn detect_captcha_checkbox(&self, img: &RgbaImage) -> Option<DetectionCandidate> {
        let (w, h) = img.dimensions();
        let gray = contour::grayscale(img);
        let mask = contour::threshold_mask(&gray, CHECKBOX_BRIGHTNESS);
        let (_labels, components) = contour::connected_components(&mask, w, h);

        let mut best: Option<DetectionCandidate> = None;
        for comp in components {
            let area = comp.area as f64;
            if area <= CHECKBOX_AREA.0 || area >= CHECKBOX_AREA.1 {
                continue;
            }
            let (bw, bh) = (comp.width(), comp.height());
            let aspect = bw as f64 / bh as f64;
            if aspect <= CHECKBOX_ASPECT.0 || aspect >= CHECKBOX_ASPECT.1 {
                continue;
            }
            let cx = comp.min_x as i32 + (bw / 2) as i32;
            let cy = comp.min_y as i32 + (bh / 2) as i32;
            // 체크박스는 화면 하단에 있다
            if (cy as f64) <= 0.5 * h as f64 {
                continue;
            }

            let center = ScreenPosition::new(cx, cy);
            let text = self.text_score(img, center, ElementRole::Captcha).await;
            let position = position_score(ElementRole::Captcha, cx, cy, w, h);
            let score = CHECKBOX_WEIGHTS.0 * position + CHECKBOX_WEIGHTS.1 * text;

            let candidate = DetectionCandidate {
                x: comp.min_x as i32,
                y: comp.min_y as i32,
                width: bw,
                height: bh,
                area,
                aspect_ratio: aspect,
                confidence: score,
            };
            if best.as_ref().map_or(true, |b| candidate.confidence > b.confidence) {
                best = Some(candidate);
            }
        }

        if let Some(c) = &best {
            debug!("CAPTCHA 체크박스 후보: {} (점수 {:.2})", c.center(), c.confidence);
        }
        best
    }

    /// 색상 프로파일에 맞는 버튼 블롭 감지 — 중심 X 기준 왼쪽부터 정렬
    pub fn detect_colored_buttons(&self, img: &RgbaImage, profile: &str) -> Vec<DetectionCandidate> {
        let (w, h) = img.dimensions();
        let Some(range) = COLOR_PROFILES.get(profile) else {
            warn!("알 수 없는 색상 프로파일: {profile}");
            return Vec::new();
        };

        let mut mask = vec![0u8; (w * h) as usize];
        for (i, px) in img.as_raw().chunks_exact(4).enumerate() {
            if range.contains(rgb_to_hsv(px[0], px[1], px[2])) {
                mask[i] = 255;
            }
        }

        let (_labels, components) = contour::connected_components(&mask, w, h);
        let mut buttons: Vec<DetectionCandidate> = components
            .iter()
            .filter_map(|comp| {
                let area = comp.area as f64;
                if area <= BUTTON_MIN_AREA {
                    return None;
                }
                let (bw, bh) = (comp.width(), comp.height());
                let aspect = bw as f64 / bh as f64;
                if aspect <= BUTTON_ASPECT.0 || aspect >= BUTTON_ASPECT.1 {
                    return None;
                }
                Some(DetectionCandidate {
                    x: comp.min_x as i32,
                    y: comp.min_y as i32,
                    width: bw,
                    height: bh,
                    area,
                    aspect_ratio: aspect,
                    confidence: (area / BUTTON_FULL_CONFIDENCE_AREA).min(1.0),
                })
            })
            .collect();

        buttons.sort_by_key(|b| b.center().x);
        debug!("{profile} 버튼 {}개 감지", buttons.len());
        buttons
    }

    /// 특정 역할 버튼 감지 — 텍스트/위치/색상 점수 합성으로 최고 후보 선택
    pub async fn detect_button_by_role(
        &self,
        img: &RgbaImage,
        role: ElementRole,
        profile: &str,
    ) -> Option<DetectionCandidate> {
        let (w, h) = img.dimensions();
        let buttons = self.detect_colored_buttons(img, profile);

        let mut best: Option<DetectionCandidate> = None;
        for button in buttons {
            let center = button.center();
            let text = self.text_score(img, center, role).await;
            let position = position_score(role, center.x, center.y, w, h);
            let score =
                ROLE_WEIGHTS.0 * text + ROLE_WEIGHTS.1 * position + ROLE_WEIGHTS.2 * button.confidence;
            debug!(
                "{role} 후보 {}: 텍스트 {:.2} / 위치 {:.2} / 색상 {:.2}",
                center, text, position, button.confidence
            );

            let mut candidate = button;
            candidate.confidence = score;
            if best.as_ref().map_or(true, |b| candidate.confidence > b.confidence) {
                best = Some(candidate);
            }
        }
        best
    }

    /// 전체 요소 일괄 감지.
    ///
    /// 입력 필드 → 체크박스 → 색상 버튼 순으로 감지하고, 버튼 개수에 따라
    /// 역할을 배정한다. 버튼이 2개 미만이면 역할별 개별 감지로 돌아간다.
    /// 인증서 확인 버튼은 모달 팝업이라 항상 화면 정중앙으로 둔다.
    pub async fn detect_all(&self, img: &RgbaImage, profile: &str) -> NamedCoordinates {
        let (w, h) = img.dimensions();
        info!("화면 요소 감지 시작: {}x{} (프로파일 {})", w, h, profile);

        let mut coords = NamedCoordinates::all_zero();

        if let Some(field) = self.detect_input_field(img) {
            coords.set(ElementRole::KeyField, field.center());
        }

        if let Some(checkbox) = self.detect_captcha_checkbox(img).await {
            coords.set(ElementRole::Captcha, checkbox.center());
        }

        let buttons = self.detect_colored_buttons(img, profile);
        match buttons.len() {
            2 => {
                // 일반 레이아웃: 왼쪽 = 새 조회, 오른쪽 = 다운로드.
                // 계속 버튼은 조회 후 같은 자리에 나타나므로 오른쪽과 동일 좌표.
                coords.set(ElementRole::NewQuery, buttons[0].center());
                coords.set(ElementRole::Download, buttons[1].center());
                coords.set(ElementRole::Continue, buttons[1].center());
            }
            n if n >= 3 => {
                coords.set(ElementRole::NewQuery, buttons[0].center());
                coords.set(ElementRole::Continue, buttons[1].center());
                coords.set(ElementRole::Download, buttons[n - 1].center());
            }
            n => {
                debug!("색상 버튼 {}개 — 역할별 개별 감지로 전환", n);
                for role in [ElementRole::Continue, ElementRole::Download, ElementRole::NewQuery] {
                    if let Some(button) = self.detect_button_by_role(img, role, profile).await {
                        coords.set(role, button.center());
                    }
                }
            }
        }

        coords.set(
            ElementRole::Certificate,
            ScreenPosition::new(w as i32 / 2, h as i32 / 2),
        );

        info!("요소 감지 완료: {}/{}개", coords.set_count(), ElementRole::ALL.len());
        coords
    }

    /// 중심 주변 텍스트가 역할 어휘와 얼마나 겹치는지 (0.0 ~ 1.0).
    ///
    /// OCR 백엔드가 없거나 실패하면 중립값 0.5.
    async fn text_score(&self, img: &RgbaImage, center: ScreenPosition, role: ElementRole) -> f64 {
        if !self.ocr.is_available() {
            return NEUTRAL_TEXT_SCORE;
        }
        let vocabulary = role.vocabulary();
        if vocabulary.is_empty() {
            return NEUTRAL_TEXT_SCORE;
        }

        let probe = match probe_region(img, center) {
            Ok(p) => p,
            Err(e) => {
                warn!("OCR 확인 영역 추출 실패: {e}");
                return NEUTRAL_TEXT_SCORE;
            }
        };
        let png = match encode_png(&probe) {
            Ok(b) => b,
            Err(e) => {
                warn!("OCR 확인 영역 인코딩 실패: {e}");
                return NEUTRAL_TEXT_SCORE;
            }
        };

        match self.ocr.extract_elements(&png, "png").await {
            Ok(results) => {
                let text = results
                    .iter()
                    .map(|r| r.text.to_lowercase())
                    .collect::<Vec<_>>()
                    .join(" ");
                let hits = vocabulary.iter().filter(|word| text.contains(**word)).count();
                (hits as f64 / vocabulary.len() as f64).min(1.0)
            }
            Err(e) => {
                warn!("OCR 텍스트 확인 실패 ({role}): {e}");
                NEUTRAL_TEXT_SCORE
            }
        }
    }
}
