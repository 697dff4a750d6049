//! 스크린 캡처.
//!
//! xcap 기반 주 모니터 캡처, PNG 코덱 헬퍼, `ScreenSource` 포트 구현.

use std::io::Cursor;

use async_trait::async_trait;
use image::{ImageFormat, RgbaImage};
use parking_lot::Mutex;
use tracing::debug;
use xcap::Monitor;

use nfeauto_core::error::CoreError;
use nfeauto_core::ports::screen_source::ScreenSource;

// ============================================================
// PNG 코덱 헬퍼
// ============================================================

/// RGBA 이미지 → PNG 바이트
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>, CoreError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| CoreError::Capture(format!("PNG 인코딩 실패: {e}")))?;
    Ok(buf)
}

/// 이미지 바이트 → RGBA 이미지 (포맷 자동 감지)
pub fn decode_png(bytes: &[u8]) -> Result<RgbaImage, CoreError> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| CoreError::Capture(format!("이미지 디코딩 실패: {e}")))?;
    Ok(img.to_rgba8())
}

/// 영역을 이미지 경계로 클램핑해 잘라낸다.
///
/// 음수 좌표는 0으로 보정하고 폭/높이는 남은 공간으로 줄인다.
/// 시작점이 이미지 밖이면 에러.
pub fn crop_region(
    img: &RgbaImage,
    x: i32,
    y: i32,
    width: u32,
    height: u32,
) -> Result<RgbaImage, CoreError> {
    let (full_w, full_h) = img.dimensions();
    let x0 = x.max(0) as u32;
    let y0 = y.max(0) as u32;
    if x0 >= full_w || y0 >= full_h {
        return Err(CoreError::Capture(format!(
            "캡처 영역이 화면 밖: ({x}, {y}) / 화면 {full_w}x{full_h}"
        )));
    }
    let w = width.min(full_w - x0);
    let h = height.min(full_h - y0);
    if w == 0 || h == 0 {
        return Err(CoreError::Capture(format!(
            "캡처 영역 크기가 0: {width}x{height} at ({x}, {y})"
        )));
    }
    Ok(image::imageops::crop_imm(img, x0, y0, w, h).to_image())
}

// ============================================================
// 캡처
// ============================================================

/// 스크린 캡처 — xcap 기반 주 모니터
pub struct ScreenCapture {
    /// 주 모니터 해상도 캐시 (첫 캡처 때 채워진다)
    size_cache: Mutex<Option<(u32, u32)>>,
}

impl ScreenCapture {
    /// 새 캡처 인스턴스 생성
    pub fn new() -> Self {
        Self {
            size_cache: Mutex::new(None),
        }
    }

    fn primary_monitor() -> Result<Monitor, CoreError> {
        let monitors = Monitor::all()
            .map_err(|e| CoreError::Capture(format!("모니터 목록 조회 실패: {e}")))?;

        monitors
            .into_iter()
            .find(|m| m.is_primary().unwrap_or(false))
            .or_else(|| Monitor::all().ok()?.into_iter().next())
            .ok_or_else(|| CoreError::Capture("모니터를 찾을 수 없음".to_string()))
    }

    /// 주 모니터 스크린 캡처
    pub fn capture_primary(&self) -> Result<RgbaImage, CoreError> {
        let image = Self::primary_monitor()?
            .capture_image()
            .map_err(|e| CoreError::Capture(format!("스크린 캡처 실패: {e}")))?;

        debug!("스크린 캡처 완료: {}x{}", image.width(), image.height());
        *self.size_cache.lock() = Some((image.width(), image.height()));

        Ok(image)
    }

    /// 사용 가능한 모니터 수
    pub fn monitor_count() -> Result<usize, CoreError> {
        Monitor::all()
            .map(|m| m.len())
            .map_err(|e| CoreError::Capture(format!("모니터 목록 조회 실패: {e}")))
    }
}

impl Default for ScreenCapture {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScreenSource for ScreenCapture {
    async fn capture_full(&self) -> Result<Vec<u8>, CoreError> {
        let img = self.capture_primary()?;
        encode_png(&img)
    }

    async fn capture_region(
        &self,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, CoreError> {
        let img = self.capture_primary()?;
        let region = crop_region(&img, x, y, width, height)?;
        encode_png(&region)
    }

    async fn screen_size(&self) -> Result<(u32, u32), CoreError> {
        if let Some(size) = *self.size_cache.lock() {
            return Ok(size);
        }
        // 캐시 미스 — 한 번 캡처해서 해상도를 채운다
        let img = self.capture_primary()?;
        Ok(img.dimensions())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn sample(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([10, 20, 30, 255]))
    }

    #[test]
    fn png_round_trip_preserves_dimensions() {
        let img = sample(12, 7);
        let png = encode_png(&img).unwrap();
        let back = decode_png(&png).unwrap();
        assert_eq!(back.dimensions(), (12, 7));
        assert_eq!(back.get_pixel(3, 3), &Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode_png(&[0x00, 0x01, 0x02]).is_err());
    }

    #[test]
    fn crop_clamps_negative_origin() {
        let img = sample(100, 50);
        let region = crop_region(&img, -30, -10, 100, 100).unwrap();
        // 음수 좌표는 0으로, 크기는 남은 화면으로 줄어든다
        assert_eq!(region.dimensions(), (100, 50));
    }

    #[test]
    fn crop_clamps_overflowing_size() {
        let img = sample(100, 50);
        let region = crop_region(&img, 80, 40, 100, 100).unwrap();
        assert_eq!(region.dimensions(), (20, 10));
    }

    #[test]
    fn crop_rejects_origin_outside_screen() {
        let img = sample(100, 50);
        assert!(crop_region(&img, 100, 0, 10, 10).is_err());
        assert!(crop_region(&img, 0, 200, 10, 10).is_err());
    }

    #[test]
    fn crop_rejects_zero_size() {
        let img = sample(100, 50);
        assert!(crop_region(&img, 10, 10, 0, 5).is_err());
    }
}
