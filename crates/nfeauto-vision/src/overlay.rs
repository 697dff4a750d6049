//! 감지 디버그 오버레이.
//!
//! 감지된 좌표 위에 역할별 색상 원 마커를 그려 PNG로 내보낸다.
//! 수동 보정 전에 감지 품질을 눈으로 확인하는 용도.

use std::path::Path;

use image::{Rgba, RgbaImage};
use tracing::info;

use nfeauto_core::error::CoreError;
use nfeauto_core::models::element::{NamedCoordinates, ScreenPosition};

use crate::capture::encode_png;

/// 마커 원 반지름 (픽셀)
const MARKER_RADIUS: i32 = 15;
/// 마커 원 선 두께
const MARKER_STROKE: i32 = 3;
/// 중심점 반지름
const MARKER_DOT_RADIUS: i32 = 3;

/// 원 링 그리기 — 반지름 ± 두께/2 거리 밴드 스캔, 화면 밖은 잘라낸다
fn draw_ring(img: &mut RgbaImage, cx: i32, cy: i32, radius: i32, stroke: i32, color: Rgba<u8>) {
    let (w, h) = img.dimensions();
    let outer = radius as f64 + stroke as f64 / 2.0;
    let inner = radius as f64 - stroke as f64 / 2.0;
    let reach = outer.ceil() as i32 + 1;
    for dy in -reach..=reach {
        for dx in -reach..=reach {
            let dist = ((dx * dx + dy * dy) as f64).sqrt();
            if dist < inner || dist > outer {
                continue;
            }
            let (x, y) = (cx + dx, cy + dy);
            if x >= 0 && y >= 0 && (x as u32) < w && (y as u32) < h {
                img.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}

/// 채운 원 그리기
fn draw_dot(img: &mut RgbaImage, cx: i32, cy: i32, radius: i32, color: Rgba<u8>) {
    let (w, h) = img.dimensions();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy > radius * radius {
                continue;
            }
            let (x, y) = (cx + dx, cy + dy);
            if x >= 0 && y >= 0 && (x as u32) < w && (y as u32) < h {
                img.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}

/// 설정된 좌표마다 역할 색상 마커(링 + 중심점)를 그린다
pub fn draw_markers(img: &mut RgbaImage, coords: &NamedCoordinates) {
    for (role, position) in coords.iter() {
        let Some(position) = position.filter(ScreenPosition::is_set) else {
            continue;
        };
        let (r, g, b) = role.marker_color();
        let color = Rgba([r, g, b, 255]);
        draw_ring(img, position.x, position.y, MARKER_RADIUS, MARKER_STROKE, color);
        draw_dot(img, position.x, position.y, MARKER_DOT_RADIUS, color);
    }
}

/// 스크린샷 + 마커를 PNG 파일로 저장하고 색상 대응을 로그로 남긴다
pub fn save_debug_overlay(
    img: &RgbaImage,
    coords: &NamedCoordinates,
    path: &Path,
) -> Result<(), CoreError> {
    let mut annotated = img.clone();
    draw_markers(&mut annotated, coords);
    std::fs::write(path, encode_png(&annotated)?)?;

    for (role, position) in coords.iter() {
        if let Some(p) = position.filter(ScreenPosition::is_set) {
            let (r, g, b) = role.marker_color();
            info!("  {} {} — 마커 RGB({}, {}, {})", role, p, r, g, b);
        }
    }
    info!("감지 디버그 이미지 저장: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nfeauto_core::models::element::ElementRole;

    #[test]
    fn markers_drawn_at_set_positions() {
        let mut img = RgbaImage::from_pixel(200, 200, Rgba([0, 0, 0, 255]));
        let mut coords = NamedCoordinates::all_zero();
        coords.set(ElementRole::KeyField, ScreenPosition::new(100, 100));
        draw_markers(&mut img, &coords);

        let (r, g, b) = ElementRole::KeyField.marker_color();
        // 링 위의 한 점 (반지름 15 오른쪽)
        assert_eq!(img.get_pixel(115, 100), &Rgba([r, g, b, 255]));
        // 중심점
        assert_eq!(img.get_pixel(100, 100), &Rgba([r, g, b, 255]));
        // 링과 중심점 사이 빈 공간은 원본 유지
        assert_eq!(img.get_pixel(100, 108), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn unset_roles_leave_canvas_untouched() {
        let mut img = RgbaImage::from_pixel(60, 60, Rgba([9, 9, 9, 255]));
        let coords = NamedCoordinates::all_zero();
        draw_markers(&mut img, &coords);
        assert!(img.pixels().all(|p| p == &Rgba([9, 9, 9, 255])));
    }

    #[test]
    fn marker_clipped_at_screen_edge() {
        let mut img = RgbaImage::from_pixel(40, 40, Rgba([0, 0, 0, 255]));
        let mut coords = NamedCoordinates::all_zero();
        coords.set(ElementRole::Download, ScreenPosition::new(2, 2));
        // 화면 밖 부분은 패닉 없이 잘린다
        draw_markers(&mut img, &coords);
        let (r, g, b) = ElementRole::Download.marker_color();
        assert_eq!(img.get_pixel(2, 2), &Rgba([r, g, b, 255]));
    }

    #[test]
    fn overlay_file_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deteccao.png");
        let img = RgbaImage::from_pixel(64, 64, Rgba([255, 255, 255, 255]));
        let mut coords = NamedCoordinates::all_zero();
        coords.set(ElementRole::Continue, ScreenPosition::new(32, 32));
        save_debug_overlay(&img, &coords, &path).unwrap();
        assert!(path.exists());
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }
}
