//! 윤곽 기하 도구.
//!
//! 이진 마스크의 연결 성분 분해, Moore 이웃 경계 추적, Douglas-Peucker
//! 다각형 근사, 이중 임계값 엣지 맵. 감지 휴리스틱이 쓰는 기하 연산을
//! 순수 Rust로 구현한다.

use std::collections::VecDeque;

use image::RgbaImage;

/// 엣지 검출 기본 하한 임계값 (Sobel L1 크기 기준)
pub const EDGE_LOW: u32 = 50;
/// 엣지 검출 기본 상한 임계값
pub const EDGE_HIGH: u32 = 150;

// ============================================================
// 픽셀 변환
// ============================================================

/// RGBA → 그레이스케일 (ITU-R BT.601 계수)
pub fn grayscale(img: &RgbaImage) -> Vec<u8> {
    img.as_raw()
        .chunks_exact(4)
        .map(|px| {
            let luma = 299 * px[0] as u32 + 587 * px[1] as u32 + 114 * px[2] as u32;
            (luma / 1000) as u8
        })
        .collect()
}

/// 밝기 임계값 초과 픽셀만 255로 남긴 이진 마스크
pub fn threshold_mask(gray: &[u8], threshold: u8) -> Vec<u8> {
    gray.iter()
        .map(|&v| if v > threshold { 255 } else { 0 })
        .collect()
}

/// 3x3 가우시안 블러 [1 2 1; 2 4 2; 1 2 1] / 16, 경계는 가장자리 복제
fn gaussian_blur3(gray: &[u8], width: u32, height: u32) -> Vec<u8> {
    let w = width as i32;
    let h = height as i32;
    let mut out = vec![0u8; gray.len()];
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0u32;
            for (dy, wy) in [(-1i32, 1u32), (0, 2), (1, 1)] {
                for (dx, wx) in [(-1i32, 1u32), (0, 2), (1, 1)] {
                    let sx = (x + dx).clamp(0, w - 1);
                    let sy = (y + dy).clamp(0, h - 1);
                    acc += wy * wx * gray[(sy * w + sx) as usize] as u32;
                }
            }
            out[(y * w + x) as usize] = (acc / 16) as u8;
        }
    }
    out
}

/// 엣지 맵 — 가우시안 블러 → Sobel → 이중 임계값 + 이력 연결.
///
/// `high` 이상은 강한 엣지로 즉시 채택되고, `low` 이상은 강한 엣지와
/// 8-연결일 때만 승격된다. 출력은 0/255 이진 마스크.
pub fn edge_map(gray: &[u8], width: u32, height: u32, low: u32, high: u32) -> Vec<u8> {
    let w = width as i32;
    let h = height as i32;
    if w < 3 || h < 3 {
        return vec![0; gray.len()];
    }
    let blurred = gaussian_blur3(gray, width, height);

    let mut magnitude = vec![0u32; gray.len()];
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let p = |dx: i32, dy: i32| blurred[((y + dy) * w + x + dx) as usize] as i32;
            let gx = -p(-1, -1) - 2 * p(-1, 0) - p(-1, 1) + p(1, -1) + 2 * p(1, 0) + p(1, 1);
            let gy = -p(-1, -1) - 2 * p(0, -1) - p(1, -1) + p(-1, 1) + 2 * p(0, 1) + p(1, 1);
            magnitude[(y * w + x) as usize] = gx.unsigned_abs() + gy.unsigned_abs();
        }
    }

    let mut edges = vec![0u8; gray.len()];
    let mut queue = VecDeque::new();
    for (i, &m) in magnitude.iter().enumerate() {
        if m >= high {
            edges[i] = 255;
            queue.push_back(i);
        }
    }
    while let Some(i) = queue.pop_front() {
        let x = (i as i32) % w;
        let y = (i as i32) / w;
        for dy in -1..=1 {
            for dx in -1..=1 {
                let (nx, ny) = (x + dx, y + dy);
                if nx < 0 || ny < 0 || nx >= w || ny >= h {
                    continue;
                }
                let ni = (ny * w + nx) as usize;
                if edges[ni] == 0 && magnitude[ni] >= low {
                    edges[ni] = 255;
                    queue.push_back(ni);
                }
            }
        }
    }
    edges
}

// ============================================================
// 연결 성분
// ============================================================

/// 연결 성분 요약 — 경계 상자, 픽셀 수, 추적 시작점
#[derive(Debug, Clone, Copy)]
pub struct Component {
    pub label: u32,
    /// 전경 픽셀 수
    pub area: usize,
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
    /// 행 우선 순서 첫 픽셀 (경계 추적 시작점)
    pub start: (u32, u32),
}

impl Component {
    #[inline]
    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }
}

/// 이진 마스크의 8-연결 성분 분해.
///
/// 라벨 맵(배경 0, 성분은 1부터)과 성분 요약 목록을 함께 반환한다.
pub fn connected_components(mask: &[u8], width: u32, height: u32) -> (Vec<u32>, Vec<Component>) {
    let w = width as i32;
    let h = height as i32;
    let mut labels = vec![0u32; mask.len()];
    let mut components = Vec::new();
    let mut queue = VecDeque::new();
    let mut next_label = 1u32;

    for i in 0..mask.len() {
        if mask[i] == 0 || labels[i] != 0 {
            continue;
        }
        let sx = (i as i32) % w;
        let sy = (i as i32) / w;
        let mut comp = Component {
            label: next_label,
            area: 0,
            min_x: sx as u32,
            min_y: sy as u32,
            max_x: sx as u32,
            max_y: sy as u32,
            start: (sx as u32, sy as u32),
        };
        labels[i] = next_label;
        queue.push_back(i);
        while let Some(j) = queue.pop_front() {
            let x = (j as i32) % w;
            let y = (j as i32) / w;
            comp.area += 1;
            comp.min_x = comp.min_x.min(x as u32);
            comp.min_y = comp.min_y.min(y as u32);
            comp.max_x = comp.max_x.max(x as u32);
            comp.max_y = comp.max_y.max(y as u32);
            for dy in -1..=1 {
                for dx in -1..=1 {
                    let (nx, ny) = (x + dx, y + dy);
                    if nx < 0 || ny < 0 || nx >= w || ny >= h {
                        continue;
                    }
                    let ni = (ny * w + nx) as usize;
                    if mask[ni] != 0 && labels[ni] == 0 {
                        labels[ni] = next_label;
                        queue.push_back(ni);
                    }
                }
            }
        }
        components.push(comp);
        next_label += 1;
    }
    (labels, components)
}

// ============================================================
// 경계 추적 + 다각형 근사
// ============================================================

/// Moore 이웃 탐색 순서 — West부터 시계 방향
const MOORE: [(i32, i32); 8] = [
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
];

/// Moore 이웃 추적으로 성분 외곽 경계를 시계 방향으로 얻는다.
///
/// 시작점이 행 우선 첫 픽셀이라 West 이웃은 항상 배경이다. 종료는
/// 시작점을 같은 방향으로 재진입할 때 (Jacob 기준). 한 픽셀 성분은
/// 시작점 하나만 반환한다.
pub fn trace_boundary(
    labels: &[u32],
    width: u32,
    height: u32,
    comp: &Component,
) -> Vec<(i32, i32)> {
    let w = width as i32;
    let h = height as i32;
    let target = comp.label;
    let at =
        |x: i32, y: i32| x >= 0 && y >= 0 && x < w && y < h && labels[(y * w + x) as usize] == target;

    let start = (comp.start.0 as i32, comp.start.1 as i32);
    let mut boundary = vec![start];
    let mut cur = start;
    let mut scan_from = 0usize;
    let mut first_move: Option<(usize, (i32, i32))> = None;

    // 퇴화 형태(대각선 체인)도 4 * area 안에 한 바퀴를 돈다
    let cap = comp.area * 4 + 16;
    for _ in 0..cap {
        let mut found = None;
        for step in 0..8 {
            let dir = (scan_from + step) % 8;
            let (dx, dy) = MOORE[dir];
            let next = (cur.0 + dx, cur.1 + dy);
            if at(next.0, next.1) {
                found = Some((dir, next));
                break;
            }
        }
        let Some((dir, next)) = found else {
            break; // 고립 픽셀
        };
        match first_move {
            Some(first) if cur == start && (dir, next) == first => break,
            None => first_move = Some((dir, next)),
            _ => {}
        }
        boundary.push(next);
        cur = next;
        // 진입 방향의 대각 반대편부터 재탐색
        scan_from = (dir + 5) % 8;
    }
    if boundary.len() > 1 && boundary.last() == Some(&start) {
        boundary.pop();
    }
    boundary
}

#[inline]
fn distance(a: (i32, i32), b: (i32, i32)) -> f64 {
    (((a.0 - b.0) as f64).powi(2) + ((a.1 - b.1) as f64).powi(2)).sqrt()
}

/// 폴리라인 길이 — `closed`면 마지막 → 첫 점 구간 포함
pub fn arc_length(points: &[(i32, i32)], closed: bool) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    let mut total: f64 = points.windows(2).map(|p| distance(p[0], p[1])).sum();
    if closed {
        total += distance(points[points.len() - 1], points[0]);
    }
    total
}

/// 점 p와 선분 (a, b)의 수직 거리 — 양 끝이 같으면 점 사이 거리
fn perpendicular_distance(p: (i32, i32), a: (i32, i32), b: (i32, i32)) -> f64 {
    let (px, py) = (p.0 as f64, p.1 as f64);
    let (ax, ay) = (a.0 as f64, a.1 as f64);
    let (bx, by) = (b.0 as f64, b.1 as f64);
    let dx = bx - ax;
    let dy = by - ay;
    let len = (dx * dx + dy * dy).sqrt();
    if len < f64::EPSILON {
        return ((px - ax).powi(2) + (py - ay).powi(2)).sqrt();
    }
    (dx * (ay - py) - (ax - px) * dy).abs() / len
}

fn dp_simplify(points: &[(i32, i32)], epsilon: f64) -> Vec<(i32, i32)> {
    if points.len() < 3 {
        return points.to_vec();
    }
    let a = points[0];
    let b = points[points.len() - 1];
    let mut max_d = 0.0;
    let mut split = 0;
    for (i, &p) in points.iter().enumerate().take(points.len() - 1).skip(1) {
        let d = perpendicular_distance(p, a, b);
        if d > max_d {
            max_d = d;
            split = i;
        }
    }
    if max_d > epsilon {
        let mut left = dp_simplify(&points[..=split], epsilon);
        let right = dp_simplify(&points[split..], epsilon);
        left.pop();
        left.extend(right);
        left
    } else {
        vec![a, b]
    }
}

/// 폐곡선 Douglas-Peucker 근사.
///
/// 기준점에서 가장 먼 점으로 곡선을 둘로 갈라 각각 단순화한 뒤 잇는다.
/// 반환 꼭짓점 목록은 시작점을 중복하지 않는다.
pub fn approx_polygon_closed(points: &[(i32, i32)], epsilon: f64) -> Vec<(i32, i32)> {
    if points.len() < 3 {
        return points.to_vec();
    }
    let anchor = points[0];
    let mut far = 0;
    let mut far_d = -1.0;
    for (i, &p) in points.iter().enumerate() {
        let d = ((p.0 - anchor.0) as f64).powi(2) + ((p.1 - anchor.1) as f64).powi(2);
        if d > far_d {
            far_d = d;
            far = i;
        }
    }
    if far == 0 {
        // 모든 점이 기준점과 동일
        return vec![anchor];
    }
    let mut second: Vec<(i32, i32)> = points[far..].to_vec();
    second.push(anchor);

    let mut polygon = dp_simplify(&points[..=far], epsilon);
    let tail = dp_simplify(&second, epsilon);
    polygon.pop();
    polygon.extend_from_slice(&tail[..tail.len() - 1]);
    polygon
}
