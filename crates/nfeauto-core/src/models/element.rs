//! 화면 요소 모델.
//!
//! 포털 페이지의 6개 요소 역할, 화면 좌표, 감지 후보 구조체를 정의한다.
//! 역할별 기대 상대 위치와 OCR 확인 어휘는 포털 레이아웃에 맞춰 보정된 값이다.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// 화면 픽셀 좌표
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenPosition {
    /// X 좌표 (픽셀)
    pub x: i32,
    /// Y 좌표 (픽셀)
    pub y: i32,
}

impl ScreenPosition {
    /// 새 좌표 생성
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// 좌표가 설정되었는지 확인 — (0, 0)은 미설정 플레이스홀더로 취급
    pub fn is_set(&self) -> bool {
        self.x != 0 && self.y != 0
    }
}

impl fmt::Display for ScreenPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// 포털 페이지 요소 역할 (6종)
///
/// serde 직렬화 이름은 coordinates.json의 온디스크 키와 일치한다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementRole {
    /// 접근 키 입력 필드
    #[serde(rename = "campo_chave")]
    KeyField,
    /// CAPTCHA 체크박스
    #[serde(rename = "captcha")]
    Captcha,
    /// 계속(Continuar) 버튼
    #[serde(rename = "continuar")]
    Continue,
    /// 다운로드 버튼
    #[serde(rename = "download")]
    Download,
    /// 인증서 확인 버튼 (모달 팝업)
    #[serde(rename = "certificado")]
    Certificate,
    /// 새 조회(Nova Consulta) 버튼
    #[serde(rename = "nova_consulta")]
    NewQuery,
}

impl ElementRole {
    /// 전체 역할 목록 (고정 순서)
    pub const ALL: [ElementRole; 6] = [
        ElementRole::KeyField,
        ElementRole::Captcha,
        ElementRole::Continue,
        ElementRole::Download,
        ElementRole::Certificate,
        ElementRole::NewQuery,
    ];

    /// coordinates.json 키 이름
    pub fn key(&self) -> &'static str {
        match self {
            ElementRole::KeyField => "campo_chave",
            ElementRole::Captcha => "captcha",
            ElementRole::Continue => "continuar",
            ElementRole::Download => "download",
            ElementRole::Certificate => "certificado",
            ElementRole::NewQuery => "nova_consulta",
        }
    }

    /// 화면 대비 기대 상대 위치 (width 비율, height 비율)
    ///
    /// 포털 페이지의 일반적인 데스크톱 해상도 레이아웃 기준.
    pub fn expected_position(&self) -> (f64, f64) {
        match self {
            ElementRole::KeyField => (0.40, 0.40),
            ElementRole::Captcha => (0.30, 0.65),
            ElementRole::Continue => (0.40, 0.70),
            ElementRole::Download => (0.60, 0.70),
            ElementRole::Certificate => (0.50, 0.30),
            ElementRole::NewQuery => (0.20, 0.70),
        }
    }

    /// OCR 텍스트 확인 어휘 (포르투갈어, 소문자)
    pub fn vocabulary(&self) -> &'static [&'static str] {
        match self {
            ElementRole::KeyField => &["chave", "acesso", "nf-e", "código"],
            ElementRole::Captcha => &["humano", "robô", "verificação", "captcha"],
            ElementRole::Continue => &["continuar", "prosseguir", "avançar", "consulta"],
            ElementRole::Download => &["download", "baixar", "documento", "xml"],
            ElementRole::Certificate => &["ok", "confirmar", "certificado", "selecionar"],
            ElementRole::NewQuery => &["nova", "consulta", "novo", "voltar"],
        }
    }

    /// 디버그 오버레이 마커 색상 (RGB)
    pub fn marker_color(&self) -> (u8, u8, u8) {
        match self {
            ElementRole::KeyField => (0, 255, 0),
            ElementRole::Captcha => (255, 0, 0),
            ElementRole::Continue => (0, 0, 255),
            ElementRole::Download => (0, 255, 255),
            ElementRole::Certificate => (255, 0, 255),
            ElementRole::NewQuery => (255, 255, 0),
        }
    }
}

impl fmt::Display for ElementRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// 역할별 좌표 집합
///
/// 자동화 실행 중에는 읽기 전용으로 소비되며, 실행 사이에만 변경된다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NamedCoordinates {
    positions: HashMap<ElementRole, ScreenPosition>,
}

impl NamedCoordinates {
    /// 6개 역할 모두 (0, 0)으로 초기화된 기본 좌표 집합
    pub fn all_zero() -> Self {
        let mut positions = HashMap::new();
        for role in ElementRole::ALL {
            positions.insert(role, ScreenPosition::default());
        }
        Self { positions }
    }

    /// 역할의 좌표 조회
    pub fn get(&self, role: ElementRole) -> Option<ScreenPosition> {
        self.positions.get(&role).copied()
    }

    /// 역할의 설정된 좌표 조회 — 미설정 (0, 0)은 None
    pub fn get_set(&self, role: ElementRole) -> Option<ScreenPosition> {
        self.get(role).filter(ScreenPosition::is_set)
    }

    /// 역할의 좌표 설정
    pub fn set(&mut self, role: ElementRole, position: ScreenPosition) {
        self.positions.insert(role, position);
    }

    /// 설정된 (0이 아닌) 좌표 개수
    pub fn set_count(&self) -> usize {
        ElementRole::ALL
            .iter()
            .filter(|role| self.get_set(**role).is_some())
            .count()
    }

    /// 6개 역할 모두 설정되었는지 확인
    pub fn is_complete(&self) -> bool {
        self.set_count() == ElementRole::ALL.len()
    }

    /// (역할, 좌표) 순회 — 고정 역할 순서
    pub fn iter(&self) -> impl Iterator<Item = (ElementRole, Option<ScreenPosition>)> + '_ {
        ElementRole::ALL.iter().map(|role| (*role, self.get(*role)))
    }
}

/// 감지 후보 — 한 번의 감지 패스에서 생성되고 최고 후보 선택 후 폐기된다
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionCandidate {
    /// 바운딩 박스 좌상단 X
    pub x: i32,
    /// 바운딩 박스 좌상단 Y
    pub y: i32,
    /// 바운딩 박스 너비
    pub width: u32,
    /// 바운딩 박스 높이
    pub height: u32,
    /// 후보 영역 넓이 (픽셀)
    pub area: f64,
    /// 가로세로 비율 (width / height)
    pub aspect_ratio: f64,
    /// 합성 신뢰도 (0.0 ~ 1.0)
    pub confidence: f64,
}

impl DetectionCandidate {
    /// 바운딩 박스 중심 좌표
    pub fn center(&self) -> ScreenPosition {
        ScreenPosition {
            x: self.x + (self.width / 2) as i32,
            y: self.y + (self.height / 2) as i32,
        }
    }
}
