//! 애플리케이션 설정 구조체.
//!
//! 자동화 지연/타임아웃, 단축키 바인딩, 감지 프로파일, DFe 웹서비스 설정 등
//! 런타임 설정을 정의한다. config.json에서 serde로 로드되며,
//! 누락된 키는 필드별 기본값으로 대체된다.

use serde::{Deserialize, Serialize};

/// 최상위 애플리케이션 설정
///
/// 상위 필드는 기존 config.json 키와 1:1 대응하고,
/// 이후 추가된 설정은 섹션 구조체로 묶는다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 창 크기 ("너비x높이")
    #[serde(default = "default_window_size")]
    pub window_size: String,
    /// UI 테마
    #[serde(default = "default_theme")]
    pub theme: String,
    /// 좌표/설정 자동 저장 여부
    #[serde(default = "default_true")]
    pub auto_save: bool,
    /// 실패 키 재시도 횟수 (운영자 재실행 시 참고값)
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    /// 자동화 동작 간 지연 (초)
    #[serde(default = "default_delay_between_actions")]
    pub delay_between_actions: f64,
    /// CAPTCHA 처리 타임아웃 (초)
    #[serde(default = "default_captcha_timeout")]
    pub captcha_timeout: u64,
    /// 스크린샷/디버그 이미지 저장 경로
    #[serde(default = "default_screenshot_path")]
    pub screenshot_path: String,
    /// 제어 단축키 바인딩
    #[serde(default)]
    pub hotkeys: HotkeyConfig,
    /// 요소 감지 설정
    #[serde(default)]
    pub detection: DetectionConfig,
    /// DFe 웹서비스 설정
    #[serde(default)]
    pub dfe: DfeConfig,
}

impl AppConfig {
    /// 기본 설정값 반환
    pub fn default_config() -> Self {
        Self {
            window_size: default_window_size(),
            theme: default_theme(),
            auto_save: true,
            retry_attempts: default_retry_attempts(),
            delay_between_actions: default_delay_between_actions(),
            captcha_timeout: default_captcha_timeout(),
            screenshot_path: default_screenshot_path(),
            hotkeys: HotkeyConfig::default(),
            detection: DetectionConfig::default(),
            dfe: DfeConfig::default(),
        }
    }
}

// ============================================================
// 단축키 설정
// ============================================================

/// 제어 단축키 바인딩
///
/// 문서화된 외부 인터페이스로 유지된다. 바이너리의 대화형 콘솔은
/// 동일한 명령(start/pause/stop/emergency)을 엔진에 제출한다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotkeyConfig {
    /// 자동화 시작
    #[serde(default = "default_hotkey_start")]
    pub start_automation: String,
    /// 일시 정지/재개 토글
    #[serde(default = "default_hotkey_pause")]
    pub pause_automation: String,
    /// 정상 중지 (현재 키까지 처리)
    #[serde(default = "default_hotkey_stop")]
    pub stop_automation: String,
    /// 비상 정지 (즉시 중단)
    #[serde(default = "default_hotkey_emergency")]
    pub emergency_stop: String,
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            start_automation: default_hotkey_start(),
            pause_automation: default_hotkey_pause(),
            stop_automation: default_hotkey_stop(),
            emergency_stop: default_hotkey_emergency(),
        }
    }
}

// ============================================================
// 감지 설정
// ============================================================

/// 요소 감지 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// 색상 버튼 감지 프로파일 ("orange" | "green" | "blue")
    #[serde(default = "default_color_profile")]
    pub color_profile: String,
    /// OCR 텍스트 확인 사용 여부
    #[serde(default = "default_true")]
    pub ocr_enabled: bool,
    /// 감지 후 디버그 오버레이 이미지 저장 여부
    #[serde(default)]
    pub save_debug_image: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            color_profile: default_color_profile(),
            ocr_enabled: true,
            save_debug_image: false,
        }
    }
}

// ============================================================
// DFe 웹서비스 설정
// ============================================================

/// DFe 웹서비스(SOAP/TLS) 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DfeConfig {
    /// NFeDistribuicaoDFe 엔드포인트
    #[serde(default = "default_dfe_endpoint")]
    pub distribuicao_url: String,
    /// NFeConsulta2 엔드포인트 (상태 조회)
    #[serde(default = "default_consulta_endpoint")]
    pub consulta_url: String,
    /// 요청자 CNPJ (14자리)
    #[serde(default)]
    pub cnpj: String,
    /// 환경 구분 (1 = 운영, 2 = 테스트)
    #[serde(default = "default_tp_amb")]
    pub tp_amb: u8,
    /// 요청자 UF 코드 (35 = 상파울루)
    #[serde(default = "default_cuf_autor")]
    pub cuf_autor: u8,
    /// PKCS#12 인증서 파일 경로
    #[serde(default)]
    pub pfx_path: String,
    /// XML 출력 디렉토리
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    /// 요청 타임아웃 (초)
    #[serde(default = "default_dfe_timeout")]
    pub timeout_secs: u64,
}

impl Default for DfeConfig {
    fn default() -> Self {
        Self {
            distribuicao_url: default_dfe_endpoint(),
            consulta_url: default_consulta_endpoint(),
            cnpj: String::new(),
            tp_amb: default_tp_amb(),
            cuf_autor: default_cuf_autor(),
            pfx_path: String::new(),
            output_dir: default_output_dir(),
            timeout_secs: default_dfe_timeout(),
        }
    }
}

// ============================================================
// 기본값 함수
// ============================================================

fn default_true() -> bool {
    true
}

fn default_window_size() -> String {
    "1200x800".to_string()
}

fn default_theme() -> String {
    "light".to_string()
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_delay_between_actions() -> f64 {
    2.0
}

fn default_captcha_timeout() -> u64 {
    30
}

fn default_screenshot_path() -> String {
    "screenshots/".to_string()
}

fn default_hotkey_start() -> String {
    "F9".to_string()
}

fn default_hotkey_pause() -> String {
    "F10".to_string()
}

fn default_hotkey_stop() -> String {
    "F8".to_string()
}

fn default_hotkey_emergency() -> String {
    "esc".to_string()
}

fn default_color_profile() -> String {
    "orange".to_string()
}

fn default_dfe_endpoint() -> String {
    "https://www1.nfe.fazenda.gov.br/NFeDistribuicaoDFe/NFeDistribuicaoDFe.asmx".to_string()
}

fn default_consulta_endpoint() -> String {
    "https://nfe.fazenda.sp.gov.br/ws/nfeconsulta2.asmx".to_string()
}

fn default_tp_amb() -> u8 {
    1
}

fn default_cuf_autor() -> u8 {
    35
}

fn default_output_dir() -> String {
    "xmls/".to_string()
}

fn default_dfe_timeout() -> u64 {
    60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = AppConfig::default_config();
        assert_eq!(config.window_size, "1200x800");
        assert_eq!(config.theme, "light");
        assert!(config.auto_save);
        assert_eq!(config.retry_attempts, 3);
        assert!((config.delay_between_actions - 2.0).abs() < f64::EPSILON);
        assert_eq!(config.captcha_timeout, 30);
        assert_eq!(config.hotkeys.start_automation, "F9");
        assert_eq!(config.hotkeys.pause_automation, "F10");
        assert_eq!(config.hotkeys.stop_automation, "F8");
        assert_eq!(config.hotkeys.emergency_stop, "esc");
        assert_eq!(config.detection.color_profile, "orange");
        assert_eq!(config.dfe.tp_amb, 1);
        assert_eq!(config.dfe.cuf_autor, 35);
        assert_eq!(config.dfe.timeout_secs, 60);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let json = r#"{ "theme": "dark", "hotkeys": { "start_automation": "F5" } }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.theme, "dark");
        assert_eq!(config.hotkeys.start_automation, "F5");
        // 나머지는 기본값 유지
        assert_eq!(config.hotkeys.pause_automation, "F10");
        assert_eq!(config.window_size, "1200x800");
        assert_eq!(config.detection.color_profile, "orange");
    }

    #[test]
    fn config_serde_roundtrip() {
        let mut config = AppConfig::default_config();
        config.dfe.cnpj = "12345678000195".to_string();
        config.detection.save_debug_image = true;

        let json = serde_json::to_string_pretty(&config).unwrap();
        let reloaded: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(reloaded.dfe.cnpj, "12345678000195");
        assert!(reloaded.detection.save_debug_image);
    }
}
