//! 설정 및 DI 와이어링 통합 테스트.
//!
//! AppConfig 기본값 → 어댑터/엔진 생성 검증.

use nfeauto_automation::engine::{AutomationEngine, EngineSettings};
use nfeauto_automation::input_driver::NoOpInputDriver;
use nfeauto_core::config::AppConfig;
use nfeauto_core::error::CoreError;
use nfeauto_core::models::run::RunStatus;
use nfeauto_core::ports::captcha_classifier::NoOpCaptchaClassifier;
use nfeauto_vision::captcha::CaptchaProbe;
use nfeauto_vision::capture::ScreenCapture;
use nfeauto_vision::detector::ElementDetector;
use nfeauto_vision::local_ocr_provider::NoOpOcrProvider;
use std::sync::Arc;

#[test]
fn config_defaults_are_valid() {
    let config = AppConfig::default_config();

    // 자동화 타이밍
    assert!(config.delay_between_actions > 0.0);
    assert!(config.captcha_timeout > 0);
    assert!(config.retry_attempts > 0);

    // 감지 설정
    assert_eq!(config.detection.color_profile, "orange");
    assert!(config.detection.ocr_enabled);

    // 단축키 — 설정에 문서화된 외부 인터페이스
    assert_eq!(config.hotkeys.start_automation, "F9");
    assert_eq!(config.hotkeys.pause_automation, "F10");
    assert_eq!(config.hotkeys.stop_automation, "F8");
    assert_eq!(config.hotkeys.emergency_stop, "esc");

    // DFe 웹서비스
    assert!(config.dfe.distribuicao_url.starts_with("https://"));
    assert!(config.dfe.consulta_url.starts_with("https://"));
    assert_eq!(config.dfe.tp_amb, 1);
    assert_eq!(config.dfe.cuf_autor, 35);
    assert_eq!(config.dfe.timeout_secs, 60);
}

#[test]
fn missing_json_keys_fall_back_to_defaults() {
    let config: AppConfig = serde_json::from_str(r#"{"theme": "dark"}"#).unwrap();
    assert_eq!(config.theme, "dark");
    assert_eq!(config.detection.color_profile, "orange");
    assert!((config.delay_between_actions - 2.0).abs() < f64::EPSILON);
}

#[test]
fn engine_settings_map_config_delay() {
    let mut config = AppConfig::default_config();
    config.delay_between_actions = 0.5;

    let settings = EngineSettings::from_config(&config);
    assert_eq!(settings.delay_between_actions.as_millis(), 500);
    // 나머지 타이밍은 포털 기본값 유지
    assert_eq!(settings.captcha_manual_timeout.as_secs(), 60);
    assert_eq!(settings.field_click_delay.as_millis(), 500);
}

#[test]
fn engine_wires_from_default_adapters() {
    let engine = AutomationEngine::new(
        EngineSettings::default(),
        Arc::new(NoOpInputDriver),
        Arc::new(ScreenCapture::new()),
        Arc::new(NoOpCaptchaClassifier),
    );

    assert_eq!(engine.status(), RunStatus::Idle);
    assert_eq!(engine.queue_len(), 0);

    // 좌표/키 없는 시작은 유효성 검증에서 거부
    let err = engine.start().unwrap_err();
    assert!(matches!(err, CoreError::Validation { .. }));
    assert_eq!(engine.status(), RunStatus::Idle);
}

#[test]
fn vision_adapters_instantiate() {
    let _detector = ElementDetector::new(Arc::new(NoOpOcrProvider::new()));
    let _probe = CaptchaProbe::new();
    let _capture = ScreenCapture::new();
}
