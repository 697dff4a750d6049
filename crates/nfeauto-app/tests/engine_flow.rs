//! 자동화 엔진 통합 테스트.
//!
//! 좌표 파일 + 키 파일 로드 → 전체 실행 → 키별 실패 격리와 통계 집계를
//! cross-crate 경로로 검증.

use async_trait::async_trait;
use nfeauto_automation::engine::{AutomationEngine, EngineSettings};
use nfeauto_automation::input_driver::NoOpInputDriver;
use nfeauto_core::coordinates::CoordinateStore;
use nfeauto_core::error::CoreError;
use nfeauto_core::models::element::{ElementRole, NamedCoordinates, ScreenPosition};
use nfeauto_core::models::run::RunStatus;
use nfeauto_core::ports::captcha_classifier::NoOpCaptchaClassifier;
use nfeauto_core::ports::input_driver::InputDriver;
use nfeauto_core::ports::screen_source::ScreenSource;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// 계속 버튼 좌표 클릭만 n번째에 실패시키는 드라이버
struct FlakyContinueDriver {
    continue_x: i32,
    continue_y: i32,
    continue_clicks: AtomicUsize,
    fail_on_nth: usize,
}

#[async_trait]
impl InputDriver for FlakyContinueDriver {
    async fn mouse_move(&self, _x: i32, _y: i32) -> Result<(), CoreError> {
        Ok(())
    }

    async fn mouse_click(&self, _button: &str, x: i32, y: i32) -> Result<(), CoreError> {
        if x == self.continue_x && y == self.continue_y {
            let n = self.continue_clicks.fetch_add(1, Ordering::SeqCst) + 1;
            if n == self.fail_on_nth {
                return Err(CoreError::Input("계속 버튼 클릭 실패".to_string()));
            }
        }
        Ok(())
    }

    async fn type_text(&self, _text: &str) -> Result<(), CoreError> {
        Ok(())
    }

    async fn key_press(&self, _key: &str) -> Result<(), CoreError> {
        Ok(())
    }

    async fn key_release(&self, _key: &str) -> Result<(), CoreError> {
        Ok(())
    }

    async fn hotkey(&self, _keys: &[String]) -> Result<(), CoreError> {
        Ok(())
    }

    fn platform(&self) -> &str {
        "test"
    }
}

/// 캡처가 불가능한 화면 소스 — CAPTCHA 단계는 Unknown 수동 대기로 넘어간다
struct BlankScreen;

#[async_trait]
impl ScreenSource for BlankScreen {
    async fn capture_full(&self) -> Result<Vec<u8>, CoreError> {
        Err(CoreError::Capture("테스트 화면 없음".to_string()))
    }

    async fn capture_region(
        &self,
        _x: i32,
        _y: i32,
        _width: u32,
        _height: u32,
    ) -> Result<Vec<u8>, CoreError> {
        Err(CoreError::Capture("테스트 화면 없음".to_string()))
    }

    async fn screen_size(&self) -> Result<(u32, u32), CoreError> {
        Ok((1920, 1080))
    }
}

fn fast_settings() -> EngineSettings {
    let tick = Duration::from_millis(1);
    EngineSettings {
        click_settle: tick,
        field_click_delay: tick,
        key_clear_settle: tick,
        continue_delay: tick,
        certificate_lead: tick,
        certificate_delay: tick,
        download_lead: tick,
        download_delay: tick,
        new_query_lead: tick,
        new_query_delay: tick,
        captcha_manual_timeout: Duration::from_millis(5),
        captcha_poll: tick,
        pause_poll: tick,
        delay_between_actions: tick,
    }
}

/// 좌표 JSON + 키 3건 파일을 임시 디렉토리에 기록
fn write_fixture_files(dir: &Path) -> (PathBuf, PathBuf) {
    let coords_path = dir.join("coordinates.json");
    let keys_path = dir.join("chaves.txt");

    let mut coords = NamedCoordinates::all_zero();
    coords.set(ElementRole::KeyField, ScreenPosition::new(768, 432));
    coords.set(ElementRole::Captcha, ScreenPosition::new(576, 702));
    coords.set(ElementRole::Continue, ScreenPosition::new(960, 700));
    coords.set(ElementRole::Download, ScreenPosition::new(1100, 700));
    coords.set(ElementRole::Certificate, ScreenPosition::new(960, 540));
    coords.set(ElementRole::NewQuery, ScreenPosition::new(300, 700));
    let store = CoordinateStore::with_path(coords_path.clone()).unwrap();
    store.replace(coords).unwrap();

    let mut keys = std::fs::File::create(&keys_path).unwrap();
    for i in 1..=3 {
        writeln!(keys, "{i:044}").unwrap();
    }

    (coords_path, keys_path)
}

/// 두 번째 키의 계속 클릭 실패는 해당 키에만 격리되고 나머지는 완주
#[tokio::test]
async fn continue_failure_on_second_key_is_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let (coords_path, keys_path) = write_fixture_files(dir.path());

    let driver = FlakyContinueDriver {
        continue_x: 960,
        continue_y: 700,
        continue_clicks: AtomicUsize::new(0),
        fail_on_nth: 2,
    };
    let engine = AutomationEngine::new(
        fast_settings(),
        Arc::new(driver),
        Arc::new(BlankScreen),
        Arc::new(NoOpCaptchaClassifier),
    );

    let loaded = engine.load_configuration(&coords_path, &keys_path).unwrap();
    assert_eq!(loaded, 3);

    engine.start().unwrap();
    engine.wait().await;

    let stats = engine.statistics();
    assert_eq!(stats.processed, 3);
    assert_eq!(stats.succeeded, 2);
    assert_eq!(stats.failed, 1);
    assert_eq!(engine.failed_keys(), vec![format!("{:044}", 2)]);
    assert_eq!(engine.status(), RunStatus::Idle);
}

/// NoOp 드라이버 드라이런 — 전 키 성공, CAPTCHA 자동 처리 0건
#[tokio::test]
async fn noop_dry_run_completes_all_keys() {
    let dir = tempfile::tempdir().unwrap();
    let (coords_path, keys_path) = write_fixture_files(dir.path());

    let engine = AutomationEngine::new(
        fast_settings(),
        Arc::new(NoOpInputDriver),
        Arc::new(BlankScreen),
        Arc::new(NoOpCaptchaClassifier),
    );
    engine.load_configuration(&coords_path, &keys_path).unwrap();

    engine.start().unwrap();
    engine.wait().await;

    let stats = engine.statistics();
    assert_eq!(stats.processed, 3);
    assert_eq!(stats.succeeded, 3);
    assert_eq!(stats.failed, 0);
    assert_eq!(stats.captchas_handled, 0);
    assert_eq!(stats.current_index, 3);
    assert_eq!(engine.status(), RunStatus::Idle);
}
