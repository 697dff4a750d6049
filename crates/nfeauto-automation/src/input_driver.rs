//! 입력 드라이버 구현.
//!
//! 포털 자동화는 브라우저 창에 절대 좌표로 클릭/타이핑을 보내는 블라인드
//! 방식이므로, 드라이버는 좌표와 문자열만 받는다. `NoOpInputDriver`(드라이런/
//! 테스트용)와 `EnigoInputDriver`(실제 입력, `enigo` feature)를 제공한다.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use nfeauto_core::error::CoreError;
use nfeauto_core::ports::input_driver::InputDriver;

// ============================================================
// NoOpInputDriver — 드라이런/테스트용
// ============================================================

/// No-Op 입력 드라이버 — 모든 입력을 로깅만 하고 실행하지 않음
///
/// `--dry-run` 모드와 테스트에서 사용. 화면에는 아무 일도 일어나지 않는다.
pub struct NoOpInputDriver;

#[async_trait]
impl InputDriver for NoOpInputDriver {
    async fn mouse_move(&self, x: i32, y: i32) -> Result<(), CoreError> {
        debug!(x, y, "[NoOp] 마우스 이동");
        Ok(())
    }

    async fn mouse_click(&self, button: &str, x: i32, y: i32) -> Result<(), CoreError> {
        debug!(button, x, y, "[NoOp] 마우스 클릭");
        Ok(())
    }

    async fn type_text(&self, text: &str) -> Result<(), CoreError> {
        debug!(text_len = text.len(), "[NoOp] 텍스트 입력");
        Ok(())
    }

    async fn key_press(&self, key: &str) -> Result<(), CoreError> {
        debug!(key, "[NoOp] 키 누름");
        Ok(())
    }

    async fn key_release(&self, key: &str) -> Result<(), CoreError> {
        debug!(key, "[NoOp] 키 놓음");
        Ok(())
    }

    async fn hotkey(&self, keys: &[String]) -> Result<(), CoreError> {
        debug!(?keys, "[NoOp] 단축키 실행");
        Ok(())
    }

    fn platform(&self) -> &str {
        "noop"
    }
}

// ============================================================
// EnigoInputDriver — 실제 마우스/키보드 입력
// ============================================================

/// 실제 마우스/키보드 입력 드라이버 (enigo 기반)
///
/// macOS: Accessibility 권한 필요
/// Windows: UIAccess 또는 관리자 권한 필요
/// Linux: X11 또는 Wayland + uinput 권한 필요
#[cfg(feature = "enigo")]
pub struct EnigoInputDriver {
    /// enigo 인스턴스 (Send지만 !Sync → tokio::sync::Mutex 사용)
    enigo: tokio::sync::Mutex<enigo::Enigo>,
}

#[cfg(feature = "enigo")]
impl EnigoInputDriver {
    /// 새 EnigoInputDriver 생성
    pub fn new() -> Result<Self, CoreError> {
        let settings = enigo::Settings::default();
        let enigo = enigo::Enigo::new(&settings)
            .map_err(|e| CoreError::Input(format!("입력 드라이버 초기화 실패: {e}")))?;
        Ok(Self {
            enigo: tokio::sync::Mutex::new(enigo),
        })
    }

    /// 문자열 → enigo 키 매핑
    ///
    /// 자동화 시퀀스가 쓰는 키(delete, ctrl, 숫자/문자)와 설정 파일의
    /// 단축키 바인딩(F8/F9/F10/Esc)만 인식한다. 알 수 없는 키는 에러.
    fn parse_key(key: &str) -> Result<enigo::Key, CoreError> {
        let parsed = match key.to_lowercase().as_str() {
            "enter" | "return" => enigo::Key::Return,
            "tab" => enigo::Key::Tab,
            "escape" | "esc" => enigo::Key::Escape,
            "backspace" => enigo::Key::Backspace,
            "delete" | "del" => enigo::Key::Delete,
            "space" => enigo::Key::Space,
            "ctrl" | "control" => enigo::Key::Control,
            "shift" => enigo::Key::Shift,
            "alt" | "option" => enigo::Key::Alt,
            "meta" | "command" | "cmd" | "super" | "win" => enigo::Key::Meta,
            "f1" => enigo::Key::F1,
            "f2" => enigo::Key::F2,
            "f3" => enigo::Key::F3,
            "f4" => enigo::Key::F4,
            "f5" => enigo::Key::F5,
            "f6" => enigo::Key::F6,
            "f7" => enigo::Key::F7,
            "f8" => enigo::Key::F8,
            "f9" => enigo::Key::F9,
            "f10" => enigo::Key::F10,
            "f11" => enigo::Key::F11,
            "f12" => enigo::Key::F12,
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) => enigo::Key::Unicode(ch),
                    _ => {
                        return Err(CoreError::Input(format!("알 수 없는 키: {key}")));
                    }
                }
            }
        };
        Ok(parsed)
    }
}

#[cfg(feature = "enigo")]
#[async_trait]
impl InputDriver for EnigoInputDriver {
    async fn mouse_move(&self, x: i32, y: i32) -> Result<(), CoreError> {
        use enigo::Mouse;
        debug!(x, y, "[Enigo] 마우스 이동");
        let mut enigo = self.enigo.lock().await;
        enigo
            .move_mouse(x, y, enigo::Coordinate::Abs)
            .map_err(|e| CoreError::Input(format!("마우스 이동 실패: {e}")))?;
        Ok(())
    }

    async fn mouse_click(&self, button: &str, x: i32, y: i32) -> Result<(), CoreError> {
        use enigo::Mouse;
        debug!(button, x, y, "[Enigo] 마우스 클릭");
        let mut enigo = self.enigo.lock().await;
        enigo
            .move_mouse(x, y, enigo::Coordinate::Abs)
            .map_err(|e| CoreError::Input(format!("마우스 이동 실패: {e}")))?;
        let btn = match parse_mouse_button(button) {
            "right" => enigo::Button::Right,
            "middle" => enigo::Button::Middle,
            _ => enigo::Button::Left,
        };
        enigo
            .button(btn, enigo::Direction::Click)
            .map_err(|e| CoreError::Input(format!("마우스 클릭 실패: {e}")))?;
        Ok(())
    }

    async fn type_text(&self, text: &str) -> Result<(), CoreError> {
        use enigo::Keyboard;
        debug!(text_len = text.len(), "[Enigo] 텍스트 입력");
        let mut enigo = self.enigo.lock().await;
        enigo
            .text(text)
            .map_err(|e| CoreError::Input(format!("텍스트 입력 실패: {e}")))?;
        Ok(())
    }

    async fn key_press(&self, key: &str) -> Result<(), CoreError> {
        use enigo::Keyboard;
        debug!(key, "[Enigo] 키 누름");
        let parsed = Self::parse_key(key)?;
        let mut enigo = self.enigo.lock().await;
        enigo
            .key(parsed, enigo::Direction::Press)
            .map_err(|e| CoreError::Input(format!("키 누름 실패: {e}")))?;
        Ok(())
    }

    async fn key_release(&self, key: &str) -> Result<(), CoreError> {
        use enigo::Keyboard;
        debug!(key, "[Enigo] 키 놓음");
        let parsed = Self::parse_key(key)?;
        let mut enigo = self.enigo.lock().await;
        enigo
            .key(parsed, enigo::Direction::Release)
            .map_err(|e| CoreError::Input(format!("키 놓음 실패: {e}")))?;
        Ok(())
    }

    async fn hotkey(&self, keys: &[String]) -> Result<(), CoreError> {
        use enigo::Keyboard;
        debug!(?keys, "[Enigo] 단축키 실행");
        let parsed = keys
            .iter()
            .map(|k| Self::parse_key(k))
            .collect::<Result<Vec<_>, _>>()?;
        let mut enigo = self.enigo.lock().await;
        // 모든 키 순서대로 Press → 역순 Release
        for key in &parsed {
            enigo
                .key(*key, enigo::Direction::Press)
                .map_err(|e| CoreError::Input(format!("단축키 Press 실패: {e}")))?;
        }
        for key in parsed.iter().rev() {
            enigo
                .key(*key, enigo::Direction::Release)
                .map_err(|e| CoreError::Input(format!("단축키 Release 실패: {e}")))?;
        }
        Ok(())
    }

    fn platform(&self) -> &str {
        #[cfg(target_os = "macos")]
        {
            "macos"
        }
        #[cfg(target_os = "windows")]
        {
            "windows"
        }
        #[cfg(target_os = "linux")]
        {
            "linux"
        }
        #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
        {
            "unknown"
        }
    }
}

// ============================================================
// 유틸리티
// ============================================================

/// 문자열 → 마우스 버튼 정규화
///
/// 인식 가능한 값: "left", "right", "middle" (축약형 l/r/m 포함).
/// 그 외는 left로 처리한다 — 자동화 시퀀스는 좌클릭만 사용한다.
pub fn parse_mouse_button(button: &str) -> &'static str {
    match button.to_lowercase().as_str() {
        "right" | "r" => "right",
        "middle" | "m" => "middle",
        _ => "left",
    }
}

/// 플랫폼별 입력 드라이버 생성 팩토리
///
/// `enigo` feature 활성화 시 실제 입력 드라이버 반환,
/// 비활성화 또는 초기화 실패 시 NoOp 드라이버 반환.
pub fn create_platform_input_driver() -> Arc<dyn InputDriver> {
    #[cfg(feature = "enigo")]
    {
        match EnigoInputDriver::new() {
            Ok(driver) => {
                tracing::info!("실제 입력 드라이버 (enigo) 초기화 완료");
                return Arc::new(driver);
            }
            Err(e) => {
                tracing::warn!("enigo 초기화 실패, NoOp 폴백: {e}");
            }
        }
    }
    Arc::new(NoOpInputDriver)
}

// ============================================================
// 테스트
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_driver_all_methods_ok() {
        let driver = NoOpInputDriver;
        assert!(driver.mouse_move(100, 200).await.is_ok());
        assert!(driver.mouse_click("left", 100, 200).await.is_ok());
        assert!(driver.type_text("35200714200166").await.is_ok());
        assert!(driver.key_press("delete").await.is_ok());
        assert!(driver.key_release("delete").await.is_ok());
        assert!(driver
            .hotkey(&["ctrl".to_string(), "a".to_string()])
            .await
            .is_ok());
    }

    #[test]
    fn noop_driver_platform() {
        let driver = NoOpInputDriver;
        assert_eq!(driver.platform(), "noop");
    }

    #[test]
    fn parse_mouse_button_variants() {
        assert_eq!(parse_mouse_button("left"), "left");
        assert_eq!(parse_mouse_button("L"), "left");
        assert_eq!(parse_mouse_button("right"), "right");
        assert_eq!(parse_mouse_button("r"), "right");
        assert_eq!(parse_mouse_button("middle"), "middle");
        assert_eq!(parse_mouse_button("M"), "middle");
    }

    #[test]
    fn parse_mouse_button_default_is_left() {
        assert_eq!(parse_mouse_button("unknown"), "left");
        assert_eq!(parse_mouse_button(""), "left");
    }

    #[test]
    fn factory_creates_driver() {
        let driver = create_platform_input_driver();
        // enigo feature 비활성화 시 noop, 활성화 시 플랫폼별
        let platform = driver.platform();
        assert!(!platform.is_empty());
    }

    #[cfg(feature = "enigo")]
    #[test]
    fn enigo_parse_key_special_keys() {
        assert!(matches!(
            EnigoInputDriver::parse_key("Enter"),
            Ok(enigo::Key::Return)
        ));
        assert!(matches!(
            EnigoInputDriver::parse_key("esc"),
            Ok(enigo::Key::Escape)
        ));
        assert!(matches!(
            EnigoInputDriver::parse_key("Ctrl"),
            Ok(enigo::Key::Control)
        ));
        assert!(matches!(
            EnigoInputDriver::parse_key("delete"),
            Ok(enigo::Key::Delete)
        ));
        // 설정 파일 단축키 바인딩 기본값
        assert!(matches!(
            EnigoInputDriver::parse_key("F8"),
            Ok(enigo::Key::F8)
        ));
        assert!(matches!(
            EnigoInputDriver::parse_key("F9"),
            Ok(enigo::Key::F9)
        ));
        assert!(matches!(
            EnigoInputDriver::parse_key("F10"),
            Ok(enigo::Key::F10)
        ));
    }

    #[cfg(feature = "enigo")]
    #[test]
    fn enigo_parse_key_unicode_and_unknown() {
        assert!(matches!(
            EnigoInputDriver::parse_key("a"),
            Ok(enigo::Key::Unicode('a'))
        ));
        assert!(matches!(
            EnigoInputDriver::parse_key("7"),
            Ok(enigo::Key::Unicode('7'))
        ));
        assert!(EnigoInputDriver::parse_key("definitely-not-a-key").is_err());
    }
}
