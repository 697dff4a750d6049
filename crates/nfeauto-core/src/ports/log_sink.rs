//! 운영자 로그 싱크 포트.
//!
//! 엔진이 진행 상황을 프레젠테이션 레이어에 전달하는 fire-and-forget 콜백이다.
//! 워커를 블로킹하면 안 되므로 동기 함수로 정의하고, 구현체는 즉시 반환해야 한다.

use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// 로그 레벨 (운영자 표시용)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// 일반 정보
    Info,
    /// 성공 (강조 표시)
    Success,
    /// 경고
    Warning,
    /// 에러
    Error,
}

/// 운영자 로그 싱크 — (레벨, 메시지) 수신, 반환값 없음
///
/// 구현체: `TracingLogSink` (tracing 전달), 테스트용 메모리 싱크
pub trait LogSink: Send + Sync {
    /// 로그 한 건 전달 — 블로킹 금지
    fn log(&self, level: LogLevel, message: &str);
}

/// tracing으로 전달하는 기본 로그 싱크
#[derive(Debug, Default)]
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Info => tracing::info!("{message}"),
            LogLevel::Success => tracing::info!("✅ {message}"),
            LogLevel::Warning => tracing::warn!("{message}"),
            LogLevel::Error => tracing::error!("{message}"),
        }
    }
}

/// 메모리에 누적하는 로그 싱크 (테스트/검사용)
#[derive(Debug, Default)]
pub struct MemoryLogSink {
    entries: Mutex<Vec<(LogLevel, String)>>,
}

impl MemoryLogSink {
    /// 새 메모리 싱크 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 누적된 로그 복제본
    pub fn entries(&self) -> Vec<(LogLevel, String)> {
        self.entries.lock().unwrap().clone()
    }

    /// 해당 레벨의 로그 수
    pub fn count(&self, level: LogLevel) -> usize {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| *l == level)
            .count()
    }

    /// 부분 문자열을 포함하는 로그가 있는지
    pub fn contains(&self, needle: &str) -> bool {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .any(|(_, msg)| msg.contains(needle))
    }
}

impl LogSink for MemoryLogSink {
    fn log(&self, level: LogLevel, message: &str) {
        self.entries.lock().unwrap().push((level, message.to_string()));
    }
}
