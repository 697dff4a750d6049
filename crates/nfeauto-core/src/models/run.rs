//! 자동화 실행 모델.
//!
//! 실행 상태 머신, 키별 처리 단계, 누적 통계 구조체를 정의한다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// 자동화 실행 상태
///
/// Idle → Running ⇄ Paused → {Stopped | Error} → (새 실행 시) Running.
/// Stopped와 Error는 현재 실행에 대해 종결 상태이다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// 대기 (초기 상태이자 정상 종료 후 상태)
    #[default]
    Idle,
    /// 실행 중
    Running,
    /// 일시 정지
    Paused,
    /// 중지됨 (비상 정지 포함)
    Stopped,
    /// 실행 중 치명적 에러 발생
    Error,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RunStatus::Idle => "idle",
            RunStatus::Running => "running",
            RunStatus::Paused => "paused",
            RunStatus::Stopped => "stopped",
            RunStatus::Error => "error",
        };
        f.write_str(label)
    }
}

/// 키 처리 단계 (키당 6단계, 순서 고정)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// 1. 키 입력 필드에 접근 키 입력
    EnterKey,
    /// 2. CAPTCHA 처리 (자동 시도 후 수동 대기)
    Captcha,
    /// 3. 계속 버튼 클릭
    Continue,
    /// 4. 인증서 선택 (best-effort)
    Certificate,
    /// 5. XML 다운로드 클릭
    Download,
    /// 6. 새 조회로 페이지 초기화
    NewQuery,
}

impl StepKind {
    /// 단계 순서 (1부터)
    pub fn ordinal(&self) -> u8 {
        match self {
            StepKind::EnterKey => 1,
            StepKind::Captcha => 2,
            StepKind::Continue => 3,
            StepKind::Certificate => 4,
            StepKind::Download => 5,
            StepKind::NewQuery => 6,
        }
    }
}

/// 자동화 실행 통계
///
/// 워커 태스크가 갱신하고 폴링 스레드가 스냅샷으로 읽는다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStats {
    /// 실행 식별자
    pub run_id: Uuid,
    /// 대기열 전체 키 수
    pub total_keys: usize,
    /// 처리 완료한 키 수 (성공 + 실패)
    pub processed: usize,
    /// 성공한 키 수
    pub succeeded: usize,
    /// 실패한 키 수
    pub failed: usize,
    /// 처리한 CAPTCHA 수 (자동 해결 성공 건)
    pub captchas_handled: usize,
    /// 현재 처리 중인 키 순번 (1부터, 0 = 시작 전)
    pub current_index: usize,
    /// 실행 시작 시각
    pub start_time: Option<DateTime<Utc>>,
    /// 실행 종료 시각
    pub end_time: Option<DateTime<Utc>>,
}

impl RunStats {
    /// 새 통계 생성 (카운터 0, 타임스탬프 없음)
    pub fn new(total_keys: usize) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            total_keys,
            processed: 0,
            succeeded: 0,
            failed: 0,
            captchas_handled: 0,
            current_index: 0,
            start_time: None,
            end_time: None,
        }
    }

    /// 성공률 (%) — 처리 건이 없으면 0.0
    pub fn success_rate(&self) -> f64 {
        if self.processed == 0 {
            return 0.0;
        }
        (self.succeeded as f64 / self.processed as f64) * 100.0
    }

    /// 실행 소요 시간 (초) — 종료 전이면 현재 시각 기준
    pub fn duration_secs(&self) -> Option<i64> {
        let start = self.start_time?;
        let end = self.end_time.unwrap_or_else(Utc::now);
        Some((end - start).num_seconds())
    }
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_status_is_idle() {
        assert_eq!(RunStatus::default(), RunStatus::Idle);
    }

    #[test]
    fn step_ordinals_are_sequential() {
        let steps = [
            StepKind::EnterKey,
            StepKind::Captcha,
            StepKind::Continue,
            StepKind::Certificate,
            StepKind::Download,
            StepKind::NewQuery,
        ];
        for (i, step) in steps.iter().enumerate() {
            assert_eq!(step.ordinal() as usize, i + 1);
        }
    }

    #[test]
    fn success_rate_without_processed() {
        let stats = RunStats::new(10);
        assert_eq!(stats.success_rate(), 0.0);
    }

    #[test]
    fn success_rate_with_mixed_results() {
        let mut stats = RunStats::new(3);
        stats.processed = 3;
        stats.succeeded = 2;
        stats.failed = 1;
        assert!((stats.success_rate() - 66.666).abs() < 0.01);
    }

    #[test]
    fn duration_uses_end_time() {
        let mut stats = RunStats::new(1);
        let start = Utc::now();
        stats.start_time = Some(start);
        stats.end_time = Some(start + chrono::Duration::seconds(42));
        assert_eq!(stats.duration_secs(), Some(42));
    }

    #[test]
    fn stats_serde_roundtrip() {
        let mut stats = RunStats::new(5);
        stats.processed = 2;
        stats.captchas_handled = 1;
        let json = serde_json::to_string(&stats).unwrap();
        let deser: RunStats = serde_json::from_str(&json).unwrap();
        assert_eq!(deser.total_keys, 5);
        assert_eq!(deser.processed, 2);
        assert_eq!(deser.captchas_handled, 1);
    }
}
