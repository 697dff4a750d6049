//! 자동화 엔진.
//!
//! 접근 키 대기열을 키당 6단계 시퀀스로 처리하는 단일 워커 태스크와
//! 그 상태 머신(Idle → Running ⇄ Paused → {Stopped | Error} → Idle)을 구현한다.
//! 제어 메서드(start/toggle_pause/stop/emergency_stop)는 임의 스레드에서 호출
//! 가능하며, 워커는 공유 플래그를 단계 사이와 모든 대기 내부에서 100ms 단위로
//! 확인한다. 화면 입력은 단일 워커가 독점하므로 동작이 겹치지 않는다.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use nfeauto_core::config::AppConfig;
use nfeauto_core::coordinates::CoordinateStore;
use nfeauto_core::error::CoreError;
use nfeauto_core::keys::{load_key_file, InvoiceKey};
use nfeauto_core::models::element::{ElementRole, NamedCoordinates, ScreenPosition};
use nfeauto_core::models::run::{RunStats, RunStatus, StepKind};
use nfeauto_core::ports::captcha_classifier::{CaptchaClassifier, CaptchaKind};
use nfeauto_core::ports::input_driver::InputDriver;
use nfeauto_core::ports::log_sink::{LogLevel, LogSink, TracingLogSink};
use nfeauto_core::ports::screen_source::ScreenSource;

/// 키당 단계 실행 순서
const STEP_SEQUENCE: [StepKind; 6] = [
    StepKind::EnterKey,
    StepKind::Captcha,
    StepKind::Continue,
    StepKind::Certificate,
    StepKind::Download,
    StepKind::NewQuery,
];

/// CAPTCHA 캡처 영역 크기 — 저장된 체크박스 좌표 중심 100×50
const CAPTCHA_REGION_WIDTH: u32 = 100;
/// CAPTCHA 캡처 영역 높이
const CAPTCHA_REGION_HEIGHT: u32 = 50;

/// 단계 표시 이름 (운영자 로그용)
fn step_label(step: StepKind) -> &'static str {
    match step {
        StepKind::EnterKey => "키 입력",
        StepKind::Captcha => "CAPTCHA",
        StepKind::Continue => "계속",
        StepKind::Certificate => "인증서",
        StepKind::Download => "다운로드",
        StepKind::NewQuery => "새 조회",
    }
}

// ============================================================
// 설정
// ============================================================

/// 엔진 타이밍 설정
///
/// 모든 대기 시간을 이름 있는 필드로 노출한다. 테스트는 밀리초 단위로 줄여서
/// 실행하고, 설정 파일에서는 `delay_between_actions`만 조정할 수 있다.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// 마우스 이동 후 클릭 전 정착 대기
    pub click_settle: Duration,
    /// 키 입력 필드 클릭 후 대기
    pub field_click_delay: Duration,
    /// 필드 비우기(전체 선택, 삭제) 단계 간 대기
    pub key_clear_settle: Duration,
    /// 계속 버튼 클릭 후 페이지 로드 대기
    pub continue_delay: Duration,
    /// 인증서 창 출현 대기
    pub certificate_lead: Duration,
    /// 인증서 확인 클릭 후 대기
    pub certificate_delay: Duration,
    /// 다운로드 버튼 출현 대기
    pub download_lead: Duration,
    /// 다운로드 클릭 후 완료 대기
    pub download_delay: Duration,
    /// 새 조회 버튼 출현 대기
    pub new_query_lead: Duration,
    /// 새 조회 클릭 후 페이지 초기화 대기
    pub new_query_delay: Duration,
    /// CAPTCHA 수동 해결 최대 대기 (일시정지 시간은 소모하지 않음)
    pub captcha_manual_timeout: Duration,
    /// CAPTCHA 수동 해결 폴링 간격
    pub captcha_poll: Duration,
    /// 일시정지/정지 플래그 폴링 간격 (대기 분할 단위)
    pub pause_poll: Duration,
    /// 키 간 대기
    pub delay_between_actions: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            click_settle: Duration::from_millis(200),
            field_click_delay: Duration::from_millis(500),
            key_clear_settle: Duration::from_millis(200),
            continue_delay: Duration::from_secs(3),
            certificate_lead: Duration::from_secs(2),
            certificate_delay: Duration::from_secs(1),
            download_lead: Duration::from_secs(3),
            download_delay: Duration::from_secs(3),
            new_query_lead: Duration::from_secs(2),
            new_query_delay: Duration::from_secs(2),
            captcha_manual_timeout: Duration::from_secs(60),
            captcha_poll: Duration::from_millis(500),
            pause_poll: Duration::from_millis(100), // 폴링 한 사이클 안에 정지 반영
            delay_between_actions: Duration::from_secs(2),
        }
    }
}

impl EngineSettings {
    /// 앱 설정 반영 — 설정 파일에는 `delay_between_actions`만 노출된다
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            delay_between_actions: Duration::from_secs_f64(
                config.delay_between_actions.max(0.0),
            ),
            ..Self::default()
        }
    }
}

// ============================================================
// 공유 상태
// ============================================================

/// 제어 메서드와 워커가 공유하는 실행 컨텍스트
///
/// 플래그 쓰기는 모두 멱등한 단일 값 설정이므로 AtomicBool로 충분하다.
#[derive(Default)]
struct EngineShared {
    /// 워커 생존 플래그 — 비상 정지와 종료 처리에서만 false로 전환
    running: AtomicBool,
    /// 일시정지 플래그
    paused: AtomicBool,
    /// 점진적 정지 요청 플래그
    stop_requested: AtomicBool,
    /// 표시용 실행 상태
    status: RwLock<RunStatus>,
    /// 누적 통계
    stats: Mutex<RunStats>,
    /// 실패한 키 목록 (운영자 재시도용, 전체 키 문자열)
    failed_keys: Mutex<Vec<String>>,
}

/// 키 한 건의 시퀀스 처리 결과
enum StepOutcome {
    /// 6단계 모두 성공
    Success,
    /// 해당 단계에서 실패 — 남은 단계 생략, 다음 키로 진행
    Failed(StepKind),
    /// 정지/비상 정지로 중단 — 이 키는 집계하지 않음
    Interrupted,
}

// ============================================================
// AutomationEngine
// ============================================================

/// 자동화 엔진 — 대기열 관리 + 제어 표면 + 워커 스폰
///
/// 포트(입력 드라이버, 화면 소스, CAPTCHA 분류기)는 생성 시 주입한다.
/// 엔진 자체는 `Arc`로 감싸 프레젠테이션 레이어와 공유한다.
pub struct AutomationEngine {
    settings: EngineSettings,
    input: Arc<dyn InputDriver>,
    screen: Arc<dyn ScreenSource>,
    captcha: Arc<dyn CaptchaClassifier>,
    log: Arc<dyn LogSink>,
    /// 6개 역할 좌표 (시작 시 스냅샷을 워커에 복사)
    coordinates: RwLock<NamedCoordinates>,
    /// 처리 대기열
    keys: RwLock<Vec<InvoiceKey>>,
    shared: Arc<EngineShared>,
    /// 현재 워커 핸들
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl AutomationEngine {
    /// 새 엔진 생성 — 로그 싱크는 기본값으로 tracing 전달
    pub fn new(
        settings: EngineSettings,
        input: Arc<dyn InputDriver>,
        screen: Arc<dyn ScreenSource>,
        captcha: Arc<dyn CaptchaClassifier>,
    ) -> Self {
        Self {
            settings,
            input,
            screen,
            captcha,
            log: Arc::new(TracingLogSink),
            coordinates: RwLock::new(NamedCoordinates::all_zero()),
            keys: RwLock::new(Vec::new()),
            shared: Arc::new(EngineShared::default()),
            worker: Mutex::new(None),
        }
    }

    /// 운영자 로그 싱크 설정
    pub fn with_log_sink(mut self, log: Arc<dyn LogSink>) -> Self {
        self.log = log;
        self
    }

    /// 좌표 교체 (수동 캡처/자동 감지 결과 반영)
    pub fn set_coordinates(&self, coordinates: NamedCoordinates) {
        *self.coordinates.write().unwrap() = coordinates;
    }

    /// 대기열 교체
    pub fn set_keys(&self, keys: Vec<InvoiceKey>) {
        debug!("대기열 교체: {}건", keys.len());
        *self.keys.write().unwrap() = keys;
    }

    /// 현재 대기열 크기
    pub fn queue_len(&self) -> usize {
        self.keys.read().unwrap().len()
    }

    /// 좌표 파일과 키 파일에서 실행 구성을 로드
    ///
    /// 무효한 키 줄은 경고 후 건너뛴다. 종결 상태(Stopped/Error)였다면
    /// 새 구성 로드와 함께 Idle로 복귀한다. 로드된 키 수를 반환한다.
    pub fn load_configuration(
        &self,
        coordinates_path: &Path,
        keys_path: &Path,
    ) -> Result<usize, CoreError> {
        if self.shared.running.load(Ordering::SeqCst) {
            return Err(CoreError::Config(
                "실행 중에는 구성을 다시 로드할 수 없습니다".to_string(),
            ));
        }

        let store = CoordinateStore::with_path(coordinates_path.to_path_buf())?;
        let key_file = load_key_file(keys_path)?;
        if key_file.invalid_count > 0 {
            self.log.log(
                LogLevel::Warning,
                &format!("무효한 키 {}건 건너뜀", key_file.invalid_count),
            );
        }

        let loaded = key_file.keys.len();
        self.set_coordinates(store.snapshot());
        self.set_keys(key_file.keys);
        *self.shared.status.write().unwrap() = RunStatus::Idle;

        self.log
            .log(LogLevel::Info, &format!("구성 로드 완료 — 키 {loaded}건"));
        Ok(loaded)
    }

    /// 자동화 시작
    ///
    /// 이미 실행 중이면 경고 후 무시(no-op). 좌표 6종이 모두 설정되어 있고
    /// 대기열이 비어 있지 않아야 한다. 성공 시 플래그/통계를 초기화하고
    /// 워커 태스크를 스폰한다.
    pub fn start(&self) -> Result<(), CoreError> {
        if self.shared.running.load(Ordering::SeqCst) {
            warn!("start 요청 무시: 이미 실행 중");
            self.log.log(LogLevel::Warning, "자동화가 이미 실행 중입니다");
            return Ok(());
        }

        let coordinates = self.coordinates.read().unwrap().clone();
        let keys = self.keys.read().unwrap().clone();
        if let Err(e) = validate_run_inputs(&coordinates, &keys) {
            self.log.log(LogLevel::Error, &format!("시작 불가: {e}"));
            return Err(e);
        }

        // 동시 start 경쟁은 여기서 한쪽만 승리한다
        if self
            .shared
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("start 경쟁 감지: 이미 실행 중");
            self.log.log(LogLevel::Warning, "자동화가 이미 실행 중입니다");
            return Ok(());
        }

        self.shared.paused.store(false, Ordering::SeqCst);
        self.shared.stop_requested.store(false, Ordering::SeqCst);
        *self.shared.status.write().unwrap() = RunStatus::Running;
        {
            let mut stats = self.shared.stats.lock().unwrap();
            *stats = RunStats::new(keys.len());
            stats.start_time = Some(Utc::now());
        }
        self.shared.failed_keys.lock().unwrap().clear();

        info!(
            "자동화 시작: {}건, 입력 플랫폼 {}",
            keys.len(),
            self.input.platform()
        );
        self.log
            .log(LogLevel::Info, &format!("자동화 시작 — 대기열 {}건", keys.len()));

        let worker = Worker {
            settings: self.settings.clone(),
            input: self.input.clone(),
            screen: self.screen.clone(),
            captcha: self.captcha.clone(),
            log: self.log.clone(),
            shared: self.shared.clone(),
            coordinates,
            keys,
        };
        let handle = tokio::spawn(worker.run());
        *self.worker.lock().unwrap() = Some(handle);
        Ok(())
    }

    /// 일시정지 토글 — Running ⇄ Paused
    pub fn toggle_pause(&self) {
        if !self.shared.running.load(Ordering::SeqCst) {
            warn!("toggle_pause 요청 무시: 실행 중이 아님");
            self.log.log(LogLevel::Warning, "자동화가 실행 중이 아닙니다");
            return;
        }

        let was_paused = self.shared.paused.fetch_xor(true, Ordering::SeqCst);
        if was_paused {
            *self.shared.status.write().unwrap() = RunStatus::Running;
            self.log.log(LogLevel::Info, "자동화 재개");
        } else {
            *self.shared.status.write().unwrap() = RunStatus::Paused;
            self.log.log(LogLevel::Info, "자동화 일시정지");
        }
    }

    /// 점진적 정지 요청
    ///
    /// 워커는 다음 플래그 확인 지점(단계 사이 또는 대기 내부)에서 중단하고
    /// Idle로 복귀한다. 진행 중이던 키는 집계하지 않는다.
    pub fn stop(&self) {
        if !self.shared.running.load(Ordering::SeqCst) {
            warn!("stop 요청 무시: 실행 중이 아님");
            self.log.log(LogLevel::Warning, "자동화가 실행 중이 아닙니다");
            return;
        }
        self.shared.stop_requested.store(true, Ordering::SeqCst);
        self.log
            .log(LogLevel::Info, "정지 요청 — 다음 확인 지점에서 중단합니다");
    }

    /// 비상 정지 — 즉시 Stopped로 전환
    ///
    /// 어떤 상태에서든 호출 가능하며 동기적으로 상태를 바꾼다. 워커는 폴링
    /// 한 사이클 안에 종료되고, 진행 중이던 키의 화면 조작은 미완으로 남는다.
    pub fn emergency_stop(&self) {
        self.shared.stop_requested.store(true, Ordering::SeqCst);
        self.shared.paused.store(false, Ordering::SeqCst);
        self.shared.running.store(false, Ordering::SeqCst);
        *self.shared.status.write().unwrap() = RunStatus::Stopped;
        error!("비상 정지 요청");
        self.log
            .log(LogLevel::Error, "비상 정지 — 모든 동작을 즉시 중단합니다");
    }

    /// 현재 실행 상태
    pub fn status(&self) -> RunStatus {
        *self.shared.status.read().unwrap()
    }

    /// 통계 스냅샷 — 실행 중이면 `duration_secs()`가 현재 시각 기준 경과를 준다
    pub fn statistics(&self) -> RunStats {
        self.shared.stats.lock().unwrap().clone()
    }

    /// 실패한 키 목록 (전체 키 문자열, 운영자 재시도용)
    pub fn failed_keys(&self) -> Vec<String> {
        self.shared.failed_keys.lock().unwrap().clone()
    }

    /// 통계 초기화 — 종결 상태였다면 Idle로 복귀
    pub fn reset_statistics(&self) {
        if self.shared.running.load(Ordering::SeqCst) {
            warn!("실행 중에는 통계를 초기화할 수 없습니다");
            return;
        }
        *self.shared.stats.lock().unwrap() = RunStats::default();
        self.shared.failed_keys.lock().unwrap().clear();
        *self.shared.status.write().unwrap() = RunStatus::Idle;
        debug!("통계 초기화 완료");
    }

    /// 워커 종료 대기
    ///
    /// 워커가 패닉으로 죽었다면(단계 실패가 아닌 예기치 못한 오류) 실행을
    /// Error 상태로 전환하고 메시지를 남긴다.
    pub async fn wait(&self) {
        let handle = self.worker.lock().unwrap().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                if e.is_panic() {
                    error!("워커 비정상 종료: {e}");
                    self.shared.running.store(false, Ordering::SeqCst);
                    *self.shared.status.write().unwrap() = RunStatus::Error;
                    self.log
                        .log(LogLevel::Error, "워커가 예기치 못한 오류로 중단되었습니다");
                }
            }
        }
    }
}

/// 시작 전 입력 검증 — 좌표 6종 + 비어 있지 않은 대기열
fn validate_run_inputs(
    coordinates: &NamedCoordinates,
    keys: &[InvoiceKey],
) -> Result<(), CoreError> {
    for role in ElementRole::ALL {
        match coordinates.get(role) {
            Some(pos) if pos.is_set() => {}
            _ => {
                return Err(CoreError::Validation {
                    field: role.key().to_string(),
                    message: "좌표가 설정되지 않았습니다".to_string(),
                });
            }
        }
    }
    if keys.is_empty() {
        return Err(CoreError::Validation {
            field: "chaves".to_string(),
            message: "처리할 키가 없습니다".to_string(),
        });
    }
    Ok(())
}

// ============================================================
// 워커
// ============================================================

/// 워커 태스크 — 시작 시점의 좌표/대기열 스냅샷을 소유한다
struct Worker {
    settings: EngineSettings,
    input: Arc<dyn InputDriver>,
    screen: Arc<dyn ScreenSource>,
    captcha: Arc<dyn CaptchaClassifier>,
    log: Arc<dyn LogSink>,
    shared: Arc<EngineShared>,
    coordinates: NamedCoordinates,
    keys: Vec<InvoiceKey>,
}

impl Worker {
    async fn run(self) {
        let total = self.keys.len();
        info!("워커 시작: {}건", total);

        for (index, key) in self.keys.iter().enumerate() {
            if self.interrupted() {
                break;
            }
            if !self.wait_if_paused().await {
                break;
            }

            self.shared.stats.lock().unwrap().current_index = index + 1;
            self.log.log(
                LogLevel::Info,
                &format!("[{}/{}] 키 처리 시작: {}", index + 1, total, key),
            );

            match self.process_key(key).await {
                StepOutcome::Success => {
                    {
                        let mut stats = self.shared.stats.lock().unwrap();
                        stats.processed += 1;
                        stats.succeeded += 1;
                    }
                    self.log.log(
                        LogLevel::Success,
                        &format!("[{}/{}] 처리 완료: {}", index + 1, total, key),
                    );
                }
                StepOutcome::Failed(step) => {
                    {
                        let mut stats = self.shared.stats.lock().unwrap();
                        stats.processed += 1;
                        stats.failed += 1;
                    }
                    self.shared
                        .failed_keys
                        .lock()
                        .unwrap()
                        .push(key.as_str().to_string());
                    self.log.log(
                        LogLevel::Error,
                        &format!(
                            "[{}/{}] {} 단계에서 실패: {}",
                            index + 1,
                            total,
                            step_label(step),
                            key
                        ),
                    );
                }
                StepOutcome::Interrupted => break,
            }

            // 마지막 키가 아니면 키 간 대기 (정지 요청 시 즉시 탈출)
            if index + 1 < total && !self.nap(self.settings.delay_between_actions).await {
                break;
            }
        }

        self.finish();
    }

    /// 키 한 건에 대해 6단계를 순서대로 실행
    ///
    /// 단계 사이마다 정지/일시정지 플래그를 확인한다. 단계 에러는 해당 키의
    /// 실패로 기록하고 다음 키로 진행한다 — 단계 내부 재시도는 없다.
    async fn process_key(&self, key: &InvoiceKey) -> StepOutcome {
        for step in STEP_SEQUENCE {
            if self.interrupted() {
                return StepOutcome::Interrupted;
            }
            if !self.wait_if_paused().await {
                return StepOutcome::Interrupted;
            }

            debug!("단계 {}/6: {}", step.ordinal(), step_label(step));
            let result = match step {
                StepKind::EnterKey => self.step_enter_key(key).await,
                StepKind::Captcha => self.step_captcha().await,
                StepKind::Continue => self.step_continue().await,
                StepKind::Certificate => self.step_certificate().await,
                StepKind::Download => self.step_download().await,
                StepKind::NewQuery => self.step_new_query().await,
            };

            match result {
                Ok(true) => {}
                Ok(false) => return StepOutcome::Interrupted,
                Err(e) => {
                    warn!("{} 단계 실패: {e}", step_label(step));
                    return StepOutcome::Failed(step);
                }
            }
        }
        StepOutcome::Success
    }

    /// 1단계: 키 입력 필드에 접근 키 입력
    async fn step_enter_key(&self, key: &InvoiceKey) -> Result<bool, CoreError> {
        let pos = self.position(ElementRole::KeyField)?;
        self.clear_field_and_type(pos, key.as_str()).await
    }

    /// 2단계: CAPTCHA 처리
    ///
    /// 체크박스 좌표 중심 100×50 영역을 캡처해 유형을 판별한다. 캡처/분류
    /// 실패는 Unknown으로 간주한다. 텍스트형이면 자동 풀이를 시도하고(현재
    /// 구현은 항상 None), 그 외에는 수동 해결을 대기한다. 이 단계는 중단되지
    /// 않는 한 항상 성공으로 끝난다.
    async fn step_captcha(&self) -> Result<bool, CoreError> {
        let pos = self.position(ElementRole::Captcha)?;
        let region = self
            .screen
            .capture_region(
                pos.x - (CAPTCHA_REGION_WIDTH as i32 / 2),
                pos.y - (CAPTCHA_REGION_HEIGHT as i32 / 2),
                CAPTCHA_REGION_WIDTH,
                CAPTCHA_REGION_HEIGHT,
            )
            .await;

        let kind = match &region {
            Ok(image) => match self.captcha.classify(image).await {
                Ok(kind) => kind,
                Err(e) => {
                    warn!("CAPTCHA 분류 실패: {e}");
                    CaptchaKind::Unknown
                }
            },
            Err(e) => {
                warn!("CAPTCHA 영역 캡처 실패: {e}");
                CaptchaKind::Unknown
            }
        };
        debug!("CAPTCHA 유형: {kind}");

        if kind == CaptchaKind::Text {
            if let Ok(image) = &region {
                match self.captcha.solve_text(image).await {
                    Ok(Some(answer)) => {
                        if !self.safe_click(pos, self.settings.field_click_delay).await? {
                            return Ok(false);
                        }
                        self.input.type_text(&answer).await?;
                        self.shared.stats.lock().unwrap().captchas_handled += 1;
                        self.log.log(LogLevel::Success, "CAPTCHA 자동 입력 완료");
                        return Ok(true);
                    }
                    Ok(None) => {
                        debug!("자동 풀이 미지원 — 수동 해결 대기로 전환");
                    }
                    Err(e) => {
                        warn!("CAPTCHA 자동 풀이 실패: {e}");
                    }
                }
            }
        }

        self.log.log(
            LogLevel::Warning,
            &format!(
                "CAPTCHA({kind}) 수동 해결 대기 — 최대 {}초",
                self.settings.captcha_manual_timeout.as_secs()
            ),
        );
        self.manual_captcha_wait().await
    }

    /// 3단계: 계속 버튼 클릭 후 페이지 로드 대기
    async fn step_continue(&self) -> Result<bool, CoreError> {
        let pos = self.position(ElementRole::Continue)?;
        self.safe_click(pos, self.settings.continue_delay).await
    }

    /// 4단계: 인증서 선택 (best-effort)
    ///
    /// 인증서 창이 뜨지 않는 환경도 있으므로 클릭 실패는 무시한다.
    async fn step_certificate(&self) -> Result<bool, CoreError> {
        if !self.nap(self.settings.certificate_lead).await {
            return Ok(false);
        }
        let pos = self.position(ElementRole::Certificate)?;
        match self.safe_click(pos, self.settings.certificate_delay).await {
            Ok(done) => Ok(done),
            Err(e) => {
                debug!("인증서 확인 클릭 실패 (무시): {e}");
                Ok(true)
            }
        }
    }

    /// 5단계: XML 다운로드 클릭
    async fn step_download(&self) -> Result<bool, CoreError> {
        if !self.nap(self.settings.download_lead).await {
            return Ok(false);
        }
        let pos = self.position(ElementRole::Download)?;
        self.safe_click(pos, self.settings.download_delay).await
    }

    /// 6단계: 새 조회로 페이지 초기화
    async fn step_new_query(&self) -> Result<bool, CoreError> {
        if !self.nap(self.settings.new_query_lead).await {
            return Ok(false);
        }
        let pos = self.position(ElementRole::NewQuery)?;
        self.safe_click(pos, self.settings.new_query_delay).await
    }

    /// CAPTCHA 수동 해결 대기 서브 루프
    ///
    /// 타임아웃 카운터는 일시정지 중에는 진행하지 않는다. 타임아웃에 도달하면
    /// 해결됐다고 가정하고 진행한다(블라인드 방식이라 화면 확인이 불가능하다).
    /// 정지/비상 정지 시 false.
    async fn manual_captcha_wait(&self) -> Result<bool, CoreError> {
        let mut waited = Duration::ZERO;
        while waited < self.settings.captcha_manual_timeout {
            if self.interrupted() {
                return Ok(false);
            }
            if self.shared.paused.load(Ordering::SeqCst) {
                tokio::time::sleep(self.settings.pause_poll).await;
                continue;
            }
            tokio::time::sleep(self.settings.captcha_poll).await;
            waited += self.settings.captcha_poll;
        }
        debug!("CAPTCHA 수동 대기 종료 — 진행");
        Ok(true)
    }

    /// 좌표 스냅샷에서 역할 좌표 조회 — 시작 시 검증되므로 실패는 비정상
    fn position(&self, role: ElementRole) -> Result<ScreenPosition, CoreError> {
        self.coordinates
            .get(role)
            .filter(|pos| pos.is_set())
            .ok_or_else(|| CoreError::Validation {
                field: role.key().to_string(),
                message: "좌표가 설정되지 않았습니다".to_string(),
            })
    }

    /// 마우스 이동 → 정착 대기 → 좌클릭 → 지정 시간 대기
    ///
    /// false 반환은 대기 중 정지 요청을 의미한다.
    async fn safe_click(&self, pos: ScreenPosition, delay: Duration) -> Result<bool, CoreError> {
        self.input.mouse_move(pos.x, pos.y).await?;
        if !self.nap(self.settings.click_settle).await {
            return Ok(false);
        }
        self.input.mouse_click("left", pos.x, pos.y).await?;
        Ok(self.nap(delay).await)
    }

    /// 필드 클릭 → 전체 선택 → 삭제 → 텍스트 입력
    async fn clear_field_and_type(
        &self,
        pos: ScreenPosition,
        text: &str,
    ) -> Result<bool, CoreError> {
        if !self.safe_click(pos, self.settings.field_click_delay).await? {
            return Ok(false);
        }
        self.input
            .hotkey(&["ctrl".to_string(), "a".to_string()])
            .await?;
        if !self.nap(self.settings.key_clear_settle).await {
            return Ok(false);
        }
        self.input.key_press("delete").await?;
        self.input.key_release("delete").await?;
        if !self.nap(self.settings.key_clear_settle).await {
            return Ok(false);
        }
        self.input.type_text(text).await?;
        Ok(true)
    }

    /// 중단 가능한 대기 — `pause_poll` 단위로 나눠 자며 정지 플래그 확인
    async fn nap(&self, total: Duration) -> bool {
        let mut remaining = total;
        while remaining > Duration::ZERO {
            if self.interrupted() {
                return false;
            }
            let slice = remaining.min(self.settings.pause_poll);
            tokio::time::sleep(slice).await;
            remaining = remaining.saturating_sub(slice);
        }
        !self.interrupted()
    }

    /// 일시정지 동안 대기 — 재개 시 true, 정지 요청 시 false
    async fn wait_if_paused(&self) -> bool {
        while self.shared.paused.load(Ordering::SeqCst) {
            if self.interrupted() {
                return false;
            }
            tokio::time::sleep(self.settings.pause_poll).await;
        }
        !self.interrupted()
    }

    /// 정지 요청 또는 비상 정지 여부
    fn interrupted(&self) -> bool {
        !self.shared.running.load(Ordering::SeqCst)
            || self.shared.stop_requested.load(Ordering::SeqCst)
    }

    /// 종료 처리 — 플래그 해제, 종료 시각 기록, 요약 보고
    ///
    /// 비상 정지(Stopped)와 Error는 종결 상태로 유지하고, 그 외에는 Idle로
    /// 복귀한다. 점진적 정지도 요약을 남기고 Idle로 끝난다.
    fn finish(&self) {
        self.shared.running.store(false, Ordering::SeqCst);
        self.shared.paused.store(false, Ordering::SeqCst);

        let summary = {
            let mut stats = self.shared.stats.lock().unwrap();
            stats.end_time = Some(Utc::now());
            stats.clone()
        };
        {
            let mut status = self.shared.status.write().unwrap();
            if !matches!(*status, RunStatus::Stopped | RunStatus::Error) {
                *status = RunStatus::Idle;
            }
        }

        let duration = summary.duration_secs().unwrap_or(0);
        info!(
            "워커 종료: 처리 {}건, 성공 {}건, 실패 {}건, {}초",
            summary.processed, summary.succeeded, summary.failed, duration
        );
        self.log.log(
            LogLevel::Info,
            &format!(
                "실행 요약 — 전체 {}건, 처리 {}건, 성공 {}건, 실패 {}건, CAPTCHA {}건, 성공률 {:.1}%, 소요 {}초",
                summary.total_keys,
                summary.processed,
                summary.succeeded,
                summary.failed,
                summary.captchas_handled,
                summary.success_rate(),
                duration
            ),
        );
    }
}

// ============================================================
// 테스트
// ============================================================
