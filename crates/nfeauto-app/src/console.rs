//! 대화형 제어 콘솔.
//!
//! 원본 운영 흐름의 전역 단축키(F9/F10/F8/esc)를 표준 입력 명령으로 옮긴
//! 제어 표면. 한 줄에 명령 하나를 읽어 엔진에 제출한다.
//! 단축키 바인딩 자체는 설정(hotkeys)에 문서화된 외부 인터페이스로 남는다.

use anyhow::Result;
use nfeauto_automation::engine::AutomationEngine;
use nfeauto_core::models::run::RunStatus;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

/// 콘솔 명령
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Start,
    Pause,
    Stop,
    Emergency,
    Status,
    Failed,
    Reload,
    Help,
    Quit,
}

impl Command {
    /// 입력 줄 해석 — 대소문자 무시, 앞뒤 공백 제거
    fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "start" | "s" => Some(Self::Start),
            "pause" | "p" => Some(Self::Pause),
            "stop" => Some(Self::Stop),
            "emergency" | "e" | "esc" => Some(Self::Emergency),
            "status" | "st" => Some(Self::Status),
            "failed" | "f" => Some(Self::Failed),
            "reload" | "r" => Some(Self::Reload),
            "help" | "h" | "?" => Some(Self::Help),
            "quit" | "q" | "exit" => Some(Self::Quit),
            _ => None,
        }
    }
}

fn print_help() {
    println!("명령:");
    println!("  start      자동화 시작 (단축키 F9에 해당)");
    println!("  pause      일시정지/재개 토글 (F10)");
    println!("  stop       정상 중지 — 현재 키까지 처리 (F8)");
    println!("  emergency  비상 정지 — 즉시 중단 (esc)");
    println!("  status     상태와 통계 출력");
    println!("  failed     실패한 키 목록 출력");
    println!("  reload     좌표/키 파일 다시 로드");
    println!("  quit       종료 (실행 중이면 정지 후)");
}

fn print_status(engine: &AutomationEngine) {
    let stats = engine.statistics();
    println!("상태: {} (대기열 {}개)", engine.status(), engine.queue_len());
    if engine.status() == RunStatus::Running || engine.status() == RunStatus::Paused {
        println!("  진행 {}/{}", stats.current_index, stats.total_keys);
    }
    println!(
        "  전체 {}건, 처리 {}건, 성공 {}건, 실패 {}건, CAPTCHA {}건, 성공률 {:.1}%",
        stats.total_keys,
        stats.processed,
        stats.succeeded,
        stats.failed,
        stats.captchas_handled,
        stats.success_rate()
    );
    if let Some(secs) = stats.duration_secs() {
        println!("  소요 {secs}초");
    }
}

fn print_failed(engine: &AutomationEngine) {
    let failed = engine.failed_keys();
    if failed.is_empty() {
        println!("실패한 키 없음");
        return;
    }
    println!("실패한 키 {}건:", failed.len());
    for key in failed {
        println!("  {key}");
    }
}

/// 콘솔 루프 실행 — quit 또는 Ctrl+C까지 블록
pub async fn run(
    engine: Arc<AutomationEngine>,
    coordinates_path: PathBuf,
    keys_path: PathBuf,
) -> Result<()> {
    print_help();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                warn!("Ctrl+C — 비상 정지 후 종료");
                engine.emergency_stop();
                engine.wait().await;
                break;
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    // stdin 닫힘 (파이프 입력 종료)
                    info!("입력 종료 — 정지 후 종료");
                    engine.stop();
                    engine.wait().await;
                    break;
                };
                let Some(command) = Command::parse(&line) else {
                    if !line.trim().is_empty() {
                        println!("알 수 없는 명령: {} (help 참고)", line.trim());
                    }
                    continue;
                };
                match command {
                    Command::Start => {
                        if let Err(e) = engine.start() {
                            warn!("시작 실패: {e}");
                        }
                    }
                    Command::Pause => engine.toggle_pause(),
                    Command::Stop => engine.stop(),
                    Command::Emergency => engine.emergency_stop(),
                    Command::Status => print_status(&engine),
                    Command::Failed => print_failed(&engine),
                    Command::Reload => {
                        match engine.load_configuration(&coordinates_path, &keys_path) {
                            Ok(count) => println!("키 {count}개 대기열 준비"),
                            Err(e) => warn!("구성 로드 실패: {e}"),
                        }
                    }
                    Command::Help => print_help(),
                    Command::Quit => {
                        let status = engine.status();
                        if status == RunStatus::Running || status == RunStatus::Paused {
                            info!("실행 중 — 정지 요청 후 종료 대기");
                            engine.stop();
                        }
                        engine.wait().await;
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}
