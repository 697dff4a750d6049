//! # nfeauto-app
//!
//! NFEAUTO 바이너리 진입점.
//! DI 컨테이너 역할, 실행 모드 분기(감지/SOAP/자동화 콘솔), 라이프사이클 관리.

mod console;

use anyhow::{anyhow, Result};
use clap::Parser;
use nfeauto_automation::engine::{AutomationEngine, EngineSettings};
use nfeauto_automation::input_driver::{create_platform_input_driver, NoOpInputDriver};
use nfeauto_core::config::AppConfig;
use nfeauto_core::config_manager::ConfigManager;
use nfeauto_core::coordinates::CoordinateStore;
use nfeauto_core::keys::load_key_file;
use nfeauto_core::ports::captcha_classifier::CaptchaClassifier;
use nfeauto_core::ports::input_driver::InputDriver;
use nfeauto_core::ports::ocr_provider::OcrProvider;
use nfeauto_core::ports::screen_source::ScreenSource;
use nfeauto_dfe::client::DistribuicaoClient;
use nfeauto_vision::captcha::CaptchaProbe;
use nfeauto_vision::capture::ScreenCapture;
use nfeauto_vision::detector::ElementDetector;
use nfeauto_vision::local_ocr_provider::{LocalOcrProvider, NoOpOcrProvider};
use nfeauto_vision::overlay;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// NFEAUTO 데스크톱 클라이언트
///
/// NFe 접근 키 XML 일괄 다운로드 자동화 도구
#[derive(Parser, Debug)]
#[command(name = "nfeauto")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 설정 파일 경로 (기본: 플랫폼 설정 디렉토리의 config.json)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// 좌표 파일 경로
    #[arg(long, default_value = "coordinates.json")]
    coordinates: PathBuf,

    /// 키 파일 경로 (한 줄당 44자리 접근 키 하나)
    #[arg(long, short = 'k', default_value = "chaves.txt")]
    keys: PathBuf,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,

    /// 입력 시뮬레이션 없이 실행 (NoOp 드라이버)
    #[arg(long)]
    dry_run: bool,

    /// 화면 요소 1회 감지 후 좌표를 저장하고 종료
    #[arg(long)]
    detect: bool,

    /// SOAP 웹서비스로 일괄 다운로드 (GUI 자동화 없음)
    #[arg(long)]
    soap: bool,

    /// PKCS#12 인증서 경로 (--soap, 설정 덮어쓰기)
    #[arg(long)]
    pfx: Option<String>,

    /// PKCS#12 인증서 비밀번호 (--soap)
    #[arg(long, default_value = "")]
    pfx_password: String,

    /// 요청자 CNPJ 14자리 (--soap, 설정 덮어쓰기)
    #[arg(long)]
    cnpj: Option<String>,
}

/// 배너 출력
fn print_banner() {
    println!();
    println!("╔═════════════════════════════════════════════════════════════════╗");
    println!("║                                                                 ║");
    println!("║  ███╗   ██╗███████╗███████╗ █████╗ ██╗   ██╗████████╗ ██████╗   ║");
    println!("║  ████╗  ██║██╔════╝██╔════╝██╔══██╗██║   ██║╚══██╔══╝██╔═══██╗  ║");
    println!("║  ██╔██╗ ██║█████╗  █████╗  ███████║██║   ██║   ██║   ██║   ██║  ║");
    println!("║  ██║╚██╗██║██╔══╝  ██╔══╝  ██╔══██║██║   ██║   ██║   ██║   ██║  ║");
    println!("║  ██║ ╚████║██║     ███████╗██║  ██║╚██████╔╝   ██║   ╚██████╔╝  ║");
    println!("║  ╚═╝  ╚═══╝╚═╝     ╚══════╝╚═╝  ╚═╝ ╚═════╝    ╚═╝    ╚═════╝   ║");
    println!("║                                                                 ║");
    println!("║           NFe 접근 키 XML 일괄 다운로드 자동화                     ║");
    println!("║                                                                 ║");
    println!("╚═════════════════════════════════════════════════════════════════╝");
    println!();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // tracing 초기화 (모든 모드에서 필요)
    let log_filter = format!(
        "nfeauto={lvl},nfeauto_app={lvl},nfeauto_core={lvl},nfeauto_vision={lvl},nfeauto_automation={lvl},nfeauto_dfe={lvl}",
        lvl = args.log_level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .init();

    print_banner();
    info!("NFEAUTO 클라이언트 시작");

    // 설정 로드 — 명시적 --config는 실패 시 그대로 종료, 기본 경로는 현재
    // 디렉토리로 한 번 더 시도
    let config_manager = match args.config {
        Some(ref path) => ConfigManager::with_path(path.clone())?,
        None => match ConfigManager::new() {
            Ok(manager) => manager,
            Err(e) => {
                warn!("플랫폼 설정 디렉토리 사용 불가, 현재 디렉토리로 대체: {e}");
                ConfigManager::with_path(PathBuf::from("config.json"))?
            }
        },
    };
    info!("설정 파일: {:?}", config_manager.config_path());
    let config = config_manager.get();

    // 실행 모드 분기
    if args.detect {
        return run_detection(&config, &args).await;
    }
    if args.soap {
        return run_soap(&config, &args).await;
    }
    run_automation(&config, args).await
}

/// 화면 요소 1회 감지 — 좌표 저장 후 종료
async fn run_detection(config: &AppConfig, args: &Args) -> Result<()> {
    info!(
        "화면 요소 감지 시작 (프로파일: {}, OCR: {})",
        config.detection.color_profile, config.detection.ocr_enabled
    );

    let capture = ScreenCapture::new();
    let img = capture
        .capture_primary()
        .map_err(|e| anyhow!("화면 캡처 실패: {e}"))?;

    let ocr: Arc<dyn OcrProvider> = if config.detection.ocr_enabled {
        Arc::new(LocalOcrProvider::new())
    } else {
        Arc::new(NoOpOcrProvider::new())
    };
    let detector = ElementDetector::new(ocr);
    let detected = detector
        .detect_all(&img, &config.detection.color_profile)
        .await;

    // 감지 결과를 기존 좌표에 병합 (미감지 역할은 이전 값 유지)
    let store = CoordinateStore::with_path(args.coordinates.clone())?;
    store.merge_detected(&detected);
    store.save()?;
    info!("좌표 저장: {}", store.path().display());

    if config.detection.save_debug_image {
        let dir = Path::new(&config.screenshot_path);
        std::fs::create_dir_all(dir)?;
        let file = dir.join(format!(
            "deteccao_{}.png",
            chrono::Local::now().format("%Y%m%d_%H%M%S")
        ));
        overlay::save_debug_overlay(&img, &store.snapshot(), &file)?;
    }

    match store.validate() {
        Ok(()) => info!("모든 역할 좌표가 설정되었습니다"),
        Err(e) => warn!("미설정 좌표 있음 — 수동 보정 필요: {e}"),
    }
    Ok(())
}

/// SOAP 일괄 다운로드 — 인증서 기반, GUI 자동화 없음
async fn run_soap(config: &AppConfig, args: &Args) -> Result<()> {
    let mut dfe = config.dfe.clone();
    if let Some(ref pfx) = args.pfx {
        dfe.pfx_path = pfx.clone();
    }
    if let Some(ref cnpj) = args.cnpj {
        dfe.cnpj = cnpj.clone();
    }
    if dfe.pfx_path.is_empty() {
        return Err(anyhow!("--pfx 또는 설정의 dfe.pfx_path가 필요합니다"));
    }
    if dfe.cnpj.is_empty() {
        return Err(anyhow!("--cnpj 또는 설정의 dfe.cnpj가 필요합니다"));
    }

    let key_file = load_key_file(&args.keys)?;
    if key_file.keys.is_empty() {
        return Err(anyhow!(
            "키 파일에 유효한 키가 없습니다: {}",
            args.keys.display()
        ));
    }
    info!(
        "SOAP 일괄 다운로드: 키 {}개 → {}",
        key_file.keys.len(),
        dfe.output_dir
    );

    let client = DistribuicaoClient::from_config(dfe, &args.pfx_password)?;
    let summary = client.download_batch(&key_file.keys).await;

    if summary.failed > 0 {
        warn!("실패한 키 {}건:", summary.failed);
        for key in &summary.failed_keys {
            warn!("  {key}");
        }
    }
    info!("저장된 XML 파일 {}개", summary.files.len());
    Ok(())
}

/// 자동화 엔진 + 대화형 콘솔 (기본 모드)
async fn run_automation(config: &AppConfig, args: Args) -> Result<()> {
    let settings = EngineSettings::from_config(config);

    let input: Arc<dyn InputDriver> = if args.dry_run {
        info!("드라이런 모드 — 입력 시뮬레이션 없음");
        Arc::new(NoOpInputDriver)
    } else {
        create_platform_input_driver()
    };
    let screen: Arc<dyn ScreenSource> = Arc::new(ScreenCapture::new());
    let captcha: Arc<dyn CaptchaClassifier> = Arc::new(CaptchaProbe::new());

    let engine = Arc::new(AutomationEngine::new(settings, input, screen, captcha));

    match engine.load_configuration(&args.coordinates, &args.keys) {
        Ok(count) => info!("키 {count}개 대기열 준비"),
        Err(e) => warn!("구성 로드 실패 — 감지(--detect) 후 reload 하세요: {e}"),
    }

    console::run(engine, args.coordinates, args.keys).await
}
