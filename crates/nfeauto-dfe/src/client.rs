//! SEFAZ 웹서비스 클라이언트.
//!
//! `DistribuicaoClient` — NFeDistribuicaoDFe에 접근 키별 distDFeInt를 POST하고,
//! 반환된 docZip을 해제해 출력 디렉토리에 `<NSU|chave>.xml`로 저장한다.
//! NFeConsulta2 상태 조회와 키 목록 일괄 처리를 함께 제공한다.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use flate2::read::GzDecoder;
use nfeauto_core::config::DfeConfig;
use nfeauto_core::error::CoreError;
use nfeauto_core::keys::InvoiceKey;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::certificate;
use crate::envelope;

// ============================================================
// 와이어 상수
// ============================================================

/// SOAP 1.2 Content-Type (NFeDistribuicaoDFe)
const SOAP12_CONTENT_TYPE: &str = "application/soap+xml; charset=utf-8";
/// SOAP 1.1 Content-Type (NFeConsulta2)
const SOAP11_CONTENT_TYPE: &str = "text/xml; charset=utf-8";
/// NFeConsulta2 SOAPAction 헤더 값
const CONSULTA_SOAP_ACTION: &str =
    "http://www.portalfiscal.inf.br/nfe/wsdl/NFeConsulta2/nfeConsultaNF2";
/// gzip 매직 바이트 — docZip 압축 여부 판별
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
/// 문서 없음 (distDFeInt 정상 응답)
const CSTAT_NO_DOCUMENTS: &str = "137";

// ============================================================
// 결과 타입
// ============================================================

/// 일괄 다운로드 요약
#[derive(Debug, Default, Clone)]
pub struct BatchSummary {
    /// 요청한 키 수
    pub total_keys: usize,
    /// 호출이 성공한 키 수 (문서 0건 포함)
    pub succeeded: usize,
    /// 호출이 실패한 키 수
    pub failed: usize,
    /// 저장된 XML 파일 경로
    pub files: Vec<PathBuf>,
    /// 실패한 키 목록
    pub failed_keys: Vec<String>,
}

// ============================================================
// 클라이언트
// ============================================================

/// SEFAZ 배포/조회 클라이언트
pub struct DistribuicaoClient {
    client: reqwest::Client,
    config: DfeConfig,
}

impl DistribuicaoClient {
    /// 이미 구성된 HTTP 클라이언트로 생성한다 (테스트용 평문 클라이언트 포함).
    pub fn new(client: reqwest::Client, config: DfeConfig) -> Self {
        Self { client, config }
    }

    /// 설정의 PKCS#12 인증서로 상호 TLS 클라이언트를 구성해 생성한다.
    pub fn from_config(config: DfeConfig, pfx_password: &str) -> Result<Self, CoreError> {
        let identity = certificate::load_identity(Path::new(&config.pfx_path), pfx_password)?;
        let client =
            certificate::build_client(identity, Duration::from_secs(config.timeout_secs))?;
        Ok(Self::new(client, config))
    }

    /// 접근 키 하나의 XML을 내려받아 저장한다. 저장된 파일 경로를 돌려준다.
    ///
    /// cStat 137(문서 없음)은 빈 목록으로 성공 처리하고,
    /// 그 외 문서 없는 응답은 SEFAZ 거부로 본다.
    pub async fn download_key(&self, key: &InvoiceKey) -> Result<Vec<PathBuf>, CoreError> {
        let body = envelope::dist_dfe_envelope(
            &self.config.cnpj,
            key.as_str(),
            self.config.tp_amb,
            self.config.cuf_autor,
        );
        debug!(
            "distDFeInt 요청: {} → {}",
            key.short(),
            self.config.distribuicao_url
        );

        let resp = self
            .client
            .post(&self.config.distribuicao_url)
            .header(reqwest::header::CONTENT_TYPE, SOAP12_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(|e| CoreError::Network(format!("NFeDistribuicaoDFe 요청 실패: {e}")))?;
        let text = self.check_response(resp).await?;

        let parsed = envelope::parse_dist_response(&text)?;
        if parsed.docs.is_empty() {
            return match parsed.c_stat.as_deref() {
                Some(CSTAT_NO_DOCUMENTS) => {
                    info!(
                        "반환된 문서 없음: {} ({})",
                        key.short(),
                        parsed.x_motivo.as_deref().unwrap_or("-")
                    );
                    Ok(Vec::new())
                }
                c_stat => Err(CoreError::Internal(format!(
                    "SEFAZ 거부 (cStat {}): {}",
                    c_stat.unwrap_or("?"),
                    parsed.x_motivo.as_deref().unwrap_or("사유 없음")
                ))),
            };
        }

        let out_dir = Path::new(&self.config.output_dir);
        std::fs::create_dir_all(out_dir)?;

        let mut files = Vec::with_capacity(parsed.docs.len());
        for doc in &parsed.docs {
            let xml = decode_doc_zip(&doc.content)?;
            let name = doc.nsu.clone().unwrap_or_else(|| key.as_str().to_string());
            let path = out_dir.join(format!("{name}.xml"));
            std::fs::write(&path, &xml)?;
            info!("XML 저장: {} ({} bytes)", path.display(), xml.len());
            files.push(path);
        }
        Ok(files)
    }

    /// NFeConsulta2로 키의 상태(cStat/xMotivo)를 조회한다.
    pub async fn check_status(
        &self,
        key: &InvoiceKey,
    ) -> Result<envelope::ConsultaResponse, CoreError> {
        let body = envelope::cons_sit_envelope(key.as_str(), self.config.tp_amb);
        debug!(
            "consSitNFe 요청: {} → {}",
            key.short(),
            self.config.consulta_url
        );

        let resp = self
            .client
            .post(&self.config.consulta_url)
            .header(reqwest::header::CONTENT_TYPE, SOAP11_CONTENT_TYPE)
            .header("SOAPAction", CONSULTA_SOAP_ACTION)
            .body(body)
            .send()
            .await
            .map_err(|e| CoreError::Network(format!("NFeConsulta2 요청 실패: {e}")))?;
        let text = self.check_response(resp).await?;
        envelope::parse_consulta_response(&text)
    }

    /// 키 목록 전체를 내려받는다. 개별 실패는 기록하고 다음 키로 계속 진행한다.
    pub async fn download_batch(&self, keys: &[InvoiceKey]) -> BatchSummary {
        let mut summary = BatchSummary {
            total_keys: keys.len(),
            ..Default::default()
        };

        for (index, key) in keys.iter().enumerate() {
            info!("[{}/{}] 키 다운로드: {}", index + 1, keys.len(), key.short());
            match self.download_key(key).await {
                Ok(mut files) => {
                    summary.succeeded += 1;
                    summary.files.append(&mut files);
                }
                Err(e) => {
                    warn!("키 다운로드 실패 ({}): {e}", key.short());
                    summary.failed += 1;
                    summary.failed_keys.push(key.as_str().to_string());
                }
            }
        }

        info!(
            "일괄 다운로드 완료 — 전체 {}건, 성공 {}건, 실패 {}건, 파일 {}개",
            summary.total_keys,
            summary.succeeded,
            summary.failed,
            summary.files.len()
        );
        summary
    }

    /// HTTP 상태 확인 후 응답 본문을 돌려준다.
    async fn check_response(&self, resp: reqwest::Response) -> Result<String, CoreError> {
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| CoreError::Network(format!("응답 본문 읽기 실패: {e}")))?;
        if !status.is_success() {
            return Err(CoreError::Network(format!("서비스 HTTP {status}: {text}")));
        }
        Ok(text)
    }
}

/// docZip 본문을 디코드한다 — base64 해제 후 gzip이면 추가 해제.
fn decode_doc_zip(content: &str) -> Result<Vec<u8>, CoreError> {
    // SOAP pretty-print가 끼워 넣는 공백/개행 제거
    let cleaned: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = BASE64
        .decode(cleaned.as_bytes())
        .map_err(|e| CoreError::Internal(format!("docZip base64 디코드 실패: {e}")))?;

    if bytes.len() >= 2 && bytes[..2] == GZIP_MAGIC {
        let mut decoder = GzDecoder::new(bytes.as_slice());
        let mut out = Vec::new();
        decoder
            .read_to_end(&mut out)
            .map_err(|e| CoreError::Internal(format!("docZip gzip 해제 실패: {e}")))?;
        Ok(out)
    } else {
        Ok(bytes)
    }
}
