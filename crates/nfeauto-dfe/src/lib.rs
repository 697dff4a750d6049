//! # nfeauto-dfe
//!
//! SEFAZ 국가 환경 DFe SOAP 어댑터.
//! PKCS#12 클라이언트 인증서 기반 상호 TLS로 NFeDistribuicaoDFe(문서 배포)와
//! NFeConsulta2(상태 조회) 웹서비스를 호출하고, 응답의 docZip 문서를
//! base64 디코드 + gzip 해제하여 XML 파일로 저장한다.
//!
//! GUI 자동화 경로(nfeauto-automation)와 독립적으로 동작하는 대안 경로다.
//! 브라우저도 CAPTCHA도 없이 인증서만으로 전체 XML을 내려받는다.
//!
//! ## 사용 예시
//!
//! ```rust,ignore
//! use nfeauto_core::config::DfeConfig;
//! use nfeauto_dfe::client::DistribuicaoClient;
//!
//! let client = DistribuicaoClient::from_config(DfeConfig::default(), "pfx-senha")?;
//! let summary = client.download_batch(&keys).await;
//! ```

pub mod certificate;
pub mod client;
pub mod envelope;
