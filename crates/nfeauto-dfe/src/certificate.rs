//! PKCS#12 클라이언트 인증서 로딩.
//!
//! .pfx 파일을 reqwest `Identity`로 직접 변환한다. 개인 키를 PEM으로
//! 풀어 임시 파일에 쓰는 우회 없이 메모리 안에서만 다루므로
//! 디스크에 키 자료가 남지 않는다.

use nfeauto_core::error::CoreError;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// PKCS#12(.pfx) 파일을 읽어 클라이언트 인증서 Identity를 만든다.
pub fn load_identity(pfx_path: &Path, password: &str) -> Result<reqwest::Identity, CoreError> {
    let der = std::fs::read(pfx_path).map_err(|e| {
        CoreError::Config(format!(
            "인증서 파일 읽기 실패 ({}): {e}",
            pfx_path.display()
        ))
    })?;
    debug!("PKCS#12 로드: {} ({} bytes)", pfx_path.display(), der.len());
    reqwest::Identity::from_pkcs12_der(&der, password)
        .map_err(|e| CoreError::Config(format!("PKCS#12 해석 실패: {e}")))
}

/// 상호 TLS가 설정된 HTTP 클라이언트를 만든다.
pub fn build_client(
    identity: reqwest::Identity,
    timeout: Duration,
) -> Result<reqwest::Client, CoreError> {
    reqwest::Client::builder()
        .use_native_tls()
        .identity(identity)
        .timeout(timeout)
        .build()
        .map_err(|e| CoreError::Network(format!("HTTP 클라이언트 빌드 실패: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_pfx_file_is_config_error() {
        let err = load_identity(Path::new("/없는/경로/certificado.pfx"), "senha").unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
        assert!(err.to_string().contains("인증서 파일 읽기 실패"));
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"isto nao e um cont\xEAiner pkcs12").unwrap();
        let err = load_identity(file.path(), "senha").unwrap_err();
        assert!(err.to_string().contains("PKCS#12 해석 실패"));
    }
}
