//! SOAP 봉투 생성과 응답 파싱.
//!
//! NFeDistribuicaoDFe(SOAP 1.2)와 NFeConsulta2(SOAP 1.1)의 요청 봉투를
//! 만들고, 응답에서 cStat/xMotivo와 docZip 목록을 추출한다.
//! 네임스페이스 접두사는 환경마다 달라지므로 파싱은 로컬 이름 기준이다.

use nfeauto_core::error::CoreError;
use quick_xml::events::Event;
use quick_xml::Reader;

// ============================================================
// 와이어 상수
// ============================================================

/// NFe 스키마 네임스페이스
pub const PORTAL_NS: &str = "http://www.portalfiscal.inf.br/nfe";
/// NFeDistribuicaoDFe WSDL 네임스페이스
pub const DIST_WSDL_NS: &str = "http://www.portalfiscal.inf.br/nfe/wsdl/NFeDistribuicaoDFe";
/// NFeConsulta2 WSDL 네임스페이스
pub const CONSULTA_WSDL_NS: &str = "http://www.portalfiscal.inf.br/nfe/wsdl/NFeConsulta2";
/// distDFeInt 스키마 버전
pub const DIST_SCHEMA_VERSION: &str = "1.01";
/// consSitNFe 스키마 버전
pub const CONSULTA_SCHEMA_VERSION: &str = "4.00";

// ============================================================
// 요청 봉투
// ============================================================

/// 접근 키 하나의 전체 XML을 요청하는 distDFeInt 봉투(SOAP 1.2)를 만든다.
pub fn dist_dfe_envelope(cnpj: &str, chave: &str, tp_amb: u8, cuf_autor: u8) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<soap12:Envelope xmlns:soap12="http://www.w3.org/2003/05/soap-envelope" xmlns:nfe="{DIST_WSDL_NS}">
  <soap12:Header/>
  <soap12:Body>
    <nfe:nfeDistDFeInteresse>
      <nfe:nfeDadosMsg>
        <distDFeInt xmlns="{PORTAL_NS}" versao="{DIST_SCHEMA_VERSION}">
          <tpAmb>{tp_amb}</tpAmb>
          <cUFAutor>{cuf_autor}</cUFAutor>
          <CNPJ>{cnpj}</CNPJ>
          <consChNFe>
            <chNFe>{chave}</chNFe>
          </consChNFe>
        </distDFeInt>
      </nfe:nfeDadosMsg>
    </nfe:nfeDistDFeInteresse>
  </soap12:Body>
</soap12:Envelope>"#
    )
}

/// NFe 상태를 조회하는 consSitNFe 봉투(SOAP 1.1)를 만든다.
pub fn cons_sit_envelope(chave: &str, tp_amb: u8) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/" xmlns:nfe="{CONSULTA_WSDL_NS}">
  <soap:Header/>
  <soap:Body>
    <nfe:nfeConsultaNF2>
      <consSitNFe xmlns="{PORTAL_NS}" versao="{CONSULTA_SCHEMA_VERSION}">
        <tpAmb>{tp_amb}</tpAmb>
        <xServ>CONSULTAR</xServ>
        <chNFe>{chave}</chNFe>
      </consSitNFe>
    </nfe:nfeConsultaNF2>
  </soap:Body>
</soap:Envelope>"#
    )
}

// ============================================================
// 응답 타입
// ============================================================

/// 배포 응답의 docZip 항목
#[derive(Debug, Clone)]
pub struct DocZip {
    /// NSU 속성 — 저장 파일명 후보
    pub nsu: Option<String>,
    /// base64 인코딩된 문서 본문 (gzip일 수 있음)
    pub content: String,
}

/// retDistDFeInt 파싱 결과
#[derive(Debug, Clone)]
pub struct DistribuicaoResponse {
    /// 서비스 상태 코드 (137 = 문서 없음, 138 = 문서 있음)
    pub c_stat: Option<String>,
    /// 상태 설명
    pub x_motivo: Option<String>,
    /// 반환된 문서 목록
    pub docs: Vec<DocZip>,
}

/// retConsSitNFe 파싱 결과
#[derive(Debug, Clone)]
pub struct ConsultaResponse {
    /// 서비스 상태 코드 (100 = 사용 승인)
    pub c_stat: Option<String>,
    /// 상태 설명
    pub x_motivo: Option<String>,
}

// ============================================================
// 응답 파싱
// ============================================================

/// retDistDFeInt 응답을 파싱한다. SOAP Fault는 에러로 변환된다.
pub fn parse_dist_response(xml: &str) -> Result<DistribuicaoResponse, CoreError> {
    let collected = collect(xml)?;
    if let Some(reason) = collected.fault {
        return Err(CoreError::Internal(format!("SOAP Fault: {reason}")));
    }
    Ok(DistribuicaoResponse {
        c_stat: collected.c_stat,
        x_motivo: collected.x_motivo,
        docs: collected.docs,
    })
}

/// retConsSitNFe 응답을 파싱한다. SOAP Fault는 에러로 변환된다.
pub fn parse_consulta_response(xml: &str) -> Result<ConsultaResponse, CoreError> {
    let collected = collect(xml)?;
    if let Some(reason) = collected.fault {
        return Err(CoreError::Internal(format!("SOAP Fault: {reason}")));
    }
    Ok(ConsultaResponse {
        c_stat: collected.c_stat,
        x_motivo: collected.x_motivo,
    })
}

#[derive(Default)]
struct Collected {
    c_stat: Option<String>,
    x_motivo: Option<String>,
    fault: Option<String>,
    docs: Vec<DocZip>,
}

/// 로컬 이름 기준 공통 수집기.
/// cStat/xMotivo는 첫 번째 등장(최상위 상태)만 취한다 — 조회 응답은
/// protNFe 내부에 두 번째 cStat를 가질 수 있다.
fn collect(xml: &str) -> Result<Collected, CoreError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut collected = Collected::default();
    let mut current: Vec<u8> = Vec::new();
    let mut in_doc_zip = false;
    let mut in_fault = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                current = start.local_name().as_ref().to_vec();
                match current.as_slice() {
                    b"docZip" => {
                        let nsu = start
                            .try_get_attribute("NSU")
                            .map_err(|err| {
                                CoreError::Internal(format!("docZip 속성 파싱 실패: {err}"))
                            })?
                            .map(|attr| attr.unescape_value())
                            .transpose()
                            .map_err(|err| {
                                CoreError::Internal(format!("NSU 값 해석 실패: {err}"))
                            })?
                            .map(|value| value.into_owned());
                        collected.docs.push(DocZip {
                            nsu,
                            content: String::new(),
                        });
                        in_doc_zip = true;
                    }
                    b"Fault" => in_fault = true,
                    _ => {}
                }
            }
            Ok(Event::End(end)) => {
                match end.local_name().as_ref() {
                    b"docZip" => in_doc_zip = false,
                    b"Fault" => in_fault = false,
                    _ => {}
                }
                current.clear();
            }
            Ok(Event::Text(text)) => {
                let value = text
                    .unescape()
                    .map_err(|err| CoreError::Internal(format!("XML 텍스트 해석 실패: {err}")))?;
                if in_doc_zip {
                    if let Some(doc) = collected.docs.last_mut() {
                        doc.content.push_str(&value);
                    }
                } else if in_fault {
                    // SOAP 1.1은 faultstring, SOAP 1.2는 Reason/Text
                    if matches!(current.as_slice(), b"faultstring" | b"Text") {
                        collected.fault = Some(value.into_owned());
                    }
                } else {
                    match current.as_slice() {
                        b"cStat" if collected.c_stat.is_none() => {
                            collected.c_stat = Some(value.into_owned());
                        }
                        b"xMotivo" if collected.x_motivo.is_none() => {
                            collected.x_motivo = Some(value.into_owned());
                        }
                        _ => {}
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                return Err(CoreError::Internal(format!("SOAP 응답 파싱 실패: {err}")));
            }
        }
    }

    Ok(collected)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHAVE: &str = "35240112345678000190550010000000011000000010";

    #[test]
    fn dist_envelope_carries_query_fields() {
        let xml = dist_dfe_envelope("12345678000190", CHAVE, 1, 35);
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="utf-8"?>"#));
        assert!(xml.contains(
            r#"<distDFeInt xmlns="http://www.portalfiscal.inf.br/nfe" versao="1.01">"#
        ));
        assert!(xml.contains("<CNPJ>12345678000190</CNPJ>"));
        assert!(xml.contains(&format!("<chNFe>{CHAVE}</chNFe>")));
        assert!(xml.contains("<tpAmb>1</tpAmb>"));
        assert!(xml.contains("<cUFAutor>35</cUFAutor>"));
    }

    #[test]
    fn consulta_envelope_uses_schema_4_00() {
        let xml = cons_sit_envelope(CHAVE, 1);
        assert!(xml.contains(r#"versao="4.00""#));
        assert!(xml.contains("<xServ>CONSULTAR</xServ>"));
        assert!(xml.contains(&format!("<chNFe>{CHAVE}</chNFe>")));
        assert!(xml.contains("http://schemas.xmlsoap.org/soap/envelope/"));
    }

    #[test]
    fn dist_response_with_two_documents() {
        let xml = r#"<?xml version="1.0"?>
<soap:Envelope xmlns:soap="http://www.w3.org/2003/05/soap-envelope">
  <soap:Body>
    <nfeDistDFeInteresseResponse>
      <nfeDistDFeInteresseResult>
        <retDistDFeInt xmlns="http://www.portalfiscal.inf.br/nfe" versao="1.01">
          <tpAmb>1</tpAmb>
          <cStat>138</cStat>
          <xMotivo>Documento localizado</xMotivo>
          <loteDistDFeInt>
            <docZip NSU="000000000000101" schema="procNFe_v4.00.xsd">YWJj</docZip>
            <docZip NSU="000000000000102" schema="procNFe_v4.00.xsd">ZGVm</docZip>
          </loteDistDFeInt>
        </retDistDFeInt>
      </nfeDistDFeInteresseResult>
    </nfeDistDFeInteresseResponse>
  </soap:Body>
</soap:Envelope>"#;
        let resp = parse_dist_response(xml).unwrap();
        assert_eq!(resp.c_stat.as_deref(), Some("138"));
        assert_eq!(resp.x_motivo.as_deref(), Some("Documento localizado"));
        assert_eq!(resp.docs.len(), 2);
        assert_eq!(resp.docs[0].nsu.as_deref(), Some("000000000000101"));
        assert_eq!(resp.docs[0].content, "YWJj");
        assert_eq!(resp.docs[1].nsu.as_deref(), Some("000000000000102"));
        assert_eq!(resp.docs[1].content, "ZGVm");
    }

    #[test]
    fn doc_zip_without_nsu_attribute() {
        let xml = "<retDistDFeInt><cStat>138</cStat><loteDistDFeInt>\
                   <docZip>YWJj</docZip></loteDistDFeInt></retDistDFeInt>";
        let resp = parse_dist_response(xml).unwrap();
        assert_eq!(resp.docs.len(), 1);
        assert!(resp.docs[0].nsu.is_none());
        assert_eq!(resp.docs[0].content, "YWJj");
    }

    #[test]
    fn soap_fault_becomes_error() {
        let xml = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body>
    <soap:Fault>
      <faultcode>soap:Client</faultcode>
      <faultstring>certificado digital ausente</faultstring>
    </soap:Fault>
  </soap:Body>
</soap:Envelope>"#;
        let err = parse_dist_response(xml).unwrap_err();
        assert!(err.to_string().contains("SOAP Fault"));
        assert!(err.to_string().contains("certificado digital ausente"));
    }

    #[test]
    fn malformed_xml_is_rejected() {
        let err = parse_dist_response("<retDistDFeInt><cStat>138</retDistDFeInt>").unwrap_err();
        assert!(err.to_string().contains("파싱 실패"));
    }

    #[test]
    fn consulta_response_takes_top_level_status() {
        let xml = r#"<retConsSitNFe versao="4.00" xmlns="http://www.portalfiscal.inf.br/nfe">
  <tpAmb>1</tpAmb>
  <cStat>100</cStat>
  <xMotivo>Autorizado o uso da NF-e</xMotivo>
  <protNFe>
    <infProt>
      <cStat>100</cStat>
    </infProt>
  </protNFe>
</retConsSitNFe>"#;
        let resp = parse_consulta_response(xml).unwrap();
        assert_eq!(resp.c_stat.as_deref(), Some("100"));
        assert_eq!(resp.x_motivo.as_deref(), Some("Autorizado o uso da NF-e"));
    }
}
