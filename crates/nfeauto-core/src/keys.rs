//! NFe 접근 키 검증 및 키 파일 로더.
//!
//! 접근 키는 44자리 숫자 문자열이다. 입력에서 숫자 이외 문자를 제거한 뒤
//! 정확히 44자리가 남아야 유효하다.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::{info, warn};

/// 접근 키 자릿수
pub const KEY_DIGITS: usize = 44;

/// 검증 완료된 44자리 NFe 접근 키 (생성 후 불변)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceKey(String);

impl InvoiceKey {
    /// 입력을 정규화(숫자 이외 제거)한 뒤 44자리 규칙으로 검증한다
    pub fn parse(input: &str) -> Result<Self, CoreError> {
        let normalized = normalize(input);
        if normalized.len() != KEY_DIGITS {
            return Err(CoreError::Validation {
                field: "chave".to_string(),
                message: format!("44자리 필요, {}자리 입력됨", normalized.len()),
            });
        }
        Ok(Self(normalized))
    }

    /// 전체 키 문자열
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 로그용 축약 표기 (앞 8자리)
    pub fn short(&self) -> &str {
        &self.0[..8]
    }
}

impl fmt::Display for InvoiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}...", self.short())
    }
}

/// 숫자 이외 문자 제거
fn normalize(input: &str) -> String {
    input.chars().filter(char::is_ascii_digit).collect()
}

/// 키 유효성 검사 — 정규화 후 정확히 44자리 숫자인지
pub fn validate_key(input: &str) -> bool {
    normalize(input).len() == KEY_DIGITS
}

/// 키 파일 로드 결과
#[derive(Debug, Clone)]
pub struct KeyFile {
    /// 유효한 키 목록 (파일 내 순서 유지)
    pub keys: Vec<InvoiceKey>,
    /// 무효로 건너뛴 줄 수
    pub invalid_count: usize,
}

/// 키 파일 로드 — 한 줄당 키 하나, 빈 줄은 무시, 무효한 줄은 집계 후 건너뜀
pub fn load_key_file(path: &Path) -> Result<KeyFile, CoreError> {
    let content = std::fs::read_to_string(path).map_err(|e| CoreError::NotFound {
        resource_type: "KeyFile".to_string(),
        id: format!("{}: {}", path.display(), e),
    })?;

    let mut keys = Vec::new();
    let mut invalid_count = 0;

    for (line_no, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match InvoiceKey::parse(trimmed) {
            Ok(key) => keys.push(key),
            Err(_) => {
                warn!("무효한 키 건너뜀 (줄 {}): {}자리", line_no + 1, normalize(trimmed).len());
                invalid_count += 1;
            }
        }
    }

    info!(
        "키 파일 로드 완료: {} — 유효 {}개, 무효 {}개",
        path.display(),
        keys.len(),
        invalid_count
    );
    Ok(KeyFile { keys, invalid_count })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const VALID_KEY: &str = "35200714200166000187550010000000046550000046";

    #[test]
    fn parse_valid_key() {
        let key = InvoiceKey::parse(VALID_KEY).unwrap();
        assert_eq!(key.as_str(), VALID_KEY);
        assert_eq!(key.short(), "35200714");
    }

    #[test]
    fn parse_strips_non_digits() {
        let formatted = "3520 0714 2001 6600 0187 5500 1000 0000 0465 5000 0046";
        let key = InvoiceKey::parse(formatted).unwrap();
        assert_eq!(key.as_str(), VALID_KEY);
    }

    #[test]
    fn parse_rejects_wrong_length() {
        assert!(InvoiceKey::parse("12345").is_err());
        assert!(InvoiceKey::parse(&VALID_KEY[..43]).is_err());
        assert!(InvoiceKey::parse(&format!("{VALID_KEY}9")).is_err());
        assert!(InvoiceKey::parse("").is_err());
    }

    #[test]
    fn validate_key_matches_parse() {
        assert!(validate_key(VALID_KEY));
        assert!(validate_key("35-2007-14200166000187-55-001-000000004-655000004-6"));
        assert!(!validate_key("abcdef"));
        // 문자가 섞여도 숫자만 44자리면 유효
        assert!(validate_key(&format!("chave: {VALID_KEY}")));
        assert!(!validate_key(&format!("{VALID_KEY}0")));
    }

    #[test]
    fn display_masks_key() {
        let key = InvoiceKey::parse(VALID_KEY).unwrap();
        assert_eq!(key.to_string(), "35200714...");
    }

    #[test]
    fn load_key_file_skips_blank_and_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{VALID_KEY}").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "   ").unwrap();
        writeln!(file, "너무짧음123").unwrap();
        writeln!(file, "  {VALID_KEY}  ").unwrap();
        file.flush().unwrap();

        let loaded = load_key_file(file.path()).unwrap();
        assert_eq!(loaded.keys.len(), 2);
        assert_eq!(loaded.invalid_count, 1);
        assert_eq!(loaded.keys[0].as_str(), VALID_KEY);
    }

    #[test]
    fn load_key_file_missing_path() {
        let err = load_key_file(Path::new("/존재하지/않는/chaves.txt")).unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }
}
