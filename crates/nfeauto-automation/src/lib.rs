//! # nfeauto-automation
//!
//! GUI 자동화 크레이트.
//! 44자리 접근 키 대기열을 6단계 시퀀스(키 입력 → CAPTCHA → 계속 → 인증서 →
//! 다운로드 → 새 조회)로 처리하는 워커 루프와 상태 머신, 그리고 실제
//! 마우스/키보드 입력 드라이버(enigo)를 담당한다.

pub mod engine;
pub mod input_driver;
