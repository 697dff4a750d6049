//! 도메인 데이터 모델.
//!
//! 화면 요소(역할/좌표/감지 후보)와 자동화 실행(상태/단계/통계) 구조체를 정의한다.

pub mod element;
pub mod run;
