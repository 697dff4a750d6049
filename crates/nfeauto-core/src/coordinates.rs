//! 요소 좌표 저장소.
//!
//! 6개 역할의 화면 좌표를 coordinates.json에 저장/로드한다.
//! 파일이 없으면 전 역할 (0, 0) 기본값으로 시작한다.

use crate::error::CoreError;
use crate::models::element::{ElementRole, NamedCoordinates, ScreenPosition};
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

/// 좌표 파일 이름
pub const COORDINATES_FILE_NAME: &str = "coordinates.json";

/// 좌표 저장소
///
/// 수동 캡처, 자동 감지, 파일 로드로 생성된 좌표를 관리한다.
/// 실행 중에는 엔진이 스냅샷을 읽기 전용으로 소비한다.
#[derive(Debug, Clone)]
pub struct CoordinateStore {
    /// 현재 좌표 (스레드 안전)
    coordinates: Arc<RwLock<NamedCoordinates>>,
    /// 좌표 파일 경로
    path: PathBuf,
}

impl CoordinateStore {
    /// 지정된 경로로 좌표 저장소 생성
    ///
    /// 파일이 있으면 로드하고, 없으면 전 역할 (0, 0) 기본값을 사용한다.
    pub fn with_path(path: PathBuf) -> Result<Self, CoreError> {
        let coordinates = if path.exists() {
            Self::load_from_file(&path)?
        } else {
            debug!("좌표 파일 없음, 기본값 사용: {}", path.display());
            NamedCoordinates::all_zero()
        };

        Ok(Self {
            coordinates: Arc::new(RwLock::new(coordinates)),
            path,
        })
    }

    /// 현재 좌표 스냅샷 반환
    pub fn snapshot(&self) -> NamedCoordinates {
        self.coordinates.read().unwrap().clone()
    }

    /// 역할의 좌표 조회
    pub fn get(&self, role: ElementRole) -> Option<ScreenPosition> {
        self.coordinates.read().unwrap().get(role)
    }

    /// 역할의 좌표 설정 (메모리만, 저장은 [`save`](Self::save))
    pub fn set(&self, role: ElementRole, position: ScreenPosition) {
        self.coordinates.write().unwrap().set(role, position);
        debug!("좌표 설정: {} = {}", role, position);
    }

    /// 감지 결과 병합 — None 역할은 기존 값 유지
    pub fn merge_detected(&self, detected: &NamedCoordinates) {
        let mut coords = self.coordinates.write().unwrap();
        for (role, position) in detected.iter() {
            if let Some(pos) = position {
                if pos.is_set() {
                    coords.set(role, pos);
                }
            }
        }
    }

    /// 좌표 전체 교체 및 파일 저장
    pub fn replace(&self, new_coordinates: NamedCoordinates) -> Result<(), CoreError> {
        {
            let mut coords = self.coordinates.write().unwrap();
            *coords = new_coordinates;
        }
        self.save()
    }

    /// 현재 좌표를 파일에 저장
    pub fn save(&self) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let coords = self.coordinates.read().unwrap().clone();
        let content = serde_json::to_string_pretty(&coords)?;
        fs::write(&self.path, content)?;
        info!("좌표 저장 완료: {}", self.path.display());
        Ok(())
    }

    /// 좌표 파일 경로 반환
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// 6개 역할이 모두 0이 아닌 좌표인지 검증
    pub fn validate(&self) -> Result<(), CoreError> {
        let coords = self.coordinates.read().unwrap();
        for role in ElementRole::ALL {
            match coords.get(role) {
                Some(pos) if pos.is_set() => {}
                Some(_) => {
                    return Err(CoreError::Validation {
                        field: role.key().to_string(),
                        message: "좌표가 (0, 0)입니다".to_string(),
                    });
                }
                None => {
                    return Err(CoreError::Validation {
                        field: role.key().to_string(),
                        message: "좌표가 없습니다".to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// 파일에서 좌표 로드
    fn load_from_file(path: &PathBuf) -> Result<NamedCoordinates, CoreError> {
        let content = fs::read_to_string(path)?;
        let coords: NamedCoordinates = serde_json::from_str(&content).map_err(|e| {
            warn!("좌표 파일 파싱 실패: {}: {}", path.display(), e);
            CoreError::Serialization(e)
        })?;
        debug!("좌표 파일 로드 완료: {}", path.display());
        Ok(coords)
    }
}
