use crate::{Error, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};

/// 글로벌 설정 디렉토리 이름 (`<config_dir>/warden`)
const APP_DIR: &str = "warden";

/// 프로젝트 설정 디렉토리 이름
const PROJECT_DIR: &str = ".warden";

/// 디렉토리 하나에 묶인 JSON 파일 저장소
///
/// Writes go through a sibling temp file and a rename, so a crashed save
/// never leaves a truncated config behind.
#[derive(Debug, Clone)]
pub struct JsonStore {
    base_dir: PathBuf,
}

impl JsonStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// `<config_dir>/warden/`
    pub fn global() -> Result<Self> {
        dirs::config_dir()
            .map(|dir| Self::new(dir.join(APP_DIR)))
            .ok_or_else(|| Error::Config("no platform config directory".into()))
    }

    /// `<root>/.warden/`
    pub fn project(root: impl Into<PathBuf>) -> Self {
        Self::new(root.into().join(PROJECT_DIR))
    }

    /// 현재 디렉토리에서 위로 올라가며 `.warden/`을 찾음
    ///
    /// Falls back to `<cwd>/.warden/` when no ancestor has one.
    pub fn current_project() -> Result<Self> {
        let cwd = std::env::current_dir()?;
        Ok(Self::discover(&cwd))
    }

    pub fn discover(start: &Path) -> Self {
        start
            .ancestors()
            .map(|dir| dir.join(PROJECT_DIR))
            .find(|candidate| candidate.is_dir())
            .map(Self::new)
            .unwrap_or_else(|| Self::project(start))
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn file_path(&self, filename: &str) -> PathBuf {
        self.base_dir.join(filename)
    }

    pub fn exists(&self, filename: &str) -> bool {
        self.file_path(filename).is_file()
    }

    /// 파일을 읽어 역직렬화
    pub fn load<T: DeserializeOwned>(&self, filename: &str) -> Result<T> {
        let path = self.file_path(filename);
        let content = std::fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("invalid JSON in {}: {}", path.display(), e)))
    }

    /// 파일이 없으면 `None`
    pub fn load_optional<T: DeserializeOwned>(&self, filename: &str) -> Result<Option<T>> {
        match self.exists(filename) {
            true => self.load(filename).map(Some),
            false => Ok(None),
        }
    }

    /// 직렬화 후 원자적으로 저장
    pub fn save<T: Serialize>(&self, filename: &str, data: &T) -> Result<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        let path = self.file_path(filename);
        let staging = path.with_extension("json.tmp");

        let content = serde_json::to_string_pretty(data)?;
        std::fs::write(&staging, content)?;
        std::fs::rename(&staging, &path)?;

        tracing::debug!(path = %path.display(), "Saved JSON store file");
        Ok(())
    }

    /// 파일 삭제 (없으면 무시)
    pub fn remove(&self, filename: &str) -> Result<()> {
        match std::fs::remove_file(self.file_path(filename)) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        name: String,
        limit: u32,
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::project(dir.path());
        let sample = Sample {
            name: "warden".into(),
            limit: 3,
        };

        store.save("sample.json", &sample).unwrap();
        assert!(store.exists("sample.json"));
        assert!(!store.exists("sample.json.tmp"));
        assert!(store.base_dir().ends_with(".warden"));

        let loaded: Sample = store.load("sample.json").unwrap();
        assert_eq!(loaded, sample);

        store.remove("sample.json").unwrap();
        store.remove("sample.json").unwrap();
        assert!(!store.exists("sample.json"));
    }

    #[test]
    fn test_load_optional_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        let loaded: Option<Sample> = store.load_optional("missing.json").unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.json"), "{not json").unwrap();
        let store = JsonStore::new(dir.path());
        let result: Result<Sample> = store.load("bad.json");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_discover_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".warden")).unwrap();
        let nested = dir.path().join("src/deep");
        std::fs::create_dir_all(&nested).unwrap();

        let store = JsonStore::discover(&nested);
        assert_eq!(store.base_dir(), dir.path().join(".warden"));
    }
}
