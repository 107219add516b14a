//! Instrument universe loading
//!
//! The universe is reference data loaded fresh at the start of every run.
//! Any failure to produce it is run-fatal, so errors here all surface as
//! `UniverseUnavailable`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use crate::common::errors::{EngineError, Result};
use crate::common::types::Instrument;

/// On-disk shape of one universe entry; the exchange is inferred from the
/// symbol rather than stored
#[derive(Debug, Deserialize)]
struct UniverseEntry {
    symbol: String,
    name: String,
}

/// Where the engine gets its instrument list
#[async_trait]
pub trait UniverseSource: Send + Sync {
    async fn load(&self) -> Result<Vec<Instrument>>;
}

/// JSON-file universe: an array of `{ symbol, name }` objects
pub struct FileUniverse {
    path: PathBuf,
}

impl FileUniverse {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl UniverseSource for FileUniverse {
    async fn load(&self) -> Result<Vec<Instrument>> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            EngineError::UniverseUnavailable(format!("read {}: {e}", self.path.display()))
        })?;

        let entries: Vec<UniverseEntry> = serde_json::from_str(&raw).map_err(|e| {
            EngineError::UniverseUnavailable(format!("parse {}: {e}", self.path.display()))
        })?;
        let instruments: Vec<Instrument> = entries
            .into_iter()
            .map(|e| Instrument::new(e.symbol, e.name))
            .collect();

        if instruments.is_empty() {
            return Err(EngineError::UniverseUnavailable(format!(
                "{} contains no instruments",
                self.path.display()
            )));
        }

        info!(count = instruments.len(), path = %self.path.display(), "loaded universe");
        Ok(instruments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn loads_instruments_from_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"symbol":"600519","name":"贵州茅台"}},{{"symbol":"000001","name":"平安银行"}}]"#
        )
        .unwrap();

        let universe = FileUniverse::new(file.path());
        let instruments = universe.load().await.unwrap();
        assert_eq!(instruments.len(), 2);
        assert_eq!(instruments[0].symbol, "600519");
        assert_eq!(
            instruments[0].exchange,
            crate::common::types::Exchange::Shanghai
        );
        assert_eq!(
            instruments[1].exchange,
            crate::common::types::Exchange::Shenzhen
        );
    }

    #[tokio::test]
    async fn missing_file_is_unavailable() {
        let universe = FileUniverse::new("/nonexistent/universe.json");
        let err = universe.load().await.unwrap_err();
        assert!(matches!(err, EngineError::UniverseUnavailable(_)));
    }

    #[tokio::test]
    async fn malformed_json_is_unavailable() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = FileUniverse::new(file.path()).load().await.unwrap_err();
        assert!(matches!(err, EngineError::UniverseUnavailable(_)));
    }

    #[tokio::test]
    async fn empty_universe_is_unavailable() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[]").unwrap();

        let err = FileUniverse::new(file.path()).load().await.unwrap_err();
        assert!(matches!(err, EngineError::UniverseUnavailable(_)));
    }
}
