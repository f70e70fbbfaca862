// src/table/source.rs

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    time::Duration,
};
use tokio::fs;
use tracing::debug;
use url::Url;

use super::TableId;

/// Provides the raw text of a source table. Where the bytes live (bundled
/// assets, a directory, a web server) is up to the implementation.
#[async_trait]
pub trait TableSource: Send + Sync {
    async fn fetch(&self, table: TableId) -> Result<String>;
}

/// Tables stored as `<dir>/<file_name>`.
#[derive(Debug, Clone)]
pub struct DirSource {
    dir: PathBuf,
}

impl DirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl TableSource for DirSource {
    async fn fetch(&self, table: TableId) -> Result<String> {
        let path = self.dir.join(table.file_name());
        debug!(table = %table, path = %path.display(), "reading table");
        fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read table file: {:?}", path))
    }
}

/// Tables served over HTTP as `<base>/<file_name>`.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    base: Url,
}

impl HttpSource {
    pub fn new(base: &str, timeout: Duration) -> Result<Self> {
        // `Url::join` replaces the last segment unless the base ends in '/'
        let base = if base.ends_with('/') {
            Url::parse(base)
        } else {
            Url::parse(&format!("{}/", base))
        }
        .with_context(|| format!("invalid table base URL `{}`", base))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("building HTTP client")?;
        Ok(Self { client, base })
    }

    pub fn url_for(&self, table: TableId) -> Result<Url> {
        self.base
            .join(table.file_name())
            .with_context(|| format!("joining {} onto {}", table.file_name(), self.base))
    }
}

#[async_trait]
impl TableSource for HttpSource {
    async fn fetch(&self, table: TableId) -> Result<String> {
        let url = self.url_for(table)?;
        debug!(table = %table, url = %url, "downloading table");
        let text = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("requesting {}", url))?
            .error_for_status()?
            .text()
            .await
            .with_context(|| format!("reading body of {}", url))?;
        Ok(text)
    }
}

/// In-memory tables, for embedding bundled data and for tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    tables: HashMap<TableId, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, table: TableId, text: impl Into<String>) -> Self {
        self.insert(table, text);
        self
    }

    pub fn insert(&mut self, table: TableId, text: impl Into<String>) {
        self.tables.insert(table, text.into());
    }
}

#[async_trait]
impl TableSource for MemorySource {
    async fn fetch(&self, table: TableId) -> Result<String> {
        self.tables
            .get(&table)
            .cloned()
            .ok_or_else(|| anyhow!("table {} not present in memory source", table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::io::Write;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_dir_source_reads_named_file() -> Result<()> {
        let dir = tempdir()?;
        let mut f = std::fs::File::create(dir.path().join("soil_ph_en.csv"))?;
        writeln!(f, "Crop Category,Crop,Optimal pH")?;
        writeln!(f, "Cereals,Rice,5.5-6.5")?;

        let source = DirSource::new(dir.path());
        let text = source.fetch(TableId::SoilPhEn).await?;
        assert!(text.contains("Rice"));

        let missing = source.fetch(TableId::SoilPhNe).await;
        assert!(missing.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_memory_source_missing_table_is_error() {
        let source = MemorySource::new().with_table(TableId::LimeRequirement, "a,b\n1,2\n");
        assert!(source.fetch(TableId::LimeRequirement).await.is_ok());
        assert!(source.fetch(TableId::CropCalendar).await.is_err());
    }

    #[test]
    fn test_http_source_urls() -> Result<()> {
        let source = HttpSource::new("https://example.org/assets/data", Duration::from_secs(5))?;
        assert_eq!(
            source.url_for(TableId::CropCalendar)?.as_str(),
            "https://example.org/assets/data/crop_calendar.csv"
        );
        Ok(())
    }
}
