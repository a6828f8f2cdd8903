use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub report_type: String,
    pub content: String,
    #[serde(default)]
    pub sources: Vec<String>,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportCreate {
    pub title: String,
    #[serde(rename = "type", default = "default_report_type")]
    pub report_type: String,
    pub content: String,
    #[serde(default)]
    pub sources: Vec<String>,
}

fn default_report_type() -> String {
    "open_report".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub sources: Option<Vec<String>>,
}

/// JSON-file backed report storage, newest first. All mutations run under
/// one async lock since every report shares a single file.
pub struct ReportsStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl ReportsStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join("reports.json"),
            lock: Mutex::new(()),
        }
    }

    /// An absent or unreadable file reads as the empty list.
    async fn load_all(&self) -> io::Result<Vec<Report>> {
        match fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes).unwrap_or_default()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(err),
        }
    }

    async fn save_all(&self, items: &[Report]) -> io::Result<()> {
        let json = serde_json::to_vec_pretty(items).map_err(io::Error::other)?;
        fs::write(&self.path, json).await
    }

    pub async fn list(&self) -> io::Result<Vec<Report>> {
        let _guard = self.lock.lock().await;
        self.load_all().await
    }

    pub async fn create(&self, payload: ReportCreate) -> io::Result<Report> {
        let _guard = self.lock.lock().await;
        let mut items = self.load_all().await?;

        let now = Utc::now();
        let report = Report {
            id: format!("rpt_{}", &Uuid::new_v4().simple().to_string()[..8]),
            title: payload.title,
            report_type: payload.report_type,
            content: payload.content,
            sources: payload.sources,
            create_time: now,
            update_time: now,
        };

        items.insert(0, report.clone());
        self.save_all(&items).await?;
        Ok(report)
    }

    pub async fn get(&self, id: &str) -> io::Result<Option<Report>> {
        let _guard = self.lock.lock().await;
        let items = self.load_all().await?;
        Ok(items.into_iter().find(|r| r.id == id))
    }

    pub async fn update(&self, id: &str, payload: ReportUpdate) -> io::Result<Option<Report>> {
        let _guard = self.lock.lock().await;
        let mut items = self.load_all().await?;

        let Some(report) = items.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };

        if let Some(title) = payload.title {
            report.title = title;
        }
        if let Some(content) = payload.content {
            report.content = content;
        }
        if let Some(sources) = payload.sources {
            report.sources = sources;
        }
        report.update_time = Utc::now();
        let updated = report.clone();

        self.save_all(&items).await?;
        Ok(Some(updated))
    }

    pub async fn delete(&self, id: &str) -> io::Result<bool> {
        let _guard = self.lock.lock().await;
        let mut items = self.load_all().await?;

        let before = items.len();
        items.retain(|r| r.id != id);
        if items.len() == before {
            return Ok(false);
        }

        self.save_all(&items).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_payload(title: &str) -> ReportCreate {
        ReportCreate {
            title: title.to_string(),
            report_type: "open_report".to_string(),
            content: "正文".to_string(),
            sources: vec!["https://example.com".to_string()],
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportsStore::new(dir.path());

        let created = store.create(create_payload("季度报告")).await.unwrap();
        assert!(created.id.starts_with("rpt_"));
        assert_eq!(created.id.len(), "rpt_".len() + 8);

        let fetched = store.get(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "季度报告");
        assert_eq!(fetched.report_type, "open_report");
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportsStore::new(dir.path());

        store.create(create_payload("first")).await.unwrap();
        store.create(create_payload("second")).await.unwrap();

        let reports = store.list().await.unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].title, "second");
        assert_eq!(reports[1].title, "first");
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportsStore::new(dir.path());
        assert!(store.get("rpt_missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_partial() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportsStore::new(dir.path());
        let created = store.create(create_payload("原标题")).await.unwrap();

        let updated = store
            .update(
                &created.id,
                ReportUpdate {
                    title: None,
                    content: Some("新正文".to_string()),
                    sources: None,
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.title, "原标题");
        assert_eq!(updated.content, "新正文");
        assert_eq!(updated.sources, vec!["https://example.com".to_string()]);
        assert!(updated.update_time >= updated.create_time);
    }

    #[tokio::test]
    async fn test_update_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportsStore::new(dir.path());
        let result = store
            .update(
                "rpt_missing",
                ReportUpdate {
                    title: Some("x".to_string()),
                    content: None,
                    sources: None,
                },
            )
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportsStore::new(dir.path());
        let created = store.create(create_payload("to delete")).await.unwrap();

        assert!(store.delete(&created.id).await.unwrap());
        assert!(!store.delete(&created.id).await.unwrap());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("reports.json"), "not json").unwrap();

        let store = ReportsStore::new(dir.path());
        assert!(store.list().await.unwrap().is_empty());
    }
}
