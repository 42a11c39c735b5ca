//! Runtime configuration.

use std::path::Path;
use serde::{Deserialize, Serialize};
use hotelops_view::{SortOrder, DEFAULT_PAGE_SIZE};

/// Errors loading or checking a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Reading the file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid configuration JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A value is out of range
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Settings for an [`OperationsManager`](crate::OperationsManager).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationsConfig {
    /// Tenant (hotel) whose tasks are managed
    pub tenant_id: String,

    /// Rows per page in each family view
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Entries in the recent activity feed
    #[serde(default = "default_activity_limit")]
    pub activity_limit: usize,

    /// Open tasks a staff member may hold before auto-assign skips them
    #[serde(default = "default_max_workload")]
    pub max_workload: usize,

    /// Initial sort order of both family views
    #[serde(default)]
    pub default_sort: SortOrder,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_activity_limit() -> usize {
    6
}

fn default_max_workload() -> usize {
    8
}

impl Default for OperationsConfig {
    fn default() -> Self {
        Self {
            tenant_id: "default".to_string(),
            page_size: default_page_size(),
            activity_limit: default_activity_limit(),
            max_workload: default_max_workload(),
            default_sort: SortOrder::default(),
        }
    }
}

impl OperationsConfig {
    /// Defaults for `tenant_id`.
    pub fn for_tenant(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            ..Self::default()
        }
    }

    /// Read a JSON configuration file and validate it.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), tenant = %config.tenant_id, "Loaded configuration");
        Ok(config)
    }

    /// Reject values the manager cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tenant_id.trim().is_empty() {
            return Err(ConfigError::Invalid("tenant_id must not be empty".to_string()));
        }
        if self.page_size == 0 {
            return Err(ConfigError::Invalid("page_size must be at least 1".to_string()));
        }
        if self.max_workload == 0 {
            return Err(ConfigError::Invalid("max_workload must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_fields_use_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ops.json");
        tokio::fs::write(&path, r#"{"tenant_id": "addis-grand", "default_sort": "DUE_DATE"}"#)
            .await
            .unwrap();

        let config = OperationsConfig::load(&path).await.unwrap();
        assert_eq!(config.tenant_id, "addis-grand");
        assert_eq!(config.page_size, 20);
        assert_eq!(config.activity_limit, 6);
        assert_eq!(config.max_workload, 8);
        assert_eq!(config.default_sort, SortOrder::DueDate);
    }

    #[tokio::test]
    async fn test_invalid_files_are_rejected() {
        let dir = TempDir::new().unwrap();

        let zero_page = dir.path().join("zero.json");
        tokio::fs::write(&zero_page, r#"{"tenant_id": "t", "page_size": 0}"#).await.unwrap();
        assert!(matches!(OperationsConfig::load(&zero_page).await, Err(ConfigError::Invalid(_))));

        let broken = dir.path().join("broken.json");
        tokio::fs::write(&broken, "{").await.unwrap();
        assert!(matches!(OperationsConfig::load(&broken).await, Err(ConfigError::Json(_))));

        let missing = dir.path().join("missing.json");
        assert!(matches!(OperationsConfig::load(&missing).await, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_blank_tenant_is_invalid() {
        assert!(OperationsConfig::for_tenant("  ").validate().is_err());
        assert!(OperationsConfig::for_tenant("hotel-1").validate().is_ok());
    }
}
