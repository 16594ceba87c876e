use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

/// One probe target from a targets file.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct TargetConfig {
    pub host: String,
    pub port: u16,
}

impl TargetConfig {
    pub fn to_netloc(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct TargetsFile {
    pub targets: Vec<TargetConfig>,
}

/// Load targets from a JSON file of the form
/// `{"targets": [{"host": "router.example.net", "port": 6881}]}`.
pub async fn load_targets(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("reading targets file {}", path.display()))?;
    let file: TargetsFile = serde_json::from_str(&content)
        .with_context(|| format!("parsing targets file {}", path.display()))?;
    Ok(file.targets.iter().map(|t| t.to_netloc()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_targets_file() {
        let file: TargetsFile = serde_json::from_str(
            r#"{"targets": [
                {"host": "router.example.net", "port": 6881},
                {"host": "10.0.0.7", "port": 6882}
            ]}"#,
        )
        .unwrap();

        let netlocs: Vec<String> = file.targets.iter().map(|t| t.to_netloc()).collect();
        assert_eq!(netlocs, ["router.example.net:6881", "10.0.0.7:6882"]);
    }

    #[test]
    fn rejects_an_entry_without_a_port() {
        let parsed: std::result::Result<TargetsFile, _> =
            serde_json::from_str(r#"{"targets": [{"host": "router.example.net"}]}"#);
        assert!(parsed.is_err());
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        assert!(load_targets(Path::new("/nonexistent/targets.json")).await.is_err());
    }
}
