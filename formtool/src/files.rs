//! Reading and writing schema, hint, data and config files.
//!
//! The format follows the file extension: `.json`, or `.toml`/`.tml`.

use std::path::Path;

use anyhow::Context;
use schemaform::FormConfig;
use serde_json::Value;
use tokio::fs;

fn extension(path: &Path) -> &str {
    path.extension().and_then(|s| s.to_str()).unwrap_or("")
}

/// Parses `content` as the format implied by `path`.
pub fn parse_value(content: &str, path: &Path) -> anyhow::Result<Value> {
    let value = match extension(path) {
        "json" => serde_json::from_str(content)?,
        "toml" | "tml" => {
            let v: toml::Value = toml::from_str(content)?;
            serde_json::to_value(v)?
        }
        ext => bail!("Unsupported file extension: {ext:?}"),
    };
    Ok(value)
}

pub async fn read_value(path: &Path) -> anyhow::Result<Value> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    if content.trim().is_empty() {
        debug!("{} is empty", path.display());
        return Ok(Value::Null);
    }
    parse_value(&content, path).with_context(|| format!("failed to parse {}", path.display()))
}

/// Reads `path` when given; an empty file counts as absent.
pub async fn read_optional(path: Option<&Path>) -> anyhow::Result<Option<Value>> {
    match path {
        Some(path) => Ok(Some(read_value(path).await?).filter(|v| !v.is_null())),
        None => Ok(None),
    }
}

pub async fn write_value(path: &Path, value: &Value) -> anyhow::Result<()> {
    let content = match extension(path) {
        "toml" | "tml" => toml::to_string_pretty(value)?,
        "json" => serde_json::to_string_pretty(value)?,
        ext => bail!("Unsupported file extension: {ext:?}"),
    };
    fs::write(path, content)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!("wrote {}", path.display());
    Ok(())
}

/// Loads the form config, or the defaults when no file is given.
pub async fn load_config(path: Option<&Path>) -> anyhow::Result<FormConfig> {
    let Some(value) = read_optional(path).await? else {
        return Ok(FormConfig::default());
    };
    let config = serde_json::from_value(value).context("invalid form config")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scratch(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("formtool-{}-{name}", std::process::id()))
    }

    #[test]
    fn test_parse_by_extension() {
        let toml = parse_value("name = \"Ada\"\n[inner]\nn = 1\n", Path::new("a.toml")).unwrap();
        assert_eq!(toml, json!({"name": "Ada", "inner": {"n": 1}}));
        let json = parse_value(r#"{"a": [1, 2]}"#, Path::new("a.json")).unwrap();
        assert_eq!(json, json!({"a": [1, 2]}));
        assert!(
            parse_value("{}", Path::new("a.yaml")).is_err(),
            "unknown extensions are rejected"
        );
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let path = scratch("data.toml");
        let value = json!({"name": "Ada", "tags": ["x"]});
        write_value(&path, &value).await.unwrap();
        assert_eq!(read_value(&path).await.unwrap(), value);
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_config_partial_file() {
        let path = scratch("config.json");
        std::fs::write(&path, r#"{"live_validate": true}"#).unwrap();
        let config = load_config(Some(&path)).await.unwrap();
        assert!(config.live_validate);
        assert_eq!(config.id_separator, "_");
        assert_eq!(load_config(None).await.unwrap(), FormConfig::default());
        let _ = std::fs::remove_file(&path);
    }
}
