//! 服务配置
//!
//! 支持 TOML、JSON 文件和环境变量覆盖。

use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use services_common::{ConfigError, ConfigResult, InitializationOptions};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// 日志设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// 日志级别
    pub level: String,
    /// 是否输出 JSON
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// 服务配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServicesConfig {
    /// 环境名称
    pub environment: Option<String>,
    /// 传递给包初始化器的选项
    pub options: HashMap<String, Value>,
    /// 项目配置
    pub project: HashMap<String, Value>,
    /// 日志设置
    pub logging: LoggingSettings,
}

impl ServicesConfig {
    /// 从 TOML 文件加载
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let (shown, content) = read_config_file(path.as_ref())?;
        debug!("加载 TOML 配置文件: {}", shown);
        Self::from_toml_str(&content).map_err(|e| match e {
            ConfigError::ParseError { message, .. } => ConfigError::ParseError {
                path: shown,
                message,
            },
            other => other,
        })
    }

    /// 从 JSON 文件加载
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let (shown, content) = read_config_file(path.as_ref())?;
        debug!("加载 JSON 配置文件: {}", shown);
        serde_json::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: shown,
            message: e.to_string(),
        })
    }

    /// 按扩展名选择格式加载，`.json` 以外都按 TOML 解析
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_file(path),
            _ => Self::from_toml_file(path),
        }
    }

    /// 从 TOML 字符串解析
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError {
            path: "<inline>".to_string(),
            message: e.to_string(),
        })
    }

    /// 用进程环境变量覆盖配置
    ///
    /// 识别 `{PREFIX}_ENVIRONMENT`、`{PREFIX}_LOG_LEVEL` 和 `{PREFIX}_LOG_JSON`。
    pub fn apply_env_overrides(self, prefix: &str) -> ConfigResult<Self> {
        self.apply_overrides_from(prefix, std::env::vars())
    }

    /// 用给定的键值对覆盖配置
    pub fn apply_overrides_from<I>(mut self, prefix: &str, vars: I) -> ConfigResult<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let environment_key = format!("{}_ENVIRONMENT", prefix);
        let level_key = format!("{}_LOG_LEVEL", prefix);
        let json_key = format!("{}_LOG_JSON", prefix);

        for (key, value) in vars {
            if key == environment_key {
                debug!("环境变量覆盖 environment: {}", value);
                self.environment = Some(value);
            } else if key == level_key {
                debug!("环境变量覆盖 logging.level: {}", value);
                self.logging.level = value;
            } else if key == json_key {
                self.logging.json = value.parse().map_err(|_| ConfigError::InvalidValue {
                    key: key.clone(),
                    message: format!("期望 true 或 false，实际为 {}", value),
                })?;
            }
        }

        Ok(self)
    }

    /// 生成初始化选项
    pub fn initialization_options(&self) -> InitializationOptions {
        let options = InitializationOptions::from(self.options.clone());
        match &self.environment {
            Some(environment) => options.set_environment_name(environment.clone()),
            None => options,
        }
    }

    /// 生成日志配置
    pub fn logging_config(&self) -> ConfigResult<LoggingConfig> {
        let base = if self.logging.json {
            LoggingConfig::production()
        } else {
            LoggingConfig::default()
        };
        base.with_level_str(&self.logging.level)
    }
}

fn read_config_file(path: &Path) -> ConfigResult<(String, String)> {
    let shown = path.display().to_string();
    if !path.exists() {
        return Err(ConfigError::FileNotFound { path: shown });
    }
    let content = std::fs::read_to_string(path)?;
    Ok((shown, content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_toml_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
environment = "staging"

[options]
"auth.retries" = 3

[project]
"com.example.feature-enabled" = true
"com.example.api-url" = "https://example.invalid"

[logging]
level = "debug"
"#
        )
        .unwrap();

        let config = ServicesConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.environment.as_deref(), Some("staging"));
        assert_eq!(config.options["auth.retries"], Value::from(3));
        assert_eq!(config.project["com.example.feature-enabled"], Value::Bool(true));
        assert_eq!(config.logging.level, "debug");
        assert!(!config.logging.json);

        let options = config.initialization_options();
        assert_eq!(options.environment_name().as_deref(), Some("staging"));
        assert_eq!(options.try_get_option::<i64>("auth.retries"), Some(3));
    }

    #[test]
    fn test_load_json_file() {
        let file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        std::fs::write(
            file.path(),
            r#"{ "project": { "com.example.level": 7 }, "logging": { "json": true } }"#,
        )
        .unwrap();

        let config = ServicesConfig::from_file(file.path()).unwrap();
        assert_eq!(config.project["com.example.level"], Value::from(7));
        assert!(config.environment.is_none());
        assert_eq!(config.logging.level, "info");
        assert!(config.logging_config().unwrap().json_format);
    }

    #[test]
    fn test_missing_file() {
        let err = ServicesConfig::from_toml_file("/nonexistent/services.toml").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }

    #[test]
    fn test_parse_error_reports_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "environment = ").unwrap();

        let err = ServicesConfig::from_toml_file(file.path()).unwrap_err();
        match err {
            ConfigError::ParseError { path, .. } => {
                assert_eq!(path, file.path().display().to_string())
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_env_overrides() {
        let vars = vec![
            ("SVC_ENVIRONMENT".to_string(), "production".to_string()),
            ("SVC_LOG_LEVEL".to_string(), "warn".to_string()),
            ("SVC_LOG_JSON".to_string(), "true".to_string()),
            ("OTHER_ENVIRONMENT".to_string(), "ignored".to_string()),
        ];

        let config = ServicesConfig::default()
            .apply_overrides_from("SVC", vars)
            .unwrap();
        assert_eq!(config.environment.as_deref(), Some("production"));
        assert_eq!(config.logging.level, "warn");
        assert!(config.logging.json);
    }

    #[test]
    fn test_invalid_env_override() {
        let vars = vec![("SVC_LOG_JSON".to_string(), "maybe".to_string())];
        let err = ServicesConfig::default()
            .apply_overrides_from("SVC", vars)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
