//! 日志初始化

use services_common::{ConfigError, ServicesError, ServicesResult};
use std::str::FromStr;
use tracing::info;

/// 日志配置
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: tracing::Level,
    /// 是否显示目标
    pub show_target: bool,
    /// 是否显示线程ID
    pub show_thread_ids: bool,
    /// 是否显示文件名
    pub show_file: bool,
    /// 是否显示行号
    pub show_line_number: bool,
    /// 是否使用 JSON 格式
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: tracing::Level::INFO,
            show_target: true,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// 创建开发环境日志配置
    pub fn development() -> Self {
        Self {
            level: tracing::Level::DEBUG,
            show_target: true,
            show_thread_ids: true,
            show_file: true,
            show_line_number: true,
            json_format: false,
        }
    }

    /// 创建生产环境日志配置
    pub fn production() -> Self {
        Self {
            level: tracing::Level::INFO,
            show_target: false,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: true,
        }
    }

    /// 使用字符串形式的日志级别，例如 `"debug"`
    pub fn with_level_str(mut self, level: &str) -> Result<Self, ConfigError> {
        self.level = tracing::Level::from_str(level).map_err(|e| ConfigError::InvalidValue {
            key: "logging.level".to_string(),
            message: e.to_string(),
        })?;
        Ok(self)
    }
}

/// 按配置初始化全局日志订阅者
///
/// 进程内只能成功初始化一次，重复调用返回错误。
pub fn init_logging(config: &LoggingConfig) -> ServicesResult<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(config.level)
        .with_target(config.show_target)
        .with_thread_ids(config.show_thread_ids)
        .with_file(config.show_file)
        .with_line_number(config.show_line_number);

    let result = if config.json_format {
        subscriber.json().try_init()
    } else {
        subscriber.try_init()
    };
    result.map_err(|e| ServicesError::BootstrapFailed {
        message: format!("日志初始化失败: {}", e),
    })?;

    info!("日志系统初始化完成");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_string() {
        let config = LoggingConfig::production().with_level_str("warn").unwrap();
        assert_eq!(config.level, tracing::Level::WARN);
        assert!(config.json_format);
    }

    #[test]
    fn test_invalid_level_rejected() {
        let err = LoggingConfig::default()
            .with_level_str("chatty")
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
