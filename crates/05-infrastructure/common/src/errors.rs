//! 错误类型定义

use crate::identity::{ComponentInterfaceId, PackageId};
use thiserror::Error;

/// 注册表错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("组件重复注册: {interface}")]
    DuplicateComponent { interface: ComponentInterfaceId },

    #[error("组件从未被任何包声明: {interface}")]
    ComponentNotDeclared { interface: ComponentInterfaceId },

    #[error("组件已声明但尚未提供实现: {interface}")]
    ComponentMissing { interface: ComponentInterfaceId },

    #[error("组件类型不匹配: {interface}, 期望 {expected}, 实际 {actual}")]
    ComponentTypeMismatch {
        interface: ComponentInterfaceId,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("注册表已锁定，拒绝操作: {operation}")]
    RegistryLocked { operation: &'static str },

    #[error("包重复注册: {package}")]
    DuplicatePackage { package: PackageId },

    #[error("包未注册: {package}")]
    PackageNotRegistered { package: PackageId },

    #[error("组件 {interface} 已由 {existing} 提供，{package} 不能再次提供")]
    DuplicateProvider {
        interface: ComponentInterfaceId,
        existing: PackageId,
        package: PackageId,
    },

    #[error("依赖树不可用，初始化可能已经完成")]
    TreeUnavailable,
}

impl RegistryError {
    /// 是否为“找不到组件”类错误
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ComponentNotDeclared { .. } | Self::ComponentMissing { .. }
        )
    }
}

/// 依赖树排序错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DependencyTreeError {
    #[error("检测到循环依赖: {}", format_chain(.chain))]
    CircularDependency { chain: Vec<PackageId> },

    #[error("包 {package} 依赖的组件 {interface} 没有任何包提供")]
    UnprovidedComponent {
        package: PackageId,
        interface: ComponentInterfaceId,
    },

    #[error("依赖树中不存在包: {package}")]
    UnknownPackage { package: PackageId },
}

fn format_chain(chain: &[PackageId]) -> String {
    chain
        .iter()
        .map(PackageId::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// 包初始化错误类型
#[derive(Error, Debug)]
pub enum PackageError {
    #[error("包 {package} 缺少必需依赖: {interface}")]
    MissingRequiredDependency {
        package: PackageId,
        interface: ComponentInterfaceId,
    },

    #[error("包初始化时注册表操作失败: {source}")]
    Registry {
        #[from]
        source: RegistryError,
    },

    #[error("包 {package} 初始化失败: {message}")]
    InitializationFailed { package: PackageId, message: String },
}

impl PackageError {
    /// 创建初始化失败错误
    pub fn failed(package: PackageId, message: impl Into<String>) -> Self {
        Self::InitializationFailed {
            package,
            message: message.into(),
        }
    }
}

/// 单个包的失败记录
#[derive(Debug)]
pub struct PackageFailure {
    /// 失败的包
    pub package: PackageId,
    /// 失败原因
    pub error: PackageError,
}

/// 服务初始化错误类型
#[derive(Error, Debug)]
pub enum InitializationError {
    #[error("依赖树排序失败: {source}")]
    Sort {
        #[from]
        source: DependencyTreeError,
    },

    #[error("部分包无法初始化: {}", format_failures(.failures))]
    PackagesFailed { failures: Vec<PackageFailure> },

    #[error("注册表状态无效: {source}")]
    Registry {
        #[from]
        source: RegistryError,
    },

    #[error("服务正在初始化")]
    AlreadyInitializing,

    #[error("服务初始化已失败，不能再次初始化")]
    PreviouslyFailed,
}

impl InitializationError {
    /// 是否由循环依赖引起
    pub fn is_circular_dependency(&self) -> bool {
        matches!(
            self,
            Self::Sort {
                source: DependencyTreeError::CircularDependency { .. }
            }
        )
    }
}

fn format_failures(failures: &[PackageFailure]) -> String {
    failures
        .iter()
        .map(|failure| format!("[{}] {}", failure.package, failure.error))
        .collect::<Vec<_>>()
        .join("; ")
}

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    #[error("配置文件读取失败: {source}")]
    FileReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("配置解析失败: {path}, 原因: {message}")]
    ParseError { path: String, message: String },

    #[error("配置值无效: {key}, 原因: {message}")]
    InvalidValue { key: String, message: String },
}

/// 调度器错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchedulerError {
    #[error("延迟时间不能为负数: {delay_seconds}")]
    NegativeDelay { delay_seconds: f64 },
}

/// 线程派发错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ThreadingError {
    #[error("主线程派发队列已关闭")]
    DispatcherClosed,

    #[error("派发到主线程的任务发生 panic")]
    TaskPanicked,

    #[error("不能在异步运行时中阻塞等待主线程，请改用 post")]
    BlockingInRuntime,
}

/// 服务核心错误类型
#[derive(Error, Debug)]
pub enum ServicesError {
    #[error("注册表错误: {source}")]
    Registry {
        #[from]
        source: RegistryError,
    },

    #[error("初始化错误: {source}")]
    Initialization {
        #[from]
        source: InitializationError,
    },

    #[error("配置错误: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("启动失败: {message}")]
    BootstrapFailed { message: String },
}

/// 结果类型别名
pub type RegistryResult<T> = Result<T, RegistryError>;
pub type DependencyTreeResult<T> = Result<T, DependencyTreeError>;
pub type PackageResult<T> = Result<T, PackageError>;
pub type InitializationResult<T> = Result<T, InitializationError>;
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type ThreadingResult<T> = Result<T, ThreadingError>;
pub type ServicesResult<T> = Result<T, ServicesError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circular_dependency_message_lists_chain() {
        let error = DependencyTreeError::CircularDependency {
            chain: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(error.to_string(), "检测到循环依赖: a -> b -> a");
    }

    #[test]
    fn test_not_found_classification() {
        let missing = RegistryError::ComponentMissing {
            interface: "x".into(),
        };
        let locked = RegistryError::RegistryLocked {
            operation: "register_service_component",
        };
        assert!(missing.is_not_found());
        assert!(!locked.is_not_found());
    }

    #[test]
    fn test_initialization_error_detects_cycles() {
        let error: InitializationError = DependencyTreeError::CircularDependency {
            chain: vec!["a".into(), "a".into()],
        }
        .into();
        assert!(error.is_circular_dependency());
        assert!(!InitializationError::PreviouslyFailed.is_circular_dependency());
    }
}
