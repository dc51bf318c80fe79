//! 核心包提供的环境与身份组件

use crate::core_package::ProjectConfiguration;
use parking_lot::RwLock;
use services_common::ENVIRONMENT_NAME_KEY;
use tracing::debug;
use uuid::Uuid;

/// 未配置环境名称时使用的环境
pub const DEFAULT_ENVIRONMENT_NAME: &str = "production";
/// 云项目标识配置键
pub const CLOUD_PROJECT_ID_KEY: &str = "services.cloud-project-id";
/// 安装标识配置键，宿主持久化过标识时通过它传入
pub const INSTALLATION_ID_KEY: &str = "services.installation-id";
/// 外部用户标识配置键
pub const EXTERNAL_USER_ID_KEY: &str = "services.analytics-user-id";

/// 当前环境
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environments {
    current: String,
}

impl Environments {
    /// 从合并后的项目配置读取当前环境
    pub fn from_configuration(configuration: &ProjectConfiguration) -> Self {
        Self {
            current: configuration.get_string(ENVIRONMENT_NAME_KEY, DEFAULT_ENVIRONMENT_NAME),
        }
    }

    /// 当前环境名称
    pub fn current(&self) -> &str {
        &self.current
    }
}

/// 安装标识
///
/// 同一个核心包实例内保持不变。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallationId {
    identifier: String,
}

impl InstallationId {
    /// 使用已有标识
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
        }
    }

    /// 生成新的随机标识
    pub fn generate() -> Self {
        let identifier = Uuid::new_v4().to_string();
        debug!("生成安装标识 {}", identifier);
        Self { identifier }
    }

    /// 配置中给出标识时使用它，否则使用 `fallback`
    pub fn resolve(configuration: &ProjectConfiguration, fallback: &InstallationId) -> Self {
        let configured = configuration.get_string(INSTALLATION_ID_KEY, "");
        if configured.is_empty() {
            fallback.clone()
        } else {
            Self::new(configured)
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }
}

/// 云项目标识
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloudProjectId {
    id: Option<String>,
}

impl CloudProjectId {
    /// 从项目配置读取，空字符串视为未配置
    pub fn from_configuration(configuration: &ProjectConfiguration) -> Self {
        let id = configuration.get_string(CLOUD_PROJECT_ID_KEY, "");
        Self {
            id: (!id.is_empty()).then_some(id),
        }
    }

    pub fn get(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

/// 外部用户标识
///
/// 由宿主在运行期间设置，可被多个包共享读取。
#[derive(Debug, Default)]
pub struct ExternalUserId {
    user_id: RwLock<Option<String>>,
}

impl ExternalUserId {
    /// 使用项目配置中的用户标识作为初始值
    pub fn from_configuration(configuration: &ProjectConfiguration) -> Self {
        let seeded = configuration.get_string(EXTERNAL_USER_ID_KEY, "");
        Self {
            user_id: RwLock::new((!seeded.is_empty()).then_some(seeded)),
        }
    }

    /// 当前用户标识
    pub fn get(&self) -> Option<String> {
        self.user_id.read().clone()
    }

    /// 设置或清除用户标识
    pub fn set(&self, user_id: Option<String>) {
        *self.user_id.write() = user_id;
    }
}
