//! 注册表与服务初始化的生命周期状态

use crate::identity::PackageId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 服务初始化状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InitializationState {
    /// 未初始化
    Uninitialized,
    /// 初始化中
    Initializing,
    /// 已初始化
    Initialized,
    /// 初始化失败
    Failed,
}

impl Default for InitializationState {
    fn default() -> Self {
        Self::Uninitialized
    }
}

/// 注册表状态
///
/// 只能从 `Open` 单向迁移到 `Locked`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegistryState {
    /// 允许注册与查询
    Open,
    /// 只允许查询
    Locked,
}

impl RegistryState {
    /// 是否已锁定
    pub fn is_locked(&self) -> bool {
        matches!(self, Self::Locked)
    }
}

/// 单个包的初始化信息
#[derive(Debug, Clone)]
pub struct PackageInitializationInfo {
    /// 包标识
    pub package: PackageId,
    /// 开始时间
    pub started_at: chrono::DateTime<chrono::Utc>,
    /// 初始化耗时
    pub elapsed: Duration,
}

impl PackageInitializationInfo {
    /// 初始化耗时（秒）
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }
}
