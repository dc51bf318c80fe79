//! 初始化选项

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;

/// 环境名称选项键
pub const ENVIRONMENT_NAME_KEY: &str = "services.environment-name";

/// 传递给每个包初始化器的选项
///
/// 值以 JSON 形式保存，读取时按需要的类型反序列化。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InitializationOptions {
    values: HashMap<String, Value>,
}

impl InitializationOptions {
    /// 创建空选项
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置选项，覆盖同名旧值
    pub fn set_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// 设置环境名称
    pub fn set_environment_name(self, environment: impl Into<String>) -> Self {
        self.set_option(ENVIRONMENT_NAME_KEY, environment.into())
    }

    /// 获取环境名称
    pub fn environment_name(&self) -> Option<String> {
        self.try_get_option(ENVIRONMENT_NAME_KEY)
    }

    /// 读取选项，键不存在或类型不符时返回 `None`
    pub fn try_get_option<T>(&self, key: &str) -> Option<T>
    where
        T: DeserializeOwned,
    {
        self.values
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// 获取原始 JSON 值
    pub fn get_raw(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// 合并另一组选项，`other` 中的值优先
    pub fn merge(mut self, other: &InitializationOptions) -> Self {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
        self
    }

    /// 所有选项
    pub fn values(&self) -> &HashMap<String, Value> {
        &self.values
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<HashMap<String, Value>> for InitializationOptions {
    fn from(values: HashMap<String, Value>) -> Self {
        Self { values }
    }
}
