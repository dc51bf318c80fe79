//! # Services Common
//!
//! 服务核心注册表的公共类型：组件接口标识、包标识、组件句柄、错误类型和初始化选项。
//!
//! ## 核心类型
//!
//! - [`ComponentInterfaceId`] / [`ComponentInterface`] - 组件接口的稳定标识
//! - [`PackageId`] - 可初始化包的稳定标识
//! - [`ComponentHandle`] / [`ComponentSlot`] - 已提供的组件实例与缺失占位符
//! - [`InitializationOptions`] - 传递给每个包初始化器的选项
//!
//! ## 设计原则
//!
//! - 接口标识在编译期声明，不依赖运行时类型哈希
//! - 注册表是显式构造的值，不存在全局单例

pub mod component;
pub mod errors;
pub mod identity;
pub mod lifecycle;
pub mod options;

pub use component::*;
pub use errors::*;
pub use identity::*;
pub use lifecycle::*;
pub use options::*;
