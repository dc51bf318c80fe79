//! # Registry Abstractions
//!
//! 组件注册表与包注册表的抽象层，定义注册、查询和依赖声明的核心接口。
//!
//! ## 核心接口
//!
//! - [`ComponentRegistry`] - 组件注册表接口
//! - [`PackageRegistry`] - 包注册表接口
//! - [`DependencyTree`] - 包与组件之间的依赖关系
//! - [`InitializablePackage`] - 可初始化包接口
//! - [`Diagnostics`] / [`Metrics`] - 启动过程的诊断与指标出口

pub mod component_registry;
pub mod package;
pub mod package_registry;
pub mod telemetry;
pub mod tree;

pub use component_registry::*;
pub use package::*;
pub use package_registry::*;
pub use telemetry::*;
pub use tree::*;
