//! # 注册表具体实现
//!
//! 提供组件注册表、包注册表、锁定包装器、依赖树排序器以及按顺序初始化包的启动器。
//!
//! ## 基本使用
//!
//! ```rust
//! use registry_impl::CoreRegistry;
//! use services_common::ComponentInterface;
//! use std::sync::Arc;
//!
//! struct GreetingInterface;
//!
//! impl ComponentInterface for GreetingInterface {
//!     const ID: &'static str = "demo.greeting";
//!     type Instance = String;
//! }
//!
//! let mut registry = CoreRegistry::new();
//! registry
//!     .register_service_component::<GreetingInterface>(Arc::new("hello".to_string()))
//!     .unwrap();
//!
//! let greeting = registry.get_service_component::<GreetingInterface>().unwrap();
//! assert_eq!(greeting.as_str(), "hello");
//! ```

pub mod component_registry;
pub mod core_registry;
pub mod initializer;
pub mod locked;
pub mod package_registry;
pub mod sorter;

pub use component_registry::ComponentRegistryImpl;
pub use core_registry::{CoreRegistration, CoreRegistry};
pub use initializer::{CoreRegistryInitializer, InitializationReport};
pub use locked::{LockedComponentRegistry, LockedPackageRegistry};
pub use package_registry::PackageRegistryImpl;
pub use sorter::DependencyTreeSorter;
