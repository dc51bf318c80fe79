//! 依赖树排序
//!
//! 基于深度优先搜索的拓扑排序：提供者总是排在依赖它的包之前。

use registry_abstractions::DependencyTree;
use services_common::{DependencyTreeError, DependencyTreeResult, PackageId};
use std::collections::HashMap;
use tracing::debug;

/// 探索标记
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExplorationMark {
    /// 正在搜索路径上
    Viewed,
    /// 已排序
    Sorted,
}

/// 依赖树排序器
#[derive(Debug)]
pub struct DependencyTreeSorter<'a> {
    tree: &'a DependencyTree,
    marks: HashMap<PackageId, ExplorationMark>,
    path: Vec<PackageId>,
    sorted: Vec<PackageId>,
}

impl<'a> DependencyTreeSorter<'a> {
    /// 计算初始化顺序
    ///
    /// 先移除无人提供的可选依赖，再按注册顺序遍历所有包。出现循环依赖或
    /// 必需依赖无人提供时返回错误，不给出部分结果。
    pub fn sort(tree: &mut DependencyTree) -> DependencyTreeResult<Vec<PackageId>> {
        tree.remove_unprovided_optional_dependencies();

        let tree: &DependencyTree = tree;
        let mut sorter = DependencyTreeSorter {
            tree,
            marks: HashMap::with_capacity(tree.package_count()),
            path: Vec::new(),
            sorted: Vec::with_capacity(tree.package_count()),
        };

        for package in tree.package_ids() {
            sorter.visit(package)?;
        }

        debug!("初始化顺序: {:?}", sorter.sorted);
        Ok(sorter.sorted)
    }

    fn visit(&mut self, package: &PackageId) -> DependencyTreeResult<()> {
        match self.marks.get(package) {
            Some(ExplorationMark::Sorted) => return Ok(()),
            Some(ExplorationMark::Viewed) => {
                let start = self
                    .path
                    .iter()
                    .position(|visited| visited == package)
                    .unwrap_or(0);
                let mut chain = self.path[start..].to_vec();
                chain.push(package.clone());
                return Err(DependencyTreeError::CircularDependency { chain });
            }
            None => {}
        }

        self.marks.insert(package.clone(), ExplorationMark::Viewed);
        self.path.push(package.clone());

        let tree = self.tree;
        let dependencies =
            tree.dependencies_of(package)
                .ok_or_else(|| DependencyTreeError::UnknownPackage {
                    package: package.clone(),
                })?;

        for dependency in dependencies {
            let provider = tree.provider_of(&dependency.component).ok_or_else(|| {
                DependencyTreeError::UnprovidedComponent {
                    package: package.clone(),
                    interface: dependency.component.clone(),
                }
            })?;
            self.visit(provider)?;
        }

        self.path.pop();
        self.marks.insert(package.clone(), ExplorationMark::Sorted);
        self.sorted.push(package.clone());
        Ok(())
    }
}
