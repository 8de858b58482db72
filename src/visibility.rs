//! Visibility resolution
//!
//! Walks the overlay alongside the current value and records, for every node
//! carrying a condition, whether it is shown. Nodes without a condition are
//! absent from the map and count as visible. Array element conditions are
//! evaluated once per existing element.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::overlay::UiNode;
use crate::path::Path;
use crate::value::Value;

/// Shown/hidden flags keyed by path
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct VisibilityMap(BTreeMap<Path, bool>);

impl VisibilityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flag recorded for exactly `path`; ancestors are not consulted
    pub fn get(&self, path: &Path) -> Option<bool> {
        self.0.get(path).copied()
    }

    pub fn is_visible(&self, path: &Path) -> bool {
        self.get(path).unwrap_or(true)
    }

    pub fn insert(&mut self, path: Path, visible: bool) {
        self.0.insert(path, visible);
    }

    /// Hidden paths in path order
    pub fn hidden(&self) -> impl Iterator<Item = &Path> {
        self.0
            .iter()
            .filter(|(_, visible)| !**visible)
            .map(|(path, _)| path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, bool)> {
        self.0.iter().map(|(path, visible)| (path, *visible))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Evaluate every condition in `overlay` against `value`
pub fn resolve_visibility<V>(overlay: &UiNode<V>, value: &Value) -> VisibilityMap {
    let mut map = VisibilityMap::new();
    walk(overlay, &Path::root(), value, &mut map);
    map
}

fn walk<V>(node: &UiNode<V>, path: &Path, root: &Value, map: &mut VisibilityMap) {
    if let Some(cond) = &node.cond {
        map.insert(path.clone(), cond.evaluate(root));
    }

    for (name, child) in &node.fields {
        walk(child, &path.push_key(name), root, map);
    }

    if let Some(element) = node.element.as_deref() {
        let count = root.lookup(path).as_array().map_or(0, <[Value]>::len);
        for idx in 0..count {
            walk(element, &path.push_index(idx), root, map);
        }
    }
}
