//! Built-in entity definitions embedded in the binary

use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Built-in entity YAML definitions
pub static BUILTIN_ENTITIES: LazyLock<BTreeMap<&'static str, &'static str>> =
    LazyLock::new(|| {
        let mut m = BTreeMap::new();
        m.insert("people", include_str!("../../entities/people.yaml"));
        m.insert("traffic", include_str!("../../entities/traffic.yaml"));
        m
    });

/// Get the YAML of a built-in entity
pub fn get_builtin(name: &str) -> Option<&'static str> {
    BUILTIN_ENTITIES.get(name.to_lowercase().as_str()).copied()
}

/// Names of all built-in entities, sorted
pub fn list_builtin() -> Vec<&'static str> {
    BUILTIN_ENTITIES.keys().copied().collect()
}
