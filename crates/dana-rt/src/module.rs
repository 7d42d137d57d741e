//! Module Loader (Component J, §4.J).
//!
//! This module owns search-path resolution, the module cache, and cycle
//! bookkeeping. Actually *executing* a module's body is the interpreter's
//! job (it needs the statement executor), so `interpreter::stmt` drives the
//! load → parse → execute → export sequence, calling back into the helpers
//! here for everything that doesn't need a live interpreter.

use crate::error::Error;
use crate::value::{ForeignObject, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct LoadedModule {
    pub path: String,
    pub exports: HashMap<String, Value>,
}

enum ModuleState {
    Loading,
    Loaded(LoadedModule),
}

/// Sandbox-scoped cache of loaded/loading modules, keyed by dotted import
/// path. Tracks which modules are mid-load to detect import cycles.
#[derive(Default)]
pub struct ModuleCache {
    modules: HashMap<String, ModuleState>,
    loading_stack: Vec<String>,
}

impl ModuleCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_loaded(&self, path: &str) -> Option<LoadedModule> {
        match self.modules.get(path) {
            Some(ModuleState::Loaded(m)) => Some(m.clone()),
            _ => None,
        }
    }

    /// Begin loading `path`, returning a `CircularImport` error (naming the
    /// full cycle) if it's already mid-load.
    pub fn begin_load(&mut self, path: &str) -> Result<(), Error> {
        if self.loading_stack.iter().any(|p| p == path) {
            let mut cycle = self.loading_stack.clone();
            cycle.push(path.to_string());
            return Err(Error::CircularImport {
                cycle: cycle.join(" -> "),
            });
        }
        self.loading_stack.push(path.to_string());
        self.modules.insert(path.to_string(), ModuleState::Loading);
        Ok(())
    }

    pub fn finish_load(&mut self, path: &str, module: LoadedModule) {
        self.loading_stack.retain(|p| p != path);
        self.modules.insert(path.to_string(), ModuleState::Loaded(module));
    }

    pub fn abort_load(&mut self, path: &str) {
        self.loading_stack.retain(|p| p != path);
        self.modules.remove(path);
    }
}

/// Trait object the embedder supplies to resolve `import foo.py`-style
/// host-language imports. The core ships no implementation (§1: bridging to
/// a host-language module system is out of scope).
pub trait HostModuleBridge {
    fn load(&self, dotted_path: &str) -> Result<Value, Error>;
}

/// The runtime value bound to `import foo` — a read-only view over the
/// loaded module's exports, reached through the same attribute-access path
/// (`foo.bar`) as a struct field.
#[derive(Debug)]
pub struct ModuleObject {
    pub path: String,
    pub exports: HashMap<String, Value>,
}

impl ForeignObject for ModuleObject {
    fn type_name(&self) -> &str {
        "module"
    }

    fn get_attr(&self, name: &str) -> Option<Value> {
        self.exports.get(name).cloned()
    }
}

pub fn is_host_import(dotted_path: &str) -> bool {
    dotted_path.rsplit('.').next() == Some("py")
}

pub fn host_module_name(dotted_path: &str) -> String {
    dotted_path.rsplit_once('.').map(|(rest, _)| rest.to_string()).unwrap_or_default()
}

/// Search `search_paths` (in order) for `seg1/seg2/.../segN.na` or
/// `seg1/.../segN/__init__.na`, returning the first hit.
pub fn resolve_module_file(search_paths: &[PathBuf], dotted_path: &str) -> Result<PathBuf, Error> {
    let segments: Vec<&str> = dotted_path.split('.').collect();
    let mut candidates = Vec::new();
    for root in search_paths {
        let mut file_candidate = root.clone();
        for seg in &segments {
            file_candidate.push(seg);
        }
        let mut as_file = file_candidate.clone();
        as_file.set_extension("na");
        candidates.push(as_file.clone());
        if as_file.is_file() {
            return Ok(as_file);
        }

        let init_candidate = file_candidate.join("__init__.na");
        candidates.push(init_candidate.clone());
        if init_candidate.is_file() {
            return Ok(init_candidate);
        }
    }
    Err(Error::ModuleNotFound {
        path: dotted_path.to_string(),
        searched: candidates
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", "),
    })
}

/// Parse `DANAPATH` (OS-path-separated) into a search path list, prepended
/// to the current working directory (§4.J: "search paths come from a
/// `DANAPATH`-style configuration ... plus the current working directory").
pub fn search_paths_from_env(danapath: Option<&str>, cwd: &Path) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(danapath) = danapath {
        for p in std::env::split_paths(danapath) {
            paths.push(p);
        }
    }
    paths.push(cwd.to_path_buf());
    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_import_is_detected_by_trailing_py_segment() {
        assert!(is_host_import("math.py"));
        assert!(!is_host_import("math_helpers"));
        assert_eq!(host_module_name("os.path.py"), "os.path");
    }

    #[test]
    fn begin_load_twice_reports_the_cycle() {
        let mut cache = ModuleCache::new();
        cache.begin_load("a").unwrap();
        cache.begin_load("b").unwrap();
        let err = cache.begin_load("a").unwrap_err();
        match err {
            Error::CircularImport { cycle } => assert_eq!(cycle, "a -> b -> a"),
            other => panic!("expected circular import, got {other:?}"),
        }
    }

    #[test]
    fn finish_load_clears_loading_state() {
        let mut cache = ModuleCache::new();
        cache.begin_load("a").unwrap();
        cache.finish_load(
            "a",
            LoadedModule {
                path: "a".to_string(),
                exports: HashMap::new(),
            },
        );
        assert!(cache.get_loaded("a").is_some());
        // Reloading after completion is not a cycle.
        assert!(cache.begin_load("a").is_ok());
    }
}
