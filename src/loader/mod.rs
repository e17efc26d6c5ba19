//! Loading test modules.
//!
//! A test module is a mapping from test name to test function. Where modules
//! come from is behind [`ModuleLoader`]: the CLI reads YAML files with
//! [`yaml::YamlModuleLoader`], embedders and tests can register modules in
//! memory with [`StaticModuleLoader`].

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::diagnostics::HarnessError;
use crate::runtime::Context;
use crate::Value;

pub mod discovery;
pub mod yaml;

/// A test function. Returning `Err` raises the payload as an uncaught error.
pub type TestFn = Rc<dyn Fn(&Context) -> Result<(), Value>>;

/// Named tests from one source. Names are unique; nothing may rely on the
/// order tests run in.
#[derive(Clone, Default)]
pub struct TestModule {
    tests: Vec<(String, TestFn)>,
}

impl TestModule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a test, replacing any existing test of the same name.
    pub fn insert<F>(&mut self, name: impl Into<String>, test: F)
    where
        F: Fn(&Context) -> Result<(), Value> + 'static,
    {
        self.insert_rc(name.into(), Rc::new(test));
    }

    fn insert_rc(&mut self, name: String, test: TestFn) {
        match self.tests.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = test,
            None => self.tests.push((name, test)),
        }
    }

    /// Builder form of [`TestModule::insert`].
    pub fn with_test<F>(mut self, name: impl Into<String>, test: F) -> Self
    where
        F: Fn(&Context) -> Result<(), Value> + 'static,
    {
        self.insert(name, test);
        self
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tests.iter().map(|(name, _)| name.as_str())
    }

    pub fn into_tests(self) -> Vec<(String, TestFn)> {
        self.tests
    }
}

/// Resolves a path to a loaded [`TestModule`].
pub trait ModuleLoader {
    fn load(&self, path: &Path) -> Result<TestModule, HarnessError>;
}

/// Turns command-line paths into the paths handed to the loader.
pub trait PathResolver {
    /// Directory relative paths are resolved against.
    fn base(&self) -> Result<PathBuf, HarnessError>;
    fn resolve(&self, base: &Path, relative: &Path) -> PathBuf;
}

/// Resolves against the process's current directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct CwdResolver;

impl PathResolver for CwdResolver {
    fn base(&self) -> Result<PathBuf, HarnessError> {
        std::env::current_dir().map_err(|e| HarnessError::io(Path::new("."), e))
    }

    fn resolve(&self, base: &Path, relative: &Path) -> PathBuf {
        if relative.is_absolute() {
            relative.to_path_buf()
        } else {
            base.join(relative)
        }
    }
}

/// In-memory modules keyed by path. A request matches a registered path
/// exactly or by trailing components, so `/work/a.yaml` finds `a.yaml`.
#[derive(Clone, Default)]
pub struct StaticModuleLoader {
    modules: HashMap<PathBuf, TestModule>,
}

impl StaticModuleLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_module(mut self, path: impl Into<PathBuf>, module: TestModule) -> Self {
        self.modules.insert(path.into(), module);
        self
    }
}

impl ModuleLoader for StaticModuleLoader {
    fn load(&self, path: &Path) -> Result<TestModule, HarnessError> {
        if let Some(module) = self.modules.get(path) {
            return Ok(module.clone());
        }
        self.modules
            .iter()
            .find(|(registered, _)| path.ends_with(registered))
            .map(|(_, module)| module.clone())
            .ok_or_else(|| {
                HarnessError::io(path, io::Error::new(io::ErrorKind::NotFound, "no such module"))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inserting_same_name_replaces_test() {
        let module = TestModule::new()
            .with_test("a", |_| Ok(()))
            .with_test("b", |_| Ok(()))
            .with_test("a", |_| Err(Value::from("replaced")));
        assert_eq!(module.len(), 2);
        assert_eq!(module.names().collect::<Vec<_>>(), ["a", "b"]);
    }

    #[test]
    fn static_loader_matches_trailing_components() {
        let loader = StaticModuleLoader::new().with_module("suite.yaml", TestModule::new());
        assert!(loader.load(Path::new("/work/suite.yaml")).is_ok());
        assert!(matches!(
            loader.load(Path::new("/work/other.yaml")),
            Err(HarnessError::Io { .. })
        ));
    }

    #[test]
    fn cwd_resolver_keeps_absolute_paths() {
        let resolver = CwdResolver;
        let base = Path::new("/base");
        assert_eq!(resolver.resolve(base, Path::new("/abs/a.yaml")), PathBuf::from("/abs/a.yaml"));
        assert_eq!(resolver.resolve(base, Path::new("a.yaml")), PathBuf::from("/base/a.yaml"));
    }
}
