use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use thiserror::Error;

const SOURCE_SUFFIX: &str = "py";

#[derive(Debug, Error)]
pub enum ModuleNotFound {
    #[error("invalid module name: {0:?}")]
    InvalidName(String),
    #[error("module {name} not found in search path {searched:?}")]
    Missing { name: String, searched: Vec<PathBuf> },
    #[error("failed to read module {name} at {}", .path.display())]
    Read {
        name: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedModule {
    pub name: String,
    pub path: PathBuf,
    pub source: String,
}

/// Resolves dotted module names against an explicit, per-loader search path.
#[derive(Debug, Clone)]
pub struct ModuleLoader {
    search_path: Vec<PathBuf>,
}

impl ModuleLoader {
    pub fn new(root: &Path) -> Self {
        Self {
            search_path: vec![root.to_path_buf()],
        }
    }

    pub fn search_path(&self) -> &[PathBuf] {
        &self.search_path
    }

    /// Appends `dirs` to the search path until the returned guard is dropped.
    pub fn extended(&mut self, dirs: impl IntoIterator<Item = PathBuf>) -> SearchPathGuard<'_> {
        let saved = self.search_path.clone();
        self.search_path.extend(dirs);
        SearchPathGuard {
            loader: self,
            saved: Some(saved),
        }
    }

    pub fn load(&self, name: &str) -> Result<LoadedModule, ModuleNotFound> {
        let parts: Vec<&str> = name.split('.').collect();
        if parts.iter().any(|p| p.is_empty() || p.contains(['/', '\\'])) {
            return Err(ModuleNotFound::InvalidName(name.to_string()));
        }

        for root in &self.search_path {
            let base = parts.iter().fold(root.clone(), |acc, p| acc.join(p));
            let candidates = [
                base.with_extension(SOURCE_SUFFIX),
                base.join(format!("__init__.{SOURCE_SUFFIX}")),
            ];
            for path in candidates {
                if !path.is_file() {
                    continue;
                }
                let source =
                    std::fs::read_to_string(&path).map_err(|source| ModuleNotFound::Read {
                        name: name.to_string(),
                        path: path.clone(),
                        source,
                    })?;
                return Ok(LoadedModule {
                    name: name.to_string(),
                    path,
                    source,
                });
            }
        }

        Err(ModuleNotFound::Missing {
            name: name.to_string(),
            searched: self.search_path.clone(),
        })
    }
}

/// Restores the loader's previous search path on drop, on every exit path.
#[derive(Debug)]
pub struct SearchPathGuard<'a> {
    loader: &'a mut ModuleLoader,
    saved: Option<Vec<PathBuf>>,
}

impl Deref for SearchPathGuard<'_> {
    type Target = ModuleLoader;

    fn deref(&self) -> &ModuleLoader {
        self.loader
    }
}

impl DerefMut for SearchPathGuard<'_> {
    fn deref_mut(&mut self) -> &mut ModuleLoader {
        self.loader
    }
}

impl Drop for SearchPathGuard<'_> {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            self.loader.search_path = saved;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn make_temp_dir() -> PathBuf {
        static SEQ: AtomicU64 = AtomicU64::new(0);
        let seq = SEQ.fetch_add(1, Ordering::Relaxed);
        let dir = std::env::temp_dir().join(format!(
            "testgen-arena-loader-test-{}-{seq}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).expect("create dir");
        dir
    }

    fn write_file(path: &Path, contents: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("mkdirs");
        }
        std::fs::write(path, contents).expect("write");
    }

    #[test]
    fn loads_module_and_package() {
        let root = make_temp_dir();
        write_file(&root.join("pkg/mod.py"), "x = 1\n");
        write_file(&root.join("pkg/__init__.py"), "");

        let loader = ModuleLoader::new(&root);
        let module = loader.load("pkg.mod").expect("load module");
        assert_eq!(module.path, root.join("pkg/mod.py"));
        assert_eq!(module.source, "x = 1\n");

        let package = loader.load("pkg").expect("load package");
        assert_eq!(package.path, root.join("pkg/__init__.py"));

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn missing_and_invalid_names_are_errors() {
        let root = make_temp_dir();
        let loader = ModuleLoader::new(&root);
        assert!(matches!(
            loader.load("nope"),
            Err(ModuleNotFound::Missing { .. })
        ));
        assert!(matches!(
            loader.load("a..b"),
            Err(ModuleNotFound::InvalidName(_))
        ));
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn extended_search_path_is_restored_after_scope() {
        let root = make_temp_dir();
        let extra = make_temp_dir();
        write_file(&extra.join("helper.py"), "");

        let mut loader = ModuleLoader::new(&root);
        {
            let scoped = loader.extended([extra.clone()]);
            assert_eq!(scoped.search_path().len(), 2);
            scoped.load("helper").expect("found via extra dir");
        }
        assert_eq!(loader.search_path(), &[root.clone()]);
        assert!(loader.load("helper").is_err());

        let _ = std::fs::remove_dir_all(&root);
        let _ = std::fs::remove_dir_all(&extra);
    }

    #[test]
    fn search_path_is_restored_when_scope_unwinds() {
        let root = make_temp_dir();
        let mut loader = ModuleLoader::new(&root);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _scoped = loader.extended([PathBuf::from("/does/not/matter")]);
            panic!("import blew up");
        }));
        assert!(result.is_err());
        assert_eq!(loader.search_path(), &[root.clone()]);

        let _ = std::fs::remove_dir_all(&root);
    }
}
