use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

/// One source file selected for test generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    /// Absolute path of the source file.
    pub source: PathBuf,
    /// `source` relative to the targets root; used to label report rows.
    pub relative_source: PathBuf,
    /// Dotted module name, e.g. `pkg.sub.mod`.
    pub source_module: String,
    /// Where a generated test for this target is written.
    pub test: PathBuf,
}

impl Target {
    /// Builds a target for `source`, which may be absolute or relative to
    /// `targets_dir`. The source must live under `targets_dir`.
    pub fn new(targets_dir: &Path, tests_dir: &Path, source: &Path) -> Result<Self> {
        let source = if source.is_absolute() {
            source.to_path_buf()
        } else {
            targets_dir.join(source)
        };
        let relative_source = source
            .strip_prefix(targets_dir)
            .with_context(|| {
                format!(
                    "target {} is not inside the targets directory {}",
                    source.display(),
                    targets_dir.display()
                )
            })?
            .to_path_buf();

        let source_module = module_name(&relative_source)?;
        let test = test_path(tests_dir, &relative_source)?;

        Ok(Self {
            source,
            relative_source,
            source_module,
            test,
        })
    }
}

fn module_name(relative: &Path) -> Result<String> {
    let mut parts: Vec<String> = Vec::new();
    for component in relative.with_extension("").components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            other => anyhow::bail!(
                "unsupported path component {:?} in target {}",
                other.as_os_str(),
                relative.display()
            ),
        }
    }
    if parts.len() > 1 && parts.last().is_some_and(|p| p == "__init__") {
        parts.pop();
    }
    if parts.is_empty() {
        anyhow::bail!("target path is empty");
    }
    Ok(parts.join("."))
}

fn test_path(tests_dir: &Path, relative: &Path) -> Result<PathBuf> {
    let stem = relative
        .file_stem()
        .and_then(|s| s.to_str())
        .with_context(|| format!("target has no file name: {}", relative.display()))?;
    let ext = relative
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("py");
    let dir = match relative.parent() {
        Some(parent) => tests_dir.join(parent),
        None => tests_dir.to_path_buf(),
    };
    Ok(dir.join(format!("test_{stem}.{ext}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_module_and_test_path_from_nested_source() {
        let target = Target::new(
            Path::new("/work/targets"),
            Path::new("/work/generated_tests"),
            Path::new("pkg/sub/mod.py"),
        )
        .expect("target");

        assert_eq!(target.source, PathBuf::from("/work/targets/pkg/sub/mod.py"));
        assert_eq!(target.relative_source, PathBuf::from("pkg/sub/mod.py"));
        assert_eq!(target.source_module, "pkg.sub.mod");
        assert_eq!(
            target.test,
            PathBuf::from("/work/generated_tests/pkg/sub/test_mod.py")
        );
    }

    #[test]
    fn package_init_maps_to_package_module() {
        let target = Target::new(
            Path::new("/t"),
            Path::new("/g"),
            Path::new("/t/pkg/__init__.py"),
        )
        .expect("target");
        assert_eq!(target.source_module, "pkg");
        assert_eq!(target.test, PathBuf::from("/g/pkg/test___init__.py"));
    }

    #[test]
    fn source_outside_targets_dir_is_rejected() {
        let err = Target::new(Path::new("/t"), Path::new("/g"), Path::new("/elsewhere/a.py"))
            .unwrap_err();
        assert!(err.to_string().contains("not inside"), "{err}");
    }

    #[test]
    fn test_path_is_deterministic() {
        let a = Target::new(Path::new("/t"), Path::new("/g"), Path::new("a.py")).expect("a");
        let b = Target::new(Path::new("/t"), Path::new("/g"), Path::new("/t/a.py")).expect("b");
        assert_eq!(a, b);
        assert_eq!(a.test, PathBuf::from("/g/test_a.py"));
    }
}
