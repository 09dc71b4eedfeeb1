//! LADSPA module scanner.
//!
//! Walks the search path (`LADSPA_PATH` followed by the user's module path),
//! opens every file carrying the platform module suffix, and enumerates the
//! descriptors each module exports.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::loader::{ModuleLoader, PluginModule};
use super::types::RawDescriptor;
use crate::error::{HostError, Result};

/// Environment variable holding the system search path.
pub const LADSPA_PATH_ENV: &str = "LADSPA_PATH";

/// Lists the plain file names in a directory.
pub trait DirectoryLister: Send + Sync {
    fn list_files(&self, dir: &Path) -> Result<Vec<String>>;
}

/// [`DirectoryLister`] over the real filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsLister;

impl DirectoryLister for FsLister {
    fn list_files(&self, dir: &Path) -> Result<Vec<String>> {
        let entries = std::fs::read_dir(dir).map_err(|source| HostError::DirectoryRead {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut names: Vec<String> = entries
            .flatten()
            .filter_map(|e| e.file_name().to_str().map(str::to_string))
            .collect();
        names.sort();
        Ok(names)
    }
}

/// One successfully opened module and the descriptors it exported.
pub struct ScannedModule {
    /// File name only; this is the identity used for persistence.
    pub file_name: String,
    pub module: Arc<dyn PluginModule>,
    /// `(table index, descriptor)` in enumeration order.
    pub descriptors: Vec<(usize, RawDescriptor)>,
}

/// Build the ordered directory list: the environment path first, then the
/// user-configured one.  Both are colon-separated; empty segments are
/// dropped.
pub fn search_paths(env_path: Option<&str>, user_path: &str) -> Vec<PathBuf> {
    env_path
        .into_iter()
        .chain(std::iter::once(user_path))
        .flat_map(|list| list.split(':'))
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Whether `name` carries the native module suffix (case-insensitive).
pub fn has_module_suffix(name: &str) -> bool {
    let suffix = std::env::consts::DLL_SUFFIX;
    name.len() > suffix.len()
        && name.is_char_boundary(name.len() - suffix.len())
        && name[name.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
}

pub struct ModuleScanner<'a> {
    loader: &'a dyn ModuleLoader,
    lister: &'a dyn DirectoryLister,
}

impl<'a> ModuleScanner<'a> {
    pub fn new(loader: &'a dyn ModuleLoader, lister: &'a dyn DirectoryLister) -> Self {
        Self { loader, lister }
    }

    /// Scan `dirs` in order.  Unreadable directories and unloadable modules
    /// are logged and skipped.
    pub fn scan(&self, dirs: &[PathBuf]) -> Vec<ScannedModule> {
        let mut modules = Vec::new();

        for dir in dirs {
            log::info!("ladspa: scanning {}", dir.display());
            self.scan_directory(dir, &mut modules);
        }

        let total: usize = modules.iter().map(|m| m.descriptors.len()).sum();
        log::info!(
            "ladspa: found {} descriptors in {} modules",
            total,
            modules.len()
        );
        modules
    }

    fn scan_directory(&self, dir: &Path, modules: &mut Vec<ScannedModule>) {
        let names = match self.lister.list_files(dir) {
            Ok(names) => names,
            Err(e) => {
                log::warn!("ladspa: {}", e);
                return;
            }
        };

        for name in names {
            if !has_module_suffix(&name) {
                continue;
            }
            if let Some(scanned) = self.scan_module(&dir.join(&name), name) {
                modules.push(scanned);
            }
        }
    }

    fn scan_module(&self, path: &Path, file_name: String) -> Option<ScannedModule> {
        log::debug!("ladspa: loading {}", path.display());

        let module = match self.loader.open(path) {
            Ok(m) => m,
            Err(e) => {
                log::warn!("ladspa: {}", e);
                return None;
            }
        };

        let descriptors: Vec<(usize, RawDescriptor)> = (0..)
            .map_while(|i| module.descriptor(i).map(|d| (i, d)))
            .collect();

        log::debug!(
            "ladspa: {} exports {} descriptors",
            file_name,
            descriptors.len()
        );

        Some(ScannedModule {
            file_name,
            module,
            descriptors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeLister, FakeLoader, FakeModule, amp_descriptor};

    #[test]
    fn test_search_paths_env_first() {
        let dirs = search_paths(Some("/usr/lib/ladspa:/opt/ladspa"), "/home/me/ladspa::/tmp");
        assert_eq!(
            dirs,
            vec![
                PathBuf::from("/usr/lib/ladspa"),
                PathBuf::from("/opt/ladspa"),
                PathBuf::from("/home/me/ladspa"),
                PathBuf::from("/tmp"),
            ]
        );
        assert!(search_paths(None, "").is_empty());
    }

    #[test]
    fn test_module_suffix() {
        let suffix = std::env::consts::DLL_SUFFIX;
        assert!(has_module_suffix(&format!("amp{}", suffix)));
        assert!(has_module_suffix(&format!("amp{}", suffix.to_uppercase())));
        assert!(!has_module_suffix("amp.txt"));
        assert!(!has_module_suffix(suffix));
    }

    #[test]
    fn test_scan_skips_bad_directories_and_modules() {
        let so = std::env::consts::DLL_SUFFIX;
        let lister = FakeLister::default()
            .with_dir(
                "/a",
                vec![format!("amp{so}"), "README".to_string(), format!("broken{so}")],
            )
            .with_dir("/b", vec![format!("multi{so}")]);

        let loader = FakeLoader::default()
            .with_module(
                format!("/a/amp{so}"),
                FakeModule::new(vec![amp_descriptor("amp_mono")]),
            )
            .with_missing_entry_point(format!("/a/broken{so}"))
            .with_module(
                format!("/b/multi{so}"),
                FakeModule::new(vec![amp_descriptor("one"), amp_descriptor("two")]),
            );

        let scanner = ModuleScanner::new(&loader, &lister);
        let dirs = [PathBuf::from("/a"), PathBuf::from("/missing"), PathBuf::from("/b")];
        let modules = scanner.scan(&dirs);

        assert_eq!(modules.len(), 2);
        assert_eq!(modules[0].file_name, format!("amp{so}"));
        assert_eq!(modules[0].descriptors.len(), 1);
        assert_eq!(modules[1].file_name, format!("multi{so}"));
        let labels: Vec<_> = modules[1]
            .descriptors
            .iter()
            .map(|(i, d)| (*i, d.label.clone().unwrap_or_default()))
            .collect();
        assert_eq!(labels, vec![(0, "one".to_string()), (1, "two".to_string())]);

        // README never reached the loader
        assert_eq!(loader.open_count(), 3);
    }

    #[test]
    fn test_fs_lister_reports_missing_directory() {
        let err = FsLister
            .list_files(Path::new("/nonexistent/ladspa-host-test"))
            .unwrap_err();
        assert!(matches!(err, HostError::DirectoryRead { .. }));
    }

    #[test]
    fn test_fs_lister_lists_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.so"), b"").unwrap();
        std::fs::write(dir.path().join("a.so"), b"").unwrap();
        let names = FsLister.list_files(dir.path()).unwrap();
        assert_eq!(names, vec!["a.so".to_string(), "b.so".to_string()]);
    }
}
