use std::path::{Path, PathBuf};

use crate::cmake_integration::BuildConfig;

/// One compiled unit of the framework: the CMake target to build and the
/// source folder holding its headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDecl {
    pub target_name: String,
    pub folder_name: String,
}

impl ModuleDecl {
    pub fn new(target_name: impl Into<String>, folder_name: impl Into<String>) -> Self {
        Self {
            target_name: target_name.into(),
            folder_name: folder_name.into(),
        }
    }

    /// Public header tree packed into the release archive, relative to the
    /// project root.
    pub fn include_dir(&self) -> PathBuf {
        Path::new(&self.folder_name).join("include")
    }

    /// Per-module build script at the project root, named after the target.
    pub fn script_file(&self) -> PathBuf {
        PathBuf::from(format!("{}.cmake", self.target_name))
    }
}

/// Read-only configuration for one pipeline run, injected into both the
/// build and packaging phases.
#[derive(Debug, Clone)]
pub struct DeployConfig {
    /// Canonicalized directory containing the framework sources.
    pub project_root: PathBuf,
    /// Modules in build order.
    pub modules: Vec<ModuleDecl>,
    pub framework_name: String,
    pub build_dir: String,
    pub scripts_dir: String,
    pub license_file: String,
    pub archive_name: String,
}

impl DeployConfig {
    /// The shipped framework layout: module list, shared `CMakes` scripts,
    /// license file, and archive name.
    pub fn framework(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            modules: vec![
                ModuleDecl::new("BPF", "Base"),
                ModuleDecl::new("BPF.Compression", "Compression"),
                ModuleDecl::new("BPF.Graphics", "Graphics"),
            ],
            framework_name: "BPF".to_string(),
            build_dir: "build".to_string(),
            scripts_dir: "CMakes".to_string(),
            license_file: "LICENSE.md".to_string(),
            archive_name: "Framework.zip".to_string(),
        }
    }

    pub fn build_dir_path(&self) -> PathBuf {
        self.project_root.join(&self.build_dir)
    }

    /// Per-configuration output tree, relative to the project root
    /// (e.g. `build/Debug`).
    pub fn output_dir(&self, config: BuildConfig) -> PathBuf {
        Path::new(&self.build_dir).join(config.as_str())
    }

    pub fn archive_path(&self) -> PathBuf {
        self.project_root.join(&self.archive_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framework_defaults() {
        let config = DeployConfig::framework("/tmp/project");

        assert_eq!(config.modules.len(), 3);
        assert_eq!(config.modules[0].target_name, "BPF");
        assert_eq!(config.modules[0].folder_name, "Base");
        assert_eq!(config.archive_name, "Framework.zip");
        assert_eq!(config.build_dir_path(), PathBuf::from("/tmp/project/build"));
    }

    #[test]
    fn test_module_paths() {
        let module = ModuleDecl::new("BPF.Compression", "Compression");

        assert_eq!(module.include_dir(), PathBuf::from("Compression/include"));
        assert_eq!(module.script_file(), PathBuf::from("BPF.Compression.cmake"));
    }

    #[test]
    fn test_output_dirs() {
        let config = DeployConfig::framework(".");

        assert_eq!(
            config.output_dir(BuildConfig::Debug),
            PathBuf::from("build/Debug")
        );
        assert_eq!(
            config.output_dir(BuildConfig::Release),
            PathBuf::from("build/Release")
        );
    }
}
