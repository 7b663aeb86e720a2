use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildConfig {
    Debug,
    Release,
}

impl BuildConfig {
    pub fn as_str(&self) -> &str {
        match self {
            BuildConfig::Debug => "Debug",
            BuildConfig::Release => "Release",
        }
    }
}

/// Outcome of one external tool invocation: the rendered command line, the
/// captured exit status, and whatever the tool wrote to stderr.
#[derive(Debug, Clone)]
pub struct ToolRun {
    pub command: String,
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stderr: String,
}

impl ToolRun {
    pub fn failure_summary(&self) -> String {
        let status = match self.exit_code {
            Some(code) => format!("exit code {}", code),
            None => "terminated by signal".to_string(),
        };

        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            status
        } else {
            format!("{}: {}", status, stderr)
        }
    }
}

/// The build-system seam: one generator invocation per configuration, one
/// builder invocation per target. `Err` means the tool could not be spawned
/// at all; a spawned-but-failed tool comes back as a non-success `ToolRun`.
pub trait BuildTool {
    fn generate(&self, config: BuildConfig) -> Result<ToolRun>;
    fn build_target(&self, target: &str, config: BuildConfig) -> Result<ToolRun>;
}

/// Drives the CMake CLI with explicit source and build paths.
pub struct CmakeRunner {
    source_dir: PathBuf,
    build_dir: PathBuf,
    platform_args: Vec<String>,
}

impl CmakeRunner {
    pub fn new(source_dir: impl AsRef<Path>, build_dir: impl AsRef<Path>) -> Self {
        Self {
            source_dir: source_dir.as_ref().to_path_buf(),
            build_dir: build_dir.as_ref().to_path_buf(),
            platform_args: default_platform_args(),
        }
    }

    fn generate_args(&self, config: BuildConfig) -> Vec<OsString> {
        let mut args: Vec<OsString> = self.platform_args.iter().map(OsString::from).collect();

        // The release switch is a generation-time setting, so Release needs
        // its own generator pass.
        if config == BuildConfig::Release {
            args.push(OsString::from("-DRELEASE=ON"));
        }

        args.push(self.source_dir.clone().into_os_string());
        args
    }

    fn build_args(&self, target: &str, config: BuildConfig) -> Vec<OsString> {
        vec![
            OsString::from("--build"),
            self.build_dir.clone().into_os_string(),
            OsString::from("--target"),
            OsString::from(target),
            OsString::from("--config"),
            OsString::from(config.as_str()),
        ]
    }

    fn run(&self, args: &[OsString], current_dir: Option<&Path>) -> Result<ToolRun> {
        let mut cmd = Command::new("cmake");
        cmd.args(args);

        if let Some(dir) = current_dir {
            cmd.current_dir(dir);
        }

        let rendered = render_command(args);
        let output = cmd
            .output()
            .with_context(|| format!("Failed to execute {}", rendered))?;

        Ok(ToolRun {
            command: rendered,
            success: output.status.success(),
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

impl BuildTool for CmakeRunner {
    fn generate(&self, config: BuildConfig) -> Result<ToolRun> {
        // CMake generates into the process working directory, which is the
        // one path it does not take as an argument.
        self.run(&self.generate_args(config), Some(&self.build_dir))
    }

    fn build_target(&self, target: &str, config: BuildConfig) -> Result<ToolRun> {
        self.run(&self.build_args(target, config), None)
    }
}

/// On Windows the default generator architecture does not match the x64
/// artifacts the framework ships, so the generator gets an explicit
/// architecture override. Computed once per runner, which keeps the Debug
/// and Release generator invocations in agreement.
fn default_platform_args() -> Vec<String> {
    if cfg!(target_os = "windows") {
        vec!["-A".to_string(), "x64".to_string()]
    } else {
        Vec::new()
    }
}

fn render_command(args: &[OsString]) -> String {
    let mut parts = vec!["cmake".to_string()];
    parts.extend(args.iter().map(|a| a.to_string_lossy().into_owned()));
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contains(args: &[OsString], wanted: &str) -> bool {
        args.iter().any(|a| a.to_str() == Some(wanted))
    }

    #[test]
    fn test_release_flag_only_on_release_pass() {
        let runner = CmakeRunner::new("/project", "/project/build");

        assert!(!contains(&runner.generate_args(BuildConfig::Debug), "-DRELEASE=ON"));
        assert!(contains(&runner.generate_args(BuildConfig::Release), "-DRELEASE=ON"));
    }

    #[test]
    fn test_generate_args_end_with_source_dir() {
        let runner = CmakeRunner::new("/project", "/project/build");

        for config in [BuildConfig::Debug, BuildConfig::Release] {
            let args = runner.generate_args(config);
            assert_eq!(args.last().unwrap().to_str(), Some("/project"));
        }
    }

    #[test]
    fn test_platform_flag_in_both_passes_or_neither() {
        let runner = CmakeRunner::new("/project", "/project/build");

        let debug = contains(&runner.generate_args(BuildConfig::Debug), "-A");
        let release = contains(&runner.generate_args(BuildConfig::Release), "-A");

        assert_eq!(debug, release);
        assert_eq!(debug, cfg!(target_os = "windows"));
    }

    #[test]
    fn test_build_args_shape() {
        let runner = CmakeRunner::new("/project", "/project/build");
        let args = runner.build_args("BPF.Compression", BuildConfig::Debug);

        let rendered: Vec<&str> = args.iter().filter_map(|a| a.to_str()).collect();
        assert_eq!(
            rendered,
            vec![
                "--build",
                "/project/build",
                "--target",
                "BPF.Compression",
                "--config",
                "Debug"
            ]
        );
    }

    #[test]
    fn test_failure_summary() {
        let run = ToolRun {
            command: "cmake --build build".to_string(),
            success: false,
            exit_code: Some(2),
            stderr: "No such target\n".to_string(),
        };

        assert_eq!(run.failure_summary(), "exit code 2: No such target");

        let silent = ToolRun {
            command: "cmake ..".to_string(),
            success: false,
            exit_code: None,
            stderr: String::new(),
        };

        assert_eq!(silent.failure_summary(), "terminated by signal");
    }
}
