use anyhow::{anyhow, Context, Result};
use std::fs;

use crate::cmake_integration::{BuildConfig, BuildTool, ToolRun};
use crate::config::DeployConfig;

/// What to do when a generator or builder invocation fails. `Abort` is the
/// default; `KeepGoing` restores the historical fire-and-forget behavior of
/// the deploy script this tool replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    Abort,
    KeepGoing,
}

/// Builds every declared module for Debug, then again for Release.
///
/// The release switch is baked in at generation time, so each configuration
/// gets its own generator pass: generate → build×N for Debug, then
/// generate(-DRELEASE=ON) → build×N for Release. Modules build one at a
/// time, in declaration order.
pub fn run_build(config: &DeployConfig, tool: &dyn BuildTool, policy: FailurePolicy) -> Result<()> {
    prepare_build_dir(config)?;

    for build_config in [BuildConfig::Debug, BuildConfig::Release] {
        let run = tool.generate(build_config);
        handle_step(
            run,
            &format!("Generate step failed ({})", build_config.as_str()),
            policy,
        )?;

        for module in &config.modules {
            println!("Building {} ({})", module.target_name, build_config.as_str());

            let run = tool.build_target(&module.target_name, build_config);
            handle_step(
                run,
                &format!(
                    "Build step failed: {} ({})",
                    module.target_name,
                    build_config.as_str()
                ),
                policy,
            )?;
        }
    }

    Ok(())
}

fn prepare_build_dir(config: &DeployConfig) -> Result<()> {
    let build_dir = config.build_dir_path();

    // Already existing is fine; anything else is fatal.
    fs::create_dir_all(&build_dir)
        .with_context(|| format!("Failed to create build directory: {}", build_dir.display()))?;

    Ok(())
}

fn handle_step(run: Result<ToolRun>, what: &str, policy: FailurePolicy) -> Result<()> {
    let failure = match run {
        Ok(run) if run.success => return Ok(()),
        Ok(run) => anyhow!("{}: {}", what, run.failure_summary()),
        Err(e) => e.context(what.to_string()),
    };

    match policy {
        FailurePolicy::Abort => Err(failure),
        FailurePolicy::KeepGoing => {
            eprintln!("warning: {:#}", failure);
            Ok(())
        }
    }
}
