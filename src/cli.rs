use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::archive_assembly;
use crate::build_pipeline::{self, FailurePolicy};
use crate::cmake_integration::CmakeRunner;
use crate::config::DeployConfig;
use crate::manifest;

#[derive(Parser)]
#[command(name = "shipkit")]
#[command(about = "A tiny, predictable release driver that builds CMake framework modules and packs them into a distributable zip")]
#[command(version = "0.1.0")]
pub struct Cli {
    /// Directory containing the framework sources
    #[arg(long, default_value = ".")]
    pub project_root: PathBuf,

    /// Report failed cmake invocations and continue instead of aborting
    #[arg(long)]
    pub keep_going: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check system requirements and project layout
    Doctor,
}

pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    let project_root = cli.project_root.canonicalize().with_context(|| {
        format!(
            "Failed to resolve project root: {}",
            cli.project_root.display()
        )
    })?;
    let config = DeployConfig::framework(project_root);

    let policy = if cli.keep_going {
        FailurePolicy::KeepGoing
    } else {
        FailurePolicy::Abort
    };

    match cli.command {
        Some(Commands::Doctor) => doctor_command(&config),
        None => deploy_command(&config, policy),
    }
}

/// The full pipeline, always both phases: build every module for Debug and
/// Release, then pack the release archive and write its manifest.
fn deploy_command(config: &DeployConfig, policy: FailurePolicy) -> Result<()> {
    println!(
        "Building {} modules in {}",
        config.modules.len(),
        config.project_root.display()
    );

    let runner = CmakeRunner::new(&config.project_root, config.build_dir_path());
    build_pipeline::run_build(config, &runner, policy).context("Build phase failed")?;

    println!("Build phase complete");

    let summary = archive_assembly::assemble_archive(config).context("Packaging phase failed")?;

    println!(
        "Packed {} entries into {}",
        summary.entries.len(),
        summary.archive_path.display()
    );

    let deploy_manifest = manifest::build_manifest(config, &summary);
    let manifest_path = manifest::manifest_path(config);
    manifest::write_manifest(&deploy_manifest, &manifest_path)?;

    println!("\nManifest path: {}", manifest_path.display());

    Ok(())
}

fn doctor_command(config: &DeployConfig) -> Result<()> {
    println!("Shipkit Doctor - Checking build requirements...\n");

    let mut missing = 0;

    match which::which("cmake") {
        Ok(path) => println!("✓ cmake found at: {}", path.display()),
        Err(_) => {
            println!("✗ cmake not found in PATH");
            missing += 1;
        }
    }

    let license = config.project_root.join(&config.license_file);
    if license.is_file() {
        println!("✓ {} present", config.license_file);
    } else {
        println!("✗ {} missing", config.license_file);
        missing += 1;
    }

    let scripts_dir = config.project_root.join(&config.scripts_dir);
    if scripts_dir.is_dir() {
        println!("✓ {} directory present", config.scripts_dir);
    } else {
        println!("✗ {} directory missing", config.scripts_dir);
        missing += 1;
    }

    println!("\nModules:");
    for module in &config.modules {
        let folder = config.project_root.join(&module.folder_name);
        let script = config.project_root.join(module.script_file());

        let folder_mark = if folder.is_dir() { "✓" } else { "✗" };
        let script_mark = if script.is_file() { "✓" } else { "✗" };

        if !folder.is_dir() {
            missing += 1;
        }
        if !script.is_file() {
            missing += 1;
        }

        println!(
            "  {} {} ({}/)  {} {}",
            folder_mark,
            module.target_name,
            module.folder_name,
            script_mark,
            module.script_file().display()
        );
    }

    if missing > 0 {
        return Err(anyhow::anyhow!(
            "{} required pieces missing - the deploy pipeline would fail",
            missing
        ));
    }

    println!("\n✓ Shipkit doctor check complete");

    Ok(())
}
