use anyhow::{anyhow, Context, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::cmake_integration::BuildConfig;
use crate::config::DeployConfig;

/// What one assembly run produced: the archive on disk and its entry names,
/// in the order they were added.
#[derive(Debug, Clone)]
pub struct ArchiveSummary {
    pub archive_path: PathBuf,
    pub entries: Vec<String>,
}

/// Packs the release archive for an already-built tree: every module's
/// `include` headers, the shared `CMakes` scripts, both build output trees,
/// the license, and one build script per module.
///
/// The archive is created fresh (truncating any previous one). If a required
/// single file is missing the partially written archive is deleted, so a
/// failed run never leaves a truncated archive that looks complete.
pub fn assemble_archive(config: &DeployConfig) -> Result<ArchiveSummary> {
    let archive_path = config.archive_path();
    let assembler = ArchiveAssembler::create(&config.project_root, &archive_path)?;

    match populate(assembler, config) {
        Ok(entries) => Ok(ArchiveSummary {
            archive_path,
            entries,
        }),
        Err(e) => {
            let _ = fs::remove_file(&archive_path);
            Err(e)
        }
    }
}

fn populate(mut assembler: ArchiveAssembler, config: &DeployConfig) -> Result<Vec<String>> {
    for module in &config.modules {
        let count = assembler.add_tree(&module.include_dir())?;
        if count == 0 {
            // Some modules are legitimately headerless.
            println!("No headers found for {}", module.target_name);
        }
    }

    assembler.add_tree(Path::new(&config.scripts_dir))?;
    assembler.add_tree(&config.output_dir(BuildConfig::Debug))?;
    assembler.add_tree(&config.output_dir(BuildConfig::Release))?;

    assembler.add_file(Path::new(&config.license_file))?;
    for module in &config.modules {
        assembler.add_file(&module.script_file())?;
    }

    assembler.finish()
}

/// Zip writer owned for the duration of one assembly pass. Entry names are
/// the project-relative paths handed to the add calls, `/`-separated, with
/// no normalization or renaming.
pub struct ArchiveAssembler {
    project_root: PathBuf,
    writer: ZipWriter<File>,
    options: SimpleFileOptions,
    entries: Vec<String>,
}

impl ArchiveAssembler {
    pub fn create(project_root: &Path, archive_path: &Path) -> Result<Self> {
        let file = File::create(archive_path)
            .with_context(|| format!("Failed to create archive: {}", archive_path.display()))?;

        Ok(Self {
            project_root: project_root.to_path_buf(),
            writer: ZipWriter::new(file),
            options: SimpleFileOptions::default().compression_method(CompressionMethod::Deflated),
            entries: Vec::new(),
        })
    }

    /// Recursively adds every file under `relative_root`. A root that does
    /// not exist contributes zero entries and is not an error.
    pub fn add_tree(&mut self, relative_root: &Path) -> Result<usize> {
        let absolute_root = self.project_root.join(relative_root);
        if !absolute_root.is_dir() {
            return Ok(0);
        }

        let before = self.entries.len();

        for entry in WalkDir::new(&absolute_root).sort_by_file_name() {
            let entry = entry
                .with_context(|| format!("Failed to walk {}", absolute_root.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(&self.project_root)
                .with_context(|| format!("Walked outside project root: {}", entry.path().display()))?
                .to_path_buf();

            self.write_entry(&relative, entry.path())?;
        }

        Ok(self.entries.len() - before)
    }

    /// Adds a single file that is unconditionally expected to exist.
    pub fn add_file(&mut self, relative_path: &Path) -> Result<()> {
        let absolute = self.project_root.join(relative_path);
        if !absolute.is_file() {
            return Err(anyhow!("Required file is missing: {}", absolute.display()));
        }

        self.write_entry(relative_path, &absolute)
    }

    fn write_entry(&mut self, relative_path: &Path, absolute_path: &Path) -> Result<()> {
        let name = entry_name(relative_path);
        let contents = fs::read(absolute_path)
            .with_context(|| format!("Failed to read {}", absolute_path.display()))?;

        self.writer
            .start_file(name.as_str(), self.options.clone())
            .with_context(|| format!("Failed to start archive entry: {}", name))?;
        self.writer
            .write_all(&contents)
            .with_context(|| format!("Failed to write archive entry: {}", name))?;

        self.entries.push(name);
        Ok(())
    }

    /// Writes the central directory and flushes the archive to durable
    /// storage. Returns the entry names in insertion order.
    pub fn finish(self) -> Result<Vec<String>> {
        let Self { writer, entries, .. } = self;

        let file = writer.finish().context("Failed to finalize archive")?;
        file.sync_all().context("Failed to flush archive to disk")?;

        Ok(entries)
    }
}

fn entry_name(path: &Path) -> String {
    let parts: Vec<String> = path
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    parts.join("/")
}
