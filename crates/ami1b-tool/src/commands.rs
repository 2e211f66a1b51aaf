//! Command handlers.

use crate::config::{Cli, Command};
use crate::listing;
use ami1b_format::{Module, ModuleLoader};
use anyhow::{Context, Result, anyhow};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Execute the parsed command line.
pub fn run(cli: &Cli) -> Result<()> {
    let loader = ModuleLoader::new().max_components(cli.max_components);

    match &cli.command {
        Command::List { module } => {
            let module = load(&loader, module)?;
            print!("{}", listing::Listing(&module));
        }
        Command::ExtractAll { module, output_dir } => {
            let module = load(&loader, module)?;
            let written = extract_all(&module, output_dir)?;
            info!("Extracted {} components to {}", written.len(), output_dir.display());
        }
        Command::Extract {
            module,
            offset,
            output_dir,
        } => {
            let module = load(&loader, module)?;
            let path = extract_at_offset(&module, *offset, output_dir)?;
            info!("Extracted component to {}", path.display());
        }
        Command::Replace {
            module,
            component,
            offset,
            output,
        } => {
            let target = output.as_deref().unwrap_or(module);
            replace(&loader, module, component, *offset, target)?;
            info!("Successfully wrote modified 1B file to {}", target.display());
        }
    }

    Ok(())
}

fn load(loader: &ModuleLoader, path: &Path) -> Result<Module> {
    loader
        .load(path)
        .with_context(|| format!("failed to load 1B module {}", path.display()))
}

/// Extract every present component, skipping the ones that fail to write.
pub fn extract_all(module: &Module, output_dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    let mut written = Vec::new();
    for component in module.components().iter().filter(|c| c.is_present()) {
        match module.extract_component(component.position(), output_dir) {
            Ok(path) => written.push(path),
            Err(e) => warn!(
                "Skipping component [{:02X}h] {}: {}",
                component.position(),
                component.name(),
                e
            ),
        }
    }
    Ok(written)
}

/// Extract the component whose payload starts at `offset`.
pub fn extract_at_offset(module: &Module, offset: u64, output_dir: &Path) -> Result<PathBuf> {
    let component = module
        .find_by_file_offset(offset)
        .ok_or_else(|| anyhow!("no component starts at file offset 0x{offset:X}"))?;

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    module
        .extract_component(component.position(), output_dir)
        .with_context(|| format!("failed to extract component {}", component.name()))
}

/// Replace the component at `offset` with the contents of `component` and write to `target`.
pub fn replace(
    loader: &ModuleLoader,
    module_path: &Path,
    component: &Path,
    offset: u64,
    target: &Path,
) -> Result<()> {
    let mut module = load(loader, module_path)?;

    let replacement = module
        .replace_component_at_offset(offset, component)
        .with_context(|| {
            format!(
                "unable to replace component at 0x{offset:X} with {}",
                component.display()
            )
        })?;

    if replacement.size_changed() {
        warn!("Offsets of the components after [{:02X}h] are not adjusted", replacement.position);
    } else {
        info!(
            "Replaced component [{:02X}h] in place (0x{:X} bytes)",
            replacement.position, replacement.new_length
        );
    }

    module
        .write_to_file_atomic(target)
        .with_context(|| format!("failed writing modified 1B file {}", target.display()))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Two present components named RUN_CSEG and SLAB, 4-byte name padding
    fn write_module(dir: &Path) -> PathBuf {
        let mut header = Vec::new();
        header.extend_from_slice(&2u16.to_le_bytes());
        header.extend_from_slice(&0u16.to_le_bytes());
        header.extend_from_slice(&0x000F_0000u32.to_le_bytes());
        header.extend_from_slice(&0x8000_0008u32.to_le_bytes());
        header.extend_from_slice(&0x000E_0000u32.to_le_bytes());
        header.extend_from_slice(&0x8000_0004u32.to_le_bytes());
        header.extend_from_slice(b"\0\x0010RUN_CSEG\0\0\0\0SLAB\0\0\0\0");
        let len = header.len() as u16;
        header[2..4].copy_from_slice(&len.to_le_bytes());

        let mut image = header;
        image.extend_from_slice(&[0x11; 8]);
        image.extend_from_slice(&[0x22; 4]);

        let path = dir.join("bios.1b");
        std::fs::write(&path, image).expect("Should write module");
        path
    }

    #[test]
    fn test_extract_all() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let module = Module::load(write_module(dir.path())).expect("Should load");
        let out = dir.path().join("out");

        let written = extract_all(&module, &out).expect("Should extract");
        assert_eq!(written, vec![out.join("RUN_CSEG"), out.join("SLAB")]);
        assert_eq!(std::fs::read(out.join("SLAB")).expect("Should read"), vec![0x22; 4]);
    }

    #[test]
    fn test_extract_at_unknown_offset() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let module = Module::load(write_module(dir.path())).expect("Should load");
        assert!(extract_at_offset(&module, 0x5, dir.path()).is_err());
    }

    #[test]
    fn test_replace_writes_output() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let module_path = write_module(dir.path());
        let module = Module::load(&module_path).expect("Should load");
        let slab_offset = module
            .component(1)
            .and_then(|c| c.file_offset())
            .expect("SLAB should be present");

        let new_slab = dir.path().join("SLAB.new");
        std::fs::write(&new_slab, [0x99; 4]).expect("Should write replacement");
        let output = dir.path().join("patched.1b");

        replace(&ModuleLoader::new(), &module_path, &new_slab, slab_offset, &output)
            .expect("Should replace");

        let patched = Module::load(&output).expect("Should load patched");
        assert_eq!(patched.component(1).and_then(|c| c.data()), Some(&[0x99; 4][..]));
        assert_eq!(patched.component(0).and_then(|c| c.data()), Some(&[0x11; 8][..]));

        // Source left alone when --output is given
        let source = Module::load(&module_path).expect("Should load source");
        assert_eq!(source.component(1).and_then(|c| c.data()), Some(&[0x22; 4][..]));
    }
}
