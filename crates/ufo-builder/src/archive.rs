//! `.ufoz` archive output.
//!
//! The archive is written to a `<name>.ufoz.part` sibling first and renamed
//! into place once complete, so a failed run never leaves a readable but
//! truncated archive behind. The `.part` file is removed on failure.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::Result;
use crate::ufo::UfoPackage;

/// Write a package as `<parent>/<name>.ufoz`, atomically.
pub fn write_ufoz(package: &UfoPackage, parent: &Path, compress: bool) -> Result<PathBuf> {
    let final_path = parent.join(format!("{}z", package.name));
    let part_path = parent.join(format!("{}z.part", package.name));

    match write_archive(package, &part_path, compress) {
        Ok(()) => {}
        Err(error) => {
            let _ = fs::remove_file(&part_path);
            return Err(error);
        }
    }
    if let Err(error) = fs::rename(&part_path, &final_path) {
        let _ = fs::remove_file(&part_path);
        return Err(error.into());
    }
    Ok(final_path)
}

fn write_archive(package: &UfoPackage, path: &Path, compress: bool) -> Result<()> {
    let method = if compress {
        zip::CompressionMethod::Deflated
    } else {
        zip::CompressionMethod::Stored
    };
    let options = SimpleFileOptions::default().compression_method(method);

    let file = File::create(path)?;
    let mut writer = ZipWriter::new(BufWriter::new(file));
    // Archive paths are rooted at the package directory.
    for (relative, body) in &package.files {
        writer.start_file(format!("{}/{relative}", package.name), options)?;
        writer.write_all(body)?;
    }
    writer.finish()?.into_inner().map_err(|e| e.into_error())?.sync_all()?;
    Ok(())
}
