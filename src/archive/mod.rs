//! Tar archive collaborator.
//!
//! Thin wrappers over the `tar` and `flate2` crates: streamed extraction
//! with a fixed read-buffer granularity, and `.tar.gz` packaging for the
//! archive workflow step. The first failing entry aborts the whole
//! extraction; the caller logs the diagnostic.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::{Error, Result};

/// Read granularity for streaming archive entries.
const READ_BUFFER_SIZE: usize = 10240;

/// Extract every entry of a tar archive under `destination`.
///
/// Entry paths are stored relative; each is joined under `destination`
/// (which need not carry a trailing separator), and an entry whose stored
/// path would climb out of the destination is rejected. Gzip-compressed
/// archives are detected by the `.gz` extension. Any open, read or unpack
/// failure aborts the extraction and surfaces as a single error.
pub fn extract_tar_file(file_path: &Path, destination: &Path) -> Result<()> {
    let file = File::open(file_path)?;
    let reader = BufReader::with_capacity(READ_BUFFER_SIZE, file);

    if file_path.extension().is_some_and(|ext| ext == "gz") {
        extract_entries(GzDecoder::new(reader), destination)
    } else {
        extract_entries(reader, destination)
    }
}

fn extract_entries<R: Read>(reader: R, destination: &Path) -> Result<()> {
    std::fs::create_dir_all(destination)?;
    let mut archive = tar::Archive::new(reader);
    for entry in archive.entries()? {
        let mut entry = entry?;
        let relative = entry.path()?.into_owned();
        if !entry.unpack_in(destination)? {
            return Err(Error::InvalidArgument(format!(
                "archive entry escapes destination: {}",
                relative.display()
            )));
        }
    }
    Ok(())
}

/// Package `src_dir` into a gzip-compressed tarball at `out_file`, with
/// entries rooted at `prefix`.
pub fn create_tar_gz(src_dir: &Path, out_file: &Path, prefix: &str) -> Result<()> {
    let file = File::create(out_file)?;
    let encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.append_dir_all(prefix, src_dir)?;
    let encoder = builder.into_inner()?;
    let mut writer = encoder.finish()?;
    writer.flush()?;
    Ok(())
}
