use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use flate2::read::GzDecoder;

use crate::error::{Error, Result};

/// Check that an archive is structurally sound before extraction is attempted.
///
/// Opens the gzip stream and reads the first tar entry header only; the full
/// member table is never materialized. Any decode failure maps to
/// [`Error::Corrupted`]. Deleting the bad file is the caller's job, so a
/// later run re-downloads instead of trusting a broken cache entry.
pub fn verify<P: AsRef<Path>>(archive_path: P) -> Result<()> {
    let file = File::open(archive_path.as_ref())?;
    let decoder = GzDecoder::new(BufReader::new(file));
    let mut archive = tar::Archive::new(decoder);

    let mut entries = archive.entries().map_err(|_| Error::Corrupted)?;
    match entries.next() {
        Some(Ok(_)) | None => Ok(()),
        Some(Err(_)) => Err(Error::Corrupted),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn garbage_bytes_fail_verification() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("2000.tar.gz");
        let mut file = File::create(&path).unwrap();
        file.write_all(b"this is not a gzip stream").unwrap();

        assert!(matches!(verify(&path), Err(Error::Corrupted)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = verify(dir.path().join("absent.tar.gz"));
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
