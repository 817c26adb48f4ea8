// policyguard-core/src/infrastructure/fs.rs
//
// Every exported artifact (scored CSV, rules JSON, summary, PDF) goes
// through the same write path: stage into a sibling temp file, then
// rename over the target. A run that dies mid-export leaves the previous
// artifact intact instead of a truncated one.

use crate::infrastructure::error::InfrastructureError;
use std::io::Write;
use std::path::Path;

/// Write `content` to `path` atomically.
///
/// The temp file lives in the target's directory so the final rename
/// never crosses filesystems.
pub fn atomic_write<P: AsRef<Path>, C: AsRef<[u8]>>(
    path: P,
    content: C,
) -> Result<(), InfrastructureError> {
    let path = path.as_ref();
    let parent = path.parent().unwrap_or_else(|| Path::new("."));

    let mut staged = tempfile::NamedTempFile::new_in(parent).map_err(InfrastructureError::Io)?;
    staged
        .write_all(content.as_ref())
        .map_err(InfrastructureError::Io)?;
    staged
        .persist(path)
        .map_err(|e| InfrastructureError::Io(e.error))?;

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_writes_new_artifact() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("scored_transactions.csv");

        atomic_write(&path, "Amount,Risk_Level\n250000,High\n")?;

        assert_eq!(
            fs::read_to_string(&path)?,
            "Amount,Risk_Level\n250000,High\n"
        );
        Ok(())
    }

    #[test]
    fn test_rescore_replaces_previous_artifact() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("summary.json");

        atomic_write(&path, "{\"total_rows\": 4}")?;
        atomic_write(&path, "{\"total_rows\": 8}")?;

        assert_eq!(fs::read_to_string(&path)?, "{\"total_rows\": 8}");
        Ok(())
    }

    #[test]
    fn test_no_temp_file_left_behind() -> Result<()> {
        let dir = tempdir()?;
        atomic_write(dir.path().join("report.pdf"), b"%PDF-1.3")?;

        let entries: Vec<_> = fs::read_dir(dir.path())?.collect();
        assert_eq!(entries.len(), 1);
        Ok(())
    }
}
