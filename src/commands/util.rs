use crate::Result as CrateResult;
use sha1::{Digest, Sha1};
use std::{ffi::OsStr, path::Path, path::PathBuf};
use tracing::debug;

/// Mod archives directly inside `mods_dir`. The archive subdirectory is not
/// descended into.
pub fn get_jar_files(mods_dir: &Path) -> CrateResult<Vec<PathBuf>> {
    debug!("Scanning files in {}", mods_dir.display());
    let mut files: Vec<PathBuf> = mods_dir
        .read_dir()?
        .map(|entry| -> CrateResult<PathBuf> {
            let entry = entry?;
            Ok(entry.path())
        })
        .collect::<Result<_, _>>()?;
    files.retain(|path| path.is_file() && path.extension() == Some(OsStr::new("jar")));
    files.sort();
    Ok(files)
}

pub fn get_file_sha1(path: &Path) -> CrateResult<String> {
    debug!("Generating checksum for {}", path.display());
    let data = std::fs::read(path)?;
    let mut hasher = Sha1::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_top_level_jars_are_listed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("versions")).unwrap();
        std::fs::write(dir.path().join("versions/old.jar"), b"old").unwrap();
        std::fs::write(dir.path().join("b.jar"), b"b").unwrap();
        std::fs::write(dir.path().join("a.jar"), b"a").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"n").unwrap();
        std::fs::write(dir.path().join("c.jar.part"), b"c").unwrap();

        let jars = get_jar_files(dir.path()).unwrap();
        assert_eq!(jars, vec![dir.path().join("a.jar"), dir.path().join("b.jar")]);
    }

    #[test]
    fn sha1_matches_known_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abc.jar");
        std::fs::write(&path, b"abc").unwrap();
        assert_eq!(
            get_file_sha1(&path).unwrap(),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
    }
}
