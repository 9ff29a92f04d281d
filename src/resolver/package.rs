use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::error::Result;

/// Module name for a file or package directory: `io.linux.c` and `io/` are
/// both `io`.
pub fn module_name(path: &Path) -> String {
    let file = path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();
    file.split('.').next().unwrap_or_default().to_string()
}

/// Whether `file_name` belongs to a package built for `os`: `name.c` always,
/// `name.<os>.c` only for a matching tag.
pub fn is_member(file_name: &str, os: &str) -> bool {
    let Some(stem) = file_name.strip_suffix(".c") else {
        return false;
    };
    let mut parts = stem.split('.');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(name), None, None) => !name.is_empty(),
        (Some(name), Some(tag), None) => !name.is_empty() && tag == os,
        _ => false,
    }
}

/// The active source files of a package directory, sorted by file name.
pub fn members(dir: &Path, os: &str) -> Result<Vec<PathBuf>> {
    let mut files = vec![];
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        if is_member(&name.to_string_lossy(), os) {
            files.push(entry.path());
        }
    }
    files.sort();
    log::debug!("package {} ({}): {:?}", dir.display(), os, files);
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn member_suffix_convention() {
        assert!(is_member("io.c", "linux"));
        assert!(is_member("io.linux.c", "linux"));
        assert!(!is_member("io.windows.c", "linux"));
        assert!(!is_member("io.h", "linux"));
        assert!(!is_member("io.a.b.c", "linux"));
        assert!(!is_member(".c", "linux"));
    }

    #[test]
    fn module_names() {
        assert_eq!(module_name(Path::new("/lib/io.linux.c")), "io");
        assert_eq!(module_name(Path::new("/lib/collections")), "collections");
    }

    #[test]
    fn members_are_filtered_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.c", "a.c", "a.macos.c", "a.linux.c", "notes.txt"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        let found = members(dir.path(), "linux").unwrap();
        let names = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["a.c", "a.linux.c", "b.c"]);
    }
}
