use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use log::{debug, info};
use nix::unistd::{access, AccessFlags};

/// Directories from `PATH`, in lookup order.
pub fn search_path() -> Vec<PathBuf> {
    env::var_os("PATH")
        .map(|path| env::split_paths(&path).filter(|p| !p.as_os_str().is_empty()).collect())
        .unwrap_or_default()
}

/// A regular file the current user may execute.
pub fn is_executable_file(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(metadata) => metadata.is_file() && access(path, AccessFlags::X_OK).is_ok(),
        Err(_) => false,
    }
}

/// Resolves a program name the way a shell would. Names containing a
/// separator are taken relative to the working directory; bare names are
/// searched along `search_path`.
pub fn find_program_in_path(program: &str, search_path: &[PathBuf]) -> Option<PathBuf> {
    if program.is_empty() {
        return None;
    }

    if program.contains('/') {
        let path = Path::new(program);
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            env::current_dir().ok()?.join(path)
        };
        return is_executable_file(&path).then_some(path);
    }

    search_path
        .iter()
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable_file(candidate))
}

/// Every file name in every search path directory, unfiltered.
pub fn list_search_path(search_path: &[PathBuf]) -> Vec<PathBuf> {
    let mut entries = Vec::new();
    for dir in search_path {
        debug!("Scanning binaries in {:?}", dir);
        if let Ok(read_dir) = fs::read_dir(dir) {
            entries.extend(read_dir.flatten().map(|entry| entry.path()));
        }
    }
    info!("BinSource: found {} candidates", entries.len());
    entries
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    pub(crate) fn write_executable(path: &Path) {
        fs::write(path, "#!/bin/sh\nexit 0\n").unwrap();
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    fn test_find_program_searches_in_order() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        write_executable(&second.path().join("tool"));

        let search = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        assert_eq!(
            find_program_in_path("tool", &search),
            Some(second.path().join("tool"))
        );
        assert_eq!(find_program_in_path("missing", &search), None);
    }

    #[test]
    fn test_non_executable_and_directories_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("notes");
        fs::write(&plain, "text").unwrap();
        fs::create_dir(dir.path().join("subdir")).unwrap();

        assert!(!is_executable_file(&plain));
        assert!(!is_executable_file(&dir.path().join("subdir")));

        let search = vec![dir.path().to_path_buf()];
        assert_eq!(find_program_in_path("notes", &search), None);
        assert_eq!(find_program_in_path("subdir", &search), None);
    }

    #[test]
    fn test_absolute_program_is_checked_directly() {
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("run-me");
        write_executable(&exe);

        let found = find_program_in_path(exe.to_str().unwrap(), &[]);
        assert_eq!(found, Some(exe));
    }

    #[test]
    fn test_list_search_path_skips_missing_dirs() {
        let dir = tempfile::tempdir().unwrap();
        write_executable(&dir.path().join("a"));
        fs::write(dir.path().join("b"), "").unwrap();

        let mut listed = list_search_path(&[dir.path().join("nope"), dir.path().to_path_buf()]);
        listed.sort();
        assert_eq!(listed, vec![dir.path().join("a"), dir.path().join("b")]);
    }
}
