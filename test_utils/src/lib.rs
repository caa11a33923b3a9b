use std::{
    fs,
    path::{Path, PathBuf},
};

/// Fresh scratch directory for a test, wiped on every call.
pub fn test_dir(subdir_name: impl AsRef<Path>) -> PathBuf {
    // TODO respect CARGO_TARGET_DIR when it is set
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("test_data")
        .join(subdir_name.as_ref());

    // ignore the result, the dir may not exist yet
    fs::remove_dir_all(&path).ok();
    fs::create_dir_all(&path).expect("failed to create test dir");

    path
}

/// Path for a fresh arena backing file, the test owns the whole directory.
pub fn arena_file(test_name: impl AsRef<Path>) -> PathBuf {
    test_dir(test_name).join("arena")
}
