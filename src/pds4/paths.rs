//! Path planner (C7): translates source paths into merged-tree destination
//! paths, applying the `SUPERSEDED/vMAJOR_MINOR/` placement rule.

use std::path::{Path, PathBuf};

use pathdiff::diff_paths;

use crate::pds4::consts::SUPERSEDED_DIR;
use crate::pds4::ids::Vid;

/// Joins each name in `filenames` onto `basepath`.
pub fn rebase_filenames(basepath: impl AsRef<Path>, filenames: &[String]) -> Vec<PathBuf> {
    filenames.iter().map(|name| basepath.as_ref().join(name)).collect()
}

/// If `path` lives under `old_base`, re-rooted under `new_base`; otherwise
/// returned unchanged (relocation identity).
pub fn relocate_path(path: impl AsRef<Path>, old_base: impl AsRef<Path>, new_base: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    let old_base = old_base.as_ref();

    match diff_paths(path, old_base) {
        Some(rel) if !rel.starts_with("..") => new_base.as_ref().join(rel),
        _ => path.to_path_buf(),
    }
}

/// Inserts `SUPERSEDED/vMAJOR_MINOR/` between `path`'s parent directory and
/// its basename when `superseded` is set and the path is not already under
/// a `SUPERSEDED` component. Otherwise `path` is returned unchanged.
pub fn generate_product_path(path: impl AsRef<Path>, superseded: bool, vid: Option<&Vid>) -> PathBuf {
    let path = path.as_ref();

    if !superseded || is_already_superseded(path) {
        return path.to_path_buf();
    }

    let vid = match vid {
        Some(vid) => vid,
        None => return path.to_path_buf(),
    };

    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    let filename = path.file_name().expect("path must have a filename");

    parent
        .join(SUPERSEDED_DIR)
        .join(format!("v{}_{}", vid.major, vid.minor))
        .join(filename)
}

fn is_already_superseded(path: &Path) -> bool {
    path.components()
        .any(|c| c.as_os_str() == SUPERSEDED_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relocate_identity_outside_base() {
        let p = Path::new("/unrelated/file.xml");
        let relocated = relocate_path(p, "/previous", "/merged");
        assert_eq!(relocated, p);
    }

    #[test]
    fn relocate_under_base() {
        let relocated = relocate_path("/previous/bundle/a.xml", "/previous", "/merged");
        assert_eq!(relocated, Path::new("/merged/bundle/a.xml"));
    }

    #[test]
    fn generate_product_path_supersedes() {
        let vid = Vid::new(1, 2);
        let planned = generate_product_path("/bundle/collection/prod.xml", true, Some(&vid));
        assert_eq!(planned, Path::new("/bundle/collection/SUPERSEDED/v1_2/prod.xml"));
    }

    #[test]
    fn generate_product_path_idempotent() {
        let vid = Vid::new(1, 2);
        let once = generate_product_path("/bundle/collection/prod.xml", true, Some(&vid));
        let twice = generate_product_path(&once, true, Some(&vid));
        assert_eq!(once, twice);
    }

    #[test]
    fn generate_product_path_live_unchanged() {
        let planned = generate_product_path("/bundle/collection/prod.xml", false, None);
        assert_eq!(planned, Path::new("/bundle/collection/prod.xml"));
    }
}
