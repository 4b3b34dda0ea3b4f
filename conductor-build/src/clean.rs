use std::io::ErrorKind;

use conductor_core::Layout;

use crate::error::{io_err, BuildError};

/// Remove the whole build output root. Returns `false` if it did not exist.
///
/// Sources and the registry are never touched.
pub fn clean(layout: &Layout) -> Result<bool, BuildError> {
    let build_dir = layout.build_dir();
    match std::fs::remove_dir_all(&build_dir) {
        Ok(()) => {
            tracing::info!(path = %build_dir.display(), "removed build output");
            Ok(true)
        }
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
        Err(err) => Err(io_err(build_dir, err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn clean_removes_build_dir_only() {
        let tmp = TempDir::new().unwrap();
        let layout = Layout::new(tmp.path());
        fs::create_dir_all(layout.public_dir()).unwrap();
        fs::write(layout.browser_bundle("ui"), "bundle").unwrap();
        fs::create_dir_all(layout.server_source()).unwrap();
        fs::write(layout.server_source().join("index.js"), "src").unwrap();

        assert!(clean(&layout).unwrap());
        assert!(!layout.build_dir().exists());
        assert!(layout.server_source().join("index.js").exists());
    }

    #[test]
    fn clean_without_build_dir_is_a_no_op() {
        let tmp = TempDir::new().unwrap();
        assert!(!clean(&Layout::new(tmp.path())).unwrap());
    }
}
