//! One-shot static type check through the project's `tsc`.

use std::path::Path;
use std::process::Command;

use conductor_core::Layout;

use crate::error::BuildError;

/// Run `tsc --build <config>` from the project root with inherited stdio.
///
/// The config path is required; there is no default.
pub fn check_types(layout: &Layout, config: Option<&Path>) -> Result<(), BuildError> {
    let config = config.ok_or(BuildError::MissingTypecheckConfig)?;
    let tsc = layout.node_bin("tsc");
    tracing::info!(config = %config.display(), "type checking");

    let status = Command::new(&tsc)
        .arg("--build")
        .arg(config)
        .current_dir(layout.root())
        .status()
        .map_err(|source| BuildError::ToolNotFound {
            program: tsc.display().to_string(),
            source,
        })?;

    if status.success() {
        Ok(())
    } else {
        Err(BuildError::TypecheckFailed {
            status: status.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_config_is_rejected_before_running_anything() {
        let tmp = TempDir::new().unwrap();
        let err = check_types(&Layout::new(tmp.path()), None).unwrap_err();
        assert!(matches!(err, BuildError::MissingTypecheckConfig));
    }

    #[test]
    fn missing_tsc_is_reported() {
        let tmp = TempDir::new().unwrap();
        let err = check_types(&Layout::new(tmp.path()), Some(Path::new("tsconfig.json")))
            .unwrap_err();
        assert!(matches!(err, BuildError::ToolNotFound { .. }), "got: {err}");
    }
}
