use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub const MESH_FILE: &str = "temp_model.obj";
pub const FLAG_FILE: &str = "model_ready.flag";
pub const FLAG_TOKEN: &str = "insert";

/// Two-file signal to the main application shell: the mesh text is written
/// first, then the flag file the shell watches for.
#[derive(Debug, Clone)]
pub struct SceneHandoff {
    pub mesh_path: PathBuf,
    pub flag_path: PathBuf,
}

impl SceneHandoff {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            mesh_path: dir.join(MESH_FILE),
            flag_path: dir.join(FLAG_FILE),
        }
    }

    /// Next to the running executable, or the temp dir if that is unknown.
    pub fn beside_executable() -> Self {
        let dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_else(std::env::temp_dir);
        Self::in_dir(&dir)
    }

    pub fn send(&self, obj_text: &str) -> Result<()> {
        std::fs::write(&self.mesh_path, obj_text)
            .with_context(|| format!("Failed to write {}", self.mesh_path.display()))?;
        std::fs::write(&self.flag_path, FLAG_TOKEN)
            .with_context(|| format!("Failed to write {}", self.flag_path.display()))?;
        tracing::info!("mesh handed off to scene via {}", self.flag_path.display());
        Ok(())
    }
}
