use std::path::{Path, PathBuf};

/// Resolve the simulator root directory.
///
/// Priority:
/// 1. `--root` flag / `O2D_ROOT` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `.o2d/`
/// 3. Fall back to `cwd`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_upward(&cwd, o2d_core::paths::O2D_DIR).unwrap_or(cwd)
}

fn find_upward(start: &Path, marker: &str) -> Option<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        if dir.join(marker).is_dir() {
            return Some(dir);
        }
        match dir.parent() {
            Some(p) => dir = p.to_path_buf(),
            None => return None,
        }
    }
}
