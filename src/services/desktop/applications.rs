use std::env;
use std::path::PathBuf;
use tracing::debug;

/// Поиск установленных приложений по desktop id (`firefox.desktop`)
#[derive(Debug, Clone, Default)]
pub struct ApplicationIndex {
    dirs: Vec<PathBuf>,
}

impl ApplicationIndex {
    /// Каталоги `applications` из XDG_DATA_HOME и XDG_DATA_DIRS
    pub fn from_env() -> Self {
        let mut dirs = Vec::new();

        let data_home = env::var_os("XDG_DATA_HOME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(dirs::data_dir);
        if let Some(home) = data_home {
            dirs.push(home.join("applications"));
        }

        let data_dirs = env::var("XDG_DATA_DIRS")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "/usr/local/share:/usr/share".to_string());
        dirs.extend(
            data_dirs
                .split(':')
                .filter(|d| !d.is_empty())
                .map(|d| PathBuf::from(d).join("applications")),
        );

        debug!("Каталоги приложений: {:?}", dirs);
        Self { dirs }
    }

    pub fn with_dirs(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    pub fn lookup(&self, command: &str) -> Option<String> {
        let id = command.trim();
        if !id.ends_with(".desktop") || id.contains('/') {
            return None;
        }
        self.dirs
            .iter()
            .any(|dir| dir.join(id).is_file())
            .then(|| id.to_string())
    }
}
