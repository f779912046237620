//! Resolved runtime configuration: where the model lives and where to listen.

use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;

/// Default `serve` bind address.
pub const DEFAULT_ADDR: &str = "127.0.0.1:8501";

/// Default number of features shown with `--details`.
pub const DEFAULT_TOP: usize = 5;

/// Where a model directory setting came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Flag,
    ModelDirEnv,
    HomeEnv,
    Default,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Source::Flag => "--model-dir",
            Source::ModelDirEnv => "PHISHLENS_MODEL_DIR",
            Source::HomeEnv => "PHISHLENS_HOME",
            Source::Default => "default",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDir {
    pub path: PathBuf,
    pub source: Source,
}

/// Resolve the model directory: `--model-dir`, then `PHISHLENS_MODEL_DIR`,
/// then `$PHISHLENS_HOME/models`, then `~/.phishlens/models`.
pub fn resolve_model_dir(flag: Option<PathBuf>) -> ModelDir {
    resolve_with(
        flag,
        std::env::var_os("PHISHLENS_MODEL_DIR"),
        std::env::var_os("PHISHLENS_HOME"),
        dirs::home_dir(),
    )
}

fn resolve_with(
    flag: Option<PathBuf>,
    model_dir_env: Option<OsString>,
    home_env: Option<OsString>,
    home: Option<PathBuf>,
) -> ModelDir {
    let non_empty = |v: Option<OsString>| v.filter(|s| !s.is_empty()).map(PathBuf::from);

    if let Some(path) = flag {
        return ModelDir {
            path,
            source: Source::Flag,
        };
    }
    if let Some(path) = non_empty(model_dir_env) {
        return ModelDir {
            path,
            source: Source::ModelDirEnv,
        };
    }
    if let Some(root) = non_empty(home_env) {
        return ModelDir {
            path: root.join("models"),
            source: Source::HomeEnv,
        };
    }
    ModelDir {
        path: home
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".phishlens")
            .join("models"),
        source: Source::Default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_wins() {
        let dir = resolve_with(
            Some(PathBuf::from("/opt/models")),
            Some("/env/models".into()),
            Some("/env/home".into()),
            Some(PathBuf::from("/home/u")),
        );
        assert_eq!(dir.path, PathBuf::from("/opt/models"));
        assert_eq!(dir.source, Source::Flag);
    }

    #[test]
    fn test_env_order() {
        let dir = resolve_with(
            None,
            Some("/env/models".into()),
            Some("/env/home".into()),
            None,
        );
        assert_eq!(dir.path, PathBuf::from("/env/models"));
        assert_eq!(dir.source, Source::ModelDirEnv);

        let dir = resolve_with(None, None, Some("/env/home".into()), None);
        assert_eq!(dir.path, PathBuf::from("/env/home/models"));
        assert_eq!(dir.source, Source::HomeEnv);
    }

    #[test]
    fn test_default_under_home() {
        let dir = resolve_with(None, Some("".into()), None, Some(PathBuf::from("/home/u")));
        assert_eq!(dir.path, PathBuf::from("/home/u/.phishlens/models"));
        assert_eq!(dir.source, Source::Default);
        assert_eq!(dir.source.to_string(), "default");
    }
}
