use std::path::PathBuf;

use tja_schema::ChartMetadata;

use crate::CompileOptions;

/// Media referenced by a chart, resolved against the chart's directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChartResources {
    pub wave: Option<PathBuf>,
    pub bg_movie: Option<PathBuf>,
}

/// Missing files are logged, not fatal: a chart without audio still plays
/// in simulation.
pub fn resolve_resources(meta: &ChartMetadata, options: &CompileOptions) -> ChartResources {
    let resolve = |name: &Option<String>, what: &str| -> Option<PathBuf> {
        let name = name.as_deref()?;
        let path = match &options.base_dir {
            Some(base) => base.join(name),
            None => PathBuf::from(name),
        };
        if options.base_dir.is_some() && !path.exists() {
            log::warn!("{what} {} not found", path.display());
        }
        Some(path)
    };

    ChartResources {
        wave: resolve(&meta.wave, "WAVE"),
        bg_movie: resolve(&meta.bg_movie, "BGMOVIE"),
    }
}
