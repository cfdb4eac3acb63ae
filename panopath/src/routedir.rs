//! Files of a route directory.

use anyhow::{Context, Result};
use log::info;
use panochain::{ChainRules, Config, DirectionsRequest, FetchError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

/// Contents of `source.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct Source {
    #[serde(default)]
    pub title: String,
    pub route_request: DirectionsRequest,
    #[serde(flatten)]
    pub rules: ChainRules,
    #[serde(default)]
    pub config: Config,
}

pub struct RouteDir {
    dir: PathBuf,
}

impl RouteDir {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    pub fn source(&self) -> Result<Source> {
        let source: Source = read_json(&self.path("source.json"))?;
        source.config.validate()?;
        Ok(source)
    }

    /// Returns the raw directions response, fetching and caching it in
    /// `route.json` on first use.
    pub fn directions<F>(&self, fetch: F) -> Result<Value>
    where
        F: FnOnce() -> Result<Value, FetchError>,
    {
        let path = self.path("route.json");
        if path.exists() {
            info!("loading {path:?}");
            return read_json(&path);
        }
        info!("fetching route");
        let response = fetch()?;
        write_json(&path, &response)?;
        Ok(response)
    }
}

pub fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let file = File::open(path).with_context(|| format!("opening {path:?}"))?;
    serde_json::from_reader(BufReader::new(file)).with_context(|| format!("parsing {path:?}"))
}

/// Writes `value` as pretty JSON next to `path`, then renames it over
/// `path`.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let tmp_path = path.with_extension("tmp");
    {
        let mut wtr = BufWriter::new(File::create(&tmp_path)?);
        serde_json::to_writer_pretty(&mut wtr, value)?;
        wtr.write_all(b"\n")?;
        let file = wtr.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
    }
    fs::rename(&tmp_path, path)?;
    info!("wrote {path:?}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::Source;
    use panochain::RejectPolicy;

    #[test]
    fn test_source() {
        let source: Source = serde_json::from_str(
            r#"{
                "title": "Auto Road",
                "route_request": {
                    "origin": [44.2834, -71.2279],
                    "destination": [44.2705, -71.30325]
                },
                "prefered_pano_chain": {"a": "b"},
                "excluded": ["c"],
                "config": {"walk": {"on_reject": "terminate"}}
            }"#,
        )
        .unwrap();
        assert_eq!(source.title, "Auto Road");
        assert!(source.route_request.waypoints.is_empty());
        assert_eq!(source.rules.overrides["a"], "b");
        assert!(source.rules.excluded.contains("c"));
        assert_eq!(source.config.walk.on_reject, RejectPolicy::Terminate);
        assert_eq!(source.config.gaps.index_step, 10);
    }
}
