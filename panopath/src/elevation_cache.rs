//! Elevations the service has answered, kept in `elevations.json` so
//! re-runs only query new locations.

use crate::routedir;
use anyhow::Result;
use log::debug;
use panochain::{encode, ElevationBatch, ElevationSource, FetchError, Service};
use std::{cell::RefCell, collections::BTreeMap, path::PathBuf};

/// Coordinates in millionths of a degree.
type Key = (i64, i64);

/// `[lat, lng, elevation]` as stored on disk.
type Entry = [f64; 3];

#[allow(clippy::cast_possible_truncation)]
fn key((lat, lng): (f64, f64)) -> Key {
    ((lat * 1e6).round() as i64, (lng * 1e6).round() as i64)
}

/// Wraps an elevation source, answering known locations from disk and
/// saving every batch the source answers before handing it on.
///
/// Only values the source returned are stored. Locations it had no
/// elevation for are asked again on the next run.
pub struct ElevationCache<E> {
    inner: E,
    path: PathBuf,
    known: RefCell<BTreeMap<Key, f64>>,
}

impl<E: ElevationSource> ElevationCache<E> {
    /// Loads the cache at `path`, which does not need to exist yet.
    pub fn load(inner: E, path: PathBuf) -> Result<Self> {
        let entries: Vec<Entry> = if path.exists() {
            routedir::read_json(&path)?
        } else {
            Vec::new()
        };
        let known: BTreeMap<Key, f64> = entries
            .iter()
            .map(|&[lat, lng, elevation]| (key((lat, lng)), elevation))
            .collect();
        debug!("{} cached elevations in {path:?}", known.len());
        Ok(Self {
            inner,
            path,
            known: RefCell::new(known),
        })
    }

    fn save(&self) -> Result<()> {
        #[allow(clippy::cast_precision_loss)]
        let entries: Vec<Entry> = self
            .known
            .borrow()
            .iter()
            .map(|(&(lat, lng), &elevation)| [lat as f64 / 1e6, lng as f64 / 1e6, elevation])
            .collect();
        routedir::write_json(&self.path, &entries)
    }
}

impl<E: ElevationSource> ElevationSource for ElevationCache<E> {
    fn elevations(&self, batch: &ElevationBatch) -> Result<Vec<Option<f64>>, FetchError> {
        let missing: Vec<(f64, f64)> = {
            let known = self.known.borrow();
            batch
                .coords
                .iter()
                .copied()
                .filter(|c| !known.contains_key(&key(*c)))
                .collect()
        };
        debug!(
            "{} of {} elevations cached",
            batch.coords.len() - missing.len(),
            batch.coords.len()
        );
        if !missing.is_empty() {
            let sub_batch = ElevationBatch {
                polyline: encode(&missing).map_err(|e| FetchError::new(Service::Elevation, e))?,
                coords: missing,
            };
            let fetched = self.inner.elevations(&sub_batch)?;
            {
                let mut known = self.known.borrow_mut();
                for (coord, elevation) in sub_batch.coords.iter().zip(fetched) {
                    if let Some(elevation) = elevation {
                        known.insert(key(*coord), elevation);
                    }
                }
            }
            self.save().map_err(|e| FetchError::new(Service::Elevation, e))?;
        }
        let known = self.known.borrow();
        Ok(batch
            .coords
            .iter()
            .map(|c| known.get(&key(*c)).copied())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::ElevationCache;
    use panochain::{encode, ElevationBatch, ElevationSource, FetchError, Service};
    use std::{cell::Cell, fs, path::PathBuf};

    /// Answers with the latitude, or nothing south of the equator, and
    /// fails on call number `fail_on`.
    #[derive(Default)]
    struct Counting {
        calls: Cell<usize>,
        requested: Cell<usize>,
        fail_on: Option<usize>,
    }

    impl ElevationSource for Counting {
        fn elevations(&self, batch: &ElevationBatch) -> Result<Vec<Option<f64>>, FetchError> {
            let call = self.calls.get();
            self.calls.set(call + 1);
            if self.fail_on == Some(call) {
                return Err(FetchError::new(Service::Elevation, "quota exceeded"));
            }
            self.requested.set(self.requested.get() + batch.coords.len());
            Ok(batch
                .coords
                .iter()
                .map(|&(lat, _)| (lat > 0.0).then_some(lat))
                .collect())
        }
    }

    fn batch(coords: Vec<(f64, f64)>) -> ElevationBatch {
        ElevationBatch {
            polyline: encode(&coords).unwrap(),
            coords,
        }
    }

    fn scratch(name: &str) -> PathBuf {
        let path =
            std::env::temp_dir().join(format!("panopath-{}-{name}.json", std::process::id()));
        let _ = fs::remove_file(&path);
        path
    }

    #[test]
    fn test_only_queries_unknown() {
        let path = scratch("only-unknown");
        let cache = ElevationCache::load(Counting::default(), path.clone()).unwrap();

        let got = cache
            .elevations(&batch(vec![(44.1, -71.1), (44.2, -71.2)]))
            .unwrap();
        assert_eq!(got, [Some(44.1), Some(44.2)]);
        assert_eq!(cache.inner.requested.get(), 2);

        let again = cache
            .elevations(&batch(vec![(44.2, -71.2), (44.3, -71.3), (44.1, -71.1)]))
            .unwrap();
        assert_eq!(again, [Some(44.2), Some(44.3), Some(44.1)]);
        assert_eq!(cache.inner.requested.get(), 3);

        let reloaded = ElevationCache::load(Counting::default(), path.clone()).unwrap();
        reloaded
            .elevations(&batch(vec![(44.1, -71.1), (44.3, -71.3)]))
            .unwrap();
        assert_eq!(reloaded.inner.requested.get(), 0);
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_answered_batches_survive_a_failure() {
        let path = scratch("survive-failure");
        let first = vec![(44.1, -71.1), (44.2, -71.2)];
        let second = vec![(44.3, -71.3), (44.4, -71.4)];

        let failing = Counting {
            fail_on: Some(1),
            ..Counting::default()
        };
        let cache = ElevationCache::load(failing, path.clone()).unwrap();
        cache.elevations(&batch(first.clone())).unwrap();
        assert!(cache.elevations(&batch(second.clone())).is_err());

        let rerun = ElevationCache::load(Counting::default(), path.clone()).unwrap();
        assert_eq!(
            rerun.elevations(&batch(first)).unwrap(),
            [Some(44.1), Some(44.2)]
        );
        assert_eq!(rerun.inner.requested.get(), 0);
        rerun.elevations(&batch(second)).unwrap();
        assert_eq!(rerun.inner.requested.get(), 2);
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_unanswered_locations_are_asked_again() {
        let path = scratch("unanswered");
        let coords = vec![(44.1, -71.1), (-10.0, 20.0)];
        let cache = ElevationCache::load(Counting::default(), path.clone()).unwrap();
        assert_eq!(
            cache.elevations(&batch(coords.clone())).unwrap(),
            [Some(44.1), None]
        );

        let rerun = ElevationCache::load(Counting::default(), path.clone()).unwrap();
        assert_eq!(
            rerun.elevations(&batch(coords)).unwrap(),
            [Some(44.1), None]
        );
        assert_eq!(rerun.inner.requested.get(), 1);
        fs::remove_file(path).unwrap();
    }
}
