use crate::{pano::Panorama, ChainError};
use log::debug;
use std::{
    collections::{HashMap, HashSet},
    fs::{self, File},
    io::{BufWriter, ErrorKind, Write},
    path::{Path, PathBuf},
};

/// Panoramas accepted by the walker, in walk order.
///
/// Entries are only ever appended. Exclusions are applied when reading
/// the chain back out with [`Chain::filtered`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chain {
    panoramas: Vec<Panorama>,
    seen: HashSet<String>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a chain from previously persisted panoramas.
    ///
    /// Fails if the panoramas could not have been produced by a walk:
    /// duplicated ids or route indices going backwards.
    pub fn from_panoramas(panoramas: Vec<Panorama>) -> Result<Self, ChainError> {
        let mut chain = Self::new();
        for pano in panoramas {
            if let Some(last) = chain.last() {
                if pano.route_index < last.route_index {
                    return Err(ChainError::Resume {
                        route_index: pano.route_index,
                        reason: format!("comes after route index {}", last.route_index),
                        pano_id: pano.id,
                    });
                }
            }
            if chain.contains(&pano.id) {
                return Err(ChainError::Resume {
                    route_index: pano.route_index,
                    reason: "appears twice".to_string(),
                    pano_id: pano.id,
                });
            }
            chain.push(pano);
        }
        Ok(chain)
    }

    /// Appends `pano`. Returns `false`, leaving the chain untouched, if
    /// its id is already in the chain.
    pub fn push(&mut self, pano: Panorama) -> bool {
        if self.seen.insert(pano.id.clone()) {
            self.panoramas.push(pano);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    pub fn last(&self) -> Option<&Panorama> {
        self.panoramas.last()
    }

    pub fn len(&self) -> usize {
        self.panoramas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panoramas.is_empty()
    }

    pub fn panoramas(&self) -> &[Panorama] {
        &self.panoramas
    }

    /// Returns the chain without the panoramas in `rules.excluded`.
    pub fn filtered(&self, rules: &ChainRules) -> Vec<Panorama> {
        self.panoramas
            .iter()
            .filter(|pano| !rules.excluded.contains(&pano.id))
            .cloned()
            .collect()
    }
}

/// Manual corrections to the walk.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ChainRules {
    /// Panorama id → id of the panorama that must follow it.
    #[serde(default, alias = "prefered_pano_chain")]
    pub overrides: HashMap<String, String>,

    /// Panoramas left out of the output. They are still walked
    /// through.
    #[serde(default, alias = "exculded_panos")]
    pub excluded: HashSet<String>,
}

/// Durable storage for the walk-ordered panoramas.
pub trait ChainStore {
    /// Returns the previously saved panoramas, or nothing on a fresh
    /// start.
    fn load(&self) -> Result<Vec<Panorama>, ChainError>;

    /// Replaces the stored panoramas with `panoramas`.
    ///
    /// Must not return until the data is durable.
    fn save(&mut self, panoramas: &[Panorama]) -> Result<(), ChainError>;
}

/// Stores the chain as a JSON array with one panorama per line.
#[derive(Debug, Clone)]
pub struct JsonChainStore {
    path: PathBuf,
}

impl JsonChainStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn json_err(&self, e: serde_json::Error) -> ChainError {
        ChainError::Json(e, self.path.clone())
    }
}

impl ChainStore for JsonChainStore {
    fn load(&self) -> Result<Vec<Panorama>, ChainError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let panoramas: Vec<Panorama> =
            serde_json::from_reader(std::io::BufReader::new(file)).map_err(|e| self.json_err(e))?;
        debug!("loaded {} panoramas from {:?}", panoramas.len(), self.path);
        Ok(panoramas)
    }

    fn save(&mut self, panoramas: &[Panorama]) -> Result<(), ChainError> {
        let tmp_path = {
            let mut p = self.path.clone();
            p.set_extension("tmp");
            p
        };
        {
            let file = File::create(&tmp_path)?;
            let mut wtr = BufWriter::new(file);
            wtr.write_all(b"[\n")?;
            for (i, pano) in panoramas.iter().enumerate() {
                // Going through `Value` sorts the keys.
                let value = serde_json::to_value(pano).map_err(|e| self.json_err(e))?;
                wtr.write_all(b"  ")?;
                serde_json::to_writer(&mut wtr, &value).map_err(|e| self.json_err(e))?;
                let sep: &[u8] = if i + 1 == panoramas.len() { b"\n" } else { b",\n" };
                wtr.write_all(sep)?;
            }
            wtr.write_all(b"]\n")?;
            let file = wtr.into_inner().map_err(|e| e.into_error())?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

/// Keeps the chain in memory only.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub panoramas: Vec<Panorama>,

    /// Number of times `save` was called.
    pub saves: usize,
}

impl ChainStore for MemoryStore {
    fn load(&self) -> Result<Vec<Panorama>, ChainError> {
        Ok(self.panoramas.clone())
    }

    fn save(&mut self, panoramas: &[Panorama]) -> Result<(), ChainError> {
        self.panoramas = panoramas.to_vec();
        self.saves += 1;
        Ok(())
    }
}
