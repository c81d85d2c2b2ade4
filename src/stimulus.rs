use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use crate::error::PoolError;

static STIMULI_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/stimuli");

/// A target the player has to reproduce in front of the camera.
///
/// `id` is compared verbatim against the recognizer's label output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stimulus {
    pub id: String,
    pub display_name: String,
    pub display_asset: String,
    pub description: String,
}

#[derive(Deserialize)]
struct PoolFile {
    name: String,
    stimuli: Vec<Stimulus>,
}

/// Fixed list of candidate targets for one game.
#[derive(Debug, Clone)]
pub struct StimulusPool {
    name: String,
    stimuli: Vec<Stimulus>,
}

impl StimulusPool {
    pub fn new(name: impl Into<String>, stimuli: Vec<Stimulus>) -> Result<Self, PoolError> {
        let name = name.into();
        if stimuli.is_empty() {
            return Err(PoolError::Empty(name));
        }

        let mut seen = HashSet::new();
        for s in &stimuli {
            if !seen.insert(s.id.as_str()) {
                return Err(PoolError::DuplicateId {
                    pool: name,
                    id: s.id.clone(),
                });
            }
        }

        Ok(Self { name, stimuli })
    }

    /// Load one of the pools compiled into the binary (`gestures`, `expressions`).
    pub fn builtin(name: &str) -> Result<Self, PoolError> {
        let file = STIMULI_DIR
            .get_file(format!("{name}.json"))
            .ok_or_else(|| PoolError::UnknownPool(name.to_string()))?;
        let contents = file
            .contents_utf8()
            .ok_or_else(|| PoolError::Invalid(format!("{name}.json is not utf-8")))?;
        Self::from_json_str(contents)
    }

    pub fn from_json_str(contents: &str) -> Result<Self, PoolError> {
        let parsed: PoolFile =
            serde_json::from_str(contents).map_err(|e| PoolError::Invalid(e.to_string()))?;
        Self::new(parsed.name, parsed.stimuli)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, PoolError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| PoolError::Invalid(format!("{}: {e}", path.as_ref().display())))?;
        Self::from_json_str(&contents)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.stimuli.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stimuli.is_empty()
    }

    pub fn stimuli(&self) -> &[Stimulus] {
        &self.stimuli
    }

    pub fn get(&self, id: &str) -> Option<&Stimulus> {
        self.stimuli.iter().find(|s| s.id == id)
    }

    /// Uniform draw among stimuli whose id is not in `excluding`.
    ///
    /// Recording the draw is up to the caller.
    pub fn draw<'a, R: Rng + ?Sized>(
        &'a self,
        excluding: &BTreeSet<String>,
        rng: &mut R,
    ) -> Result<&'a Stimulus, PoolError> {
        let eligible: Vec<&Stimulus> = self
            .stimuli
            .iter()
            .filter(|s| !excluding.contains(&s.id))
            .collect();

        eligible
            .choose(rng)
            .copied()
            .ok_or_else(|| PoolError::Exhausted(self.name.clone()))
    }
}
