//! Game setup read from TOML.
//!
//! ```toml
//! variants = ["atomic", "chess960"]
//! chess960_index = 518
//!
//! [starting]
//! checks = [0, 0]
//! ```
//!
//! A `fen` key replaces the starting layout altogether. Without one the
//! variants pick their own layout, a random one for Chess960 unless an
//! index is given.

use std::path::Path;

use rootcause::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    model::{
        position::Position,
        setup::{random_chess960, start_position},
        variants::{Variant, VariantSet},
    },
    notation::fen::{Snapshot, StartingData},
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GameConfig {
    #[serde(default)]
    pub variants: Vec<Variant>,
    pub fen: Option<String>,
    pub chess960_index: Option<u16>,
    pub starting: Option<StartingData>,
}

impl GameConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Report> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .context("could not read game configuration")
            .attach(format!("path: {}", path.display()))?;
        let config = Self::from_toml(&text).attach(format!("path: {}", path.display()))?;
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, Report> {
        let config: Self = toml::from_str(text).context("malformed game configuration")?;
        if let Some(ix) = config.chess960_index {
            if ix >= 960 {
                return Err(report!("Chess960 layouts are numbered 0 to 959")
                    .attach(format!("chess960_index: {ix}")));
            }
        }
        debug!(variants = ?config.variants, "game configuration read");
        Ok(config)
    }

    pub fn variant_set(&self) -> VariantSet {
        self.variants.iter().copied().collect()
    }

    /// The starting snapshot this configuration describes.
    pub fn snapshot(&self) -> Snapshot {
        let variants = self.variant_set();
        let mut snapshot = match &self.fen {
            Some(fen) => Snapshot {
                fen: fen.clone(),
                variants,
                starting: None,
                homes: vec![],
            },
            None => {
                let index = variants
                    .has(Variant::CHESS960)
                    .then(|| self.chess960_index.unwrap_or_else(random_chess960));
                Snapshot::of(&start_position(variants, index))
            }
        };
        snapshot.starting = self.starting.clone();
        snapshot
    }

    /// Build the starting position.
    pub fn position(&self) -> Result<Position, Report> {
        let snapshot = self.snapshot();
        let pos = snapshot
            .position()
            .context("game configuration describes no valid position")
            .attach(format!("fen: {}", snapshot.fen))?;
        Ok(pos)
    }
}
