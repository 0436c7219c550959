use std::fmt;
use std::io;
use std::path::PathBuf;

use planecad::WorkplaneError;
use serde::Serialize;
use thiserror::Error;

/// Pipeline stages in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    /// Base plate.
    Plate,
    /// Left and right mounting wings.
    Wings,
    /// Bridge across the back edge.
    Bridge,
    /// Triangular support rib.
    Rib,
    /// Keyhole slots, extruder holes and reinforcement holes.
    Slots,
    /// Cable-routing hole groups on the side and bottom faces.
    AuxHoles,
    /// Hexagonal vent, counterbored mounts and fan pocket.
    Vent,
}

impl Stage {
    /// All stages in execution order.
    pub const ALL: [Stage; 7] = [
        Stage::Plate,
        Stage::Wings,
        Stage::Bridge,
        Stage::Rib,
        Stage::Slots,
        Stage::AuxHoles,
        Stage::Vent,
    ];

    /// Short lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Stage::Plate => "plate",
            Stage::Wings => "wings",
            Stage::Bridge => "bridge",
            Stage::Rib => "rib",
            Stage::Slots => "slots",
            Stage::AuxHoles => "aux-holes",
            Stage::Vent => "vent",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// Errors from loading parameters or building the bracket.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A parameter is out of range.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Field name.
        name: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// The parameter file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The parameter file is not valid TOML for [`crate::BracketParams`].
    #[error("invalid parameter file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Parameters could not be written as TOML.
    #[error("cannot serialize parameters: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A modeling operation failed.
    #[error("stage `{stage}` failed: {source}")]
    Stage {
        /// Stage that was running.
        stage: Stage,
        /// The workplane error.
        #[source]
        source: WorkplaneError,
    },
}
