//! Tile layer identifiers.

use std::fmt;
use std::str::FromStr;

/// The two tile layers that can be downloaded for offline use.
///
/// Controllers resolve their own widgets to a `LayerId` before calling into
/// the registry; the core never looks at UI identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LayerId {
    /// Aerial imagery layer.
    Aerial,
    /// Rendered street map layer.
    Mapnik,
}

impl LayerId {
    /// Both layers, in display order.
    pub const ALL: [LayerId; 2] = [LayerId::Aerial, LayerId::Mapnik];

    /// Lowercase name used in config sections, commands and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerId::Aerial => "aerial",
            LayerId::Mapnik => "mapnik",
        }
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no known layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown layer '{0}' (expected 'aerial' or 'mapnik')")]
pub struct UnknownLayer(pub String);

impl FromStr for LayerId {
    type Err = UnknownLayer;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "aerial" => Ok(LayerId::Aerial),
            "mapnik" => Ok(LayerId::Mapnik),
            _ => Err(UnknownLayer(s.to_string())),
        }
    }
}
