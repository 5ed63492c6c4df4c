use std::{fmt, str::FromStr};

use crate::ResolveError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flavor {
    Paper,
    Fabric,
    Forge,
    Geyser,
    Velocity,
    Purpur,
    Pufferfish,
    Folia,
    Hytale,
}

/// Game family a flavor belongs to; used to derive OS and unit names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Product {
    Minecraft,
    Hytale,
}

impl Product {
    pub fn as_str(&self) -> &'static str {
        match self {
            Product::Minecraft => "minecraft",
            Product::Hytale => "hytale",
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Flavor {
    pub const ALL: [Flavor; 9] = [
        Flavor::Paper,
        Flavor::Fabric,
        Flavor::Forge,
        Flavor::Geyser,
        Flavor::Velocity,
        Flavor::Purpur,
        Flavor::Pufferfish,
        Flavor::Folia,
        Flavor::Hytale,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Flavor::Paper => "paper",
            Flavor::Fabric => "fabric",
            Flavor::Forge => "forge",
            Flavor::Geyser => "geyser",
            Flavor::Velocity => "velocity",
            Flavor::Purpur => "purpur",
            Flavor::Pufferfish => "pufferfish",
            Flavor::Folia => "folia",
            Flavor::Hytale => "hytale",
        }
    }

    pub fn supported_list() -> String {
        Flavor::ALL
            .iter()
            .map(Flavor::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn product(&self) -> Product {
        match self {
            Flavor::Hytale => Product::Hytale,
            _ => Product::Minecraft,
        }
    }

    /// Proxies have no world, EULA or `server.properties`.
    pub fn is_proxy(&self) -> bool {
        matches!(self, Flavor::Velocity | Flavor::Geyser)
    }

    /// File name the artifact is stored under inside the install directory.
    pub fn artifact_name(&self) -> &'static str {
        match self {
            Flavor::Forge => "forge-installer.jar",
            Flavor::Hytale => "HytaleServer.jar",
            _ => "server.jar",
        }
    }
}

impl FromStr for Flavor {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Flavor::ALL
            .iter()
            .copied()
            .find(|flavor| flavor.as_str() == wanted)
            .ok_or_else(|| ResolveError::UnsupportedFlavor {
                flavor: s.to_string(),
                supported: Flavor::supported_list(),
            })
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
