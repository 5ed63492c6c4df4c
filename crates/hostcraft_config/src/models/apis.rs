use serde::Deserialize;

/// Base URLs of the build metadata services queried by the resolver.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiEndpoints {
    pub papermc: String,
    pub mcjars: String,
    pub fabric_meta: String,
    pub forge_promotions: String,
    pub forge_maven: String,
    pub geysermc: String,
}

impl Default for ApiEndpoints {
    fn default() -> Self {
        Self {
            papermc: "https://api.papermc.io".to_string(),
            mcjars: "https://versions.mcjars.app".to_string(),
            fabric_meta: "https://meta.fabricmc.net".to_string(),
            forge_promotions:
                "https://files.minecraftforge.net/net/minecraftforge/forge/promotions_slim.json"
                    .to_string(),
            forge_maven: "https://maven.minecraftforge.net/net/minecraftforge/forge".to_string(),
            geysermc: "https://download.geysermc.org".to_string(),
        }
    }
}
