use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
pub struct HytaleServerConfig {
    #[serde(default)]
    pub auth: HytaleAuthConfig,

    /// Name written to `config.json`.
    pub server_name: Option<String>,

    /// Assets archive passed with `--assets`, relative to the install directory.
    pub assets: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct HytaleAuthConfig {
    pub client_id: String,
    pub scope: String,

    /// Profile (username) to run the server as; first profile when unset.
    pub profile: Option<String>,

    /// Token cache location; defaults to `<install_dir>/.hytale-auth.json`.
    pub cache_file: Option<PathBuf>,

    /// Poll interval used when the device authorization response has none.
    pub default_poll_interval_secs: u64,

    pub endpoints: HytaleEndpoints,
}

impl Default for HytaleAuthConfig {
    fn default() -> Self {
        Self {
            client_id: "hytale-server".to_string(),
            scope: "openid offline auth:server".to_string(),
            profile: None,
            cache_file: None,
            default_poll_interval_secs: 5,
            endpoints: HytaleEndpoints::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct HytaleEndpoints {
    pub device_authorization: String,
    pub token: String,
    pub profiles: String,
    pub session: String,
}

impl Default for HytaleEndpoints {
    fn default() -> Self {
        Self {
            device_authorization: "https://oauth.accounts.hytale.com/oauth2/device/auth"
                .to_string(),
            token: "https://oauth.accounts.hytale.com/oauth2/token".to_string(),
            profiles: "https://account-data.hytale.com/my-account/get-profiles".to_string(),
            session: "https://sessions.hytale.com/game-session/new".to_string(),
        }
    }
}
