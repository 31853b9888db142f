use serde::{Deserialize, Serialize};

/// HTTP listener settings, the `[rpc]` section of the daemon config.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Bearer key for the admin routes. Admin routes refuse every request
    /// while this is unset.
    #[serde(default)]
    pub admin_api_key: Option<String>,

    /// Origins allowed by CORS. Empty means same-origin only.
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Take the client address from the first `X-Forwarded-For` hop. Only
    /// enable behind a proxy that sets it.
    #[serde(default)]
    pub trust_forwarded_for: bool,
}

fn default_bind_address() -> String {
    "127.0.0.1:8080".into()
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            admin_api_key: None,
            cors_origins: Vec::new(),
            trust_forwarded_for: false,
        }
    }
}
