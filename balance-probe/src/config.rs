use anyhow::Context;
use balance_client::domain::Account;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const CONFIG_ENV: &str = "PROBE_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "probe-config.toml";

const PORTAL_ROOT: &str = "https://www.wap.cnyiot.com/";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    /// Landing pages fetched once, in order, so the portal sets its session cookies.
    pub bootstrap_urls: Vec<String>,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub accept: String,
    pub accept_language: String,
    pub referer: Option<String>,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            bootstrap_urls: vec![PORTAL_ROOT.to_string(), format!("{PORTAL_ROOT}nat/")],
            timeout_secs: 15,
            user_agent: "Mozilla/5.0 (iPhone; CPU iPhone OS 16_0 like Mac OS X) \
                         AppleWebKit/605.1.15 (KHTML, like Gecko) \
                         Version/16.0 Mobile/15E148 Safari/604.1"
                .to_string(),
            accept: "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8".to_string(),
            accept_language: "zh-CN,zh;q=0.9".to_string(),
            referer: Some(PORTAL_ROOT.to_string()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AccountsConfig {
    pub water: String,
    pub electric: String,
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            water: format!("{PORTAL_ROOT}nat/pay.aspx?mid=50400466780"),
            electric: format!("{PORTAL_ROOT}nat/pay.aspx?mid=19105155238"),
        }
    }
}

impl AccountsConfig {
    pub fn url(&self, account: Account) -> &str {
        match account {
            Account::Water => &self.water,
            Account::Electric => &self.electric,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data.json"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub portal: PortalConfig,
    pub accounts: AccountsConfig,
    pub store: StoreConfig,
}

impl AppConfig {
    /// Load from `$PROBE_CONFIG`, else `probe-config.toml` when present, else
    /// the built-in portal defaults.
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        match env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(Path::new(&path)),
            Err(_) => {
                let default_path = Path::new(DEFAULT_CONFIG_PATH);
                if default_path.exists() {
                    Self::from_file(default_path)
                } else {
                    tracing::debug!("no config file found, using built-in defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        let cfg: AppConfig = toml::from_str(contents)?;
        Ok(cfg)
    }
}
