use crate::{config::BetboothConfig, paths::BetboothPaths};
use eyre::Context as _;
use std::{fs, path::PathBuf};

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

/// Apply environment variable overrides to the config.
///
/// Env always wins over config.toml so deployments can inject credentials
/// without editing files on disk.
fn apply_env_overrides(cfg: &mut BetboothConfig) {
    /// Helper: if an env var is set and non-empty, apply `setter` with the trimmed value.
    fn apply_env(var: &str, setter: impl FnOnce(&str)) {
        if let Ok(u) = std::env::var(var) {
            let t = u.trim();
            if !t.is_empty() {
                setter(t);
            }
        }
    }

    apply_env("BETBOOTH_PRIVATE_KEY", |v| {
        cfg.signing.private_key = Some(v.to_owned());
    });
    apply_env("BETBOOTH_MNEMONIC", |v| {
        cfg.signing.mnemonic = Some(v.to_owned());
    });
    apply_env("BETBOOTH_RPC_URL", |v| {
        v.clone_into(&mut cfg.rpc.rpc_url);
    });
    apply_env("BETBOOTH_CONTRACT_ADDRESS", |v| {
        cfg.contract_address = Some(v.to_owned());
    });
    if let Ok(v) = std::env::var("BETBOOTH_RECEIPT_TIMEOUT_SECONDS") {
        if let Ok(n) = v.trim().parse::<u64>() {
            if n > 0 {
                cfg.rpc.receipt_timeout_seconds = n;
            }
        }
    }
}

impl ConfigStore {
    pub fn new(paths: &BetboothPaths) -> Self {
        Self {
            path: paths.config_dir.join("config.toml"),
        }
    }

    pub fn load_or_init_default(&self) -> eyre::Result<BetboothConfig> {
        if !self.path.exists() {
            let mut cfg = BetboothConfig::default();
            apply_env_overrides(&mut cfg);
            self.save(&cfg)?;
            return Ok(cfg);
        }

        let s = fs::read_to_string(&self.path).context("read config.toml")?;
        let mut cfg: BetboothConfig = toml::from_str(&s).context("parse config.toml")?;
        apply_env_overrides(&mut cfg);
        Ok(cfg)
    }

    pub fn save(&self, cfg: &BetboothConfig) -> eyre::Result<()> {
        if let Some(parent) = self.path.parent() {
            crate::fsutil::ensure_private_dir(parent)?;
        }
        let s = toml::to_string_pretty(cfg).context("serialize config.toml")?;
        crate::fsutil::write_string_atomic_restrictive(
            &self.path,
            &s,
            crate::fsutil::MODE_FILE_PRIVATE,
        )
        .context("write config.toml")?;
        Ok(())
    }
}
