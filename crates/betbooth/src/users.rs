use crate::fsutil::{self, MODE_FILE_PRIVATE};
use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use eyre::Context as _;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, path::PathBuf, str::FromStr as _};

/// One chat user's registered payout wallet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserWallet {
    pub user_id: String,
    pub username: String,
    pub wallet_address: String,
    pub last_used: DateTime<Utc>,
}

/// Keyed by user id, persisted as a single JSON document. Writes go through
/// the atomic temp-and-rename path so a crash never leaves a torn file.
#[derive(Debug)]
pub struct UserWalletStore {
    path: PathBuf,
    wallets: BTreeMap<String, UserWallet>,
}

impl UserWalletStore {
    pub fn load_or_default(path: PathBuf) -> eyre::Result<Self> {
        let wallets = if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("read {}", path.display()))?;
            serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, wallets })
    }

    fn save(&self) -> eyre::Result<()> {
        let raw = serde_json::to_string_pretty(&self.wallets).context("serialize user wallets")?;
        fsutil::write_string_atomic_restrictive(&self.path, &raw, MODE_FILE_PRIVATE)
    }

    /// Register or replace a user's wallet. The address must be a full
    /// 0x-prefixed 20-byte hex address; it is stored checksummed.
    pub fn register(
        &mut self,
        user_id: &str,
        username: &str,
        wallet_address: &str,
    ) -> eyre::Result<UserWallet> {
        let addr = Address::from_str(wallet_address.trim())
            .with_context(|| format!("invalid wallet address {wallet_address:?}"))?;
        let entry = UserWallet {
            user_id: user_id.to_owned(),
            username: username.to_owned(),
            wallet_address: addr.to_checksum(None),
            last_used: Utc::now(),
        };
        self.wallets.insert(user_id.to_owned(), entry.clone());
        self.save()?;
        Ok(entry)
    }

    pub fn get(&self, user_id: &str) -> Option<&UserWallet> {
        self.wallets.get(user_id)
    }

    pub fn len(&self) -> usize {
        self.wallets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wallets.is_empty()
    }

    pub fn touch(&mut self, user_id: &str) -> eyre::Result<()> {
        if let Some(w) = self.wallets.get_mut(user_id) {
            w.last_used = Utc::now();
            self.save()?;
        }
        Ok(())
    }
}
