use serde::{Deserialize, Serialize};

/// Public Arbitrum Sepolia rollup endpoint, used when no RPC URL is supplied.
pub const ARBITRUM_SEPOLIA_RPC_URL: &str = "https://sepolia-rollup.arbitrum.io/rpc";
pub const ARBITRUM_SEPOLIA_CHAIN_ID: u64 = 421_614;
pub const ARBITRUM_SEPOLIA_NETWORK_ID: &str = "arbitrum-sepolia";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SigningConfig {
    /// Raw hex private key, with or without a `0x` prefix.
    pub private_key: Option<String>,
    /// BIP-39 mnemonic phrase. Used only when `private_key` is unset.
    pub mnemonic: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    /// EVM RPC endpoint URL.
    pub rpc_url: String,
    /// Chain id the endpoint is expected to serve.
    pub chain_id: u64,
    /// How long to poll for a transaction receipt before reporting a
    /// confirmation timeout (seconds).
    pub receipt_timeout_seconds: u64,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            rpc_url: ARBITRUM_SEPOLIA_RPC_URL.into(),
            chain_id: ARBITRUM_SEPOLIA_CHAIN_ID,
            receipt_timeout_seconds: 90,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BetboothConfig {
    pub signing: SigningConfig,
    pub rpc: RpcConfig,
    /// Address of the deployed betting pool registry contract.
    pub contract_address: Option<String>,
}

impl BetboothConfig {
    /// Startup check mirroring the env validation the chat entry point does:
    /// a signing source and a contract address must both be configured
    /// before any action can run.
    pub fn validate_for_serve(&self) -> eyre::Result<()> {
        if self.signing.private_key.is_none() && self.signing.mnemonic.is_none() {
            eyre::bail!(
                "no signing source configured: set signing.private_key or signing.mnemonic \
                 in config.toml (or BETBOOTH_PRIVATE_KEY / BETBOOTH_MNEMONIC)"
            );
        }
        if self
            .contract_address
            .as_deref()
            .is_none_or(|s| s.trim().is_empty())
        {
            eyre::bail!(
                "no contract address configured: set contract_address in config.toml \
                 (or BETBOOTH_CONTRACT_ADDRESS)"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_arbitrum_sepolia() {
        let cfg = BetboothConfig::default();
        assert_eq!(cfg.rpc.rpc_url, ARBITRUM_SEPOLIA_RPC_URL);
        assert_eq!(cfg.rpc.chain_id, ARBITRUM_SEPOLIA_CHAIN_ID);
    }

    #[test]
    fn serve_validation_requires_signing_and_contract() {
        let cfg = BetboothConfig::default();
        assert!(cfg.validate_for_serve().is_err(), "empty config must fail");

        let keyed = BetboothConfig {
            signing: SigningConfig {
                private_key: Some("ab".repeat(32)),
                mnemonic: None,
            },
            ..Default::default()
        };
        assert!(
            keyed.validate_for_serve().is_err(),
            "missing contract address must fail"
        );

        let full = BetboothConfig {
            contract_address: Some(format!("0x{}", "11".repeat(20))),
            ..keyed
        };
        assert!(full.validate_for_serve().is_ok(), "complete config must pass");
    }
}
