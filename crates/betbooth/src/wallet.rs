use crate::{
    amount,
    chain::EvmChain,
    config::{RpcConfig, SigningConfig, ARBITRUM_SEPOLIA_CHAIN_ID, ARBITRUM_SEPOLIA_NETWORK_ID},
};
use alloy::{
    dyn_abi::TypedData,
    network::TransactionBuilder as _,
    primitives::{Address, Bytes, Signature, B256, U256},
    rpc::types::{TransactionReceipt, TransactionRequest},
    signers::{
        local::{coins_bip39::English, MnemonicBuilder, PrivateKeySigner},
        SignerSync as _,
    },
};
use async_trait::async_trait;
use eyre::Context as _;
use std::time::Duration;

/// Static description of the network a wallet is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkDescriptor {
    pub protocol_family: &'static str,
    pub network_id: String,
    pub chain_id: u64,
}

impl NetworkDescriptor {
    pub fn for_chain_id(chain_id: u64) -> Self {
        let network_id = if chain_id == ARBITRUM_SEPOLIA_CHAIN_ID {
            ARBITRUM_SEPOLIA_NETWORK_ID.to_owned()
        } else {
            format!("evm-{chain_id}")
        };
        Self {
            protocol_family: "evm",
            network_id,
            chain_id,
        }
    }
}

/// The capability set action handlers depend on.
///
/// This trait is the abstraction boundary: handlers see exactly these
/// operations, never a concrete RPC client, so tests can substitute a
/// recording implementation.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    fn address(&self) -> Address;

    fn network(&self) -> &NetworkDescriptor;

    /// Native-currency balance of the wallet's own address.
    async fn balance(&self) -> eyre::Result<U256>;

    /// Parse a decimal ETH amount and submit a plain value transfer.
    async fn native_transfer(&self, to: Address, eth_amount: &str) -> eyre::Result<B256>;

    /// EIP-191 personal message signature. Local only, no network I/O.
    fn sign_message(&self, message: &[u8]) -> eyre::Result<Signature>;

    /// EIP-712 typed-data signature. Local only.
    fn sign_typed_data(&self, typed: &TypedData) -> eyre::Result<Signature>;

    /// Sign a fully-specified transaction without broadcasting. Returns the
    /// raw EIP-2718 encoded bytes.
    fn sign_transaction(&self, tx: TransactionRequest) -> eyre::Result<Vec<u8>>;

    /// Fill, sign, and broadcast. Returns the pending hash immediately.
    async fn send_transaction(&self, tx: TransactionRequest) -> eyre::Result<B256>;

    /// Block until the transaction is mined or the configured timeout
    /// elapses (surfaced as [`crate::errors::ReceiptTimeout`]).
    async fn wait_for_receipt(&self, hash: B256) -> eyre::Result<TransactionReceipt>;

    /// Read-only `eth_call`.
    async fn call(&self, to: Address, data: Bytes) -> eyre::Result<Bytes>;
}

/// Decode a raw hex private key, tolerating a `0x` prefix.
fn signer_from_private_key(key: &str) -> eyre::Result<PrivateKeySigner> {
    let s = key.trim();
    let s = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(s).context("decode hex private key")?;
    if bytes.len() != 32 {
        eyre::bail!("EVM private key must be 32 bytes");
    }
    PrivateKeySigner::from_slice(&bytes).context("build signer from private key")
}

fn signer_from_mnemonic(phrase: &str) -> eyre::Result<PrivateKeySigner> {
    MnemonicBuilder::<English>::default()
        .phrase(phrase.trim())
        .build()
        .context("derive signer from mnemonic")
}

/// One signing key bound to one RPC endpoint, immutable for the process
/// lifetime.
pub struct EvmWallet {
    signer: PrivateKeySigner,
    chain: EvmChain,
    network: NetworkDescriptor,
    receipt_timeout: Duration,
}

impl EvmWallet {
    /// Build a wallet from exactly one signing source. A private key wins
    /// over a mnemonic when both are set; neither is a configuration error.
    pub fn configure(signing: &SigningConfig, rpc: &RpcConfig) -> eyre::Result<Self> {
        let signer = match (&signing.private_key, &signing.mnemonic) {
            (Some(k), _) => signer_from_private_key(k)?,
            (None, Some(m)) => signer_from_mnemonic(m)?,
            (None, None) => {
                eyre::bail!("either a private key or a mnemonic phrase must be provided")
            }
        };
        Ok(Self {
            signer,
            chain: EvmChain::new(rpc.chain_id, rpc.rpc_url.clone()),
            network: NetworkDescriptor::for_chain_id(rpc.chain_id),
            receipt_timeout: Duration::from_secs(rpc.receipt_timeout_seconds),
        })
    }
}

#[async_trait]
impl WalletProvider for EvmWallet {
    fn address(&self) -> Address {
        self.signer.address()
    }

    fn network(&self) -> &NetworkDescriptor {
        &self.network
    }

    async fn balance(&self) -> eyre::Result<U256> {
        self.chain.get_native_balance(self.signer.address()).await
    }

    async fn native_transfer(&self, to: Address, eth_amount: &str) -> eyre::Result<B256> {
        let value = amount::parse_eth_to_wei(eth_amount)?;
        let tx = TransactionRequest::default()
            .with_from(self.signer.address())
            .with_to(to)
            .with_value(value);
        self.chain.send_tx(&self.signer, tx).await
    }

    fn sign_message(&self, message: &[u8]) -> eyre::Result<Signature> {
        self.signer
            .sign_message_sync(message)
            .context("sign message")
    }

    fn sign_typed_data(&self, typed: &TypedData) -> eyre::Result<Signature> {
        self.signer
            .sign_dynamic_typed_data_sync(typed)
            .context("sign typed data")
    }

    fn sign_transaction(&self, tx: TransactionRequest) -> eyre::Result<Vec<u8>> {
        self.chain.sign_tx(&self.signer, tx)
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> eyre::Result<B256> {
        self.chain.send_tx(&self.signer, tx).await
    }

    async fn wait_for_receipt(&self, hash: B256) -> eyre::Result<TransactionReceipt> {
        self.chain
            .wait_for_tx_receipt(hash, self.receipt_timeout)
            .await
    }

    async fn call(&self, to: Address, data: Bytes) -> eyre::Result<Bytes> {
        self.chain.call(to, data).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BetboothConfig;

    // Well-known throwaway dev key (anvil account 0). Never funded on a real
    // network.
    const DEV_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const DEV_ADDR: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    fn cfg_with_key(key: &str) -> BetboothConfig {
        BetboothConfig {
            signing: SigningConfig {
                private_key: Some(key.to_owned()),
                mnemonic: None,
            },
            ..Default::default()
        }
    }

    #[test]
    fn private_key_normalizes_with_and_without_prefix() -> eyre::Result<()> {
        let bare = cfg_with_key(DEV_KEY);
        let prefixed = cfg_with_key(&format!("0x{DEV_KEY}"));

        let w1 = EvmWallet::configure(&bare.signing, &bare.rpc)?;
        let w2 = EvmWallet::configure(&prefixed.signing, &prefixed.rpc)?;

        assert_eq!(w1.address(), w2.address(), "prefix must not change account");
        assert_eq!(format!("{:?}", w1.address()), DEV_ADDR);
        Ok(())
    }

    #[test]
    fn configure_fails_without_signing_source() {
        let cfg = BetboothConfig::default();
        let r = EvmWallet::configure(&cfg.signing, &cfg.rpc);
        assert!(r.is_err(), "no signing source must be rejected");
    }

    #[test]
    fn configure_rejects_short_key() {
        let cfg = cfg_with_key("abcd");
        let r = EvmWallet::configure(&cfg.signing, &cfg.rpc);
        assert!(r.is_err(), "short key must be rejected");
    }

    #[test]
    fn mnemonic_derives_a_stable_address() -> eyre::Result<()> {
        // The canonical BIP-39 test vector phrase.
        let cfg = BetboothConfig {
            signing: SigningConfig {
                private_key: None,
                mnemonic: Some(
                    "test test test test test test test test test test test junk".into(),
                ),
            },
            ..Default::default()
        };
        let w = EvmWallet::configure(&cfg.signing, &cfg.rpc)?;
        // First account of the well-known dev mnemonic.
        assert_eq!(format!("{:?}", w.address()), DEV_ADDR);
        Ok(())
    }

    #[test]
    fn network_descriptor_matches_default_chain() {
        let net = NetworkDescriptor::for_chain_id(ARBITRUM_SEPOLIA_CHAIN_ID);
        assert_eq!(net.protocol_family, "evm");
        assert_eq!(net.network_id, "arbitrum-sepolia");
        assert_eq!(net.chain_id, 421_614);
    }

    #[test]
    fn message_signature_recovers_signer() -> eyre::Result<()> {
        let cfg = cfg_with_key(DEV_KEY);
        let w = EvmWallet::configure(&cfg.signing, &cfg.rpc)?;
        let sig = w.sign_message(b"hello pools")?;
        let recovered = sig.recover_address_from_msg(b"hello pools")?;
        assert_eq!(recovered, w.address(), "signature must recover the signer");
        Ok(())
    }
}
