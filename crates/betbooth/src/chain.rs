use crate::errors::ReceiptTimeout;
use alloy::{
    consensus::{SignableTransaction as _, TxEip1559, TxEnvelope, TxLegacy},
    network::TransactionBuilder as _,
    primitives::{Address, Bytes, TxKind, B256, U256},
    providers::{Provider as _, RootProvider},
    rpc::types::{BlockNumberOrTag, TransactionReceipt, TransactionRequest},
    signers::{local::PrivateKeySigner, SignerSync as _},
};
use eyre::Context as _;
use reqwest::Client;
use std::{str::FromStr as _, time::Duration};
use tokio::time::sleep;

const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(20);
const DEFAULT_RPC_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const RECEIPT_POLL_INTERVAL: Duration = Duration::from_millis(250);

type EvmProvider = RootProvider;

pub fn compute_eip1559_fees(base_fee: u128, gas_price: u128) -> (u128, u128) {
    // Conservative fee policy:
    // - priority: max(0.01 gwei, gas_price / 10) — Arbitrum priority fees are tiny
    // - max_fee: base_fee * 2 + priority
    let min_priority: u128 = 10_000_000; // 0.01 gwei
    let priority = std::cmp::max(min_priority, gas_price / 10);

    let mut max_fee = base_fee.saturating_mul(2).saturating_add(priority);
    let min_fee = base_fee.saturating_add(priority);
    if max_fee < min_fee {
        max_fee = min_fee;
    }
    (max_fee, priority)
}

/// Apply the "prefer EIP-1559 when the chain has base fees" policy to a
/// transaction. Pure so fee selection is testable without RPC variance.
pub fn apply_fee_policy(
    mut tx: TransactionRequest,
    base_fee: Option<u128>,
    gas_price: u128,
    from: Address,
    chain_id: u64,
) -> TransactionRequest {
    // If the caller already set explicit fee fields, don't override them.
    if tx.max_fee_per_gas.is_some()
        || tx.max_priority_fee_per_gas.is_some()
        || tx.gas_price.is_some()
    {
        return tx;
    }

    if tx.chain_id.is_none() {
        tx.chain_id = Some(chain_id);
    }
    if tx.from.is_none() {
        tx.from = Some(from);
    }

    if let Some(base_fee) = base_fee {
        let (max_fee, priority) = compute_eip1559_fees(base_fee, gas_price);
        tx.max_fee_per_gas = Some(max_fee);
        tx.max_priority_fee_per_gas = Some(priority);
    } else {
        tx.gas_price = Some(gas_price);
    }
    tx
}

/// Build and sign a consensus transaction from a fully-populated `TransactionRequest`.
fn build_and_sign_tx(
    signer: &PrivateKeySigner,
    tx: &TransactionRequest,
) -> eyre::Result<(TxEnvelope, B256)> {
    let to = tx.to.unwrap_or(TxKind::Create);
    let value = tx.value.unwrap_or(U256::ZERO);
    let input = tx.input.clone().into_input().unwrap_or_default();
    let nonce = tx.nonce.unwrap_or(0);
    let gas_limit = tx.gas.unwrap_or(21_000);

    if tx.max_fee_per_gas.is_some() {
        // EIP-1559
        let consensus_tx = TxEip1559 {
            chain_id: tx.chain_id.unwrap_or(1),
            nonce,
            gas_limit,
            max_fee_per_gas: tx.max_fee_per_gas.unwrap_or(0),
            max_priority_fee_per_gas: tx.max_priority_fee_per_gas.unwrap_or(0),
            to,
            value,
            input,
            access_list: tx.access_list.clone().unwrap_or_default(),
        };
        let hash = consensus_tx.signature_hash();
        let sig = signer.sign_hash_sync(&hash).context("sign eip1559")?;
        let signed_tx = consensus_tx.into_signed(sig);
        let tx_hash = *signed_tx.hash();
        Ok((TxEnvelope::Eip1559(signed_tx), tx_hash))
    } else {
        // Legacy
        let consensus_tx = TxLegacy {
            chain_id: tx.chain_id,
            nonce,
            gas_price: tx.gas_price.unwrap_or(0),
            gas_limit,
            to,
            value,
            input,
        };
        let hash = consensus_tx.signature_hash();
        let sig = signer.sign_hash_sync(&hash).context("sign legacy")?;
        let signed_tx = consensus_tx.into_signed(sig);
        let tx_hash = *signed_tx.hash();
        Ok((TxEnvelope::Legacy(signed_tx), tx_hash))
    }
}

/// One EVM endpoint plus the chain id it is expected to serve.
///
/// betbooth talks to exactly one configured endpoint; endpoint failures
/// propagate to the dispatcher instead of rotating through fallbacks.
#[derive(Debug, Clone)]
pub struct EvmChain {
    pub chain_id: u64,
    pub rpc_url: String,
}

impl EvmChain {
    pub const fn new(chain_id: u64, rpc_url: String) -> Self {
        Self { chain_id, rpc_url }
    }

    pub fn provider(&self) -> eyre::Result<EvmProvider> {
        let u: reqwest::Url = self
            .rpc_url
            .parse()
            .with_context(|| format!("invalid rpc url: {}", self.rpc_url))?;
        let client = Client::builder()
            .timeout(DEFAULT_RPC_TIMEOUT)
            .connect_timeout(DEFAULT_RPC_CONNECT_TIMEOUT)
            .build()
            .context("build rpc http client")?;
        let http = alloy::transports::http::Http::with_client(client, u);
        let rpc_client = alloy::rpc::client::RpcClient::new(http, false);
        Ok(RootProvider::new(rpc_client))
    }

    pub async fn get_native_balance(&self, addr: Address) -> eyre::Result<U256> {
        let p = self.provider()?;
        let v = p.get_balance(addr).await.context("get balance")?;
        Ok(v)
    }

    /// Read-only `eth_call` against contract state. No gas, no receipt.
    pub async fn call(&self, to: Address, data: Bytes) -> eyre::Result<Bytes> {
        let p = self.provider()?;
        let tx = TransactionRequest::default().with_to(to).with_input(data);
        let out = p.call(tx).await.context("eth_call")?;
        Ok(out)
    }

    /// Fill chain id, fees, nonce, and gas; sign; broadcast. Returns the
    /// pending transaction hash without waiting for inclusion.
    pub async fn send_tx(
        &self,
        signer: &PrivateKeySigner,
        mut tx: TransactionRequest,
    ) -> eyre::Result<B256> {
        let provider = self.provider()?;
        let from = signer.address();

        tx.chain_id = Some(self.chain_id);
        if tx.from.is_none() {
            tx.from = Some(from);
        }

        // Prefer EIP-1559 fees when the chain supports base fees.
        if tx.gas_price.is_none() && tx.max_fee_per_gas.is_none() {
            let base_fee = provider
                .get_block_by_number(BlockNumberOrTag::Pending)
                .await
                .ok()
                .flatten()
                .and_then(|b| b.header.base_fee_per_gas.map(u128::from));

            let gp = provider.get_gas_price().await.context("get gas price")?;
            tx = apply_fee_policy(tx, base_fee, gp, from, self.chain_id);
        }

        if tx.nonce.is_none() {
            let n = provider
                .get_transaction_count(from)
                .pending()
                .await
                .context("get nonce")?;
            tx.nonce = Some(n);
        }

        if tx.gas.is_none() {
            let gas = provider
                .estimate_gas(tx.clone())
                .await
                .context("estimate gas")?;
            // Add a small buffer for flaky estimators.
            let gas = gas.saturating_mul(120) / 100;
            tx.gas = Some(gas);
        }

        let (envelope, tx_hash) = build_and_sign_tx(signer, &tx).context("sign tx")?;
        let raw_bytes = alloy::eips::eip2718::Encodable2718::encoded_2718(&envelope);
        provider
            .send_raw_transaction(&raw_bytes)
            .await
            .context("broadcast raw tx")?;

        Ok(tx_hash)
    }

    /// Sign a fully-specified transaction without broadcasting it.
    pub fn sign_tx(
        &self,
        signer: &PrivateKeySigner,
        mut tx: TransactionRequest,
    ) -> eyre::Result<Vec<u8>> {
        if tx.chain_id.is_none() {
            tx.chain_id = Some(self.chain_id);
        }
        let (envelope, _hash) = build_and_sign_tx(signer, &tx)?;
        Ok(alloy::eips::eip2718::Encodable2718::encoded_2718(&envelope))
    }

    pub async fn get_tx_receipt(&self, tx: B256) -> eyre::Result<Option<TransactionReceipt>> {
        let p = self.provider()?;
        let r = p
            .get_transaction_receipt(tx)
            .await
            .context("get transaction receipt")?;
        Ok(r)
    }

    /// Poll for a receipt until `timeout` elapses. The timeout surfaces as a
    /// [`ReceiptTimeout`] so callers can classify it; no automatic retry.
    pub async fn wait_for_tx_receipt(
        &self,
        tx: B256,
        timeout: Duration,
    ) -> eyre::Result<TransactionReceipt> {
        let start = std::time::Instant::now();
        loop {
            if start.elapsed() > timeout {
                return Err(ReceiptTimeout {
                    seconds: timeout.as_secs(),
                }
                .into());
            }
            if let Some(r) = self.get_tx_receipt(tx).await? {
                return Ok(r);
            }
            sleep(RECEIPT_POLL_INTERVAL).await;
        }
    }

    pub fn parse_address(s: &str) -> eyre::Result<Address> {
        Address::from_str(s).context("parse evm address")
    }
}
