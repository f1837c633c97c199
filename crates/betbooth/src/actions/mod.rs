mod create_bet;
mod details;
mod join_bet;
mod schema;
mod wallets;

pub use schema::list_actions_result;

use crate::{
    errors::{ActionError, ActionReply},
    users::UserWalletStore,
    wallet::WalletProvider,
};
use alloy::{
    primitives::{Address, B256},
    rpc::types::TransactionRequest,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::warn;

/// Submit a write and block until it confirms. Submission failures and
/// confirmation failures surface as distinct kinds; the pending hash rides
/// along on a timeout so the user can look the transaction up themselves.
pub(crate) async fn confirm_write(
    wallet: &dyn WalletProvider,
    tx: TransactionRequest,
) -> Result<B256, ActionError> {
    let hash = wallet
        .send_transaction(tx)
        .await
        .map_err(|e| ActionError::Submission(format!("{e:#}")))?;
    match wallet.wait_for_receipt(hash).await {
        Ok(_) => Ok(hash),
        Err(e) => Err(ActionError::ConfirmationTimeout {
            tx_hash: hash.to_string(),
            message: format!("{e:#}"),
        }),
    }
}

fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, ActionError> {
    serde_json::from_value(args).map_err(|e| ActionError::validation("args", e.to_string()))
}

/// One handler per declared action, bound to one wallet identity and one
/// pool contract for the process lifetime.
pub struct Dispatcher {
    wallet: Arc<dyn WalletProvider>,
    contract: Address,
    users: Mutex<UserWalletStore>,
    // Writes from a single signing key must not interleave: nonce ordering
    // is only safe when submit-and-confirm runs to completion before the
    // next write starts.
    write_gate: Mutex<()>,
}

impl Dispatcher {
    pub fn new(wallet: Arc<dyn WalletProvider>, contract: Address, users: UserWalletStore) -> Self {
        Self {
            wallet,
            contract,
            users: Mutex::new(users),
            write_gate: Mutex::new(()),
        }
    }

    /// Run one action to completion. Every failure is folded into the
    /// reply; nothing escapes this boundary as an error.
    pub async fn dispatch(&self, action: &str, args: Value) -> ActionReply {
        match self.dispatch_inner(action, args).await {
            Ok(text) => ActionReply::Success(text),
            Err(e) => {
                warn!(action, kind = e.kind().label(), error = %e, "action failed");
                ActionReply::from(e)
            }
        }
    }

    async fn dispatch_inner(&self, action: &str, args: Value) -> Result<String, ActionError> {
        match action {
            "create_bet" => {
                let parsed = parse_args(args)?;
                let _gate = self.write_gate.lock().await;
                create_bet::run(self.wallet.as_ref(), self.contract, &parsed).await
            }
            "join_bet" => {
                let parsed = parse_args(args)?;
                let _gate = self.write_gate.lock().await;
                join_bet::run(self.wallet.as_ref(), self.contract, &parsed).await
            }
            "get_bet_details" => {
                details::run(self.wallet.as_ref(), self.contract, &parse_args(args)?).await
            }
            "register_wallet" => {
                let parsed = parse_args(args)?;
                let mut users = self.users.lock().await;
                wallets::register(&mut users, &parsed)
            }
            "my_wallet" => {
                let parsed = parse_args(args)?;
                let mut users = self.users.lock().await;
                wallets::my_wallet(&mut users, &parsed)
            }
            other => Err(ActionError::validation(
                "action",
                format!("unknown action `{other}`"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        contract::IBettingPool,
        errors::ErrorKind,
        wallet::NetworkDescriptor,
    };
    use alloy::{
        primitives::{Bytes, U256},
        rpc::types::TransactionReceipt,
        sol_types::{SolCall as _, SolValue as _},
    };
    use serde_json::json;
    use std::{
        collections::HashMap,
        sync::Mutex as StdMutex,
    };

    const CONTRACT: Address = Address::repeat_byte(0xbb);

    fn dummy_receipt() -> eyre::Result<TransactionReceipt> {
        let zeros_bloom = format!("0x{}", "0".repeat(512));
        let hash = format!("0x{}", "11".repeat(32));
        let block = format!("0x{}", "22".repeat(32));
        let r = serde_json::from_value(json!({
            "transactionHash": hash,
            "transactionIndex": "0x0",
            "blockHash": block,
            "blockNumber": "0x1",
            "from": "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
            "to": format!("{CONTRACT}"),
            "cumulativeGasUsed": "0x5208",
            "gasUsed": "0x5208",
            "effectiveGasPrice": "0x3b9aca00",
            "contractAddress": null,
            "logs": [],
            "logsBloom": zeros_bloom,
            "status": "0x1",
            "type": "0x2"
        }))?;
        Ok(r)
    }

    /// Records every wallet invocation so tests can assert exactly what
    /// reached the network layer.
    struct MockWallet {
        network: NetworkDescriptor,
        sent: StdMutex<Vec<TransactionRequest>>,
        reads: StdMutex<Vec<(Address, Bytes)>>,
        read_responses: HashMap<[u8; 4], Vec<u8>>,
        fail_reads: bool,
    }

    impl MockWallet {
        fn new() -> Self {
            Self {
                network: NetworkDescriptor::for_chain_id(421_614),
                sent: StdMutex::new(Vec::new()),
                reads: StdMutex::new(Vec::new()),
                read_responses: HashMap::new(),
                fail_reads: false,
            }
        }

        fn sent_txs(&self) -> Vec<TransactionRequest> {
            self.sent.lock().map_or_else(|_| Vec::new(), |g| g.clone())
        }

        fn invocations(&self) -> usize {
            let sent = self.sent.lock().map_or(0, |g| g.len());
            let reads = self.reads.lock().map_or(0, |g| g.len());
            sent + reads
        }
    }

    #[async_trait::async_trait]
    impl WalletProvider for MockWallet {
        fn address(&self) -> Address {
            Address::repeat_byte(0xaa)
        }

        fn network(&self) -> &NetworkDescriptor {
            &self.network
        }

        async fn balance(&self) -> eyre::Result<U256> {
            Ok(U256::ZERO)
        }

        async fn native_transfer(&self, _to: Address, _eth: &str) -> eyre::Result<B256> {
            eyre::bail!("not exercised")
        }

        fn sign_message(&self, _m: &[u8]) -> eyre::Result<alloy::primitives::Signature> {
            eyre::bail!("not exercised")
        }

        fn sign_typed_data(
            &self,
            _t: &alloy::dyn_abi::TypedData,
        ) -> eyre::Result<alloy::primitives::Signature> {
            eyre::bail!("not exercised")
        }

        fn sign_transaction(&self, _tx: TransactionRequest) -> eyre::Result<Vec<u8>> {
            eyre::bail!("not exercised")
        }

        async fn send_transaction(&self, tx: TransactionRequest) -> eyre::Result<B256> {
            if let Ok(mut g) = self.sent.lock() {
                g.push(tx);
            }
            Ok(B256::repeat_byte(0x11))
        }

        async fn wait_for_receipt(&self, _hash: B256) -> eyre::Result<TransactionReceipt> {
            dummy_receipt()
        }

        async fn call(&self, to: Address, data: Bytes) -> eyre::Result<Bytes> {
            if let Ok(mut g) = self.reads.lock() {
                g.push((to, data.clone()));
            }
            if self.fail_reads {
                eyre::bail!("execution reverted");
            }
            let selector: [u8; 4] = data
                .get(..4)
                .and_then(|s| s.try_into().ok())
                .ok_or_else(|| eyre::eyre!("calldata too short"))?;
            let body = self
                .read_responses
                .get(&selector)
                .ok_or_else(|| eyre::eyre!("no canned response for selector"))?;
            Ok(Bytes::from(body.clone()))
        }
    }

    fn dispatcher_with(mock: MockWallet) -> eyre::Result<(Dispatcher, Arc<MockWallet>, tempfile::TempDir)> {
        let dir = tempfile::tempdir()?;
        let users = UserWalletStore::load_or_default(dir.path().join("user-wallets.json"))?;
        let wallet = Arc::new(mock);
        let d = Dispatcher::new(Arc::clone(&wallet) as Arc<dyn WalletProvider>, CONTRACT, users);
        Ok((d, wallet, dir))
    }

    #[tokio::test]
    async fn create_bet_encodes_args_unchanged() -> eyre::Result<()> {
        let (d, wallet, _dir) = dispatcher_with(MockWallet::new())?;

        let reply = d
            .dispatch(
                "create_bet",
                json!({ "event_name": "World Cup Final", "deadline": 1_900_000_000_u64, "options": [1, 2, 3] }),
            )
            .await;
        assert!(reply.is_success(), "got: {}", reply.render());
        let rendered = reply.render();
        assert!(rendered.contains("World Cup Final"), "got: {rendered}");
        assert!(rendered.contains("0x1111"), "missing tx hash: {rendered}");

        let sent = wallet.sent_txs();
        assert_eq!(sent.len(), 1, "exactly one transaction expected");
        let input = sent[0].input.input().cloned().unwrap_or_default();
        let decoded = IBettingPool::createBetCall::abi_decode(&input)?;
        assert_eq!(decoded.eventName, "World Cup Final");
        assert_eq!(decoded.deadline, U256::from(1_900_000_000_u64));
        assert_eq!(
            decoded.options,
            vec![U256::from(1_u64), U256::from(2_u64), U256::from(3_u64)]
        );
        assert_eq!(sent[0].value.unwrap_or_default(), U256::ZERO);
        Ok(())
    }

    #[tokio::test]
    async fn join_bet_value_equals_amount_verbatim() -> eyre::Result<()> {
        let (d, wallet, _dir) = dispatcher_with(MockWallet::new())?;

        let reply = d
            .dispatch(
                "join_bet",
                json!({ "bet_id": 7, "option": 2, "amount": "1000000000000000000" }),
            )
            .await;
        assert!(reply.is_success(), "got: {}", reply.render());

        let sent = wallet.sent_txs();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].value.unwrap_or_default(),
            U256::from(1_000_000_000_000_000_000_u64),
            "amount must reach the transaction without conversion"
        );
        let input = sent[0].input.input().cloned().unwrap_or_default();
        let decoded = IBettingPool::joinBetCall::abi_decode(&input)?;
        assert_eq!(decoded.betId, U256::from(7_u64));
        assert_eq!(decoded.option, U256::from(2_u64));
        Ok(())
    }

    #[tokio::test]
    async fn empty_options_fail_before_any_network_call() -> eyre::Result<()> {
        let (d, wallet, _dir) = dispatcher_with(MockWallet::new())?;

        let reply = d
            .dispatch(
                "create_bet",
                json!({ "event_name": "x", "deadline": 1_900_000_000_u64, "options": [] }),
            )
            .await;
        match reply {
            ActionReply::Failure { kind, .. } => assert_eq!(kind, ErrorKind::Validation),
            ActionReply::Success(s) => eyre::bail!("expected failure, got: {s}"),
        }
        assert_eq!(wallet.invocations(), 0, "network layer must see nothing");
        Ok(())
    }

    fn canned_pool_responses(resolved: bool) -> HashMap<[u8; 4], Vec<u8>> {
        HashMap::from([
            (
                IBettingPool::getBetEventNameCall::SELECTOR,
                "World Cup Final".to_owned().abi_encode(),
            ),
            (
                IBettingPool::getBetDeadlineCall::SELECTOR,
                U256::from(1_900_000_000_u64).abi_encode(),
            ),
            (
                IBettingPool::getBetOptionsCall::SELECTOR,
                vec![U256::from(1_u64), U256::from(2_u64)].abi_encode(),
            ),
            (
                IBettingPool::getBetOrganizerCall::SELECTOR,
                Address::repeat_byte(0xab).abi_encode(),
            ),
            (
                IBettingPool::getBetTotalPoolCall::SELECTOR,
                U256::from(1_500_000_000_000_000_000_u64).abi_encode(),
            ),
            (
                IBettingPool::getBetResolvedCall::SELECTOR,
                resolved.abi_encode(),
            ),
            (
                IBettingPool::getBetWinningOptionCall::SELECTOR,
                U256::from(2_u64).abi_encode(),
            ),
        ])
    }

    #[tokio::test]
    async fn details_reads_all_seven_fields() -> eyre::Result<()> {
        let mut mock = MockWallet::new();
        mock.read_responses = canned_pool_responses(false);
        let (d, wallet, _dir) = dispatcher_with(mock)?;

        let reply = d.dispatch("get_bet_details", json!({ "bet_id": 3 })).await;
        assert!(reply.is_success(), "got: {}", reply.render());
        let rendered = reply.render();
        assert!(rendered.contains("Bet #3: World Cup Final"), "got: {rendered}");
        assert!(rendered.contains("Total pool: 1.5 ETH"), "got: {rendered}");
        assert!(rendered.contains("Resolved: No"), "got: {rendered}");
        assert!(!rendered.contains("Winner option"), "got: {rendered}");

        assert_eq!(wallet.invocations(), 7, "one read per declared field");
        Ok(())
    }

    #[tokio::test]
    async fn one_failed_read_fails_the_whole_query() -> eyre::Result<()> {
        let mut mock = MockWallet::new();
        mock.fail_reads = true;
        let (d, _wallet, _dir) = dispatcher_with(mock)?;

        let reply = d.dispatch("get_bet_details", json!({ "bet_id": 3 })).await;
        match reply {
            ActionReply::Failure { kind, .. } => assert_eq!(kind, ErrorKind::Read),
            ActionReply::Success(s) => eyre::bail!("expected failure, got: {s}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn register_then_lookup_wallet() -> eyre::Result<()> {
        let (d, _wallet, _dir) = dispatcher_with(MockWallet::new())?;

        let reply = d
            .dispatch(
                "register_wallet",
                json!({
                    "user_id": "u1",
                    "username": "alice",
                    "wallet_address": "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
                }),
            )
            .await;
        assert!(reply.is_success(), "got: {}", reply.render());

        let reply = d.dispatch("my_wallet", json!({ "user_id": "u1" })).await;
        let rendered = reply.render();
        assert!(
            rendered.contains("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"),
            "got: {rendered}"
        );
        Ok(())
    }

    #[tokio::test]
    async fn unknown_action_is_a_validation_failure() -> eyre::Result<()> {
        let (d, _wallet, _dir) = dispatcher_with(MockWallet::new())?;
        let reply = d.dispatch("steal_funds", json!({})).await;
        match reply {
            ActionReply::Failure { kind, message } => {
                assert_eq!(kind, ErrorKind::Validation);
                assert!(message.contains("steal_funds"), "got: {message}");
            }
            ActionReply::Success(s) => eyre::bail!("expected failure, got: {s}"),
        }
        Ok(())
    }
}
