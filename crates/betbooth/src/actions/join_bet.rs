use crate::{amount, contract, errors::ActionError, wallet::WalletProvider};
use alloy::{
    network::TransactionBuilder as _,
    primitives::{Address, U256},
    rpc::types::TransactionRequest,
};
use serde::Deserialize;
use tracing::info;

use super::confirm_write;

#[derive(Debug, Deserialize)]
pub struct JoinBetArgs {
    pub bet_id: u64,
    pub option: u64,
    pub amount: String,
}

pub async fn run(
    wallet: &dyn WalletProvider,
    contract_addr: Address,
    args: &JoinBetArgs,
) -> Result<String, ActionError> {
    if args.bet_id == 0 {
        return Err(ActionError::validation("bet_id", "pool ids start at 1"));
    }
    // The stake is already in wei; it goes on the transaction verbatim.
    let value = amount::parse_amount_wei(&args.amount)
        .map_err(|e| ActionError::validation("amount", e.to_string()))?;
    if value.is_zero() {
        return Err(ActionError::validation("amount", "stake must be non-zero"));
    }

    let data = contract::encode_join_bet(U256::from(args.bet_id), U256::from(args.option));
    let tx = TransactionRequest::default()
        .with_to(contract_addr)
        .with_input(data)
        .with_value(value);

    let hash = confirm_write(wallet, tx).await?;
    info!(%hash, bet_id = args.bet_id, option = args.option, "bet joined");

    Ok(format!(
        "Joined bet #{} with option {}. Transaction: {hash}",
        args.bet_id, args.option
    ))
}
