use crate::{contract, errors::ActionError, wallet::WalletProvider};
use alloy::{
    network::TransactionBuilder as _,
    primitives::{Address, U256},
    rpc::types::TransactionRequest,
};
use serde::Deserialize;
use tracing::info;

use super::confirm_write;

#[derive(Debug, Deserialize)]
pub struct CreateBetArgs {
    pub event_name: String,
    pub deadline: u64,
    pub options: Vec<u64>,
}

fn validate(args: &CreateBetArgs) -> Result<(), ActionError> {
    if args.event_name.trim().is_empty() {
        return Err(ActionError::validation("event_name", "must not be empty"));
    }
    if args.deadline == 0 {
        return Err(ActionError::validation(
            "deadline",
            "must be a unix timestamp in seconds",
        ));
    }
    if args.options.is_empty() {
        return Err(ActionError::validation("options", "must not be empty"));
    }
    Ok(())
}

pub async fn run(
    wallet: &dyn WalletProvider,
    contract_addr: Address,
    args: &CreateBetArgs,
) -> Result<String, ActionError> {
    validate(args)?;

    let options: Vec<U256> = args.options.iter().copied().map(U256::from).collect();
    let data = contract::encode_create_bet(&args.event_name, U256::from(args.deadline), options);
    let tx = TransactionRequest::default()
        .with_to(contract_addr)
        .with_input(data);

    let hash = confirm_write(wallet, tx).await?;
    info!(%hash, event_name = %args.event_name, "bet created");

    Ok(format!(
        "Bet created for \"{}\". Transaction: {hash}",
        args.event_name.trim()
    ))
}
