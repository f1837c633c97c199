use crate::{
    amount,
    contract::{self, PoolDetails},
    errors::ActionError,
    render,
    wallet::WalletProvider,
};
use alloy::primitives::{Address, U256};
use serde::Deserialize;
use std::fmt::Write as _;

#[derive(Debug, Deserialize)]
pub struct BetDetailsArgs {
    pub bet_id: u64,
}

/// Pure formatting of an already-fetched pool; kept separate from the reads
/// so the same tuple always renders to the same string.
fn format_details(pool: &PoolDetails) -> String {
    let options = pool
        .options
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");

    let mut out = String::new();
    let _ = writeln!(out, "Bet #{}: {}", pool.bet_id, pool.event_name);
    let _ = writeln!(out, "Deadline: {}", render::fmt_deadline(pool.deadline));
    let _ = writeln!(out, "Options: {options}");
    let _ = writeln!(out, "Organizer: {}", pool.organizer);
    let _ = writeln!(
        out,
        "Total pool: {} ETH",
        amount::format_wei_to_eth(pool.total_pool)
    );
    let _ = write!(out, "Resolved: {}", render::yes_no(pool.resolved));
    if pool.resolved {
        let _ = write!(out, "\nWinner option: {}", pool.winning_option);
    }
    out
}

pub async fn run(
    wallet: &dyn WalletProvider,
    contract_addr: Address,
    args: &BetDetailsArgs,
) -> Result<String, ActionError> {
    if args.bet_id == 0 {
        return Err(ActionError::validation("bet_id", "pool ids start at 1"));
    }

    let pool = contract::read_pool_details(wallet, contract_addr, U256::from(args.bet_id))
        .await
        .map_err(|e| ActionError::Read(format!("{e:#}")))?;

    Ok(format_details(&pool))
}
