use crate::wallet::WalletProvider;
use alloy::{
    primitives::{Address, Bytes, U256},
    sol,
    sol_types::SolCall,
};
use eyre::Context as _;

sol! {
    /// Pool registry surface. The signatures here are a hard boundary: call
    /// data must match the deployed contract byte for byte.
    interface IBettingPool {
        function createBet(string eventName, uint256 deadline, uint256[] options) external returns (uint256);
        function joinBet(uint256 betId, uint256 option) external payable;

        function getBetEventName(uint256 betId) external view returns (string);
        function getBetDeadline(uint256 betId) external view returns (uint256);
        function getBetOptions(uint256 betId) external view returns (uint256[]);
        function getBetOrganizer(uint256 betId) external view returns (address);
        function getBetTotalPool(uint256 betId) external view returns (uint256);
        function getBetResolved(uint256 betId) external view returns (bool);
        function getBetWinningOption(uint256 betId) external view returns (uint256);
    }
}

pub fn encode_create_bet(event_name: &str, deadline: U256, options: Vec<U256>) -> Bytes {
    IBettingPool::createBetCall {
        eventName: event_name.to_owned(),
        deadline,
        options,
    }
    .abi_encode()
    .into()
}

pub fn encode_join_bet(bet_id: U256, option: U256) -> Bytes {
    IBettingPool::joinBetCall {
        betId: bet_id,
        option,
    }
    .abi_encode()
    .into()
}

/// The full read tuple for one pool, as fetched from chain state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolDetails {
    pub bet_id: U256,
    pub event_name: String,
    pub deadline: U256,
    pub options: Vec<U256>,
    pub organizer: Address,
    pub total_pool: U256,
    pub resolved: bool,
    pub winning_option: U256,
}

async fn read<C: SolCall>(
    wallet: &dyn WalletProvider,
    contract: Address,
    call: C,
) -> eyre::Result<C::Return> {
    let out = wallet.call(contract, call.abi_encode().into()).await?;
    C::abi_decode_returns(&out).with_context(|| format!("decode {} return", C::SIGNATURE))
}

/// Fetch every field of one pool with concurrently-issued reads joined
/// all-or-nothing: if any single read fails, the whole query fails rather
/// than returning a partial pool.
pub async fn read_pool_details(
    wallet: &dyn WalletProvider,
    contract: Address,
    bet_id: U256,
) -> eyre::Result<PoolDetails> {
    let (event_name, deadline, options, organizer, total_pool, resolved, winning_option) = tokio::try_join!(
        read(wallet, contract, IBettingPool::getBetEventNameCall { betId: bet_id }),
        read(wallet, contract, IBettingPool::getBetDeadlineCall { betId: bet_id }),
        read(wallet, contract, IBettingPool::getBetOptionsCall { betId: bet_id }),
        read(wallet, contract, IBettingPool::getBetOrganizerCall { betId: bet_id }),
        read(wallet, contract, IBettingPool::getBetTotalPoolCall { betId: bet_id }),
        read(wallet, contract, IBettingPool::getBetResolvedCall { betId: bet_id }),
        read(wallet, contract, IBettingPool::getBetWinningOptionCall { betId: bet_id }),
    )?;

    Ok(PoolDetails {
        bet_id,
        event_name,
        deadline,
        options,
        organizer,
        total_pool,
        resolved,
        winning_option,
    })
}
