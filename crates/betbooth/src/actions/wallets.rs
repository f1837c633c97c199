use crate::{errors::ActionError, users::UserWalletStore};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct RegisterWalletArgs {
    pub user_id: String,
    pub username: String,
    pub wallet_address: String,
}

#[derive(Debug, Deserialize)]
pub struct MyWalletArgs {
    pub user_id: String,
}

pub fn register(
    users: &mut UserWalletStore,
    args: &RegisterWalletArgs,
) -> Result<String, ActionError> {
    if args.user_id.trim().is_empty() {
        return Err(ActionError::validation("user_id", "must not be empty"));
    }
    if args.username.trim().is_empty() {
        return Err(ActionError::validation("username", "must not be empty"));
    }
    let entry = users
        .register(args.user_id.trim(), args.username.trim(), &args.wallet_address)
        .map_err(|e| ActionError::validation("wallet_address", format!("{e:#}")))?;

    info!(user_id = %entry.user_id, "wallet registered");
    Ok(format!(
        "Registered wallet {} for {}.",
        entry.wallet_address, entry.username
    ))
}

pub fn my_wallet(users: &mut UserWalletStore, args: &MyWalletArgs) -> Result<String, ActionError> {
    let user_id = args.user_id.trim();
    let Some(entry) = users.get(user_id).cloned() else {
        return Err(ActionError::validation(
            "user_id",
            "no wallet registered for this user",
        ));
    };
    users
        .touch(user_id)
        .map_err(|e| ActionError::Configuration(format!("{e:#}")))?;

    Ok(format!(
        "{}'s wallet: {}",
        entry.username, entry.wallet_address
    ))
}
