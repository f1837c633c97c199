use serde_json::{json, Value};

fn pool_action_schemas() -> Vec<Value> {
    vec![
        json!({ "name": "create_bet", "description": "Create a new betting pool on-chain. Submits a transaction and waits for confirmation.", "inputSchema": {
          "type": "object",
          "properties": {
            "event_name": { "type": "string", "minLength": 1, "description": "Human-readable event the pool is about." },
            "deadline": { "type": "integer", "minimum": 1, "description": "Unix timestamp (seconds) after which joining closes." },
            "options": { "type": "array", "items": { "type": "integer" }, "minItems": 1, "description": "Ordered numeric options participants can back." }
          },
          "required": ["event_name", "deadline", "options"],
          "additionalProperties": false
        }}),
        json!({ "name": "join_bet", "description": "Stake on an option of an existing pool. The amount is in wei and becomes the transaction value.", "inputSchema": {
          "type": "object",
          "properties": {
            "bet_id": { "type": "integer", "minimum": 1 },
            "option": { "type": "integer" },
            "amount": { "type": "string", "minLength": 1, "description": "Stake in wei, as a decimal integer string." }
          },
          "required": ["bet_id", "option", "amount"],
          "additionalProperties": false
        }}),
        json!({ "name": "get_bet_details", "description": "Read every field of one pool and return a formatted summary. Read-only, no transaction.", "inputSchema": {
          "type": "object",
          "properties": {
            "bet_id": { "type": "integer", "minimum": 1 }
          },
          "required": ["bet_id"],
          "additionalProperties": false
        }}),
    ]
}

fn user_wallet_schemas() -> Vec<Value> {
    vec![
        json!({ "name": "register_wallet", "description": "Record a chat user's payout wallet address. Replaces any previous registration for that user.", "inputSchema": {
          "type": "object",
          "properties": {
            "user_id": { "type": "string", "minLength": 1 },
            "username": { "type": "string", "minLength": 1 },
            "wallet_address": { "type": "string", "pattern": "^0x[0-9a-fA-F]{40}$" }
          },
          "required": ["user_id", "username", "wallet_address"],
          "additionalProperties": false
        }}),
        json!({ "name": "my_wallet", "description": "Look up the wallet address registered for a chat user.", "inputSchema": {
          "type": "object",
          "properties": {
            "user_id": { "type": "string", "minLength": 1 }
          },
          "required": ["user_id"],
          "additionalProperties": false
        }}),
    ]
}

/// Full action catalog, in the shape agents list before calling.
pub fn list_actions_result() -> Value {
    let mut actions = pool_action_schemas();
    actions.extend(user_wallet_schemas());
    json!({ "actions": actions })
}
