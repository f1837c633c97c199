use crate::{config::BetboothConfig, paths::BetboothPaths, users::UserWalletStore};
use eyre::Context as _;
use serde_json::json;
use std::{fs, path::Path, path::PathBuf};

fn config_toml_path(paths: &BetboothPaths) -> PathBuf {
    paths.config_dir.join("config.toml")
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
}

fn try_parse_config(path: &Path) -> eyre::Result<BetboothConfig> {
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: BetboothConfig = toml::from_str(&s).context("parse config.toml")?;
    Ok(cfg)
}

struct ConfigReport {
    path: PathBuf,
    exists: bool,
    parse_ok: bool,
    error: Option<String>,
    rpc_url: Option<String>,
    chain_id: Option<u64>,
}

/// What `serve` would check before starting.
struct ReadinessReport {
    signing_configured: bool,
    contract_configured: bool,
}

struct UsersReport {
    path: PathBuf,
    exists: bool,
    count: usize,
}

struct DoctorReport {
    version: &'static str,
    paths: BetboothPaths,
    config: ConfigReport,
    readiness: ReadinessReport,
    users: UsersReport,
    env: serde_json::Value,
}

fn collect(paths: &BetboothPaths) -> DoctorReport {
    let config_path = config_toml_path(paths);
    let config_exists = config_path.exists();
    let (parse_ok, error, cfg) = if config_exists {
        match try_parse_config(&config_path) {
            Ok(cfg) => (true, None, Some(cfg)),
            Err(e) => (false, Some(format!("{e:#}")), None),
        }
    } else {
        (false, None, None)
    };

    // Env overrides count as configured even when config.toml is bare.
    let signing_configured = cfg.as_ref().is_some_and(|c| {
        c.signing.private_key.is_some() || c.signing.mnemonic.is_some()
    }) || env_opt("BETBOOTH_PRIVATE_KEY").is_some()
        || env_opt("BETBOOTH_MNEMONIC").is_some();
    let contract_configured = cfg
        .as_ref()
        .is_some_and(|c| c.contract_address.as_deref().is_some_and(|s| !s.trim().is_empty()))
        || env_opt("BETBOOTH_CONTRACT_ADDRESS").is_some();
    let rpc_url = cfg.as_ref().map(|c| c.rpc.rpc_url.clone());
    let chain_id = cfg.as_ref().map(|c| c.rpc.chain_id);

    let users_path = paths.user_wallets_path();
    let users_exists = users_path.exists();
    let users_count = match UserWalletStore::load_or_default(users_path.clone()) {
        Ok(s) => s.len(),
        Err(_) => 0,
    };

    let env = json!({
      "BETBOOTH_CONFIG_DIR": env_opt("BETBOOTH_CONFIG_DIR"),
      "BETBOOTH_DATA_DIR": env_opt("BETBOOTH_DATA_DIR"),
      "BETBOOTH_RPC_URL": env_opt("BETBOOTH_RPC_URL"),
      "BETBOOTH_CONTRACT_ADDRESS": env_opt("BETBOOTH_CONTRACT_ADDRESS"),
      "BETBOOTH_PRIVATE_KEY_set": std::env::var("BETBOOTH_PRIVATE_KEY").is_ok(),
      "BETBOOTH_MNEMONIC_set": std::env::var("BETBOOTH_MNEMONIC").is_ok(),
    });

    DoctorReport {
        version: env!("CARGO_PKG_VERSION"),
        paths: paths.clone(),
        config: ConfigReport {
            path: config_path,
            exists: config_exists,
            parse_ok,
            error,
            rpc_url,
            chain_id,
        },
        readiness: ReadinessReport {
            signing_configured,
            contract_configured,
        },
        users: UsersReport {
            path: users_path,
            exists: users_exists,
            count: users_count,
        },
        env,
    }
}

fn print_json(out: &mut impl std::io::Write, r: &DoctorReport) -> eyre::Result<()> {
    let s = serde_json::to_string_pretty(&json!({
      "ok": true,
      "version": r.version,
      "paths": {
        "config_dir": r.paths.config_dir,
        "data_dir": r.paths.data_dir,
        "log_file": r.paths.log_file,
      },
      "config": {
        "path": r.config.path,
        "exists": r.config.exists,
        "parse_ok": r.config.parse_ok,
        "error": r.config.error,
        "signing_configured": r.readiness.signing_configured,
        "contract_configured": r.readiness.contract_configured,
        "rpc_url": r.config.rpc_url,
        "chain_id": r.config.chain_id,
      },
      "user_wallets": {
        "path": r.users.path,
        "exists": r.users.exists,
        "count": r.users.count,
      },
      "env": r.env,
      "hints": [
        "Serving requires a signing source: set signing.private_key or signing.mnemonic in config.toml (or BETBOOTH_PRIVATE_KEY / BETBOOTH_MNEMONIC).",
        "Serving requires the pool contract address: set contract_address in config.toml (or BETBOOTH_CONTRACT_ADDRESS).",
      ]
    }))
    .context("serialize doctor json")?;
    writeln!(out, "{s}").context("write doctor json")?;
    Ok(())
}

fn print_human(out: &mut impl std::io::Write, r: &DoctorReport) -> eyre::Result<()> {
    writeln!(out, "Betbooth doctor (v{})", r.version).context("write header")?;
    writeln!(out).context("write newline")?;

    writeln!(out, "Paths:").context("write paths header")?;
    writeln!(out, "  config_dir: {}", r.paths.config_dir.display()).context("write paths")?;
    writeln!(out, "  data_dir:   {}", r.paths.data_dir.display()).context("write paths")?;
    writeln!(out, "  log_file:   {}", r.paths.log_file.display()).context("write paths")?;
    writeln!(out).context("write newline")?;

    writeln!(out, "Config:").context("write config header")?;
    writeln!(out, "  config.toml: {}", r.config.path.display()).context("write config")?;
    if !r.config.exists {
        writeln!(out, "  status: missing (will be created on first run)").context("write config")?;
    } else if r.config.parse_ok {
        writeln!(out, "  status: ok").context("write config")?;
    } else {
        writeln!(out, "  status: parse failed").context("write config")?;
        if let Some(e) = &r.config.error {
            let first = e.lines().next().unwrap_or("parse error");
            writeln!(out, "  error: {first}").context("write config")?;
        }
    }
    writeln!(out, "  signing_configured:  {}", r.readiness.signing_configured)
        .context("write config")?;
    writeln!(out, "  contract_configured: {}", r.readiness.contract_configured)
        .context("write config")?;
    if let Some(url) = &r.config.rpc_url {
        writeln!(out, "  rpc_url: {url}").context("write config")?;
    }
    if let Some(id) = r.config.chain_id {
        writeln!(out, "  chain_id: {id}").context("write config")?;
    }
    writeln!(out).context("write newline")?;

    writeln!(out, "User wallets:").context("write users header")?;
    writeln!(out, "  file:   {}", r.users.path.display()).context("write users")?;
    writeln!(out, "  exists: {}", r.users.exists).context("write users")?;
    writeln!(out, "  count:  {}", r.users.count).context("write users")?;
    Ok(())
}

pub fn run(as_json: bool) -> eyre::Result<()> {
    let paths = BetboothPaths::discover()?;
    let report = collect(&paths);
    let mut out = std::io::stdout().lock();
    if as_json {
        print_json(&mut out, &report)?;
    } else {
        print_human(&mut out, &report)?;
    }
    Ok(())
}
