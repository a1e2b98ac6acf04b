mod cli;

use bitcoin::hex::{DisplayHex, FromHex};
use bitcoin::{BlockHash, Txid};
use clap::Parser;
use eyre::{eyre, WrapErr};
use serde::Serialize;

use zcore_core::{params_for, BackendConfig, BlockHeight, TxCodec, ZcoreBackend};

use cli::{Command, RpcArgs};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let args = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .init();

    match args.command {
        Command::Unpack { hex, chain } => {
            let codec = TxCodec::new(params_for(&chain));
            let bytes = Vec::<u8>::from_hex(&hex).context("decode packed hex")?;
            let (tx, height) = codec.unpack_tx(&bytes)?;
            print_json(&serde_json::json!({ "height": height, "tx": tx }))
        }
        Command::Address { address, chain } => {
            let codec = TxCodec::new(params_for(&chain));
            let descriptor = codec.address_codec().descriptor_from_address(&address)?;
            print_json(&serde_json::json!({
                "address": address,
                "descriptor": descriptor.to_string(),
            }))
        }
        Command::Descriptor { hex, chain } => {
            let codec = TxCodec::new(params_for(&chain));
            let bytes = Vec::<u8>::from_hex(&hex).context("decode descriptor hex")?;
            let descriptor = zcore_core::AddressDescriptor::from_bytes(bytes);
            let (addresses, unambiguous) =
                codec.address_codec().addresses_from_descriptor(&descriptor)?;
            print_json(&serde_json::json!({
                "addresses": addresses,
                "unambiguous": unambiguous,
            }))
        }
        command => {
            let config = load_config(&args.rpc)?;
            let backend = ZcoreBackend::connect(&config).await.map_err(|err| {
                let message = format_rpc_connect_error(&config.rpc_url, &err.to_string());
                eyre!(message).wrap_err("while attempting to connect to the ZCore daemon")
            })?;
            tracing::info!(network = backend.network(), "connected to ZCore daemon");
            run_online(&backend, command).await
        }
    }
}

async fn run_online(backend: &ZcoreBackend, command: Command) -> eyre::Result<()> {
    match command {
        Command::Info => print_json(&backend.get_chain_info().await?),
        Command::Block { hash, height } => {
            let hash = hash
                .map(|h| h.parse::<BlockHash>())
                .transpose()
                .context("parse block hash")?;
            let block = backend.get_block(hash, BlockHeight(height)).await?;
            print_json(&block)
        }
        Command::Tx { txid } => {
            let txid: Txid = txid.parse().context("parse txid")?;
            print_json(&backend.get_transaction(&txid).await?)
        }
        Command::Pack { txid, height } => {
            let txid: Txid = txid.parse().context("parse txid")?;
            let tx = backend.get_transaction(&txid).await?;
            let packed = backend.pack_transaction(&tx, BlockHeight(height))?;
            print_json(&serde_json::json!({
                "txid": txid,
                "height": height,
                "packed": packed.to_lower_hex_string(),
            }))
        }
        Command::Send { hex } => {
            let txid = backend.send_raw_transaction(&hex).await?;
            print_json(&serde_json::json!({ "txid": txid }))
        }
        Command::ParseBlock { hash } => {
            let hash: BlockHash = hash.parse().context("parse block hash")?;
            let raw = backend.get_block_raw(&hash).await?;
            print_json(&backend.parse_block(&raw)?)
        }
        Command::Fee { blocks } => {
            let fee = backend.estimate_fee(blocks).await?;
            print_json(&serde_json::json!({
                "blocks": blocks,
                "fee_per_kb": fee.map(|amount| amount.to_sat()),
            }))
        }
        Command::Unpack { .. } | Command::Address { .. } | Command::Descriptor { .. } => {
            Err(eyre!("offline command routed to the daemon"))
        }
    }
}

/// Backend config from `--config`, or else from the RPC flags.
fn load_config(args: &RpcArgs) -> eyre::Result<BackendConfig> {
    if let Some(path) = &args.config {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        return Ok(BackendConfig::from_json(&raw)?);
    }

    let mut config = BackendConfig::new(&args.rpc_url);
    config.rpc_user = args.rpc_user.clone();
    config.rpc_pass = args.rpc_pass.clone();
    config.rpc_cookie_file = args.rpc_cookie_file.clone();
    config.rpc_timeout = args.rpc_timeout;
    config.block_fetch_concurrency = args.block_fetch_concurrency;
    config.rpc_requests_per_second = args.rpc_requests_per_second;
    config.disable_estimate_smart_fee = args.disable_estimate_smart_fee;
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> eyre::Result<()> {
    let out = serde_json::to_string_pretty(value).context("serialize output")?;
    println!("{out}");
    Ok(())
}

fn format_rpc_connect_error(rpc_url: &str, source_error: &str) -> String {
    let mut lines = vec![
        format!("could not connect to RPC endpoint `{rpc_url}`"),
        format!("RPC error: {source_error}"),
    ];

    if source_error.contains("dns error") {
        lines.push("hint: hostname resolution failed; verify the daemon hostname".into());
    } else if source_error.contains("HTTP 401") || source_error.contains("HTTP 403") {
        lines.push("hint: authentication failed; verify --rpc-user/--rpc-pass or the cookie file".into());
    } else if source_error.contains("Connection refused")
        || source_error.contains("error sending request for url")
    {
        lines.push(
            "hint: the daemon is not reachable; check that zcored runs with -server and the RPC port"
                .into(),
        );
    } else if source_error.contains("configuration error") {
        lines.push("hint: fix the backend configuration before retrying".into());
    }

    lines.join("\n")
}
