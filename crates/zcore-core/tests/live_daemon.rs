use std::env;
use std::sync::Once;

use zcore_core::{BackendConfig, BlockHeight, CoreError, ZcoreBackend};

static TRACING_INIT: Once = Once::new();

fn init_tracing() {
    TRACING_INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("zcore_core=debug")),
            )
            .with_target(true)
            .try_init();
    });
}

fn live_config() -> BackendConfig {
    let rpc_url = env::var("ZCORE_TEST_RPC_URL").expect("ZCORE_TEST_RPC_URL must be set");
    let mut config = BackendConfig::new(rpc_url);
    config.rpc_user = env::var("ZCORE_TEST_RPC_USER").ok();
    config.rpc_pass = env::var("ZCORE_TEST_RPC_PASS").ok();
    config.rpc_cookie_file = env::var("ZCORE_TEST_RPC_COOKIE_FILE").ok().map(Into::into);
    config
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires a running zcored with -txindex; set ZCORE_TEST_RPC_URL"]
async fn live_daemon_serves_safe_blocks_that_round_trip() {
    init_tracing();
    let backend = ZcoreBackend::connect(&live_config())
        .await
        .expect("backend must initialize");

    let info = backend.get_chain_info().await.expect("chain info");
    eprintln!("[itest] {} at height {}", info.chain, info.blocks);
    assert!(info.blocks >= 2, "need at least two blocks above genesis");

    let tip = backend.get_best_block_height().await.expect("tip");
    assert!(matches!(
        backend.get_block(None, tip).await,
        Err(CoreError::BlockNotFound)
    ));

    let safe = BlockHeight(tip.0 - 1);
    let block = backend
        .get_block(None, safe)
        .await
        .expect("block one below the tip is safe");
    assert!(!block.txs.is_empty());
    assert!(backend.safe_height() >= safe);

    let raw = backend
        .get_block_raw(&block.header.hash)
        .await
        .expect("raw block");
    let parsed = backend.parse_block(&raw).expect("raw block parses");
    assert_eq!(parsed.txs.len(), block.txs.len());

    for tx in &block.txs {
        let packed = backend.pack_transaction(tx, safe).expect("pack");
        let (unpacked, height) = backend.unpack_transaction(&packed).expect("unpack");
        assert_eq!(height, safe);
        assert_eq!(unpacked.txid, tx.txid);
        assert_eq!(unpacked.hex, tx.hex);
        for (got, want) in unpacked.outputs.iter().zip(&tx.outputs) {
            assert_eq!(got.value, want.value);
            assert_eq!(got.script_pub_key, want.script_pub_key);
        }
    }

    let genesis = backend
        .get_block(None, BlockHeight(0))
        .await
        .expect("genesis");
    assert!(genesis.txs.is_empty());
}
