//! End-to-end decoding against a shard directory on disk
//!
//! Fixtures are ABI-encoded with `sol!` so the expected values are exact.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::{sol, SolError};
use revert_decoder::{
    DecodeError, DecodeResult, DecoderOptions, ErrorDecoder, ResultKind, SqliteShardStore,
};

sol! {
    error InsufficientBalance(address account, uint256 balance, uint256 needed);
    error Unauthorized(string reason, bytes32 role);
    error Paused();
}

fn selector_hex(selector: [u8; 4]) -> String {
    format!("0x{}", hex::encode(selector))
}

/// Write all 256 two-character shards, filling in the given entries
fn write_shards(dir: &Path, entries: &[(String, Vec<&str>)]) {
    let mut shards: std::collections::BTreeMap<String, serde_json::Map<String, serde_json::Value>> =
        (0..=255u8).map(|prefix| (format!("{prefix:02x}"), Default::default())).collect();
    for (selector, signatures) in entries {
        shards
            .entry(selector[2..4].to_string())
            .or_default()
            .insert(selector.clone(), serde_json::json!(signatures));
    }
    for (prefix, shard) in shards {
        fs::write(
            dir.join(format!("{prefix}.json")),
            serde_json::to_string_pretty(&shard).unwrap(),
        )
        .unwrap();
    }
}

fn kinds(results: &[DecodeResult]) -> Vec<ResultKind> {
    results.iter().map(DecodeResult::kind).collect()
}

fn fixture_db() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_shards(
        dir.path(),
        &[
            (
                selector_hex(InsufficientBalance::SELECTOR),
                vec!["Collision(string)", InsufficientBalance::SIGNATURE],
            ),
            (selector_hex(Unauthorized::SELECTOR), vec![Unauthorized::SIGNATURE]),
            (selector_hex(Paused::SELECTOR), vec![Paused::SIGNATURE]),
        ],
    );
    dir
}

#[tokio::test]
async fn test_decode_example_payload() {
    let dir = fixture_db();
    let decoder = ErrorDecoder::new(&DecoderOptions::new(dir.path())).unwrap();

    let data = "0xdb42144d000000000000000000000000d1e13d528123eafe5ae8703c64ef243331040d9d000000000000000000000000000000000000000000000015a8bce1b91eba5e7200000000000000000000000000000000000000000000005f2bb5bf5025c5e226";
    let results = decoder.decode_hex(data).await.unwrap();

    assert_eq!(kinds(&results), vec![ResultKind::Decoded, ResultKind::Matched]);

    let DecodeResult::Decoded { selector, signature, params, data: payload, .. } = &results[0] else {
        panic!("expected decoded result first");
    };
    assert_eq!(selector.to_string(), "0xdb42144d");
    assert_eq!(signature, "InsufficientBalance(address,uint256,uint256)");
    assert_eq!(payload, data);
    assert_eq!(
        params[0].as_address(),
        Some("0xD1E13d528123EAfE5aE8703c64EF243331040D9D".parse::<Address>().unwrap())
    );
    assert_eq!(
        params[1].as_uint().map(|(value, _)| value),
        Some("399540466827094810226".parse::<U256>().unwrap())
    );
    assert_eq!(
        params[2].as_uint().map(|(value, _)| value),
        Some("1755590320867774947878".parse::<U256>().unwrap())
    );

    assert_eq!(results[1].signature(), Some("Collision(string)"));
}

#[tokio::test]
async fn test_decode_dynamic_params() {
    let dir = fixture_db();
    let decoder = ErrorDecoder::new(&DecoderOptions::new(dir.path())).unwrap();

    let role = B256::repeat_byte(0x42);
    let encoded = Unauthorized {
        reason: "caller is not the owner".into(),
        role,
    }
    .abi_encode();

    let results = decoder.decode(&encoded).await.unwrap();
    assert_eq!(kinds(&results), vec![ResultKind::Decoded]);

    let DecodeResult::Decoded { params, .. } = &results[0] else {
        panic!("expected decoded result");
    };
    assert_eq!(params[0].as_str(), Some("caller is not the owner"));
    assert_eq!(params[1].as_fixed_bytes(), Some((role.as_slice(), 32)));

    let json = results[0].to_json();
    assert_eq!(json["type"], "decoded");
    assert_eq!(json["params"][0], "caller is not the owner");
}

#[tokio::test]
async fn test_decode_zero_param_error() {
    let dir = fixture_db();
    let decoder = ErrorDecoder::new(&DecoderOptions::new(dir.path())).unwrap();

    let results = decoder.decode(&Paused {}.abi_encode()).await.unwrap();
    assert_eq!(kinds(&results), vec![ResultKind::Decoded]);
    assert_eq!(results[0].to_string(), "decoded: Paused()");
}

#[tokio::test]
async fn test_unknown_selector_and_fallbacks() {
    let dir = fixture_db();
    let decoder = ErrorDecoder::new(&DecoderOptions::new(dir.path())).unwrap();

    let results = decoder.decode_hex("0xdeadbeef").await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].to_json(), serde_json::json!({
        "type": "unmatched",
        "data": "0xdeadbeef",
        "selector": "0xdeadbeef",
    }));

    let results = decoder.decode_hex("0x").await.unwrap();
    assert_eq!(results[0].to_json(), serde_json::json!({ "type": "empty", "data": "0x" }));

    let results = decoder.decode(b"execution reverted").await.unwrap();
    assert_eq!(kinds(&results), vec![ResultKind::Text]);

    let results = decoder.decode(&[0x00, 0x01]).await.unwrap();
    assert_eq!(kinds(&results), vec![ResultKind::Unparsed]);
}

#[tokio::test]
async fn test_corrupt_shard_propagates() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("de.json"), "[\"not a mapping\"]").unwrap();
    let decoder = ErrorDecoder::new(&DecoderOptions::new(dir.path())).unwrap();

    let result = decoder.decode_hex("0xdeadbeef").await;
    assert!(matches!(result, Err(DecodeError::CorruptShard { .. })));
}

#[tokio::test]
async fn test_missing_database_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let decoder =
        ErrorDecoder::new(&DecoderOptions::new(dir.path().join("does-not-exist"))).unwrap();

    let result = decoder.decode_hex("0xdeadbeef").await;
    assert!(matches!(result, Err(DecodeError::Io { .. })), "got {result:?}");

    // Too short to carry a selector, so no shard is read
    let results = decoder.decode(&[0x00, 0x01]).await.unwrap();
    assert_eq!(kinds(&results), vec![ResultKind::Unparsed]);
}

#[tokio::test]
async fn test_repeated_decodes_are_identical() {
    let dir = fixture_db();
    let mut options = DecoderOptions::new(dir.path());
    options.max_files_in_cache = 1;
    options.max_selectors_in_cache = 1;
    let decoder = ErrorDecoder::new(&options).unwrap();

    let payloads = [
        InsufficientBalance {
            account: Address::repeat_byte(0x11),
            balance: U256::from(1),
            needed: U256::from(2),
        }
        .abi_encode(),
        Paused {}.abi_encode(),
    ];

    let mut first = Vec::new();
    for payload in &payloads {
        first.push(decoder.decode(payload).await.unwrap());
    }
    for _ in 0..3 {
        for (payload, expected) in payloads.iter().zip(&first) {
            assert_eq!(&decoder.decode(payload).await.unwrap(), expected);
        }
    }
    assert!(decoder.resolver().cached_selectors() <= 1);
    assert!(decoder.resolver().signatures().cached_shards() <= 1);
}

#[tokio::test]
async fn test_shared_across_tasks() {
    let dir = fixture_db();
    let decoder = Arc::new(ErrorDecoder::new(&DecoderOptions::new(dir.path())).unwrap());
    let payload = Paused {}.abi_encode();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let decoder = decoder.clone();
        let payload = payload.clone();
        handles.push(tokio::spawn(async move { decoder.decode(&payload).await }));
    }
    for handle in handles {
        let results = handle.await.unwrap().unwrap();
        assert_eq!(kinds(&results), vec![ResultKind::Decoded]);
    }
}

#[tokio::test]
async fn test_sqlite_backend_matches_files() {
    let dir = fixture_db();
    let store = SqliteShardStore::open(&dir.path().join("signatures.sqlite3")).unwrap();
    store.import_dir(dir.path()).unwrap();

    let options = DecoderOptions::new(dir.path());
    let from_files = ErrorDecoder::new(&options).unwrap();
    let from_sqlite = ErrorDecoder::with_store(Arc::new(store), &options).unwrap();

    let payload = Unauthorized {
        reason: "nope".into(),
        role: B256::ZERO,
    }
    .abi_encode();
    assert_eq!(
        from_files.decode(&payload).await.unwrap(),
        from_sqlite.decode(&payload).await.unwrap()
    );
}
