//! Verbose daemon JSON (`getrawtransaction <txid> 1`, `decoderawtransaction`)
//! to canonical transaction record.

use bitcoin::{Amount, OutPoint, ScriptBuf, Txid};

use crate::error::CoreError;
use crate::types::{Tx, TxInput, TxOutput};

/// Smallest units per coin (8 decimals).
pub const COIN: u64 = 100_000_000;

pub(crate) fn tx_from_json(raw: &serde_json::Value) -> Result<Tx, CoreError> {
    let txid = parse_txid(raw.get("txid"), "txid")?;
    let version = parse_integer_required::<i32, true>(raw.get("version"), "version")?;
    let locktime = parse_integer_required::<u32, false>(raw.get("locktime"), "locktime")?;
    let hex = raw
        .get("hex")
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default()
        .to_owned();

    let vin = raw
        .get("vin")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| CoreError::MalformedPayload("missing vin array".into()))?;
    let vout = raw
        .get("vout")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| CoreError::MalformedPayload("missing vout array".into()))?;

    Ok(Tx {
        hex,
        txid,
        version,
        locktime,
        inputs: parse_vin(vin)?,
        outputs: parse_vout(vout)?,
        confirmations: parse_integer_optional::<u32, false>(raw.get("confirmations"))
            .unwrap_or(0),
        time: parse_integer_optional::<i64, true>(raw.get("time")).unwrap_or(0),
        block_time: parse_integer_optional::<i64, true>(raw.get("blocktime")).unwrap_or(0),
    })
}

fn parse_txid(
    value: Option<&serde_json::Value>,
    field: &str,
) -> Result<Txid, CoreError> {
    let value = value
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| CoreError::MalformedPayload(format!("missing {field}")))?;
    value
        .parse()
        .map_err(|e| CoreError::MalformedPayload(format!("invalid {field}: {e}")))
}

fn parse_integer_required<T, const SIGNED: bool>(
    value: Option<&serde_json::Value>,
    field: &str,
) -> Result<T, CoreError>
where
    T: TryFrom<i64> + TryFrom<u64>,
{
    parse_integer::<T, SIGNED, true>(value, field)?
        .ok_or_else(|| CoreError::MalformedPayload(format!("missing {field}")))
}

pub(crate) fn parse_integer_optional<T, const SIGNED: bool>(
    value: Option<&serde_json::Value>,
) -> Option<T>
where
    T: TryFrom<i64> + TryFrom<u64>,
{
    parse_integer::<T, SIGNED, false>(value, "value")
        .ok()
        .flatten()
}

// `REQUIRED=false` treats missing/null/type-mismatch as `Ok(None)`.
fn parse_integer<T, const SIGNED: bool, const REQUIRED: bool>(
    value: Option<&serde_json::Value>,
    field: &str,
) -> Result<Option<T>, CoreError>
where
    T: TryFrom<i64> + TryFrom<u64>,
{
    let missing_or_none = || {
        if REQUIRED {
            Err(CoreError::MalformedPayload(format!("missing {field}")))
        } else {
            Ok(None)
        }
    };

    let Some(value) = value else {
        return missing_or_none();
    };

    if SIGNED {
        let Some(n) = value.as_i64() else {
            return missing_or_none();
        };
        T::try_from(n)
            .map(Some)
            .map_err(|_| CoreError::MalformedPayload(format!("{field} out of range: {n}")))
    } else {
        let Some(n) = value.as_u64() else {
            return missing_or_none();
        };
        T::try_from(n)
            .map(Some)
            .map_err(|_| CoreError::MalformedPayload(format!("{field} out of range: {n}")))
    }
}

fn parse_vin(vin: &[serde_json::Value]) -> Result<Vec<TxInput>, CoreError> {
    vin.iter()
        .map(|input| {
            let sequence = parse_integer_required::<u32, false>(input.get("sequence"), "sequence")?;

            if let Some(coinbase) = input.get("coinbase") {
                let coinbase = coinbase.as_str().ok_or_else(|| {
                    CoreError::MalformedPayload("coinbase must be a hex string".into())
                })?;
                return Ok(TxInput {
                    coinbase: Some(coinbase.to_owned()),
                    prevout: None,
                    script_sig: ScriptBuf::new(),
                    sequence,
                });
            }

            let prev_txid = parse_txid(input.get("txid"), "vin.txid")?;
            let prev_vout = parse_integer_required::<u32, false>(input.get("vout"), "vin.vout")?;
            let script_sig = match input
                .get("scriptSig")
                .and_then(|s| s.get("hex"))
                .and_then(serde_json::Value::as_str)
            {
                Some(hex_str) => script_from_hex(hex_str, "scriptSig")?,
                None => ScriptBuf::new(),
            };

            Ok(TxInput {
                coinbase: None,
                prevout: Some(OutPoint::new(prev_txid, prev_vout)),
                script_sig,
                sequence,
            })
        })
        .collect()
}

fn parse_vout(vout: &[serde_json::Value]) -> Result<Vec<TxOutput>, CoreError> {
    vout.iter()
        .enumerate()
        .map(|(position, output)| {
            let value = parse_coin_amount(
                output
                    .get("value")
                    .ok_or_else(|| CoreError::MalformedPayload("missing value in vout".into()))?,
            )?;
            let n = parse_integer_optional::<u32, false>(output.get("n"))
                .unwrap_or(position as u32);

            let spk = output
                .get("scriptPubKey")
                .ok_or_else(|| CoreError::MalformedPayload("missing scriptPubKey in vout".into()))?;
            let hex_str = spk
                .get("hex")
                .and_then(serde_json::Value::as_str)
                .ok_or_else(|| CoreError::MalformedPayload("missing hex in scriptPubKey".into()))?;
            let script_pub_key = script_from_hex(hex_str, "scriptPubKey")?;

            Ok(TxOutput {
                value,
                n,
                script_pub_key,
                addresses: parse_addresses(spk),
            })
        })
        .collect()
}

/// Addresses as already resolved by the daemon. Older daemons report an
/// `addresses` array, newer ones a single `address`.
fn parse_addresses(spk: &serde_json::Value) -> Vec<String> {
    if let Some(list) = spk.get("addresses").and_then(serde_json::Value::as_array) {
        return list
            .iter()
            .filter_map(serde_json::Value::as_str)
            .map(str::to_owned)
            .collect();
    }
    spk.get("address")
        .and_then(serde_json::Value::as_str)
        .map(|a| vec![a.to_owned()])
        .unwrap_or_default()
}

fn script_from_hex(hex_str: &str, field: &str) -> Result<ScriptBuf, CoreError> {
    ScriptBuf::from_hex(hex_str)
        .map_err(|e| CoreError::MalformedPayload(format!("invalid {field} hex: {e}")))
}

/// Parse a decimal coin amount reported by the daemon.
///
/// Numbers and numeric strings are both accepted and rounded to the nearest
/// smallest unit.
pub(crate) fn parse_coin_amount(value: &serde_json::Value) -> Result<Amount, CoreError> {
    let coins = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| CoreError::MalformedPayload(format!("invalid coin amount `{value}`")))?;
    amount_from_coins(coins)
}

/// Convert a decimal coin value to an exact smallest-unit amount,
/// rounding to the nearest unit.
pub fn amount_from_coins(coins: f64) -> Result<Amount, CoreError> {
    if !coins.is_finite() || coins < 0.0 {
        return Err(CoreError::MalformedPayload(format!(
            "coin amount out of range: {coins}"
        )));
    }
    let units = (coins * COIN as f64).round();
    if units >= u64::MAX as f64 {
        return Err(CoreError::MalformedPayload(format!(
            "coin amount out of range: {coins}"
        )));
    }
    Ok(Amount::from_sat(units as u64))
}
