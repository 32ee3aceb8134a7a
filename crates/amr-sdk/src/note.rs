//! Shareable note strings: `amr-<currency>-<amount>-<netId>-0x<hex preimage>`.
//!
//! Parsing is an exact-grammar validator: split on the delimiter, check
//! every field's type and the fixed payload width. A note either parses
//! completely or fails as `InvalidNoteFormat`; there is no partial success.

use crate::deposit::{Deposit, PREIMAGE_BYTES};
use crate::error::{ClientError, Result};

pub const NOTE_PREFIX: &str = "amr";

/// Exactly three 31-byte secrets, hex-encoded.
const PAYLOAD_HEX_CHARS: usize = 2 * PREIMAGE_BYTES;

#[derive(Clone, Debug)]
pub struct ParsedNote {
    pub currency: String,
    pub amount: String,
    pub net_id: u64,
    pub deposit: Deposit,
}

pub fn serialize_note(deposit: &Deposit, currency: &str, amount: &str, net_id: u64) -> String {
    format!(
        "{}-{}-{}-{}-0x{}",
        NOTE_PREFIX,
        currency,
        amount,
        net_id,
        hex::encode(deposit.preimage())
    )
}

pub fn parse_note(note: &str) -> Result<ParsedNote> {
    let fields: Vec<&str> = note.split('-').collect();
    if fields.len() != 5 {
        return Err(invalid("expected 5 dash-separated fields"));
    }

    if fields[0] != NOTE_PREFIX {
        return Err(invalid("unknown prefix"));
    }

    let currency = fields[1];
    if currency.is_empty() || !currency.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(invalid("currency must be alphanumeric"));
    }

    let amount = fields[2];
    if !is_decimal_amount(amount) {
        return Err(invalid("amount must be a decimal number"));
    }

    let net_id: u64 = fields[3]
        .parse()
        .map_err(|_| invalid("network id must be an integer"))?;

    let payload = fields[4]
        .strip_prefix("0x")
        .ok_or_else(|| invalid("payload must be 0x-prefixed"))?;
    if payload.len() != PAYLOAD_HEX_CHARS {
        return Err(invalid("payload must be exactly 186 hex chars"));
    }
    let preimage = hex::decode(payload).map_err(|_| invalid("payload is not hex"))?;

    let mut withdraw_nullifier = [0u8; 31];
    let mut reward_nullifier = [0u8; 31];
    let mut secret = [0u8; 31];
    withdraw_nullifier.copy_from_slice(&preimage[..31]);
    reward_nullifier.copy_from_slice(&preimage[31..62]);
    secret.copy_from_slice(&preimage[62..]);

    let deposit = Deposit::new(withdraw_nullifier, reward_nullifier, secret)?;

    Ok(ParsedNote {
        currency: currency.to_string(),
        amount: amount.to_string(),
        net_id,
        deposit,
    })
}

/// Digits with at most one decimal point, e.g. `0.1`, `100`.
fn is_decimal_amount(amount: &str) -> bool {
    !amount.is_empty()
        && amount != "."
        && amount.chars().all(|c| c.is_ascii_digit() || c == '.')
        && amount.matches('.').count() <= 1
}

fn invalid(reason: &str) -> ClientError {
    ClientError::InvalidNoteFormat(reason.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let deposit = Deposit::random().unwrap();
        let note = serialize_note(&deposit, "eth", "0.1", 1);

        let parsed = parse_note(&note).unwrap();
        assert_eq!(parsed.currency, "eth");
        assert_eq!(parsed.amount, "0.1");
        assert_eq!(parsed.net_id, 1);
        // the round-trip law the whole protocol depends on
        assert_eq!(parsed.deposit.commitment(), deposit.commitment());
        assert_eq!(
            parsed.deposit.withdraw_nullifier_hash(),
            deposit.withdraw_nullifier_hash()
        );
        assert_eq!(
            parsed.deposit.reward_nullifier_hash(),
            deposit.reward_nullifier_hash()
        );
    }

    #[test]
    fn test_rejects_malformed_notes() {
        let deposit = Deposit::random().unwrap();
        let good = serialize_note(&deposit, "dai", "100", 42);
        assert!(parse_note(&good).is_ok());

        let payload = format!("0x{}", hex::encode(deposit.preimage()));
        let cases = [
            "".to_string(),
            "amr-eth-0.1-1".to_string(),                          // missing payload
            format!("tornado-eth-0.1-1-{}", payload),             // wrong prefix
            format!("amr--0.1-1-{}", payload),                    // empty currency
            format!("amr-eth-1.2.3-1-{}", payload),               // two decimal points
            format!("amr-eth-abc-1-{}", payload),                 // non-decimal amount
            format!("amr-eth-0.1-mainnet-{}", payload),           // non-integer net id
            format!("amr-eth-0.1-1-{}", &payload[..payload.len() - 2]), // short payload
            format!("amr-eth-0.1-1-{}ab", payload),               // long payload
            format!("amr-eth-0.1-1-{}", payload.replace("0x", "")), // missing 0x
            format!("amr-eth-0.1-1-0x{}", "zz".repeat(93)),       // non-hex payload
        ];

        for case in &cases {
            match parse_note(case) {
                Err(ClientError::InvalidNoteFormat(_)) => {}
                other => panic!("expected InvalidNoteFormat for {:?}, got {:?}", case, other.map(|p| p.amount)),
            }
        }
    }

    #[test]
    fn test_payload_is_186_hex_chars() {
        let deposit = Deposit::random().unwrap();
        let note = serialize_note(&deposit, "eth", "1", 5);
        let payload = note.rsplit('-').next().unwrap();
        assert_eq!(payload.len(), 2 + 186);
    }
}
