//! Relayer protocol client.
//!
//! A relayer submits the spend transaction on the user's behalf so the
//! on-chain sender never links to the spender. The exchange is two HTTP
//! round-trips - `GET /status` for fee negotiation, `POST /relay` for
//! submission - followed by receipt polling against the ledger. Failures
//! surface the relayer's structured error payload when one is present and
//! are never retried at this layer.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;

use amr_net::{HttpClient, NetError};

use crate::error::{ClientError, Result};

/// Gas price tiers advertised by a relayer, in gwei.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GasPrices {
    pub fast: f64,
    #[serde(default)]
    pub standard: Option<f64>,
    #[serde(default)]
    pub low: Option<f64>,
}

/// The relayer's network id: a concrete ledger id or the `"*"` wildcard for
/// relayers that serve any network.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RelayerNetId {
    Id(u64),
    Wildcard(String),
}

/// `GET /status` response.
#[derive(Clone, Debug, Deserialize)]
pub struct RelayerStatus {
    #[serde(rename = "relayerAddress")]
    pub relayer_address: String,
    #[serde(rename = "netId")]
    pub net_id: RelayerNetId,
    #[serde(rename = "gasPrices")]
    pub gas_prices: GasPrices,
    /// Asset prices in native base units; relayers send numbers or strings.
    #[serde(rename = "ethPrices", default, deserialize_with = "de_prices")]
    pub eth_prices: HashMap<String, u128>,
    #[serde(rename = "relayerServiceFee")]
    pub relayer_service_fee: f64,
}

impl RelayerStatus {
    /// A relayer is acceptable only for the session's network or as the
    /// documented wildcard. Checked before any proof is generated.
    pub fn ensure_network(&self, local_net_id: u64) -> Result<()> {
        match &self.net_id {
            RelayerNetId::Id(id) if *id == local_net_id => Ok(()),
            RelayerNetId::Wildcard(w) if w == "*" => Ok(()),
            RelayerNetId::Id(id) => Err(ClientError::NetworkMismatch {
                expected: local_net_id,
                actual: id.to_string(),
            }),
            RelayerNetId::Wildcard(w) => Err(ClientError::NetworkMismatch {
                expected: local_net_id,
                actual: w.clone(),
            }),
        }
    }
}

fn de_prices<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<HashMap<String, u128>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u64),
        Str(String),
    }

    let raw: HashMap<String, Raw> = HashMap::deserialize(deserializer)?;
    raw.into_iter()
        .map(|(currency, price)| {
            let price = match price {
                Raw::Num(n) => u128::from(n),
                Raw::Str(s) => s
                    .parse()
                    .map_err(|_| serde::de::Error::custom(format!("invalid price for {currency}")))?,
            };
            Ok((currency, price))
        })
        .collect()
}

#[derive(Serialize)]
struct RelayRequest<'a> {
    contract: &'a str,
    proof: &'a str,
    args: &'a [String],
}

#[derive(Deserialize)]
struct RelayResponse {
    #[serde(rename = "txHash")]
    tx_hash: String,
}

#[derive(Deserialize)]
struct RelayerErrorBody {
    error: String,
}

pub struct RelayerClient {
    http: HttpClient,
    url: String,
}

impl RelayerClient {
    pub fn new(http: HttpClient, url: &str) -> Self {
        Self {
            http,
            url: url.trim_end_matches('/').to_string(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn status(&self) -> Result<RelayerStatus> {
        self.http
            .get_json(&format!("{}/status", self.url))
            .await
            .map_err(surface)
    }

    /// Hand the proof and call arguments to the relayer; returns the hash of
    /// the transaction it submitted.
    pub async fn relay(&self, contract: &str, proof: &str, args: &[String]) -> Result<String> {
        let request = RelayRequest {
            contract,
            proof,
            args,
        };
        let response: RelayResponse = self
            .http
            .post_json(&format!("{}/relay", self.url), &request)
            .await
            .map_err(surface)?;
        info!("relay accepted, tx hash {}", response.tx_hash);
        Ok(response.tx_hash)
    }
}

/// Prefer the relayer's structured error body over the raw transport error.
fn surface(err: NetError) -> ClientError {
    if let NetError::Status { body, .. } = &err {
        if let Ok(payload) = serde_json::from_str::<RelayerErrorBody>(body) {
            return ClientError::Relayer(payload.error);
        }
    }
    ClientError::Network(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_deserializes_wire_format() {
        let raw = r#"{
            "relayerAddress": "0xf84115295E85cb01Ed9DCf8028b55EFD39709C67",
            "netId": 42,
            "gasPrices": { "fast": 21.5, "standard": 10.0 },
            "ethPrices": { "dai": "500000000000000", "usdc": 501000000000000 },
            "relayerServiceFee": 0.05
        }"#;

        let status: RelayerStatus = serde_json::from_str(raw).unwrap();
        assert_eq!(status.net_id, RelayerNetId::Id(42));
        assert_eq!(status.gas_prices.fast, 21.5);
        assert_eq!(status.eth_prices["dai"], 500_000_000_000_000);
        assert_eq!(status.eth_prices["usdc"], 501_000_000_000_000);
        assert!(status.ensure_network(42).is_ok());
    }

    #[test]
    fn test_wildcard_net_id_accepted() {
        let raw = r#"{
            "relayerAddress": "0xf84115295E85cb01Ed9DCf8028b55EFD39709C67",
            "netId": "*",
            "gasPrices": { "fast": 1.0 },
            "relayerServiceFee": 0.0
        }"#;

        let status: RelayerStatus = serde_json::from_str(raw).unwrap();
        assert!(status.ensure_network(1).is_ok());
        assert!(status.ensure_network(1337).is_ok());
    }

    #[test]
    fn test_foreign_net_id_rejected() {
        let raw = r#"{
            "relayerAddress": "0xf84115295E85cb01Ed9DCf8028b55EFD39709C67",
            "netId": 1,
            "gasPrices": { "fast": 1.0 },
            "relayerServiceFee": 0.0
        }"#;

        let status: RelayerStatus = serde_json::from_str(raw).unwrap();
        match status.ensure_network(1337) {
            Err(ClientError::NetworkMismatch { expected, actual }) => {
                assert_eq!(expected, 1337);
                assert_eq!(actual, "1");
            }
            other => panic!("expected NetworkMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_surface_prefers_structured_error() {
        let err = NetError::Status {
            code: 400,
            body: r#"{"error":"Relayer is broke"}"#.to_string(),
        };
        match surface(err) {
            ClientError::Relayer(msg) => assert_eq!(msg, "Relayer is broke"),
            other => panic!("expected Relayer, got {:?}", other),
        }

        let plain = NetError::Status {
            code: 502,
            body: "bad gateway".to_string(),
        };
        assert!(matches!(surface(plain), ClientError::Network(_)));
    }
}
