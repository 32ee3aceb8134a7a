//! Relayer fee negotiation and decimal amount conversions.
//!
//! All arithmetic is integer arithmetic in base units. The service percent
//! may itself carry decimal places, so it is scaled by 10^places before the
//! division. Gas and refund are native-denominated; for token pools they
//! are converted into the deposited asset's units via its advertised price.

use std::collections::HashMap;

use crate::error::{ClientError, Result};

/// The currency symbol of the native asset.
pub const NATIVE_CURRENCY: &str = "eth";

/// Gas budget modelling one on-chain spend transaction.
pub const SPEND_GAS_BUDGET: u128 = 500_000;

const WEI_PER_GWEI: u128 = 1_000_000_000;

/// Inputs for one fee computation, as advertised by a relayer's status.
#[derive(Clone, Debug)]
pub struct FeeQuote<'a> {
    pub gas_price_fast_gwei: f64,
    pub currency: &'a str,
    /// Human-readable denomination, e.g. "0.1".
    pub amount: &'a str,
    /// Native-asset refund in base units.
    pub refund: u128,
    /// Asset prices in native base units per whole token.
    pub asset_prices: &'a HashMap<String, u128>,
    pub relayer_service_percent: f64,
    pub decimals: u32,
}

/// The fee the relayer requires for this spend, in the deposited asset's
/// base units.
pub fn compute_relayer_fee(quote: &FeeQuote<'_>) -> Result<u128> {
    let total = from_decimals(quote.amount, quote.decimals)?;
    let fee_percent = service_fee(total, quote.relayer_service_percent);
    let expense = gwei_to_wei(quote.gas_price_fast_gwei) * SPEND_GAS_BUDGET;

    if quote.currency == NATIVE_CURRENCY {
        return Ok(expense + fee_percent);
    }

    let price = quote
        .asset_prices
        .get(quote.currency)
        .copied()
        .ok_or_else(|| ClientError::Relayer(format!("no price for {}", quote.currency)))?;
    if price == 0 {
        return Err(ClientError::Relayer(format!(
            "zero price for {}",
            quote.currency
        )));
    }
    let converted = (expense + quote.refund) * 10u128.pow(quote.decimals) / price;
    Ok(converted + fee_percent)
}

/// Reject the spend when the negotiated fee exceeds the deposit itself.
pub fn ensure_affordable(fee: u128, amount_base_units: u128) -> Result<()> {
    if fee > amount_base_units {
        return Err(ClientError::FeeTooHigh {
            fee,
            amount: amount_base_units,
        });
    }
    Ok(())
}

/// `total * percent / 100`, with the percent scaled to an integer first so
/// fractional percents lose nothing.
fn service_fee(total: u128, percent: f64) -> u128 {
    let rendered = format!("{}", percent);
    let places = rendered.split('.').nth(1).map_or(0, |f| f.len() as u32);
    let scale = 10u128.pow(places);
    let scaled_percent = (percent * scale as f64).round() as u128;
    total * scaled_percent / (scale * 100)
}

fn gwei_to_wei(gwei: f64) -> u128 {
    (gwei * WEI_PER_GWEI as f64).round() as u128
}

/// Parse a human-readable decimal amount into base units.
pub fn from_decimals(amount: &str, decimals: u32) -> Result<u128> {
    let amount = amount.trim();
    if amount.is_empty() || amount == "." {
        return Err(invalid_amount(amount, "not a number"));
    }

    let comps: Vec<&str> = amount.split('.').collect();
    if comps.len() > 2 {
        return Err(invalid_amount(amount, "too many decimal points"));
    }

    let whole = if comps[0].is_empty() { "0" } else { comps[0] };
    let mut fraction = comps.get(1).copied().unwrap_or("").to_string();
    if fraction.len() as u32 > decimals {
        return Err(invalid_amount(amount, "too many decimal places"));
    }
    while (fraction.len() as u32) < decimals {
        fraction.push('0');
    }

    let whole: u128 = whole
        .parse()
        .map_err(|_| invalid_amount(amount, "whole part is not a number"))?;
    let fraction: u128 = if fraction.is_empty() {
        0
    } else {
        fraction
            .parse()
            .map_err(|_| invalid_amount(amount, "fractional part is not a number"))?
    };

    let base = 10u128.pow(decimals);
    whole
        .checked_mul(base)
        .and_then(|w| w.checked_add(fraction))
        .ok_or_else(|| invalid_amount(amount, "amount overflows"))
}

/// Render base units as a decimal string, truncated to `fixed` characters
/// when nonzero.
pub fn to_decimals(value: u128, decimals: u32, fixed: usize) -> String {
    let base = 10u128.pow(decimals);
    let whole = value / base;
    let mut fraction = if decimals == 0 {
        String::new()
    } else {
        format!("{:0width$}", value % base, width = decimals as usize)
    };
    while fraction.ends_with('0') {
        fraction.pop();
    }

    let mut rendered = if fraction.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{}", whole, fraction)
    };
    if fixed > 0 {
        rendered.truncate(fixed);
    }
    rendered
}

fn invalid_amount(amount: &str, reason: &str) -> ClientError {
    ClientError::InvalidAmount(format!("{:?}: {}", amount, reason))
}
