//! Token cost estimation against a static price table.
//!
//! All arithmetic uses `rust_decimal::Decimal`; results are rounded to six
//! places with `RoundingStrategy::MidpointNearestEven`. No `f64` anywhere in
//! the pricing path.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::CostError;

/// Decimal places kept in a cost estimate.
pub const COST_SCALE: u32 = 6;

/// Per-token prices for one model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelPrice {
    /// Price of one input (prompt) token.
    pub input: Decimal,
    /// Price of one output (completion) token.
    pub output: Decimal,
}

/// Price per 1000 tokens, stored as (mantissa, scale) pairs.
///
/// `(3, 2)` is 0.03.
const PRICE_TABLE: &[(&str, (i64, u32), (i64, u32))] = &[("gpt-4", (3, 2), (6, 2))];

/// Look up the per-token price pair for `model`.
pub fn model_price(model: &str) -> Option<ModelPrice> {
    let thousand = Decimal::from(1000);
    PRICE_TABLE
        .iter()
        .find(|(name, _, _)| *name == model)
        .map(|(_, (in_m, in_s), (out_m, out_s))| ModelPrice {
            input: Decimal::new(*in_m, *in_s) / thousand,
            output: Decimal::new(*out_m, *out_s) / thousand,
        })
}

/// Names of every priced model.
pub fn known_models() -> impl Iterator<Item = &'static str> {
    PRICE_TABLE.iter().map(|(name, _, _)| *name)
}

/// Compute `round(input * price_in + output * price_out, 6)` for a priced model.
///
/// Returns `Err(CostError::UnknownModel)` when `model` is not in the table.
pub fn calculate_cost(
    model: &str,
    input_tokens: u64,
    output_tokens: u64,
) -> Result<Decimal, CostError> {
    let price = model_price(model).ok_or_else(|| CostError::UnknownModel {
        model: model.to_string(),
    })?;

    let overflow = || CostError::Overflow {
        model: model.to_string(),
    };
    let input_cost = Decimal::from(input_tokens)
        .checked_mul(price.input)
        .ok_or_else(overflow)?;
    let output_cost = Decimal::from(output_tokens)
        .checked_mul(price.output)
        .ok_or_else(overflow)?;
    let total = input_cost.checked_add(output_cost).ok_or_else(overflow)?;

    Ok(total
        .round_dp_with_strategy(COST_SCALE, RoundingStrategy::MidpointNearestEven)
        .normalize())
}

/// Lenient variant of [`calculate_cost`]: an unpriced model costs zero.
pub fn estimate_cost(model: &str, input_tokens: u64, output_tokens: u64) -> Decimal {
    match calculate_cost(model, input_tokens, output_tokens) {
        Ok(cost) => cost,
        Err(e) => {
            tracing::warn!(model, error = %e, "cost estimate falling back to zero");
            Decimal::ZERO
        }
    }
}
