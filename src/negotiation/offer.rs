//! Structured offer messages exchanged between parties
//!
//! The wire form is a single-line JSON object with exactly four keys, in
//! order: `offer_price`, `quantity`, `reasoning`, `is_final_offer`.
//! Unknown keys are ignored; missing or mistyped keys are rejected.

use crate::error::{NegotiationError, Result};
use serde::{Deserialize, Serialize};

/// One party's proposal for a round. Immutable once constructed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawOffer")]
pub struct Offer {
    offer_price: f64,
    quantity: u32,
    reasoning: String,
    is_final_offer: bool,
}

/// Unvalidated wire shape
#[derive(Deserialize)]
struct RawOffer {
    offer_price: f64,
    quantity: u32,
    reasoning: String,
    is_final_offer: bool,
}

impl TryFrom<RawOffer> for Offer {
    type Error = NegotiationError;

    fn try_from(raw: RawOffer) -> Result<Self> {
        Offer::new(raw.offer_price, raw.quantity, raw.reasoning, raw.is_final_offer)
    }
}

impl Offer {
    /// Create a validated offer
    pub fn new(
        offer_price: f64,
        quantity: u32,
        reasoning: impl Into<String>,
        is_final_offer: bool,
    ) -> Result<Self> {
        if !offer_price.is_finite() || offer_price <= 0.0 {
            return Err(NegotiationError::InvalidOffer(format!(
                "offer_price must be positive, got {}",
                offer_price
            )));
        }
        if quantity == 0 {
            return Err(NegotiationError::InvalidOffer(
                "quantity must be positive, got 0".to_string(),
            ));
        }

        Ok(Self {
            offer_price,
            quantity,
            reasoning: reasoning.into(),
            is_final_offer,
        })
    }

    pub fn offer_price(&self) -> f64 {
        self.offer_price
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn reasoning(&self) -> &str {
        &self.reasoning
    }

    pub fn is_final_offer(&self) -> bool {
        self.is_final_offer
    }

    /// Canonical single-line JSON form
    pub fn to_json_str(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse and validate an already-isolated JSON message
    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| NegotiationError::InvalidOffer(e.to_string()))
    }
}
