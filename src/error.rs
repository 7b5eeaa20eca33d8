//! Error types for Accord

use crate::types::Party;
use thiserror::Error;

/// Main error type for Accord
#[derive(Error, Debug)]
pub enum NegotiationError {
    // Offer schema errors
    #[error("Invalid offer: {0}")]
    InvalidOffer(String),

    #[error("{party} offered {price}, beyond its own bound of {bound}")]
    PriceOutOfBounds { party: Party, price: f64, bound: f64 },

    // Session errors
    #[error("Infeasible zone: reservation price {reservation_price} exceeds max budget {max_budget}")]
    InfeasibleZone {
        reservation_price: f64,
        max_budget: f64,
    },

    #[error("Quantity drift: expected {expected} units, found {found}")]
    QuantityDrift { expected: u32, found: u32 },

    #[error("No {0} offer on record")]
    MissingOffer(Party),

    #[error("Invalid negotiation state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Negotiation timeout: {0}")]
    NegotiationTimeout(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid configuration value: {0}")]
    InvalidConfig(String),

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl NegotiationError {
    /// Errors a caller may recover from by discarding the offending offer
    pub fn is_offer_rejection(&self) -> bool {
        matches!(
            self,
            NegotiationError::InvalidOffer(_) | NegotiationError::PriceOutOfBounds { .. }
        )
    }
}

/// Result type alias for Accord operations
pub type Result<T> = std::result::Result<T, NegotiationError>;
