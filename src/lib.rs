//! Accord: mediated bilateral price negotiation
//!
//! A buyer and a seller exchange structured offers round by round until
//! their prices cross, one side's final offer is acceptable, or the round
//! budget runs out. When both sides stall, a mediator proposes a
//! split-the-difference compromise.
//!
//! - [`negotiation::Offer`] is the validated message exchanged each turn
//! - [`negotiation::HistoryTracker`] counts rounds and detects stalemates
//! - [`negotiation::NegotiationEngine`] runs a session to a terminal state

pub mod cli;
pub mod config;
pub mod error;
pub mod negotiation;
pub mod types;

pub use config::AppConfig;
pub use error::{NegotiationError, Result};
pub use negotiation::{NegotiationEngine, Offer, Outcome, SessionReport};
pub use types::Party;
