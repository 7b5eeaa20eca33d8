//! Negotiation protocol: offers, strategies, history, mediation

pub mod engine;
pub mod mediator;
pub mod offer;
pub mod session;
pub mod strategy;
pub mod tracker;
pub mod types;

pub use engine::NegotiationEngine;
pub use mediator::{propose_compromise, MEDIATOR_REASONING};
pub use offer::Offer;
pub use session::{NegotiationSession, SessionReport};
pub use strategy::{BuyerStrategy, SellerStrategy, Strategy};
pub use tracker::HistoryTracker;
pub use types::{
    HistoryEntry, NegotiationState, Outcome, ParetoAnalysis, PricePoint, SessionResult, Zopa,
};
