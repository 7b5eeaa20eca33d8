//! Negotiation session state and reporting

use crate::config::NegotiationConfig;
use crate::error::{NegotiationError, Result};
use crate::types::Party;
use serde::Serialize;

use super::offer::Offer;
use super::tracker::HistoryTracker;
use super::types::{
    HistoryEntry, NegotiationState, Outcome, ParetoAnalysis, PricePoint, SessionResult, Zopa,
};

/// One buyer/seller negotiation, owned by the engine while it runs
#[derive(Clone, Debug)]
pub struct NegotiationSession {
    zopa: Zopa,
    quantity: u32,
    state: NegotiationState,
    tracker: HistoryTracker,
    mediation_used: bool,
}

impl NegotiationSession {
    pub fn new(zopa: Zopa, quantity: u32, config: &NegotiationConfig) -> Self {
        Self {
            zopa,
            quantity,
            state: NegotiationState::Init,
            tracker: HistoryTracker::new(config),
            mediation_used: false,
        }
    }

    /// Get ZOPA bounds
    pub fn zopa(&self) -> &Zopa {
        &self.zopa
    }

    /// Get negotiated quantity
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Get current state
    pub fn state(&self) -> &NegotiationState {
        &self.state
    }

    /// Get the offer tracker
    pub fn tracker(&self) -> &HistoryTracker {
        &self.tracker
    }

    /// Get all recorded offers
    pub fn history(&self) -> &[HistoryEntry] {
        self.tracker.history()
    }

    /// Update state
    pub fn set_state(&mut self, state: NegotiationState) -> Result<()> {
        if self.state.is_terminal() {
            return Err(NegotiationError::InvalidStateTransition(format!(
                "Cannot leave terminal state {:?}",
                self.state
            )));
        }

        self.state = state;
        Ok(())
    }

    /// Record an offer in the session history
    pub fn record_offer(&mut self, party: Party, offer: Offer) -> Result<u32> {
        if self.state.is_terminal() {
            return Err(NegotiationError::InvalidStateTransition(
                "Cannot add offer to terminal state".to_string(),
            ));
        }

        let round = self.tracker.add_offer(party, offer)?;
        if party == Party::Mediator {
            self.mediation_used = true;
        }
        Ok(round)
    }

    /// Check if negotiation has reached a terminal state
    pub fn is_complete(&self) -> bool {
        self.state.is_terminal()
    }

    /// Summary of a finished session; `None` while still running
    pub fn result(&self) -> Option<SessionResult> {
        let outcome = self.state.outcome()?;
        let final_price = match self.state {
            NegotiationState::Agreed { price, .. } => Some(price),
            _ => None,
        };

        Some(SessionResult {
            outcome,
            final_price,
            quantity: self.quantity,
            total_cost: final_price.map(|p| p * f64::from(self.quantity)),
            rounds: self.tracker.rounds(),
            mediation_used: self.mediation_used,
            state: self.state.clone(),
        })
    }

    /// Everything a reporting or charting collaborator needs
    pub fn report(&self) -> Result<SessionReport> {
        let result = self.result().ok_or_else(|| {
            NegotiationError::InvalidStateTransition(format!(
                "Session still active in state {:?}",
                self.state
            ))
        })?;

        Ok(SessionReport {
            pareto: result.pareto_analysis(&self.zopa),
            result,
            zopa: self.zopa,
            history: self.tracker.history().to_vec(),
            transcript_hash: self.tracker.transcript_hash()?.to_hex(),
        })
    }
}

/// Final session data handed to downstream collaborators
#[derive(Clone, Debug, Serialize)]
pub struct SessionReport {
    pub result: SessionResult,
    pub zopa: Zopa,
    pub pareto: Option<ParetoAnalysis>,
    pub history: Vec<HistoryEntry>,
    pub transcript_hash: String,
}

impl SessionReport {
    pub fn outcome(&self) -> Outcome {
        self.result.outcome
    }

    /// Price per round and sender, for visualization
    pub fn convergence_data(&self) -> Vec<PricePoint> {
        self.history
            .iter()
            .map(|e| PricePoint {
                round: e.round,
                party: e.party,
                price: e.offer.offer_price(),
            })
            .collect()
    }
}
