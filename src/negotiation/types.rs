//! Negotiation types and state machine

use super::offer::Offer;
use crate::error::{NegotiationError, Result};
use crate::types::Party;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Zone of possible agreement: `[reservation_price, max_budget]`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Zopa {
    pub reservation_price: f64,
    pub max_budget: f64,
}

impl Zopa {
    pub fn new(reservation_price: f64, max_budget: f64) -> Self {
        Self {
            reservation_price,
            max_budget,
        }
    }

    /// A mutually acceptable price exists
    pub fn is_feasible(&self) -> bool {
        self.reservation_price <= self.max_budget
    }

    /// Fail with `InfeasibleZone` if no price satisfies both parties
    pub fn ensure_feasible(&self) -> Result<()> {
        if self.is_feasible() {
            Ok(())
        } else {
            Err(NegotiationError::InfeasibleZone {
                reservation_price: self.reservation_price,
                max_budget: self.max_budget,
            })
        }
    }

    pub fn contains(&self, price: f64) -> bool {
        price >= self.reservation_price && price <= self.max_budget
    }

    /// Clamp a price into the zone. Only meaningful when feasible.
    pub fn clamp(&self, price: f64) -> f64 {
        price.max(self.reservation_price).min(self.max_budget)
    }
}

/// One recorded offer
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub round: u32,
    pub party: Party,
    pub offer: Offer,
}

/// A single point of the convergence path, for charting
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PricePoint {
    pub round: u32,
    pub party: Party,
    pub price: f64,
}

/// Negotiation state machine
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum NegotiationState {
    /// Constraints not yet checked
    Init,
    /// Buyer and seller are exchanging offers
    Negotiating { round: u32 },
    /// Round complete, checking for deadlock
    StalemateCheck { round: u32 },
    /// Mediator is preparing a compromise
    Mediating { round: u32 },
    /// Both parties settled on a price
    Agreed { price: f64, mediated: bool },
    /// Mediation failed or proposed a price outside the zone
    StalemateUnresolved,
    /// Round budget exhausted without agreement
    RoundLimitExceeded,
    /// `reservation_price > max_budget`; no rounds were run
    Infeasible,
}

impl NegotiationState {
    /// Check if negotiation is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            NegotiationState::Agreed { .. }
                | NegotiationState::StalemateUnresolved
                | NegotiationState::RoundLimitExceeded
                | NegotiationState::Infeasible
        )
    }

    /// Check if negotiation is active
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Session outcome, once terminal
    pub fn outcome(&self) -> Option<Outcome> {
        match self {
            NegotiationState::Agreed { .. } => Some(Outcome::Success),
            NegotiationState::StalemateUnresolved => Some(Outcome::StalemateUnresolved),
            NegotiationState::RoundLimitExceeded | NegotiationState::Infeasible => {
                Some(Outcome::NoAgreement)
            }
            _ => None,
        }
    }
}

/// Agreement status reported for a finished session
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Success,
    StalemateUnresolved,
    NoAgreement,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Outcome::Success => "SUCCESS",
            Outcome::StalemateUnresolved => "STALEMATE_UNRESOLVED",
            Outcome::NoAgreement => "NO_AGREEMENT",
        };
        write!(f, "{}", label)
    }
}

/// Derived summary of a finished session
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionResult {
    pub outcome: Outcome,
    pub final_price: Option<f64>,
    pub quantity: u32,
    pub total_cost: Option<f64>,
    pub rounds: u32,
    pub mediation_used: bool,
    pub state: NegotiationState,
}

impl SessionResult {
    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }

    /// Post-hoc validity check of the agreed price. `None` without agreement.
    pub fn pareto_analysis(&self, zopa: &Zopa) -> Option<ParetoAnalysis> {
        let price = self.final_price?;
        let quantity = f64::from(self.quantity);

        let buyer_constraint_met = price <= zopa.max_budget;
        let seller_constraint_met = price >= zopa.reservation_price;
        let within_zopa = zopa.contains(price);

        Some(ParetoAnalysis {
            within_zopa,
            buyer_constraint_met,
            seller_constraint_met,
            buyer_surplus: (zopa.max_budget - price) * quantity,
            seller_surplus: (price - zopa.reservation_price) * quantity,
            is_pareto_optimal: self.is_success()
                && within_zopa
                && buyer_constraint_met
                && seller_constraint_met,
        })
    }
}

/// Surplus split and constraint checks for an agreed price
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ParetoAnalysis {
    pub within_zopa: bool,
    pub buyer_constraint_met: bool,
    pub seller_constraint_met: bool,
    /// `(max_budget - price) * quantity`
    pub buyer_surplus: f64,
    /// `(price - reservation_price) * quantity`
    pub seller_surplus: f64,
    pub is_pareto_optimal: bool,
}
