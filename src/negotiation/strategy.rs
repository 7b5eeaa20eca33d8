//! Offer-generation strategies for the two principals

use crate::config::{AppConfig, StrategyConfig};
use crate::error::Result;
use crate::types::Party;

use super::offer::Offer;
use super::tracker::last_offer_by;
use super::types::HistoryEntry;

/// Maps negotiation history to a party's next offer.
///
/// Implementations must be deterministic: identical history and round
/// always produce the identical offer.
pub trait Strategy {
    /// Which principal this strategy plays
    fn party(&self) -> Party;

    /// Produce the offer for `round` given everything recorded so far
    fn next_offer(&self, history: &[HistoryEntry], round: u32) -> Result<Offer>;
}

/// Anchors low and climbs toward the seller's ask, never past `max_budget`
#[derive(Clone, Debug)]
pub struct BuyerStrategy {
    max_budget: f64,
    quantity: u32,
    max_rounds: u32,
    params: StrategyConfig,
}

impl BuyerStrategy {
    pub fn new(max_budget: f64, quantity: u32, max_rounds: u32, params: StrategyConfig) -> Self {
        Self {
            max_budget,
            quantity,
            max_rounds,
            params,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.scenario.max_budget,
            config.scenario.quantity,
            config.protocol.max_rounds,
            config.strategy.clone(),
        )
    }
}

impl Strategy for BuyerStrategy {
    fn party(&self) -> Party {
        Party::Buyer
    }

    fn next_offer(&self, history: &[HistoryEntry], round: u32) -> Result<Offer> {
        let own_last = last_offer_by(history, Party::Buyer).map(Offer::offer_price);
        let ask = last_offer_by(history, Party::Seller).map(Offer::offer_price);

        let (price, reasoning) = match (own_last, ask) {
            (None, _) => {
                let discount = self.params.buyer_opening_discount;
                (
                    self.max_budget * (1.0 - discount),
                    format!("Opening offer {:.0}% under budget", discount * 100.0),
                )
            }
            (Some(prev), Some(ask)) if ask > prev => {
                let rate = self.params.concession_rate;
                (
                    (prev + rate * (ask - prev)).min(self.max_budget),
                    format!(
                        "Closing {:.0}% of the gap to the seller's {:.2}",
                        rate * 100.0,
                        ask
                    ),
                )
            }
            (Some(prev), _) => (prev, "Holding at current offer".to_string()),
        };

        let is_final = price >= self.max_budget
            || round >= self.max_rounds
            || converged(price, ask, self.params.convergence_tolerance);

        Offer::new(price, self.quantity, reasoning, is_final)
    }
}

/// Anchors high and descends toward the buyer's bid, never below `reservation_price`
#[derive(Clone, Debug)]
pub struct SellerStrategy {
    reservation_price: f64,
    quantity: u32,
    max_rounds: u32,
    params: StrategyConfig,
}

impl SellerStrategy {
    pub fn new(
        reservation_price: f64,
        quantity: u32,
        max_rounds: u32,
        params: StrategyConfig,
    ) -> Self {
        Self {
            reservation_price,
            quantity,
            max_rounds,
            params,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.scenario.reservation_price,
            config.scenario.quantity,
            config.protocol.max_rounds,
            config.strategy.clone(),
        )
    }
}

impl Strategy for SellerStrategy {
    fn party(&self) -> Party {
        Party::Seller
    }

    fn next_offer(&self, history: &[HistoryEntry], round: u32) -> Result<Offer> {
        let own_last = last_offer_by(history, Party::Seller).map(Offer::offer_price);
        let bid = last_offer_by(history, Party::Buyer).map(Offer::offer_price);

        let (price, reasoning) = match (own_last, bid) {
            (None, _) => {
                let markup = self.params.seller_opening_markup;
                (
                    self.reservation_price * (1.0 + markup),
                    format!("Opening ask {:.0}% over reservation", markup * 100.0),
                )
            }
            (Some(prev), Some(bid)) if bid < prev => {
                let rate = self.params.concession_rate;
                (
                    (prev - rate * (prev - bid)).max(self.reservation_price),
                    format!(
                        "Closing {:.0}% of the gap to the buyer's {:.2}",
                        rate * 100.0,
                        bid
                    ),
                )
            }
            (Some(prev), _) => (prev, "Holding at current ask".to_string()),
        };

        let is_final = price <= self.reservation_price
            || round >= self.max_rounds
            || converged(price, bid, self.params.convergence_tolerance);

        Offer::new(price, self.quantity, reasoning, is_final)
    }
}

fn converged(price: f64, counter: Option<f64>, tolerance: f64) -> bool {
    counter.is_some_and(|c| (price - c).abs() <= tolerance * c)
}
