//! Append-only negotiation history with round counting and stalemate detection

use crate::config::NegotiationConfig;
use crate::error::{NegotiationError, Result};
use crate::types::{Hash, Party};

use super::offer::Offer;
use super::types::{HistoryEntry, PricePoint};

/// Records every offer in the order it was made.
///
/// A round is one buyer offer followed by one seller offer, or a single
/// mediator offer. Entries are never reordered or removed.
#[derive(Clone, Debug)]
pub struct HistoryTracker {
    history: Vec<HistoryEntry>,
    rounds: u32,
    awaiting_seller: bool,
    stalemate_round_threshold: u32,
    stalemate_price_epsilon: f64,
}

impl HistoryTracker {
    pub fn new(config: &NegotiationConfig) -> Self {
        Self {
            history: Vec::new(),
            rounds: 0,
            awaiting_seller: false,
            stalemate_round_threshold: config.stalemate_round_threshold,
            stalemate_price_epsilon: config.stalemate_price_epsilon,
        }
    }

    /// Append an offer and return the round it belongs to
    pub fn add_offer(&mut self, party: Party, offer: Offer) -> Result<u32> {
        let round = match party {
            Party::Buyer => {
                if self.awaiting_seller {
                    return Err(NegotiationError::InvalidStateTransition(
                        "Buyer cannot offer twice in one round".to_string(),
                    ));
                }
                self.awaiting_seller = true;
                self.rounds + 1
            }
            Party::Seller => {
                if !self.awaiting_seller {
                    return Err(NegotiationError::InvalidStateTransition(
                        "Seller must answer a buyer offer".to_string(),
                    ));
                }
                self.awaiting_seller = false;
                self.rounds += 1;
                self.rounds
            }
            Party::Mediator => {
                if self.awaiting_seller {
                    return Err(NegotiationError::InvalidStateTransition(
                        "Mediator cannot interrupt an open round".to_string(),
                    ));
                }
                self.rounds += 1;
                self.rounds
            }
        };

        tracing::debug!(
            "Round {}: {} offers {:.2} x {} (final: {})",
            round,
            party,
            offer.offer_price(),
            offer.quantity(),
            offer.is_final_offer()
        );

        self.history.push(HistoryEntry {
            round,
            party,
            offer,
        });
        Ok(round)
    }

    /// Completed rounds
    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    /// Every offer, oldest first
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// A buyer offer is waiting for the seller's answer
    pub fn round_open(&self) -> bool {
        self.awaiting_seller
    }

    /// Most recent offer from `party`
    pub fn last_offer(&self, party: Party) -> Option<&Offer> {
        last_offer_by(&self.history, party)
    }

    /// Up to `n` most recent entries
    pub fn last_offers(&self, n: usize) -> &[HistoryEntry] {
        let start = self.history.len().saturating_sub(n);
        &self.history[start..]
    }

    /// All prices in chronological order
    pub fn price_history(&self) -> Vec<f64> {
        self.history.iter().map(|e| e.offer.offer_price()).collect()
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

    /// True iff both buyer and seller have made at least
    /// `stalemate_round_threshold` offers and each moved by less than
    /// `stalemate_price_epsilon` (relative) across that window.
    pub fn detect_stalemate(&self) -> bool {
        if self.rounds < self.stalemate_round_threshold {
            return false;
        }

        [Party::Buyer, Party::Seller]
            .into_iter()
            .all(|party| self.party_stalled(party))
    }

    fn party_stalled(&self, party: Party) -> bool {
        let window = self.stalemate_round_threshold as usize;
        let prices: Vec<f64> = self
            .history
            .iter()
            .filter(|e| e.party == party)
            .map(|e| e.offer.offer_price())
            .collect();

        if window == 0 || prices.len() < window {
            return false;
        }

        let earlier = prices[prices.len() - window];
        let latest = prices[prices.len() - 1];
        let change = (latest - earlier).abs() / earlier;

        change < self.stalemate_price_epsilon
    }

    /// Blake2b digest over `round|party|offer-json` lines
    pub fn transcript_hash(&self) -> Result<Hash> {
        let lines = self
            .history
            .iter()
            .map(|e| -> Result<String> {
                Ok(format!("{}|{}|{}", e.round, e.party, e.offer.to_json_str()?))
            })
            .collect::<Result<Vec<String>>>()?;

        Ok(Hash::from_parts(lines.iter().map(|l| l.as_bytes())))
    }
}

impl Default for HistoryTracker {
    fn default() -> Self {
        Self::new(&NegotiationConfig::default())
    }
}

/// Most recent offer from `party` in a history slice
pub fn last_offer_by(history: &[HistoryEntry], party: Party) -> Option<&Offer> {
    history
        .iter()
        .rev()
        .find(|e| e.party == party)
        .map(|e| &e.offer)
}
