//! Split-the-difference mediation for stalled negotiations

use crate::error::{NegotiationError, Result};
use crate::types::Party;

use super::offer::Offer;
use super::tracker::last_offer_by;
use super::types::HistoryEntry;

/// Reasoning attached to every mediator proposal
pub const MEDIATOR_REASONING: &str =
    "Mediator intervention: split-the-difference compromise between the last buyer and seller offers";

/// Propose the midpoint of the most recent buyer and seller prices.
///
/// Every offer on record must carry the same quantity; a mismatch fails
/// with `QuantityDrift`.
pub fn propose_compromise(history: &[HistoryEntry]) -> Result<Offer> {
    let quantity = common_quantity(history)?;
    let bid = last_offer_by(history, Party::Buyer)
        .ok_or(NegotiationError::MissingOffer(Party::Buyer))?;
    let ask = last_offer_by(history, Party::Seller)
        .ok_or(NegotiationError::MissingOffer(Party::Seller))?;

    let price = (bid.offer_price() + ask.offer_price()) / 2.0;

    tracing::info!(
        "Mediator proposes {:.2} (buyer {:.2}, seller {:.2})",
        price,
        bid.offer_price(),
        ask.offer_price()
    );

    Offer::new(price, quantity, MEDIATOR_REASONING, true)
}

/// The single quantity shared by every offer in `history`
fn common_quantity(history: &[HistoryEntry]) -> Result<u32> {
    let mut offers = history.iter().map(|e| e.offer.quantity());
    let expected = offers
        .next()
        .ok_or(NegotiationError::MissingOffer(Party::Buyer))?;

    match offers.find(|&q| q != expected) {
        Some(found) => Err(NegotiationError::QuantityDrift { expected, found }),
        None => Ok(expected),
    }
}
