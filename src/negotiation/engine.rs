//! Negotiation engine drives a session from INIT to a terminal state

use crate::config::{AppConfig, NegotiationConfig};
use crate::error::{NegotiationError, Result};
use crate::types::Party;

use super::mediator;
use super::offer::Offer;
use super::session::NegotiationSession;
use super::strategy::{BuyerStrategy, SellerStrategy, Strategy};
use super::types::{HistoryEntry, NegotiationState, Zopa};

/// Runs one buyer/seller session under a fixed configuration
pub struct NegotiationEngine<B = BuyerStrategy, S = SellerStrategy> {
    config: NegotiationConfig,
    zopa: Zopa,
    quantity: u32,
    buyer: B,
    seller: S,
}

impl NegotiationEngine {
    /// Create an engine with the built-in strategies
    pub fn new(config: &AppConfig) -> Result<Self> {
        Self::with_strategies(
            config,
            BuyerStrategy::from_config(config),
            SellerStrategy::from_config(config),
        )
    }
}

impl<B: Strategy, S: Strategy> NegotiationEngine<B, S> {
    /// Create an engine with caller-supplied strategies
    pub fn with_strategies(config: &AppConfig, buyer: B, seller: S) -> Result<Self> {
        config.validate()?;
        if buyer.party() != Party::Buyer || seller.party() != Party::Seller {
            return Err(NegotiationError::InvalidConfig(format!(
                "strategies play {} and {}, expected Buyer and Seller",
                buyer.party(),
                seller.party()
            )));
        }

        Ok(Self {
            config: config.protocol.clone(),
            zopa: Zopa::new(
                config.scenario.reservation_price,
                config.scenario.max_budget,
            ),
            quantity: config.scenario.quantity,
            buyer,
            seller,
        })
    }

    /// Run a full session. Every negotiation outcome, infeasible zone
    /// included, comes back as `Ok`; `Err` means an internal fault.
    pub fn run(&self) -> Result<NegotiationSession> {
        let mut session = NegotiationSession::new(self.zopa, self.quantity, &self.config);

        tracing::info!(
            "Starting negotiation: {} units, ZOPA [{:.2}, {:.2}]",
            self.quantity,
            self.zopa.reservation_price,
            self.zopa.max_budget
        );

        if let Err(e) = self.zopa.ensure_feasible() {
            tracing::warn!("{}", e);
            session.set_state(NegotiationState::Infeasible)?;
            return Ok(session);
        }

        let max_rounds = self.config.max_rounds;
        for _attempt in 0..max_rounds {
            let round = session.tracker().rounds() + 1;
            session.set_state(NegotiationState::Negotiating { round })?;

            let Some((bid, ask)) = self.play_round(&mut session, round)? else {
                continue;
            };

            tracing::info!(
                "Round {}: buyer {:.2}, seller {:.2}",
                round,
                bid.offer_price(),
                ask.offer_price()
            );

            if let Some(price) = self.agreement_price(&bid, &ask) {
                tracing::info!("Agreement reached at {:.2} in round {}", price, round);
                session.set_state(NegotiationState::Agreed {
                    price,
                    mediated: false,
                })?;
                return Ok(session);
            }

            session.set_state(NegotiationState::StalemateCheck { round })?;
            if session.tracker().detect_stalemate() {
                if round < max_rounds {
                    self.mediate(&mut session)?;
                    return Ok(session);
                }
                tracing::warn!("Stalemate in final round {}, no room to mediate", round);
            }
        }

        tracing::info!(
            "No agreement after {} rounds",
            session.tracker().rounds()
        );
        session.set_state(NegotiationState::RoundLimitExceeded)?;
        Ok(session)
    }

    /// Collect one buyer and one seller offer. A rejected offer aborts the
    /// round without recording anything.
    fn play_round(
        &self,
        session: &mut NegotiationSession,
        round: u32,
    ) -> Result<Option<(Offer, Offer)>> {
        let bid = match self.checked_offer(&self.buyer, session.history(), round) {
            Ok(offer) => offer,
            Err(e) if e.is_offer_rejection() => {
                tracing::warn!("Round {} aborted, buyer offer rejected: {}", round, e);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let mut pending = session.history().to_vec();
        pending.push(HistoryEntry {
            round,
            party: Party::Buyer,
            offer: bid.clone(),
        });

        let ask = match self.checked_offer(&self.seller, &pending, round) {
            Ok(offer) => offer,
            Err(e) if e.is_offer_rejection() => {
                tracing::warn!("Round {} aborted, seller offer rejected: {}", round, e);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        session.record_offer(Party::Buyer, bid.clone())?;
        session.record_offer(Party::Seller, ask.clone())?;
        Ok(Some((bid, ask)))
    }

    /// Ask a strategy for its offer and hold it to its own bound
    fn checked_offer<T: Strategy>(
        &self,
        strategy: &T,
        history: &[HistoryEntry],
        round: u32,
    ) -> Result<Offer> {
        let offer = strategy.next_offer(history, round)?;
        let price = offer.offer_price();

        let bound = match strategy.party() {
            Party::Buyer if price > self.zopa.max_budget => Some(self.zopa.max_budget),
            Party::Seller if price < self.zopa.reservation_price => {
                Some(self.zopa.reservation_price)
            }
            _ => None,
        };

        match bound {
            Some(bound) => Err(NegotiationError::PriceOutOfBounds {
                party: strategy.party(),
                price,
                bound,
            }),
            None => Ok(offer),
        }
    }

    /// Price both sides settle on this round, if any.
    ///
    /// Agreement holds when the bid meets the ask, or when one side marks
    /// its offer final and the other side's price lies inside the ZOPA. The
    /// agreed price is the midpoint, clamped into the ZOPA.
    fn agreement_price(&self, bid: &Offer, ask: &Offer) -> Option<f64> {
        let (b, s) = (bid.offer_price(), ask.offer_price());

        let crossed = b >= s;
        let final_accepted = (bid.is_final_offer() && self.zopa.contains(s))
            || (ask.is_final_offer() && self.zopa.contains(b));

        (crossed || final_accepted).then(|| self.zopa.clamp((b + s) / 2.0))
    }

    /// Single mediation attempt; always leaves the session terminal
    fn mediate(&self, session: &mut NegotiationSession) -> Result<()> {
        let round = session.tracker().rounds() + 1;
        tracing::warn!(
            "Stalemate detected after {} rounds, mediator intervening",
            session.tracker().rounds()
        );
        session.set_state(NegotiationState::Mediating { round })?;

        let proposal = match mediator::propose_compromise(session.history()) {
            Ok(offer) => offer,
            Err(
                e @ (NegotiationError::QuantityDrift { .. }
                | NegotiationError::MissingOffer(_)
                | NegotiationError::InvalidOffer(_)),
            ) => {
                tracing::warn!("Mediation failed: {}", e);
                return session.set_state(NegotiationState::StalemateUnresolved);
            }
            Err(e) => return Err(e),
        };

        let price = proposal.offer_price();
        session.record_offer(Party::Mediator, proposal)?;

        if self.zopa.contains(price) {
            tracing::info!("Mediated agreement at {:.2} in round {}", price, round);
            session.set_state(NegotiationState::Agreed {
                price,
                mediated: true,
            })
        } else {
            tracing::warn!("Mediator price {:.2} lies outside the ZOPA", price);
            session.set_state(NegotiationState::StalemateUnresolved)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StrategyConfig;
    use crate::negotiation::types::Outcome;

    /// Moves by a constant step each round; never concedes on its own accord
    struct FixedStrategy {
        party: Party,
        start: f64,
        step: f64,
        quantity: u32,
        is_final: bool,
    }

    impl FixedStrategy {
        fn new(party: Party, start: f64, step: f64) -> Self {
            Self {
                party,
                start,
                step,
                quantity: 100,
                is_final: false,
            }
        }
    }

    impl Strategy for FixedStrategy {
        fn party(&self) -> Party {
            self.party
        }

        fn next_offer(&self, _history: &[HistoryEntry], round: u32) -> Result<Offer> {
            let price = self.start + self.step * f64::from(round - 1);
            Offer::new(price, self.quantity, "fixed", self.is_final)
        }
    }

    fn prices_of(session: &NegotiationSession, party: Party) -> Vec<f64> {
        session
            .history()
            .iter()
            .filter(|e| e.party == party)
            .map(|e| e.offer.offer_price())
            .collect()
    }

    #[test]
    fn test_default_scenario_reaches_agreement() {
        let config = AppConfig::default();
        let session = NegotiationEngine::new(&config).unwrap().run().unwrap();
        let result = session.result().unwrap();

        assert_eq!(result.outcome, Outcome::Success);
        let price = result.final_price.unwrap();
        assert!((350.0..=500.0).contains(&price));
        assert_eq!(result.quantity, 100);
        assert!(result.rounds <= 10);
        assert!(!result.mediation_used);
        assert_eq!(result.total_cost, Some(price * 100.0));
    }

    #[test]
    fn test_monotonic_convergence() {
        let session = NegotiationEngine::new(&AppConfig::default())
            .unwrap()
            .run()
            .unwrap();

        let bids = prices_of(&session, Party::Buyer);
        let asks = prices_of(&session, Party::Seller);
        assert!(!bids.is_empty());

        assert!(bids.windows(2).all(|w| w[0] <= w[1]));
        assert!(asks.windows(2).all(|w| w[0] >= w[1]));
        assert!(bids.iter().all(|&p| p <= 500.0));
        assert!(asks.iter().all(|&p| p >= 350.0));
    }

    #[test]
    fn test_infeasible_zone_runs_no_rounds() {
        let mut config = AppConfig::default();
        config.scenario.reservation_price = 500.0;
        config.scenario.max_budget = 350.0;

        let session = NegotiationEngine::new(&config).unwrap().run().unwrap();
        let result = session.result().unwrap();

        assert_eq!(result.outcome, Outcome::NoAgreement);
        assert_eq!(result.state, NegotiationState::Infeasible);
        assert_eq!(result.rounds, 0);
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_slow_concessions_trigger_mediation() {
        let mut config = AppConfig::default();
        config.strategy = StrategyConfig {
            concession_rate: 0.001,
            ..StrategyConfig::default()
        };

        let session = NegotiationEngine::new(&config).unwrap().run().unwrap();
        let result = session.result().unwrap();

        assert_eq!(result.outcome, Outcome::Success);
        assert!(result.mediation_used);
        assert_eq!(result.rounds, 6);

        let last = session.history().last().unwrap();
        assert_eq!(last.party, Party::Mediator);
        assert_eq!(last.round, 6);
        assert!(last.offer.is_final_offer());
        assert_eq!(result.final_price, Some(last.offer.offer_price()));
    }

    #[test]
    fn test_round_limit_yields_no_agreement() {
        let config = AppConfig::default();
        let buyer = FixedStrategy::new(Party::Buyer, 100.0, 10.0);
        let seller = FixedStrategy::new(Party::Seller, 1000.0, -10.0);

        let engine = NegotiationEngine::with_strategies(&config, buyer, seller).unwrap();
        let result = engine.run().unwrap().result().unwrap();

        assert_eq!(result.outcome, Outcome::NoAgreement);
        assert_eq!(result.state, NegotiationState::RoundLimitExceeded);
        assert_eq!(result.rounds, 10);
        assert!(result.final_price.is_none());
        assert!(!result.mediation_used);
    }

    #[test]
    fn test_mediation_outside_zopa_is_unresolved() {
        let config = AppConfig::default();
        let buyer = FixedStrategy::new(Party::Buyer, 100.0, 0.0);
        let seller = FixedStrategy::new(Party::Seller, 2000.0, 0.0);

        let engine = NegotiationEngine::with_strategies(&config, buyer, seller).unwrap();
        let session = engine.run().unwrap();
        let result = session.result().unwrap();

        assert_eq!(result.outcome, Outcome::StalemateUnresolved);
        assert!(result.mediation_used);
        assert_eq!(result.rounds, 6);
        assert_eq!(session.history().last().unwrap().offer.offer_price(), 1050.0);
    }

    #[test]
    fn test_quantity_drift_fails_mediation() {
        let config = AppConfig::default();
        let buyer = FixedStrategy::new(Party::Buyer, 400.0, 0.0);
        let mut seller = FixedStrategy::new(Party::Seller, 440.0, 0.0);
        seller.quantity = 120;

        let engine = NegotiationEngine::with_strategies(&config, buyer, seller).unwrap();
        let result = engine.run().unwrap().result().unwrap();

        assert_eq!(result.outcome, Outcome::StalemateUnresolved);
        assert!(!result.mediation_used);
        assert_eq!(result.rounds, 5);
    }

    #[test]
    fn test_crossing_offers_agree_at_midpoint() {
        let config = AppConfig::default();
        let buyer = FixedStrategy::new(Party::Buyer, 450.0, 0.0);
        let seller = FixedStrategy::new(Party::Seller, 420.0, 0.0);

        let engine = NegotiationEngine::with_strategies(&config, buyer, seller).unwrap();
        let result = engine.run().unwrap().result().unwrap();

        assert_eq!(result.outcome, Outcome::Success);
        assert_eq!(result.final_price, Some(435.0));
        assert_eq!(result.rounds, 1);
    }

    #[test]
    fn test_final_offer_accepted_within_zopa() {
        let config = AppConfig::default();
        let mut buyer = FixedStrategy::new(Party::Buyer, 400.0, 0.0);
        buyer.is_final = true;
        let seller = FixedStrategy::new(Party::Seller, 450.0, 0.0);

        let engine = NegotiationEngine::with_strategies(&config, buyer, seller).unwrap();
        let result = engine.run().unwrap().result().unwrap();

        assert_eq!(result.outcome, Outcome::Success);
        assert_eq!(result.final_price, Some(425.0));
        assert_eq!(result.rounds, 1);
    }

    #[test]
    fn test_seller_final_offer_accepted_within_zopa() {
        let config = AppConfig::default();
        let buyer = FixedStrategy::new(Party::Buyer, 380.0, 0.0);
        let mut seller = FixedStrategy::new(Party::Seller, 460.0, 0.0);
        seller.is_final = true;

        let engine = NegotiationEngine::with_strategies(&config, buyer, seller).unwrap();
        let result = engine.run().unwrap().result().unwrap();

        assert_eq!(result.outcome, Outcome::Success);
        assert_eq!(result.final_price, Some(420.0));
        assert_eq!(result.rounds, 1);
    }

    #[test]
    fn test_final_offer_ignored_outside_zopa() {
        let config = AppConfig::default();
        let mut buyer = FixedStrategy::new(Party::Buyer, 400.0, 1.0);
        buyer.is_final = true;
        let seller = FixedStrategy::new(Party::Seller, 900.0, -20.0);

        let engine = NegotiationEngine::with_strategies(&config, buyer, seller).unwrap();
        let result = engine.run().unwrap().result().unwrap();

        assert_eq!(result.outcome, Outcome::NoAgreement);
        assert_eq!(result.rounds, 10);
    }

    #[test]
    fn test_out_of_bound_offers_abort_rounds() {
        let config = AppConfig::default();
        let buyer = FixedStrategy::new(Party::Buyer, 600.0, 0.0);
        let seller = FixedStrategy::new(Party::Seller, 450.0, 0.0);

        let engine = NegotiationEngine::with_strategies(&config, buyer, seller).unwrap();
        let session = engine.run().unwrap();
        let result = session.result().unwrap();

        assert_eq!(result.outcome, Outcome::NoAgreement);
        assert_eq!(result.rounds, 0);
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_mismatched_strategy_roles() {
        let config = AppConfig::default();
        let buyer = FixedStrategy::new(Party::Seller, 400.0, 0.0);
        let seller = FixedStrategy::new(Party::Seller, 450.0, 0.0);

        let result = NegotiationEngine::with_strategies(&config, buyer, seller);
        assert!(matches!(result, Err(NegotiationError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = AppConfig::default();
        config.protocol.stalemate_round_threshold = 0;
        assert!(matches!(
            NegotiationEngine::new(&config),
            Err(NegotiationError::InvalidConfig(_))
        ));

        let mut config = AppConfig::default();
        config.protocol.max_rounds = 0;
        let buyer = FixedStrategy::new(Party::Buyer, 400.0, 0.0);
        let seller = FixedStrategy::new(Party::Seller, 450.0, 0.0);
        assert!(matches!(
            NegotiationEngine::with_strategies(&config, buyer, seller),
            Err(NegotiationError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_sessions_are_deterministic() {
        let engine = NegotiationEngine::new(&AppConfig::default()).unwrap();
        let first = engine.run().unwrap().report().unwrap();
        let second = engine.run().unwrap().report().unwrap();

        assert_eq!(first.transcript_hash, second.transcript_hash);
        assert_eq!(first.result, second.result);
    }
}
