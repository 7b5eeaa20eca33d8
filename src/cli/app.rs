//! Accord application: runs sessions and hands results to collaborators

use crate::config::AppConfig;
use crate::error::{NegotiationError, Result};
use crate::negotiation::{NegotiationEngine, SessionReport, Strategy};
use std::path::Path;
use std::time::Duration;

use super::chart;

/// Main Accord application
#[derive(Clone, Debug, Default)]
pub struct NegotiationApp {
    config: AppConfig,
}

impl NegotiationApp {
    /// Create an application from an already-validated configuration
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Load configuration from `path`, or fall back to the built-in scenario
    pub fn from_path(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => AppConfig::load_from(path)?,
            None => AppConfig::default(),
        };
        Ok(Self::new(config))
    }

    /// Get configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run one session with the built-in strategies, bounded by `timeout`
    pub async fn run_session(&self, timeout: Duration) -> Result<SessionReport> {
        let engine = NegotiationEngine::new(&self.config)?;
        Self::run_engine(engine, timeout).await
    }

    /// Run `engine` on a blocking worker, bounded by `timeout`.
    ///
    /// Expiry yields `NegotiationTimeout`: the outcome is unknown, which is
    /// distinct from a session that ended without agreement.
    pub async fn run_engine<B, S>(
        engine: NegotiationEngine<B, S>,
        timeout: Duration,
    ) -> Result<SessionReport>
    where
        B: Strategy + Send + 'static,
        S: Strategy + Send + 'static,
    {
        let task = tokio::task::spawn_blocking(move || engine.run()?.report());

        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(report)) => report,
            Ok(Err(e)) => Err(NegotiationError::Internal(format!(
                "negotiation task failed: {}",
                e
            ))),
            Err(_) => Err(NegotiationError::NegotiationTimeout(format!(
                "session aborted after {:?}",
                timeout
            ))),
        }
    }

    /// Write the convergence chart. Failures are logged, never propagated:
    /// the negotiation outcome stands regardless.
    pub fn write_chart(&self, report: &SessionReport, path: &Path) -> bool {
        match chart::write_svg(path, &report.convergence_data(), &report.zopa) {
            Ok(true) => {
                tracing::info!("Negotiation path chart saved to {}", path.display());
                true
            }
            Ok(false) => {
                tracing::info!("No negotiation data to plot");
                false
            }
            Err(e) => {
                tracing::warn!("Could not write chart to {}: {}", path.display(), e);
                false
            }
        }
    }
}

/// Log a human-readable summary of a finished session
pub fn log_summary(report: &SessionReport) {
    let result = &report.result;

    for entry in &report.history {
        tracing::info!(
            "Round {} {} -> {:.2} x {}{}: {}",
            entry.round,
            entry.party,
            entry.offer.offer_price(),
            entry.offer.quantity(),
            if entry.offer.is_final_offer() { " (final)" } else { "" },
            entry.offer.reasoning()
        );
    }

    tracing::info!("Agreement status: {}", result.outcome);
    match result.final_price {
        Some(price) => tracing::info!(
            "Final price: {:.2} per unit, {} units, total cost {:.2}",
            price,
            result.quantity,
            result.total_cost.unwrap_or(price * f64::from(result.quantity))
        ),
        None => tracing::info!("No price agreed for {} units", result.quantity),
    }
    tracing::info!(
        "Rounds: {}, mediator intervention: {}",
        result.rounds,
        if result.mediation_used { "yes" } else { "no" }
    );

    if let Some(pareto) = &report.pareto {
        tracing::info!(
            "Within ZOPA [{:.2}, {:.2}]: {}, buyer surplus {:.2}, seller surplus {:.2}",
            report.zopa.reservation_price,
            report.zopa.max_budget,
            pareto.within_zopa,
            pareto.buyer_surplus,
            pareto.seller_surplus
        );
        if pareto.is_pareto_optimal {
            tracing::info!("Pareto optimal agreement achieved");
        } else {
            tracing::warn!("Agreement does not meet Pareto optimality criteria");
        }
    }

    tracing::debug!("Transcript digest: {}", report.transcript_hash);
}
