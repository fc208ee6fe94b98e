//! Research Pipeline
//!
//! Batch composition of the research flow over one price panel:
//!
//! 1. Engle-Granger screen (+ optional FDR filter)
//! 2. Per candidate: spread, quality gate, signals, volatility-targeted
//!    positions, rebalancing, execution friction
//! 3. Aggregation across pairs under the leverage cap
//! 4. Portfolio PnL, drawdown stop, performance and subperiod metrics
//!
//! Step 2 runs per pair on the rayon pool; aggregation waits for every pair.
//!
//! PnL is in units of capital: with a pair return of
//! r_t = (spread_t - spread_{t-1}) / S1_{t-1},
//! PnL_t = sum_pairs scaled_{t-1} * r_t - friction_t, and equity is
//! 1 + cumsum(PnL).

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::analytics::performance::PerformanceRecord;
use crate::config::Config;
use crate::domain::allocation::AllocationEngine;
use crate::domain::error::AnalysisError;
use crate::domain::execution::ExecutionModel;
use crate::domain::pair::Pair;
use crate::domain::panel::PricePanel;
use crate::domain::portfolio::{AggregatedPortfolio, PortfolioAggregator};
use crate::domain::rebalance::rebalance;
use crate::domain::risk::{RiskManager, RiskState};
use crate::domain::signal::Signal;
use crate::ports::panel_source::{PanelSource, PanelSourceError};
use crate::strategy::diagnostics::{evaluate, SpreadQuality};
use crate::strategy::pair_selection::{PairSelector, SelectionResult};
use crate::strategy::params::RiskMode;
use crate::strategy::signal_engine::generate_signals;
use crate::strategy::spread::{construct_spread, SpreadSeries};
use crate::validation::fdr::false_discovery_control_with;
use crate::validation::subperiods::subperiod_stability;

/// Pipeline errors
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Panel source error: {0}")]
    Source(#[from] PanelSourceError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

/// Everything computed for one candidate pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairReport {
    pub pair: Pair,
    pub spread: SpreadSeries,
    /// `None` when a diagnostic could not be computed for the spread
    pub quality: Option<SpreadQuality>,
    /// Passed the quality gate and entered the portfolio
    pub tradable: bool,
    pub rejection: Option<String>,
    pub signals: Vec<Signal>,
    /// Rebalanced positions before the portfolio leverage cap
    pub positions: Vec<f64>,
    /// Friction per timestep as a fraction of capital
    pub friction: Vec<f64>,
    /// Stand-alone metrics on the unscaled positions
    pub performance: PerformanceRecord,
}

/// Full research output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchReport {
    pub selection: SelectionResult,
    /// Candidates that also survive FDR control over every tested pair
    pub fdr_survivors: Vec<String>,
    pub pairs: Vec<PairReport>,
    pub portfolio: AggregatedPortfolio,
    /// Portfolio PnL per timestep before the drawdown stop
    pub pnl: Vec<f64>,
    /// PnL actually earned under the drawdown stop
    pub realized_pnl: Vec<f64>,
    /// Equity after the drawdown stop
    pub equity: Vec<f64>,
    /// Net exposure after the risk manager's leverage clamp
    pub clamped_net: Vec<f64>,
    pub risk: RiskState,
    pub performance: PerformanceRecord,
    pub subperiods: Vec<PerformanceRecord>,
}

impl ResearchReport {
    pub fn tradable_pairs(&self) -> impl Iterator<Item = &PairReport> {
        self.pairs.iter().filter(|p| p.tradable)
    }
}

pub struct ResearchPipeline {
    config: Config,
}

impl ResearchPipeline {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Load a panel from `source` and run on it
    pub fn run_source(&self, source: &dyn PanelSource) -> Result<ResearchReport, PipelineError> {
        tracing::info!("Loading {}", source.describe());
        let panel = source.load_panel()?;
        Ok(self.run(&panel)?)
    }

    pub fn run(&self, panel: &PricePanel) -> Result<ResearchReport, AnalysisError> {
        let selection = PairSelector::new(self.config.selection.clone()).find_cointegrated_pairs(panel)?;
        let fdr_survivors = self.fdr_survivors(panel, &selection);

        let candidates: Vec<&Pair> = selection
            .pairs
            .iter()
            .filter(|p| !self.config.selection.require_fdr || fdr_survivors.contains(&p.name()))
            .collect();
        tracing::info!(
            "{} candidates ({} after FDR)",
            selection.pairs.len(),
            fdr_survivors.len()
        );

        let pairs: Vec<PairReport> = candidates
            .par_iter()
            .map(|pair| self.analyze_pair(panel, pair))
            .collect::<Result<_, _>>()?;

        // Barrier: every pair is final before aggregation
        let mut aggregator = PortfolioAggregator::new(self.config.portfolio.max_leverage);
        for report in pairs.iter().filter(|p| p.tradable) {
            aggregator.add_pair(report.pair.name(), report.positions.clone())?;
        }
        let portfolio = aggregator.aggregate();

        let n = panel.len();
        let pnl = self.portfolio_pnl(panel, &pairs, &portfolio, n)?;

        let mut equity = Vec::with_capacity(n);
        let mut level = 1.0;
        for p in &pnl {
            level += p;
            equity.push(level);
        }

        let mut risk = RiskManager::new(self.config.risk.clone());
        let equity = risk.enforce_drawdown(&equity)?;
        let net = if portfolio.net.is_empty() {
            vec![0.0; n]
        } else {
            portfolio.net.clone()
        };
        let clamped_net = risk.enforce_leverage(&net, None);

        let realized = match (risk.state().halted_from, self.config.risk.mode) {
            (None, _) => pnl.clone(),
            (Some(_), RiskMode::Retroactive) => vec![0.0; n],
            (Some(breach), RiskMode::ForwardOnly) => pnl
                .iter()
                .enumerate()
                .map(|(t, p)| if t <= breach { *p } else { 0.0 })
                .collect(),
        };

        let performance = PerformanceRecord::from_returns(&realized, Some(net.as_slice()));
        let subperiods = subperiod_stability(&realized, self.config.validation.n_splits)?;

        Ok(ResearchReport {
            selection,
            fdr_survivors,
            pairs,
            portfolio,
            pnl,
            realized_pnl: realized,
            equity,
            clamped_net,
            risk: risk.state().clone(),
            performance,
            subperiods,
        })
    }

    /// Candidate names surviving FDR control across all tested pairs
    fn fdr_survivors(&self, panel: &PricePanel, selection: &SelectionResult) -> Vec<String> {
        let n = panel.n_assets();
        let tested: Vec<(usize, usize)> = (0..n)
            .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
            .collect();
        let reject = false_discovery_control_with(
            &selection.p_values.upper_triangle(),
            self.config.validation.fdr_alpha,
            self.config.validation.fdr_method,
        );

        let candidates: HashSet<String> = selection.pairs.iter().map(|p| p.name()).collect();
        tested
            .iter()
            .zip(reject)
            .filter(|(_, rejected)| *rejected)
            .map(|((i, j), _)| format!("{}/{}", panel.asset(*i), panel.asset(*j)))
            .filter(|name| candidates.contains(name))
            .collect()
    }

    /// Spread, diagnostics, signals, positions and friction for one pair
    ///
    /// A diagnostic that cannot be computed (e.g. the constant spread of a
    /// collinear pair) rejects the pair instead of failing the run. Every
    /// other error is returned with the pair named.
    fn analyze_pair(&self, panel: &PricePanel, pair: &Pair) -> Result<PairReport, AnalysisError> {
        let name = pair.name();
        let tag = |err: AnalysisError| err.for_pair(&name);

        let s1 = panel.column(&pair.asset_a)?;
        let s2 = panel.column(&pair.asset_b)?;

        let spread = construct_spread(s1, s2).map_err(tag)?;
        let (quality, rejection) = match evaluate(&spread.spread, self.config.diagnostics.hurst_max_lag) {
            Ok(quality) => {
                let rejection = quality.rejection_reason(&self.config.diagnostics);
                if let Some(reason) = &rejection {
                    tracing::info!("{} rejected by quality gate: {}", name, reason);
                }
                (Some(quality), rejection)
            }
            Err(err @ AnalysisError::StatisticalTest(_)) => {
                let reason = format!("diagnostics failed: {}", tag(err));
                tracing::warn!("{} rejected: {}", name, reason);
                (None, Some(reason))
            }
            Err(err) => return Err(tag(err)),
        };

        let signals = generate_signals(&spread.zscore, &self.config.effective_signal());
        let allocation = AllocationEngine::new(self.config.allocation.clone())
            .volatility_targeted(&signals, s1)
            .map_err(|e| tag(e.into()))?;
        let positions = rebalance(&allocation.positions, self.config.execution.rebalance_freq)
            .map_err(|e| tag(e.into()))?;

        let execution = ExecutionModel::new(self.config.execution.clone());
        let friction = execution
            .breakdown(&positions, s1)
            .map_err(|e| tag(e.into()))?
            .cost_fraction(s1);

        let returns = spread.unit_returns(s1);
        let standalone: Vec<f64> = (0..positions.len())
            .map(|t| {
                let carried = if t > 0 { positions[t - 1] * returns[t] } else { 0.0 };
                carried - friction[t]
            })
            .collect();
        let performance = PerformanceRecord::from_returns(&standalone, Some(positions.as_slice()));

        Ok(PairReport {
            pair: pair.clone(),
            spread,
            quality,
            tradable: rejection.is_none(),
            rejection,
            signals,
            positions,
            friction,
            performance,
        })
    }

    /// Portfolio PnL from scaled positions, with friction scaled alike
    fn portfolio_pnl(
        &self,
        panel: &PricePanel,
        pairs: &[PairReport],
        portfolio: &AggregatedPortfolio,
        n: usize,
    ) -> Result<Vec<f64>, AnalysisError> {
        let mut pnl = vec![0.0; n];
        for report in pairs.iter().filter(|p| p.tradable) {
            let Some(scaled) = portfolio.pair(&report.pair.name()) else {
                continue;
            };
            let s1 = panel.column(&report.pair.asset_a)?;
            let returns = report.spread.unit_returns(s1);
            for t in 0..n {
                if t > 0 {
                    pnl[t] += scaled[t - 1] * returns[t];
                }
                pnl[t] -= report.friction[t] * portfolio.scaling[t];
            }
        }
        Ok(pnl)
    }
}
