//! The per-tick quoting pipeline.
//!
//! A single task owns every piece of strategy state and consumes ticks in
//! arrival order; each tick's effects on the ledger and telemetry are fully
//! ordered before the next tick is drawn. The only suspension point is the
//! transport boundary.
//!
//! Per tick in `Running`:
//! 1. validate; invalid ticks are dropped with a counter
//! 2. feed the volatility estimator, push the live sigma into the quoter
//! 3. on the quote cadence: read the position, compute the quote, check the
//!    kill-switch, widen for inventory, sample passive fills, mark the book
//! 4. on the telemetry cadence: enqueue table rows (never blocking)
//!
//! `Running -> Halted` on a kill-switch breach; terminal. A configured
//! deadline or source exhaustion ends the run as `completed`.

use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::fill::PassiveFillModel;
use crate::session::Session;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::{Duration, Instant};
use stoikov_core::{Fill, Price, Quote, Side, Size, Tick, TickSource};
use stoikov_mm::{EwmaVolatility, Quoter, QuoterParams};
use stoikov_persist::{
    MarketTickRow, QuoteRow, SessionStatus, TelemetryHandle, TelemetryRecord, TradingStatsRow,
};
use stoikov_position::PnlTracker;
use stoikov_risk::{RiskConfig, RiskSupervisor, RiskVerdict};
use stoikov_telemetry::LatencyRegistry;
use tracing::info;

/// Pipeline lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Running,
    Halted,
}

/// Counters accumulated over one run.
#[derive(Debug, Clone, Default)]
pub struct PipelineCounters {
    pub ticks: u64,
    pub invalid_ticks: u64,
    pub quotes: u64,
    pub buy_fills: u64,
    pub sell_fills: u64,
    /// Signed fee total across fills (negative = net rebates earned).
    pub fees: Decimal,
}

impl PipelineCounters {
    pub fn fills(&self) -> u64 {
        self.buy_fills + self.sell_fills
    }

    pub fn fill_rate(&self) -> f64 {
        if self.quotes == 0 {
            return 0.0;
        }
        self.fills() as f64 / self.quotes as f64
    }
}

/// How the run ended, with the final books.
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub status: SessionStatus,
    pub counters: PipelineCounters,
    /// Ledger P&L (realized + unrealized), fees not deducted.
    pub gross_pnl: Decimal,
    /// Gross P&L minus accumulated fees.
    pub net_pnl: Decimal,
}

/// The quoting pipeline, monomorphic over its tick source.
pub struct Pipeline<S: TickSource> {
    source: S,
    config: EngineConfig,
    session: Session,
    quoter: Quoter,
    vol: EwmaVolatility,
    tracker: PnlTracker,
    risk: RiskSupervisor,
    fills: PassiveFillModel,
    telemetry: TelemetryHandle,
    latency: Arc<LatencyRegistry>,
    counters: PipelineCounters,
    state: PipelineState,
    next_order_id: u64,
    last_quote: Option<Quote>,
    deadline: Option<Instant>,
}

impl<S: TickSource> Pipeline<S> {
    /// Wire up a pipeline. Fails only on invalid quoter parameters.
    pub fn new(
        source: S,
        config: EngineConfig,
        session: Session,
        telemetry: TelemetryHandle,
        latency: Arc<LatencyRegistry>,
    ) -> EngineResult<Self> {
        let quoter = Quoter::new(QuoterParams {
            gamma: config.quoter.gamma,
            sigma: config.quoter.sigma,
            time_horizon: config.quoter.time_horizon,
            kappa: config.quoter.kappa,
        })?;

        let vol = EwmaVolatility::new(
            config.volatility.alpha,
            config.quoter.sigma,
            config.volatility.vol_floor,
        );

        let risk = RiskSupervisor::new(RiskConfig {
            max_inventory: config.risk.max_inventory,
            kill_floor: config.risk.kill_floor,
            max_spread_multiplier: config.risk.max_spread_multiplier,
        });

        let fills = PassiveFillModel::new(
            config.engine.base_fill_probability,
            config.engine.competitive_eps,
            Size::new(config.engine.fill_size),
            config.engine.maker_fee_bps,
            config.engine.seed,
        );

        let deadline = (session.duration_seconds > 0)
            .then(|| Instant::now() + Duration::from_secs(session.duration_seconds));

        Ok(Self {
            source,
            config,
            session,
            quoter,
            vol,
            tracker: PnlTracker::new(),
            risk,
            fills,
            telemetry,
            latency,
            counters: PipelineCounters::default(),
            state: PipelineState::Running,
            next_order_id: 1,
            last_quote: None,
            deadline,
        })
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn tracker(&self) -> &PnlTracker {
        &self.tracker
    }

    pub fn counters(&self) -> &PipelineCounters {
        &self.counters
    }

    /// Consume the source until the deadline, transport close or
    /// kill-switch, then drain and report.
    pub async fn run(mut self) -> EngineResult<SessionOutcome> {
        self.telemetry.push(TelemetryRecord::Session(
            self.session.opening_row(self.quoter.params()),
        ));

        info!(
            simulation_id = %self.session.simulation_id,
            instrument = %self.session.instrument,
            duration_s = self.session.duration_seconds,
            "pipeline started"
        );

        while self.state == PipelineState::Running {
            if let Some(deadline) = self.deadline {
                if Instant::now() >= deadline {
                    info!("session duration reached, stopping");
                    break;
                }
            }

            let Some(tick) = self.source.next().await else {
                info!("tick source closed, stopping");
                break;
            };
            self.process_tick(&tick);
        }

        self.finish().await
    }

    /// One pass of the tick state machine. Synchronous and allocation-free
    /// outside of telemetry row construction.
    fn process_tick(&mut self, tick: &Tick) {
        let latency = self.latency.clone();
        let mut timer = latency.scoped("pipeline_tick");

        if !tick.is_valid() {
            self.counters.invalid_ticks += 1;
            return;
        }
        self.counters.ticks += 1;

        let mid = tick.mid_price();
        self.vol.update(mid.to_f64());
        // The estimate is floored above zero, so this cannot fail.
        let _ = self.quoter.set_volatility(self.vol.current());

        if self.counters.ticks % self.config.engine.quote_every_k == 0 {
            self.quote_cycle(tick, mid);
        }

        if self.counters.ticks % self.config.engine.telemetry_every_k == 0 {
            self.emit_telemetry(tick, mid);
        }

        if self.counters.ticks % self.config.engine.status_every_k == 0 {
            self.log_status(mid);
        }

        timer.stop();
    }

    fn quote_cycle(&mut self, tick: &Tick, mid: Price) {
        let inventory = self.tracker.position(tick.instrument).quantity;

        let order_id = self.next_order_id;
        let mut quote = self
            .quoter
            .quote(tick, inventory.to_f64().unwrap_or(0.0), order_id);

        if self.risk.check_pnl(self.tracker.total()) == RiskVerdict::Halt {
            self.state = PipelineState::Halted;
            return;
        }

        self.risk.apply_inventory_widening(&mut quote, inventory);

        if !quote.is_valid() {
            return;
        }
        self.next_order_id += 1;
        self.counters.quotes += 1;

        let (bid_fill, ask_fill) = self.fills.sample(&quote, tick);
        if let Some(fill) = bid_fill {
            self.apply_fill(fill);
        }
        if let Some(fill) = ask_fill {
            self.apply_fill(fill);
        }

        self.tracker.update_mark(tick.instrument, mid);
        self.last_quote = Some(quote);
    }

    fn apply_fill(&mut self, fill: Fill) {
        match fill.side {
            Side::Buy => self.counters.buy_fills += 1,
            Side::Sell => self.counters.sell_fills += 1,
        }
        self.counters.fees += fill.fee;
        self.tracker.update_fill(&fill);
    }

    fn emit_telemetry(&mut self, tick: &Tick, mid: Price) {
        let symbol = tick.instrument.canonical().to_string();
        let simulation_id = self.session.simulation_id.clone();

        self.telemetry.push(TelemetryRecord::MarketTick(MarketTickRow {
            time: tick.timestamp,
            symbol: symbol.clone(),
            bid: tick.bid.inner(),
            bid_size: tick.bid_qty.inner(),
            ask: tick.ask.inner(),
            ask_size: tick.ask_qty.inner(),
            spread: tick.spread().inner(),
            mid_price: mid.inner(),
            simulation_id: simulation_id.clone(),
        }));

        let position = self.tracker.position(tick.instrument);
        if let Some(quote) = &self.last_quote {
            self.telemetry.push(TelemetryRecord::Quote(QuoteRow {
                time: quote.timestamp,
                symbol: symbol.clone(),
                our_bid: quote.bid.inner(),
                our_ask: quote.ask.inner(),
                our_spread: quote.spread().inner(),
                spread_bps: quote.spread_bps().unwrap_or_default(),
                market_mid: mid.inner(),
                position: position.quantity,
                avg_entry_price: position.avg_price.inner(),
                volatility: self.vol.current(),
                simulation_id: simulation_id.clone(),
            }));

            self.telemetry
                .push(TelemetryRecord::TradingStats(TradingStatsRow {
                    time: tick.timestamp,
                    symbol,
                    position: position.quantity,
                    avg_entry_price: position.avg_price.inner(),
                    realized_pnl: self.tracker.realized(),
                    unrealized_pnl: self.tracker.unrealized(),
                    total_pnl: self.tracker.total(),
                    fill_count: self.counters.fills(),
                    quote_count: self.counters.quotes,
                    fill_rate: self.counters.fill_rate(),
                    simulation_id,
                }));
        }
    }

    fn log_status(&self, mid: Price) {
        let position = self.tracker.position(self.session.instrument);
        info!(
            instrument = %self.session.instrument,
            %mid,
            position = %position.quantity,
            avg_entry = %position.avg_price,
            realized = %self.tracker.realized(),
            unrealized = %self.tracker.unrealized(),
            total_pnl = %self.tracker.total(),
            quotes = self.counters.quotes,
            fills = self.counters.fills(),
            ticks = self.counters.ticks,
            sigma = self.vol.current(),
            "status"
        );
    }

    async fn finish(mut self) -> EngineResult<SessionOutcome> {
        let status = match self.state {
            PipelineState::Halted => SessionStatus::Halted,
            PipelineState::Running => SessionStatus::Completed,
        };

        let gross_pnl = self.tracker.total();
        // Fees are surfaced separately by the ledger; deduct them here.
        let net_pnl = gross_pnl - self.counters.fees;

        let position = self.tracker.position(self.session.instrument);
        let final_stats = format!(
            "total_pnl={},realized_pnl={},unrealized_pnl={},fees={},fill_count={},quote_count={},final_position={}",
            gross_pnl,
            self.tracker.realized(),
            self.tracker.unrealized(),
            self.counters.fees,
            self.counters.fills(),
            self.counters.quotes,
            position.quantity,
        );

        self.telemetry.push(TelemetryRecord::Session(
            self.session
                .closing_row(self.quoter.params(), status, final_stats),
        ));
        self.telemetry.close();
        self.source.close().await;

        info!(
            simulation_id = %self.session.simulation_id,
            %status,
            %gross_pnl,
            %net_pnl,
            ticks = self.counters.ticks,
            invalid_ticks = self.counters.invalid_ticks,
            quotes = self.counters.quotes,
            fills = self.counters.fills(),
            "pipeline finished"
        );
        if let Some(reason) = self.risk.kill_switch().reason() {
            info!(%reason, "halt reason");
        }

        Ok(SessionOutcome {
            status,
            counters: self.counters,
            gross_pnl,
            net_pnl,
        })
    }
}
