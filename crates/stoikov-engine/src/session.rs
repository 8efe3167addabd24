//! Simulation session bookkeeping.

use chrono::{DateTime, Utc};
use stoikov_core::Instrument;
use stoikov_mm::QuoterParams;
use stoikov_persist::{SessionRow, SessionStatus};

/// Identity and lifecycle of one engine run.
#[derive(Debug, Clone)]
pub struct Session {
    pub simulation_id: String,
    pub instrument: Instrument,
    pub started_at: DateTime<Utc>,
    pub duration_seconds: u64,
}

impl Session {
    /// Start a new session with a timestamp-derived id.
    pub fn start(instrument: Instrument, duration_seconds: u64) -> Self {
        let now = Utc::now();
        Self {
            simulation_id: format!(
                "sim_{}_{:03}",
                now.format("%Y%m%d_%H%M%S"),
                now.timestamp_subsec_millis()
            ),
            instrument,
            started_at: now,
            duration_seconds,
        }
    }

    /// Row announcing the session as `running`.
    pub fn opening_row(&self, params: &QuoterParams) -> SessionRow {
        SessionRow {
            simulation_id: self.simulation_id.clone(),
            start_time: self.started_at,
            end_time: None,
            duration_seconds: self.duration_seconds,
            symbol: self.instrument.canonical().to_string(),
            algorithm_params: format_params(params),
            final_stats: None,
            status: SessionStatus::Running,
        }
    }

    /// Terminal row superseding the opening one.
    pub fn closing_row(
        &self,
        params: &QuoterParams,
        status: SessionStatus,
        final_stats: String,
    ) -> SessionRow {
        SessionRow {
            simulation_id: self.simulation_id.clone(),
            start_time: self.started_at,
            end_time: Some(Utc::now()),
            duration_seconds: self.duration_seconds,
            symbol: self.instrument.canonical().to_string(),
            algorithm_params: format_params(params),
            final_stats: Some(final_stats),
            status,
        }
    }
}

fn format_params(params: &QuoterParams) -> String {
    format!(
        "gamma={},sigma={},T={},kappa={}",
        params.gamma, params.sigma, params.time_horizon, params.kappa
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use stoikov_persist::SessionStatus;

    #[test]
    fn test_session_id_shape() {
        let session = Session::start(Instrument::Btc, 120);
        assert!(session.simulation_id.starts_with("sim_"));
        assert_eq!(session.duration_seconds, 120);
    }

    #[test]
    fn test_opening_row() {
        let session = Session::start(Instrument::Btc, 120);
        let row = session.opening_row(&QuoterParams::default());
        assert_eq!(row.status, SessionStatus::Running);
        assert!(row.end_time.is_none());
        assert!(row.final_stats.is_none());
        assert_eq!(row.symbol, "BTCUSDT");
        assert!(row.algorithm_params.contains("gamma=0.1"));
    }

    #[test]
    fn test_closing_row_supersedes() {
        let session = Session::start(Instrument::Eth, 60);
        let row = session.closing_row(
            &QuoterParams::default(),
            SessionStatus::Halted,
            "total_pnl=-11".to_string(),
        );
        assert_eq!(row.simulation_id, session.simulation_id);
        assert_eq!(row.status, SessionStatus::Halted);
        assert!(row.end_time.is_some());
        assert_eq!(row.final_stats.as_deref(), Some("total_pnl=-11"));
    }
}
