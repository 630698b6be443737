//! The watch loop: periodically evaluates the ledger heartbeat and logs it.

use crate::config::ServerConfig;
use crate::host::Host;
use anyhow::Result;
use ownerheir_core::Clock;
use ownerheir_ledger::{HeartbeatAction, HeartbeatStatus};
use std::sync::Arc;
use std::time::Duration;

/// Run the watch loop. Blocks forever (until shutdown signal).
pub async fn run(config: ServerConfig, clock: Arc<dyn Clock>) -> Result<()> {
    log::info!("OwnerHeir watch starting…");
    log::info!(
        "  Interval:   {} seconds ({:.1} hours)",
        config.server.check_interval_secs,
        config.server.check_interval_secs as f64 / 3600.0
    );
    log::info!("  Data dir:   {}", config.server.data_dir.display());

    let interval = Duration::from_secs(config.server.check_interval_secs);
    let host = Host::new(config, clock);

    // Run first check immediately, then loop
    let mut first = true;
    loop {
        if !first {
            log::info!(
                "Sleeping {} seconds until next check…",
                interval.as_secs()
            );
            tokio::time::sleep(interval).await;
        }
        first = false;

        match run_check_cycle(&host) {
            Ok(_) => log::info!("Check cycle completed successfully."),
            Err(e) => log::error!("Check cycle failed: {:#}", e),
        }
    }
}

/// Execute a single check cycle: load the ledger, evaluate and report its heartbeat.
pub fn run_check_cycle(host: &Host) -> Result<HeartbeatStatus> {
    let (ledger, status) = host.status()?;
    log::info!(
        "Owner {} | heir {} | balance {}",
        ledger.owner(),
        ledger.heir(),
        ledger.balance()
    );
    match host.last_heartbeat() {
        Ok(Some(at)) => log::info!("Last journaled heartbeat: {}", at),
        Ok(None) => log::info!("No heartbeat journaled since init"),
        Err(e) => log::warn!("Could not read event journal: {:#}", e),
    }
    report(&status);
    Ok(status)
}

fn report(status: &HeartbeatStatus) {
    match status.action {
        HeartbeatAction::Healthy => log::info!(
            "Heartbeat healthy: {:.0}% of cooldown elapsed, {:.1} days remaining",
            status.elapsed_fraction * 100.0,
            status.days_remaining()
        ),
        HeartbeatAction::CheckinRecommended => log::warn!(
            "⚠️  Check-in recommended: {:.1} days until the heir may take possession (at {})",
            status.days_remaining(),
            status.possession_available_at
        ),
        HeartbeatAction::CheckinRequired => log::warn!(
            "🔴 CRITICAL: {:.1} days left. Owner {} must withdraw (0 is enough) before {}",
            status.days_remaining(),
            status.owner,
            status.possession_available_at
        ),
        HeartbeatAction::Expired => log::warn!(
            "Cooldown elapsed since {}: heir {} may take possession now",
            status.possession_available_at,
            status.heir
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ownerheir_core::{ManualClock, Signer, Timestamp};
    use ownerheir_ledger::COOLDOWN_PERIOD;
    use tempfile::tempdir;

    #[test]
    fn test_check_cycle_tracks_clock() {
        let dir = tempdir().unwrap();
        let mut config = ServerConfig::default();
        config.server.data_dir = dir.path().to_path_buf();
        let clock = Arc::new(ManualClock::new(Timestamp::from_unix_secs(0)));
        let host = Host::new(config, clock.clone());

        assert!(run_check_cycle(&host).is_err());

        let owner = Signer::generate();
        host.init(&owner, Signer::generate().principal()).unwrap();
        assert_eq!(
            run_check_cycle(&host).unwrap().action,
            HeartbeatAction::Healthy
        );

        clock.advance(COOLDOWN_PERIOD);
        assert_eq!(
            run_check_cycle(&host).unwrap().action,
            HeartbeatAction::Expired
        );
    }
}
