//! One end-to-end sweep: scan, select, index, clear.

use sasweep_device::{Device, DeviceError};
use thiserror::Error;

use crate::aggregator::{aggregate, PeerSessionCounts, RankedPeer, Selection};
use crate::config::SweepConfig;
use crate::indexer::{index_all, PeerAssociations};
use crate::logger::Logger;
use crate::mitigator::{mitigate, MitigationOptions, MitigationReport};
use crate::notifier::Notifier;
use crate::sleeper::Sleeper;

/// Errors that abort a sweep.
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("flow session scan failed: {0}")]
    SessionFetch(#[source] DeviceError),

    #[error("security association scan failed: {0}")]
    AssociationFetch(#[source] DeviceError),
}

/// Outcome of a completed sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub selection: Selection,
    pub report: MitigationReport,
}

impl RunOutcome {
    /// Whether the thresholds were met and mitigation ran.
    pub fn attempted(&self) -> bool {
        self.selection.proceed
    }
}

/// Run one sweep against `device`.
///
/// Returns `Ok` with `attempted() == false` when the table is below the
/// global minimum. Clear failures are carried in the report; only a failed
/// table scan is an error.
pub fn run_sweep<D, S, L, N>(
    config: &SweepConfig,
    device: &D,
    sleeper: &S,
    logger: &L,
    notifier: &N,
) -> Result<RunOutcome, SweepError>
where
    D: Device + ?Sized,
    S: Sleeper + ?Sized,
    L: Logger + ?Sized,
    N: Notifier + ?Sized,
{
    let thresholds = &config.thresholds;

    logger.info(&format!(
        "Looking for {}+ {} sessions and {}+ peer sessions, top {} are {}, logging level {}",
        thresholds.min_total_sessions,
        config.protocol,
        thresholds.min_peer_sessions,
        thresholds.top_talkers,
        if config.dry_run { "shown (DRY RUN)" } else { "cleared" },
        config.debug_level
    ));

    notify(notifier, logger, "starting flow session table scan.");

    logger.debug("Start collecting flow sessions (this may take a minute)...");
    let sessions = match device.session_table(&config.protocol, config.fetch_timeout) {
        Ok(table) => table,
        Err(e) => return Err(abort(notifier, logger, SweepError::SessionFetch(e))),
    };
    logger.debug("Finished collecting flow sessions.");
    logger.debug(&format!(
        "Number of sessions in flow table: {}",
        sessions.displayed_session_count
    ));

    let selection = aggregate(&sessions, thresholds);

    if !selection.proceed {
        logger.info(&format!(
            "Found {} sessions in flow table total, preset minimum is {}, nothing to do.",
            selection.total_sessions, thresholds.min_total_sessions
        ));
        notify(notifier, logger, "all done, exiting.");
        return Ok(RunOutcome {
            selection,
            report: MitigationReport::default(),
        });
    }

    let talkers = PeerSessionCounts::from_sessions(&sessions.sessions).ranked_at_least(0);
    drop(sessions);
    logger.trace(&format!("All talkers: {}", describe(&talkers)));
    logger.trace(&format!("All suspicious peers: {}", describe(&selection.suspicious)));
    logger.debug(&format!("Top talkers: {}", addresses(&selection)));
    logger.info(&format!(
        "Found {} unique peers, with {} peers having {} or more sessions open. Top {} peers are:",
        selection.unique_peers,
        selection.suspicious.len(),
        thresholds.min_peer_sessions,
        thresholds.top_talkers
    ));
    for peer in &selection.ranked {
        logger.info(&format!("  {} ({} sessions)", peer.address, peer.sessions));
    }

    let table = match device.association_table() {
        Ok(table) => table,
        Err(e) => return Err(abort(notifier, logger, SweepError::AssociationFetch(e))),
    };
    let all = index_all(&table);
    logger.trace(&format!(
        "Security associations for {} gateways in table",
        all.len()
    ));
    logger.trace(&format!("All SA indices: {}", describe_indices(&all)));
    let associations: PeerAssociations = all.project(&selection.ranked);
    for peer in &selection.ranked {
        logger.info(&format!(
            "Indexes for IP {}: {}",
            peer.address,
            associations.indices_for(&peer.address).join(" ")
        ));
    }

    notify(
        notifier,
        logger,
        &format!(
            "{} {} peers to clear - {}",
            if config.dry_run { "dry_run: found" } else { "selected" },
            selection.ranked.len(),
            addresses(&selection)
        ),
    );

    if config.dry_run {
        logger.info("Dry run, not executing any operational commands.");
    } else {
        logger.info(&format!(
            "Clearing ike sa and ipsec sa indices for top {} talking peers...",
            selection.ranked.len()
        ));
    }

    let report = mitigate(
        &selection.ranked,
        &associations,
        MitigationOptions {
            dry_run: config.dry_run,
            settle_delay: config.settle_delay,
        },
        device,
        sleeper,
        logger,
    );

    if report.failed() > 0 {
        logger.info(&format!(
            "{} of {} clear commands failed.",
            report.failed(),
            report.attempted()
        ));
    }

    notify(notifier, logger, "all done, exiting.");
    logger.info("All done.");

    Ok(RunOutcome { selection, report })
}

fn notify<N, L>(notifier: &N, logger: &L, message: &str)
where
    N: Notifier + ?Sized,
    L: Logger + ?Sized,
{
    if let Err(e) = notifier.notify(message) {
        logger.error(&format!("notification failed: {}", e));
    }
}

fn abort<N, L>(notifier: &N, logger: &L, error: SweepError) -> SweepError
where
    N: Notifier + ?Sized,
    L: Logger + ?Sized,
{
    notify(notifier, logger, &format!("aborted: {}", error));
    error
}

fn addresses(selection: &Selection) -> String {
    selection
        .ranked
        .iter()
        .map(|p| p.address.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

fn describe(peers: &[RankedPeer]) -> String {
    peers
        .iter()
        .map(|p| format!("{}={}", p.address, p.sessions))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `gateway=[i1 i2]` pairs, sorted by gateway.
fn describe_indices(associations: &PeerAssociations) -> String {
    let mut entries: Vec<(&str, &[String])> = associations.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
        .into_iter()
        .map(|(gateway, indices)| format!("{}=[{}]", gateway, indices.join(" ")))
        .collect::<Vec<_>>()
        .join(", ")
}
