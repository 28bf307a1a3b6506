use swarm_common::{
    audit::{CsvRecorder, MemoryRecorder, NullRecorder},
    crypto::hash::digest_report_payload,
    env::{envelope::Envelope, report::Report},
    error::ConfigurationError,
    utils::AgentId,
};
use swarm_consensus::{
    consensus::{events::CENTRAL_LOG_HEADER, Rejection},
    AggregatorSettings, ConsensusAggregator, EventKind, ProtocolEvent, QuorumPolicy,
};

fn settings(n: usize, f: usize, max_rounds_per_view: u64) -> AggregatorSettings {
    AggregatorSettings {
        policy: QuorumPolicy::new(n, f),
        max_rounds_per_view,
        true_token_count: 10,
    }
}

fn roster(n: usize) -> impl Iterator<Item = AgentId> {
    (0..n).map(AgentId::robot)
}

fn aggregator(n: usize, f: usize, max_rounds_per_view: u64) -> ConsensusAggregator {
    ConsensusAggregator::new(settings(n, f, max_rounds_per_view), roster(n), Box::new(NullRecorder)).unwrap()
}

fn report_from(index: usize, tick: u64, count: u32) -> Envelope {
    let id = AgentId::robot(index);
    let payload = Report::new(id.clone(), tick, count).encode().unwrap();
    Envelope::new(id, payload)
}

fn reports(range: std::ops::Range<usize>, tick: u64, count: u32) -> Vec<Envelope> {
    range.map(|i| report_from(i, tick, count)).collect()
}

#[test]
fn test_seven_of_ten_commits_six_does_not() {
    let mut agg = aggregator(10, 3, 100);

    let outcome = agg.process_round(1, reports(0..6, 1, 9));
    assert_eq!(outcome.accepted, 6);
    assert!(outcome.decision.is_none(), "6 matching votes must not commit with n=10, f=3");

    let outcome = agg.process_round(2, reports(6..7, 2, 9));
    let decision = outcome.decision.expect("7 matching votes must commit");
    assert_eq!(decision.agreed_count, 9);
    assert_eq!(decision.votes, 7);
    assert_eq!(decision.sequence, 0);
    assert_eq!(decision.view, 0);

    // Committed: next sequence, clean slate.
    assert_eq!(agg.state().sequence(), 1);
    assert!(agg.state().votes().is_empty());
    assert_eq!(agg.state().decided(), None);
}

#[test]
fn test_integrity_violation_is_never_counted() {
    let mut agg = aggregator(4, 1, 100);

    let id = AgentId::robot(0);
    let mut forged = Report::new(id.clone(), 1, 3);
    forged.payload_digest = digest_report_payload(4);
    let envelope = Envelope::new(id.clone(), forged.encode().unwrap());

    let err = agg.ingest(1, &envelope).unwrap_err();
    assert!(matches!(err, Rejection::Integrity(ref v) if v.sender == id));
    assert!(agg.state().votes().is_empty());
    assert_eq!(agg.state().votes().count(3), 0);
    assert_eq!(agg.state().votes().count(4), 0);

    // The bad report does not help a quorum either.
    let mut inbox = reports(1..3, 1, 3);
    inbox.push(envelope);
    let outcome = agg.process_round(1, inbox);
    assert_eq!(outcome.accepted, 2);
    assert_eq!(outcome.rejected, 1);
    assert!(outcome.decision.is_none());
}

#[test]
fn test_last_report_wins() {
    let mut agg = aggregator(4, 1, 100);

    agg.process_round(1, vec![report_from(0, 1, 5)]);
    agg.process_round(2, vec![report_from(0, 2, 6)]);

    let votes = agg.state().votes();
    assert_eq!(votes.count(5), 0);
    assert_eq!(votes.count(6), 1);
    assert_eq!(votes.total_votes(), 1);

    // Two more agents on 6 make three: quorum for n=4, f=1.
    let outcome = agg.process_round(3, reports(1..3, 3, 6));
    assert_eq!(outcome.decision.unwrap().agreed_count, 6);
}

#[test]
fn test_stalled_view_changes_exactly_once() {
    let mut agg = aggregator(4, 1, 3);

    agg.process_round(1, reports(0..2, 1, 5));
    assert_eq!(agg.state().votes().total_votes(), 2);
    assert!(agg.process_round(2, vec![]).view_change.is_none());

    let outcome = agg.process_round(3, vec![]);
    let change = outcome.view_change.expect("view must change after 3 stalled rounds");
    assert_eq!(change.from_view, 0);
    assert_eq!(change.to_view, 1);
    assert_eq!(change.sequence, 0);

    assert_eq!(agg.state().view(), 1);
    assert_eq!(agg.state().sequence(), 0);
    assert!(agg.state().votes().is_empty());

    // Next stalled round starts a fresh budget.
    assert!(agg.process_round(4, vec![]).view_change.is_none());
    assert_eq!(agg.view_changes().len(), 1);
}

#[test]
fn test_decided_value_is_never_replaced() {
    let mut agg = aggregator(4, 1, 100);

    agg.process_round(1, reports(0..3, 1, 7));
    assert_eq!(agg.decision_for(0).unwrap().agreed_count, 7);

    // Later traffic decides the next sequence, never sequence 0 again.
    agg.process_round(2, reports(0..4, 2, 8));
    assert_eq!(agg.decision_for(0).unwrap().agreed_count, 7);
    assert_eq!(agg.decision_for(1).unwrap().agreed_count, 8);

    let sequences: Vec<u64> = agg.decisions().iter().map(|d| d.sequence).collect();
    assert_eq!(sequences, vec![0, 1]);
}

#[test]
fn test_tampered_report_verifies_with_tampered_value() {
    let mut agg = aggregator(4, 1, 100);

    // A compromised agent with a true tally of 4 adds +3 before digesting.
    let true_tally = 4u32;
    let tampered = true_tally + 3;
    let id = AgentId::robot(3);
    let report = Report::new(id.clone(), 1, tampered);

    assert_eq!(report.payload_digest, digest_report_payload(7));
    assert_ne!(report.payload_digest, digest_report_payload(4));

    let envelope = Envelope::new(id.clone(), report.encode().unwrap());
    assert!(agg.ingest(1, &envelope).is_ok());
    assert_eq!(agg.state().votes().vote_of(&id), Some(7));
}

#[test]
fn test_sender_mismatch_and_malformed_payloads_are_discarded() {
    let recorder = MemoryRecorder::<ProtocolEvent>::new();
    let mut agg = ConsensusAggregator::new(settings(4, 1, 100), roster(4), Box::new(recorder.clone())).unwrap();

    let spoofed = Report::new(AgentId::robot(1), 1, 3).encode().unwrap();
    let inbox = vec![
        Envelope::new(AgentId::robot(0), spoofed),
        Envelope::new(AgentId::robot(2), vec![0xde, 0xad]),
    ];
    let outcome = agg.process_round(1, inbox);

    assert_eq!(outcome.rejected, 2);
    assert!(agg.state().votes().is_empty());

    let kinds: Vec<EventKind> = recorder.rows().iter().map(|e| e.event).collect();
    assert_eq!(kinds, vec![EventKind::SenderMismatch, EventKind::MalformedPayload]);
}

#[test]
fn test_commit_emits_consensus_and_coverage_events() {
    let recorder = MemoryRecorder::<ProtocolEvent>::new();
    let mut agg = ConsensusAggregator::new(settings(4, 1, 100), roster(4), Box::new(recorder.clone())).unwrap();

    let mut inbox = reports(0..3, 1, 8);
    inbox.push(report_from(3, 1, 9));
    let outcome = agg.process_round(1, inbox);

    let summary = outcome.summary.expect("commit must produce a summary");
    assert!((summary.coverage_ratio - 0.8).abs() < 1e-12);
    assert_eq!(summary.per_agent_deviation[&AgentId::robot(0)], 0);
    assert_eq!(summary.per_agent_deviation[&AgentId::robot(3)], 1);

    let rows = recorder.rows();
    let consensus = rows.iter().find(|e| e.event == EventKind::ConsensusReached).unwrap();
    assert_eq!((consensus.view, consensus.seq), (0, 0));
    assert!(consensus.detail.starts_with("agreed_count=8"));
    assert!(consensus.detail.ends_with("qualifying_values=[8]"));
    assert!(rows.iter().any(|e| e.event == EventKind::Coverage));
}

#[test]
fn test_zero_true_token_count_is_rejected_at_startup() {
    let mut bad = settings(4, 1, 100);
    bad.true_token_count = 0;
    assert!(ConsensusAggregator::new(bad, roster(4), Box::new(NullRecorder)).is_err());
}

#[test]
fn test_central_log_layout() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("central_log.csv");
    let recorder = CsvRecorder::<ProtocolEvent>::create(&path, &CENTRAL_LOG_HEADER).unwrap();

    let mut agg = ConsensusAggregator::new(settings(4, 1, 100), roster(4), Box::new(recorder)).unwrap();
    agg.process_round(0, reports(0..3, 0, 2));
    agg.flush();
    drop(agg);

    let content = std::fs::read_to_string(&path).unwrap();
    let mut lines = content.lines();
    assert_eq!(lines.next(), Some("tick,event,view,seq,sender_id,detail"));
    assert_eq!(lines.next(), Some("0,vote,0,0,e-puck_0,value=2 round=0"));
    assert!(content.contains(",consensus_reached,0,0,,agreed_count=2 votes=3 threshold=3 qualifying_values=[2]"));
}

#[test]
fn test_reports_from_agents_off_the_roster_are_never_counted() {
    let recorder = MemoryRecorder::<ProtocolEvent>::new();
    let mut agg = ConsensusAggregator::new(settings(4, 1, 100), roster(4), Box::new(recorder.clone())).unwrap();

    // Three well-formed, self-consistent reports: enough for a quorum of 3
    // if the senders were counted.
    let ghosts: Vec<Envelope> = ["ghost_a", "ghost_b", "ghost_c"]
        .into_iter()
        .map(|name| {
            let id = AgentId::from(name);
            Envelope::new(id.clone(), Report::new(id, 1, 99).encode().unwrap())
        })
        .collect();

    let err = agg.ingest(1, &ghosts[0]).unwrap_err();
    assert_eq!(err, Rejection::UnknownSender { sender: AgentId::from("ghost_a") });

    let outcome = agg.process_round(1, ghosts);
    assert_eq!(outcome.accepted, 0);
    assert_eq!(outcome.rejected, 3);
    assert!(outcome.decision.is_none());
    assert!(agg.state().votes().is_empty());

    let rows = recorder.rows();
    assert_eq!(rows.len(), 4);
    assert!(rows.iter().all(|e| e.event == EventKind::UnknownSender));
    assert_eq!(rows[1].sender_id, Some(AgentId::from("ghost_a")));

    // Roster members still count as usual.
    let outcome = agg.process_round(2, reports(0..3, 2, 5));
    assert_eq!(outcome.decision.unwrap().agreed_count, 5);
}

#[test]
fn test_roster_must_match_quorum_size() {
    let err = ConsensusAggregator::new(settings(4, 1, 100), roster(3), Box::new(NullRecorder))
        .err()
        .expect("a short roster must be rejected");
    assert_eq!(err, ConfigurationError::RosterSize { expected: 4, actual: 3 });

    // Duplicates collapse, so they do not pad a short roster.
    let padded = roster(3).chain(std::iter::once(AgentId::robot(0)));
    assert!(ConsensusAggregator::new(settings(4, 1, 100), padded, Box::new(NullRecorder)).is_err());

    let agg = ConsensusAggregator::new(settings(4, 1, 100), roster(4), Box::new(NullRecorder)).unwrap();
    assert_eq!(agg.roster().len(), 4);
    assert!(agg.roster().contains(&AgentId::robot(3)));
}

#[test]
fn test_consensus_event_lists_every_qualifying_value() {
    let recorder = MemoryRecorder::<ProtocolEvent>::new();
    // n=4, f=2: threshold 2, so two disjoint pairs both qualify.
    let mut agg = ConsensusAggregator::new(settings(4, 2, 100), roster(4), Box::new(recorder.clone())).unwrap();

    let mut inbox = reports(0..2, 1, 5);
    inbox.extend(reports(2..4, 1, 6));
    let outcome = agg.process_round(1, inbox);
    assert_eq!(outcome.decision.unwrap().agreed_count, 6);

    let rows = recorder.rows();
    let consensus = rows.iter().find(|e| e.event == EventKind::ConsensusReached).unwrap();
    assert_eq!(consensus.detail, "agreed_count=6 votes=2 threshold=2 qualifying_values=[6 5]");
}
