use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use swarm_common::{
    audit::{NullRecorder, Recorder},
    crypto::hash::digest,
    env::{report::Report, Role},
    utils::{AgentId, RoundNumber},
};

use crate::channel::CommunicationChannel;

use super::{
    adversary::ValueTransform,
    log::{AgentLogRow, RowKind, OUTBOUND_HEADER},
    sensing::Sensor,
};

/// Local view of one robot. Owned by its agent task alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentState {
    pub id: AgentId,
    pub is_compromised: bool,
    pub local_token_tally: u32,
    pub reporting_interval: u64,
    pub role: Role,
}

/// What an agent did during one round.
#[derive(Debug, Clone, Default)]
pub struct StepOutcome {
    pub round: RoundNumber,
    pub sighted: bool,
    pub overheard: usize,
    pub sent: Option<Report>,
}

/// Per-robot process: sense, tally, overhear, report on cadence.
///
/// A compromised agent is an ordinary agent with a [`ValueTransform`]
/// applied to the reported count before it is digested, so its reports
/// still pass integrity checks.
pub struct Agent<S, C> {
    state: AgentState,
    sensor: S,
    channel: C,
    transform: Option<ValueTransform>,
    log: Box<dyn Recorder<AgentLogRow>>,
}

impl<S: Sensor, C: CommunicationChannel> Agent<S, C> {
    pub fn new(id: AgentId, reporting_interval: u64, sensor: S, channel: C) -> Self {
        Self {
            state: AgentState {
                id,
                is_compromised: false,
                local_token_tally: 0,
                reporting_interval,
                role: Role::Replica,
            },
            sensor,
            channel,
            transform: None,
            log: Box::new(NullRecorder),
        }
    }

    pub fn with_log(mut self, log: Box<dyn Recorder<AgentLogRow>>) -> Self {
        self.log = log;
        self
    }

    /// Marks the agent compromised; every report goes through `transform`.
    pub fn compromised(mut self, transform: ValueTransform) -> Self {
        self.state.is_compromised = true;
        self.transform = Some(transform);
        self
    }

    pub fn id(&self) -> &AgentId {
        &self.state.id
    }

    pub fn state(&self) -> &AgentState {
        &self.state
    }

    pub async fn step(&mut self, round: RoundNumber) -> StepOutcome {
        let sighted = self.observe(round);
        let overheard = self.overhear(round);
        let sent = if self.is_report_round(round) {
            self.report(round).await
        } else {
            None
        };

        StepOutcome { round, sighted, overheard, sent }
    }

    fn is_report_round(&self, round: RoundNumber) -> bool {
        round.checked_rem(self.state.reporting_interval) == Some(0)
    }

    fn observe(&mut self, round: RoundNumber) -> bool {
        let sighted = self.sensor.sense_tokens();
        if sighted {
            self.state.local_token_tally = self.state.local_token_tally.saturating_add(1);
            debug!("👀 [{}] token sighted (tally {})", self.state.id, self.state.local_token_tally);
        }

        let mut row = self.row(round, RowKind::State, "", String::new(), self.state.id.clone(), 0.0, 0);
        row.token_seen = u8::from(sighted);
        row.battery = self.sensor.battery_level();
        row.role = self.state.role.as_str().to_string();
        self.log.record(&row);

        sighted
    }

    /// Drains overheard traffic. Audit only; peers' reports never change
    /// the local tally.
    fn overhear(&mut self, round: RoundNumber) -> usize {
        let inbox = self.channel.receive();
        for envelope in &inbox {
            let header = match Report::decode(&envelope.payload) {
                Ok(_) => OUTBOUND_HEADER,
                Err(_) => "",
            };
            let hash = digest(&envelope.payload);
            let row = self.row(
                round,
                RowKind::Inbound,
                header,
                hash.to_hex(),
                envelope.sender_id.clone(),
                envelope.rssi,
                envelope.hop_count,
            );
            self.log.record(&row);
        }
        inbox.len()
    }

    async fn report(&mut self, round: RoundNumber) -> Option<Report> {
        let mut token_count = self.state.local_token_tally;
        if let Some(transform) = self.transform.as_mut() {
            token_count = transform(token_count);
            debug!(
                "😈 [{}] reporting {} instead of {}",
                self.state.id, token_count, self.state.local_token_tally
            );
        }

        let report = Report::new(self.state.id.clone(), round, token_count);
        let payload = match report.encode() {
            Ok(payload) => payload,
            Err(e) => {
                warn!("⚠️ [{}] could not encode report: {}", self.state.id, e);
                return None;
            }
        };

        if let Err(e) = self.channel.send(payload).await {
            warn!("⚠️ [{}] report for round {} lost: {}", self.state.id, round, e);
            return None;
        }

        let row = self.row(
            round,
            RowKind::Outbound,
            OUTBOUND_HEADER,
            report.payload_digest.to_hex(),
            self.state.id.clone(),
            0.0,
            0,
        );
        self.log.record(&row);

        Some(report)
    }

    #[allow(clippy::too_many_arguments)]
    fn row(
        &self,
        tick: RoundNumber,
        kind: RowKind,
        header: &str,
        payload_hash: String,
        sender_id: AgentId,
        rssi: f64,
        hop_count: u8,
    ) -> AgentLogRow {
        let (x, y) = self.sensor.position();
        let [prox0, prox1, prox2] = self.sensor.proximity_readings();
        AgentLogRow {
            tick,
            kind,
            header: header.to_string(),
            payload_hash,
            sender_id,
            rssi,
            hop_count,
            x,
            y,
            prox0,
            prox1,
            prox2,
            token_seen: 0,
            battery: 0.0,
            role: String::new(),
            is_compromised: u8::from(self.state.is_compromised),
        }
    }

    /// Flushes the audit log and hands back the final local state.
    pub fn finish(mut self) -> AgentState {
        self.log.flush();
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::adversary::{fixed_offset, AdversarialPolicy};
    use crate::channel::BroadcastMedium;
    use swarm_common::{audit::MemoryRecorder, crypto::hash::digest_report_payload};

    /// Sees a fresh token on the listed rounds only.
    struct ScriptedSensor {
        sightings: Vec<bool>,
        cursor: usize,
    }

    impl ScriptedSensor {
        fn new(sightings: Vec<bool>) -> Self {
            Self { sightings, cursor: 0 }
        }
    }

    impl Sensor for ScriptedSensor {
        fn sense_tokens(&mut self) -> bool {
            let seen = self.sightings.get(self.cursor).copied().unwrap_or(false);
            self.cursor += 1;
            seen
        }

        fn position(&self) -> (f64, f64) {
            (1.0, 2.0)
        }

        fn proximity_readings(&self) -> [f64; 3] {
            [0.0, 0.5, 1.0]
        }

        fn battery_level(&self) -> f64 {
            0.75
        }
    }

    #[tokio::test]
    async fn test_reports_only_on_cadence() {
        let medium = BroadcastMedium::new(0.0, 1);
        let endpoint = medium.attach(AgentId::robot(0)).await;
        let mut agent = Agent::new(AgentId::robot(0), 3, ScriptedSensor::new(vec![true; 6]), endpoint);

        let mut sent_rounds = Vec::new();
        for round in 0..6 {
            if agent.step(round).await.sent.is_some() {
                sent_rounds.push(round);
            }
        }
        assert_eq!(sent_rounds, vec![0, 3]);
        assert_eq!(agent.state().local_token_tally, 6);
    }

    #[tokio::test]
    async fn test_compromised_agent_digests_the_tampered_value() {
        let medium = BroadcastMedium::new(0.0, 1);
        let endpoint = medium.attach(AgentId::robot(0)).await;
        let mut agent = Agent::new(AgentId::robot(0), 4, ScriptedSensor::new(vec![true; 4]), endpoint)
            .compromised(fixed_offset(AdversarialPolicy::Inflate, 3));

        for round in 1..4 {
            agent.step(round).await;
        }
        let outcome = agent.step(4).await;
        let report = outcome.sent.expect("round 4 is a report round");

        assert_eq!(agent.state().local_token_tally, 4);
        assert_eq!(report.token_count, 7);
        assert_eq!(report.payload_digest, digest_report_payload(7));
        assert!(report.verify().is_ok());
    }

    #[tokio::test]
    async fn test_overheard_reports_are_logged_not_counted() {
        let medium = BroadcastMedium::new(0.0, 1);
        let peer = medium.attach(AgentId::robot(1)).await;
        let endpoint = medium.attach(AgentId::robot(0)).await;

        let log = MemoryRecorder::<AgentLogRow>::new();
        let mut agent = Agent::new(AgentId::robot(0), 100, ScriptedSensor::new(vec![false; 2]), endpoint)
            .with_log(Box::new(log.clone()));

        let payload = Report::new(AgentId::robot(1), 0, 5).encode().unwrap();
        peer.send(payload.clone()).await.unwrap();
        medium.deliver().await;

        let outcome = agent.step(1).await;
        assert_eq!(outcome.overheard, 1);
        assert_eq!(agent.state().local_token_tally, 0);

        let rows = log.rows();
        let kinds: Vec<RowKind> = rows.iter().map(|r| r.kind).collect();
        assert_eq!(kinds, vec![RowKind::State, RowKind::Inbound]);

        let state = &rows[0];
        assert_eq!(state.role, "replica");
        assert_eq!(state.battery, 0.75);
        assert_eq!(state.is_compromised, 0);

        let inbound = &rows[1];
        assert_eq!(inbound.header, "PREPARE");
        assert_eq!(inbound.sender_id, AgentId::robot(1));
        assert_eq!(inbound.payload_hash, digest(&payload).to_hex());
        assert_eq!(inbound.hop_count, 1);
    }

    #[tokio::test]
    async fn test_forged_report_is_logged_with_its_raw_digest() {
        let medium = BroadcastMedium::new(0.0, 1);
        let peer = medium.attach(AgentId::robot(1)).await;
        let endpoint = medium.attach(AgentId::robot(0)).await;

        let log = MemoryRecorder::<AgentLogRow>::new();
        let mut agent = Agent::new(AgentId::robot(0), 100, ScriptedSensor::new(vec![false]), endpoint)
            .with_log(Box::new(log.clone()));

        // Declares 3 but carries the digest of 4.
        let mut forged = Report::new(AgentId::robot(1), 0, 3);
        forged.payload_digest = digest_report_payload(4);
        let raw = forged.encode().unwrap();
        peer.send(raw.clone()).await.unwrap();
        medium.deliver().await;

        agent.step(1).await;

        let rows = log.rows();
        let inbound = rows.iter().find(|r| r.kind == RowKind::Inbound).unwrap();
        assert_eq!(inbound.payload_hash, digest(&raw).to_hex());
        assert_ne!(inbound.payload_hash, digest_report_payload(3).to_hex());
        assert_ne!(inbound.payload_hash, digest_report_payload(4).to_hex());
    }

    #[tokio::test]
    async fn test_send_failure_is_not_fatal() {
        let medium = BroadcastMedium::new(0.0, 1);
        let endpoint = medium.attach(AgentId::robot(0)).await;
        let mut agent = Agent::new(AgentId::robot(0), 1, ScriptedSensor::new(vec![true, true]), endpoint);

        medium.close().await;
        assert!(agent.step(0).await.sent.is_none());
        assert!(agent.step(1).await.sent.is_none());
        assert_eq!(agent.finish().local_token_tally, 2);
    }
}
