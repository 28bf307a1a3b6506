use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use rand::{rngs::StdRng, Rng, SeedableRng};
use tokio::sync::{
    mpsc::{self, UnboundedReceiver, UnboundedSender},
    Mutex,
};
use tracing::{debug, trace};

use swarm_common::{env::envelope::Envelope, error::ChannelError, utils::AgentId};

use super::ports::CommunicationChannel;

/// Signal strength stamped on delivered envelopes, in dBm.
const RSSI_RANGE: std::ops::Range<f64> = -80.0..-40.0;

/// Counters for one delivery pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryStats {
    pub sent: usize,
    pub delivered: usize,
    pub dropped: usize,
}

struct MediumState {
    inboxes: BTreeMap<AgentId, UnboundedSender<Envelope>>,
    pending: Vec<Envelope>,
    rng: StdRng,
    closed: bool,
}

/// Shared single-hop broadcast medium.
///
/// Sends are buffered and only handed to the other endpoints when
/// [`BroadcastMedium::deliver`] runs at the end of a round, so a message sent
/// in round `r` is visible to receivers from round `r + 1`. Each
/// (message, receiver) pair is dropped independently with
/// `loss_probability`.
pub struct BroadcastMedium {
    loss_probability: f64,
    state: Mutex<MediumState>,
}

impl BroadcastMedium {
    pub fn new(loss_probability: f64, seed: u64) -> Arc<Self> {
        Arc::new(Self {
            loss_probability: loss_probability.clamp(0.0, 1.0),
            state: Mutex::new(MediumState {
                inboxes: BTreeMap::new(),
                pending: Vec::new(),
                rng: StdRng::seed_from_u64(seed),
                closed: false,
            }),
        })
    }

    /// Registers `id` on the medium and hands back its endpoint.
    pub async fn attach(self: &Arc<Self>, id: AgentId) -> MediumEndpoint {
        let (tx, rx) = mpsc::unbounded_channel();
        self.state.lock().await.inboxes.insert(id.clone(), tx);
        debug!("📡 [{}] attached to medium", id);
        MediumEndpoint {
            id,
            medium: Arc::clone(self),
            inbox: rx,
        }
    }

    async fn enqueue(&self, sender: &AgentId, payload: Vec<u8>) -> Result<(), ChannelError> {
        let mut state = self.state.lock().await;
        if state.closed {
            return Err(ChannelError::Closed);
        }
        if !state.inboxes.contains_key(sender) {
            return Err(ChannelError::UnknownEndpoint(sender.clone()));
        }
        state.pending.push(Envelope::new(sender.clone(), payload));
        Ok(())
    }

    /// Round barrier: fans out everything sent since the last call.
    ///
    /// Pending messages are ordered by sender before the loss draws so a
    /// seeded run delivers the same messages regardless of task scheduling.
    pub async fn deliver(&self) -> DeliveryStats {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let mut pending = std::mem::take(&mut state.pending);
        pending.sort_by(|a, b| a.sender_id.cmp(&b.sender_id));

        let mut stats = DeliveryStats { sent: pending.len(), ..Default::default() };
        for envelope in pending {
            for (receiver, inbox) in &state.inboxes {
                if *receiver == envelope.sender_id {
                    continue;
                }
                if state.rng.gen_bool(self.loss_probability) {
                    trace!("🕳️ Dropped message {} -> {}", envelope.sender_id, receiver);
                    stats.dropped += 1;
                    continue;
                }
                let mut copy = envelope.clone();
                copy.rssi = state.rng.gen_range(RSSI_RANGE);
                copy.hop_count = 1;
                if inbox.send(copy).is_ok() {
                    stats.delivered += 1;
                }
            }
        }
        stats
    }

    /// Rejects all further sends. Already delivered messages stay readable.
    pub async fn close(&self) {
        let mut state = self.state.lock().await;
        state.closed = true;
        state.pending.clear();
    }
}

/// One participant's handle on a [`BroadcastMedium`].
pub struct MediumEndpoint {
    id: AgentId,
    medium: Arc<BroadcastMedium>,
    inbox: UnboundedReceiver<Envelope>,
}

#[async_trait]
impl CommunicationChannel for MediumEndpoint {
    async fn send(&self, payload: Vec<u8>) -> Result<(), ChannelError> {
        self.medium.enqueue(&self.id, payload).await
    }

    fn receive(&mut self) -> Vec<Envelope> {
        let mut drained = Vec::new();
        while let Ok(envelope) = self.inbox.try_recv() {
            drained.push(envelope);
        }
        drained
    }
}
