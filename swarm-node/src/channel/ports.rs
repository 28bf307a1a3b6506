use async_trait::async_trait;

use swarm_common::{env::envelope::Envelope, error::ChannelError};

/// Broadcast primitive shared by agents and the aggregator.
///
/// Lossy: a sent payload may never show up in any `receive` call, and callers
/// must stay correct under arbitrary loss. `receive` is a non-blocking drain
/// of whatever has been delivered so far; it is finite and not restartable.
#[async_trait]
pub trait CommunicationChannel: Send + Sync {
    async fn send(&self, payload: Vec<u8>) -> Result<(), ChannelError>;

    fn receive(&mut self) -> Vec<Envelope>;
}
