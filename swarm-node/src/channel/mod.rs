pub mod medium;
pub mod ports;

pub use medium::{BroadcastMedium, DeliveryStats, MediumEndpoint};
pub use ports::CommunicationChannel;
