//! Service layer: the hub state machine and its event channel.

pub mod handle;
pub mod hub;

pub use handle::HubHandle;
pub use hub::{Accepted, Delivery, Hub};
