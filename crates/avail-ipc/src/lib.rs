//! Producer side of availability reporting: one long-lived unix socket per process to the
//! availability manager, carrying serialized batches.

pub mod client;
pub mod frame;

pub use client::*;
pub use frame::*;

use avail_core::{serialize, InterfaceAvailability};
use tracing::debug;

/// Serialize `batch` and send it as one availability request. Nothing is read back.
///
/// An error here means the reporting channel is broken; callers are expected to treat it
/// as fatal for the process.
pub fn flush_availabilities(client: &mut AvailabilityClient, batch: &[InterfaceAvailability]) -> Result<(), TransportError> {
    let data = serialize(batch);
    debug!(records = batch.len(), bytes = data.len(), "flushing interface availabilities");
    client.send(AVAILABILITY_REQUEST, &data)
}
