//! Audio output and device collaborators.
//!
//! The engine never talks to hardware directly. It sees the speaker path as
//! an [`AudioSink`] and the assistant's conversation state as a
//! [`DeviceStateSource`]. On a host build the sink is backed by `rodio`.

mod output;
mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use output::RodioSink;
pub use types::{
    AudioSink, BatterySource, DeviceState, DeviceStateSource, PcmPacket, SharedDeviceState,
};

#[cfg(test)]
mod tests;
