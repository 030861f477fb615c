//! Game audio subsystem: a bounded pool of effect channels, a two-slot music
//! pipeline with fade transitions, and the device lifecycle around both.
//!
//! This crate provides:
//! - [`AudioEngine`]: facade owning the device, pool and music pipeline
//! - [`ChannelPool`] / [`SoundHandle`]: bounded playback slots with
//!   resource-tag exclusivity
//! - [`MusicPipeline`]: current + pending track slots with fades
//! - [`AudioDevice`]: trait seam over the platform mixer
//! - [`KiraDevice`]: production device backed by kira
//! - [`AudioSettings`]: persisted audio preferences
//!
//! Everything runs on the main simulation thread; the only asynchronous input
//! is the completion queue ([`bridge`]) fed by the device's mixing context
//! and drained once per [`AudioEngine::update`].

pub mod bridge;
pub mod cache;
pub mod device;
pub mod engine;
pub mod kira_device;
pub mod music;
pub mod pool;
pub mod settings;

#[cfg(test)]
mod test_utils;

pub use bridge::{CompletionBridge, FinishedSink};
pub use cache::SoundCache;
pub use device::{
    AudioDevice, ChannelId, ChannelTarget, DeviceSpec, FadeState, MAX_VOLUME, MusicId, OpenSpec,
    ResourceTag, SoundId,
};
pub use engine::AudioEngine;
pub use kira_device::KiraDevice;
pub use music::MusicPipeline;
pub use pool::{ChannelPool, DEFAULT_CHANNELS, MIN_CHANNELS, SoundHandle};
pub use settings::AudioSettings;
