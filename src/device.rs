use std::path::Path;

use anyhow::Result;

use crate::bridge::FinishedSink;

/// Maximum volume accepted by the device. Setters clamp to this.
pub const MAX_VOLUME: f32 = 1.0;

/// Handle for referencing decoded sound data owned by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SoundId(pub u64);

/// Handle for referencing a loaded music track owned by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MusicId(pub u64);

/// Opaque identifier of one playing channel, assigned by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId(pub u64);

/// Exclusivity group for short effects that must not stack.
pub type ResourceTag = u32;

/// Fade status of a channel or of the music stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FadeState {
    #[default]
    None,
    FadingIn,
    FadingOut,
}

/// Addressing for channel-wide device commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelTarget {
    One(ChannelId),
    All,
}

/// Parameters requested when opening the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceSpec {
    pub sample_rate: u32,
    pub channels: u16,
    pub buffer_size: u16,
}

impl Default for DeviceSpec {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 2,
            buffer_size: 2048,
        }
    }
}

/// What the device reports about its currently open state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenSpec {
    pub sample_rate: u32,
    pub channels: u16,
    /// How many times the device has been opened since process start.
    pub times_opened: u32,
}

/// Abstraction over the platform mixing engine.
/// Implementations: KiraDevice (production), MockDevice (testing).
///
/// Play/stop/volume calls are fire-and-forget; only `open`/`close` may block.
/// Naturally finished channels are reported through the [`FinishedSink`]
/// registered with `set_finished_sink`, possibly from the device's own
/// mixing context.
pub trait AudioDevice {
    fn open(&mut self, spec: DeviceSpec) -> Result<()>;
    fn close(&mut self);
    fn is_open(&self) -> bool;
    fn query_spec(&self) -> Option<OpenSpec>;

    /// Set the number of mixing channels; returns the count actually applied.
    fn allocate_channels(&mut self, count: usize) -> usize;

    fn load_sound(&mut self, path: &Path) -> Result<SoundId>;

    /// Start a sound. `loops` of 0 plays once; negative loops forever.
    /// Returns `None` when the device has no channel to spare.
    fn play(&mut self, sound: SoundId, loops: i32, volume: f32) -> Option<ChannelId>;
    fn halt(&mut self, target: ChannelTarget);
    fn pause(&mut self, target: ChannelTarget);
    fn resume(&mut self, target: ChannelTarget);
    fn set_volume(&mut self, target: ChannelTarget, volume: f32);

    /// Begin a fade-out; returns false if the channel is not playing.
    fn fade_out(&mut self, channel: ChannelId, ms: u32) -> bool;
    fn is_playing(&self, target: ChannelTarget) -> bool;
    fn fade_state(&self, channel: ChannelId) -> FadeState;

    fn load_music(&mut self, path: &Path) -> Result<MusicId>;
    fn play_music(&mut self, music: MusicId, loops: i32, fade_in_ms: u32) -> Result<()>;
    fn halt_music(&mut self);
    fn fade_out_music(&mut self, ms: u32) -> bool;
    fn pause_music(&mut self);
    fn resume_music(&mut self);
    fn is_music_playing(&self) -> bool;
    fn is_music_paused(&self) -> bool;
    fn music_fade_state(&self) -> FadeState;
    /// Seek the music stream; returns false if the device cannot seek now.
    fn set_music_position(&mut self, seconds: f64) -> bool;
    fn set_music_volume(&mut self, volume: f32);
    fn free_music(&mut self, music: MusicId);

    /// Register the queue that receives naturally finished channel ids.
    fn set_finished_sink(&mut self, sink: FinishedSink);

    /// Give the device a chance to reap finished channels. Called once per
    /// engine tick; devices with a real completion callback may leave this
    /// as the default no-op.
    fn pump(&mut self) {}

    /// Drop every loaded sound and music resource.
    fn release_all(&mut self);
}
