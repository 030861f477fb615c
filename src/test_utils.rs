//! Scripted in-memory device shared by the unit tests.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Result, anyhow};

use crate::bridge::FinishedSink;
use crate::device::{
    AudioDevice, ChannelId, ChannelTarget, DeviceSpec, FadeState, MusicId, OpenSpec, SoundId,
};

/// Records every command it receives and lets tests flip playback state by
/// hand (finished channels, ended music, failing loads, refused plays).
pub struct MockDevice {
    pub fail_open: bool,
    pub fail_loads: bool,
    pub refuse_plays: bool,

    open: bool,
    pub open_spec: Option<DeviceSpec>,
    pub times_opened: u32,
    pub allocated_channels: usize,

    next_id: u64,
    pub loaded_sounds: Vec<SoundId>,

    next_channel: u64,
    active: HashSet<ChannelId>,
    fading_out: HashSet<ChannelId>,
    pub halted: Vec<ChannelId>,
    pub halted_all: bool,
    pub fade_commands: usize,
    pub last_play_volume: Option<f32>,
    pub channel_volume: Option<f32>,

    pub loaded_music: Vec<MusicId>,
    pub freed_music: Vec<MusicId>,
    pub music_playing: bool,
    pub music_paused: bool,
    pub music_fade: FadeState,
    pub music_volume: Option<f32>,
    pub music_play_count: usize,
    pub music_halt_count: usize,
    pub music_fade_out_count: usize,
    pub music_pause_count: usize,
    pub music_resume_count: usize,
    pub last_music_id: Option<MusicId>,
    pub last_music_loops: Option<i32>,
    pub last_music_position: Option<f64>,

    sink: Option<FinishedSink>,
}

impl MockDevice {
    pub fn new() -> Self {
        Self {
            fail_open: false,
            fail_loads: false,
            refuse_plays: false,
            open: false,
            open_spec: None,
            times_opened: 0,
            allocated_channels: 32,
            next_id: 1,
            loaded_sounds: Vec::new(),
            next_channel: 1,
            active: HashSet::new(),
            fading_out: HashSet::new(),
            halted: Vec::new(),
            halted_all: false,
            fade_commands: 0,
            last_play_volume: None,
            channel_volume: None,
            loaded_music: Vec::new(),
            freed_music: Vec::new(),
            music_playing: false,
            music_paused: false,
            music_fade: FadeState::None,
            music_volume: None,
            music_play_count: 0,
            music_halt_count: 0,
            music_fade_out_count: 0,
            music_pause_count: 0,
            music_resume_count: 0,
            last_music_id: None,
            last_music_loops: None,
            last_music_position: None,
            sink: None,
        }
    }

    pub fn loaded_sound_count(&self) -> usize {
        self.loaded_sounds.len()
    }

    pub fn active_channel_count(&self) -> usize {
        self.active.len()
    }

    /// Simulate a channel running out of sample data: the device drops it and
    /// notifies the completion sink, as the mixing thread would.
    pub fn finish_channel(&mut self, channel: ChannelId) {
        self.active.remove(&channel);
        self.fading_out.remove(&channel);
        if let Some(sink) = &self.sink {
            sink.notify(channel);
        }
    }

    /// Clone of the registered completion sink, for tests that notify from a
    /// spawned thread.
    pub fn sink(&self) -> Option<FinishedSink> {
        self.sink.clone()
    }

    fn alloc_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl Default for MockDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioDevice for MockDevice {
    fn open(&mut self, spec: DeviceSpec) -> Result<()> {
        if self.fail_open {
            return Err(anyhow!("no audio device"));
        }
        self.open = true;
        self.open_spec = Some(spec);
        self.times_opened += 1;
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
        self.open_spec = None;
        self.active.clear();
        self.fading_out.clear();
        self.music_playing = false;
        self.music_paused = false;
        self.music_fade = FadeState::None;
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn query_spec(&self) -> Option<OpenSpec> {
        self.open_spec.map(|spec| OpenSpec {
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            times_opened: self.times_opened,
        })
    }

    fn allocate_channels(&mut self, count: usize) -> usize {
        self.allocated_channels = count;
        count
    }

    fn load_sound(&mut self, _path: &Path) -> Result<SoundId> {
        if self.fail_loads {
            return Err(anyhow!("decode failed"));
        }
        let id = SoundId(self.alloc_id());
        self.loaded_sounds.push(id);
        Ok(id)
    }

    fn play(&mut self, _sound: SoundId, _loops: i32, volume: f32) -> Option<ChannelId> {
        if self.refuse_plays || self.active.len() >= self.allocated_channels {
            return None;
        }
        let channel = ChannelId(self.next_channel);
        self.next_channel += 1;
        self.active.insert(channel);
        self.last_play_volume = Some(volume);
        Some(channel)
    }

    fn halt(&mut self, target: ChannelTarget) {
        match target {
            ChannelTarget::One(ch) => {
                self.active.remove(&ch);
                self.fading_out.remove(&ch);
                self.halted.push(ch);
            }
            ChannelTarget::All => {
                self.active.clear();
                self.fading_out.clear();
                self.halted_all = true;
            }
        }
    }

    fn pause(&mut self, _target: ChannelTarget) {}

    fn resume(&mut self, _target: ChannelTarget) {}

    fn set_volume(&mut self, _target: ChannelTarget, volume: f32) {
        self.channel_volume = Some(volume);
    }

    fn fade_out(&mut self, channel: ChannelId, _ms: u32) -> bool {
        if !self.active.contains(&channel) {
            return false;
        }
        self.fading_out.insert(channel);
        self.fade_commands += 1;
        true
    }

    fn is_playing(&self, target: ChannelTarget) -> bool {
        match target {
            ChannelTarget::One(ch) => self.active.contains(&ch),
            ChannelTarget::All => !self.active.is_empty(),
        }
    }

    fn fade_state(&self, channel: ChannelId) -> FadeState {
        if self.fading_out.contains(&channel) {
            FadeState::FadingOut
        } else {
            FadeState::None
        }
    }

    fn load_music(&mut self, _path: &Path) -> Result<MusicId> {
        if self.fail_loads {
            return Err(anyhow!("decode failed"));
        }
        let id = MusicId(self.alloc_id());
        self.loaded_music.push(id);
        Ok(id)
    }

    fn play_music(&mut self, music: MusicId, loops: i32, fade_in_ms: u32) -> Result<()> {
        self.music_playing = true;
        self.music_paused = false;
        self.music_fade = if fade_in_ms > 0 {
            FadeState::FadingIn
        } else {
            FadeState::None
        };
        self.music_play_count += 1;
        self.last_music_id = Some(music);
        self.last_music_loops = Some(loops);
        Ok(())
    }

    fn halt_music(&mut self) {
        self.music_playing = false;
        self.music_paused = false;
        self.music_fade = FadeState::None;
        self.music_halt_count += 1;
    }

    fn fade_out_music(&mut self, _ms: u32) -> bool {
        if !self.music_playing {
            return false;
        }
        self.music_fade = FadeState::FadingOut;
        self.music_fade_out_count += 1;
        true
    }

    fn pause_music(&mut self) {
        self.music_paused = true;
        self.music_pause_count += 1;
    }

    fn resume_music(&mut self) {
        self.music_paused = false;
        self.music_resume_count += 1;
    }

    fn is_music_playing(&self) -> bool {
        self.music_playing
    }

    fn is_music_paused(&self) -> bool {
        self.music_paused
    }

    fn music_fade_state(&self) -> FadeState {
        self.music_fade
    }

    fn set_music_position(&mut self, seconds: f64) -> bool {
        self.last_music_position = Some(seconds);
        true
    }

    fn set_music_volume(&mut self, volume: f32) {
        self.music_volume = Some(volume);
    }

    fn free_music(&mut self, music: MusicId) {
        self.freed_music.push(music);
    }

    fn set_finished_sink(&mut self, sink: FinishedSink) {
        self.sink = Some(sink);
    }

    fn release_all(&mut self) {
        self.loaded_sounds.clear();
        self.active.clear();
        self.fading_out.clear();
    }
}
