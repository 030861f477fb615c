use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Result, anyhow};
use kira::sound::PlaybackState;
use kira::sound::static_sound::{StaticSoundData, StaticSoundHandle};
use kira::{AudioManager, AudioManagerSettings, DefaultBackend, Tween};
use log::debug;

use crate::bridge::FinishedSink;
use crate::device::{
    AudioDevice, ChannelId, ChannelTarget, DeviceSpec, FadeState, MusicId, OpenSpec, SoundId,
};
use crate::pool::DEFAULT_CHANNELS;

fn tween_ms(ms: u32) -> Tween {
    Tween {
        duration: Duration::from_millis(u64::from(ms)),
        ..Default::default()
    }
}

/// Production device backed by kira. Decoded sound data is owned here, keyed
/// by id; one `StaticSoundHandle` per active channel. Kira does not expose
/// fade status, so fades are tracked alongside the handles.
///
/// Kira negotiates the actual stream parameters with the OS, so the opened
/// spec is the requested one, recorded for change detection.
pub struct KiraDevice {
    manager: Option<AudioManager>,
    spec: Option<DeviceSpec>,
    times_opened: u32,
    channels: usize,

    next_id: u64,
    sounds: HashMap<u64, StaticSoundData>,
    handles: HashMap<u64, StaticSoundHandle>,
    /// Channels with a stop tween in flight.
    fading_out: HashSet<u64>,

    music_datas: HashMap<u64, StaticSoundData>,
    music_handle: Option<StaticSoundHandle>,
    music_fading_out: bool,
    music_fade_in_until: Option<Instant>,
    music_volume: f64,

    sink: Option<FinishedSink>,
}

impl KiraDevice {
    pub fn new() -> Self {
        Self {
            manager: None,
            spec: None,
            times_opened: 0,
            channels: DEFAULT_CHANNELS,
            next_id: 1,
            sounds: HashMap::new(),
            handles: HashMap::new(),
            fading_out: HashSet::new(),
            music_datas: HashMap::new(),
            music_handle: None,
            music_fading_out: false,
            music_fade_in_until: None,
            music_volume: 1.0,
            sink: None,
        }
    }

    fn alloc_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn handle_state(&self, channel: ChannelId) -> Option<PlaybackState> {
        self.handles.get(&channel.0).map(|h| h.state())
    }
}

impl Default for KiraDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioDevice for KiraDevice {
    fn open(&mut self, spec: DeviceSpec) -> Result<()> {
        if self.manager.is_some() {
            self.close();
        }
        let manager = AudioManager::<DefaultBackend>::new(AudioManagerSettings::default())
            .map_err(|e| anyhow!("failed to open audio device: {e}"))?;
        self.manager = Some(manager);
        self.spec = Some(spec);
        self.times_opened += 1;
        Ok(())
    }

    fn close(&mut self) {
        for (_, mut handle) in self.handles.drain() {
            handle.stop(Tween::default());
        }
        if let Some(mut handle) = self.music_handle.take() {
            handle.stop(Tween::default());
        }
        self.fading_out.clear();
        self.music_fading_out = false;
        self.music_fade_in_until = None;
        self.manager = None;
        self.spec = None;
    }

    fn is_open(&self) -> bool {
        self.manager.is_some()
    }

    fn query_spec(&self) -> Option<OpenSpec> {
        self.spec.map(|spec| OpenSpec {
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            times_opened: self.times_opened,
        })
    }

    fn allocate_channels(&mut self, count: usize) -> usize {
        self.channels = count;
        count
    }

    fn load_sound(&mut self, path: &Path) -> Result<SoundId> {
        let data = StaticSoundData::from_file(path)
            .map_err(|e| anyhow!("failed to load sound {}: {e}", path.display()))?;
        let id = self.alloc_id();
        self.sounds.insert(id, data);
        Ok(SoundId(id))
    }

    fn play(&mut self, sound: SoundId, loops: i32, volume: f32) -> Option<ChannelId> {
        if self.manager.is_none() || self.handles.len() >= self.channels {
            return None;
        }
        // Kira loops whole sounds indefinitely; any non-zero loop count
        // becomes a looping play.
        let mut data = self.sounds.get(&sound.0)?.clone().volume(volume);
        if loops != 0 {
            data = data.loop_region(..);
        }
        let id = self.alloc_id();
        let manager = self.manager.as_mut()?;
        match manager.play(data) {
            Ok(handle) => {
                self.handles.insert(id, handle);
                Some(ChannelId(id))
            }
            Err(e) => {
                debug!("kira refused play: {e}");
                None
            }
        }
    }

    fn halt(&mut self, target: ChannelTarget) {
        match target {
            ChannelTarget::One(ch) => {
                if let Some(mut handle) = self.handles.remove(&ch.0) {
                    handle.stop(Tween::default());
                }
                self.fading_out.remove(&ch.0);
            }
            ChannelTarget::All => {
                for (_, mut handle) in self.handles.drain() {
                    handle.stop(Tween::default());
                }
                self.fading_out.clear();
            }
        }
    }

    fn pause(&mut self, target: ChannelTarget) {
        match target {
            ChannelTarget::One(ch) => {
                if let Some(handle) = self.handles.get_mut(&ch.0) {
                    handle.pause(Tween::default());
                }
            }
            ChannelTarget::All => {
                for handle in self.handles.values_mut() {
                    handle.pause(Tween::default());
                }
            }
        }
    }

    fn resume(&mut self, target: ChannelTarget) {
        match target {
            ChannelTarget::One(ch) => {
                if let Some(handle) = self.handles.get_mut(&ch.0) {
                    handle.resume(Tween::default());
                }
            }
            ChannelTarget::All => {
                for handle in self.handles.values_mut() {
                    handle.resume(Tween::default());
                }
            }
        }
    }

    fn set_volume(&mut self, target: ChannelTarget, volume: f32) {
        match target {
            ChannelTarget::One(ch) => {
                if let Some(handle) = self.handles.get_mut(&ch.0) {
                    handle.set_volume(volume, Tween::default());
                }
            }
            ChannelTarget::All => {
                for handle in self.handles.values_mut() {
                    handle.set_volume(volume, Tween::default());
                }
            }
        }
    }

    fn fade_out(&mut self, channel: ChannelId, ms: u32) -> bool {
        match self.handles.get_mut(&channel.0) {
            Some(handle) => {
                handle.stop(tween_ms(ms));
                self.fading_out.insert(channel.0);
                true
            }
            None => false,
        }
    }

    fn is_playing(&self, target: ChannelTarget) -> bool {
        match target {
            ChannelTarget::One(ch) => matches!(
                self.handle_state(ch),
                Some(PlaybackState::Playing | PlaybackState::Stopping)
            ),
            ChannelTarget::All => self
                .handles
                .values()
                .any(|h| matches!(h.state(), PlaybackState::Playing | PlaybackState::Stopping)),
        }
    }

    fn fade_state(&self, channel: ChannelId) -> FadeState {
        if self.fading_out.contains(&channel.0) {
            FadeState::FadingOut
        } else {
            FadeState::None
        }
    }

    fn load_music(&mut self, path: &Path) -> Result<MusicId> {
        let data = StaticSoundData::from_file(path)
            .map_err(|e| anyhow!("failed to load music {}: {e}", path.display()))?;
        let id = self.alloc_id();
        self.music_datas.insert(id, data);
        Ok(MusicId(id))
    }

    fn play_music(&mut self, music: MusicId, loops: i32, fade_in_ms: u32) -> Result<()> {
        let manager = self
            .manager
            .as_mut()
            .ok_or_else(|| anyhow!("device not open"))?;
        let data = self
            .music_datas
            .get(&music.0)
            .ok_or_else(|| anyhow!("music not loaded: {music:?}"))?
            .clone();
        let mut data = data.volume(self.music_volume as f32);
        if loops != 0 {
            data = data.loop_region(..);
        }
        if fade_in_ms > 0 {
            data = data.fade_in_tween(tween_ms(fade_in_ms));
        }
        if let Some(mut old) = self.music_handle.take() {
            old.stop(Tween::default());
        }
        let handle = manager
            .play(data)
            .map_err(|e| anyhow!("failed to play music: {e}"))?;
        self.music_handle = Some(handle);
        self.music_fading_out = false;
        self.music_fade_in_until = (fade_in_ms > 0)
            .then(|| Instant::now() + Duration::from_millis(u64::from(fade_in_ms)));
        Ok(())
    }

    fn halt_music(&mut self) {
        if let Some(mut handle) = self.music_handle.take() {
            handle.stop(Tween::default());
        }
        self.music_fading_out = false;
        self.music_fade_in_until = None;
    }

    fn fade_out_music(&mut self, ms: u32) -> bool {
        match self.music_handle.as_mut() {
            Some(handle) => {
                handle.stop(tween_ms(ms));
                self.music_fading_out = true;
                self.music_fade_in_until = None;
                true
            }
            None => false,
        }
    }

    fn pause_music(&mut self) {
        if let Some(handle) = self.music_handle.as_mut() {
            handle.pause(Tween::default());
        }
    }

    fn resume_music(&mut self) {
        if let Some(handle) = self.music_handle.as_mut() {
            handle.resume(Tween::default());
        }
    }

    fn is_music_playing(&self) -> bool {
        self.music_handle.as_ref().is_some_and(|h| {
            matches!(h.state(), PlaybackState::Playing | PlaybackState::Stopping)
        })
    }

    fn is_music_paused(&self) -> bool {
        self.music_handle.as_ref().is_some_and(|h| {
            matches!(h.state(), PlaybackState::Pausing | PlaybackState::Paused)
        })
    }

    fn music_fade_state(&self) -> FadeState {
        if self.music_fading_out {
            return FadeState::FadingOut;
        }
        match self.music_fade_in_until {
            Some(until) if Instant::now() < until => FadeState::FadingIn,
            _ => FadeState::None,
        }
    }

    fn set_music_position(&mut self, seconds: f64) -> bool {
        match self.music_handle.as_mut() {
            Some(handle) => {
                handle.seek_to(seconds);
                true
            }
            None => false,
        }
    }

    fn set_music_volume(&mut self, volume: f32) {
        self.music_volume = f64::from(volume);
        if let Some(handle) = self.music_handle.as_mut() {
            handle.set_volume(self.music_volume as f32, Tween::default());
        }
    }

    fn free_music(&mut self, music: MusicId) {
        self.music_datas.remove(&music.0);
    }

    fn set_finished_sink(&mut self, sink: FinishedSink) {
        self.sink = Some(sink);
    }

    /// Reap channels whose handles have reached `Stopped` on their own and
    /// report them through the sink, standing in for a mixer-side completion
    /// callback.
    fn pump(&mut self) {
        let finished: Vec<u64> = self
            .handles
            .iter()
            .filter(|(_, h)| h.state() == PlaybackState::Stopped)
            .map(|(&id, _)| id)
            .collect();
        for id in finished {
            self.handles.remove(&id);
            self.fading_out.remove(&id);
            if let Some(sink) = &self.sink {
                sink.notify(ChannelId(id));
            }
        }
        if let Some(handle) = &self.music_handle {
            if handle.state() == PlaybackState::Stopped {
                self.music_handle = None;
                self.music_fading_out = false;
                self.music_fade_in_until = None;
            }
        }
    }

    fn release_all(&mut self) {
        self.halt(ChannelTarget::All);
        self.halt_music();
        self.sounds.clear();
        self.music_datas.clear();
    }
}
