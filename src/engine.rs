use log::{debug, warn};

use crate::bridge::CompletionBridge;
use crate::cache::{self, SoundCache};
use crate::device::{AudioDevice, ChannelTarget, FadeState, MAX_VOLUME, ResourceTag};
use crate::music::MusicPipeline;
use crate::pool::{ChannelPool, SoundHandle};
use crate::settings::AudioSettings;

/// Facade over the whole audio subsystem: owns the device, the channel pool,
/// the music pipeline and the completion queue. Constructed once at startup
/// and passed by reference to whatever needs to play audio; every method is
/// called from the main simulation thread.
///
/// Sound effects and music can be enabled independently; with both disabled
/// the device stays closed and every play request is a silent no-op.
pub struct AudioEngine<D: AudioDevice> {
    device: D,
    cache: SoundCache,
    pool: ChannelPool,
    music: MusicPipeline,
    bridge: CompletionBridge,
    settings: AudioSettings,
    sound_enabled: bool,
    music_enabled: bool,
    sound_volume: f32,
    music_volume: f32,
    last_music: Option<String>,
}

impl<D: AudioDevice> AudioEngine<D> {
    /// Wrap a device. The engine starts uninitialized; call [`init`].
    ///
    /// [`init`]: AudioEngine::init
    pub fn new(mut device: D) -> Self {
        let bridge = CompletionBridge::new();
        device.set_finished_sink(bridge.sink());
        let settings = AudioSettings::default();
        Self {
            pool: ChannelPool::new(settings.channel_limit),
            device,
            cache: SoundCache::new(),
            music: MusicPipeline::new(),
            bridge,
            settings,
            sound_enabled: false,
            music_enabled: false,
            sound_volume: MAX_VOLUME,
            music_volume: MAX_VOLUME,
            last_music: None,
        }
    }

    /// Apply preferences, (re)opening the device as needed. Returns false
    /// only when the device cannot be opened; the caller may keep running
    /// without audio. Calling again with unchanged parameters is a no-op.
    pub fn init(&mut self, settings: &AudioSettings) -> bool {
        let desired = settings.device_spec();

        if self.device.is_open() {
            let unchanged = self
                .device
                .query_spec()
                .is_some_and(|open| open.sample_rate == desired.sample_rate)
                && self.sound_enabled == settings.sound_enabled
                && self.music_enabled == settings.music_enabled;
            if unchanged {
                self.apply_mixer_settings(settings);
                self.settings = settings.clone();
                return true;
            }
            self.teardown();
        }

        self.settings = settings.clone();
        self.sound_enabled = false;
        self.music_enabled = false;

        if !settings.sound_enabled && !settings.music_enabled {
            return true;
        }

        if let Err(e) = self.device.open(desired) {
            warn!("failed to open audio device: {e}");
            return false;
        }

        self.sound_enabled = settings.sound_enabled;
        self.music_enabled = settings.music_enabled;
        self.apply_mixer_settings(settings);
        true
    }

    fn apply_mixer_settings(&mut self, settings: &AudioSettings) {
        self.sound_volume = settings.sound_volume.clamp(0.0, MAX_VOLUME);
        self.music_volume = settings.music_volume.clamp(0.0, MAX_VOLUME);
        if self.sound_enabled {
            self.pool.set_limit(&mut self.device, settings.channel_limit);
            self.device
                .set_volume(ChannelTarget::All, self.sound_volume);
        }
        if self.music_enabled {
            self.device.set_music_volume(self.music_volume);
        }
    }

    fn teardown(&mut self) {
        self.pool.clear(&mut self.device);
        self.music.clear(&mut self.device);
        self.cache.clear();
        self.device.release_all();
        self.device.close();
    }

    /// Stop everything and close the device. Idempotent.
    pub fn close(&mut self) {
        self.teardown();
        self.sound_enabled = false;
        self.music_enabled = false;
    }

    /// Per-tick housekeeping: reap finished channels reported by the mixing
    /// context and drive music promotion.
    pub fn update(&mut self) {
        self.device.pump();
        for channel in self.bridge.drain() {
            self.pool.release_channel(channel);
        }
        if self.music_enabled {
            self.music.update(&mut self.device);
        }
    }

    /// Play a sound effect. A `tag` makes the play exclusive: other active
    /// plays carrying the same tag are stopped first. `volume` of `None`
    /// uses the configured sound volume. Returns false when the sound is
    /// disabled, the file cannot be found, or no channel is free; all of
    /// these simply drop the request.
    pub fn play_sound(
        &mut self,
        path: &str,
        tag: Option<ResourceTag>,
        volume: Option<f32>,
        loops: i32,
    ) -> bool {
        if !self.sound_enabled {
            return false;
        }
        let Some(resolved) = cache::resolve(path, &self.settings.sound_dir) else {
            debug!("sound not found: {path}");
            return false;
        };
        let Some(sound) = self.cache.get_or_load(&mut self.device, &resolved) else {
            return false;
        };
        let Some(slot) = self.pool.allocate() else {
            return false;
        };
        let name = resolved.to_string_lossy().into_owned();
        let volume = volume
            .unwrap_or(self.sound_volume)
            .clamp(0.0, MAX_VOLUME);
        self.pool
            .play(&mut self.device, slot, sound, &name, tag, loops, volume)
    }

    /// First active handle playing the given file, if any.
    pub fn find_playing_sound(&self, path: &str) -> Option<&SoundHandle> {
        let resolved = cache::resolve(path, &self.settings.sound_dir)?;
        self.pool.find_playing(&resolved.to_string_lossy())
    }

    pub fn stop_sounds(&mut self, target: ChannelTarget) {
        self.pool.stop(&mut self.device, target);
    }

    pub fn pause_sounds(&mut self, target: ChannelTarget) {
        self.pool.pause(&mut self.device, target);
    }

    pub fn resume_sounds(&mut self, target: ChannelTarget) {
        self.pool.resume(&mut self.device, target);
    }

    pub fn fade_out_sound(&mut self, target: ChannelTarget, ms: u32, overwrite: bool) {
        self.pool.fade_out(&mut self.device, target, ms, overwrite);
    }

    /// Fade out every active play of the given file.
    pub fn fade_out_sound_named(&mut self, path: &str, ms: u32, overwrite: bool) {
        if let Some(resolved) = cache::resolve(path, &self.settings.sound_dir) {
            self.pool
                .fade_out_named(&mut self.device, &resolved.to_string_lossy(), ms, overwrite);
        }
    }

    pub fn set_channel_limit(&mut self, limit: usize) {
        self.pool.set_limit(&mut self.device, limit);
        self.settings.channel_limit = self.pool.limit();
    }

    /// Start or queue a music track. The requested name is remembered even
    /// while music is disabled so a later toggle can resume it. Returns false
    /// when the track cannot be located or loaded.
    pub fn play_music(&mut self, path: &str, loops: i32, force: bool, fade_in_ms: u32) -> bool {
        let Some(resolved) = cache::resolve(path, &self.settings.music_dir) else {
            debug!("music not found: {path}");
            return false;
        };
        self.last_music = Some(path.to_owned());
        if !self.music_enabled {
            return true;
        }
        let name = resolved.to_string_lossy().into_owned();
        self.music
            .play(&mut self.device, &resolved, &name, loops, force, fade_in_ms)
    }

    pub fn pause_music(&mut self) {
        if self.music_enabled {
            self.music.pause(&mut self.device);
        }
    }

    pub fn resume_music(&mut self) {
        if self.music_enabled {
            self.music.resume(&mut self.device);
        }
    }

    pub fn fade_out_music(&mut self, ms: u32, overwrite: bool) {
        if self.music_enabled {
            self.music.fade_out(&mut self.device, ms, overwrite);
        }
    }

    pub fn set_music_position(&mut self, seconds: f64) -> bool {
        self.music_enabled && self.music.set_position(&mut self.device, seconds)
    }

    pub fn is_music_playing(&self) -> bool {
        self.music.is_playing(&self.device)
    }

    pub fn is_music_paused(&self) -> bool {
        self.music.is_paused(&self.device)
    }

    pub fn music_fade_state(&self) -> FadeState {
        self.music.fade_state(&self.device)
    }

    pub fn set_sound_volume(&mut self, volume: f32) {
        self.sound_volume = volume.clamp(0.0, MAX_VOLUME);
        self.settings.sound_volume = self.sound_volume;
        self.device
            .set_volume(ChannelTarget::All, self.sound_volume);
    }

    pub fn set_music_volume(&mut self, volume: f32) {
        self.music_volume = volume.clamp(0.0, MAX_VOLUME);
        self.settings.music_volume = self.music_volume;
        self.device.set_music_volume(self.music_volume);
    }

    /// Flip the sound preference and re-initialize. When sound comes back on,
    /// `confirm_cue` is played as audible feedback. Returns the new state.
    pub fn toggle_sound(&mut self, confirm_cue: Option<&str>) -> bool {
        let mut settings = self.settings.clone();
        settings.sound_enabled = !settings.sound_enabled;
        self.init(&settings);
        if self.sound_enabled {
            if let Some(cue) = confirm_cue {
                self.play_sound(cue, None, None, 0);
            }
        }
        self.sound_enabled
    }

    /// Flip the music preference and re-initialize, resuming the last
    /// requested track when music comes back on. Returns the new state.
    pub fn toggle_music(&mut self) -> bool {
        let mut settings = self.settings.clone();
        settings.music_enabled = !settings.music_enabled;
        self.init(&settings);
        if self.music_enabled {
            if let Some(track) = self.last_music.clone() {
                self.play_music(&track, -1, true, 0);
            }
        }
        self.music_enabled
    }

    pub fn is_sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    pub fn is_music_enabled(&self) -> bool {
        self.music_enabled
    }

    pub fn sound_volume(&self) -> f32 {
        self.sound_volume
    }

    pub fn music_volume(&self) -> f32 {
        self.music_volume
    }

    pub fn channel_limit(&self) -> usize {
        self.pool.limit()
    }

    pub fn pool(&self) -> &ChannelPool {
        &self.pool
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }
}
