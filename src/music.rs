use std::path::Path;

use log::{debug, warn};

use crate::device::{AudioDevice, FadeState, MusicId};

/// A loaded track occupying one of the two pipeline slots.
#[derive(Debug)]
struct MusicTrack {
    id: MusicId,
    name: String,
    loops: i32,
}

/// Two-slot music queue: the audible track plus at most one queued successor.
/// The pending slot is only meaningful while a current track exists; promotion
/// happens when the current track ends naturally.
#[derive(Default)]
pub struct MusicPipeline {
    current: Option<MusicTrack>,
    pending: Option<MusicTrack>,
}

impl MusicPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_name(&self) -> Option<&str> {
        self.current.as_ref().map(|t| t.name.as_str())
    }

    pub fn pending_name(&self) -> Option<&str> {
        self.pending.as_ref().map(|t| t.name.as_str())
    }

    /// Start or queue a track. `force` discards both slots and hard-cuts to
    /// the new track; a non-forced request while something is playing only
    /// replaces the pending slot. Returns false when the track cannot be
    /// loaded, leaving the pipeline unchanged.
    pub fn play<D: AudioDevice>(
        &mut self,
        device: &mut D,
        path: &Path,
        name: &str,
        loops: i32,
        force: bool,
        fade_in_ms: u32,
    ) -> bool {
        let id = match device.load_music(path) {
            Ok(id) => id,
            Err(e) => {
                debug!("failed to load music {}: {e}", path.display());
                return false;
            }
        };
        let track = MusicTrack {
            id,
            name: name.to_owned(),
            loops,
        };

        if self.current.is_none() || force {
            // Hard cut: both slots are discarded. A stale pending with no
            // current track is discarded here too.
            if let Some(old) = self.pending.take() {
                device.free_music(old.id);
            }
            if let Some(old) = self.current.take() {
                device.halt_music();
                device.free_music(old.id);
            }
            if let Err(e) = device.play_music(track.id, track.loops, fade_in_ms) {
                warn!("failed to start music {name}: {e}");
                self.current = Some(track);
                return false;
            }
            self.current = Some(track);
            true
        } else {
            if let Some(old) = self.pending.take() {
                device.free_music(old.id);
            }
            self.pending = Some(track);
            true
        }
    }

    /// Per-tick natural-end detection. When the current track has stopped on
    /// its own, a pending track is promoted and started; otherwise the
    /// current track is replayed once.
    pub fn update<D: AudioDevice>(&mut self, device: &mut D) {
        if self.current.is_none() || device.is_music_playing() || device.is_music_paused() {
            return;
        }
        if let Some(next) = self.pending.take() {
            if let Some(old) = self.current.take() {
                device.free_music(old.id);
            }
            if let Err(e) = device.play_music(next.id, next.loops, 0) {
                warn!("failed to start queued music {}: {e}", next.name);
            }
            self.current = Some(next);
        } else if let Some(track) = &self.current {
            if let Err(e) = device.play_music(track.id, 0, 0) {
                warn!("failed to restart music {}: {e}", track.name);
            }
        }
    }

    pub fn pause<D: AudioDevice>(&mut self, device: &mut D) {
        if device.is_music_playing() && !device.is_music_paused() {
            device.pause_music();
        }
    }

    pub fn resume<D: AudioDevice>(&mut self, device: &mut D) {
        if device.is_music_paused() {
            device.resume_music();
        }
    }

    /// Fade the current track out. Ignored while already fading out unless
    /// `overwrite` is set. A fade-in cannot be reversed on the device, so a
    /// fade-out request during fade-in becomes a hard stop.
    pub fn fade_out<D: AudioDevice>(&mut self, device: &mut D, ms: u32, overwrite: bool) {
        if !device.is_music_playing() {
            return;
        }
        match device.music_fade_state() {
            FadeState::FadingOut if !overwrite => {}
            FadeState::FadingIn => device.halt_music(),
            _ => {
                device.fade_out_music(ms);
            }
        }
    }

    /// Seek within the current track. Rejected mid-fade-out.
    pub fn set_position<D: AudioDevice>(&mut self, device: &mut D, seconds: f64) -> bool {
        if device.music_fade_state() == FadeState::FadingOut {
            return false;
        }
        device.set_music_position(seconds)
    }

    pub fn is_playing<D: AudioDevice>(&self, device: &D) -> bool {
        device.is_music_playing()
    }

    pub fn is_paused<D: AudioDevice>(&self, device: &D) -> bool {
        device.is_music_paused()
    }

    pub fn fade_state<D: AudioDevice>(&self, device: &D) -> FadeState {
        device.music_fade_state()
    }

    /// Stop playback and release both slots. Teardown path.
    pub fn clear<D: AudioDevice>(&mut self, device: &mut D) {
        if self.current.is_some() {
            device.halt_music();
        }
        if let Some(track) = self.current.take() {
            device.free_music(track.id);
        }
        if let Some(track) = self.pending.take() {
            device.free_music(track.id);
        }
    }
}
