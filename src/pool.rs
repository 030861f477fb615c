use log::debug;

use crate::device::{AudioDevice, ChannelId, ChannelTarget, FadeState, ResourceTag, SoundId};

/// Enforced floor for the channel limit.
pub const MIN_CHANNELS: usize = 5;
/// Default channel limit.
pub const DEFAULT_CHANNELS: usize = 10;

/// One playback slot. Either fully idle or fully bound to an active play:
/// when `channel` is empty, the sound reference and tag are empty too.
#[derive(Debug, Default)]
pub struct SoundHandle {
    sound: Option<SoundId>,
    name: String,
    channel: Option<ChannelId>,
    tag: Option<ResourceTag>,
}

impl SoundHandle {
    fn idle() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.channel.is_some()
    }

    pub fn channel(&self) -> Option<ChannelId> {
        self.channel
    }

    pub fn sound(&self) -> Option<SoundId> {
        self.sound
    }

    /// Resolved filename of the bound sound; empty while idle.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> Option<ResourceTag> {
        self.tag
    }

    fn reset(&mut self) {
        self.sound = None;
        self.name.clear();
        self.channel = None;
        self.tag = None;
    }

    fn bind(&mut self, sound: SoundId, name: &str, channel: ChannelId, tag: Option<ResourceTag>) {
        self.sound = Some(sound);
        self.name.clear();
        self.name.push_str(name);
        self.channel = Some(channel);
        self.tag = tag;
    }
}

/// Bounded, ordered set of playback slots. Slots are reused before the pool
/// grows and the pool never exceeds its limit.
pub struct ChannelPool {
    handles: Vec<SoundHandle>,
    limit: usize,
}

impl ChannelPool {
    pub fn new(limit: usize) -> Self {
        Self {
            handles: Vec::new(),
            limit: limit.max(MIN_CHANNELS),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.handles.iter().filter(|h| h.is_active()).count()
    }

    pub fn handle(&self, slot: usize) -> Option<&SoundHandle> {
        self.handles.get(slot)
    }

    /// Find an idle slot, growing the pool by one if every slot is busy and
    /// the limit allows. `None` means the play request is dropped.
    pub fn allocate(&mut self) -> Option<usize> {
        if let Some(slot) = self.handles.iter().position(|h| !h.is_active()) {
            return Some(slot);
        }
        if self.handles.len() < self.limit {
            self.handles.push(SoundHandle::idle());
            return Some(self.handles.len() - 1);
        }
        debug!("no free channel ({} active)", self.handles.len());
        None
    }

    /// Start a sound on an allocated slot. Any other active slot sharing a
    /// non-empty `tag` is halted first so tagged effects never stack. Returns
    /// false when the device cannot supply a channel; the slot stays idle.
    pub fn play<D: AudioDevice>(
        &mut self,
        device: &mut D,
        slot: usize,
        sound: SoundId,
        name: &str,
        tag: Option<ResourceTag>,
        loops: i32,
        volume: f32,
    ) -> bool {
        if tag.is_some() {
            for (i, handle) in self.handles.iter_mut().enumerate() {
                if i != slot && handle.is_active() && handle.tag == tag {
                    if let Some(ch) = handle.channel {
                        device.halt(ChannelTarget::One(ch));
                    }
                    handle.reset();
                }
            }
        }

        match device.play(sound, loops, volume) {
            Some(channel) => {
                self.handles[slot].bind(sound, name, channel, tag);
                true
            }
            None => {
                self.handles[slot].reset();
                debug!("device refused to play {name}");
                false
            }
        }
    }

    /// Change the channel limit, clamped up to [`MIN_CHANNELS`]. Slots beyond
    /// the new limit are evicted from the end of the pool, halting any that
    /// are still active, then the device is told the new channel count.
    pub fn set_limit<D: AudioDevice>(&mut self, device: &mut D, new_limit: usize) {
        let limit = new_limit.max(MIN_CHANNELS);
        while self.handles.len() > limit {
            if let Some(handle) = self.handles.pop() {
                if let Some(ch) = handle.channel {
                    device.halt(ChannelTarget::One(ch));
                }
            }
        }
        self.limit = limit;
        device.allocate_channels(limit);
    }

    /// Halt playback and reset the matching slot(s) to idle.
    pub fn stop<D: AudioDevice>(&mut self, device: &mut D, target: ChannelTarget) {
        device.halt(target);
        match target {
            ChannelTarget::All => {
                for handle in &mut self.handles {
                    handle.reset();
                }
            }
            ChannelTarget::One(ch) => {
                self.release_channel(ch);
            }
        }
    }

    pub fn pause<D: AudioDevice>(&mut self, device: &mut D, target: ChannelTarget) {
        device.pause(target);
    }

    pub fn resume<D: AudioDevice>(&mut self, device: &mut D, target: ChannelTarget) {
        device.resume(target);
    }

    /// Fade out the matching slot(s). A channel that is already fading out is
    /// left alone unless `overwrite` is set.
    pub fn fade_out<D: AudioDevice>(
        &mut self,
        device: &mut D,
        target: ChannelTarget,
        ms: u32,
        overwrite: bool,
    ) {
        match target {
            ChannelTarget::One(ch) => {
                Self::fade_channel(device, ch, ms, overwrite);
            }
            ChannelTarget::All => {
                let channels: Vec<ChannelId> =
                    self.handles.iter().filter_map(|h| h.channel).collect();
                for ch in channels {
                    Self::fade_channel(device, ch, ms, overwrite);
                }
            }
        }
    }

    /// Fade out every active slot whose bound resource name matches.
    pub fn fade_out_named<D: AudioDevice>(
        &mut self,
        device: &mut D,
        name: &str,
        ms: u32,
        overwrite: bool,
    ) {
        let channels: Vec<ChannelId> = self
            .handles
            .iter()
            .filter(|h| h.is_active() && h.name == name)
            .filter_map(|h| h.channel)
            .collect();
        for ch in channels {
            Self::fade_channel(device, ch, ms, overwrite);
        }
    }

    fn fade_channel<D: AudioDevice>(device: &mut D, ch: ChannelId, ms: u32, overwrite: bool) {
        if device.fade_state(ch) == FadeState::FadingOut && !overwrite {
            return;
        }
        device.fade_out(ch, ms);
    }

    /// First active slot bound to the given resource name, in pool order.
    pub fn find_playing(&self, name: &str) -> Option<&SoundHandle> {
        self.handles.iter().find(|h| h.is_active() && h.name == name)
    }

    /// Reset the slot bound to `channel` to idle. Invoked for every id the
    /// completion bridge delivers; returns false when no slot matches (the
    /// slot was already stopped or evicted).
    pub fn release_channel(&mut self, channel: ChannelId) -> bool {
        for handle in &mut self.handles {
            if handle.channel == Some(channel) {
                handle.reset();
                return true;
            }
        }
        false
    }

    /// Halt everything and drop all slots. Teardown path.
    pub fn clear<D: AudioDevice>(&mut self, device: &mut D) {
        if !self.handles.is_empty() {
            device.halt(ChannelTarget::All);
        }
        self.handles.clear();
    }
}

impl Default for ChannelPool {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNELS)
    }
}
