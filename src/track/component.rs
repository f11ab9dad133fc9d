//! Per-component bookkeeping for a loaded recording.
//!
//! A session has at most one track per logical component. Instead of a
//! dynamic map the slots are a fixed array indexed by [`Component`].

use serde::{Deserialize, Serialize};

/// The logical components shown for a recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Component {
    Audio = 0,
    PitchTrack = 1,
    Notes = 2,
    Spectrogram = 3,
}

impl Component {
    pub const ALL: [Component; 4] = [
        Component::Audio,
        Component::PitchTrack,
        Component::Notes,
        Component::Spectrogram,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// Visibility and playback parameters of one component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackState {
    pub visible: bool,
    pub audible: bool,
    pub gain: f32,
    pub pan: f32,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            visible: true,
            audible: true,
            gain: 1.0,
            pan: 0.0,
        }
    }
}

impl PlaybackState {
    /// Step through hidden -> visible+muted -> visible+audible -> hidden.
    pub fn cycle(&mut self) {
        if self.visible {
            if self.audible {
                self.visible = false;
                self.audible = false;
            } else {
                self.audible = true;
            }
        } else {
            self.visible = true;
            self.audible = false;
        }
    }
}

#[derive(Debug, Clone)]
struct Slot<T> {
    value: Option<T>,
    playback: PlaybackState,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            value: None,
            playback: PlaybackState::default(),
        }
    }
}

/// One ownership slot per [`Component`].
#[derive(Debug, Clone)]
pub struct ComponentSlots<T> {
    slots: [Slot<T>; 4],
}

impl<T> Default for ComponentSlots<T> {
    fn default() -> Self {
        Self {
            slots: [
                Slot::default(),
                Slot::default(),
                Slot::default(),
                Slot::default(),
            ],
        }
    }
}

impl<T: Copy> ComponentSlots<T> {
    pub fn get(&self, component: Component) -> Option<T> {
        self.slots[component.index()].value
    }
}

impl<T> ComponentSlots<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a value in the slot, returning the previous one.
    pub fn set(&mut self, component: Component, value: T) -> Option<T> {
        self.slots[component.index()].value.replace(value)
    }

    pub fn take(&mut self, component: Component) -> Option<T> {
        self.slots[component.index()].value.take()
    }

    pub fn contains(&self, component: Component) -> bool {
        self.slots[component.index()].value.is_some()
    }

    /// Empty every slot and reset playback state.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Playback state; reports hidden and silent for an empty slot.
    pub fn playback(&self, component: Component) -> PlaybackState {
        let slot = &self.slots[component.index()];
        if slot.value.is_some() {
            slot.playback
        } else {
            PlaybackState {
                visible: false,
                audible: false,
                ..slot.playback
            }
        }
    }

    /// Mutable playback state, only for occupied slots.
    pub fn playback_mut(&mut self, component: Component) -> Option<&mut PlaybackState> {
        let slot = &mut self.slots[component.index()];
        slot.value.as_ref()?;
        Some(&mut slot.playback)
    }

    pub fn cycle_status(&mut self, component: Component) {
        if let Some(state) = self.playback_mut(component) {
            state.cycle();
        }
    }
}
