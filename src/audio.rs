//! Audio and haptics
//!
//! The core only fires cues; playback lives behind `AudioSink`. `AudioManager`
//! applies the player's sound/music/vibration toggles before forwarding.

use std::cell::RefCell;
use std::rc::Rc;

use crate::settings::Settings;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    /// Level won
    Win,
    /// Level failed
    Lose,
    /// Any UI button
    Button,
    /// Block tapped and falling
    BlockClick,
    /// Ball tapped and activated
    BallClick,
    /// Generic contact sound
    MergeBall,
    /// Enemy landed on a ball
    EnemyHitBall,
    /// Enemy landed on a block
    EnemyHitBlock,
}

/// Background tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MusicTrack {
    Gameplay,
}

/// Playback backend. Fire-and-forget: nothing here may block the core.
pub trait AudioSink {
    fn play(&mut self, cue: SoundCue);
    fn play_music(&mut self, track: MusicTrack);
    fn stop_music(&mut self);
    fn vibrate(&mut self);
}

/// Sink that drops everything
#[derive(Debug, Default)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&mut self, _cue: SoundCue) {}
    fn play_music(&mut self, _track: MusicTrack) {}
    fn stop_music(&mut self) {}
    fn vibrate(&mut self) {}
}

/// Everything a `RecordingAudio` received
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioEvent {
    Cue(SoundCue),
    Music(MusicTrack),
    StopMusic,
    Vibrate,
}

/// Sink that logs and records (shared with clones)
#[derive(Debug, Clone, Default)]
pub struct RecordingAudio {
    events: Rc<RefCell<Vec<AudioEvent>>>,
}

impl RecordingAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AudioEvent> {
        self.events.borrow().clone()
    }

    /// How many times a cue was played
    pub fn count(&self, cue: SoundCue) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| **e == AudioEvent::Cue(cue))
            .count()
    }

    fn push(&mut self, event: AudioEvent) {
        log::debug!("[Audio] {:?}", event);
        self.events.borrow_mut().push(event);
    }
}

impl AudioSink for RecordingAudio {
    fn play(&mut self, cue: SoundCue) {
        self.push(AudioEvent::Cue(cue));
    }

    fn play_music(&mut self, track: MusicTrack) {
        self.push(AudioEvent::Music(track));
    }

    fn stop_music(&mut self) {
        self.push(AudioEvent::StopMusic);
    }

    fn vibrate(&mut self) {
        self.push(AudioEvent::Vibrate);
    }
}

/// Audio manager for the game
pub struct AudioManager {
    sink: Box<dyn AudioSink>,
    settings: Settings,
    music_playing: bool,
}

impl AudioManager {
    pub fn new(sink: Box<dyn AudioSink>, settings: Settings) -> Self {
        Self {
            sink,
            settings,
            music_playing: false,
        }
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    /// Play a sound effect
    pub fn play(&mut self, cue: SoundCue) {
        if self.settings.sound_on {
            self.sink.play(cue);
        }
    }

    /// Start the gameplay track (no-op if already playing or music is off)
    pub fn play_music(&mut self) {
        if !self.settings.music_on || self.music_playing {
            return;
        }
        self.sink.play_music(MusicTrack::Gameplay);
        self.music_playing = true;
    }

    /// Haptic pulse
    pub fn vibrate(&mut self) {
        if self.settings.vibration_on {
            self.sink.vibrate();
        }
    }

    pub fn set_sound(&mut self, on: bool) {
        self.settings.sound_on = on;
    }

    /// Toggling music on restarts the gameplay track, off stops it
    pub fn set_music(&mut self, on: bool) {
        self.settings.music_on = on;
        if on {
            self.play_music();
        } else if self.music_playing {
            self.sink.stop_music();
            self.music_playing = false;
        }
    }

    pub fn set_vibration(&mut self, on: bool) {
        self.settings.vibration_on = on;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sound_toggle_gates_cues() {
        let rec = RecordingAudio::new();
        let mut audio = AudioManager::new(Box::new(rec.clone()), Settings::default());
        audio.play(SoundCue::Button);
        audio.set_sound(false);
        audio.play(SoundCue::Button);
        assert_eq!(rec.count(SoundCue::Button), 1);
    }

    #[test]
    fn test_music_toggle() {
        let rec = RecordingAudio::new();
        let mut audio = AudioManager::new(Box::new(rec.clone()), Settings::default());
        audio.play_music();
        audio.play_music();
        audio.set_music(false);
        audio.set_music(true);
        assert_eq!(
            rec.events(),
            vec![
                AudioEvent::Music(MusicTrack::Gameplay),
                AudioEvent::StopMusic,
                AudioEvent::Music(MusicTrack::Gameplay),
            ]
        );
    }

    #[test]
    fn test_vibration_toggle() {
        let rec = RecordingAudio::new();
        let settings = Settings {
            vibration_on: false,
            ..Default::default()
        };
        let mut audio = AudioManager::new(Box::new(rec.clone()), settings);
        audio.vibrate();
        assert!(rec.events().is_empty());
    }
}
