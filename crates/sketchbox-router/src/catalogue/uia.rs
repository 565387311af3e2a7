//! The UIA command catalogue.
//!
//! Every action the controller surface can raise, paired with a
//! machine-readable token and a human-readable title. Which parameters a
//! command carries is data, not code: the three classification sets
//! [`wants_track`](UiaEvent::wants_track), [`wants_slot`](UiaEvent::wants_slot)
//! and [`wants_value`](UiaEvent::wants_value) partition the catalogue into
//! bare, track-only, track+slot, and track+slot+value commands.

use super::location::{Slot, Track};
use serde::{Deserialize, Serialize};

/// A user-interface action command.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UiaEvent {
    #[default]
    None,
    PowerOff,
    Reboot,
    RestartUi,
    ReloadMidiConfig,
    ReloadKeybindings,
    LastStateAction,
    AllNotesOff,
    AllSoundsOff,
    AllOff,
    StartAudioRecord,
    StopAudioRecord,
    ToggleAudioRecord,
    StartAudioPlay,
    StopAudioPlay,
    ToggleAudioPlay,
    StartMidiRecord,
    StopMidiRecord,
    ToggleMidiRecord,
    StartMidiPlay,
    StopMidiPlay,
    ToggleMidiPlay,
    Play,
    Stop,
    StartRecord,
    StopRecord,
    Select,
    SelectUp,
    SelectDown,
    SelectLeft,
    SelectRight,
    NavigateLeft,
    NavigateRight,
    BackUp,
    BackDown,
    LayerUp,
    LayerDown,
    SnapshotUp,
    SnapshotDown,
    SceneUp,
    SceneDown,
    Keyboard,
    SwitchLayerShort,
    SwitchLayerBold,
    SwitchLayerLong,
    SwitchBackShort,
    SwitchBackBold,
    SwitchBackLong,
    SwitchSnapshotShort,
    SwitchSnapshotBold,
    SwitchSnapshotLong,
    SwitchSelectShort,
    SwitchSelectBold,
    SwitchSelectLong,
    ModeSwitchShort,
    ModeSwitchBold,
    ModeSwitchLong,
    SwitchChannelsModShort,
    SwitchChannelsModBold,
    SwitchChannelsModLong,
    SwitchMetronomeShort,
    SwitchMetronomeBold,
    SwitchMetronomeLong,
    ScreenAdmin,
    ScreenAudioSettings,
    ScreenBank,
    ScreenControl,
    ScreenEditContextual,
    ScreenLayer,
    ScreenLayerFx,
    ScreenMain,
    ScreenPlaygrid,
    ScreenPreset,
    ScreenSketchpad,
    ScreenSongManager,
    ModalSnapshotLoad,
    ModalSnapshotSave,
    ModalAudioRecorder,
    ModalMidiRecorder,
    ModalAlsaMixer,
    ModalStepseq,
    Channel1,
    Channel2,
    Channel3,
    Channel4,
    Channel5,
    Channel6,
    Channel7,
    Channel8,
    Channel9,
    Channel10,
    ChannelPrevious,
    ChannelNext,
    Knob0Up,
    Knob0Down,
    Knob0Touched,
    Knob0Released,
    Knob1Up,
    Knob1Down,
    Knob1Touched,
    Knob1Released,
    Knob2Up,
    Knob2Down,
    Knob2Touched,
    Knob2Released,
    Knob3Up,
    Knob3Down,
    Knob3Touched,
    Knob3Released,
    Increase,
    Decrease,
    // The commands below arrive with parameters; the value, where used, is an
    // integer from 0 through 127 inclusive.
    SwitchPressed,
    SwitchReleased,
    ActivateTrack,
    ActivateTrackRelative,
    ToggleTrackMuted,
    SetTrackMuted,
    ToggleTrackSoloed,
    SetTrackSoloed,
    SetTrackVolume,
    SetTrackPan,
    SetTrackSend1Amount,
    SetTrackSend2Amount,
    SetClipCurrent,
    SetClipCurrentRelative,
    ToggleClip,
    SetClipActiveState,
    SetSlotGain,
    SetSlotPan,
    SetFxAmount,
    SetTrackClipActiveRelative,
}

/// A raised UIA command as carried through a device's command ring.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UiaCommand {
    pub event: UiaEvent,
    /// Id of the device which raised the command, or -1 when it was not
    /// raised by a device.
    pub origin: i32,
    pub track: Track,
    pub slot: Slot,
    /// 0 through 127.
    pub value: u8,
}

impl Default for UiaCommand {
    fn default() -> Self {
        Self {
            event: UiaEvent::None,
            origin: -1,
            track: Track::CurrentTrack,
            slot: Slot::CurrentSlot,
            value: 0,
        }
    }
}

// Map a CC-style value (0-127) to 0.0..=1.0.
#[inline]
fn relative_cc_value(value: u8) -> f32 {
    value.min(127) as f32 / 127.0
}

// Map a CC-style value to -1.0..=1.0 with 63 at the centre (126 and 127 both
// reach 1.0).
#[inline]
fn centered_relative_cc_value(value: u8) -> f32 {
    (value.min(126) as f32 - 63.0) / 63.0
}

#[inline]
fn percent(value: f32) -> i32 {
    (100.0 * value) as i32
}

impl UiaEvent {
    /// Every catalogue member, in declaration order.
    pub const ALL: [UiaEvent; 131] = [
        UiaEvent::None,
        UiaEvent::PowerOff,
        UiaEvent::Reboot,
        UiaEvent::RestartUi,
        UiaEvent::ReloadMidiConfig,
        UiaEvent::ReloadKeybindings,
        UiaEvent::LastStateAction,
        UiaEvent::AllNotesOff,
        UiaEvent::AllSoundsOff,
        UiaEvent::AllOff,
        UiaEvent::StartAudioRecord,
        UiaEvent::StopAudioRecord,
        UiaEvent::ToggleAudioRecord,
        UiaEvent::StartAudioPlay,
        UiaEvent::StopAudioPlay,
        UiaEvent::ToggleAudioPlay,
        UiaEvent::StartMidiRecord,
        UiaEvent::StopMidiRecord,
        UiaEvent::ToggleMidiRecord,
        UiaEvent::StartMidiPlay,
        UiaEvent::StopMidiPlay,
        UiaEvent::ToggleMidiPlay,
        UiaEvent::Play,
        UiaEvent::Stop,
        UiaEvent::StartRecord,
        UiaEvent::StopRecord,
        UiaEvent::Select,
        UiaEvent::SelectUp,
        UiaEvent::SelectDown,
        UiaEvent::SelectLeft,
        UiaEvent::SelectRight,
        UiaEvent::NavigateLeft,
        UiaEvent::NavigateRight,
        UiaEvent::BackUp,
        UiaEvent::BackDown,
        UiaEvent::LayerUp,
        UiaEvent::LayerDown,
        UiaEvent::SnapshotUp,
        UiaEvent::SnapshotDown,
        UiaEvent::SceneUp,
        UiaEvent::SceneDown,
        UiaEvent::Keyboard,
        UiaEvent::SwitchLayerShort,
        UiaEvent::SwitchLayerBold,
        UiaEvent::SwitchLayerLong,
        UiaEvent::SwitchBackShort,
        UiaEvent::SwitchBackBold,
        UiaEvent::SwitchBackLong,
        UiaEvent::SwitchSnapshotShort,
        UiaEvent::SwitchSnapshotBold,
        UiaEvent::SwitchSnapshotLong,
        UiaEvent::SwitchSelectShort,
        UiaEvent::SwitchSelectBold,
        UiaEvent::SwitchSelectLong,
        UiaEvent::ModeSwitchShort,
        UiaEvent::ModeSwitchBold,
        UiaEvent::ModeSwitchLong,
        UiaEvent::SwitchChannelsModShort,
        UiaEvent::SwitchChannelsModBold,
        UiaEvent::SwitchChannelsModLong,
        UiaEvent::SwitchMetronomeShort,
        UiaEvent::SwitchMetronomeBold,
        UiaEvent::SwitchMetronomeLong,
        UiaEvent::ScreenAdmin,
        UiaEvent::ScreenAudioSettings,
        UiaEvent::ScreenBank,
        UiaEvent::ScreenControl,
        UiaEvent::ScreenEditContextual,
        UiaEvent::ScreenLayer,
        UiaEvent::ScreenLayerFx,
        UiaEvent::ScreenMain,
        UiaEvent::ScreenPlaygrid,
        UiaEvent::ScreenPreset,
        UiaEvent::ScreenSketchpad,
        UiaEvent::ScreenSongManager,
        UiaEvent::ModalSnapshotLoad,
        UiaEvent::ModalSnapshotSave,
        UiaEvent::ModalAudioRecorder,
        UiaEvent::ModalMidiRecorder,
        UiaEvent::ModalAlsaMixer,
        UiaEvent::ModalStepseq,
        UiaEvent::Channel1,
        UiaEvent::Channel2,
        UiaEvent::Channel3,
        UiaEvent::Channel4,
        UiaEvent::Channel5,
        UiaEvent::Channel6,
        UiaEvent::Channel7,
        UiaEvent::Channel8,
        UiaEvent::Channel9,
        UiaEvent::Channel10,
        UiaEvent::ChannelPrevious,
        UiaEvent::ChannelNext,
        UiaEvent::Knob0Up,
        UiaEvent::Knob0Down,
        UiaEvent::Knob0Touched,
        UiaEvent::Knob0Released,
        UiaEvent::Knob1Up,
        UiaEvent::Knob1Down,
        UiaEvent::Knob1Touched,
        UiaEvent::Knob1Released,
        UiaEvent::Knob2Up,
        UiaEvent::Knob2Down,
        UiaEvent::Knob2Touched,
        UiaEvent::Knob2Released,
        UiaEvent::Knob3Up,
        UiaEvent::Knob3Down,
        UiaEvent::Knob3Touched,
        UiaEvent::Knob3Released,
        UiaEvent::Increase,
        UiaEvent::Decrease,
        UiaEvent::SwitchPressed,
        UiaEvent::SwitchReleased,
        UiaEvent::ActivateTrack,
        UiaEvent::ActivateTrackRelative,
        UiaEvent::ToggleTrackMuted,
        UiaEvent::SetTrackMuted,
        UiaEvent::ToggleTrackSoloed,
        UiaEvent::SetTrackSoloed,
        UiaEvent::SetTrackVolume,
        UiaEvent::SetTrackPan,
        UiaEvent::SetTrackSend1Amount,
        UiaEvent::SetTrackSend2Amount,
        UiaEvent::SetClipCurrent,
        UiaEvent::SetClipCurrentRelative,
        UiaEvent::ToggleClip,
        UiaEvent::SetClipActiveState,
        UiaEvent::SetSlotGain,
        UiaEvent::SetSlotPan,
        UiaEvent::SetFxAmount,
        UiaEvent::SetTrackClipActiveRelative,
    ];

    /// The machine-readable command token.
    pub fn token(self) -> &'static str {
        match self {
            UiaEvent::None => "NONE",
            UiaEvent::PowerOff => "POWER_OFF",
            UiaEvent::Reboot => "REBOOT",
            UiaEvent::RestartUi => "RESTART_UI",
            UiaEvent::ReloadMidiConfig => "RELOAD_MIDI_CONFIG",
            UiaEvent::ReloadKeybindings => "RELOAD_KEYBINDINGS",
            UiaEvent::LastStateAction => "LAST_STATE_ACTION",
            UiaEvent::AllNotesOff => "ALL_NOTES_OFF",
            UiaEvent::AllSoundsOff => "ALL_SOUNDS_OFF",
            UiaEvent::AllOff => "ALL_OFF",
            UiaEvent::StartAudioRecord => "START_AUDIO_RECORD",
            UiaEvent::StopAudioRecord => "STOP_AUDIO_RECORD",
            UiaEvent::ToggleAudioRecord => "TOGGLE_AUDIO_RECORD",
            UiaEvent::StartAudioPlay => "START_AUDIO_PLAY",
            UiaEvent::StopAudioPlay => "STOP_AUDIO_PLAY",
            UiaEvent::ToggleAudioPlay => "TOGGLE_AUDIO_PLAY",
            UiaEvent::StartMidiRecord => "START_MIDI_RECORD",
            UiaEvent::StopMidiRecord => "STOP_MIDI_RECORD",
            UiaEvent::ToggleMidiRecord => "TOGGLE_MIDI_RECORD",
            UiaEvent::StartMidiPlay => "START_MIDI_PLAY",
            UiaEvent::StopMidiPlay => "STOP_MIDI_PLAY",
            UiaEvent::ToggleMidiPlay => "TOGGLE_MIDI_PLAY",
            UiaEvent::Play => "PLAY",
            UiaEvent::Stop => "STOP",
            UiaEvent::StartRecord => "START_RECORD",
            UiaEvent::StopRecord => "STOP_RECORD",
            UiaEvent::Select => "SELECT",
            UiaEvent::SelectUp => "SELECT_UP",
            UiaEvent::SelectDown => "SELECT_DOWN",
            UiaEvent::SelectLeft => "SELECT_LEFT",
            UiaEvent::SelectRight => "SELECT_RIGHT",
            UiaEvent::NavigateLeft => "NAVIGATE_LEFT",
            UiaEvent::NavigateRight => "NAVIGATE_RIGHT",
            UiaEvent::BackUp => "BACK_UP",
            UiaEvent::BackDown => "BACK_DOWN",
            UiaEvent::LayerUp => "LAYER_UP",
            UiaEvent::LayerDown => "LAYER_DOWN",
            UiaEvent::SnapshotUp => "SNAPSHOT_UP",
            UiaEvent::SnapshotDown => "SNAPSHOT_DOWN",
            UiaEvent::SceneUp => "SCENE_UP",
            UiaEvent::SceneDown => "SCENE_DOWN",
            UiaEvent::Keyboard => "KEYBOARD",
            UiaEvent::SwitchLayerShort => "SWITCH_LAYER_SHORT",
            UiaEvent::SwitchLayerBold => "SWITCH_LAYER_BOLD",
            UiaEvent::SwitchLayerLong => "SWITCH_LAYER_LONG",
            UiaEvent::SwitchBackShort => "SWITCH_BACK_SHORT",
            UiaEvent::SwitchBackBold => "SWITCH_BACK_BOLD",
            UiaEvent::SwitchBackLong => "SWITCH_BACK_LONG",
            UiaEvent::SwitchSnapshotShort => "SWITCH_SNAPSHOT_SHORT",
            UiaEvent::SwitchSnapshotBold => "SWITCH_SNAPSHOT_BOLD",
            UiaEvent::SwitchSnapshotLong => "SWITCH_SNAPSHOT_LONG",
            UiaEvent::SwitchSelectShort => "SWITCH_SELECT_SHORT",
            UiaEvent::SwitchSelectBold => "SWITCH_SELECT_BOLD",
            UiaEvent::SwitchSelectLong => "SWITCH_SELECT_LONG",
            UiaEvent::ModeSwitchShort => "MODE_SWITCH_SHORT",
            UiaEvent::ModeSwitchBold => "MODE_SWITCH_BOLD",
            UiaEvent::ModeSwitchLong => "MODE_SWITCH_LONG",
            UiaEvent::SwitchChannelsModShort => "SWITCH_CHANNELS_SHORT",
            UiaEvent::SwitchChannelsModBold => "SWITCH_CHANNELS_BOLD",
            UiaEvent::SwitchChannelsModLong => "SWITCH_CHANNELS_LONG",
            UiaEvent::SwitchMetronomeShort => "SWITCH_METRONOME_SHORT",
            UiaEvent::SwitchMetronomeBold => "SWITCH_METRONOME_BOLD",
            UiaEvent::SwitchMetronomeLong => "SWITCH_METRONOME_LONG",
            UiaEvent::ScreenAdmin => "SCREEN_ADMIN",
            UiaEvent::ScreenAudioSettings => "SCREEN_AUDIO_SETTINGS",
            UiaEvent::ScreenBank => "SCREEN_BANK",
            UiaEvent::ScreenControl => "SCREEN_CONTROL",
            UiaEvent::ScreenEditContextual => "SCREEN_EDIT_CONTEXTUAL",
            UiaEvent::ScreenLayer => "SCREEN_LAYER",
            UiaEvent::ScreenLayerFx => "SCREEN_LAYER_FX",
            UiaEvent::ScreenMain => "SCREEN_MAIN",
            UiaEvent::ScreenPlaygrid => "SCREEN_PLAYGRID",
            UiaEvent::ScreenPreset => "SCREEN_PRESET",
            UiaEvent::ScreenSketchpad => "SCREEN_SKETCHPAD",
            UiaEvent::ScreenSongManager => "SCREEN_SONG_MANAGER",
            UiaEvent::ModalSnapshotLoad => "MODAL_SNAPSHOT_LOAD",
            UiaEvent::ModalSnapshotSave => "MODAL_SNAPSHOT_SAVE",
            UiaEvent::ModalAudioRecorder => "MODAL_AUDIO_RECORDER",
            UiaEvent::ModalMidiRecorder => "MODAL_MIDI_RECORDER",
            UiaEvent::ModalAlsaMixer => "MODAL_ALSA_MIXER",
            UiaEvent::ModalStepseq => "MODAL_STEPSEQ",
            UiaEvent::Channel1 => "CHANNEL_1",
            UiaEvent::Channel2 => "CHANNEL_2",
            UiaEvent::Channel3 => "CHANNEL_3",
            UiaEvent::Channel4 => "CHANNEL_4",
            UiaEvent::Channel5 => "CHANNEL_5",
            UiaEvent::Channel6 => "CHANNEL_6",
            UiaEvent::Channel7 => "CHANNEL_7",
            UiaEvent::Channel8 => "CHANNEL_8",
            UiaEvent::Channel9 => "CHANNEL_9",
            UiaEvent::Channel10 => "CHANNEL_10",
            UiaEvent::ChannelPrevious => "CHANNEL_PREVIOUS",
            UiaEvent::ChannelNext => "CHANNEL_NEXT",
            UiaEvent::Knob0Up => "KNOB0_UP",
            UiaEvent::Knob0Down => "KNOB0_DOWN",
            UiaEvent::Knob0Touched => "KNOB0_TOUCHED",
            UiaEvent::Knob0Released => "KNOB0_RELEASED",
            UiaEvent::Knob1Up => "KNOB1_UP",
            UiaEvent::Knob1Down => "KNOB1_DOWN",
            UiaEvent::Knob1Touched => "KNOB1_TOUCHED",
            UiaEvent::Knob1Released => "KNOB1_RELEASED",
            UiaEvent::Knob2Up => "KNOB2_UP",
            UiaEvent::Knob2Down => "KNOB2_DOWN",
            UiaEvent::Knob2Touched => "KNOB2_TOUCHED",
            UiaEvent::Knob2Released => "KNOB2_RELEASED",
            UiaEvent::Knob3Up => "KNOB3_UP",
            UiaEvent::Knob3Down => "KNOB3_DOWN",
            UiaEvent::Knob3Touched => "KNOB3_TOUCHED",
            UiaEvent::Knob3Released => "KNOB3_RELEASED",
            UiaEvent::Increase => "INCREASE",
            UiaEvent::Decrease => "DECREASE",
            UiaEvent::SwitchPressed => "SWITCH_PRESSED",
            UiaEvent::SwitchReleased => "SWITCH_RELEASED",
            UiaEvent::ActivateTrack => "ACTIVATE_TRACK",
            UiaEvent::ActivateTrackRelative => "ACTIVATE_TRACK_RELATIVE",
            UiaEvent::ToggleTrackMuted => "TOGGLE_TRACK_MUTED",
            UiaEvent::SetTrackMuted => "SET_TRACK_MUTED",
            UiaEvent::ToggleTrackSoloed => "TOGGLE_TRACK_SOLOED",
            UiaEvent::SetTrackSoloed => "SET_TRACK_SOLOED",
            UiaEvent::SetTrackVolume => "SET_TRACK_VOLUME",
            UiaEvent::SetTrackPan => "SET_TRACK_PAN",
            UiaEvent::SetTrackSend1Amount => "SET_TRACK_SEND1_AMOUNT",
            UiaEvent::SetTrackSend2Amount => "SET_TRACK_SEND2_AMOUNT",
            UiaEvent::SetClipCurrent => "SET_CLIP_CURRENT",
            UiaEvent::SetClipCurrentRelative => "SET_CLIP_CURRENT_RELATIVE",
            UiaEvent::ToggleClip => "TOGGLE_CLIP",
            UiaEvent::SetClipActiveState => "SET_CLIP_ACTIVE_STATE",
            UiaEvent::SetSlotGain => "SET_SLOT_GAIN",
            UiaEvent::SetSlotPan => "SET_SLOT_PAN",
            UiaEvent::SetFxAmount => "SET_FX_AMOUNT",
            UiaEvent::SetTrackClipActiveRelative => "SET_TRACK_CLIP_ACTIVE_RELATIVE",
        }
    }

    /// The human-readable title.
    pub fn title(self) -> &'static str {
        match self {
            UiaEvent::None => "No Event",
            UiaEvent::PowerOff => "Show Power Off Popup",
            UiaEvent::Reboot => "Show Reboot Popup",
            UiaEvent::RestartUi => "Show UI Restart Popup",
            UiaEvent::ReloadMidiConfig => "Reload Midi Configuration",
            UiaEvent::ReloadKeybindings => "Reload Keybindings",
            UiaEvent::LastStateAction => "Recall Last State",
            UiaEvent::AllNotesOff => "Send All Notes Off",
            UiaEvent::AllSoundsOff => "Send All Sounds Off",
            UiaEvent::AllOff => "Send All Off",
            UiaEvent::StartAudioRecord => "Start Audio Recording",
            UiaEvent::StopAudioRecord => "Stop Audio Recording",
            UiaEvent::ToggleAudioRecord => "Toggle Audio Recording",
            UiaEvent::StartAudioPlay => "Start Audio Playback",
            UiaEvent::StopAudioPlay => "Stop Audio Playback",
            UiaEvent::ToggleAudioPlay => "Toggle Audio Playback",
            UiaEvent::StartMidiRecord => "Start Midi Recording",
            UiaEvent::StopMidiRecord => "Stop Midi Recording",
            UiaEvent::ToggleMidiRecord => "Toggle Midi Recording",
            UiaEvent::StartMidiPlay => "Start Midi Playback",
            UiaEvent::StopMidiPlay => "Stop Midi Playback",
            UiaEvent::ToggleMidiPlay => "Toggle Midi Playback",
            UiaEvent::Play => "Start Playback",
            UiaEvent::Stop => "Stop Playback",
            UiaEvent::StartRecord => "Record",
            UiaEvent::StopRecord => "Stop Recording",
            UiaEvent::Select => "Select",
            UiaEvent::SelectUp => "Select Up",
            UiaEvent::SelectDown => "Select Down",
            UiaEvent::SelectLeft => "Select Left",
            UiaEvent::SelectRight => "Select Right",
            UiaEvent::NavigateLeft => "Navigate Left",
            UiaEvent::NavigateRight => "Navigate Right",
            UiaEvent::BackUp => "Back Up",
            UiaEvent::BackDown => "Back Down",
            UiaEvent::LayerUp => "Layer Up",
            UiaEvent::LayerDown => "Layer Down",
            UiaEvent::SnapshotUp => "Snapshot Up",
            UiaEvent::SnapshotDown => "Snapshot Down",
            UiaEvent::SceneUp => "Scene Up",
            UiaEvent::SceneDown => "Scene Down",
            UiaEvent::Keyboard => "Toggle Keyboard",
            UiaEvent::SwitchLayerShort => "Short Press Layer Button",
            UiaEvent::SwitchLayerBold => "Bold Press Layer Button",
            UiaEvent::SwitchLayerLong => "Long Press Layer Button",
            UiaEvent::SwitchBackShort => "Short Press Back Button",
            UiaEvent::SwitchBackBold => "Bold Press Back Button",
            UiaEvent::SwitchBackLong => "Long Press Back Button",
            UiaEvent::SwitchSnapshotShort => "Short Press Snapshot Button",
            UiaEvent::SwitchSnapshotBold => "Bold Press Snapshot Button",
            UiaEvent::SwitchSnapshotLong => "Long Press Snapshot Button",
            UiaEvent::SwitchSelectShort => "Short Press Select Button",
            UiaEvent::SwitchSelectBold => "Bold Press Select Button",
            UiaEvent::SwitchSelectLong => "Long Press Select Button",
            UiaEvent::ModeSwitchShort => "Short Press Mode Button",
            UiaEvent::ModeSwitchBold => "Bold Press Mode Button",
            UiaEvent::ModeSwitchLong => "Long Press Mode Button",
            UiaEvent::SwitchChannelsModShort => "Short Press Channel Mod Button",
            UiaEvent::SwitchChannelsModBold => "Bold Press Channel Mod Button",
            UiaEvent::SwitchChannelsModLong => "Long Press Channel Mod Button",
            UiaEvent::SwitchMetronomeShort => "Short Press Metronome Button",
            UiaEvent::SwitchMetronomeBold => "Bold Press Metronome Button",
            UiaEvent::SwitchMetronomeLong => "Long Press Metronome Button",
            UiaEvent::ScreenAdmin => "Show Admin Screen",
            UiaEvent::ScreenAudioSettings => "Show Audio Settings Screen",
            UiaEvent::ScreenBank => "Show Bank Screen",
            UiaEvent::ScreenControl => "Show Control Screen",
            UiaEvent::ScreenEditContextual => "Show Contextual Edit Screen",
            UiaEvent::ScreenLayer => "Show Layer Screen",
            UiaEvent::ScreenLayerFx => "Show Layer FX Screen",
            UiaEvent::ScreenMain => "Show Main Menu",
            UiaEvent::ScreenPlaygrid => "Show Playground",
            UiaEvent::ScreenPreset => "Show Preset Selection Screen",
            UiaEvent::ScreenSketchpad => "Show Sketchpad",
            UiaEvent::ScreenSongManager => "Show Song Manager",
            UiaEvent::ModalSnapshotLoad => "Load Snapshot",
            UiaEvent::ModalSnapshotSave => "Save Snapshot",
            UiaEvent::ModalAudioRecorder => "Show Audio Recorder",
            UiaEvent::ModalMidiRecorder => "Show Midi Recorder",
            UiaEvent::ModalAlsaMixer => "Show Mixer",
            UiaEvent::ModalStepseq => "Show Step Sequencer",
            UiaEvent::Channel1 => "Switch to Track 1",
            UiaEvent::Channel2 => "Switch to Track 2",
            UiaEvent::Channel3 => "Switch to Track 3",
            UiaEvent::Channel4 => "Switch to Track 4",
            UiaEvent::Channel5 => "Switch to Track 5",
            UiaEvent::Channel6 => "Switch to Track 6",
            UiaEvent::Channel7 => "Switch to Track 7",
            UiaEvent::Channel8 => "Switch to Track 8",
            UiaEvent::Channel9 => "Switch to Track 9",
            UiaEvent::Channel10 => "Switch to Track 10",
            UiaEvent::ChannelPrevious => "Switch to Previous Track",
            UiaEvent::ChannelNext => "Switch to Next Track",
            UiaEvent::Knob0Up => "Knob 1: Up",
            UiaEvent::Knob0Down => "Knob 1: Down",
            UiaEvent::Knob0Touched => "Knob 1: Touch",
            UiaEvent::Knob0Released => "Knob 1: Release",
            UiaEvent::Knob1Up => "Knob 2: Up",
            UiaEvent::Knob1Down => "Knob 2: Down",
            UiaEvent::Knob1Touched => "Knob 2: Touch",
            UiaEvent::Knob1Released => "Knob 2: Release",
            UiaEvent::Knob2Up => "Knob 3: Up",
            UiaEvent::Knob2Down => "Knob 3: Down",
            UiaEvent::Knob2Touched => "Knob 3: Touch",
            UiaEvent::Knob2Released => "Knob 3: Release",
            UiaEvent::Knob3Up => "Knob 4: Up",
            UiaEvent::Knob3Down => "Knob 4: Down",
            UiaEvent::Knob3Touched => "Knob 4: Touch",
            UiaEvent::Knob3Released => "Knob 4: Release",
            UiaEvent::Increase => "Increase Value",
            UiaEvent::Decrease => "Decrease Value",
            UiaEvent::SwitchPressed => "Switch Pressed",
            UiaEvent::SwitchReleased => "Switch Released",
            UiaEvent::ActivateTrack => "Activate Track",
            UiaEvent::ActivateTrackRelative => "Activate Track (Relative)",
            UiaEvent::ToggleTrackMuted => "Toggle Track Muted",
            UiaEvent::SetTrackMuted => "Set Track Muted",
            UiaEvent::ToggleTrackSoloed => "Toggle Track Soloed",
            UiaEvent::SetTrackSoloed => "Set Track Soloed",
            UiaEvent::SetTrackVolume => "Set Track Volume",
            UiaEvent::SetTrackPan => "Set Track Pan",
            UiaEvent::SetTrackSend1Amount => "Set Track Send 1 Amount",
            UiaEvent::SetTrackSend2Amount => "Set Track Send 2 Amount",
            UiaEvent::SetClipCurrent => "Select Clip",
            UiaEvent::SetClipCurrentRelative => "Select Clip (Relative)",
            UiaEvent::ToggleClip => "Toggle Clip",
            UiaEvent::SetClipActiveState => "Set Clip Active State",
            UiaEvent::SetSlotGain => "Set Slot Gain",
            UiaEvent::SetSlotPan => "Set Slot Pan",
            UiaEvent::SetFxAmount => "Set FX Amount",
            UiaEvent::SetTrackClipActiveRelative => "Select Track and Clip (Relative)",
        }
    }

    /// Look up the event for a command token. Unknown tokens map to
    /// [`UiaEvent::None`], which consumers treat as a no-op.
    pub fn from_token(token: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|event| event.token() == token)
            .unwrap_or(UiaEvent::None)
    }

    /// Whether the command carries a track parameter.
    pub fn wants_track(self) -> bool {
        matches!(
            self,
            UiaEvent::ActivateTrack
                | UiaEvent::ToggleTrackMuted
                | UiaEvent::SetTrackMuted
                | UiaEvent::ToggleTrackSoloed
                | UiaEvent::SetTrackSoloed
                | UiaEvent::SetTrackVolume
                | UiaEvent::SetTrackPan
                | UiaEvent::SetTrackSend1Amount
                | UiaEvent::SetTrackSend2Amount
                | UiaEvent::SetClipCurrent
                | UiaEvent::ToggleClip
                | UiaEvent::SetClipActiveState
                | UiaEvent::SetSlotGain
                | UiaEvent::SetSlotPan
                | UiaEvent::SetFxAmount
        )
    }

    /// Whether the command carries a slot parameter.
    pub fn wants_slot(self) -> bool {
        matches!(
            self,
            UiaEvent::SetClipCurrent
                | UiaEvent::ToggleClip
                | UiaEvent::SetClipActiveState
                | UiaEvent::SetSlotGain
                | UiaEvent::SetSlotPan
                | UiaEvent::SetFxAmount
        )
    }

    /// Whether the command carries a value parameter.
    pub fn wants_value(self) -> bool {
        matches!(
            self,
            UiaEvent::SwitchPressed
                | UiaEvent::SwitchReleased
                | UiaEvent::ActivateTrackRelative
                | UiaEvent::SetTrackMuted
                | UiaEvent::SetTrackSoloed
                | UiaEvent::SetTrackVolume
                | UiaEvent::SetTrackPan
                | UiaEvent::SetTrackSend1Amount
                | UiaEvent::SetTrackSend2Amount
                | UiaEvent::SetClipCurrentRelative
                | UiaEvent::SetClipActiveState
                | UiaEvent::SetSlotGain
                | UiaEvent::SetSlotPan
                | UiaEvent::SetFxAmount
                | UiaEvent::SetTrackClipActiveRelative
        )
    }

    /// A human-readable description of a concrete command, with the track,
    /// slot, and value (or value range) substituted in.
    pub fn describe(self, track: Track, slot: Slot, value: u8, upper_value: Option<u8>) -> String {
        match self {
            UiaEvent::SwitchPressed => format!("Switch {value} Pressed"),
            UiaEvent::SwitchReleased => format!("Switch {value} Released"),
            UiaEvent::ActivateTrack => format!("Activate {}", track.label_text()),
            UiaEvent::ToggleTrackMuted => format!("Toggle {} Muted", track.label_text()),
            UiaEvent::ToggleTrackSoloed => format!("Toggle {} Soloed", track.label_text()),
            UiaEvent::SetTrackVolume => match upper_value {
                None => format!(
                    "Set {} volume to {}%",
                    track.label_text(),
                    percent(relative_cc_value(value))
                ),
                Some(upper) => format!(
                    "Set {} volume to between {}% and {}%",
                    track.label_text(),
                    percent(relative_cc_value(value)),
                    percent(relative_cc_value(upper))
                ),
            },
            UiaEvent::SetTrackPan => match upper_value {
                None => format!(
                    "Set {} pan to {}%",
                    track.label_text(),
                    percent(centered_relative_cc_value(value))
                ),
                Some(upper) => format!(
                    "Set {} pan to between {}% and {}%",
                    track.label_text(),
                    percent(centered_relative_cc_value(value)),
                    percent(centered_relative_cc_value(upper))
                ),
            },
            UiaEvent::SetTrackSend1Amount => match upper_value {
                None => format!(
                    "Set {} Send FX 1 amount to {}%",
                    track.label_text(),
                    percent(relative_cc_value(value))
                ),
                Some(upper) => format!(
                    "Set {} Send FX 1 amount to between {}% and {}%",
                    track.label_text(),
                    percent(relative_cc_value(value)),
                    percent(relative_cc_value(upper))
                ),
            },
            UiaEvent::SetTrackSend2Amount => format!(
                "Set {} Send FX 2 amount to {}%",
                track.label_text(),
                percent(relative_cc_value(value))
            ),
            UiaEvent::ToggleClip => format!(
                "Toggle {} on {}",
                slot.clip_label_text(),
                track.label_text()
            ),
            UiaEvent::SetClipActiveState => match value {
                1 => format!(
                    "Deactivate {} on {}",
                    slot.clip_label_text(),
                    track.label_text()
                ),
                2 => format!(
                    "Deactivate {} on {} Next Beat",
                    slot.clip_label_text(),
                    track.label_text()
                ),
                3 => format!(
                    "Activate {} on {} Next Bar",
                    slot.clip_label_text(),
                    track.label_text()
                ),
                _ => format!(
                    "Activate {} on {}",
                    slot.clip_label_text(),
                    track.label_text()
                ),
            },
            UiaEvent::SetSlotGain => match upper_value {
                None => format!(
                    "Set Gain to {}% for {} on {}",
                    percent(relative_cc_value(value)),
                    slot.label_text(),
                    track.label_text()
                ),
                Some(upper) => format!(
                    "Set Gain to between {}% and {}% for {} on {}",
                    percent(relative_cc_value(value)),
                    percent(relative_cc_value(upper)),
                    slot.label_text(),
                    track.label_text()
                ),
            },
            UiaEvent::SetFxAmount => match upper_value {
                None => format!(
                    "Set FX wet/dry mix to {}% for {} on {}",
                    percent(centered_relative_cc_value(value)),
                    slot.fx_label_text(),
                    track.label_text()
                ),
                Some(upper) => format!(
                    "Set FX wet/dry mix to between {}% and {}% for {} on {}",
                    percent(centered_relative_cc_value(value)),
                    percent(centered_relative_cc_value(upper)),
                    slot.fx_label_text(),
                    track.label_text()
                ),
            },
            _ => self.title().to_string(),
        }
    }
}
