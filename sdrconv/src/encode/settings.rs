//! Closed preset catalogs consumed by the encoder constructor.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Sample rate the demodulated audio arrives at.
pub const NATIVE_SAMPLE_RATE: u32 = 8000;

/// LAME quality level used by the middle VBR preset.
pub const LAME_QUALITY_MIDDLE: u32 = 5;

/// LAME quality level used by the low VBR preset.
pub const LAME_QUALITY_LOW: u32 = 7;

/// Encoder input sample rates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioSampleRate {
    #[default]
    Sr8000,
    Sr22050,
    Sr44100,
}

impl AudioSampleRate {
    pub const ALL: [AudioSampleRate; 3] = [
        AudioSampleRate::Sr8000,
        AudioSampleRate::Sr22050,
        AudioSampleRate::Sr44100,
    ];

    pub fn sample_rate(&self) -> u32 {
        match self {
            AudioSampleRate::Sr8000 => 8000,
            AudioSampleRate::Sr22050 => 22050,
            AudioSampleRate::Sr44100 => 44100,
        }
    }

    /// True when audio at this rate needs no resampling.
    pub fn is_native(&self) -> bool {
        self.sample_rate() == NATIVE_SAMPLE_RATE
    }
}

impl Display for AudioSampleRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudioSampleRate::Sr8000 => write!(f, "8000 Hz (default)"),
            AudioSampleRate::Sr22050 => write!(f, "22050 Hz"),
            AudioSampleRate::Sr44100 => write!(f, "44100 Hz"),
        }
    }
}

/// Bitrate mode and quality presets for the MP3 encoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mp3Setting {
    #[default]
    Cbr16,
    Cbr32,
    Abr56,
    Vbr5,
    Vbr7,
}

impl Mp3Setting {
    pub const ALL: [Mp3Setting; 5] = [
        Mp3Setting::Cbr16,
        Mp3Setting::Cbr32,
        Mp3Setting::Abr56,
        Mp3Setting::Vbr5,
        Mp3Setting::Vbr7,
    ];

    /// False for constant bitrate presets, true for average or variable.
    pub fn is_variable_bit_rate(&self) -> bool {
        !matches!(self, Mp3Setting::Cbr16 | Mp3Setting::Cbr32)
    }

    /// Bitrate in kbps for CBR/ABR presets, LAME quality level for VBR presets.
    pub fn setting(&self) -> u32 {
        match self {
            Mp3Setting::Cbr16 => 16,
            Mp3Setting::Cbr32 => 32,
            Mp3Setting::Abr56 => 56,
            Mp3Setting::Vbr5 => LAME_QUALITY_MIDDLE,
            Mp3Setting::Vbr7 => LAME_QUALITY_LOW,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Mp3Setting::Cbr16 => "Constant Bit Rate (CBR) of 16 kbps",
            Mp3Setting::Cbr32 => "Constant Bit Rate (CBR) of 32 kbps",
            Mp3Setting::Abr56 => "Average Bit Rate (ABR) of 56 kbps",
            Mp3Setting::Vbr5 => "Variable Bit Rate (VBR) using LAME middle quality",
            Mp3Setting::Vbr7 => "Variable Bit Rate (VBR) using LAME low quality",
        }
    }
}

impl Display for Mp3Setting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mp3Setting::Cbr16 => write!(f, "CBR - 16kbps"),
            Mp3Setting::Cbr32 => write!(f, "CBR - 32kbps"),
            Mp3Setting::Abr56 => write!(f, "ABR - 56 kbps"),
            Mp3Setting::Vbr5 => write!(f, "VBR - Middle Quality"),
            Mp3Setting::Vbr7 => write!(f, "VBR - Low Quality"),
        }
    }
}

#[test]
fn test_presets() {
    assert_eq!(AudioSampleRate::default(), AudioSampleRate::Sr8000);
    assert!(AudioSampleRate::Sr8000.is_native());
    assert!(!AudioSampleRate::Sr22050.is_native());
    assert_eq!(AudioSampleRate::Sr44100.sample_rate(), 44100);
    assert_eq!(AudioSampleRate::Sr8000.to_string(), "8000 Hz (default)");

    assert_eq!(Mp3Setting::default(), Mp3Setting::Cbr16);
    let variable = Mp3Setting::ALL
        .iter()
        .filter(|s| s.is_variable_bit_rate())
        .count();
    assert_eq!(variable, 3);
    assert_eq!(Mp3Setting::Vbr7.setting(), LAME_QUALITY_LOW);
    assert_eq!(Mp3Setting::Abr56.to_string(), "ABR - 56 kbps");
}
