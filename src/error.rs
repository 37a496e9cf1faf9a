//! Error type for the fallible edges: audio devices, config files, WAV and JSON output

use std::fmt;

#[derive(Debug)]
pub enum PrimefieldError {
    /// No output device, or the device rejected its configuration
    AudioDevice(String),
    /// Output stream could not be built or started
    AudioStream(String),
    /// Device sample format we cannot render
    UnsupportedFormat(String),
    /// Config file did not parse
    Config(String),
    /// WAV writing failed
    Wav(String),
    /// JSON serialization failed
    Serde(String),
    Io(std::io::Error),
}

impl fmt::Display for PrimefieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimefieldError::AudioDevice(msg) => write!(f, "Audio device error: {}", msg),
            PrimefieldError::AudioStream(msg) => write!(f, "Audio stream error: {}", msg),
            PrimefieldError::UnsupportedFormat(fmt) => {
                write!(f, "Unsupported sample format: {}", fmt)
            }
            PrimefieldError::Config(msg) => write!(f, "Config error: {}", msg),
            PrimefieldError::Wav(msg) => write!(f, "WAV error: {}", msg),
            PrimefieldError::Serde(msg) => write!(f, "Serialization error: {}", msg),
            PrimefieldError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for PrimefieldError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PrimefieldError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PrimefieldError {
    fn from(e: std::io::Error) -> Self {
        PrimefieldError::Io(e)
    }
}

impl From<toml::de::Error> for PrimefieldError {
    fn from(e: toml::de::Error) -> Self {
        PrimefieldError::Config(e.to_string())
    }
}

impl From<hound::Error> for PrimefieldError {
    fn from(e: hound::Error) -> Self {
        match e {
            hound::Error::IoError(io) => PrimefieldError::Io(io),
            other => PrimefieldError::Wav(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for PrimefieldError {
    fn from(e: serde_json::Error) -> Self {
        PrimefieldError::Serde(e.to_string())
    }
}

impl From<cpal::DefaultStreamConfigError> for PrimefieldError {
    fn from(e: cpal::DefaultStreamConfigError) -> Self {
        PrimefieldError::AudioDevice(e.to_string())
    }
}

impl From<cpal::DeviceNameError> for PrimefieldError {
    fn from(e: cpal::DeviceNameError) -> Self {
        PrimefieldError::AudioDevice(e.to_string())
    }
}

impl From<cpal::BuildStreamError> for PrimefieldError {
    fn from(e: cpal::BuildStreamError) -> Self {
        PrimefieldError::AudioStream(e.to_string())
    }
}

impl From<cpal::PlayStreamError> for PrimefieldError {
    fn from(e: cpal::PlayStreamError) -> Self {
        PrimefieldError::AudioStream(e.to_string())
    }
}

/// Result type for primefield operations
pub type Result<T> = std::result::Result<T, PrimefieldError>;
