use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use turtle_core::{Direction, RecordedInput};

const TRANSFER_DOMAIN: &str = "turtle";
const TRANSFER_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded recording payload.
pub(crate) const TRANSFER_HEADER: &str = "turtle:v1";
/// Delimiter used to separate the prefix, input count and payload.
const FIELD_DELIMITER: char = ':';

/// Recorded player input bound to the level it was captured on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct RecordingTransfer {
    /// Name of the level the input was captured on.
    pub(crate) level: String,
    /// Captured input in recording order.
    pub(crate) inputs: Vec<RecordedInput>,
}

impl RecordingTransfer {
    /// Encodes the recording into a single-line string suitable for saving.
    pub(crate) fn encode(&self) -> Result<String, RecordingTransferError> {
        let payload = SerializableRecording {
            level: self.level.clone(),
            inputs: self
                .inputs
                .iter()
                .map(|input| (input.frame, input.direction.index()))
                .collect(),
        };
        let json = serde_json::to_vec(&payload).map_err(RecordingTransferError::InvalidPayload)?;
        let encoded = STANDARD_NO_PAD.encode(json);
        Ok(format!("{TRANSFER_HEADER}:{}:{encoded}", self.inputs.len()))
    }

    /// Decodes a recording from the provided string representation.
    pub(crate) fn decode(value: &str) -> Result<Self, RecordingTransferError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(RecordingTransferError::EmptyPayload);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(RecordingTransferError::MissingPrefix)?;
        let version = parts.next().ok_or(RecordingTransferError::MissingVersion)?;
        let count = parts.next().ok_or(RecordingTransferError::MissingCount)?;
        let payload = parts.next().ok_or(RecordingTransferError::MissingPayload)?;

        if domain != TRANSFER_DOMAIN {
            return Err(RecordingTransferError::InvalidPrefix(domain.to_owned()));
        }
        if version != TRANSFER_VERSION {
            return Err(RecordingTransferError::UnsupportedVersion(
                version.to_owned(),
            ));
        }

        let count = count
            .trim()
            .parse::<usize>()
            .map_err(|_| RecordingTransferError::InvalidCount(count.to_owned()))?;
        let bytes = STANDARD_NO_PAD
            .decode(payload.as_bytes())
            .map_err(RecordingTransferError::InvalidEncoding)?;
        let decoded: SerializableRecording =
            serde_json::from_slice(&bytes).map_err(RecordingTransferError::InvalidPayload)?;
        if decoded.inputs.len() != count {
            return Err(RecordingTransferError::CountMismatch {
                declared: count,
                actual: decoded.inputs.len(),
            });
        }

        let inputs = decoded
            .inputs
            .into_iter()
            .map(|(frame, code)| {
                Direction::from_index(code)
                    .map(|direction| RecordedInput { frame, direction })
                    .ok_or(RecordingTransferError::InvalidDirection(code))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            level: decoded.level,
            inputs,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct SerializableRecording {
    level: String,
    inputs: Vec<(u64, i32)>,
}

/// Errors that can occur while encoding or decoding recording transfer strings.
#[derive(Debug, Error)]
pub(crate) enum RecordingTransferError {
    /// The provided string was empty or contained only whitespace.
    #[error("recording payload was empty")]
    EmptyPayload,
    /// The prefix segment was missing from the encoded recording.
    #[error("recording string is missing the prefix")]
    MissingPrefix,
    /// The encoded recording did not contain a version segment.
    #[error("recording string is missing the version")]
    MissingVersion,
    /// The encoded recording did not declare how many inputs it holds.
    #[error("recording string is missing the input count")]
    MissingCount,
    /// The encoded recording did not include the payload segment.
    #[error("recording string is missing the payload")]
    MissingPayload,
    /// The encoded recording used an unexpected prefix segment.
    #[error("recording prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The encoded recording used an unsupported version identifier.
    #[error("recording version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The declared input count could not be parsed.
    #[error("could not parse input count '{0}'")]
    InvalidCount(String),
    /// The payload held a different number of inputs than declared.
    #[error("recording declares {declared} inputs but carries {actual}")]
    CountMismatch {
        /// Count written in the header.
        declared: usize,
        /// Count found in the payload.
        actual: usize,
    },
    /// A direction code outside `0..4` was found.
    #[error("direction code {0} is not valid")]
    InvalidDirection(i32),
    /// The base64 payload could not be decoded.
    #[error("could not decode recording payload: {0}")]
    InvalidEncoding(#[source] base64::DecodeError),
    /// The payload could not be serialised or deserialised.
    #[error("could not parse recording payload: {0}")]
    InvalidPayload(#[source] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_empty_recording() {
        let transfer = RecordingTransfer {
            level: "empty".to_string(),
            inputs: Vec::new(),
        };

        let encoded = transfer.encode().expect("recording encodes");
        assert!(encoded.starts_with(&format!("{TRANSFER_HEADER}:0:")));

        let decoded = RecordingTransfer::decode(&encoded).expect("recording decodes");
        assert_eq!(transfer, decoded);
    }

    #[test]
    fn round_trip_populated_recording() {
        let transfer = RecordingTransfer {
            level: "meadow".to_string(),
            inputs: vec![
                RecordedInput {
                    frame: 3,
                    direction: Direction::East,
                },
                RecordedInput {
                    frame: 17,
                    direction: Direction::North,
                },
            ],
        };

        let encoded = transfer.encode().expect("recording encodes");
        assert!(encoded.starts_with(&format!("{TRANSFER_HEADER}:2:")));

        let decoded = RecordingTransfer::decode(&format!("  {encoded}\n")).expect("decodes");
        assert_eq!(transfer, decoded);
    }

    #[test]
    fn foreign_prefix_is_rejected() {
        let error = RecordingTransfer::decode("lemming:v1:3:e30").unwrap_err();
        assert!(matches!(
            error,
            RecordingTransferError::InvalidPrefix(prefix) if prefix == "lemming"
        ));
    }

    #[test]
    fn corrupt_payload_reports_its_cause() {
        let error = RecordingTransfer::decode("turtle:v1:0:!!!").unwrap_err();
        assert!(matches!(error, RecordingTransferError::InvalidEncoding(_)));
        assert!(error
            .to_string()
            .starts_with("could not decode recording payload"));
        assert!(std::error::Error::source(&error).is_some());
    }

    #[test]
    fn tampered_count_is_rejected() {
        let transfer = RecordingTransfer {
            level: "meadow".to_string(),
            inputs: vec![RecordedInput {
                frame: 1,
                direction: Direction::West,
            }],
        };
        let encoded = transfer.encode().expect("recording encodes");
        let tampered = encoded.replacen(":1:", ":4:", 1);
        assert!(matches!(
            RecordingTransfer::decode(&tampered),
            Err(RecordingTransferError::CountMismatch {
                declared: 4,
                actual: 1
            })
        ));
    }

    #[test]
    fn invalid_direction_code_is_rejected() {
        let payload = SerializableRecording {
            level: "x".to_string(),
            inputs: vec![(0, 9)],
        };
        let json = serde_json::to_vec(&payload).expect("json");
        let encoded = format!("{TRANSFER_HEADER}:1:{}", STANDARD_NO_PAD.encode(json));
        assert!(matches!(
            RecordingTransfer::decode(&encoded),
            Err(RecordingTransferError::InvalidDirection(9))
        ));
    }
}
