use crate::buffer::StreamKind;
use crate::error::InvalidEvent;

/// State text reported once the tool process is up
pub const STATE_RUNNING: &str = "The process is running...";
/// State text reported while the tool process is being spawned
pub const STATE_STARTING: &str = "starting";

// Raw wire tags, in the producer's declaration order
const TAG_STATE: u8 = 0;
const TAG_STDOUT: u8 = 1;
const TAG_STDERR: u8 = 2;
const TAG_FINISHED: u8 = 3;
const TAG_ERROR: u8 = 4;

/// Event from the tool process
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEvent {
    /// Human-readable phase description
    State(String),
    /// One line of tool output
    Output(StreamKind, String),
    /// Process exited with an exit code
    Finished(i32),
    /// Process could not be started or crashed abnormally
    Error(String),
}

impl ProcessEvent {
    /// Parse an untyped `(tag, payload)` pair from a producer.
    ///
    /// The payload of a `Finished` event must be the decimal exit code.
    pub fn from_tagged(tag: u8, payload: String) -> Result<Self, InvalidEvent> {
        match tag {
            TAG_STATE => Ok(Self::State(payload)),
            TAG_STDOUT => Ok(Self::Output(StreamKind::Stdout, payload)),
            TAG_STDERR => Ok(Self::Output(StreamKind::Stderr, payload)),
            TAG_FINISHED => match payload.trim().parse::<i32>() {
                Ok(code) => Ok(Self::Finished(code)),
                Err(_) => {
                    tracing::warn!(%payload, "finished event with malformed exit code");
                    Err(InvalidEvent::NonIntegerExitCode(payload))
                }
            },
            TAG_ERROR => Ok(Self::Error(payload)),
            unknown => {
                tracing::warn!(tag = unknown, "dropping event with unknown tag");
                Err(InvalidEvent::UnknownTag(unknown))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn from_tagged_parses_state() {
        let event = ProcessEvent::from_tagged(0, STATE_RUNNING.into()).unwrap();
        assert_eq!(event, ProcessEvent::State(STATE_RUNNING.into()));
    }

    #[rstest]
    #[case(1, StreamKind::Stdout)]
    #[case(2, StreamKind::Stderr)]
    fn from_tagged_parses_output_streams(#[case] tag: u8, #[case] kind: StreamKind) {
        let event = ProcessEvent::from_tagged(tag, "building...".into()).unwrap();
        assert_eq!(event, ProcessEvent::Output(kind, "building...".into()));
    }

    #[rstest]
    #[case("0", 0)]
    #[case("1", 1)]
    #[case("-1", -1)]
    #[case(" 137 ", 137)]
    fn from_tagged_parses_exit_codes(#[case] payload: &str, #[case] code: i32) {
        let event = ProcessEvent::from_tagged(3, payload.into()).unwrap();
        assert_eq!(event, ProcessEvent::Finished(code));
    }

    #[test]
    fn from_tagged_rejects_non_integer_exit_code() {
        let err = ProcessEvent::from_tagged(3, "done".into()).unwrap_err();
        assert_eq!(err, InvalidEvent::NonIntegerExitCode("done".into()));
    }

    #[test]
    fn from_tagged_parses_error() {
        let event = ProcessEvent::from_tagged(4, "tool not found".into()).unwrap();
        assert_eq!(event, ProcessEvent::Error("tool not found".into()));
    }

    #[rstest]
    #[case(5)]
    #[case(255)]
    fn from_tagged_rejects_unknown_tags(#[case] tag: u8) {
        let err = ProcessEvent::from_tagged(tag, "payload".into()).unwrap_err();
        assert_eq!(err, InvalidEvent::UnknownTag(tag));
    }
}
