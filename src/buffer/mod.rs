mod log;

pub use log::{LogBuffer, LogLine, StreamKind};
