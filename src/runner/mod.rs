mod tool;

pub use tool::{ToolHandle, ToolRunner};
