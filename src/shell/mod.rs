//! External installer script execution.

pub mod command;
pub mod fake;

pub use command::{ScriptOutput, ScriptRunner, SbinScriptRunner};
pub use fake::{FakeScriptRunner, RecordedCall};
