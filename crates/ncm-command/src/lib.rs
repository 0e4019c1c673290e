//! Ordered, reversible command batches.
//!
//! Handlers describe the downstream work for one configuration change as a
//! sequence of [`Command`]s, each a `(do, undo, finalize)` triple of
//! [`Action`]s. [`CommandBatch::commit`] runs every `do` in order, unwinds the
//! applied prefix when one fails, and runs the `finalize` pass only once every
//! `do` has succeeded.

mod action;
mod batch;
mod error;
mod shell;


pub use action::{Action, Command};
pub use batch::CommandBatch;
pub use error::{ActionError, CommandError};
pub use shell::ShellAction;
