//! Actions and the command triple.

use std::fmt;

use crate::error::ActionError;

/// One invocable downstream step.
///
/// The returned bytes are opaque and only ever logged.
#[cfg_attr(test, mockall::automock)]
pub trait Action: Send {
    /// Runs the step.
    fn run(&self) -> Result<Vec<u8>, ActionError>;

    /// Renders the step for logs, e.g. the command line it runs.
    fn describe(&self) -> String;
}

/// Which member of a [`Command`] is being run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    Do,
    Undo,
    Finalize,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Do => "do",
            Self::Undo => "undo",
            Self::Finalize => "finalize",
        })
    }
}

/// A `(do, undo, finalize)` triple. Absent members are no-ops.
#[derive(Default)]
pub struct Command {
    do_action: Option<Box<dyn Action>>,
    undo_action: Option<Box<dyn Action>>,
    finalize_action: Option<Box<dyn Action>>,
}

impl Command {
    /// Groups three optional actions.
    #[must_use]
    pub fn new(
        do_action: Option<Box<dyn Action>>,
        undo_action: Option<Box<dyn Action>>,
        finalize_action: Option<Box<dyn Action>>,
    ) -> Self {
        Self {
            do_action,
            undo_action,
            finalize_action,
        }
    }

    /// Renders the first present member, or `noop`.
    #[must_use]
    pub fn describe(&self) -> String {
        [&self.do_action, &self.undo_action, &self.finalize_action]
            .into_iter()
            .flatten()
            .next()
            .map_or_else(|| "noop".to_owned(), |action| action.describe())
    }

    pub(crate) fn action(&self, step: Step) -> Option<&dyn Action> {
        match step {
            Step::Do => self.do_action.as_deref(),
            Step::Undo => self.undo_action.as_deref(),
            Step::Finalize => self.finalize_action.as_deref(),
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let render = |action: &Option<Box<dyn Action>>| action.as_ref().map(|a| a.describe());
        f.debug_struct("Command")
            .field("do", &render(&self.do_action))
            .field("undo", &render(&self.undo_action))
            .field("finalize", &render(&self.finalize_action))
            .finish()
    }
}
