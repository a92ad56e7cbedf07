//! Replay commands
//!
//! A command is one row of the event CSV turned into a domain value. Every
//! command names the machine it concerns so replay can be partitioned by
//! machine, exactly like the engine serializes work per machine.

use super::booking::{BookingEvent, BookingId, BookingRequest};
use super::machinery::MachineryId;

/// What a command asks the engine to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandAction {
    /// Create a new booking
    Create(BookingRequest),

    /// Move an existing booking through its lifecycle
    Transition(BookingEvent),
}

/// One replayable command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingCommand {
    /// Machine the command concerns
    pub machinery: MachineryId,

    /// Booking created or targeted
    pub booking: BookingId,

    pub action: CommandAction,
}

impl BookingCommand {
    /// Short name of the action for logs
    pub fn kind(&self) -> &'static str {
        match &self.action {
            CommandAction::Create(_) => "create",
            CommandAction::Transition(event) => event.name(),
        }
    }
}
