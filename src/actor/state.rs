//! Control commands and the actor lifecycle table

use crate::{Error, Result};

/// Lifecycle state of the asset actor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorState {
    /// Constructed; empty registry, no bus connection
    Created,
    /// Connected to the bus and serving requests
    Running,
    /// Disconnected; registry kept in memory
    Stopped,
    /// Shut down; accepts no further commands
    Terminated,
}

impl std::fmt::Display for ActorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Running => write!(f, "running"),
            Self::Stopped => write!(f, "stopped"),
            Self::Terminated => write!(f, "terminated"),
        }
    }
}

impl ActorState {
    /// State reached after `command` ran, given whether it succeeded
    ///
    /// Applying a configuration never changes the state. A failed `START`
    /// leaves the actor disconnected.
    ///
    /// # Errors
    ///
    /// Returns `Error::Terminated` for any command after termination
    pub fn next(self, command: &Command, succeeded: bool) -> Result<Self> {
        match (self, command, succeeded) {
            (Self::Terminated, _, _) => Err(Error::Terminated),
            (_, Command::Terminate, _) => Ok(Self::Terminated),
            (_, Command::Start, true) => Ok(Self::Running),
            (Self::Running, Command::Start, false) | (_, Command::Stop, _) => Ok(Self::Stopped),
            (state, Command::Config(_) | Command::Verbose | Command::Start, _) => Ok(state),
        }
    }

    /// State after the bus connection closed underneath the actor
    #[must_use]
    pub const fn disconnected(self) -> Self {
        match self {
            Self::Running => Self::Stopped,
            state => state,
        }
    }
}

/// A control-channel command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Adopt the configuration text
    Config(String),
    /// Connect to the bus
    Start,
    /// Disconnect and persist
    Stop,
    /// Toggle verbose diagnostics
    Verbose,
    /// Persist, release everything and exit
    Terminate,
}

impl Command {
    /// Parse string frames as sent on the control channel
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownCommand` for an unrecognised command name and
    /// `Error::InvalidCommand` for an empty request or a `CONFIG` without text
    pub fn parse<I, S>(frames: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut frames = frames.into_iter().map(Into::into);
        let Some(name) = frames.next() else {
            return Err(Error::InvalidCommand("empty command".to_string()));
        };

        match name.as_str() {
            "START" => Ok(Self::Start),
            "STOP" => Ok(Self::Stop),
            "VERBOSE" => Ok(Self::Verbose),
            "$TERM" => Ok(Self::Terminate),
            "CONFIG" => frames.next().map(Self::Config).ok_or_else(|| {
                Error::InvalidCommand("CONFIG requires configuration text".to_string())
            }),
            _ => Err(Error::UnknownCommand(name)),
        }
    }

    /// Command name as it appears on the control channel
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG",
            Self::Start => "START",
            Self::Stop => "STOP",
            Self::Verbose => "VERBOSE",
            Self::Terminate => "$TERM",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_commands() {
        assert_eq!(Command::parse(["START"]).unwrap(), Command::Start);
        assert_eq!(Command::parse(["STOP"]).unwrap(), Command::Stop);
        assert_eq!(Command::parse(["VERBOSE"]).unwrap(), Command::Verbose);
        assert_eq!(Command::parse(["$TERM"]).unwrap(), Command::Terminate);
        assert_eq!(
            Command::parse(["CONFIG", "[bus]"]).unwrap(),
            Command::Config("[bus]".to_string())
        );
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!(matches!(
            Command::parse(["RESTART"]),
            Err(Error::UnknownCommand(name)) if name == "RESTART"
        ));
        assert!(matches!(Command::parse(["start"]), Err(Error::UnknownCommand(_))));
        assert!(matches!(Command::parse(["CONFIG"]), Err(Error::InvalidCommand(_))));
        assert!(matches!(
            Command::parse(Vec::<String>::new()),
            Err(Error::InvalidCommand(_))
        ));
    }

    #[test]
    fn start_transitions() {
        use ActorState::{Created, Running, Stopped};

        assert_eq!(Created.next(&Command::Start, true).unwrap(), Running);
        assert_eq!(Created.next(&Command::Start, false).unwrap(), Created);
        assert_eq!(Running.next(&Command::Start, true).unwrap(), Running);
        assert_eq!(Running.next(&Command::Start, false).unwrap(), Stopped);
        assert_eq!(Stopped.next(&Command::Start, true).unwrap(), Running);
        assert_eq!(Stopped.next(&Command::Start, false).unwrap(), Stopped);
    }

    #[test]
    fn config_and_verbose_keep_state() {
        let config = Command::Config(String::new());
        for state in [ActorState::Created, ActorState::Running, ActorState::Stopped] {
            assert_eq!(state.next(&config, true).unwrap(), state);
            assert_eq!(state.next(&config, false).unwrap(), state);
            assert_eq!(state.next(&Command::Verbose, true).unwrap(), state);
        }
    }

    #[test]
    fn stop_and_terminate_from_any_live_state() {
        for state in [ActorState::Created, ActorState::Running, ActorState::Stopped] {
            assert_eq!(state.next(&Command::Stop, true).unwrap(), ActorState::Stopped);
            assert_eq!(state.next(&Command::Stop, false).unwrap(), ActorState::Stopped);
            assert_eq!(
                state.next(&Command::Terminate, true).unwrap(),
                ActorState::Terminated
            );
        }
    }

    #[test]
    fn terminated_rejects_everything() {
        for command in [Command::Start, Command::Stop, Command::Verbose, Command::Terminate] {
            assert!(matches!(
                ActorState::Terminated.next(&command, true),
                Err(Error::Terminated)
            ));
        }
    }

    #[test]
    fn disconnect_only_affects_running() {
        assert_eq!(ActorState::Running.disconnected(), ActorState::Stopped);
        assert_eq!(ActorState::Created.disconnected(), ActorState::Created);
    }
}
