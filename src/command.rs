//! # Inbound control commands.
//!
//! Transports decode client messages into a [`Command`] and hand it to
//! [`Simulation::apply`](crate::Simulation::apply).
//!
//! ```text
//! {"action":"start","config":{"numProducers":2,"numConsumers":1,"bufferSize":3}}
//! {"action":"stop"}
//! ```

use serde::{Deserialize, Serialize};

use crate::config::SimulationConfig;
use crate::error::CommandError;

/// Control message accepted by the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Command {
    /// Start a run (replacing any active one).
    Start {
        /// Shape of the run.
        config: SimulationConfig,
    },
    /// Stop the active run.
    Stop,
}

impl Command {
    /// Decodes a command from its JSON form.
    pub fn from_json(raw: &str) -> Result<Self, CommandError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Returns a short stable label for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            Command::Start { .. } => "start",
            Command::Stop => "stop",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_start() {
        let cmd = Command::from_json(
            r#"{"action":"start","config":{"numProducers":2,"numConsumers":1,"bufferSize":3}}"#,
        )
        .unwrap();
        assert_eq!(
            cmd,
            Command::Start {
                config: SimulationConfig::new(2, 1, 3)
            }
        );
        assert_eq!(cmd.as_label(), "start");
    }

    #[test]
    fn test_decode_stop_ignores_extra_fields() {
        let cmd = Command::from_json(r#"{"action":"stop","config":null}"#).unwrap();
        assert_eq!(cmd, Command::Stop);
    }

    #[test]
    fn test_rejects_malformed() {
        for raw in [
            r#"{"action":"pause"}"#,
            r#"{"action":"start"}"#,
            r#"{"action":"start","config":{"numProducers":-1,"numConsumers":1,"bufferSize":3}}"#,
            "not json",
        ] {
            let err = Command::from_json(raw).unwrap_err();
            assert_eq!(err.as_label(), "command_malformed");
        }
    }

    #[test]
    fn test_encodes_tagged() {
        let value = serde_json::to_value(Command::Stop).unwrap();
        assert_eq!(value, serde_json::json!({"action": "stop"}));
    }
}
