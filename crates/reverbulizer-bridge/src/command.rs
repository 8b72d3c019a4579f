//! Remote commands.
//!
//! A command arrives as a name plus positional JSON arguments, is parsed on
//! the caller's thread, and executed on the bridge thread against the
//! parameter store. Remote writes are recorded with [`Originator::Remote`].

use reverbulizer_core::{
    HistoryOutcome, Originator, ParameterError, ParameterId, ParameterStore,
};
use serde_json::Value;

use crate::error::{BridgeError, BridgeResult};

pub const UNDO: &str = "undo";
pub const REDO: &str = "redo";
/// Combined history command taking `"Z"` (undo) or `"Y"` (redo).
pub const WEB_UNDO_REDO: &str = "webUndoRedo";
pub const SET_PARAMETER: &str = "setParameter";
pub const GET_PARAMETER: &str = "getParameter";

/// A parsed remote call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Undo,
    Redo,
    SetParameter { id: ParameterId, value: f64 },
    GetParameter(ParameterId),
}

impl Command {
    /// Parse a named call.
    pub fn parse(name: &str, args: &[Value]) -> BridgeResult<Self> {
        match name {
            UNDO => expect_no_args(name, args).map(|()| Command::Undo),
            REDO => expect_no_args(name, args).map(|()| Command::Redo),
            WEB_UNDO_REDO => match args {
                [Value::String(key)] if key == "Z" => Ok(Command::Undo),
                [Value::String(key)] if key == "Y" => Ok(Command::Redo),
                _ => Err(BridgeError::invalid_arguments(name, "expected \"Z\" or \"Y\"")),
            },
            SET_PARAMETER => match args {
                [identifier, value] => {
                    let id = parameter_arg(name, identifier)?;
                    let value = value.as_f64().ok_or_else(|| {
                        BridgeError::invalid_arguments(name, "value must be a number")
                    })?;
                    Ok(Command::SetParameter { id, value })
                }
                _ => Err(BridgeError::invalid_arguments(name, "expected (identifier, value)")),
            },
            GET_PARAMETER => match args {
                [identifier] => Ok(Command::GetParameter(parameter_arg(name, identifier)?)),
                _ => Err(BridgeError::invalid_arguments(name, "expected (identifier)")),
            },
            _ => Err(BridgeError::UnknownCommand(name.to_string())),
        }
    }

    /// Run against `store` and produce the completion value.
    ///
    /// History commands answer with the acknowledgment string of their
    /// [`HistoryOutcome`]; parameter commands answer with the stored value.
    pub fn execute(self, store: &ParameterStore) -> BridgeResult<Value> {
        match self {
            Command::Undo => Ok(acknowledge(store.undo())),
            Command::Redo => Ok(acknowledge(store.redo())),
            Command::SetParameter { id, value } => {
                store.set(id, value, Originator::Remote)?;
                Ok(Value::from(store.get(id)))
            }
            Command::GetParameter(id) => Ok(Value::from(store.get(id))),
        }
    }
}

fn acknowledge(outcome: HistoryOutcome) -> Value {
    let message = outcome.to_string();
    log::debug!("{}", message);
    Value::String(message)
}

fn expect_no_args(name: &str, args: &[Value]) -> BridgeResult<()> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(BridgeError::invalid_arguments(
            name,
            format!("expected no arguments, got {}", args.len()),
        ))
    }
}

fn parameter_arg(name: &str, arg: &Value) -> BridgeResult<ParameterId> {
    let identifier = arg
        .as_str()
        .ok_or_else(|| BridgeError::invalid_arguments(name, "identifier must be a string"))?;
    ParameterId::from_identifier(identifier)
        .ok_or_else(|| ParameterError::UnknownIdentifier(identifier.to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_history_commands() {
        assert_eq!(Command::parse("undo", &[]).unwrap(), Command::Undo);
        assert_eq!(Command::parse("redo", &[]).unwrap(), Command::Redo);
        assert_eq!(Command::parse("webUndoRedo", &[json!("Z")]).unwrap(), Command::Undo);
        assert_eq!(Command::parse("webUndoRedo", &[json!("Y")]).unwrap(), Command::Redo);
        assert!(matches!(
            Command::parse("webUndoRedo", &[json!("X")]),
            Err(BridgeError::InvalidArguments { .. })
        ));
        assert!(matches!(
            Command::parse("undo", &[json!(1)]),
            Err(BridgeError::InvalidArguments { .. })
        ));
    }

    #[test]
    fn test_parse_parameter_commands() {
        assert_eq!(
            Command::parse("setParameter", &[json!("SIZE"), json!(0.25)]).unwrap(),
            Command::SetParameter {
                id: ParameterId::RoomSize,
                value: 0.25
            }
        );
        assert_eq!(
            Command::parse("getParameter", &[json!("FREEZE")]).unwrap(),
            Command::GetParameter(ParameterId::Freeze)
        );
        assert!(matches!(
            Command::parse("setParameter", &[json!("SIZE"), json!("big")]),
            Err(BridgeError::InvalidArguments { .. })
        ));
        assert!(matches!(
            Command::parse("getParameter", &[json!("ROOM")]),
            Err(BridgeError::Parameter(_))
        ));
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(
            Command::parse("explode", &[]).unwrap_err(),
            BridgeError::UnknownCommand("explode".to_string())
        );
    }

    #[test]
    fn test_execute() {
        let store = ParameterStore::default();
        assert_eq!(Command::Undo.execute(&store).unwrap(), json!("nothing to undo"));

        let set = Command::SetParameter {
            id: ParameterId::Mix,
            value: 0.5,
        };
        assert_eq!(set.execute(&store).unwrap(), json!(0.5));
        assert_eq!(
            Command::Undo.execute(&store).unwrap(),
            json!("undo: MIX 0.50 -> 0.75")
        );
        assert_eq!(
            Command::GetParameter(ParameterId::Mix).execute(&store).unwrap(),
            json!(0.75)
        );
        assert_eq!(
            Command::Redo.execute(&store).unwrap(),
            json!("redo: MIX 0.75 -> 0.50")
        );

        let out_of_range = Command::SetParameter {
            id: ParameterId::Mix,
            value: 2.0,
        };
        assert!(matches!(
            out_of_range.execute(&store),
            Err(BridgeError::Parameter(_))
        ));
        assert_eq!(store.get(ParameterId::Mix), 0.5);
    }
}
