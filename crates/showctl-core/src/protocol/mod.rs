// ── Command / response protocol ──
//
// JSON text frames using serde's externally tagged enums. Decoding never
// takes the connection down: a bad frame becomes a `Decode` error that
// the caller logs and drops.

pub mod command;
pub mod response;

pub use command::{
    ClockCommand, Command, KnobCommand, PatchCommand, ResponseFilter, ServerCommand, ShowCommand,
    WiggleCommand,
};
pub use response::{
    ClockResponse, KnobResponse, PatchResponse, Response, ShowResponse, WiggleResponse,
};

use crate::error::CoreError;

/// Decode one inbound text frame.
pub fn decode_response(text: &str) -> Result<Response, CoreError> {
    serde_json::from_str(text).map_err(|e| CoreError::Decode {
        message: e.to_string(),
    })
}

/// Wrap `command` in its envelope and encode it for the wire.
pub fn encode_command(command: Command) -> Result<String, CoreError> {
    Ok(serde_json::to_string(&ServerCommand::from(command))?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{
        ClockDescription, ClockId, FixtureId, KnobAddress, KnobValue, WiggleId, WiggleOutput,
    };

    #[test]
    fn knob_set_excludes_sender() {
        let cmd = Command::Knob(KnobCommand::Set(
            KnobAddress::Wiggle(WiggleId::new(0, 3), 1),
            KnobValue::Unipolar(0.5),
        ));
        assert_eq!(cmd.response_filter(), ResponseFilter::AllButSelf);
    }

    #[test]
    fn queries_are_exclusive() {
        let queries = [
            Command::Clock(ClockCommand::Classes),
            Command::Clock(ClockCommand::State),
            Command::Wiggle(WiggleCommand::Kinds),
            Command::Wiggle(WiggleCommand::State),
            Command::Knob(KnobCommand::State),
            Command::Patch(PatchCommand::GetKinds),
            Command::Patch(PatchCommand::PatchState),
            Command::Patch(PatchCommand::AvailablePorts),
            Command::Show(ShowCommand::ShowName),
            Command::Show(ShowCommand::AvailableSaves),
            Command::Show(ShowCommand::SavedShows),
        ];
        for q in queries {
            assert_eq!(q.response_filter(), ResponseFilter::Exclusive, "{}", q.describe());
        }
    }

    #[test]
    fn structural_commands_broadcast_to_all() {
        let structural = [
            Command::Clock(ClockCommand::Create("Simple".into())),
            Command::Clock(ClockCommand::PopInput(ClockId::new(0, 1))),
            Command::Wiggle(WiggleCommand::SetClock(WiggleId::new(0, 1), None)),
            Command::Wiggle(WiggleCommand::PushOutput(WiggleId::new(0, 1))),
            Command::Patch(PatchCommand::Remove(FixtureId(4))),
            Command::Patch(PatchCommand::AttachPort(0, Some("enttec-1".into()))),
            Command::Show(ShowCommand::Save),
            Command::Show(ShowCommand::Quit),
        ];
        for c in structural {
            assert_eq!(c.response_filter(), ResponseFilter::All, "{}", c.describe());
        }
    }

    #[test]
    fn envelope_wire_shape() {
        let text = encode_command(Command::Knob(KnobCommand::Set(
            KnobAddress::Wiggle(WiggleId::new(0, 3), 1),
            KnobValue::Unipolar(0.5),
        )))
        .unwrap();
        assert_eq!(
            text,
            r#"{"filter":"AllButSelf","command":{"Knob":{"Set":[{"Wiggle":[{"namespace":0,"local":3},1]},{"Unipolar":0.5}]}}}"#
        );
    }

    #[test]
    fn decodes_tagged_responses() {
        let text = r#"{"Wiggle":{"SetInput":[{"namespace":1,"local":2},0,{"wiggle":{"namespace":1,"local":5},"output":1}]}}"#;
        assert_eq!(
            decode_response(text).unwrap(),
            Response::Wiggle(WiggleResponse::SetInput(
                WiggleId::new(1, 2),
                0,
                Some(WiggleOutput {
                    wiggle: WiggleId::new(1, 5),
                    output: 1,
                }),
            ))
        );

        let state = r#"{"Clock":{"State":[[{"namespace":0,"local":1},{"name":"Main","kind":"Simple","inputs":[null]}]]}}"#;
        assert_eq!(
            decode_response(state).unwrap(),
            Response::Clock(ClockResponse::State(vec![(
                ClockId::new(0, 1),
                ClockDescription {
                    name: "Main".into(),
                    kind: "Simple".into(),
                    inputs: vec![None],
                },
            )]))
        );

        assert_eq!(
            decode_response(r#"{"Error":"no such show"}"#).unwrap(),
            Response::Error("no such show".into())
        );
        assert_eq!(
            decode_response(r#"{"Show":"Quit"}"#).unwrap(),
            Response::Show(ShowResponse::Quit)
        );
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(matches!(
            decode_response("{not json"),
            Err(CoreError::Decode { .. })
        ));
        assert!(matches!(
            decode_response(r#"{"Lasers":"On"}"#),
            Err(CoreError::Decode { .. })
        ));
    }
}
