//! Integration tests for the zenflow-core protocol codec.
//!
//! These tests drive frames exactly as the mobile client sends them through
//! the public API: decode into a [`Command`], validate into typed mouse and
//! keyboard commands, and encode/decode every response kind.

use serde_json::{json, Value};
use zenflow_core::{
    decode_command, decode_response, encode_command, encode_response, Category, DecodeError,
    KeyAction, KeyboardCommand, MouseButton, MouseCommand, Response, ResponseKind, Status,
    ValidationError,
};

/// Encodes a response and decodes it again.
fn roundtrip(response: &Response) -> Response {
    let frame = encode_response(response).expect("encode must succeed");
    decode_response(&frame).expect("decode must succeed")
}

#[test]
fn test_roundtrip_every_response_kind() {
    let responses = [
        Response::ack("mouse_ack", "Mouse moved to (1, 2)"),
        Response::keepalive_pong(),
        Response::test_pong(json!({"server": "zenflow-server", "echo_data": {}})),
        Response::echo(json!({"type": "gamepad", "action": "rumble"})),
        Response::error("Invalid JSON format"),
    ];

    for original in &responses {
        assert_eq!(&roundtrip(original), original);
    }
}

#[test]
fn test_roundtrip_timestamp_is_iso_8601() {
    // Arrange
    let frame = encode_response(&Response::keepalive_pong()).unwrap();
    let v: Value = serde_json::from_str(&frame).unwrap();

    // Act
    let ts = v["timestamp"].as_str().expect("timestamp must be a string");

    // Assert
    assert!(chrono::DateTime::parse_from_rfc3339(ts).is_ok(), "got {ts}");
}

#[test]
fn test_client_scroll_frame_decodes_to_negative_magnitude() {
    // Arrange
    let frame = r#"{"type":"mouse","action":"scroll","data":{"x":10,"y":20,"scroll_direction":"down","scroll_amount":5}}"#;

    // Act
    let cmd = decode_command(frame).unwrap();
    let mouse = MouseCommand::try_from(&cmd).unwrap();

    // Assert
    assert_eq!(cmd.category(), &Category::Mouse);
    assert_eq!(mouse.scroll_magnitude(), Some(-5));
    assert!(matches!(mouse, MouseCommand::Scroll { x: 10, y: 20, .. }));
}

#[test]
fn test_client_touchpad_frames_decode() {
    let left = decode_command(r#"{"type":"mouse","action":"left_click","data":{"x":0,"y":0}}"#)
        .unwrap();
    assert_eq!(
        MouseCommand::try_from(&left),
        Ok(MouseCommand::Click {
            x: 0,
            y: 0,
            button: MouseButton::Left
        })
    );

    let moved =
        decode_command(r#"{"type":"mouse","action":"move","data":{"deltaX":1.5,"deltaY":-2.0}}"#)
            .unwrap();
    assert_eq!(
        MouseCommand::try_from(&moved),
        Ok(MouseCommand::MoveRelative { dx: 2, dy: -2 })
    );
}

#[test]
fn test_client_keyboard_frames_with_top_level_fields_decode() {
    let press = decode_command(r#"{"type":"keyboard","action":"press","key":"enter"}"#).unwrap();
    assert_eq!(
        KeyboardCommand::try_from(&press),
        Ok(KeyboardCommand::Key {
            key: "enter".to_string(),
            action: KeyAction::Press
        })
    );

    let combo =
        decode_command(r#"{"type":"keyboard","action":"combo","data":{"combination":"media_play_pause"}}"#)
            .unwrap();
    assert_eq!(
        KeyboardCommand::try_from(&combo),
        Ok(KeyboardCommand::Combo {
            combination: "media_play_pause".to_string()
        })
    );
}

#[test]
fn test_invalid_button_is_a_validation_error_not_a_decode_error() {
    // Decoding succeeds: the envelope is well-formed.
    let cmd = decode_command(r#"{"type":"mouse","action":"click","data":{"button":"up"}}"#)
        .expect("envelope must decode");

    // Typed validation fails.
    assert_eq!(
        MouseCommand::try_from(&cmd),
        Err(ValidationError::InvalidButton("up".to_string()))
    );
}

#[test]
fn test_unknown_category_survives_decode_and_encode_verbatim() {
    // Arrange
    let original = json!({"type": "gamepad", "action": "rumble", "data": {"ms": 250}, "extra": [1, 2]});

    // Act
    let cmd = decode_command(&original.to_string()).unwrap();
    let re_encoded: Value = serde_json::from_str(&encode_command(&cmd).unwrap()).unwrap();

    // Assert
    assert_eq!(cmd.category(), &Category::Unknown("gamepad".to_string()));
    assert_eq!(re_encoded, original);
}

#[test]
fn test_malformed_frames_report_the_right_error() {
    assert!(matches!(
        decode_command("{\"type\": "),
        Err(DecodeError::InvalidSyntax(_))
    ));
    assert!(matches!(
        decode_command("\"just a string\""),
        Err(DecodeError::MalformedCommand(_))
    ));
}

#[test]
fn test_error_response_wire_shape() {
    let v: Value =
        serde_json::from_str(&encode_response(&Response::error("Invalid JSON format")).unwrap())
            .unwrap();
    assert_eq!(v["type"], "error");
    assert_eq!(v["message"], "Invalid JSON format");

    let decoded = decode_response(&v.to_string()).unwrap();
    assert_eq!(decoded.kind, ResponseKind::Error);
    assert_eq!(decoded.status, Some(Status::Error));
}
