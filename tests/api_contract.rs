use base64::Engine as _;
use courtside::api::{
    GeneratedImage, PayloadKind, interpret_checkout, interpret_credits, interpret_generate,
    interpret_settings,
};
use courtside::{PortraitError, Sport};

#[test]
fn http_500_with_non_json_body_maps_to_non_json_with_status() {
    let err = interpret_generate(500, "Internal Server Error").unwrap_err();
    assert!(matches!(err, PortraitError::NonJson { status: 500 }));
    assert!(err.to_string().contains("500"));
}

#[test]
fn structured_server_error_is_surfaced_verbatim() {
    let body = r#"{"ok": false, "error": {"message": "portrait backend exploded"}}"#;
    let err = interpret_generate(500, body).unwrap_err();
    match err {
        PortraitError::Server { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "portrait backend exploded");
        }
        other => panic!("expected Server, got {other:?}"),
    }
}

#[test]
fn auth_statuses_map_to_auth_required() {
    for status in [401, 403] {
        let err = interpret_generate(status, r#"{"ok": false}"#).unwrap_err();
        assert!(matches!(err, PortraitError::AuthRequired), "status {status}");
    }
}

#[test]
fn ok_false_on_2xx_is_still_a_server_error() {
    let body = r#"{"ok": false, "error": {"message": "no credits"}}"#;
    let err = interpret_generate(200, body).unwrap_err();
    assert!(matches!(err, PortraitError::Server { status: 200, .. }));
}

#[test]
fn successful_generation_yields_the_payload() {
    let body = r#"{"ok": true, "data": "data:image/png;base64,AAAA", "backend": "flux"}"#;
    let image = interpret_generate(200, body).unwrap();
    assert_eq!(image.payload, "data:image/png;base64,AAAA");
    assert_eq!(image.backend.as_deref(), Some("flux"));
    assert_eq!(image.kind(), PayloadKind::DataUri);
}

#[test]
fn ok_without_payload_is_a_server_error() {
    let err = interpret_generate(200, r#"{"ok": true}"#).unwrap_err();
    assert!(matches!(err, PortraitError::Server { .. }));
    assert!(err.to_string().contains("missing image payload"));
}

#[test]
fn settings_parse_and_resolve_enabled_sports() {
    let body = r#"{
        "ok": true,
        "data": {
            "freePortraits": 1,
            "pricing": [
                {"id": "starter", "name": "Starter", "portraits": 5, "price": 9.99, "featured": false},
                {"id": "team", "name": "Team Pack", "portraits": 25, "price": 39.99, "featured": true}
            ],
            "enabledSports": ["soccer", "basketball"],
            "printPricing": [{"size": "8x10", "price": 14.99}]
        }
    }"#;
    let settings = interpret_settings(200, body).unwrap();
    assert_eq!(settings.free_portraits, 1);
    assert_eq!(settings.pricing.len(), 2);
    assert!(settings.pricing[1].featured);
    assert_eq!(settings.enabled(), vec![Sport::Soccer, Sport::Basketball]);
    assert_eq!(settings.print_pricing[0].size, "8x10");
}

#[test]
fn malformed_settings_are_rejected_not_trusted() {
    // pricing entry missing required fields
    let body = r#"{"ok": true, "data": {"freePortraits": 1, "pricing": [{"id": "x"}], "enabledSports": []}}"#;
    let err = interpret_settings(200, body).unwrap_err();
    assert!(matches!(err, PortraitError::Validation(_)));

    // data is not an object
    let err = interpret_settings(200, r#"{"ok": true, "data": 42}"#).unwrap_err();
    assert!(matches!(err, PortraitError::Validation(_)));
}

#[test]
fn credits_parse_and_reject_partial_bodies() {
    let state = interpret_credits(200, r#"{"ok": true, "credits": 3, "freeRemaining": 1}"#).unwrap();
    assert_eq!(state.credits, 3);
    assert_eq!(state.free_remaining, 1);
    assert_eq!(state.total(), 4);

    let err = interpret_credits(200, r#"{"ok": true, "credits": 3}"#).unwrap_err();
    assert!(matches!(err, PortraitError::Validation(_)));

    let err = interpret_credits(401, r#"{"ok": false}"#).unwrap_err();
    assert!(matches!(err, PortraitError::AuthRequired));
}

#[test]
fn checkout_yields_redirect_url_or_verbatim_error() {
    let url =
        interpret_checkout(200, r#"{"ok": true, "url": "https://pay.example/cs_123"}"#).unwrap();
    assert_eq!(url, "https://pay.example/cs_123");

    let err = interpret_checkout(400, r#"{"ok": false, "error": {"message": "unknown pack"}}"#)
        .unwrap_err();
    match err {
        PortraitError::Server { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "unknown pack");
        }
        other => panic!("expected Server, got {other:?}"),
    }
}

#[test]
fn data_uri_payload_round_trips_without_network() {
    let bytes = b"\x89PNG\r\n\x1a\nfake".to_vec();
    let payload = format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(&bytes)
    );
    let image = GeneratedImage {
        payload,
        backend: None,
    };
    assert_eq!(image.decode_data_uri().unwrap().unwrap(), bytes);
}
