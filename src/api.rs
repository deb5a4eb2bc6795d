//! Wire types for the four consumer endpoints and pure interpretation of
//! their responses. Keeping `(status, body) -> typed result` free of any
//! transport lets the failure taxonomy be exercised without a network.

use serde::de::DeserializeOwned;

use crate::error::{PortraitError, PortraitResult};
use crate::model::{CreditState, PlayerMetadata, Sport};

/// Body of `POST /api/consumer/portrait`.
#[derive(Clone, Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub photo_base64: String,
    pub sport: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_position: Option<String>,
}

impl GenerateRequest {
    pub fn new(photo_base64: String, sport: Sport, meta: &PlayerMetadata) -> Self {
        let meta = meta.trimmed();
        let present = |s: String| if s.is_empty() { None } else { Some(s) };
        Self {
            photo_base64,
            sport: sport.id().to_string(),
            player_name: present(meta.name),
            player_number: present(meta.number),
            player_position: present(meta.position),
        }
    }
}

/// Opaque generated-image payload: either a `data:` URI or a fetchable URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedImage {
    pub payload: String,
    pub backend: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayloadKind {
    DataUri,
    Url,
}

impl GeneratedImage {
    pub fn kind(&self) -> PayloadKind {
        if self.payload.starts_with("data:") {
            PayloadKind::DataUri
        } else {
            PayloadKind::Url
        }
    }

    /// Decode a `data:` URI payload locally. `None` for URL payloads.
    pub fn decode_data_uri(&self) -> Option<PortraitResult<Vec<u8>>> {
        if self.kind() != PayloadKind::DataUri {
            return None;
        }
        let decoded = self
            .payload
            .split_once(',')
            .ok_or_else(|| PortraitError::decode("data URI missing ',' separator"))
            .and_then(|(_, b64)| {
                use base64::Engine as _;
                base64::engine::general_purpose::STANDARD
                    .decode(b64)
                    .map_err(|e| PortraitError::decode(format!("data URI base64: {e}")))
            });
        Some(decoded)
    }
}

/// Typed settings document served by `GET /api/consumer/settings`.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesSettings {
    pub free_portraits: u32,
    pub pricing: Vec<PricingPack>,
    pub enabled_sports: Vec<String>,
    #[serde(default)]
    pub print_pricing: Vec<PrintPrice>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct PricingPack {
    pub id: String,
    pub name: String,
    pub portraits: u32,
    pub price: f64,
    pub featured: bool,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct PrintPrice {
    pub size: String,
    pub price: f64,
}

impl SalesSettings {
    /// Enabled sports resolved against the closed enum; unknown ids from the
    /// server are ignored rather than trusted.
    pub fn enabled(&self) -> Vec<Sport> {
        self.enabled_sports
            .iter()
            .filter_map(|id| Sport::from_id(id))
            .collect()
    }
}

#[derive(Clone, Debug, serde::Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Debug, serde::Deserialize)]
struct Envelope {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    data: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<ErrorBody>,
    #[serde(default)]
    backend: Option<String>,
    #[serde(default)]
    credits: Option<u32>,
    #[serde(default, rename = "freeRemaining")]
    free_remaining: Option<u32>,
    #[serde(default)]
    url: Option<String>,
}

fn parse_envelope(status: u16, body: &str) -> PortraitResult<Envelope> {
    serde_json::from_str(body).map_err(|_| PortraitError::NonJson { status })
}

fn server_error(status: u16, error: Option<ErrorBody>) -> PortraitError {
    match error {
        Some(e) => PortraitError::server(status, e.message),
        None => PortraitError::server(status, format!("server returned status {status}")),
    }
}

fn check_status(status: u16, envelope: &Envelope) -> PortraitResult<()> {
    if status == 401 || status == 403 {
        return Err(PortraitError::AuthRequired);
    }
    if !(200..300).contains(&status) || !envelope.ok {
        return Err(server_error(status, envelope.error.clone()));
    }
    Ok(())
}

fn typed_data<T: DeserializeOwned>(envelope: &Envelope, what: &str) -> PortraitResult<T> {
    let value = envelope
        .data
        .clone()
        .ok_or_else(|| PortraitError::validation(format!("{what} response missing data")))?;
    serde_json::from_value(value)
        .map_err(|e| PortraitError::validation(format!("malformed {what} response: {e}")))
}

/// Interpret a generation response per the failure taxonomy.
pub fn interpret_generate(status: u16, body: &str) -> PortraitResult<GeneratedImage> {
    let envelope = parse_envelope(status, body)?;
    check_status(status, &envelope)?;
    let payload = match envelope.data {
        Some(serde_json::Value::String(s)) => s,
        _ => {
            return Err(PortraitError::server(
                status,
                "generation response missing image payload",
            ));
        }
    };
    Ok(GeneratedImage {
        payload,
        backend: envelope.backend,
    })
}

pub fn interpret_settings(status: u16, body: &str) -> PortraitResult<SalesSettings> {
    let envelope = parse_envelope(status, body)?;
    check_status(status, &envelope)?;
    typed_data(&envelope, "settings")
}

pub fn interpret_credits(status: u16, body: &str) -> PortraitResult<CreditState> {
    let envelope = parse_envelope(status, body)?;
    check_status(status, &envelope)?;
    match (envelope.credits, envelope.free_remaining) {
        (Some(credits), Some(free_remaining)) => Ok(CreditState {
            credits,
            free_remaining,
        }),
        _ => Err(PortraitError::validation(
            "malformed credits response: missing credits/freeRemaining",
        )),
    }
}

/// Interpret a checkout-creation response; the caller redirects to the URL.
pub fn interpret_checkout(status: u16, body: &str) -> PortraitResult<String> {
    let envelope = parse_envelope(status, body)?;
    check_status(status, &envelope)?;
    envelope
        .url
        .ok_or_else(|| PortraitError::validation("checkout response missing url"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_request_omits_empty_fields() {
        let meta = PlayerMetadata::new("Jane", "7", "  ");
        let req = GenerateRequest::new("data:...".into(), Sport::Soccer, &meta);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["photoBase64"], "data:...");
        assert_eq!(json["sport"], "soccer");
        assert_eq!(json["playerName"], "Jane");
        assert_eq!(json["playerNumber"], "7");
        assert!(json.get("playerPosition").is_none());
    }

    #[test]
    fn payload_kind_classification() {
        let data = GeneratedImage {
            payload: "data:image/png;base64,AAAA".into(),
            backend: None,
        };
        assert_eq!(data.kind(), PayloadKind::DataUri);

        let url = GeneratedImage {
            payload: "https://cdn.example/p.png".into(),
            backend: None,
        };
        assert_eq!(url.kind(), PayloadKind::Url);
        assert!(url.decode_data_uri().is_none());
    }

    #[test]
    fn data_uri_decodes_locally() {
        let img = GeneratedImage {
            payload: "data:image/png;base64,aGVsbG8=".into(),
            backend: None,
        };
        let bytes = img.decode_data_uri().unwrap().unwrap();
        assert_eq!(bytes, b"hello");
    }

    #[test]
    fn malformed_data_uri_is_a_decode_error() {
        let img = GeneratedImage {
            payload: "data:image/png;base64".into(),
            backend: None,
        };
        assert!(matches!(
            img.decode_data_uri().unwrap(),
            Err(PortraitError::Decode(_))
        ));

        let img = GeneratedImage {
            payload: "data:image/png;base64,@@@".into(),
            backend: None,
        };
        assert!(matches!(
            img.decode_data_uri().unwrap(),
            Err(PortraitError::Decode(_))
        ));
    }

    #[test]
    fn unknown_enabled_sports_are_ignored() {
        let settings: SalesSettings = serde_json::from_value(serde_json::json!({
            "freePortraits": 1,
            "pricing": [],
            "enabledSports": ["soccer", "esports", "hockey"],
        }))
        .unwrap();
        assert_eq!(settings.enabled(), vec![Sport::Soccer, Sport::Hockey]);
    }
}
