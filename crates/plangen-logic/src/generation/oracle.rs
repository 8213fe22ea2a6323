//! Generative layout service.
//!
//! Sends a natural-language brief to an OpenAI-compatible chat endpoint and
//! turns the JSON reply into a blueprint. The reply is untrusted: rooms that
//! cannot be used are dropped or clamped here, and the planner still runs
//! the full validator over whatever comes out.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;
use crate::model::{Blueprint, BuildingType, Flat, Floor, Room, RoomType};
use crate::params::BuildingParams;

use super::{attach_envelope, floor_label, LayoutError, LayoutStrategy};

/// Rooms thinner than this are discarded before validation.
const MIN_ACCEPTED_DIM_FT: f64 = 2.0;

/// Oracle endpoint configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub temperature: f64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            timeout_secs: 30,
            temperature: 0.7,
        }
    }
}

impl OracleConfig {
    /// Read the endpoint from the environment. `None` when no API key is
    /// set, which callers treat as "procedural only".
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())?;
        let mut config = Self {
            api_key: Some(api_key),
            ..Self::default()
        };
        if let Some(url) = std::env::var("PLANGEN_ORACLE_URL")
            .ok()
            .or_else(|| std::env::var("OPENAI_BASE_URL").ok())
        {
            config.endpoint = url.trim_end_matches('/').to_string();
        }
        if let Ok(model) = std::env::var("PLANGEN_ORACLE_MODEL") {
            config.model = model;
        }
        Some(config)
    }

    fn completions_url(&self) -> String {
        if self.endpoint.ends_with("/v1") {
            format!("{}/chat/completions", self.endpoint)
        } else {
            format!("{}/v1/chat/completions", self.endpoint)
        }
    }
}

/// Oracle transport errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OracleError {
    #[error("oracle is disabled")]
    Disabled,

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("request timed out after {0} seconds")]
    Timeout(u64),

    #[error("oracle returned an empty response")]
    EmptyResponse,

    #[error("invalid JSON response: {0}")]
    InvalidJson(String),
}

/// A service that completes a layout brief with JSON text.
pub trait LayoutOracle: Send + Sync {
    fn complete(&self, brief: &str) -> Result<String, OracleError>;
}

/// Oracle backed by an OpenAI-compatible chat-completions endpoint.
pub struct HttpOracle {
    config: OracleConfig,
    client: reqwest::blocking::Client,
}

impl HttpOracle {
    pub fn new(config: OracleConfig) -> Result<Self, OracleError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| OracleError::Http(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }
}

impl LayoutOracle for HttpOracle {
    fn complete(&self, brief: &str) -> Result<String, OracleError> {
        let Some(api_key) = &self.config.api_key else {
            return Err(OracleError::Disabled);
        };

        let body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                {"role": "system", "content": "You are an architectural layout engine. Reply with JSON only."},
                {"role": "user", "content": brief},
            ],
            "response_format": {"type": "json_object"},
            "temperature": self.config.temperature,
        });

        let response = self
            .client
            .post(self.config.completions_url())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    OracleError::Timeout(self.config.timeout_secs)
                } else {
                    OracleError::Http(format!("request failed: {e}"))
                }
            })?;

        if !response.status().is_success() {
            return Err(OracleError::Http(format!(
                "HTTP {} from chat-completions endpoint",
                response.status()
            )));
        }

        let json: serde_json::Value = response
            .json()
            .map_err(|e| OracleError::InvalidJson(format!("failed to parse response: {e}")))?;

        let text = json
            .get("choices")
            .and_then(|v| v.get(0))
            .and_then(|v| v.get("message"))
            .and_then(|v| v.get("content"))
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(OracleError::EmptyResponse);
        }
        Ok(text.to_string())
    }
}

/// Canned oracle for tests and offline runs.
///
/// Replies are consumed in order; the last one repeats.
pub struct FakeOracle {
    replies: Mutex<Vec<Result<String, OracleError>>>,
    calls: AtomicUsize,
}

impl FakeOracle {
    pub fn new(replies: Vec<Result<String, OracleError>>) -> Self {
        Self {
            replies: Mutex::new(replies),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn replying(text: impl Into<String>) -> Self {
        Self::new(vec![Ok(text.into())])
    }

    pub fn failing(error: OracleError) -> Self {
        Self::new(vec![Err(error)])
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl LayoutOracle for FakeOracle {
    fn complete(&self, _brief: &str) -> Result<String, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut replies = self.replies.lock().unwrap_or_else(|e| e.into_inner());
        match replies.len() {
            0 => Err(OracleError::EmptyResponse),
            1 => replies[0].clone(),
            _ => replies.remove(0),
        }
    }
}

fn room_guidance(building_type: BuildingType) -> &'static str {
    match building_type {
        BuildingType::House => {
            "living 150-250 sq ft, kitchen 80-120, bedrooms 120-180, bathrooms 35-60, \
             dining 80-120, laundry 30-50"
        }
        BuildingType::Apartment | BuildingType::Residential => {
            "ground floor: lobby, storage, parking, utility; upper floors: two or more \
             flats, each with living 120-200 sq ft, kitchen 60-100, bedroom 100-150, \
             bathroom 35-50"
        }
        BuildingType::Commercial => {
            "lobby and reception on the ground floor, offices 100-300 sq ft, \
             restrooms 40-80, meeting rooms 150-250, a utility room per floor"
        }
        BuildingType::MixedUse => {
            "ground floor: lobby, retail (type office), storage, parking, utility; \
             upper floors: flats with living, kitchen, bedroom and bathroom"
        }
    }
}

/// The brief sent to the oracle.
pub fn build_brief(params: &BuildingParams) -> String {
    let mut brief = format!(
        "Design a {floors}-floor {bt} building on a rectangular plate {w} ft wide (x) \
         and {d} ft deep (y).\n",
        floors = params.floors,
        bt = params.building_type,
        w = params.width,
        d = params.depth,
    );
    if let Some(location) = &params.context.location {
        brief.push_str(&format!("Location: {location}.\n"));
    }
    if let Some(budget) = params.context.budget {
        brief.push_str(&format!("Budget: {budget:.0}.\n"));
    }
    brief.push_str(&format!(
        "Room sizes: {}.\n",
        room_guidance(params.building_type)
    ));
    brief.push_str(
        "Rules:\n\
         - Every floor has one full-width horizontal corridor (type corridor) 3-4 ft high near mid-depth.\n\
         - All rooms are axis-aligned rectangles in feet; no two rooms on a floor may overlap.\n",
    );
    brief.push_str(&format!(
        "- Every room satisfies 0 <= x, 0 <= y, x + width <= {}, y + height <= {}; \
         width and height are at least 3 ft.\n",
        params.width, params.depth
    ));
    if params.floors > 1 {
        brief.push_str(
            "- Every floor has a staircase and an elevator at exactly the same x and y as on \
             floor 0.\n",
        );
    }
    brief.push_str(
        "- Corridors, staircases and elevators never belong to a flat.\n",
    );
    let types: Vec<&str> = RoomType::ALL.iter().map(|t| t.as_str()).collect();
    brief.push_str(&format!("Allowed room types: {}.\n", types.join(", ")));
    brief.push_str(&format!(
        "Return exactly {} floors as JSON:\n\
         {{\"floors\": [{{\"floor\": 0, \"label\": \"Ground Floor\", \
         \"rooms\": [{{\"id\": \"f0-corridor\", \"name\": \"Corridor\", \"type\": \"corridor\", \
         \"x\": 0, \"y\": 0, \"width\": 0, \"height\": 0}}], \
         \"flats\": [{{\"flat_id\": \"f0-flat1\", \"label\": \"Flat 1\", \"rooms\": [\"room id\"]}}]}}]}}\n",
        params.floors
    ));
    brief
}

#[derive(Debug, Deserialize)]
struct RawLayout {
    #[serde(default)]
    floors: Vec<RawFloor>,
}

#[derive(Debug, Deserialize)]
struct RawFloor {
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    rooms: Vec<RawRoom>,
    #[serde(default)]
    flats: Vec<RawFlat>,
}

#[derive(Debug, Deserialize)]
struct RawRoom {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "type", default)]
    room_type: String,
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
    #[serde(default)]
    width: f64,
    #[serde(default)]
    height: f64,
}

#[derive(Debug, Deserialize)]
struct RawFlat {
    #[serde(default)]
    flat_id: String,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    rooms: Vec<String>,
}

/// Strip a surrounding markdown code fence, if any.
fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string ("json") up to the first newline.
    let body = rest.split_once('\n').map(|(_, b)| b).unwrap_or("");
    body.trim_end().trim_end_matches("```").trim()
}

/// Turn a room from the reply into a plate-bounded room, or drop it.
fn sanitize_room(raw: RawRoom, floor: u32, index: usize, width: f64, depth: f64) -> Option<Room> {
    let Some(room_type) = RoomType::parse(&raw.room_type) else {
        log::debug!("floor {floor}: dropping room with unknown type {:?}", raw.room_type);
        return None;
    };
    if !(raw.width >= MIN_ACCEPTED_DIM_FT && raw.height >= MIN_ACCEPTED_DIM_FT) {
        return None;
    }
    if raw.width > width || raw.height > depth {
        return None;
    }
    let x = raw.x.clamp(0.0, width - raw.width);
    let y = raw.y.clamp(0.0, depth - raw.height);
    let id = raw
        .id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| format!("f{floor}-r{index}"));
    let name = raw.name.unwrap_or_else(|| room_type.to_string());
    Some(Room::new(id, name, room_type, Rect::new(x, y, raw.width, raw.height)))
}

/// Parse an oracle reply into floors for `params`.
pub fn parse_layout(text: &str, params: &BuildingParams) -> Result<Vec<Floor>, LayoutError> {
    let raw: RawLayout = serde_json::from_str(strip_code_fence(text))
        .map_err(|e| LayoutError::GenerationFailed(format!("reply is not layout JSON: {e}")))?;

    if raw.floors.is_empty() {
        return Err(LayoutError::GenerationFailed("reply has no floors".into()));
    }
    if raw.floors.len() != params.floors as usize {
        return Err(LayoutError::GenerationFailed(format!(
            "reply has {} floors, expected {}",
            raw.floors.len(),
            params.floors
        )));
    }

    let mut floors = Vec::with_capacity(raw.floors.len());
    for (i, raw_floor) in raw.floors.into_iter().enumerate() {
        let floor = i as u32;
        let rooms: Vec<Room> = raw_floor
            .rooms
            .into_iter()
            .enumerate()
            .filter_map(|(j, r)| sanitize_room(r, floor, j, params.width, params.depth))
            .collect();
        if rooms.is_empty() {
            return Err(LayoutError::GenerationFailed(format!(
                "floor {floor} has no usable rooms"
            )));
        }
        let flats = raw_floor
            .flats
            .into_iter()
            .enumerate()
            .filter_map(|(k, f)| {
                let ids: Vec<String> = f
                    .rooms
                    .into_iter()
                    .filter(|id| rooms.iter().any(|r| &r.id == id))
                    .collect();
                if ids.is_empty() {
                    return None;
                }
                let n = k + 1;
                Some(Flat {
                    flat_id: if f.flat_id.is_empty() {
                        format!("f{floor}-flat{n}")
                    } else {
                        f.flat_id
                    },
                    label: f.label.unwrap_or_else(|| format!("Flat {n}")),
                    rooms: ids,
                })
            })
            .collect();
        floors.push(Floor {
            floor,
            label: raw_floor.label.unwrap_or_else(|| floor_label(floor)),
            rooms,
            flats,
        });
    }
    Ok(floors)
}

/// Layout strategy that asks an oracle for the floors.
pub struct OracleLayout<O: LayoutOracle> {
    oracle: O,
}

impl<O: LayoutOracle> OracleLayout<O> {
    pub fn new(oracle: O) -> Self {
        Self { oracle }
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }
}

impl<O: LayoutOracle> LayoutStrategy for OracleLayout<O> {
    fn name(&self) -> &'static str {
        "oracle"
    }

    fn generate(&self, params: &BuildingParams) -> Result<Blueprint, LayoutError> {
        let reply = self.oracle.complete(&build_brief(params))?;
        let floors = parse_layout(&reply, params)?;
        let mut blueprint =
            Blueprint::new(params.width, params.depth, params.building_type, floors);
        attach_envelope(&mut blueprint, params);
        Ok(blueprint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(floors: u32) -> BuildingParams {
        BuildingParams::new(40.0, 30.0, floors, BuildingType::House)
    }

    const ONE_FLOOR: &str = r#"{"floors": [{"floor": 0, "label": "Ground Floor", "rooms": [
        {"id": "c", "name": "Corridor", "type": "corridor", "x": 0, "y": 13, "width": 40, "height": 4},
        {"id": "liv", "name": "Living", "type": "living", "x": 0, "y": 0, "width": 20, "height": 13},
        {"id": "k", "name": "Kitchen", "type": "kitchen", "x": 30, "y": 0, "width": 15, "height": 13},
        {"id": "pool", "name": "Pool", "type": "swimming_pool", "x": 0, "y": 17, "width": 10, "height": 10},
        {"name": "Closet", "type": "storage", "x": 0, "y": 17, "width": 1.5, "height": 5},
        {"name": "Bath", "type": "toilet", "x": -4, "y": 25, "width": 8, "height": 8}
    ], "flats": [
        {"flat_id": "a", "label": "A", "rooms": ["liv", "pool"]},
        {"flat_id": "b", "label": "B", "rooms": ["pool"]}
    ]}]}"#;

    #[test]
    fn test_parse_drops_and_clamps() {
        let floors = parse_layout(ONE_FLOOR, &params(1)).unwrap();
        let floor = &floors[0];
        let ids: Vec<_> = floor.rooms.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "liv", "k", "f0-r5"]);

        // 30 + 15 > 40 → x clamped to 25
        assert_eq!(floor.room("k").unwrap().x, 25.0);
        let bath = floor.room("f0-r5").unwrap();
        assert_eq!((bath.x, bath.y), (0.0, 22.0));
        assert_eq!(bath.room_type, RoomType::Bathroom);

        assert_eq!(floor.flats.len(), 1);
        assert_eq!(floor.flats[0].rooms, vec!["liv".to_string()]);
    }

    #[test]
    fn test_parse_tolerates_code_fence() {
        let fenced = format!("```json\n{ONE_FLOOR}\n```");
        assert!(parse_layout(&fenced, &params(1)).is_ok());
    }

    #[test]
    fn test_parse_rejects_bad_replies() {
        for text in [
            "not json",
            r#"{"floors": []}"#,
            r#"{"rooms": []}"#,
            r#"{"floors": [{"rooms": [{"type": "spaceship", "x": 0, "y": 0, "width": 5, "height": 5}]}]}"#,
        ] {
            let err = parse_layout(text, &params(1)).unwrap_err();
            assert!(matches!(err, LayoutError::GenerationFailed(_)), "{text}");
        }
        let err = parse_layout(ONE_FLOOR, &params(2)).unwrap_err();
        assert!(err.to_string().contains("expected 2"));
    }

    #[test]
    fn test_oversized_room_is_dropped() {
        let text = r#"{"floors": [{"rooms": [
            {"id": "a", "type": "parking", "x": 0, "y": 0, "width": 41, "height": 10},
            {"id": "b", "type": "parking", "x": 0, "y": 0, "width": 10, "height": 10}
        ]}]}"#;
        let floors = parse_layout(text, &params(1)).unwrap();
        assert_eq!(floors[0].rooms.len(), 1);
        assert_eq!(floors[0].label, "Ground Floor");
    }

    #[test]
    fn test_brief_mentions_rules() {
        let brief = build_brief(&params(3));
        assert!(brief.contains("3-floor house"));
        assert!(brief.contains("x + width <= 40"));
        assert!(brief.contains("staircase and an elevator"));
        assert!(brief.contains("Return exactly 3 floors"));
        assert!(!build_brief(&params(1)).contains("elevator at exactly"));
    }

    #[test]
    fn test_oracle_layout_attaches_envelope() {
        let strategy = OracleLayout::new(FakeOracle::replying(ONE_FLOOR));
        let bp = strategy.generate(&params(1)).unwrap();
        assert_eq!(bp.corridors.len(), 1);
        assert!(bp.roof.is_some());
        assert_eq!(strategy.oracle().call_count(), 1);
    }

    #[test]
    fn test_transport_error_maps_to_generation_failed() {
        let strategy = OracleLayout::new(FakeOracle::failing(OracleError::Timeout(30)));
        let err = strategy.generate(&params(1)).unwrap_err();
        assert_eq!(
            err,
            LayoutError::GenerationFailed("request timed out after 30 seconds".into())
        );
    }

    #[test]
    fn test_fake_oracle_sequence() {
        let oracle = FakeOracle::new(vec![Ok("a".into()), Err(OracleError::Disabled)]);
        assert_eq!(oracle.complete("").unwrap(), "a");
        assert_eq!(oracle.complete(""), Err(OracleError::Disabled));
        assert_eq!(oracle.complete(""), Err(OracleError::Disabled));
        assert_eq!(oracle.call_count(), 3);
    }

    #[test]
    fn test_completions_url() {
        let mut config = OracleConfig::default();
        assert_eq!(config.completions_url(), "https://api.openai.com/v1/chat/completions");
        config.endpoint = "http://localhost:8080/v1".into();
        assert_eq!(config.completions_url(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn test_disabled_without_key() {
        let oracle = HttpOracle::new(OracleConfig::default()).unwrap();
        assert_eq!(oracle.complete("brief"), Err(OracleError::Disabled));
    }
}
