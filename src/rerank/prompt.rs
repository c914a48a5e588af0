//! Prompt construction for the re-rank call

use serde::Serialize;

use crate::llm::ChatMessage;
use crate::models::{Candidate, WeatherBrief};

pub const SYSTEM_PROMPT: &str = r#"You are a local travel curator.
Pick and order places from the provided candidates, weighing weather safety and comfort together with how well each place fits the requested category.

Rules:
- Respond with JSON only.
- Use only the provided candidates. Never invent new places or ids.
- When it is raining or snowing, the wind is strong, or the feels-like temperature is at or below 0°C or at or above 32°C, favour indoor places.
- Give each pick a one-sentence reason.
- Schema:
  {
    "weather_policy": "one line summary of how the weather shaped the picks",
    "picked": [
      {"id": "candidate id", "score": 0.0, "reason": "...", "indoor": true | false | null}
    ]
  }"#;

/// Compact projection of a candidate sent to the scorer
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateBrief<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub addr: &'a str,
    pub lat: f64,
    pub lng: f64,
    pub tags: &'static str,
    pub is_indoor_hint: bool,
}

impl<'a> From<&'a Candidate> for CandidateBrief<'a> {
    fn from(c: &'a Candidate) -> Self {
        Self {
            id: &c.id,
            name: &c.name,
            addr: c.address.as_deref().unwrap_or(""),
            lat: c.lat,
            lng: c.lng,
            tags: c.category.as_str(),
            is_indoor_hint: c.category.is_indoor(),
        }
    }
}

fn weather_json(weather: Option<&WeatherBrief>) -> String {
    weather
        .and_then(|w| serde_json::to_string(w).ok())
        .unwrap_or_else(|| "unknown".to_string())
}

pub fn build_user_prompt(
    label: &str,
    weather: Option<&WeatherBrief>,
    candidates: &[Candidate],
    max_picks: u32,
) -> String {
    let briefs: Vec<CandidateBrief<'_>> = candidates.iter().map(CandidateBrief::from).collect();
    let candidates_json = serde_json::to_string(&briefs).unwrap_or_else(|_| "[]".to_string());
    let adverse = weather.is_some_and(WeatherBrief::is_adverse);

    format!(
        r#"Category: {label}
Current weather: {weather}
Adverse weather: {adverse}
Candidates: {candidates_json}
Pick at most {max_picks} places. Output must follow the schema exactly."#,
        weather = weather_json(weather),
    )
}

/// System instruction followed by the request-specific user turn
pub fn build_messages(
    label: &str,
    weather: Option<&WeatherBrief>,
    candidates: &[Candidate],
    max_picks: u32,
) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(build_user_prompt(label, weather, candidates, max_picks)),
    ]
}
