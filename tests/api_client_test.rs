//! API client integration tests
//!
//! Exercises `ApiClient` against a `wiremock` server: JSON calls, error
//! classification, the analysis deadline and the SSE consult stream.
//!
//! SSE bodies use `set_body_raw(bytes, "text/event-stream")` so the
//! content type is exact.

mod common;

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use sil_consult::api::{
    ApiClient, ConsultApi, ConsultRequest, HistoryEntry, Season, SkinDiaryEntry, VisionApi,
    WeatherApi, WeatherQuery,
};
use sil_consult::chat::MessageRole;
use sil_consult::config::ApiConfig;
use sil_consult::error::SilError;
use sil_consult::profile::{Analyzer, FiveVectors, SkinIssue};
use sil_consult::Language;

fn request(message: &str) -> ConsultRequest {
    ConsultRequest {
        message: message.to_string(),
        vectors: FiveVectors::default(),
        language: Language::En,
        history: vec![HistoryEntry {
            role: MessageRole::User,
            content: "hello".to_string(),
        }],
        persona_id: Some("dr_beauty".to_string()),
    }
}

fn sil_error(err: &anyhow::Error) -> &SilError {
    err.downcast_ref::<SilError>().expect("typed SilError")
}

// ---------------------------------------------------------------------------
// JSON calls
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_get_personas_sends_language() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/personas"))
        .and(query_param("lang", "ja"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "dr_beauty",
            "name": "Dr. Beauty",
            "subtitle": "皮膚科医",
            "emoji": "👩‍⚕️",
            "avatar_gradient": "from-pink-400 to-rose-500",
            "specialty_tags": ["acne", "barrier"]
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::with_base_url(server.uri()).unwrap();
    let personas = client.get_personas(Language::Ja).await.unwrap();
    assert_eq!(personas.len(), 1);
    assert_eq!(personas[0].id, "dr_beauty");
    assert_eq!(personas[0].specialty_tags, vec!["acne", "barrier"]);
}

#[tokio::test]
async fn test_analyze_skin_posts_base64_and_parses_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/analyze-skin"))
        .and(body_partial_json(json!({
            "image": "/9gAAA==",
            "analyzer": "facepp"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::analysis_json()))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::with_base_url(server.uri()).unwrap();
    let analysis = client
        .analyze_skin(&[0xff, 0xd8, 0x00, 0x00], Analyzer::Facepp)
        .await
        .unwrap();

    // Unknown tags are dropped; severities are clamped
    assert_eq!(analysis.issues, vec![SkinIssue::Acne, SkinIssue::Pore]);
    assert_eq!(analysis.severity.len(), 2);
    assert_eq!(analysis.severity[&SkinIssue::Pore], 1.0);
    assert_eq!(analysis.hydration, Some(55.0));
    assert_eq!(analysis.skin_type.as_deref(), Some("oily"));
}

#[tokio::test]
async fn test_non_2xx_carries_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/analyze-skin"))
        .respond_with(ResponseTemplate::new(422).set_body_string("image too small"))
        .mount(&server)
        .await;

    let client = ApiClient::with_base_url(server.uri()).unwrap();
    let err = client
        .analyze_skin(b"tiny", Analyzer::ClaudeVision)
        .await
        .unwrap_err();
    match sil_error(&err) {
        SilError::Http { status, body } => {
            assert_eq!(*status, 422);
            assert_eq!(body, "image too small");
        }
        other => panic!("expected Http error, got {:?}", other),
    }
    assert_eq!(err.to_string(), "API Error 422: image too small");
}

#[tokio::test]
async fn test_analyze_deadline_yields_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/analyze-skin"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(common::analysis_json())
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let client = ApiClient::with_base_url(server.uri())
        .unwrap()
        .with_analyze_timeout(Duration::from_millis(200));

    let started = std::time::Instant::now();
    let err = client
        .analyze_skin(b"img", Analyzer::ClaudeVision)
        .await
        .unwrap_err();
    assert!(sil_error(&err).is_timeout());
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn test_request_timeout_on_json_call_is_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "ok"}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let config = ApiConfig {
        base_url: server.uri(),
        request_timeout_seconds: 1,
        ..ApiConfig::default()
    };
    let client = ApiClient::new(&config).unwrap();
    let err = client.health_check().await.unwrap_err();
    let err = sil_error(&err);
    assert!(matches!(err, SilError::Network(_)));
    assert!(!err.is_timeout());
}

#[tokio::test]
async fn test_invalid_json_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy</html>"))
        .mount(&server)
        .await;

    let client = ApiClient::with_base_url(server.uri()).unwrap();
    let err = client.health_check().await.unwrap_err();
    assert!(matches!(sil_error(&err), SilError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_consult_returns_reply_and_expert() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/consult"))
        .and(body_partial_json(json!({
            "message": "Best toner?",
            "language": "en",
            "persona_id": "dr_beauty",
            "history": [{"role": "user", "content": "hello"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "reply": "Try a low-pH toner.",
            "expert": {"name": "Dr. Kim", "role": "Dermatologist", "emoji": "👩‍⚕️", "category": "dermatology"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::with_base_url(server.uri()).unwrap();
    let response = client.consult(&request("Best toner?")).await.unwrap();
    assert_eq!(response.reply, "Try a low-pH toner.");
    let expert = response.expert.unwrap();
    assert_eq!(expert.name, "Dr. Kim");
    assert_eq!(expert.category, "dermatology");
}

#[tokio::test]
async fn test_consult_omits_stream_flag() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/consult"))
        .and(|req: &Request| {
            let body: serde_json::Value = serde_json::from_slice(&req.body).unwrap_or_default();
            body.get("stream").is_none()
        })
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"reply": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::with_base_url(server.uri()).unwrap();
    client.consult(&request("hi")).await.unwrap();
}

// ---------------------------------------------------------------------------
// Streaming
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_consult_stream_yields_fragments_until_done() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/consult"))
        .and(header("accept", "text/event-stream"))
        .and(body_partial_json(json!({"stream": true})))
        .respond_with(common::sse_response(&["Hi", " there", "!"]))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::with_base_url(server.uri()).unwrap();
    let mut stream = client.consult_stream(&request("hi")).await.unwrap();

    let mut text = String::new();
    while let Some(fragment) = stream.next_fragment().await {
        text.push_str(&fragment.unwrap());
    }
    assert_eq!(text, "Hi there!");
    assert!(stream.is_closed());
}

#[tokio::test]
async fn test_consult_stream_skips_malformed_lines() {
    let server = MockServer::start().await;
    let body = "data: {\"text\": \"a\"}\n\ndata: {broken\n\nevent: ping\n\ndata: {\"text\": \"b\"}\n\ndata: [DONE]\n\n";
    Mock::given(method("POST"))
        .and(path("/api/consult"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "text/event-stream"),
        )
        .mount(&server)
        .await;

    let client = ApiClient::with_base_url(server.uri()).unwrap();
    let mut stream = client.consult_stream(&request("hi")).await.unwrap();
    let mut fragments = Vec::new();
    while let Some(fragment) = stream.next_fragment().await {
        fragments.push(fragment.unwrap());
    }
    assert_eq!(fragments, vec!["a", "b"]);
}

#[tokio::test]
async fn test_consult_stream_refused_is_stream_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/consult"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let client = ApiClient::with_base_url(server.uri()).unwrap();
    let err = client.consult_stream(&request("hi")).await.unwrap_err();
    assert!(matches!(sil_error(&err), SilError::Stream(msg) if msg.contains("503")));
}

#[tokio::test]
async fn test_consult_stream_close_stops_early() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/consult"))
        .respond_with(common::sse_response(&["one", "two", "three"]))
        .mount(&server)
        .await;

    let client = ApiClient::with_base_url(server.uri()).unwrap();
    let mut stream = client.consult_stream(&request("hi")).await.unwrap();
    assert_eq!(stream.next_fragment().await.unwrap().unwrap(), "one");
    stream.close();
    assert!(stream.next_fragment().await.is_none());
}

// ---------------------------------------------------------------------------
// Weather, diary, cities
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_weather_by_coordinates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/weather"))
        .and(query_param("lat", "37.5"))
        .and(query_param("lon", "127"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::weather_json("seoul")))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::with_base_url(server.uri()).unwrap();
    let weather = client
        .get_weather(&WeatherQuery::coordinates(37.5, 127.0))
        .await
        .unwrap();
    assert_eq!(weather.city, "seoul");
    assert_eq!(weather.aqi, Some(40.0));
}

#[tokio::test]
async fn test_weather_zero_coordinates_send_no_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/weather"))
        .and(|req: &Request| req.url.query().is_none())
        .respond_with(ResponseTemplate::new(200).set_body_json(common::weather_json("LA")))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::with_base_url(server.uri()).unwrap();
    let weather = client
        .get_weather(&WeatherQuery::coordinates(0.0, 0.0))
        .await
        .unwrap();
    assert_eq!(weather.city, "LA");
}

#[tokio::test]
async fn test_weather_by_city_and_season() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/weather"))
        .and(query_param("city", "kyoto"))
        .and(query_param("season", "winter"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::weather_json("kyoto")))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::with_base_url(server.uri()).unwrap();
    let weather = client
        .get_weather(&WeatherQuery::city("kyoto", Season::Winter))
        .await
        .unwrap();
    assert_eq!(weather.city, "kyoto");
}

#[tokio::test]
async fn test_diary_round_trip() {
    let server = MockServer::start().await;
    let entry = json!({
        "date": "2026-10-19",
        "skin_data": common::analysis_json(),
        "weather": common::weather_json("tokyo"),
        "notes": "after retinol"
    });
    Mock::given(method("POST"))
        .and(path("/api/diary"))
        .and(body_partial_json(json!({"date": "2026-10-19", "notes": "after retinol"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(entry.clone()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/diary"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([entry])))
        .mount(&server)
        .await;

    let client = ApiClient::with_base_url(server.uri()).unwrap();
    let new_entry: SkinDiaryEntry = serde_json::from_value(json!({
        "date": "2026-10-19",
        "skin_data": {"issues": ["dryness"], "analyzer": "claude_vision"},
        "weather": common::weather_json("tokyo"),
        "notes": "after retinol"
    }))
    .unwrap();

    let stored = client.add_diary_entry(&new_entry).await.unwrap();
    assert_eq!(stored.weather.city, "tokyo");

    let entries = client.get_diary().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].notes, "after retinol");
}

#[tokio::test]
async fn test_get_cities() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/cities"))
        .and(query_param("lang", "ko"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "tokyo", "name": "도쿄", "lat": 35.68, "lon": 139.69}
        ])))
        .mount(&server)
        .await;

    let client = ApiClient::with_base_url(server.uri()).unwrap();
    let cities = client.get_cities(Language::Ko).await.unwrap();
    assert_eq!(cities[0].name, "도쿄");
}
