//! HTTP behaviour of the fetcher and the OpenWeather gateway against a mock
//! server.

use reqwest::Url;
use weather_core::{
    Coordinate, HttpFetcher, OpenWeatherProvider, WeatherError, WeatherProvider, WeatherReading,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

fn new_york_body() -> serde_json::Value {
    serde_json::json!({
        "id": 1,
        "name": "New York",
        "main": { "temp": 72, "feels_like": 70, "humidity": 55 },
        "weather": [
            { "id": 800, "main": "Clear", "description": "clear sky", "icon": "01d" }
        ],
        "sys": { "country": "US" }
    })
}

fn provider(server: &MockServer) -> OpenWeatherProvider {
    OpenWeatherProvider::new("TEST_KEY".to_string(), &server.uri()).unwrap()
}

#[tokio::test]
async fn by_name_sends_city_units_and_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("q", "New York"))
        .and(query_param("units", "imperial"))
        .and(query_param("appid", "TEST_KEY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(new_york_body()))
        .expect(1)
        .mount(&server)
        .await;

    let reading = provider(&server).by_name("New York").await.unwrap();

    assert_eq!(reading.name, "New York");
    assert_eq!(reading.country, "US");
    assert_eq!(reading.feels_like_f, 70.0);
    assert_eq!(reading.summary(), "Clear Sky");
}

#[tokio::test]
async fn by_coordinate_sends_lat_and_lon() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("lat", "51.5"))
        .and(query_param("lon", "-0.12"))
        .and(query_param("units", "imperial"))
        .respond_with(ResponseTemplate::new(200).set_body_json(new_york_body()))
        .expect(1)
        .mount(&server)
        .await;

    let coordinate = Coordinate::new(51.5, -0.12).unwrap();
    let reading = provider(&server).by_coordinate(coordinate).await.unwrap();

    assert_eq!(reading.id, 1);
}

#[tokio::test]
async fn not_found_is_a_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_string(r#"{"cod":"404","message":"city not found"}"#),
        )
        .mount(&server)
        .await;

    let err = provider(&server).by_name("Atlantis").await.unwrap_err();

    assert_eq!(err, WeatherError::status(404));
    assert_eq!(err.to_string(), "Server error (404)");
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"name\": 42}"))
        .mount(&server)
        .await;

    let err = provider(&server).by_name("Paris").await.unwrap_err();

    assert!(matches!(err, WeatherError::Decode(_)), "got {err:?}");
}

#[tokio::test]
async fn empty_city_never_reaches_the_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(new_york_body()))
        .expect(0)
        .mount(&server)
        .await;

    let err = provider(&server).by_name("").await.unwrap_err();

    assert_eq!(err.to_string(), "Please enter a city name.");
}

#[tokio::test]
async fn connection_failure_is_a_transport_error() {
    // Nothing listens on the discard port.
    let provider = OpenWeatherProvider::new("KEY".to_string(), "http://127.0.0.1:9").unwrap();
    let err = provider.by_name("Paris").await.unwrap_err();

    assert!(matches!(err, WeatherError::Transport { status: None, .. }), "got {err:?}");
}

#[tokio::test]
async fn fetcher_decodes_generic_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reading.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": 7,
            "name": "Oslo",
            "country": "NO",
            "temperature_f": 30.5,
            "feels_like_f": 25.0,
            "humidity_pct": 80,
            "conditions": [
                { "code": 600, "category": "Snow", "description": "light snow", "icon": "13d" }
            ]
        })))
        .mount(&server)
        .await;

    let url = Url::parse(&format!("{}/reading.json", server.uri())).unwrap();
    let reading: WeatherReading = HttpFetcher::new().fetch(&url).await.unwrap();

    assert_eq!(reading.name, "Oslo");
    assert_eq!(reading.icon_code(), Some("13d"));
}

#[tokio::test]
async fn fetch_bytes_validates_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/img/wn/01d@2x.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8, 2, 3]))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/img/wn/99x@2x.png"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new();
    let ok = Url::parse(&format!("{}/img/wn/01d@2x.png", server.uri())).unwrap();
    let missing = Url::parse(&format!("{}/img/wn/99x@2x.png", server.uri())).unwrap();

    assert_eq!(fetcher.fetch_bytes(&ok).await.unwrap(), vec![1, 2, 3]);
    assert_eq!(fetcher.fetch_bytes(&missing).await.unwrap_err(), WeatherError::status(503));
}
