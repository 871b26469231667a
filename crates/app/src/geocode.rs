//! Place name to coordinates via a Nominatim-compatible search endpoint

use moyeora_core::Coordinates;
use reqwest::header::ACCEPT_LANGUAGE;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::config::GeocoderConfig;
use crate::error::Result;

/// One search hit; coordinates arrive as strings
#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

pub struct Geocoder {
    client: reqwest::Client,
    config: GeocoderConfig,
}

impl Geocoder {
    pub fn new(config: GeocoderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client, config })
    }

    /// Search text sent for a user's input
    pub fn query_text(&self, input: &str) -> String {
        format!("{} {}", input.trim(), self.config.region_suffix)
    }

    /// Best single match, `None` when nothing matched
    ///
    /// Transport and HTTP status failures are errors.
    #[instrument(skip(self))]
    pub async fn lookup(&self, input: &str) -> Result<Option<Coordinates>> {
        let q = self.query_text(input);
        let places: Vec<Place> = self
            .client
            .get(&self.config.endpoint)
            .query(&[("format", "json"), ("q", q.as_str()), ("limit", "1")])
            .header(ACCEPT_LANGUAGE, &self.config.language)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let found = first_coordinates(&places);
        debug!(hits = places.len(), resolved = found.is_some(), "Geocoding done");
        Ok(found)
    }
}

fn first_coordinates(places: &[Place]) -> Option<Coordinates> {
    let place = places.first()?;
    let lat = place.lat.trim().parse().ok()?;
    let lng = place.lon.trim().parse().ok()?;
    Some(Coordinates::new(lat, lng)).filter(Coordinates::is_finite)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    fn places(json: &str) -> Vec<Place> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_first_coordinates() {
        let hits = places(r#"[{"lat":"37.4979","lon":"127.0276","display_name":"강남역"}]"#);
        assert_eq!(first_coordinates(&hits), Some(Coordinates::new(37.4979, 127.0276)));

        assert_eq!(first_coordinates(&places("[]")), None);
        assert_eq!(first_coordinates(&places(r#"[{"lat":"x","lon":"127"}]"#)), None);
    }

    #[test]
    fn test_query_text() {
        let geocoder = Geocoder::new(GeocoderConfig::default()).unwrap();
        assert_eq!(geocoder.query_text(" 강남역 "), "강남역 대한민국");
    }

    /// Serve one canned HTTP response and hand back the raw request
    async fn serve_once(body: &'static str) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            let _ = tx.send(String::from_utf8_lossy(&request).into_owned());
        });

        (format!("http://{}/search", addr), rx)
    }

    #[tokio::test]
    async fn test_lookup_against_local_endpoint() {
        let (endpoint, request) = serve_once(r#"[{"lat":"37.5563","lon":"126.9236"}]"#).await;
        let geocoder = Geocoder::new(GeocoderConfig {
            endpoint,
            ..GeocoderConfig::default()
        })
        .unwrap();

        let found = geocoder.lookup("홍대입구역").await.unwrap();
        assert_eq!(found, Some(Coordinates::new(37.5563, 126.9236)));

        let request = request.await.unwrap().to_lowercase();
        assert!(request.starts_with("get /search?format=json&q="));
        assert!(request.contains("limit=1"));
        assert!(request.contains("accept-language: ko"));
        assert!(request.contains("user-agent: moyeora/"));
    }

    #[tokio::test]
    async fn test_lookup_no_match() {
        let (endpoint, _request) = serve_once("[]").await;
        let geocoder = Geocoder::new(GeocoderConfig {
            endpoint,
            ..GeocoderConfig::default()
        })
        .unwrap();

        assert_eq!(geocoder.lookup("우리집").await.unwrap(), None);
    }
}
