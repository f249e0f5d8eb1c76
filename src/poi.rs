//! Nearby shop search against an Overpass-compatible endpoint.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::models::Poi;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Characters that would end the quoted tag filter inside Overpass QL
const QL_RESERVED: &[char] = &['"', '\\', '[', ']'];

#[derive(Debug, Error)]
pub enum PoiError {
    #[error("Invalid tag filter '{0}', expected key=value without quotes or brackets")]
    InvalidTag(String),
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Shop search returned HTTP {0}")]
    Status(u16),
    #[error("Unreadable shop search response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Tag filter plus search circle
#[derive(Debug, Clone, PartialEq)]
pub struct PoiQuery {
    pub tag_key: String,
    pub tag_value: String,
    pub radius_m: u32,
    pub lat: f64,
    pub lon: f64,
}

impl PoiQuery {
    /// Build a query from a `key=value` tag filter
    pub fn new(tag: &str, radius_m: u32, lat: f64, lon: f64) -> Result<Self, PoiError> {
        let (key, value) = tag
            .split_once('=')
            .map(|(k, v)| (k.trim(), v.trim()))
            .filter(|(k, v)| !k.is_empty() && !v.is_empty())
            .filter(|(k, v)| !k.contains(QL_RESERVED) && !v.contains(QL_RESERVED))
            .ok_or_else(|| PoiError::InvalidTag(tag.to_string()))?;
        Ok(Self {
            tag_key: key.to_string(),
            tag_value: value.to_string(),
            radius_m,
            lat,
            lon,
        })
    }

    /// Overpass QL for this query. Ways and relations report their centre.
    pub fn to_overpass(&self) -> String {
        format!(
            "[out:json][timeout:25];nwr[\"{}\"=\"{}\"](around:{},{},{});out center;",
            self.tag_key, self.tag_value, self.radius_m, self.lat, self.lon
        )
    }
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    id: i64,
    lat: Option<f64>,
    lon: Option<f64>,
    center: Option<OverpassCenter>,
    #[serde(default)]
    tags: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct OverpassCenter {
    lat: f64,
    lon: f64,
}

/// Parse an Overpass JSON body. Elements without coordinates are dropped;
/// unnamed ones are labelled by id.
pub fn parse_response(body: &str) -> Result<Vec<Poi>, PoiError> {
    let response: OverpassResponse = serde_json::from_str(body)?;
    let pois = response
        .elements
        .into_iter()
        .filter_map(|element| {
            let (lat, lon) = match (element.lat, element.lon, element.center) {
                (Some(lat), Some(lon), _) => (lat, lon),
                (_, _, Some(center)) => (center.lat, center.lon),
                _ => return None,
            };
            let name = element
                .tags
                .get("name")
                .cloned()
                .unwrap_or_else(|| format!("Unnamed #{}", element.id));
            Some(Poi {
                id: element.id,
                name,
                lat,
                lon,
                tags: element.tags,
            })
        })
        .collect();
    Ok(pois)
}

/// Great-circle distance in kilometres
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (p1, p2) = (lat1.to_radians(), lat2.to_radians());
    let dp = (lat2 - lat1).to_radians();
    let dl = (lon2 - lon1).to_radians();
    let a = (dp / 2.0).sin().powi(2) + p1.cos() * p2.cos() * (dl / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

/// Order results nearest first
pub fn sort_by_distance(pois: &mut [Poi], lat: f64, lon: f64) {
    pois.sort_by(|a, b| {
        distance_km(lat, lon, a.lat, a.lon).total_cmp(&distance_km(lat, lon, b.lat, b.lon))
    });
}

pub struct PoiClient {
    endpoint: String,
    client: reqwest::Client,
}

impl PoiClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, PoiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("garagebook/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }

    /// Run a single search, nearest results first. No retry.
    pub async fn search(&self, query: &PoiQuery) -> Result<Vec<Poi>, PoiError> {
        let ql = query.to_overpass();
        tracing::info!(endpoint = %self.endpoint, query = %ql, "shop search");

        let response = self
            .client
            .post(&self.endpoint)
            .form(&[("data", ql.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "shop search failed");
            return Err(PoiError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let mut pois = parse_response(&body)?;
        sort_by_distance(&mut pois, query.lat, query.lon);
        tracing::debug!(count = pois.len(), "shop search results");
        Ok(pois)
    }
}

/// Synchronous shop search as seen from the UI thread
pub trait ShopFinder {
    fn find(&self, query: &PoiQuery) -> Result<Vec<Poi>, PoiError>;
}

/// Runs [`PoiClient::search`] to completion on a runtime handle.
///
/// Must not be called from inside an async task.
pub struct BlockingPoiClient {
    client: PoiClient,
    handle: tokio::runtime::Handle,
}

impl BlockingPoiClient {
    pub fn new(client: PoiClient, handle: tokio::runtime::Handle) -> Self {
        Self { client, handle }
    }
}

impl ShopFinder for BlockingPoiClient {
    fn find(&self, query: &PoiQuery) -> Result<Vec<Poi>, PoiError> {
        self.handle.block_on(self.client.search(query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "version": 0.6,
        "elements": [
            {"type": "node", "id": 11, "lat": 48.8600, "lon": 2.3500,
             "tags": {"name": "Garage Martin", "shop": "car_repair", "addr:street": "Rue Oberkampf", "addr:housenumber": "12"}},
            {"type": "way", "id": 22, "center": {"lat": 48.8570, "lon": 2.3520},
             "tags": {"shop": "car_repair"}},
            {"type": "relation", "id": 33, "tags": {"name": "No coordinates"}}
        ]
    }"#;

    #[test]
    fn query_requires_key_value() {
        assert!(PoiQuery::new("shop=car_repair", 5000, 48.85, 2.35).is_ok());
        assert!(matches!(PoiQuery::new("car_repair", 5000, 0.0, 0.0), Err(PoiError::InvalidTag(_))));
        assert!(matches!(PoiQuery::new("shop=", 5000, 0.0, 0.0), Err(PoiError::InvalidTag(_))));
    }

    #[test]
    fn query_rejects_ql_breaking_tags() {
        for tag in [
            r#"shop=car_repair"](around:1,0,0);out;"#,
            "shop=car]repair",
            r#"sh"op=car_repair"#,
            r"shop=car\repair",
            "shop[1]=car_repair",
        ] {
            assert!(matches!(PoiQuery::new(tag, 5000, 0.0, 0.0), Err(PoiError::InvalidTag(_))), "{}", tag);
        }
    }

    #[test]
    fn overpass_query_text() {
        let q = PoiQuery::new("shop = car_repair", 2500, 48.85, 2.35).unwrap();
        assert_eq!(
            q.to_overpass(),
            "[out:json][timeout:25];nwr[\"shop\"=\"car_repair\"](around:2500,48.85,2.35);out center;"
        );
    }

    #[test]
    fn parses_nodes_and_centres() {
        let pois = parse_response(SAMPLE).unwrap();
        assert_eq!(pois.len(), 2);
        assert_eq!(pois[0].name, "Garage Martin");
        assert_eq!(pois[0].address().as_deref(), Some("12 Rue Oberkampf"));
        assert_eq!(pois[1].name, "Unnamed #22");
        assert_eq!(pois[1].lat, 48.8570);
    }

    #[test]
    fn sorts_nearest_first() {
        let mut pois = parse_response(SAMPLE).unwrap();
        sort_by_distance(&mut pois, 48.8570, 2.3520);
        assert_eq!(pois[0].id, 22);
    }

    #[test]
    fn distance_is_symmetric_and_zero_on_self() {
        let d = distance_km(48.85, 2.35, 51.50, -0.12);
        assert!((d - distance_km(51.50, -0.12, 48.85, 2.35)).abs() < 1e-9);
        assert!(d > 300.0 && d < 400.0);
        assert_eq!(distance_km(10.0, 10.0, 10.0, 10.0), 0.0);
    }

    #[test]
    fn bad_json_is_decode_error() {
        assert!(matches!(parse_response("not json"), Err(PoiError::Decode(_))));
    }
}
