//! Blocking HTTP clients for the directions, panorama metadata and
//! elevation services.

use log::debug;
use panochain::{
    math::normalize_degrees, DirectionsRequest, DirectionsSource, ElevationBatch,
    ElevationSource, FetchError, Link, PanoMeta, PanoSource, Service,
};
use reqwest::blocking::Client;
use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use serde_json::Value;
use std::time::Duration;

/// Shared client and endpoint settings.
pub struct Http {
    client: Client,
    api_key: Option<String>,
    directions_url: String,
    pano_url: String,
    elevation_url: String,
}

impl Http {
    pub fn new(
        api_key: Option<String>,
        directions_url: String,
        pano_url: String,
        elevation_url: String,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            directions_url,
            pano_url,
            elevation_url,
        })
    }

    fn get<T: DeserializeOwned>(
        &self,
        service: Service,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let mut request = self.client.get(url).query(params);
        if let Some(key) = &self.api_key {
            request = request.query(&[("key", key)]);
        }
        request
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .and_then(|response| response.json::<T>())
            .map_err(|e| FetchError::new(service, e))
    }

    /// Returns the raw directions response for `request`.
    pub fn directions(&self, request: &DirectionsRequest) -> Result<Value, FetchError> {
        let waypoints = request
            .waypoints
            .iter()
            .map(|wp| format!("via:{}", latlng(*wp)))
            .collect::<Vec<_>>()
            .join("|");
        let mut params = vec![
            ("origin", latlng(request.origin)),
            ("destination", latlng(request.destination)),
        ];
        if !waypoints.is_empty() {
            params.push(("waypoints", waypoints));
        }
        debug!("fetching directions {params:?}");
        self.get(Service::Directions, &self.directions_url, &params)
    }

    fn pano(&self, params: &[(&str, String)]) -> Result<Option<PanoMeta>, FetchError> {
        let value: Value = self.get(Service::Panorama, &self.pano_url, params)?;
        // No coverage comes back as `{}`.
        if value.as_object().is_some_and(serde_json::Map::is_empty) {
            return Ok(None);
        }
        let response: CbkResponse =
            serde_json::from_value(value).map_err(|e| FetchError::new(Service::Panorama, e))?;
        Ok(Some(response.into()))
    }
}

fn latlng([lat, lng]: [f64; 2]) -> String {
    format!("{lat},{lng}")
}

impl PanoSource for Http {
    fn near(&self, (lat, lng): (f64, f64), radius_m: f64) -> Result<Option<PanoMeta>, FetchError> {
        self.pano(&[
            ("output", "json".to_string()),
            ("radius", radius_m.to_string()),
            ("ll", latlng([lat, lng])),
        ])
    }

    fn by_id(&self, id: &str) -> Result<Option<PanoMeta>, FetchError> {
        self.pano(&[("output", "json".to_string()), ("panoid", id.to_string())])
    }
}

impl ElevationSource for Http {
    fn elevations(&self, batch: &ElevationBatch) -> Result<Vec<Option<f64>>, FetchError> {
        let params = [("locations", format!("enc:{}", batch.polyline))];
        let response: ElevationResponse =
            self.get(Service::Elevation, &self.elevation_url, &params)?;
        if response.status != "OK" {
            return Err(FetchError::new(
                Service::Elevation,
                format!("status {}", response.status),
            ));
        }
        Ok(response.results.into_iter().map(|r| r.elevation).collect())
    }
}

/// Extracts every step polyline of the first route in a raw
/// directions response.
pub fn step_polylines(response: Value) -> Result<Vec<String>, FetchError> {
    let response: DirectionsResponse =
        serde_json::from_value(response).map_err(|e| FetchError::new(Service::Directions, e))?;
    let route = response.routes.into_iter().next().ok_or_else(|| {
        FetchError::new(
            Service::Directions,
            format!("no route found, status {}", response.status),
        )
    })?;
    Ok(route
        .legs
        .into_iter()
        .flat_map(|leg| leg.steps)
        .map(|step| step.polyline.points)
        .collect())
}

impl DirectionsSource for Http {
    fn step_polylines(&self, request: &DirectionsRequest) -> Result<Vec<String>, FetchError> {
        step_polylines(self.directions(request)?)
    }
}

#[derive(Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

#[derive(Deserialize)]
struct DirectionsRoute {
    legs: Vec<DirectionsLeg>,
}

#[derive(Deserialize)]
struct DirectionsLeg {
    steps: Vec<DirectionsStep>,
}

#[derive(Deserialize)]
struct DirectionsStep {
    polyline: EncodedPolyline,
}

#[derive(Deserialize)]
struct EncodedPolyline {
    points: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CbkResponse {
    location: CbkLocation,
    #[serde(default)]
    links: Vec<CbkLink>,
}

#[derive(Deserialize)]
struct CbkLocation {
    #[serde(rename = "panoId")]
    pano_id: String,
    #[serde(deserialize_with = "lenient_f64")]
    lat: f64,
    #[serde(deserialize_with = "lenient_f64")]
    lng: f64,
    #[serde(default)]
    description: String,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    elevation_wgs84_m: Option<f64>,
}

#[derive(Deserialize)]
struct CbkLink {
    #[serde(rename = "panoId")]
    pano_id: String,
    #[serde(rename = "yawDeg", deserialize_with = "lenient_f64")]
    yaw_deg: f64,
}

impl From<CbkResponse> for PanoMeta {
    fn from(CbkResponse { location, links }: CbkResponse) -> Self {
        Self {
            id: location.pano_id,
            lat: location.lat,
            lng: location.lng,
            description: location.description,
            elevation: location.elevation_wgs84_m,
            links: links
                .into_iter()
                .map(|link| Link {
                    pano_id: link.pano_id,
                    yaw: normalize_degrees(link.yaw_deg),
                })
                .collect(),
        }
    }
}

#[derive(Deserialize)]
struct ElevationResponse {
    status: String,
    #[serde(default)]
    results: Vec<ElevationResult>,
}

#[derive(Deserialize)]
struct ElevationResult {
    elevation: Option<f64>,
}

/// The panorama service quotes its numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient {
    Number(f64),
    Text(String),
}

impl Lenient {
    fn into_f64<E: serde::de::Error>(self) -> Result<f64, E> {
        match self {
            Self::Number(n) => Ok(n),
            Self::Text(s) => s.trim().parse().map_err(E::custom),
        }
    }
}

fn lenient_f64<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Lenient::deserialize(d)?.into_f64()
}

fn lenient_opt_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Option::<Lenient>::deserialize(d)?
        .map(Lenient::into_f64)
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::{step_polylines, CbkResponse};
    use panochain::PanoMeta;
    use serde_json::json;

    #[test]
    fn test_cbk_response() {
        let value = json!({
            "Location": {
                "panoId": "abc",
                "lat": "44.270500",
                "lng": "-71.303250",
                "description": "Mt Washington Auto Rd",
                "elevation_wgs84_m": "1890.5"
            },
            "Links": [
                {"panoId": "def", "yawDeg": "12.5"},
                {"panoId": "ghi", "yawDeg": "-167.5"}
            ]
        });
        let meta: PanoMeta = serde_json::from_value::<CbkResponse>(value).unwrap().into();
        assert_eq!(meta.id, "abc");
        assert_eq!(meta.lat, 44.2705);
        assert_eq!(meta.elevation, Some(1890.5));
        assert_eq!(meta.links[0].yaw, 12.5);
        assert_eq!(meta.links[1].yaw, 192.5);
    }

    #[test]
    fn test_directions_steps() {
        let value = json!({
            "status": "OK",
            "routes": [{"legs": [
                {"steps": [{"polyline": {"points": "a"}}, {"polyline": {"points": "b"}}]},
                {"steps": [{"polyline": {"points": "c"}}]}
            ]}]
        });
        assert_eq!(step_polylines(value).unwrap(), ["a", "b", "c"]);

        let empty = json!({"status": "ZERO_RESULTS", "routes": []});
        let err = step_polylines(empty).unwrap_err();
        assert!(err.to_string().contains("ZERO_RESULTS"));
    }
}
