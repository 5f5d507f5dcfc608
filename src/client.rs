use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::ApiError;
use crate::models::{
    ApiConfig, CancelRequest, Location, Membership, Refund, Reservation, ScheduleResponse, Session,
    Sport,
};

const CLIENT_UA: &str = concat!("courtbook/", env!("CARGO_PKG_VERSION"));

/// Admin-managed collections, each a plain CRUD endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminResource {
    Admins,
    Locations,
    Sports,
    Fields,
    Memberships,
    ClosedFields,
}

impl AdminResource {
    pub const ALL: [AdminResource; 6] = [
        AdminResource::Admins,
        AdminResource::Locations,
        AdminResource::Sports,
        AdminResource::Fields,
        AdminResource::Memberships,
        AdminResource::ClosedFields,
    ];

    pub fn path(self) -> &'static str {
        match self {
            AdminResource::Admins => "/admin",
            AdminResource::Locations => "/locations",
            AdminResource::Sports => "/sports",
            AdminResource::Fields => "/fields",
            AdminResource::Memberships => "/memberships",
            AdminResource::ClosedFields => "/closed-fields",
        }
    }
}

impl fmt::Display for AdminResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path().trim_start_matches('/'))
    }
}

impl FromStr for AdminResource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().trim_start_matches('/').to_lowercase().replace('_', "-");
        let wanted = if wanted == "admins" { "admin".to_string() } else { wanted };
        AdminResource::ALL
            .into_iter()
            .find(|r| r.to_string() == wanted)
            .ok_or_else(|| anyhow::anyhow!("Unknown admin resource '{}'", s))
    }
}

pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(api: &ApiConfig, session: Option<&Session>) -> Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: api.base_url.trim_end_matches('/').to_string(),
            token: session.and_then(|s| s.token.clone()).filter(|t| !t.is_empty()),
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_UA));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(ref token) = self.token {
            if let Ok(val) = HeaderValue::from_str(&format!("Bearer {}", token)) {
                headers.insert(AUTHORIZATION, val);
            }
        }
        headers
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and return the JSON body, unwrapping a `{"data": ..}` envelope.
    async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Value> {
        let url = self.url(path);
        debug!("{} {} {:?}", method, url, query);

        let mut req = self
            .client
            .request(method.clone(), &url)
            .headers(self.default_headers());
        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req
            .send()
            .await
            .with_context(|| format!("Failed to send {method} {path}"))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .with_context(|| format!("Failed to read response of {method} {path}"))?;
        debug!("{} {} response (status {}): {}", method, path, status, text);

        if !status.is_success() {
            return Err(ApiError::from_response(status, &text).into());
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        let body: Value = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse {path} (status {status}): {text}"))?;
        Ok(unwrap_data(body))
    }

    async fn get_as<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let value = self.request(Method::GET, path, query, None).await?;
        serde_json::from_value(value.clone())
            .with_context(|| format!("Unexpected response shape from {path}: {value}"))
    }

    /// Public location listing.
    pub async fn locations(&self) -> Result<Vec<Location>> {
        self.get_as("/locations", &[]).await
    }

    pub async fn sports_by_location(&self, location_id: &str) -> Result<Vec<Sport>> {
        let path = format!("/reservations/sports-by-location/{}", enc(location_id));
        let sports: Vec<Sport> = self.get_as(&path, &[]).await?;
        debug!("Fetched {} sports for location {}", sports.len(), location_id);
        Ok(sports)
    }

    pub async fn schedule(
        &self,
        location_id: &str,
        date: Option<NaiveDate>,
        sport_name: Option<&str>,
    ) -> Result<ScheduleResponse> {
        let path = format!("/reservations/schedule/{}", enc(location_id));
        let mut query = Vec::new();
        if let Some(d) = date {
            query.push(("date", d.format("%Y-%m-%d").to_string()));
        }
        if let Some(s) = sport_name.filter(|s| !s.is_empty()) {
            query.push(("sportName", s.to_string()));
        }
        self.get_as(&path, &query).await
    }

    pub async fn membership(&self, id: &str) -> Result<Membership> {
        self.get_as(&format!("/memberships/{}", enc(id)), &[]).await
    }

    /// Booking history of the signed-in user.
    pub async fn user_reservations(&self) -> Result<Vec<Reservation>> {
        self.get_as("/reservations/user", &[]).await
    }

    pub async fn cancel_reservation(&self, id: &str, req: &CancelRequest) -> Result<Value> {
        let body = serde_json::to_value(req).context("Failed to serialize cancel request")?;
        let path = format!("/reservations/user/{}/cancel", enc(id));
        self.request(Method::POST, &path, &[], Some(&body)).await
    }

    pub async fn user_refunds(&self) -> Result<Vec<Refund>> {
        self.get_as("/reservations/user/refunds", &[]).await
    }

    pub async fn list(&self, resource: AdminResource) -> Result<Vec<Value>> {
        self.get_as(resource.path(), &[]).await
    }

    pub async fn create(&self, resource: AdminResource, body: &Value) -> Result<Value> {
        self.request(Method::POST, resource.path(), &[], Some(body)).await
    }

    pub async fn update(&self, resource: AdminResource, id: &str, body: &Value) -> Result<Value> {
        let path = format!("{}/{}", resource.path(), enc(id));
        self.request(Method::PUT, &path, &[], Some(body)).await
    }

    pub async fn delete(&self, resource: AdminResource, id: &str) -> Result<Value> {
        let path = format!("{}/{}", resource.path(), enc(id));
        self.request(Method::DELETE, &path, &[], None).await
    }

    /// All reservations, admin view.
    pub async fn admin_reservations(&self) -> Result<Vec<Reservation>> {
        self.get_as("/reservations", &[]).await
    }

    pub async fn admin_refunds(&self) -> Result<Vec<Refund>> {
        self.get_as("/reservations/refunds", &[]).await
    }

    pub async fn update_refund_status(&self, id: &str, status: &str) -> Result<Value> {
        let path = format!("/reservations/refunds/{}", enc(id));
        let body = serde_json::json!({ "status": status });
        self.request(Method::PUT, &path, &[], Some(&body)).await
    }
}

fn enc(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

fn unwrap_data(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

#[cfg(test)]
pub(crate) mod fake_api {
    //! In-process stand-in for the facility API.

    use axum::extract::Path;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post, put};
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use tokio::net::TcpListener;

    fn schedule_json() -> Value {
        json!({
            "fields": [{
                "fieldId": 5,
                "fieldName": "Lapangan A",
                "dailySchedules": [{
                    "date": "2025-03-10",
                    "schedules": [
                        {"time": "19 - 20", "timeId": "t19", "price": "Rp 50.000", "status": "available", "isBooked": false},
                        {"time": "20 - 21", "timeId": "t20", "price": 50000, "status": "available", "isBooked": false},
                        {"time": "21 - 22", "timeId": "t21", "price": 50000, "status": "booked", "isBooked": true}
                    ]
                }]
            }],
            "start_date": "2025-03-10",
            "end_date": "2025-03-12"
        })
    }

    fn require_token(headers: &HeaderMap) -> Result<(), (StatusCode, Json<Value>)> {
        match headers.get("authorization").and_then(|v| v.to_str().ok()) {
            Some("Bearer good-token") => Ok(()),
            _ => Err((
                StatusCode::UNAUTHORIZED,
                Json(json!({"message": "Unauthorized"})),
            )),
        }
    }

    pub fn router() -> Router {
        Router::new()
            .route(
                "/locations",
                get(|| async {
                    Json(json!({"data": [{"id": 1, "name": "GOR Senayan", "address": "Jakarta"}]}))
                })
                .post(|Json(body): Json<Value>| async move {
                    if body.get("name").and_then(|n| n.as_str()).unwrap_or("").is_empty() {
                        return (
                            StatusCode::UNPROCESSABLE_ENTITY,
                            Json(json!({"errors": [{"field": "name", "message": "Name is required"}]})),
                        );
                    }
                    (StatusCode::CREATED, Json(json!({"data": {"id": 2, "name": body["name"]}})))
                }),
            )
            .route(
                "/reservations/sports-by-location/{id}",
                get(|Path(id): Path<String>| async move {
                    if id == "404" {
                        return (StatusCode::NOT_FOUND, Json(json!({"message": "Location not found"})));
                    }
                    (
                        StatusCode::OK,
                        Json(json!([{"id": 1, "name": "Futsal"}, {"id": 2, "name": "Badminton"}])),
                    )
                }),
            )
            .route(
                "/reservations/schedule/{id}",
                get(|| async { Json(schedule_json()) }),
            )
            .route(
                "/memberships/{id}",
                get(|Path(id): Path<String>| async move {
                    Json(json!({"data": {"id": id, "name": "Monthly", "weeks": 4, "discount": 20}}))
                }),
            )
            .route(
                "/reservations/user",
                get(|headers: HeaderMap| async move {
                    require_token(&headers)?;
                    Ok::<_, (StatusCode, Json<Value>)>(Json(json!([{
                        "id": 11,
                        "date": "2025-03-10",
                        "time": "19 - 20",
                        "fieldName": "Lapangan A",
                        "locationName": "GOR Senayan",
                        "status": "paid",
                        "totalPrice": 50000
                    }])))
                }),
            )
            .route(
                "/reservations/user/{id}/cancel",
                post(|headers: HeaderMap, Path(id): Path<String>, Json(body): Json<Value>| async move {
                    require_token(&headers)?;
                    Ok::<_, (StatusCode, Json<Value>)>(Json(json!({
                        "message": "Cancellation requested",
                        "id": id,
                        "reason": body["reason"]
                    })))
                }),
            )
            .route(
                "/reservations/user/refunds",
                get(|headers: HeaderMap| async move {
                    require_token(&headers)?;
                    Ok::<_, (StatusCode, Json<Value>)>(Json(json!([
                        {"id": 3, "reservationId": 11, "amount": 50000, "status": "pending",
                         "bankName": "BCA", "accountNumber": "123", "accountName": "Budi"},
                        {"id": 4, "reservationId": 12, "amount": "Rp 75.000", "status": "approved"}
                    ])))
                }),
            )
            .route(
                "/reservations/refunds/{id}",
                put(|Path(id): Path<String>, Json(body): Json<Value>| async move {
                    Json(json!({"id": id, "status": body["status"]}))
                }),
            )
            .route(
                "/fields/{id}",
                put(|Path(id): Path<String>, Json(body): Json<Value>| async move {
                    Json(json!({"data": {"id": id, "name": body["name"]}}))
                })
                .delete(|| async { StatusCode::NO_CONTENT }),
            )
    }

    /// Serve the fake API on an ephemeral port and return its base URL.
    pub async fn spawn() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router()).await.unwrap();
        });
        format!("http://{addr}")
    }
}
