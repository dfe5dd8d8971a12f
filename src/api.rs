use crate::config::RuntimeConfig;
use crate::error::{FetchError, FetchResult};
use crate::request::{HttpClient, HttpMethod, HttpRequest};
use async_trait::async_trait;
use cil_shared::chrono::NaiveDate;
use cil_shared::protocol::RouteQuery;
use cil_shared::{HEADER_API_KEY, Route};
use tracing::debug;

// =========================================================
// 1. Gateway contract
// =========================================================

/// Read access to CIL routes.
///
/// Implementations translate a request into a backend query and nothing
/// more; ordering is by `route_number` ascending and only active routes are
/// returned.
#[async_trait]
pub trait RouteDataGateway: Send + Sync {
    /// Routes whose next execution falls exactly on `date`.
    async fn fetch_by_date(&self, date: NaiveDate) -> FetchResult<Vec<Route>>;

    async fn fetch_all_active(&self) -> FetchResult<Vec<Route>>;

    /// Routes whose next execution is strictly before `today`.
    ///
    /// Defaults to filtering `fetch_all_active` locally; backends that can
    /// filter server-side should override it.
    async fn fetch_overdue(&self, today: NaiveDate) -> FetchResult<Vec<Route>> {
        let routes = self
            .fetch_all_active()
            .await
            .map_err(|e| e.in_op("routes.fetch_overdue"))?;
        Ok(retain_overdue(routes, today))
    }
}

/// Keeps routes scheduled strictly before `today`, preserving order.
/// Routes without a date are dropped.
pub fn retain_overdue(routes: Vec<Route>, today: NaiveDate) -> Vec<Route> {
    routes
        .into_iter()
        .filter(|route| route.is_scheduled_before(today))
        .collect()
}

// =========================================================
// 2. Supabase (PostgREST) gateway
// =========================================================

pub struct SupabaseRouteGateway<C: HttpClient> {
    client: C,
    endpoint: String,
    anon_key: String,
    access_token: Option<String>,
}

impl<C: HttpClient> SupabaseRouteGateway<C> {
    pub fn new(client: C, config: &RuntimeConfig) -> Self {
        Self {
            client,
            endpoint: config.routes_endpoint(),
            anon_key: config.anon_key.clone(),
            access_token: None,
        }
    }

    /// Sends the signed-in user's token instead of the anon key, so row
    /// level security applies to that user.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    fn url(&self, query: &RouteQuery) -> String {
        format!("{}?{}", self.endpoint, query.to_query_string())
    }

    async fn run(&self, query: RouteQuery) -> FetchResult<Vec<Route>> {
        let url = self.url(&query);
        let bearer = self.access_token.as_deref().unwrap_or(&self.anon_key);

        let req = HttpRequest::new(&url, HttpMethod::Get)
            .with_header(HEADER_API_KEY, &self.anon_key)
            .with_header("Authorization", &format!("Bearer {}", bearer))
            .with_header("Accept", "application/json");

        debug!(operation = query.operation(), %url, "querying routes");

        let resp = self
            .client
            .send(req)
            .await
            .map_err(|e| e.in_op(query.operation()))?;

        if !resp.is_success() {
            let message = backend_message(&resp.body)
                .unwrap_or_else(|| format!("Backend returned status {}", resp.status));
            return Err(FetchError::backend(resp.status, message).in_op(query.operation()));
        }

        let routes: Vec<Route> = resp.json().map_err(|e| e.in_op(query.operation()))?;
        debug!(operation = query.operation(), count = routes.len(), "routes received");
        Ok(routes)
    }
}

/// PostgREST errors carry `{"message": ..., "code": ...}`.
fn backend_message(body: &str) -> Option<String> {
    let root: serde_json::Value = serde_json::from_str(body).ok()?;
    root.get("message")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

#[async_trait]
impl<C: HttpClient> RouteDataGateway for SupabaseRouteGateway<C> {
    async fn fetch_by_date(&self, date: NaiveDate) -> FetchResult<Vec<Route>> {
        self.run(RouteQuery::ByDate(date)).await
    }

    async fn fetch_all_active(&self) -> FetchResult<Vec<Route>> {
        self.run(RouteQuery::AllActive).await
    }

    async fn fetch_overdue(&self, today: NaiveDate) -> FetchResult<Vec<Route>> {
        self.run(RouteQuery::Before(today)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchErrorOrigin;
    use crate::request::MockHttpClient;
    use serde_json::json;

    const BASE: &str = "https://demo.supabase.co/rest/v1/cil_routes";

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn gateway(client: MockHttpClient) -> SupabaseRouteGateway<MockHttpClient> {
        let config = RuntimeConfig::new("https://demo.supabase.co", "anon-key");
        SupabaseRouteGateway::new(client, &config)
    }

    fn row(number: &str, date: Option<&str>) -> serde_json::Value {
        json!({
            "id": "7c9e6679-7425-40de-944b-e07fc1f90ae7",
            "route_number": number,
            "name": format!("Rota {}", number),
            "frequency_type": "daily",
            "estimated_duration_minutes": 30,
            "next_execution_date": date,
            "is_active": true
        })
    }

    #[tokio::test]
    async fn test_fetch_by_date_queries_exact_day() {
        let client = MockHttpClient::new();
        let url = format!(
            "{}?select=*&is_active=eq.true&next_execution_date=eq.2024-06-10&order=route_number.asc",
            BASE
        );
        client.mock_response(&url, 200, json!([row("CIL-001", Some("2024-06-10"))]));
        let gw = gateway(client);

        let routes = gw.fetch_by_date(ymd(2024, 6, 10)).await.unwrap();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].route_number, "CIL-001");

        let requests = gw.client.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let (sent_url, method, headers) = &requests[0];
        assert_eq!(sent_url, &url);
        assert_eq!(*method, HttpMethod::Get);
        assert_eq!(headers.get("apikey").unwrap(), "anon-key");
        assert_eq!(headers.get("Authorization").unwrap(), "Bearer anon-key");
    }

    #[tokio::test]
    async fn test_access_token_used_as_bearer() {
        let client = MockHttpClient::new();
        let url = format!("{}?select=*&is_active=eq.true&order=route_number.asc", BASE);
        client.mock_response(&url, 200, json!([]));
        let gw = gateway(client).with_access_token("user-jwt");

        let routes = gw.fetch_all_active().await.unwrap();
        assert!(routes.is_empty());

        let requests = gw.client.requests.lock().unwrap();
        let (_, _, headers) = &requests[0];
        assert_eq!(headers.get("apikey").unwrap(), "anon-key");
        assert_eq!(headers.get("Authorization").unwrap(), "Bearer user-jwt");
    }

    #[tokio::test]
    async fn test_overdue_filtered_server_side() {
        let client = MockHttpClient::new();
        let url = format!(
            "{}?select=*&is_active=eq.true&next_execution_date=lt.2024-06-10&order=route_number.asc",
            BASE
        );
        client.mock_response(
            &url,
            200,
            json!([row("CIL-001", Some("2024-06-01")), row("CIL-007", Some("2024-06-09"))]),
        );
        let gw = gateway(client);

        let routes = gw.fetch_overdue(ymd(2024, 6, 10)).await.unwrap();
        let numbers: Vec<_> = routes.iter().map(|r| r.route_number.as_str()).collect();
        assert_eq!(numbers, vec!["CIL-001", "CIL-007"]);
    }

    #[tokio::test]
    async fn test_backend_error_message_surfaced() {
        let client = MockHttpClient::new();
        let url = format!("{}?select=*&is_active=eq.true&order=route_number.asc", BASE);
        client.mock_response(
            &url,
            401,
            json!({ "code": "PGRST301", "message": "JWT expired" }),
        );
        let gw = gateway(client);

        let err = gw.fetch_all_active().await.unwrap_err();
        assert_eq!(err.origin, FetchErrorOrigin::Backend { status: 401 });
        assert_eq!(err.message(), "JWT expired");
        assert_eq!(err.spans()[0].operation, "routes.fetch_all_active");
    }

    #[tokio::test]
    async fn test_backend_error_without_json_body() {
        // Unmocked URLs answer 404 "Not Found"
        let gw = gateway(MockHttpClient::new());

        let err = gw.fetch_by_date(ymd(2024, 6, 10)).await.unwrap_err();
        assert_eq!(err.origin, FetchErrorOrigin::Backend { status: 404 });
        assert_eq!(err.message(), "Backend returned status 404");
    }

    #[tokio::test]
    async fn test_undecodable_body_is_decode_error() {
        let client = MockHttpClient::new();
        let url = format!("{}?select=*&is_active=eq.true&order=route_number.asc", BASE);
        client.mock_raw(&url, 200, "<html>gateway</html>");
        let gw = gateway(client);

        let err = gw.fetch_all_active().await.unwrap_err();
        assert_eq!(err.origin, FetchErrorOrigin::Decode);
    }

    #[tokio::test]
    async fn test_network_failure_keeps_trace() {
        let client = MockHttpClient::new();
        let url = format!("{}?select=*&is_active=eq.true&order=route_number.asc", BASE);
        client.mock_unreachable(&url);
        let gw = gateway(client);

        let err = gw.fetch_all_active().await.unwrap_err();
        assert_eq!(err.origin, FetchErrorOrigin::Network);
        let ops: Vec<_> = err.spans().iter().map(|s| s.operation.as_str()).collect();
        assert_eq!(ops, vec!["http.send", "routes.fetch_all_active"]);
    }

    #[test]
    fn test_retain_overdue_keeps_order_and_drops_undated() {
        let today = ymd(2024, 6, 10);
        let routes: Vec<Route> = [
            ("CIL-001", Some(ymd(2024, 6, 11))),
            ("CIL-002", Some(ymd(2024, 6, 8))),
            ("CIL-003", None),
            ("CIL-004", Some(ymd(2024, 6, 10))),
            ("CIL-005", Some(ymd(2024, 5, 31))),
        ]
        .into_iter()
        .map(|(n, d)| {
            let r = Route::new(uuid::Uuid::new_v4(), n, n, cil_shared::Frequency::Daily);
            match d {
                Some(d) => r.scheduled_on(d),
                None => r,
            }
        })
        .collect();

        let overdue = retain_overdue(routes, today);
        let numbers: Vec<_> = overdue.iter().map(|r| r.route_number.as_str()).collect();
        assert_eq!(numbers, vec!["CIL-002", "CIL-005"]);
    }
}
