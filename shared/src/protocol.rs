use crate::date::to_iso;
use chrono::NaiveDate;

/// A read against the routes table, expressed as PostgREST filters.
///
/// Every query is restricted to active rows and ordered by route number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteQuery {
    /// `next_execution_date` equal to the given day.
    ByDate(NaiveDate),
    /// Every active route.
    AllActive,
    /// `next_execution_date` strictly before the given day.
    Before(NaiveDate),
}

impl RouteQuery {
    /// Name used in logs and error traces.
    pub fn operation(&self) -> &'static str {
        match self {
            RouteQuery::ByDate(_) => "routes.fetch_by_date",
            RouteQuery::AllActive => "routes.fetch_all_active",
            RouteQuery::Before(_) => "routes.fetch_overdue",
        }
    }

    /// Query-string pairs, in the order they are sent.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("select", "*".to_string()),
            ("is_active", "eq.true".to_string()),
        ];
        match self {
            RouteQuery::ByDate(date) => {
                params.push(("next_execution_date", format!("eq.{}", to_iso(*date))))
            }
            RouteQuery::Before(date) => {
                params.push(("next_execution_date", format!("lt.{}", to_iso(*date))))
            }
            RouteQuery::AllActive => {}
        }
        params.push(("order", "route_number.asc".to_string()));
        params
    }

    pub fn to_query_string(&self) -> String {
        self.params()
            .into_iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&")
    }
}
