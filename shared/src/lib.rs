use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub use chrono;
use chrono::NaiveDate;

pub mod date;
pub mod protocol;

// =========================================================
// Constants
// =========================================================

pub const ROUTES_TABLE: &str = "cil_routes";
pub const HEADER_API_KEY: &str = "apikey";

// =========================================================
// Domain models
// =========================================================

/// How often a route is due, as stored in `frequency_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
    /// Interval measured in equipment running hours (`frequency_value`).
    Hours,
}

impl Frequency {
    /// Label shown on the route card.
    pub fn label(&self) -> &'static str {
        match self {
            Frequency::Daily => "Diária",
            Frequency::Weekly => "Semanal",
            Frequency::Monthly => "Mensal",
            Frequency::Quarterly => "Trimestral",
            Frequency::Yearly => "Anual",
            Frequency::Hours => "Horas",
        }
    }
}

/// Which slice of the route list the screen is showing.
///
/// Exactly one filter is active at a time; `Today` is what a freshly
/// opened screen starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteFilter {
    #[default]
    Today,
    Overdue,
    All,
}

impl RouteFilter {
    pub const VARIANTS: [RouteFilter; 3] =
        [RouteFilter::Today, RouteFilter::Overdue, RouteFilter::All];

    pub fn as_str(&self) -> &'static str {
        match self {
            RouteFilter::Today => "today",
            RouteFilter::Overdue => "overdue",
            RouteFilter::All => "all",
        }
    }
}

impl fmt::Display for RouteFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names none of the three filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFilter(pub String);

impl fmt::Display for UnknownFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown route filter '{}' (expected today, overdue or all)", self.0)
    }
}

impl std::error::Error for UnknownFilter {}

impl FromStr for RouteFilter {
    type Err = UnknownFilter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "today" => Ok(RouteFilter::Today),
            "overdue" => Ok(RouteFilter::Overdue),
            "all" => Ok(RouteFilter::All),
            _ => Err(UnknownFilter(s.to_string())),
        }
    }
}

fn default_frequency_value() -> u32 {
    1
}

fn default_active() -> bool {
    true
}

/// A CIL route row from `cil_routes`.
///
/// Columns the app does not use are ignored on decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: Uuid,
    #[serde(default)]
    pub company_id: Option<Uuid>,
    pub route_number: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub frequency_type: Frequency,
    #[serde(default = "default_frequency_value")]
    pub frequency_value: u32,
    #[serde(default)]
    pub estimated_duration_minutes: Option<u32>,
    /// Compared at day granularity only.
    #[serde(default, with = "date::optional_calendar_date")]
    pub next_execution_date: Option<NaiveDate>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl Route {
    pub fn new(
        id: Uuid,
        route_number: impl Into<String>,
        name: impl Into<String>,
        frequency_type: Frequency,
    ) -> Self {
        Self {
            id,
            company_id: None,
            route_number: route_number.into(),
            name: name.into(),
            description: None,
            frequency_type,
            frequency_value: default_frequency_value(),
            estimated_duration_minutes: None,
            next_execution_date: None,
            is_active: true,
        }
    }

    pub fn scheduled_on(mut self, date: NaiveDate) -> Self {
        self.next_execution_date = Some(date);
        self
    }

    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.estimated_duration_minutes = Some(minutes);
        self
    }

    /// `true` when the route has a next date strictly earlier than `today`.
    pub fn is_scheduled_before(&self, today: NaiveDate) -> bool {
        self.next_execution_date.is_some_and(|d| d < today)
    }
}
