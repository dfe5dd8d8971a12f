//! Route status classification.
//!
//! `classify` is pure: the caller passes today's date on every call, so a
//! list that stays open past midnight re-classifies correctly.

use cil_shared::Route;
use cil_shared::chrono::NaiveDate;

/// Display status of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteStatus {
    Pending,
    Overdue,
    /// Reserved for execution tracking; `classify` never returns it.
    Completed,
}

/// Label and colors for a status badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusBadge {
    pub label: &'static str,
    pub color: &'static str,
    /// `color` at roughly 8% opacity (`#RRGGBBAA`).
    pub background: &'static str,
}

impl RouteStatus {
    pub fn badge(&self) -> StatusBadge {
        match self {
            RouteStatus::Pending => StatusBadge {
                label: "Pendente",
                color: "#F59E0B",
                background: "#F59E0B15",
            },
            RouteStatus::Overdue => StatusBadge {
                label: "Atrasada",
                color: "#EF4444",
                background: "#EF444415",
            },
            RouteStatus::Completed => StatusBadge {
                label: "Concluída",
                color: "#10B981",
                background: "#10B98115",
            },
        }
    }
}

/// Derives the status of `route` as of `today`.
pub fn classify(route: &Route, today: NaiveDate) -> RouteStatus {
    match route.next_execution_date {
        Some(date) if date < today => RouteStatus::Overdue,
        _ => RouteStatus::Pending,
    }
}
