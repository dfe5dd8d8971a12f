use crate::status::{RouteStatus, classify};
use cil_shared::Route;
use cil_shared::chrono::NaiveDate;
use cil_shared::date::format_date;

/// `45 min`, `2h`, `1h 30min`.
pub fn format_duration(minutes: u32) -> String {
    if minutes < 60 {
        return format!("{} min", minutes);
    }

    let hours = minutes / 60;
    let rest = minutes % 60;
    if rest == 0 {
        format!("{}h", hours)
    } else {
        format!("{}h {}min", hours, rest)
    }
}

/// Date line under a route card, or `None` for undated routes.
pub fn schedule_caption(route: &Route, today: NaiveDate) -> Option<String> {
    let date = route.next_execution_date?;
    let prefix = match classify(route, today) {
        RouteStatus::Overdue => "Atrasada desde",
        RouteStatus::Pending | RouteStatus::Completed => "Próxima execução:",
    };
    Some(format!("{} {}", prefix, format_date(date)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cil_shared::Frequency;
    use uuid::Uuid;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0 min");
        assert_eq!(format_duration(45), "45 min");
        assert_eq!(format_duration(60), "1h");
        assert_eq!(format_duration(90), "1h 30min");
        assert_eq!(format_duration(125), "2h 5min");
    }

    #[test]
    fn test_schedule_caption() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let route = Route::new(Uuid::nil(), "CIL-010", "Limpeza externa", Frequency::Monthly);
        assert_eq!(schedule_caption(&route, today), None);

        let late = route.clone().scheduled_on(NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());
        assert_eq!(
            schedule_caption(&late, today).as_deref(),
            Some("Atrasada desde 03/06/2024")
        );

        let upcoming = route.scheduled_on(today);
        assert_eq!(
            schedule_caption(&upcoming, today).as_deref(),
            Some("Próxima execução: 10/06/2024")
        );
    }
}
