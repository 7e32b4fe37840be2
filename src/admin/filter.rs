//! Query parsing for the administrator ride filter.

use serde::Deserialize;
use time::{
    format_description::well_known::Rfc3339, macros::format_description, Date, OffsetDateTime,
    Time, UtcOffset,
};

use crate::{
    error::{AppError, AppResult},
    rides::repo_types::{RideFilter, RideStatus},
};

/// Raw query of `GET /api/admin/filter`. Empty values count as absent.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub status: Option<String>,
    pub min_fare: Option<String>,
    pub max_fare: Option<String>,
}

fn present(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// A bare date covers the whole day at `offset`; anything else must be RFC 3339.
fn parse_bound(raw: &str, offset: UtcOffset, end_of_day: bool, name: &str) -> AppResult<OffsetDateTime> {
    if let Ok(date) = Date::parse(raw, format_description!("[year]-[month]-[day]")) {
        let time = if end_of_day {
            Time::from_hms_nano(23, 59, 59, 999_999_999)
                .map_err(|e| AppError::Internal(e.into()))?
        } else {
            Time::MIDNIGHT
        };
        return Ok(date.with_time(time).assume_offset(offset));
    }
    OffsetDateTime::parse(raw, &Rfc3339)
        .map_err(|_| AppError::bad_request(format!("Invalid {name}")))
}

fn parse_fare(raw: &str, name: &str) -> AppResult<f64> {
    raw.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .ok_or_else(|| AppError::bad_request(format!("Invalid {name}")))
}

impl FilterParams {
    pub fn into_filter(self, offset: UtcOffset) -> AppResult<RideFilter> {
        let created_from = present(self.start_date)
            .map(|raw| parse_bound(&raw, offset, false, "startDate"))
            .transpose()?;
        let created_to = present(self.end_date)
            .map(|raw| parse_bound(&raw, offset, true, "endDate"))
            .transpose()?;
        let status = present(self.status)
            .map(|raw| {
                raw.parse::<RideStatus>()
                    .map_err(|_| AppError::bad_request(format!("Invalid status '{raw}'")))
            })
            .transpose()?;
        let min_fare = present(self.min_fare)
            .map(|raw| parse_fare(&raw, "minFare"))
            .transpose()?;
        let max_fare = present(self.max_fare)
            .map(|raw| parse_fare(&raw, "maxFare"))
            .transpose()?;

        Ok(RideFilter {
            created_from,
            created_to,
            status,
            min_fare,
            max_fare,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rides::repo_types::Ride;
    use time::macros::datetime;
    use uuid::Uuid;

    fn ride(status: RideStatus, fare: Option<f64>, created_at: OffsetDateTime) -> Ride {
        Ride {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            pickup: "A".into(),
            dropoff: "B".into(),
            status,
            fare,
            approved_by: None,
            approved_at: None,
            created_at,
        }
    }

    #[test]
    fn bare_dates_cover_whole_days() {
        let filter = FilterParams {
            start_date: Some("2024-03-01".into()),
            end_date: Some("2024-03-01".into()),
            ..Default::default()
        }
        .into_filter(UtcOffset::UTC)
        .unwrap();
        assert!(filter.matches(&ride(RideStatus::Requested, None, datetime!(2024-03-01 00:00 UTC))));
        assert!(filter.matches(&ride(RideStatus::Requested, None, datetime!(2024-03-01 23:59:59 UTC))));
        assert!(!filter.matches(&ride(RideStatus::Requested, None, datetime!(2024-03-02 00:00 UTC))));
    }

    #[test]
    fn timestamps_are_exact_and_blank_is_absent() {
        let filter = FilterParams {
            start_date: Some("2024-03-01T12:00:00Z".into()),
            status: Some("".into()),
            ..Default::default()
        }
        .into_filter(UtcOffset::UTC)
        .unwrap();
        assert_eq!(filter.created_from, Some(datetime!(2024-03-01 12:00 UTC)));
        assert_eq!(filter.status, None);
    }

    #[test]
    fn malformed_values_are_bad_requests() {
        for params in [
            FilterParams { start_date: Some("yesterday".into()), ..Default::default() },
            FilterParams { status: Some("teleported".into()), ..Default::default() },
            FilterParams { min_fare: Some("cheap".into()), ..Default::default() },
            FilterParams { max_fare: Some("NaN".into()), ..Default::default() },
        ] {
            assert!(matches!(
                params.into_filter(UtcOffset::UTC),
                Err(AppError::BadRequest(_))
            ));
        }
    }
}
