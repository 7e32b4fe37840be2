//! Ride aggregates shown on the administrator analytics view.

use std::collections::BTreeMap;

use serde::Serialize;
use time::{Date, UtcOffset};

use super::repo_types::{Ride, RideStatus};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket<K> {
    #[serde(rename = "_id")]
    pub id: K,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    pub total_rides: usize,
    pub completed_rides: usize,
    pub cancelled_rides: usize,
    pub total_revenue: f64,
    pub average_fare: f64,
    pub rides_by_status: Vec<Bucket<RideStatus>>,
    pub rides_by_date: Vec<Bucket<String>>,
}

pub fn day_key(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// Summarizes `rides`, bucketing them into calendar days at `offset`.
/// Used where the rides are already in memory; `PgStore` aggregates in SQL.
pub fn summarize(rides: &[Ride], offset: UtcOffset) -> Analytics {
    let mut by_status: BTreeMap<RideStatus, usize> = BTreeMap::new();
    let mut by_date: BTreeMap<Date, usize> = BTreeMap::new();
    let mut revenue = 0.0;
    let mut fares = 0usize;

    for ride in rides {
        *by_status.entry(ride.status).or_default() += 1;
        *by_date
            .entry(ride.created_at.to_offset(offset).date())
            .or_default() += 1;
        if let Some(fare) = ride.fare {
            revenue += fare;
            fares += 1;
        }
    }

    let count_of = |status: RideStatus| by_status.get(&status).copied().unwrap_or(0);
    Analytics {
        total_rides: rides.len(),
        completed_rides: count_of(RideStatus::Completed),
        cancelled_rides: count_of(RideStatus::Cancelled),
        total_revenue: revenue,
        average_fare: if fares == 0 { 0.0 } else { revenue / fares as f64 },
        rides_by_status: by_status
            .iter()
            .map(|(&id, &count)| Bucket { id, count })
            .collect(),
        rides_by_date: by_date
            .into_iter()
            .map(|(date, count)| Bucket {
                id: day_key(date),
                count,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{datetime, offset};
    use time::OffsetDateTime;
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
    fn empty_store_has_zero_revenue_and_average() {
        let a = summarize(&[], UtcOffset::UTC);
        assert_eq!(a.total_rides, 0);
        assert_eq!(a.total_revenue, 0.0);
        assert_eq!(a.average_fare, 0.0);
        assert!(a.rides_by_status.is_empty());
        assert!(a.rides_by_date.is_empty());
    }

    #[test]
    fn counts_revenue_and_buckets() {
        let rides = vec![
            ride(RideStatus::Completed, Some(10.0), datetime!(2024-03-02 09:00 UTC)),
            ride(RideStatus::Completed, Some(20.0), datetime!(2024-03-01 12:00 UTC)),
            ride(RideStatus::Cancelled, None, datetime!(2024-03-01 08:00 UTC)),
            ride(RideStatus::Requested, None, datetime!(2024-03-02 10:00 UTC)),
        ];
        let a = summarize(&rides, UtcOffset::UTC);
        assert_eq!(a.total_rides, 4);
        assert_eq!(a.completed_rides, 2);
        assert_eq!(a.cancelled_rides, 1);
        assert_eq!(a.total_revenue, 30.0);
        assert_eq!(a.average_fare, 15.0);
        assert_eq!(
            a.rides_by_status,
            vec![
                Bucket { id: RideStatus::Requested, count: 1 },
                Bucket { id: RideStatus::Cancelled, count: 1 },
                Bucket { id: RideStatus::Completed, count: 2 },
            ]
        );
        let days: Vec<_> = a.rides_by_date.iter().map(|b| (b.id.as_str(), b.count)).collect();
        assert_eq!(days, vec![("2024-03-01", 2), ("2024-03-02", 2)]);
    }

    #[test]
    fn days_follow_the_reporting_offset() {
        let rides = vec![ride(RideStatus::Requested, None, datetime!(2024-03-01 23:30 UTC))];
        let a = summarize(&rides, offset!(+5:30));
        assert_eq!(a.rides_by_date[0].id, "2024-03-02");
    }

    #[test]
    fn analytics_serialize_with_wire_names() {
        let rides = vec![ride(RideStatus::Completed, Some(5.0), datetime!(2024-03-01 12:00 UTC))];
        let json = serde_json::to_value(summarize(&rides, UtcOffset::UTC)).unwrap();
        assert_eq!(json["totalRides"], 1);
        assert_eq!(json["ridesByStatus"][0]["_id"], "completed");
        assert_eq!(json["ridesByDate"][0]["_id"], "2024-03-01");
    }
}
