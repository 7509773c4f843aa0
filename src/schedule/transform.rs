//! OCM payload flattening and date filtering.

use chrono::NaiveDate;
use serde_json::Value;

use crate::schedule::types::{Role, ScheduleFilter, ShiftRecord};

const DEFAULT_TIMEZONE: &str = "Etc/GMT";

/// `YYYYMMDD`, the date format OCM uses in URLs and shift dates.
pub fn ocm_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Flatten an OCM cross-subscription schedule payload into shift records.
///
/// OCM answers with a list whose first element carries `schedulingDetails`.
/// Any other shape is logged and yields no records.
pub fn flatten(raw: &Value, group_name: &str, role: Role) -> Vec<ShiftRecord> {
    let details = match raw
        .as_array()
        .and_then(|items| items.first())
        .and_then(|first| first.get("schedulingDetails"))
    {
        Some(Value::Array(details)) => details,
        _ => {
            tracing::warn!(group = %group_name, "Unexpected schedule structure from OCM");
            return Vec::new();
        }
    };

    let mut records = Vec::new();
    for entry in details {
        let group_id = entry
            .get("GroupId")
            .cloned()
            .unwrap_or_else(|| Value::String(group_name.to_string()));
        let timezone = entry
            .get("Timezone")
            .cloned()
            .unwrap_or_else(|| Value::String(DEFAULT_TIMEZONE.to_string()));

        let shifts = entry.get("Shifts").and_then(Value::as_array);
        for shift in shifts.into_iter().flatten() {
            let users = shift
                .get("UserDetails")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();

            records.push(ShiftRecord {
                date: field(shift, "Date"),
                group_id: group_id.clone(),
                on_call: full_name(users.first()),
                secondary: full_name(users.get(1)),
                start_time: field(shift, "StartTime"),
                end_time: field(shift, "EndTime"),
                timezone: timezone.clone(),
                role,
            });
        }
    }

    tracing::debug!(group = %group_name, records = records.len(), "Flattened OCM schedule");
    records
}

fn field(value: &Value, key: &str) -> Value {
    value.get(key).cloned().unwrap_or(Value::Null)
}

fn full_name(user: Option<&Value>) -> Option<String> {
    user.and_then(|u| u.get("FullName"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Apply a date filter to one role's records.
pub fn apply_filter(
    mut records: Vec<ShiftRecord>,
    filter: &ScheduleFilter,
    today: NaiveDate,
) -> Vec<ShiftRecord> {
    match filter {
        ScheduleFilter::All => records,
        ScheduleFilter::Today => {
            let today = ocm_date(today);
            records.retain(|r| r.date_key() == today);
            records
        }
        ScheduleFilter::Date(date) => {
            records.retain(|r| r.date_key() == *date);
            records.truncate(1);
            records
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload() -> Value {
        json!([{
            "schedulingDetails": [
                {
                    "GroupId": "OMS-DBA-SEV1-Primary",
                    "Timezone": "America/New_York",
                    "Shifts": [
                        {
                            "Date": 20250101,
                            "StartTime": "08:00",
                            "EndTime": "20:00",
                            "UserDetails": [{"FullName": "Ada Lovelace"}, {"FullName": "Alan Turing"}]
                        },
                        {
                            "Date": 20250101,
                            "StartTime": "20:00",
                            "EndTime": "08:00",
                            "UserDetails": [{"FullName": "Grace Hopper"}]
                        },
                        {
                            "Date": "20250102",
                            "StartTime": "08:00",
                            "EndTime": "20:00",
                            "UserDetails": []
                        }
                    ]
                },
                {
                    "Shifts": [
                        {"Date": 20250103}
                    ]
                }
            ]
        }])
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y%m%d").unwrap()
    }

    #[test]
    fn test_flatten_shifts() {
        let records = flatten(&payload(), "OMS-DBA-SEV1-Primary", Role::Primary);
        assert_eq!(records.len(), 4);

        assert_eq!(records[0].on_call.as_deref(), Some("Ada Lovelace"));
        assert_eq!(records[0].secondary.as_deref(), Some("Alan Turing"));
        assert_eq!(records[0].timezone, json!("America/New_York"));

        assert_eq!(records[1].on_call.as_deref(), Some("Grace Hopper"));
        assert_eq!(records[1].secondary, None);

        assert_eq!(records[2].on_call, None);
        assert_eq!(records[2].date, json!("20250102"));
    }

    #[test]
    fn test_flatten_defaults_group_and_timezone() {
        let records = flatten(&payload(), "OMS-DBA-SEV1-Secondary", Role::Standby);
        let last = records.last().unwrap();
        assert_eq!(last.group_id, json!("OMS-DBA-SEV1-Secondary"));
        assert_eq!(last.timezone, json!("Etc/GMT"));
        assert_eq!(last.start_time, Value::Null);
        assert_eq!(last.role, Role::Standby);
    }

    #[test]
    fn test_flatten_unexpected_structure_is_empty() {
        assert!(flatten(&json!({"error": "nope"}), "g", Role::Primary).is_empty());
        assert!(flatten(&json!([]), "g", Role::Primary).is_empty());
        assert!(flatten(&json!([{"other": 1}]), "g", Role::Primary).is_empty());
    }

    #[test]
    fn test_filter_today() {
        let records = flatten(&payload(), "g", Role::Primary);
        let filtered = apply_filter(records, &ScheduleFilter::Today, day("20250101"));
        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|r| r.date_key() == "20250101"));
    }

    #[test]
    fn test_filter_specific_date_keeps_first() {
        let records = flatten(&payload(), "g", Role::Primary);
        let filtered = apply_filter(
            records,
            &ScheduleFilter::Date("20250101".into()),
            day("20240601"),
        );
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].on_call.as_deref(), Some("Ada Lovelace"));
    }

    #[test]
    fn test_filter_specific_date_matches_string_dates() {
        let records = flatten(&payload(), "g", Role::Primary);
        let filtered = apply_filter(
            records,
            &ScheduleFilter::Date("20250102".into()),
            day("20240601"),
        );
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].date, json!("20250102"));
    }

    #[test]
    fn test_filter_all_is_identity() {
        let records = flatten(&payload(), "g", Role::Primary);
        let filtered = apply_filter(records.clone(), &ScheduleFilter::All, day("20250101"));
        assert_eq!(filtered, records);
    }

    #[test]
    fn test_ocm_date_format() {
        assert_eq!(ocm_date(day("20250309")), "20250309");
    }
}
