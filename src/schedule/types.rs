//! Schedule request and response shapes.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::Value;

/// Which on-call slot a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Primary,
    Standby,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Primary => "Primary",
            Role::Standby => "Standby",
        }
    }

    /// Suffix of the OCM group that holds this role's rota.
    pub fn group_suffix(self) -> &'static str {
        match self {
            Role::Primary => "Primary",
            Role::Standby => "Secondary",
        }
    }

    /// Full OCM group name for a base group.
    pub fn group_name(self, base_group: &str) -> String {
        format!("{}-{}", base_group, self.group_suffix())
    }
}

/// One shift flattened out of an OCM schedule.
///
/// `Date`, `StartTime` and `EndTime` are kept as the raw JSON values OCM sent.
#[derive(Debug, Clone, PartialEq)]
pub struct ShiftRecord {
    pub date: Value,
    pub group_id: Value,
    /// First user on the shift; serialized under the role's name.
    pub on_call: Option<String>,
    pub secondary: Option<String>,
    pub start_time: Value,
    pub end_time: Value,
    pub timezone: Value,
    pub role: Role,
}

impl ShiftRecord {
    /// `Date` as a comparable string (numbers and strings alike).
    pub fn date_key(&self) -> String {
        match &self.date {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

impl Serialize for ShiftRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(8))?;
        map.serialize_entry("Date", &self.date)?;
        map.serialize_entry("GroupId", &self.group_id)?;
        map.serialize_entry(self.role.as_str(), &self.on_call)?;
        map.serialize_entry("Secondary", &self.secondary)?;
        map.serialize_entry("StartTime", &self.start_time)?;
        map.serialize_entry("EndTime", &self.end_time)?;
        map.serialize_entry("Timezone", &self.timezone)?;
        map.serialize_entry("Role", self.role.as_str())?;
        map.end()
    }
}

/// Body of a successful `/getSchedule` call.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScheduleResponse {
    #[serde(rename = "Primary")]
    pub primary: Vec<ShiftRecord>,
    #[serde(rename = "Standby")]
    pub standby: Vec<ShiftRecord>,
}

/// Raw query parameters of `/getSchedule`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleParams {
    pub today_only: Option<String>,
    pub date: Option<String>,
}

impl ScheduleParams {
    /// Parse a form-encoded query string. A repeated key keeps its first
    /// value; unknown keys are ignored.
    pub fn from_query(query: Option<&str>) -> Self {
        let mut params = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
            let slot = match key.as_ref() {
                "todayOnly" => &mut params.today_only,
                "date" => &mut params.date,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        params
    }
}

/// Date filter derived from the query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleFilter {
    /// Whole lookahead window.
    All,
    /// Records dated today (UTC).
    Today,
    /// Records on this `YYYYMMDD` date, first record per role only.
    Date(String),
}

impl From<ScheduleParams> for ScheduleFilter {
    fn from(params: ScheduleParams) -> Self {
        let today_only = params
            .today_only
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        if today_only {
            ScheduleFilter::Today
        } else {
            match params.date {
                Some(date) if !date.is_empty() => ScheduleFilter::Date(date),
                _ => ScheduleFilter::All,
            }
        }
    }
}
