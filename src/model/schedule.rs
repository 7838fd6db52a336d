//! Recurring-schedule configuration

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

/// A user's local wall-clock recurrence. Pure configuration, no internal state.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ScheduleSpec {
    pub frequency: Frequency,
    /// Local hour of day, 0-23
    pub hour: u8,
    /// 0 = Sunday .. 6 = Saturday; weekly only
    #[serde(default)]
    pub day_of_week: Option<u8>,
    /// 1-28; monthly only. Larger values are clamped so every month qualifies.
    #[serde(default)]
    pub day_of_month: Option<u8>,
    /// IANA timezone name, e.g. "Europe/Prague"
    pub timezone: String,
}
