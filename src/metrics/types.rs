use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectHours {
    pub subject: String,
    pub hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudySummary {
    pub hours_today: f64,
    pub total_hours: f64,
    pub daily_target_hours: f64,
    pub days_until_exam: i64,
    pub by_subject: Vec<SubjectHours>,
}

impl Default for StudySummary {
    fn default() -> Self {
        Self {
            hours_today: 0.0,
            total_hours: 0.0,
            daily_target_hours: 0.0,
            days_until_exam: 0,
            by_subject: Vec::new(),
        }
    }
}

impl StudySummary {
    /// Share of the daily target reached, capped at 100.
    pub fn target_percentage(&self) -> f64 {
        if self.daily_target_hours <= 0.0 {
            return 0.0;
        }
        (self.hours_today / self.daily_target_hours * 100.0).min(100.0)
    }
}
