use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult, FieldIssue};
use crate::models::InterestTag;

pub const MIN_BUDGET_PER_PERSON: u32 = 1_000;

/// Durations offered by the planner form.
pub const DURATION_CHOICES: [u32; 6] = [1, 2, 3, 4, 5, 7];

/// Planner form input. Budget and party size are checked but do not
/// influence which items are picked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripRequest {
    #[serde(default)]
    pub interests: Vec<InterestTag>,
    pub days: Option<u32>,
    pub budget: Option<u32>,
    pub people: Option<u32>,
}

impl TripRequest {
    pub fn validate(&self) -> EngineResult<()> {
        let mut issues = Vec::new();

        match self.budget {
            None => issues.push(FieldIssue::new("budget", "budget is required")),
            Some(budget) if budget < MIN_BUDGET_PER_PERSON => issues.push(FieldIssue::new(
                "budget",
                format!("minimum budget is ₹{MIN_BUDGET_PER_PERSON} per person"),
            )),
            Some(_) => {}
        }

        match self.days {
            None => issues.push(FieldIssue::new("days", "duration is required")),
            Some(0) => issues.push(FieldIssue::new("days", "at least 1 day required")),
            Some(_) => {}
        }

        match self.people {
            None => issues.push(FieldIssue::new("people", "number of people is required")),
            Some(0) => issues.push(FieldIssue::new("people", "at least 1 person required")),
            Some(_) => {}
        }

        if self.interests.is_empty() {
            issues.push(FieldIssue::new(
                "interests",
                "select at least one interest",
            ));
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(EngineError::InvalidInput(issues))
        }
    }
}
