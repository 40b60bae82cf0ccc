//! Day-of-week semantics shared by scheduling and optimization.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A day of the week, ordered `monday..sunday` (the order the Core folds over).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceDay {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl ServiceDay {
    pub const WEEKDAYS: [ServiceDay; 5] = [
        ServiceDay::Monday,
        ServiceDay::Tuesday,
        ServiceDay::Wednesday,
        ServiceDay::Thursday,
        ServiceDay::Friday,
    ];

    /// The default day set (`mon..fri`), optionally extended with weekend days.
    pub fn default_set(include_saturday: bool, include_sunday: bool) -> Vec<ServiceDay> {
        let mut days = Self::WEEKDAYS.to_vec();
        if include_saturday {
            days.push(ServiceDay::Saturday);
        }
        if include_sunday {
            days.push(ServiceDay::Sunday);
        }
        days
    }

    /// Two-letter day code (`Mo Tu We Th Fr Sa Su`).
    pub fn code(&self) -> &'static str {
        match self {
            ServiceDay::Monday => "Mo",
            ServiceDay::Tuesday => "Tu",
            ServiceDay::Wednesday => "We",
            ServiceDay::Thursday => "Th",
            ServiceDay::Friday => "Fr",
            ServiceDay::Saturday => "Sa",
            ServiceDay::Sunday => "Su",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "Mo" => Some(ServiceDay::Monday),
            "Tu" => Some(ServiceDay::Tuesday),
            "We" => Some(ServiceDay::Wednesday),
            "Th" => Some(ServiceDay::Thursday),
            "Fr" => Some(ServiceDay::Friday),
            "Sa" => Some(ServiceDay::Saturday),
            "Su" => Some(ServiceDay::Sunday),
            _ => None,
        }
    }

    /// Lowercase English name, the wire form used outside `schedule_pattern`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceDay::Monday => "monday",
            ServiceDay::Tuesday => "tuesday",
            ServiceDay::Wednesday => "wednesday",
            ServiceDay::Thursday => "thursday",
            ServiceDay::Friday => "friday",
            ServiceDay::Saturday => "saturday",
            ServiceDay::Sunday => "sunday",
        }
    }

    pub fn from_str_lower(s: &str) -> Option<Self> {
        match s {
            "monday" => Some(ServiceDay::Monday),
            "tuesday" => Some(ServiceDay::Tuesday),
            "wednesday" => Some(ServiceDay::Wednesday),
            "thursday" => Some(ServiceDay::Thursday),
            "friday" => Some(ServiceDay::Friday),
            "saturday" => Some(ServiceDay::Saturday),
            "sunday" => Some(ServiceDay::Sunday),
            _ => None,
        }
    }
}

impl fmt::Display for ServiceDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parse a `schedule_pattern` like `Mo/We/Fr` into its day codes.
pub fn parse_schedule_pattern(pattern: &str) -> Vec<ServiceDay> {
    pattern
        .split('/')
        .filter_map(|code| ServiceDay::from_code(code.trim()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_roundtrips() {
        for day in ServiceDay::default_set(true, true) {
            assert_eq!(ServiceDay::from_code(day.code()), Some(day));
        }
    }

    #[test]
    fn default_set_excludes_weekend_by_default() {
        let days = ServiceDay::default_set(false, false);
        assert_eq!(days.len(), 5);
        assert!(!days.contains(&ServiceDay::Saturday));
    }

    #[test]
    fn default_set_can_include_weekend() {
        let days = ServiceDay::default_set(true, true);
        assert_eq!(days.len(), 7);
    }

    #[test]
    fn parses_multi_day_pattern() {
        let days = parse_schedule_pattern("Mo/We/Fr");
        assert_eq!(
            days,
            vec![ServiceDay::Monday, ServiceDay::Wednesday, ServiceDay::Friday]
        );
    }

    #[test]
    fn unknown_code_is_skipped() {
        let days = parse_schedule_pattern("Mo/Xx/Fr");
        assert_eq!(days, vec![ServiceDay::Monday, ServiceDay::Friday]);
    }
}
