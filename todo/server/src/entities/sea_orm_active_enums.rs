use sea_orm::entity::prelude::*;

/// Task priority, stored as an integer rank so ordering by the column
/// goes Low < Medium < High.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
pub enum Priority {
    #[sea_orm(num_value = 1)]
    Low,
    #[sea_orm(num_value = 2)]
    Medium,
    #[default]
    #[sea_orm(num_value = 3)]
    High,
}

impl Priority {
    /// The one-letter code used by forms and query strings.
    pub fn code(&self) -> &'static str {
        match self {
            Priority::High => "H",
            Priority::Medium => "M",
            Priority::Low => "L",
        }
    }

    /// Human readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }

    /// Parses a one-letter priority code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "H" => Some(Priority::High),
            "M" => Some(Priority::Medium),
            "L" => Some(Priority::Low),
            _ => None,
        }
    }

    /// All priorities in the order they are offered in forms.
    pub fn choices() -> [Priority; 3] {
        [Priority::High, Priority::Medium, Priority::Low]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_parse_known_codes() {
        assert_eq!(Priority::from_code("H"), Some(Priority::High));
        assert_eq!(Priority::from_code("M"), Some(Priority::Medium));
        assert_eq!(Priority::from_code("L"), Some(Priority::Low));
    }

    #[test]
    fn can_reject_unknown_codes() {
        assert_eq!(Priority::from_code("h"), None);
        assert_eq!(Priority::from_code(""), None);
        assert_eq!(Priority::from_code("High"), None);
    }

    #[test]
    fn defaults_to_high() {
        assert_eq!(Priority::default(), Priority::High);
    }
}
