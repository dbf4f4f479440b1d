//! CLI value enums and their conversions to domain types.

use clap::ValueEnum;

use crate::triage::GroupBy;

/// Recommendation grouping for the `triage` command
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupByArg {
    /// Group by execution-plan track
    Track,
    /// Group by first label
    Label,
}

impl std::fmt::Display for GroupByArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Track => write!(f, "track"),
            Self::Label => write!(f, "label"),
        }
    }
}

impl From<GroupByArg> for GroupBy {
    fn from(arg: GroupByArg) -> Self {
        match arg {
            GroupByArg::Track => GroupBy::Track,
            GroupByArg::Label => GroupBy::Label,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(GroupByArg::Track, GroupBy::Track, "track")]
    #[case(GroupByArg::Label, GroupBy::Label, "label")]
    fn group_by_conversion(#[case] arg: GroupByArg, #[case] expected: GroupBy, #[case] name: &str) {
        assert_eq!(GroupBy::from(arg), expected);
        assert_eq!(arg.to_string(), name);
    }

    #[test]
    fn group_by_parses_case_insensitively() {
        assert_eq!(GroupByArg::from_str("TRACK", true), Ok(GroupByArg::Track));
        assert!(GroupByArg::from_str("epic", true).is_err());
    }
}
