use cljkit::core::models::ids::GroupId;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid --set format: '{0}'. Expected KEY=VALUE.")]
    InvalidAssignment(String),

    #[error("Component '{component}' cannot be empty in '{input}'.")]
    EmptyComponent {
        component: &'static str,
        input: String,
    },

    #[error("Invalid group list '{0}'. Expected comma-separated non-negative integers.")]
    InvalidGroupList(String),
}

/// Splits a `-S` argument into its key and value.
pub fn parse_assignment(input: &str) -> Result<(&str, &str), ParseError> {
    let (key, value) = input
        .split_once('=')
        .ok_or_else(|| ParseError::InvalidAssignment(input.to_string()))?;
    let (key, value) = (key.trim(), value.trim());
    if key.is_empty() {
        return Err(ParseError::EmptyComponent {
            component: "key",
            input: input.to_string(),
        });
    }
    if value.is_empty() {
        return Err(ParseError::EmptyComponent {
            component: "value",
            input: input.to_string(),
        });
    }
    Ok((key, value))
}

/// Parses `1,2,5` (optionally bracketed) into group ids.
pub fn parse_group_list(input: &str) -> Result<Vec<GroupId>, ParseError> {
    let trimmed = input.trim().trim_start_matches('[').trim_end_matches(']');
    trimmed
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u32>()
                .map(GroupId)
                .map_err(|_| ParseError::InvalidGroupList(input.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_is_split_at_the_first_equals_sign() {
        assert_eq!(
            parse_assignment("function.lj-cutoff=9.5").unwrap(),
            ("function.lj-cutoff", "9.5")
        );
        assert_eq!(parse_assignment(" a = b=c ").unwrap(), ("a", "b=c"));
    }

    #[test]
    fn assignment_without_equals_sign_is_rejected() {
        assert_eq!(
            parse_assignment("sampling.steps"),
            Err(ParseError::InvalidAssignment("sampling.steps".to_string()))
        );
    }

    #[test]
    fn empty_key_or_value_is_rejected() {
        assert!(matches!(
            parse_assignment("=3"),
            Err(ParseError::EmptyComponent { component: "key", .. })
        ));
        assert!(matches!(
            parse_assignment("sampling.seed="),
            Err(ParseError::EmptyComponent { component: "value", .. })
        ));
    }

    #[test]
    fn group_lists_accept_brackets_and_spaces() {
        assert_eq!(
            parse_group_list("[1, 4,7]").unwrap(),
            vec![GroupId(1), GroupId(4), GroupId(7)]
        );
        assert_eq!(parse_group_list("3").unwrap(), vec![GroupId(3)]);
    }

    #[test]
    fn negative_group_ids_are_rejected() {
        assert!(matches!(
            parse_group_list("1,-2"),
            Err(ParseError::InvalidGroupList(_))
        ));
    }
}
