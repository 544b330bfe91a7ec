use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Design vector is empty. Expected comma-separated numbers (e.g., '0.0,1.5,-2').")]
    EmptyDesignVector,

    #[error("Entry {index} of the design vector is not a finite number: '{value}'.")]
    InvalidNumber { index: usize, value: String },

    #[error("Invalid --set format: '{0}'. Expected KEY=VALUE.")]
    InvalidAssignment(String),
}

/// Parses `"x1,x2,..."` into a design vector. Whitespace around entries is ignored.
pub fn parse_design_vector(input: &str) -> Result<Vec<f64>, ParseError> {
    if input.trim().is_empty() {
        return Err(ParseError::EmptyDesignVector);
    }
    input
        .split(',')
        .enumerate()
        .map(|(index, token)| {
            let token = token.trim();
            token
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| ParseError::InvalidNumber {
                    index,
                    value: token.to_string(),
                })
        })
        .collect()
}

/// Splits a `-S key=value` pair at the first `=`.
pub fn parse_assignment(pair: &str) -> Result<(&str, &str), ParseError> {
    match pair.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value.trim())),
        _ => Err(ParseError::InvalidAssignment(pair.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn design_vector_parses_with_whitespace() {
        assert_eq!(
            parse_design_vector(" 1.0, -2.5 ,3e-1").unwrap(),
            vec![1.0, -2.5, 0.3]
        );
    }

    #[test]
    fn design_vector_rejects_bad_entries() {
        assert_eq!(
            parse_design_vector("1.0,,2"),
            Err(ParseError::InvalidNumber {
                index: 1,
                value: String::new()
            })
        );
        assert_eq!(
            parse_design_vector("1.0,nan"),
            Err(ParseError::InvalidNumber {
                index: 1,
                value: "nan".to_string()
            })
        );
        assert_eq!(parse_design_vector("  "), Err(ParseError::EmptyDesignVector));
    }

    #[test]
    fn assignment_splits_at_first_equals() {
        assert_eq!(
            parse_assignment("layout.type=random").unwrap(),
            ("layout.type", "random")
        );
        assert_eq!(parse_assignment("a=b=c").unwrap(), ("a", "b=c"));
        assert!(parse_assignment("no-equals").is_err());
        assert!(parse_assignment("=1").is_err());
    }
}
