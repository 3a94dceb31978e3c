#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Text adapter that turns case listings into validated case definitions.
//!
//! A listing is a sequence of blocks. Each block opens with a line holding
//! only the number of countries `N`, followed by `N` lines of the form
//! `name lowerX lowerY upperX upperY`. A block declaring zero countries
//! produces no case.

use euro_diffusion_core::{
    is_valid_name, CaseDefinition, CountryDefinition, DefinitionError, Territory,
};
use log::warn;
use thiserror::Error;

/// Number of whitespace-separated coordinates following a country name.
const COORDINATE_COUNT: usize = 4;

/// Broad categories of parse failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A country name was missing or too long.
    NameFormat,
    /// A coordinate was missing or not an integer.
    CoordinateFormat,
    /// A coordinate was negative or placed cells outside the grid.
    Range,
    /// The listing itself was malformed or a case was inconsistent.
    Structure,
}

/// Errors that abort parsing of a case listing.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The country name is empty or longer than the allowed length.
    #[error("line {line}: erroneous country name `{name}`")]
    NameFormat {
        /// One-based line number.
        line: usize,
        /// Offending name.
        name: String,
    },
    /// A coordinate token is missing or does not parse as an integer.
    #[error("line {line}: erroneous country coordinates `{token}`")]
    CoordinateFormat {
        /// One-based line number.
        line: usize,
        /// Offending token, empty when the token is missing.
        token: String,
    },
    /// A coordinate is negative.
    #[error("line {line}: coordinate {value} is negative")]
    NegativeCoordinate {
        /// One-based line number.
        line: usize,
        /// Offending value.
        value: i64,
    },
    /// The territory covers cells outside the fixed grid.
    #[error("line {line}: territory of `{name}` extends beyond the grid")]
    OutsideGrid {
        /// One-based line number.
        line: usize,
        /// Country whose territory was rejected.
        name: String,
    },
    /// The country count on a header line cannot be represented.
    #[error("line {line}: invalid country count `{text}`")]
    InvalidCountryCount {
        /// One-based line number.
        line: usize,
        /// Header text as written.
        text: String,
    },
    /// A country line appeared while no case was expecting countries.
    #[error("line {line}: country definition outside of a case")]
    UnexpectedCountryLine {
        /// One-based line number.
        line: usize,
    },
    /// The completed case failed validation.
    #[error("case starting on line {line}: {source}")]
    InvalidCase {
        /// One-based line number of the case header.
        line: usize,
        /// Underlying validation failure.
        #[source]
        source: DefinitionError,
    },
}

impl ParseError {
    /// Category of the failure.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NameFormat { .. } => ErrorKind::NameFormat,
            Self::CoordinateFormat { .. } => ErrorKind::CoordinateFormat,
            Self::NegativeCoordinate { .. } | Self::OutsideGrid { .. } => ErrorKind::Range,
            Self::InvalidCountryCount { .. }
            | Self::UnexpectedCountryLine { .. }
            | Self::InvalidCase { .. } => ErrorKind::Structure,
        }
    }

    /// One-based line number the failure refers to.
    #[must_use]
    pub const fn line(&self) -> usize {
        match self {
            Self::NameFormat { line, .. }
            | Self::CoordinateFormat { line, .. }
            | Self::NegativeCoordinate { line, .. }
            | Self::OutsideGrid { line, .. }
            | Self::InvalidCountryCount { line, .. }
            | Self::UnexpectedCountryLine { line }
            | Self::InvalidCase { line, .. } => *line,
        }
    }
}

#[derive(Debug)]
struct OpenCase {
    header_line: usize,
    remaining: usize,
    countries: Vec<CountryDefinition>,
}

impl OpenCase {
    fn close(self) -> Result<CaseDefinition, ParseError> {
        CaseDefinition::new(self.countries).map_err(|source| ParseError::InvalidCase {
            line: self.header_line,
            source,
        })
    }
}

/// Parses every complete case contained in `input`.
///
/// Blank lines are ignored. A case that is still missing countries when
/// the next header or the end of input arrives is dropped with a warning.
pub fn parse_cases(input: &str) -> Result<Vec<CaseDefinition>, ParseError> {
    let mut cases = Vec::new();
    let mut open: Option<OpenCase> = None;

    for (index, raw) in input.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }

        if is_header(trimmed) {
            if let Some(dropped) = open.take() {
                warn!(
                    "case starting on line {} is missing {} countries; dropping it",
                    dropped.header_line, dropped.remaining
                );
            }
            let remaining =
                trimmed
                    .parse::<usize>()
                    .map_err(|_| ParseError::InvalidCountryCount {
                        line,
                        text: trimmed.to_owned(),
                    })?;
            if remaining > 0 {
                open = Some(OpenCase {
                    header_line: line,
                    remaining,
                    countries: Vec::new(),
                });
            }
            continue;
        }

        let Some(case) = open.as_mut() else {
            return Err(ParseError::UnexpectedCountryLine { line });
        };
        case.countries.push(parse_country(line, trimmed)?);
        case.remaining -= 1;

        if case.remaining == 0 {
            if let Some(complete) = open.take() {
                cases.push(complete.close()?);
            }
        }
    }

    if let Some(dropped) = open {
        warn!(
            "input ended while case starting on line {} was missing {} countries; dropping it",
            dropped.header_line, dropped.remaining
        );
    }

    Ok(cases)
}

fn is_header(line: &str) -> bool {
    line.bytes().all(|byte| byte.is_ascii_digit())
}

fn parse_country(line: usize, text: &str) -> Result<CountryDefinition, ParseError> {
    let mut tokens = text.split_whitespace();
    let name = tokens.next().unwrap_or_default();
    if !is_valid_name(name) {
        return Err(ParseError::NameFormat {
            line,
            name: name.to_owned(),
        });
    }

    let mut raw = [0_i64; COORDINATE_COUNT];
    for slot in &mut raw {
        let token = tokens.next().unwrap_or_default();
        *slot = token
            .parse::<i64>()
            .map_err(|_| ParseError::CoordinateFormat {
                line,
                token: token.to_owned(),
            })?;
    }

    let mut bounds = [0_u32; COORDINATE_COUNT];
    for (bound, value) in bounds.iter_mut().zip(raw) {
        if value < 0 {
            return Err(ParseError::NegativeCoordinate { line, value });
        }
        *bound = u32::try_from(value).map_err(|_| ParseError::OutsideGrid {
            line,
            name: name.to_owned(),
        })?;
    }

    let [lower_x, lower_y, upper_x, upper_y] = bounds;
    let territory = Territory::new(lower_x, lower_y, upper_x, upper_y);
    CountryDefinition::new(name, territory).map_err(|error| match error {
        DefinitionError::InvalidName { name } => ParseError::NameFormat { line, name },
        DefinitionError::TerritoryOutsideGrid { name } => ParseError::OutsideGrid { line, name },
        source @ (DefinitionError::DuplicateName { .. }
        | DefinitionError::OverlappingTerritories { .. }) => {
            ParseError::InvalidCase { line, source }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use euro_diffusion_core::CellCoord;

    const CLASSIC: &str = "3\n\
        France 1 4 4 6\n\
        Spain 3 1 6 3\n\
        Portugal 1 1 2 2\n\
        1\n\
        Luxembourg 1 1 1 1\n\
        2\n\
        Netherlands 1 3 2 4\n\
        Belgium 1 1 2 2\n\
        0\n";

    fn names(case: &CaseDefinition) -> Vec<&str> {
        case.countries().iter().map(CountryDefinition::name).collect()
    }

    #[test]
    fn parses_classic_listing() {
        let cases = parse_cases(CLASSIC).expect("listing parses");

        assert_eq!(cases.len(), 3);
        assert_eq!(names(&cases[0]), vec!["France", "Spain", "Portugal"]);
        assert_eq!(names(&cases[1]), vec!["Luxembourg"]);
        assert_eq!(names(&cases[2]), vec!["Netherlands", "Belgium"]);
        assert_eq!(
            cases[0].countries()[1].territory(),
            Territory::new(3, 1, 6, 3)
        );
    }

    #[test]
    fn tolerates_crlf_and_blank_lines() {
        let cases = parse_cases("1\r\n\r\nA 1 1 2 2\r\n\r\n").expect("listing parses");
        assert_eq!(cases.len(), 1);
        let cells: Vec<CellCoord> = cases[0].countries()[0].territory().cells().collect();
        assert_eq!(cells.len(), 4);
    }

    #[test]
    fn drops_truncated_cases() {
        let cases = parse_cases("2\nA 1 1 1 1\n1\nB 2 2 2 2\n2\nC 3 3 3 3\n")
            .expect("listing parses");
        assert_eq!(cases.len(), 1);
        assert_eq!(names(&cases[0]), vec!["B"]);
    }

    #[test]
    fn huge_country_count_is_dropped_as_truncated() {
        let cases = parse_cases("18446744073709551615\nA 1 1 1 1\n1\nB 2 2 2 2\n")
            .expect("listing parses");
        assert_eq!(cases.len(), 1);
        assert_eq!(names(&cases[0]), vec!["B"]);

        let cases = parse_cases("1000000000000\nA 1 1 1 1\n").expect("listing parses");
        assert!(cases.is_empty());
    }

    #[test]
    fn rejects_country_count_beyond_usize() {
        let text = "123456789012345678901234567890";
        let error = parse_cases(&format!("{text}\nA 1 1 1 1\n")).expect_err("count rejected");
        assert_eq!(
            error,
            ParseError::InvalidCountryCount {
                line: 1,
                text: text.to_owned(),
            }
        );
        assert_eq!(error.kind(), ErrorKind::Structure);
    }

    #[test]
    fn rejects_long_names() {
        let name = "N".repeat(26);
        let error = parse_cases(&format!("1\n{name} 1 1 1 1\n")).expect_err("name rejected");
        assert_eq!(error, ParseError::NameFormat { line: 2, name });
        assert_eq!(error.kind(), ErrorKind::NameFormat);
    }

    #[test]
    fn rejects_non_numeric_and_missing_coordinates() {
        let error = parse_cases("1\nA 1 x 1 1\n").expect_err("coordinate rejected");
        assert_eq!(
            error,
            ParseError::CoordinateFormat {
                line: 2,
                token: "x".to_owned(),
            }
        );

        let error = parse_cases("1\nA 1 1 1\n").expect_err("missing coordinate rejected");
        assert_eq!(error.kind(), ErrorKind::CoordinateFormat);

        let error = parse_cases("1\nA 1 1.5 2 2\n").expect_err("fraction rejected");
        assert_eq!(error.kind(), ErrorKind::CoordinateFormat);
    }

    #[test]
    fn rejects_negative_coordinates() {
        let error = parse_cases("1\nA 1 1 -2 1\n").expect_err("negative rejected");
        assert_eq!(error, ParseError::NegativeCoordinate { line: 2, value: -2 });
        assert_eq!(error.kind(), ErrorKind::Range);
    }

    #[test]
    fn rejects_territories_beyond_the_grid() {
        let error = parse_cases("1\nA 1 1 11 1\n").expect_err("territory rejected");
        assert_eq!(
            error,
            ParseError::OutsideGrid {
                line: 2,
                name: "A".to_owned(),
            }
        );
        assert_eq!(error.kind(), ErrorKind::Range);

        let error = parse_cases("1\nA 0 1 1 1\n").expect_err("zero lower bound rejected");
        assert_eq!(error.kind(), ErrorKind::Range);
    }

    #[test]
    fn empty_territories_are_accepted() {
        let cases = parse_cases("1\nGhost 5 5 4 4\n").expect("listing parses");
        assert!(cases[0].countries()[0].territory().is_empty());
    }

    #[test]
    fn rejects_duplicate_names_within_a_case() {
        let error = parse_cases("2\nA 1 1 1 1\nA 2 2 2 2\n").expect_err("duplicate rejected");
        assert_eq!(
            error,
            ParseError::InvalidCase {
                line: 1,
                source: DefinitionError::DuplicateName {
                    name: "A".to_owned()
                },
            }
        );
        assert_eq!(
            error.to_string(),
            "case starting on line 1: country name `A` is declared more than once"
        );
    }

    #[test]
    fn same_name_may_repeat_across_cases() {
        let cases = parse_cases("1\nA 1 1 1 1\n1\nA 2 2 2 2\n").expect("listing parses");
        assert_eq!(cases.len(), 2);
    }

    #[test]
    fn rejects_country_lines_outside_a_case() {
        let error = parse_cases("1\nA 1 1 1 1\nB 2 2 2 2\n").expect_err("stray line rejected");
        assert_eq!(error, ParseError::UnexpectedCountryLine { line: 3 });
        assert_eq!(error.line(), 3);
    }
}
