//! Renders simulated outcomes for standard output.

use std::io::{self, Write};

use anyhow::{Context, Result};
use euro_diffusion_core::{CaseOutcome, CountryOutcome};

/// Writes both ranked blocks for every case.
///
/// Case numbers are one-based. The first block lists countries by
/// completion day, the second alphabetically.
pub(crate) fn write_text(out: &mut impl Write, outcomes: &[CaseOutcome]) -> io::Result<()> {
    for (index, outcome) in outcomes.iter().enumerate() {
        let number = index + 1;
        write_block(out, number, &outcome.by_completion_day())?;
        write_block(out, number, &outcome.by_name())?;
    }
    Ok(())
}

fn write_block(out: &mut impl Write, number: usize, rows: &[&CountryOutcome]) -> io::Result<()> {
    writeln!(out, "Case Number {number}: ")?;
    for row in rows {
        writeln!(out, "{}: {}", row.name, row.completion_day)?;
    }
    writeln!(out)
}

/// Writes the outcomes as a pretty-printed JSON array.
pub(crate) fn write_json(out: &mut impl Write, outcomes: &[CaseOutcome]) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, outcomes).context("failed to serialize outcomes")?;
    writeln!(out).context("failed to write outcomes")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use euro_diffusion_core::Day;

    fn country(name: &str, day: u32) -> CountryOutcome {
        CountryOutcome {
            name: name.to_owned(),
            completion_day: Day::new(day),
        }
    }

    #[test]
    fn text_lists_each_case_twice() {
        let outcomes = vec![
            CaseOutcome::new(vec![country("Zeta", 3), country("Alpha", 7)], Day::new(7)),
            CaseOutcome::new(vec![], Day::new(0)),
        ];

        let mut buffer = Vec::new();
        write_text(&mut buffer, &outcomes).expect("writing to a vec succeeds");

        let text = String::from_utf8(buffer).expect("output is utf-8");
        assert_eq!(
            text,
            "Case Number 1: \nZeta: 3\nAlpha: 7\n\n\
             Case Number 1: \nAlpha: 7\nZeta: 3\n\n\
             Case Number 2: \n\n\
             Case Number 2: \n\n"
        );
    }

    #[test]
    fn json_is_an_array_of_outcomes() {
        let outcomes = vec![CaseOutcome::new(vec![country("Luxembourg", 1)], Day::new(1))];

        let mut buffer = Vec::new();
        write_json(&mut buffer, &outcomes).expect("writing to a vec succeeds");

        let value: serde_json::Value = serde_json::from_slice(&buffer).expect("valid json");
        assert_eq!(value[0]["countries"][0]["name"], "Luxembourg");
        assert_eq!(value[0]["countries"][0]["completion_day"], 1);
        assert_eq!(value[0]["days_simulated"], 1);
    }
}
