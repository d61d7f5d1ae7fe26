//! The text report.
//!
//! Wording follows the bot's Spanish replies. Emphasis uses the
//! single-asterisk Markdown the chat client renders as bold.

use crime_bot_analytics_models::AggregationResult;
use crime_bot_crime_models::ReportingPeriod;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Emphasis style for report text.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ReportMarkup {
    /// `*bold*` delimiters, with Markdown control characters in dataset
    /// values escaped.
    #[default]
    Markdown,
    /// No emphasis delimiters.
    Plain,
}

impl ReportMarkup {
    fn bold(self, text: &str) -> String {
        match self {
            Self::Markdown => bold_markdown(text),
            Self::Plain => text.to_string(),
        }
    }

    fn value(self, text: &str) -> String {
        match self {
            Self::Markdown => escape_markdown(text),
            Self::Plain => text.to_string(),
        }
    }
}

const fn is_markdown_control(c: char) -> bool {
    matches!(c, '*' | '_' | '`' | '[')
}

fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if is_markdown_control(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Wraps `text` in `*bold*` spans.
///
/// Escapes are not honored inside an entity, so control characters are
/// emitted escaped between spans and only the runs around them are bold.
fn bold_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    let mut run = String::new();
    for c in text.chars() {
        if is_markdown_control(c) {
            if !run.is_empty() {
                out.push('*');
                out.push_str(&run);
                out.push('*');
                run.clear();
            }
            out.push('\\');
            out.push(c);
        } else {
            run.push(c);
        }
    }
    if !run.is_empty() || out.is_empty() {
        out.push('*');
        out.push_str(&run);
        out.push('*');
    }
    out
}

/// Reply when the coordinate is outside every neighborhood.
#[must_use]
pub const fn no_neighborhood_message() -> &'static str {
    "No encontré colonias"
}

/// Reply when the neighborhood has no incidents in the period.
#[must_use]
pub fn no_incidents_message(period: &ReportingPeriod) -> String {
    format!("No crímenes reportados en {}", period.month())
}

/// Formats the counts for a neighborhood: a header naming the period and
/// the neighborhood, then one `label: count` line per category in the
/// order the aggregation lists them.
#[must_use]
pub fn format_report(
    neighborhood: &str,
    result: &AggregationResult,
    period: &ReportingPeriod,
    markup: ReportMarkup,
) -> String {
    let mut response = format!("Para {}\n", markup.bold(&period.label()));
    response.push_str("he podido detectar lo siguiente:\n\n");
    response.push_str(&format!("Colonia: {}\n\n", markup.bold(neighborhood)));

    for row in &result.by_category {
        response.push_str(&format!(
            "{}: {}\n",
            markup.value(&row.category),
            markup.bold(&row.count.to_string())
        ));
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crime_bot_analytics_models::{CategoryCount, DailySeries};

    fn result(rows: &[(&str, u64)]) -> AggregationResult {
        AggregationResult {
            total: rows.iter().map(|(_, n)| n).sum(),
            by_category: rows
                .iter()
                .map(|(category, count)| CategoryCount {
                    category: (*category).to_string(),
                    count: *count,
                })
                .collect(),
            daily: DailySeries::default(),
        }
    }

    #[test]
    fn formats_markdown_report() {
        let text = format_report(
            "Roma Norte",
            &result(&[("Robo", 5), ("Fraude", 3)]),
            &ReportingPeriod::default(),
            ReportMarkup::Markdown,
        );
        assert_eq!(
            text,
            "Para *diciembre de 2019*\n\
             he podido detectar lo siguiente:\n\n\
             Colonia: *Roma Norte*\n\n\
             Robo: *5*\n\
             Fraude: *3*\n"
        );
    }

    #[test]
    fn formats_plain_report() {
        let text = format_report(
            "Roma Norte",
            &result(&[("Robo", 5), ("Fraude", 3)]),
            &ReportingPeriod::default(),
            ReportMarkup::Plain,
        );
        assert!(text.contains("Colonia: Roma Norte\n"));
        assert!(text.contains("Robo: 5\n"));
        assert!(text.contains("Fraude: 3\n"));
        assert!(!text.contains('*'));
    }

    #[test]
    fn keeps_aggregation_order() {
        let text = format_report(
            "X",
            &result(&[("Z", 1), ("A", 2), ("M", 3)]),
            &ReportingPeriod::default(),
            ReportMarkup::Plain,
        );
        let z = text.find("Z: 1").unwrap();
        let a = text.find("A: 2").unwrap();
        let m = text.find("M: 3").unwrap();
        assert!(z < a && a < m);
    }

    #[test]
    fn escapes_markdown_in_dataset_values() {
        let text = format_report(
            "SAN_JUAN",
            &result(&[("ROBO *CON* VIOLENCIA", 1)]),
            &ReportingPeriod::default(),
            ReportMarkup::Markdown,
        );
        assert!(text.contains("Colonia: *SAN*\\_*JUAN*"));
        assert!(text.contains("ROBO \\*CON\\* VIOLENCIA: *1*"));
    }

    #[test]
    fn bold_spans_never_contain_escapes() {
        let markup = ReportMarkup::Markdown;
        assert_eq!(markup.bold("ROMA NORTE"), "*ROMA NORTE*");
        assert_eq!(markup.bold("SAN_JUAN"), "*SAN*\\_*JUAN*");
        assert_eq!(markup.bold("_A*"), "\\_*A*\\*");
        assert_eq!(markup.bold("[x]"), "\\[*x]*");
        assert_eq!(markup.bold("__"), "\\_\\_");
        assert_eq!(markup.bold(""), "**");
        for bold in ["SAN_JUAN", "_A*", "`x`_y"].map(|t| markup.bold(t)) {
            for span in bold.split('*').skip(1).step_by(2) {
                assert!(!span.contains('\\'), "escape inside span in {bold}");
            }
        }
        assert_eq!(ReportMarkup::Plain.bold("SAN_JUAN"), "SAN_JUAN");
    }

    #[test]
    fn fixed_messages() {
        assert_eq!(no_neighborhood_message(), "No encontré colonias");
        assert_eq!(
            no_incidents_message(&ReportingPeriod::default()),
            "No crímenes reportados en diciembre"
        );
    }
}
