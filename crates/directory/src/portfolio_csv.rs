//! Portfolio CSV export → firm name → portfolio entries.
//!
//! The export is positional: column 0 holds the firm and three
//! `(company, date, round)` triplets sit at fixed offsets. The offsets are
//! captured in [`PortfolioCsvSchema`] and every row that does not fit the
//! schema is reported as a [`RowIssue`] instead of being silently truncated.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use vcscore_protocol::{PortfolioEntry, UNKNOWN};

/// Revision of the export layout the default schema describes.
pub const PORTFOLIO_CSV_SCHEMA_VERSION: u32 = 2;

const NOT_AVAILABLE: &str = "N/A";
const DESCRIPTION_SEPARATOR: &str = " - ";

static INVESTMENT_TYPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"investment in (.+?) -").expect("valid investment type regex"));

/// Column layout of the portfolio export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortfolioCsvSchema {
    pub version: u32,
    pub firm_column: usize,
    /// Rows shorter than this are skipped
    pub min_columns: usize,
    /// Start column of each `(name, date, type)` triplet
    pub triplet_offsets: Vec<usize>,
}

impl Default for PortfolioCsvSchema {
    fn default() -> Self {
        Self {
            version: PORTFOLIO_CSV_SCHEMA_VERSION,
            firm_column: 0,
            min_columns: 22,
            triplet_offsets: vec![8, 14, 20],
        }
    }
}

impl PortfolioCsvSchema {
    /// Column count needed to read every triplet in full.
    pub fn full_width(&self) -> usize {
        self.triplet_offsets
            .iter()
            .map(|offset| offset + 3)
            .max()
            .unwrap_or(self.min_columns)
            .max(self.min_columns)
    }
}

/// A data row that did not match the schema. `line` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowIssue {
    /// Row skipped entirely
    TooFewColumns {
        line: usize,
        found: usize,
        required: usize,
    },
    /// Row parsed, trailing triplet fields defaulted
    MissingTrailingColumns {
        line: usize,
        found: usize,
        expected: usize,
    },
    /// Row skipped entirely
    MissingFirmName { line: usize },
}

#[derive(Debug, Clone, Default)]
pub struct PortfolioParse {
    pub portfolios: HashMap<String, Vec<PortfolioEntry>>,
    pub issues: Vec<RowIssue>,
}

pub fn parse_portfolio_csv(text: &str) -> PortfolioParse {
    parse_portfolio_csv_with(text, &PortfolioCsvSchema::default())
}

pub fn parse_portfolio_csv_with(text: &str, schema: &PortfolioCsvSchema) -> PortfolioParse {
    let mut parsed = PortfolioParse::default();
    let full_width = schema.full_width();

    for (idx, raw_line) in text.lines().enumerate().skip(1) {
        let line_no = idx + 1;
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        let columns: Vec<String> = line
            .split(',')
            .map(|col| col.trim().replace('"', ""))
            .collect();

        if columns.len() < schema.min_columns {
            parsed.issues.push(RowIssue::TooFewColumns {
                line: line_no,
                found: columns.len(),
                required: schema.min_columns,
            });
            continue;
        }

        let firm = cell(&columns, schema.firm_column);
        if firm.is_empty() {
            parsed.issues.push(RowIssue::MissingFirmName { line: line_no });
            continue;
        }

        if columns.len() < full_width {
            parsed.issues.push(RowIssue::MissingTrailingColumns {
                line: line_no,
                found: columns.len(),
                expected: full_width,
            });
        }

        let portfolio: Vec<PortfolioEntry> = schema
            .triplet_offsets
            .iter()
            .filter_map(|&offset| {
                parse_triplet(
                    cell(&columns, offset),
                    cell(&columns, offset + 1),
                    cell(&columns, offset + 2),
                )
            })
            .collect();

        if !portfolio.is_empty() {
            parsed.portfolios.insert(firm.to_string(), portfolio);
        }
    }

    for issue in &parsed.issues {
        log::debug!("portfolio csv: {issue:?}");
    }
    parsed
}

fn cell(columns: &[String], idx: usize) -> &str {
    columns.get(idx).map(String::as_str).unwrap_or("")
}

fn parse_triplet(name: &str, date: &str, investment_type: &str) -> Option<PortfolioEntry> {
    let name = name.trim();
    if name.is_empty() || name == NOT_AVAILABLE {
        return None;
    }

    let investment_type = investment_type.trim();
    let mut investment_type = if investment_type.is_empty() || investment_type == NOT_AVAILABLE {
        UNKNOWN.to_string()
    } else {
        investment_type.to_string()
    };

    // "VanEck investment in Seed Round - Acme" describes the deal, not the company.
    let mut company = name.to_string();
    if let Some((_, tail)) = name.rsplit_once(DESCRIPTION_SEPARATOR) {
        let tail = tail.trim();
        if !tail.is_empty() {
            company = tail.to_string();
        }
        if investment_type == UNKNOWN || investment_type == "investment" {
            if let Some(caps) = INVESTMENT_TYPE_RE.captures(name) {
                investment_type = caps[1].trim().to_string();
            }
        }
    }

    let date = date.trim();
    Some(PortfolioEntry {
        name: company,
        announcement_date: if date.is_empty() {
            UNKNOWN.to_string()
        } else {
            date.to_string()
        },
        investment_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const HEADER: &str = "Firm,c1,c2,c3,c4,c5,c6,c7,p1,d1,t1,c11,c12,c13,p2,d2,t2,c17,c18,c19,p3,d3,t3";

    fn row(firm: &str, triplets: [(&str, &str, &str); 3]) -> String {
        let mut cols = vec![String::new(); 23];
        cols[0] = firm.to_string();
        for (i, offset) in [8usize, 14, 20].iter().enumerate() {
            cols[*offset] = triplets[i].0.to_string();
            cols[offset + 1] = triplets[i].1.to_string();
            cols[offset + 2] = triplets[i].2.to_string();
        }
        cols.join(",")
    }

    fn csv(rows: &[String]) -> String {
        let mut out = String::from(HEADER);
        for r in rows {
            out.push('\n');
            out.push_str(r);
        }
        out
    }

    #[test]
    fn extracts_company_from_description() {
        let text = csv(&[row(
            "OpenAI",
            [
                ("OpenAI investment in Series B - Anthropic Rival", "2023-05-01", "Series B"),
                ("", "", ""),
                ("", "", ""),
            ],
        )]);
        let parsed = parse_portfolio_csv(&text);
        assert_eq!(
            parsed.portfolios["OpenAI"],
            vec![PortfolioEntry::new("Anthropic Rival", "2023-05-01", "Series B")]
        );
        assert!(parsed.issues.is_empty());
    }

    #[test]
    fn not_available_triplet_skipped_sibling_kept() {
        let text = csv(&[row(
            "Breed VC",
            [
                ("N/A", "2022-01-01", "Seed"),
                ("Widget Co", "", ""),
                ("", "", ""),
            ],
        )]);
        let parsed = parse_portfolio_csv(&text);
        assert_eq!(
            parsed.portfolios["Breed VC"],
            vec![PortfolioEntry::new("Widget Co", UNKNOWN, UNKNOWN)]
        );
    }

    #[test]
    fn recovers_type_from_description() {
        let text = csv(&[row(
            "VanEck",
            [
                ("VanEck investment in Seed Round - Acme", "2024-02-02", "N/A"),
                ("Fund investment in Series A - Beta - Gamma", "", "investment"),
                ("Plain Name", "", ""),
            ],
        )]);
        let parsed = parse_portfolio_csv(&text);
        assert_eq!(
            parsed.portfolios["VanEck"],
            vec![
                PortfolioEntry::new("Acme", "2024-02-02", "Seed Round"),
                PortfolioEntry::new("Gamma", UNKNOWN, "Series A"),
                PortfolioEntry::new("Plain Name", UNKNOWN, UNKNOWN),
            ]
        );
    }

    #[test]
    fn short_rows_are_flagged_and_skipped() {
        let text = format!("{HEADER}\nTiny,1,2,3\n\n{}", "Edge,".to_string() + &vec![""; 21].join(","));
        let parsed = parse_portfolio_csv(&text);
        assert!(parsed.portfolios.is_empty());
        assert_eq!(
            parsed.issues[0],
            RowIssue::TooFewColumns {
                line: 2,
                found: 4,
                required: 22
            }
        );
        // Exactly 22 columns: parsed, but flagged for the missing trailing type
        assert_eq!(
            parsed.issues[1],
            RowIssue::MissingTrailingColumns {
                line: 4,
                found: 22,
                expected: 23
            }
        );
    }

    #[test]
    fn firm_without_entries_is_omitted_and_does_not_clobber() {
        let empty = [("", "", ""), ("N/A", "", ""), ("", "", "")];
        let text = csv(&[
            row("Acme", [("Widget", "2021", "Seed"), ("", "", ""), ("", "", "")]),
            row("Acme", empty),
            row("Ghost", empty),
        ]);
        let parsed = parse_portfolio_csv(&text);
        assert!(!parsed.portfolios.contains_key("Ghost"));
        assert_eq!(parsed.portfolios["Acme"].len(), 1);
    }

    #[test]
    fn quotes_are_stripped() {
        let mut line = row("\"Quoted Fund\"", [("\"Widget\"", "\"2020\"", "\"Seed\""), ("", "", ""), ("", "", "")]);
        line.push('\r');
        let parsed = parse_portfolio_csv(&csv(&[line]));
        assert_eq!(
            parsed.portfolios["Quoted Fund"],
            vec![PortfolioEntry::new("Widget", "2020", "Seed")]
        );
    }

    #[test]
    fn missing_firm_name_flagged() {
        let parsed = parse_portfolio_csv(&csv(&[row("", [("Widget", "", ""), ("", "", ""), ("", "", "")])]));
        assert!(parsed.portfolios.is_empty());
        assert_eq!(parsed.issues, vec![RowIssue::MissingFirmName { line: 2 }]);
    }
}
