use std::io::Write;

use legal_lens_core::{AnalysisResult, ClauseCategory};
use owo_colors::OwoColorize;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

fn heading(category: ClauseCategory) -> &'static str {
    match category {
        ClauseCategory::Liability => "Liability",
        ClauseCategory::Termination => "Termination",
        ClauseCategory::Confidentiality => "Confidentiality",
    }
}

/// Print the summary followed by each clause category.
pub fn print_analysis(
    w: &mut dyn Write,
    file_name: &str,
    result: &AnalysisResult,
    color: ColorMode,
) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{}", format!("Summary of {}", file_name).bold())?;
    } else {
        writeln!(w, "Summary of {}", file_name)?;
    }
    writeln!(w)?;
    writeln!(w, "{}", result.summary.trim())?;
    writeln!(w)?;

    for (category, clauses) in result.clauses.iter() {
        let title = format!("{} ({})", heading(category), clauses.len());
        if color.enabled() {
            writeln!(w, "{}", title.cyan().bold())?;
        } else {
            writeln!(w, "{}", title)?;
        }

        if clauses.is_empty() {
            if color.enabled() {
                writeln!(w, "  {}", "none found".dimmed())?;
            } else {
                writeln!(w, "  none found")?;
            }
        }
        for clause in clauses {
            writeln!(w, "  - {}", clause)?;
        }
        writeln!(w)?;
    }

    let total = result.clauses.total();
    if color.enabled() {
        writeln!(w, "{}", format!("{} clauses extracted", total).green())?;
    } else {
        writeln!(w, "{} clauses extracted", total)?;
    }
    Ok(())
}

/// Print the result as the same JSON document the web API returns.
pub fn print_json(w: &mut dyn Write, result: &AnalysisResult) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(result).map_err(std::io::Error::other)?;
    writeln!(w, "{}", json)
}
