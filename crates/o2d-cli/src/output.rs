use serde::Serialize;
use std::io::Write;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// One compact JSON document per line, for the interactive loop.
pub fn write_json_line<W: Write, T: Serialize>(out: &mut W, value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string(value)?;
    writeln!(out, "{json}")?;
    Ok(())
}

pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    print!("{}", render_table(headers, &rows, ""));
}

/// Render a left-aligned table with a dashed header separator. Every line is
/// prefixed with `indent`.
pub fn render_table(headers: &[&str], rows: &[Vec<String>], indent: &str) -> String {
    // Column widths in characters, not bytes
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }

    let mut out = String::new();

    let header_row: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{:width$}", h, width = widths[i]))
        .collect();
    out.push_str(&format!("{indent}{}\n", header_row.join("  ").trim_end()));

    let sep: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    out.push_str(&format!("{indent}{}\n", sep.join("  ")));

    for row in rows {
        let cells: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let w = widths.get(i).copied().unwrap_or(0);
                format!("{:width$}", cell, width = w)
            })
            .collect();
        out.push_str(&format!("{indent}{}\n", cells.join("  ").trim_end()));
    }
    out
}
