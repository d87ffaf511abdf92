//! Output formatting: table, JSON, YAML, plain.
//!
//! Table uses `tabled`, structured formats use serde, plain emits one
//! identifier per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Colour ──────────────────────────────────────────────────────────

pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
    }
}

/// Paint an active state (lit, locked, powered) green and an idle one dim.
pub fn paint_state(text: &str, active: bool, color: bool) -> String {
    match (color, active) {
        (false, _) => text.to_owned(),
        (true, true) => text.green().to_string(),
        (true, false) => text.dimmed().to_string(),
    }
}

// ── Render dispatchers ──────────────────────────────────────────────

/// Render a list in the chosen format. `to_row` feeds the table,
/// `id_fn` the plain format.
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Ok(Table::new(rows).with(Style::rounded()).to_string())
        }
        OutputFormat::Plain => Ok(data.iter().map(id_fn).collect::<Vec<_>>().join("\n")),
        structured => render_structured(structured, data),
    }
}

/// Render one item. Table format uses the caller's pre-formatted detail view.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => Ok(detail_fn(data)),
        OutputFormat::Plain => Ok(id_fn(data)),
        structured => render_structured(structured, data),
    }
}

fn render_structured<T: serde::Serialize + ?Sized>(
    format: OutputFormat,
    data: &T,
) -> Result<String, CliError> {
    let rendered = match format {
        OutputFormat::JsonCompact => serde_json::to_string(data).map_err(output_err)?,
        OutputFormat::Yaml => serde_yaml::to_string(data).map_err(output_err)?,
        _ => serde_json::to_string_pretty(data).map_err(output_err)?,
    };
    Ok(rendered)
}

fn output_err(e: impl std::fmt::Display) -> CliError {
    CliError::Output {
        message: e.to_string(),
    }
}

/// Print to stdout unless quiet.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde::Serialize;

    use super::*;

    #[derive(Serialize)]
    struct Item {
        id: u32,
        name: &'static str,
    }

    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "ID")]
        id: u32,
        #[tabled(rename = "Name")]
        name: String,
    }

    fn items() -> Vec<Item> {
        vec![
            Item { id: 1, name: "Kitchen" },
            Item { id: 2, name: "Den" },
        ]
    }

    fn render(format: OutputFormat) -> String {
        render_list(
            format,
            &items(),
            |i| Row {
                id: i.id,
                name: i.name.into(),
            },
            |i| i.id.to_string(),
        )
        .unwrap()
    }

    #[test]
    fn plain_prints_one_id_per_line() {
        assert_eq!(render(OutputFormat::Plain), "1\n2");
    }

    #[test]
    fn table_has_headers_and_rows() {
        let table = render(OutputFormat::Table);
        assert!(table.contains("Name"));
        assert!(table.contains("Kitchen"));
        assert!(table.contains("Den"));
    }

    #[test]
    fn compact_json_is_one_line() {
        let json = render(OutputFormat::JsonCompact);
        assert_eq!(json, r#"[{"id":1,"name":"Kitchen"},{"id":2,"name":"Den"}]"#);
    }

    #[test]
    fn paint_is_plain_without_color() {
        assert_eq!(paint_state("on", true, false), "on");
        assert_ne!(paint_state("on", true, true), "on");
    }
}
