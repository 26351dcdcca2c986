use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;
use serde_json::Value;
use tabled::builder::Builder;
use tabled::settings::Style;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Default)]
pub enum OutputFormat {
    /// One space separated line per record
    #[default]
    Text,
    Table,
    Json,
    Yaml,
}

pub struct OutputRenderer {
    format: OutputFormat,
}

impl OutputRenderer {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn render<T: Serialize>(&self, value: &T) -> Result<()> {
        let rendered = self.render_to_string(value)?;
        if !rendered.is_empty() {
            println!("{rendered}");
        }
        Ok(())
    }

    pub fn render_to_string<T: Serialize>(&self, value: &T) -> Result<String> {
        let json_value = serde_json::to_value(value)?;

        let rendered = match self.format {
            OutputFormat::Text => Self::render_text(&json_value),
            OutputFormat::Table => match Self::render_table(&json_value) {
                Some(table) => table,
                None => serde_json::to_string_pretty(&json_value)?,
            },
            OutputFormat::Json => serde_json::to_string_pretty(&json_value)?,
            OutputFormat::Yaml => serde_yaml::to_string(&json_value)?
                .trim_end()
                .to_string(),
        };

        Ok(rendered)
    }

    /// Field values in declaration order, joined by single spaces. Empty
    /// fields keep their slot, so columns stay positional.
    fn render_text(value: &Value) -> String {
        match value {
            Value::Array(rows) => rows
                .iter()
                .filter(|row| !row.is_null())
                .map(Self::text_line)
                .collect::<Vec<_>>()
                .join("\n"),
            Value::Null => String::new(),
            other => Self::text_line(other),
        }
    }

    fn text_line(value: &Value) -> String {
        match value {
            Value::Object(obj) => obj
                .values()
                .map(Self::value_to_string)
                .collect::<Vec<_>>()
                .join(" "),
            other => Self::value_to_string(other),
        }
    }

    fn render_table(value: &Value) -> Option<String> {
        let (headers, rows) = Self::coerce_rows(value)?;

        let mut builder = Builder::default();
        builder.push_record(headers);
        for row in rows {
            builder.push_record(row);
        }

        Some(builder.build().with(Style::rounded()).to_string())
    }

    fn coerce_rows(value: &Value) -> Option<(Vec<String>, Vec<Vec<String>>)> {
        let rows = match value {
            Value::Array(rows) if !rows.is_empty() => rows,
            _ => return None,
        };

        let mut headers: Vec<String> = Vec::new();
        for row in rows {
            if let Value::Object(obj) = row {
                for key in obj.keys() {
                    if !headers.contains(key) {
                        headers.push(key.clone());
                    }
                }
            }
        }

        if headers.is_empty() {
            return None;
        }

        let mut data = Vec::with_capacity(rows.len());
        for row in rows {
            let mut record = Vec::with_capacity(headers.len());
            if let Value::Object(obj) = row {
                for header in &headers {
                    let cell = obj
                        .get(header)
                        .map(Self::value_to_string)
                        .unwrap_or_default();
                    record.push(cell);
                }
            }
            data.push(record);
        }

        Some((headers, data))
    }

    fn value_to_string(value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Null => String::new(),
            other => serde_json::to_string(other).unwrap_or_default(),
        }
    }
}
