// Runtime pipeline: template source -> rendered text -> bound chart tree

use crate::bind::bind;
use crate::config::RenderOptions;
use crate::csv_reader;
use crate::data::Table;
use crate::host::{DefaultPalette, HostServices};
use crate::mapping::{self, Mapping, UnresolvedReference};
use crate::preprocessor::uncomment_code_comments;
use crate::spec::safe_parse;
use crate::template::{Diagnostic, RenderContext, Template, TemplateError, TemplateEvaluator};
use anyhow::{Context, Result};
use log::{debug, error};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Output of one render.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedChart {
    /// Rendered template text, or the inline diagnostic when rendering failed.
    pub text: String,
    /// `text` parsed and bound against the table.
    pub chart: serde_json::Value,
    pub diagnostic: Option<Diagnostic>,
}

/// A chart template rendered repeatedly against changing data.
///
/// The compiled template is kept until the source changes.
pub struct ChartSession {
    source: String,
    options: RenderOptions,
    host: Arc<dyn HostServices>,
    evaluator: TemplateEvaluator,
    compiled: Option<(String, Result<Template, TemplateError>)>,
}

impl ChartSession {
    pub fn new(source: impl Into<String>, options: RenderOptions) -> Self {
        let host = Arc::new(DefaultPalette::new(options.palette.clone()));
        Self::with_host(source, options, host)
    }

    pub fn with_host(source: impl Into<String>, options: RenderOptions, host: Arc<dyn HostServices>) -> Self {
        Self {
            source: source.into(),
            options,
            host,
            evaluator: TemplateEvaluator::new(),
            compiled: None,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn set_source(&mut self, source: impl Into<String>) {
        self.source = source.into();
    }

    fn template(&mut self) -> Result<Template, TemplateError> {
        let prepared = uncomment_code_comments(&self.source);
        if let Some((cached, compiled)) = &self.compiled {
            if *cached == prepared {
                return compiled.clone();
            }
        }
        debug!("Compiling template ({} bytes)", prepared.len());
        let compiled = Template::compile(&prepared);
        self.compiled = Some((prepared, compiled.clone()));
        compiled
    }

    /// Render the template against `table` and bind the result. Never fails:
    /// errors come back inline in `text` and as `diagnostic`.
    pub fn render(&mut self, table: &Table) -> RenderedChart {
        let result = match self.template() {
            Ok(template) => {
                let context = RenderContext {
                    table,
                    viewport: self.options.viewport(),
                    host: Arc::clone(&self.host),
                    variables: &self.options.variables,
                };
                self.evaluator.render(&template, &context)
            }
            Err(e) => Err(Diagnostic::from(e)),
        };

        let (text, diagnostic) = match result {
            Ok(text) => (text, None),
            Err(diagnostic) => {
                error!("Template evaluation failed: {}", diagnostic);
                (diagnostic.to_inline(), Some(diagnostic))
            }
        };

        let mut chart = safe_parse(&text);
        bind(&mut chart, table);
        RenderedChart { text, chart, diagnostic }
    }

    /// Column references in the source that `table` cannot satisfy.
    pub fn verify(&self, table: &Table) -> Vec<UnresolvedReference> {
        mapping::verify(&self.source, table.columns())
    }

    /// Rewrite the source's column references through `mapping`; the rewritten
    /// text replaces the session source and is returned.
    pub fn apply(&mut self, mapping: &Mapping, table: &Table) -> &str {
        self.source = mapping::apply(&self.source, mapping, &table.dataset());
        &self.source
    }
}

/// Load a table from CSV or a JSON array of objects (by `.json` extension),
/// or CSV from stdin when no path is given.
pub fn load_table(path: Option<&Path>) -> Result<Table> {
    match path {
        None => csv_reader::read_csv_from_stdin().context("Failed to read CSV from stdin"),
        Some(path) if path.extension().is_some_and(|e| e.eq_ignore_ascii_case("json")) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let value: serde_json::Value = serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            Table::from_json(&value).with_context(|| format!("Invalid table in {}", path.display()))
        }
        Some(path) => csv_reader::read_csv_from_path(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table() -> Table {
        Table::from_json(&json!([
            { "Region": "North", "Sales": 10 },
            { "Region": "South", "Sales": 20 }
        ]))
        .unwrap()
    }

    #[test]
    fn test_render_binds_source_fields() {
        let source = r#"{ "options": { "xSrc": "Region" }, "series": [{ "dataSrc": "Sales" }] }"#;
        let mut session = ChartSession::new(source, RenderOptions::default());
        let rendered = session.render(&table());
        assert!(rendered.diagnostic.is_none());
        assert_eq!(rendered.chart["options"]["x"], json!(["North", "South"]));
        assert_eq!(rendered.chart["series"][0]["data"], json!([10, 20]));
    }

    #[test]
    fn test_render_uncomments_template_syntax() {
        let source = r#"{ "options": { /* HBT "w": {{viewport.width}}, */ "h": 1 } }"#;
        let mut session = ChartSession::new(source, RenderOptions::default());
        let rendered = session.render(&table());
        assert_eq!(rendered.chart["options"]["w"], json!(800));
    }

    #[test]
    fn test_compile_error_yields_inline_diagnostic() {
        let mut session = ChartSession::new("{{#if x}}", RenderOptions::default());
        let rendered = session.render(&table());
        assert!(rendered.text.starts_with("<h4>Parse error"));
        assert!(rendered.diagnostic.is_some());
        assert_eq!(rendered.chart, json!({ "options": {}, "series": [] }));
    }

    #[test]
    fn test_template_cache_follows_source() {
        let mut session = ChartSession::new(r#"{"options":{"n":{{lookup table.rows "length"}}}}"#, RenderOptions::default());
        assert_eq!(session.render(&table()).chart["options"]["n"], json!(2));
        session.set_source(r#"{"options":{"n":0}}"#);
        assert_eq!(session.render(&table()).chart["options"]["n"], json!(0));
    }

    #[test]
    fn test_verify_then_apply() {
        let source = r#"{ "options": { "encode": { "color": "Missing" } } }"#;
        let mut session = ChartSession::new(source, RenderOptions::default());
        let table = table();
        let unresolved = session.verify(&table);
        assert_eq!(unresolved, vec![UnresolvedReference::new("color", "Missing")]);

        let mut mapping = Mapping::new();
        mapping.insert("color".to_string(), "Region".to_string());
        session.apply(&mapping, &table);
        assert!(session.verify(&table).is_empty());
        let chart = safe_parse(session.source());
        assert_eq!(chart["options"]["encode"]["color"], json!("Region"));
        assert_eq!(chart["dataset"]["dimensions"], json!(["Region", "Sales"]));
    }
}
