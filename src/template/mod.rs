// Template compiler and evaluator on top of handlebars
//
// Every render starts from a reset helper registry, so scale, axis and
// variable ids from an earlier render never leak into the next one.

pub mod check;
pub mod error;
pub mod helper;

pub use error::{Diagnostic, Position, TemplateError};

use crate::data::{number_to_json, Table};
use crate::helpers::Helper;
use crate::host::HostServices;
use handlebars::Handlebars;
use helper::{BoundHelper, SharedState};
use indexmap::IndexMap;
use log::debug;
use serde_json::{json, Value as Json};
use std::sync::Arc;

const TEMPLATE_NAME: &str = "chart";

/// A compiled template, reusable across renders.
#[derive(Debug, Clone)]
pub struct Template {
    compiled: handlebars::template::Template,
}

impl Template {
    /// Parse `source` and check every helper call it makes.
    pub fn compile(source: &str) -> Result<Self, TemplateError> {
        let compiled = handlebars::template::Template::compile(source)?;
        check::check_template(&compiled)?;
        Ok(Self { compiled })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { width: 800.0, height: 600.0 }
    }
}

/// What a template can see while rendering.
pub struct RenderContext<'a> {
    pub table: &'a Table,
    pub viewport: Viewport,
    pub host: Arc<dyn HostServices>,
    /// Extra top-level names; `table`, `dataset` and `viewport` take precedence.
    pub variables: &'a IndexMap<String, Json>,
}

impl RenderContext<'_> {
    fn root(&self) -> Json {
        let mut root: serde_json::Map<String, Json> =
            self.variables.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        root.insert("table".to_string(), self.table.to_json());
        root.insert("dataset".to_string(), self.table.dataset().to_json());
        root.insert(
            "viewport".to_string(),
            json!({
                "width": number_to_json(self.viewport.width),
                "height": number_to_json(self.viewport.height),
            }),
        );
        Json::Object(root)
    }
}

/// Renders compiled templates with every helper bound to one shared registry.
pub struct TemplateEvaluator {
    handlebars: Handlebars<'static>,
    state: SharedState,
}

impl Default for TemplateEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEvaluator {
    pub fn new() -> Self {
        let state = SharedState::default();
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        for helper in Helper::all() {
            handlebars.register_helper(helper.name(), Box::new(BoundHelper::new(helper, state.clone())));
        }
        Self { handlebars, state }
    }

    /// Render `template`. Failures come back as a [`Diagnostic`] rather than text;
    /// use [`Diagnostic::to_inline`] where a string is required.
    pub fn render(&mut self, template: &Template, context: &RenderContext<'_>) -> Result<String, Diagnostic> {
        {
            let mut state = self.state.lock();
            state.registry.reset();
            state.table = context.table.clone();
            state.host = Arc::clone(&context.host);
        }
        debug!("Rendering template against {} rows", context.table.rows().len());
        self.handlebars.register_template(TEMPLATE_NAME, template.compiled.clone());
        Ok(self.handlebars.render(TEMPLATE_NAME, &context.root())?)
    }

    /// Compile and render in one step; compile errors become diagnostics too.
    pub fn render_source(&mut self, source: &str, context: &RenderContext<'_>) -> Result<String, Diagnostic> {
        let template = Template::compile(source)?;
        self.render(&template, context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::DefaultPalette;

    fn table() -> Table {
        Table::from_json(&json!([
            { "Region": "North", "Sales": 10 },
            { "Region": "South", "Sales": 20 },
            { "Region": "East", "Sales": 5 }
        ]))
        .unwrap()
    }

    fn render_with(source: &str, table: &Table, variables: &IndexMap<String, Json>) -> Result<String, Diagnostic> {
        let host = Arc::new(DefaultPalette::new(vec!["red".into(), "green".into()]));
        let context = RenderContext { table, viewport: Viewport::default(), host, variables };
        TemplateEvaluator::new().render_source(source, &context)
    }

    fn render(source: &str) -> String {
        render_with(source, &table(), &IndexMap::new()).unwrap()
    }

    #[test]
    fn test_context_fields() {
        assert_eq!(render("{{viewport.width}}x{{viewport.height}}"), "800x600");
        assert_eq!(render(r#"{{lookup table.rows "length"}} {{table.columns.[1].displayName}}"#), "3 Sales");
        assert_eq!(render("{{lookup dataset.dimensions 1}}"), "Sales");
    }

    #[test]
    fn test_each_with_data_variables() {
        let out = render("{{#each table.rows}}{{@index}}:{{Region}}{{#unless @last}},{{/unless}}{{/each}}");
        assert_eq!(out, "0:North,1:South,2:East");
    }

    #[test]
    fn test_each_over_object_and_parent_path() {
        let out = render("{{#with table}}{{#each rows.[0]}}{{@key}}={{this}};{{/each}}{{../viewport.width}}{{/with}}");
        assert_eq!(out, "Region=North;Sales=10;selection=row:0;800");
    }

    #[test]
    fn test_each_else_on_empty() {
        let out = render_with("{{#each table.rows}}x{{else}}empty{{/each}}", &Table::empty(), &IndexMap::new()).unwrap();
        assert_eq!(out, "empty");
    }

    #[test]
    fn test_if_else_chain() {
        let mut variables = IndexMap::new();
        variables.insert("mode".to_string(), json!(0));
        variables.insert("other".to_string(), json!("yes"));
        let out = render_with("{{#if mode}}A{{else if other}}B{{else}}C{{/if}}", &table(), &variables).unwrap();
        assert_eq!(out, "B");
    }

    #[test]
    fn test_escaping() {
        let mut variables = IndexMap::new();
        variables.insert("label".to_string(), json!("<b>\"A&B\"</b>"));
        let out = render_with("{{label}}|{{{label}}}", &table(), &variables).unwrap();
        assert_eq!(out, "&lt;b&gt;&quot;A&amp;B&quot;&lt;/b&gt;|<b>\"A&B\"</b>");
    }

    #[test]
    fn test_scales_and_formatting() {
        let source = r#"{{scaleLinear "y" (array 0 20) (array 0 100)}}{{#each table.rows}}{{format (useScale "y" Sales) ".1f"}} {{/each}}"#;
        assert_eq!(render(source), "50.0 100.0 25.0 ");
    }

    #[test]
    fn test_scale_band_positions() {
        let source = r#"{{scaleBand "x" (map table.rows "Region") (array 0 300)}}{{useScale "x" "South"}}/{{getScale "x" "bandwidth"}}"#;
        assert_eq!(render(source), "100/100");
    }

    #[test]
    fn test_variables() {
        assert_eq!(render(r#"{{var "w" (multiply viewport.width 0.5)}}{{val "w"}}"#), "400");
    }

    #[test]
    fn test_undefined_helper_result_renders_empty() {
        assert_eq!(render(r#"[{{val "nothing"}}]"#), "[]");
        assert_eq!(render(r#"{{format (val "nothing") ".1f"}}"#), "Value is not number");
    }

    #[test]
    fn test_registry_reset_between_renders() {
        let table = table();
        let variables = IndexMap::new();
        let host: Arc<dyn HostServices> = Arc::new(DefaultPalette::default());
        let context = RenderContext { table: &table, viewport: Viewport::default(), host, variables: &variables };
        let template = Template::compile(r#"{{scaleLinear "s1" (array 0 1) (array 0 1)}}{{useScale "s1" 1}}"#).unwrap();
        let mut evaluator = TemplateEvaluator::new();
        assert_eq!(evaluator.render(&template, &context).unwrap(), "1");
        assert_eq!(evaluator.render(&template, &context).unwrap(), "1");
        assert!(evaluator.state.lock().registry.scale("s1").is_some());
    }

    #[test]
    fn test_redeclared_within_one_render() {
        let source = r#"{{scaleLinear "s1"}}{{scaleLinear "s1"}}"#;
        assert_eq!(render(source), "Scale redeclared");
    }

    #[test]
    fn test_dataset_and_host_helpers() {
        assert_eq!(render(r#"{{{column "Region"}}}"#), r#"["North","South","East"]"#);
        assert_eq!(render(r#"{{useColor "North"}} {{useColor "South"}} {{useColor "North"}}"#), "red green red");
        assert_eq!(render("{{{useSelection 2}}}|{{useSelection 3}}|"), r#"data-selection=true data-index="2"||"#);
    }

    #[test]
    fn test_unknown_helper_becomes_diagnostic() {
        let diagnostic = render_with("{{nope 1}}", &table(), &IndexMap::new()).unwrap_err();
        assert!(diagnostic.message.contains("Missing helper: \"nope\""));
        assert!(diagnostic.to_inline().starts_with("<h4>Missing helper"));
    }

    #[test]
    fn test_malformed_template_becomes_diagnostic() {
        let diagnostic = render_with("{{#if x}}open", &table(), &IndexMap::new()).unwrap_err();
        assert!(diagnostic.message.starts_with("Parse error on line"));
        assert!(diagnostic.trace.starts_with("    at compile (line"));
    }

    #[test]
    fn test_helper_failure_carries_position() {
        let source = "{{#each table.rows}}\n  {{min Region}}\n{{/each}}";
        let diagnostic = render_with(source, &table(), &IndexMap::new()).unwrap_err();
        assert_eq!(diagnostic.message, "min expects an array, got string");
        assert!(diagnostic.trace.starts_with("    at line "));
    }

    #[test]
    fn test_oversized_tick_count_becomes_diagnostic() {
        let source = r#"{{scaleLinear "y" (array 0 1) (array 0 1)}}{{getScale "y" "ticks" 10000000}}"#;
        let diagnostic = render_with(source, &table(), &IndexMap::new()).unwrap_err();
        assert!(diagnostic.message.starts_with("Invalid tick count"));

        let source = r#"{{scaleLinear "y" (array 0 1) (array 0 1)}}{{axisLeft "a" "y"}}{{setupAxis "a" "ticks" 10000000}}{{{useAxis "a"}}}"#;
        let diagnostic = render_with(source, &table(), &IndexMap::new()).unwrap_err();
        assert!(diagnostic.message.starts_with("Invalid tick count"));
    }

    #[test]
    fn test_renders_json_document() {
        let source = r#"{ "series": [{{#each table.rows}}{ "name": "{{Region}}", "value": {{Sales}} }{{#unless @last}},{{/unless}}{{/each}}] }"#;
        let value: Json = serde_json::from_str(&render(source)).unwrap();
        assert_eq!(value["series"][1], json!({ "name": "South", "value": 20 }));
    }
}
