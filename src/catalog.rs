//! Tool-catalogue boundary: named script fragments with typed parameters.
//!
//! A catalogue describes each tool once: metadata for the AI client, a
//! JSON schema for its parameters, and an ExtendScript fragment with
//! `{{param}}` placeholders. This module turns a tool call into a complete
//! script: placeholders filled, string values escaped exactly once at
//! interpolation time, helper library prepended.

use indexmap::IndexMap;
use schemars::schema_for;
use serde::Serialize;
use serde_json::Value;

use crate::error::BridgeError;
use crate::sanitize;
use crate::template;

/// One tool exposed to the AI client: metadata, parameter schema, and the
/// fragment its calls render into.
#[derive(Debug, Clone, Serialize)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub param_schema: Value,
    /// Fragment with `{{param}}` placeholders, used as the script body.
    pub fragment: &'static str,
}

pub fn empty_object_schema() -> Value {
    serde_json::json!({ "type": "object", "properties": {} })
}

pub fn schema_value<T: schemars::JsonSchema>() -> Value {
    let root = schema_for!(T);
    serde_json::to_value(root).unwrap_or(empty_object_schema())
}

/// Substitute `{{param}}` placeholders from a JSON argument object.
///
/// String values are escaped for string-literal embedding here and only
/// here; the fragment author writes `"{{name}}"` and never escapes by
/// hand. Numbers, booleans, and null are inlined literally; arrays and
/// objects are inlined as JSON, which the engine reads as literals.
pub fn render_fragment(fragment: &str, args: &Value) -> Result<String, BridgeError> {
    let mut out = String::with_capacity(fragment.len());
    let mut rest = fragment;
    loop {
        match rest.split_once("{{") {
            None => {
                out.push_str(rest);
                return Ok(out);
            }
            Some((head, tail)) => {
                out.push_str(head);
                let Some((key, after)) = tail.split_once("}}") else {
                    return Err(BridgeError::Validation {
                        message: "Unclosed {{placeholder}} in tool fragment".to_string(),
                    });
                };
                let key = key.trim();
                let value = args.get(key).ok_or_else(|| BridgeError::Validation {
                    message: format!("Missing parameter \"{key}\" for tool fragment"),
                })?;
                out.push_str(&render_value(value)?);
                rest = after;
            }
        }
    }
}

fn render_value(value: &Value) -> Result<String, BridgeError> {
    Ok(match value {
        Value::String(s) => sanitize::escape_string(s),
        other => serde_json::to_string(other)?,
    })
}

/// Ordered collection of tool specs. Insertion order is preserved so the
/// client sees tools in the order the catalogue author chose.
#[derive(Default)]
pub struct ToolCatalog {
    tools: IndexMap<&'static str, ToolSpec>,
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalogue seeded with the built-in tools every deployment gets.
    pub fn with_builtins() -> Self {
        let mut catalog = Self::new();
        catalog.register(health_check_tool());
        catalog.register(find_clip_tool());
        catalog.register(find_project_item_tool());
        catalog
    }

    /// Register a tool. Re-registering a name replaces the entry in place.
    pub fn register(&mut self, spec: ToolSpec) {
        self.tools.insert(spec.name, spec);
    }

    pub fn get(&self, name: &str) -> Option<&ToolSpec> {
        self.tools.get(name)
    }

    pub fn specs(&self) -> impl Iterator<Item = &ToolSpec> {
        self.tools.values()
    }

    /// Render a tool call into a complete script. The result is meant for
    /// unchecked submission: every string argument was escaped during
    /// rendering, and the deny-list would reject nothing a fragment author
    /// wrote on purpose.
    pub fn build_script(&self, name: &str, args: &Value) -> Result<String, BridgeError> {
        let spec = self.get(name).ok_or_else(|| BridgeError::Validation {
            message: format!("Unknown tool \"{name}\""),
        })?;
        let body = render_fragment(spec.fragment, args)?;
        Ok(template::build(&body))
    }

    /// Tool list in the JSON shape tool-calling clients consume.
    pub fn to_json_schema(&self) -> Value {
        Value::Array(
            self.tools
                .values()
                .map(|spec| {
                    serde_json::json!({
                        "name": spec.name,
                        "description": spec.description,
                        "inputSchema": spec.param_schema,
                    })
                })
                .collect(),
        )
    }
}

// ── Built-in tools ───────────────────────────────────────────────

/// Parameters for the built-in clip lookup tool.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct FindClipParams {
    /// Node id of the clip, or of its project item.
    pub clip_id: String,
}

/// Parameters for the built-in project item lookup tool.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct FindProjectItemParams {
    /// Name or node id, searched from the project root.
    pub name: String,
}

pub fn health_check_tool() -> ToolSpec {
    ToolSpec {
        name: "bridge_health_check",
        description: "Verify the panel executor is alive and answering.",
        param_schema: empty_object_schema(),
        fragment: r#"    return bridgeSuccess("pong");"#,
    }
}

pub fn find_clip_tool() -> ToolSpec {
    ToolSpec {
        name: "find_clip",
        description: "Look up a clip in the active sequence by node id and report its name and timing in seconds.",
        param_schema: schema_value::<FindClipParams>(),
        fragment: r#"    var clip = findClipById(app.project.activeSequence, "{{clip_id}}");
    if (!clip) {
        return bridgeError("No clip with id {{clip_id}} in the active sequence");
    }
    return bridgeSuccess({
        name: clip.name,
        start: ticksToSeconds(clip.start.ticks),
        end: ticksToSeconds(clip.end.ticks)
    });"#,
    }
}

pub fn find_project_item_tool() -> ToolSpec {
    ToolSpec {
        name: "find_project_item",
        description: "Find a project item by name or node id and report its identity and media path.",
        param_schema: schema_value::<FindProjectItemParams>(),
        fragment: r#"    var item = findProjectItem(app.project.rootItem, "{{name}}");
    if (!item) {
        return bridgeError("No project item named {{name}}");
    }
    return bridgeSuccess({
        name: item.name,
        nodeId: item.nodeId,
        mediaPath: item.getMediaPath ? item.getMediaPath() : null
    });"#,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_escapes_strings_exactly_once() {
        let rendered = render_fragment(
            r#"var n = "{{name}}";"#,
            &json!({"name": r#"say "hi""#}),
        )
        .unwrap();
        assert_eq!(rendered, r#"var n = "say \"hi\"";"#);

        let rendered = render_fragment(
            r#"var n = "{{name}}";"#,
            &json!({"name": "line1\nline2"}),
        )
        .unwrap();
        assert_eq!(rendered, r#"var n = "line1\nline2";"#);
    }

    #[test]
    fn test_render_inlines_non_string_values() {
        let rendered = render_fragment(
            "move({{x}}, {{flag}}, {{list}});",
            &json!({"x": 2.5, "flag": true, "list": [1, 2]}),
        )
        .unwrap();
        assert_eq!(rendered, "move(2.5, true, [1,2]);");
    }

    #[test]
    fn test_render_trims_placeholder_whitespace() {
        let rendered =
            render_fragment("seek({{ seconds }});", &json!({"seconds": 12})).unwrap();
        assert_eq!(rendered, "seek(12);");
    }

    #[test]
    fn test_render_missing_param_names_the_key() {
        let err = render_fragment("seek({{seconds}});", &json!({})).unwrap_err();
        assert!(err.to_string().contains("seconds"));
    }

    #[test]
    fn test_render_unclosed_placeholder_is_error() {
        let err = render_fragment("seek({{seconds);", &json!({"seconds": 1})).unwrap_err();
        assert!(err.to_string().contains("Unclosed"));
    }

    #[test]
    fn test_build_script_substitutes_and_wraps() {
        let catalog = ToolCatalog::with_builtins();
        let script = catalog
            .build_script("find_clip", &json!({"clip_id": "0.1.2"}))
            .unwrap();
        assert!(script.contains(template::HELPER_SENTINEL));
        assert!(script.contains(r#"findClipById(app.project.activeSequence, "0.1.2")"#));
        // The rendered script also clears the size screen.
        assert!(sanitize::check_size(&script).is_ok());
    }

    #[test]
    fn test_build_script_unknown_tool_is_error() {
        let catalog = ToolCatalog::with_builtins();
        let err = catalog.build_script("no_such_tool", &json!({})).unwrap_err();
        assert!(err.to_string().contains("no_such_tool"));
    }

    #[test]
    fn test_builtin_schemas_expose_parameters() {
        let catalog = ToolCatalog::with_builtins();
        let spec = catalog.get("find_clip").unwrap();
        assert!(spec.param_schema["properties"]["clip_id"].is_object());

        let spec = catalog.get("bridge_health_check").unwrap();
        assert_eq!(spec.param_schema["properties"], json!({}));
    }

    #[test]
    fn test_catalog_preserves_insertion_order() {
        let mut catalog = ToolCatalog::with_builtins();
        catalog.register(ToolSpec {
            name: "custom_last",
            description: "Registered after the built-ins.",
            param_schema: empty_object_schema(),
            fragment: "    return bridgeSuccess(null);",
        });

        let names: Vec<&str> = catalog.specs().map(|s| s.name).collect();
        assert_eq!(
            names,
            vec![
                "bridge_health_check",
                "find_clip",
                "find_project_item",
                "custom_last"
            ]
        );

        let dump = catalog.to_json_schema();
        assert_eq!(dump[0]["name"], "bridge_health_check");
        assert_eq!(dump[3]["name"], "custom_last");
        assert!(dump[1]["inputSchema"]["properties"]["clip_id"].is_object());
    }

    #[test]
    fn test_register_replaces_by_name_in_place() {
        let mut catalog = ToolCatalog::with_builtins();
        catalog.register(ToolSpec {
            name: "find_clip",
            description: "Replacement spec.",
            param_schema: empty_object_schema(),
            fragment: "    return bridgeSuccess(null);",
        });

        assert_eq!(catalog.specs().count(), 3);
        assert_eq!(catalog.get("find_clip").unwrap().description, "Replacement spec.");
        let names: Vec<&str> = catalog.specs().map(|s| s.name).collect();
        assert_eq!(names[1], "find_clip");
    }
}
