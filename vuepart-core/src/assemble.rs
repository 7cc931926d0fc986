//! Built-in assembler emitting the normalize-component module shape

use crate::compiler::{AssembleInput, AssembleOptions, AssembledModule, Assembler, CompiledStyle};
use crate::component::{Component, ComponentKind, ComponentMetadata};
use std::fmt::Write as _;
use std::path::Path;

/// Default [`Assembler`]
///
/// Produces a module that hands the render functions, style injector,
/// script options and scope id to the runtime `normalizeComponent` helper
/// and exports its result.
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizeAssembler;

impl NormalizeAssembler {
    pub fn new() -> Self {
        Self
    }
}

impl Component for NormalizeAssembler {
    fn metadata(&self) -> ComponentMetadata {
        ComponentMetadata::new(
            "normalize-assembler",
            env!("CARGO_PKG_VERSION"),
            ComponentKind::Assembler,
            Some("Emits a normalize-component module"),
        )
    }
}

impl Assembler for NormalizeAssembler {
    fn assemble(
        &self,
        _filename: &Path,
        input: AssembleInput,
        options: &AssembleOptions,
    ) -> AssembledModule {
        let mut code = String::new();

        code.push_str(&helper("__vue_normalize__", &options.normalizer));
        let injector = if options.is_server {
            ("__vue_create_injector_ssr__", &options.style_injector_ssr)
        } else {
            ("__vue_create_injector__", &options.style_injector)
        };
        if !input.styles.is_empty() {
            code.push_str(&helper(injector.0, injector.1));
        }

        code.push_str("/* script */\n");
        code.push_str(&script_section(&input.script.code));

        code.push_str("/* template */\n");
        let has_template = match &input.template {
            Some(template) => {
                code.push_str(&template_section(&template.code));
                true
            }
            None => false,
        };

        code.push_str("/* style */\n");
        code.push_str(&style_section(&input.scope_id, &input.styles, options.is_production));

        let scoped = input.styles.iter().any(|style| style.scoped);
        let functional = input.template.as_ref().is_some_and(|t| t.functional);
        let _ = writeln!(code, "/* scoped */");
        let _ = writeln!(code, "const __vue_scope_id__ = {}", js_opt(scoped.then_some(&input.scope_id)));
        let _ = writeln!(code, "/* module identifier */");
        let _ = writeln!(
            code,
            "const __vue_module_identifier__ = {}",
            js_opt(options.is_server.then_some(&input.scope_id))
        );
        let _ = writeln!(code, "/* functional template */");
        let _ = writeln!(code, "const __vue_is_functional_template__ = {functional}");

        let template_arg = if has_template {
            "{ render: __vue_render__, staticRenderFns: __vue_staticRenderFns__ }"
        } else {
            "{}"
        };
        let (browser, ssr) = match (input.styles.is_empty(), options.is_server) {
            (true, _) => ("undefined", "undefined"),
            (false, false) => (injector.0, "undefined"),
            (false, true) => ("undefined", injector.0),
        };

        code.push_str("/* component normalizer */\n");
        let _ = writeln!(code, "const __vue_component__ = /*#__PURE__*/__vue_normalize__(");
        for arg in [
            template_arg,
            "__vue_inject_styles__",
            "__vue_script__",
            "__vue_scope_id__",
            "__vue_is_functional_template__",
            "__vue_module_identifier__",
            "false",
            browser,
            ssr,
        ] {
            let _ = writeln!(code, "  {arg},");
        }
        code.push_str("  undefined\n)\n\nexport default __vue_component__\n");

        AssembledModule {
            code,
            map: input.script.map,
        }
    }
}

/// Binding for a runtime helper: `~path` is imported, anything else is an inline expression
fn helper(binding: &str, module: &str) -> String {
    match module.strip_prefix('~') {
        Some(path) => format!("import {binding} from {}\n", js_str(path)),
        None => format!("const {binding} = {module}\n"),
    }
}

fn script_section(code: &str) -> String {
    let mut out = String::new();
    let mut replaced = false;
    for line in code.lines() {
        match line.trim_start().strip_prefix("export default ") {
            Some(expr) if !replaced => {
                let _ = writeln!(out, "const __vue_script__ = {expr}");
                replaced = true;
            }
            _ => {
                out.push_str(line);
                out.push('\n');
            }
        }
    }
    if !replaced {
        out.push_str("const __vue_script__ = {}\n");
    }
    out
}

fn template_section(code: &str) -> String {
    let mut out = String::new();
    for line in code.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("export {") && trimmed.contains("render") {
            continue;
        }
        let line = line
            .replace("var render =", "var __vue_render__ =")
            .replace("var staticRenderFns =", "var __vue_staticRenderFns__ =")
            .replace("render._withStripped", "__vue_render__._withStripped");
        out.push_str(&line);
        out.push('\n');
    }
    out
}

fn style_section(scope_id: &str, styles: &[CompiledStyle], production: bool) -> String {
    if styles.is_empty() {
        return "const __vue_inject_styles__ = undefined\n".to_string();
    }

    let mut out = String::from("const __vue_inject_styles__ = function (inject) {\n  if (!inject) return\n");
    for (index, style) in styles.iter().enumerate() {
        if !style.code.is_empty() {
            let map = match (&style.map, production) {
                (Some(map), false) => serde_json::to_string(map).unwrap_or_else(|_| "undefined".into()),
                _ => "undefined".to_string(),
            };
            let _ = writeln!(
                out,
                "  inject({}, {{ source: {}, map: {map}, media: {} }})",
                js_str(&format!("{scope_id}_{index}")),
                js_str(&style.code),
                js_opt(style.media.as_ref()),
            );
        }
        if let (Some(name), Some(modules)) = (&style.module_name, &style.modules) {
            let table = serde_json::to_string(modules).unwrap_or_else(|_| "{}".into());
            let _ = writeln!(
                out,
                "  Object.defineProperty(this, {}, {{ value: {table} }})",
                js_str(name)
            );
        }
    }
    out.push_str("}\n");
    out
}

fn js_str(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}

fn js_opt(value: Option<&String>) -> String {
    value.map_or_else(|| "undefined".to_string(), |v| js_str(v))
}
