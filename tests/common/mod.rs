//! Test helpers
//!
//! Stand-in compilers and a ready-made plugin for end-to-end tests.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use vuepart::core::{
    Block, BuildEnv, Collaborators, CompiledStyle, CompiledTemplate, Component, ComponentKind,
    ComponentMetadata, PluginOptions, StyleCompiler, TemplateCompileOptions, TemplateCompiler,
    VuePlugin,
};
use vuepart::vfs::MemoryFileSystem;

/// Emits a render function that references the template's assets with `require`
pub struct RequireTemplate;

impl Component for RequireTemplate {
    fn metadata(&self) -> ComponentMetadata {
        ComponentMetadata::new("require-template", "0.0.0", ComponentKind::TemplateCompiler, None)
    }
}

impl TemplateCompiler for RequireTemplate {
    fn compile_template(
        &self,
        _filename: &Path,
        template: &Block,
        _options: &TemplateCompileOptions,
    ) -> CompiledTemplate {
        let assets: Vec<String> = template
            .content
            .split('"')
            .filter(|part| part.ends_with(".png"))
            .map(|asset| format!("require(\"{asset}\")"))
            .collect();
        CompiledTemplate {
            code: format!(
                "var render = function () {{ return [{}] }}\nvar staticRenderFns = []",
                assets.join(", ")
            ),
            ..CompiledTemplate::default()
        }
    }
}

/// Tags each style with the scope id and counts compilations
#[derive(Default)]
pub struct TaggingStyles {
    pub calls: AtomicUsize,
}

impl TaggingStyles {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Component for TaggingStyles {
    fn metadata(&self) -> ComponentMetadata {
        ComponentMetadata::new("tagging-styles", "0.0.0", ComponentKind::StyleCompiler, None)
    }
}

impl StyleCompiler for TaggingStyles {
    fn compile_style(&self, _filename: &Path, scope_id: &str, style: &Block) -> CompiledStyle {
        self.calls.fetch_add(1, Ordering::SeqCst);
        CompiledStyle {
            scoped: style.scoped,
            ..CompiledStyle::new(format!("/*{scope_id}*/{}", style.content.trim()))
        }
    }
}

/// Plugin in a development browser build rooted at `/project`
pub fn plugin(options: PluginOptions, styles: Arc<TaggingStyles>) -> VuePlugin {
    let options = options.with_build(BuildEnv::default());
    VuePlugin::new(options, Collaborators::new(Arc::new(RequireTemplate), styles))
        .expect("plugin options are valid")
        .with_cwd("/project")
        .with_vfs(Arc::new(MemoryFileSystem::new()))
}

/// Component with a template, a script and two styles, one of them scoped
pub const APP: &str = r#"<template>
  <div><img src="../assets/logo.png"><img src="../assets/logo.png"></div>
</template>

<script>
export default { name: 'App' }
</script>

<style>
.plain { color: red }
</style>

<style scoped>
.scoped { color: blue }
</style>

<docs lang="md">
# App
</docs>
"#;
