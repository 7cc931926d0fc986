//! Component trait definitions
//!
//! Every external collaborator the pipeline delegates to (parser, template
//! compiler, style compiler, assembler) implements [`Component`] so that
//! logs and errors can name the implementation that was in charge.

use std::fmt;

/// The kind of component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    /// Parser: splits a composite file into a descriptor
    Parser,
    /// TemplateCompiler: turns markup into render code
    TemplateCompiler,
    /// StyleCompiler: compiles and scopes a style block
    StyleCompiler,
    /// Assembler: stitches compiled pieces into one module
    Assembler,
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentKind::Parser => write!(f, "parser"),
            ComponentKind::TemplateCompiler => write!(f, "template_compiler"),
            ComponentKind::StyleCompiler => write!(f, "style_compiler"),
            ComponentKind::Assembler => write!(f, "assembler"),
        }
    }
}

/// Metadata about a component
#[derive(Debug, Clone)]
pub struct ComponentMetadata {
    /// The component name (unique identifier)
    pub name: &'static str,
    /// The component version
    pub version: &'static str,
    /// The kind of component
    pub kind: ComponentKind,
    /// Optional description
    pub description: Option<&'static str>,
}

impl ComponentMetadata {
    /// Create new metadata
    pub fn new(
        name: &'static str,
        version: &'static str,
        kind: ComponentKind,
        description: Option<&'static str>,
    ) -> Self {
        Self {
            name,
            version,
            kind,
            description,
        }
    }
}

/// The base trait for all collaborators
pub trait Component: Send + Sync {
    /// Get the component metadata
    fn metadata(&self) -> ComponentMetadata;
}

/// Helper methods for components
pub trait ComponentExt: Component {
    /// Check if this component is of the given kind
    fn is_kind(&self, kind: ComponentKind) -> bool {
        self.metadata().kind == kind
    }

    /// Get the component name
    fn name(&self) -> &'static str {
        self.metadata().name
    }
}

impl<T: Component + ?Sized> ComponentExt for T {}
