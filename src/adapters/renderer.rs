use rust_embed::RustEmbed;
use tera::{Context, Tera};

use crate::domain::{BlockError, BlockResult, TemplateRenderer};

#[derive(RustEmbed)]
#[folder = "templates"]
struct Templates;

/// Tera-backed renderer loaded with the templates embedded in the binary.
///
/// Templates ending in `.html` are autoescaped; markup produced by nested
/// blocks is passed through with the `safe` filter.
pub struct TeraRenderer {
    tera: Tera,
}

impl TeraRenderer {
    pub fn new() -> BlockResult<Self> {
        let mut templates = Vec::new();
        for name in Templates::iter() {
            let file = Templates::get(&name)
                .ok_or_else(|| BlockError::Render(format!("Template {} disappeared", name)))?;
            let source = String::from_utf8(file.data.into_owned())
                .map_err(|e| BlockError::Render(format!("Template {} is not UTF-8: {}", name, e)))?;
            templates.push((name.to_string(), source));
        }

        let mut tera = Tera::default();
        tera.add_raw_templates(templates)?;
        tracing::debug!("Loaded {} embedded templates", tera.get_template_names().count());

        Ok(Self { tera })
    }

    /// Use an already configured Tera instance, e.g. one with overridden templates
    pub fn with_tera(tera: Tera) -> Self {
        Self { tera }
    }
}

impl TemplateRenderer for TeraRenderer {
    fn render(&self, template: &str, context: &Context) -> BlockResult<String> {
        self.tera.render(template, context).map_err(BlockError::from)
    }
}
