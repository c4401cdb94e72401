use std::path::Path;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod validator;

use crate::adapters::any_block::AnyBlock;
use crate::adapters::block_registry::BlockRegistry;
use crate::adapters::field_block::{CharBlock, IntegerBlock};
use crate::adapters::list_block::{ListBlock, ListBlockOptions};
use crate::cli::Cli;
use crate::domain::{Block, BlockError, BlockResult};

#[derive(Debug, Deserialize, Serialize)]
pub struct Settings {
    pub server: ServerSettings,
    /// Block definitions served by the form endpoints
    #[serde(default)]
    pub blocks: Vec<BlockDefinition>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// A named block definition
///
/// ```toml
/// [[blocks]]
/// name = "tags"
/// kind = "list"
/// min_length = 1
/// child = { kind = "char", max_length = 40 }
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BlockDefinition {
    pub name: String,
    #[serde(flatten)]
    pub spec: BlockSpec,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BlockSpec {
    Char {
        #[serde(default = "default_required")]
        required: bool,
        min_length: Option<usize>,
        max_length: Option<usize>,
        default: Option<String>,
        label: Option<String>,
        help_text: Option<String>,
    },
    Integer {
        #[serde(default = "default_required")]
        required: bool,
        min_value: Option<i64>,
        max_value: Option<i64>,
        default: Option<i64>,
        label: Option<String>,
        help_text: Option<String>,
    },
    List {
        child: Box<BlockSpec>,
        min_length: Option<usize>,
        max_length: Option<usize>,
        /// Raw (stored) form of the starting list
        default: Option<Value>,
        label: Option<String>,
        help_text: Option<String>,
    },
}

fn default_required() -> bool {
    true
}

impl BlockSpec {
    /// Build the block this spec describes
    pub fn build(&self) -> BlockResult<AnyBlock> {
        match self {
            BlockSpec::Char {
                required,
                min_length,
                max_length,
                default,
                label,
                help_text,
            } => {
                let mut block = CharBlock::new().required(*required);
                if let Some(min) = min_length {
                    block = block.min_length(*min);
                }
                if let Some(max) = max_length {
                    block = block.max_length(*max);
                }
                if let Some(default) = default {
                    block = block.default_value(default.clone());
                }
                if let Some(label) = label {
                    block = block.label(label.clone());
                }
                if let Some(help_text) = help_text {
                    block = block.help_text(help_text.clone());
                }
                Ok(block.into())
            }
            BlockSpec::Integer {
                required,
                min_value,
                max_value,
                default,
                label,
                help_text,
            } => {
                let mut block = IntegerBlock::new().required(*required);
                if let Some(min) = min_value {
                    block = block.min_value(*min);
                }
                if let Some(max) = max_value {
                    block = block.max_value(*max);
                }
                if let Some(default) = default {
                    block = block.default_value(*default);
                }
                if let Some(label) = label {
                    block = block.label(label.clone());
                }
                if let Some(help_text) = help_text {
                    block = block.help_text(help_text.clone());
                }
                Ok(block.into())
            }
            BlockSpec::List {
                child,
                min_length,
                max_length,
                default,
                label,
                help_text,
            } => {
                let child = child.build()?;
                let default = match default {
                    Some(raw) => {
                        let items = raw.as_array().ok_or_else(|| {
                            BlockError::Conversion(format!("list default must be a list, got {}", raw))
                        })?;
                        Some(
                            items
                                .iter()
                                .map(|item| child.to_native(item))
                                .collect::<BlockResult<Vec<_>>>()?,
                        )
                    }
                    None => None,
                };
                let options = ListBlockOptions {
                    min_length: *min_length,
                    max_length: *max_length,
                    default,
                    label: label.clone(),
                    help_text: help_text.clone(),
                };
                Ok(ListBlock::with_options(child, options).into())
            }
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, anyhow::Error> {
        Self::from_root(".")
    }

    /// Create settings from CLI arguments (config file, environment, then CLI overrides)
    pub fn new_with_cli(cli: &Cli) -> Result<Self, anyhow::Error> {
        let mut settings = Self::load(&cli.config)?;
        settings.apply_cli_overrides(cli);
        settings.validate()?;
        Ok(settings)
    }

    /// Load `blockform.toml` (or any supported format) from `root`
    pub fn from_root(root: &str) -> Result<Self, anyhow::Error> {
        let settings = Self::load(&Path::new(root).join("blockform"))?;
        settings.validate()?;
        Ok(settings)
    }

    fn load(config_path: &Path) -> Result<Self, anyhow::Error> {
        let s = Config::builder()
            .add_source(File::from(config_path).required(false))
            .add_source(
                Environment::with_prefix("BLOCKFORM")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .build()?;

        Ok(s.try_deserialize()?)
    }

    fn apply_cli_overrides(&mut self, cli: &Cli) {
        if let Some(host) = &cli.host {
            self.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            self.server.port = port;
        }
    }

    fn validate(&self) -> Result<(), anyhow::Error> {
        validator::ConfigValidator::validate(self).map_err(|errors| {
            let error_messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            anyhow::anyhow!(
                "Configuration validation failed:\n{}",
                error_messages.join("\n")
            )
        })
    }

    /// Build every configured block into a registry
    pub fn build_registry(&self) -> Result<BlockRegistry, anyhow::Error> {
        let mut registry = BlockRegistry::new();
        for definition in &self.blocks {
            let block = definition.spec.build().map_err(|e| {
                anyhow::anyhow!("Failed to build block '{}': {}", definition.name, e)
            })?;
            registry.register(definition.name.clone(), block);
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::any_block::AnyValue;

    fn parse(toml_src: &str) -> BlockSpec {
        let definition: BlockDefinition = toml::from_str(toml_src).unwrap();
        definition.spec
    }

    #[test]
    fn test_parse_nested_list_spec() {
        let spec = parse(
            r#"
name = "matrix"
kind = "list"
max_length = 3
child = { kind = "list", child = { kind = "integer", min_value = 0 } }
"#,
        );

        let BlockSpec::List { child, max_length, .. } = &spec else {
            panic!("expected a list spec");
        };
        assert_eq!(*max_length, Some(3));
        assert!(matches!(**child, BlockSpec::List { .. }));
    }

    #[test]
    fn test_build_list_with_raw_default() {
        let spec = parse(
            r#"
name = "tags"
kind = "list"
default = ["a", "b"]
child = { kind = "char" }
"#,
        );

        let block = spec.build().unwrap();
        assert_eq!(
            block.get_default(),
            AnyValue::List(vec![
                AnyValue::Text("a".to_string()),
                AnyValue::Text("b".to_string())
            ])
        );
    }

    #[test]
    fn test_build_list_rejects_non_list_default() {
        let spec = parse(
            r#"
name = "tags"
kind = "list"
default = "a"
child = { kind = "char" }
"#,
        );
        assert!(matches!(spec.build(), Err(BlockError::Conversion(_))));
    }

    #[test]
    fn test_char_required_defaults_to_true() {
        let spec = parse("name = \"t\"\nkind = \"char\"\n");
        assert!(matches!(spec, BlockSpec::Char { required: true, .. }));
    }
}
