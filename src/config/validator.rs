use std::collections::HashMap;
use thiserror::Error;

use crate::config::{BlockDefinition, Settings};
use crate::domain::{Block, ConfigIssue};

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Duplicate entry: {0}")]
    Duplicate(String),

    #[error("Block '{block}': {issue}")]
    BlockIssue { block: String, issue: ConfigIssue },
}

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(settings: &Settings) -> Result<(), Vec<SettingsError>> {
        let mut errors = Vec::new();

        // Validate server settings
        if let Err(e) = Self::validate_server(&settings.server) {
            errors.extend(e);
        }

        // Validate block definitions
        if let Err(e) = Self::validate_blocks(&settings.blocks) {
            errors.extend(e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_server(server: &crate::config::ServerSettings) -> Result<(), Vec<SettingsError>> {
        let mut errors = Vec::new();

        if server.host.is_empty() {
            errors.push(SettingsError::MissingField("server.host".to_string()));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_blocks(blocks: &[BlockDefinition]) -> Result<(), Vec<SettingsError>> {
        let mut errors = Vec::new();
        let mut seen_names = HashMap::new();

        for (idx, definition) in blocks.iter().enumerate() {
            // Check for duplicate names
            if let Some(prev_idx) = seen_names.insert(&definition.name, idx) {
                errors.push(SettingsError::Duplicate(format!(
                    "Block name '{}' appears at indices {} and {}",
                    definition.name, prev_idx, idx
                )));
            }

            if definition.name.is_empty() {
                errors.push(SettingsError::MissingField(format!("blocks[{}].name", idx)));
            } else if !Self::is_valid_prefix(&definition.name) {
                errors.push(SettingsError::InvalidValue {
                    field: format!("blocks[{}].name", idx),
                    reason: "Block names are used as form prefixes and may only contain \
                             ASCII letters, digits and underscores, starting with a letter"
                        .to_string(),
                });
            }

            // Building the block surfaces bad defaults; check() covers the rest
            match definition.spec.build() {
                Ok(block) => {
                    for issue in block.check() {
                        tracing::warn!("Block '{}' is misconfigured: {}", definition.name, issue);
                        errors.push(SettingsError::BlockIssue {
                            block: definition.name.clone(),
                            issue,
                        });
                    }
                }
                Err(e) => errors.push(SettingsError::InvalidValue {
                    field: format!("blocks[{}]", idx),
                    reason: e.to_string(),
                }),
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Field names nest as `{prefix}-{slot}-value`, so a prefix must not
    /// itself contain `-` or start with a digit.
    fn is_valid_prefix(name: &str) -> bool {
        let mut chars = name.chars();
        matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BlockSpec, ServerSettings, Settings};

    fn char_spec() -> BlockSpec {
        BlockSpec::Char {
            required: true,
            min_length: None,
            max_length: None,
            default: None,
            label: None,
            help_text: None,
        }
    }

    fn list_spec(min_length: Option<usize>, max_length: Option<usize>) -> BlockSpec {
        BlockSpec::List {
            child: Box::new(char_spec()),
            min_length,
            max_length,
            default: None,
            label: None,
            help_text: None,
        }
    }

    fn settings(blocks: Vec<BlockDefinition>) -> Settings {
        Settings {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            blocks,
        }
    }

    fn definition(name: &str, spec: BlockSpec) -> BlockDefinition {
        BlockDefinition {
            name: name.to_string(),
            spec,
        }
    }

    #[test]
    fn test_valid_config() {
        let settings = settings(vec![
            definition("title", char_spec()),
            definition("tags", list_spec(Some(1), Some(5))),
        ]);

        let result = ConfigValidator::validate(&settings);
        assert!(result.is_ok());
    }

    #[test]
    fn test_empty_host() {
        let mut settings = settings(vec![]);
        settings.server.host = String::new();

        let errors = ConfigValidator::validate(&settings).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], SettingsError::MissingField(_)));
    }

    #[test]
    fn test_duplicate_block_names() {
        let settings = settings(vec![
            definition("tags", list_spec(None, None)),
            definition("tags", char_spec()),
        ]);

        let errors = ConfigValidator::validate(&settings).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, SettingsError::Duplicate(_))));
    }

    #[test]
    fn test_invalid_block_names() {
        let settings = settings(vec![
            definition("", char_spec()),
            definition("my-tags", char_spec()),
            definition("1tags", char_spec()),
        ]);

        let errors = ConfigValidator::validate(&settings).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_contradictory_list_bounds_reported() {
        let settings = settings(vec![definition("tags", list_spec(Some(5), Some(2)))]);

        let errors = ConfigValidator::validate(&settings).unwrap_err();
        assert!(matches!(
            &errors[0],
            SettingsError::BlockIssue { block, issue: ConfigIssue::ContradictoryBounds { .. } }
                if block == "tags"
        ));
    }

    #[test]
    fn test_all_problems_collected() {
        let settings = settings(vec![
            definition("a", list_spec(Some(3), Some(1))),
            definition("a", char_spec()),
            definition("b-c", char_spec()),
        ]);

        let errors = ConfigValidator::validate(&settings).unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
