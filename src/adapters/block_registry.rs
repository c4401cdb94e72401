use crate::adapters::any_block::AnyBlock;
use crate::domain::Block;

/// A block definition registered under a name
#[derive(Debug)]
pub struct NamedBlock {
    pub name: String,
    pub block: AnyBlock,
}

/// Read-only set of block definitions served by the HTTP surface.
///
/// Built once at start-up and shared behind an `Arc`; nothing mutates it
/// afterwards.
#[derive(Debug, Default)]
pub struct BlockRegistry {
    blocks: Vec<NamedBlock>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `block` under `name`, replacing any earlier block of that name
    pub fn register(&mut self, name: impl Into<String>, block: impl Into<AnyBlock>) {
        let name = name.into();
        let block = block.into();
        if let Some(existing) = self.blocks.iter_mut().find(|b| b.name == name) {
            tracing::warn!("Replacing block definition '{}'", name);
            existing.block = block;
        } else {
            self.blocks.push(NamedBlock { name, block });
        }
    }

    pub fn get(&self, name: &str) -> Option<&AnyBlock> {
        self.blocks.iter().find(|b| b.name == name).map(|b| &b.block)
    }

    pub fn iter(&self) -> impl Iterator<Item = &NamedBlock> {
        self.blocks.iter()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Configuration issues of every registered block, tagged with its name
    pub fn check(&self) -> Vec<(String, crate::domain::ConfigIssue)> {
        self.blocks
            .iter()
            .flat_map(|b| b.block.check().into_iter().map(|issue| (b.name.clone(), issue)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::field_block::CharBlock;
    use crate::adapters::list_block::{ListBlock, ListBlockOptions};

    #[test]
    fn test_register_and_get() {
        let mut registry = BlockRegistry::new();
        registry.register("title", CharBlock::new());
        registry.register("tags", ListBlock::new(AnyBlock::from(CharBlock::new())));

        assert_eq!(registry.len(), 2);
        assert!(matches!(registry.get("title"), Some(AnyBlock::Char(_))));
        assert!(matches!(registry.get("tags"), Some(AnyBlock::List(_))));
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_register_replaces_same_name() {
        let mut registry = BlockRegistry::new();
        registry.register("x", CharBlock::new());
        registry.register("x", ListBlock::new(AnyBlock::from(CharBlock::new())));

        assert_eq!(registry.len(), 1);
        assert!(matches!(registry.get("x"), Some(AnyBlock::List(_))));
    }

    #[test]
    fn test_check_tags_issues_with_name() {
        let mut registry = BlockRegistry::new();
        registry.register(
            "bad",
            ListBlock::with_options(
                AnyBlock::from(CharBlock::new()),
                ListBlockOptions {
                    min_length: Some(4),
                    max_length: Some(1),
                    ..Default::default()
                },
            ),
        );
        registry.register("good", CharBlock::new());

        let issues = registry.check();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].0, "bad");
    }
}
