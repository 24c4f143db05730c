//! Pattern-based fallback mappings for block identifiers with no table entry.
//!
//! Rules are evaluated in authored order and the first match wins; the chain
//! always ends in an unconditional rule, so resolution cannot fail.

use crate::constants::*;
use crate::core::block::HostBlock;

/// Pattern matched against a normalized identifier.
#[derive(Clone, Debug)]
pub enum Pattern {
    Exact(String),
    Suffix(String),
    Prefix(String),
    Contains(String),
    Any,
}

impl Pattern {
    fn matches(&self, ident: &str) -> bool {
        match self {
            Pattern::Exact(s) => ident == s,
            Pattern::Suffix(s) => ident.ends_with(s.as_str()),
            Pattern::Prefix(s) => ident.starts_with(s.as_str()),
            Pattern::Contains(s) => ident.contains(s.as_str()),
            Pattern::Any => true,
        }
    }
}

#[derive(Clone, Debug)]
pub struct FallbackRule {
    pattern: Pattern,
    block: HostBlock,
}

impl FallbackRule {
    pub fn exact(text: &str, block: HostBlock) -> Self {
        FallbackRule {
            pattern: Pattern::Exact(text.to_string()),
            block,
        }
    }

    pub fn suffix(text: &str, block: HostBlock) -> Self {
        FallbackRule {
            pattern: Pattern::Suffix(text.to_string()),
            block,
        }
    }

    pub fn prefix(text: &str, block: HostBlock) -> Self {
        FallbackRule {
            pattern: Pattern::Prefix(text.to_string()),
            block,
        }
    }

    pub fn contains(text: &str, block: HostBlock) -> Self {
        FallbackRule {
            pattern: Pattern::Contains(text.to_string()),
            block,
        }
    }

    pub fn any(block: HostBlock) -> Self {
        FallbackRule {
            pattern: Pattern::Any,
            block,
        }
    }

    pub fn matches(&self, ident: &str) -> bool {
        self.pattern.matches(ident)
    }

    pub fn block(&self) -> HostBlock {
        self.block
    }

    fn is_terminal(&self) -> bool {
        matches!(self.pattern, Pattern::Any)
    }
}

/// Ordered first-match-wins rule chain. Construction appends the loud
/// placeholder terminal if the authored rules don't end in one.
pub struct FallbackChain {
    rules: Vec<FallbackRule>,
}

/// Visually loud placeholder for content nothing else matched.
pub const PLACEHOLDER: HostBlock = HostBlock::new(HOST_DIAMOND_BLOCK, 0);

impl FallbackChain {
    pub fn new(mut rules: Vec<FallbackRule>) -> Self {
        if !rules.last().is_some_and(FallbackRule::is_terminal) {
            rules.push(FallbackRule::any(PLACEHOLDER));
        }
        FallbackChain { rules }
    }

    pub fn resolve(&self, ident: &str) -> HostBlock {
        for rule in &self.rules {
            if rule.matches(ident) {
                return rule.block();
            }
        }
        // Unreachable: the constructor guarantees a terminal rule.
        PLACEHOLDER
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for FallbackChain {
    /// Rules are authored most-specific-first so longer literal matches win
    /// over the broad vegetation and terminal rules.
    fn default() -> Self {
        let plant_exacts = [
            "grass", "tall_grass", "seagrass", "kelp", "vine", "lily_pad", "sugar_cane",
        ];
        let mut rules = vec![
            FallbackRule::suffix("_log", HostBlock::new(HOST_LOG, 0)),
            FallbackRule::suffix("_wood", HostBlock::new(HOST_LOG, 0)),
            FallbackRule::suffix("_leaves", HostBlock::new(HOST_LEAVES, 0)),
            FallbackRule::suffix("_stairs", HostBlock::new(HOST_COBBLESTONE_STAIRS, 0)),
            FallbackRule::suffix("_slab", HostBlock::new(HOST_STONE_SLAB, 0)),
            FallbackRule::contains("_slab_", HostBlock::new(HOST_STONE_SLAB, 0)),
            FallbackRule::suffix("_fence", HostBlock::new(HOST_FENCE, 0)),
            FallbackRule::suffix("_wall", HostBlock::new(HOST_COBBLESTONE_WALL, 0)),
            FallbackRule::contains("_door", HostBlock::new(HOST_WOODEN_DOOR, 0)),
            FallbackRule::contains("_button", HostBlock::new(HOST_WOODEN_BUTTON, 0)),
            FallbackRule::contains("_pressure_plate", HostBlock::new(HOST_WOODEN_PRESSURE_PLATE, 0)),
            FallbackRule::contains("_trapdoor", HostBlock::new(HOST_TRAPDOOR, 0)),
            FallbackRule::contains("_sign", HostBlock::new(HOST_SIGN, 0)),
            FallbackRule::contains("_carpet", HostBlock::new(HOST_CARPET, 0)),
            FallbackRule::contains("_bed", HostBlock::new(HOST_BED, 0)),
            FallbackRule::contains("_sapling", HostBlock::new(HOST_SAPLING, 0)),
            FallbackRule::prefix("potted_", HostBlock::new(HOST_FLOWER_POT, 0)),
            FallbackRule::suffix("_ore", HostBlock::new(HOST_DIAMOND_BLOCK, 0)),
            FallbackRule::suffix("_terracotta", HostBlock::new(HOST_TERRACOTTA, 0)),
            FallbackRule::suffix("_coral", HostBlock::AIR),
            FallbackRule::suffix("_fan", HostBlock::AIR),
        ];
        for name in plant_exacts {
            rules.push(FallbackRule::exact(name, HostBlock::new(HOST_TALL_GRASS, 0)));
        }
        rules.extend([
            FallbackRule::contains("_plant", HostBlock::new(HOST_TALL_GRASS, 0)),
            FallbackRule::contains("_bush", HostBlock::new(HOST_TALL_GRASS, 0)),
            FallbackRule::suffix("_fern", HostBlock::new(HOST_TALL_GRASS, 0)),
            FallbackRule::suffix("_rose", HostBlock::new(HOST_TALL_GRASS, 0)),
            FallbackRule::suffix("_tulip", HostBlock::new(HOST_TALL_GRASS, 0)),
            FallbackRule::suffix("_orchid", HostBlock::new(HOST_TALL_GRASS, 0)),
            FallbackRule::suffix("_fungus", HostBlock::new(HOST_TALL_GRASS, 0)),
            FallbackRule::exact("mushroom_stem", HostBlock::new(HOST_MUSHROOM_BLOCK, 0)),
            FallbackRule::suffix("_mushroom_block", HostBlock::new(HOST_MUSHROOM_BLOCK, 0)),
            FallbackRule::suffix("_mushroom", HostBlock::new(HOST_MUSHROOM_BLOCK, 0)),
            FallbackRule::any(PLACEHOLDER),
        ]);
        FallbackChain::new(rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stairs_rule_beats_terminal() {
        let chain = FallbackChain::default();
        assert_eq!(
            chain.resolve("unknown_stairs"),
            HostBlock::new(HOST_COBBLESTONE_STAIRS, 0)
        );
    }

    #[test]
    fn test_terminal_placeholder_for_unmatched() {
        let chain = FallbackChain::default();
        assert_eq!(chain.resolve("zzz_completely_made_up"), PLACEHOLDER);
    }

    #[test]
    fn test_log_and_leaves_rules() {
        let chain = FallbackChain::default();
        assert_eq!(chain.resolve("crimson_log"), HostBlock::new(HOST_LOG, 0));
        assert_eq!(chain.resolve("azalea_leaves"), HostBlock::new(HOST_LEAVES, 0));
    }

    #[test]
    fn test_vegetation_group() {
        let chain = FallbackChain::default();
        assert_eq!(chain.resolve("sweet_berry_bush"), HostBlock::new(HOST_TALL_GRASS, 0));
        assert_eq!(chain.resolve("kelp"), HostBlock::new(HOST_TALL_GRASS, 0));
    }

    #[test]
    fn test_terminal_appended_when_missing() {
        let chain = FallbackChain::new(vec![FallbackRule::suffix(
            "_ore",
            HostBlock::new(HOST_DIAMOND_BLOCK, 0),
        )]);
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.resolve("whatever"), PLACEHOLDER);
    }
}
