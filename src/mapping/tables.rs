//! Block, biome, and property-default mapping tables.
//!
//! Tables deserialize from the profile's JSON data assets; a built-in
//! baseline covers the common vocabulary so the codec works before any
//! profile data is loaded.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde::Deserialize;
use tracing::info;

use crate::constants::*;
use crate::core::block::normalize_ident;

/// One canonical identifier's host mapping: a base (id, variant) pair plus
/// optional per-property-set variant overrides.
#[derive(Debug, Clone, Deserialize)]
pub struct BlockEntry {
    pub id: u16,
    #[serde(default)]
    pub default_data: u16,
    #[serde(default)]
    pub states: Vec<StateEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StateEntry {
    pub properties: BTreeMap<String, String>,
    pub data: u16,
}

#[derive(Debug, Default)]
pub struct MappingTables {
    /// normalized identifier -> host mapping
    pub blocks: FxHashMap<String, BlockEntry>,
    /// normalized identifier -> default property values
    pub property_defaults: FxHashMap<String, BTreeMap<String, String>>,
    /// host numeric id -> canonical identifier, for reverse derivation
    pub host_names: FxHashMap<u16, String>,
    /// normalized biome name -> host biome id
    pub biomes: FxHashMap<String, u8>,
}

impl MappingTables {
    /// Parse block mappings and property defaults from their JSON assets.
    /// The shapes match the profile data files:
    /// `{"oak_log": {"id": 17, "default_data": 0, "states": [...]}}` and
    /// `{"oak_log": {"axis": "y"}}`.
    pub fn from_json(blocks_json: &str, defaults_json: &str) -> Result<Self, serde_json::Error> {
        // Data assets key on `minecraft:*`; lookups use normalized idents.
        let blocks: FxHashMap<String, BlockEntry> = serde_json::from_str(blocks_json)?;
        let blocks = blocks
            .into_iter()
            .map(|(k, v)| (normalize_ident(&k), v))
            .collect();
        let property_defaults: FxHashMap<String, BTreeMap<String, String>> =
            serde_json::from_str(defaults_json)?;
        let property_defaults = property_defaults
            .into_iter()
            .map(|(k, v)| (normalize_ident(&k), v))
            .collect();

        let mut tables = MappingTables {
            blocks,
            property_defaults,
            host_names: FxHashMap::default(),
            biomes: builtin_biomes(),
        };
        tables.rebuild_host_names();
        info!(
            blocks = tables.blocks.len(),
            defaults = tables.property_defaults.len(),
            "loaded block mapping tables"
        );
        Ok(tables)
    }

    /// Baseline vocabulary used when no profile data assets are present.
    pub fn builtin() -> Self {
        let mut blocks = FxHashMap::default();
        let plain = |id: u16| BlockEntry {
            id,
            default_data: 0,
            states: Vec::new(),
        };

        for (ident, id) in [
            ("air", HOST_AIR),
            ("cave_air", HOST_AIR),
            ("void_air", HOST_AIR),
            ("stone", HOST_STONE),
            ("grass_block", HOST_GRASS),
            ("dirt", HOST_DIRT),
            ("cobblestone", HOST_COBBLESTONE),
            ("oak_planks", HOST_PLANKS),
            ("bedrock", HOST_BEDROCK),
            ("water", HOST_WATER),
            ("lava", HOST_LAVA),
            ("sand", HOST_SAND),
            ("gravel", HOST_GRAVEL),
            ("oak_leaves", HOST_LEAVES),
            ("glass", HOST_GLASS),
            ("chest", HOST_CHEST),
            ("crafting_table", HOST_CRAFTING_TABLE),
            ("ice", HOST_ICE),
            ("snow_block", HOST_SNOW_BLOCK),
            ("diamond_block", HOST_DIAMOND_BLOCK),
        ] {
            blocks.insert(ident.to_string(), plain(id));
        }

        blocks.insert(
            "oak_log".to_string(),
            BlockEntry {
                id: HOST_LOG,
                default_data: 0,
                states: vec![
                    state(&[("axis", "x")], 0x4),
                    state(&[("axis", "z")], 0x8),
                ],
            },
        );
        blocks.insert(
            "oak_stairs".to_string(),
            BlockEntry {
                id: HOST_OAK_STAIRS,
                default_data: 0,
                states: vec![
                    state(&[("facing", "east"), ("half", "bottom")], 0),
                    state(&[("facing", "west"), ("half", "bottom")], 1),
                    state(&[("facing", "south"), ("half", "bottom")], 2),
                    state(&[("facing", "north"), ("half", "bottom")], 3),
                ],
            },
        );
        blocks.insert(
            "stone_slab".to_string(),
            BlockEntry {
                id: HOST_STONE_SLAB,
                default_data: 0,
                states: vec![state(&[("type", "top")], 0x8)],
            },
        );
        blocks.insert(
            "furnace".to_string(),
            BlockEntry {
                id: HOST_FURNACE,
                default_data: 2,
                states: vec![
                    state(&[("facing", "north")], 2),
                    state(&[("facing", "south")], 3),
                    state(&[("facing", "west")], 4),
                    state(&[("facing", "east")], 5),
                ],
            },
        );

        let mut property_defaults = FxHashMap::default();
        property_defaults.insert("oak_log".to_string(), props(&[("axis", "y")]));
        property_defaults.insert(
            "oak_stairs".to_string(),
            props(&[("facing", "north"), ("half", "bottom")]),
        );
        property_defaults.insert("stone_slab".to_string(), props(&[("type", "bottom")]));
        property_defaults.insert("furnace".to_string(), props(&[("facing", "north")]));

        let mut tables = MappingTables {
            blocks,
            property_defaults,
            host_names: FxHashMap::default(),
            biomes: builtin_biomes(),
        };
        tables.rebuild_host_names();
        tables
    }

    /// Prefer the shortest identifier per host id so aliases like `cave_air`
    /// never shadow `air` in reverse derivation.
    fn rebuild_host_names(&mut self) {
        self.host_names.clear();
        for (ident, entry) in &self.blocks {
            match self.host_names.get(&entry.id) {
                Some(existing) if existing.len() <= ident.len() => {}
                _ => {
                    self.host_names.insert(entry.id, ident.clone());
                }
            }
        }
    }

    pub fn defaults_for(&self, ident: &str) -> Option<&BTreeMap<String, String>> {
        self.property_defaults.get(ident)
    }
}

fn state(properties: &[(&str, &str)], data: u16) -> StateEntry {
    StateEntry {
        properties: props(properties),
        data,
    }
}

fn props(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn builtin_biomes() -> FxHashMap<String, u8> {
    [
        ("ocean", HOST_BIOME_OCEAN),
        ("plains", HOST_BIOME_PLAINS),
        ("desert", HOST_BIOME_DESERT),
        ("mountains", HOST_BIOME_MOUNTAINS),
        ("forest", HOST_BIOME_FOREST),
        ("taiga", HOST_BIOME_TAIGA),
        ("swamp", HOST_BIOME_SWAMP),
        ("river", HOST_BIOME_RIVER),
        ("tundra", HOST_BIOME_TUNDRA),
        ("snowy_plains", HOST_BIOME_TUNDRA),
        ("beach", HOST_BIOME_BEACH),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}
