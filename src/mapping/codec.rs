//! Translation between canonical block states and the host's compact
//! `(id, variant)` representation.
//!
//! `to_host` is total: exact table, then identifier table plus derived
//! variant bits, then the fallback-rule chain. `to_canonical` is total and
//! lossy. Lookup caches are append-only; a full reload is a new codec.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::constants::*;
use crate::core::biome::BiomeKey;
use crate::core::block::{BlockStateKey, HostBlock};
use crate::mapping::rules::FallbackChain;
use crate::mapping::tables::MappingTables;

pub struct BlockStateCodec {
    tables: MappingTables,
    chain: FallbackChain,
    exact: FxHashMap<BlockStateKey, HostBlock>,
    reverse: FxHashMap<HostBlock, BlockStateKey>,
    biome_reverse: FxHashMap<u8, String>,
    ident_cache: RwLock<FxHashMap<String, HostBlock>>,
    miss_count: AtomicU64,
}

impl BlockStateCodec {
    pub fn new(tables: MappingTables, chain: FallbackChain) -> Self {
        let mut exact = FxHashMap::default();
        let mut reverse = FxHashMap::default();

        for (ident, entry) in &tables.blocks {
            let base_block = HostBlock::new(entry.id, entry.default_data);
            exact.insert(BlockStateKey::new(ident), base_block);

            let mut base_key = BlockStateKey::new(ident);
            if let Some(defaults) = tables.defaults_for(ident) {
                for (k, v) in defaults {
                    base_key.set_prop(k, v);
                }
            }
            reverse.entry(base_block).or_insert(base_key);

            for state in &entry.states {
                let state_key = BlockStateKey::with_props(
                    ident,
                    state.properties.iter().map(|(k, v)| (k.clone(), v.clone())),
                );
                let state_block = HostBlock::new(entry.id, state.data);
                exact.insert(state_key.clone(), state_block);
                reverse.entry(state_block).or_insert(state_key);
            }
        }

        let biome_reverse = tables
            .biomes
            .iter()
            .map(|(name, &id)| (id, name.clone()))
            .collect();

        BlockStateCodec {
            tables,
            chain,
            exact,
            reverse,
            biome_reverse,
            ident_cache: RwLock::new(FxHashMap::default()),
            miss_count: AtomicU64::new(0),
        }
    }

    pub fn with_defaults() -> Self {
        BlockStateCodec::new(MappingTables::builtin(), FallbackChain::default())
    }

    /// Process-wide codec over the built-in tables, for hosts that never
    /// load profile data assets.
    pub fn shared() -> Arc<BlockStateCodec> {
        static SHARED: Lazy<Arc<BlockStateCodec>> =
            Lazy::new(|| Arc::new(BlockStateCodec::with_defaults()));
        SHARED.clone()
    }

    /// Total translation into the host representation. Never fails; unmapped
    /// identifiers resolve through the fallback chain and repeated calls
    /// return the identical representation.
    pub fn to_host(&self, key: &BlockStateKey) -> HostBlock {
        if let Some(&block) = self.exact.get(key) {
            return block;
        }

        let ident = key.ident();
        if let Some(entry) = self.tables.blocks.get(ident) {
            let base = HostBlock::new(entry.id, entry.default_data);
            return self.apply_property_bits(base, key);
        }

        if let Some(&base) = self.ident_cache.read().get(ident) {
            return self.apply_property_bits(base, key);
        }

        let base = self.chain.resolve(ident);
        self.note_miss(ident, base);
        self.ident_cache.write().insert(ident.to_string(), base);
        self.apply_property_bits(base, key)
    }

    /// Best-effort inverse: reverse table first, then an identifier derived
    /// from host metadata with properties reconstructed from variant bits and
    /// filled from the property-default table.
    pub fn to_canonical(&self, block: HostBlock) -> BlockStateKey {
        if let Some(key) = self.reverse.get(&block) {
            return key.clone();
        }

        let ident = self
            .tables
            .host_names
            .get(&block.id)
            .cloned()
            .unwrap_or_else(|| "air".to_string());
        let mut key = BlockStateKey::new(&ident);
        derive_props_from_variant(&mut key, block);
        if let Some(defaults) = self.tables.defaults_for(key.ident()) {
            for (k, v) in defaults {
                if key.prop(k).is_none() {
                    key.set_prop(k, v);
                }
            }
        }
        key
    }

    pub fn biome_to_host(&self, biome: &BiomeKey) -> u8 {
        match self.tables.biomes.get(biome.name()) {
            Some(&id) => id,
            None => {
                debug!(biome = %biome, "no host mapping for biome, using plains");
                HOST_BIOME_PLAINS
            }
        }
    }

    pub fn biome_to_canonical(&self, id: u8) -> BiomeKey {
        match self.biome_reverse.get(&id) {
            Some(name) => BiomeKey::new(name),
            None => BiomeKey::plains(),
        }
    }

    /// Translation misses are expected for addon content; keep the log
    /// volume bounded under chunk-generation call rates.
    fn note_miss(&self, ident: &str, resolved: HostBlock) {
        let n = self.miss_count.fetch_add(1, Ordering::Relaxed);
        if n % 128 == 0 {
            debug!(
                ident,
                host_id = resolved.id,
                total_misses = n + 1,
                "unmapped identifier resolved via fallback rules"
            );
        }
    }

    /// Fold recognized properties into the variant code using the host's
    /// bit-packing scheme. Unrecognized properties are ignored.
    fn apply_property_bits(&self, base: HostBlock, key: &BlockStateKey) -> HostBlock {
        let id = base.id;
        let mut variant = base.variant;

        if let Some(facing) = key.prop("facing") {
            if is_directional(id) {
                if let Some(bits) = directional_facing_bits(facing) {
                    variant = bits;
                }
            } else if is_stairs(id) {
                if let Some(bits) = stairs_facing_bits(facing) {
                    variant = bits;
                }
            }
        }
        if is_stairs(id) && key.prop("half") == Some("top") {
            variant |= 0x4;
        }
        if is_slab(id) && key.prop("type") == Some("top") {
            variant |= 0x8;
        }
        if is_log(id) {
            if let Some(axis) = key.prop("axis") {
                // Low two bits carry the wood species.
                variant = (variant & 0x3) | axis_bits(axis);
            }
        }
        if key.prop("waterlogged") == Some("true") {
            debug!(key = %key, "waterlogged property not representable on host");
        }

        HostBlock::new(id, variant)
    }
}

fn is_stairs(id: u16) -> bool {
    matches!(id, HOST_OAK_STAIRS | HOST_COBBLESTONE_STAIRS)
}

fn is_slab(id: u16) -> bool {
    id == HOST_STONE_SLAB
}

fn is_log(id: u16) -> bool {
    id == HOST_LOG
}

fn is_directional(id: u16) -> bool {
    id == HOST_FURNACE
}

fn directional_facing_bits(facing: &str) -> Option<u16> {
    match facing {
        "down" => Some(0),
        "up" => Some(1),
        "north" => Some(2),
        "south" => Some(3),
        "west" => Some(4),
        "east" => Some(5),
        _ => None,
    }
}

fn stairs_facing_bits(facing: &str) -> Option<u16> {
    match facing {
        "east" => Some(0),
        "west" => Some(1),
        "south" => Some(2),
        "north" => Some(3),
        _ => None,
    }
}

fn axis_bits(axis: &str) -> u16 {
    match axis {
        "x" => 0x4,
        "z" => 0x8,
        "none" => 0xC,
        _ => 0,
    }
}

fn derive_props_from_variant(key: &mut BlockStateKey, block: HostBlock) {
    let v = block.variant;
    if is_log(block.id) {
        let axis = match v & 0xC {
            0x4 => "x",
            0x8 => "z",
            0xC => "none",
            _ => "y",
        };
        key.set_prop("axis", axis);
    } else if is_stairs(block.id) {
        let facing = match v & 0x3 {
            0 => "east",
            1 => "west",
            2 => "south",
            _ => "north",
        };
        key.set_prop("facing", facing);
        key.set_prop("half", if v & 0x4 != 0 { "top" } else { "bottom" });
    } else if is_slab(block.id) {
        key.set_prop("type", if v & 0x8 != 0 { "top" } else { "bottom" });
    } else if is_directional(block.id) {
        let facing = match v & 0x7 {
            0 => "down",
            1 => "up",
            3 => "south",
            4 => "west",
            5 => "east",
            _ => "north",
        };
        key.set_prop("facing", facing);
    }
}
