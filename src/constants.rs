// World constants
pub const WORLD_HEIGHT: i32 = 256;
pub const CHUNK_SIZE: i32 = 16;
pub const SEA_LEVEL: i32 = 64;

// Fallback chunk layering: bedrock floor, stone fill, grass at the surface
pub const FALLBACK_SURFACE: i32 = 63;

// Maximum nested generator constructions per thread before a build is aborted
pub const MAX_CONSTRUCTION_DEPTH: u32 = 3;

// Host numeric block ids (compact id space used by the host's chunk format)
pub const HOST_AIR: u16 = 0;
pub const HOST_STONE: u16 = 1;
pub const HOST_GRASS: u16 = 2;
pub const HOST_DIRT: u16 = 3;
pub const HOST_COBBLESTONE: u16 = 4;
pub const HOST_PLANKS: u16 = 5;
pub const HOST_SAPLING: u16 = 6;
pub const HOST_BEDROCK: u16 = 7;
pub const HOST_WATER: u16 = 9;
pub const HOST_LAVA: u16 = 11;
pub const HOST_SAND: u16 = 12;
pub const HOST_GRAVEL: u16 = 13;
pub const HOST_LOG: u16 = 17;
pub const HOST_LEAVES: u16 = 18;
pub const HOST_GLASS: u16 = 20;
pub const HOST_BED: u16 = 26;
pub const HOST_TALL_GRASS: u16 = 31;
pub const HOST_STONE_SLAB: u16 = 44;
pub const HOST_OAK_STAIRS: u16 = 53;
pub const HOST_CHEST: u16 = 54;
pub const HOST_DIAMOND_BLOCK: u16 = 57;
pub const HOST_CRAFTING_TABLE: u16 = 58;
pub const HOST_FURNACE: u16 = 61;
pub const HOST_SIGN: u16 = 63;
pub const HOST_WOODEN_DOOR: u16 = 64;
pub const HOST_COBBLESTONE_STAIRS: u16 = 67;
pub const HOST_WOODEN_PRESSURE_PLATE: u16 = 72;
pub const HOST_ICE: u16 = 79;
pub const HOST_SNOW_BLOCK: u16 = 80;
pub const HOST_FENCE: u16 = 85;
pub const HOST_TRAPDOOR: u16 = 96;
pub const HOST_MUSHROOM_BLOCK: u16 = 99;
pub const HOST_COBBLESTONE_WALL: u16 = 139;
pub const HOST_FLOWER_POT: u16 = 140;
pub const HOST_WOODEN_BUTTON: u16 = 143;
pub const HOST_CARPET: u16 = 171;
pub const HOST_TERRACOTTA: u16 = 172;

// Host numeric biome ids
pub const HOST_BIOME_OCEAN: u8 = 0;
pub const HOST_BIOME_PLAINS: u8 = 1;
pub const HOST_BIOME_DESERT: u8 = 2;
pub const HOST_BIOME_MOUNTAINS: u8 = 3;
pub const HOST_BIOME_FOREST: u8 = 4;
pub const HOST_BIOME_TAIGA: u8 = 5;
pub const HOST_BIOME_SWAMP: u8 = 6;
pub const HOST_BIOME_RIVER: u8 = 7;
pub const HOST_BIOME_TUNDRA: u8 = 12;
pub const HOST_BIOME_BEACH: u8 = 16;
