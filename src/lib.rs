// Core module with fundamental types
pub mod core;

// Mapping module translating canonical block states to the host format
pub mod mapping;

// World module with identity resolution, generator lifecycle, and the
// chunk pipeline
pub mod world;

// Shared constants and errors
pub mod constants;
pub mod error;

pub use crate::core::{BiomeKey, BlockStateKey, Chunk, ChunkSink, HostBlock};
pub use crate::error::GenError;
pub use crate::mapping::{BlockStateCodec, FallbackChain, FallbackRule, MappingTables};
pub use crate::world::{
    CallContext, ChunkPipeline, GenerationProfile, GeneratorOptions, HandleId, IdentityResolver,
    NoiseProfile, ProfileProvider, StaticProfiles, WorldId, WorldRegistry,
};
