pub mod identity;
pub mod pipeline;
pub mod profile;
pub mod registry;

pub use identity::{CallContext, HandleId, IdentityResolver, Strategy, WorldId};
pub use pipeline::{fallback_chunk, ChunkPipeline};
pub use profile::{
    BiomeSource, GenerationProfile, GeneratorOptions, NoiseBiomes, NoiseEngine, NoiseProfile,
    ProfileProvider, StaticProfiles, TerrainEngine,
};
pub use registry::{GeneratorEntry, WorldRegistry};
