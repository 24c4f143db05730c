pub mod biome;
pub mod block;
pub mod chunk;

pub use biome::BiomeKey;
pub use block::{BlockStateKey, HostBlock};
pub use chunk::{Chunk, ChunkSink};
