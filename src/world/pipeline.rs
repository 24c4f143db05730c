//! The chunk generation entry point hosts call into.
//!
//! `generate` never fails and never panics across the boundary: identity
//! resolution failures, generator construction errors, and engine panics
//! all degrade to a flat fallback chunk so the host always receives usable
//! terrain.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{error, info, trace, warn};

use crate::constants::*;
use crate::core::block::HostBlock;
use crate::core::chunk::{Chunk, ChunkSink};
use crate::error::GenError;
use crate::mapping::BlockStateCodec;
use crate::world::identity::{CallContext, HandleId, IdentityResolver, WorldId};
use crate::world::profile::{GeneratorOptions, ProfileProvider};
use crate::world::registry::{GeneratorEntry, WorldRegistry};

pub struct ChunkPipeline {
    registry: Arc<WorldRegistry>,
    resolver: IdentityResolver,
    profiles: Arc<dyn ProfileProvider>,
    codec: Arc<BlockStateCodec>,
    options: GeneratorOptions,
}

impl ChunkPipeline {
    pub fn new(
        registry: Arc<WorldRegistry>,
        profiles: Arc<dyn ProfileProvider>,
        codec: Arc<BlockStateCodec>,
    ) -> Self {
        ChunkPipeline {
            resolver: IdentityResolver::new(registry.clone()),
            registry,
            profiles,
            codec,
            options: GeneratorOptions::default(),
        }
    }

    pub fn with_options(mut self, options: GeneratorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn registry(&self) -> &Arc<WorldRegistry> {
        &self.registry
    }

    pub fn codec(&self) -> &Arc<BlockStateCodec> {
        &self.codec
    }

    /// Bind a host handle to a named world before generation starts. Also
    /// pins the calling thread so follow-up anonymous calls resolve.
    pub fn init(&self, handle: HandleId, world: &str, seed: i64) {
        let id = WorldId::new(world);
        self.registry.register_handle(handle, &id);
        self.registry.bind_seed(&id, seed);
        self.registry.force_identity(&id);
        info!(world = %id, handle = handle.0, seed, "world bound to pipeline");
    }

    /// Generate one chunk. Total: any failure along the way is logged and
    /// answered with flat fallback terrain.
    pub fn generate(&self, ctx: &CallContext, cx: i32, cz: i32) -> Chunk {
        let world = match self.resolver.resolve(ctx).or_else(|| self.configured_world()) {
            Some(world) => world,
            None => {
                warn!(cx, cz, "chunk request not attributable to a world, using fallback terrain");
                return fallback_chunk(cx, cz);
            }
        };

        if let Some(seed) = self.options.seed {
            self.registry.bind_seed_if_absent(&world, seed);
        }

        let entry = match self.registry.get_or_init(
            &world,
            self.options.profile_hint(),
            self.profiles.as_ref(),
        ) {
            Ok(entry) => entry,
            Err(err) => {
                error!(world = %world, cx, cz, %err, "generator unavailable, using fallback terrain");
                return fallback_chunk(cx, cz);
            }
        };

        match self.run_generation(&entry, cx, cz) {
            Ok(chunk) => chunk,
            Err(err) => {
                error!(world = %world, cx, cz, %err, "chunk generation failed, using fallback terrain");
                fallback_chunk(cx, cz)
            }
        }
    }

    /// Decoration pass. Structures and features are the profile's business
    /// during the fill; nothing runs here.
    pub fn populate(&self, _ctx: &CallContext, cx: i32, cz: i32) {
        trace!(cx, cz, "populate is a no-op");
    }

    /// Configured world name, used when no heuristic can attribute the
    /// call. Pins the thread so follow-up calls resolve through the cache.
    fn configured_world(&self) -> Option<WorldId> {
        let world = WorldId::new(self.options.world_name.as_deref()?);
        self.registry.force_identity(&world);
        Some(world)
    }

    fn run_generation(&self, entry: &GeneratorEntry, cx: i32, cz: i32) -> Result<Chunk, GenError> {
        let mut chunk = Chunk::new(cx, cz);
        let base_x = cx * CHUNK_SIZE;
        let base_z = cz * CHUNK_SIZE;

        // Biomes first so the terrain pass can rely on them being set.
        for lx in 0..CHUNK_SIZE {
            for lz in 0..CHUNK_SIZE {
                let biome = entry.biomes.biome_at(base_x + lx, base_z + lz);
                chunk.set_biome(lx, lz, self.codec.biome_to_host(&biome));
            }
        }

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            entry.engine.fill_chunk(&mut chunk, entry.biomes.as_ref(), cx, cz)
        }));
        match outcome {
            Ok(result) => result?,
            Err(payload) => return Err(GenError::Engine(panic_message(&payload))),
        }
        Ok(chunk)
    }
}

/// Flat terrain handed out when real generation is impossible: bedrock
/// floor, stone fill, grass surface, plains everywhere.
pub fn fallback_chunk(cx: i32, cz: i32) -> Chunk {
    let mut chunk = Chunk::new(cx, cz);
    let bedrock = HostBlock::new(HOST_BEDROCK, 0);
    let stone = HostBlock::new(HOST_STONE, 0);
    let grass = HostBlock::new(HOST_GRASS, 0);
    for x in 0..CHUNK_SIZE {
        for z in 0..CHUNK_SIZE {
            chunk.set_block(x, 0, z, bedrock);
            for y in 1..FALLBACK_SURFACE {
                chunk.set_block(x, y, z, stone);
            }
            chunk.set_block(x, FALLBACK_SURFACE, z, grass);
            chunk.set_biome(x, z, HOST_BIOME_PLAINS);
        }
    }
    chunk
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("engine panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("engine panicked: {s}")
    } else {
        "engine panicked".to_string()
    }
}
