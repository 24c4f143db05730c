//! Generation profiles: the pluggable seam between the lifecycle machinery
//! and actual terrain algorithms.
//!
//! A profile is a named recipe; building it against a seed yields the two
//! trait objects the pipeline drives per chunk. `NoiseProfile` is the
//! bundled reference implementation on FastNoiseLite.

use std::sync::Arc;

use fastnoise_lite::{FastNoiseLite, FractalType, NoiseType};
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::core::biome::BiomeKey;
use crate::core::block::{BlockStateKey, HostBlock};
use crate::core::chunk::ChunkSink;
use crate::error::GenError;
use crate::mapping::BlockStateCodec;

/// Produces the biome for any world column. Must be cheap; the pipeline
/// calls it 256 times per chunk.
pub trait BiomeSource: Send + Sync {
    fn biome_at(&self, x: i32, z: i32) -> BiomeKey;
}

/// Writes terrain for one chunk into the sink.
pub trait TerrainEngine: Send + Sync {
    fn fill_chunk(
        &self,
        chunk: &mut dyn ChunkSink,
        biomes: &dyn BiomeSource,
        cx: i32,
        cz: i32,
    ) -> Result<(), GenError>;
}

pub trait GenerationProfile: Send + Sync {
    fn name(&self) -> &str;

    /// Instantiate the profile for a seed. Construction may be expensive;
    /// the registry makes sure it runs once per world.
    fn build(
        &self,
        seed: i64,
    ) -> Result<(Arc<dyn TerrainEngine>, Arc<dyn BiomeSource>), GenError>;
}

pub trait ProfileProvider: Send + Sync {
    fn get_by_name(&self, name: &str) -> Option<Arc<dyn GenerationProfile>>;
    fn list_all(&self) -> Vec<Arc<dyn GenerationProfile>>;
    fn default_profile(&self) -> Option<Arc<dyn GenerationProfile>>;
}

pub fn normalize_profile_name(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

/// Fixed in-memory profile set.
pub struct StaticProfiles {
    profiles: Vec<Arc<dyn GenerationProfile>>,
    default: Option<Arc<dyn GenerationProfile>>,
}

impl StaticProfiles {
    pub fn new(profiles: Vec<Arc<dyn GenerationProfile>>) -> Self {
        StaticProfiles {
            profiles,
            default: None,
        }
    }

    /// Like `new`, with the first profile doubling as the default.
    pub fn with_default(profiles: Vec<Arc<dyn GenerationProfile>>) -> Self {
        let default = profiles.first().cloned();
        StaticProfiles { profiles, default }
    }
}

impl ProfileProvider for StaticProfiles {
    fn get_by_name(&self, name: &str) -> Option<Arc<dyn GenerationProfile>> {
        let wanted = normalize_profile_name(name);
        self.profiles
            .iter()
            .find(|p| normalize_profile_name(p.name()) == wanted)
            .cloned()
    }

    fn list_all(&self) -> Vec<Arc<dyn GenerationProfile>> {
        self.profiles.clone()
    }

    fn default_profile(&self) -> Option<Arc<dyn GenerationProfile>> {
        self.default.clone()
    }
}

/// Options a host hands over at world creation, either as structured data
/// or packed into the generator-name string.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorOptions {
    #[serde(alias = "preset")]
    pub profile: Option<String>,
    #[serde(alias = "worldName")]
    pub world_name: Option<String>,
    pub seed: Option<i64>,
}

impl GeneratorOptions {
    /// Parse the compact `worldforge:<profile>` generator-name form hosts
    /// use when they only have a single string field to give us.
    pub fn from_generator_name(name: &str) -> Self {
        let rest = match name.split_once(':') {
            Some((prefix, rest)) if prefix.eq_ignore_ascii_case("worldforge") => rest,
            _ => name,
        };
        let rest = rest.trim();
        GeneratorOptions {
            profile: (!rest.is_empty()).then(|| rest.to_string()),
            world_name: None,
            seed: None,
        }
    }

    pub fn profile_hint(&self) -> Option<&str> {
        self.profile.as_deref()
    }
}

/// Reference profile: FastNoiseLite heightmap terrain with a
/// temperature/moisture biome field.
pub struct NoiseProfile {
    name: String,
    codec: Arc<BlockStateCodec>,
}

impl NoiseProfile {
    pub fn new(name: &str, codec: Arc<BlockStateCodec>) -> Self {
        NoiseProfile {
            name: name.to_string(),
            codec,
        }
    }

    /// The default profile over the shared built-in codec.
    pub fn reference() -> Self {
        NoiseProfile::new("reference", BlockStateCodec::shared())
    }
}

impl GenerationProfile for NoiseProfile {
    fn name(&self) -> &str {
        &self.name
    }

    fn build(
        &self,
        seed: i64,
    ) -> Result<(Arc<dyn TerrainEngine>, Arc<dyn BiomeSource>), GenError> {
        let engine = Arc::new(NoiseEngine::new(seed, &self.codec));
        let biomes = Arc::new(NoiseBiomes::new(seed));
        Ok((engine, biomes))
    }
}

fn create_noise(seed: i64, offset: i64, frequency: f32) -> FastNoiseLite {
    let mut noise = FastNoiseLite::with_seed(seed.wrapping_add(offset) as i32);
    noise.set_noise_type(Some(NoiseType::OpenSimplex2));
    noise.set_frequency(Some(frequency));
    noise
}

fn create_fbm_noise(seed: i64, offset: i64, frequency: f32) -> FastNoiseLite {
    let mut noise = FastNoiseLite::with_seed(seed.wrapping_add(offset) as i32);
    noise.set_noise_type(Some(NoiseType::OpenSimplex2));
    noise.set_fractal_type(Some(FractalType::FBm));
    noise.set_fractal_octaves(Some(4));
    noise.set_fractal_lacunarity(Some(2.0));
    noise.set_fractal_gain(Some(0.5));
    noise.set_frequency(Some(frequency));
    noise
}

pub struct NoiseBiomes {
    temperature: FastNoiseLite,
    moisture: FastNoiseLite,
    continents: FastNoiseLite,
}

impl NoiseBiomes {
    pub fn new(seed: i64) -> Self {
        NoiseBiomes {
            temperature: create_noise(seed, 3, 0.008),
            moisture: create_noise(seed, 4, 0.01),
            continents: create_noise(seed, 0, 0.002),
        }
    }
}

impl BiomeSource for NoiseBiomes {
    fn biome_at(&self, x: i32, z: i32) -> BiomeKey {
        let (xf, zf) = (x as f32, z as f32);
        if self.continents.get_noise_2d(xf, zf) < -0.4 {
            return BiomeKey::new("ocean");
        }
        let temp = self.temperature.get_noise_2d(xf, zf);
        let moist = self.moisture.get_noise_2d(xf, zf);
        let name = if temp < -0.4 {
            "tundra"
        } else if temp < -0.1 {
            "taiga"
        } else if temp > 0.4 && moist < 0.0 {
            "desert"
        } else if moist > 0.4 {
            "swamp"
        } else if moist > 0.1 {
            "forest"
        } else {
            "plains"
        };
        BiomeKey::new(name)
    }
}

struct SurfaceSet {
    stone: HostBlock,
    dirt: HostBlock,
    grass: HostBlock,
    sand: HostBlock,
    snow: HostBlock,
    water: HostBlock,
    bedrock: HostBlock,
}

pub struct NoiseEngine {
    terrain: FastNoiseLite,
    detail: FastNoiseLite,
    blocks: SurfaceSet,
}

impl NoiseEngine {
    pub fn new(seed: i64, codec: &BlockStateCodec) -> Self {
        let host = |ident: &str| codec.to_host(&BlockStateKey::new(ident));
        NoiseEngine {
            terrain: create_fbm_noise(seed, 1, 0.008),
            detail: create_fbm_noise(seed, 2, 0.015),
            blocks: SurfaceSet {
                stone: host("stone"),
                dirt: host("dirt"),
                grass: host("grass_block"),
                sand: host("sand"),
                snow: host("snow_block"),
                water: host("water"),
                bedrock: host("bedrock"),
            },
        }
    }

    fn surface_height(&self, x: i32, z: i32) -> i32 {
        let (xf, zf) = (x as f32, z as f32);
        let base = self.terrain.get_noise_2d(xf, zf) * 24.0;
        let fine = self.detail.get_noise_2d(xf, zf) * 6.0;
        (SEA_LEVEL as f32 + base + fine) as i32
    }

    fn surface_block(&self, biome: &BiomeKey, height: i32) -> HostBlock {
        if height < SEA_LEVEL {
            return self.blocks.sand;
        }
        match biome.name() {
            "desert" | "beach" | "ocean" => self.blocks.sand,
            "tundra" => self.blocks.snow,
            _ => self.blocks.grass,
        }
    }
}

impl TerrainEngine for NoiseEngine {
    fn fill_chunk(
        &self,
        chunk: &mut dyn ChunkSink,
        biomes: &dyn BiomeSource,
        cx: i32,
        cz: i32,
    ) -> Result<(), GenError> {
        let base_x = cx * CHUNK_SIZE;
        let base_z = cz * CHUNK_SIZE;

        for lx in 0..CHUNK_SIZE {
            for lz in 0..CHUNK_SIZE {
                let wx = base_x + lx;
                let wz = base_z + lz;
                let biome = biomes.biome_at(wx, wz);
                let height = self.surface_height(wx, wz).clamp(1, WORLD_HEIGHT - 1);

                chunk.set_block(lx, 0, lz, self.blocks.bedrock);
                for y in 1..height - 3 {
                    chunk.set_block(lx, y, lz, self.blocks.stone);
                }
                for y in (height - 3).max(1)..height {
                    chunk.set_block(lx, y, lz, self.blocks.dirt);
                }
                chunk.set_block(lx, height, lz, self.surface_block(&biome, height));
                for y in height + 1..SEA_LEVEL {
                    chunk.set_block(lx, y, lz, self.blocks.water);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chunk::Chunk;

    fn noise_profile() -> NoiseProfile {
        NoiseProfile::new("reference", Arc::new(BlockStateCodec::with_defaults()))
    }

    #[test]
    fn test_options_from_json_with_aliases() {
        let opts: GeneratorOptions =
            serde_json::from_str(r#"{"preset": "skylands", "worldName": "w1", "seed": 99}"#)
                .unwrap();
        assert_eq!(opts.profile_hint(), Some("skylands"));
        assert_eq!(opts.world_name.as_deref(), Some("w1"));
        assert_eq!(opts.seed, Some(99));
    }

    #[test]
    fn test_options_from_generator_name() {
        assert_eq!(
            GeneratorOptions::from_generator_name("worldforge:oasis").profile_hint(),
            Some("oasis")
        );
        assert_eq!(
            GeneratorOptions::from_generator_name("oasis").profile_hint(),
            Some("oasis")
        );
        assert_eq!(
            GeneratorOptions::from_generator_name("worldforge:").profile_hint(),
            None
        );
    }

    #[test]
    fn test_static_provider_lookup_ignores_case() {
        let provider = StaticProfiles::with_default(vec![
            Arc::new(noise_profile()) as Arc<dyn GenerationProfile>
        ]);
        assert!(provider.get_by_name("Reference").is_some());
        assert!(provider.get_by_name("missing").is_none());
        assert!(provider.default_profile().is_some());
    }

    #[test]
    fn test_engine_is_deterministic_per_seed() {
        let profile = noise_profile();
        let (engine_a, biomes_a) = profile.build(42).unwrap();
        let (engine_b, biomes_b) = profile.build(42).unwrap();

        let mut chunk_a = Chunk::new(5, -3);
        let mut chunk_b = Chunk::new(5, -3);
        engine_a.fill_chunk(&mut chunk_a, biomes_a.as_ref(), 5, -3).unwrap();
        engine_b.fill_chunk(&mut chunk_b, biomes_b.as_ref(), 5, -3).unwrap();

        for (x, z) in [(0, 0), (7, 9), (15, 15)] {
            for y in [0, 40, 63, 70, 200] {
                assert_eq!(chunk_a.get_block(x, y, z), chunk_b.get_block(x, y, z));
            }
        }
    }

    #[test]
    fn test_engine_layers_are_sane() {
        let profile = noise_profile();
        let (engine, biomes) = profile.build(7).unwrap();
        let mut chunk = Chunk::new(0, 0);
        engine.fill_chunk(&mut chunk, biomes.as_ref(), 0, 0).unwrap();

        let codec = BlockStateCodec::with_defaults();
        let bedrock = codec.to_host(&BlockStateKey::new("bedrock"));
        let stone = codec.to_host(&BlockStateKey::new("stone"));
        for x in 0..CHUNK_SIZE {
            for z in 0..CHUNK_SIZE {
                assert_eq!(chunk.get_block(x, 0, z), bedrock);
                assert_eq!(chunk.get_block(x, 10, z), stone);
                // Columns either reach a surface or are submerged, never
                // solid all the way up.
                assert_eq!(chunk.get_block(x, WORLD_HEIGHT - 1, z), HostBlock::AIR);
            }
        }
    }
}
