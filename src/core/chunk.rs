use crate::constants::*;
use crate::core::block::HostBlock;

/// Mutable block-writing surface handed to the terrain engine.
///
/// The pipeline owns the concrete buffer; the engine only sees this trait so
/// a host can substitute its own chunk storage.
pub trait ChunkSink {
    fn set_block(&mut self, x: i32, y: i32, z: i32, block: HostBlock);
    fn get_block(&self, x: i32, y: i32, z: i32) -> HostBlock;
    fn set_biome(&mut self, x: i32, z: i32, biome: u8);
}

/// One generated chunk: a full-height column of host blocks plus a 16x16
/// biome grid. Out-of-range writes are ignored, matching how the host's
/// chunk surface behaves.
pub struct Chunk {
    pub cx: i32,
    pub cz: i32,
    blocks: Vec<HostBlock>,
    biomes: [u8; (CHUNK_SIZE * CHUNK_SIZE) as usize],
}

impl Chunk {
    pub fn new(cx: i32, cz: i32) -> Self {
        Chunk {
            cx,
            cz,
            blocks: vec![HostBlock::AIR; (CHUNK_SIZE * WORLD_HEIGHT * CHUNK_SIZE) as usize],
            biomes: [HOST_BIOME_PLAINS; (CHUNK_SIZE * CHUNK_SIZE) as usize],
        }
    }

    fn in_bounds(x: i32, y: i32, z: i32) -> bool {
        x >= 0 && x < CHUNK_SIZE && y >= 0 && y < WORLD_HEIGHT && z >= 0 && z < CHUNK_SIZE
    }

    fn index(x: i32, y: i32, z: i32) -> usize {
        ((y * CHUNK_SIZE + x) * CHUNK_SIZE + z) as usize
    }

    pub fn biome(&self, x: i32, z: i32) -> u8 {
        if x >= 0 && x < CHUNK_SIZE && z >= 0 && z < CHUNK_SIZE {
            self.biomes[(x * CHUNK_SIZE + z) as usize]
        } else {
            HOST_BIOME_PLAINS
        }
    }
}

impl ChunkSink for Chunk {
    fn set_block(&mut self, x: i32, y: i32, z: i32, block: HostBlock) {
        if Self::in_bounds(x, y, z) {
            self.blocks[Self::index(x, y, z)] = block;
        }
    }

    fn get_block(&self, x: i32, y: i32, z: i32) -> HostBlock {
        if Self::in_bounds(x, y, z) {
            self.blocks[Self::index(x, y, z)]
        } else {
            HostBlock::AIR
        }
    }

    fn set_biome(&mut self, x: i32, z: i32, biome: u8) {
        if x >= 0 && x < CHUNK_SIZE && z >= 0 && z < CHUNK_SIZE {
            self.biomes[(x * CHUNK_SIZE + z) as usize] = biome;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_roundtrip() {
        let mut chunk = Chunk::new(0, 0);
        let stone = HostBlock::new(HOST_STONE, 0);
        chunk.set_block(3, 100, 7, stone);
        assert_eq!(chunk.get_block(3, 100, 7), stone);
        assert_eq!(chunk.get_block(3, 101, 7), HostBlock::AIR);
    }

    #[test]
    fn test_out_of_bounds_ignored() {
        let mut chunk = Chunk::new(0, 0);
        chunk.set_block(-1, 0, 0, HostBlock::new(HOST_STONE, 0));
        chunk.set_block(0, WORLD_HEIGHT, 0, HostBlock::new(HOST_STONE, 0));
        assert_eq!(chunk.get_block(-1, 0, 0), HostBlock::AIR);
        assert_eq!(chunk.get_block(0, WORLD_HEIGHT, 0), HostBlock::AIR);
    }

    #[test]
    fn test_biome_defaults_to_plains() {
        let mut chunk = Chunk::new(0, 0);
        assert_eq!(chunk.biome(5, 5), HOST_BIOME_PLAINS);
        chunk.set_biome(5, 5, HOST_BIOME_DESERT);
        assert_eq!(chunk.biome(5, 5), HOST_BIOME_DESERT);
    }
}
