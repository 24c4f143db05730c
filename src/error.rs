use thiserror::Error;

/// Errors raised inside the generation core.
///
/// Every variant is resolved at the chunk boundary by falling back to flat
/// terrain; none of them escape `ChunkPipeline::generate`.
#[derive(Debug, Error)]
pub enum GenError {
    #[error("could not attribute the call to a world")]
    IdentityUnresolved,

    #[error("generation profile `{0}` not found")]
    ProfileMissing(String),

    #[error("failed to construct generator for world `{world}`: {reason}")]
    ConstructionFailed { world: String, reason: String },

    #[error("generator construction re-entered beyond depth {0}")]
    RecursionExceeded(u32),

    #[error("terrain engine error: {0}")]
    Engine(String),
}

impl GenError {
    pub fn construction(world: &str, reason: impl Into<String>) -> Self {
        GenError::ConstructionFailed {
            world: world.to_string(),
            reason: reason.into(),
        }
    }
}
