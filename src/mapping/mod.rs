pub mod codec;
pub mod rules;
pub mod tables;

pub use codec::BlockStateCodec;
pub use rules::{FallbackChain, FallbackRule, Pattern, PLACEHOLDER};
pub use tables::{BlockEntry, MappingTables, StateEntry};
