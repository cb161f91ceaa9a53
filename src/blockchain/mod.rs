pub mod block;
pub mod miner;
pub mod model;
pub mod validate;

pub use block::{Block, BlockHeader};
pub use miner::{CancelToken, Miner};
pub use model::{Blockchain, parse_chain, verify_links};
pub use validate::{Rejection, check_next, is_valid_next, meets_difficulty};

/// Default Proof-of-Work difficulty, in bits (five leading hex zeros).
pub const DEFAULT_DIFFICULTY: u32 = 20;

/// Difficulty is expressed in bits but checked on whole hex nibbles.
pub const BITS_PER_HEX_DIGIT: u32 = 4;

/// Separates the fields of one serialized block.
pub const FIELD_SEPARATOR: char = ',';

/// Separates blocks in a serialized chain.
pub const BLOCK_SEPARATOR: char = ';';

/// Fixed genesis content, shared by every node.
pub const GENESIS_HASH: &str = "GENESIS_BLOCK";
pub const GENESIS_PREVIOUS_HASH: &str = "GENESIS_PREVIOUS_HASH";
pub const GENESIS_DATA: &str = "GENESIS_RANDOM_DATA";
pub const GENESIS_TIMESTAMP: i64 = 0;
