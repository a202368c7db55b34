//! roe-engine: turn files into bitmap containers and back
//!
//!   - `engine`: one source file ↔ one or more containers
//!   - `tree`: explicit input lists and recursive directory walks, with
//!     multi-part reconstructions deduplicated by destination path

pub mod engine;
pub mod tree;

pub use engine::{decrypt_file, decrypt_joined, encrypt_file, DecryptResult, EncryptResult};
pub use tree::{
    collect_files, decrypt_inputs, decrypt_tree, encrypt_inputs, encrypt_tree, BatchSummary,
    ProgressFn,
};
