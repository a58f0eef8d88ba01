//! Shared on-disk primitives used by the write-ahead log and the manifest:
//! CRC-framed byte frames, unsigned varints, and the mutation record replayed
//! at recovery.

mod error;
mod frame;
pub mod key;
mod mutation;
pub mod varint;

pub use error::RecordError;
pub use frame::{read_frame, write_frame, MAX_FRAME_LEN};
pub use key::internal_key;
pub use mutation::{Op, Record};
