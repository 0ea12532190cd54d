pub mod pkcs1_v15;

pub use pkcs1_v15::{pad, to_block, unpad, PaddingError};
