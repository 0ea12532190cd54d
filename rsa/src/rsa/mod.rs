pub mod keygen;
pub mod rsa;

pub use keygen::{KeygenError, RsaKeyGenerator, RsaKeyPair};
pub use rsa::RsaService;
