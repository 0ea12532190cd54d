use crate::padding::to_block;
use crate::rsa::RsaService;
use num_bigint::BigUint;
use std::sync::atomic::{AtomicU64, Ordering};

/// Оракул паддинга: отвечает только на один вопрос — начинается ли
/// расшифрованный блок с байтов 00 02. Каждый вызов — одно RSA-дешифрование.
pub trait PaddingOracle {
    fn is_conformant(&self, ciphertext: &BigUint) -> bool;
}

/// Оракул поверх локального ключа RSA, считает обращения к себе
pub struct RsaPaddingOracle {
    service: RsaService,
    block_len: usize,
    queries: AtomicU64,
}

impl RsaPaddingOracle {
    pub fn new(service: RsaService) -> Self {
        let block_len = service.modulus_byte_len();
        Self {
            service,
            block_len,
            queries: AtomicU64::new(0),
        }
    }

    pub fn query_count(&self) -> u64 {
        self.queries.load(Ordering::Relaxed)
    }
}

impl PaddingOracle for RsaPaddingOracle {
    fn is_conformant(&self, ciphertext: &BigUint) -> bool {
        self.queries.fetch_add(1, Ordering::Relaxed);
        let plaintext = self.service.decrypt(ciphertext);
        let block = to_block(&plaintext, self.block_len);
        block.len() == self.block_len && block[0] == 0x00 && block[1] == 0x02
    }
}
