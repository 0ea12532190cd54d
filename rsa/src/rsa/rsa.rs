use crate::rsa::keygen::{RsaKeyGenerator, RsaKeyPair};
use num_bigint::BigUint;

pub struct RsaService {
    keypair: RsaKeyPair,
}

impl RsaService {
    pub fn new(confidence: f64, bit_length: usize) -> Self {
        let generator = RsaKeyGenerator::new(confidence, bit_length);
        let keypair = generator.generate_keypair();
        Self { keypair }
    }

    /// Сервис поверх уже собранной пары ключей
    pub fn from_keypair(keypair: RsaKeyPair) -> Self {
        Self { keypair }
    }

    pub fn encrypt(&self, m: &BigUint) -> BigUint {
        if m >= &self.keypair.n {
            panic!("message too large");
        }
        m.modpow(&self.keypair.e, &self.keypair.n)
    }

    pub fn decrypt(&self, ciphertext: &BigUint) -> BigUint {
        ciphertext.modpow(&self.keypair.d, &self.keypair.n)
    }

    pub fn public_key(&self) -> (BigUint, BigUint) {
        (self.keypair.n.clone(), self.keypair.e.clone())
    }

    pub fn private_key(&self) -> (BigUint, BigUint) {
        (self.keypair.n.clone(), self.keypair.d.clone())
    }

    /// Длина модуля в байтах
    pub fn modulus_byte_len(&self) -> usize {
        self.keypair.modulus_byte_len()
    }
}
