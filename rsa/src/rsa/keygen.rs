use crate::number_theory::{gcd, invmod};
use crate::primality::{MillerRabinTest, PrimalityTest};
use num_bigint::{BigUint, RandBigInt};
use num_traits::One;
use rand::thread_rng;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeygenError {
    #[error("p and q must be distinct primes")]
    PrimesEqual,
    #[error("e is not coprime with phi(n)")]
    NotCoprime,
}

/// Структура открытого и закрытого ключа RSA
pub struct RsaKeyPair {
    pub n: BigUint,
    pub e: BigUint,
    pub d: BigUint,
}

impl RsaKeyPair {
    /// Сборка пары ключей из готовых простых p и q.
    /// Проверки простоты нет — вызывающая сторона отвечает за неё сама.
    pub fn from_primes(p: BigUint, q: BigUint, e: BigUint) -> Result<Self, KeygenError> {
        if p == q {
            return Err(KeygenError::PrimesEqual);
        }
        let one = BigUint::one();
        let n = &p * &q;
        let phi = (&p - &one) * (&q - &one);
        if gcd(&e, &phi) != one {
            return Err(KeygenError::NotCoprime);
        }
        let d = invmod(&e, &phi).expect("coprimality checked above");
        Ok(RsaKeyPair { n, e, d })
    }

    /// Длина модуля в байтах
    pub fn modulus_byte_len(&self) -> usize {
        ((self.n.bits() + 7) / 8) as usize
    }
}

/// Сервис генерации ключей RSA
pub struct RsaKeyGenerator {
    confidence: f64,
    bit_length: usize,
}

impl RsaKeyGenerator {
    /// Создание нового генератора
    pub fn new(confidence: f64, bit_length: usize) -> Self {
        Self { confidence, bit_length }
    }

    /// Генерация пары ключей RSA, с защитой от атак Ферма и Винера
    pub fn generate_keypair(&self) -> RsaKeyPair {
        let test = MillerRabinTest;
        let one = BigUint::one();
        let e = BigUint::from(65537u32);
        let half_bits = self.bit_length / 2;
        let min_diff = BigUint::one() << (self.bit_length / 4);

        let mut rng = thread_rng();

        loop {
            let p = loop {
                let mut candidate = rng.gen_biguint(half_bits as u64);
                candidate.set_bit((half_bits - 1) as u64, true);
                if test.is_probably_prime(&candidate, self.confidence) {
                    break candidate;
                }
            };

            let q = loop {
                let mut candidate = rng.gen_biguint(half_bits as u64);
                candidate.set_bit((half_bits - 1) as u64, true);
                if candidate != p
                    && test.is_probably_prime(&candidate, self.confidence)
                    && (&p > &candidate && &p - &candidate > min_diff
                        || &candidate > &p && &candidate - &p > min_diff)
                {
                    break candidate;
                }
            };

            let n = &p * &q;
            if n.bits() < self.bit_length as u64 {
                continue; // пробуем заново
            }

            let phi = (&p - &one) * (&q - &one);
            if gcd(&e, &phi) != one {
                continue;
            }

            let d = invmod(&e, &phi).expect("coprimality checked above");
            if d.bits() < (self.bit_length / 4) as u64 {
                continue;
            }

            return RsaKeyPair { n, e, d };
        }
    }
}
