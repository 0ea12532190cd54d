use crate::number_theory::mod_pow;
use crate::primality::PrimalityTest;
use num_bigint::{BigUint, RandBigInt};
use num_integer::Integer;
use num_traits::One;
use rand::thread_rng;

/// Структура, реализующая тест Миллера–Рабина
pub struct MillerRabinTest;

impl PrimalityTest for MillerRabinTest {
    fn run_iteration(&self, n: &BigUint) -> bool {
        let one = BigUint::one();
        let two = BigUint::from(2u32);
        let three = BigUint::from(3u32);

        if n < &two {
            return false;
        }
        if n == &two || n == &three {
            return true;
        }
        if n.is_even() {
            return false;
        }

        // n - 1 = d * 2^s, d нечётное
        let n_minus_1 = n - &one;
        let s = n_minus_1.trailing_zeros().unwrap_or(0);
        let d = &n_minus_1 >> s;

        let mut rng = thread_rng();
        let a = rng.gen_biguint_range(&two, &n_minus_1);
        let mut x = mod_pow(&a, &d, n);

        if x == one || x == n_minus_1 {
            return true;
        }

        for _ in 1..s {
            x = mod_pow(&x, &two, n);
            if x == n_minus_1 {
                return true;
            }
            if x == one {
                return false;
            }
        }

        false
    }
}
