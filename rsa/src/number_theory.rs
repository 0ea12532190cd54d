use num_bigint::{BigInt, BigUint};
use num_integer::Integer;
use num_traits::{One, Zero};

pub fn gcd(a: &BigUint, b: &BigUint) -> BigUint {
    let mut a = a.clone();
    let mut b = b.clone();
    while !b.is_zero() {
        let r = a % &b;
        a = b;
        b = r;
    }
    a
}

/// Возвращает (g, x, y) такие что: ax + by = g = gcd(a, b)
pub fn extended_gcd(a: &BigInt, b: &BigInt) -> (BigInt, BigInt, BigInt) {
    let (mut old_r, mut r) = (a.clone(), b.clone());
    let (mut old_s, mut s) = (BigInt::one(), BigInt::zero());
    let (mut old_t, mut t) = (BigInt::zero(), BigInt::one());

    while !r.is_zero() {
        let q = &old_r / &r;

        let tmp_r = old_r - &q * &r;
        old_r = r;
        r = tmp_r;

        let tmp_s = old_s - &q * &s;
        old_s = s;
        s = tmp_s;

        let tmp_t = old_t - &q * &t;
        old_t = t;
        t = tmp_t;
    }

    (old_r, old_s, old_t)
}

/// Обратный элемент по модулю: a⁻¹ mod n, существует только при gcd(a, n) = 1
pub fn invmod(a: &BigUint, n: &BigUint) -> Option<BigUint> {
    if n.is_zero() {
        return None;
    }
    let a_int = BigInt::from(a.clone());
    let n_int = BigInt::from(n.clone());
    let (g, x, _) = extended_gcd(&a_int, &n_int);
    if !g.is_one() {
        return None;
    }
    let inv = ((x % &n_int) + &n_int) % &n_int;
    inv.to_biguint()
}

/// Возведение в степень по модулю: base^exp mod modulus
pub fn mod_pow(base: &BigUint, exponent: &BigUint, modulus: &BigUint) -> BigUint {
    if modulus.is_zero() {
        return BigUint::zero();
    }
    let mut base = base.clone() % modulus;
    let mut exp = exponent.clone();
    // приведение по модулю сразу, иначе при modulus = 1 вернётся 1 вместо 0
    let mut result = BigUint::one() % modulus;

    while !exp.is_zero() {
        if exp.is_odd() {
            result = (result * &base) % modulus;
        }
        base = (&base * &base) % modulus;
        exp >>= 1;
    }
    result
}

/// Деление с округлением вверх: ⌈x / y⌉
pub fn ceil_div(x: &BigUint, y: &BigUint) -> BigUint {
    let (q, r) = x.div_rem(y);
    if r.is_zero() { q } else { q + BigUint::one() }
}

/// Деление с округлением вниз: ⌊x / y⌋
pub fn floor_div(x: &BigUint, y: &BigUint) -> BigUint {
    x / y
}
