use crate::number_theory::{ceil_div, floor_div};
use num_bigint::BigUint;
use num_traits::{One, Zero};
use std::collections::BTreeSet;

/// Границы, выводимые из модуля n один раз на запуск атаки:
/// k — длина модуля в байтах, B = 2^(8(k-2)), b2 = 2B, b3 = 3B.
/// Любой конформный открытый текст лежит в [b2, b3 - 1].
#[derive(Clone, Debug)]
pub struct Bounds {
    pub n: BigUint,
    pub k: usize,
    pub b2: BigUint,
    pub b3: BigUint,
}

impl Bounds {
    pub fn from_modulus(n: &BigUint) -> Self {
        let k = ((n.bits() + 7) / 8) as usize;
        assert!(k >= 3, "modulus too small for PKCS#1 v1.5");
        let b = BigUint::one() << (8 * (k - 2));
        Bounds {
            n: n.clone(),
            k,
            b2: &b * 2u32,
            b3: &b * 3u32,
        }
    }
}

/// Замкнутый целочисленный интервал [low, high]
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Interval {
    pub low: BigUint,
    pub high: BigUint,
}

impl Interval {
    pub fn new(low: BigUint, high: BigUint) -> Self {
        debug_assert!(low <= high);
        Interval { low, high }
    }

    pub fn contains(&self, value: &BigUint) -> bool {
        &self.low <= value && value <= &self.high
    }

    pub fn volume(&self) -> BigUint {
        &self.high - &self.low + BigUint::one()
    }

    pub fn is_point(&self) -> bool {
        self.low == self.high
    }
}

/// Множество непересекающихся интервалов-кандидатов. Упорядочено по (low, high),
/// повторная вставка одного и того же интервала ничего не меняет.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct IntervalSet {
    intervals: BTreeSet<Interval>,
}

impl IntervalSet {
    /// Стартовое множество: единственный интервал [2B, 3B - 1]
    pub fn full_range(bounds: &Bounds) -> Self {
        let mut intervals = BTreeSet::new();
        intervals.insert(Interval::new(
            bounds.b2.clone(),
            &bounds.b3 - BigUint::one(),
        ));
        IntervalSet { intervals }
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Interval> {
        self.intervals.iter()
    }

    pub fn first(&self) -> Option<&Interval> {
        self.intervals.iter().next()
    }

    pub fn contains(&self, value: &BigUint) -> bool {
        self.intervals.iter().any(|i| i.contains(value))
    }

    /// Суммарный объём: Σ (high - low + 1)
    pub fn volume(&self) -> BigUint {
        self.intervals.iter().map(Interval::volume).sum()
    }

    /// Some(low), когда множество стянулось в одну точку — условие остановки
    pub fn as_point(&self) -> Option<&BigUint> {
        if self.intervals.len() != 1 {
            return None;
        }
        let interval = self.first()?;
        if interval.is_point() {
            Some(&interval.low)
        } else {
            None
        }
    }
}

impl FromIterator<Interval> for IntervalSet {
    fn from_iter<T: IntoIterator<Item = Interval>>(iter: T) -> Self {
        IntervalSet {
            intervals: iter.into_iter().collect(),
        }
    }
}

/// Шаг 3: сужение множества по свежему множителю s.
///
/// Для каждого интервала [a, b] перебираются числа оборотов
/// r ∈ [⌈(a·s - 3B + 1) / n⌉, ⌈(b·s - 2B) / n⌉) и для каждого r оставляется
/// пересечение [a, b] с [⌈(2B + r·n) / s⌉, ⌊(3B - 1 + r·n) / s⌋].
/// Направления округления здесь существенны: ошибка в них молча выбрасывает
/// интервал с истинным открытым текстом.
///
/// Чистая функция: один и тот же вход всегда даёт один и тот же результат.
pub fn refine(m: &IntervalSet, s: &BigUint, bounds: &Bounds) -> IntervalSet {
    let one = BigUint::one();
    let n = &bounds.n;
    let mut intervals = BTreeSet::new();

    for interval in m.iter() {
        let a = &interval.low;
        let b = &interval.high;
        let a_s = a * s;
        let b_s = b * s;

        let r_low = if &a_s + &one > bounds.b3 {
            ceil_div(&(&a_s - &bounds.b3 + &one), n)
        } else {
            BigUint::zero()
        };
        // верхняя граница исключающая
        let r_high = if b_s > bounds.b2 {
            ceil_div(&(&b_s - &bounds.b2), n)
        } else {
            BigUint::zero()
        };

        let mut r = r_low;
        while r < r_high {
            let r_n = &r * n;
            let low = ceil_div(&(&bounds.b2 + &r_n), s).max(a.clone());
            let high = floor_div(&(&bounds.b3 - &one + &r_n), s).min(b.clone());
            if low <= high {
                intervals.insert(Interval::new(low, high));
            }
            r += &one;
        }
    }

    IntervalSet { intervals }
}
