use num_bigint::BigUint;
use num_traits::One;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use rsa_attacks::attacks::{
    refine, BleichenbacherAttack, BleichenbacherError, Bounds, IntervalSet, ProgressEvent,
    SearchPhase,
};
use rsa_attacks::oracle::RsaPaddingOracle;
use rsa_attacks::padding;
use rsa_attacks::rsa::{RsaKeyPair, RsaService};

const MESSAGE: &[u8] = b"kick it, CC";

/// 255-битный модуль из простых 2^127 - 1 и 2^128 - 159 — «простой случай»,
/// после первого множителя остаётся один интервал и работает быстрый поиск
fn small_keypair() -> RsaKeyPair {
    let p = (BigUint::one() << 127u32) - 1u32;
    let q = (BigUint::one() << 128u32) - 159u32;
    RsaKeyPair::from_primes(p, q, BigUint::from(65537u32)).unwrap()
}

/// 768-битный модуль из заведомо неравных простых 2^512 - 569 и 2^256 - 189 —
/// «полный случай», где достижим и линейный поиск по нескольким интервалам
fn large_keypair() -> RsaKeyPair {
    let p = (BigUint::one() << 512u32) - 569u32;
    let q = (BigUint::one() << 256u32) - 189u32;
    RsaKeyPair::from_primes(p, q, BigUint::from(65537u32)).unwrap()
}

fn encrypt_padded(service: &RsaService, message: &[u8], seed: u64) -> (BigUint, BigUint) {
    let k = service.modulus_byte_len();
    let mut rng = StdRng::seed_from_u64(seed);
    let block = padding::pad(message, k, &mut rng).unwrap();
    let m = BigUint::from_bytes_be(&block);
    (service.encrypt(&m), m)
}

#[test]
fn test_simple_case_recovers_message() {
    let _ = env_logger::builder().is_test(true).try_init();

    let keypair = small_keypair();
    let (n, e) = (keypair.n.clone(), keypair.e.clone());
    let service = RsaService::from_keypair(keypair);
    let (c, m_true) = encrypt_padded(&service, MESSAGE, 42);
    let oracle = RsaPaddingOracle::new(service);

    let attack = BleichenbacherAttack::new(&oracle, &n, &e);
    let mut events = Vec::new();
    let outcome = attack
        .recover_with_observer(&c, &mut |event| events.push(event.clone()))
        .expect("атака обязана завершиться восстановлением");

    assert_eq!(outcome.message, MESSAGE);
    assert_eq!(outcome.padded, m_true);
    assert_eq!(outcome.oracle_queries, oracle.query_count());

    verify_refinement_trace(&events, &n, &m_true);

    // первый множитель всегда ищется линейно от ⌈n / 3B⌉,
    // дальше малый модуль почти сразу отдаёт работу быстрому поиску
    for event in &events {
        if let ProgressEvent::PhaseStarted { iteration, phase } = event {
            if *iteration == 1 {
                assert_eq!(*phase, SearchPhase::Initial);
            } else {
                assert_ne!(*phase, SearchPhase::Initial);
            }
        }
    }
    assert!(
        events.iter().any(|e| matches!(
            e,
            ProgressEvent::PhaseStarted {
                phase: SearchPhase::SingleInterval,
                ..
            }
        )),
        "быстрый поиск по одному интервалу должен был включиться"
    );
}

#[test]
fn test_fast_search_query_count_is_sublinear() {
    let keypair = small_keypair();
    let (n, e) = (keypair.n.clone(), keypair.e.clone());
    let service = RsaService::from_keypair(keypair);
    let (c, _) = encrypt_padded(&service, MESSAGE, 42);
    let oracle = RsaPaddingOracle::new(service);

    let attack = BleichenbacherAttack::new(&oracle, &n, &e);
    let mut events = Vec::new();
    attack
        .recover_with_observer(&c, &mut |event| events.push(event.clone()))
        .unwrap();

    // объём стартового интервала — B = 2^240 кандидатов; быстрый поиск обязан
    // укладываться на порядки ниже любого линейного прохода по нему
    let bounds = Bounds::from_modulus(&n);
    let initial_volume = IntervalSet::full_range(&bounds).volume();
    assert!(initial_volume > (BigUint::one() << 200u32));

    let fast_queries = queries_per_phase(&events, SearchPhase::SingleInterval);
    assert!(
        fast_queries < 1_000_000,
        "быстрый поиск израсходовал {} запросов",
        fast_queries
    );
}

#[test]
fn test_complete_case_recovers_message() {
    let _ = env_logger::builder().is_test(true).try_init();

    let keypair = large_keypair();
    let (n, e) = (keypair.n.clone(), keypair.e.clone());
    let service = RsaService::from_keypair(keypair);
    // при этом зерне сужение даёт больше одного интервала, так что
    // линейный поиск от s + 1 по нескольким интервалам точно отработает
    let (c, m_true) = encrypt_padded(&service, MESSAGE, 2);
    let oracle = RsaPaddingOracle::new(service);

    let attack = BleichenbacherAttack::new(&oracle, &n, &e);
    let mut events = Vec::new();
    let outcome = attack
        .recover_with_observer(&c, &mut |event| events.push(event.clone()))
        .expect("полный случай также обязан завершиться");

    assert_eq!(outcome.message, MESSAGE);
    assert_eq!(outcome.padded, m_true);
    verify_refinement_trace(&events, &n, &m_true);

    assert!(
        events.iter().any(|e| matches!(
            e,
            ProgressEvent::PhaseStarted {
                phase: SearchPhase::MultiInterval,
                ..
            }
        )),
        "поиск по нескольким интервалам ни разу не включился"
    );
    assert!(
        events.iter().any(|e| matches!(
            e,
            ProgressEvent::Refined { intervals, .. } if intervals.len() > 1
        )),
        "сужение ни разу не дало больше одного интервала"
    );
}

#[test]
fn test_non_conformant_ciphertext_is_rejected() {
    let keypair = small_keypair();
    let (n, e) = (keypair.n.clone(), keypair.e.clone());
    let service = RsaService::from_keypair(keypair);
    // случайное число почти наверняка расшифруется без префикса 00 02
    let c = service.encrypt(&BigUint::from(0xDEADBEEFu32));
    let oracle = RsaPaddingOracle::new(service);

    let attack = BleichenbacherAttack::new(&oracle, &n, &e);
    assert!(matches!(
        attack.recover(&c),
        Err(BleichenbacherError::NonConformantCiphertext)
    ));
}

#[test]
fn test_iteration_limit_is_enforced() {
    let keypair = small_keypair();
    let (n, e) = (keypair.n.clone(), keypair.e.clone());
    let service = RsaService::from_keypair(keypair);
    let (c, _) = encrypt_padded(&service, MESSAGE, 42);
    let oracle = RsaPaddingOracle::new(service);

    let attack = BleichenbacherAttack::new(&oracle, &n, &e).with_iteration_limit(1);
    assert!(matches!(
        attack.recover(&c),
        Err(BleichenbacherError::IterationLimitExceeded(1))
    ));
}

#[test]
fn test_cancellation_between_queries() {
    let keypair = small_keypair();
    let (n, e) = (keypair.n.clone(), keypair.e.clone());
    let service = RsaService::from_keypair(keypair);
    let (c, _) = encrypt_padded(&service, MESSAGE, 42);
    let oracle = RsaPaddingOracle::new(service);

    let flag = Arc::new(AtomicBool::new(true));
    let attack = BleichenbacherAttack::new(&oracle, &n, &e).with_cancel_flag(flag);
    assert!(matches!(
        attack.recover(&c),
        Err(BleichenbacherError::Cancelled)
    ));
}

#[test]
fn test_blinding_factor_without_inverse_is_rejected() {
    let keypair = small_keypair();
    let (n, e) = (keypair.n.clone(), keypair.e.clone());
    let service = RsaService::from_keypair(keypair);
    let (c, _) = encrypt_padded(&service, MESSAGE, 42);
    let oracle = RsaPaddingOracle::new(service);

    let attack = BleichenbacherAttack::new(&oracle, &n, &e).with_blinding(n.clone());
    assert!(matches!(
        attack.recover(&c),
        Err(BleichenbacherError::InvalidBlindingFactor)
    ));
}

/// Пересчитывает всю цепочку сужений по событиям атаки и проверяет три
/// свойства: истинное значение никогда не покидает объединение интервалов,
/// суммарный объём не растёт, а само сужение — чистая функция входа.
fn verify_refinement_trace(events: &[ProgressEvent], n: &BigUint, m_true: &BigUint) {
    let bounds = Bounds::from_modulus(n);
    let mut m_prev = IntervalSet::full_range(&bounds);
    let mut last_volume = m_prev.volume();
    let mut last_s: Option<BigUint> = None;
    let mut refinements = 0u32;

    for event in events {
        match event {
            ProgressEvent::MultiplierFound { s, .. } => last_s = Some(s.clone()),
            ProgressEvent::Refined {
                intervals, volume, ..
            } => {
                let s = last_s.clone().expect("сужению предшествует множитель");
                let replayed = refine(&m_prev, &s, &bounds);
                let reported: IntervalSet = intervals.iter().cloned().collect();
                assert_eq!(replayed, reported, "движок и повтор расходятся");
                assert_eq!(refine(&m_prev, &s, &bounds), replayed, "сужение не детерминировано");

                assert!(reported.contains(m_true), "истинное значение потеряно");
                assert!(volume <= &last_volume, "объём множества вырос");
                assert_eq!(volume, &reported.volume());

                last_volume = volume.clone();
                m_prev = reported;
                refinements += 1;
            }
            ProgressEvent::PhaseStarted { .. } => {}
        }
    }
    assert!(refinements > 0);
}

/// Сумма запросов к оракулу, потраченных на поиски в заданной фазе
fn queries_per_phase(events: &[ProgressEvent], wanted: SearchPhase) -> u64 {
    let mut current_phase = None;
    // один запрос уходит на проверку якоря до начала поиска
    let mut prev_queries = 1u64;
    let mut total = 0u64;

    for event in events {
        match event {
            ProgressEvent::PhaseStarted { phase, .. } => current_phase = Some(*phase),
            ProgressEvent::MultiplierFound { queries, .. } => {
                if current_phase == Some(wanted) {
                    total += queries - prev_queries;
                }
                prev_queries = *queries;
            }
            ProgressEvent::Refined { .. } => {}
        }
    }
    total
}
