use num_bigint::BigUint;
use rand::thread_rng;

use rsa_attacks::attacks::BleichenbacherAttack;
use rsa_attacks::oracle::RsaPaddingOracle;
use rsa_attacks::padding;
use rsa_attacks::rsa::RsaService;

fn main() {
    env_logger::init();

    // 1) Небольшой ключ, чтобы демо завершалось быстро
    let service = RsaService::new(0.99, 256);
    let (n, e) = service.public_key();
    let k = service.modulus_byte_len();
    println!("Сгенерирован ключ: n = {} бит", n.bits());

    // 2) Паддинг и шифрование короткого сообщения
    let message = b"kick it, CC";
    let mut rng = thread_rng();
    let block = padding::pad(message, k, &mut rng).expect("message fits the block");
    let c = service.encrypt(&BigUint::from_bytes_be(&block));

    // 3) Оракул получает ключ, атакующий — только (n, e) и сам оракул
    let oracle = RsaPaddingOracle::new(service);
    let attack = BleichenbacherAttack::new(&oracle, &n, &e);

    let outcome = attack.recover(&c).expect("attack should terminate");
    println!(
        "Восстановлено: {:?} за {} итераций и {} запросов к оракулу",
        String::from_utf8_lossy(&outcome.message),
        outcome.iterations,
        outcome.oracle_queries
    );
    assert_eq!(outcome.message, message);
}
