use num_bigint::BigUint;
use rand::Rng;
use thiserror::Error;

/// Минимальная длина случайного заполнителя PS по PKCS#1 v1.5
const MIN_PAD_LEN: usize = 8;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaddingError {
    #[error("message of {msg_len} bytes does not fit a {block_len}-byte block")]
    MessageTooLong { msg_len: usize, block_len: usize },
    #[error("block does not start with 00 02")]
    InvalidPrefix,
    #[error("no zero separator after the padding string")]
    MissingSeparator,
    #[error("padding string shorter than the minimum of 8 bytes")]
    PaddingTooShort,
}

/// Кодирование блока EB = 00 02 || PS || 00 || M, где PS — случайные ненулевые байты
pub fn pad<R: Rng + ?Sized>(
    message: &[u8],
    block_len: usize,
    rng: &mut R,
) -> Result<Vec<u8>, PaddingError> {
    if message.len() + MIN_PAD_LEN + 3 > block_len {
        return Err(PaddingError::MessageTooLong {
            msg_len: message.len(),
            block_len,
        });
    }
    let pad_len = block_len - 3 - message.len();

    let mut block = Vec::with_capacity(block_len);
    block.push(0x00);
    block.push(0x02);
    for _ in 0..pad_len {
        block.push(rng.gen_range(1..=255u8));
    }
    block.push(0x00);
    block.extend_from_slice(message);
    Ok(block)
}

/// Снятие паддинга с блока длины k. Возвращает байты сообщения после разделителя.
pub fn unpad(block: &[u8]) -> Result<Vec<u8>, PaddingError> {
    if block.len() < 3 || block[0] != 0x00 || block[1] != 0x02 {
        return Err(PaddingError::InvalidPrefix);
    }
    let separator = block[2..]
        .iter()
        .position(|&b| b == 0x00)
        .ok_or(PaddingError::MissingSeparator)?;
    if separator < MIN_PAD_LEN {
        return Err(PaddingError::PaddingTooShort);
    }
    Ok(block[2 + separator + 1..].to_vec())
}

/// Число → big-endian блок длины k с нулями слева
pub fn to_block(x: &BigUint, k: usize) -> Vec<u8> {
    let bytes = x.to_bytes_be();
    if bytes.len() >= k {
        return bytes;
    }
    let mut block = vec![0u8; k - bytes.len()];
    block.extend_from_slice(&bytes);
    block
}
