//! Head/tail encoding of parameter tuples.
//!
//! Static values occupy one word in the head. Dynamic values put an offset
//! (relative to the start of the enclosing tuple) in the head and their
//! payload in the tail. Decoding is bounds-checked everywhere and never
//! panics on malformed input.

use govctl_types::{Address, U256};

use crate::error::AbiError;
use crate::token::{ParamType, Token};
use crate::WORD;

/// Encode a tuple of values.
pub fn encode(tokens: &[Token]) -> Vec<u8> {
    let head_len = tokens.len() * WORD;
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for token in tokens {
        if token.is_dynamic() {
            head.extend_from_slice(&usize_word(head_len + tail.len()));
            encode_dynamic(token, &mut tail);
        } else {
            head.extend_from_slice(&static_word(token));
        }
    }

    head.extend_from_slice(&tail);
    head
}

fn static_word(token: &Token) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    match token {
        Token::Address(address) => word[12..].copy_from_slice(address.as_slice()),
        Token::Uint(value) => word = value.to_be_bytes::<WORD>(),
        Token::Bool(value) => word[31] = u8::from(*value),
        Token::FixedBytes(bytes) => {
            let len = bytes.len().min(WORD);
            word[..len].copy_from_slice(&bytes[..len]);
        }
        Token::Bytes(_) | Token::String(_) | Token::Array(_) => {
            unreachable!("dynamic token passed to static_word")
        }
    }
    word
}

fn encode_dynamic(token: &Token, out: &mut Vec<u8>) {
    match token {
        Token::Bytes(bytes) => encode_packed_bytes(bytes, out),
        Token::String(s) => encode_packed_bytes(s.as_bytes(), out),
        Token::Array(items) => {
            out.extend_from_slice(&usize_word(items.len()));
            out.extend_from_slice(&encode(items));
        }
        _ => out.extend_from_slice(&static_word(token)),
    }
}

fn encode_packed_bytes(bytes: &[u8], out: &mut Vec<u8>) {
    out.extend_from_slice(&usize_word(bytes.len()));
    out.extend_from_slice(bytes);
    let padding = (WORD - bytes.len() % WORD) % WORD;
    out.extend(std::iter::repeat(0u8).take(padding));
}

fn usize_word(value: usize) -> [u8; WORD] {
    U256::from(value).to_be_bytes::<WORD>()
}

/// Decode a tuple of values of the given types.
pub fn decode(types: &[ParamType], data: &[u8]) -> Result<Vec<Token>, AbiError> {
    let mut tokens = Vec::with_capacity(types.len());
    for (index, ty) in types.iter().enumerate() {
        let head = read_word(data, index * WORD)?;
        let token = if ty.is_dynamic() {
            let offset = word_to_usize(head, "offset")?;
            let tail = data.get(offset..).ok_or(AbiError::OutOfBounds {
                offset,
                needed: WORD,
                available: data.len(),
            })?;
            decode_dynamic(ty, tail)?
        } else {
            decode_static(ty, head)?
        };
        tokens.push(token);
    }
    Ok(tokens)
}

/// Decode a single static value from one word.
pub(crate) fn decode_static(ty: &ParamType, word: &[u8]) -> Result<Token, AbiError> {
    match ty {
        ParamType::Address => {
            if word[..12].iter().any(|b| *b != 0) {
                return Err(invalid("address", "dirty upper bytes"));
            }
            Ok(Token::Address(Address::from_slice(&word[12..])))
        }
        ParamType::Uint(bits) => {
            let value = U256::from_be_slice(word);
            if *bits < 256 && value.bit_len() > *bits {
                return Err(invalid(&ty.canonical(), "value exceeds width"));
            }
            Ok(Token::Uint(value))
        }
        ParamType::Bool => match word_to_usize(word, "bool")? {
            0 => Ok(Token::Bool(false)),
            1 => Ok(Token::Bool(true)),
            other => Err(invalid("bool", &other.to_string())),
        },
        ParamType::FixedBytes(len) => {
            if *len == 0 || *len > WORD {
                return Err(invalid("bytesN", &format!("length {len}")));
            }
            Ok(Token::FixedBytes(word[..*len].to_vec()))
        }
        ParamType::Bytes | ParamType::String | ParamType::Array(_) => {
            Err(invalid(&ty.canonical(), "dynamic type in static position"))
        }
    }
}

fn decode_dynamic(ty: &ParamType, data: &[u8]) -> Result<Token, AbiError> {
    match ty {
        ParamType::Bytes => Ok(Token::Bytes(read_packed_bytes(data)?.to_vec())),
        ParamType::String => {
            let bytes = read_packed_bytes(data)?;
            String::from_utf8(bytes.to_vec())
                .map(Token::String)
                .map_err(|e| invalid("string", &e.to_string()))
        }
        ParamType::Array(inner) => {
            let len = word_to_usize(read_word(data, 0)?, "array length")?;
            let items = &data[WORD..];
            // Every element needs at least one head word.
            if len > items.len() / WORD {
                return Err(AbiError::OutOfBounds {
                    offset: WORD,
                    needed: len.saturating_mul(WORD),
                    available: items.len(),
                });
            }
            let types = vec![(**inner).clone(); len];
            decode(&types, items).map(Token::Array)
        }
        _ => decode_static(ty, read_word(data, 0)?),
    }
}

fn read_packed_bytes(data: &[u8]) -> Result<&[u8], AbiError> {
    let len = word_to_usize(read_word(data, 0)?, "bytes length")?;
    let end = WORD.checked_add(len).ok_or_else(|| invalid("bytes length", "overflow"))?;
    data.get(WORD..end).ok_or(AbiError::OutOfBounds {
        offset: WORD,
        needed: len,
        available: data.len().saturating_sub(WORD),
    })
}

pub(crate) fn read_word(data: &[u8], offset: usize) -> Result<&[u8], AbiError> {
    offset
        .checked_add(WORD)
        .and_then(|end| data.get(offset..end))
        .ok_or(AbiError::OutOfBounds {
            offset,
            needed: WORD,
            available: data.len(),
        })
}

fn word_to_usize(word: &[u8], kind: &str) -> Result<usize, AbiError> {
    if word[..24].iter().any(|b| *b != 0) {
        return Err(invalid(kind, "does not fit in 64 bits"));
    }
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&word[24..32]);
    usize::try_from(u64::from_be_bytes(buf)).map_err(|e| invalid(kind, &e.to_string()))
}

fn invalid(kind: &str, detail: &str) -> AbiError {
    AbiError::InvalidValue {
        kind: kind.to_string(),
        detail: detail.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(hex_str: &str) -> Vec<u8> {
        let mut out = vec![0u8; WORD];
        let bytes = hex::decode(hex_str).unwrap();
        out[WORD - bytes.len()..].copy_from_slice(&bytes);
        out
    }

    #[test]
    fn static_tuple_layout() {
        let to: Address = "0x0000000000000000000000000000000000000001".parse().unwrap();
        let encoded = encode(&[Token::Address(to), Token::Uint(U256::from(5u64))]);
        assert_eq!(encoded.len(), 64);
        assert_eq!(&encoded[..32], word("01").as_slice());
        assert_eq!(&encoded[32..], word("05").as_slice());
    }

    #[test]
    fn hash_proposal_layout() {
        // abi.encode(address[] [a], uint256[] [0], bytes[] [0x1234], bytes32 h)
        let a: Address = "0x00000000000000000000000000000000000000aa".parse().unwrap();
        let h = vec![0x11u8; 32];
        let encoded = encode(&[
            Token::Array(vec![Token::Address(a)]),
            Token::Array(vec![Token::Uint(U256::ZERO)]),
            Token::Array(vec![Token::Bytes(vec![0x12, 0x34])]),
            Token::FixedBytes(h.clone()),
        ]);

        let mut expected = Vec::new();
        expected.extend(word("80")); // targets offset
        expected.extend(word("c0")); // values offset
        expected.extend(word("0100")); // calldatas offset
        expected.extend(h);
        expected.extend(word("01")); // targets.length
        expected.extend(word("aa"));
        expected.extend(word("01")); // values.length
        expected.extend(word("00"));
        expected.extend(word("01")); // calldatas.length
        expected.extend(word("20")); // offset of calldatas[0]
        expected.extend(word("02")); // calldatas[0].length
        let mut data = vec![0x12, 0x34];
        data.resize(WORD, 0);
        expected.extend(data);

        assert_eq!(encoded, expected);
    }

    #[test]
    fn decode_reverses_encode() {
        let tokens = vec![
            Token::Uint(U256::from(42u64)),
            Token::String("Proposal #1".into()),
            Token::Array(vec![Token::Bytes(vec![1, 2, 3]), Token::Bytes(vec![])]),
            Token::Bool(true),
        ];
        let types = vec![
            ParamType::Uint(256),
            ParamType::String,
            ParamType::array(ParamType::Bytes),
            ParamType::Bool,
        ];
        assert_eq!(decode(&types, &encode(&tokens)).unwrap(), tokens);
    }

    #[test]
    fn truncated_data_is_an_error() {
        let encoded = encode(&[Token::String("hello".into())]);
        let err = decode(&[ParamType::String], &encoded[..40]).unwrap_err();
        assert!(matches!(err, AbiError::OutOfBounds { .. }));
    }

    #[test]
    fn huge_array_length_is_rejected() {
        let mut data = word("20");
        data.extend(word("ffffffff"));
        assert!(decode(&[ParamType::array(ParamType::Uint(256))], &data).is_err());
    }

    #[test]
    fn dirty_address_is_rejected() {
        let mut data = vec![0xffu8; 12];
        data.extend([0u8; 20]);
        assert!(decode(&[ParamType::Address], &data).is_err());
    }

    #[test]
    fn uint8_bounds() {
        assert_eq!(
            decode(&[ParamType::Uint(8)], &word("07")).unwrap(),
            vec![Token::Uint(U256::from(7u64))]
        );
        assert!(decode(&[ParamType::Uint(8)], &word("0100")).is_err());
    }
}
