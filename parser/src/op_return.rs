//! Decodes the op-return marker output into tx intent.
//!
//! Wire format: `OP_RETURN <push>` where the pushed data is
//! `[type:u8] [version:u8] [payload]`. Any decode failure downgrades the
//! carrying tx to irregular; none of these errors propagate.

use agora_types::{OpReturnData, TxId};
use thiserror::Error;

pub const TYPE_PROPOSAL: u8 = 0x10;
pub const TYPE_COMP_REQUEST: u8 = 0x11;
pub const TYPE_BLIND_VOTE: u8 = 0x12;
pub const TYPE_VOTE_REVEAL: u8 = 0x13;
pub const TYPE_LOCKUP: u8 = 0x14;
pub const TYPE_UNLOCK: u8 = 0x15;
pub const TYPE_ASSET_REMOVAL: u8 = 0x16;

/// The only payload version currently on the wire.
pub const VERSION: u8 = 0x01;

const OP_RETURN: u8 = 0x6a;
const OP_PUSHDATA1: u8 = 0x4c;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OpReturnError {
    #[error("op-return payload too short: {len} bytes")]
    ShortOpReturn { len: usize },

    #[error("unknown op-return type tag {tag:#04x}")]
    UnknownOpReturnType { tag: u8 },

    #[error("unsupported op-return version {version:#04x}")]
    UnsupportedVersion { version: u8 },
}

/// Decode the locking script of an op-return output.
pub fn decode(script: &[u8]) -> Result<OpReturnData, OpReturnError> {
    let payload = extract_payload(script)?;
    if payload.len() < 2 {
        return Err(OpReturnError::ShortOpReturn { len: payload.len() });
    }
    let tag = payload[0];
    let version = payload[1];
    let rest = &payload[2..];

    match tag {
        TYPE_PROPOSAL | TYPE_COMP_REQUEST | TYPE_BLIND_VOTE | TYPE_ASSET_REMOVAL => {
            check_version(version)?;
            let digest = take_digest(rest, payload.len())?;
            Ok(match tag {
                TYPE_PROPOSAL => OpReturnData::Proposal { digest },
                TYPE_COMP_REQUEST => OpReturnData::CompRequest { digest },
                TYPE_BLIND_VOTE => OpReturnData::BlindVote { commitment: digest },
                _ => OpReturnData::AssetRemoval { digest },
            })
        }
        TYPE_VOTE_REVEAL => {
            check_version(version)?;
            if rest.len() < 36 {
                return Err(OpReturnError::ShortOpReturn { len: payload.len() });
            }
            let merit_digest = rest[..20].try_into().expect("20 bytes");
            let secret_key = rest[20..36].try_into().expect("16 bytes");
            Ok(OpReturnData::VoteReveal {
                merit_digest,
                secret_key,
            })
        }
        TYPE_LOCKUP => {
            check_version(version)?;
            if rest.len() < 4 {
                return Err(OpReturnError::ShortOpReturn { len: payload.len() });
            }
            let lock_time = u32::from_le_bytes(rest[..4].try_into().expect("4 bytes"));
            Ok(OpReturnData::Lockup { lock_time })
        }
        TYPE_UNLOCK => {
            check_version(version)?;
            if rest.len() < 32 {
                return Err(OpReturnError::ShortOpReturn { len: payload.len() });
            }
            let lockup_tx_id = TxId::new(rest[..32].try_into().expect("32 bytes"));
            Ok(OpReturnData::Unlock { lockup_tx_id })
        }
        tag => Err(OpReturnError::UnknownOpReturnType { tag }),
    }
}

fn check_version(version: u8) -> Result<(), OpReturnError> {
    if version != VERSION {
        return Err(OpReturnError::UnsupportedVersion { version });
    }
    Ok(())
}

fn take_digest(rest: &[u8], payload_len: usize) -> Result<[u8; 20], OpReturnError> {
    if rest.len() < 20 {
        return Err(OpReturnError::ShortOpReturn { len: payload_len });
    }
    // Trailing bytes after the digest are tolerated.
    Ok(rest[..20].try_into().expect("20 bytes"))
}

/// The pushed bytes after the `OP_RETURN` opcode.
fn extract_payload(script: &[u8]) -> Result<&[u8], OpReturnError> {
    if script.len() < 2 || script[0] != OP_RETURN {
        return Err(OpReturnError::ShortOpReturn { len: script.len() });
    }
    let (declared, start) = if script[1] == OP_PUSHDATA1 {
        if script.len() < 3 {
            return Err(OpReturnError::ShortOpReturn { len: script.len() });
        }
        (script[2] as usize, 3)
    } else {
        (script[1] as usize, 2)
    };
    if script.len() < start + declared {
        return Err(OpReturnError::ShortOpReturn { len: script.len() });
    }
    Ok(&script[start..start + declared])
}

/// Build the op-return locking script for an intent. The inverse of
/// [`decode`]; hosts use it when constructing governance txs.
pub fn encode(data: &OpReturnData) -> Vec<u8> {
    let mut payload = Vec::new();
    match data {
        OpReturnData::Proposal { digest } => {
            payload.push(TYPE_PROPOSAL);
            payload.push(VERSION);
            payload.extend_from_slice(digest);
        }
        OpReturnData::CompRequest { digest } => {
            payload.push(TYPE_COMP_REQUEST);
            payload.push(VERSION);
            payload.extend_from_slice(digest);
        }
        OpReturnData::BlindVote { commitment } => {
            payload.push(TYPE_BLIND_VOTE);
            payload.push(VERSION);
            payload.extend_from_slice(commitment);
        }
        OpReturnData::VoteReveal {
            merit_digest,
            secret_key,
        } => {
            payload.push(TYPE_VOTE_REVEAL);
            payload.push(VERSION);
            payload.extend_from_slice(merit_digest);
            payload.extend_from_slice(secret_key);
        }
        OpReturnData::Lockup { lock_time } => {
            payload.push(TYPE_LOCKUP);
            payload.push(VERSION);
            payload.extend_from_slice(&lock_time.to_le_bytes());
        }
        OpReturnData::Unlock { lockup_tx_id } => {
            payload.push(TYPE_UNLOCK);
            payload.push(VERSION);
            payload.extend_from_slice(lockup_tx_id.as_bytes());
        }
        OpReturnData::AssetRemoval { digest } => {
            payload.push(TYPE_ASSET_REMOVAL);
            payload.push(VERSION);
            payload.extend_from_slice(digest);
        }
    }
    let mut script = Vec::with_capacity(2 + payload.len());
    script.push(OP_RETURN);
    script.push(payload.len() as u8);
    script.extend_from_slice(&payload);
    script
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_proposal() {
        let digest = [7u8; 20];
        let script = encode(&OpReturnData::Proposal { digest });
        assert_eq!(script[0], OP_RETURN);
        assert_eq!(decode(&script), Ok(OpReturnData::Proposal { digest }));
    }

    #[test]
    fn roundtrip_every_intent() {
        let intents = [
            OpReturnData::Proposal { digest: [1u8; 20] },
            OpReturnData::CompRequest { digest: [2u8; 20] },
            OpReturnData::BlindVote {
                commitment: [3u8; 20],
            },
            OpReturnData::VoteReveal {
                merit_digest: [4u8; 20],
                secret_key: [5u8; 16],
            },
            OpReturnData::Lockup { lock_time: 144 },
            OpReturnData::Unlock {
                lockup_tx_id: TxId::new([6u8; 32]),
            },
            OpReturnData::AssetRemoval { digest: [7u8; 20] },
        ];
        for intent in intents {
            assert_eq!(decode(&encode(&intent)), Ok(intent));
        }
    }

    #[test]
    fn unknown_type_tag() {
        let mut script = encode(&OpReturnData::Proposal { digest: [0u8; 20] });
        script[2] = 0x42;
        assert_eq!(
            decode(&script),
            Err(OpReturnError::UnknownOpReturnType { tag: 0x42 })
        );
    }

    #[test]
    fn unsupported_version() {
        let mut script = encode(&OpReturnData::Proposal { digest: [0u8; 20] });
        script[3] = 0x02;
        assert_eq!(
            decode(&script),
            Err(OpReturnError::UnsupportedVersion { version: 0x02 })
        );
    }

    #[test]
    fn short_payloads() {
        assert!(matches!(
            decode(&[0x6a]),
            Err(OpReturnError::ShortOpReturn { .. })
        ));
        assert!(matches!(
            decode(&[0x6a, 0x01, TYPE_PROPOSAL]),
            Err(OpReturnError::ShortOpReturn { .. })
        ));
        // Declared push longer than the script.
        assert!(matches!(
            decode(&[0x6a, 0x30, TYPE_PROPOSAL, VERSION]),
            Err(OpReturnError::ShortOpReturn { .. })
        ));
        // Proposal digest truncated.
        let mut script = vec![0x6a, 12, TYPE_PROPOSAL, VERSION];
        script.extend_from_slice(&[0u8; 10]);
        assert!(matches!(
            decode(&script),
            Err(OpReturnError::ShortOpReturn { .. })
        ));
    }

    #[test]
    fn trailing_bytes_after_digest_tolerated() {
        let digest = [9u8; 20];
        let mut script = vec![0x6a, 24, TYPE_BLIND_VOTE, VERSION];
        script.extend_from_slice(&digest);
        script.extend_from_slice(&[0xff, 0xff]);
        assert_eq!(
            decode(&script),
            Ok(OpReturnData::BlindVote { commitment: digest })
        );
    }

    #[test]
    fn pushdata1_form_accepted() {
        let digest = [1u8; 20];
        let mut script = vec![0x6a, OP_PUSHDATA1, 22, TYPE_PROPOSAL, VERSION];
        script.extend_from_slice(&digest);
        assert_eq!(decode(&script), Ok(OpReturnData::Proposal { digest }));
    }

    #[test]
    fn lockup_lock_time_is_little_endian() {
        let script = encode(&OpReturnData::Lockup { lock_time: 0x0102 });
        // tag, version, then LE bytes.
        assert_eq!(&script[4..8], &[0x02, 0x01, 0x00, 0x00]);
    }
}
