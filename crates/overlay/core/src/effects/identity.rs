//! Identity models for timed effects.
//!
//! Two different identities are derived from the same raw fields:
//! - [`LogicalKey`] decides which raw entries of *one* list are the same
//!   effect and must be collapsed.
//! - [`StableIdentity`] produces the key the renderer uses to follow an
//!   effect from one snapshot to the next.

use std::borrow::Cow;
use std::fmt;

/// The three opaque form identifiers the host attaches to an effect (0 = absent).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FormIds {
    pub source: u32,
    pub effect: u32,
    pub spell: u32,
}

impl FormIds {
    pub fn any(&self) -> bool {
        self.source > 0 || self.effect > 0 || self.spell > 0
    }
}

/// Within-list merge key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum LogicalKey {
    /// The host supplied a non-negative instance id.
    Instance {
        instance_id: u64,
        forms: FormIds,
        is_debuff: bool,
    },
    /// No instance id: the list index is part of the key, so two volatile
    /// entries never collapse into one.
    Volatile {
        source: String,
        effect: String,
        total: u32,
        remaining: u32,
        is_debuff: bool,
        forms: FormIds,
        index: usize,
    },
}

/// Name/duration signature used when no stable id exists.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EffectSignature {
    pub source: String,
    pub effect: String,
    pub total: u32,
    pub is_debuff: bool,
}

impl fmt::Display for EffectSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}|{}|{}",
            key_safe(&self.source),
            key_safe(&self.effect),
            self.total,
            u8::from(self.is_debuff)
        )
    }
}

/// Cross-snapshot identity of a merged effect.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum StableIdentity {
    /// Built from the host's ids; survives renumbering of the list.
    Strong {
        instance_id: Option<u64>,
        forms: FormIds,
    },
    /// Built from the signature plus how many earlier entries shared it.
    Volatile {
        signature: EffectSignature,
        occurrence: usize,
    },
}

impl fmt::Display for StableIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StableIdentity::Strong { instance_id, forms } => {
                let mut parts: Vec<String> = Vec::with_capacity(4);
                if let Some(id) = instance_id {
                    parts.push(format!("i:{id}"));
                }
                for (tag, value) in [("sf", forms.source), ("ef", forms.effect), ("pf", forms.spell)] {
                    if value > 0 {
                        parts.push(format!("{tag}:{value:08X}"));
                    }
                }
                f.write_str(&parts.join("|"))
            }
            StableIdentity::Volatile {
                signature,
                occurrence,
            } => write!(f, "sig:{signature}|{occurrence}"),
        }
    }
}

/// Percent-encodes a name with the same unreserved set as `encodeURIComponent`.
fn key_safe(text: &str) -> Cow<'_, str> {
    if text.bytes().all(is_unreserved) {
        return Cow::Borrowed(text);
    }
    let mut encoded = String::with_capacity(text.len() * 3);
    for byte in text.bytes() {
        if is_unreserved(byte) {
            encoded.push(char::from(byte));
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    Cow::Owned(encoded)
}

const fn is_unreserved(byte: u8) -> bool {
    matches!(byte, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'!' | b'~' | b'*' | b'\'' | b'(' | b')')
}
