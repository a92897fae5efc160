//! Rune symbol codec.
//!
//! Every symbol is a fixed-width code point in a reserved block of
//! Supplementary Private Use Area-A, base `0xF0000`. Sub-ranges, as offsets
//! from the base:
//!
//! | range           | carries                                            |
//! |-----------------|----------------------------------------------------|
//! | `0x000..=0x0FF` | domain mask byte                                   |
//! | `0x100..=0x1FF` | phase mask byte                                    |
//! | `0x200..=0x2FF` | structure field byte                               |
//! | `0x300..=0x4FF` | cognitive slots: 16 slots × 2 nibble symbols       |
//! | `0x500..=0x57F` | annotation priority (0–127)                        |
//! | `0x580..=0x5FF` | annotation confidence (0–127)                      |
//! | `0x600..=0x6FF` | annotation suppression code                        |
//! | `0x700..=0x7FF` | annotation route id                                |
//! | `0x800..=0x803` | gate state                                         |
//! | `0x810..=0x814` | crystal family tag                                 |
//! | `0x900..=0x9FF` | tool-trigger codes                                 |
//! | `0xA00..=0xAFF` | tool-response codes                                |
//! | `0xB00..=0xBFF` | shorthand substitutions                            |
//! | `0xFFF`         | end of transmission                                |
//!
//! 16-bit fields take two byte symbols, high byte first. Each cognitive
//! byte-slot takes two nibble symbols, high nibble first. The shorthand
//! table substitutes common combinations with single symbols; the decoder
//! accepts raw and shorthand forms transparently, so
//! `decode(encode(fields)) == fields` holds for both encoders.

use serde::{Deserialize, Serialize};

use trivium_types::{CognitiveRecord, CrystalKind, GateState, COGNITIVE_SLOTS};

use crate::error::CodecError;

/// Base of the reserved symbol block.
pub const RUNE_BASE: u32 = 0xF0000;

const DOMAIN_OFF: u32 = 0x000;
const PHASE_OFF: u32 = 0x100;
const STRUCT_OFF: u32 = 0x200;
const COG_OFF: u32 = 0x300;
const PRIORITY_OFF: u32 = 0x500;
const CONFIDENCE_OFF: u32 = 0x580;
const SUPPRESS_OFF: u32 = 0x600;
const ROUTE_OFF: u32 = 0x700;
const GATE_OFF: u32 = 0x800;
const CRYSTAL_OFF: u32 = 0x810;
const TOOL_TRIGGER_OFF: u32 = 0x900;
const TOOL_RESPONSE_OFF: u32 = 0xA00;
const SHORTHAND_OFF: u32 = 0xB00;
const EOT_OFF: u32 = 0xFFF;

/// One fixed-width symbol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rune(pub u32);

/// Which reserved sub-range a symbol falls in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuneClass {
    Domain(u8),
    Phase(u8),
    Structure(u8),
    /// (slot index 0–15, nibble position 0 = high, value 0–15)
    Cognitive { slot: u8, hi: bool, value: u8 },
    Priority(u8),
    Confidence(u8),
    Suppression(u8),
    Route(u8),
    Gate(GateState),
    Crystal(CrystalKind),
    ToolTrigger(u8),
    ToolResponse(u8),
    Shorthand(u8),
    EndOfTransmission,
}

impl Rune {
    pub fn domain_byte(v: u8) -> Self {
        Self(RUNE_BASE + DOMAIN_OFF + v as u32)
    }

    pub fn phase_byte(v: u8) -> Self {
        Self(RUNE_BASE + PHASE_OFF + v as u32)
    }

    pub fn structure_byte(v: u8) -> Self {
        Self(RUNE_BASE + STRUCT_OFF + v as u32)
    }

    /// Nibble symbol for one cognitive slot; `hi` selects the high nibble.
    pub fn cognitive_nibble(slot: u8, hi: bool, value: u8) -> Self {
        debug_assert!(slot < 16 && value < 16);
        let position = if hi { 0 } else { 1 };
        Self(RUNE_BASE + COG_OFF + slot as u32 * 32 + position * 16 + value as u32)
    }

    pub fn priority(v: u8) -> Result<Self, CodecError> {
        if v > 127 {
            return Err(CodecError::FieldOutOfRange {
                field: "priority",
                value: v as u32,
            });
        }
        Ok(Self(RUNE_BASE + PRIORITY_OFF + v as u32))
    }

    pub fn confidence(v: u8) -> Result<Self, CodecError> {
        if v > 127 {
            return Err(CodecError::FieldOutOfRange {
                field: "confidence",
                value: v as u32,
            });
        }
        Ok(Self(RUNE_BASE + CONFIDENCE_OFF + v as u32))
    }

    pub fn suppression(v: u8) -> Self {
        Self(RUNE_BASE + SUPPRESS_OFF + v as u32)
    }

    pub fn route(v: u8) -> Self {
        Self(RUNE_BASE + ROUTE_OFF + v as u32)
    }

    pub fn gate(state: GateState) -> Self {
        Self(RUNE_BASE + GATE_OFF + state.wire_code() as u32)
    }

    pub fn crystal(kind: CrystalKind) -> Self {
        Self(RUNE_BASE + CRYSTAL_OFF + kind.wire_tag() as u32)
    }

    pub fn tool_trigger(code: u8) -> Self {
        Self(RUNE_BASE + TOOL_TRIGGER_OFF + code as u32)
    }

    pub fn tool_response(code: u8) -> Self {
        Self(RUNE_BASE + TOOL_RESPONSE_OFF + code as u32)
    }

    pub fn shorthand(code: u8) -> Self {
        Self(RUNE_BASE + SHORTHAND_OFF + code as u32)
    }

    pub fn end_of_transmission() -> Self {
        Self(RUNE_BASE + EOT_OFF)
    }

    /// Classify a symbol into its reserved sub-range.
    pub fn classify(self) -> Result<RuneClass, CodecError> {
        let off = self
            .0
            .checked_sub(RUNE_BASE)
            .ok_or(CodecError::UnknownRune(self.0))?;
        let class = match off {
            0x000..=0x0FF => RuneClass::Domain((off - DOMAIN_OFF) as u8),
            0x100..=0x1FF => RuneClass::Phase((off - PHASE_OFF) as u8),
            0x200..=0x2FF => RuneClass::Structure((off - STRUCT_OFF) as u8),
            0x300..=0x4FF => {
                let rel = off - COG_OFF;
                RuneClass::Cognitive {
                    slot: (rel / 32) as u8,
                    hi: rel % 32 < 16,
                    value: (rel % 16) as u8,
                }
            }
            0x500..=0x57F => RuneClass::Priority((off - PRIORITY_OFF) as u8),
            0x580..=0x5FF => RuneClass::Confidence((off - CONFIDENCE_OFF) as u8),
            0x600..=0x6FF => RuneClass::Suppression((off - SUPPRESS_OFF) as u8),
            0x700..=0x7FF => RuneClass::Route((off - ROUTE_OFF) as u8),
            0x800..=0x803 => RuneClass::Gate(
                GateState::from_wire_code((off - GATE_OFF) as u16)
                    .ok_or(CodecError::UnknownRune(self.0))?,
            ),
            0x810..=0x814 => RuneClass::Crystal(
                CrystalKind::from_wire_tag((off - CRYSTAL_OFF) as u8)
                    .ok_or(CodecError::UnknownRune(self.0))?,
            ),
            0x900..=0x9FF => RuneClass::ToolTrigger((off - TOOL_TRIGGER_OFF) as u8),
            0xA00..=0xAFF => RuneClass::ToolResponse((off - TOOL_RESPONSE_OFF) as u8),
            0xB00..=0xBFF => RuneClass::Shorthand((off - SHORTHAND_OFF) as u8),
            EOT_OFF => RuneClass::EndOfTransmission,
            _ => return Err(CodecError::UnknownRune(self.0)),
        };
        Ok(class)
    }
}

/// Annotation block carried alongside identity fields.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// 0–127.
    pub priority: u8,
    /// 0–127.
    pub confidence: u8,
    pub suppression: u8,
    pub route: u8,
}

/// Everything one rune transmission carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuneFields {
    pub domain: u16,
    pub phase: u16,
    pub structure: u16,
    pub cognitive: CognitiveRecord,
    pub annotation: Annotation,
    pub gate_state: GateState,
    pub crystal: CrystalKind,
}

/// Shorthand substitutions for common (domain, phase) masks. Code 0 is the
/// root/common-lineage marker.
const MASK_SHORTHANDS: &[(u8, u16, u16)] = &[
    (0x00, 0x0000, 0x0000),
    (0x01, 0x0001, 0x0000),
    (0x02, 0x0001, 0x0001),
];

/// Shorthand substitutions for frequent structure constants.
const STRUCT_SHORTHANDS: &[(u8, u16)] = &[(0x10, 0x0000), (0x11, 0x0001), (0x12, 0xFFFF)];

fn mask_shorthand(domain: u16, phase: u16) -> Option<u8> {
    MASK_SHORTHANDS
        .iter()
        .find(|(_, d, p)| *d == domain && *p == phase)
        .map(|(code, _, _)| *code)
}

fn struct_shorthand(structure: u16) -> Option<u8> {
    STRUCT_SHORTHANDS
        .iter()
        .find(|(_, s)| *s == structure)
        .map(|(code, _)| *code)
}

fn expand_shorthand(code: u8) -> Result<ShorthandExpansion, CodecError> {
    if let Some((_, d, p)) = MASK_SHORTHANDS.iter().find(|(c, _, _)| *c == code) {
        return Ok(ShorthandExpansion::Masks(*d, *p));
    }
    if let Some((_, s)) = STRUCT_SHORTHANDS.iter().find(|(c, _)| *c == code) {
        return Ok(ShorthandExpansion::Structure(*s));
    }
    Err(CodecError::UnknownShorthand(code))
}

enum ShorthandExpansion {
    Masks(u16, u16),
    Structure(u16),
}

fn push_u16(out: &mut Vec<Rune>, value: u16, byte: fn(u8) -> Rune) {
    let [hi, lo] = value.to_be_bytes();
    out.push(byte(hi));
    out.push(byte(lo));
}

/// Encode a transmission with no shorthand substitution.
pub fn encode_fields(fields: &RuneFields) -> Result<Vec<Rune>, CodecError> {
    encode_inner(fields, false)
}

/// Encode a transmission, substituting shorthand symbols where the table
/// has an entry.
pub fn encode_fields_shorthand(fields: &RuneFields) -> Result<Vec<Rune>, CodecError> {
    encode_inner(fields, true)
}

fn encode_inner(fields: &RuneFields, shorthand: bool) -> Result<Vec<Rune>, CodecError> {
    // 2+2+2 mask/structure symbols, 32 cognitive, 4 annotation, 2 tags, EOT
    let mut out = Vec::with_capacity(45);

    match mask_shorthand(fields.domain, fields.phase).filter(|_| shorthand) {
        Some(code) => out.push(Rune::shorthand(code)),
        None => {
            push_u16(&mut out, fields.domain, Rune::domain_byte);
            push_u16(&mut out, fields.phase, Rune::phase_byte);
        }
    }

    match struct_shorthand(fields.structure).filter(|_| shorthand) {
        Some(code) => out.push(Rune::shorthand(code)),
        None => push_u16(&mut out, fields.structure, Rune::structure_byte),
    }

    for (slot, byte) in fields.cognitive.0.iter().enumerate() {
        out.push(Rune::cognitive_nibble(slot as u8, true, byte >> 4));
        out.push(Rune::cognitive_nibble(slot as u8, false, byte & 0x0F));
    }

    out.push(Rune::priority(fields.annotation.priority)?);
    out.push(Rune::confidence(fields.annotation.confidence)?);
    out.push(Rune::suppression(fields.annotation.suppression));
    out.push(Rune::route(fields.annotation.route));
    out.push(Rune::gate(fields.gate_state));
    out.push(Rune::crystal(fields.crystal));
    out.push(Rune::end_of_transmission());
    Ok(out)
}

struct Cursor<'a> {
    runes: &'a [Rune],
    at: usize,
}

impl<'a> Cursor<'a> {
    fn next_class(&mut self) -> Result<RuneClass, CodecError> {
        let rune = self
            .runes
            .get(self.at)
            .copied()
            .ok_or(CodecError::MissingTerminator)?;
        self.at += 1;
        rune.classify()
    }

    fn unexpected(&self, expected: &'static str) -> CodecError {
        // self.at already advanced past the offending symbol
        CodecError::UnexpectedRune {
            at: self.at - 1,
            expected,
            got: self.runes[self.at - 1].0,
        }
    }

    fn expect_u16(
        &mut self,
        expected: &'static str,
        pick: fn(RuneClass) -> Option<u8>,
    ) -> Result<u16, CodecError> {
        let mut bytes = [0u8; 2];
        for b in &mut bytes {
            let class = self.next_class()?;
            *b = pick(class).ok_or_else(|| self.unexpected(expected))?;
        }
        Ok(u16::from_be_bytes(bytes))
    }
}

/// Decode a transmission, accepting raw and shorthand forms transparently.
pub fn decode_fields(runes: &[Rune]) -> Result<RuneFields, CodecError> {
    let mut cursor = Cursor { runes, at: 0 };

    // Masks: shorthand pair, or two domain bytes then two phase bytes.
    let (domain, phase) = match cursor.next_class()? {
        RuneClass::Shorthand(code) => match expand_shorthand(code)? {
            ShorthandExpansion::Masks(d, p) => (d, p),
            ShorthandExpansion::Structure(_) => {
                return Err(cursor.unexpected("domain mask"))
            }
        },
        RuneClass::Domain(hi) => {
            let class = cursor.next_class()?;
            let lo = match class {
                RuneClass::Domain(lo) => lo,
                _ => return Err(cursor.unexpected("domain mask")),
            };
            let domain = u16::from_be_bytes([hi, lo]);
            let phase = cursor.expect_u16("phase mask", |c| match c {
                RuneClass::Phase(v) => Some(v),
                _ => None,
            })?;
            (domain, phase)
        }
        _ => return Err(cursor.unexpected("domain mask")),
    };

    // Structure: shorthand constant or two bytes.
    let structure = match cursor.next_class()? {
        RuneClass::Shorthand(code) => match expand_shorthand(code)? {
            ShorthandExpansion::Structure(s) => s,
            ShorthandExpansion::Masks(..) => {
                return Err(cursor.unexpected("structure field"))
            }
        },
        RuneClass::Structure(hi) => {
            let class = cursor.next_class()?;
            let lo = match class {
                RuneClass::Structure(lo) => lo,
                _ => return Err(cursor.unexpected("structure field")),
            };
            u16::from_be_bytes([hi, lo])
        }
        _ => return Err(cursor.unexpected("structure field")),
    };

    // Cognitive record: 16 slots, two nibbles each, slot-major order.
    let mut slots = [0u8; COGNITIVE_SLOTS];
    for (index, slot_byte) in slots.iter_mut().enumerate() {
        let mut byte = 0u8;
        for want_hi in [true, false] {
            let class = cursor.next_class()?;
            match class {
                RuneClass::Cognitive { slot, hi, value }
                    if slot as usize == index && hi == want_hi =>
                {
                    byte = byte << 4 | value;
                }
                _ => return Err(cursor.unexpected("cognitive slot")),
            }
        }
        *slot_byte = byte;
    }
    let cognitive = CognitiveRecord(slots);

    let annotation = {
        let priority = match cursor.next_class()? {
            RuneClass::Priority(v) => v,
            _ => return Err(cursor.unexpected("priority")),
        };
        let confidence = match cursor.next_class()? {
            RuneClass::Confidence(v) => v,
            _ => return Err(cursor.unexpected("confidence")),
        };
        let suppression = match cursor.next_class()? {
            RuneClass::Suppression(v) => v,
            _ => return Err(cursor.unexpected("suppression")),
        };
        let route = match cursor.next_class()? {
            RuneClass::Route(v) => v,
            _ => return Err(cursor.unexpected("route")),
        };
        Annotation {
            priority,
            confidence,
            suppression,
            route,
        }
    };

    let gate_state = match cursor.next_class()? {
        RuneClass::Gate(state) => state,
        _ => return Err(cursor.unexpected("gate state")),
    };
    let crystal = match cursor.next_class()? {
        RuneClass::Crystal(kind) => kind,
        _ => return Err(cursor.unexpected("crystal family")),
    };

    match cursor.next_class()? {
        RuneClass::EndOfTransmission => {}
        _ => return Err(cursor.unexpected("end of transmission")),
    }

    Ok(RuneFields {
        domain,
        phase,
        structure,
        cognitive,
        annotation,
        gate_state,
        crystal,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fields(domain: u16, phase: u16, structure: u16) -> RuneFields {
        RuneFields {
            domain,
            phase,
            structure,
            cognitive: CognitiveRecord::new(7, 3, 99, 1_700_000_000, 1234, 40000),
            annotation: Annotation {
                priority: 64,
                confidence: 100,
                suppression: 2,
                route: 9,
            },
            gate_state: GateState::Conducting,
            crystal: CrystalKind::Orbital,
        }
    }

    #[test]
    fn raw_encoding_round_trips() {
        let f = fields(0xABCD, 0x0042, 0x9F01);
        let runes = encode_fields(&f).unwrap();
        assert_eq!(decode_fields(&runes).unwrap(), f);
    }

    #[test]
    fn shorthand_encoding_is_shorter_and_round_trips() {
        let f = fields(0x0001, 0x0001, 0xFFFF); // both shorthands apply
        let raw = encode_fields(&f).unwrap();
        let short = encode_fields_shorthand(&f).unwrap();
        assert!(short.len() < raw.len());
        assert_eq!(decode_fields(&short).unwrap(), f);
        assert_eq!(decode_fields(&raw).unwrap(), f);
    }

    #[test]
    fn shorthand_encoder_falls_back_to_raw_for_uncommon_values() {
        let f = fields(0xBEEF, 0x1234, 0x5678);
        assert_eq!(
            encode_fields_shorthand(&f).unwrap(),
            encode_fields(&f).unwrap()
        );
    }

    #[test]
    fn priority_above_127_rejected() {
        let mut f = fields(1, 2, 3);
        f.annotation.priority = 128;
        assert!(matches!(
            encode_fields(&f),
            Err(CodecError::FieldOutOfRange { field: "priority", .. })
        ));
    }

    #[test]
    fn truncated_stream_reports_missing_terminator() {
        let f = fields(1, 2, 3);
        let mut runes = encode_fields(&f).unwrap();
        runes.pop(); // drop EOT
        runes.pop();
        assert!(matches!(
            decode_fields(&runes),
            Err(CodecError::MissingTerminator)
        ));
    }

    #[test]
    fn foreign_symbol_rejected() {
        let f = fields(1, 2, 3);
        let mut runes = encode_fields(&f).unwrap();
        runes[0] = Rune(0x41); // 'A', outside the reserved block
        assert!(matches!(
            decode_fields(&runes),
            Err(CodecError::UnknownRune(0x41))
        ));
    }

    #[test]
    fn tool_codes_classify() {
        assert_eq!(
            Rune::tool_trigger(0x7F).classify().unwrap(),
            RuneClass::ToolTrigger(0x7F)
        );
        assert_eq!(
            Rune::tool_response(0x01).classify().unwrap(),
            RuneClass::ToolResponse(0x01)
        );
    }

    proptest! {
        /// decode(encode(fields)) == fields over the whole field domain,
        /// for both encoders.
        #[test]
        fn round_trip_law(
            domain: u16,
            phase: u16,
            structure: u16,
            agent: u16,
            task: u16,
            sequence: u16,
            timestamp: u32,
            delta: u16,
            entropy: u16,
            priority in 0u8..=127,
            confidence in 0u8..=127,
            suppression: u8,
            route: u8,
            gate_code in 0u16..=3,
            crystal_tag in 0u8..=4,
        ) {
            let f = RuneFields {
                domain,
                phase,
                structure,
                cognitive: CognitiveRecord::new(
                    agent, task, sequence, timestamp, delta, entropy,
                ),
                annotation: Annotation { priority, confidence, suppression, route },
                gate_state: GateState::from_wire_code(gate_code).unwrap(),
                crystal: CrystalKind::from_wire_tag(crystal_tag).unwrap(),
            };
            let raw = encode_fields(&f).unwrap();
            prop_assert_eq!(decode_fields(&raw).unwrap(), f);
            let short = encode_fields_shorthand(&f).unwrap();
            prop_assert_eq!(decode_fields(&short).unwrap(), f);
        }
    }
}
