//! Field chunks resolved to concrete word positions.

use rustc_hash::FxHashMap;

use crate::{Cell, FieldKind, Operands};

/// How a placed chunk contributes to its operand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlacementKind {
    Plain,
    /// Add `bias` once to the assembled operand.
    Bias(u32),
    /// OR a fixed low register number into the operand.
    Implied(u8),
    /// Operand bit is `!(raw ^ S)` with `S` the operand's bit `sign`.
    NotXor { sign: u8 },
}

/// One field chunk at a fixed position in an encoding word.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Placement {
    /// Operand the chunk belongs to.
    pub name: String,
    /// Second operand bound to the same bits (paired registers).
    pub alias: Option<String>,
    /// Position of the chunk's lowest bit in the word.
    pub lsb: u8,
    /// Chunk width in bits.
    pub width: u8,
    /// Position of the chunk inside the operand value.
    pub shift: u8,
    pub kind: PlacementKind,
}

impl Placement {
    /// Mask of the chunk's raw bits (right-aligned).
    #[inline]
    #[must_use]
    pub const fn mask(&self) -> u64 {
        if self.width >= 64 {
            u64::MAX
        } else {
            (1u64 << self.width) - 1
        }
    }

    /// Move the placement `offset` bits towards the MSB of a wider word.
    #[must_use]
    pub fn rebase(&self, offset: u8) -> Self {
        Self {
            lsb: self.lsb + offset,
            ..self.clone()
        }
    }

    /// Raw chunk bits from `word`.
    #[inline]
    #[must_use]
    pub const fn read(&self, word: u64) -> u64 {
        (word >> self.lsb) & self.mask()
    }

    fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.alias.as_deref())
    }
}

/// Resolve the placements of a pattern whose MSB is bit `width - 1`.
pub(crate) fn resolve(cells: &[Cell], width: u8) -> Vec<Placement> {
    let mut placements = Vec::new();
    let mut next = u32::from(width);

    for cell in cells {
        let cell_width = cell.width();
        next = next.saturating_sub(cell_width);
        let Cell::Field { field, chunk } = cell else {
            continue;
        };
        let Some(range) = field.ranges().get(*chunk) else {
            continue;
        };
        let kind = match field.kind() {
            FieldKind::Plus { bias } => PlacementKind::Bias(*bias),
            FieldKind::ImpliedRegister { low } => PlacementKind::Implied(*low),
            // Sign position is fixed up once every placement is known
            FieldKind::NotXor => PlacementKind::NotXor { sign: 0 },
            _ => PlacementKind::Plain,
        };
        placements.push(Placement {
            name: field.name().to_string(),
            alias: field.alias().map(str::to_string),
            lsb: next as u8,
            width: range.width,
            shift: range.shift,
            kind,
        });
    }

    let tops: FxHashMap<String, u8> = placements
        .iter()
        .filter(|p| !matches!(p.kind, PlacementKind::NotXor { .. }))
        .fold(FxHashMap::default(), |mut tops, p| {
            let top = p.shift + p.width - 1;
            let entry = tops.entry(p.name.clone()).or_insert(top);
            *entry = (*entry).max(top);
            tops
        });
    for placement in &mut placements {
        if let PlacementKind::NotXor { sign } = &mut placement.kind {
            *sign = tops.get(&placement.name).copied().unwrap_or(placement.shift);
        }
    }

    placements
}

/// Extract operand values from `word` (fields only, no macros).
///
/// Chunks of the same operand are OR'ed together; repeated chunks bind the
/// same bits.
#[must_use]
pub fn extract_operands(placements: &[Placement], word: u64) -> Operands {
    let mut raw: FxHashMap<&str, u64> = FxHashMap::default();
    let mut biases: FxHashMap<&str, u32> = FxHashMap::default();
    let mut order: Vec<&str> = Vec::new();

    for p in placements {
        let mut bits = p.read(word) << p.shift;
        match p.kind {
            PlacementKind::NotXor { .. } => {
                // Still register the name so it exists when it is the only chunk
                bits = 0;
            }
            PlacementKind::Implied(low) => bits |= u64::from(low),
            PlacementKind::Bias(bias) => {
                biases.insert(p.name.as_str(), bias);
            }
            PlacementKind::Plain => {}
        }
        for name in p.names() {
            if !raw.contains_key(name) {
                order.push(name);
            }
            *raw.entry(name).or_insert(0) |= bits;
        }
    }

    for p in placements {
        let PlacementKind::NotXor { sign } = p.kind else {
            continue;
        };
        let s = raw.get(p.name.as_str()).map_or(0, |v| (v >> sign) & 1);
        let bit = (!(p.read(word) ^ s)) & 1;
        for name in p.names() {
            *raw.entry(name).or_insert(0) |= bit << p.shift;
        }
    }

    let mut operands = Operands::new();
    for name in order {
        let value = raw.get(name).copied().unwrap_or(0) as i64;
        let bias = biases.get(name).copied().map_or(0, i64::from);
        operands.set(name, value + bias);
    }
    operands
}

/// Write operand values into the chunk positions of `word`.
///
/// Operands missing from `values` encode as zero.
#[must_use]
pub fn insert_operands(placements: &[Placement], values: &Operands, word: u64) -> u64 {
    let mut word = word;
    for p in placements {
        let value = values.get(&p.name).unwrap_or(0);
        let raw = match p.kind {
            PlacementKind::Bias(bias) => value.wrapping_sub(i64::from(bias)) as u64,
            PlacementKind::NotXor { sign } => {
                let s = ((value as u64) >> sign) & 1;
                let bit = ((value as u64) >> p.shift) & 1;
                // J = NOT(I XOR S)
                ((!(bit ^ s)) & 1) << p.shift
            }
            PlacementKind::Plain | PlacementKind::Implied(_) => value as u64,
        };
        let chunk = (raw >> p.shift) & p.mask();
        word = (word & !(p.mask() << p.lsb)) | (chunk << p.lsb);
    }
    word
}
