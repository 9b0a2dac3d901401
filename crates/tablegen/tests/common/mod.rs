//! Shared fixtures: a representative Thumb catalog and tracing setup.

#![allow(dead_code)]

use std::sync::{Arc, OnceLock};

use tablegen::{
    FLAG_IT, FieldKind, FieldRef, FieldSpec, InstructionSpec, MacroSpec, Pattern, REG_PC, REG_SP,
};
use tracing_subscriber::EnvFilter;

/// Install a `RUST_LOG`-driven subscriber once per test binary.
pub fn init_tracing() {
    static INIT: OnceLock<()> = OnceLock::new();
    INIT.get_or_init(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_target(false)
            .with_test_writer()
            .try_init();
    });
}

/// Operand fields shared by the catalog.
pub struct Fields {
    pub rd: FieldRef,
    pub rd3: FieldRef,
    pub rn: FieldRef,
    pub rn3: FieldRef,
    pub rm: FieldRef,
    pub rm3: FieldRef,
    pub rt: FieldRef,
    pub rt3: FieldRef,
    pub rdn3: FieldRef,
    pub rdn1_3: FieldRef,
    pub rdm3: FieldRef,
    pub rdm1_3: FieldRef,
    pub rd1_3: FieldRef,
    pub rn1_3: FieldRef,
    pub s: FieldRef,
    pub w: FieldRef,
    pub cond: FieldRef,
    pub first_cond: FieldRef,
    pub it_mask: FieldRef,
    pub register_list: FieldRef,
    pub register_list8: FieldRef,
    pub register_list13: FieldRef,
    pub register_list1_14: FieldRef,
    pub m: FieldRef,
    pub p: FieldRef,
    pub imm1_6: FieldRef,
    pub imm1_11: FieldRef,
    pub imm1_18: FieldRef,
    pub imm1_19: FieldRef,
    pub imm1_20: FieldRef,
    pub imm1_24: FieldRef,
    pub imm1_22_nxor: FieldRef,
    pub imm1_23_nxor: FieldRef,
    pub imm3: FieldRef,
    pub imm3_8: FieldRef,
    pub imm4_12: FieldRef,
    pub imm5: FieldRef,
    pub imm5_1: FieldRef,
    pub imm6_12: FieldRef,
    pub imm7_2: FieldRef,
    pub imm8: FieldRef,
    pub imm8_1: FieldRef,
    pub imm8_2: FieldRef,
    pub imm10_12: FieldRef,
    pub imm11_1: FieldRef,
    pub imm12: FieldRef,
    /// Plain 12-bit immediate with a distinct name (`UDF.W` needs 16 bits).
    pub imm16: FieldRef,
}

impl Fields {
    pub fn new() -> Self {
        let imm = |width, shift| FieldSpec::scattered_immediate("imm", width, shift).unwrap();
        Self {
            rd: FieldSpec::register("Rd", 4).unwrap(),
            rd3: FieldSpec::register("Rd", 3).unwrap(),
            rn: FieldSpec::register("Rn", 4).unwrap(),
            rn3: FieldSpec::register("Rn", 3).unwrap(),
            rm: FieldSpec::register("Rm", 4).unwrap(),
            rm3: FieldSpec::register("Rm", 3).unwrap(),
            rt: FieldSpec::register("Rt", 4).unwrap(),
            rt3: FieldSpec::register("Rt", 3).unwrap(),
            rdn3: FieldSpec::double_register("Rd", "Rn", 3).unwrap(),
            rdn1_3: FieldSpec::double_scattered_register("Rd", "Rn", 1, 3).unwrap(),
            rdm3: FieldSpec::double_register("Rd", "Rm", 3).unwrap(),
            rdm1_3: FieldSpec::double_scattered_register("Rd", "Rm", 1, 3).unwrap(),
            rd1_3: FieldSpec::scattered_register("Rd", 1, 3).unwrap(),
            rn1_3: FieldSpec::scattered_register("Rn", 1, 3).unwrap(),
            s: FieldSpec::field("S", 1).unwrap(),
            w: FieldSpec::field("W", 1).unwrap(),
            cond: FieldSpec::field("cond", 4).unwrap(),
            first_cond: FieldSpec::field("first_cond", 4).unwrap(),
            it_mask: FieldSpec::field("it_mask", 4).unwrap(),
            register_list: FieldSpec::field("register_list", 16).unwrap(),
            register_list8: FieldSpec::field("register_list", 8).unwrap(),
            register_list13: FieldSpec::field("register_list", 13).unwrap(),
            register_list1_14: FieldSpec::scattered_field("register_list", 1, 14).unwrap(),
            m: FieldSpec::field("M", 1).unwrap(),
            p: FieldSpec::field("P", 1).unwrap(),
            imm1_6: imm(1, 6),
            imm1_11: imm(1, 11),
            imm1_18: imm(1, 18),
            imm1_19: imm(1, 19),
            imm1_20: imm(1, 20),
            imm1_24: imm(1, 24),
            imm1_22_nxor: FieldSpec::not_xor_immediate("imm", 22).unwrap(),
            imm1_23_nxor: FieldSpec::not_xor_immediate("imm", 23).unwrap(),
            imm3: FieldSpec::immediate("imm", 3).unwrap(),
            imm3_8: imm(3, 8),
            imm4_12: imm(4, 12),
            imm5: FieldSpec::immediate("imm", 5).unwrap(),
            imm5_1: imm(5, 1),
            imm6_12: imm(6, 12),
            imm7_2: imm(7, 2),
            imm8: FieldSpec::immediate("imm", 8).unwrap(),
            imm8_1: imm(8, 1),
            imm8_2: imm(8, 2),
            imm10_12: imm(10, 12),
            imm11_1: imm(11, 1),
            imm12: FieldSpec::immediate("imm", 12).unwrap(),
            imm16: FieldSpec::scattered("imm", 16, FieldKind::Immediate, &[(12, 4), (0, 12)])
                .unwrap(),
        }
    }
}

fn s_it() -> MacroSpec {
    MacroSpec::assign([("S", FLAG_IT)])
}

fn branch(bits: u8) -> Vec<MacroSpec> {
    vec![MacroSpec::sign_extend(bits), MacroSpec::assign([("Rn", REG_PC)])]
}

fn spec(syntax: &str, width: u8, pattern: Pattern, macros: Vec<MacroSpec>) -> Arc<InstructionSpec> {
    Arc::new(InstructionSpec::new(syntax, width, pattern, macros).unwrap())
}

/// 16-bit encodings.
pub fn thumb16(f: &Fields) -> Vec<Arc<InstructionSpec>> {
    let p = Pattern::new;
    vec![
        spec("ADC{S}<c> <Rdn3>, <Rm3>", 16, p().bits("0100000101").field(&f.rm3).field(&f.rdn3), vec![s_it()]),
        spec("ADD{S}<c> <Rd3>, <Rn3>, #<imm3>", 16, p().bits("0001110").field(&f.imm3).field(&f.rn3).field(&f.rd3), vec![s_it()]),
        spec("ADD{S}<c> <Rdn3>, #<imm8>", 16, p().bits("00110").field(&f.rdn3).field(&f.imm8), vec![s_it()]),
        spec("ADD{S}<c> <Rd>, <Rn>, <Rm>", 16, p().bits("0001100").field(&f.rm3).field(&f.rn3).field(&f.rd3), vec![s_it()]),
        spec("ADD<c> <Rdn>, <Rm>", 16, p().bits("01000100").field(&f.rdn1_3).field(&f.rm).field(&f.rdn3), vec![]),
        spec("ADD<c> <Rd3>, <Rn=SP>, #<imm>", 16, p().bits("10101").field(&f.rd3).field(&f.imm8_2), vec![MacroSpec::assign([("Rn", REG_SP)])]),
        spec("ADD<c> <Rdn=SP>, #<imm>", 16, p().bits("101100000").field(&f.imm7_2), vec![MacroSpec::assign([("Rd", REG_SP), ("Rn", REG_SP)])]),
        spec("ADD<c> <Rdm>, <Rn=SP>, <Rdm>", 16, p().bits("01000100").field(&f.rdm1_3).bits("1101").field(&f.rdm3), vec![MacroSpec::assign([("Rn", REG_SP)])]),
        spec("AND{S}<c> <Rdn3>, <Rm3>", 16, p().bits("0100000000").field(&f.rm3).field(&f.rdn3), vec![s_it()]),
        spec("B<c> <label>", 16, p().bits("1101").field(&f.cond).field(&f.imm8_1), branch(9)),
        spec("B<c> <label>", 16, p().bits("11100").field(&f.imm11_1), branch(12)),
        spec("BKPT #<imm8>", 16, p().bits("10111110").field(&f.imm8), vec![]),
        spec("BLX<c> <Rm>", 16, p().bits("010001111").field(&f.rm).bits("xxx"), vec![]),
        spec("BX<c> <Rm>", 16, p().bits("010001110").field(&f.rm).bits("xxx"), vec![]),
        spec("CBZ <Rn>, <label>", 16, p().bits("101100").field(&f.imm1_6).bits("1").field(&f.imm5_1).field(&f.rn3), vec![]),
        spec("CMP<c> <Rn3>, #<imm8>", 16, p().bits("00101").field(&f.rn3).field(&f.imm8), vec![]),
        spec("CMP<c> <Rn3>, <Rm3>", 16, p().bits("0100001010").field(&f.rm3).field(&f.rn3), vec![]),
        spec("CMP<c> <Rn>, <Rm>", 16, p().bits("01000101").field(&f.rn1_3).field(&f.rm).field(&f.rn3), vec![]),
        spec("EOR{S}<c> <Rdn3>, <Rm3>", 16, p().bits("0100000001").field(&f.rm3).field(&f.rdn3), vec![s_it()]),
        spec("IT{<x>{<y>{<z>}}} <firstcond>", 16, p().bits("10111111").field(&f.first_cond).field(&f.it_mask), vec![]),
        spec("LDR<c> <Rt3>, [<Rn3>{, #<imm>}]", 16, p().bits("01101").field(&f.imm5).field(&f.rn3).field(&f.rt3), vec![]),
        spec("LDR<c> <Rt3>, [SP{, #<imm>}]", 16, p().bits("10011").field(&f.rt3).field(&f.imm8_2), vec![MacroSpec::assign([("Rn", REG_SP)])]),
        spec("LSL{S}<c> <Rd3>, <Rm3>, #<imm5>", 16, p().bits("00000").field(&f.imm5).field(&f.rm3).field(&f.rd3), vec![s_it()]),
        spec("MOV{S} <Rd3>, <Rm3>", 16, p().bits("0000000000").field(&f.rm3).field(&f.rd3), vec![s_it()]),
        spec("MOV{S}<c> <Rd3>, #<imm8>", 16, p().bits("00100").field(&f.rd3).field(&f.imm8), vec![s_it()]),
        spec("MOV<c> <Rd>, <Rm>", 16, p().bits("01000110").field(&f.rd1_3).field(&f.rm).field(&f.rd3), vec![]),
        spec("MUL{S}<c> <Rdm3>, <Rn3>, <Rdm3>", 16, p().bits("0100001101").field(&f.rn3).field(&f.rdm3), vec![s_it()]),
        spec("NOP<c>", 16, p().bits("1011111100000000"), vec![]),
        spec("ORR{S}<c> <Rdn3>, <Rm3>", 16, p().bits("0100001100").field(&f.rm3).field(&f.rdn3), vec![s_it()]),
        spec("POP<c> <registers>", 16, p().bits("1011110").field(&f.p).field(&f.register_list8), vec![MacroSpec::merge_reglist(&[("P", 15)], "register_list")]),
        spec("PUSH<c> <registers>", 16, p().bits("1011010").field(&f.m).field(&f.register_list8), vec![MacroSpec::merge_reglist(&[("M", 14)], "register_list")]),
        spec("SUB<c> <Rd=SP>, <Rn=SP>, #<imm>", 16, p().bits("101100001").field(&f.imm7_2), vec![MacroSpec::assign([("Rd", REG_SP), ("Rn", REG_SP)])]),
        spec("SVC<c> #<imm8>", 16, p().bits("11011111").field(&f.imm8), vec![]),
        spec("UDF<c> #<imm8>", 16, p().bits("11011110").field(&f.imm8), vec![]),
    ]
}

/// 32-bit encodings.
pub fn thumb32(f: &Fields) -> Vec<Arc<InstructionSpec>> {
    let p = Pattern::new;
    let modified_imm = |op: &str| {
        p().bits("11110")
            .field(&f.imm1_11)
            .bits(op)
    };
    vec![
        spec(
            "ADC{S}<c> <Rd>, <Rn>, #<const>",
            32,
            modified_imm("01010").field(&f.s).field(&f.rn).bits("0").field(&f.imm3_8).field(&f.rd).field(&f.imm8),
            vec![MacroSpec::expand_immediate()],
        ),
        spec(
            "ADD{S}<c>.W <Rd>, <Rn>, #<const>",
            32,
            modified_imm("01000").field(&f.s).field(&f.rn).bits("0").field(&f.imm3_8).field(&f.rd).field(&f.imm8),
            vec![MacroSpec::expand_immediate()],
        ),
        spec(
            "ADDW<c> <Rd>, <Rn>, #<imm12>",
            32,
            modified_imm("100000").field(&f.rn).bits("0").field(&f.imm3_8).field(&f.rd).field(&f.imm8),
            vec![],
        ),
        spec(
            "MOV{S}<c>.W <Rd>, #<const>",
            32,
            modified_imm("00010").field(&f.s).bits("11110").field(&f.imm3_8).field(&f.rd).field(&f.imm8),
            vec![MacroSpec::expand_immediate()],
        ),
        spec(
            "MOVW<c> <Rd>, #<imm16>",
            32,
            modified_imm("100100").field(&f.imm4_12).bits("0").field(&f.imm3_8).field(&f.rd).field(&f.imm8),
            vec![],
        ),
        spec(
            "B<c>.W <label>",
            32,
            p().bits("11110").field(&f.imm1_20).field(&f.cond).field(&f.imm6_12)
                .bits("10").field(&f.imm1_18).bits("0").field(&f.imm1_19).field(&f.imm11_1),
            branch(21),
        ),
        spec(
            "B<c>.W <label>",
            32,
            p().bits("11110").field(&f.imm1_24).field(&f.imm10_12)
                .bits("10").field(&f.imm1_23_nxor).bits("1").field(&f.imm1_22_nxor).field(&f.imm11_1),
            branch(25),
        ),
        spec(
            "BL<c> <label>",
            32,
            p().bits("11110").field(&f.imm1_24).field(&f.imm10_12)
                .bits("11").field(&f.imm1_23_nxor).bits("1").field(&f.imm1_22_nxor).field(&f.imm11_1),
            branch(25),
        ),
        spec(
            "CLZ<c> <Rd>, <Rm>",
            32,
            p().bits("111110101011").field(&f.rm).bits("1111").field(&f.rd).bits("1000").field(&f.rm),
            vec![],
        ),
        spec(
            "LDR<c>.W <Rt>, [<Rn>{, #<imm12>}]",
            32,
            p().bits("111110001101").field(&f.rn).field(&f.rt).field(&f.imm12),
            vec![],
        ),
        spec(
            "NOP<c>.W",
            32,
            p().bits("111100111010 xxxx 10x0x000 00000000"),
            vec![],
        ),
        spec(
            "POP<c>.W <registers>",
            32,
            p().bits("1110100010111101").field(&f.register_list),
            vec![],
        ),
        spec(
            "POP<c>.W <registers>",
            32,
            p().bits("1111100001011101").field(&f.rt).bits("101100000100"),
            vec![MacroSpec::rt_reglist()],
        ),
        spec(
            "PUSH<c>.W <registers>",
            32,
            p().bits("1110100100101101").field(&f.register_list),
            vec![],
        ),
        spec(
            "PUSH<c>.W <registers>",
            32,
            p().bits("1111100001001101").field(&f.rt).bits("110100000100"),
            vec![MacroSpec::rt_reglist()],
        ),
        spec(
            "SDIV<c> <Rd>, <Rn>, <Rm>",
            32,
            p().bits("111110111001").field(&f.rn).bits("xxxx").field(&f.rd).bits("1111").field(&f.rm),
            vec![],
        ),
        // Should-be-zero bits stay free; fixing them breaks nesting with PUSH.W
        spec(
            "STMDB<c> <Rn>{!}, <registers>",
            32,
            p().bits("1110100100").field(&f.w).bits("0").field(&f.rn)
                .bits("x").field(&f.register_list1_14).bits("x").field(&f.register_list13),
            vec![],
        ),
        spec(
            "UDF<c>.W #<imm16>",
            32,
            p().bits("111101111111").chunk(&f.imm16, 0).bits("1010").chunk(&f.imm16, 1),
            vec![],
        ),
    ]
}

/// The full fixture catalog, 16-bit encodings first.
pub fn thumb_catalog() -> Vec<Arc<InstructionSpec>> {
    let f = Fields::new();
    let mut catalog = thumb16(&f);
    catalog.extend(thumb32(&f));
    catalog
}

/// The most specific catalog entry matching a right-aligned `word` of `width` bits.
pub fn expected_match(
    catalog: &[Arc<InstructionSpec>],
    width: u8,
    word: u64,
) -> Option<Arc<InstructionSpec>> {
    let matching: Vec<_> = catalog
        .iter()
        .filter(|spec| spec.width() == width && spec.matches(word))
        .collect();
    matching
        .iter()
        .find(|winner| {
            matching.iter().all(|other| {
                let (outer, inner) = (winner.literal_mask(), other.literal_mask());
                Arc::ptr_eq(winner, other) || (outer & inner == inner && outer != inner)
            })
        })
        .map(|&spec| Arc::clone(spec))
}
