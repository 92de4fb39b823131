use super::opcodes::*;
use crate::jvm::class_file::ByteCursor;
use crate::jvm::Error;
use crate::util::Offset;
use std::collections::{BTreeSet, HashSet};

/// Instruction decoded just far enough to follow control flow out of it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedInstruction {
    /// Offset of the opcode from the start of the bytecode
    pub offset: Offset,

    pub opcode: u8,

    /// Width of the instruction, including operands and any switch padding
    pub width: usize,

    /// Absolute offsets of branch targets, already range checked
    pub targets: Vec<Offset>,

    /// Can execution continue with the instruction right after this one?
    pub falls_through: bool,
}

impl ScannedInstruction {
    /// Offset of the instruction that follows this one
    pub fn next_offset(&self) -> Offset {
        Offset(self.offset.0 + self.width)
    }
}

/// Decode the instruction starting at `offset`
///
/// Only the control-flow effect of the instruction is extracted: operands that aren't branch
/// offsets are skipped over. Switch padding is computed relative to the start of `bytecode`.
pub fn decode_instruction(bytecode: &[u8], offset: Offset) -> Result<ScannedInstruction, Error> {
    let mut reader = ByteCursor::at(bytecode, offset.0);
    let result = decode_operands(&mut reader, offset);

    // Any truncated operand means the instruction runs off the end of the method body
    let (opcode, relative_targets, falls_through) = match result {
        Ok(decoded) => decoded,
        Err(Error::UnexpectedEof { .. }) => return Err(Error::CodeOverrun(offset.0)),
        Err(other) => return Err(other),
    };

    let mut targets = Vec::with_capacity(relative_targets.len());
    for relative in relative_targets {
        let target = offset.0 as i64 + relative as i64;
        if target < 0 || target >= bytecode.len() as i64 {
            return Err(Error::BadBranchTarget {
                offset: offset.0,
                target,
            });
        }
        targets.push(Offset(target as usize));
    }

    Ok(ScannedInstruction {
        offset,
        opcode,
        width: reader.position() - offset.0,
        targets,
        falls_through,
    })
}

/// Read an opcode and its operands, returning the opcode, the branch offsets relative to the
/// opcode, and whether the instruction falls through
fn decode_operands(
    reader: &mut ByteCursor,
    offset: Offset,
) -> Result<(u8, Vec<i32>, bool), Error> {
    let opcode = reader.read_u8()?;
    let decoded = match opcode {
        // No operands
        0x00..=0x0f
        | 0x1a..=0x35
        | 0x3b..=0x83
        | 0x85..=0x98
        | ARRAYLENGTH
        | MONITORENTER
        | MONITOREXIT => (vec![], true),

        // One byte of operands: local index, constant, array type
        BIPUSH | LDC | 0x15..=0x19 | 0x36..=0x3a | NEWARRAY => {
            reader.skip(1)?;
            (vec![], true)
        }

        // Two bytes of operands: constant pool index, short constant, `iinc`
        SIPUSH
        | 0x13..=LDC2_W
        | IINC
        | GETSTATIC..=INVOKESTATIC
        | NEW
        | ANEWARRAY
        | CHECKCAST
        | INSTANCEOF => {
            reader.skip(2)?;
            (vec![], true)
        }

        MULTIANEWARRAY => {
            reader.skip(3)?;
            (vec![], true)
        }

        // Index followed by either a count and a zero, or two zeros
        INVOKEINTERFACE | INVOKEDYNAMIC => {
            reader.skip(4)?;
            (vec![], true)
        }

        IFEQ..=IF_ACMPNE | IFNULL | IFNONNULL | JSR => {
            let target = reader.read_i16()? as i32;
            (vec![target], true)
        }
        GOTO => {
            let target = reader.read_i16()? as i32;
            (vec![target], false)
        }
        JSR_W => (vec![reader.read_i32()?], true),
        GOTO_W => (vec![reader.read_i32()?], false),

        // Return address is in a local, so there is no statically known successor
        RET => {
            reader.skip(1)?;
            (vec![], false)
        }

        IRETURN..=RETURN | ATHROW => (vec![], false),

        TABLESWITCH => {
            skip_switch_padding(reader)?;
            let default = reader.read_i32()?;
            let low = reader.read_i32()?;
            let high = reader.read_i32()?;
            if high < low {
                return Err(Error::BadSwitchBounds {
                    offset: offset.0,
                    low,
                    high,
                });
            }
            let mut targets = vec![default];
            for _ in low..=high {
                targets.push(reader.read_i32()?);
            }
            (targets, false)
        }

        LOOKUPSWITCH => {
            skip_switch_padding(reader)?;
            let default = reader.read_i32()?;
            let pairs = reader.read_i32()?;
            if pairs < 0 {
                return Err(Error::BadSwitchBounds {
                    offset: offset.0,
                    low: 0,
                    high: pairs,
                });
            }
            let mut targets = vec![default];
            for _ in 0..pairs {
                let _match = reader.read_i32()?;
                targets.push(reader.read_i32()?);
            }
            (targets, false)
        }

        WIDE => {
            let modified = reader.read_u8()?;
            match modified {
                IINC => {
                    reader.skip(4)?;
                    (vec![], true)
                }
                0x15..=0x19 | 0x36..=0x3a => {
                    reader.skip(2)?;
                    (vec![], true)
                }
                RET => {
                    reader.skip(2)?;
                    (vec![], false)
                }
                _ => {
                    return Err(Error::BadOpcode {
                        offset: offset.0 + 1,
                        opcode: modified,
                    })
                }
            }
        }

        _ => {
            return Err(Error::BadOpcode {
                offset: offset.0,
                opcode,
            })
        }
    };
    Ok((opcode, decoded.0, decoded.1))
}

/// Switch operands start at the next multiple of four after the opcode
fn skip_switch_padding(reader: &mut ByteCursor) -> Result<(), Error> {
    let padding = (4 - reader.position() % 4) % 4;
    reader.skip(padding)
}

/// Compute the offsets of basic blocks reachable from the start of the bytecode
pub fn basic_block_starts(bytecode: &[u8]) -> Result<BTreeSet<Offset>, Error> {
    basic_block_starts_from(bytecode, &[Offset(0)], |_| Ok(()))
}

/// Compute the offsets of basic blocks reachable from some entry points
///
/// Entry points are always block starts. From there, instructions are walked linearly, with
/// every branch target becoming a new block start to walk from. Each reachable instruction is
/// decoded (and passed to `visit`) exactly once, so the scan terminates even on loops.
pub fn basic_block_starts_from<F>(
    bytecode: &[u8],
    entry_points: &[Offset],
    mut visit: F,
) -> Result<BTreeSet<Offset>, Error>
where
    F: FnMut(&ScannedInstruction) -> Result<(), Error>,
{
    let mut block_starts: BTreeSet<Offset> = BTreeSet::new();
    let mut worklist: Vec<Offset> = vec![];
    for entry in entry_points {
        if block_starts.insert(*entry) {
            worklist.push(*entry);
        }
    }

    let mut walked: HashSet<Offset> = HashSet::new();
    while let Some(start) = worklist.pop() {
        let mut offset = start;

        // Stop once we reach code that has already been walked
        while walked.insert(offset) {
            let instruction = decode_instruction(bytecode, offset)?;
            visit(&instruction)?;

            for target in &instruction.targets {
                if block_starts.insert(*target) {
                    worklist.push(*target);
                }
            }

            if !instruction.falls_through {
                break;
            }
            offset = instruction.next_offset();
        }
    }

    Ok(block_starts)
}

#[cfg(test)]
mod test {
    use super::*;

    fn starts(bytecode: &[u8]) -> Vec<usize> {
        basic_block_starts(bytecode)
            .unwrap()
            .into_iter()
            .map(|offset| offset.0)
            .collect()
    }

    #[test]
    fn only_return() {
        assert_eq!(starts(&[RETURN]), vec![0]);
    }

    #[test]
    fn goto_self() {
        assert_eq!(starts(&[GOTO, 0x00, 0x00]), vec![0]);
    }

    #[test]
    fn conditional_branch() {
        // 0: iload_0
        // 1: ifeq +6 (7)
        // 4: iconst_1
        // 5: ireturn
        // 6: nop (unreachable)
        // 7: iconst_0
        // 8: ireturn
        let bytecode = [0x1a, IFEQ, 0x00, 0x06, 0x04, IRETURN, 0x00, 0x03, IRETURN];
        assert_eq!(starts(&bytecode), vec![0, 7]);
    }

    #[test]
    fn backwards_loop() {
        // 0: iinc 1 1
        // 3: iload_1
        // 4: ifne -4 (0)
        // 7: return
        let bytecode = [IINC, 0x01, 0x01, 0x1b, 0x9a, 0xff, 0xfc, RETURN];
        assert_eq!(starts(&bytecode), vec![0]);
    }

    #[test]
    fn tableswitch() {
        // 0: iload_0
        // 1: tableswitch (padding to 4) default=+27 low=0 high=2 targets=+28,+29,+30
        // 28: return, 29: return, 30: return, 31: return
        let mut bytecode = vec![0x1a, TABLESWITCH, 0x00, 0x00];
        for operand in [27i32, 0, 2, 28, 29, 30] {
            bytecode.extend_from_slice(&operand.to_be_bytes());
        }
        assert_eq!(bytecode.len(), 28);
        bytecode.extend_from_slice(&[RETURN, RETURN, RETURN, RETURN]);

        let switch = decode_instruction(&bytecode, Offset(1)).unwrap();
        assert_eq!(switch.width, 27);
        assert!(!switch.falls_through);
        assert_eq!(starts(&bytecode), vec![0, 28, 29, 30, 31]);
    }

    #[test]
    fn lookupswitch() {
        // 0: iload_0
        // 1: iload_0
        // 2: lookupswitch (padding to 4) default=+26 npairs=2 (7 -> +27) (42 -> +26)
        let mut bytecode = vec![0x1a, 0x1a, LOOKUPSWITCH, 0x00];
        for operand in [26i32, 2, 7, 27, 42, 26] {
            bytecode.extend_from_slice(&operand.to_be_bytes());
        }
        assert_eq!(bytecode.len(), 28);
        bytecode.extend_from_slice(&[RETURN, RETURN]);

        assert_eq!(starts(&bytecode), vec![0, 28, 29]);
    }

    #[test]
    fn subroutines() {
        // 0: jsr +5 (5)
        // 3: return
        // 4: nop (unreachable)
        // 5: astore_1
        // 6: ret 1
        let bytecode = [JSR, 0x00, 0x05, RETURN, 0x00, 0x4c, RET, 0x01];
        assert_eq!(starts(&bytecode), vec![0, 5]);

        let bytecode = [JSR_W, 0x00, 0x00, 0x00, 0x07, RETURN, 0x00, 0x4c, RET, 0x01];
        assert_eq!(starts(&bytecode), vec![0, 7]);
    }

    #[test]
    fn wide_instructions() {
        let iinc = [WIDE, IINC, 0x01, 0x00, 0x00, 0x01, RETURN];
        assert_eq!(decode_instruction(&iinc, Offset(0)).unwrap().width, 6);
        assert_eq!(starts(&iinc), vec![0]);

        let iload = [WIDE, 0x15, 0x01, 0x00, RETURN];
        assert_eq!(decode_instruction(&iload, Offset(0)).unwrap().width, 4);

        let ret = [WIDE, RET, 0x01, 0x00];
        assert!(!decode_instruction(&ret, Offset(0)).unwrap().falls_through);
        assert_eq!(starts(&ret), vec![0]);

        match decode_instruction(&[WIDE, GOTO, 0x00, 0x00], Offset(0)) {
            Err(Error::BadOpcode {
                offset: 1,
                opcode: GOTO,
            }) => (),
            other => panic!("expected bad opcode, got {:?}", other),
        }
    }

    #[test]
    fn athrow_and_goto_w_stop() {
        // 0: aconst_null
        // 1: athrow
        // 2: nop (unreachable, would otherwise be decoded)
        let bytecode = [0x01, ATHROW, 0xff];
        assert_eq!(starts(&bytecode), vec![0]);

        // 0: goto_w +6 (6)
        // 5: <bad opcode> (unreachable)
        // 6: return
        let bytecode = [GOTO_W, 0x00, 0x00, 0x00, 0x06, 0xff, RETURN];
        assert_eq!(starts(&bytecode), vec![0, 6]);
    }

    #[test]
    fn invoke_widths() {
        let cases: &[(&[u8], usize)] = &[
            (&[INVOKEVIRTUAL, 0x00, 0x01], 3),
            (&[INVOKEINTERFACE, 0x00, 0x01, 0x01, 0x00], 5),
            (&[INVOKEDYNAMIC, 0x00, 0x01, 0x00, 0x00], 5),
            (&[MULTIANEWARRAY, 0x00, 0x01, 0x02], 4),
            (&[NEWARRAY, 0x0a], 2),
            (&[LDC2_W, 0x00, 0x01], 3),
        ];
        for (bytecode, width) in cases {
            let insn = decode_instruction(bytecode, Offset(0)).unwrap();
            assert_eq!(insn.width, *width, "width of opcode {:#x}", bytecode[0]);
            assert!(insn.falls_through);
        }
    }

    #[test]
    fn malformed_code() {
        match basic_block_starts(&[0xff]) {
            Err(Error::BadOpcode {
                offset: 0,
                opcode: 0xff,
            }) => (),
            other => panic!("expected bad opcode, got {:?}", other),
        }

        // Falling off the end of the code
        match basic_block_starts(&[0x00, 0x00]) {
            Err(Error::CodeOverrun(2)) => (),
            other => panic!("expected overrun, got {:?}", other),
        }

        // Truncated operands
        match basic_block_starts(&[0x00, SIPUSH, 0x01]) {
            Err(Error::CodeOverrun(1)) => (),
            other => panic!("expected overrun, got {:?}", other),
        }

        match basic_block_starts(&[GOTO, 0xff, 0xf0]) {
            Err(Error::BadBranchTarget {
                offset: 0,
                target: -16,
            }) => (),
            other => panic!("expected bad target, got {:?}", other),
        }

        let mut bytecode = vec![TABLESWITCH, 0x00, 0x00, 0x00];
        for operand in [0i32, 3, 2] {
            bytecode.extend_from_slice(&operand.to_be_bytes());
        }
        match basic_block_starts(&bytecode) {
            Err(Error::BadSwitchBounds {
                offset: 0,
                low: 3,
                high: 2,
            }) => (),
            other => panic!("expected bad bounds, got {:?}", other),
        }
    }

    #[test]
    fn every_reachable_instruction_is_visited_once() {
        // 0: iconst_0
        // 1: ifeq -1 (0)
        // 4: goto -4 (0)
        let bytecode = [0x03, IFEQ, 0xff, 0xff, GOTO, 0xff, 0xfc];
        let mut visited = vec![];
        let starts = basic_block_starts_from(&bytecode, &[Offset(0), Offset(4)], |insn| {
            visited.push(insn.offset.0);
            Ok(())
        })
        .unwrap();
        visited.sort_unstable();
        assert_eq!(visited, vec![0, 1, 4]);
        assert_eq!(starts.into_iter().map(|o| o.0).collect::<Vec<_>>(), vec![0, 4]);
    }
}
