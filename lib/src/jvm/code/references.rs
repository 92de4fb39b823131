use super::opcodes::{INVOKEINTERFACE, INVOKEVIRTUAL};
use super::{basic_block_starts_from, Code};
use crate::jvm::class_file::{ByteCursor, ConstantIndex, ConstantPool, MethodRef};
use crate::jvm::Error;
use crate::util::Offset;

/// Methods referenced by the `invoke*` instructions of a method body
///
/// Only `invokevirtual`, `invokespecial`, `invokestatic`, and `invokeinterface` are considered:
/// `invokedynamic` call sites have no statically known target. Unreachable code is skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodReferences {
    /// Referenced methods, without duplicates, in order of first appearance by offset
    pub methods: Vec<MethodRef>,
}

impl MethodReferences {
    pub fn collect(code: &Code, constants: &ConstantPool) -> Result<MethodReferences, Error> {
        let mut invoke_sites: Vec<(Offset, ConstantIndex)> = vec![];

        basic_block_starts_from(&code.bytecode, &code.entry_points(), |insn| {
            if (INVOKEVIRTUAL..=INVOKEINTERFACE).contains(&insn.opcode) {
                let mut reader = ByteCursor::at(&code.bytecode, insn.offset.0 + 1);
                invoke_sites.push((insn.offset, ConstantIndex(reader.read_u16()?)));
            }
            Ok(())
        })?;
        invoke_sites.sort_unstable_by_key(|(offset, _)| *offset);

        let mut methods: Vec<MethodRef> = vec![];
        for (_, index) in invoke_sites {
            let method = constants.method_ref(index)?;
            if !methods.contains(&method) {
                methods.push(method);
            }
        }
        Ok(MethodReferences { methods })
    }

    pub fn iter(&self) -> impl Iterator<Item = &MethodRef> {
        self.methods.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}
