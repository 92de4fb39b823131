use crate::jvm::class_file::{
    Attribute, AttributeLike, ByteCursor, ClassConstantIndex, ConstantIndex, ConstantPool,
};
use crate::jvm::code::{basic_block_starts_from, MethodReferences};
use crate::jvm::{ClassName, Error};
use crate::util::Offset;
use std::collections::BTreeSet;

/// Decoded method body, as read out of a `Code` attribute
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se8/html/jvms-4.html#jvms-4.7.3
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Code {
    pub max_stack: u16,
    pub max_locals: u16,

    /// Raw bytecode instructions
    pub bytecode: Vec<u8>,

    pub exception_handlers: Vec<ExceptionHandler>,

    /// Rows of all `LineNumberTable` attributes, in the order they were declared
    pub line_numbers: Vec<LineNumber>,
}

impl AttributeLike for Code {
    const NAME: &'static str = "Code";

    fn parse(reader: &mut ByteCursor, constants: &ConstantPool) -> Result<Code, Error> {
        let max_stack = reader.read_u16()?;
        let max_locals = reader.read_u16()?;

        let code_length = reader.read_u32()? as usize;
        let bytecode = reader.read_fully(code_length)?.to_vec();

        let handler_count = reader.read_u16()?;
        let exception_handlers = (0..handler_count)
            .map(|_| ExceptionHandler::parse(reader, constants))
            .collect::<Result<Vec<_>, Error>>()?;

        // Nested attributes: only line numbers are of interest
        let mut line_numbers = vec![];
        for attribute in Attribute::parse_all(reader, constants)? {
            if attribute.name == LineNumberTable::NAME {
                let table: LineNumberTable = attribute.decode(constants)?;
                line_numbers.extend(table.0);
            }
        }

        Ok(Code {
            max_stack,
            max_locals,
            bytecode,
            exception_handlers,
            line_numbers,
        })
    }
}

impl Code {
    /// Source line for a bytecode offset
    ///
    /// The row with the largest start offset not past `offset` wins, with later rows winning
    /// ties. Returns 0 if no row covers the offset.
    pub fn line_number(&self, offset: usize) -> u16 {
        let mut best: Option<&LineNumber> = None;
        for row in &self.line_numbers {
            if row.start_pc as usize <= offset
                && best.map_or(true, |best| row.start_pc >= best.start_pc)
            {
                best = Some(row);
            }
        }
        best.map_or(0, |row| row.line_number)
    }

    /// Offsets at which basic blocks start
    ///
    /// In addition to everything reachable from the start of the method, exception handlers are
    /// also block entry points.
    pub fn block_starts(&self) -> Result<BTreeSet<Offset>, Error> {
        basic_block_starts_from(&self.bytecode, &self.entry_points(), |_| Ok(()))
    }

    /// Start of the method, followed by the start of every exception handler
    pub fn entry_points(&self) -> Vec<Offset> {
        let mut entry_points = vec![Offset(0)];
        entry_points.extend(
            self.exception_handlers
                .iter()
                .map(|handler| Offset(handler.handler_pc as usize)),
        );
        entry_points
    }

    /// Methods invoked from reachable code in this body (in order of first appearance)
    pub fn method_references(&self, constants: &ConstantPool) -> Result<MethodReferences, Error> {
        MethodReferences::collect(self, constants)
    }
}

/// Entry in the exception table of a method body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionHandler {
    /// Start of exception handler range (inclusive)
    pub start_pc: u16,

    /// End of exception handler range (exclusive)
    pub end_pc: u16,

    /// Start of the exception handler
    pub handler_pc: u16,

    /// Class of exceptions caught (`None` catches everything, eg. for `finally`)
    pub catch_type: Option<ClassName>,
}

impl ExceptionHandler {
    fn parse(reader: &mut ByteCursor, constants: &ConstantPool) -> Result<Self, Error> {
        let start_pc = reader.read_u16()?;
        let end_pc = reader.read_u16()?;
        let handler_pc = reader.read_u16()?;
        let catch_type = match reader.read_u16()? {
            0 => None,
            idx => Some(constants.class_name(ClassConstantIndex(ConstantIndex(idx)))?),
        };
        Ok(ExceptionHandler {
            start_pc,
            end_pc,
            handler_pc,
            catch_type,
        })
    }
}

/// Row of a `LineNumberTable`
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LineNumber {
    pub start_pc: u16,
    pub line_number: u16,
}

/// [0]: https://docs.oracle.com/javase/specs/jvms/se8/html/jvms-4.html#jvms-4.7.12
pub struct LineNumberTable(pub Vec<LineNumber>);

impl AttributeLike for LineNumberTable {
    const NAME: &'static str = "LineNumberTable";

    fn parse(reader: &mut ByteCursor, _constants: &ConstantPool) -> Result<Self, Error> {
        let count = reader.read_u16()?;
        let rows = (0..count)
            .map(|_| {
                Ok(LineNumber {
                    start_pc: reader.read_u16()?,
                    line_number: reader.read_u16()?,
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;
        Ok(LineNumberTable(rows))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    /// Pool with `LineNumberTable` at index 1 and `Code` at index 2
    fn constants() -> ConstantPool {
        let mut bytes = vec![0, 3];
        bytes.extend_from_slice(&[1, 0, 15]);
        bytes.extend_from_slice(b"LineNumberTable");
        bytes.extend_from_slice(&[1, 0, 4]);
        bytes.extend_from_slice(b"Code");
        ConstantPool::parse(&mut ByteCursor::new(&bytes)).unwrap()
    }

    fn code_info(bytecode: &[u8], handlers: &[[u16; 4]], lines: &[(u16, u16)]) -> Vec<u8> {
        let mut info = vec![0, 2, 0, 1];
        info.extend_from_slice(&(bytecode.len() as u32).to_be_bytes());
        info.extend_from_slice(bytecode);
        info.extend_from_slice(&(handlers.len() as u16).to_be_bytes());
        for handler in handlers {
            for field in handler {
                info.extend_from_slice(&field.to_be_bytes());
            }
        }
        if lines.is_empty() {
            info.extend_from_slice(&[0, 0]);
        } else {
            info.extend_from_slice(&[0, 1, 0, 1]);
            info.extend_from_slice(&(2 + 4 * lines.len() as u32).to_be_bytes());
            info.extend_from_slice(&(lines.len() as u16).to_be_bytes());
            for (start_pc, line) in lines {
                info.extend_from_slice(&start_pc.to_be_bytes());
                info.extend_from_slice(&line.to_be_bytes());
            }
        }
        info
    }

    fn decode(info: Vec<u8>) -> Result<Code, Error> {
        let attribute = Attribute {
            name: String::from("Code"),
            info,
        };
        attribute.decode(&constants())
    }

    #[test]
    fn body_with_handlers_and_lines() {
        // iconst_0; ireturn; astore_1; iconst_1; ireturn
        let bytecode = [0x03, 0xac, 0x4c, 0x04, 0xac];
        let code = decode(code_info(&bytecode, &[[0, 2, 2, 0]], &[(0, 10), (2, 12)])).unwrap();
        assert_eq!(code.max_stack, 2);
        assert_eq!(code.max_locals, 1);
        assert_eq!(code.bytecode, bytecode.to_vec());
        assert_eq!(
            code.exception_handlers,
            vec![ExceptionHandler {
                start_pc: 0,
                end_pc: 2,
                handler_pc: 2,
                catch_type: None,
            }]
        );
        assert_eq!(code.line_number(0), 10);
        assert_eq!(code.line_number(1), 10);
        assert_eq!(code.line_number(4), 12);

        let starts: Vec<usize> = code.block_starts().unwrap().into_iter().map(|o| o.0).collect();
        assert_eq!(starts, vec![0, 2]);
    }

    #[test]
    fn line_lookup_edge_cases() {
        let code = decode(code_info(&[0xb1], &[], &[(4, 7), (2, 5), (4, 9)])).unwrap();
        assert_eq!(code.line_number(0), 0);
        assert_eq!(code.line_number(1), 0);
        assert_eq!(code.line_number(3), 5);

        // Same start offset: the later row wins
        assert_eq!(code.line_number(4), 9);
        assert_eq!(code.line_number(100), 9);

        let no_lines = decode(code_info(&[0xb1], &[], &[])).unwrap();
        assert_eq!(no_lines.line_number(0), 0);
    }

    #[test]
    fn declared_length_must_be_used_up() {
        let mut info = code_info(&[0xb1], &[], &[]);
        info.push(0);
        assert!(matches!(decode(info), Err(Error::TrailingBytes(1))));

        let mut info = code_info(&[0xb1], &[], &[]);
        info.pop();
        assert!(matches!(decode(info), Err(Error::UnexpectedEof { .. })));
    }

    #[test]
    fn code_length_past_the_attribute() {
        let mut info = vec![0, 1, 0, 1, 0, 0, 0, 9, 0xb1];
        info.extend_from_slice(&[0, 0, 0, 0]);
        assert!(matches!(decode(info), Err(Error::UnexpectedEof { .. })));
    }
}
