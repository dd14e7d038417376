use ildc_ir::instruction::{Instruction, Operand, SourceLocation};
use ildc_isa::{Opcode, OperandKind};
use thiserror::Error;

/// Instructions of one method read from a textual listing.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodListing {
    pub name: String,
    pub instructions: Vec<Instruction>,
}

/// Errors in a textual listing. Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListingError {
    #[error("line {line}: unknown mnemonic `{mnemonic}`")]
    UnknownMnemonic { line: usize, mnemonic: String },

    #[error("line {line}: `{mnemonic}` expects an operand")]
    MissingOperand { line: usize, mnemonic: String },

    #[error("line {line}: `{mnemonic}` takes no operand, found `{operand}`")]
    UnexpectedOperand {
        line: usize,
        mnemonic: String,
        operand: String,
    },

    #[error("line {line}: invalid operand `{operand}` for `{mnemonic}`")]
    InvalidOperand {
        line: usize,
        mnemonic: String,
        operand: String,
    },

    #[error("line {line}: invalid offset label `{text}`")]
    InvalidOffset { line: usize, text: String },

    #[error("line {line}: offset IL_{offset:04x} does not follow IL_{previous:04x}")]
    NonIncreasingOffset { line: usize, offset: u32, previous: u32 },

    #[error("line {line}: no offset follows IL_{previous:04x}")]
    OffsetOverflow { line: usize, previous: u32 },

    #[error("line {line}: `.method` needs a name")]
    MissingMethodName { line: usize },
}

/// Decode a textual instruction listing into per-method instruction lists.
///
/// One instruction per line: `[IL_xxxx:] mnemonic [operand] [// comment]`.
/// A line without an offset label gets the previous offset plus one.
/// `.method <name>` starts a new method; instructions before the first
/// `.method` line belong to a method named `main`.
pub fn decode_listing(text: &str) -> Result<Vec<MethodListing>, ListingError> {
    let mut methods: Vec<MethodListing> = Vec::new();
    let mut previous: Option<u32> = None;

    for (number, raw) in text.lines().enumerate() {
        let line = number + 1;
        let content = strip_comment(raw).trim();
        if content.is_empty() {
            continue;
        }

        if let Some(rest) = directive(content, ".method") {
            let name = rest.trim();
            if name.is_empty() {
                return Err(ListingError::MissingMethodName { line });
            }
            methods.push(MethodListing {
                name: name.to_string(),
                instructions: Vec::new(),
            });
            previous = None;
            continue;
        }

        let (label, rest) = split_label(content);
        let offset = match label {
            Some(label) => parse_offset(label).ok_or_else(|| ListingError::InvalidOffset {
                line,
                text: label.to_string(),
            })?,
            None => match previous {
                None => 0,
                Some(previous) => previous
                    .checked_add(1)
                    .ok_or(ListingError::OffsetOverflow { line, previous })?,
            },
        };
        match previous {
            Some(previous) if offset <= previous => {
                return Err(ListingError::NonIncreasingOffset {
                    line,
                    offset,
                    previous,
                });
            }
            _ => {}
        }

        let (mnemonic, operand_text) = match rest.split_once(char::is_whitespace) {
            Some((mnemonic, operand)) => (mnemonic, operand.trim()),
            None => (rest, ""),
        };
        let opcode = Opcode::from_mnemonic(mnemonic).ok_or_else(|| ListingError::UnknownMnemonic {
            line,
            mnemonic: mnemonic.to_string(),
        })?;
        let operand = decode_operand(line, opcode, operand_text)?;

        if methods.is_empty() {
            methods.push(MethodListing {
                name: "main".to_string(),
                instructions: Vec::new(),
            });
        }
        if let Some(method) = methods.last_mut() {
            method.instructions.push(Instruction::new(offset, opcode, operand));
        }
        previous = Some(offset);
    }

    for method in &mut methods {
        assign_locations(&mut method.instructions);
    }
    log::debug!("decoded {} method(s) from listing", methods.len());
    Ok(methods)
}

/// Each instruction covers the bytes up to the next instruction's offset.
fn assign_locations(instructions: &mut [Instruction]) {
    let ends: Vec<u32> = instructions
        .iter()
        .skip(1)
        .map(|insn| insn.offset)
        .collect();
    for (insn, end) in instructions.iter_mut().zip(ends) {
        insn.location = SourceLocation::new(insn.offset, end);
    }
}

fn directive<'a>(content: &'a str, name: &str) -> Option<&'a str> {
    let rest = content.strip_prefix(name)?;
    (rest.is_empty() || rest.starts_with(char::is_whitespace)).then_some(rest)
}

/// Drop a trailing `//` comment that is not inside a string literal.
fn strip_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    let mut in_string = false;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if in_string => i += 1,
            b'"' => in_string = !in_string,
            b'/' if !in_string && bytes.get(i + 1) == Some(&b'/') => return &line[..i],
            _ => {}
        }
        i += 1;
    }
    line
}

fn split_label(content: &str) -> (Option<&str>, &str) {
    match content.split_once(':') {
        Some((label, rest)) if !label.contains(char::is_whitespace) && !label.starts_with('"') => {
            (Some(label), rest.trim_start())
        }
        _ => (None, content),
    }
}

fn parse_offset(text: &str) -> Option<u32> {
    let hex = text.strip_prefix("IL_").or_else(|| text.strip_prefix("il_"))?;
    u32::from_str_radix(hex, 16).ok()
}

fn parse_integer(text: &str) -> Option<i64> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let magnitude = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        Some(hex) => i64::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<i64>().ok()?,
    };
    Some(if negative { -magnitude } else { magnitude })
}

fn parse_string(text: &str) -> Option<String> {
    let inner = text.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '"' {
            return None;
        }
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            '"' => out.push('"'),
            '\\' => out.push('\\'),
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '0' => out.push('\0'),
            _ => return None,
        }
    }
    Some(out)
}

fn decode_operand(line: usize, opcode: Opcode, text: &str) -> Result<Option<Operand>, ListingError> {
    let kind = opcode.operand_kind();
    if kind == OperandKind::None {
        if text.is_empty() {
            return Ok(None);
        }
        return Err(ListingError::UnexpectedOperand {
            line,
            mnemonic: opcode.mnemonic().to_string(),
            operand: text.to_string(),
        });
    }
    if text.is_empty() {
        return Err(ListingError::MissingOperand {
            line,
            mnemonic: opcode.mnemonic().to_string(),
        });
    }

    let operand = match kind {
        OperandKind::Int32 => parse_integer(text)
            .and_then(|v| i32::try_from(v).ok())
            .map(Operand::Int32),
        OperandKind::Int64 => parse_integer(text).map(Operand::Int64),
        OperandKind::Float => text.parse::<f64>().ok().map(Operand::Float),
        OperandKind::String => parse_string(text).map(Operand::String),
        OperandKind::Target => parse_offset(text)
            .or_else(|| parse_integer(text).and_then(|v| u32::try_from(v).ok()))
            .map(Operand::Target),
        OperandKind::Variable => parse_integer(text)
            .and_then(|v| u16::try_from(v).ok())
            .map(Operand::Variable),
        OperandKind::None => None,
    };
    operand.map(Some).ok_or_else(|| ListingError::InvalidOperand {
        line,
        mnemonic: opcode.mnemonic().to_string(),
        operand: text.to_string(),
    })
}
