use std::ops::RangeInclusive;

use crate::{disk::BLOCK_SIZE, fs::config::NAME_LEN, shell::command::Command};

const SIZE_RANGE: RangeInclusive<u32> = 0..=127;
const BLOCK_RANGE: RangeInclusive<u32> = 0..=126;

/// 解析一行命令并做参数校验，格式不对时返回 None
pub fn parse_command(input: &str) -> Option<Command> {
    let line = input.trim_end_matches(['\n', '\r']);
    let tokens: Vec<&str> = line.split_ascii_whitespace().collect();
    let (&cmd, args) = tokens.split_first()?;

    match (cmd, args) {
        ("M", [disk]) => Some(Command::Mount(disk.to_string())),
        ("C", [name, size]) => Some(Command::Create(
            parse_name(name)?,
            parse_number(size, SIZE_RANGE)?,
        )),
        ("D", [name]) => Some(Command::Delete(parse_name(name)?)),
        ("R", [name, block]) => Some(Command::Read(
            parse_name(name)?,
            parse_number(block, BLOCK_RANGE)?,
        )),
        ("W", [name, block]) => Some(Command::Write(
            parse_name(name)?,
            parse_number(block, BLOCK_RANGE)?,
        )),
        ("B", _) => parse_buffer(line.as_bytes()),
        ("L", []) => Some(Command::List),
        ("E", [name, size]) => Some(Command::Resize(
            parse_name(name)?,
            parse_number(size, SIZE_RANGE)?,
        )),
        ("O", []) => Some(Command::Defragment),
        ("Y", [name]) => Some(Command::ChangeDir(parse_name(name)?)),
        ("format", [disk]) => Some(Command::Format(disk.to_string())),
        ("pwd", []) => Some(Command::Pwd),
        ("help", []) => Some(Command::Help),
        ("exit" | "quit", []) => Some(Command::Exit),
        _ => None,
    }
}

/// 解析脚本中的一行原始字节。B 命令的内容按字节原样保留，
/// 其他命令必须是合法的 UTF-8。
pub fn parse_line(raw: &[u8]) -> Option<Command> {
    let end = raw
        .iter()
        .rposition(|b| !matches!(b, b'\n' | b'\r'))
        .map_or(0, |i| i + 1);
    let line = &raw[..end];

    match std::str::from_utf8(line) {
        Ok(text) => parse_command(text),
        Err(_) => parse_buffer(line),
    }
}

fn parse_name(name: &str) -> Option<String> {
    (!name.is_empty() && name.len() <= NAME_LEN).then(|| name.to_string())
}

fn parse_number(text: &str, range: RangeInclusive<u32>) -> Option<u32> {
    text.parse::<u32>().ok().filter(|n| range.contains(n))
}

// B 后面的内容原样保留（包括中间的空格），单独一个 B 表示清空缓冲区
fn parse_buffer(line: &[u8]) -> Option<Command> {
    let start = line
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(line.len());
    match &line[start..] {
        [b'B'] => Some(Command::Buffer(Vec::new())),
        [b'B', b' ', content @ ..] => {
            (content.len() <= BLOCK_SIZE).then(|| Command::Buffer(content.to_vec()))
        }
        _ => None,
    }
}
