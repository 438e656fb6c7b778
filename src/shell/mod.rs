pub mod command;
pub mod parse;

use crate::{
    fs::FileSystem,
    shell::{
        command::{execute_command, Command},
        parse::{parse_command, parse_line},
    },
};
use colored::*;
use crossterm::{
    cursor, execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use log::debug;
use reedline::{
    DefaultCompleter, DefaultPrompt, DefaultPromptSegment, FileBackedHistory, Reedline, Signal,
};
use std::{
    fs::File,
    io::{self, stdout, BufRead, BufReader},
    path::{Path, PathBuf},
};

const HISTORY_FILE: &str = ".fs_sim_history";
const HISTORY_CAPACITY: usize = 100;

const COMMANDS: [&str; 14] = [
    "M", "C", "D", "R", "W", "B", "L", "E", "O", "Y", "format", "pwd", "help", "exit",
];

/// 按行执行命令文件。命令格式错误报告 `Command Error: <文件>, <行号>`，
/// 执行失败报告 `Error: <原因>`，然后继续处理下一行。
pub fn run_script(path: &Path) -> io::Result<()> {
    colored::control::set_override(false);

    let source = path.display().to_string();
    let reader = BufReader::new(File::open(path)?);
    let mut fs = FileSystem::new();

    for (index, line) in reader.split(b'\n').enumerate() {
        let line = line?;
        let line_num = index + 1;
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        match parse_line(&line) {
            Some(Command::Exit) => break,
            Some(cmd) => {
                debug!("{}:{} {:?}", source, line_num, cmd);
                if let Err(e) = execute_command(&cmd, &mut fs, false) {
                    eprintln!("Error: {}", e);
                }
            }
            None => eprintln!("Command Error: {}, {}", source, line_num),
        }
    }

    Ok(())
}

pub fn start_shell() {
    boot_banner();

    let username = whoami::username();
    let hostname = whoami::fallible::hostname().unwrap_or_else(|_| "localhost".to_string());
    let mut fs = FileSystem::new();

    println!(
        "{}",
        "Type 'help' for available commands. Use ↑↓ for history, Tab for auto-completion.\n"
            .bright_black()
    );

    // 初始化 reedline
    let history_path = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(HISTORY_FILE);

    let mut line_editor = Reedline::create();
    match FileBackedHistory::with_file(HISTORY_CAPACITY, history_path) {
        Ok(history) => line_editor = line_editor.with_history(Box::new(history)),
        Err(e) => println!("{} {}", "⚠️  History disabled:".yellow(), e),
    }

    // 命令补全
    let commands: Vec<String> = COMMANDS.iter().map(|c| c.to_string()).collect();
    let completer = DefaultCompleter::new_with_wordlen(commands, 1);
    line_editor = line_editor.with_completer(Box::new(completer));

    let mut line_num = 0;
    loop {
        let location = match (fs.mounted(), fs.working_path()) {
            (Some(mounted), Some(path)) => format!("{}:{}", mounted.disk_name, path),
            _ => "(no disk)".to_string(),
        };
        let full_prompt = format!(
            "{}:{}",
            format!("{}@{}", username, hostname).green(),
            location.blue()
        );

        let prompt = DefaultPrompt::new(
            DefaultPromptSegment::Basic(full_prompt),
            DefaultPromptSegment::Basic("fs-sim".bright_blue().bold().to_string()),
        );

        let input = line_editor.read_line(&prompt);

        match input {
            Ok(Signal::Success(buffer)) => {
                line_num += 1;
                if buffer.trim().is_empty() {
                    continue;
                }

                match parse_command(&buffer) {
                    Some(Command::Exit) => {
                        println!("{}", "👋 Bye!".bright_yellow());
                        break;
                    }
                    Some(cmd) => {
                        if let Err(e) = execute_command(&cmd, &mut fs, true) {
                            println!("{} {}", "❌ Error:".red().bold(), e);
                        }
                    }
                    None => println!(
                        "{} {}",
                        format!("⚠️  Command Error: <stdin>, {}.", line_num).yellow(),
                        "Type 'help' for command list.".bright_black()
                    ),
                }
            }
            Ok(Signal::CtrlC) => {
                println!();
                continue;
            }
            Ok(Signal::CtrlD) => {
                println!("{}", "Exiting fs-sim...".yellow());
                break;
            }
            Err(e) => {
                println!("Error reading line: {}", e);
                break;
            }
        }
    }

    fs.unmount();
    println!("{}", "GoodBye!".bright_yellow());
}

fn boot_banner() {
    let mut stdout = stdout();

    // 清屏失败（比如不是终端）时直接输出欢迎语
    let _ = execute!(stdout, Clear(ClearType::All), cursor::MoveTo(0, 0));
    let _ = execute!(
        stdout,
        SetForegroundColor(Color::Cyan),
        Print(format!(
            "Welcome to fs-sim v{} (128 x 1KB blocks, 126 inodes)\n",
            env!("CARGO_PKG_VERSION")
        )),
        ResetColor
    );
}
