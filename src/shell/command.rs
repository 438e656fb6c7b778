use colored::*;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use std::{error::Error, path::Path};

use crate::{
    disk::init::format_disk_with_progress,
    fs::{
        directory::{DirEntryType, Listing},
        error::FileSystemError,
        FileSystem,
    },
};

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Mount(String),
    Create(String, u32),
    Delete(String),
    Read(String, u32),
    Write(String, u32),
    Buffer(Vec<u8>),
    List,
    Resize(String, u32),
    Defragment,
    ChangeDir(String),
    Pwd,
    Format(String),
    Help,
    Exit,
}

pub fn execute_command(
    cmd: &Command,
    fs: &mut FileSystem,
    interactive: bool,
) -> Result<(), Box<dyn Error>> {
    match cmd {
        Command::Mount(disk) => fs.mount(disk)?,
        Command::Create(name, size) => fs.create(name, *size)?,
        Command::Delete(name) => fs.delete(name)?,
        Command::Read(name, block) => fs.read_block(name, *block)?,
        Command::Write(name, block) => fs.write_block(name, *block)?,
        Command::Buffer(bytes) => fs.load_buffer(bytes)?,
        Command::List => {
            for line in format_listing(&fs.list()?) {
                println!("{}", line);
            }
        }
        Command::Resize(name, size) => fs.resize(name, *size)?,
        Command::Defragment => fs.defragment()?,
        Command::ChangeDir(name) => fs.change_dir(name)?,
        Command::Pwd => {
            let path = fs.working_path().ok_or(FileSystemError::NotMounted)?;
            println!("📍 {}", path.cyan());
        }
        Command::Format(disk) => format_image(disk, fs, interactive)?,
        Command::Help => print_help(),
        Command::Exit => {}
    }

    Ok(())
}

/// `L` 的输出：名字左对齐 5 列，数量右对齐 3 列，文件带 KB 单位
pub fn format_listing(listing: &Listing) -> Vec<String> {
    let mut lines = vec![
        format!("{:<5} {:>3}", ".", listing.current),
        format!("{:<5} {:>3}", "..", listing.parent),
    ];
    lines.extend(listing.entries.iter().map(|entry| match entry.entry_type {
        DirEntryType::File { size } => format!("{:<5} {:>3} KB", entry.name, size),
        DirEntryType::Directory { entries } => format!("{:<5} {:>3}", entry.name, entries),
    }));
    lines
}

fn format_image(disk: &str, fs: &FileSystem, interactive: bool) -> Result<(), Box<dyn Error>> {
    if fs.mounted().is_some_and(|m| m.disk_name == disk) {
        return Err(format!("{} is mounted, mount another disk before formatting it", disk).into());
    }

    if Path::new(disk).exists() {
        if !interactive {
            return Err(format!("{} already exists, refusing to overwrite", disk).into());
        }
        let confirmed = Confirm::new()
            .with_prompt(format!("{} already exists. Overwrite it?", disk))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("{}", "Format cancelled.".yellow());
            return Ok(());
        }
    }

    let pb = if interactive {
        println!("💾 Formatting virtual disk {}...", disk.cyan());
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::with_template("[{bar:40.green/black}] {pos:>3}/{len} blocks {msg}")?
                .progress_chars("#>-"),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    format_disk_with_progress(disk, &pb)?;
    pb.finish_with_message("✅ Disk formatted successfully!");
    Ok(())
}

fn print_help() {
    println!("{}", "📘 fs-sim Commands".bright_cyan().bold());
    println!(
        "{}",
        "
  M <disk>           Mount a disk image
  C <name> <size>    Create a file of <size> blocks (0 creates a directory)
  D <name>           Delete a file or directory (recursively)
  R <name> <block>   Read a file block into the buffer
  W <name> <block>   Write the buffer into a file block
  B [text]           Load text into the buffer (no text clears it)
  L                  List the current directory
  E <name> <size>    Resize a file
  O                  Defragment the disk
  Y <name>           Change directory (. and .. supported)
  format <disk>      Create a blank disk image
  pwd                Print current path
  help               Show this help message
  exit               Quit the shell
"
        .bright_black()
    );
}
