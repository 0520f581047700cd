//! CLI entry point for fswalk

use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use regex::Regex;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use tracing_subscriber::EnvFilter;

use fswalk::{
    DirDiff, FsError, OnPermissionDenied, Walk, WalkConfig, WalkEntry, WalkEntryExtra,
    WalkEntryKind, WalkWithInfo, compare_directories, get_hash, get_size, path_util,
};

/// Color output mode
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum ColorMode {
    /// Auto-detect based on terminal and environment
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

/// Determine whether to use color output based on mode and environment.
fn should_use_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => {
            // Respect NO_COLOR environment variable (https://no-color.org/)
            if std::env::var_os("NO_COLOR").is_some() {
                return false;
            }
            if std::env::var_os("FORCE_COLOR").is_some() {
                return true;
            }
            if std::env::var("TERM").map(|t| t == "dumb").unwrap_or(false) {
                return false;
            }
            std::io::stdout().is_terminal()
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "fswalk")]
#[command(about = "Symlink-aware directory walking with hashing, sizing, and diffing")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Control color output: auto, always, never
    #[arg(long = "color", value_name = "WHEN", default_value = "auto", global = true)]
    color: ColorMode,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every entry under a directory
    Walk {
        /// Directory to walk (a path or file:// URL)
        #[arg(default_value = ".")]
        path: String,

        /// Descend only N levels deep (0 lists only immediate children)
        #[arg(short = 'L', long = "level")]
        level: Option<usize>,

        /// Only list file entries with one of these extensions
        /// (can be used multiple times)
        #[arg(short = 'e', long = "ext")]
        extensions: Vec<String>,

        /// Only list entries whose relative path matches this regex
        /// (can be used multiple times)
        #[arg(short = 'm', long = "match")]
        matches: Vec<String>,

        /// Skip entries whose relative path matches this regex
        /// (can be used multiple times)
        #[arg(short = 's', long = "skip")]
        skips: Vec<String>,

        /// Recurse into symlinked directories
        #[arg(long = "follow")]
        follow: bool,

        /// Do not list directories
        #[arg(long = "no-dirs")]
        no_dirs: bool,

        /// Do not list files
        #[arg(long = "no-files")]
        no_files: bool,

        /// Do not list symlinks
        #[arg(long = "no-symlinks")]
        no_symlinks: bool,

        /// Keep walking past permission-denied subtrees (reported on stderr)
        #[arg(long = "skip-denied")]
        skip_denied: bool,

        /// Show size and modification time per entry
        #[arg(short = 'l', long = "long")]
        long: bool,

        /// Output in JSON format
        #[arg(long = "json")]
        json: bool,
    },

    /// Print the recursive content hash of a path
    Hash {
        /// Directory, file, or symlink to hash (a path or file:// URL)
        path: String,
    },

    /// Print the total size of a path in bytes
    Size {
        /// Directory or file to measure (a path or file:// URL)
        path: String,

        /// Human-readable size instead of bytes
        #[arg(short = 'H', long = "human")]
        human: bool,
    },

    /// Compare two directory trees
    Diff {
        /// The old tree
        old: String,
        /// The new tree
        new: String,

        /// Output in JSON format
        #[arg(long = "json")]
        json: bool,
    },
}

/// Format a size in bytes to human-readable format.
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1}G", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1}M", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1}K", bytes as f64 / KB as f64)
    } else {
        format!("{}B", bytes)
    }
}

fn kind_color(kind: WalkEntryKind) -> Option<ColorSpec> {
    let mut spec = ColorSpec::new();
    match kind {
        WalkEntryKind::Directory => {
            spec.set_fg(Some(Color::Blue)).set_bold(true);
        }
        WalkEntryKind::SymlinkDirectory | WalkEntryKind::SymlinkFile => {
            spec.set_fg(Some(Color::Cyan));
        }
        WalkEntryKind::File => return None,
    }
    Some(spec)
}

fn print_entry(
    stdout: &mut StandardStream,
    entry: &WalkEntry,
    info: Option<&fswalk::EntryInfo>,
) -> std::io::Result<()> {
    if let Some(info) = info {
        let mtime = info
            .mtime
            .map(|t| {
                chrono::DateTime::<chrono::Local>::from(t)
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string()
            })
            .unwrap_or_else(|| "-".to_string());
        write!(stdout, "{:>12}  {}  ", format_size(info.size), mtime)?;
    }
    if let Some(spec) = kind_color(entry.kind) {
        stdout.set_color(&spec)?;
    }
    write!(stdout, "{}", entry.path_relative.display())?;
    stdout.reset()?;
    if entry.kind == WalkEntryKind::Directory {
        write!(stdout, "/")?;
    }
    writeln!(stdout)
}

#[allow(clippy::too_many_arguments)]
fn build_config(
    level: Option<usize>,
    extensions: Vec<String>,
    matches: &[String],
    skips: &[String],
    follow: bool,
    no_dirs: bool,
    no_files: bool,
    no_symlinks: bool,
    skip_denied: bool,
) -> Result<WalkConfig, regex::Error> {
    let matches = matches
        .iter()
        .map(|pattern| Regex::new(pattern))
        .collect::<Result<Vec<_>, _>>()?;
    let skips = skips
        .iter()
        .map(|pattern| Regex::new(pattern))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(WalkConfig {
        depth: level,
        extensions: if extensions.is_empty() {
            None
        } else {
            Some(extensions)
        },
        include_directories: !no_dirs,
        include_files: !no_files,
        include_symlink_directories: !no_symlinks,
        include_symlink_files: !no_symlinks,
        matches: if matches.is_empty() {
            None
        } else {
            Some(matches)
        },
        skips: if skips.is_empty() { None } else { Some(skips) },
        on_permission_denied: if skip_denied {
            OnPermissionDenied::notify(|entry| {
                eprintln!("fswalk: permission denied: {}", entry.path_absolute.display());
            })
        } else {
            OnPermissionDenied::Fail
        },
        walk_symlink_directories: follow,
    })
}

fn run_walk(
    path: PathBuf,
    config: WalkConfig,
    long: bool,
    json: bool,
    color: ColorMode,
) -> Result<(), FsError> {
    let choice = if should_use_color(color) {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    let mut stdout = StandardStream::stdout(choice);

    if json {
        if long {
            let entries: Vec<WalkEntryExtra> =
                WalkWithInfo::new(&path, &config)?.collect::<Result<_, _>>()?;
            println!("{}", serde_json::to_string_pretty(&entries).expect("valid JSON"));
        } else {
            let entries: Vec<WalkEntry> =
                Walk::new(&path, &config)?.collect::<Result<_, _>>()?;
            println!("{}", serde_json::to_string_pretty(&entries).expect("valid JSON"));
        }
        return Ok(());
    }

    if long {
        for entry in WalkWithInfo::new(&path, &config)? {
            let entry = entry?;
            print_entry(&mut stdout, &entry.entry, Some(&entry.info))
                .map_err(|e| FsError::io(&path, e))?;
        }
    } else {
        for entry in Walk::new(&path, &config)? {
            let entry = entry?;
            print_entry(&mut stdout, &entry, None).map_err(|e| FsError::io(&path, e))?;
        }
    }
    Ok(())
}

fn print_diff(diff: &DirDiff) {
    for path in &diff.created {
        println!("created:  {}", path.display());
    }
    for path in &diff.modified {
        println!("modified: {}", path.display());
    }
    for path in &diff.removed {
        println!("removed:  {}", path.display());
    }
}

fn run(args: Args) -> Result<(), FsError> {
    match args.command {
        Command::Walk {
            path,
            level,
            extensions,
            matches,
            skips,
            follow,
            no_dirs,
            no_files,
            no_symlinks,
            skip_denied,
            long,
            json,
        } => {
            let config = build_config(
                level,
                extensions,
                &matches,
                &skips,
                follow,
                no_dirs,
                no_files,
                no_symlinks,
                skip_denied,
            )
            .unwrap_or_else(|e| {
                eprintln!("fswalk: invalid pattern: {e}");
                process::exit(2);
            });
            run_walk(path_util::to_path_buf(&path), config, long, json, args.color)
        }
        Command::Hash { path } => {
            println!("{}", get_hash(path_util::to_path_buf(&path))?);
            Ok(())
        }
        Command::Size { path, human } => {
            let size = get_size(path_util::to_path_buf(&path))?;
            if human {
                println!("{}", format_size(size));
            } else {
                println!("{size}");
            }
            Ok(())
        }
        Command::Diff { old, new, json } => {
            let diff =
                compare_directories(path_util::to_path_buf(&old), path_util::to_path_buf(&new))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&diff).expect("valid JSON"));
            } else {
                print_diff(&diff);
            }
            if diff.is_empty() { Ok(()) } else { process::exit(1) }
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if let Err(error) = run(args) {
        eprintln!("fswalk: {error}");
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0B");
        assert_eq!(format_size(1023), "1023B");
        assert_eq!(format_size(1024), "1.0K");
        assert_eq!(format_size(1536), "1.5K");
        assert_eq!(format_size(1024 * 1024), "1.0M");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.0G");
    }

    #[test]
    fn test_build_config_toggles() {
        let config = build_config(
            Some(2),
            vec!["txt".into()],
            &["^src/".to_string()],
            &[],
            true,
            true,
            false,
            false,
            false,
        )
        .unwrap();
        assert_eq!(config.depth, Some(2));
        assert!(!config.include_directories);
        assert!(config.include_files);
        assert!(config.walk_symlink_directories);
        assert_eq!(config.extensions.as_deref(), Some(["txt".to_string()].as_slice()));
        assert!(config.matches.is_some());
        assert!(config.skips.is_none());
    }

    #[test]
    fn test_build_config_rejects_bad_regex() {
        let result = build_config(
            None,
            Vec::new(),
            &["(".to_string()],
            &[],
            false,
            false,
            false,
            false,
            false,
        );
        assert!(result.is_err());
    }
}
