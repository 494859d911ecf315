//! sam parser CLI

use std::path::{Path, PathBuf};

use samc::commands::{check_text, edit_text, generate_tables, parse_text, read_file, sam_language};
use samc::{init_tracing, parse_edit, parse_parser_options, CliError};

fn main() {
    init_tracing();
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    let command = &args[1];
    let result = match command.as_str() {
        "parse" => {
            if args.len() < 3 {
                eprintln!("Usage: samc parse <file.sam> [limits]");
                std::process::exit(1);
            }
            parse_command(&args[2..])
        }
        "check" => {
            if args.len() < 3 {
                eprintln!("Usage: samc check <file.sam> [limits]");
                std::process::exit(1);
            }
            check_command(&args[2..])
        }
        "edit" => {
            if args.len() < 4 {
                eprintln!("Usage: samc edit <file.sam> <start>:<end>:<text>... [limits]");
                eprintln!();
                eprintln!("Offsets are bytes in the text left by the previous edit.");
                std::process::exit(1);
            }
            edit_command(&args[2..])
        }
        "generate" => generate_command(&args[2..]),
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        "version" | "--version" | "-v" => {
            println!("samc {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        _ => {
            eprintln!("Unknown command: {command}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(error) = result {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

/// Split off the limits and take the first remaining argument as the file.
fn file_and_rest(args: &[String]) -> Result<(sam_parse::ParserOptions, PathBuf, Vec<String>), CliError> {
    let (options, rest) = parse_parser_options(args)?;
    let Some((path, rest)) = rest.split_first() else {
        return Err(CliError::MissingFile);
    };
    Ok((options, PathBuf::from(path), rest.to_vec()))
}

fn parse_command(args: &[String]) -> Result<(), CliError> {
    let (options, path, _) = file_and_rest(args)?;
    let text = read_file(&path)?;
    println!("{}", parse_text(&sam_language()?, &options, &text));
    Ok(())
}

fn check_command(args: &[String]) -> Result<(), CliError> {
    let (options, path, _) = file_and_rest(args)?;
    let text = read_file(&path)?;
    let name = path.display().to_string();
    let report = check_text(&sam_language()?, &options, &name, &text);
    if report.has_errors() {
        eprint!("{}", report.rendered);
        eprintln!("{name}: {} syntax error(s)", report.error_count);
        std::process::exit(1);
    }
    println!("OK: {name}");
    Ok(())
}

fn edit_command(args: &[String]) -> Result<(), CliError> {
    let (options, path, rest) = file_and_rest(args)?;
    let edits = rest.iter().map(|arg| parse_edit(arg)).collect::<Result<Vec<_>, _>>()?;
    let text = read_file(&path)?;
    let report = edit_text(&sam_language()?, &options, &text, &edits)?;
    let stats = &report.stats;
    println!("{}", report.sexp);
    if stats.fallback {
        println!("reused nothing (old tree did not match, parsed from scratch)");
    } else {
        println!(
            "reused {} nodes, {} of {} bytes ({:.1}%)",
            stats.reused_nodes,
            stats.reused_bytes,
            stats.total_bytes,
            stats.reuse_rate()
        );
    }
    if report.diverged {
        eprintln!("warning: incremental tree differs from a fresh parse");
    }
    Ok(())
}

fn generate_command(args: &[String]) -> Result<(), CliError> {
    let mut output = Path::new("sam.samt").to_path_buf();
    let mut i = 0;
    while i < args.len() {
        if args[i] == "-o" && i + 1 < args.len() {
            output = PathBuf::from(&args[i + 1]);
            i += 2;
        } else if let Some(path) = args[i].strip_prefix("--output=") {
            output = PathBuf::from(path);
            i += 1;
        } else {
            return Err(CliError::UnknownOption(args[i].clone()));
        }
    }

    let report = generate_tables(&output)?;
    for conflict in &report.conflicts {
        println!("conflict: {conflict}");
    }
    println!(
        "wrote {} ({} bytes, {} conflict(s) kept for GLR)",
        output.display(),
        report.bytes,
        report.conflicts.len()
    );
    Ok(())
}

fn print_usage() {
    println!("samc - incremental GLR parser for sam");
    println!();
    println!("Usage: samc <command> [options]");
    println!();
    println!("Commands:");
    println!("  parse <file.sam>                 Print the syntax tree");
    println!("  check <file.sam>                 Report syntax errors");
    println!("  edit <file.sam> <edit>...        Apply edits and re-parse incrementally");
    println!("  generate [-o <path>]             Write the sam parse tables (default: sam.samt)");
    println!("  help                             Show this help message");
    println!("  version                          Show version information");
    println!();
    println!("Edits:");
    println!("  <start>:<end>:<text>             Replace bytes start..end with text (\\n for newline)");
    println!();
    println!("Parser limits (parse, check, edit):");
    println!("  --max-versions=<n>               Stack versions kept per round (default: 6)");
    println!("  --max-pop-depth=<n>              Entries one ERROR node may fold (default: 16)");
    println!("  --max-missing=<n>                MISSING tokens per recovery (default: 3)");
    println!("  --max-reduce-steps=<n>           Reductions before a shift (default: 10000)");
    println!();
    println!("Environment:");
    println!("  RUST_LOG=sam_parse=debug         Enable tracing output");
    println!("  SAMC_LOG_TREE=1                  Indent tracing output by span");
}
