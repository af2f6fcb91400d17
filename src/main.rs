use std::path::PathBuf;

use clap::{CommandFactory, Parser as ClapParser, error::ErrorKind};
use colored::Colorize;
use liltc::{ast::reader, ir::pretty_print};

#[derive(Debug, ClapParser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// AST dump files produced by the Lilt parser
    source_files: Vec<PathBuf>,

    /// Write the rendered IR here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() {
    let args = Args::parse();

    if args.source_files.is_empty() {
        Args::command()
            .error(ErrorKind::MissingRequiredArgument, "Missing source files!")
            .exit();
    }

    for source_file in &args.source_files {
        if !source_file.exists() {
            Args::command()
                .error(
                    ErrorKind::InvalidValue,
                    format!("Source file '{}' does not exist!", source_file.display()),
                )
                .exit()
        }

        if !source_file.is_file() {
            Args::command()
                .error(
                    ErrorKind::InvalidValue,
                    format!("Input path '{}' is not a file!", source_file.display()),
                )
                .exit()
        }
    }

    for source_file in &args.source_files {
        let contents = match std::fs::read_to_string(source_file) {
            Ok(contents) => contents,
            Err(error) => {
                eprintln!(
                    "{}: failed to read '{}': {error}",
                    "error".red(),
                    source_file.display()
                );
                std::process::exit(1);
            }
        };

        let root = match reader::parse(&contents) {
            Ok(root) => root,
            Err(error) => {
                eprintln!("{}: {error}", "error".red());
                std::process::exit(1);
            }
        };

        let output = match liltc::compile(&root) {
            Ok(output) => output,
            Err(error) => {
                eprintln!("{}: {error}", "error".red());

                #[cfg(feature = "error-backtrace")]
                if let liltc::CompileError::Codegen(error) = &error {
                    eprintln!("{}", error.backtrace());
                }

                std::process::exit(1);
            }
        };

        for warning in &output.warnings {
            eprintln!("{}: {warning}", "warning".yellow());
        }

        let rendered = pretty_print::render_module(&output.module);

        match &args.output {
            Some(path) => {
                if let Err(error) =
                    std::fs::write(path, strip_ansi_escapes::strip_str(&rendered))
                {
                    eprintln!(
                        "{}: failed to write '{}': {error}",
                        "error".red(),
                        path.display()
                    );
                    std::process::exit(1);
                }
            }
            None => print!("{rendered}"),
        }
    }
}
