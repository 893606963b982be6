use std::{env, path::PathBuf, process::ExitCode};

static BINARY_NAME: &str = "plik";

fn main() -> ExitCode {
    let arguments = match parse_arguments() {
        Ok(arguments) => arguments,
        Err(code) => return code,
    };
    let verdict = plik::driver::run(
        &arguments.grammar_file,
        &arguments.regex_file,
        &arguments.input,
        arguments.verbose,
    );
    match verdict {
        Ok(verdict) => {
            println!();
            println!("Accepted string? {}", verdict.is_accepted());
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

struct Arguments {
    grammar_file: PathBuf,
    regex_file: PathBuf,
    input: String,
    verbose: bool,
}

fn parse_arguments() -> Result<Arguments, ExitCode> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 4 || args.len() > 5 {
        eprintln!("incorrect number of argument(s) given");
        println!();
        println!("{}", usage());
        return Err(ExitCode::FAILURE);
    }
    let verbose = match args.get(4).map(String::as_str) {
        None => false,
        Some("-v") | Some("-V") => true,
        Some(flag) => {
            eprintln!("unknown flag: {flag}");
            println!();
            println!("{}", usage());
            return Err(ExitCode::FAILURE);
        }
    };
    Ok(Arguments {
        grammar_file: PathBuf::from(&args[1]),
        regex_file: PathBuf::from(&args[2]),
        input: args[3].clone(),
        verbose,
    })
}

fn usage() -> String {
    format!(
        r#"{BINARY_NAME}: Decide whether an input is accepted by an LL(1) grammar over a regex-defined alphabet
usage: {BINARY_NAME} <grammar file> <regex file> <input file | "input string"> [-v|-V]"#
    )
}
