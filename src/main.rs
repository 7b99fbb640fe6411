use vela::{compile, CompileRequest, ConsoleReporter};
use std::env;
use std::path::{Path, PathBuf};
use std::process;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let request = match parse_args(&args) {
        Some(request) => request,
        None => {
            eprintln!("usage: vela check <path>");
            eprintln!("       vela build <path> [output]");
            process::exit(2);
        }
    };

    let result = compile(&request);
    ConsoleReporter::print_all(&result.diagnostics);
    if !result.success {
        process::exit(1);
    }
}

fn parse_args(args: &[String]) -> Option<CompileRequest> {
    match args.get(1).map(String::as_str) {
        Some("check") => {
            let input = args.get(2)?;
            if args.len() > 3 {
                return None;
            }
            Some(CompileRequest::for_check(Path::new(input)))
        }
        Some("build") => {
            let input = args.get(2)?;
            if args.len() > 4 {
                return None;
            }
            let output = args.get(3).map(PathBuf::from);
            Some(CompileRequest::for_build(Path::new(input), output))
        }
        _ => None,
    }
}
