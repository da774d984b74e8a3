use std::env::args;
use std::fs::File;
use std::io::prelude::*;
use std::io::stdout;
use std::io::BufReader;

use anyhow::{Context, Result};

use corral::foreign::{extern_fn, native};
use corral::{parse, run_interpreter, Environment, Interpreter, Value};

fn main() -> Result<()> {
    let args = args();
    if args.len() > 2 {
        let mut stderr = std::io::stderr().lock();
        stderr
            .write_all("Usage: corral [script]".as_bytes())
            .unwrap();
        std::process::exit(64);
    } else if args.len() == 2 {
        // Size is validated
        let script_path = args.skip(1).next().unwrap();
        let mut file = File::open(script_path).context("Unable to open script file")?;
        let mut script = String::new();
        file.read_to_string(&mut script)
            .context("Unable to read script file")?;
        let result = run_interpreter(&script, Some(&stock_environment()));
        for err in &result.errors {
            eprintln!("{}", err);
        }
        if !result.errors.is_empty() {
            std::process::exit(65);
        }
    } else {
        run_prompt()?;
    }
    Ok(())
}

/// A root environment with a couple of linked externs so scripts and the
/// prompt have something to call.
fn stock_environment() -> Environment {
    let mut environment = Environment::new();

    let clock = extern_fn("clock", &[], "float")
        .with_implementation(native(|_args| {
            let duration = std::time::SystemTime::UNIX_EPOCH.elapsed()?;
            Ok(Value::Float(duration.as_secs_f64()))
        }))
        .expect("fresh declaration");
    environment.set_symbol("clock", Value::Extern(clock));

    let len = extern_fn("len", &[("xs", "list")], "int")
        .with_implementation(native(|args| match &args[0] {
            Value::List(elements) => Ok(Value::Int(elements.len() as i64)),
            Value::Str(s) => Ok(Value::Int(s.len() as i64)),
            value => anyhow::bail!("len expects a list or string, got {}", value.type_name()),
        }))
        .expect("fresh declaration");
    environment.set_symbol("len", Value::Extern(len));

    environment
}

fn run_prompt() -> Result<()> {
    let stdin = std::io::stdin().lock();
    let mut reader = BufReader::new(stdin);
    let mut line = String::new();
    let mut environment = stock_environment();
    loop {
        {
            let mut stdout = stdout().lock();
            stdout.write_all("> ".as_bytes()).unwrap();
            stdout.flush()?;
        }
        let n = reader.read_line(&mut line)?;
        if n == 0 {
            break;
        }
        if !line.trim().is_empty() {
            environment = run_line(environment, &line);
        }
        // Don't keep appending code until the next time
        line.clear();
    }
    Ok(())
}

// Bindings survive across prompt lines, including the mutations of a line
// that failed partway through.
fn run_line(environment: Environment, code: &str) -> Environment {
    match parse(code) {
        Ok(program) => {
            let mut interpreter = Interpreter::new(environment);
            match interpreter.interpret(&program) {
                Ok(Value::Null) => {}
                Ok(value) => println!("{}", value),
                Err(err) => eprintln!("{}", err),
            }
            interpreter.environment
        }
        Err(err) => {
            eprintln!("{}", err);
            environment
        }
    }
}
