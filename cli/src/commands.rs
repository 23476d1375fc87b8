//! Command handlers
//!
//! Every handler returns `Ok(false)` when the command ran but found a problem,
//! so `main` can exit non-zero without printing a second error.

use crate::formatters::{
    format_error, format_memory, format_ok, format_restart, format_target, format_timestamp,
};
use procsup_engine::domain::{EnvironmentFileParsingService, LogTimestampFormat, ProcessSpec};
use procsup_engine::infrastructure::load_process_specs;
use std::error::Error;
use std::io::{self, Write};
use tabwriter::TabWriter;

fn file_argument<'a>(args: &'a [String], command: &str) -> Result<&'a str, String> {
    args.get(2)
        .map(String::as_str)
        .ok_or_else(|| format!("{} requires a file argument", command))
}

pub fn handle_validate(args: &[String]) -> Result<bool, Box<dyn Error>> {
    let path = file_argument(args, "validate")?;

    match load_process_specs(path) {
        Ok(specs) => {
            let instances: u32 = specs.iter().map(|s| s.instance_count()).sum();
            println!(
                "{}",
                format_ok(&format!(
                    "{}: {} app(s), {} instance(s)",
                    path,
                    specs.len(),
                    instances
                ))
            );
            for spec in specs.iter().filter(|s| s.watch()) {
                println!("  warning: '{}' sets watch, which is ignored", spec.name());
            }
            Ok(true)
        }
        Err(e) => {
            eprintln!("{}", format_error(&format!("{}: {}", path, e)));
            Ok(false)
        }
    }
}

pub fn handle_show(args: &[String]) -> Result<bool, Box<dyn Error>> {
    let path = file_argument(args, "show")?;
    let json = args.iter().skip(3).any(|a| a == "--json");

    let specs = match load_process_specs(path) {
        Ok(specs) => specs,
        Err(e) => {
            eprintln!("{}", format_error(&format!("{}: {}", path, e)));
            return Ok(false);
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&specs)?);
        return Ok(true);
    }

    let modified = std::fs::metadata(path).and_then(|m| m.modified()).ok();
    println!("Declaration: {} (modified {})", path, format_timestamp(modified));
    println!();

    let stdout = io::stdout();
    write_specs_table(&specs, &mut stdout.lock())?;

    for spec in &specs {
        println!();
        write_spec_details(spec, &mut stdout.lock())?;
    }

    Ok(true)
}

pub fn handle_env(args: &[String]) -> Result<bool, Box<dyn Error>> {
    let path = file_argument(args, "env")?;

    let environment = match EnvironmentFileParsingService::load(path) {
        Ok(environment) => environment,
        Err(e) => {
            eprintln!("{}", format_error(&format!("{}: {}", path, e)));
            return Ok(false);
        }
    };

    if environment.is_empty() {
        println!("No variables");
        return Ok(true);
    }

    for (key, value) in environment.sorted() {
        println!("{}={}", key, value);
    }
    Ok(true)
}

/// One row per spec, aligned with a TabWriter
fn write_specs_table(specs: &[ProcessSpec], out: &mut impl Write) -> io::Result<()> {
    let mut tw = TabWriter::new(Vec::new());
    writeln!(tw, "NAME\tINSTANCES\tCOMMAND\tMEMORY\tSTDOUT\tSTDERR")?;
    for spec in specs {
        let command = std::iter::once(spec.executable())
            .chain(spec.args().iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(
            tw,
            "{}\t{}\t{}\t{}\t{}\t{}",
            spec.name(),
            spec.instance_count(),
            command,
            format_memory(spec.memory_ceiling()),
            format_target(spec.stdout()),
            format_target(spec.stderr()),
        )?;
    }
    tw.flush()?;

    let table = tw
        .into_inner()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
    out.write_all(&table)
}

fn write_spec_details(spec: &ProcessSpec, out: &mut impl Write) -> io::Result<()> {
    let timestamps = LogTimestampFormat::parse(spec.log_date_format());

    writeln!(out, "{}", spec.name())?;
    writeln!(out, "  cwd:          {}", spec.working_directory().display())?;
    writeln!(out, "  restart:      {}", format_restart(spec.restart_policy()))?;
    writeln!(out, "  kill timeout: {}ms", spec.kill_timeout().as_millis())?;
    writeln!(
        out,
        "  log dates:    {} -> {} (e.g. {}){}",
        timestamps.pattern(),
        timestamps.strftime(),
        timestamps.now(),
        if spec.log_timestamps() { ", prefixed" } else { "" }
    )?;
    writeln!(out, "  env:          {} variable(s)", spec.environment().len())?;
    for (key, _) in spec.environment().sorted() {
        writeln!(out, "    {}", key)?;
    }
    Ok(())
}
