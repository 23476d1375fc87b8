mod commands;
mod formatters;

use std::env;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return Ok(());
    }

    let cmd = args[1].as_str();

    // Dispatch to command handlers
    let ok = match cmd {
        "validate" => commands::handle_validate(&args)?,
        "show" => commands::handle_show(&args)?,
        "env" => commands::handle_env(&args)?,
        "help" | "--help" | "-h" => {
            print_usage();
            true
        }
        _ => {
            eprintln!("unknown command: {}", cmd);
            print_usage();
            false
        }
    };

    if !ok {
        std::process::exit(1);
    }

    Ok(())
}

fn print_usage() {
    eprintln!("Process Supervisor CLI");
    eprintln!();
    eprintln!("Usage: procsup <command> [args...]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  validate <file>        Check a declaration (exit 1 if invalid)");
    eprintln!("  show <file> [--json]   Show the resolved process specs");
    eprintln!("  env <file>             Print a parsed environment file");
    eprintln!();
    eprintln!("The daemon (procsupd) reads its declaration from PROCSUP_CONFIG_FILE.");
}
