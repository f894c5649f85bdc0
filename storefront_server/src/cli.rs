use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // We don't expect any CLI args, so always print the help
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Secrets (SFG_STRIPE_SECRET_KEY, SFG_STRIPE_WEBHOOK_SECRET) are deliberately left off this list
    const DISPLAY_ENVS: [&str; 10] = [
        "RUST_LOG",
        "SFG_HOST",
        "SFG_PORT",
        "SFG_DATABASE_URL",
        "SFG_DB_MAX_CONNECTIONS",
        "SFG_GATEWAY_TIMEOUT_MS",
        "SFG_LEDGER_TIMEOUT_MS",
        "SFG_RECONCILIATION_MONITOR_SECS",
        "SFG_STRIPE_API_BASE",
        "SFG_STRIPE_SIGNATURE_TOLERANCE_SECS",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<40} {val:<15}");
    })
}
