//! netkv CLI Client
//!
//! Interactive REPL against a running cache server. Values are sent as raw
//! strings; point a serializer-aware client at the server for typed values.

use std::io::{self, BufRead, Write};
use std::time::Duration;

use clap::Parser;

use netkv::Client;

/// netkv CLI
#[derive(Parser, Debug)]
#[command(name = "netkv-cli")]
#[command(about = "Interactive client for the netkv cache server")]
#[command(version)]
struct Args {
    /// Server address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:2392")]
    server: String,

    /// Operation timeout in milliseconds
    #[arg(short, long, default_value = "5000")]
    timeout: u64,

    /// Number of pooled connections
    #[arg(short, long, default_value = "10")]
    connections: usize,
}

fn main() {
    let args = Args::parse();

    let client = match Client::connect(
        &args.server,
        Duration::from_millis(args.timeout),
        args.connections,
    ) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Failed to connect to {}: {}", args.server, e);
            std::process::exit(1);
        }
    };

    print_help();
    println!();

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("netkv> ");
        let _ = io::stdout().flush();

        line.clear();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => return, // EOF
            Ok(_) => {}
            Err(e) => {
                eprintln!("{}", e);
                continue;
            }
        }

        let mut parts = line.split_whitespace();
        let Some(command) = parts.next() else {
            continue;
        };

        match command.to_lowercase().as_str() {
            "quit" | "exit" | "q" | "leave" => return,
            "get" => {
                let Some(key) = parts.next() else {
                    eprintln!("usage: get KEY");
                    continue;
                };
                match client.get_raw(key) {
                    Ok((value, ttl)) => {
                        println!("{} (ttl {:?})", String::from_utf8_lossy(&value), ttl)
                    }
                    Err(e) => eprintln!("{}", e),
                }
            }
            "set" => {
                let (Some(key), Some(value), Some(ttl)) =
                    (parts.next(), parts.next(), parts.next())
                else {
                    eprintln!("usage: set KEY VALUE TTL_SECONDS");
                    continue;
                };
                let ttl: u64 = match ttl.parse() {
                    Ok(ttl) => ttl,
                    Err(e) => {
                        eprintln!("invalid ttl: {}", e);
                        continue;
                    }
                };
                match client.set_raw(key, value.as_bytes().to_vec(), Duration::from_secs(ttl)) {
                    Ok(()) => println!("OK"),
                    Err(e) => eprintln!("{}", e),
                }
            }
            "delete" => {
                let Some(key) = parts.next() else {
                    eprintln!("usage: delete KEY");
                    continue;
                };
                match client.delete(key) {
                    Ok(()) => println!("OK"),
                    Err(e) => eprintln!("{}", e),
                }
            }
            "clear" => match client.clear() {
                Ok(()) => println!("OK"),
                Err(e) => eprintln!("{}", e),
            },
            "keys" => match client.keys() {
                Ok(keys) => {
                    for key in keys {
                        println!("{}", key);
                    }
                }
                Err(e) => eprintln!("{}", e),
            },
            "help" => print_help(),
            _ => eprintln!("Unknown command. Type \"help\" for a list of commands."),
        }
    }
}

fn print_help() {
    println!("netkv - Available Commands");
    println!("\tget    args: [KEY]");
    println!("\tset    args: [KEY, VALUE, TTL_SECONDS]");
    println!("\tdelete args: [KEY]");
    println!("\tclear");
    println!("\tkeys");
    println!("\thelp");
    println!("\tquit");
}
