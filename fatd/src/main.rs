//! # FAT Host Daemon
//!
//! Main entry point for the FAT host runtime.

use fatd::{FatdConfig, FatdRuntime};
use services_fat::ModuleConfig;
use std::env;
use std::fs;
use std::io::{self, Read};
use std::process;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args().collect();

    let mut config = parse_args(&args).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        print_usage(&args[0]);
        process::exit(1);
    });

    if config.script.is_none() {
        let mut text = String::new();
        if let Err(e) = io::stdin().read_to_string(&mut text) {
            eprintln!("Failed to read script from stdin: {}", e);
            process::exit(1);
        }
        config.script = Some(text);
    }

    let mut runtime = FatdRuntime::new(config).unwrap_or_else(|e| {
        eprintln!("Failed to start FAT module: {}", e);
        process::exit(1);
    });

    match runtime.run() {
        Ok(reports) => {
            for report in reports {
                println!("{}", report);
            }
        }
        Err(e) => {
            eprintln!("Runtime error: {}", e);
            process::exit(1);
        }
    }
}

fn parse_args(args: &[String]) -> Result<FatdConfig, String> {
    let mut config = FatdConfig::default();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --config".to_string());
                }
                config.module = ModuleConfig::load(&args[i])
                    .map_err(|e| format!("Failed to load config file: {}", e))?;
            }
            "--script" | "-s" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --script".to_string());
                }
                let script_text = fs::read_to_string(&args[i])
                    .map_err(|e| format!("Failed to read script file: {}", e))?;
                config.script = Some(script_text);
            }
            "--sd-sectors" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --sd-sectors".to_string());
                }
                config.sd_sectors = args[i]
                    .parse()
                    .map_err(|_| format!("Invalid sd-sectors value: {}", args[i]))?;
            }
            "--usb-sectors" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --usb-sectors".to_string());
                }
                config.usb_sectors = args[i]
                    .parse()
                    .map_err(|_| format!("Invalid usb-sectors value: {}", args[i]))?;
            }
            "--no-usb" => {
                config.usb = false;
            }
            "--help" | "-h" => {
                print_usage(&args[0]);
                process::exit(0);
            }
            other => {
                return Err(format!("Unknown option: {}", other));
            }
        }
        i += 1;
    }

    Ok(config)
}

fn print_usage(program: &str) {
    eprintln!("Usage: {} [OPTIONS]", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -c, --config <FILE>      Module configuration (JSON)");
    eprintln!("  -s, --script <FILE>      Request script (JSON); read from stdin if omitted");
    eprintln!("  --sd-sectors <N>         Sectors on the simulated SD card (default 2048)");
    eprintln!("  --usb-sectors <N>        Sectors on the simulated USB drive (default 2048)");
    eprintln!("  --no-usb                 Start without a USB drive attached");
    eprintln!("  -h, --help               Show this help message");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  {} --script demos/hello_sd.json", program);
    eprintln!("  {} --no-usb --sd-sectors 4096 < requests.json", program);
}
