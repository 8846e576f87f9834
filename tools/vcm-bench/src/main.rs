/// VCM Bench: JART VCM compact model validation CLI.
///
/// Integrates the state equation under a triangular sweep, dumps I-V
/// surfaces, and scores the current equation against reference data.
///
/// Usage:
///   vcm-bench sweep [--radius R] [--length L] [--corners] [--amplitude V] [--half-period T]
///                   [--periods N] [--initial N0] [--state-min N] [--state-max N]
///                   [--rtol TOL] [--threshold N] [--csv FILE] [--constants FILE]
///   vcm-bench iv [--radius R] [--length L] [--vmin V] [--vmax V] [--points N]
///                [--states N1,N2,...] [--csv FILE] [--constants FILE]
///   vcm-bench compare --reference FILE [--radius R --length L] [--constants FILE]
///   vcm-bench constants [--output FILE]
///
/// The built-in current-equation coefficients are stand-ins that reproduce the
/// switching loop qualitatively. Load the published fit with --constants FILE
/// before trusting a comparison against JART reference data.
///
/// Set RUST_LOG=debug (or trace) for model and solver diagnostics.

mod ode;
mod reference;
mod sweep;

use std::error::Error;
use std::path::Path;

use jart_vcm::batch;
use jart_vcm::config;
use jart_vcm::{DeviceState, ModelConstants, Variability};

type CmdResult = Result<(), Box<dyn Error>>;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        return;
    }

    let result = match args[1].as_str() {
        "sweep" => cmd_sweep(&args[2..]),
        "iv" => cmd_iv(&args[2..]),
        "compare" => cmd_compare(&args[2..]),
        "constants" => cmd_constants(&args[2..]),
        _ => {
            eprintln!("Unknown subcommand: {}", args[1]);
            print_usage();
            std::process::exit(2);
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn print_usage() {
    eprintln!("VCM Bench — JART VCM compact model validation");
    eprintln!();
    eprintln!("Subcommands:");
    eprintln!("  sweep       Triangular switching sweep (SET then RESET)");
    eprintln!("  iv          Current over a voltage grid at fixed states");
    eprintln!("  compare     Score the current equation against a reference CSV");
    eprintln!("  constants   Write the default constant table as YAML");
    eprintln!();
    eprintln!("All model subcommands accept --constants FILE to override the table.");
    eprintln!("The built-in current-equation coefficients are placeholders, not the");
    eprintln!("published JART fit: supply the published table with --constants FILE");
    eprintln!("before comparing against reference data. Malformed numeric flags are errors.");
}

/// Numeric flag value, `default` when the flag is absent. A value that does
/// not parse is an error.
fn parse_flag(args: &[String], flag: &str, default: f64) -> Result<f64, String> {
    match parse_flag_str(args, flag, "") {
        "" => Ok(default),
        raw => raw.parse().map_err(|_| format!("{flag}: `{raw}` is not a number")),
    }
}

fn parse_flag_str<'a>(args: &'a [String], flag: &str, default: &'a str) -> &'a str {
    for i in 0..args.len().saturating_sub(1) {
        if args[i] == flag {
            return &args[i + 1];
        }
    }
    default
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn load_constants(args: &[String]) -> Result<ModelConstants, config::ConfigError> {
    match parse_flag_str(args, "--constants", "") {
        "" => Ok(ModelConstants::default()),
        path => config::load(path),
    }
}

fn write_csv(path: &str, lines: &[String]) -> CmdResult {
    std::fs::write(path, lines.join("\n") + "\n")?;
    println!("\nCSV written to {path}");
    Ok(())
}

// ─── Switching sweep ────────────────────────────────────────────────────────

fn cmd_sweep(args: &[String]) -> CmdResult {
    let constants = load_constants(args)?;
    let radius = parse_flag(args, "--radius", 45e-9)?;
    let length = parse_flag(args, "--length", 0.4)?;
    let amplitude = parse_flag(args, "--amplitude", 1.3)?;
    // 1 V/s unless overridden
    let half_period = parse_flag(args, "--half-period", amplitude.abs())?;
    let periods = parse_flag(args, "--periods", 1.0)?;
    let initial = parse_flag(args, "--initial", 0.010)?;
    let state_min = parse_flag(args, "--state-min", 4e-3)?;
    let state_max = parse_flag(args, "--state-max", 22.0)?;
    let rtol = parse_flag(args, "--rtol", 1e-6)?;
    let threshold = parse_flag(args, "--threshold", 1.0)?;
    let csv_path = parse_flag_str(args, "--csv", "");

    let waveform = sweep::demo_waveform(amplitude, half_period)?;
    let duration = periods * waveform.period().unwrap_or(1.0);

    let pairs = if has_flag(args, "--corners") {
        sweep::corners()
    } else {
        vec![(radius, length)]
    };

    let mut csv_lines = Vec::new();

    println!("Switching sweep: -{amplitude} V / +{amplitude} V, {duration} s, rtol {rtol:e}");
    println!(
        "{:>10}  {:>6}  {:>9}  {:>9}  {:>9}  {:>9}  {:>6}  {:>6}",
        "r (nm)", "l (nm)", "SET (V)", "RESET (V)", "N max", "N end", "steps", "rej"
    );
    println!(
        "{:-<10}  {:-<6}  {:-<9}  {:-<9}  {:-<9}  {:-<9}  {:-<6}  {:-<6}",
        "", "", "", "", "", "", "", ""
    );

    for (r, l) in pairs {
        let device = DeviceState::new(initial, state_min, state_max, r, l)?;
        let trace = sweep::run(&constants, device, &waveform, duration, rtol)?;
        let sw = sweep::switching_voltages(&trace, threshold);

        let fmt_v = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{v:.3}"));
        println!(
            "{:>10.1}  {:>6.2}  {:>9}  {:>9}  {:>9.4}  {:>9.4}  {:>6}  {:>6}",
            r * 1e9,
            l,
            fmt_v(sw.set_voltage),
            fmt_v(sw.reset_voltage),
            trace.max_state(),
            trace.final_state(),
            trace.accepted_steps,
            trace.rejected_steps
        );
        csv_lines.extend(trace.csv_lines(csv_lines.is_empty()));
    }

    if !csv_path.is_empty() {
        write_csv(csv_path, &csv_lines)?;
    }
    Ok(())
}

// ─── I-V surface ────────────────────────────────────────────────────────────

fn cmd_iv(args: &[String]) -> CmdResult {
    let constants = load_constants(args)?;
    let radius = parse_flag(args, "--radius", 45e-9)?;
    let length = parse_flag(args, "--length", 0.4)?;
    let vmin = parse_flag(args, "--vmin", -1.3)?;
    let vmax = parse_flag(args, "--vmax", 1.3)?;
    let points = parse_flag(args, "--points", 27.0)? as usize;
    let states_arg = parse_flag_str(args, "--states", "0.01,0.1,1,10,20");
    let csv_path = parse_flag_str(args, "--csv", "");

    let var = Variability::new(radius, length)?;
    let states = states_arg
        .split(',')
        .map(|s| s.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("--states: {e}"))?;

    let voltages: Vec<f64> = (0..points)
        .map(|i| {
            let frac = i as f64 / (points - 1).max(1) as f64;
            vmin + frac * (vmax - vmin)
        })
        .collect();
    let columns: Vec<Vec<f64>> = states
        .iter()
        .map(|&n| batch::currents_at_state(&constants, &voltages, n, &var))
        .collect();

    let mut csv_lines = Vec::new();
    let mut header = vec!["Vm".to_string()];
    header.extend(states.iter().map(|n| format!("Im_N{n}")));
    csv_lines.push(header.join(","));

    println!("I-V surface (r = {:.1} nm, l = {length} nm)", radius * 1e9);
    print!("{:>8}", "V");
    for n in &states {
        print!("  {:>12}", format!("N={n}"));
    }
    println!();

    for (i, v) in voltages.iter().enumerate() {
        print!("{v:>8.3}");
        let mut row = vec![format!("{v}")];
        for col in &columns {
            print!("  {:>12.4e}", col[i]);
            row.push(format!("{:e}", col[i]));
        }
        println!();
        csv_lines.push(row.join(","));
    }

    if !csv_path.is_empty() {
        write_csv(csv_path, &csv_lines)?;
    }
    Ok(())
}

// ─── Reference comparison ───────────────────────────────────────────────────

fn cmd_compare(args: &[String]) -> CmdResult {
    let constants = load_constants(args)?;
    let path = parse_flag_str(args, "--reference", "");
    if path.is_empty() {
        return Err("compare needs --reference FILE".into());
    }
    let rows = reference::load(Path::new(path))?;

    let corners = if has_flag(args, "--radius") || has_flag(args, "--length") {
        vec![(parse_flag(args, "--radius", 45e-9)?, parse_flag(args, "--length", 0.4)?)]
    } else {
        reference::corners_present(&rows)
    };

    println!("Reference comparison: {path} ({} rows)", rows.len());
    println!(
        "{:>10}  {:>6}  {:>6}  {:>7}  {:>12}  {:>12}",
        "r (nm)", "l (nm)", "rows", "skipped", "max rel err", "median"
    );
    println!("{:-<10}  {:-<6}  {:-<6}  {:-<7}  {:-<12}  {:-<12}", "", "", "", "", "", "");

    for (rd, ld) in corners {
        let selected = reference::select(&rows, rd, ld);
        if selected.is_empty() {
            println!("{:>10.1}  {:>6.2}  no matching rows", rd * 1e9, ld);
            continue;
        }
        let cmp = reference::compare(&constants, &selected)?;
        println!(
            "{:>10.1}  {:>6.2}  {:>6}  {:>7}  {:>12.4e}  {:>12.4e}",
            rd * 1e9,
            ld,
            cmp.rows,
            cmp.skipped,
            cmp.max_rel_error,
            cmp.median_rel_error
        );
        if let Some(w) = cmp.worst {
            log::info!("worst row: t={} Vm={} Nd={} Im={:e}", w.time, w.vm, w.nd, w.im);
        }
    }
    Ok(())
}

// ─── Constant table ─────────────────────────────────────────────────────────

fn cmd_constants(args: &[String]) -> CmdResult {
    let text = format!(
        "# Placeholder current-equation coefficients; replace `negative` and `positive`\n\
         # with the published JART fit before comparing against reference data.\n{}",
        config::to_yaml_string(&ModelConstants::default())?
    );
    match parse_flag_str(args, "--output", "") {
        "" => print!("{text}"),
        path => {
            std::fs::write(path, &text)?;
            println!("Constant table written to {path}");
        }
    }
    Ok(())
}
