//! Query per-CPU time counters of the running Linux host.
//!
//! Usage: cargo run -p cpustat-cli -- get --cpu 0

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use cpustat::binding::{CpuStatLib, TableBuilder};
use cpustat::procfs::{self, ProcStat, PROC_STAT_PATH};
use cpustat::registry::{self, Capabilities};

mod logger;

#[derive(Parser)]
#[command(name = "cpustat", version, about = "Per-CPU time accounting counters")]
struct Cli {
    /// File in /proc/stat format to sample.
    #[arg(long, env = "CPUSTAT_PROC_PATH", default_value = PROC_STAT_PATH)]
    proc_path: PathBuf,

    /// Leave out FORCEIDLE even when it is compiled in.
    #[arg(long)]
    no_force_idle: bool,

    /// Log more (repeat for debug and trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Print counters of one CPU, or of all CPUs summed.
    Get {
        /// CPU index; omit or pass -1 for all CPUs.
        #[arg(long, allow_negative_numbers = true)]
        cpu: Option<i64>,
    },
    /// Print the number of CPUs.
    Count,
    /// Print counter names and their slot numbers.
    Fields,
    /// Print the sample back in /proc/stat format.
    ProcStat,
}

/// Table that keeps insertion order, for printing.
struct Lines(Vec<(String, i64)>);

impl TableBuilder for Lines {
    fn with_capacity(records: usize) -> Self {
        Lines(Vec::with_capacity(records))
    }

    fn set_integer(&mut self, key: &str, value: i64) {
        self.0.push((key.to_string(), value));
    }
}

impl Lines {
    fn write_to(&self, out: &mut dyn Write) -> io::Result<()> {
        for (key, value) in &self.0 {
            writeln!(out, "{} {}", key, value)?;
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init(logger::level(cli.verbose));
    run(cli, &mut io::stdout().lock())
}

/// Sample the configured file and run one subcommand, writing its output
/// to `out`.
fn run(cli: Cli, out: &mut dyn Write) -> Result<()> {
    let caps = if cli.no_force_idle {
        Capabilities::base()
    } else {
        Capabilities::compiled()
    };
    let registry = registry::init(caps);

    let sample = ProcStat::read_from(&cli.proc_path, registry)
        .with_context(|| format!("sampling {}", cli.proc_path.display()))?;
    let lib = CpuStatLib::new(registry, &sample);
    log::debug!("sampled {} CPUs from {}", lib.count(), cli.proc_path.display());

    match cli.cmd {
        Cmd::Get { cpu } => lib.get::<Lines>(cpu)?.write_to(out)?,
        Cmd::Count => writeln!(out, "{}", lib.count())?,
        Cmd::Fields => lib.stat::<Lines>().write_to(out)?,
        Cmd::ProcStat => write!(out, "{}", procfs::generate_stat(lib.aggregator())?)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_CPUS: &str = "\
cpu  150 0 0 210 0 0 0 0 0 0
cpu0 100 0 0 200 0 0 0 0 0 0
cpu1 50 0 0 10 0 0 0 0 0 0
";

    /// Write `content` to a per-test file and return its path.
    fn stat_file(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "cpustat-cli-{}-{}.stat",
            name,
            std::process::id()
        ));
        std::fs::write(&path, content).unwrap();
        path
    }

    fn run_args(path: &PathBuf, args: &[&str]) -> (Result<()>, String) {
        let mut argv = vec!["cpustat", "--proc-path", path.to_str().unwrap()];
        argv.extend_from_slice(args);
        let cli = Cli::try_parse_from(argv).unwrap();
        let mut out = Vec::new();
        let result = run(cli, &mut out);
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn get_out_of_range_cpu_fails_with_core_message() {
        let path = stat_file("range", TWO_CPUS);
        let (result, output) = run_args(&path, &["get", "--cpu", "5"]);
        std::fs::remove_file(&path).unwrap();

        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "invalid CPU number: 5 (max: 1)");
        assert!(output.is_empty(), "partial output: {}", output);
    }

    #[test]
    fn get_prints_fields_in_registry_order() {
        let path = stat_file("get", TWO_CPUS);
        let (all, all_out) = run_args(&path, &["get"]);
        let (cpu1, cpu1_out) = run_args(&path, &["get", "--cpu", "1"]);
        let (minus_one, minus_one_out) = run_args(&path, &["get", "--cpu", "-1"]);
        std::fs::remove_file(&path).unwrap();

        all.unwrap();
        cpu1.unwrap();
        minus_one.unwrap();
        assert!(all_out.starts_with("user 150\nnice 0\nsystem 0\nidle 210\n"), "{}", all_out);
        assert!(cpu1_out.starts_with("user 50\n"), "{}", cpu1_out);
        assert_eq!(all_out, minus_one_out);
    }

    #[test]
    fn count_prints_cpu_count() {
        let path = stat_file("count", TWO_CPUS);
        let (result, output) = run_args(&path, &["count"]);
        std::fs::remove_file(&path).unwrap();

        result.unwrap();
        assert_eq!(output, "2\n");
    }

    #[test]
    fn missing_file_reports_path() {
        let path = std::env::temp_dir().join("cpustat-cli-does-not-exist.stat");
        let (result, _) = run_args(&path, &["count"]);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("does-not-exist"), "{}", err);
    }
}
