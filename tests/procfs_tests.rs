//! `/proc/stat` rendering and the hosted parser agree with each other.

#![cfg(feature = "std")]

use std::io::Write;

use cpustat::procfs::{generate_stat, ProcStat};
use cpustat::{Aggregator, Capabilities, CounterRegistry, CpuTime, PerCpuStat, UnitSelector};

fn busy_host() -> PerCpuStat {
    let stat = PerCpuStat::new(3);
    stat.account(0, CpuTime::User, 1200);
    stat.account(0, CpuTime::Softirq, 17);
    stat.account(1, CpuTime::Irq, 33);
    stat.account(1, CpuTime::Idle, 9000);
    stat.account(2, CpuTime::Steal, 4);
    stat.account(2, CpuTime::GuestNice, 8);
    stat
}

#[test]
fn test_rendered_stat_parses_back_to_same_snapshots() {
    let registry = CounterRegistry::build(Capabilities::compiled());
    let stat = busy_host();
    let live = Aggregator::new(&registry, &stat);

    let text = generate_stat(&live).unwrap();
    println!("rendered:\n{}", text);
    let sample = ProcStat::parse(&text, &registry).unwrap();
    let parsed = Aggregator::new(&registry, &sample);

    assert_eq!(parsed.total_unit_count(), 3);
    assert_eq!(
        parsed.query(UnitSelector::All).unwrap(),
        live.query(UnitSelector::All).unwrap()
    );
    for cpu in 0..3 {
        assert_eq!(
            parsed.query(UnitSelector::Cpu(cpu)).unwrap(),
            live.query(UnitSelector::Cpu(cpu)).unwrap(),
            "cpu{} differs after parse",
            cpu
        );
    }
}

#[test]
fn test_sample_read_from_file() {
    let registry = CounterRegistry::build(Capabilities::base());
    let path = std::env::temp_dir().join(format!("cpustat-test-{}.stat", std::process::id()));
    {
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "cpu  30 0 0 50 0 0 0 0 0 0").unwrap();
        writeln!(file, "cpu0 10 0 0 20 0 0 0 0 0 0").unwrap();
        writeln!(file, "cpu1 20 0 0 30 0 0 0 0 0 0").unwrap();
        writeln!(file, "procs_running 2").unwrap();
    }

    let sample = ProcStat::read_from(&path, &registry).unwrap();
    std::fs::remove_file(&path).unwrap();

    let all = Aggregator::new(&registry, &sample).query_arg(None).unwrap();
    assert_eq!(all.get("user"), Some(30));
    assert_eq!(all.get("idle"), Some(50));
}

#[cfg(target_os = "linux")]
#[test]
fn test_live_host_sample() {
    let registry = CounterRegistry::build(Capabilities::compiled());
    let sample = match ProcStat::sample(&registry) {
        Ok(sample) => sample,
        Err(err) => {
            println!("skipping: {}", err);
            return;
        }
    };
    let aggregator = Aggregator::new(&registry, &sample);
    let all = aggregator.query_arg(None).unwrap();
    assert_eq!(all.len(), registry.len());
    if aggregator.total_unit_count() > 0 {
        let cpu0 = aggregator.query_arg(Some(0)).unwrap();
        assert!(all.get("idle") >= cpu0.get("idle"));
    }
}
