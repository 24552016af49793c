// Orchestration, command runner and built-in tier tests (fake tiers and fake commands)

mod common;

use common::*;
use hoststats::collector::*;
use hoststats::models::StatsSource;
use std::sync::atomic::Ordering;
use std::time::Duration;

fn printf(lines: &[&str]) -> CommandSpec {
    let mut args = vec!["%s\\n"];
    args.extend_from_slice(lines);
    CommandSpec::new("printf", &args)
}

fn fake_builtin_commands() -> BuiltinCommands {
    BuiltinCommands {
        cpu: printf(&["37.5"]),
        memory: printf(&[
            "               total        used        free",
            "Mem:            8192        2048        4096",
        ]),
        disks: printf(&[
            "Filesystem 1G-blocks Used Available Capacity Mounted on",
            "/dev/sda1 100G 50G 50G 50% /",
            "/dev/sdb1 200G 20G 180G 10% /data",
        ]),
        core_count: printf(&["6"]),
    }
}

#[tokio::test]
async fn collector_returns_first_successful_tier() {
    let failing = counter();
    let builtin = counter();
    let synthetic = counter();
    let collector = StatsCollector::with_tiers(vec![
        Box::new(FailingTier {
            calls: failing.clone(),
        }),
        Box::new(FixedTier {
            source: StatsSource::BuiltIn,
            calls: builtin.clone(),
        }),
        Box::new(FixedTier {
            source: StatsSource::Synthetic,
            calls: synthetic.clone(),
        }),
    ]);

    let report = collector.collect().await.unwrap();
    assert_eq!(report.source, StatsSource::BuiltIn);
    assert_eq!(failing.load(Ordering::SeqCst), 1);
    assert_eq!(builtin.load(Ordering::SeqCst), 1);
    assert_eq!(synthetic.load(Ordering::SeqCst), 0, "later tiers are not consulted");
}

#[tokio::test]
async fn collector_falls_through_to_synthetic() {
    let collector = StatsCollector::with_tiers(vec![
        Box::new(FailingTier { calls: counter() }),
        Box::new(FailingTier { calls: counter() }),
        Box::new(SyntheticTier::new(Some(5))),
    ]);
    let report = collector.collect().await.unwrap();
    assert_eq!(report.source, StatsSource::Synthetic);
    assert_report_in_bounds(&report);
}

#[tokio::test]
async fn collector_does_not_retry_within_a_cycle() {
    let calls = counter();
    let collector = StatsCollector::with_tiers(vec![
        Box::new(FailingTier {
            calls: calls.clone(),
        }),
        Box::new(SyntheticTier::new(None)),
    ]);
    collector.collect().await.unwrap();
    collector.collect().await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2, "one attempt per cycle");
}

#[tokio::test]
async fn collector_errors_only_when_every_tier_fails() {
    let collector = StatsCollector::with_tiers(vec![Box::new(FailingTier { calls: counter() })]);
    let err = collector.collect().await.unwrap_err();
    assert!(matches!(err, CollectError::Exhausted { attempts: 1 }));
}

#[tokio::test]
async fn default_collector_always_produces_a_report() {
    let mut config = monitor_config(17);
    config.path = "/nonexistent/hoststats-test".into();
    let collector = StatsCollector::new(&config);
    assert_eq!(collector.tier_names(), vec!["custom", "built-in", "synthetic"]);
    for _ in 0..3 {
        let report = collector.collect().await.expect("synthetic tier never fails");
        assert_ne!(report.source, StatsSource::Custom);
        assert_report_in_bounds(&report);
    }
}

#[tokio::test]
async fn run_command_captures_stdout() {
    let out = run_command(&printf(&["hello"]), Duration::from_secs(2))
        .await
        .unwrap();
    assert_eq!(out, "hello\n");
}

#[tokio::test]
async fn run_command_reports_spawn_failure() {
    let spec = CommandSpec::new("/nonexistent/hoststats-no-such-binary", &[]);
    let err = run_command(&spec, Duration::from_secs(2)).await.unwrap_err();
    assert!(matches!(err, TierError::Spawn { .. }));
}

#[tokio::test]
async fn run_command_reports_non_zero_exit() {
    let spec = CommandSpec::new("sh", &["-c", "echo oops >&2; exit 3"]);
    let err = run_command(&spec, Duration::from_secs(2)).await.unwrap_err();
    match err {
        TierError::NonZeroExit { code, stderr, .. } => {
            assert_eq!(code, Some(3));
            assert_eq!(stderr, "oops");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn run_command_times_out() {
    let spec = CommandSpec::new("sleep", &["5"]);
    let started = std::time::Instant::now();
    let err = run_command(&spec, Duration::from_millis(200))
        .await
        .unwrap_err();
    assert!(matches!(err, TierError::Timeout { timeout_ms: 200, .. }));
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
async fn builtin_tier_assembles_report_from_commands() {
    let tier = BuiltinCommandsTier::with_commands(&monitor_config(1), fake_builtin_commands());
    let report = tier.collect().await.unwrap();
    assert_eq!(report.source, StatsSource::BuiltIn);
    assert_eq!(report.cpu.usage, 37.5);
    assert_eq!(report.cpu.cores.len(), 6);
    assert!(
        report
            .cpu
            .cores
            .iter()
            .all(|c| (37.5 - CORE_NOISE_SPREAD..=37.5 + CORE_NOISE_SPREAD).contains(c))
    );
    assert_eq!(report.memory.total, 8.0);
    assert_eq!(report.memory.used, 2.0);
    assert_eq!(report.memory.free, 4.0);
    assert_eq!(report.memory.percent, 25.0);
    assert_eq!(report.disks.len(), 2);
    assert_eq!(report.disks[1].device, "/dev/sdb1");
    assert_eq!(report.disks[1].free, 180.0);
}

#[tokio::test]
async fn builtin_tier_runs_cpu_query_before_the_others() {
    let dir = tempfile::TempDir::new().unwrap();
    let marker = dir.path().join("cpu-done");
    let marker = marker.to_str().unwrap();
    let after_cpu = |output: &str| {
        CommandSpec::new(
            "sh",
            &[
                "-c",
                &format!("test -e '{}' && printf '%s\\n' {}", marker, output),
            ],
        )
    };

    let mut commands = fake_builtin_commands();
    commands.cpu = CommandSpec::new(
        "sh",
        &["-c", &format!("sleep 0.3; touch '{}'; echo 37.5", marker)],
    );
    commands.core_count = after_cpu("6");
    commands.memory = after_cpu("'Mem: 8192 2048 4096'");
    commands.disks = after_cpu("'/dev/sda1 100G 50G 50G 50% /'");

    let tier = BuiltinCommandsTier::with_commands(&monitor_config(1), commands);
    let report = tier.collect().await.expect("sub-queries start after the cpu query");
    assert_eq!(report.cpu.usage, 37.5);
    assert_eq!(report.cpu.cores.len(), 6);
    assert_eq!(report.memory.total, 8.0);
    assert_eq!(report.disks.len(), 1);
}

#[tokio::test]
async fn builtin_tier_fails_when_any_sub_query_fails() {
    let mut commands = fake_builtin_commands();
    commands.core_count = CommandSpec::new("false", &[]);
    let tier = BuiltinCommandsTier::with_commands(&monitor_config(1), commands);
    assert!(matches!(
        tier.collect().await,
        Err(TierError::NonZeroExit { .. })
    ));
}

#[tokio::test]
async fn builtin_tier_fails_on_unparsable_output() {
    let mut commands = fake_builtin_commands();
    commands.cpu = printf(&["not-a-number"]);
    let tier = BuiltinCommandsTier::with_commands(&monitor_config(1), commands);
    assert!(matches!(
        tier.collect().await,
        Err(TierError::Unparsable { .. })
    ));
}

#[tokio::test]
async fn missing_custom_monitor_falls_back_to_builtin() {
    let mut config = monitor_config(2);
    config.path = "/nonexistent/hoststats-test".into();
    let collector = StatsCollector::with_tiers(vec![
        Box::new(CustomMonitorTier::new(&config)),
        Box::new(BuiltinCommandsTier::with_commands(
            &config,
            fake_builtin_commands(),
        )),
        Box::new(SyntheticTier::new(config.random_seed)),
    ]);
    let report = collector.collect().await.unwrap();
    assert_eq!(report.source, StatsSource::BuiltIn);
}

#[tokio::test]
async fn failing_builtin_falls_back_to_mock_data() {
    let mut config = monitor_config(2);
    config.path = "/nonexistent/hoststats-test".into();
    let mut commands = fake_builtin_commands();
    commands.disks = CommandSpec::new("/nonexistent/df", &[]);
    let collector = StatsCollector::with_tiers(vec![
        Box::new(CustomMonitorTier::new(&config)),
        Box::new(BuiltinCommandsTier::with_commands(&config, commands)),
        Box::new(SyntheticTier::new(config.random_seed)),
    ]);
    let report = collector.collect().await.unwrap();
    assert_eq!(report.source, StatsSource::Synthetic);
}
