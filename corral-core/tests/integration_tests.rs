use corral_core::*;

#[test]
fn test_entity_path_validation() {
    // Valid paths
    assert!(EntityPath::new("test").is_ok());
    assert!(EntityPath::new("test-123").is_ok());
    assert!(EntityPath::new("corral/test_456").is_ok());
    assert!(EntityPath::new("kubepods/pod1234/abc.scope").is_ok());
    assert!(EntityPath::new("docker:abc").is_ok());

    // Invalid paths - empty
    assert!(EntityPath::new("").is_err());
    assert!(EntityPath::new("/./").is_err());

    // Invalid paths - too long
    assert!(EntityPath::new("a".repeat(256)).is_err());

    // Invalid paths - escaping or bad characters
    assert!(EntityPath::new("..").is_err());
    assert!(EntityPath::new("corral/../..").is_err());
    assert!(EntityPath::new("test@123").is_err());
    assert!(EntityPath::new("test space").is_err());
    assert!(EntityPath::new("test\\path").is_err());
    assert!(EntityPath::new("test;semicolon").is_err());
}

#[test]
fn test_entity_path_display() {
    let path = EntityPath::new("/corral/web").unwrap();
    assert_eq!(format!("{}", path), "corral/web");
    assert_eq!(path.as_path(), std::path::Path::new("corral/web"));
}

#[test]
fn test_controller_name_strings() {
    assert_eq!(ControllerName::Cpu.to_string(), "cpu");
    assert_eq!(ControllerName::Cpuacct.to_string(), "cpuacct");
    assert_eq!(ControllerName::Memory.to_string(), "memory");
    assert_eq!(ControllerName::Pids.to_string(), "pids");

    let json = serde_json::to_string(&ControllerName::Cpuacct).unwrap();
    assert_eq!(json, "\"cpuacct\"");
}

#[test]
fn test_resources_from_json() {
    let json = r#"{
        "cpu": {
            "shares": 1024,
            "quota": 50000,
            "period": 100000,
            "realtimeRuntime": 950000,
            "realtimePeriod": 1000000
        },
        "pids": { "limit": 128 }
    }"#;

    let resources: Resources = serde_json::from_str(json).unwrap();
    assert_eq!(
        resources.cpu,
        Some(CpuResources {
            shares: Some(1024),
            quota: Some(50_000),
            period: Some(100_000),
            realtime_runtime: Some(950_000),
            realtime_period: Some(1_000_000),
        })
    );
    assert_eq!(resources.pids, Some(PidsResources { limit: Some(128) }));
    assert!(resources.memory.is_none());
    assert!(!resources.is_empty());
}

#[test]
fn test_resources_overflow_rejected() {
    let json = r#"{"memory":{"limit":99999999999999999999}}"#;
    assert!(serde_json::from_str::<Resources>(json).is_err());
}

#[test]
fn test_stats_snapshot_default() {
    let stats = Stats::default();
    let snapshot = stats.snapshot();
    assert!(snapshot.cpu.is_none());
    assert!(snapshot.memory.is_none());
    assert!(snapshot.pids.is_none());
}

#[test]
fn test_stats_slots_are_independent() {
    let stats = Stats::new();

    stats.memory.update(|m| m.usage.usage = 4096);
    assert!(stats.memory.is_populated());
    assert!(!stats.cpu.is_populated());
    assert!(!stats.pids.is_populated());

    stats.cpu.init();
    let cpu = stats.cpu.get().unwrap();
    assert_eq!(cpu, CpuStat::default());
}

#[test]
fn test_stats_shared_across_threads() {
    let stats = Stats::new();

    std::thread::scope(|s| {
        s.spawn(|| {
            stats.cpu.update(|c| {
                c.throttling = ThrottlingStat {
                    periods: 10,
                    throttled_periods: 2,
                    throttled_time: 500,
                };
            });
        });
        s.spawn(|| stats.cpu.update(|c| c.usage.user = 42));
        s.spawn(|| stats.pids.update(|p| p.current = 5));
    });

    let snapshot = stats.snapshot();
    let cpu = snapshot.cpu.unwrap();
    assert_eq!(cpu.throttling.periods, 10);
    assert_eq!(cpu.throttling.throttled_periods, 2);
    assert_eq!(cpu.throttling.throttled_time, 500);
    assert_eq!(cpu.usage.user, 42);
    assert_eq!(snapshot.pids.unwrap().current, 5);
}

#[test]
fn test_monitor_event_serialization() {
    use std::time::SystemTime;

    let event = MonitorEvent::Started {
        entity: EntityPath::new("test").unwrap(),
        timestamp: SystemTime::UNIX_EPOCH,
    };

    let json = serde_json::to_string(&event).unwrap();
    let deserialized: MonitorEvent = serde_json::from_str(&json).unwrap();

    match deserialized {
        MonitorEvent::Started { entity, .. } => {
            assert_eq!(entity.to_string(), "test");
        }
        _ => panic!("Wrong event type"),
    }
}

#[test]
fn test_error_display() {
    let err = Error::DuplicateController {
        name: "cpu".to_string(),
    };
    assert_eq!(err.to_string(), "controller `cpu` is already registered");

    let err = Error::Parse {
        path: "/sys/fs/cgroup/cpu/x/cpu.stat".into(),
        source: ParseError::InvalidValue {
            value: "-1".to_string(),
            source: None,
        },
    };
    assert!(err.to_string().contains("cpu.stat"));
}
