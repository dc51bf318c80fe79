//! 服务核心跨 crate 集成测试
use async_trait::async_trait;
use registry_abstractions::{
    ComponentRegistry, ComponentRegistryExt, InitializablePackage, PackageDeclaration,
};
use services_common::{
    ComponentInterface, InitializationError, InitializationOptions, InitializationState,
    PackageId, PackageResult,
};
use services_composition::{
    ActionSchedulerInterface, EnvironmentsInterface, InMemoryDiagnostics, InMemoryMetrics,
    ManualTimeProvider, MetricsFactoryInterface, ProjectConfigurationInterface, ServicesBuilder,
    ThreadUtilsInterface, ALL_PACKAGES_INIT_TIME_METRIC, CIRCULAR_DEPENDENCY_DIAGNOSTIC,
};
use std::collections::HashMap;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::NamedTempFile;

/// 会话服务
trait SessionService: Send + Sync {
    fn endpoint(&self) -> String;
}

struct HttpSessionService {
    endpoint: String,
}

impl SessionService for HttpSessionService {
    fn endpoint(&self) -> String {
        self.endpoint.clone()
    }
}

struct SessionInterface;

impl ComponentInterface for SessionInterface {
    const ID: &'static str = "integration.session";
    type Instance = dyn SessionService;
}

/// 依赖项目配置、提供会话服务的包
struct SessionPackage;

#[async_trait]
impl InitializablePackage for SessionPackage {
    fn id(&self) -> PackageId {
        PackageId::from_static("integration.session")
    }

    async fn initialize(
        &self,
        registry: &mut dyn ComponentRegistry,
        _options: &InitializationOptions,
    ) -> PackageResult<()> {
        let config = registry.get_component::<ProjectConfigurationInterface>()?;
        let endpoint = config.get_string("session.endpoint", "http://localhost");
        registry.register_component::<SessionInterface>(Arc::new(HttpSessionService { endpoint }))?;
        Ok(())
    }
}

/// 计数包，依赖会话服务和调度器
struct HeartbeatPackage {
    beats: Arc<AtomicUsize>,
}

#[async_trait]
impl InitializablePackage for HeartbeatPackage {
    fn id(&self) -> PackageId {
        PackageId::from_static("integration.heartbeat")
    }

    async fn initialize(
        &self,
        registry: &mut dyn ComponentRegistry,
        _options: &InitializationOptions,
    ) -> PackageResult<()> {
        let scheduler = registry.get_component::<ActionSchedulerInterface>()?;
        let beats = self.beats.clone();
        scheduler
            .schedule_action(
                move || {
                    beats.fetch_add(1, Ordering::SeqCst);
                },
                30.0,
            )
            .map_err(|e| services_common::PackageError::failed(self.id(), e.to_string()))?;
        Ok(())
    }
}

#[tokio::test]
async fn test_bootstrap_from_config_file() -> anyhow::Result<()> {
    let mut file = NamedTempFile::new()?;
    writeln!(
        file,
        r#"
environment = "integration"

[project]
"session.endpoint" = "https://sessions.example.invalid"
"#
    )?;

    let clock = Arc::new(ManualTimeProvider::new(chrono_start()));
    let metrics = Arc::new(InMemoryMetrics::new());
    let beats = Arc::new(AtomicUsize::new(0));

    let mut runtime = ServicesBuilder::new()
        .with_config_file(file.path())?
        .with_time_provider(clock.clone())
        .with_metrics(metrics.clone())
        .with_diagnostics(Arc::new(InMemoryDiagnostics::new()))
        .add_package(
            PackageDeclaration::new(Arc::new(HeartbeatPackage {
                beats: beats.clone(),
            }))
            .requires::<ActionSchedulerInterface>()
            .requires::<SessionInterface>(),
        )
        .add_package(
            PackageDeclaration::new(Arc::new(SessionPackage))
                .requires::<ProjectConfigurationInterface>()
                .provides::<SessionInterface>(),
        )
        .build()?;

    runtime.initialize(&InitializationOptions::new()).await?;
    assert_eq!(runtime.state(), InitializationState::Initialized);

    let session = runtime.get_service_component::<SessionInterface>()?;
    assert_eq!(session.endpoint(), "https://sessions.example.invalid");

    let config = runtime.get_service_component::<ProjectConfigurationInterface>()?;
    assert_eq!(
        config.get_string(services_common::ENVIRONMENT_NAME_KEY, ""),
        "integration"
    );

    // 调度器使用注入的时钟
    let scheduler = runtime.get_service_component::<ActionSchedulerInterface>()?;
    assert_eq!(scheduler.scheduled_actions_count(), 1);
    clock.advance(chrono::Duration::seconds(31));
    assert_eq!(scheduler.execute_expired_actions(), 1);
    assert_eq!(beats.load(Ordering::SeqCst), 1);

    let threads = runtime.get_service_component::<ThreadUtilsInterface>()?;
    assert!(threads.is_running_on_main_thread());

    // 包指标带有环境和包名标签，与核心指标共用同一个出口
    let environments = runtime.get_service_component::<EnvironmentsInterface>()?;
    assert_eq!(environments.current(), "integration");
    runtime
        .get_service_component::<MetricsFactoryInterface>()?
        .create("integration.session")
        .send_histogram("session_latency", 0.2, &HashMap::new());
    let samples = metrics.histogram("session_latency");
    assert_eq!(samples[0].tags["environment_name"], "integration");
    assert_eq!(samples[0].tags["package_name"], "integration.session");

    assert_eq!(metrics.histogram(ALL_PACKAGES_INIT_TIME_METRIC).len(), 1);

    let order: Vec<String> = runtime
        .package_infos()
        .iter()
        .map(|info| info.package.to_string())
        .collect();
    assert_eq!(
        order,
        vec![
            "com.services.core",
            "integration.session",
            "integration.heartbeat"
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_cycle_across_core_dependents() -> anyhow::Result<()> {
    struct LoopInterface;

    impl ComponentInterface for LoopInterface {
        const ID: &'static str = "integration.loop";
        type Instance = ();
    }

    let diagnostics = Arc::new(InMemoryDiagnostics::new());
    let mut runtime = ServicesBuilder::new()
        .with_diagnostics(diagnostics.clone())
        .add_package(
            PackageDeclaration::new(Arc::new(SessionPackage))
                .requires::<ProjectConfigurationInterface>()
                .requires::<LoopInterface>()
                .provides::<SessionInterface>()
                .provides::<LoopInterface>(),
        )
        .build()?;

    let err = runtime
        .initialize(&InitializationOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, InitializationError::Sort { .. }));
    assert!(err.is_circular_dependency());
    assert_eq!(diagnostics.count(CIRCULAR_DEPENDENCY_DIAGNOSTIC), 1);

    // 核心包也没有初始化
    assert!(runtime
        .get_service_component::<ProjectConfigurationInterface>()
        .is_err());
    assert_eq!(runtime.state(), InitializationState::Failed);
    Ok(())
}

fn chrono_start() -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default()
}
