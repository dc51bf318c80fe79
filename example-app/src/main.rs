//! # 示例应用程序
//!
//! 演示如何注册包、声明依赖、启动服务核心并查询组件

use anyhow::Context;
use async_trait::async_trait;
use clap::Parser;
use registry_abstractions::{
    ComponentRegistry, ComponentRegistryExt, InitializablePackage, PackageDeclaration,
};
use services_common::{
    ComponentInterface, InitializationOptions, PackageId, PackageResult,
};
use services_composition::{
    init_logging, EnvironmentsInterface, InstallationIdInterface, LoggingConfig,
    MetricsFactoryInterface, PackageMetrics, ProjectConfigurationInterface, ServicesBuilder,
    ServicesConfig, ThreadUtilsInterface,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "services-demo")]
#[command(about = "服务核心注册表示例应用")]
struct Args {
    /// 配置文件路径（TOML 或 JSON）
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 环境变量前缀
    #[arg(long, default_value = "SERVICES")]
    env_prefix: String,

    /// 日志级别，覆盖配置文件
    #[arg(long)]
    log_level: Option<String>,

    /// 额外注册一个与认证包构成循环依赖的包
    #[arg(long)]
    with_cycle: bool,
}

/// 认证服务
trait AuthService: Send + Sync {
    fn player_id(&self) -> String;
}

struct AnonymousAuth {
    prefix: String,
    installation_id: String,
}

impl AuthService for AnonymousAuth {
    fn player_id(&self) -> String {
        format!("{}-{}", self.prefix, self.installation_id)
    }
}

struct AuthInterface;

impl ComponentInterface for AuthInterface {
    const ID: &'static str = "demo.authentication";
    type Instance = dyn AuthService;
}

/// 分析事件收集
struct AnalyticsRecorder {
    environment: String,
    metrics: PackageMetrics,
}

impl AnalyticsRecorder {
    fn record(&self, event: &str) {
        let mut tags = HashMap::new();
        tags.insert("event".to_string(), event.to_string());
        self.metrics.send_sum("analytics_events", 1.0, &tags);
    }
}

struct AnalyticsInterface;

impl ComponentInterface for AnalyticsInterface {
    const ID: &'static str = "demo.analytics";
    type Instance = AnalyticsRecorder;
}

struct AuthPackage;

#[async_trait]
impl InitializablePackage for AuthPackage {
    fn id(&self) -> PackageId {
        PackageId::from_static("demo.authentication")
    }

    async fn initialize(
        &self,
        registry: &mut dyn ComponentRegistry,
        options: &InitializationOptions,
    ) -> PackageResult<()> {
        let config = registry.get_component::<ProjectConfigurationInterface>()?;
        let prefix = config.get_string("auth.player-prefix", "player");
        let installation = registry.get_component::<InstallationIdInterface>()?;

        if let Ok(analytics) = registry.get_component::<AnalyticsInterface>() {
            info!("认证包使用分析组件，环境: {}", analytics.environment);
            analytics.record("auth_initialized");
        }
        if let Some(environment) = options.environment_name() {
            info!("认证包运行环境: {}", environment);
        }

        registry.register_component::<AuthInterface>(Arc::new(AnonymousAuth {
            prefix,
            installation_id: installation.identifier().to_string(),
        }))?;
        Ok(())
    }
}

struct AnalyticsPackage;

#[async_trait]
impl InitializablePackage for AnalyticsPackage {
    fn id(&self) -> PackageId {
        PackageId::from_static("demo.analytics")
    }

    async fn initialize(
        &self,
        registry: &mut dyn ComponentRegistry,
        _options: &InitializationOptions,
    ) -> PackageResult<()> {
        let threads = registry.get_component::<ThreadUtilsInterface>()?;
        info!("分析包在主线程上初始化: {}", threads.is_running_on_main_thread());

        let environments = registry.get_component::<EnvironmentsInterface>()?;
        let metrics = registry
            .get_component::<MetricsFactoryInterface>()?
            .create(self.id().as_str());
        registry.register_component::<AnalyticsInterface>(Arc::new(AnalyticsRecorder {
            environment: environments.current().to_string(),
            metrics,
        }))?;
        Ok(())
    }
}

/// 依赖认证服务同时提供分析组件，与认证包形成循环
struct CyclePackage;

#[async_trait]
impl InitializablePackage for CyclePackage {
    fn id(&self) -> PackageId {
        PackageId::from_static("demo.cycle")
    }

    async fn initialize(
        &self,
        _registry: &mut dyn ComponentRegistry,
        _options: &InitializationOptions,
    ) -> PackageResult<()> {
        Ok(())
    }
}

fn load_config(args: &Args) -> anyhow::Result<ServicesConfig> {
    let config = match &args.config {
        Some(path) => ServicesConfig::from_file(path)
            .with_context(|| format!("加载配置文件失败: {}", path.display()))?,
        None => ServicesConfig::default(),
    };
    let mut config = config
        .apply_env_overrides(&args.env_prefix)
        .context("应用环境变量覆盖失败")?;
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    let logging: LoggingConfig = config.logging_config()?;
    init_logging(&logging)?;
    info!("启动服务核心示例应用");

    let mut builder = ServicesBuilder::new()
        .with_config(config)
        .add_package(
            PackageDeclaration::new(Arc::new(AuthPackage))
                .requires::<ProjectConfigurationInterface>()
                .requires::<InstallationIdInterface>()
                .optionally_requires::<AnalyticsInterface>()
                .provides::<AuthInterface>(),
        );

    if args.with_cycle {
        builder = builder.add_package(
            PackageDeclaration::new(Arc::new(CyclePackage))
                .requires::<AuthInterface>()
                .provides::<AnalyticsInterface>(),
        );
    } else {
        builder = builder.add_package(
            PackageDeclaration::new(Arc::new(AnalyticsPackage))
                .requires::<ThreadUtilsInterface>()
                .requires::<EnvironmentsInterface>()
                .requires::<MetricsFactoryInterface>()
                .provides::<AnalyticsInterface>(),
        );
    }

    let mut runtime = builder.build()?;
    let result = runtime.initialize(&InitializationOptions::new()).await;

    if let Some(tree) = runtime.dependency_tree() {
        println!("{}", serde_json::to_string_pretty(tree)?);
    }
    println!("初始化状态: {:?}", runtime.state());
    println!(
        "组件注册已锁定: {}",
        runtime.registry().component_state().is_locked()
    );

    match result {
        Ok(()) => {
            let auth = runtime.get_service_component::<AuthInterface>()?;
            println!("玩家标识: {}", auth.player_id());
            for info in runtime.package_infos() {
                println!("  {} 耗时 {:.3} ms", info.package, info.elapsed_seconds() * 1000.0);
            }

            let threads = runtime.get_service_component::<ThreadUtilsInterface>()?;
            let flushed = threads.post(|| "分析事件已在主线程刷新");
            if let Some(mut pump) = runtime.take_main_thread_pump() {
                pump.run_pending();
            }
            println!("{}", flushed.await?);
            Ok(())
        }
        Err(e) => {
            error!("服务初始化失败: {}", e);
            Err(e.into())
        }
    }
}
