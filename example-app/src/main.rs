//! # 示例应用程序
//!
//! 模拟一个按请求创建页面的宿主：每个请求经过请求作用域中间件，
//! 页面由自动注入的处理器工厂创建并激活，页面组合出的子单元在预渲染阶段激活。

use anyhow::Context;
use async_trait::async_trait;
use clap::Parser;
use di_abstractions::{HandlerFactory, PreRenderHook, RequestContext, Unit, UnitKind};
use infrastructure_common::{
    DependencyResult, InfrastructureError, InfrastructureResult, Injectable,
};
use infrastructure_composition::{AutowiringHandlerFactory, LoggingConfig, RequestScopeRuntime};
use injection_macros::{Injectable, Unit};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::task::JoinSet;
use tower::{service_fn, Layer, ServiceExt};
use tracing::{debug, info, warn};

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "example-app")]
#[command(about = "请求作用域依赖注入示例")]
struct Args {
    /// 作用域配置文件路径
    #[arg(short, long, default_value = "config/scope.toml")]
    options: PathBuf,

    /// 并发模拟的请求数量
    #[arg(short, long, default_value_t = 8)]
    requests: usize,

    /// 日志级别
    #[arg(long, default_value = "info")]
    log_level: String,

    /// 以 JSON 格式输出日志
    #[arg(long)]
    json: bool,
}

/// 全局价格表（单例）
#[derive(Debug)]
struct PriceList {
    unit_price: u32,
}

/// 请求级购物车（作用域服务）
#[derive(Debug)]
struct Cart {
    serial: usize,
    items: Mutex<Vec<String>>,
}

impl Cart {
    fn add(&self, item: impl Into<String>) {
        self.items.lock().push(item.into());
    }

    fn len(&self) -> usize {
        self.items.lock().len()
    }
}

/// 渲染结果，通过请求条目交还给宿主
#[derive(Debug, Clone)]
struct Rendered(String);

/// 结算页面
#[derive(Default, Injectable)]
#[injectable(name = "services")]
struct CheckoutPage {
    #[inject]
    prices: Option<Arc<PriceList>>,
    #[inject]
    cart: Option<Arc<Cart>>,
    parts: Vec<Box<dyn Unit>>,
    hooks: Vec<PreRenderHook>,
}

impl Unit for CheckoutPage {
    fn unit_name(&self) -> &'static str {
        "checkout"
    }

    fn kind(&self) -> UnitKind {
        UnitKind::Page
    }

    fn children_mut(&mut self) -> Option<&mut Vec<Box<dyn Unit>>> {
        Some(&mut self.parts)
    }

    fn as_injectable(&mut self) -> Option<&mut dyn Injectable> {
        Some(self)
    }

    fn on_pre_render(&mut self, hook: PreRenderHook) -> Result<(), PreRenderHook> {
        self.hooks.push(hook);
        Ok(())
    }

    fn process(&mut self, request: &RequestContext) -> DependencyResult<()> {
        self.parts.push(Box::new(CartBadge::default()));
        self.parts.push(Box::new(Footer));

        for hook in std::mem::take(&mut self.hooks) {
            let page: &mut dyn Unit = &mut *self;
            hook(page, request)?;
        }

        let (Some(prices), Some(cart)) = (&self.prices, &self.cart) else {
            return Ok(());
        };
        cart.add(request.path());
        let total = prices.unit_price * u32::try_from(cart.len()).unwrap_or(u32::MAX);
        request.items().insert(Rendered(format!(
            "购物车 #{} 共 {} 件, 合计 {} 元",
            cart.serial,
            cart.len(),
            total
        )));
        Ok(())
    }
}

/// 购物车角标（用户编写的子单元）
#[derive(Default, Injectable, Unit)]
#[unit(kind = "user_composed", name = "cart_badge", injectable)]
struct CartBadge {
    #[inject]
    cart: Option<Arc<Cart>>,
}

/// 页脚（框架控件，不参与注入）
#[derive(Unit)]
struct Footer;

/// 宿主原有的页面工厂
#[derive(Debug, Default)]
struct ShopPages {
    released: AtomicUsize,
}

#[async_trait]
impl HandlerFactory for ShopPages {
    async fn get_handler(
        &self,
        request: &RequestContext,
    ) -> InfrastructureResult<Option<Box<dyn Unit>>> {
        if request.path().starts_with("/checkout") {
            Ok(Some(Box::new(CheckoutPage::default())))
        } else {
            Ok(None)
        }
    }

    fn release_handler(&self, handler: Box<dyn Unit>) {
        self.released.fetch_add(1, Ordering::Relaxed);
        debug!("归还处理器: {}", handler.unit_name());
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let runtime = build_runtime(&args).context("构建请求作用域运行时失败")?;
    info!("运行时已启动: {:?}", runtime.options());

    let pages = Arc::new(ShopPages::default());
    let factory = Arc::new(runtime.handler_factory(pages.clone()));
    serve_requests(&runtime, factory, args.requests).await?;

    demonstrate_root_fallback(&runtime)?;

    let metrics = runtime.metrics();
    println!("{}", serde_json::to_string_pretty(&metrics)?);
    info!("已归还处理器 {} 个", pages.released.load(Ordering::Relaxed));

    if !runtime.shutdown() {
        warn!("仍有未结束的请求作用域");
    }
    Ok(())
}

/// 构建运行时
fn build_runtime(args: &Args) -> anyhow::Result<RequestScopeRuntime> {
    let mut logging = if args.json {
        LoggingConfig::production()
    } else {
        LoggingConfig::development()
    };
    logging.level = args
        .log_level
        .parse()
        .with_context(|| format!("无效的日志级别: {}", args.log_level))?;

    let serial = Arc::new(AtomicUsize::new(0));
    let mut builder = RequestScopeRuntime::builder().with_logging(logging);
    builder = if args.options.exists() {
        builder.with_options_file(&args.options)?
    } else {
        builder.with_default_options()?
    };

    let runtime = builder
        .configure_services("shop", move |services| {
            let serial = serial.clone();
            services.add_singleton(|_| Ok(PriceList { unit_price: 42 }));
            services.add_scoped_with_cleanup(
                move |_| {
                    Ok(Cart {
                        serial: serial.fetch_add(1, Ordering::SeqCst),
                        items: Mutex::new(Vec::new()),
                    })
                },
                |cart: &Cart| {
                    debug!("释放购物车 #{}", cart.serial);
                    Ok(())
                },
            );
            Ok(())
        })
        .build()?;
    Ok(runtime)
}

/// 通过请求作用域中间件并发处理一批请求
async fn serve_requests(
    runtime: &RequestScopeRuntime,
    factory: Arc<AutowiringHandlerFactory>,
    count: usize,
) -> anyhow::Result<()> {
    let service = runtime.layer().layer(service_fn(move |request: Arc<RequestContext>| {
        let factory = factory.clone();
        async move { render(&factory, &request).await }
    }));

    let mut tasks = JoinSet::new();
    for i in 0..count {
        let service = service.clone();
        let path = if i % 4 == 3 {
            format!("/about/{i}")
        } else {
            format!("/checkout/{i}")
        };
        tasks.spawn(service.oneshot(Arc::new(RequestContext::new(path))));
    }

    while let Some(joined) = tasks.join_next().await {
        match joined? {
            Ok(body) => info!("响应: {}", body),
            Err(e) => warn!("请求处理失败: {}", e),
        }
    }
    Ok(())
}

/// 取得处理器并驱动它完成一次请求
async fn render(
    factory: &AutowiringHandlerFactory,
    request: &RequestContext,
) -> Result<String, InfrastructureError> {
    let Some(mut handler) = factory.get_handler(request).await? else {
        return Ok(format!("404 {}", request.path()));
    };

    let processed = handler.process(request);
    factory.release_handler(handler);
    processed?;

    Ok(request
        .items()
        .get::<Rendered>()
        .map_or_else(|| format!("204 {}", request.path()), |rendered| rendered.0))
}

/// 演示请求外的作用域服务解析
fn demonstrate_root_fallback(runtime: &RequestScopeRuntime) -> anyhow::Result<()> {
    match runtime.resolve::<Cart>(None) {
        Ok(cart) => info!("请求外解析得到根购物车 #{}", cart.serial),
        Err(e) => warn!("请求外解析被拒绝: {}", e),
    }
    let prices = runtime.resolve::<PriceList>(None)?;
    info!("单价: {}", prices.unit_price);
    Ok(())
}
