//! Centralized integration tests for unit activation
use di_abstractions::{RequestContext, Resolver, Unit, UnitKind};
use di_impl::{
    ActivationWalker, AmbientResolver, Autowirer, ScopeLifecycleController, ScopeRegistry,
    ServiceCollection,
};
use infrastructure_common::{
    Activation, Dependencies, DependencyError, DependencyResult, Injectable, InjectionPoint,
    ScopeOptions, ServiceInstance, TypeInfo,
};
use std::any::TypeId;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// 记录解析调用次数的解析器
struct CountingResolver {
    inner: Arc<dyn Resolver>,
    calls: AtomicUsize,
}

impl CountingResolver {
    fn new(inner: Arc<dyn Resolver>) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Resolver for CountingResolver {
    fn resolve_by_type(&self, type_info: &TypeInfo) -> DependencyResult<ServiceInstance> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.resolve_by_type(type_info)
    }

    fn can_resolve(&self, type_id: TypeId) -> bool {
        self.inner.can_resolve(type_id)
    }
}

#[derive(Debug)]
struct Mailer;

#[derive(Debug)]
struct Inventory;

/// 声明了无参与双参两个注入点的页面
#[derive(Default)]
struct CheckoutPage {
    mailer: Option<Arc<Mailer>>,
    inventory: Option<Arc<Inventory>>,
    injections: usize,
}

impl Injectable for CheckoutPage {
    fn injection_points(&self) -> Vec<InjectionPoint> {
        vec![
            InjectionPoint::new("empty"),
            InjectionPoint::new("services")
                .with_parameter::<Mailer>()
                .with_parameter::<Inventory>(),
        ]
    }

    fn inject(
        &mut self,
        point: &InjectionPoint,
        mut dependencies: Dependencies,
    ) -> DependencyResult<()> {
        self.injections += 1;
        if point.arity() == 2 {
            self.mailer = Some(dependencies.take()?);
            self.inventory = Some(dependencies.take()?);
        }
        Ok(())
    }
}

impl Unit for CheckoutPage {
    fn unit_name(&self) -> &'static str {
        "CheckoutPage"
    }

    fn kind(&self) -> UnitKind {
        UnitKind::Page
    }

    fn as_injectable(&mut self) -> Option<&mut dyn Injectable> {
        Some(self)
    }
}

/// 只声明无参注入点的组件
#[derive(Default)]
struct Banner {
    initialized: bool,
}

impl Injectable for Banner {
    fn injection_points(&self) -> Vec<InjectionPoint> {
        vec![InjectionPoint::new("default")]
    }

    fn inject(&mut self, _: &InjectionPoint, dependencies: Dependencies) -> DependencyResult<()> {
        assert!(dependencies.is_empty());
        self.initialized = true;
        Ok(())
    }
}

/// 不参与注入的普通控件
struct Label {
    text: String,
}

impl Unit for Label {
    fn unit_name(&self) -> &'static str {
        "Label"
    }
}

/// 组合树中的节点
struct Panel {
    name: &'static str,
    kind: UnitKind,
    eligible: bool,
    mailer: Option<Arc<Mailer>>,
    children: Vec<Box<dyn Unit>>,
}

impl Panel {
    fn new(name: &'static str, kind: UnitKind, eligible: bool) -> Self {
        Self {
            name,
            kind,
            eligible,
            mailer: None,
            children: Vec::new(),
        }
    }

    fn child(mut self, unit: impl Unit + 'static) -> Self {
        self.children.push(Box::new(unit));
        self
    }
}

impl Injectable for Panel {
    fn injection_points(&self) -> Vec<InjectionPoint> {
        vec![InjectionPoint::new("mailer").with_parameter::<Mailer>()]
    }

    fn inject(&mut self, _: &InjectionPoint, mut dependencies: Dependencies) -> DependencyResult<()> {
        self.mailer = Some(dependencies.take()?);
        Ok(())
    }
}

impl Unit for Panel {
    fn unit_name(&self) -> &'static str {
        self.name
    }

    fn kind(&self) -> UnitKind {
        self.kind
    }

    fn children_mut(&mut self) -> Option<&mut Vec<Box<dyn Unit>>> {
        Some(&mut self.children)
    }

    fn as_injectable(&mut self) -> Option<&mut dyn Injectable> {
        if self.eligible {
            Some(self)
        } else {
            None
        }
    }
}

fn services() -> ServiceCollection {
    let mut services = ServiceCollection::new();
    services.add_singleton(|_| Ok(Mailer));
    services.add_scoped(|_| Ok(Inventory));
    services
}

#[test]
fn test_two_parameter_point_selected_with_two_resolutions() {
    let provider = services().build(&ScopeOptions::default());
    let resolver = CountingResolver::new(provider);
    let mut page = CheckoutPage::default();

    let activation = Autowirer::activate(&mut page, &resolver).unwrap();

    assert_eq!(
        activation,
        Activation::Injected {
            point: "services",
            resolved: 2
        }
    );
    assert_eq!(resolver.calls(), 2);
    assert_eq!(page.injections, 1);
    assert!(page.mailer.is_some() && page.inventory.is_some());
}

#[test]
fn test_non_injectable_is_noop() {
    let provider = services().build(&ScopeOptions::default());
    let resolver = CountingResolver::new(provider);
    let mut label = Label {
        text: "总计".to_string(),
    };

    let activation = Autowirer::activate(&mut label, &resolver).unwrap();

    assert_eq!(activation, Activation::Skipped);
    assert_eq!(resolver.calls(), 0);
    assert_eq!(label.text, "总计");
}

#[test]
fn test_zero_parameter_point_still_invoked() {
    let provider = services().build(&ScopeOptions::default());
    let resolver = CountingResolver::new(provider);
    let mut banner = Banner::default();

    let activation = Autowirer::activate_injectable("Banner", &mut banner, &resolver).unwrap();

    assert_eq!(
        activation,
        Activation::Injected {
            point: "default",
            resolved: 0
        }
    );
    assert_eq!(resolver.calls(), 0);
    assert!(banner.initialized);
}

#[test]
fn test_resolution_failure_stops_further_resolution() {
    // 只注册第二个参数，第一个参数解析即失败
    let mut services = ServiceCollection::new();
    services.add_singleton(|_| Ok(Inventory));
    let resolver = CountingResolver::new(services.build(&ScopeOptions::default()));
    let mut page = CheckoutPage::default();

    let result = Autowirer::activate(&mut page, &resolver);

    assert!(matches!(
        result,
        Err(DependencyError::ComponentNotRegistered { .. })
    ));
    assert_eq!(resolver.calls(), 1);
    assert_eq!(page.injections, 0);
}

#[test]
fn test_walk_activates_root_and_eligible_descendants() {
    let provider = services().build(&ScopeOptions::default());
    let resolver = CountingResolver::new(provider);

    let mut root = Panel::new("root", UnitKind::Page, true)
        .child(Panel::new("child_a", UnitKind::UserComposed, true))
        .child(
            Panel::new("child_b", UnitKind::UserComposed, false)
                .child(Panel::new("grandchild", UnitKind::UserComposed, true)),
        )
        .child(Label {
            text: "页脚".to_string(),
        });

    let report = ActivationWalker::walk_and_activate(&mut root, &resolver).unwrap();

    assert_eq!(report.activated, vec!["root", "child_a", "grandchild"]);
    assert_eq!(report.visited, 4);
    assert_eq!(resolver.calls(), 3);
    assert!(root.mailer.is_some());
}

#[test]
fn test_activation_inside_request_uses_request_scope() {
    let provider = services().build(&ScopeOptions::default());
    let registry = ScopeRegistry::new();
    let controller = ScopeLifecycleController::new(provider.clone(), registry.clone());
    let ambient = AmbientResolver::new(provider, registry);

    let request = RequestContext::new("/checkout");
    controller.begin_request(&request).unwrap();

    let mut first = CheckoutPage::default();
    let mut second = CheckoutPage::default();
    Autowirer::activate(&mut first, &ambient.current(Some(&request))).unwrap();
    Autowirer::activate(&mut second, &ambient.current(Some(&request))).unwrap();
    controller.end_request(&request);

    // 同一请求内共享作用域服务
    let (a, b) = (first.inventory.unwrap(), second.inventory.unwrap());
    assert!(Arc::ptr_eq(&a, &b));

    // 请求结束后回退到根容器，得到不同的实例
    let mut outside = CheckoutPage::default();
    Autowirer::activate(&mut outside, &ambient.current(Some(&request))).unwrap();
    assert!(!Arc::ptr_eq(&a, &outside.inventory.unwrap()));
}
