//! 派生宏与激活流程的集成测试

use di_abstractions::{Unit, UnitKind};
use di_impl::{ActivationWalker, Autowirer, ScopeHandle, ServiceCollection, ServiceProvider};
use infrastructure_common::{Activation, DependencyError, Injectable, ScopeOptions, TypeInfo};
use injection_macros::{Injectable, Unit};
use std::sync::Arc;

#[derive(Debug)]
struct Clock {
    zone: &'static str,
}

#[derive(Debug)]
struct Cart {
    items: usize,
}

#[derive(Debug)]
struct Mailer;

#[derive(Default, Injectable, Unit)]
#[injectable(name = "services")]
#[unit(kind = "page", name = "checkout", injectable)]
struct CheckoutPage {
    #[inject]
    clock: Option<Arc<Clock>>,
    #[inject]
    cart: Option<Arc<Cart>>,
    #[children]
    parts: Vec<Box<dyn Unit>>,
}

#[derive(Default, Injectable, Unit)]
#[unit(kind = "user_composed", injectable)]
struct CartBadge {
    #[inject]
    cart: Option<Arc<Cart>>,
}

#[derive(Default, Injectable, Unit)]
#[unit(kind = "user_composed", injectable)]
struct ContactForm {
    #[inject]
    mailer: Option<Arc<Mailer>>,
}

#[derive(Unit)]
struct Label;

fn provider() -> Arc<ServiceProvider> {
    let mut services = ServiceCollection::new();
    services.add_singleton(|_| Ok(Clock { zone: "UTC" }));
    services.add_scoped(|_| Ok(Cart { items: 3 }));
    services.build(&ScopeOptions::default())
}

#[test]
fn test_derived_injection_point_lists_fields_in_order() {
    let page = CheckoutPage::default();
    let points = page.injection_points();

    assert_eq!(points.len(), 1);
    assert_eq!(points[0].name(), "services");
    assert_eq!(
        points[0].parameters(),
        &[TypeInfo::of::<Clock>(), TypeInfo::of::<Cart>()]
    );
}

#[test]
fn test_default_point_name() {
    let badge = CartBadge::default();
    assert_eq!(badge.injection_points()[0].name(), "fields");
}

#[test]
fn test_derived_unit_metadata() {
    let mut page = CheckoutPage::default();
    assert_eq!(page.unit_name(), "checkout");
    assert_eq!(page.kind(), UnitKind::Page);
    assert!(page.children_mut().is_some());

    let mut label = Label;
    assert_eq!(label.unit_name(), "Label");
    assert_eq!(label.kind(), UnitKind::Control);
    assert!(label.as_injectable().is_none());
    assert!(label.children_mut().is_none());
}

#[test]
fn test_activate_derived_page() {
    let provider = provider();
    let scope = ScopeHandle::create(provider.as_ref()).unwrap();
    let mut page = CheckoutPage::default();

    let activation = Autowirer::activate(&mut page, scope.resolver()).unwrap();

    assert_eq!(
        activation,
        Activation::Injected {
            point: "services",
            resolved: 2
        }
    );
    assert_eq!(page.clock.as_ref().map(|clock| clock.zone), Some("UTC"));
    assert_eq!(page.cart.as_ref().map(|cart| cart.items), Some(3));
}

#[test]
fn test_missing_dependency_leaves_unit_untouched() {
    let provider = provider();
    let mut form = ContactForm::default();

    let err = Autowirer::activate(&mut form, provider.as_ref()).unwrap_err();

    assert!(matches!(err, DependencyError::ComponentNotRegistered { .. }));
    assert!(form.mailer.is_none());
}

#[test]
fn test_walk_derived_tree() {
    let provider = provider();
    let scope = ScopeHandle::create(provider.as_ref()).unwrap();
    let mut page = CheckoutPage::default();
    page.parts.push(Box::new(Label));
    page.parts.push(Box::new(CartBadge::default()));

    let report = ActivationWalker::walk_and_activate(&mut page, scope.resolver()).unwrap();

    assert_eq!(report.activated, vec!["checkout", "CartBadge"]);
    assert_eq!(report.visited, 2);
    assert!(page.cart.is_some());
}
