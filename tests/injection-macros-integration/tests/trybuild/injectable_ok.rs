use infrastructure_common::{Injectable, InjectionPoint};
use injection_macros::Injectable;
use std::sync::Arc;

struct Clock;

#[derive(Injectable)]
#[injectable(name = "services")]
struct Report {
    #[inject]
    clock: Option<Arc<Clock>>,
    title: String,
}

#[derive(Injectable)]
struct Marker;

fn main() {
    let report = Report {
        clock: None,
        title: String::from("daily"),
    };
    let points: Vec<InjectionPoint> = report.injection_points();
    assert_eq!(points[0].name(), "services");
    assert_eq!(points[0].arity(), 1);
    assert!(report.clock.is_none());
    assert_eq!(report.title, "daily");

    assert_eq!(Marker.injection_points()[0].arity(), 0);
}
