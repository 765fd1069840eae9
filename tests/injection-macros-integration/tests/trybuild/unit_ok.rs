use di_abstractions::{Unit, UnitKind};
use injection_macros::{Injectable, Unit};

#[derive(Injectable, Unit)]
#[unit(kind = "user_composed", name = "sidebar", injectable)]
struct Sidebar;

#[derive(Unit)]
#[unit(kind = "page")]
struct Home {
    #[children]
    parts: Vec<Box<dyn Unit>>,
}

fn main() {
    let mut home = Home {
        parts: vec![Box::new(Sidebar)],
    };
    assert_eq!(home.unit_name(), "Home");
    assert_eq!(home.kind(), UnitKind::Page);
    assert!(home.as_injectable().is_none());

    let parts = home.children_mut().map(|parts| parts.len());
    assert_eq!(parts, Some(1));

    let mut sidebar = Sidebar;
    assert_eq!(sidebar.unit_name(), "sidebar");
    assert!(sidebar.as_injectable().is_some());
}
