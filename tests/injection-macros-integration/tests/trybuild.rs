//! trybuild 编译期测试

#[test]
fn trybuild_injection_macros() {
    let t = trybuild::TestCases::new();
    t.pass("tests/trybuild/injectable_ok.rs");
    t.pass("tests/trybuild/unit_ok.rs");
}
