//! # Injection Macros
//!
//! 这个 crate 提供了声明注入能力与可组合单元的派生宏。
//!
//! ## 核心宏
//!
//! - [`Injectable`](derive@Injectable) - 把带 `#[inject]` 的字段声明为一个注入点
//! - [`Unit`](derive@Unit) - 为结构体实现可组合单元接口
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use injection_macros::{Injectable, Unit};
//! use std::sync::Arc;
//!
//! #[derive(Default, Injectable, Unit)]
//! #[injectable(name = "services")]
//! #[unit(kind = "user_composed", injectable)]
//! pub struct CartSummary {
//!     #[inject]
//!     cart: Option<Arc<Cart>>,
//! }
//! ```

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod injectable;
mod unit;
mod utils;

/// 注入能力派生宏
///
/// 为结构体实现 `Injectable`：所有带 `#[inject]` 的字段按声明顺序组成唯一的注入点。
/// 字段类型必须是 `Arc<T>` 或 `Option<Arc<T>>`。
///
/// # 参数
///
/// - `name = "point"` - 注入点名称（默认为 `fields`）
///
/// # 示例
///
/// ```rust,ignore
/// #[derive(Injectable)]
/// pub struct CheckoutPage {
///     #[inject]
///     mailer: Option<Arc<Mailer>>,
/// }
/// ```
#[proc_macro_derive(Injectable, attributes(injectable, inject))]
pub fn derive_injectable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    injectable::derive_injectable_impl(input)
}

/// 可组合单元派生宏
///
/// # 参数
///
/// - `kind = "page" | "user_composed" | "control"` - 单元种类（默认为 `control`）
/// - `name = "custom_name"` - 自定义单元名称
/// - `injectable` - 选择加入依赖注入，要求结构体同时实现 `Injectable`
///
/// 带 `#[children]` 的 `Vec<Box<dyn Unit>>` 字段作为子单元列表。
#[proc_macro_derive(Unit, attributes(unit, children))]
pub fn derive_unit(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    unit::derive_unit_impl(input)
}
