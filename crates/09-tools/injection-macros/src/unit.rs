//! 可组合单元派生宏实现

use crate::utils::{has_marker, parse_lit_str};
use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Ident, Result};

/// 单元种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnitKindArg {
    Page,
    UserComposed,
    #[default]
    Control,
}

impl UnitKindArg {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "page" => Some(Self::Page),
            "user_composed" => Some(Self::UserComposed),
            "control" => Some(Self::Control),
            _ => None,
        }
    }

    fn variant(self) -> Ident {
        let name = match self {
            Self::Page => "Page",
            Self::UserComposed => "UserComposed",
            Self::Control => "Control",
        };
        Ident::new(name, proc_macro2::Span::call_site())
    }
}

/// `#[unit(...)]` 参数
#[derive(Debug, Clone, Default)]
pub struct UnitArgs {
    /// 单元种类
    pub kind: UnitKindArg,
    /// 自定义单元名称
    pub name: Option<String>,
    /// 是否选择加入依赖注入
    pub injectable: bool,
}

impl UnitArgs {
    /// 从结构体属性中解析参数
    pub fn from_attributes(attrs: &[syn::Attribute]) -> Result<Self> {
        let mut args = Self::default();
        for attr in attrs.iter().filter(|attr| attr.path().is_ident("unit")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("kind") {
                    let value = parse_lit_str(&meta.value()?.parse()?)?;
                    args.kind = UnitKindArg::parse(&value).ok_or_else(|| {
                        meta.error("kind 必须是 \"page\"、\"user_composed\" 或 \"control\"")
                    })?;
                } else if meta.path.is_ident("name") {
                    args.name = Some(parse_lit_str(&meta.value()?.parse()?)?);
                } else if meta.path.is_ident("injectable") {
                    args.injectable = true;
                } else {
                    return Err(meta.error("未知的 unit 参数"));
                }
                Ok(())
            })?;
        }
        Ok(args)
    }
}

/// 实现 #[derive(Unit)] 宏
pub fn derive_unit_impl(input: DeriveInput) -> TokenStream {
    match expand(&input) {
        Ok(expanded) => TokenStream::from(expanded),
        Err(e) => e.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> Result<proc_macro2::TokenStream> {
    let struct_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let args = UnitArgs::from_attributes(&input.attrs)?;
    let struct_name_string = struct_name.to_string();
    let unit_name = args.name.as_deref().unwrap_or(&struct_name_string);
    let kind = args.kind.variant();

    let children_field = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => named
                .named
                .iter()
                .find(|field| has_marker(&field.attrs, "children"))
                .and_then(|field| field.ident.clone()),
            _ => None,
        },
        _ => {
            return Err(syn::Error::new_spanned(
                struct_name,
                "Unit 只能派生于结构体",
            ))
        }
    };

    let children_fn = children_field.map(|field| {
        quote! {
            fn children_mut(
                &mut self,
            ) -> ::core::option::Option<&mut ::std::vec::Vec<::std::boxed::Box<dyn ::di_abstractions::Unit>>> {
                ::core::option::Option::Some(&mut self.#field)
            }
        }
    });

    let injectable_fn = args.injectable.then(|| {
        quote! {
            fn as_injectable(
                &mut self,
            ) -> ::core::option::Option<&mut dyn ::infrastructure_common::Injectable> {
                ::core::option::Option::Some(self)
            }
        }
    });

    Ok(quote! {
        impl #impl_generics ::di_abstractions::Unit for #struct_name #ty_generics #where_clause {
            fn unit_name(&self) -> &'static str {
                #unit_name
            }

            fn kind(&self) -> ::di_abstractions::UnitKind {
                ::di_abstractions::UnitKind::#kind
            }

            #children_fn

            #injectable_fn
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_unit_args_defaults() {
        let args = UnitArgs::default();
        assert_eq!(args.kind, UnitKindArg::Control);
        assert_eq!(args.name, None);
        assert!(!args.injectable);
    }

    #[test]
    fn test_unit_args_parse() {
        let input: DeriveInput = parse_quote! {
            #[unit(kind = "user_composed", name = "cart_summary", injectable)]
            struct CartSummary;
        };
        let args = UnitArgs::from_attributes(&input.attrs).unwrap();
        assert_eq!(args.kind, UnitKindArg::UserComposed);
        assert_eq!(args.name.as_deref(), Some("cart_summary"));
        assert!(args.injectable);
    }

    #[test]
    fn test_invalid_kind_rejected() {
        let input: DeriveInput = parse_quote! {
            #[unit(kind = "widget")]
            struct CartSummary;
        };
        assert!(UnitArgs::from_attributes(&input.attrs).is_err());
    }

    #[test]
    fn test_expand_children() {
        let input: DeriveInput = parse_quote! {
            #[unit(kind = "page")]
            struct Home {
                #[children]
                parts: Vec<Box<dyn Unit>>,
            }
        };
        let expanded = expand(&input).unwrap().to_string();
        assert!(expanded.contains("children_mut"));
        assert!(expanded.contains("self . parts"));
        assert!(!expanded.contains("as_injectable"));
    }
}
